//! Built-in provider rule sets.
//!
//! Each rule set lists what a provider's structured output mode refuses.
//! Anything not listed is assumed to be accepted.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use serde_json::json;

use crate::rules::{RuleSet, SimpleRule};
use crate::types::{Feature, FeatureContext, SchemaDraft};
use crate::validators;

/// Canonical built-in provider names.
pub const PROVIDERS: &[&str] = &["openai", "anthropic", "google", "mistral", "xai"];

/// Alternative names mapped to canonical providers.
pub const ALIASES: &[(&str, &str)] = &[
    ("azure", "openai"),
    ("azure-openai", "openai"),
    ("claude", "anthropic"),
    ("gemini", "google"),
    ("vertex", "google"),
    ("grok", "xai"),
];

/// Canonical provider names, in registration order.
pub fn names() -> &'static [&'static str] {
    PROVIDERS
}

/// Canonical name for a provider or alias.
pub fn canonical_name(name: &str) -> Option<&'static str> {
    let name = name.trim().to_lowercase();
    PROVIDERS
        .iter()
        .copied()
        .find(|p| *p == name)
        .or_else(|| {
            ALIASES
                .iter()
                .find_map(|(alias, target)| (*alias == name).then_some(*target))
        })
}

/// Built-in rule set for a provider name or alias.
pub fn builtin(name: &str) -> Option<Arc<RuleSet>> {
    static BUILTINS: OnceLock<HashMap<&'static str, Arc<RuleSet>>> = OnceLock::new();
    let table = BUILTINS.get_or_init(|| {
        HashMap::from([
            ("openai", Arc::new(openai())),
            ("anthropic", Arc::new(anthropic())),
            ("google", Arc::new(google())),
            ("mistral", Arc::new(mistral())),
            ("xai", Arc::new(xai())),
        ])
    });
    canonical_name(name).and_then(|canonical| table.get(canonical).cloned())
}

fn openai() -> RuleSet {
    RuleSet::new("openai")
        .unsupported(
            SimpleRule::new(Feature::RootAnyOf)
                .context(FeatureContext::Root)
                .message("openai requires the root schema to be an object, not 'anyOf'"),
        )
        .unsupported_all(&[
            Feature::AllOf,
            Feature::OneOf,
            Feature::Not,
            Feature::If,
            Feature::DependentRequired,
            Feature::DependentSchemas,
            Feature::PatternProperties,
            Feature::PropertyNames,
            Feature::Contains,
            Feature::UniqueItems,
        ])
        .unsupported(SimpleRule::new(Feature::Format).allow(
            [
                "date-time", "time", "date", "duration", "email", "hostname", "ipv4", "ipv6",
                "uuid",
            ]
            .map(|f| json!(f)),
        ))
        .validator(validators::root_must_be_object())
        .validator(validators::all_properties_required())
        .validator(validators::additional_properties_false())
        .draft(SchemaDraft::Draft2020_12)
}

fn anthropic() -> RuleSet {
    RuleSet::new("anthropic")
        .unsupported_all(&[
            Feature::Recursive,
            Feature::AllOf,
            Feature::Not,
            Feature::If,
            Feature::DependentRequired,
            Feature::DependentSchemas,
            Feature::PatternProperties,
            Feature::PropertyNames,
            Feature::Contains,
            Feature::Minimum,
            Feature::Maximum,
            Feature::ExclusiveMinimum,
            Feature::ExclusiveMaximum,
            Feature::MultipleOf,
            Feature::MinLength,
            Feature::MaxLength,
            Feature::MaxItems,
        ])
        .unsupported(
            SimpleRule::new(Feature::OneOf).message("anthropic does not support 'oneOf'; use 'anyOf'"),
        )
        .unsupported(SimpleRule::new(Feature::MinItems).allow([json!(0), json!(1)]))
        .unsupported(SimpleRule::new(Feature::Format).allow(
            [
                "date-time", "time", "date", "duration", "email", "hostname", "uri", "ipv4",
                "ipv6", "uuid",
            ]
            .map(|f| json!(f)),
        ))
        .validator(validators::additional_properties_false())
        .draft(SchemaDraft::Draft2020_12)
}

fn google() -> RuleSet {
    RuleSet::new("google")
        .unsupported_all(&[
            Feature::AllOf,
            Feature::OneOf,
            Feature::Not,
            Feature::If,
            Feature::DependentRequired,
            Feature::DependentSchemas,
            Feature::PatternProperties,
            Feature::PropertyNames,
            Feature::PrefixItems,
            Feature::Contains,
            Feature::UniqueItems,
            Feature::ExclusiveMinimum,
            Feature::ExclusiveMaximum,
            Feature::MultipleOf,
            Feature::Pattern,
            Feature::Const,
        ])
        .unsupported(
            SimpleRule::new(Feature::Format).allow(["enum", "date-time"].map(|f| json!(f))),
        )
        .validator(validators::enum_values_strings())
        .draft(SchemaDraft::OpenApi30)
}

fn mistral() -> RuleSet {
    RuleSet::new("mistral")
        .unsupported(SimpleRule::new(Feature::RootAnyOf).context(FeatureContext::Root))
        .unsupported(SimpleRule::new(Feature::RootOneOf).context(FeatureContext::Root))
        .unsupported_all(&[
            Feature::Not,
            Feature::If,
            Feature::DependentRequired,
            Feature::DependentSchemas,
            Feature::PatternProperties,
            Feature::PropertyNames,
            Feature::Contains,
        ])
        .validator(validators::root_must_be_object())
        .draft(SchemaDraft::Draft2020_12)
}

fn xai() -> RuleSet {
    RuleSet::new("xai")
        .unsupported(SimpleRule::new(Feature::RootAnyOf).context(FeatureContext::Root))
        .unsupported_all(&[
            Feature::AllOf,
            Feature::Not,
            Feature::If,
            Feature::DependentRequired,
            Feature::DependentSchemas,
            Feature::Contains,
            Feature::MinLength,
            Feature::MaxLength,
            Feature::MinItems,
            Feature::MaxItems,
        ])
        .validator(validators::root_must_be_object())
        .draft(SchemaDraft::Draft2020_12)
}
