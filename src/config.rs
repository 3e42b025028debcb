//! Rule-set configuration files.
//!
//! Lets callers add providers and model overrides without code:
//!
//! ```json
//! {
//!   "ruleSets": [
//!     { "pattern": "^my-proxy/", "alias": "openai" },
//!     {
//!       "pattern": "acme/large-1",
//!       "match": "exact",
//!       "provider": "acme",
//!       "extends": "anthropic",
//!       "unsupported": [
//!         { "feature": "anyOf", "context": "nested" },
//!         { "feature": "minItems", "allowedValues": [0, 1] }
//!       ],
//!       "validators": ["allPropertiesRequired"]
//!     }
//!   ]
//! }
//! ```

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{ConfigError, RegistryError};
use crate::loader::load_schema;
use crate::providers;
use crate::registry::{ConstraintRegistry, ModelPattern, RuleSource};
use crate::rules::{RuleSet, SimpleRule};
use crate::types::{Feature, FeatureContext, SchemaDraft};
use crate::validators;

/// A whole configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegistryConfig {
    #[serde(default)]
    pub rule_sets: Vec<RuleSetConfig>,
}

/// How `pattern` is matched against `provider/model`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Exact,
    #[default]
    Regex,
}

/// One registry entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RuleSetConfig {
    pub pattern: String,
    #[serde(default, rename = "match")]
    pub match_kind: MatchKind,
    /// Bind to a built-in provider instead of listing rules.
    #[serde(default)]
    pub alias: Option<String>,
    /// Label for issue messages; defaults to `extends` or the pattern.
    #[serde(default)]
    pub provider: Option<String>,
    /// Start from a built-in provider's rules.
    #[serde(default)]
    pub extends: Option<String>,
    #[serde(default)]
    pub unsupported: Vec<RuleConfig>,
    #[serde(default)]
    pub validators: Vec<String>,
    #[serde(default)]
    pub preferred_draft: Option<SchemaDraft>,
}

/// A simple rule as written in config.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RuleConfig {
    pub feature: String,
    #[serde(default)]
    pub context: Option<FeatureContext>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub allowed_values: Option<Vec<Value>>,
}

impl RegistryConfig {
    /// Load a config file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file can't be read or doesn't match the format.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let value = load_schema(path)?;
        Self::from_value(value)
    }

    /// Parse a config from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the string doesn't match the format.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|source| ConfigError::Invalid { source })
    }

    fn from_value(value: Value) -> Result<Self, ConfigError> {
        serde_json::from_value(value).map_err(|source| ConfigError::Invalid { source })
    }

    /// Register every entry, in file order.
    ///
    /// Entries before a failing one stay registered.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for unknown features, validators or providers,
    /// or an invalid regex.
    pub fn apply(&self, registry: &mut ConstraintRegistry) -> Result<(), ConfigError> {
        for entry in &self.rule_sets {
            let pattern = entry.model_pattern()?;
            let source = entry.rule_source()?;
            registry.register(pattern, source)?;
        }
        Ok(())
    }
}

impl RuleSetConfig {
    fn model_pattern(&self) -> Result<ModelPattern, RegistryError> {
        match self.match_kind {
            MatchKind::Exact => Ok(ModelPattern::exact(&self.pattern)),
            MatchKind::Regex => ModelPattern::regex(&self.pattern),
        }
    }

    fn rule_source(&self) -> Result<RuleSource, ConfigError> {
        if let Some(alias) = &self.alias {
            return Ok(RuleSource::Alias(alias.clone()));
        }

        let mut rules = match &self.extends {
            Some(base) => {
                let base_rules = providers::builtin(base).ok_or_else(|| {
                    RegistryError::UnknownProvider {
                        name: base.clone(),
                        valid: providers::names().iter().map(|n| n.to_string()).collect(),
                    }
                })?;
                RuleSet::clone(&base_rules)
            }
            None => RuleSet::default(),
        };

        rules.provider = self
            .provider
            .clone()
            .or_else(|| self.extends.clone())
            .unwrap_or_else(|| self.pattern.clone());

        for rule in &self.unsupported {
            rules = rules.unsupported(rule.to_rule(&self.pattern)?);
        }

        for name in &self.validators {
            let validator =
                validators::by_name(name).ok_or_else(|| ConfigError::UnknownValidator {
                    pattern: self.pattern.clone(),
                    name: name.clone(),
                    valid: validators::VALIDATOR_NAMES
                        .iter()
                        .map(|n| n.to_string())
                        .collect(),
                })?;
            rules = rules.validator(validator);
        }

        if self.preferred_draft.is_some() {
            rules.preferred_draft = self.preferred_draft;
        }

        Ok(RuleSource::from(rules))
    }
}

impl RuleConfig {
    fn to_rule(&self, pattern: &str) -> Result<SimpleRule, ConfigError> {
        let feature: Feature = self
            .feature
            .parse()
            .map_err(|name| ConfigError::UnknownFeature {
                pattern: pattern.to_string(),
                name,
            })?;
        if !feature.has_simple_check() {
            return Err(ConfigError::ValidatorOnlyFeature {
                pattern: pattern.to_string(),
                feature: self.feature.clone(),
            });
        }
        Ok(SimpleRule {
            feature,
            context: self.context,
            message: self.message.clone(),
            allowed_values: self.allowed_values.clone(),
        })
    }
}
