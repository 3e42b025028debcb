//! Rule taxonomy: what a provider refuses and where.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::document::NodeRef;
use crate::types::{Feature, FeatureContext, SchemaDraft, ValidationIssue};

/// Procedural check over one node: `(node, path, is_root) -> issues`.
pub type ValidateFn =
    dyn Fn(NodeRef<'_>, &[String], bool) -> Vec<ValidationIssue> + Send + Sync;

/// Feature that is refused unless its value is in an allow-list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleRule {
    pub feature: Feature,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<FeatureContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Values that are accepted despite the rule. `None` refuses every use.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<Value>>,
}

impl SimpleRule {
    pub fn new(feature: Feature) -> Self {
        Self {
            feature,
            context: None,
            message: None,
            allowed_values: None,
        }
    }

    pub fn context(mut self, context: FeatureContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn allow(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.allowed_values = Some(values.into_iter().collect());
        self
    }

    /// Whether this rule refuses `value`.
    ///
    /// With an allow-list, only a concrete value outside the list is refused.
    pub fn refuses(&self, value: Option<&Value>) -> bool {
        match (&self.allowed_values, value) {
            (None, _) => true,
            (Some(allowed), Some(value)) => !allowed.iter().any(|a| same_value(a, value)),
            (Some(_), None) => false,
        }
    }
}

/// Numbers compare numerically; everything else by JSON equality.
///
/// Integers compare exactly so large values stay distinct; floats fall back
/// to `f64`.
fn same_value(a: &Value, b: &Value) -> bool {
    let (Value::Number(x), Value::Number(y)) = (a, b) else {
        return a == b;
    };
    if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
        return x == y;
    }
    x.as_f64() == y.as_f64()
}

/// A feature guarded by a procedural predicate.
#[derive(Clone)]
pub struct CustomRule {
    pub feature: Feature,
    pub context: Option<FeatureContext>,
    pub validate: Arc<ValidateFn>,
}

impl CustomRule {
    pub fn new<F>(feature: Feature, validate: F) -> Self
    where
        F: Fn(NodeRef<'_>, &[String], bool) -> Vec<ValidationIssue> + Send + Sync + 'static,
    {
        Self {
            feature,
            context: None,
            validate: Arc::new(validate),
        }
    }

    pub fn context(mut self, context: FeatureContext) -> Self {
        self.context = Some(context);
        self
    }
}

impl fmt::Debug for CustomRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomRule")
            .field("feature", &self.feature)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

/// One entry in a rule set's unsupported list.
#[derive(Debug, Clone)]
pub enum ConstraintRule {
    Simple(SimpleRule),
    Custom(CustomRule),
}

impl ConstraintRule {
    pub fn feature(&self) -> Feature {
        match self {
            ConstraintRule::Simple(rule) => rule.feature,
            ConstraintRule::Custom(rule) => rule.feature,
        }
    }

    pub fn context(&self) -> FeatureContext {
        match self {
            ConstraintRule::Simple(rule) => rule.context,
            ConstraintRule::Custom(rule) => rule.context,
        }
        .unwrap_or_default()
    }
}

impl From<SimpleRule> for ConstraintRule {
    fn from(rule: SimpleRule) -> Self {
        ConstraintRule::Simple(rule)
    }
}

impl From<Feature> for ConstraintRule {
    fn from(feature: Feature) -> Self {
        ConstraintRule::Simple(SimpleRule::new(feature))
    }
}

impl From<CustomRule> for ConstraintRule {
    fn from(rule: CustomRule) -> Self {
        ConstraintRule::Custom(rule)
    }
}

/// Named check run on every visited node.
#[derive(Clone)]
pub struct CustomValidator {
    pub name: String,
    pub validate: Arc<ValidateFn>,
}

impl CustomValidator {
    pub fn new<F>(name: impl Into<String>, validate: F) -> Self
    where
        F: Fn(NodeRef<'_>, &[String], bool) -> Vec<ValidationIssue> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            validate: Arc::new(validate),
        }
    }
}

impl fmt::Debug for CustomValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomValidator")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A provider's accepted JSON Schema subset, expressed as refusals.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    /// Label reported in messages and resolution results.
    pub provider: String,
    pub unsupported: Vec<ConstraintRule>,
    pub validators: Vec<CustomValidator>,
    pub preferred_draft: Option<SchemaDraft>,
}

impl RuleSet {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            ..Self::default()
        }
    }

    /// Add a refusal.
    pub fn unsupported(mut self, rule: impl Into<ConstraintRule>) -> Self {
        self.unsupported.push(rule.into());
        self
    }

    /// Add a refusal for each feature, in every context.
    pub fn unsupported_all(mut self, features: &[Feature]) -> Self {
        self.unsupported
            .extend(features.iter().map(|f| ConstraintRule::from(*f)));
        self
    }

    pub fn validator(mut self, validator: CustomValidator) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn draft(mut self, draft: SchemaDraft) -> Self {
        self.preferred_draft = Some(draft);
        self
    }

    /// Whether nothing is refused and nothing is checked.
    pub fn is_permissive(&self) -> bool {
        self.unsupported.is_empty() && self.validators.is_empty()
    }

    /// First simple rule refusing `feature` with `value` in `context`.
    ///
    /// `FeatureContext::Any` asks regardless of where a rule applies.
    pub fn refusal(
        &self,
        feature: Feature,
        context: FeatureContext,
        value: Option<&Value>,
    ) -> Option<&SimpleRule> {
        self.unsupported.iter().find_map(|rule| match rule {
            ConstraintRule::Simple(simple) => (simple.feature == feature
                && simple.context.unwrap_or_default().covers(context)
                && simple.refuses(value))
            .then_some(simple),
            ConstraintRule::Custom(_) => None,
        })
    }

    /// Whether `feature` has any rule at all, in any context.
    pub fn mentions(&self, feature: Feature) -> bool {
        self.unsupported.iter().any(|rule| rule.feature() == feature)
    }
}

/// A rule set bound to the model it was resolved for.
#[derive(Debug, Clone)]
pub struct ResolvedConstraints {
    pub provider: String,
    pub model_id: String,
    pub rules: Arc<RuleSet>,
}

impl ResolvedConstraints {
    pub fn new(provider: impl Into<String>, model_id: impl Into<String>, rules: Arc<RuleSet>) -> Self {
        Self {
            provider: provider.into(),
            model_id: model_id.into(),
            rules,
        }
    }

    /// Issue message for a simple rule that fired.
    pub(crate) fn message_for(&self, rule: &SimpleRule, value: Option<&Value>) -> String {
        if let Some(message) = &rule.message {
            return message.clone();
        }
        if let (Some(allowed), Some(value)) = (&rule.allowed_values, value) {
            let allowed: Vec<String> = allowed.iter().map(Value::to_string).collect();
            return format!(
                "{} does not support '{}' = {} (allowed: {})",
                self.provider,
                rule.feature,
                value,
                allowed.join(", ")
            );
        }
        let suffix = match rule.context.unwrap_or_default() {
            FeatureContext::Root => " at the schema root",
            FeatureContext::Nested => " in nested schemas",
            FeatureContext::Any => "",
        };
        format!("{} does not support '{}'{}", self.provider, rule.feature, suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn refuses_without_allow_list() {
        let rule = SimpleRule::new(Feature::Pattern);
        assert!(rule.refuses(Some(&json!("^a$"))));
        assert!(rule.refuses(None));
    }

    #[test]
    fn allow_list_membership() {
        let rule = SimpleRule::new(Feature::MinItems).allow([json!(0), json!(1)]);
        assert!(!rule.refuses(Some(&json!(0))));
        assert!(!rule.refuses(Some(&json!(1))));
        assert!(!rule.refuses(Some(&json!(1.0))));
        assert!(rule.refuses(Some(&json!(2))));
        // No concrete value: nothing to compare, nothing refused
        assert!(!rule.refuses(None));
    }

    #[test]
    fn allow_list_keeps_large_integers_distinct() {
        let rule = SimpleRule::new(Feature::Maximum).allow([json!(9_007_199_254_740_992u64)]);
        assert!(!rule.refuses(Some(&json!(9_007_199_254_740_992u64))));
        assert!(rule.refuses(Some(&json!(9_007_199_254_740_993u64))));

        let rule = SimpleRule::new(Feature::Maximum).allow([json!(u64::MAX)]);
        assert!(rule.refuses(Some(&json!(u64::MAX - 1))));
        assert!(rule.refuses(Some(&json!(-1))));
    }

    #[test]
    fn refusal_respects_context() {
        let rules = RuleSet::new("acme")
            .unsupported(SimpleRule::new(Feature::AllOf).context(FeatureContext::Root));

        assert!(rules
            .refusal(Feature::AllOf, FeatureContext::Root, None)
            .is_some());
        assert!(rules
            .refusal(Feature::AllOf, FeatureContext::Nested, None)
            .is_none());
        assert!(rules
            .refusal(Feature::AllOf, FeatureContext::Any, None)
            .is_some());
    }

    #[test]
    fn custom_rules_are_not_refusals() {
        let rules = RuleSet::new("acme")
            .unsupported(CustomRule::new(Feature::Enum, |_, _, _| Vec::new()));
        assert!(rules.refusal(Feature::Enum, FeatureContext::Any, None).is_none());
        assert!(rules.mentions(Feature::Enum));
    }

    #[test]
    fn default_messages() {
        let resolved = ResolvedConstraints::new("acme", "m1", Arc::new(RuleSet::new("acme")));

        let rule = SimpleRule::new(Feature::OneOf);
        assert_eq!(resolved.message_for(&rule, None), "acme does not support 'oneOf'");

        let rule = SimpleRule::new(Feature::AnyOf).context(FeatureContext::Nested);
        assert_eq!(
            resolved.message_for(&rule, None),
            "acme does not support 'anyOf' in nested schemas"
        );

        let rule = SimpleRule::new(Feature::MinItems).allow([json!(0), json!(1)]);
        assert_eq!(
            resolved.message_for(&rule, Some(&json!(3))),
            "acme does not support 'minItems' = 3 (allowed: 0, 1)"
        );

        let rule = SimpleRule::new(Feature::Format).message("no formats");
        assert_eq!(resolved.message_for(&rule, None), "no formats");
    }
}
