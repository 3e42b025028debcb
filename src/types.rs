//! Core types for schema compatibility checking.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A JSON Schema construct that a provider may refuse.
///
/// Most variants name a single keyword. `RootAnyOf`, `RootOneOf`,
/// `Recursive`, `OptionalProperties` and `RootNotObject` are derived
/// conditions rather than keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Feature {
    // Composition
    AllOf,
    AnyOf,
    OneOf,
    Not,
    // Conditional
    If,
    DependentRequired,
    DependentSchemas,
    // Object
    PatternProperties,
    PropertyNames,
    AdditionalProperties,
    // Array
    PrefixItems,
    Contains,
    UniqueItems,
    MinItems,
    MaxItems,
    // Numeric validation
    Minimum,
    Maximum,
    ExclusiveMinimum,
    ExclusiveMaximum,
    MultipleOf,
    // String validation
    MinLength,
    MaxLength,
    Pattern,
    Format,
    // Values
    Enum,
    Const,
    // Derived
    RootAnyOf,
    RootOneOf,
    Recursive,
    OptionalProperties,
    RootNotObject,
}

impl Feature {
    /// Every feature, in declaration order.
    pub const ALL: &'static [Feature] = &[
        Feature::AllOf,
        Feature::AnyOf,
        Feature::OneOf,
        Feature::Not,
        Feature::If,
        Feature::DependentRequired,
        Feature::DependentSchemas,
        Feature::PatternProperties,
        Feature::PropertyNames,
        Feature::AdditionalProperties,
        Feature::PrefixItems,
        Feature::Contains,
        Feature::UniqueItems,
        Feature::MinItems,
        Feature::MaxItems,
        Feature::Minimum,
        Feature::Maximum,
        Feature::ExclusiveMinimum,
        Feature::ExclusiveMaximum,
        Feature::MultipleOf,
        Feature::MinLength,
        Feature::MaxLength,
        Feature::Pattern,
        Feature::Format,
        Feature::Enum,
        Feature::Const,
        Feature::RootAnyOf,
        Feature::RootOneOf,
        Feature::Recursive,
        Feature::OptionalProperties,
        Feature::RootNotObject,
    ];

    /// Numeric keywords checked on every node.
    pub const NUMERIC_KEYWORDS: &'static [Feature] = &[
        Feature::Minimum,
        Feature::Maximum,
        Feature::ExclusiveMinimum,
        Feature::ExclusiveMaximum,
        Feature::MultipleOf,
    ];

    /// String keywords checked on every node.
    pub const STRING_KEYWORDS: &'static [Feature] = &[
        Feature::MinLength,
        Feature::MaxLength,
        Feature::Pattern,
        Feature::Format,
    ];

    /// Value keywords checked on every node, by presence.
    pub const VALUE_KEYWORDS: &'static [Feature] = &[Feature::Enum, Feature::Const];

    /// Whether the traversal can refuse this feature through a simple rule.
    ///
    /// The rest are reported only by custom validators.
    pub fn has_simple_check(&self) -> bool {
        !matches!(
            self,
            Feature::AdditionalProperties | Feature::OptionalProperties | Feature::RootNotObject
        )
    }

    /// Returns the feature name as it appears in issues and config files.
    ///
    /// For keyword features this is also the JSON Schema keyword.
    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::AllOf => "allOf",
            Feature::AnyOf => "anyOf",
            Feature::OneOf => "oneOf",
            Feature::Not => "not",
            Feature::If => "if",
            Feature::DependentRequired => "dependentRequired",
            Feature::DependentSchemas => "dependentSchemas",
            Feature::PatternProperties => "patternProperties",
            Feature::PropertyNames => "propertyNames",
            Feature::AdditionalProperties => "additionalProperties",
            Feature::PrefixItems => "prefixItems",
            Feature::Contains => "contains",
            Feature::UniqueItems => "uniqueItems",
            Feature::MinItems => "minItems",
            Feature::MaxItems => "maxItems",
            Feature::Minimum => "minimum",
            Feature::Maximum => "maximum",
            Feature::ExclusiveMinimum => "exclusiveMinimum",
            Feature::ExclusiveMaximum => "exclusiveMaximum",
            Feature::MultipleOf => "multipleOf",
            Feature::MinLength => "minLength",
            Feature::MaxLength => "maxLength",
            Feature::Pattern => "pattern",
            Feature::Format => "format",
            Feature::Enum => "enum",
            Feature::Const => "const",
            Feature::RootAnyOf => "rootAnyOf",
            Feature::RootOneOf => "rootOneOf",
            Feature::Recursive => "recursive",
            Feature::OptionalProperties => "optionalProperties",
            Feature::RootNotObject => "rootNotObject",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Feature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Feature::ALL
            .iter()
            .copied()
            .find(|feature| feature.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

impl From<Feature> for String {
    fn from(feature: Feature) -> Self {
        feature.as_str().to_string()
    }
}

/// Where in the schema tree a rule applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureContext {
    /// Only the outermost document node.
    Root,
    /// Every node except the outermost one.
    Nested,
    /// Anywhere.
    #[default]
    Any,
}

impl FeatureContext {
    /// Context of a node given its rootness.
    pub fn of(is_root: bool) -> Self {
        if is_root {
            FeatureContext::Root
        } else {
            FeatureContext::Nested
        }
    }

    /// Whether a rule declared with `self` applies to a node in `node`.
    pub fn covers(&self, node: FeatureContext) -> bool {
        match self {
            FeatureContext::Any => true,
            declared => node == FeatureContext::Any || *declared == node,
        }
    }
}

/// JSON Schema dialect a provider prefers to receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemaDraft {
    #[serde(rename = "draft-07")]
    Draft07,
    #[serde(rename = "2019-09")]
    Draft2019_09,
    #[serde(rename = "2020-12")]
    Draft2020_12,
    #[serde(rename = "openapi-3.0")]
    OpenApi30,
}

/// A single compatibility finding.
///
/// `feature` is a [`Feature`] name for built-in checks, or any string a
/// provider's custom validator chooses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Path segments from the document root to the offending node.
    pub path: Vec<String>,
    pub feature: String,
    /// Human-readable explanation.
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: &[String], feature: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.to_vec(),
            feature: feature.into(),
            message: message.into(),
        }
    }

    /// The path as an RFC 6901 JSON Pointer (empty string for the root).
    pub fn pointer(&self) -> String {
        to_pointer(&self.path)
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pointer = self.pointer();
        let location = if pointer.is_empty() { "/" } else { &pointer };
        write!(f, "{}: [{}] {}", location, self.feature, self.message)
    }
}

/// Render path segments as a JSON Pointer, escaping `~` and `/`.
pub fn to_pointer(path: &[String]) -> String {
    path.iter()
        .map(|segment| format!("/{}", segment.replace('~', "~0").replace('/', "~1")))
        .collect()
}

/// Extend a path by one segment, returning the new path.
pub(crate) fn child_path(path: &[String], segment: impl Into<String>) -> Vec<String> {
    let mut next = Vec::with_capacity(path.len() + 1);
    next.extend_from_slice(path);
    next.push(segment.into());
    next
}
