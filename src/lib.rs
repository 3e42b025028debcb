//! Structured Output Schema Compatibility
//!
//! Predicts whether an AI provider's structured output mode will accept a
//! JSON Schema, before the request is sent.
//!
//! Each provider accepts a subset of JSON Schema. This crate describes those
//! subsets as rule sets, maps model identifiers to rule sets through a
//! pattern registry, and walks a schema reporting every construct the
//! resolved provider refuses, with its location.
//!
//! # Example
//!
//! ```
//! use schema_compat::{check, ConstraintRegistry, ModelId};
//! use serde_json::json;
//!
//! let schema = json!({
//!     "type": "object",
//!     "properties": {
//!         "pet": {
//!             "oneOf": [
//!                 { "type": "object", "properties": { "barks": { "type": "boolean" } } },
//!                 { "type": "object", "properties": { "meows": { "type": "boolean" } } }
//!             ]
//!         }
//!     }
//! });
//!
//! let registry = ConstraintRegistry::with_builtins();
//! let model = ModelId::parse("google/gemini-2.0-flash").unwrap();
//! let report = check(&schema, &model, &registry);
//!
//! assert!(!report.compatible);
//! assert_eq!(report.issues[0].feature, "oneOf");
//! assert_eq!(report.issues[0].path, vec!["properties", "pet"]);
//! ```
//!
//! # Rule Shapes
//!
//! | Rule | Fires when |
//! |------|------------|
//! | `SimpleRule::new(f)` | `f` appears anywhere |
//! | `.context(FeatureContext::Root)` | `f` appears on the document root only |
//! | `.context(FeatureContext::Nested)` | `f` appears below the root only |
//! | `.allow([v, ...])` | `f` appears with a value outside the list |
//! | `CustomRule` / `CustomValidator` | the predicate returns issues |
//!
//! # Model Resolution
//!
//! An exact `provider/model` pattern always wins; otherwise the most recently
//! registered matching regex wins; otherwise the model is unchecked and a
//! warning is logged.

mod checker;
mod config;
mod document;
mod error;
mod loader;
mod model;
mod providers;
pub mod registry;
mod rules;
mod traverse;
mod types;
pub mod validators;

pub use checker::{
    check, check_document, check_path, ensure_compiles, BatchReport, CheckOptions, CheckReport,
    FileResult, FileStatus,
};
pub use config::{MatchKind, RegistryConfig, RuleConfig, RuleSetConfig};
pub use document::{NodeId, NodeRef, SchemaDocument, SchemaNode, SchemaSlot};
pub use error::{CheckError, ConfigError, LoadError, ModelIdError, RegistryError};
pub use loader::{is_url, load_schema, load_schema_auto, load_schema_str};
pub use model::ModelId;
pub use providers::{builtin as builtin_rules, canonical_name as canonical_provider};
pub use registry::{ConstraintRegistry, ModelPattern, RuleSource};
pub use rules::{
    ConstraintRule, CustomRule, CustomValidator, ResolvedConstraints, RuleSet, SimpleRule,
    ValidateFn,
};
pub use traverse::traverse;
pub use types::{json_type_name, to_pointer, Feature, FeatureContext, SchemaDraft, ValidationIssue};

#[cfg(feature = "remote")]
pub use loader::load_schema_url;

/// Canonical names of the built-in providers.
pub fn builtin_providers() -> &'static [&'static str] {
    providers::names()
}
