//! Error types for loading, registry configuration and compatibility checks.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::ValidationIssue;

/// Malformed model identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelIdError {
    #[error("invalid model identifier \"{input}\": expected provider/model")]
    MissingSeparator { input: String },

    #[error("invalid model identifier \"{input}\": provider is empty")]
    EmptyProvider { input: String },

    #[error("invalid model identifier \"{input}\": model id is empty")]
    EmptyModelId { input: String },
}

/// Registry configuration errors.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown provider \"{name}\": expected one of {}", valid.join(", "))]
    UnknownProvider { name: String, valid: Vec<String> },

    #[error("invalid model pattern \"{pattern}\": {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Errors while reading a JSON document.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },
}

/// Errors in a rule-set configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("invalid rule-set config: {source}")]
    Invalid {
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown feature \"{name}\" in rule set for {pattern}")]
    UnknownFeature { pattern: String, name: String },

    #[error("feature \"{feature}\" in rule set for {pattern} is only reported by custom validators, not simple rules")]
    ValidatorOnlyFeature { pattern: String, feature: String },

    #[error("unknown validator \"{name}\" in rule set for {pattern}: expected one of {}", valid.join(", "))]
    UnknownValidator {
        pattern: String,
        name: String,
        valid: Vec<String>,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Errors from the checking facade.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error(transparent)]
    ModelId(#[from] ModelIdError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid schema: {message}")]
    InvalidSchema { message: String },

    #[error("schema is not compatible: {} issue(s)", issues.len())]
    Incompatible { issues: Vec<ValidationIssue> },
}

impl ModelIdError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

impl RegistryError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            LoadError::NetworkError { .. } => 3,
            LoadError::InvalidJson { .. } => 2,
        }
    }
}

impl ConfigError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ConfigError::Load(e) => e.exit_code(),
            ConfigError::Registry(e) => e.exit_code(),
            _ => 2,
        }
    }
}

impl CheckError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            CheckError::ModelId(e) => e.exit_code(),
            CheckError::Load(e) => e.exit_code(),
            CheckError::Config(e) => e.exit_code(),
            CheckError::InvalidSchema { .. } => 2,
            CheckError::Incompatible { .. } => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_exit_codes() {
        let err = LoadError::FileNotFound {
            path: PathBuf::from("schema.json"),
        };
        assert_eq!(err.exit_code(), 3);

        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = LoadError::InvalidJson { source };
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn check_error_exit_codes() {
        let err = CheckError::Incompatible { issues: vec![] };
        assert_eq!(err.exit_code(), 1);

        let err = CheckError::from(ModelIdError::EmptyProvider {
            input: "/gpt".into(),
        });
        assert_eq!(err.exit_code(), 2);

        let err = CheckError::from(ConfigError::from(LoadError::FileNotFound {
            path: PathBuf::from("rules.json"),
        }));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn unknown_provider_lists_valid_names() {
        let err = RegistryError::UnknownProvider {
            name: "acme".into(),
            valid: vec!["openai".into(), "anthropic".into()],
        };
        assert_eq!(
            err.to_string(),
            "unknown provider \"acme\": expected one of openai, anthropic"
        );
    }
}
