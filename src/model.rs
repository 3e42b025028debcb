//! Model identifiers: `provider/model`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ModelIdError;

/// A validated `(provider, model)` pair.
///
/// The provider is trimmed and lowercased; the model id is kept verbatim
/// and may itself contain `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelId {
    pub provider: String,
    pub model_id: String,
}

impl ModelId {
    /// Build from separate parts.
    ///
    /// # Errors
    ///
    /// Returns `ModelIdError` if either part is empty.
    pub fn new(provider: &str, model_id: &str) -> Result<Self, ModelIdError> {
        let input = format!("{}/{}", provider, model_id);
        let provider = provider.trim().to_lowercase();
        if provider.is_empty() {
            return Err(ModelIdError::EmptyProvider { input });
        }
        if model_id.trim().is_empty() {
            return Err(ModelIdError::EmptyModelId { input });
        }
        Ok(Self {
            provider,
            model_id: model_id.to_string(),
        })
    }

    /// Parse `provider/model`, splitting on the first `/`.
    ///
    /// # Errors
    ///
    /// Returns `ModelIdError` if there is no `/` or either side is empty.
    pub fn parse(input: &str) -> Result<Self, ModelIdError> {
        let Some((provider, model_id)) = input.split_once('/') else {
            return Err(ModelIdError::MissingSeparator {
                input: input.to_string(),
            });
        };
        Self::new(provider, model_id).map_err(|e| match e {
            ModelIdError::EmptyProvider { .. } => ModelIdError::EmptyProvider {
                input: input.to_string(),
            },
            ModelIdError::EmptyModelId { .. } => ModelIdError::EmptyModelId {
                input: input.to_string(),
            },
            other => other,
        })
    }

    /// The registry matching key: `provider/model`.
    pub fn canonical(&self) -> String {
        format!("{}/{}", self.provider, self.model_id)
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.provider, self.model_id)
    }
}

impl FromStr for ModelId {
    type Err = ModelIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for ModelId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            #[serde(rename_all = "camelCase")]
            Parts {
                provider: String,
                model_id: String,
            },
        }

        let parsed = match Repr::deserialize(deserializer)? {
            Repr::Text(s) => ModelId::parse(&s),
            Repr::Parts { provider, model_id } => ModelId::new(&provider, &model_id),
        };
        parsed.map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_splits_on_first_slash() {
        let id = ModelId::parse("OpenRouter/meta-llama/llama-3-70b").unwrap();
        assert_eq!(id.provider, "openrouter");
        assert_eq!(id.model_id, "meta-llama/llama-3-70b");
        assert_eq!(id.canonical(), "openrouter/meta-llama/llama-3-70b");
    }

    #[test]
    fn parse_rejects_missing_separator() {
        assert_eq!(
            ModelId::parse("gpt-4o"),
            Err(ModelIdError::MissingSeparator {
                input: "gpt-4o".into()
            })
        );
    }

    #[test]
    fn parse_rejects_empty_parts() {
        assert!(matches!(
            ModelId::parse("/gpt-4o"),
            Err(ModelIdError::EmptyProvider { input }) if input == "/gpt-4o"
        ));
        assert!(matches!(
            ModelId::parse("openai/"),
            Err(ModelIdError::EmptyModelId { .. })
        ));
    }

    #[test]
    fn deserialize_both_forms() {
        let a: ModelId = serde_json::from_value(json!("anthropic/claude-sonnet-4")).unwrap();
        let b: ModelId =
            serde_json::from_value(json!({ "provider": "Anthropic", "modelId": "claude-sonnet-4" }))
                .unwrap();
        assert_eq!(a, b);

        let err = serde_json::from_value::<ModelId>(json!("no-separator"));
        assert!(err.is_err());
    }
}
