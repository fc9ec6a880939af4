//! LLM configuration loading and provider selection.

use std::path::Path;

use neetprep_core::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::types::LLMProvider;

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Stored LLM configuration (optionally read from a JSON file).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    #[serde(default = "default_preferred")]
    pub preferred_provider: String,
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default)]
    pub groq_api_key: Option<String>,
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    #[serde(default = "default_groq_model")]
    pub groq_model: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    /// Overrides the provider's API base (proxies, local gateways).
    #[serde(default)]
    pub api_base: Option<String>,
}

fn default_preferred() -> String {
    "auto".into()
}
fn default_openai_model() -> String {
    DEFAULT_OPENAI_MODEL.into()
}
fn default_groq_model() -> String {
    DEFAULT_GROQ_MODEL.into()
}
fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.into()
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            preferred_provider: default_preferred(),
            openai_api_key: None,
            groq_api_key: None,
            openai_model: default_openai_model(),
            groq_model: default_groq_model(),
            embedding_model: default_embedding_model(),
            api_base: None,
        }
    }
}

/// A provider ready to be called.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedProvider {
    pub provider: LLMProvider,
    pub model: String,
    pub api_key: String,
    pub api_base: String,
}

impl ResolvedProvider {
    pub fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }

    pub fn embeddings_url(&self) -> String {
        format!("{}/embeddings", self.api_base.trim_end_matches('/'))
    }
}

impl LLMConfig {
    /// Load config from file, falling back to env vars and defaults.
    pub fn load(config_path: &Path) -> Self {
        let mut config: LLMConfig = match std::fs::read_to_string(config_path) {
            Ok(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
                warn!("Ignoring malformed {}: {}", config_path.display(), e);
                LLMConfig::default()
            }),
            Err(_) => LLMConfig::default(),
        };

        if config.openai_api_key.is_none() {
            config.openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        }
        if config.groq_api_key.is_none() {
            config.groq_api_key = std::env::var("GROQ_API_KEY").ok();
        }
        if config.api_base.is_none() {
            config.api_base = std::env::var("OPENAI_BASE_URL").ok();
        }

        if let Some(resolved) = config.resolve_provider() {
            info!("LLM provider: {} ({})", resolved.provider, resolved.model);
        } else {
            warn!("No LLM provider configured; the tutor endpoint will reject requests");
        }

        config
    }

    /// Resolve which provider and model to use.
    pub fn resolve_provider(&self) -> Option<ResolvedProvider> {
        let pick = |provider: LLMProvider| -> Option<ResolvedProvider> {
            let (key, model) = match provider {
                LLMProvider::OpenAI => (&self.openai_api_key, &self.openai_model),
                LLMProvider::Groq => (&self.groq_api_key, &self.groq_model),
            };
            key.as_ref().map(|k| ResolvedProvider {
                provider,
                model: model.clone(),
                api_key: k.clone(),
                api_base: self
                    .api_base
                    .clone()
                    .unwrap_or_else(|| provider.default_api_base().to_string()),
            })
        };

        match self.preferred_provider.as_str() {
            "openai" => pick(LLMProvider::OpenAI),
            "groq" => pick(LLMProvider::Groq),
            // Auto mode: OpenAI > Groq
            "auto" => pick(LLMProvider::OpenAI).or_else(|| pick(LLMProvider::Groq)),
            _ => None,
        }
    }

    /// Provider for embeddings. Always OpenAI, whatever the chat
    /// preference: other providers do not serve the embedding model.
    pub fn embeddings_provider(&self) -> Result<ResolvedProvider> {
        let api_key = self.openai_api_key.clone().ok_or_else(|| {
            Error::Config("OPENAI_API_KEY is required for embeddings".into())
        })?;
        Ok(ResolvedProvider {
            provider: LLMProvider::OpenAI,
            model: self.embedding_model.clone(),
            api_key,
            api_base: self
                .api_base
                .clone()
                .unwrap_or_else(|| LLMProvider::OpenAI.default_api_base().to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_prefers_openai() {
        let config = LLMConfig {
            openai_api_key: Some("sk-o".into()),
            groq_api_key: Some("gsk".into()),
            ..Default::default()
        };
        let resolved = config.resolve_provider().unwrap();
        assert_eq!(resolved.provider, LLMProvider::OpenAI);
        assert_eq!(resolved.model, "gpt-4o-mini");
        assert_eq!(
            resolved.chat_completions_url(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_auto_falls_back_to_groq() {
        let config = LLMConfig {
            groq_api_key: Some("gsk".into()),
            ..Default::default()
        };
        let resolved = config.resolve_provider().unwrap();
        assert_eq!(resolved.provider, LLMProvider::Groq);
        assert_eq!(resolved.api_base, "https://api.groq.com/openai/v1");
    }

    #[test]
    fn test_explicit_provider_without_key() {
        let config = LLMConfig {
            preferred_provider: "groq".into(),
            openai_api_key: Some("sk-o".into()),
            ..Default::default()
        };
        assert!(config.resolve_provider().is_none());
    }

    #[test]
    fn test_api_base_override() {
        let config = LLMConfig {
            openai_api_key: Some("sk".into()),
            api_base: Some("http://127.0.0.1:9999/v1/".into()),
            ..Default::default()
        };
        let resolved = config.resolve_provider().unwrap();
        assert_eq!(
            resolved.embeddings_url(),
            "http://127.0.0.1:9999/v1/embeddings"
        );
    }

    #[test]
    fn test_embeddings_ignore_chat_preference() {
        let config = LLMConfig {
            preferred_provider: "groq".into(),
            openai_api_key: Some("sk-o".into()),
            groq_api_key: Some("gsk".into()),
            ..Default::default()
        };
        let resolved = config.embeddings_provider().unwrap();
        assert_eq!(resolved.provider, LLMProvider::OpenAI);
        assert_eq!(resolved.api_key, "sk-o");
        assert_eq!(resolved.model, DEFAULT_EMBEDDING_MODEL);
        assert_eq!(resolved.embeddings_url(), "https://api.openai.com/v1/embeddings");
    }

    #[test]
    fn test_embeddings_require_openai_key() {
        let config = LLMConfig {
            groq_api_key: Some("gsk".into()),
            ..Default::default()
        };
        assert!(matches!(config.embeddings_provider(), Err(Error::Config(_))));
    }

    #[test]
    fn test_embeddings_keep_api_base_override() {
        let config = LLMConfig {
            openai_api_key: Some("sk".into()),
            api_base: Some("http://127.0.0.1:9999/v1".into()),
            ..Default::default()
        };
        assert_eq!(
            config.embeddings_provider().unwrap().embeddings_url(),
            "http://127.0.0.1:9999/v1/embeddings"
        );
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("llm-config.json");
        std::fs::write(
            &path,
            r#"{"preferred_provider":"openai","openai_api_key":"from-file","openai_model":"gpt-4o"}"#,
        )
        .unwrap();

        let config = LLMConfig::load(&path);
        assert_eq!(config.openai_api_key.as_deref(), Some("from-file"));
        assert_eq!(config.openai_model, "gpt-4o");
        assert_eq!(config.embedding_model, DEFAULT_EMBEDDING_MODEL);
    }
}
