//! Configuration loaded from the environment.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};

/// Number of context records requested from retrieval per question.
pub const DEFAULT_MATCH_COUNT: usize = 3;
/// Seconds a tutor stream may sit without a fragment before it is aborted.
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 60;

/// Settings for the tutor streaming endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TutorSettings {
    pub match_count: usize,
    /// `None` disables the idle guard.
    pub idle_timeout: Option<Duration>,
    /// Append an in-band completion marker before closing the stream.
    pub stream_terminator: bool,
}

impl Default for TutorSettings {
    fn default() -> Self {
        Self {
            match_count: DEFAULT_MATCH_COUNT,
            idle_timeout: Some(Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS)),
            stream_terminator: false,
        }
    }
}

/// Top-level NeetPrep configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server port.
    pub port: u16,
    /// Base URL of the Supabase project (PostgREST lives under `/rest/v1`).
    pub supabase_url: String,
    /// Public anon key, sent with every request.
    pub supabase_anon_key: String,
    /// Service role key, only needed by the ingest command.
    pub supabase_service_role_key: Option<String>,
    /// Path of the LLM provider config file.
    pub llm_config_file: PathBuf,
    /// Directory scanned by `neetprep ingest`.
    pub content_dir: PathBuf,
    pub tutor: TutorSettings,
}

impl AppConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env() -> Result<Self> {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let supabase_url = first_var(&["SUPABASE_URL", "NEXT_PUBLIC_SUPABASE_URL"])
            .ok_or_else(|| Error::Config("SUPABASE_URL is not set".into()))?;
        let supabase_anon_key = first_var(&["SUPABASE_ANON_KEY", "NEXT_PUBLIC_SUPABASE_ANON_KEY"])
            .ok_or_else(|| Error::Config("SUPABASE_ANON_KEY is not set".into()))?;

        let llm_config_file = std::env::var("NEETPREP_LLM_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("llm-config.json"));
        let content_dir = std::env::var("CONTENT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("content"));

        let match_count = std::env::var("TUTOR_MATCH_COUNT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MATCH_COUNT);
        let idle_secs = std::env::var("TUTOR_IDLE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_IDLE_TIMEOUT_SECS);
        let stream_terminator = std::env::var("TUTOR_STREAM_TERMINATOR")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        Ok(Self {
            port,
            supabase_url,
            supabase_anon_key,
            supabase_service_role_key: first_var(&["SUPABASE_SERVICE_ROLE_KEY"]),
            llm_config_file,
            content_dir,
            tutor: TutorSettings {
                match_count,
                idle_timeout: idle_timeout(idle_secs),
                stream_terminator,
            },
        })
    }
}

fn first_var(keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| std::env::var(k).ok())
        .find(|v| !v.trim().is_empty())
}

/// Interpret an env flag; anything unrecognised is treated as off.
pub fn parse_flag(value: &str) -> bool {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "" | "0" | "false" | "no" | "off" => false,
        other => {
            warn!("Unrecognised flag value {:?}, treating as off", other);
            false
        }
    }
}

/// Zero seconds disables the idle guard.
pub fn idle_timeout(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
