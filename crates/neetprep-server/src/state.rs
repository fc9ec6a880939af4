//! Shared application state.

use axum::http::HeaderMap;
use neetprep_chat::{LLMConfig, RelayOptions};
use neetprep_core::AppConfig;
use neetprep_store::SupabaseClient;
use reqwest::Client;

use crate::session::{cookie_value, SESSION_COOKIE};

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: AppConfig,
    pub llm_config: LLMConfig,
    /// Pooled client for the chat-completion API.
    pub http: Client,
    /// Anon-key client; see [`AppState::store_for`].
    pub store: SupabaseClient,
}

impl AppState {
    pub fn new(config: AppConfig, llm_config: LLMConfig) -> Self {
        let http = Client::new();
        let store = SupabaseClient::new(http.clone(), &config.supabase_url, &config.supabase_anon_key);
        Self {
            config,
            llm_config,
            http,
            store,
        }
    }

    /// Store client acting as the signed-in user when a session cookie is
    /// present, else as the anon role.
    pub fn store_for(&self, headers: &HeaderMap) -> SupabaseClient {
        match cookie_value(headers, SESSION_COOKIE) {
            Some(token) if !token.is_empty() => self.store.with_access_token(token),
            _ => self.store.clone(),
        }
    }

    pub fn relay_options(&self) -> RelayOptions {
        RelayOptions {
            idle_timeout: self.config.tutor.idle_timeout,
            terminator: self.config.tutor.stream_terminator,
        }
    }
}
