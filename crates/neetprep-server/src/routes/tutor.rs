//! AI tutor route — retrieval, prompt assembly, and the streamed answer.

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use neetprep_chat::types::TutorRequest;
use neetprep_chat::{prompt, providers, ChannelSink, RelaySession};
use neetprep_core::Error;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/ai/tutor", post(ask_tutor))
}

/// POST /api/ai/tutor — stream the answer as plain text.
///
/// Anything that fails before the upstream call is open becomes a JSON
/// error. Once the 200 is sent, failures can only end the body early.
async fn ask_tutor(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let req: TutorRequest = serde_json::from_slice(&body)
        .map_err(|e| Error::InvalidRequest(format!("invalid JSON body: {}", e)))?;
    let question = req.question.trim();
    if question.is_empty() {
        return Err(Error::InvalidRequest("question is required".into()).into());
    }

    let provider = state
        .llm_config
        .resolve_provider()
        .ok_or_else(|| Error::Config("No LLM provider configured".into()))?;

    let store = state.store_for(&headers);
    let context = match store
        .match_documents(question, state.config.tutor.match_count)
        .await
    {
        Ok(records) => records,
        Err(e) => {
            warn!("Retrieval failed, answering without context: {}", e);
            Vec::new()
        }
    };
    debug!("Tutor question with {} context records", context.len());

    let messages = prompt::build_messages(&context, question);
    let upstream = providers::open_chat_stream(&state.http, &provider, &messages).await?;

    let (sink, body) = ChannelSink::channel();
    let mut session = RelaySession::new(sink, state.relay_options());
    tokio::spawn(async move {
        session.run(upstream).await;
    });

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(body),
    )
        .into_response())
}
