//! Quiz route — fetch a question, check an answer.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use neetprep_core::Error;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/quiz", post(quiz))
}

#[derive(Debug, Default, Deserialize)]
struct QuizAction {
    #[serde(default)]
    action: Option<String>,
    #[serde(default, rename = "questionId")]
    question_id: Option<Value>,
    #[serde(default)]
    answer: Option<Value>,
}

/// POST /api/quiz — `start`, `submit`, or a no-op acknowledgement.
///
/// Anything but a JSON object is treated as an empty body.
async fn quiz(State(state): State<Arc<AppState>>, headers: HeaderMap, body: Bytes) -> Json<Value> {
    let req = match serde_json::from_slice::<Value>(&body) {
        Ok(value @ Value::Object(_)) => {
            serde_json::from_value::<QuizAction>(value).unwrap_or_default()
        }
        _ => QuizAction::default(),
    };
    let store = state.store_for(&headers);

    match req.action.as_deref() {
        Some("start") => {
            let question = store.first_question().await.unwrap_or_else(|e| {
                warn!("Failed to load quiz question: {}", e);
                None
            });
            Json(json!({ "question": question }))
        }
        Some("submit") => {
            let key = match &req.question_id {
                Some(id) => match store.answer_key(id).await {
                    Ok(key) => Some(key),
                    Err(Error::NotFound(_)) => None,
                    Err(e) => {
                        warn!("Failed to load answer key: {}", e);
                        None
                    }
                },
                None => None,
            };
            let correct = matches!((&key, &req.answer), (Some(k), Some(a)) if k == a);
            Json(json!({ "result": if correct { "correct" } else { "incorrect" } }))
        }
        _ => Json(json!({ "ok": true })),
    }
}
