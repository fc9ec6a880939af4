//! Row shapes for the tables and RPCs the application uses.

use serde::{Deserialize, Serialize};

/// One record returned by the `match_documents` retrieval RPC.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContextRecord {
    #[serde(default)]
    pub lang: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub text: String,
}

/// A quiz question as shown to the student (no answer key).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuizQuestion {
    pub id: serde_json::Value,
    pub stem: String,
    #[serde(default)]
    pub choices: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnswerKeyRow {
    pub answer_key: serde_json::Value,
}

/// New row for the `documents` table.
#[derive(Debug, Clone, Serialize)]
pub struct NewDocument {
    pub text: String,
    pub topic: String,
    pub lang: String,
}

/// Inserted `documents` row; only the id is needed back.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentRow {
    pub id: serde_json::Value,
}

/// New row for the `embeddings` table.
#[derive(Debug, Clone, Serialize)]
pub struct NewEmbedding {
    pub document_id: serde_json::Value,
    pub embedding: Vec<f32>,
    pub chunk_id: String,
    pub chunk_index: usize,
}
