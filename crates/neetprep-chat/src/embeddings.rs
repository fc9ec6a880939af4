//! Embedding requests for the ingest pipeline.

use neetprep_core::{Error, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::config::ResolvedProvider;

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Embed one input string with `model`.
pub async fn embed(
    client: &Client,
    provider: &ResolvedProvider,
    model: &str,
    input: &str,
) -> Result<Vec<f32>> {
    let response = client
        .post(provider.embeddings_url())
        .bearer_auth(&provider.api_key)
        .json(&json!({ "model": model, "input": input }))
        .send()
        .await
        .map_err(|e| Error::Http(format!("Embedding request failed: {}", e)))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Http(format!("Embedding API error {}: {}", status, body)));
    }

    let parsed: EmbeddingResponse = response
        .json()
        .await
        .map_err(|e| Error::Http(format!("Invalid embedding response: {}", e)))?;
    parsed
        .data
        .into_iter()
        .next()
        .map(|d| d.embedding)
        .ok_or_else(|| Error::Http("Embedding response had no data".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LLMProvider;
    use axum::routing::post;
    use axum::{Json, Router};

    #[tokio::test]
    async fn test_embed_returns_first_vector() {
        let router = Router::new().route(
            "/v1/embeddings",
            post(|Json(body): Json<serde_json::Value>| async move {
                assert_eq!(body["model"], "text-embedding-3-small");
                Json(json!({"data": [{"embedding": [0.5, -0.25]}]}))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let provider = ResolvedProvider {
            provider: LLMProvider::OpenAI,
            model: "gpt-4o-mini".into(),
            api_key: "sk".into(),
            api_base: format!("http://{}/v1", addr),
        };
        let vector = embed(&Client::new(), &provider, "text-embedding-3-small", "chunk")
            .await
            .unwrap();
        assert_eq!(vector, vec![0.5, -0.25]);
    }
}
