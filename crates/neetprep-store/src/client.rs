//! PostgREST client.

use neetprep_core::{Error, Result};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::query::Query;
use crate::types::{
    AnswerKeyRow, ContextRecord, DocumentRow, NewDocument, NewEmbedding, QuizQuestion,
};

/// Generic query client over the Supabase REST surface.
///
/// Cheap to clone; every clone shares the underlying connection pool.
#[derive(Debug, Clone)]
pub struct SupabaseClient {
    http: Client,
    rest_url: String,
    api_key: String,
    bearer: String,
}

impl SupabaseClient {
    pub fn new(http: Client, base_url: &str, api_key: &str) -> Self {
        Self {
            http,
            rest_url: format!("{}/rest/v1", base_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
            bearer: api_key.to_string(),
        }
    }

    /// Same client, authorised as the signed-in user.
    pub fn with_access_token(&self, token: &str) -> Self {
        Self {
            bearer: token.to_string(),
            ..self.clone()
        }
    }

    pub fn rest_url(&self) -> &str {
        &self.rest_url
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.bearer))
    }

    /// Read rows matching `query`.
    pub async fn select<T: DeserializeOwned>(&self, query: &Query) -> Result<Vec<T>> {
        let url = format!("{}/{}", self.rest_url, query.table_name());
        debug!("select from {}", query.table_name());
        let response = self
            .authed(self.http.get(&url))
            .query(&query.to_pairs())
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;
        decode(response).await
    }

    /// Read exactly one row; an empty result is `NotFound`.
    pub async fn single<T: DeserializeOwned>(&self, query: &Query) -> Result<T> {
        let rows: Vec<T> = self.select(query).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(format!("no row in {}", query.table_name())))
    }

    /// Insert one row and return its stored representation.
    pub async fn insert<R: Serialize, T: DeserializeOwned>(&self, table: &str, row: &R) -> Result<T> {
        let url = format!("{}/{}", self.rest_url, table);
        debug!("insert into {}", table);
        let response = self
            .authed(self.http.post(&url))
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;
        let rows: Vec<T> = decode(response).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| Error::Database(format!("insert into {} returned no row", table)))
    }

    /// Call a stored procedure.
    pub async fn rpc<P: Serialize, T: DeserializeOwned>(&self, name: &str, params: &P) -> Result<T> {
        let url = format!("{}/rpc/{}", self.rest_url, name);
        debug!("rpc {}", name);
        let response = self
            .authed(self.http.post(&url))
            .json(params)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;
        decode(response).await
    }

    // ---------------------------------------------------------------
    // Application queries
    // ---------------------------------------------------------------

    /// Retrieve context records for a question. `null` from the RPC is an
    /// empty result.
    pub async fn match_documents(&self, question: &str, count: usize) -> Result<Vec<ContextRecord>> {
        let records: Option<Vec<ContextRecord>> = self
            .rpc(
                "match_documents",
                &json!({ "query_text": question, "match_count": count }),
            )
            .await?;
        Ok(records.unwrap_or_default())
    }

    pub async fn first_question(&self) -> Result<Option<QuizQuestion>> {
        let query = Query::table("questions").select("id,stem,choices").limit(1);
        let rows: Vec<QuizQuestion> = self.select(&query).await?;
        Ok(rows.into_iter().next())
    }

    pub async fn answer_key(&self, question_id: &serde_json::Value) -> Result<serde_json::Value> {
        let id = match question_id {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let query = Query::table("questions").select("answer_key").eq("id", id);
        let row: AnswerKeyRow = self.single(&query).await?;
        Ok(row.answer_key)
    }

    pub async fn insert_document(&self, doc: &NewDocument) -> Result<DocumentRow> {
        self.insert("documents", doc).await
    }

    pub async fn insert_embedding(&self, row: &NewEmbedding) -> Result<()> {
        let _: serde_json::Value = self.insert("embeddings", row).await?;
        Ok(())
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Database(format!("PostgREST {}: {}", status, body)));
    }
    response
        .json::<T>()
        .await
        .map_err(|e| Error::Http(format!("Invalid response body: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Json, Query as QueryParams};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::Router;
    use std::collections::HashMap;

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_match_documents_sends_params_and_headers() {
        let router = Router::new().route(
            "/rest/v1/rpc/match_documents",
            post(|headers: HeaderMap, Json(body): Json<serde_json::Value>| async move {
                assert_eq!(headers["apikey"], "anon");
                assert_eq!(headers["authorization"], "Bearer user-token");
                assert_eq!(body["match_count"], 3);
                Json(json!([
                    {"lang": "en", "topic": "biology", "text": body["query_text"]},
                ]))
            }),
        );
        let base = spawn(router).await;
        let client = SupabaseClient::new(Client::new(), &base, "anon").with_access_token("user-token");

        let records = client.match_documents("krebs", 3).await.unwrap();
        assert_eq!(
            records,
            vec![ContextRecord {
                lang: "en".into(),
                topic: "biology".into(),
                text: "krebs".into(),
            }]
        );
    }

    #[tokio::test]
    async fn test_match_documents_null_is_empty() {
        let router = Router::new().route(
            "/rest/v1/rpc/match_documents",
            post(|| async { Json(serde_json::Value::Null) }),
        );
        let base = spawn(router).await;
        let client = SupabaseClient::new(Client::new(), &base, "anon");
        assert!(client.match_documents("q", 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_answer_key_missing_row_is_not_found() {
        let router = Router::new().route(
            "/rest/v1/questions",
            get(|QueryParams(params): QueryParams<HashMap<String, String>>| async move {
                assert_eq!(params["select"], "answer_key");
                assert_eq!(params["id"], "eq.q-9");
                Json(json!([]))
            }),
        );
        let base = spawn(router).await;
        let client = SupabaseClient::new(Client::new(), &base, "anon");
        let err = client.answer_key(&json!("q-9")).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_error_status_is_database_error() {
        let router = Router::new().route(
            "/rest/v1/documents",
            post(|| async { (StatusCode::UNAUTHORIZED, "bad key") }),
        );
        let base = spawn(router).await;
        let client = SupabaseClient::new(Client::new(), &base, "anon");
        let doc = NewDocument {
            text: "t".into(),
            topic: "x".into(),
            lang: "en".into(),
        };
        let err = client.insert_document(&doc).await.unwrap_err();
        match err {
            Error::Database(msg) => assert!(msg.contains("401")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rest_url_trims_trailing_slash() {
        let client = SupabaseClient::new(Client::new(), "https://x.supabase.co/", "k");
        assert_eq!(client.rest_url(), "https://x.supabase.co/rest/v1");
    }
}
