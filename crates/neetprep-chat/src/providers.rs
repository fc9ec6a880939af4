//! OpenAI-compatible chat-completion streaming.
//!
//! Opening the call and consuming it are separate steps: a failure to open
//! is reported before the caller has committed to a streamed response,
//! while failures after that arrive as items of the fragment stream.

use std::fmt::Display;
use std::pin::Pin;

use bytes::Bytes;
use futures::Stream;
use neetprep_core::{Error, Result};
use reqwest::Client;
use serde_json::json;
use tokio_stream::StreamExt;
use tracing::{debug, warn};

use crate::config::ResolvedProvider;
use crate::types::{ChatMessage, Fragment};

/// Boxed upstream fragment source.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<Fragment>> + Send>>;

/// Start a streaming chat completion.
///
/// Returns `UpstreamOpen` when the request cannot be sent or the API
/// answers with a non-success status.
pub async fn open_chat_stream(
    client: &Client,
    provider: &ResolvedProvider,
    messages: &[ChatMessage],
) -> Result<FragmentStream> {
    let url = provider.chat_completions_url();
    let body = json!({
        "model": provider.model,
        "messages": messages,
        "stream": true,
    });

    debug!("Streaming from {} with model {}", url, provider.model);

    let response = client
        .post(&url)
        .bearer_auth(&provider.api_key)
        .json(&body)
        .send()
        .await
        .map_err(|e| Error::UpstreamOpen(format!("Request failed: {}", e)))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(Error::UpstreamOpen(format!("API error {}: {}", status, body)));
    }

    Ok(Box::pin(fragments(response.bytes_stream())))
}

/// Decode an SSE byte stream into fragments.
///
/// Ends at `data: [DONE]` or when the byte stream ends. An `error` payload
/// or a transport error ends the stream with `UpstreamStream`.
pub fn fragments<S, E>(bytes: S) -> impl Stream<Item = Result<Fragment>> + Send + 'static
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    // A trailing newline flushes a final line that lacks one.
    let bytes = bytes.chain(tokio_stream::once(Ok(Bytes::from_static(b"\n"))));

    async_stream::stream! {
        tokio::pin!(bytes);
        let mut lines = SseLineBuffer::default();

        while let Some(chunk) = bytes.next().await {
            let chunk = match chunk {
                Ok(b) => b,
                Err(e) => {
                    yield Err(Error::UpstreamStream(format!("Stream read error: {}", e)));
                    return;
                }
            };

            for line in lines.push(&chunk) {
                match parse_line(&line) {
                    SseData::Fragment(fragment) => yield Ok(fragment),
                    SseData::Done => return,
                    SseData::Error(msg) => {
                        yield Err(Error::UpstreamStream(msg));
                        return;
                    }
                    SseData::Ignored => {}
                }
            }
        }
    }
}

/// Accumulates raw bytes and hands out complete, non-blank lines.
///
/// Works on bytes so a multi-byte character split across network chunks is
/// decoded only once its line is complete.
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    buf: Vec<u8>,
}

impl SseLineBuffer {
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw).trim().to_string();
            if !line.is_empty() {
                lines.push(line);
            }
        }
        lines
    }
}

/// Meaning of a single SSE line.
#[derive(Debug, PartialEq)]
pub enum SseData {
    Fragment(Fragment),
    Done,
    Error(String),
    Ignored,
}

pub fn parse_line(line: &str) -> SseData {
    // Comments and `event:`/`id:` fields carry nothing we use.
    let Some(data) = line.strip_prefix("data:") else {
        return SseData::Ignored;
    };
    let data = data.trim();
    if data == "[DONE]" {
        return SseData::Done;
    }

    match serde_json::from_str::<serde_json::Value>(data) {
        Ok(parsed) => {
            if let Some(err) = parsed.get("error") {
                let msg = err["message"].as_str().unwrap_or("Unknown error");
                return SseData::Error(msg.to_string());
            }
            let content = parsed["choices"][0]["delta"]["content"]
                .as_str()
                .unwrap_or("");
            SseData::Fragment(Fragment::new(content))
        }
        Err(e) => {
            warn!("Skipping undecodable SSE payload: {}", e);
            SseData::Ignored
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LLMProvider;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::Router;
    use std::convert::Infallible;

    fn delta(content: &str) -> String {
        format!(
            "data: {}\n\n",
            json!({"choices": [{"delta": {"content": content}}]})
        )
    }

    async fn collect(chunks: Vec<std::result::Result<Bytes, String>>) -> Vec<Result<Fragment>> {
        fragments(futures::stream::iter(chunks)).collect().await
    }

    #[test]
    fn test_line_buffer_holds_partial_lines() {
        let mut buf = SseLineBuffer::default();
        assert!(buf.push(b"data: {\"a\"").is_empty());
        assert_eq!(buf.push(b":1}\n\n: keep-alive\n"), vec![
            "data: {\"a\":1}".to_string(),
            ": keep-alive".to_string(),
        ]);
    }

    #[test]
    fn test_line_buffer_split_utf8() {
        let mut buf = SseLineBuffer::default();
        let text = "data: é\n".as_bytes();
        // 'é' is two bytes; split between them.
        assert!(buf.push(&text[..7]).is_empty());
        assert_eq!(buf.push(&text[7..]), vec!["data: é".to_string()]);
    }

    #[test]
    fn test_parse_line() {
        assert_eq!(parse_line("data: [DONE]"), SseData::Done);
        assert_eq!(parse_line(": ping"), SseData::Ignored);
        assert_eq!(parse_line("event: message"), SseData::Ignored);
        assert_eq!(
            parse_line(r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#),
            SseData::Fragment(Fragment::new(""))
        );
        assert_eq!(
            parse_line(r#"data: {"error":{"message":"overloaded"}}"#),
            SseData::Error("overloaded".into())
        );
    }

    #[tokio::test]
    async fn test_fragments_in_order_until_done() {
        let body = format!(
            "{}{}{}data: [DONE]\n\n{}",
            delta("Kre"),
            delta("bs"),
            delta(""),
            delta("after done")
        );
        // Re-chunk at awkward boundaries.
        let chunks: Vec<_> = body
            .as_bytes()
            .chunks(7)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();

        let out = collect(chunks).await;
        let texts: Vec<String> = out
            .into_iter()
            .map(|r| r.unwrap().as_str().to_string())
            .collect();
        assert_eq!(texts, vec!["Kre", "bs", ""]);
    }

    #[tokio::test]
    async fn test_fragments_final_line_without_newline() {
        let body = format!("data: {}", json!({"choices": [{"delta": {"content": "tail"}}]}));
        let out = collect(vec![Ok(Bytes::from(body))]).await;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].as_ref().unwrap().as_str(), "tail");
    }

    #[tokio::test]
    async fn test_transport_error_ends_stream() {
        let out = collect(vec![
            Ok(Bytes::from(delta("partial"))),
            Err("connection reset".to_string()),
            Ok(Bytes::from(delta("never"))),
        ])
        .await;
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].as_ref().unwrap().as_str(), "partial");
        assert!(matches!(out[1], Err(Error::UpstreamStream(_))));
    }

    fn provider_at(api_base: String) -> ResolvedProvider {
        ResolvedProvider {
            provider: LLMProvider::OpenAI,
            model: "gpt-4o-mini".into(),
            api_key: "sk-test".into(),
            api_base,
        }
    }

    #[tokio::test]
    async fn test_open_rejected_status_is_open_error() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { (StatusCode::UNAUTHORIZED, "invalid api key") }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let result = open_chat_stream(
            &Client::new(),
            &provider_at(format!("http://{}/v1", addr)),
            &[ChatMessage::user("hi")],
        )
        .await;
        match result {
            Err(Error::UpstreamOpen(msg)) => assert!(msg.contains("401")),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected open failure"),
        }
    }

    #[tokio::test]
    async fn test_open_unreachable_is_open_error() {
        // Bind then drop to get a port nobody listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = open_chat_stream(
            &Client::new(),
            &provider_at(format!("http://{}/v1", addr)),
            &[ChatMessage::user("hi")],
        )
        .await;
        assert!(matches!(result, Err(Error::UpstreamOpen(_))));
    }

    #[tokio::test]
    async fn test_open_and_stream() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|axum::Json(body): axum::Json<serde_json::Value>| async move {
                assert_eq!(body["stream"], true);
                assert_eq!(body["messages"][0]["role"], "user");
                let sse = format!("{}{}data: [DONE]\n\n", delta("Hel"), delta("lo"));
                let chunks = futures::stream::iter(
                    sse.into_bytes()
                        .chunks(5)
                        .map(|c| Ok::<_, Infallible>(Bytes::copy_from_slice(c)))
                        .collect::<Vec<_>>(),
                );
                axum::body::Body::from_stream(chunks)
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let stream = open_chat_stream(
            &Client::new(),
            &provider_at(format!("http://{}/v1", addr)),
            &[ChatMessage::user("hi")],
        )
        .await
        .unwrap();
        let texts: Vec<String> = stream
            .map(|r| r.unwrap().as_str().to_string())
            .collect()
            .await;
        assert_eq!(texts.concat(), "Hello");
    }
}
