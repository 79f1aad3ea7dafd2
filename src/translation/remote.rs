use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use tracing::{debug, warn};

use super::backend::{Backend, BackendKind, PartialFn};
use super::cancel::CancelFlag;
use super::segment::CLAUSE_BOUNDARIES;
use super::sse_parser::{SseLine, parse_sse_line, sse_lines};
use crate::config::TranslateConfig;
use crate::error::{Result, TranslateError};

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

/// Streams chat completions from an OpenAI-compatible endpoint.
pub struct RemoteBackend {
    client: Client,
}

impl RemoteBackend {
    /// Creates a backend with a client that has no read timeout: a
    /// generation may legitimately keep the connection open for minutes.
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }

    pub fn endpoint_url(address: &str) -> String {
        format!(
            "http://{}/v1/chat/completions",
            address.trim_end_matches('/')
        )
    }

    async fn stream_chunk(
        &self,
        chunk: &str,
        config: &TranslateConfig,
        cancel: &CancelFlag,
        on_partial: &mut PartialFn<'_>,
    ) -> Result<()> {
        if config.address.is_empty() {
            return Err(TranslateError::ConfigurationMissing(
                "LLM server address".to_string(),
            ));
        }

        let url = Self::endpoint_url(&config.address);
        let body = ChatCompletionRequest {
            model: &config.model_name,
            messages: [
                Message {
                    role: "system",
                    content: &config.system_prompt,
                },
                Message {
                    role: "user",
                    content: chunk,
                },
            ],
            temperature: config.temperature,
            stream: true,
        };
        let body = serde_json::to_vec(&body)
            .map_err(|e| TranslateError::BackendRuntimeFailed(e.to_string()))?;

        debug!(%url, chars = chunk.chars().count(), "sending chat completion request");

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json; charset=utf-8")
            .body(body)
            .send()
            .await
            .map_err(|e| TranslateError::Network(e.to_string()))?;

        if cancel.is_cancelled() {
            return Ok(());
        }

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            warn!(code = status.as_u16(), body = %error_body, "chat completion request failed");
            return Err(TranslateError::Api {
                code: status.as_u16(),
            });
        }

        let lines = sse_lines(response.bytes_stream());
        let mut lines = std::pin::pin!(lines);

        loop {
            if cancel.is_cancelled() {
                return Ok(());
            }

            let Some(line) = lines.next().await else {
                debug!("stream ended without [DONE]");
                return Ok(());
            };
            let line = line.map_err(|e| TranslateError::Network(e.to_string()))?;

            match parse_sse_line(&line) {
                SseLine::Content(content) => {
                    if cancel.is_cancelled() {
                        return Ok(());
                    }
                    on_partial(content);
                }
                SseLine::Done => return Ok(()),
                SseLine::Malformed(payload) => {
                    warn!(%payload, "skipping unparsable stream chunk");
                }
                SseLine::Ignored => {}
            }
        }
    }
}

impl Default for RemoteBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for RemoteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }

    fn boundaries(&self) -> &'static [char] {
        CLAUSE_BOUNDARIES
    }

    async fn translate_chunk(
        &self,
        chunk: &str,
        config: &TranslateConfig,
        cancel: &CancelFlag,
        on_partial: &mut PartialFn<'_>,
    ) -> Result<()> {
        // Dropping the request future closes the connection, which is how an
        // in-flight call is aborted.
        tokio::select! {
            biased;
            () = cancel.cancelled() => Ok(()),
            result = self.stream_chunk(chunk, config, cancel, on_partial) => match result {
                Err(TranslateError::Network(_)) if cancel.is_cancelled() => Ok(()),
                other => other,
            },
        }
    }
}
