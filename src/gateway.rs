//! Adapter over the LLM provider's chat-completion capability.

use crate::api::{self, ChatRequest};
use crate::error::{AssistantError, Result};
use crate::models::Message;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use tracing::debug;

/// One completed chat round-trip, buffered or fully assembled from a stream.
#[derive(Clone, Debug)]
pub struct Completion {
    pub message: Message,
    pub usage: Option<Value>,
    pub finish_reason: Option<String>,
}

/// Incremental events delivered while a streaming completion is in flight.
#[derive(Clone, Debug)]
pub enum CompletionEvent {
    Content(String),
    ToolCallProgress(crate::models::ToolCall),
    ToolCallComplete(crate::models::ToolCall),
}

/// The LLM provider boundary: submit messages plus tool schemas, receive an
/// assistant message or a stream of delta events. Implementations do not
/// retry; transport errors propagate to the caller unchanged.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, request: ChatRequest) -> Result<Completion>;

    /// Same inputs as [`Self::complete`], but delivers ordered events to
    /// `on_event` as they arrive. Fragmented tool-call deltas must be
    /// reassembled into complete calls before `ToolCallComplete` fires.
    async fn complete_streaming(
        &self,
        request: ChatRequest,
        on_event: &mut (dyn FnMut(CompletionEvent) + Send),
    ) -> Result<Completion>;
}

/// Backend speaking the OpenAI-compatible chat-completions protocol.
/// Holds a single `reqwest::Client` with the auth header baked in, reused
/// across every completion of the process.
pub struct OpenAiGateway {
    client: reqwest::Client,
    api_endpoint: String,
    stream_timeout: u64,
}

impl OpenAiGateway {
    pub fn new(api_key: &str, api_endpoint: &str, stream_timeout: u64) -> Result<Self> {
        if api_key.is_empty() {
            return Err(AssistantError::Config(
                "Invalid API key: API key must be a non-empty string".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|e| {
                AssistantError::Config(format!("Invalid API key: {}", e))
            })?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            api_endpoint: api_endpoint.to_string(),
            stream_timeout,
        })
    }

    async fn send(&self, request: &ChatRequest) -> Result<reqwest::Response> {
        debug!(model = %request.model, stream = request.stream, "sending completion request");
        let response = self
            .client
            .post(&self.api_endpoint)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AssistantError::Api { status, message });
        }

        Ok(response)
    }
}

#[async_trait]
impl CompletionBackend for OpenAiGateway {
    async fn complete(&self, mut request: ChatRequest) -> Result<Completion> {
        request.stream = false;
        let response = self.send(&request).await?;

        let response_json: Value = serde_json::from_str(&response.text().await?)?;

        let content = api::response::extract_content(&response_json)?;
        let tool_calls = api::response::parse_tool_calls(&response_json)?;
        let finish_reason = api::response::extract_finish_reason(&response_json)?;
        let usage = api::response::extract_usage(&response_json);

        Ok(Completion {
            message: Message::assistant(content, tool_calls),
            usage,
            finish_reason,
        })
    }

    async fn complete_streaming(
        &self,
        mut request: ChatRequest,
        on_event: &mut (dyn FnMut(CompletionEvent) + Send),
    ) -> Result<Completion> {
        request.stream = true;
        let response = self.send(&request).await?;
        api::process_streaming_response(response, self.stream_timeout, on_event).await
    }
}
