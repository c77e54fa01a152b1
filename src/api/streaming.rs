use crate::api::models::StreamResponse;
use crate::error::{AssistantError, Result};
use crate::gateway::{Completion, CompletionEvent};
use crate::models::{FunctionCall, Message, ToolCall};
use bytes::Bytes;
use futures::StreamExt;
use serde_json::Value;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

/// A tool call being reassembled from indexed fragments.
#[derive(Default)]
struct PendingToolCall {
    id: String,
    call_type: String,
    name: String,
    arguments: String,
}

impl PendingToolCall {
    fn snapshot(&self) -> ToolCall {
        ToolCall {
            id: self.id.clone(),
            tool_type: if self.call_type.is_empty() {
                "function".to_string()
            } else {
                self.call_type.clone()
            },
            function: FunctionCall {
                name: self.name.clone(),
                arguments: self.arguments.clone(),
            },
        }
    }
}

/// Drive an SSE chat-completions stream to completion.
///
/// Content fragments and tool-call fragments are forwarded to `on_event` as
/// they arrive; fragmented tool-call name/argument strings are reassembled
/// per index and emitted as `ToolCallComplete` once the provider signals the
/// end of the round. Returns the fully assembled assistant message.
pub async fn process_streaming_response(
    response: reqwest::Response,
    timeout_secs: u64,
    on_event: &mut (dyn FnMut(CompletionEvent) + Send),
) -> Result<Completion> {
    let mut stream = response.bytes_stream();
    let mut buffer = String::new();
    let mut incomplete_line = String::new();
    let mut assistant_response = String::new();
    let mut pending: Vec<PendingToolCall> = Vec::new();
    let mut completed: Vec<ToolCall> = Vec::new();
    let mut finish_reason: Option<String> = None;
    let mut usage: Option<Value> = None;
    let chunk_timeout = Duration::from_secs(timeout_secs);

    'outer: loop {
        match timeout(chunk_timeout, stream.next()).await {
            Ok(Some(chunk)) => {
                let chunk: Bytes = chunk.map_err(AssistantError::Network)?;
                let text = String::from_utf8_lossy(&chunk);
                incomplete_line.push_str(&text);
            }
            Ok(None) => break,
            Err(_) => {
                warn!(timeout_secs, "no data received before stream timeout");
                return Err(AssistantError::Timeout);
            }
        }

        // Only process complete lines; keep the trailing fragment around
        if let Some(last_newline_pos) = incomplete_line.rfind('\n') {
            buffer.push_str(&incomplete_line[..=last_newline_pos]);
            incomplete_line = incomplete_line[last_newline_pos + 1..].to_string();
        } else {
            continue;
        }

        while let Some(line_end) = buffer.find('\n') {
            let line = buffer[..line_end].to_string();
            buffer = buffer[line_end + 1..].to_string();

            if line.is_empty() || line.starts_with(':') {
                continue;
            }

            let Some(colon_pos) = line.find(':') else {
                continue;
            };
            let field = line[..colon_pos].trim();
            let value = line[colon_pos + 1..].trim_start();

            match field {
                "data" => {
                    if value == "[DONE]" {
                        break 'outer;
                    }

                    match serde_json::from_str::<StreamResponse>(value) {
                        Ok(parsed) => {
                            if let Some(chunk_usage) = parsed.usage {
                                usage = Some(chunk_usage);
                            }
                            for choice in parsed.choices.unwrap_or_default() {
                                if let Some(delta) = choice.delta {
                                    if let Some(content) = delta.content {
                                        if !content.is_empty() {
                                            assistant_response.push_str(&content);
                                            on_event(CompletionEvent::Content(content));
                                        }
                                    }

                                    for fragment in delta.tool_calls.unwrap_or_default() {
                                        let index = fragment.index.unwrap_or(0);
                                        while pending.len() <= index {
                                            pending.push(PendingToolCall::default());
                                        }
                                        let call = &mut pending[index];
                                        if let Some(id) = fragment.id {
                                            call.id = id;
                                        }
                                        if let Some(call_type) = fragment.call_type {
                                            call.call_type = call_type;
                                        }
                                        if let Some(function) = fragment.function {
                                            if let Some(name) = function.name {
                                                call.name.push_str(&name);
                                            }
                                            if let Some(arguments) = function.arguments {
                                                call.arguments.push_str(&arguments);
                                            }
                                        }
                                        on_event(CompletionEvent::ToolCallProgress(
                                            call.snapshot(),
                                        ));
                                    }
                                }

                                if let Some(reason) = choice.finish_reason {
                                    if reason == "tool_calls" {
                                        for call in pending.drain(..) {
                                            let call = call.snapshot();
                                            completed.push(call.clone());
                                            on_event(CompletionEvent::ToolCallComplete(call));
                                        }
                                    }
                                    finish_reason = Some(reason);
                                }
                            }
                        }
                        Err(e) => {
                            debug!(error = %e, "skipping unparseable SSE data line");
                        }
                    }
                }
                "event" | "id" | "retry" => {
                    debug!(field, value, "SSE control field");
                }
                _ => {
                    debug!(field, "unknown SSE field");
                }
            }
        }
    }

    // A stream may end without an explicit tool_calls finish signal
    for call in pending.drain(..) {
        let call = call.snapshot();
        completed.push(call.clone());
        on_event(CompletionEvent::ToolCallComplete(call));
    }

    let content = if assistant_response.is_empty() && !completed.is_empty() {
        None
    } else {
        Some(assistant_response)
    };
    let tool_calls = if completed.is_empty() {
        None
    } else {
        Some(completed)
    };

    Ok(Completion {
        message: Message::assistant(content, tool_calls),
        usage,
        finish_reason,
    })
}
