use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry of a conversation history, in the chat-completions wire shape.
///
/// Invariant: a `tool` message always carries a `tool_call_id` naming one of
/// the tool calls requested by the immediately preceding assistant message.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Message {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn assistant(content: Option<String>, tool_calls: Option<Vec<ToolCall>>) -> Self {
        Self {
            role: "assistant".to_string(),
            content,
            tool_calls,
            tool_call_id: None,
        }
    }
}

/// An LLM-emitted request to invoke one tool. `function.arguments` stays a
/// raw string until the invoker parses it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: FunctionCall,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

/// Outcome of executing a single tool call. Externally tagged, so the JSON
/// keeps the sibling `result` / `error` field shape providers were fed by
/// the original assistant.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ToolOutcome {
    Result(Value),
    Error(String),
}

impl ToolOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, ToolOutcome::Error(_))
    }
}

/// Normalized result envelope for one tool call, in request order.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ToolCallResult {
    pub tool_call_id: String,
    pub tool_name: String,
    #[serde(flatten)]
    pub outcome: ToolOutcome,
}

impl ToolCallResult {
    /// The `role:"tool"` history message for this result, keyed to the
    /// originating call's id. Serialization of the outcome round-trips.
    pub fn to_message(&self) -> Message {
        let content = serde_json::to_string(&self.outcome)
            .unwrap_or_else(|_| "{\"error\":\"unserializable tool outcome\"}".to_string());
        Message {
            role: "tool".to_string(),
            content: Some(content),
            tool_calls: None,
            tool_call_id: Some(self.tool_call_id.clone()),
        }
    }
}

/// Final result of one completed turn.
#[derive(Serialize, Clone, Debug)]
pub struct TurnOutcome {
    pub message: Option<String>,
    pub conversation_id: Option<String>,
    /// Provider usage/cost metadata, passed through opaquely.
    pub usage: Option<Value>,
    pub finish_reason: Option<String>,
    /// The tool calls made during this turn (possibly empty).
    pub tool_calls: Vec<ToolCall>,
}

/// Per-turn overrides; unset fields fall back to the configured defaults.
#[derive(Clone, Debug, Default)]
pub struct TurnOptions {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub presence_penalty: Option<f32>,
    pub frequency_penalty: Option<f32>,
    pub tool_choice: Option<String>,
}

/// Incremental events delivered to streaming-mode callers.
///
/// `done` is `false` on every event except the terminal empty `Content`
/// event and the terminal `Error` event.
#[derive(Serialize, Clone, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Content {
        content: String,
        done: bool,
    },
    ToolCallProgress {
        tool_call: ToolCall,
        done: bool,
    },
    ToolCallComplete {
        tool_call: ToolCall,
        done: bool,
    },
    ToolExecutionStart {
        tool_name: String,
        done: bool,
    },
    ToolResult {
        tool_name: String,
        result: Value,
        done: bool,
    },
    ToolError {
        tool_name: String,
        error: String,
        done: bool,
    },
    Error {
        error: String,
        done: bool,
    },
}

impl StreamEvent {
    pub fn is_done(&self) -> bool {
        match self {
            StreamEvent::Content { done, .. }
            | StreamEvent::ToolCallProgress { done, .. }
            | StreamEvent::ToolCallComplete { done, .. }
            | StreamEvent::ToolExecutionStart { done, .. }
            | StreamEvent::ToolResult { done, .. }
            | StreamEvent::ToolError { done, .. }
            | StreamEvent::Error { done, .. } => *done,
        }
    }
}

/// Name/description pair exposed by `Assistant::tools`.
#[derive(Serialize, Clone, Debug)]
pub struct ToolSummary {
    pub name: String,
    pub description: String,
}
