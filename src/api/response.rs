use crate::error::{AssistantError, Result};
use crate::models::ToolCall;
use serde_json::Value;
use tracing::warn;

fn first_choice(response_json: &Value) -> Result<&Value> {
    let choices = response_json
        .get("choices")
        .and_then(|c| c.as_array())
        .ok_or_else(|| AssistantError::Other("No choices in response".to_string()))?;

    choices
        .first()
        .ok_or_else(|| AssistantError::Other("Empty choices array".to_string()))
}

fn message(response_json: &Value) -> Result<&Value> {
    first_choice(response_json)?
        .get("message")
        .ok_or_else(|| AssistantError::Other("No message in response".to_string()))
}

/// Extract assistant content from a buffered response.
pub fn extract_content(response_json: &Value) -> Result<Option<String>> {
    Ok(message(response_json)?
        .get("content")
        .and_then(|c| c.as_str())
        .map(|s| s.to_string()))
}

/// Parse the tool calls of a buffered response, if any. A malformed entry
/// is logged and skipped; the well-formed siblings still execute.
pub fn parse_tool_calls(response_json: &Value) -> Result<Option<Vec<ToolCall>>> {
    let msg = message(response_json)?;

    if let Some(tool_calls) = msg.get("tool_calls").and_then(|tc| tc.as_array()) {
        let mut typed: Vec<ToolCall> = Vec::with_capacity(tool_calls.len());
        for tc in tool_calls {
            match serde_json::from_value(tc.clone()) {
                Ok(call) => typed.push(call),
                Err(e) => warn!(error = %e, "skipping malformed tool call entry"),
            }
        }
        if !typed.is_empty() {
            return Ok(Some(typed));
        }
    }

    Ok(None)
}

pub fn extract_finish_reason(response_json: &Value) -> Result<Option<String>> {
    Ok(first_choice(response_json)?
        .get("finish_reason")
        .and_then(|r| r.as_str())
        .map(|s| s.to_string()))
}

pub fn extract_usage(response_json: &Value) -> Option<Value> {
    response_json.get("usage").cloned()
}
