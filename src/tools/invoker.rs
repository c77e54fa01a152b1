//! Executes a round of LLM-requested tool calls with per-call failure
//! isolation: a parse error, unknown tool, or thrown execution error
//! becomes that call's error envelope and never aborts sibling calls.

use super::registry::ToolRegistry;
use crate::models::{ToolCall, ToolCallResult, ToolOutcome};
use futures::future::join_all;
use serde_json::Value;
use tracing::{info, warn};

/// Invoke a single tool call.
pub async fn invoke_one(registry: &ToolRegistry, tool_call: &ToolCall) -> ToolCallResult {
    let name = tool_call.function.name.clone();
    let result = |outcome| ToolCallResult {
        tool_call_id: tool_call.id.clone(),
        tool_name: name.clone(),
        outcome,
    };

    let arguments: Value = match serde_json::from_str(&tool_call.function.arguments) {
        Ok(arguments) => arguments,
        Err(e) => {
            warn!(tool = %name, error = %e, "tool arguments are not valid JSON");
            return result(ToolOutcome::Error(format!(
                "Failed to parse tool arguments: {}",
                e
            )));
        }
    };

    let Some(tool) = registry.resolve(&name) else {
        warn!(tool = %name, "tool not found");
        return result(ToolOutcome::Error(format!("Tool {} not found", name)));
    };

    if let Err(e) = registry.validate_arguments(&name, &arguments) {
        warn!(tool = %name, error = %e, "tool arguments failed schema validation");
        return result(ToolOutcome::Error(e));
    }

    info!(tool = %name, "executing tool");
    match tool.execute(arguments).await {
        Ok(value) => result(ToolOutcome::Result(value)),
        Err(e) => {
            warn!(tool = %name, error = %e, "tool execution failed");
            result(ToolOutcome::Error(e))
        }
    }
}

/// Invoke every call of a round concurrently, returning results in the
/// original request order so the tool messages appended afterwards align
/// with the assistant's `tool_calls` list.
pub async fn invoke_all(registry: &ToolRegistry, tool_calls: &[ToolCall]) -> Vec<ToolCallResult> {
    join_all(tool_calls.iter().map(|call| invoke_one(registry, call))).await
}
