use apollo_assistant::models::{FunctionCall, ToolCall, ToolCallResult, ToolOutcome};
use apollo_assistant::tools::{invoker, ToolDefinition, ToolRegistry};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

fn tool_call(id: &str, name: &str, arguments: &str) -> ToolCall {
    ToolCall {
        id: id.to_string(),
        tool_type: "function".to_string(),
        function: FunctionCall {
            name: name.to_string(),
            arguments: arguments.to_string(),
        },
    }
}

fn open_schema() -> serde_json::Value {
    json!({"type": "object"})
}

#[tokio::test]
async fn invalid_arguments_never_reach_the_tool() {
    let executed = Arc::new(AtomicBool::new(false));
    let executed_flag = executed.clone();

    let mut registry = ToolRegistry::new();
    registry.register(ToolDefinition::new(
        "echo",
        "echo",
        open_schema(),
        Box::new(move |_args| {
            let executed = executed_flag.clone();
            Box::pin(async move {
                executed.store(true, Ordering::SeqCst);
                Ok(json!("ok"))
            })
        }),
    ));

    let call = tool_call("call_1", "echo", "{not valid json");
    let result = invoker::invoke_one(&registry, &call).await;

    match &result.outcome {
        ToolOutcome::Error(message) => {
            assert!(message.starts_with("Failed to parse tool arguments:"));
        }
        ToolOutcome::Result(_) => panic!("expected an error outcome"),
    }
    assert!(!executed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn unknown_tool_reports_not_found() {
    let registry = ToolRegistry::new();
    let call = tool_call("call_1", "ghost", "{}");

    let result = invoker::invoke_one(&registry, &call).await;

    assert_eq!(result.tool_call_id, "call_1");
    assert_eq!(
        result.outcome,
        ToolOutcome::Error("Tool ghost not found".to_string())
    );
}

#[tokio::test]
async fn execution_failure_is_isolated_from_siblings() {
    let mut registry = ToolRegistry::new();
    registry.register(ToolDefinition::new(
        "boom",
        "always fails",
        open_schema(),
        Box::new(|_args| Box::pin(async move { Err("kaboom".to_string()) })),
    ));
    registry.register(ToolDefinition::new(
        "steady",
        "always succeeds",
        open_schema(),
        Box::new(|_args| Box::pin(async move { Ok(json!({"status": "fine"})) })),
    ));

    let calls = vec![
        tool_call("call_1", "boom", "{}"),
        tool_call("call_2", "steady", "{}"),
        tool_call("call_3", "missing", "{}"),
    ];
    let results = invoker::invoke_all(&registry, &calls).await;

    // Order matches the request order regardless of individual failures
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].tool_call_id, "call_1");
    assert_eq!(results[0].outcome, ToolOutcome::Error("kaboom".to_string()));
    assert_eq!(results[1].tool_call_id, "call_2");
    assert_eq!(
        results[1].outcome,
        ToolOutcome::Result(json!({"status": "fine"}))
    );
    assert_eq!(
        results[2].outcome,
        ToolOutcome::Error("Tool missing not found".to_string())
    );
}

#[tokio::test]
async fn schema_violation_surfaces_as_call_error() {
    let mut registry = ToolRegistry::new();
    registry.register(ToolDefinition::new(
        "greet",
        "greet",
        json!({
            "type": "object",
            "properties": {"name": {"type": "string"}},
            "required": ["name"]
        }),
        Box::new(|_args| Box::pin(async move { Ok(json!("hi")) })),
    ));

    let call = tool_call("call_1", "greet", "{}");
    let result = invoker::invoke_one(&registry, &call).await;

    assert!(result.outcome.is_error());
}

#[test]
fn tool_call_result_round_trips_through_message_content() {
    let results = vec![
        ToolCallResult {
            tool_call_id: "call_1".to_string(),
            tool_name: "weather".to_string(),
            outcome: ToolOutcome::Result(json!({"temperature": 20})),
        },
        ToolCallResult {
            tool_call_id: "call_2".to_string(),
            tool_name: "stock".to_string(),
            outcome: ToolOutcome::Error("upstream unavailable".to_string()),
        },
    ];

    for original in results {
        let message = original.to_message();
        assert_eq!(message.role, "tool");
        assert_eq!(message.tool_call_id.as_deref(), Some(original.tool_call_id.as_str()));

        let reparsed: ToolOutcome =
            serde_json::from_str(message.content.as_deref().unwrap()).unwrap();
        assert_eq!(reparsed, original.outcome);
    }

    // The full envelope round-trips as well
    let envelope = ToolCallResult {
        tool_call_id: "call_9".to_string(),
        tool_name: "weather".to_string(),
        outcome: ToolOutcome::Result(json!({"temperature": 20})),
    };
    let serialized = serde_json::to_string(&envelope).unwrap();
    let reparsed: ToolCallResult = serde_json::from_str(&serialized).unwrap();
    assert_eq!(reparsed, envelope);
}
