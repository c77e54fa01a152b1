use apollo_assistant::api::response::{
    extract_content, extract_finish_reason, extract_usage, parse_tool_calls,
};
use serde_json::json;

#[test]
fn extracts_content_and_finish_reason() {
    let response = json!({
        "choices": [{
            "message": {"role": "assistant", "content": "Hello there."},
            "finish_reason": "stop"
        }],
        "usage": {"total_tokens": 12}
    });

    assert_eq!(
        extract_content(&response).unwrap(),
        Some("Hello there.".to_string())
    );
    assert_eq!(
        extract_finish_reason(&response).unwrap(),
        Some("stop".to_string())
    );
    assert_eq!(extract_usage(&response), Some(json!({"total_tokens": 12})));
}

#[test]
fn null_content_is_none() {
    let response = json!({
        "choices": [{
            "message": {"role": "assistant", "content": null,
                "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": {"name": "weather", "arguments": "{\"location\": \"Poznan\"}"}
                }]},
            "finish_reason": "tool_calls"
        }]
    });

    assert_eq!(extract_content(&response).unwrap(), None);

    let calls = parse_tool_calls(&response).unwrap().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].id, "call_1");
    assert_eq!(calls[0].function.name, "weather");
    assert_eq!(calls[0].function.arguments, "{\"location\": \"Poznan\"}");
}

#[test]
fn malformed_tool_call_entries_are_skipped() {
    let response = json!({
        "choices": [{
            "message": {"role": "assistant", "content": null,
                "tool_calls": [
                    {"id": "call_1", "type": "function"},
                    {
                        "id": "call_2",
                        "type": "function",
                        "function": {"name": "weather", "arguments": "{}"}
                    }
                ]},
            "finish_reason": "tool_calls"
        }]
    });

    let calls = parse_tool_calls(&response).unwrap().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].id, "call_2");
}

#[test]
fn no_tool_calls_is_none() {
    let response = json!({
        "choices": [{
            "message": {"role": "assistant", "content": "hi"},
            "finish_reason": "stop"
        }]
    });

    assert_eq!(parse_tool_calls(&response).unwrap(), None);
    assert_eq!(extract_usage(&response), None);
}

#[test]
fn empty_choices_is_an_error() {
    let response = json!({"choices": []});
    assert!(extract_content(&response).is_err());
    assert!(extract_finish_reason(&response).is_err());
}

#[test]
fn missing_choices_is_an_error() {
    let response = json!({"error": {"message": "boom"}});
    assert!(extract_content(&response).is_err());
}
