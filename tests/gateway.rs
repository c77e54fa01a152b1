use apollo_assistant::{AssistantError, OpenAiGateway};

#[test]
fn empty_api_key_is_rejected_at_construction() {
    let result = OpenAiGateway::new("", "https://api.openai.com/v1/chat/completions", 30);
    match result {
        Err(AssistantError::Config(message)) => {
            assert_eq!(message, "Invalid API key: API key must be a non-empty string");
        }
        _ => panic!("expected a configuration error"),
    }
}

#[test]
fn key_that_cannot_be_a_header_is_a_configuration_error() {
    let result = OpenAiGateway::new(
        "bad\nkey",
        "https://api.openai.com/v1/chat/completions",
        30,
    );
    assert!(matches!(result, Err(AssistantError::Config(_))));
}

#[test]
fn valid_key_builds_a_gateway() {
    let result = OpenAiGateway::new(
        "sk-test",
        "http://localhost:11434/v1/chat/completions",
        30,
    );
    assert!(result.is_ok());
}
