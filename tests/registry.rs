use apollo_assistant::tools::builtins::{self, DeviceSettings};
use apollo_assistant::tools::{ToolDefinition, ToolRegistry};
use serde_json::json;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn noop_tool(name: &str) -> ToolDefinition {
    ToolDefinition::new(
        name,
        format!("{} description", name),
        json!({"type": "object", "properties": {}, "additionalProperties": false}),
        Box::new(|_args| Box::pin(async move { Ok(json!("ok")) })),
    )
}

#[test]
fn builtins_are_registered() {
    let settings = Arc::new(DeviceSettings::new());
    let mut registry = ToolRegistry::new();
    builtins::register_builtins(&mut registry, &settings);

    assert!(registry.resolve("current_time").is_some());
    assert!(registry.resolve("set_city").is_some());
    assert!(registry.resolve("set_name").is_some());
    assert!(registry.resolve("weather").is_none());
}

#[test]
fn describe_for_llm_uses_function_schema_shape() {
    let mut registry = ToolRegistry::new();
    registry.register(noop_tool("echo"));

    let schemas = registry.describe_for_llm();
    assert_eq!(schemas.len(), 1);
    assert_eq!(schemas[0]["type"], "function");
    assert_eq!(schemas[0]["function"]["name"], "echo");
    assert_eq!(schemas[0]["function"]["description"], "echo description");
    assert!(schemas[0]["function"]["parameters"].is_object());
}

#[test]
fn describe_for_llm_preserves_registration_order() {
    let mut registry = ToolRegistry::new();
    registry.register(noop_tool("zulu"));
    registry.register(noop_tool("alpha"));

    let schemas = registry.describe_for_llm();
    assert_eq!(schemas[0]["function"]["name"], "zulu");
    assert_eq!(schemas[1]["function"]["name"], "alpha");
}

#[tokio::test]
async fn name_collision_last_registration_wins() {
    let mut registry = ToolRegistry::new();
    registry.register(noop_tool("echo"));
    registry.register(ToolDefinition::new(
        "echo",
        "replacement",
        json!({"type": "object"}),
        Box::new(|_args| Box::pin(async move { Ok(json!("replaced")) })),
    ));

    assert_eq!(registry.len(), 1);
    let tool = registry.resolve("echo").unwrap();
    assert_eq!(tool.description, "replacement");
    assert_eq!(tool.execute(json!({})).await, Ok(json!("replaced")));
}

#[test]
fn validate_arguments_rejects_schema_violations() {
    let mut registry = ToolRegistry::new();
    registry.register(ToolDefinition::new(
        "greet",
        "greet someone",
        json!({
            "type": "object",
            "properties": {"name": {"type": "string"}},
            "required": ["name"],
            "additionalProperties": false
        }),
        Box::new(|_args| Box::pin(async move { Ok(json!("hi")) })),
    ));

    assert!(registry.validate_arguments("greet", &json!({"name": "Ada"})).is_ok());
    assert!(registry.validate_arguments("greet", &json!({})).is_err());
    assert!(registry.validate_arguments("greet", &json!({"name": 7})).is_err());
}

#[test]
fn load_dir_skips_broken_plugins_and_keeps_valid_ones() {
    let temp_dir = TempDir::new().unwrap();

    let valid = temp_dir.path().join("clock");
    fs::create_dir(&valid).unwrap();
    fs::write(
        valid.join("manifest.json"),
        json!({
            "name": "current_time",
            "description": "Get the current time.",
            "parameters": {"type": "object", "properties": {}}
        })
        .to_string(),
    )
    .unwrap();

    let malformed = temp_dir.path().join("broken");
    fs::create_dir(&malformed).unwrap();
    fs::write(malformed.join("manifest.json"), "{not json").unwrap();

    let unknown = temp_dir.path().join("mystery");
    fs::create_dir(&unknown).unwrap();
    fs::write(
        unknown.join("manifest.json"),
        json!({
            "name": "frobnicate",
            "description": "No compiled implementation exists.",
            "parameters": {"type": "object"}
        })
        .to_string(),
    )
    .unwrap();

    let settings = Arc::new(DeviceSettings::new());
    let mut registry = ToolRegistry::new();
    let loaded = registry.load_dir(temp_dir.path(), |name| {
        builtins::handler_for(name, &settings)
    });

    assert_eq!(loaded, 1);
    assert_eq!(registry.len(), 1);
    assert!(registry.resolve("current_time").is_some());
    assert!(registry.resolve("frobnicate").is_none());
}

#[tokio::test]
async fn set_city_builtin_mutates_device_settings() {
    let settings = Arc::new(DeviceSettings::new());
    let mut registry = ToolRegistry::new();
    builtins::register_builtins(&mut registry, &settings);

    let tool = registry.resolve("set_city").unwrap();
    let result = tool.execute(json!({"city": "Poznan"})).await;

    assert_eq!(result, Ok(json!("Done.")));
    assert_eq!(settings.city().as_deref(), Some("Poznan"));
}
