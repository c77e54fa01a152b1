//! Built-in tools compiled into the engine.
//!
//! Tool side effects live here, not in the invoker: `set_city` and
//! `set_name` mutate the shared device settings that also feed the user
//! input envelope.

use super::registry::{ToolDefinition, ToolHandler, ToolRegistry};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

/// Mutable device-level state shared between tools and the orchestrator.
#[derive(Default)]
pub struct DeviceSettings {
    inner: Mutex<DeviceState>,
}

#[derive(Default)]
struct DeviceState {
    city: Option<String>,
    user_name: Option<String>,
}

impl DeviceSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn city(&self) -> Option<String> {
        self.inner.lock().unwrap().city.clone()
    }

    pub fn user_name(&self) -> Option<String> {
        self.inner.lock().unwrap().user_name.clone()
    }

    pub fn set_city(&self, city: impl Into<String>) {
        self.inner.lock().unwrap().city = Some(city.into());
    }

    pub fn set_user_name(&self, name: impl Into<String>) {
        self.inner.lock().unwrap().user_name = Some(name.into());
    }
}

fn required_str(args: &Value, key: &str) -> Result<String, String> {
    args.get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| format!("Missing required argument: {}", key))
}

fn current_time_handler() -> ToolHandler {
    Box::new(|_args| Box::pin(async move { Ok(json!(chrono::Local::now().to_rfc3339())) }))
}

fn set_city_handler(settings: Arc<DeviceSettings>) -> ToolHandler {
    Box::new(move |args| {
        let settings = settings.clone();
        Box::pin(async move {
            let city = required_str(&args, "city")?;
            settings.set_city(city);
            Ok(json!("Done."))
        })
    })
}

fn set_name_handler(settings: Arc<DeviceSettings>) -> ToolHandler {
    Box::new(move |args| {
        let settings = settings.clone();
        Box::pin(async move {
            let name = required_str(&args, "name")?;
            settings.set_user_name(name);
            Ok(json!("Done."))
        })
    })
}

/// Implementation lookup for manifest-discovered plugins.
pub fn handler_for(name: &str, settings: &Arc<DeviceSettings>) -> Option<ToolHandler> {
    match name {
        "current_time" => Some(current_time_handler()),
        "set_city" => Some(set_city_handler(settings.clone())),
        "set_name" => Some(set_name_handler(settings.clone())),
        _ => None,
    }
}

pub fn register_builtins(registry: &mut ToolRegistry, settings: &Arc<DeviceSettings>) {
    registry.register(ToolDefinition::new(
        "current_time",
        "Get the current date and time in ISO-8601 format.",
        json!({
            "type": "object",
            "properties": {},
            "additionalProperties": false
        }),
        current_time_handler(),
    ));

    registry.register(ToolDefinition::new(
        "set_city",
        "Remember the user's home city, used for weather and local information.",
        json!({
            "type": "object",
            "properties": {
                "city": {
                    "type": "string",
                    "description": "The city name to remember"
                }
            },
            "required": ["city"],
            "additionalProperties": false
        }),
        set_city_handler(settings.clone()),
    ));

    registry.register(ToolDefinition::new(
        "set_name",
        "Remember what the user wants to be called.",
        json!({
            "type": "object",
            "properties": {
                "name": {
                    "type": "string",
                    "description": "The name to remember"
                }
            },
            "required": ["name"],
            "additionalProperties": false
        }),
        set_name_handler(settings.clone()),
    ));
}
