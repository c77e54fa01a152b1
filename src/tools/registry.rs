use jsonschema::{Draft, JSONSchema};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fs;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use tracing::{info, warn};

/// Async tool implementation: structured arguments in, structured result or
/// a human-readable error message out.
pub type ToolHandler = Box<
    dyn Fn(Value) -> Pin<Box<dyn Future<Output = Result<Value, String>> + Send>> + Send + Sync,
>;

/// Static descriptor of one registered tool, advertised to the LLM.
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
    handler: ToolHandler,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
        handler: ToolHandler,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            handler,
        }
    }

    pub async fn execute(&self, arguments: Value) -> Result<Value, String> {
        (self.handler)(arguments).await
    }
}

/// Plugin manifest artifact: `manifest.json` inside a plugin directory.
#[derive(Deserialize)]
struct Manifest {
    name: String,
    description: String,
    parameters: Value,
}

/// Read-only after startup; safely shared across concurrent turns.
#[derive(Default)]
pub struct ToolRegistry {
    order: Vec<String>,
    tools: HashMap<String, ToolDefinition>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. On a name collision the last registration wins;
    /// this is explicit policy, logged rather than silent.
    pub fn register(&mut self, tool: ToolDefinition) {
        if self.tools.contains_key(&tool.name) {
            warn!(name = %tool.name, "tool name collision, last registration wins");
        } else {
            self.order.push(tool.name.clone());
        }
        self.tools.insert(tool.name.clone(), tool);
    }

    pub fn resolve(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.get(name)
    }

    pub fn list(&self) -> Vec<&ToolDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Tool schemas in the shape the completion capability expects.
    pub fn describe_for_llm(&self) -> Vec<Value> {
        self.list()
            .iter()
            .map(|tool| {
                json!({
                    "type": "function",
                    "function": {
                        "name": tool.name,
                        "description": tool.description,
                        "parameters": tool.parameters,
                    }
                })
            })
            .collect()
    }

    pub fn validate_arguments(&self, tool_name: &str, arguments: &Value) -> Result<(), String> {
        let tool = self
            .tools
            .get(tool_name)
            .ok_or_else(|| format!("Tool {} not found", tool_name))?;

        let schema = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(&tool.parameters)
            .map_err(|e| format!("Invalid tool schema: {}", e))?;

        if let Err(errors) = schema.validate(arguments) {
            let error_messages: Vec<String> = errors
                .map(|e| format!("{}: {}", e.instance_path, e))
                .collect();
            return Err(error_messages.join("; "));
        }

        Ok(())
    }

    /// Scan a plugin directory: each subdirectory holds a `manifest.json`
    /// (name, description, parameters) which is bound to a compiled-in
    /// handler looked up by name. A malformed manifest or a manifest naming
    /// no known implementation is logged and skipped; one broken plugin
    /// never aborts the load. Returns the number of plugins registered.
    pub fn load_dir(
        &mut self,
        dir: &Path,
        resolve_handler: impl Fn(&str) -> Option<ToolHandler>,
    ) -> usize {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "failed to read plugins directory");
                return 0;
            }
        };

        let mut loaded = 0;
        for entry in entries.filter_map(|e| e.ok()) {
            let plugin_dir = entry.path();
            if !plugin_dir.is_dir() {
                continue;
            }

            let manifest_path = plugin_dir.join("manifest.json");
            let manifest: Manifest = match fs::read_to_string(&manifest_path)
                .map_err(|e| e.to_string())
                .and_then(|raw| serde_json::from_str(&raw).map_err(|e| e.to_string()))
            {
                Ok(manifest) => manifest,
                Err(e) => {
                    warn!(
                        plugin = %plugin_dir.display(),
                        error = %e,
                        "skipping plugin with unreadable manifest"
                    );
                    continue;
                }
            };

            let Some(handler) = resolve_handler(&manifest.name) else {
                warn!(
                    name = %manifest.name,
                    "skipping plugin with no compiled implementation"
                );
                continue;
            };

            info!(name = %manifest.name, "loaded tool plugin");
            self.register(ToolDefinition::new(
                manifest.name,
                manifest.description,
                manifest.parameters,
                handler,
            ));
            loaded += 1;
        }
        loaded
    }
}
