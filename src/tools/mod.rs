pub mod builtins;
pub mod invoker;
pub mod registry;

pub use builtins::{register_builtins, DeviceSettings};
pub use invoker::{invoke_all, invoke_one};
pub use registry::{ToolDefinition, ToolHandler, ToolRegistry};
