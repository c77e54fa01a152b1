//! Tool-orchestrating conversational assistant engine for the Apollo
//! smart display.
//!
//! The [`Assistant`] accepts a natural-language turn, keeps per-conversation
//! history, lets the model request registered tools, executes them with
//! per-call failure isolation, and produces either a consolidated reply or
//! an incremental stream of [`StreamEvent`]s.

pub mod api;
pub mod cli;
pub mod config;
pub mod conversation;
pub mod error;
pub mod gateway;
pub mod models;
pub mod orchestrator;
pub mod tools;

pub use config::Config;
pub use error::{AssistantError, Result};
pub use gateway::{Completion, CompletionBackend, CompletionEvent, OpenAiGateway};
pub use models::{
    Message, StreamEvent, ToolCall, ToolCallResult, ToolOutcome, ToolSummary, TurnOptions,
    TurnOutcome,
};
pub use orchestrator::Assistant;
pub use tools::{DeviceSettings, ToolDefinition, ToolRegistry};
