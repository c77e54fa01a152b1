//! Turn orchestration: drives the message history, the completion gateway,
//! and the tool invoker through the
//! `AwaitingFirstCompletion -> (ToolRound)? -> AwaitingFinalCompletion`
//! state machine, in buffered and streaming variants.

use crate::api::ChatRequest;
use crate::config::Config;
use crate::conversation::{trim_history, ConversationStore};
use crate::error::Result;
use crate::gateway::{CompletionBackend, CompletionEvent, OpenAiGateway};
use crate::models::{Message, StreamEvent, ToolOutcome, ToolSummary, TurnOptions, TurnOutcome};
use crate::tools::{builtins, invoker, DeviceSettings, ToolRegistry};
use futures::Stream;
use std::ops::{Deref, DerefMut};
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, error, info};

/// The assistant engine: tool registry, per-conversation histories, and the
/// completion backend, behind the turn API exposed to callers.
pub struct Assistant {
    config: Config,
    backend: Arc<dyn CompletionBackend>,
    registry: ToolRegistry,
    store: ConversationStore,
    device: Arc<DeviceSettings>,
}

/// History a turn operates on: either a locked shared conversation (turns
/// on one id serialize on its mutex) or an ephemeral seeded history that is
/// discarded when no conversation id was given.
enum TurnHistory {
    Shared(OwnedMutexGuard<Vec<Message>>),
    Ephemeral(Vec<Message>),
}

impl Deref for TurnHistory {
    type Target = Vec<Message>;

    fn deref(&self) -> &Vec<Message> {
        match self {
            TurnHistory::Shared(guard) => guard,
            TurnHistory::Ephemeral(messages) => messages,
        }
    }
}

impl DerefMut for TurnHistory {
    fn deref_mut(&mut self) -> &mut Vec<Message> {
        match self {
            TurnHistory::Shared(guard) => guard,
            TurnHistory::Ephemeral(messages) => messages,
        }
    }
}

impl Assistant {
    /// Build the engine against the OpenAI-compatible gateway. Fails
    /// synchronously on an empty API key, before any turn is accepted.
    pub fn new(config: Config) -> Result<Self> {
        let backend = Arc::new(OpenAiGateway::new(
            &config.api_key,
            &config.api_endpoint,
            config.stream_timeout,
        )?);

        let device = Arc::new(DeviceSettings::new());
        if let Some(name) = &config.user_name {
            device.set_user_name(name.clone());
        }

        let mut registry = ToolRegistry::new();
        builtins::register_builtins(&mut registry, &device);
        if let Some(dir) = &config.plugins_dir {
            let loaded = registry.load_dir(dir, |name| builtins::handler_for(name, &device));
            info!(loaded, dir = %dir.display(), "loaded tool plugins");
        }

        let store = ConversationStore::new(config.system_prompt.clone());
        Ok(Self {
            config,
            backend,
            registry,
            store,
            device,
        })
    }

    /// Injection seam for tests and alternative providers.
    pub fn with_backend(
        config: Config,
        backend: Arc<dyn CompletionBackend>,
        registry: ToolRegistry,
    ) -> Self {
        let device = Arc::new(DeviceSettings::new());
        if let Some(name) = &config.user_name {
            device.set_user_name(name.clone());
        }
        let store = ConversationStore::new(config.system_prompt.clone());
        Self {
            config,
            backend,
            registry,
            store,
            device,
        }
    }

    pub fn device_settings(&self) -> Arc<DeviceSettings> {
        self.device.clone()
    }

    /// Registered tool summaries.
    pub fn tools(&self) -> Vec<ToolSummary> {
        self.registry
            .list()
            .iter()
            .map(|tool| ToolSummary {
                name: tool.name.clone(),
                description: tool.description.clone(),
            })
            .collect()
    }

    pub fn clear_conversation(&self, conversation_id: &str) {
        self.store.clear(conversation_id);
    }

    /// Snapshot of a conversation's history (seeds an unknown id).
    pub async fn conversation_history(&self, conversation_id: &str) -> Vec<Message> {
        self.store.history(conversation_id).await
    }

    /// Wrap raw user text in the envelope the model is prompted to expect:
    /// the quoted utterance, the current timestamp, and the user's name
    /// when the device knows it.
    fn format_user_message(&self, text: &str) -> String {
        let mut formatted = format!(
            "User input: \"{}\"\nCurrent date: {}",
            text,
            chrono::Local::now()
        );
        if let Some(name) = self.device.user_name() {
            formatted.push_str(&format!("\nUser name: {}", name));
        }
        formatted
    }

    async fn begin_turn(&self, conversation_id: Option<&str>) -> TurnHistory {
        match conversation_id {
            Some(id) => TurnHistory::Shared(self.store.lock(id).await),
            None => TurnHistory::Ephemeral(self.store.seed()),
        }
    }

    fn build_request(
        &self,
        messages: &[Message],
        options: &TurnOptions,
        include_tools: bool,
    ) -> ChatRequest {
        let tools = if include_tools && !self.registry.is_empty() {
            Some(self.registry.describe_for_llm())
        } else {
            None
        };
        // The second completion is never offered tools, which also caps the
        // turn at a single tool round.
        let tool_choice = if tools.is_some() {
            options
                .tool_choice
                .clone()
                .or_else(|| Some("auto".to_string()))
        } else {
            None
        };

        ChatRequest {
            model: options
                .model
                .clone()
                .unwrap_or_else(|| self.config.model.clone()),
            messages: messages.to_vec(),
            stream: false,
            temperature: options.temperature.unwrap_or(self.config.temperature),
            max_tokens: options.max_tokens.unwrap_or(self.config.max_tokens),
            presence_penalty: options
                .presence_penalty
                .unwrap_or(self.config.presence_penalty),
            frequency_penalty: options
                .frequency_penalty
                .unwrap_or(self.config.frequency_penalty),
            tools,
            tool_choice,
        }
    }

    fn finish_turn(&self, history: &mut TurnHistory) {
        if let Some(max_pairs) = self.config.max_history_pairs {
            trim_history(history, max_pairs);
        }
    }

    /// Run one buffered turn: the reply is returned only once any tool
    /// round has completed.
    pub async fn send_message(
        &self,
        text: &str,
        conversation_id: Option<&str>,
        options: &TurnOptions,
    ) -> Result<TurnOutcome> {
        match self.send_message_inner(text, conversation_id, options).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                error!(error = %e, "assistant turn failed");
                Err(e)
            }
        }
    }

    async fn send_message_inner(
        &self,
        text: &str,
        conversation_id: Option<&str>,
        options: &TurnOptions,
    ) -> Result<TurnOutcome> {
        let mut history = self.begin_turn(conversation_id).await;
        history.push(Message::user(self.format_user_message(text)));

        let first = self
            .backend
            .complete(self.build_request(&history, options, true))
            .await?;
        history.push(first.message.clone());

        let tool_calls = first.message.tool_calls.clone().unwrap_or_default();
        if tool_calls.is_empty() {
            self.finish_turn(&mut history);
            return Ok(TurnOutcome {
                message: first.message.content,
                conversation_id: conversation_id.map(str::to_string),
                usage: first.usage,
                finish_reason: first.finish_reason,
                tool_calls,
            });
        }

        debug!(count = tool_calls.len(), "assistant requested tool calls");
        let results = invoker::invoke_all(&self.registry, &tool_calls).await;
        for result in &results {
            history.push(result.to_message());
        }

        let second = self
            .backend
            .complete(self.build_request(&history, options, false))
            .await?;
        history.push(second.message.clone());
        self.finish_turn(&mut history);

        Ok(TurnOutcome {
            message: second.message.content,
            conversation_id: conversation_id.map(str::to_string),
            usage: second.usage,
            finish_reason: second.finish_reason,
            tool_calls,
        })
    }

    /// Run one streaming turn, forwarding events to `on_chunk` as they
    /// happen. Any failure is delivered as a terminal `error` event and
    /// also returned.
    pub async fn stream_message<F>(
        &self,
        text: &str,
        mut on_chunk: F,
        conversation_id: Option<&str>,
        options: &TurnOptions,
    ) -> Result<TurnOutcome>
    where
        F: FnMut(StreamEvent) + Send,
    {
        match self
            .stream_message_inner(text, &mut on_chunk, conversation_id, options)
            .await
        {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                error!(error = %e, "assistant stream turn failed");
                on_chunk(StreamEvent::Error {
                    error: e.to_string(),
                    done: true,
                });
                Err(e)
            }
        }
    }

    async fn stream_message_inner(
        &self,
        text: &str,
        on_chunk: &mut (dyn FnMut(StreamEvent) + Send),
        conversation_id: Option<&str>,
        options: &TurnOptions,
    ) -> Result<TurnOutcome> {
        let mut history = self.begin_turn(conversation_id).await;
        history.push(Message::user(self.format_user_message(text)));

        let request = self.build_request(&history, options, true);
        let mut forward = |event: CompletionEvent| match event {
            CompletionEvent::Content(content) => on_chunk(StreamEvent::Content {
                content,
                done: false,
            }),
            CompletionEvent::ToolCallProgress(tool_call) => {
                on_chunk(StreamEvent::ToolCallProgress {
                    tool_call,
                    done: false,
                });
            }
            CompletionEvent::ToolCallComplete(tool_call) => {
                on_chunk(StreamEvent::ToolCallComplete {
                    tool_call,
                    done: false,
                });
            }
        };
        let first = self.backend.complete_streaming(request, &mut forward).await?;
        history.push(first.message.clone());

        let tool_calls = first.message.tool_calls.clone().unwrap_or_default();
        if tool_calls.is_empty() {
            self.finish_turn(&mut history);
            on_chunk(StreamEvent::Content {
                content: String::new(),
                done: true,
            });
            return Ok(TurnOutcome {
                message: first.message.content,
                conversation_id: conversation_id.map(str::to_string),
                usage: first.usage,
                finish_reason: first.finish_reason,
                tool_calls,
            });
        }

        // Tools run one at a time here so start/result events interleave
        // truthfully with execution.
        for tool_call in &tool_calls {
            let tool_name = tool_call.function.name.clone();
            on_chunk(StreamEvent::ToolExecutionStart {
                tool_name: tool_name.clone(),
                done: false,
            });
            let result = invoker::invoke_one(&self.registry, tool_call).await;
            match &result.outcome {
                ToolOutcome::Result(value) => on_chunk(StreamEvent::ToolResult {
                    tool_name,
                    result: value.clone(),
                    done: false,
                }),
                ToolOutcome::Error(message) => on_chunk(StreamEvent::ToolError {
                    tool_name,
                    error: message.clone(),
                    done: false,
                }),
            }
            history.push(result.to_message());
        }

        let request = self.build_request(&history, options, false);
        let second = self
            .backend
            .complete_streaming(request, &mut |event| {
                if let CompletionEvent::Content(content) = event {
                    on_chunk(StreamEvent::Content {
                        content,
                        done: false,
                    });
                }
            })
            .await?;
        history.push(second.message.clone());
        self.finish_turn(&mut history);

        on_chunk(StreamEvent::Content {
            content: String::new(),
            done: true,
        });

        Ok(TurnOutcome {
            message: second.message.content,
            conversation_id: conversation_id.map(str::to_string),
            usage: second.usage,
            finish_reason: second.finish_reason,
            tool_calls,
        })
    }

    /// Async-iterator variant of [`Self::stream_message`]: the same events
    /// as a `Stream`, with the turn error (if any) as the final item.
    /// Dropping the stream cancels the in-flight turn.
    pub fn stream_events<'a>(
        &'a self,
        text: &'a str,
        conversation_id: Option<&'a str>,
        options: &'a TurnOptions,
    ) -> Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send + 'a>> {
        Box::pin(async_stream::stream! {
            let (tx, mut rx) = mpsc::unbounded_channel();
            let turn = self.stream_message(
                text,
                move |event| {
                    let _ = tx.send(event);
                },
                conversation_id,
                options,
            );
            tokio::pin!(turn);

            let result = loop {
                tokio::select! {
                    event = rx.recv() => {
                        if let Some(event) = event {
                            yield Ok(event);
                        }
                    }
                    result = &mut turn => break result,
                }
            };

            // The turn future still owns the sender; drain what it queued.
            while let Ok(event) = rx.try_recv() {
                yield Ok(event);
            }
            if let Err(e) = result {
                yield Err(e);
            }
        })
    }
}
