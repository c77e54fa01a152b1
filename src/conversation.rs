//! Per-conversation message histories.
//!
//! Each conversation id maps to its own async mutex, so two turns on the
//! same id serialize while turns on distinct ids proceed concurrently.

use crate::models::Message;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

pub type ConversationHandle = Arc<AsyncMutex<Vec<Message>>>;

pub struct ConversationStore {
    system_prompt: String,
    conversations: Mutex<HashMap<String, ConversationHandle>>,
}

impl ConversationStore {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            conversations: Mutex::new(HashMap::new()),
        }
    }

    /// Fresh history seeded with the system message, for ephemeral turns.
    pub fn seed(&self) -> Vec<Message> {
        vec![Message::system(self.system_prompt.clone())]
    }

    /// Handle for `conversation_id`, created and seeded if absent.
    pub fn open(&self, conversation_id: &str) -> ConversationHandle {
        let mut map = self.conversations.lock().unwrap();
        map.entry(conversation_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(self.seed())))
            .clone()
    }

    /// Lock a conversation for the duration of a turn.
    pub async fn lock(&self, conversation_id: &str) -> OwnedMutexGuard<Vec<Message>> {
        self.open(conversation_id).lock_owned().await
    }

    /// Snapshot of the history (creates and seeds an unknown id).
    pub async fn history(&self, conversation_id: &str) -> Vec<Message> {
        self.open(conversation_id).lock().await.clone()
    }

    pub async fn append(&self, conversation_id: &str, message: Message) {
        self.open(conversation_id).lock().await.push(message);
    }

    /// Replace the full history atomically.
    pub async fn replace(&self, conversation_id: &str, full_history: Vec<Message>) {
        *self.open(conversation_id).lock().await = full_history;
    }

    /// Remove all history; a subsequent access reseeds fresh.
    pub fn clear(&self, conversation_id: &str) {
        self.conversations
            .lock()
            .unwrap()
            .remove(conversation_id);
    }
}

/// Trim a history to the system messages plus the last `max_pairs`
/// user/assistant exchanges. Tool-round messages count toward the budget
/// like any other non-system message, but the kept window always opens at
/// a turn boundary: a window starting inside a tool round would hold a
/// `tool` message whose requesting assistant message was evicted, and
/// providers reject such a history.
pub fn trim_history(messages: &mut Vec<Message>, max_pairs: usize) {
    let mut system_messages: Vec<Message> = messages
        .iter()
        .filter(|m| m.role == "system")
        .cloned()
        .collect();

    let conversation_messages: Vec<Message> = messages
        .iter()
        .filter(|m| m.role != "system")
        .cloned()
        .collect();

    let keep_count = max_pairs * 2;
    let skip = conversation_messages.len().saturating_sub(keep_count);
    let mut trimmed: Vec<Message> = conversation_messages.into_iter().skip(skip).collect();

    // Advance past any partially-evicted round until the window begins
    // with a user message.
    let start = trimmed
        .iter()
        .position(|m| m.role == "user")
        .unwrap_or(trimmed.len());
    trimmed.drain(..start);

    messages.clear();
    messages.append(&mut system_messages);
    messages.extend(trimmed);
}
