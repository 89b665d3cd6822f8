//! Persisted message log.
//!
//! The conversation history survives restarts through a small storage port so
//! the controller can be exercised against an in-memory fake in tests.

use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use tracing::warn;

use crate::state::ChatMessage;

/// Storage port for the persisted conversation history.
///
/// `load` returns an empty list when nothing has been persisted yet; a parse
/// or IO failure is an error that callers are expected to swallow.
pub trait HistoryStore: Send {
    fn load(&mut self) -> Result<Vec<ChatMessage>>;
    fn save(&mut self, messages: &[ChatMessage]) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

/// JSON-file backed history under the platform data directory.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// History file at `<data_dir>/docchat/history.json`.
    pub fn open_default() -> Result<Self> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow!("Could not determine data directory"))?;
        Ok(Self::new(data_dir.join("docchat").join("history.json")))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl HistoryStore for FileStore {
    fn load(&mut self) -> Result<Vec<ChatMessage>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let raw = fs::read_to_string(&self.path)?;
        let messages: Vec<ChatMessage> = serde_json::from_str(&raw)?;
        Ok(messages)
    }

    fn save(&mut self, messages: &[ChatMessage]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let raw = serde_json::to_string_pretty(messages)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// Ephemeral history for tests and sessions that should not touch disk.
#[derive(Default)]
pub struct MemoryStore {
    saved: Option<Vec<ChatMessage>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for MemoryStore {
    fn load(&mut self) -> Result<Vec<ChatMessage>> {
        Ok(self.saved.clone().unwrap_or_default())
    }

    fn save(&mut self, messages: &[ChatMessage]) -> Result<()> {
        self.saved = Some(messages.to_vec());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.saved = None;
        Ok(())
    }
}

/// Append-only log of conversation turns, persisted on every append.
///
/// Single logical writer (the conversation controller), so there is no
/// locking here.
pub struct MessageStore {
    store: Box<dyn HistoryStore>,
    messages: Vec<ChatMessage>,
}

impl MessageStore {
    /// Restores any persisted history. Absent or unparseable data means an
    /// empty conversation; the error is never surfaced to the user.
    pub fn new(mut store: Box<dyn HistoryStore>) -> Self {
        let messages = match store.load() {
            Ok(messages) => messages,
            Err(err) => {
                warn!("discarding unreadable chat history: {err:#}");
                Vec::new()
            }
        };
        Self { store, messages }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Appends to the end of the log and persists the full sequence.
    /// Persistence failures are logged, not surfaced.
    pub fn append(&mut self, message: ChatMessage) -> &[ChatMessage] {
        self.messages.push(message);
        if let Err(err) = self.store.save(&self.messages) {
            warn!("failed to persist chat history: {err:#}");
        }
        &self.messages
    }

    /// Empties the log and removes the persisted copy.
    pub fn clear(&mut self) {
        self.messages.clear();
        if let Err(err) = self.store.clear() {
            warn!("failed to remove persisted chat history: {err:#}");
        }
    }
}
