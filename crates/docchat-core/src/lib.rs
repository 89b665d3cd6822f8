pub mod ai;
pub mod config;
pub mod context;
pub mod controller;
pub mod state;
pub mod store;

// Re-export main types for convenience
pub use ai::{CompletionBackend, CompletionError, OpenRouterClient, FALLBACK_REPLY};
pub use config::Config;
pub use controller::{ConversationController, PendingQuestion};
pub use state::{ChatMessage, Sender};
pub use store::{FileStore, HistoryStore, MemoryStore, MessageStore};
