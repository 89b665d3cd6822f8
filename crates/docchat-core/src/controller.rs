//! Conversation controller.
//!
//! Owns the message log and the single-request lifecycle: Idle -> Sending ->
//! Idle. At most one request is outstanding; there is no cancellation.

use std::sync::Arc;

use crate::ai::{CompletionBackend, CompletionError, FALLBACK_REPLY};
use crate::state::ChatMessage;
use crate::store::MessageStore;

/// A prepared outbound request: the question plus a snapshot of the pending
/// context taken at submit time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuestion {
    pub question: String,
    pub context: Option<String>,
}

/// Notified with the full message log after every mutation. Rendering hangs
/// off this rather than off the store directly.
pub type ChangeListener = Box<dyn FnMut(&[ChatMessage]) + Send>;

pub struct ConversationController {
    store: MessageStore,
    backend: Arc<dyn CompletionBackend>,
    pending_context: Option<String>,
    in_flight: bool,
    last_error: Option<String>,
    listeners: Vec<ChangeListener>,
}

impl ConversationController {
    pub fn new(store: MessageStore, backend: Arc<dyn CompletionBackend>) -> Self {
        Self {
            store,
            backend,
            pending_context: None,
            in_flight: false,
            last_error: None,
            listeners: Vec::new(),
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.store.messages()
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn context(&self) -> Option<&str> {
        self.pending_context.as_deref()
    }

    pub fn backend(&self) -> Arc<dyn CompletionBackend> {
        Arc::clone(&self.backend)
    }

    /// Replaces any previously loaded context wholesale. Never merged.
    pub fn set_context(&mut self, text: String) {
        self.pending_context = Some(text);
    }

    pub fn on_change(&mut self, listener: ChangeListener) {
        self.listeners.push(listener);
    }

    /// Idle -> Sending. Appends the user message optimistically and hands
    /// back the request for the caller to execute. Blank questions and
    /// submissions while a request is outstanding are ignored.
    pub fn submit(&mut self, question: &str) -> Option<PendingQuestion> {
        if self.in_flight || question.trim().is_empty() {
            return None;
        }

        self.last_error = None;
        self.in_flight = true;
        self.store.append(ChatMessage::user(question));
        self.notify();

        Some(PendingQuestion {
            question: question.to_string(),
            context: self.pending_context.clone(),
        })
    }

    /// Sending -> Idle. Success appends the reply; any failure appends the
    /// fixed apology and records the error. The widget stays usable either
    /// way.
    pub fn resolve(&mut self, result: Result<String, CompletionError>) {
        match result {
            Ok(reply) => {
                self.store.append(ChatMessage::bot(reply));
            }
            Err(err) => {
                self.last_error = Some(err.to_string());
                self.store.append(ChatMessage::bot(FALLBACK_REPLY));
            }
        }
        self.in_flight = false;
        self.notify();
    }

    /// Full submit/resolve cycle in one await. Returns false when the
    /// question was ignored.
    pub async fn ask(&mut self, question: &str) -> bool {
        let Some(pending) = self.submit(question) else {
            return false;
        };

        let result = self
            .backend
            .complete(&pending.question, pending.context.as_deref())
            .await;
        self.resolve(result);
        true
    }

    /// Valid from Idle only. Wipes both the live log and the persisted copy.
    pub fn clear(&mut self) -> bool {
        if self.in_flight {
            return false;
        }
        self.store.clear();
        self.notify();
        true
    }

    fn notify(&mut self) {
        let messages = self.store.messages();
        for listener in &mut self.listeners {
            listener(messages);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::CompletionBackend;
    use crate::state::Sender;
    use crate::store::{FileStore, MemoryStore};
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Backend that pops one scripted outcome per call and records what it
    /// was asked.
    struct ScriptedBackend {
        outcomes: Mutex<VecDeque<Result<String, CompletionError>>>,
        calls: Mutex<Vec<(String, Option<String>)>>,
    }

    impl ScriptedBackend {
        fn replying(reply: &str) -> Arc<Self> {
            Self::with_outcomes(vec![Ok(reply.to_string())])
        }

        fn with_outcomes(outcomes: Vec<Result<String, CompletionError>>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(String, Option<String>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionBackend for ScriptedBackend {
        async fn complete(
            &self,
            question: &str,
            context: Option<&str>,
        ) -> Result<String, CompletionError> {
            self.calls
                .lock()
                .unwrap()
                .push((question.to_string(), context.map(str::to_string)));
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(FALLBACK_REPLY.to_string()))
        }
    }

    fn controller(backend: Arc<ScriptedBackend>) -> ConversationController {
        let store = MessageStore::new(Box::new(MemoryStore::new()));
        ConversationController::new(store, backend)
    }

    #[tokio::test]
    async fn successful_ask_appends_user_then_bot() {
        let backend = ScriptedBackend::replying("4");
        let mut controller = controller(backend);

        assert!(controller.ask("What is 2+2?").await);

        let messages = controller.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sender, Sender::User);
        assert_eq!(messages[0].text, "What is 2+2?");
        assert_eq!(messages[1].sender, Sender::Bot);
        assert_eq!(messages[1].text, "4");
        assert!(!controller.in_flight());
        assert!(controller.last_error().is_none());
    }

    #[tokio::test]
    async fn blank_questions_never_mutate_the_log() {
        let backend = ScriptedBackend::replying("unused");
        let mut controller = controller(backend.clone());

        assert!(!controller.ask("").await);
        assert!(!controller.ask("   \t\n").await);

        assert!(controller.messages().is_empty());
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn failed_request_appends_the_apology_and_records_the_error() {
        let backend = ScriptedBackend::with_outcomes(vec![
            Ok("seeded".to_string()),
            Err(CompletionError::RequestFailed(
                StatusCode::INTERNAL_SERVER_ERROR,
            )),
        ]);
        let mut controller = controller(backend);
        controller.ask("seed").await;
        let before = controller.messages().len();

        controller.ask("will fail").await;

        let messages = controller.messages();
        assert_eq!(messages.len(), before + 2);
        assert_eq!(messages.last().unwrap().text, FALLBACK_REPLY);
        assert_eq!(messages.last().unwrap().sender, Sender::Bot);
        assert!(controller.last_error().unwrap().contains("500"));
        assert!(!controller.in_flight());
    }

    #[tokio::test]
    async fn a_later_success_clears_the_recorded_error() {
        let backend = ScriptedBackend::with_outcomes(vec![
            Err(CompletionError::Transport("connection refused".to_string())),
            Ok("recovered".to_string()),
        ]);
        let mut controller = controller(backend);

        controller.ask("first").await;
        assert!(controller.last_error().is_some());

        controller.ask("second").await;
        assert!(controller.last_error().is_none());
        assert_eq!(controller.messages().last().unwrap().text, "recovered");
    }

    #[test]
    fn second_submit_while_in_flight_is_a_no_op() {
        let backend = ScriptedBackend::replying("unused");
        let mut controller = controller(backend);

        let pending = controller.submit("first question");
        assert!(pending.is_some());
        assert!(controller.in_flight());

        assert!(controller.submit("second question").is_none());
        assert_eq!(controller.messages().len(), 1);

        controller.resolve(Ok("done".to_string()));
        assert!(!controller.in_flight());
        assert!(controller.submit("third question").is_some());
    }

    #[tokio::test]
    async fn context_snapshot_travels_with_the_question() {
        let backend = ScriptedBackend::replying("grounded");
        let mut controller = controller(backend.clone());

        controller.set_context("uploaded document text".to_string());
        controller.ask("What does it say?").await;

        let calls = backend.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "What does it say?");
        assert_eq!(calls[0].1.as_deref(), Some("uploaded document text"));
    }

    #[tokio::test]
    async fn a_new_upload_replaces_the_old_context_wholesale() {
        let backend = ScriptedBackend::with_outcomes(vec![Ok("a".into()), Ok("b".into())]);
        let mut controller = controller(backend.clone());

        controller.set_context("first document".to_string());
        controller.set_context("second document".to_string());
        controller.ask("q").await;

        assert_eq!(backend.calls()[0].1.as_deref(), Some("second document"));
    }

    #[tokio::test]
    async fn clear_empties_both_live_and_persisted_history() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");

        let backend = ScriptedBackend::replying("4");
        let store = MessageStore::new(Box::new(FileStore::new(path.clone())));
        let mut controller = ConversationController::new(store, backend);

        controller.ask("What is 2+2?").await;
        assert!(path.exists());

        assert!(controller.clear());
        assert!(controller.messages().is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn clear_is_refused_while_a_request_is_outstanding() {
        let backend = ScriptedBackend::replying("unused");
        let mut controller = controller(backend);

        controller.submit("hold the line");
        assert!(!controller.clear());
        assert_eq!(controller.messages().len(), 1);
    }

    #[tokio::test]
    async fn listeners_see_every_mutation() {
        let backend = ScriptedBackend::replying("4");
        let mut controller = controller(backend);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        controller.on_change(Box::new(move |messages| {
            sink.lock().unwrap().push(messages.len());
        }));

        controller.ask("What is 2+2?").await;
        controller.clear();

        // submit, resolve, clear
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 0]);
    }
}
