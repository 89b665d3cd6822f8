use std::path::Path;

use docchat_core::{context, CompletionError, ConversationController};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub controller: ConversationController,

    // Question input
    pub input: String,
    pub cursor: usize, // char position in input

    // Chat viewport
    pub chat_scroll: u16,
    pub chat_height: u16, // height of chat area for scroll calculations
    pub chat_width: u16,  // width of chat area for wrap calculations
    pub animation_frame: u8,

    // Context file prompt
    pub show_context_prompt: bool,
    pub context_input: String,
    pub context_file: Option<String>, // display name of the loaded file

    // Transient footer status
    pub status: Option<String>,

    // Outstanding completion request, if any
    pub query_task: Option<JoinHandle<Result<String, CompletionError>>>,
}

impl App {
    pub fn new(controller: ConversationController) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Normal,
            controller,
            input: String::new(),
            cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            animation_frame: 0,
            show_context_prompt: false,
            context_input: String::new(),
            context_file: None,
            status: None,
            query_task: None,
        }
    }

    /// Hands the typed question to the controller; when accepted, spawns the
    /// completion call on a background task so the UI keeps rendering.
    pub fn submit_question(&mut self) {
        let question = self.input.clone();
        let Some(pending) = self.controller.submit(&question) else {
            return;
        };

        self.input.clear();
        self.cursor = 0;
        self.input_mode = InputMode::Normal;
        self.status = None;

        let backend = self.controller.backend();
        self.query_task = Some(tokio::spawn(async move {
            backend
                .complete(&pending.question, pending.context.as_deref())
                .await
        }));

        // Scroll so the thinking indicator is visible
        self.scroll_to_bottom();
    }

    pub async fn tick(&mut self) {
        if self.controller.in_flight() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
        self.poll_query_task().await;
    }

    /// Feeds a finished completion task back into the controller on the UI
    /// task. A task that died before producing a result counts as a
    /// transport failure.
    async fn poll_query_task(&mut self) {
        let finished = self
            .query_task
            .as_ref()
            .map(|task| task.is_finished())
            .unwrap_or(false);
        if !finished {
            return;
        }

        if let Some(task) = self.query_task.take() {
            let result = match task.await {
                Ok(result) => result,
                Err(err) => Err(CompletionError::Transport(format!(
                    "completion task aborted: {err}"
                ))),
            };
            self.controller.resolve(result);
            self.scroll_to_bottom();
        }
    }

    /// Loads a context file and replaces any previous context wholesale. A
    /// blank path is a no-op, matching "no file selected".
    pub fn load_context(&mut self, raw_path: &str) {
        let trimmed = raw_path.trim();
        if trimmed.is_empty() {
            return;
        }

        let path = Path::new(trimmed);
        match context::read_context_file(path) {
            Ok(text) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| trimmed.to_string());
                self.status = Some(format!("Loaded {} ({} chars) as context", name, text.chars().count()));
                self.context_file = Some(name);
                self.controller.set_context(text);
            }
            Err(err) => {
                self.status = Some(format!("{err:#}"));
            }
        }
    }

    /// Clear is offered only when there is history to clear and no request
    /// is outstanding.
    pub fn clear_chat(&mut self) {
        if self.controller.messages().is_empty() {
            return;
        }
        if self.controller.clear() {
            self.chat_scroll = 0;
            self.status = Some("Chat cleared".to_string());
        }
    }

    // --- input editing ---

    fn byte_index(&self) -> usize {
        self.input
            .char_indices()
            .nth(self.cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.input.len())
    }

    pub fn insert_char(&mut self, c: char) {
        let at = self.byte_index();
        self.input.insert(at, c);
        self.cursor += 1;
    }

    pub fn delete_char(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_index();
        self.input.remove(at);
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.input.chars().count());
    }

    pub fn move_cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_cursor_end(&mut self) {
        self.cursor = self.input.chars().count();
    }

    // --- chat viewport ---

    pub fn scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(1);
    }

    /// Estimates the rendered line count so the newest message stays in
    /// view. Uses the last observed chat area size, defaulting before the
    /// first frame.
    pub fn scroll_to_bottom(&mut self) {
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines = 0usize;
        for msg in self.controller.messages() {
            total_lines += 1; // sender header
            for line in msg.text.lines() {
                total_lines += (line.chars().count() / wrap_width) + 1;
            }
            total_lines += 1; // separator
        }
        if self.controller.in_flight() {
            total_lines += 2; // thinking indicator
        }

        let visible = if self.chat_height > 0 {
            self.chat_height as usize
        } else {
            10
        };

        self.chat_scroll = total_lines.saturating_sub(visible) as u16;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use docchat_core::{CompletionBackend, MemoryStore, MessageStore, Sender};
    use std::io::Write;
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    struct CannedBackend {
        reply: String,
    }

    #[async_trait]
    impl CompletionBackend for CannedBackend {
        async fn complete(
            &self,
            _question: &str,
            _context: Option<&str>,
        ) -> Result<String, CompletionError> {
            Ok(self.reply.clone())
        }
    }

    fn app_with_reply(reply: &str) -> App {
        let store = MessageStore::new(Box::new(MemoryStore::new()));
        let backend = Arc::new(CannedBackend {
            reply: reply.to_string(),
        });
        App::new(ConversationController::new(store, backend))
    }

    async fn drain_query_task(app: &mut App) {
        while app.query_task.is_some() {
            app.tick().await;
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn submitting_blank_input_does_nothing() {
        let mut app = app_with_reply("unused");
        app.input = "   ".to_string();

        app.submit_question();

        assert!(app.query_task.is_none());
        assert!(app.controller.messages().is_empty());
    }

    #[tokio::test]
    async fn submit_then_poll_produces_user_and_bot_messages() {
        let mut app = app_with_reply("4");
        app.input = "What is 2+2?".to_string();

        app.submit_question();
        assert!(app.input.is_empty());
        assert!(app.controller.in_flight());

        drain_query_task(&mut app).await;

        let messages = app.controller.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sender, Sender::User);
        assert_eq!(messages[1].text, "4");
        assert!(!app.controller.in_flight());
    }

    #[tokio::test]
    async fn second_submit_while_waiting_is_ignored() {
        let mut app = app_with_reply("slow reply");
        app.input = "first".to_string();
        app.submit_question();

        app.input = "second".to_string();
        app.submit_question();

        // Only the optimistic user message from the first submit so far,
        // and the second question is still in the input box.
        assert_eq!(app.controller.messages().len(), 1);
        assert_eq!(app.input, "second");

        drain_query_task(&mut app).await;
        assert_eq!(app.controller.messages().len(), 2);
    }

    #[tokio::test]
    async fn loading_a_context_file_sets_the_pending_context() {
        let mut app = app_with_reply("unused");

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"release notes").unwrap();

        app.load_context(&file.path().to_string_lossy());

        assert_eq!(app.controller.context(), Some("release notes"));
        assert!(app.context_file.is_some());
    }

    #[tokio::test]
    async fn blank_context_path_is_a_no_op() {
        let mut app = app_with_reply("unused");
        app.load_context("   ");
        assert!(app.controller.context().is_none());
        assert!(app.context_file.is_none());
    }

    #[tokio::test]
    async fn clear_chat_requires_history() {
        let mut app = app_with_reply("4");

        app.clear_chat();
        assert!(app.status.is_none());

        app.input = "hello".to_string();
        app.submit_question();
        drain_query_task(&mut app).await;

        app.clear_chat();
        assert!(app.controller.messages().is_empty());
        assert_eq!(app.status.as_deref(), Some("Chat cleared"));
    }

    #[test]
    fn cursor_editing_respects_char_boundaries() {
        let store = MessageStore::new(Box::new(MemoryStore::new()));
        let backend = Arc::new(CannedBackend {
            reply: String::new(),
        });
        let mut app = App::new(ConversationController::new(store, backend));

        for c in "héllo".chars() {
            app.insert_char(c);
        }
        assert_eq!(app.input, "héllo");

        app.move_cursor_left();
        app.move_cursor_left();
        app.delete_char(); // removes one 'l'
        assert_eq!(app.input, "hélo");

        app.move_cursor_home();
        app.delete_char(); // no-op at the start
        assert_eq!(app.input, "hélo");

        app.move_cursor_end();
        app.insert_char('!');
        assert_eq!(app.input, "hélo!");
    }
}
