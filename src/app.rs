use tokio::sync::mpsc;

use crate::api::ApiClient;
use crate::conversation::{ChatMessage, Conversation};

/// Application state for the chat session.
///
/// Owned by the event loop task; background request tasks never touch it
/// directly. They hand finished replies back over the reply channel and
/// the loop applies them in arrival order.
pub struct App {
    // Core state
    pub should_quit: bool,

    // Chat history
    pub conversation: Conversation,

    // Input state
    pub input: String,
    pub cursor: usize, // cursor position in input, in chars

    // Browsing flag, forwarded verbatim on every send
    pub enable_browsing: bool,

    // In-flight request bookkeeping
    pending_requests: usize,
    replies_tx: mpsc::UnboundedSender<ChatMessage>,

    // Chat viewport (updated during render)
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub chat_width: u16,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Backend
    pub api: ApiClient,
}

impl App {
    pub fn new(api: ApiClient, replies_tx: mpsc::UnboundedSender<ChatMessage>) -> Self {
        Self {
            should_quit: false,
            conversation: Conversation::seeded(),
            input: String::new(),
            cursor: 0,
            enable_browsing: false,
            pending_requests: 0,
            replies_tx,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            animation_frame: 0,
            api,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.pending_requests > 0
    }

    pub fn toggle_browsing(&mut self) {
        self.enable_browsing = !self.enable_browsing;
    }

    /// Sends the current input as a user message.
    ///
    /// Blank and whitespace-only input is a no-op: no request goes out
    /// and the history is untouched. Otherwise the user message is
    /// appended immediately and the exchange runs on a background task
    /// whose reply arrives through the reply channel.
    pub fn submit_input(&mut self) {
        if self.input.trim().is_empty() {
            return;
        }

        let text = std::mem::take(&mut self.input);
        self.cursor = 0;

        self.conversation.push(ChatMessage::user(text.clone()));
        self.pending_requests += 1;
        self.scroll_chat_to_bottom();

        let api = self.api.clone();
        let enable_browsing = self.enable_browsing;
        let tx = self.replies_tx.clone();
        tokio::spawn(async move {
            let reply = api.send_message(&text, enable_browsing).await;
            let _ = tx.send(reply);
        });
    }

    /// Applies a finished exchange. Replies land in arrival order, which
    /// for overlapping sends may differ from send order.
    pub fn apply_reply(&mut self, reply: ChatMessage) {
        self.pending_requests = self.pending_requests.saturating_sub(1);
        self.conversation.push(reply);
        self.scroll_chat_to_bottom();
    }

    /// Clears the conversation and asks the backend to forget the
    /// session. Local state is cleared unconditionally; a failed
    /// server-side reset only shows up in the log.
    pub fn reset_memory(&mut self) {
        let api = self.api.clone();
        tokio::spawn(async move {
            api.reset_session().await;
        });

        self.conversation.clear();
        self.chat_scroll = 0;
    }

    pub fn tick_animation(&mut self) {
        if self.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(1);
    }

    /// Scroll the chat so the newest message (or "Thinking...") is visible.
    pub fn scroll_chat_to_bottom(&mut self) {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for msg in self.conversation.messages() {
            if msg.content.is_empty() {
                continue; // suppressed from rendering
            }
            total_lines += 1; // Role line ("You:" or "Agent:")
            for line in msg.content.lines() {
                // Character count, not byte length, for proper UTF-8 handling
                let char_count = line.chars().count();
                if char_count == 0 {
                    total_lines += 1;
                } else {
                    total_lines += ((char_count / wrap_width) + 1) as u16;
                }
            }
            total_lines += 1; // Blank line after message
        }

        if self.is_loading() {
            total_lines += 2; // Role line + "Thinking..."
        }

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        if total_lines > visible_height {
            self.chat_scroll = total_lines.saturating_sub(visible_height);
        } else {
            self.chat_scroll = 0;
        }
    }
}
