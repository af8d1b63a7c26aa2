use anyhow::{anyhow, Result};
use tokio::task::JoinHandle;

use crate::api::{Responder, StoryReply, APOLOGY_TEXT, GENERIC_ERROR_TEXT};

/// Greeting seeded into every fresh session.
pub const GREETING: &str =
    "Hello! I'm your storytelling assistant. What kind of story would you like to hear today?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

/// One chat bubble. Append-only; never mutated after creation.
#[derive(Debug, Clone)]
pub struct Message {
    pub sender: Sender,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Chat state
    pub messages: Vec<Message>,
    pub input: String,
    pub cursor: usize, // char position in input

    // Request state
    pub in_flight: bool,
    pub last_error: Option<String>,
    pub task: Option<JoinHandle<Result<StoryReply>>>,

    // Chat scroll state; dimensions are updated during render
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub chat_width: u16,

    // 0-2 for the ellipsis animation
    pub animation_frame: u8,

    pub responder: Responder,
}

impl App {
    pub fn new(responder: Responder) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            messages: vec![Message {
                sender: Sender::Bot,
                text: GREETING.to_string(),
            }],
            input: String::new(),
            cursor: 0,
            in_flight: false,
            last_error: None,
            task: None,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            animation_frame: 0,
            responder,
        }
    }

    /// The submission operation. Appends the user message verbatim, marks the
    /// request in flight, clears the prior error and the input, and hands the
    /// prompt back for dispatch. Refuses silently when the trimmed input is
    /// empty or a request is already outstanding.
    pub fn submit(&mut self) -> Option<String> {
        if self.input.trim().is_empty() || self.in_flight {
            return None;
        }

        let prompt = std::mem::take(&mut self.input);
        self.cursor = 0;
        self.messages.push(Message {
            sender: Sender::User,
            text: prompt.clone(),
        });
        self.last_error = None;
        self.in_flight = true;
        self.scroll_to_bottom();
        Some(prompt)
    }

    /// Settles a completed attempt: exactly one bot message is appended and
    /// the in-flight flag is cleared, whichever path was taken.
    pub fn settle(&mut self, outcome: Result<StoryReply>) {
        let text = match outcome {
            Ok(reply) => reply.text().to_string(),
            Err(err) => {
                self.last_error = Some(err.to_string());
                APOLOGY_TEXT.to_string()
            }
        };
        self.messages.push(Message {
            sender: Sender::Bot,
            text,
        });
        self.in_flight = false;
        self.animation_frame = 0;
        self.scroll_to_bottom();
    }

    /// Reaps the background request once it has finished. A panicked task is
    /// settled like any other transport failure.
    pub async fn poll_response(&mut self) {
        let finished = self.task.as_ref().is_some_and(|t| t.is_finished());
        if !finished {
            return;
        }
        let task = self.task.take().expect("checked above");
        match task.await {
            Ok(outcome) => self.settle(outcome),
            Err(_) => self.settle(Err(anyhow!(GENERIC_ERROR_TEXT))),
        }
    }

    pub fn tick_animation(&mut self) {
        if self.in_flight {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Input editing, cursor tracked as a char index

    fn byte_pos(&self) -> usize {
        self.input
            .char_indices()
            .nth(self.cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.input.len())
    }

    pub fn insert_char(&mut self, c: char) {
        let pos = self.byte_pos();
        self.input.insert(pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let pos = self.byte_pos();
            self.input.remove(pos);
        }
    }

    pub fn delete_char(&mut self) {
        if self.cursor < self.input.chars().count() {
            let pos = self.byte_pos();
            self.input.remove(pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.input.chars().count());
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.input.chars().count();
    }

    // Chat scrolling

    /// Total rendered chat lines at the current wrap width: a label line per
    /// message, its wrapped content, a trailing blank, and the loading
    /// indicator while a request is outstanding.
    pub fn total_chat_lines(&self) -> u16 {
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total: u16 = 0;
        for msg in &self.messages {
            total += 1; // label line
            for line in msg.text.lines() {
                total += wrapped_line_count(line, wrap_width);
            }
            total += 1; // blank line after message
        }

        if self.in_flight {
            total += 2; // label + "Thinking..."
        }

        total
    }

    pub fn scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        let max = self.total_chat_lines().saturating_sub(self.chat_height);
        if self.chat_scroll < max {
            self.chat_scroll += 1;
        }
    }

    pub fn scroll_to_top(&mut self) {
        self.chat_scroll = 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        let visible = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };
        self.chat_scroll = self.total_chat_lines().saturating_sub(visible);
    }
}

/// Lines one chat line occupies after wrapping at `width` columns.
/// Follows the renderer's greedy word wrap: a word that no longer fits
/// moves whole to the next line, and words wider than a full line split.
fn wrapped_line_count(line: &str, width: usize) -> u16 {
    if width == 0 {
        return 1;
    }
    let mut lines: u16 = 1;
    let mut used = 0usize;
    for word in line.split(' ') {
        let mut len = word.chars().count();
        if used > 0 {
            if used + 1 + len <= width {
                used += 1 + len;
                continue;
            }
            lines += 1;
        }
        while len > width {
            lines += 1;
            len -= width;
        }
        used = len;
    }
    lines
}
