//! Chat log, guess composition and typing presence

use log::debug;
use shared::{ChatKind, Intent, TYPING_DISPLAY_WINDOW};
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq)]
pub struct ChatEntry {
    pub author: String,
    pub text: String,
    pub kind: ChatKind,
}

/// Append-only timeline of chat and notices for the current round.
#[derive(Debug, Default)]
pub struct ChatLog {
    entries: Vec<ChatEntry>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, author: &str, text: &str, kind: ChatKind) {
        self.entries.push(ChatEntry {
            author: author.to_string(),
            text: text.to_string(),
            kind,
        });
    }

    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    /// The last `count` entries, oldest first.
    pub fn tail(&self, count: usize) -> &[ChatEntry] {
        let start = self.entries.len().saturating_sub(count);
        &self.entries[start..]
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Who is currently typing, each author with an independent expiry deadline.
#[derive(Debug)]
pub struct TypingPresence {
    window: Duration,
    deadlines: HashMap<String, Instant>,
}

impl TypingPresence {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadlines: HashMap::new(),
        }
    }

    /// Shows `author` as typing and restarts their expiry window.
    pub fn pulse(&mut self, author: &str, now: Instant) {
        self.deadlines.insert(author.to_string(), now + self.window);
    }

    pub fn expire(&mut self, now: Instant) {
        self.deadlines.retain(|_, deadline| *deadline > now);
    }

    pub fn is_typing(&self, author: &str, now: Instant) -> bool {
        self.deadlines
            .get(author)
            .is_some_and(|deadline| *deadline > now)
    }

    /// Authors still inside their window, sorted for stable display.
    pub fn typing_authors(&self, now: Instant) -> Vec<&str> {
        let mut authors: Vec<&str> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline > now)
            .map(|(author, _)| author.as_str())
            .collect();
        authors.sort_unstable();
        authors
    }

    pub fn clear(&mut self) {
        self.deadlines.clear();
    }
}

impl Default for TypingPresence {
    fn default() -> Self {
        Self::new(TYPING_DISPLAY_WINDOW)
    }
}

/// Pending guess text. Correctness is judged by the coordinator, never here.
#[derive(Debug, Default)]
pub struct GuessComposer {
    text: String,
}

impl GuessComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Appends a character, returning a typing pulse when guessing is allowed.
    pub fn type_char(&mut self, c: char, can_guess: bool, author: &str) -> Option<Intent> {
        if c.is_control() {
            return None;
        }
        self.text.push(c);
        Self::pulse(can_guess, author)
    }

    pub fn backspace(&mut self, can_guess: bool, author: &str) -> Option<Intent> {
        self.text.pop()?;
        Self::pulse(can_guess, author)
    }

    /// Produces the guess intent, or nothing when guessing is not allowed or the
    /// text is blank.
    pub fn submit(&mut self, can_guess: bool) -> Option<Intent> {
        if !can_guess {
            debug!("Guess suppressed: not permitted");
            return None;
        }
        let text = self.text.trim();
        if text.is_empty() {
            return None;
        }

        let intent = Intent::Guess {
            text: text.to_string(),
        };
        self.text.clear();
        Some(intent)
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    fn pulse(can_guess: bool, author: &str) -> Option<Intent> {
        can_guess.then(|| Intent::Typing {
            name: author.to_string(),
        })
    }
}
