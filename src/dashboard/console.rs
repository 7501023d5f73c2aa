use std::collections::VecDeque;

use chrono::{DateTime, Utc};

pub const CONSOLE_CAPACITY: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum ConsoleLevel {
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct ConsoleLine {
    pub at: DateTime<Utc>,
    pub level: ConsoleLevel,
    pub message: String,
}

/// The dashboard's on-screen log. Oldest lines fall off once full.
#[derive(Debug)]
pub struct Console {
    lines: VecDeque<ConsoleLine>,
    capacity: usize,
}

impl Default for Console {
    fn default() -> Self {
        Self::with_capacity(CONSOLE_CAPACITY)
    }
}

impl Console {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn info(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::info!("{}", message);
        self.push(ConsoleLevel::Info, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{}", message);
        self.push(ConsoleLevel::Error, message);
    }

    pub fn lines(&self) -> impl Iterator<Item = &ConsoleLine> {
        self.lines.iter()
    }

    pub fn last(&self) -> Option<&ConsoleLine> {
        self.lines.back()
    }

    pub fn errors(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| l.level == ConsoleLevel::Error)
            .count()
    }

    fn push(&mut self, level: ConsoleLevel, message: String) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(ConsoleLine {
            at: Utc::now(),
            level,
            message,
        });
    }
}
