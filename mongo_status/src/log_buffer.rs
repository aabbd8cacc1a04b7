use chrono::{DateTime, Utc};
use log::Level;
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt::{Display, Formatter};
use std::sync::Mutex;

/// Default number of lines kept in memory
pub const DEFAULT_CAPACITY: usize = 300;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogLine {
    pub at: DateTime<Utc>,
    pub level: String,
    pub message: String,
}

impl Display for LogLine {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] [{}] {}",
            self.at.format("%Y-%m-%d %H:%M:%S"),
            self.level,
            self.message
        )
    }
}

/// Bounded in-memory log of recent probe events, oldest lines are dropped
/// first once the capacity is reached.
pub struct RollingLog {
    capacity: usize,
    lines: Mutex<VecDeque<LogLine>>,
}

impl Default for RollingLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl RollingLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            lines: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Emit a log record and keep a copy in the buffer
    pub fn record(&self, level: Level, message: impl Into<String>) {
        let message = message.into();
        log::log!(level, "{}", message);
        self.push(LogLine {
            at: Utc::now(),
            level: level.to_string(),
            message,
        });
    }

    pub fn push(&self, line: LogLine) {
        let mut lines = self.lines.lock().unwrap_or_else(|e| e.into_inner());
        lines.push_back(line);
        while lines.len() > self.capacity {
            lines.pop_front();
        }
    }

    /// Up to `n` most recent lines, oldest first
    pub fn tail(&self, n: usize) -> Vec<LogLine> {
        let lines = self.lines.lock().unwrap_or_else(|e| e.into_inner());
        let skip = lines.len().saturating_sub(n);
        lines.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
