// ABOUTME: Append-only transcript of engine progress and non-fatal warnings.
// ABOUTME: Every entry is also emitted through tracing as it is recorded.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Ordered, human-readable record of what an invocation did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Transcript {
    entries: Vec<Entry>,
}

impl Transcript {
    /// Record a progress line.
    pub fn record(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("{}", message);
        self.entries.push(Entry::new(EntryLevel::Info, message));
    }

    /// Record a warning that does not fail the invocation.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{}", message);
        self.entries.push(Entry::new(EntryLevel::Warning, message));
    }

    /// All entries in recording order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Warning entries only.
    pub fn warnings(&self) -> impl Iterator<Item = &Entry> {
        self.entries
            .iter()
            .filter(|e| e.level == EntryLevel::Warning)
    }

    /// Check if any warnings were recorded.
    pub fn has_warnings(&self) -> bool {
        self.warnings().next().is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Plain-text rendering, one entry per line.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", entry)?;
        }
        Ok(())
    }
}

/// A single transcript line.
#[derive(Debug, Clone, Serialize)]
pub struct Entry {
    pub at: DateTime<Utc>,
    pub level: EntryLevel,
    pub message: String,
}

impl Entry {
    fn new(level: EntryLevel, message: String) -> Self {
        Self {
            at: Utc::now(),
            level,
            message,
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level {
            EntryLevel::Info => write!(f, "{}", self.message),
            EntryLevel::Warning => write!(f, "WARNING: {}", self.message),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryLevel {
    Info,
    Warning,
}
