//! Message structure

use super::severity::Severity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One log event. Built at submission time and never mutated afterwards;
/// the timestamp records when the caller logged, not when a device wrote it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    severity: Severity,
    text: String,
    timestamp: DateTime<Utc>,
    sequence: u64,
}

impl Message {
    pub fn new(severity: Severity, text: impl Into<String>) -> Self {
        Self::at(severity, text, Utc::now())
    }

    /// Build a message with an explicit timestamp
    pub fn at(severity: Severity, text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            severity,
            text: text.into(),
            timestamp,
            sequence: 0,
        }
    }

    pub(crate) fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    #[inline]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[inline]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Submission order within the owning logger. Zero for messages built
    /// outside a logger.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}
