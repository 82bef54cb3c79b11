//! Database device stub
//!
//! Builds the row that would be inserted into the `Log` table and counts it,
//! without talking to a database.

use crate::core::{Device, Message, Result, Severity};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Default table the stub pretends to insert into
pub const DEFAULT_TABLE: &str = "Log";

#[derive(Debug, Serialize)]
struct LogRow<'a> {
    table: &'a str,
    date: DateTime<Utc>,
    severity: Severity,
    message: &'a str,
}

/// Rows a [`DatabaseDevice`] has "inserted"
///
/// Clones share the count and the most recent row, so the handle stays
/// readable after the device moves into a logger.
#[derive(Debug, Clone, Default)]
pub struct RowCounter {
    count: Arc<AtomicU64>,
    last: Arc<Mutex<Option<String>>>,
}

impl RowCounter {
    pub fn get(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// JSON of the most recent row
    pub fn last_row(&self) -> Option<String> {
        self.last.lock().clone()
    }

    fn record(&self, row: String) {
        *self.last.lock() = Some(row);
        self.count.fetch_add(1, Ordering::Relaxed);
    }
}

pub struct DatabaseDevice {
    table: String,
    write_delay: Duration,
    rows: RowCounter,
}

impl DatabaseDevice {
    pub fn new() -> Self {
        Self {
            table: DEFAULT_TABLE.to_string(),
            write_delay: Duration::ZERO,
            rows: RowCounter::default(),
        }
    }

    #[must_use]
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Sleep this long per row, standing in for a database round trip
    #[must_use]
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = delay;
        self
    }

    /// Handle for reading rows after the device moves into a logger
    pub fn rows(&self) -> RowCounter {
        self.rows.clone()
    }
}

impl Default for DatabaseDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl Device for DatabaseDevice {
    fn write(&mut self, message: &Message) -> Result<()> {
        if !self.write_delay.is_zero() {
            thread::sleep(self.write_delay);
        }

        let row = LogRow {
            table: &self.table,
            date: message.timestamp(),
            severity: message.severity(),
            message: message.text(),
        };
        self.rows.record(serde_json::to_string(&row)?);
        Ok(())
    }

    fn name(&self) -> &str {
        "database"
    }
}
