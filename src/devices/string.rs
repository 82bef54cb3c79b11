//! In-memory string device, mostly for tests

use super::text::TextDevice;
use crate::core::{Device, Message, Result, SharedTemplate, Template};
use parking_lot::Mutex;
use std::fmt;
use std::io;
use std::sync::Arc;
use std::time::Duration;

/// Shared text buffer behind a [`StringDevice`]
///
/// Clones share the same storage. Appends and reads take the same lock, so
/// a snapshot never contains half a line.
#[derive(Debug, Clone, Default)]
pub struct StringBuffer {
    inner: Arc<Mutex<String>>,
}

impl StringBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything written so far
    pub fn contents(&self) -> String {
        self.inner.lock().clone()
    }

    /// Snapshot split into lines, without line terminators
    pub fn lines(&self) -> Vec<String> {
        self.inner.lock().lines().map(str::to_string).collect()
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl io::Write for StringBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.lock().push_str(&String::from_utf8_lossy(buf));
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl fmt::Display for StringBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner.lock())
    }
}

/// Writes rendered lines into a [`StringBuffer`]
///
/// # Example
///
/// ```
/// use rust_device_logger::prelude::*;
///
/// let device = StringDevice::new().with_template("{1} {2}").unwrap();
/// let buffer = device.buffer();
///
/// let logger = Logger::builder().device(device).build().unwrap();
/// logger.information("Hello, World!").unwrap();
/// logger.wait_until_empty().unwrap();
///
/// assert_eq!(buffer.contents(), "Information Hello, World!\n");
/// ```
pub struct StringDevice {
    inner: TextDevice<StringBuffer>,
}

impl StringDevice {
    pub fn new() -> Self {
        Self::with_buffer(StringBuffer::new())
    }

    /// Write into an existing buffer, e.g. one shared by several devices
    pub fn with_buffer(buffer: StringBuffer) -> Self {
        Self {
            inner: TextDevice::new(buffer).with_name("string"),
        }
    }

    pub fn with_template(mut self, template: &str) -> Result<Self> {
        self.inner = self.inner.with_template(template)?;
        Ok(self)
    }

    #[must_use]
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.inner = self.inner.with_write_delay(delay);
        self
    }

    /// Handle for reading the buffer after the device moves into a logger
    pub fn buffer(&self) -> StringBuffer {
        self.inner.get_ref().clone()
    }

    pub fn template(&self) -> Template {
        self.inner.template()
    }

    /// Handle for changing the template after the device moves into a logger
    pub fn template_handle(&self) -> SharedTemplate {
        self.inner.template_handle()
    }
}

impl Default for StringDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl Device for StringDevice {
    fn write(&mut self, message: &Message) -> Result<()> {
        self.inner.write(message)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
