//! Console device implementation

use super::text::TextDevice;
use crate::core::{Device, Message, Result, SharedTemplate, Template};
use std::io::{self, Stderr};
use std::time::Duration;

/// Writes rendered lines to the process's standard error stream
pub struct ConsoleDevice {
    inner: TextDevice<Stderr>,
}

impl ConsoleDevice {
    pub fn new() -> Self {
        Self {
            inner: TextDevice::new(io::stderr()).with_name("console"),
        }
    }

    /// Color the severity name
    ///
    /// # Example
    ///
    /// ```
    /// use rust_device_logger::devices::ConsoleDevice;
    ///
    /// let device = ConsoleDevice::new().with_colors(true);
    /// ```
    #[cfg(feature = "console")]
    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.inner = self.inner.with_colors(use_colors);
        self
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

    pub fn template(&self) -> Template {
        self.inner.template()
    }

    pub fn template_handle(&self) -> SharedTemplate {
        self.inner.template_handle()
    }

    /// The line this device writes for `message`, without the newline
    pub fn render(&self, message: &Message) -> String {
        self.inner.render(message)
    }
}

impl Default for ConsoleDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl Device for ConsoleDevice {
    fn write(&mut self, message: &Message) -> Result<()> {
        self.inner.write(message)
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
