//! Text-stream device: renders each message through a [`Template`] and
//! writes one line to any `io::Write` sink.

use crate::core::{Device, LoggerError, Message, Result, SharedTemplate, Template};
use std::io::Write;
use std::thread;
use std::time::Duration;

pub struct TextDevice<W> {
    writer: W,
    template: SharedTemplate,
    write_delay: Duration,
    name: String,
    #[cfg(feature = "console")]
    use_colors: bool,
}

impl<W: Write + Send> TextDevice<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            template: SharedTemplate::default(),
            write_delay: Duration::ZERO,
            name: "text".to_string(),
            #[cfg(feature = "console")]
            use_colors: false,
        }
    }

    /// Replace the template, e.g. `"{1} {2}"` to drop the timestamp
    ///
    /// # Example
    ///
    /// ```
    /// use rust_device_logger::devices::TextDevice;
    ///
    /// let device = TextDevice::new(Vec::new())
    ///     .with_template("{0:%H:%M:%S} {1}: {2}")
    ///     .unwrap();
    /// assert_eq!(device.template().as_str(), "{0:%H:%M:%S} {1}: {2}");
    /// ```
    pub fn with_template(self, template: &str) -> Result<Self> {
        self.template.set(template)?;
        Ok(self)
    }

    #[must_use]
    pub fn with_parsed_template(self, template: Template) -> Self {
        self.template.replace(template);
        self
    }

    /// Sleep this long before every write, to simulate a slow sink
    #[must_use]
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = delay;
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Color the severity slot with ANSI escapes
    #[cfg(feature = "console")]
    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    pub fn set_template(&self, template: &str) -> Result<()> {
        self.template.set(template)
    }

    /// Copy of the current template
    pub fn template(&self) -> Template {
        self.template.get()
    }

    /// Handle that keeps working after the device moves into a logger
    pub fn template_handle(&self) -> SharedTemplate {
        self.template.clone()
    }

    pub fn write_delay(&self) -> Duration {
        self.write_delay
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    /// The line this device would write for `message`, without the newline
    #[cfg(feature = "console")]
    pub fn render(&self, message: &Message) -> String {
        use colored::Colorize;

        if !self.use_colors {
            return self.template.render(message);
        }
        self.template.render_with(message, |severity| {
            severity.to_str().color(severity.color_code()).to_string()
        })
    }

    /// The line this device would write for `message`, without the newline
    #[cfg(not(feature = "console"))]
    pub fn render(&self, message: &Message) -> String {
        self.template.render(message)
    }
}

impl<W: Write + Send> Device for TextDevice<W> {
    fn write(&mut self, message: &Message) -> Result<()> {
        if !self.write_delay.is_zero() {
            thread::sleep(self.write_delay);
        }

        let mut line = self.render(message);
        line.push('\n');

        self.writer
            .write_all(line.as_bytes())
            .map_err(|e| LoggerError::io_operation("writing log line", self.name.clone(), e))
    }

    fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| LoggerError::io_operation("flushing device", self.name.clone(), e))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
