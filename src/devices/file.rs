//! File device implementation

use super::text::TextDevice;
use crate::core::{Device, LoggerError, Message, Result, SharedTemplate, Template};
use std::fs::{File, OpenOptions};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Appends rendered lines to a file
///
/// The file is created if it does not exist, but its directory must. Lines
/// are buffered and flushed whenever the logger's queue runs empty.
pub struct FileDevice {
    inner: TextDevice<BufWriter<File>>,
    path: PathBuf,
}

impl FileDevice {
    /// Open `path` for appending
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use rust_device_logger::devices::FileDevice;
    ///
    /// let device = FileDevice::new("/var/log/app.log")
    ///     .unwrap()
    ///     .with_template("{0:%Y-%m-%d %H:%M:%S} {1} {2}")
    ///     .unwrap();
    /// ```
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                LoggerError::io_operation("opening log file", path.display().to_string(), e)
            })?;

        Ok(Self {
            inner: TextDevice::new(BufWriter::new(file)).with_name("file"),
            path,
        })
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

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn template(&self) -> Template {
        self.inner.template()
    }

    pub fn template_handle(&self) -> SharedTemplate {
        self.inner.template_handle()
    }
}

impl Device for FileDevice {
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
