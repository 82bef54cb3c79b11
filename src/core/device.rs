//! Device trait for log delivery targets, plus the severity gate every
//! device is wrapped in once it is registered.

use super::{error::Result, message::Message, severity::Severity};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// A delivery target. Implementations only supply the write primitive;
/// severity filtering is done once by [`GatedDevice`].
///
/// Writes are only ever issued from the dispatcher thread, one at a time.
///
/// # Example
///
/// ```
/// use rust_device_logger::{Device, Message, Result};
///
/// struct CountingDevice(usize);
///
/// impl Device for CountingDevice {
///     fn write(&mut self, _message: &Message) -> Result<()> {
///         self.0 += 1;
///         Ok(())
///     }
///
///     fn name(&self) -> &str {
///         "counting"
///     }
/// }
/// ```
pub trait Device: Send {
    fn write(&mut self, message: &Message) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str;
}

impl<D: Device + ?Sized> Device for Box<D> {
    fn write(&mut self, message: &Message) -> Result<()> {
        (**self).write(message)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Stable identifier of a registered device. Handles are issued in
/// increasing order and never reused by the same logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DeviceHandle(u64);

impl DeviceHandle {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Minimum severity a device accepts, readable and writable from any thread
#[derive(Debug, Default)]
pub struct SeverityThreshold(AtomicU8);

impl SeverityThreshold {
    pub const fn new(severity: Severity) -> Self {
        Self(AtomicU8::new(severity as u8))
    }

    #[inline]
    pub fn get(&self) -> Severity {
        Severity::from_u8(self.0.load(Ordering::Acquire))
    }

    #[inline]
    pub fn set(&self, severity: Severity) {
        self.0.store(severity as u8, Ordering::Release);
    }

    #[inline]
    pub fn admits(&self, severity: Severity) -> bool {
        severity >= self.get()
    }
}

/// Outcome of a gated delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The device's write primitive ran and succeeded
    Written,
    /// The message was below the device threshold; nothing was written
    Discarded,
}

/// Severity gate around a device
///
/// The threshold is shared, so it can be changed while the device itself is
/// owned by the dispatcher.
pub struct GatedDevice {
    device: Box<dyn Device>,
    threshold: Arc<SeverityThreshold>,
}

impl GatedDevice {
    /// Wrap a device that accepts every severity
    pub fn new(device: impl Device + 'static) -> Self {
        Self::with_threshold(device, Severity::Verbose)
    }

    pub fn with_threshold(device: impl Device + 'static, minimum: Severity) -> Self {
        Self {
            device: Box::new(device),
            threshold: Arc::new(SeverityThreshold::new(minimum)),
        }
    }

    pub fn threshold(&self) -> &Arc<SeverityThreshold> {
        &self.threshold
    }

    pub fn minimum_severity(&self) -> Severity {
        self.threshold.get()
    }

    pub fn set_minimum_severity(&self, severity: Severity) {
        self.threshold.set(severity);
    }

    /// Write `message` unless it is below the threshold
    pub fn deliver(&mut self, message: &Message) -> Result<Delivery> {
        if !self.threshold.admits(message.severity()) {
            return Ok(Delivery::Discarded);
        }
        self.device.write(message)?;
        Ok(Delivery::Written)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.device.flush()
    }

    pub fn name(&self) -> &str {
        self.device.name()
    }
}

impl fmt::Debug for GatedDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatedDevice")
            .field("device", &self.device.name())
            .field("minimum_severity", &self.threshold.get())
            .finish()
    }
}
