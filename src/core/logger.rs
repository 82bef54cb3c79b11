//! Logger and its background dispatcher
//!
//! `log` only stamps a [`Message`] and pushes it onto an unbounded queue.
//! A single dispatcher thread pops messages in order and hands each one to
//! every registered device, so all device I/O happens off the caller's
//! thread and no two writes to the same device ever overlap.

use super::{
    device::{Delivery, Device, DeviceHandle, GatedDevice, SeverityThreshold},
    error::{LoggerError, Result},
    message::Message,
    metrics::LoggerMetrics,
    registry::{DeviceRegistry, DeviceSlot},
    severity::Severity,
};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;

/// Name given to the dispatcher thread unless the builder overrides it
pub const DEFAULT_DISPATCHER_NAME: &str = "device-logger-dispatch";

/// Callback receiving failures that happen on the dispatcher thread
pub type DeliveryErrorCallback = Arc<dyn Fn(&DeliveryFailure) + Send + Sync>;

/// Lifecycle of a logger's dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LoggerState {
    /// Accepting messages; the dispatcher waits on the queue
    Running = 0,
    /// Queue closed; the dispatcher is delivering what is left
    Draining = 1,
    /// Dispatcher exited; every accepted message has been delivered
    Stopped = 2,
}

impl LoggerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => LoggerState::Running,
            1 => LoggerState::Draining,
            _ => LoggerState::Stopped,
        }
    }
}

/// Device operation that failed on the dispatcher thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailedOperation {
    Write { sequence: u64, severity: Severity },
    Flush,
}

/// A device failure reported to the diagnostic callback
#[derive(Debug)]
pub struct DeliveryFailure {
    pub handle: DeviceHandle,
    pub device: String,
    pub operation: FailedOperation,
    pub error: LoggerError,
}

impl fmt::Display for DeliveryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operation {
            FailedOperation::Write { sequence, severity } => write!(
                f,
                "Device {} ({}) failed to write message {} [{}]: {}",
                self.handle, self.device, sequence, severity, self.error
            ),
            FailedOperation::Flush => write!(
                f,
                "Device {} ({}) failed to flush: {}",
                self.handle, self.device, self.error
            ),
        }
    }
}

fn report_to_stderr(failure: &DeliveryFailure) {
    eprintln!("[LOGGER ERROR] {}", failure);
}

enum Command {
    Deliver(Message),
    Flush(Sender<()>),
}

pub struct Logger {
    /// Logger-level pre-filter, checked before a message is queued
    min_severity: SeverityThreshold,
    registry: Arc<DeviceRegistry>,
    /// Next message sequence; also the epoch given to newly registered devices
    sequence: AtomicU64,
    sender: RwLock<Option<Sender<Command>>>,
    dispatcher: Mutex<Option<thread::JoinHandle<()>>>,
    state: Arc<AtomicU8>,
    metrics: Arc<LoggerMetrics>,
}

impl Logger {
    /// Start a logger with no devices. Messages are accepted and discarded
    /// until a device is added.
    pub fn new() -> Result<Self> {
        LoggerBuilder::new().build()
    }

    /// Start a logger writing to standard error
    pub fn console() -> Result<Self> {
        LoggerBuilder::new()
            .device(crate::devices::ConsoleDevice::new())
            .build()
    }

    /// Create a builder for Logger
    ///
    /// # Example
    /// ```
    /// use rust_device_logger::prelude::*;
    ///
    /// let logger = Logger::builder()
    ///     .device(StringDevice::new())
    ///     .min_severity(Severity::Debug)
    ///     .build()
    ///     .unwrap();
    /// logger.wait_until_empty().unwrap();
    /// ```
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    fn start(
        min_severity: Severity,
        devices: Vec<GatedDevice>,
        on_delivery_error: DeliveryErrorCallback,
        thread_name: String,
    ) -> Result<Self> {
        let (sender, receiver) = unbounded();
        let registry = Arc::new(DeviceRegistry::new());
        let sequence = AtomicU64::new(0);
        for device in devices {
            registry.register(device, &sequence);
        }

        let state = Arc::new(AtomicU8::new(LoggerState::Running as u8));
        let metrics = Arc::new(LoggerMetrics::new());

        let dispatcher = Dispatcher {
            receiver,
            registry: Arc::clone(&registry),
            metrics: Arc::clone(&metrics),
            state: Arc::clone(&state),
            on_delivery_error,
            dirty: false,
        };

        let handle = thread::Builder::new()
            .name(thread_name)
            .spawn(move || dispatcher.run())
            .map_err(|e| {
                LoggerError::io_operation("starting dispatcher", "thread spawn failed", e)
            })?;

        Ok(Self {
            min_severity: SeverityThreshold::new(min_severity),
            registry,
            sequence,
            sender: RwLock::new(Some(sender)),
            dispatcher: Mutex::new(Some(handle)),
            state,
            metrics,
        })
    }

    /// Queue a message for delivery. Never waits on device I/O.
    ///
    /// Fails with [`LoggerError::LoggerStopped`] once
    /// [`wait_until_empty`](Self::wait_until_empty) has closed the queue.
    pub fn log(&self, severity: Severity, text: impl Into<String>) -> Result<()> {
        let sender = self.sender.read();
        let Some(sender) = sender.as_ref() else {
            self.metrics.record_rejected();
            return Err(LoggerError::LoggerStopped);
        };

        if !self.min_severity.admits(severity) {
            self.metrics.record_prefiltered();
            return Ok(());
        }

        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        let message = Message::new(severity, text).with_sequence(sequence);

        if sender.send(Command::Deliver(message)).is_err() {
            // Dispatcher died without a shutdown request
            self.metrics.record_rejected();
            return Err(LoggerError::DispatcherGone);
        }
        self.metrics.record_submitted();
        Ok(())
    }

    #[inline]
    pub fn verbose(&self, text: impl Into<String>) -> Result<()> {
        self.log(Severity::Verbose, text)
    }

    #[inline]
    pub fn debug(&self, text: impl Into<String>) -> Result<()> {
        self.log(Severity::Debug, text)
    }

    #[inline]
    pub fn information(&self, text: impl Into<String>) -> Result<()> {
        self.log(Severity::Information, text)
    }

    #[inline]
    pub fn warning(&self, text: impl Into<String>) -> Result<()> {
        self.log(Severity::Warning, text)
    }

    #[inline]
    pub fn error(&self, text: impl Into<String>) -> Result<()> {
        self.log(Severity::Error, text)
    }

    #[inline]
    pub fn fatal(&self, text: impl Into<String>) -> Result<()> {
        self.log(Severity::Fatal, text)
    }

    /// Register a device that accepts every severity
    ///
    /// The device receives messages logged after this call returns; messages
    /// already submitted are never replayed to it.
    pub fn add_device(&self, device: impl Device + 'static) -> Result<DeviceHandle> {
        self.add_gated_device(GatedDevice::new(device))
    }

    /// Register a device together with its own threshold
    pub fn add_gated_device(&self, device: GatedDevice) -> Result<DeviceHandle> {
        // Holding the read lock keeps the queue open until registration is done
        let sender = self.sender.read();
        if sender.is_none() {
            return Err(LoggerError::LoggerStopped);
        }
        Ok(self.registry.register(device, &self.sequence))
    }

    /// Change one device's minimum severity. Applies to every message that
    /// device has not been handed yet.
    pub fn set_severity(&self, handle: DeviceHandle, severity: Severity) -> Result<()> {
        self.registry.set_severity(handle, severity)
    }

    /// Change the minimum severity of every registered device
    pub fn set_all_severity(&self, severity: Severity) {
        self.registry.set_all(severity);
    }

    pub fn severity(&self, handle: DeviceHandle) -> Result<Severity> {
        self.registry.severity(handle)
    }

    /// Handles of all registered devices, in delivery order
    pub fn handles(&self) -> Vec<DeviceHandle> {
        self.registry.handles()
    }

    pub fn device_count(&self) -> usize {
        self.registry.len()
    }

    /// Set the logger-level pre-filter. Messages below it are never queued.
    pub fn set_min_severity(&self, severity: Severity) {
        self.min_severity.set(severity);
    }

    pub fn min_severity(&self) -> Severity {
        self.min_severity.get()
    }

    pub fn state(&self) -> LoggerState {
        LoggerState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_running(&self) -> bool {
        self.state() == LoggerState::Running
    }

    /// Get the logger metrics for detailed observability
    ///
    /// # Example
    ///
    /// ```
    /// use rust_device_logger::Logger;
    ///
    /// let logger = Logger::new().unwrap();
    /// logger.information("hello").unwrap();
    /// logger.wait_until_empty().unwrap();
    ///
    /// let metrics = logger.metrics();
    /// assert_eq!(metrics.submitted(), 1);
    /// assert_eq!(metrics.delivered(), 0);
    /// ```
    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    /// Block until every message submitted before this call has been handed
    /// to its devices and all devices are flushed. The logger keeps running.
    ///
    /// Returns immediately once the logger is stopped, since a stopped logger
    /// has nothing pending.
    pub fn flush(&self) -> Result<()> {
        let (ack_tx, ack_rx) = bounded(1);
        {
            let sender = self.sender.read();
            let Some(sender) = sender.as_ref() else {
                return Ok(());
            };
            sender
                .send(Command::Flush(ack_tx))
                .map_err(|_| LoggerError::DispatcherGone)?;
        }
        ack_rx.recv().map_err(|_| LoggerError::DispatcherGone)
    }

    /// Close the queue, then block until the dispatcher has delivered every
    /// queued message to every device and exited.
    ///
    /// Safe to call more than once and from several threads; every caller
    /// returns only after the dispatcher has stopped. Further `log` calls
    /// fail with [`LoggerError::LoggerStopped`].
    pub fn wait_until_empty(&self) -> Result<()> {
        // Serializes concurrent callers: later ones wait for the join below
        let mut dispatcher = self.dispatcher.lock();

        if let Some(sender) = self.sender.write().take() {
            self.state.store(LoggerState::Draining as u8, Ordering::Release);
            drop(sender);
        }

        let joined = match dispatcher.take() {
            Some(handle) => handle.join().map_err(|_| LoggerError::DispatcherGone),
            None => Ok(()),
        };
        self.state.store(LoggerState::Stopped as u8, Ordering::Release);
        joined
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if let Err(e) = self.wait_until_empty() {
            eprintln!("[LOGGER ERROR] Dispatcher did not shut down cleanly: {}", e);
        }

        let failed = self.metrics.failed();
        if failed > 0 {
            eprintln!(
                "[LOGGER WARNING] Logger shut down after {} failed device writes \
                 (failure rate: {:.2}%)",
                failed,
                self.metrics.failure_rate()
            );
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("state", &self.state())
            .field("min_severity", &self.min_severity())
            .field("devices", &self.device_count())
            .finish()
    }
}

/// The background half of a logger. Owns the receiving end of the queue.
struct Dispatcher {
    receiver: Receiver<Command>,
    registry: Arc<DeviceRegistry>,
    metrics: Arc<LoggerMetrics>,
    state: Arc<AtomicU8>,
    on_delivery_error: DeliveryErrorCallback,
    /// Some device was written since the last flush
    dirty: bool,
}

impl Dispatcher {
    fn run(mut self) {
        // `recv` keeps yielding queued commands after the senders are gone
        // and only fails once the queue is both closed and empty.
        while let Ok(command) = self.receiver.recv() {
            match command {
                Command::Deliver(message) => self.dispatch(&message),
                Command::Flush(ack) => {
                    self.flush_devices();
                    let _ = ack.send(());
                }
            }

            if self.dirty && self.receiver.is_empty() {
                self.flush_devices();
            }
        }

        self.flush_devices();
        self.state.store(LoggerState::Stopped as u8, Ordering::Release);
    }

    /// Hand one message to every device that was registered before it was
    /// submitted, in handle order, one device at a time.
    fn dispatch(&mut self, message: &Message) {
        let devices = self.registry.snapshot();

        for slot in devices.iter().filter(|slot| slot.covers(message)) {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| slot.deliver(message)));

            match outcome {
                Ok(Ok(Delivery::Written)) => {
                    self.metrics.record_delivered();
                    self.dirty = true;
                }
                Ok(Ok(Delivery::Discarded)) => {
                    self.metrics.record_discarded();
                }
                Ok(Err(e)) => self.report(slot, message_operation(message), e),
                Err(panic_info) => self.report(
                    slot,
                    message_operation(message),
                    LoggerError::DevicePanicked(panic_message(panic_info)),
                ),
            }
        }
    }

    fn flush_devices(&mut self) {
        self.dirty = false;
        let devices = self.registry.snapshot();

        for slot in devices.iter() {
            match panic::catch_unwind(AssertUnwindSafe(|| slot.flush())) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => self.report(slot, FailedOperation::Flush, e),
                Err(panic_info) => self.report(
                    slot,
                    FailedOperation::Flush,
                    LoggerError::DevicePanicked(panic_message(panic_info)),
                ),
            }
        }
    }

    fn report(&self, slot: &DeviceSlot, operation: FailedOperation, error: LoggerError) {
        self.metrics.record_failed();

        let failure = DeliveryFailure {
            handle: slot.handle(),
            device: slot.name().to_string(),
            operation,
            error,
        };

        let callback = &self.on_delivery_error;
        if panic::catch_unwind(AssertUnwindSafe(|| callback(&failure))).is_err() {
            eprintln!(
                "[LOGGER CRITICAL] Delivery error callback panicked while reporting: {}",
                failure
            );
        }
    }
}

fn message_operation(message: &Message) -> FailedOperation {
    FailedOperation::Write {
        sequence: message.sequence(),
        severity: message.severity(),
    }
}

fn panic_message(panic_info: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Builder for constructing Logger with a fluent API
///
/// # Example
/// ```
/// use rust_device_logger::prelude::*;
/// use std::sync::Arc;
///
/// let logger = Logger::builder()
///     .min_severity(Severity::Debug)
///     .device(StringDevice::new())
///     .gated_device(GatedDevice::with_threshold(DatabaseDevice::new(), Severity::Warning))
///     .on_delivery_error(Arc::new(|failure: &DeliveryFailure| {
///         eprintln!("ALERT: {}", failure);
///     }))
///     .build()
///     .unwrap();
/// # logger.wait_until_empty().unwrap();
/// ```
pub struct LoggerBuilder {
    min_severity: Severity,
    devices: Vec<GatedDevice>,
    on_delivery_error: Option<DeliveryErrorCallback>,
    thread_name: String,
}

impl LoggerBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            min_severity: Severity::Verbose,
            devices: Vec::new(),
            on_delivery_error: None,
            thread_name: DEFAULT_DISPATCHER_NAME.to_string(),
        }
    }

    /// Set the logger-level pre-filter
    #[must_use = "builder methods return a new value"]
    pub fn min_severity(mut self, severity: Severity) -> Self {
        self.min_severity = severity;
        self
    }

    /// Add a device accepting every severity
    #[must_use = "builder methods return a new value"]
    pub fn device<D: Device + 'static>(mut self, device: D) -> Self {
        self.devices.push(GatedDevice::new(device));
        self
    }

    /// Add a device with its own threshold
    #[must_use = "builder methods return a new value"]
    pub fn gated_device(mut self, device: GatedDevice) -> Self {
        self.devices.push(device);
        self
    }

    /// Set the callback for failures on the dispatcher thread
    ///
    /// Without one, failures are written to stderr.
    #[must_use = "builder methods return a new value"]
    pub fn on_delivery_error(mut self, callback: DeliveryErrorCallback) -> Self {
        self.on_delivery_error = Some(callback);
        self
    }

    /// Name the dispatcher thread
    #[must_use = "builder methods return a new value"]
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Build the Logger and start its dispatcher. Devices added here get
    /// handles in the order they were added, starting at `#0`.
    pub fn build(self) -> Result<Logger> {
        let callback: DeliveryErrorCallback = match self.on_delivery_error {
            Some(callback) => callback,
            None => Arc::new(report_to_stderr),
        };
        Logger::start(self.min_severity, self.devices, callback, self.thread_name)
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
