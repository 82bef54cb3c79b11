//! # Rust Device Logger
//!
//! An in-process asynchronous logging pipeline. Callers submit
//! severity-tagged messages from any thread; a single background dispatcher
//! delivers each one to every registered output device.
//!
//! ## Features
//!
//! - **Non-blocking submission**: `log` only enqueues; all device I/O runs on the dispatcher
//! - **Multiple Devices**: console, file, in-memory string and a database stub
//! - **Per-device filtering**: every device has its own minimum severity
//! - **Deterministic shutdown**: `wait_until_empty` drains the queue and joins the dispatcher
//!
//! ```
//! use rust_device_logger::prelude::*;
//!
//! let device = StringDevice::new().with_template("{1} {2}").unwrap();
//! let buffer = device.buffer();
//!
//! let logger = Logger::new().unwrap();
//! let handle = logger.add_device(device).unwrap();
//! logger.set_severity(handle, Severity::Information).unwrap();
//!
//! logger.verbose("x").unwrap();
//! logger.information("y").unwrap();
//! logger.wait_until_empty().unwrap();
//!
//! assert_eq!(buffer.contents(), "Information y\n");
//! ```

pub mod core;
pub mod devices;
pub mod macros;

pub mod prelude {
    pub use crate::devices::{
        ConsoleDevice, DatabaseDevice, FileDevice, StringBuffer, StringDevice, TextDevice,
    };
    pub use crate::core::{
        Delivery, DeliveryFailure, Device, DeviceHandle, GatedDevice, Logger, LoggerBuilder,
        LoggerError, LoggerMetrics, LoggerState, Message, Result, Severity, SharedTemplate,
        Template,
    };
}

pub use devices::{
    ConsoleDevice, DatabaseDevice, FileDevice, StringBuffer, StringDevice, TextDevice,
};
pub use core::{
    Delivery, DeliveryErrorCallback, DeliveryFailure, Device, DeviceHandle, FailedOperation,
    GatedDevice, Logger, LoggerBuilder, LoggerError, LoggerMetrics, LoggerState, Message, Result,
    Severity, SeverityThreshold, SharedTemplate, Template, DEFAULT_TEMPLATE,
};
