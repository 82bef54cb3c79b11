//! Core pipeline types and traits

pub mod device;
pub mod error;
pub mod logger;
pub mod message;
pub mod metrics;
pub(crate) mod registry;
pub mod severity;
pub mod template;

pub use device::{Delivery, Device, DeviceHandle, GatedDevice, SeverityThreshold};
pub use error::{LoggerError, Result};
pub use logger::{
    DeliveryErrorCallback, DeliveryFailure, FailedOperation, Logger, LoggerBuilder, LoggerState,
    DEFAULT_DISPATCHER_NAME,
};
pub use message::Message;
pub use metrics::LoggerMetrics;
pub use severity::Severity;
pub use template::{SharedTemplate, Template, DEFAULT_TEMPLATE, DEFAULT_TIMESTAMP_FORMAT};
