//! Error types for the logging pipeline

use super::device::DeviceHandle;

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Logger already stopped
    #[error("Logger already stopped")]
    LoggerStopped,

    /// A handle that was never issued by this logger
    #[error("Unknown device handle {handle}")]
    UnknownDevice { handle: DeviceHandle },

    /// Severity name that does not match any level
    #[error("Invalid severity: '{0}'")]
    InvalidSeverity(String),

    /// Malformed text template
    #[error("Invalid template '{template}': {message}")]
    InvalidTemplate { template: String, message: String },

    /// Device write primitive failed
    #[error("Device '{device}' failed: {message}")]
    DeviceError { device: String, message: String },

    /// Device panicked while writing
    #[error("Device panicked: {0}")]
    DevicePanicked(String),

    /// Dispatcher thread went away before acknowledging a request
    #[error("Dispatcher is not responding")]
    DispatcherGone,
}

impl LoggerError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    pub fn unknown_device(handle: DeviceHandle) -> Self {
        LoggerError::UnknownDevice { handle }
    }

    /// Create a template error
    pub fn invalid_template(template: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidTemplate {
            template: template.into(),
            message: message.into(),
        }
    }

    /// Create a device error
    pub fn device(device: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::DeviceError {
            device: device.into(),
            message: message.into(),
        }
    }

    /// Whether this error comes from calling the API in the wrong state or with a bad handle
    pub fn is_misuse(&self) -> bool {
        matches!(
            self,
            LoggerError::LoggerStopped | LoggerError::UnknownDevice { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = LoggerError::unknown_device(DeviceHandle::from_raw(7));
        assert!(matches!(err, LoggerError::UnknownDevice { .. }));
        assert!(err.is_misuse());

        let err = LoggerError::device("database", "connection reset");
        assert!(matches!(err, LoggerError::DeviceError { .. }));
        assert!(!err.is_misuse());
    }

    #[test]
    fn test_error_display() {
        let err = LoggerError::unknown_device(DeviceHandle::from_raw(3));
        assert_eq!(err.to_string(), "Unknown device handle #3");

        let err = LoggerError::invalid_template("{9}", "unknown slot '9'");
        assert_eq!(
            err.to_string(),
            "Invalid template '{9}': unknown slot '9'"
        );

        assert_eq!(LoggerError::LoggerStopped.to_string(), "Logger already stopped");
    }

    #[test]
    fn test_io_operation_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such directory");
        let err = LoggerError::io_operation("opening log file", "out/log.txt", io_err);

        assert!(matches!(err, LoggerError::IoOperation { .. }));
        assert!(err.to_string().contains("opening log file"));
        assert!(err.to_string().contains("out/log.txt"));
    }
}
