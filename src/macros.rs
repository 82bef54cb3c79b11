//! Logging macros for ergonomic message formatting.
//!
//! Each macro formats its arguments like `format!` and forwards to the
//! matching [`Logger`](crate::Logger) method, returning its `Result<()>`.
//!
//! # Examples
//!
//! ```
//! use rust_device_logger::prelude::*;
//! use rust_device_logger::information;
//!
//! let logger = Logger::new().unwrap();
//!
//! information!(logger, "Server started").unwrap();
//!
//! let port = 8080;
//! information!(logger, "Server listening on port {}", port).unwrap();
//! ```

/// Log a message at an explicit severity.
///
/// ```
/// # use rust_device_logger::prelude::*;
/// # let logger = Logger::new().unwrap();
/// use rust_device_logger::log;
/// log!(logger, Severity::Information, "Simple message").unwrap();
/// log!(logger, Severity::Error, "Error code: {}", 500).unwrap();
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $severity:expr, $($arg:tt)+) => {
        $logger.log($severity, format!($($arg)+))
    };
}

/// Log a verbose message.
#[macro_export]
macro_rules! verbose {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Severity::Verbose, $($arg)+)
    };
}

/// Log a debug message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Severity::Debug, $($arg)+)
    };
}

/// Log an information message.
#[macro_export]
macro_rules! information {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Severity::Information, $($arg)+)
    };
}

/// Log a warning.
///
/// ```
/// # use rust_device_logger::prelude::*;
/// # let logger = Logger::new().unwrap();
/// use rust_device_logger::warning;
/// warning!(logger, "Retry attempt {} of {}", 3, 5).unwrap();
/// ```
#[macro_export]
macro_rules! warning {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Severity::Warning, $($arg)+)
    };
}

/// Log an error.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Severity::Error, $($arg)+)
    };
}

/// Log a fatal error.
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Severity::Fatal, $($arg)+)
    };
}
