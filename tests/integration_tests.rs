//! Integration tests for the logging pipeline
//!
//! These tests verify:
//! - Per-device and broadcast severity filtering
//! - Drain-to-completion shutdown
//! - Registration only affecting later messages
//! - Template rendering through a running logger
//! - File device behaviour
//! - Failure isolation between devices

use rust_device_logger::prelude::*;
use rust_device_logger::{DeliveryFailure, FailedOperation};
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn text_only() -> StringDevice {
    StringDevice::new()
        .with_template("{2}")
        .expect("valid template")
}

#[test]
fn test_device_threshold_filters_low_severity() {
    let device = StringDevice::new().with_template("{1} {2}").unwrap();
    let buffer = device.buffer();

    let logger = Logger::new().unwrap();
    let handle = logger.add_device(device).unwrap();
    logger.set_severity(handle, Severity::Information).unwrap();

    logger.verbose("x").unwrap();
    logger.information("y").unwrap();
    logger.wait_until_empty().unwrap();

    assert_eq!(buffer.lines(), vec!["Information y"]);
}

#[test]
fn test_debug_reaches_only_verbose_device() {
    let warning_device = text_only();
    let verbose_device = text_only();
    let warning_buffer = warning_device.buffer();
    let verbose_buffer = verbose_device.buffer();

    let logger = Logger::new().unwrap();
    let warning_handle = logger.add_device(warning_device).unwrap();
    let verbose_handle = logger.add_device(verbose_device).unwrap();
    logger.set_severity(warning_handle, Severity::Warning).unwrap();
    logger.set_severity(verbose_handle, Severity::Verbose).unwrap();

    logger.debug("only once").unwrap();
    logger.wait_until_empty().unwrap();

    assert!(warning_buffer.is_empty());
    assert_eq!(verbose_buffer.lines(), vec!["only once"]);
    assert_eq!(logger.metrics().delivered(), 1);
    assert_eq!(logger.metrics().discarded(), 1);
    assert_eq!(logger.metrics().prefiltered(), 0);
}

#[test]
fn test_broadcast_severity_applies_to_all_devices() {
    let logger = Logger::new().unwrap();
    let mut buffers: Vec<StringBuffer> = Vec::new();
    for threshold in [Severity::Verbose, Severity::Error, Severity::Debug] {
        let device = text_only();
        buffers.push(device.buffer());
        let handle = logger.add_device(device).unwrap();
        logger.set_severity(handle, threshold).unwrap();
    }

    logger.set_all_severity(Severity::Warning);
    for handle in logger.handles() {
        assert_eq!(logger.severity(handle).unwrap(), Severity::Warning);
    }

    logger.information("hidden").unwrap();
    logger.warning("shown").unwrap();
    logger.wait_until_empty().unwrap();

    for buffer in &buffers {
        assert_eq!(buffer.lines(), vec!["shown"]);
    }
}

#[test]
fn test_template_without_timestamp() {
    let device = StringDevice::new().with_template("{1} {2}").unwrap();
    let buffer = device.buffer();
    let logger = Logger::builder().device(device).build().unwrap();

    logger.information("Hello, World!").unwrap();
    logger.wait_until_empty().unwrap();

    assert_eq!(buffer.contents(), "Information Hello, World!\n");
}

#[test]
fn test_template_change_on_running_logger() {
    let device = StringDevice::new().with_template("{1} {2}").unwrap();
    let buffer = device.buffer();
    let template = device.template_handle();
    let logger = Logger::builder().device(device).build().unwrap();

    logger.information("Hello, World!").unwrap();
    logger.flush().unwrap();
    assert_eq!(buffer.contents(), "Information Hello, World!\n");

    template.set("{0:%Y} {1} {2}").unwrap();
    buffer.clear();

    let before = chrono::Utc::now().format("%Y").to_string();
    logger.information("Hello, World!").unwrap();
    let after = chrono::Utc::now().format("%Y").to_string();
    logger.wait_until_empty().unwrap();

    let content = buffer.contents();
    assert!(
        content == format!("{} Information Hello, World!\n", before)
            || content == format!("{} Information Hello, World!\n", after),
        "unexpected line: {}",
        content
    );
}

#[test]
fn test_invalid_template_change_keeps_current() {
    let device = text_only();
    let buffer = device.buffer();
    let template = device.template_handle();
    let logger = Logger::builder().device(device).build().unwrap();

    let result = template.set("{1} {oops}");
    assert!(matches!(result, Err(LoggerError::InvalidTemplate { .. })));

    logger.information("unchanged").unwrap();
    logger.wait_until_empty().unwrap();
    assert_eq!(buffer.lines(), vec!["unchanged"]);
}

#[test]
fn test_database_rows_visible_through_handle() {
    let database = DatabaseDevice::new();
    let rows = database.rows();
    let logger = Logger::builder()
        .gated_device(GatedDevice::with_threshold(database, Severity::Warning))
        .build()
        .unwrap();

    logger.information("below threshold").unwrap();
    logger.error("disk full").unwrap();
    logger.wait_until_empty().unwrap();

    assert_eq!(rows.get(), 1);
    let row: serde_json::Value =
        serde_json::from_str(&rows.last_row().expect("one row")).unwrap();
    assert_eq!(row["table"], "Log");
    assert_eq!(row["severity"], "Error");
    assert_eq!(row["message"], "disk full");
}

#[test]
fn test_wait_until_empty_drains_slow_devices() {
    let device = text_only().with_write_delay(Duration::from_millis(2));
    let buffer = device.buffer();
    let database = DatabaseDevice::new().with_write_delay(Duration::from_millis(2));
    let rows = database.rows();

    let logger = Logger::builder().device(device).device(database).build().unwrap();
    for i in 0..50 {
        logger.information(format!("message {}", i)).unwrap();
    }
    logger.wait_until_empty().unwrap();

    let expected: Vec<String> = (0..50).map(|i| format!("message {}", i)).collect();
    assert_eq!(buffer.lines(), expected);
    assert_eq!(rows.get(), 50);
    assert_eq!(logger.state(), LoggerState::Stopped);
}

#[test]
fn test_submission_does_not_wait_for_devices() {
    let device = text_only().with_write_delay(Duration::from_millis(20));
    let buffer = device.buffer();
    let logger = Logger::builder().device(device).build().unwrap();

    let start = Instant::now();
    for i in 0..25 {
        logger.debug(format!("{}", i)).unwrap();
    }
    let submit_time = start.elapsed();

    // Delivering 25 messages takes at least 500ms
    assert!(
        submit_time < Duration::from_millis(250),
        "submission took {:?}",
        submit_time
    );

    logger.wait_until_empty().unwrap();
    assert_eq!(buffer.lines().len(), 25);
}

#[test]
fn test_timestamp_reflects_submission_time() {
    struct Stamps(Arc<Mutex<Vec<chrono::DateTime<chrono::Utc>>>>);

    impl Device for Stamps {
        fn write(&mut self, message: &Message) -> Result<()> {
            std::thread::sleep(Duration::from_millis(30));
            self.0.lock().unwrap().push(message.timestamp());
            Ok(())
        }

        fn name(&self) -> &str {
            "stamps"
        }
    }

    let stamps = Arc::new(Mutex::new(Vec::new()));
    let logger = Logger::builder()
        .device(Stamps(Arc::clone(&stamps)))
        .build()
        .unwrap();

    let before = chrono::Utc::now();
    logger.information("a").unwrap();
    logger.information("b").unwrap();
    logger.information("c").unwrap();
    let after = chrono::Utc::now();
    logger.wait_until_empty().unwrap();

    let stamps = stamps.lock().unwrap();
    assert_eq!(stamps.len(), 3);
    for stamp in stamps.iter() {
        assert!(*stamp >= before && *stamp <= after);
    }
}

#[test]
fn test_new_device_sees_only_later_messages() {
    let early = text_only().with_write_delay(Duration::from_millis(10));
    let early_buffer = early.buffer();
    let late = text_only();
    let late_buffer = late.buffer();

    let logger = Logger::builder().device(early).build().unwrap();
    for i in 0..5 {
        logger.information(format!("before {}", i)).unwrap();
    }
    // The dispatcher is still working through the "before" messages here
    logger.add_device(late).unwrap();
    logger.information("after").unwrap();
    logger.wait_until_empty().unwrap();

    assert_eq!(early_buffer.lines().len(), 6);
    assert_eq!(late_buffer.lines(), vec!["after"]);
}

#[test]
fn test_severity_change_applies_to_pending_messages() {
    let device = text_only();
    let buffer = device.buffer();
    let blocker = text_only().with_write_delay(Duration::from_millis(100));

    let logger = Logger::builder().device(blocker).device(device).build().unwrap();
    let handle = logger.handles()[1];

    logger.debug("queued before change").unwrap();
    logger.debug("also queued").unwrap();
    logger.set_severity(handle, Severity::Error).unwrap();
    logger.error("kept").unwrap();
    logger.wait_until_empty().unwrap();

    // The first message may already be in flight when the threshold changes
    let lines = buffer.lines();
    assert_eq!(lines.last().map(String::as_str), Some("kept"));
    assert!(!lines.contains(&"also queued".to_string()));
}

#[test]
fn test_file_device_appends() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("log.txt");
    fs::write(&log_file, "existing\n").unwrap();

    let device = FileDevice::new(&log_file)
        .expect("Failed to create device")
        .with_template("{1} {2}")
        .unwrap();
    let logger = Logger::builder().device(device).build().unwrap();
    logger.set_all_severity(Severity::Information);

    logger.information("Hello, World!").unwrap();
    for _ in 0..100 {
        logger.verbose("This is a verbose message, it won't print anything").unwrap();
    }
    logger.information("Nothing was printed in between").unwrap();
    logger.wait_until_empty().unwrap();

    let content = fs::read_to_string(&log_file).expect("Failed to read log file");
    assert_eq!(
        content,
        "existing\nInformation Hello, World!\nInformation Nothing was printed in between\n"
    );
}

#[test]
fn test_file_device_requires_directory() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let result = FileDevice::new(temp_dir.path().join("nope").join("log.txt"));
    assert!(matches!(result, Err(LoggerError::IoOperation { .. })));
}

#[test]
fn test_flush_makes_file_contents_visible() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("flush.txt");

    let device = FileDevice::new(&log_file).unwrap().with_template("{2}").unwrap();
    let logger = Logger::builder().device(device).build().unwrap();

    logger.warning("one").unwrap();
    logger.warning("two").unwrap();
    logger.flush().unwrap();

    assert_eq!(fs::read_to_string(&log_file).unwrap(), "one\ntwo\n");
    assert!(logger.is_running());
}

#[test]
fn test_failing_device_is_isolated() {
    struct Flaky {
        calls: Arc<AtomicUsize>,
    }

    impl Device for Flaky {
        fn write(&mut self, _message: &Message) -> Result<()> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call % 2 == 0 {
                Err(LoggerError::device("flaky", "transient failure"))
            } else {
                Ok(())
            }
        }

        fn name(&self) -> &str {
            "flaky"
        }
    }

    let failures = Arc::new(Mutex::new(Vec::new()));
    let failures_clone = Arc::clone(&failures);
    let calls = Arc::new(AtomicUsize::new(0));

    let healthy = text_only();
    let buffer = healthy.buffer();
    let logger = Logger::builder()
        .device(Flaky {
            calls: Arc::clone(&calls),
        })
        .device(healthy)
        .on_delivery_error(Arc::new(move |failure: &DeliveryFailure| {
            failures_clone.lock().unwrap().push(failure.operation);
        }))
        .build()
        .unwrap();

    for i in 0..4 {
        logger.error(format!("e{}", i)).unwrap();
    }
    logger.wait_until_empty().unwrap();

    assert_eq!(buffer.lines(), vec!["e0", "e1", "e2", "e3"]);
    assert_eq!(calls.load(Ordering::SeqCst), 4);

    let failures = failures.lock().unwrap();
    assert_eq!(failures.len(), 2);
    assert!(failures.iter().all(|op| matches!(
        op,
        FailedOperation::Write {
            severity: Severity::Error,
            ..
        }
    )));
}

#[test]
fn test_logging_after_shutdown_fails_fast() {
    let logger = Logger::builder().device(text_only()).build().unwrap();
    logger.wait_until_empty().unwrap();

    let start = Instant::now();
    let result = logger.fatal("nobody is listening");
    assert!(matches!(result, Err(LoggerError::LoggerStopped)));
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[test]
fn test_concurrent_wait_until_empty() {
    let device = text_only().with_write_delay(Duration::from_millis(1));
    let buffer = device.buffer();
    let logger = Arc::new(Logger::builder().device(device).build().unwrap());

    for i in 0..30 {
        logger.information(format!("{}", i)).unwrap();
    }

    let waiters: Vec<_> = (0..4)
        .map(|_| {
            let logger = Arc::clone(&logger);
            let buffer = buffer.clone();
            std::thread::spawn(move || {
                logger.wait_until_empty().unwrap();
                buffer.lines().len()
            })
        })
        .collect();

    for waiter in waiters {
        assert_eq!(waiter.join().unwrap(), 30);
    }
}

#[test]
fn test_per_thread_order_is_preserved() {
    let device = text_only();
    let buffer = device.buffer();
    let logger = Arc::new(Logger::builder().device(device).build().unwrap());

    let handles: Vec<_> = (0..4)
        .map(|thread_id| {
            let logger = Arc::clone(&logger);
            std::thread::spawn(move || {
                for i in 0..100 {
                    logger.information(format!("{}:{}", thread_id, i)).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    logger.wait_until_empty().unwrap();

    let lines = buffer.lines();
    assert_eq!(lines.len(), 400);

    let mut next = [0usize; 4];
    for line in lines {
        let (thread_id, i) = line.split_once(':').unwrap();
        let thread_id: usize = thread_id.parse().unwrap();
        let i: usize = i.parse().unwrap();
        assert_eq!(i, next[thread_id], "thread {} out of order", thread_id);
        next[thread_id] += 1;
    }
}
