//! Unit tests for the Engine logging facade
//!
//! IMPORTANT: the logger slot is a global OnceLock shared across all
//! tests. All tests here are #[serial] so a custom logger installed by
//! one test cannot leak into another mid-run.

use crate::nebula3d::Engine;
use crate::nebula3d::log::{Logger, LogEntry, LogSeverity};
use std::sync::{Arc, Mutex};
use serial_test::serial;

/// Test logger that captures log entries for verification
struct TestLogger {
    entries: Arc<Mutex<Vec<(LogSeverity, String)>>>,
}

impl Logger for TestLogger {
    fn log(&self, entry: &LogEntry) {
        // Other tests may log concurrently through the shared slot; only
        // capture what this module emits.
        if entry.source != "nebula3d::test" {
            return;
        }
        self.entries
            .lock()
            .unwrap()
            .push((entry.severity, entry.message.clone()));
    }
}

#[test]
#[serial]
fn test_set_logger_captures_entries() {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(TestLogger { entries: entries.clone() });

    Engine::log(LogSeverity::Info, "nebula3d::test", "hello".to_string());
    Engine::log(LogSeverity::Warn, "nebula3d::test", "careful".to_string());

    let captured = entries.lock().unwrap().clone();
    assert_eq!(captured.len(), 2);
    assert_eq!(captured[0], (LogSeverity::Info, "hello".to_string()));
    assert_eq!(captured[1], (LogSeverity::Warn, "careful".to_string()));

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_log_detailed_carries_location() {
    let entries = Arc::new(Mutex::new(Vec::new()));

    struct LocationLogger {
        entries: Arc<Mutex<Vec<(Option<&'static str>, Option<u32>)>>>,
    }
    impl Logger for LocationLogger {
        fn log(&self, entry: &LogEntry) {
            if entry.source != "nebula3d::test" {
                return;
            }
            self.entries.lock().unwrap().push((entry.file, entry.line));
        }
    }

    Engine::set_logger(LocationLogger { entries: entries.clone() });
    Engine::log_detailed(
        LogSeverity::Error,
        "nebula3d::test",
        "boom".to_string(),
        "engine_tests.rs",
        99,
    );

    let captured = entries.lock().unwrap().clone();
    assert_eq!(captured, vec![(Some("engine_tests.rs"), Some(99))]);

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_macros_route_through_engine() {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(TestLogger { entries: entries.clone() });

    crate::engine_info!("nebula3d::test", "count = {}", 3);
    crate::engine_error!("nebula3d::test", "bad {}", "state");

    let captured = entries.lock().unwrap().clone();
    assert_eq!(captured.len(), 2);
    assert_eq!(captured[0], (LogSeverity::Info, "count = 3".to_string()));
    assert_eq!(captured[1], (LogSeverity::Error, "bad state".to_string()));

    Engine::reset_logger();
}
