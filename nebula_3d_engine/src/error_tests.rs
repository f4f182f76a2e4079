//! Unit tests for error.rs

use crate::error::{Error, Result};
use serial_test::serial;

// ============================================================================
// ERROR DISPLAY TESTS
// ============================================================================

#[test]
fn test_backend_error_display() {
    let err = Error::BackendError("queue submit failed".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Backend error"));
    assert!(display.contains("queue submit failed"));
}

#[test]
fn test_out_of_memory_display() {
    let err = Error::OutOfMemory;
    assert_eq!(format!("{}", err), "Out of GPU memory");
}

#[test]
fn test_invalid_resource_display() {
    let err = Error::InvalidResource("mesh has no vertices".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Invalid resource"));
    assert!(display.contains("mesh has no vertices"));
}

#[test]
fn test_initialization_failed_display() {
    let err = Error::InitializationFailed("no graphics queue".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Initialization failed"));
    assert!(display.contains("no graphics queue"));
}

// ============================================================================
// RESULT / SOURCE TESTS
// ============================================================================

#[test]
fn test_result_propagates_with_question_mark() {
    fn fails() -> Result<u32> {
        Err(Error::OutOfMemory)
    }
    fn outer() -> Result<u32> {
        let value = fails()?;
        Ok(value)
    }
    assert!(matches!(outer(), Err(Error::OutOfMemory)));
}

#[test]
fn test_error_implements_std_error() {
    let err = Error::BackendError("x".to_string());
    let as_std: &dyn std::error::Error = &err;
    assert!(as_std.to_string().contains("Backend error"));
}

// The construction macros log through the global logger slot; keep them
// serial with the engine tests that swap that slot.
#[test]
#[serial]
fn test_engine_err_macro_yields_backend_error() {
    let err = crate::engine_err!("nebula3d::test", "slot {} missing", 7);
    match err {
        Error::BackendError(msg) => assert_eq!(msg, "slot 7 missing"),
        other => panic!("expected BackendError, got {:?}", other),
    }
}

#[test]
#[serial]
fn test_engine_bail_macro_returns_early() {
    fn bails() -> Result<()> {
        crate::engine_bail!("nebula3d::test", "bailing with code {}", 3);
    }
    match bails() {
        Err(Error::BackendError(msg)) => assert_eq!(msg, "bailing with code 3"),
        other => panic!("expected BackendError, got {:?}", other),
    }
}
