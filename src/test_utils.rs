//! Test utilities for BPNR
//!
//! Shared helpers for unit tests: temporary directories, fixture-backed
//! configs, and error assertions.

use crate::config::{Config, TransportKind};
use crate::error::{kind, BpnrError, Result};
use std::path::PathBuf;
use tempfile::TempDir;

/// Create a temporary directory for testing
///
/// # Panics
///
/// Panics if the directory cannot be created
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Path for a session file inside `dir`; the file is not created
pub fn session_path(dir: &TempDir) -> PathBuf {
    dir.path().join("session.json")
}

/// Config using the fixture transport and a session file inside `dir`
pub fn fixture_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.http.transport = TransportKind::Fixture;
    config.session.path = Some(session_path(dir));
    config
}

/// Assert that `result` failed with a [`BpnrError`] matching `predicate`
///
/// # Panics
///
/// Panics if the result is Ok, the error is not a `BpnrError`, or the
/// predicate rejects it
pub fn assert_bpnr_error<T: std::fmt::Debug>(result: Result<T>, predicate: impl Fn(&BpnrError) -> bool) {
    match result {
        Ok(value) => panic!("Expected error, got Ok({value:?})"),
        Err(e) => match kind(&e) {
            Some(err) => assert!(predicate(err), "Unexpected error variant: {err:?}"),
            None => panic!("Expected BpnrError, got: {e}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_config_points_into_dir() {
        let dir = temp_dir();
        let config = fixture_config(&dir);
        assert_eq!(config.http.transport, TransportKind::Fixture);
        assert_eq!(config.session.resolve_path().unwrap(), session_path(&dir));
    }

    #[test]
    fn test_assert_bpnr_error_accepts_matching_variant() {
        let result: Result<()> = Err(BpnrError::MissingCode.into());
        assert_bpnr_error(result, |e| matches!(e, BpnrError::MissingCode));
    }

    #[test]
    #[should_panic(expected = "Expected error")]
    fn test_assert_bpnr_error_rejects_ok() {
        assert_bpnr_error(Ok(1), |_| true);
    }
}
