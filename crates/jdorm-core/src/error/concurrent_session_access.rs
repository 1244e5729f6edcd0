use super::Error;

/// A session was used from a second task while an operation was in flight.
#[derive(Debug)]
pub(super) struct ConcurrentSessionAccessError;

impl std::error::Error for ConcurrentSessionAccessError {}

impl core::fmt::Display for ConcurrentSessionAccessError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str("session is already in use by another task")
    }
}

impl Error {
    /// Creates an error for overlapping use of a single session.
    pub fn concurrent_session_access() -> Error {
        Error::from(super::ErrorKind::ConcurrentSessionAccess(
            ConcurrentSessionAccessError,
        ))
    }

    /// Returns `true` if this error reports overlapping use of a session.
    pub fn is_concurrent_session_access(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::ConcurrentSessionAccess(_)))
    }
}
