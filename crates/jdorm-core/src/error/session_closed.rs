use super::Error;

/// The session already committed, rolled back, or closed.
#[derive(Debug)]
pub(super) struct SessionClosedError;

impl std::error::Error for SessionClosedError {}

impl core::fmt::Display for SessionClosedError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str("session is closed")
    }
}

impl Error {
    pub fn session_closed() -> Error {
        Error::from(super::ErrorKind::SessionClosed(SessionClosedError))
    }

    pub fn is_session_closed(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::SessionClosed(_)))
    }
}
