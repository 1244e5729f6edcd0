use super::Error;
use std::time::Duration;

/// No pooled connection became available within the acquire timeout.
#[derive(Debug)]
pub(super) struct PoolTimeoutError {
    waited: Duration,
}

impl std::error::Error for PoolTimeoutError {}

impl core::fmt::Display for PoolTimeoutError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "timed out after {:?} waiting for a pooled connection",
            self.waited
        )
    }
}

impl Error {
    pub fn pool_timeout(waited: Duration) -> Error {
        Error::from(super::ErrorKind::PoolTimeout(PoolTimeoutError { waited }))
    }

    pub fn is_pool_timeout(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::PoolTimeout(_)))
    }
}
