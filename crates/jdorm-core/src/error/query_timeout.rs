use super::Error;
use std::time::Duration;

/// A statement did not finish within the configured query timeout.
#[derive(Debug)]
pub(super) struct QueryTimeoutError {
    limit: Duration,
}

impl std::error::Error for QueryTimeoutError {}

impl core::fmt::Display for QueryTimeoutError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "query exceeded timeout of {:?}", self.limit)
    }
}

impl Error {
    pub fn query_timeout(limit: Duration) -> Error {
        Error::from(super::ErrorKind::QueryTimeout(QueryTimeoutError { limit }))
    }

    pub fn is_query_timeout(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::QueryTimeout(_)))
    }
}
