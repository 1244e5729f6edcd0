use super::Error;

/// The in-flight statement was aborted through a cancel handle.
#[derive(Debug)]
pub(super) struct QueryCancelledError;

impl std::error::Error for QueryCancelledError {}

impl core::fmt::Display for QueryCancelledError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str("query cancelled")
    }
}

impl Error {
    pub fn query_cancelled() -> Error {
        Error::from(super::ErrorKind::QueryCancelled(QueryCancelledError))
    }

    pub fn is_query_cancelled(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::QueryCancelled(_)))
    }
}
