use super::Error;

/// Every pooled connection is in use and the pool is configured to fail fast.
#[derive(Debug)]
pub(super) struct PoolExhaustedError {
    max_size: usize,
}

impl std::error::Error for PoolExhaustedError {}

impl core::fmt::Display for PoolExhaustedError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "connection pool exhausted: all {} connections are in use",
            self.max_size
        )
    }
}

impl Error {
    pub fn pool_exhausted(max_size: usize) -> Error {
        Error::from(super::ErrorKind::PoolExhausted(PoolExhaustedError {
            max_size,
        }))
    }

    pub fn is_pool_exhausted(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::PoolExhausted(_)))
    }
}
