use super::Error;

/// The database connection is no longer usable.
///
/// Connections that report this error are discarded by the pool instead of
/// being returned for reuse.
#[derive(Debug)]
pub(super) struct ConnectionBrokenError {
    pub(super) inner: Box<dyn std::error::Error + Send + Sync>,
}

impl std::error::Error for ConnectionBrokenError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.inner.as_ref())
    }
}

impl core::fmt::Display for ConnectionBrokenError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "connection broken: {}", self.inner)
    }
}

impl Error {
    /// Creates an error for a connection that failed mid-operation.
    pub fn connection_broken(err: impl std::error::Error + Send + Sync + 'static) -> Error {
        Error::from(super::ErrorKind::ConnectionBroken(ConnectionBrokenError {
            inner: Box::new(err),
        }))
    }

    /// Returns `true` if the connection that produced this error must be discarded.
    pub fn is_connection_broken(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::ConnectionBroken(_)))
    }
}
