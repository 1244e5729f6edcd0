mod adhoc;
mod concurrent_session_access;
mod connection_broken;
mod connection_pool;
mod constraint_violation;
mod driver_operation_failed;
mod mapping;
mod mapping_conflict;
mod pool_exhausted;
mod pool_timeout;
mod query_cancelled;
mod query_timeout;
mod record_not_found;
mod relation_not_loaded;
mod session_closed;
mod type_coercion;
mod unknown_type;
mod unresolved_relationship;
mod unsupported_criteria;

use adhoc::AdhocError;
use concurrent_session_access::ConcurrentSessionAccessError;
use connection_broken::ConnectionBrokenError;
use connection_pool::ConnectionPoolError;
use constraint_violation::ConstraintViolationError;
use driver_operation_failed::DriverOperationFailedError;
use mapping::MappingError;
use mapping_conflict::MappingConflictError;
use pool_exhausted::PoolExhaustedError;
use pool_timeout::PoolTimeoutError;
use query_cancelled::QueryCancelledError;
use query_timeout::QueryTimeoutError;
use record_not_found::RecordNotFoundError;
use relation_not_loaded::RelationNotLoadedError;
use session_closed::SessionClosedError;
use std::sync::Arc;
use type_coercion::TypeCoercionError;
use unknown_type::UnknownTypeError;
use unresolved_relationship::UnresolvedRelationshipError;
use unsupported_criteria::UnsupportedCriteriaError;

/// Returns early with an ad-hoc error built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::Error::from_args(format_args!($($arg)*)))
    };
}

/// Builds an ad-hoc error from a format string.
#[macro_export]
macro_rules! err {
    ($($arg:tt)*) => {
        $crate::Error::from_args(format_args!($($arg)*))
    };
}

/// An error that can occur in jdorm.
#[derive(Clone)]
pub struct Error {
    inner: Option<Arc<ErrorInner>>,
}

#[derive(Debug)]
struct ErrorInner {
    kind: ErrorKind,
    cause: Option<Error>,
}

impl Error {
    /// Adds context to this error.
    ///
    /// Context is displayed in reverse order: the most recently added context is shown first,
    /// followed by earlier context, ending with the root cause.
    #[inline(always)]
    pub fn context(self, consequent: impl IntoError) -> Error {
        self.context_impl(consequent.into_error())
    }

    #[inline(never)]
    #[cold]
    fn context_impl(self, consequent: Error) -> Error {
        let kind = match consequent.inner {
            Some(inner) => match Arc::try_unwrap(inner) {
                Ok(inner) if inner.cause.is_none() => inner.kind,
                // Shared or already chained: keep it as the cause of an ad-hoc wrapper.
                Ok(inner) => ErrorKind::Adhoc(AdhocError::new(
                    Error::from_inner(inner).to_string(),
                )),
                Err(shared) => ErrorKind::Adhoc(AdhocError::new(
                    Error { inner: Some(shared) }.to_string(),
                )),
            },
            None => ErrorKind::Unknown,
        };

        Error {
            inner: Some(Arc::new(ErrorInner {
                kind,
                cause: Some(self),
            })),
        }
    }

    fn from_inner(inner: ErrorInner) -> Error {
        Error {
            inner: Some(Arc::new(inner)),
        }
    }

    fn chain(&self) -> impl Iterator<Item = &Error> {
        let mut err = self;
        core::iter::once(err).chain(core::iter::from_fn(move || {
            err = err.inner.as_ref().and_then(|inner| inner.cause.as_ref())?;
            Some(err)
        }))
    }

    fn kind(&self) -> &ErrorKind {
        self.inner
            .as_ref()
            .map(|inner| &inner.kind)
            .unwrap_or(&ErrorKind::Unknown)
    }

    /// Returns `true` if this error, or any error in its context chain,
    /// matches `f`.
    fn any(&self, f: impl Fn(&ErrorKind) -> bool) -> bool {
        self.chain().any(|err| f(err.kind()))
    }

    /// Returns `true` when retrying the same operation later may succeed.
    ///
    /// Pool saturation, broken connections, cancellation, and timeouts are
    /// transient. Mapping, coercion, and constraint failures are not.
    pub fn is_transient(&self) -> bool {
        self.any(|kind| {
            matches!(
                kind,
                ErrorKind::PoolTimeout(_)
                    | ErrorKind::PoolExhausted(_)
                    | ErrorKind::ConnectionBroken(_)
                    | ErrorKind::QueryCancelled(_)
                    | ErrorKind::QueryTimeout(_)
            )
        })
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.kind() {
            ErrorKind::ConstraintViolation(err) => Some(err),
            ErrorKind::ConnectionBroken(err) => Some(err),
            ErrorKind::ConnectionPool(err) => Some(err),
            ErrorKind::DriverOperationFailed(err) => Some(err),
            ErrorKind::Anyhow(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let mut it = self.chain().peekable();
        while let Some(err) = it.next() {
            core::fmt::Display::fmt(err.kind(), f)?;
            if it.peek().is_some() {
                f.write_str(": ")?;
            }
        }
        Ok(())
    }
}

impl core::fmt::Debug for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        if !f.alternate() {
            core::fmt::Display::fmt(self, f)
        } else {
            let Some(ref inner) = self.inner else {
                return f.debug_struct("Error").field("kind", &"None").finish();
            };
            f.debug_struct("Error")
                .field("kind", &inner.kind)
                .field("cause", &inner.cause)
                .finish()
        }
    }
}

#[derive(Debug)]
enum ErrorKind {
    Anyhow(anyhow::Error),
    Adhoc(AdhocError),
    ConcurrentSessionAccess(ConcurrentSessionAccessError),
    ConnectionBroken(ConnectionBrokenError),
    ConnectionPool(ConnectionPoolError),
    ConstraintViolation(ConstraintViolationError),
    DriverOperationFailed(DriverOperationFailedError),
    Mapping(MappingError),
    MappingConflict(MappingConflictError),
    PoolExhausted(PoolExhaustedError),
    PoolTimeout(PoolTimeoutError),
    QueryCancelled(QueryCancelledError),
    QueryTimeout(QueryTimeoutError),
    RecordNotFound(RecordNotFoundError),
    RelationNotLoaded(RelationNotLoadedError),
    SessionClosed(SessionClosedError),
    TypeCoercion(TypeCoercionError),
    UnknownType(UnknownTypeError),
    UnresolvedRelationship(UnresolvedRelationshipError),
    UnsupportedCriteria(UnsupportedCriteriaError),
    Unknown,
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        use self::ErrorKind::*;

        match self {
            Anyhow(err) => core::fmt::Display::fmt(err, f),
            Adhoc(err) => core::fmt::Display::fmt(err, f),
            ConcurrentSessionAccess(err) => core::fmt::Display::fmt(err, f),
            ConnectionBroken(err) => core::fmt::Display::fmt(err, f),
            ConnectionPool(err) => core::fmt::Display::fmt(err, f),
            ConstraintViolation(err) => core::fmt::Display::fmt(err, f),
            DriverOperationFailed(err) => core::fmt::Display::fmt(err, f),
            Mapping(err) => core::fmt::Display::fmt(err, f),
            MappingConflict(err) => core::fmt::Display::fmt(err, f),
            PoolExhausted(err) => core::fmt::Display::fmt(err, f),
            PoolTimeout(err) => core::fmt::Display::fmt(err, f),
            QueryCancelled(err) => core::fmt::Display::fmt(err, f),
            QueryTimeout(err) => core::fmt::Display::fmt(err, f),
            RecordNotFound(err) => core::fmt::Display::fmt(err, f),
            RelationNotLoaded(err) => core::fmt::Display::fmt(err, f),
            SessionClosed(err) => core::fmt::Display::fmt(err, f),
            TypeCoercion(err) => core::fmt::Display::fmt(err, f),
            UnknownType(err) => core::fmt::Display::fmt(err, f),
            UnresolvedRelationship(err) => core::fmt::Display::fmt(err, f),
            UnsupportedCriteria(err) => core::fmt::Display::fmt(err, f),
            Unknown => f.write_str("unknown jdorm error"),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error::from_inner(ErrorInner { kind, cause: None })
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Error {
        Error::from(ErrorKind::Anyhow(err))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::from(anyhow::Error::from(err))
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Error {
        Error::from(anyhow::Error::from(err))
    }
}

/// Trait for types that can be converted into an Error.
pub trait IntoError {
    /// Converts this type into an Error.
    fn into_error(self) -> Error;
}

impl IntoError for Error {
    #[inline(always)]
    fn into_error(self) -> Error {
        self
    }
}
