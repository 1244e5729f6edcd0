use super::Error;

/// A relation field was read on an instance that no session has bound.
#[derive(Debug)]
pub(super) struct RelationNotLoadedError {
    target: Box<str>,
}

impl std::error::Error for RelationNotLoadedError {}

impl core::fmt::Display for RelationNotLoadedError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "relation to `{}` is not bound to a session and was never loaded",
            self.target
        )
    }
}

impl Error {
    pub fn relation_not_loaded(target: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::RelationNotLoaded(RelationNotLoadedError {
            target: target.into().into(),
        }))
    }

    pub fn is_relation_not_loaded(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::RelationNotLoaded(_)))
    }
}
