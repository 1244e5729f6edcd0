use super::Error;

/// An operation named an entity type that the registry does not know.
#[derive(Debug)]
pub(super) struct UnknownTypeError {
    name: Box<str>,
}

impl std::error::Error for UnknownTypeError {}

impl core::fmt::Display for UnknownTypeError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "entity type `{}` is not registered", self.name)
    }
}

impl Error {
    pub fn unknown_type(name: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::UnknownType(UnknownTypeError {
            name: name.into().into(),
        }))
    }

    pub fn is_unknown_type(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::UnknownType(_)))
    }
}
