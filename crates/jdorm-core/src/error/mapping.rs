use super::Error;

/// An entity's declared mapping is invalid.
#[derive(Debug)]
pub(super) struct MappingError {
    entity: Box<str>,
    message: Box<str>,
}

impl std::error::Error for MappingError {}

impl core::fmt::Display for MappingError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid mapping for `{}`: {}", self.entity, self.message)
    }
}

impl Error {
    /// Creates a mapping error for `entity`.
    pub fn mapping(entity: impl Into<String>, message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::Mapping(MappingError {
            entity: entity.into().into(),
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error is a mapping error.
    pub fn is_mapping(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::Mapping(_)))
    }
}
