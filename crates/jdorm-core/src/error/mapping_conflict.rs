use super::Error;

/// An entity was registered a second time with a mapping that differs from
/// the first registration.
#[derive(Debug)]
pub(super) struct MappingConflictError {
    entity: Box<str>,
}

impl std::error::Error for MappingConflictError {}

impl core::fmt::Display for MappingConflictError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "entity `{}` is already registered with a different mapping",
            self.entity
        )
    }
}

impl Error {
    pub fn mapping_conflict(entity: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::MappingConflict(MappingConflictError {
            entity: entity.into().into(),
        }))
    }

    pub fn is_mapping_conflict(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::MappingConflict(_)))
    }
}
