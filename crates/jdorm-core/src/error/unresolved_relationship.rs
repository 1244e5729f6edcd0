use super::Error;

/// A relationship points at an entity that has not been registered.
#[derive(Debug)]
pub(super) struct UnresolvedRelationshipError {
    entity: Box<str>,
    relation: Box<str>,
    target: Box<str>,
}

impl std::error::Error for UnresolvedRelationshipError {}

impl core::fmt::Display for UnresolvedRelationshipError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "relationship `{}.{}` targets `{}`, which is not registered",
            self.entity, self.relation, self.target
        )
    }
}

impl Error {
    pub fn unresolved_relationship(
        entity: impl Into<String>,
        relation: impl Into<String>,
        target: impl Into<String>,
    ) -> Error {
        Error::from(super::ErrorKind::UnresolvedRelationship(
            UnresolvedRelationshipError {
                entity: entity.into().into(),
                relation: relation.into().into(),
                target: target.into().into(),
            },
        ))
    }

    pub fn is_unresolved_relationship(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::UnresolvedRelationship(_)))
    }
}
