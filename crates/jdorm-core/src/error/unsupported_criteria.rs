use super::Error;

/// Query criteria use a construct the statement builder cannot express.
#[derive(Debug)]
pub(super) struct UnsupportedCriteriaError {
    message: Box<str>,
}

impl std::error::Error for UnsupportedCriteriaError {}

impl core::fmt::Display for UnsupportedCriteriaError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "unsupported criteria: {}", self.message)
    }
}

impl Error {
    pub fn unsupported_criteria(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::UnsupportedCriteria(
            UnsupportedCriteriaError {
                message: message.into().into(),
            },
        ))
    }

    pub fn is_unsupported_criteria(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::UnsupportedCriteria(_)))
    }
}
