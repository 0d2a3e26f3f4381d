use thiserror::Error;

/// Rejections raised while turning a candidate payload into a storable visit.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

impl ValidationError {
    /// Name of the offending field, for structured error bodies.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingField(field) => field,
        }
    }
}
