//! Validation errors for records

/// Record validation failures
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    /// Required text field is empty
    #[error("{kind}: field '{field}' must not be empty")]
    EmptyField {
        kind: &'static str,
        field: &'static str,
    },

    /// Quality score outside 0..=100
    #[error("score {0} is outside 0..=100")]
    ScoreOutOfRange(f64),

    /// Child record created without a parent id
    #[error("{0} requires a parent id")]
    MissingParent(&'static str),
}

impl ModelError {
    /// Create empty field error
    #[inline]
    #[must_use]
    pub fn empty(kind: &'static str, field: &'static str) -> Self {
        Self::EmptyField { kind, field }
    }
}

/// Reject blank values for a required field
pub(crate) fn require(kind: &'static str, field: &'static str, value: &str) -> Result<(), ModelError> {
    if value.trim().is_empty() {
        return Err(ModelError::empty(kind, field));
    }
    Ok(())
}
