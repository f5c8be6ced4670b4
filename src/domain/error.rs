use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid identifier `{value}`: {reason}")]
    InvalidId { value: String, reason: &'static str },
}

impl DomainError {
    pub fn invalid_id(value: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidId {
            value: value.into(),
            reason,
        }
    }
}
