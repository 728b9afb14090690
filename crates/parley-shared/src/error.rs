use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} must not be blank")]
    Blank { field: &'static str },

    #[error("{field} is {actual} characters long (max {max})")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    #[error("Invalid email address: {0:?}")]
    InvalidEmail(String),
}

/// Returned when a string is not a member of one of the closed wire enums.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} value: {value:?}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}
