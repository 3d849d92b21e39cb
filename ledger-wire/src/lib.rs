use thiserror::Error;

pub mod entity;
pub mod envelope;

/// Raised when a wire record cannot be converted into a domain value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct WireError(String);

impl WireError {
    pub fn missing_field(field: &str) -> Self {
        WireError(format!("required field `{}` is absent", field))
    }

    pub fn invalid_field(field: &str, reason: &str) -> Self {
        WireError(format!("field `{}` is invalid: {}", field, reason))
    }
}

/// Used to convert a wire record into a domain value.
pub trait TryFromWire<W>: Sized {
    /// Try to extract a domain value from the given wire record.
    fn try_from_wire(wire: W) -> Result<Self, WireError>;
}
