//! Conversion and type-inference errors for the typed value system

use thiserror::Error;

/// Errors raised while converting raw text or JSON into a typed value
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("Cannot convert an empty string")]
    EmptyInput,

    #[error("'{raw}' is not a valid boolean (expected 'true' or 'false')")]
    InvalidBoolean { raw: String },

    #[error("'{raw}' is not a valid base-10 integer")]
    InvalidInteger { raw: String },

    #[error("'{member}' is not a member of enumeration '{enumeration}'")]
    UnknownEnumMember { member: String, enumeration: String },

    #[error("Element {index} of the list could not be converted: {source}")]
    InvalidListElement {
        index: usize,
        #[source]
        source: Box<ConversionError>,
    },

    #[error("Value shape '{found}' does not match the declared type '{expected}'")]
    ShapeMismatch { expected: String, found: String },
}

/// Raised when no data type can be inferred for a runtime value
#[derive(Debug, Error)]
#[error("No data type matches the shape of the given value")]
pub struct UnknownDataTypeError;

/// Raised when an enumeration is declared without members
#[derive(Debug, Error)]
#[error("Enumeration '{name}' must declare at least one member")]
pub struct EmptyEnumError {
    pub name: String,
}
