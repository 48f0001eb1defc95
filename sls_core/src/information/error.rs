//! Information manager errors

use thiserror::Error;

use crate::remote::RemoteError;

#[derive(Debug, Error)]
pub enum InformationError {
    #[error("Duplicate information identifier '{identifier}'")]
    DuplicateIdentifier { identifier: String },

    #[error("Invalid information declaration '{identifier}': {reason}")]
    InvalidDeclaration { identifier: String, reason: String },

    #[error("No information with identifier '{identifier}'")]
    NotFound { identifier: String },

    #[error("Information '{identifier}' is not writable")]
    NotWritable { identifier: String },

    #[error("Invalid value for information '{identifier}': {reason}")]
    InvalidValue { identifier: String, reason: String },

    #[error("Mandatory information '{identifier}' is left unset")]
    MandatoryUnset { identifier: String },

    #[error(transparent)]
    Remote(#[from] RemoteError),
}
