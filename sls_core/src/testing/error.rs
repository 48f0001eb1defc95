//! Test manager errors

use thiserror::Error;

use crate::remote::RemoteError;

#[derive(Debug, Error)]
pub enum TestError {
    #[error("Duplicate test identifier '{identifier}'")]
    DuplicateIdentifier { identifier: String },

    #[error("No test with identifier '{identifier}'")]
    NotFound { identifier: String },

    #[error("Test '{identifier}' did not produce the expected result")]
    Failed { identifier: String },

    /// The fact ran but its output is not a boolean verdict; this is a bug
    /// in the solution definition, not a failed check
    #[error("Fact of test '{identifier}' did not resolve to a boolean: {reason}")]
    UnresolvableFact { identifier: String, reason: String },

    #[error(transparent)]
    Remote(#[from] RemoteError),
}
