//! Aggregate error type for solution lifecycle operations

use std::path::PathBuf;

use thiserror::Error;

use crate::actions::ActionsError;
use crate::cache::CacheError;
use crate::information::InformationError;
use crate::logs::LogsError;
use crate::remote::RemoteError;
use crate::testing::TestError;

#[derive(Debug, Error)]
pub enum SolutionError {
    #[error("Solution '{solution}' is already installed on this host")]
    AlreadyInstalled { solution: String },

    #[error("Solution '{solution}' is not installed on this host")]
    NotInstalled { solution: String },

    #[error("Requirement test '{test}' failed; the host cannot run this solution")]
    RequirementsNotMet { test: String },

    #[error(
        "No configuration file at {}; run the init operation against this host first",
        path.display()
    )]
    NoConfigurationFile { path: PathBuf },

    #[error("Solution definition is incomplete: {reason}")]
    IncompleteDefinition { reason: String },

    #[error(transparent)]
    Information(#[from] InformationError),

    #[error(transparent)]
    Test(#[from] TestError),

    #[error(transparent)]
    Logs(#[from] LogsError),

    #[error(transparent)]
    Actions(#[from] ActionsError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}
