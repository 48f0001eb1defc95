//! Errors crossing the remote-host seam

use thiserror::Error;

/// Failures while talking to a managed host
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The transport itself failed (unreachable host, timeout, broken pipe)
    #[error("Transport failure: {reason}")]
    Transport { reason: String },

    /// The remote command ran but exited nonzero
    #[error("Remote command exited with status {code}: {stderr}")]
    CommandFailed { code: i32, stderr: String },

    /// The command output could not be interpreted as the expected value
    #[error("Fact output could not be interpreted: {reason}")]
    UnparsableFact { reason: String },
}
