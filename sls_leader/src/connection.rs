//! Connection descriptors and parsing of operator-supplied host strings

use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use sls_core::remote::HostIdentity;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("'{raw}' is not a valid connection string (expected user@host:port)")]
    InvalidConnectionString { raw: String },

    #[error("'{raw}' is not a valid port number")]
    InvalidPort { raw: String },

    #[error("A password is required for remote connections")]
    MissingPassword,

    #[error("No transport available for {descriptor} connections")]
    UnsupportedTransport { descriptor: String },
}

/// How to reach one managed host
#[derive(Debug, Clone)]
pub enum ConnectionDescriptor {
    /// The machine the leader runs on
    Local { sudo_password: Option<String> },
    /// SSH with password authentication
    SshPassword {
        hostname: String,
        port: u16,
        username: String,
        password: String,
    },
    /// SSH with a private key, the password doubling as sudo password
    SshKey {
        hostname: String,
        port: u16,
        username: String,
        password: String,
        key_path: PathBuf,
        key_password: Option<String>,
    },
}

fn connection_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<user>[A-Za-z0-9._-]+)@(?P<host>[A-Za-z0-9._-]+):(?P<port>\d{1,5})$")
            .expect("connection string pattern is valid")
    })
}

impl ConnectionDescriptor {
    /// Build a descriptor from CLI-style inputs
    ///
    /// No connection string means the local machine. A string selects SSH:
    /// with a key path, key-based auth; otherwise password auth. Remote
    /// connections always require a password (it doubles as the sudo
    /// password on the far side).
    pub fn from_target(
        connection_string: Option<&str>,
        password: Option<&str>,
        key_path: Option<PathBuf>,
        key_password: Option<&str>,
    ) -> Result<Self, ConnectionError> {
        let raw = match connection_string {
            None => {
                return Ok(ConnectionDescriptor::Local {
                    sudo_password: password.map(str::to_string),
                })
            }
            Some(raw) => raw,
        };

        let captures = connection_regex().captures(raw).ok_or_else(|| {
            ConnectionError::InvalidConnectionString {
                raw: raw.to_string(),
            }
        })?;
        let username = captures["user"].to_string();
        let hostname = captures["host"].to_string();
        let port: u16 = captures["port"]
            .parse()
            .map_err(|_| ConnectionError::InvalidPort {
                raw: captures["port"].to_string(),
            })?;

        let password = password
            .map(str::to_string)
            .ok_or(ConnectionError::MissingPassword)?;

        match key_path {
            Some(key_path) => Ok(ConnectionDescriptor::SshKey {
                hostname,
                port,
                username,
                password,
                key_path,
                key_password: key_password.map(str::to_string),
            }),
            None => Ok(ConnectionDescriptor::SshPassword {
                hostname,
                port,
                username,
                password,
            }),
        }
    }

    /// Stable identity used for result reporting and cache file naming
    pub fn identity(&self) -> HostIdentity {
        match self {
            ConnectionDescriptor::Local { .. } => {
                let name = hostname::get()
                    .ok()
                    .and_then(|n| n.into_string().ok())
                    .unwrap_or_else(|| "localhost".to_string());
                HostIdentity::new(format!("root@{}", name))
            }
            ConnectionDescriptor::SshPassword {
                hostname,
                port,
                username,
                ..
            }
            | ConnectionDescriptor::SshKey {
                hostname,
                port,
                username,
                ..
            } => HostIdentity::new(format!("{}@{}:{}", username, hostname, port)),
        }
    }

    /// Short transport label for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            ConnectionDescriptor::Local { .. } => "local",
            ConnectionDescriptor::SshPassword { .. } => "ssh-password",
            ConnectionDescriptor::SshKey { .. } => "ssh-key",
        }
    }
}
