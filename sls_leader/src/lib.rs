// Internal modules
pub mod catalog;
pub mod config;
pub mod connection;
pub mod executor;
pub mod leader;

#[cfg(feature = "cli")]
pub mod cli;

// Re-export key types for library consumers
pub use config::{ConfigError, RuntimeConfig};
pub use connection::{ConnectionDescriptor, ConnectionError};
pub use executor::{CommandExecutor, LocalHost};
pub use leader::{DefaultTransportFactory, Leader, LeaderError, TransportFactory};
