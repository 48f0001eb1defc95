// Internal modules
pub mod actions;
pub mod cache;
pub mod information;
pub mod logs;
pub mod registry;
pub mod remote;
pub mod results;
pub mod solution;
pub mod store;
pub mod testing;
pub mod types;

// Re-export key types for library consumers
pub use cache::{CacheError, ConfigurationCache};
pub use registry::{RegistryError, SolutionRegistry};
pub use remote::{ExecutionContext, HostIdentity, RemoteError, RemoteHost};
pub use results::{DeploymentResult, OperationPayload, ResponseKind};
pub use solution::{Solution, SolutionError, SolutionOperation};
pub use store::HostConfiguration;
pub use types::{DataType, Value};
