//! Multi-host coordinator: fans one solution operation out over every
//! connected host and collects per-host results
//!
//! A failing host never fails the batch; domain errors are captured into
//! error results so the other hosts keep going. Only an engine fault (a
//! panicking worker) aborts the batch.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

use sls_core::cache::ConfigurationCache;
use sls_core::remote::{ExecutionContext, HostIdentity, RemoteHost};
use sls_core::results::DeploymentResult;
use sls_core::solution::{Solution, SolutionOperation};

use crate::connection::{ConnectionDescriptor, ConnectionError};
use crate::executor::LocalHost;

#[derive(Debug, Error)]
pub enum LeaderError {
    #[error("Could not connect to '{host}': {source}")]
    ConnectionFailed {
        host: String,
        #[source]
        source: ConnectionError,
    },

    #[error("Operation execution failed: {reason}")]
    OperationExecutionFailed { reason: String },
}

// ============================================================================
// TRANSPORT FACTORY
// ============================================================================

/// Turns a connection descriptor into a live transport
///
/// `Sync` because `connect` opens descriptors from worker threads.
pub trait TransportFactory: Sync {
    fn open(
        &self,
        descriptor: &ConnectionDescriptor,
    ) -> Result<Arc<dyn RemoteHost>, ConnectionError>;
}

/// Factory for the transports this build ships: local execution only
///
/// SSH descriptors parse and carry identities, but opening them reports an
/// unsupported transport until an SSH backend is wired in.
pub struct DefaultTransportFactory {
    command_timeout: Duration,
}

impl DefaultTransportFactory {
    pub fn new(command_timeout: Duration) -> Self {
        Self { command_timeout }
    }
}

impl TransportFactory for DefaultTransportFactory {
    fn open(
        &self,
        descriptor: &ConnectionDescriptor,
    ) -> Result<Arc<dyn RemoteHost>, ConnectionError> {
        match descriptor {
            ConnectionDescriptor::Local { .. } => {
                Ok(Arc::new(LocalHost::new(self.command_timeout)))
            }
            other => Err(ConnectionError::UnsupportedTransport {
                descriptor: other.kind().to_string(),
            }),
        }
    }
}

// ============================================================================
// LEADER
// ============================================================================

/// One host the leader can currently reach
pub struct ConnectedHost {
    pub identity: HostIdentity,
    pub transport: Arc<dyn RemoteHost>,
}

/// Coordinator over a set of hosts and an accumulating result list
pub struct Leader {
    pending: Vec<ConnectionDescriptor>,
    hosts: Vec<ConnectedHost>,
    results: Vec<DeploymentResult>,
    parallelism: usize,
}

const DEFAULT_PARALLELISM: usize = 4;

impl Leader {
    pub fn new() -> Self {
        Self::with_parallelism(DEFAULT_PARALLELISM)
    }

    /// Coordinator handling at most `parallelism` hosts at a time
    pub fn with_parallelism(parallelism: usize) -> Self {
        Self {
            pending: Vec::new(),
            hosts: Vec::new(),
            results: Vec::new(),
            parallelism: parallelism.max(1),
        }
    }

    /// Queue a host for the next `connect` call
    pub fn attach(&mut self, descriptor: ConnectionDescriptor) {
        self.pending.push(descriptor);
    }

    /// Register an already-open transport, e.g. for embedding or tests
    pub fn attach_transport(&mut self, identity: HostIdentity, transport: Arc<dyn RemoteHost>) {
        self.hosts.push(ConnectedHost {
            identity,
            transport,
        });
    }

    /// Open a transport for every queued descriptor
    ///
    /// Descriptors are opened concurrently, in chunks of at most the
    /// configured parallelism. Every descriptor that opens gets registered,
    /// in attach order; the first failure (again in attach order) is then
    /// reported as `ConnectionFailed`.
    pub fn connect(&mut self, factory: &dyn TransportFactory) -> Result<(), LeaderError> {
        let pending: Vec<ConnectionDescriptor> = self.pending.drain(..).collect();
        let indexed: Vec<(usize, &ConnectionDescriptor)> =
            pending.iter().enumerate().collect();

        type Opened = Result<Arc<dyn RemoteHost>, ConnectionError>;
        let (tx, rx) = mpsc::channel::<(usize, HostIdentity, Opened)>();

        thread::scope(|scope| {
            for chunk in indexed.chunks(self.parallelism) {
                let mut handles = Vec::with_capacity(chunk.len());
                for &(index, descriptor) in chunk {
                    let tx = tx.clone();
                    handles.push(scope.spawn(move || {
                        let identity = descriptor.identity();
                        let opened = factory.open(descriptor);
                        let _ = tx.send((index, identity, opened));
                    }));
                }
                for handle in handles {
                    let _ = handle.join();
                }
            }
        });
        drop(tx);

        let mut opened: Vec<(usize, HostIdentity, Opened)> = rx.try_iter().collect();
        opened.sort_by_key(|(index, _, _)| *index);

        let mut failure = None;
        for (_, identity, result) in opened {
            match result {
                Ok(transport) => {
                    log::debug!("Connected to host '{}'", identity);
                    self.hosts.push(ConnectedHost {
                        identity,
                        transport,
                    });
                }
                Err(source) => {
                    if failure.is_none() {
                        failure = Some(LeaderError::ConnectionFailed {
                            host: identity.to_string(),
                            source,
                        });
                    }
                }
            }
        }
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn hosts(&self) -> &[ConnectedHost] {
        &self.hosts
    }

    /// Run one operation on every connected host and collect the outcomes
    ///
    /// Hosts are processed in chunks of at most the configured parallelism,
    /// one worker thread per host in a chunk. The returned slice covers only
    /// this batch; `results` keeps the full history.
    pub fn run_operation(
        &mut self,
        solution: &Solution,
        operation: &SolutionOperation,
        cache: &ConfigurationCache,
    ) -> Result<&[DeploymentResult], LeaderError> {
        let batch_id = Uuid::new_v4();
        log::info!(
            "Batch {}: running '{}' of solution '{}' on {} host(s)",
            batch_id,
            operation.name(),
            solution.identifier(),
            self.hosts.len()
        );

        let batch_start = self.results.len();
        let (tx, rx) = mpsc::channel::<DeploymentResult>();
        let mut worker_panicked = false;

        thread::scope(|scope| {
            for chunk in self.hosts.chunks(self.parallelism) {
                let mut handles = Vec::with_capacity(chunk.len());
                for host in chunk {
                    let tx = tx.clone();
                    handles.push(scope.spawn(move || {
                        let ctx =
                            ExecutionContext::new(host.identity.clone(), host.transport.as_ref());
                        let result = match solution.dispatch(&ctx, cache, operation) {
                            Ok(payload) => DeploymentResult::success(
                                host.identity.as_str(),
                                format!(
                                    "Operation '{}' of solution '{}' succeeded",
                                    operation.name(),
                                    solution.identifier()
                                ),
                                payload.into_json(),
                            ),
                            Err(err) => {
                                log::warn!(
                                    "Operation '{}' failed on host '{}': {}",
                                    operation.name(),
                                    host.identity,
                                    err
                                );
                                DeploymentResult::error(host.identity.as_str(), err.to_string())
                            }
                        };
                        let _ = tx.send(result);
                    }));
                }
                for handle in handles {
                    if handle.join().is_err() {
                        worker_panicked = true;
                    }
                }
            }
        });
        drop(tx);

        for result in rx.try_iter() {
            self.results.push(result);
        }

        if worker_panicked {
            return Err(LeaderError::OperationExecutionFailed {
                reason: format!("a worker thread panicked during batch {}", batch_id),
            });
        }
        Ok(&self.results[batch_start..])
    }

    /// Append an externally produced result to the history
    pub fn publish_result(&mut self, result: DeploymentResult) {
        self.results.push(result);
    }

    /// Every result collected so far, across batches
    pub fn results(&self) -> &[DeploymentResult] {
        &self.results
    }
}

impl Default for Leader {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
