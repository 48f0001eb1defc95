//! In-memory host double used by the engine's own tests and by downstream
//! crates that need deterministic hosts

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use super::error::RemoteError;
use super::RemoteHost;

/// A `RemoteHost` that replays canned fact output and records operations
///
/// Scripted output is queued per command: successive queries pop the queue,
/// and the last entry sticks once the queue is down to one. Commands can be
/// marked as failing, or the whole host marked unreachable.
pub struct ScriptedHost {
    facts: Mutex<HashMap<String, VecDeque<String>>>,
    failing: Mutex<HashSet<String>>,
    operations: Mutex<Vec<String>>,
    fact_queries: Mutex<Vec<String>>,
    unreachable: bool,
}

impl ScriptedHost {
    pub fn new() -> Self {
        Self {
            facts: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            operations: Mutex::new(Vec::new()),
            fact_queries: Mutex::new(Vec::new()),
            unreachable: false,
        }
    }

    /// A host where every command fails with a transport error
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::new()
        }
    }

    /// Set the single sticky output for a command, replacing any queue
    pub fn script_fact(&self, command: impl Into<String>, output: impl Into<String>) {
        let mut facts = self.facts.lock().expect("scripted host state poisoned");
        facts.insert(command.into(), VecDeque::from([output.into()]));
    }

    /// Queue an additional output for a command
    pub fn push_fact(&self, command: impl Into<String>, output: impl Into<String>) {
        let mut facts = self.facts.lock().expect("scripted host state poisoned");
        facts
            .entry(command.into())
            .or_default()
            .push_back(output.into());
    }

    /// Make one command fail with a transport error
    pub fn fail_command(&self, command: impl Into<String>) {
        let mut failing = self.failing.lock().expect("scripted host state poisoned");
        failing.insert(command.into());
    }

    /// Every operation command recorded so far, in order
    pub fn operations(&self) -> Vec<String> {
        self.operations
            .lock()
            .expect("scripted host state poisoned")
            .clone()
    }

    /// Every fact command queried so far, in order
    pub fn fact_queries(&self) -> Vec<String> {
        self.fact_queries
            .lock()
            .expect("scripted host state poisoned")
            .clone()
    }

    fn check_reachable(&self, command: &str) -> Result<(), RemoteError> {
        if self.unreachable {
            return Err(RemoteError::Transport {
                reason: "scripted host is unreachable".to_string(),
            });
        }
        let failing = self.failing.lock().expect("scripted host state poisoned");
        if failing.contains(command) {
            return Err(RemoteError::Transport {
                reason: format!("scripted failure for '{}'", command),
            });
        }
        Ok(())
    }
}

impl Default for ScriptedHost {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteHost for ScriptedHost {
    fn run_fact(&self, command: &str) -> Result<String, RemoteError> {
        self.check_reachable(command)?;
        self.fact_queries
            .lock()
            .expect("scripted host state poisoned")
            .push(command.to_string());

        let mut facts = self.facts.lock().expect("scripted host state poisoned");
        let queue = facts
            .get_mut(command)
            .ok_or_else(|| RemoteError::Transport {
                reason: format!("no scripted output for '{}'", command),
            })?;
        if queue.len() > 1 {
            queue.pop_front().ok_or_else(|| RemoteError::Transport {
                reason: format!("no scripted output for '{}'", command),
            })
        } else {
            queue.front().cloned().ok_or_else(|| RemoteError::Transport {
                reason: format!("no scripted output for '{}'", command),
            })
        }
    }

    fn run_operation(&self, command: &str) -> Result<(), RemoteError> {
        self.check_reachable(command)?;
        self.operations
            .lock()
            .expect("scripted host state poisoned")
            .push(command.to_string());
        Ok(())
    }
}
