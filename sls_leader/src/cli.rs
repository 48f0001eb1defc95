//! # SLS command line interface
//!
//! One subcommand per lifecycle operation, each taking the solution
//! identifier plus shared target options. The process exits nonzero when
//! any host reports an error result.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use sls_core::cache::ConfigurationCache;
use sls_core::registry::SolutionRegistry;
use sls_core::results::{DeploymentResult, ResponseKind};
use sls_core::solution::SolutionOperation;

use crate::catalog;
use crate::config::RuntimeConfig;
use crate::connection::ConnectionDescriptor;
use crate::leader::{DefaultTransportFactory, Leader};

#[derive(Parser)]
#[command(
    name = "sls",
    version,
    about = "Declarative lifecycle management for security solutions"
)]
struct Cli {
    /// Print results as a JSON array instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: CliCommand,
}

/// Options shared by every operation that touches hosts
#[derive(Args)]
struct TargetOpts {
    /// Remote host as user@host:port; repeatable, omit to manage this machine
    #[arg(long)]
    remote: Vec<String>,

    /// Password for remote authentication; doubles as the sudo password
    #[arg(long)]
    password: Option<String>,

    /// Private key used for SSH authentication
    #[arg(long)]
    key: Option<PathBuf>,

    /// Password of the private key
    #[arg(long)]
    key_password: Option<String>,

    /// TOML configuration file overriding the SLS_* environment defaults
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum CliCommand {
    /// List the available solutions
    Solutions,

    /// Write the initial configuration file for each target host
    Init {
        solution: String,
        #[command(flatten)]
        target: TargetOpts,
    },

    /// Install the solution on each target host
    Install {
        solution: String,
        #[command(flatten)]
        target: TargetOpts,
    },

    /// Read one or all information values
    Get {
        solution: String,
        /// Information identifier; omit for all values
        #[arg(long)]
        identifier: Option<String>,
        #[command(flatten)]
        target: TargetOpts,
    },

    /// Change one configuration value
    Set {
        solution: String,
        identifier: String,
        value: String,
        #[command(flatten)]
        target: TargetOpts,
    },

    /// Run one or all health tests
    Test {
        solution: String,
        /// Test identifier; omit for all tests
        #[arg(long)]
        identifier: Option<String>,
        #[command(flatten)]
        target: TargetOpts,
    },

    /// Fetch the content of a log source
    Logs {
        solution: String,
        /// Log source identifier
        #[arg(long)]
        identifier: Option<String>,
        #[command(flatten)]
        target: TargetOpts,
    },

    /// Bring the installed solution to its latest version
    Update {
        solution: String,
        #[command(flatten)]
        target: TargetOpts,
    },

    /// Remove the solution from each target host
    Uninstall {
        solution: String,
        #[command(flatten)]
        target: TargetOpts,
    },

    /// Run a named action with key=value arguments
    Execute {
        solution: String,
        action: String,
        /// Action argument as key=value; repeatable
        #[arg(long = "arg", value_parser = parse_key_value)]
        arguments: Vec<(String, String)>,
        #[command(flatten)]
        target: TargetOpts,
    },
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("'{}' is not a key=value pair", raw))
}

/// Parse the process arguments, run the request and return the exit code
pub fn run() -> i32 {
    let cli = Cli::parse();

    let registry = match catalog::default_registry() {
        Ok(registry) => registry,
        Err(err) => {
            eprintln!("Error: built-in solution catalog failed to load: {}", err);
            return 2;
        }
    };

    match cli.command {
        CliCommand::Solutions => {
            print_solutions(&registry, cli.json);
            0
        }
        command => match run_against_hosts(&registry, command, cli.json) {
            Ok(code) => code,
            Err(message) => {
                eprintln!("Error: {}", message);
                2
            }
        },
    }
}

fn print_solutions(registry: &SolutionRegistry, json: bool) {
    let summaries = registry.summaries();
    if json {
        let entries: Vec<serde_json::Value> = summaries
            .iter()
            .map(|s| {
                serde_json::json!({
                    "identifier": s.identifier,
                    "full_name": s.full_name,
                    "maturity": s.maturity,
                    "categories": s.categories,
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&entries).unwrap_or_else(|_| "[]".to_string())
        );
        return;
    }

    println!("Available solutions:\n");
    for summary in summaries {
        println!(
            "  {:<12} {} ({}, {})",
            summary.identifier,
            summary.full_name,
            summary.maturity,
            summary.categories.join(", ")
        );
    }
}

/// Everything except `solutions`: build the leader, fan out, report
fn run_against_hosts(
    registry: &SolutionRegistry,
    command: CliCommand,
    json: bool,
) -> Result<i32, String> {
    let (solution_id, operation, target) = decompose(command)?;

    let solution = registry
        .get(&solution_id)
        .map_err(|err| err.to_string())?
        .clone();
    let config = RuntimeConfig::load(target.config.as_deref()).map_err(|err| err.to_string())?;
    let cache = ConfigurationCache::new(&config.cache_root);

    let parallelism = if config.max_parallel_hosts == 0 {
        num_cpus::get()
    } else {
        config.max_parallel_hosts
    };
    let mut leader = Leader::with_parallelism(parallelism);

    if target.remote.is_empty() {
        leader.attach(
            ConnectionDescriptor::from_target(
                None,
                target.password.as_deref(),
                target.key.clone(),
                target.key_password.as_deref(),
            )
            .map_err(|err| err.to_string())?,
        );
    } else {
        for remote in &target.remote {
            leader.attach(
                ConnectionDescriptor::from_target(
                    Some(remote),
                    target.password.as_deref(),
                    target.key.clone(),
                    target.key_password.as_deref(),
                )
                .map_err(|err| err.to_string())?,
            );
        }
    }

    let factory = DefaultTransportFactory::new(Duration::from_secs(config.command_timeout_secs));
    leader.connect(&factory).map_err(|err| err.to_string())?;

    let results = leader
        .run_operation(&solution, &operation, &cache)
        .map_err(|err| err.to_string())?
        .to_vec();
    print_results(&results, json);

    if results.iter().any(DeploymentResult::is_error) {
        Ok(1)
    } else {
        Ok(0)
    }
}

type Decomposed = (String, SolutionOperation, TargetOpts);

fn decompose(command: CliCommand) -> Result<Decomposed, String> {
    match command {
        CliCommand::Solutions => Err("the solutions listing takes no hosts".to_string()),
        CliCommand::Init { solution, target } => Ok((solution, SolutionOperation::Init, target)),
        CliCommand::Install { solution, target } => {
            Ok((solution, SolutionOperation::Install, target))
        }
        CliCommand::Get {
            solution,
            identifier,
            target,
        } => Ok((
            solution,
            SolutionOperation::GetInformation { identifier },
            target,
        )),
        CliCommand::Set {
            solution,
            identifier,
            value,
            target,
        } => Ok((
            solution,
            SolutionOperation::SetInformation { identifier, value },
            target,
        )),
        CliCommand::Test {
            solution,
            identifier,
            target,
        } => Ok((solution, SolutionOperation::Test { identifier }, target)),
        CliCommand::Logs {
            solution,
            identifier,
            target,
        } => Ok((solution, SolutionOperation::GetLogs { identifier }, target)),
        CliCommand::Update { solution, target } => {
            Ok((solution, SolutionOperation::Update, target))
        }
        CliCommand::Uninstall { solution, target } => {
            Ok((solution, SolutionOperation::Uninstall, target))
        }
        CliCommand::Execute {
            solution,
            action,
            arguments,
            target,
        } => Ok((
            solution,
            SolutionOperation::Execute {
                identifier: action,
                arguments: arguments.into_iter().collect::<BTreeMap<_, _>>(),
            },
            target,
        )),
    }
}

fn print_results(results: &[DeploymentResult], json: bool) {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(results).unwrap_or_else(|_| "[]".to_string())
        );
        return;
    }

    for result in results {
        let marker = match result.kind {
            ResponseKind::Success => "[ OK ]",
            ResponseKind::Error => "[FAIL]",
        };
        println!("{} {}: {}", marker, result.host_id, result.message);
        if let Some(payload) = &result.payload {
            if let Ok(pretty) = serde_json::to_string_pretty(payload) {
                for line in pretty.lines() {
                    println!("        {}", line);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_value_parsing() {
        assert_eq!(
            parse_key_value("content=hello world").unwrap(),
            ("content".to_string(), "hello world".to_string())
        );
        assert!(parse_key_value("no-equals").is_err());
    }

    #[test]
    fn test_cli_parses_execute_arguments() {
        let cli = Cli::try_parse_from([
            "sls", "execute", "filemark", "append", "--arg", "content=hi",
        ])
        .unwrap();
        match cli.command {
            CliCommand::Execute {
                solution,
                action,
                arguments,
                ..
            } => {
                assert_eq!(solution, "filemark");
                assert_eq!(action, "append");
                assert_eq!(
                    arguments,
                    vec![("content".to_string(), "hi".to_string())]
                );
            }
            _ => panic!("wrong subcommand parsed"),
        }
    }

    #[test]
    fn test_cli_parses_remote_targets() {
        let cli = Cli::try_parse_from([
            "sls",
            "install",
            "filemark",
            "--remote",
            "admin@10.0.0.7:22",
            "--remote",
            "admin@10.0.0.8:22",
            "--password",
            "secret",
        ])
        .unwrap();
        match cli.command {
            CliCommand::Install { target, .. } => {
                assert_eq!(target.remote.len(), 2);
                assert_eq!(target.password.as_deref(), Some("secret"));
            }
            _ => panic!("wrong subcommand parsed"),
        }
    }
}
