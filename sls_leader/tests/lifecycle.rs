//! End-to-end lifecycle of the built-in `filemark` solution driven through
//! the leader with scripted hosts

use std::collections::BTreeMap;
use std::sync::Arc;

use sls_core::cache::ConfigurationCache;
use sls_core::remote::{HostIdentity, ScriptedHost};
use sls_core::results::ResponseKind;
use sls_core::solution::SolutionOperation;
use sls_leader::catalog;
use sls_leader::leader::Leader;

const PRESENCE_CMD: &str = "test -f /tmp/sls_filemark/marker && echo true || echo false";
const REQUIREMENT_CMD: &str = "command -v sh > /dev/null && echo true || echo false";
const OPERATIONAL_CMD: &str = "test -r /tmp/sls_filemark/marker && echo true || echo false";
const MESSAGE_CMD: &str = "cat /tmp/sls_filemark/marker";
const SIZE_CMD: &str = "wc -c < /tmp/sls_filemark/marker | tr -d ' '";

fn scripted_installed_host() -> Arc<ScriptedHost> {
    let host = Arc::new(ScriptedHost::new());
    host.script_fact(PRESENCE_CMD, "true");
    host.script_fact(REQUIREMENT_CMD, "true");
    host.script_fact(OPERATIONAL_CMD, "true");
    host.script_fact(MESSAGE_CMD, "guarded");
    host.script_fact(SIZE_CMD, "7");
    host
}

#[test]
fn full_lifecycle_on_one_host() {
    let solution = catalog::filemark().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let cache = ConfigurationCache::new(dir.path());

    let host = Arc::new(ScriptedHost::new());
    // not installed for the install probe, installed from then on
    host.push_fact(PRESENCE_CMD, "false");
    host.push_fact(PRESENCE_CMD, "true");
    host.script_fact(REQUIREMENT_CMD, "true");
    host.script_fact(MESSAGE_CMD, "guarded");
    host.script_fact(SIZE_CMD, "7");

    let identity = HostIdentity::new("op@edge-01:22");
    let mut leader = Leader::new();
    leader.attach_transport(identity.clone(), host.clone());

    for operation in [SolutionOperation::Init, SolutionOperation::Install] {
        let batch = leader.run_operation(&solution, &operation, &cache).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].kind, ResponseKind::Success, "{:?}", batch[0]);
    }
    assert!(host
        .operations()
        .contains(&"mkdir -p /tmp/sls_filemark".to_string()));
    assert!(host
        .operations()
        .contains(&"printf '%s' 'guarded' > /tmp/sls_filemark/marker".to_string()));

    // refresh and read back information
    let batch = leader
        .run_operation(
            &solution,
            &SolutionOperation::GetInformation { identifier: None },
            &cache,
        )
        .unwrap();
    assert_eq!(batch[0].kind, ResponseKind::Success);
    let payload = batch[0].payload.as_ref().unwrap();
    assert_eq!(payload["message"], "guarded");
    assert_eq!(payload["marker_size"], 7);

    // change the message; the setter must hit the host
    let batch = leader
        .run_operation(
            &solution,
            &SolutionOperation::SetInformation {
                identifier: "message".to_string(),
                value: "hello world".to_string(),
            },
            &cache,
        )
        .unwrap();
    assert_eq!(batch[0].kind, ResponseKind::Success);
    assert!(host
        .operations()
        .contains(&"printf '%s' 'hello world' > /tmp/sls_filemark/marker".to_string()));

    // the configuration file records the new message, never the metric
    let exported = cache.load(&identity, "filemark").unwrap();
    assert_eq!(exported.get("message"), Some(&serde_json::json!("hello world")));
    assert!(!exported.contains_key("marker_size"));

    // run an action with typed arguments
    let mut arguments = BTreeMap::new();
    arguments.insert("content".to_string(), "audit line".to_string());
    let batch = leader
        .run_operation(
            &solution,
            &SolutionOperation::Execute {
                identifier: "append".to_string(),
                arguments,
            },
            &cache,
        )
        .unwrap();
    assert_eq!(batch[0].kind, ResponseKind::Success);

    // uninstall removes marker and home but keeps the configuration file
    let batch = leader
        .run_operation(&solution, &SolutionOperation::Uninstall, &cache)
        .unwrap();
    assert_eq!(batch[0].kind, ResponseKind::Success);
    assert!(host
        .operations()
        .contains(&"rm -rf /tmp/sls_filemark".to_string()));
    assert!(cache.exists(&identity, "filemark"));
}

#[test]
fn mixed_fleet_reports_per_host_outcomes() {
    let solution = catalog::filemark().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let cache = ConfigurationCache::new(dir.path());

    let mut leader = Leader::new();
    leader.attach_transport(HostIdentity::new("op@edge-01:22"), scripted_installed_host());
    leader.attach_transport(
        HostIdentity::new("op@edge-02:22"),
        Arc::new(ScriptedHost::unreachable()),
    );

    // init succeeds everywhere; it never touches the hosts
    let batch = leader
        .run_operation(&solution, &SolutionOperation::Init, &cache)
        .unwrap();
    assert!(batch.iter().all(|r| r.kind == ResponseKind::Success));

    // the unreachable host turns into an error result, not a batch failure
    let batch = leader
        .run_operation(
            &solution,
            &SolutionOperation::Test { identifier: None },
            &cache,
        )
        .unwrap();
    assert_eq!(batch.len(), 2);

    let reachable = batch.iter().find(|r| r.host_id == "op@edge-01:22").unwrap();
    assert_eq!(reachable.kind, ResponseKind::Success);
    let report = reachable.payload.as_ref().unwrap();
    assert_eq!(report["marker_present"], true);
    assert_eq!(report["sh_available"], true);

    let down = batch.iter().find(|r| r.host_id == "op@edge-02:22").unwrap();
    assert_eq!(down.kind, ResponseKind::Error);
    assert!(down.message.contains("unreachable"));
}

#[test]
fn unknown_action_never_contacts_the_host() {
    let solution = catalog::filemark().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let cache = ConfigurationCache::new(dir.path());

    let host = scripted_installed_host();
    let mut leader = Leader::new();
    leader.attach_transport(HostIdentity::new("op@edge-01:22"), host.clone());

    leader
        .run_operation(&solution, &SolutionOperation::Init, &cache)
        .unwrap();
    let queries_after_init = host.fact_queries().len();

    let batch = leader
        .run_operation(
            &solution,
            &SolutionOperation::Execute {
                identifier: "append_to_file".to_string(),
                arguments: BTreeMap::new(),
            },
            &cache,
        )
        .unwrap();
    assert_eq!(batch[0].kind, ResponseKind::Error);
    assert!(batch[0].message.contains("append_to_file"));
    assert_eq!(host.fact_queries().len(), queries_after_init);
    assert!(host.operations().is_empty());
}
