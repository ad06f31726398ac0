#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::wildcard_imports,
    clippy::indexing_slicing
)]
//! End-to-end provisioning against real child processes.
//!
//! Only POSIX `sh` and `echo` are used, so these run on any Unix host.
#![cfg(unix)]

mod common;

use std::sync::Arc;

use jumpstart::confirm::FixedAnswer;
use jumpstart::exec::{OutputStream, SystemExecutor};
use jumpstart::tasks::ProgressEvent;

const TOOLS: &str = r#"
[[tools]]
name = "sh"
cmd = "echo should-not-run"

[[tools]]
name = "jumpstart-missing-tool-a"
cmd = "echo installing a; exit 7"

[[tools]]
name = "jumpstart-missing-tool-b"
cmd = "echo installing b"
"#;

#[test]
fn tools_stream_output_and_exit_codes_in_order() {
    let ctx = common::TestContextBuilder::new().with_toml(TOOLS).build();
    let session = ctx.open(Arc::new(SystemExecutor::new()));

    let events: Vec<ProgressEvent> = session
        .invoke("ti", &FixedAnswer(true))
        .unwrap()
        .into_run()
        .unwrap()
        .collect();

    assert_eq!(
        events[0],
        ProgressEvent::AlreadyPresent {
            item: "sh".to_string()
        }
    );

    let stdout: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            ProgressEvent::Output(line) if line.stream == OutputStream::Stdout => {
                Some(line.text.as_str())
            }
            _ => None,
        })
        .collect();
    assert_eq!(stdout, ["installing a", "installing b"]);

    let finished: Vec<(&str, Option<i32>)> = events
        .iter()
        .filter_map(|e| match e {
            ProgressEvent::Finished { item, code } => Some((item.as_str(), *code)),
            _ => None,
        })
        .collect();
    assert_eq!(
        finished,
        [
            ("jumpstart-missing-tool-a", Some(7)),
            ("jumpstart-missing-tool-b", Some(0)),
        ]
    );

    assert!(
        matches!(
            events.last(),
            Some(ProgressEvent::Summary { stats, .. })
                if stats.ran == 2 && stats.already_present == 1 && stats.non_zero == 1
        ),
        "got: {events:?}"
    );
}

#[test]
fn dry_run_reports_plans_without_running_them() {
    let ctx = common::TestContextBuilder::new().with_toml(TOOLS).build();
    let session = ctx
        .open(Arc::new(SystemExecutor::new()))
        .with_dry_run(true);

    let events: Vec<ProgressEvent> = session
        .invoke("ti", &FixedAnswer(true))
        .unwrap()
        .into_run()
        .unwrap()
        .collect();

    let would_run = events
        .iter()
        .filter(|e| matches!(e, ProgressEvent::WouldRun { .. }))
        .count();
    assert_eq!(would_run, 2);
    assert!(!events.iter().any(|e| matches!(e, ProgressEvent::Output(_))));
}

/// Processes whose command line contains `needle`.
#[cfg(target_os = "linux")]
fn processes_matching(needle: &str) -> Vec<String> {
    std::fs::read_dir("/proc")
        .unwrap()
        .flatten()
        .filter_map(|entry| {
            let raw = std::fs::read(entry.path().join("cmdline")).ok()?;
            let cmdline = String::from_utf8_lossy(&raw).replace('\0', " ");
            cmdline.contains(needle).then_some(cmdline)
        })
        .collect()
}

#[cfg(target_os = "linux")]
#[test]
fn abandoning_a_run_stops_the_tool_pipeline() {
    let ctx = common::TestContextBuilder::new()
        .with_toml(
            r#"
[[tools]]
name = "jumpstart-missing-tool-pipe"
cmd = "echo fetching; sleep 47.125 | cat"
"#,
        )
        .build();
    let session = ctx.open(Arc::new(SystemExecutor::new()));
    let mut run = session
        .invoke("ti", &FixedAnswer(true))
        .unwrap()
        .into_run()
        .unwrap();

    let first_output = run.by_ref().find(|e| matches!(e, ProgressEvent::Output(_)));
    assert!(first_output.is_some());
    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
    while processes_matching("sleep 47.125").is_empty() && std::time::Instant::now() < deadline {
        std::thread::sleep(std::time::Duration::from_millis(20));
    }
    assert!(!processes_matching("sleep 47.125").is_empty(), "pipeline never started");

    drop(run);

    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
    while !processes_matching("sleep 47.125").is_empty() && std::time::Instant::now() < deadline {
        std::thread::sleep(std::time::Duration::from_millis(20));
    }
    assert_eq!(processes_matching("sleep 47.125"), Vec::<String>::new());
}
