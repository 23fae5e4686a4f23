//! End-to-end attribution through a three-layer adapter chain.
//!
//! `adapter_a` calls `adapter_b`, which calls `adapter_c`, which logs. With
//! all three registered the record must name the line in this file that
//! called `adapter_a`.

mod adapter_a;
mod adapter_b;
mod adapter_c;

use std::fs;
use std::sync::Arc;

use sitelog::{
    InternalPackages, Logger, MAX_CALLER_DEPTH, MemorySink, ResolveMode, RecordSink, WriterSink,
};
use tempfile::tempdir;

const ADAPTERS: [&str; 3] = [
    "wrapper_chain::adapter_a",
    "wrapper_chain::adapter_b",
    "wrapper_chain::adapter_c",
];

/// Default registry, optionally extended with the adapters.
fn packages(with_adapters: bool) -> Arc<InternalPackages> {
    let packages = Arc::new(InternalPackages::with_defaults());
    if with_adapters {
        packages.register(ADAPTERS);
    }
    packages
}

fn memory_logger(with_adapters: bool) -> (Logger, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let logger = Logger::builder()
        .shared_sink(sink.clone())
        .packages(packages(with_adapters))
        .mode(ResolveMode::Standard)
        .build();
    (logger, sink)
}

// ============================================================================
// Attribution
// ============================================================================

/// Verifies the chain reports this file and the calling line.
#[test]
fn registered_chain_reports_application_call_site() {
    let (logger, sink) = memory_logger(true);

    let line = line!() + 1;
    adapter_a::audit(&logger, "alice", "login");

    let records = sink.take();
    assert_eq!(records.len(), 1);
    let caller = records[0].caller.as_ref().expect("caller resolved");
    assert_eq!(caller.basename(), "main.rs");
    assert_eq!(caller.line, line);
    assert!(caller.file.contains("wrapper_chain"));
    assert_eq!(records[0].message, "login");
    assert!(records[0].field("user").is_some());
    assert!(records[0].field("component").is_some());
}

/// Verifies the unregistered chain reports the innermost adapter instead.
#[test]
fn unregistered_chain_reports_innermost_adapter() {
    let (logger, sink) = memory_logger(false);

    adapter_a::audit(&logger, "bob", "logout");

    let records = sink.take();
    let caller = records[0].caller.as_ref().expect("caller resolved");
    assert_eq!(caller.basename(), "adapter_c.rs");
}

/// Verifies the shipped defaults alone stop at the adapters, and registering
/// them moves attribution to this file.
#[test]
fn default_registry_attribution_follows_adapter_registration() {
    let packages = Arc::new(InternalPackages::with_defaults());
    let sink = Arc::new(MemorySink::new());
    let logger = Logger::builder()
        .shared_sink(sink.clone())
        .packages(Arc::clone(&packages))
        .mode(ResolveMode::Standard)
        .build();

    adapter_a::audit(&logger, "erin", "rotate");
    packages.register(ADAPTERS);
    let line = line!() + 1;
    adapter_a::audit(&logger, "erin", "rotate");

    let callers: Vec<_> = sink
        .take()
        .into_iter()
        .map(|record| record.caller.expect("caller resolved"))
        .collect();
    assert_eq!(callers.len(), 2);
    assert_eq!(callers[0].basename(), "adapter_c.rs");
    assert_eq!(callers[1].basename(), "main.rs");
    assert_eq!(callers[1].line, line);
}

/// Verifies registration made after the logger exists is honored.
#[test]
fn late_registration_changes_attribution() {
    let registry = packages(false);
    let sink = Arc::new(MemorySink::new());
    let logger = Logger::builder()
        .shared_sink(sink.clone())
        .packages(Arc::clone(&registry))
        .build();

    adapter_a::audit(&logger, "carol", "first");
    registry.register(ADAPTERS);
    adapter_a::audit(&logger, "carol", "second");

    let records = sink.take();
    assert_eq!(records[0].caller.as_ref().map(sitelog::Frame::basename), Some("adapter_c.rs"));
    assert_eq!(records[1].caller.as_ref().map(sitelog::Frame::basename), Some("main.rs"));
}

/// Verifies the text sink prints the application location.
#[test]
fn text_output_names_application_location() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("audit.log");
    let sink = Arc::new(WriterSink::new(fs::File::create(&path).expect("create log")));
    let logger = Logger::builder()
        .shared_sink(sink.clone())
        .packages(packages(true))
        .build();

    let line = line!() + 1;
    adapter_a::audit(&logger, "dave", "export");
    sink.flush().expect("flush");

    let contents = fs::read_to_string(&path).expect("read log");
    assert!(
        contents.starts_with(&format!("WARN  [main.rs:{line}] export user=dave component=audit")),
        "unexpected output: {contents}"
    );
}

// ============================================================================
// Depth Bound
// ============================================================================

/// Verifies a chain deeper than the bound emits without caller metadata.
#[test]
fn chain_deeper_than_bound_emits_without_caller() {
    let (logger, sink) = memory_logger(true);

    adapter_a::nested(&logger, MAX_CALLER_DEPTH);

    let records = sink.take();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].message, "deep");
    assert!(!records[0].caller_defined());
}
