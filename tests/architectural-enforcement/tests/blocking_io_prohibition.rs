//! Integration Test: Blocking I/O Prohibition
//!
//! **Policy**: async functions in the core, CLI and TUI must not block the runtime.
//! **Required**: `tokio::fs`, `tokio::io::stdin()`, async `reqwest`.
//!
//! Blocking calls are acceptable in plain functions that run before the event
//! loop (config loading, log file setup, terminal setup) and in test code.

use architectural_enforcement::{blocking_io_violations, production_files, scan_production};

#[test]
fn test_no_blocking_io_in_async_code() {
    let violations = scan_production(blocking_io_violations);

    if !violations.is_empty() {
        eprintln!("\n❌ Blocking I/O found inside async functions:\n");
        for violation in &violations {
            eprintln!("  ❌ {violation}");
        }
        eprintln!("\n✅ Use instead:");
        eprintln!("  - tokio::fs::read().await");
        eprintln!("  - tokio::io::stdin() / tokio::io::stdout()");
        eprintln!("  - reqwest::Client");
        eprintln!("  - or move the call into a plain fn run before the runtime work");

        panic!("\nFound {} blocking I/O violation(s).", violations.len());
    }
}

#[test]
fn test_production_sources_found() {
    let files = production_files();
    assert!(
        files.iter().any(|p| p.ends_with("chat/core/src/lib.rs")),
        "scanner did not find the core crate"
    );
    assert!(files.iter().any(|p| p.ends_with("tui/src/app.rs")));
}
