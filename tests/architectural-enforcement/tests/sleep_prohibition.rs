//! Integration Test: Sleep Prohibition
//!
//! **Policy**: production code waits on I/O, never on timers.
//! The TUI frame cadence uses `tokio::time::interval`, which is not a sleep.

use architectural_enforcement::{scan_production, sleep_violations};

#[test]
fn test_no_sleep_in_production_code() {
    let violations = scan_production(sleep_violations);

    if !violations.is_empty() {
        eprintln!("\n❌ Sleep calls found in production code:\n");
        for violation in &violations {
            eprintln!("  ❌ {violation}");
        }
        eprintln!("\n✅ Wait on the stream receiver or a tokio::time::interval instead.");

        panic!("\nFound {} sleep violation(s).", violations.len());
    }
}
