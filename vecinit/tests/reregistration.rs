//! Unregistering only affects connections opened afterwards, and the
//! extension can be registered again. Runs in its own process because it
//! mutates the process-wide registration.

use rusqlite::Connection;
use vecinit::error::ProbeError;
use vecinit::probe;
use vecinit::{Registration, Status};

#[test]
fn unregister_then_register_again() {
    // With `auto-register` the constructor already ran.
    vecinit::register().unwrap();
    let before = Connection::open_in_memory().unwrap();
    assert!(probe::is_loaded(&before));

    assert!(vecinit::unregister());
    assert_eq!(vecinit::status(), Status::Unregistered);
    assert!(!vecinit::unregister());

    let without = Connection::open_in_memory().unwrap();
    assert!(matches!(
        probe::probe(&without),
        Err(ProbeError::ExtensionMissing(_))
    ));
    // Already-open connections keep the extension.
    assert!(probe::is_loaded(&before));

    assert_eq!(vecinit::register(), Ok(Registration::Registered));
    let after = Connection::open_in_memory().unwrap();
    assert!(probe::is_loaded(&after));
}
