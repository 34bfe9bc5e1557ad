//! One-shot, best-effort registration of the extension entry point.
//!
//! A [`Registrar`] wraps an [`AutoExtensionLoader`] and guarantees the loader
//! is asked at most once per successful registration:
//!
//! | state          | `register()`                                   |
//! |----------------|------------------------------------------------|
//! | `Unregistered` | calls the loader, moves to `Registered`/`Failed` |
//! | `Registered`   | no-op, [`Registration::AlreadyRegistered`]      |
//! | `Failed`       | no retry, returns the stored error               |
//!
//! Every transition is reported as an [`Event`] through the `log` facade and,
//! with [`Reporting::Stderr`], as one line written to an [`EventSink`]
//! (stderr unless another sink is given).

use std::fmt;
use std::io::Write;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{RegistrationError, ResultCode};
use crate::host::Reporting;

/// The host's auto-extension list, as seen by the registrar.
pub trait AutoExtensionLoader: Sync {
    /// Name of the loader symbol, used in diagnostics.
    fn symbol(&self) -> &'static str;

    /// Adds the extension entry point; returns the host's result code.
    fn register(&self) -> i32;

    /// Removes the extension entry point; returns `true` if it was present.
    fn cancel(&self) -> bool;
}

/// Successful outcome of [`Registrar::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// The entry point was added to the host's auto-extension list.
    Registered,
    /// An earlier call already registered the entry point.
    AlreadyRegistered,
}

/// Registration status of a [`Registrar`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// No registration has been attempted (or it was undone).
    Unregistered,
    /// The entry point is in the host's auto-extension list.
    Registered,
    /// The host rejected the entry point with this code.
    Failed(ResultCode),
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unregistered => f.write_str("unregistered"),
            Self::Registered => f.write_str("registered"),
            Self::Failed(code) => write!(f, "failed with code {code}"),
        }
    }
}

/// A registration progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The loader is about to be called.
    Starting {
        /// Loader symbol.
        symbol: &'static str,
    },
    /// The loader accepted the entry point.
    Registered,
    /// The loader rejected the entry point.
    Failed {
        /// Status returned by the loader.
        code: ResultCode,
    },
    /// The entry point was removed from the host's list.
    Cancelled,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Starting { symbol } => {
                write!(f, "[sqlite-vec] registering auto-extension via {symbol}")
            }
            Self::Registered => f.write_str("[sqlite-vec] auto-extension registered"),
            Self::Failed { code } => write!(
                f,
                "[sqlite-vec] auto-extension registration failed with code {code}"
            ),
            Self::Cancelled => f.write_str("[sqlite-vec] auto-extension cancelled"),
        }
    }
}

/// Destination of the diagnostic lines emitted under [`Reporting::Stderr`].
pub trait EventSink: Sync {
    /// Writes one event as a single line. Write failures are ignored.
    fn emit(&self, event: &Event);
}

/// Writes events to the process's stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrSink;

impl EventSink for StderrSink {
    fn emit(&self, event: &Event) {
        let _ = writeln!(std::io::stderr().lock(), "{event}");
    }
}

impl<S: EventSink + ?Sized> EventSink for &S {
    fn emit(&self, event: &Event) {
        (**self).emit(event);
    }
}

impl<W: Write + Send> EventSink for Mutex<W> {
    fn emit(&self, event: &Event) {
        let mut writer = self.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = writeln!(writer, "{event}");
    }
}

/// Registers an extension entry point with a host loader at most once.
pub struct Registrar<L, S = StderrSink> {
    loader: L,
    reporting: Reporting,
    sink: S,
    state: Mutex<Status>,
}

impl<L: AutoExtensionLoader> Registrar<L> {
    /// Creates a registrar in the `Unregistered` state reporting to stderr.
    pub const fn new(loader: L, reporting: Reporting) -> Self {
        Self::with_sink(loader, reporting, StderrSink)
    }
}

impl<L: AutoExtensionLoader, S: EventSink> Registrar<L, S> {
    /// Creates a registrar in the `Unregistered` state reporting to `sink`.
    pub const fn with_sink(loader: L, reporting: Reporting, sink: S) -> Self {
        Self {
            loader,
            reporting,
            sink,
            state: Mutex::new(Status::Unregistered),
        }
    }

    /// Registers the entry point unless that already happened or failed.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistrationError`] if the loader rejects the entry point,
    /// now or in an earlier call.
    pub fn register(&self) -> Result<Registration, RegistrationError> {
        let symbol = self.loader.symbol();
        let mut state = self.lock();
        let code = match *state {
            Status::Registered => return Ok(Registration::AlreadyRegistered),
            Status::Failed(code) => return Err(RegistrationError::new(symbol, code.0)),
            Status::Unregistered => {
                self.report(Event::Starting { symbol });
                ResultCode(self.loader.register())
            }
        };
        *state = if code.is_ok() {
            Status::Registered
        } else {
            Status::Failed(code)
        };
        drop(state);

        if code.is_ok() {
            self.report(Event::Registered);
            Ok(Registration::Registered)
        } else {
            self.report(Event::Failed { code });
            Err(RegistrationError::new(symbol, code.0))
        }
    }

    /// Removes a successful registration.
    ///
    /// Returns `true` if the entry point was removed. A failed registration is
    /// left as is, so it is still not retried.
    pub fn unregister(&self) -> bool {
        let mut state = self.lock();
        if *state != Status::Registered {
            return false;
        }
        let removed = self.loader.cancel();
        *state = Status::Unregistered;
        drop(state);

        if removed {
            self.report(Event::Cancelled);
        } else {
            log::warn!("{} did not find the sqlite-vec entry point", self.loader.symbol());
        }
        removed
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> Status {
        *self.lock()
    }

    fn lock(&self) -> MutexGuard<'_, Status> {
        // The guarded value is a plain enum that is never left half-written.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn report(&self, event: Event) {
        match event {
            Event::Failed { .. } => log::error!("{event}"),
            _ => log::info!("{event}"),
        }
        if self.reporting == Reporting::Stderr {
            self.sink.emit(&event);
        }
    }
}

impl<L, S> fmt::Debug for Registrar<L, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registrar")
            .field("reporting", &self.reporting)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};

    use super::*;

    /// Loader that records calls and returns a configurable status.
    struct FakeLoader {
        rc: AtomicI32,
        registered: AtomicUsize,
        cancelled: AtomicUsize,
    }

    impl FakeLoader {
        const fn returning(rc: i32) -> Self {
            Self {
                rc: AtomicI32::new(rc),
                registered: AtomicUsize::new(0),
                cancelled: AtomicUsize::new(0),
            }
        }
    }

    impl AutoExtensionLoader for FakeLoader {
        fn symbol(&self) -> &'static str {
            "exsqlite3_auto_extension"
        }

        fn register(&self) -> i32 {
            self.registered.fetch_add(1, Ordering::SeqCst);
            self.rc.load(Ordering::SeqCst)
        }

        fn cancel(&self) -> bool {
            self.cancelled.fetch_add(1, Ordering::SeqCst);
            true
        }
    }

    #[test]
    fn second_register_is_a_no_op() {
        let registrar = Registrar::new(FakeLoader::returning(0), Reporting::Silent);
        assert_eq!(registrar.status(), Status::Unregistered);

        assert_eq!(registrar.register(), Ok(Registration::Registered));
        assert_eq!(registrar.register(), Ok(Registration::AlreadyRegistered));
        assert_eq!(registrar.status(), Status::Registered);
        assert_eq!(registrar.loader.registered.load(Ordering::SeqCst), 1);
    }

    fn captured(sink: &Mutex<Vec<u8>>) -> String {
        String::from_utf8(sink.lock().unwrap().clone()).unwrap()
    }

    #[test]
    fn failure_is_reported_and_not_retried() {
        // SQLITE_NOMEM, what the host returns when it cannot grow its list.
        let registrar = Registrar::with_sink(
            FakeLoader::returning(7),
            Reporting::Stderr,
            Mutex::new(Vec::new()),
        );

        let err = registrar.register().unwrap_err();
        assert_eq!(err.code, ResultCode(7));
        assert_eq!(err.symbol, "exsqlite3_auto_extension");
        assert_eq!(registrar.status(), Status::Failed(ResultCode(7)));
        assert_eq!(
            captured(&registrar.sink),
            "[sqlite-vec] registering auto-extension via exsqlite3_auto_extension\n\
             [sqlite-vec] auto-extension registration failed with code 7 (SQLITE_NOMEM)\n"
        );

        // Even if the host would now accept it, the failure sticks.
        registrar.loader.rc.store(0, Ordering::SeqCst);
        assert_eq!(registrar.register().unwrap_err(), err);
        assert_eq!(registrar.loader.registered.load(Ordering::SeqCst), 1);
        // The repeated call is not reported again.
        assert_eq!(captured(&registrar.sink).lines().count(), 2);
    }

    #[test]
    fn success_is_reported_to_the_sink() {
        let registrar = Registrar::with_sink(
            FakeLoader::returning(0),
            Reporting::Stderr,
            Mutex::new(Vec::new()),
        );
        registrar.register().unwrap();
        registrar.unregister();
        assert_eq!(
            captured(&registrar.sink),
            "[sqlite-vec] registering auto-extension via exsqlite3_auto_extension\n\
             [sqlite-vec] auto-extension registered\n\
             [sqlite-vec] auto-extension cancelled\n"
        );
    }

    #[test]
    fn silent_reporting_writes_nothing() {
        let registrar = Registrar::with_sink(
            FakeLoader::returning(7),
            Reporting::Silent,
            Mutex::new(Vec::new()),
        );
        registrar.register().unwrap_err();
        assert!(captured(&registrar.sink).is_empty());
    }

    #[test]
    fn unregister_allows_registering_again() {
        let registrar = Registrar::new(FakeLoader::returning(0), Reporting::Silent);
        assert!(!registrar.unregister());

        registrar.register().unwrap();
        assert!(registrar.unregister());
        assert_eq!(registrar.status(), Status::Unregistered);
        assert_eq!(registrar.loader.cancelled.load(Ordering::SeqCst), 1);

        assert_eq!(registrar.register(), Ok(Registration::Registered));
        assert_eq!(registrar.loader.registered.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unregister_keeps_failed_state() {
        let registrar = Registrar::new(FakeLoader::returning(1), Reporting::Silent);
        registrar.register().unwrap_err();
        assert!(!registrar.unregister());
        assert_eq!(registrar.status(), Status::Failed(ResultCode(1)));
        assert_eq!(registrar.loader.cancelled.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn concurrent_registration_calls_loader_once() {
        let registrar = Registrar::new(FakeLoader::returning(0), Reporting::Silent);
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| registrar.register().unwrap());
            }
        });
        assert_eq!(registrar.loader.registered.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn event_lines() {
        assert_eq!(
            Event::Starting {
                symbol: "exsqlite3_auto_extension"
            }
            .to_string(),
            "[sqlite-vec] registering auto-extension via exsqlite3_auto_extension"
        );
        assert_eq!(
            Event::Registered.to_string(),
            "[sqlite-vec] auto-extension registered"
        );
        assert_eq!(
            Event::Failed {
                code: ResultCode(7)
            }
            .to_string(),
            "[sqlite-vec] auto-extension registration failed with code 7 (SQLITE_NOMEM)"
        );
    }

    #[test]
    fn status_display() {
        assert_eq!(Status::Registered.to_string(), "registered");
        assert_eq!(
            Status::Failed(ResultCode(21)).to_string(),
            "failed with code 21 (SQLITE_MISUSE)"
        );
    }
}
