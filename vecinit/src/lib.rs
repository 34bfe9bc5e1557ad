//! Load-time registration of the `sqlite-vec` extension.
//!
//! Linking this crate into a process makes every `SQLite` connection opened
//! afterwards load `sqlite-vec` automatically. The host `SQLite` is chosen at
//! compile time:
//!
//! * **`standard`** (default): the bundled `SQLite` shipped by `rusqlite`,
//!   registered through `sqlite3_auto_extension`. Registration is silent.
//! * **`vendored`**: a framework-vendored `SQLite` whose public symbols are
//!   renamed to `exsqlite3_*`. Nothing is linked here; the host application
//!   provides the symbols. Registration progress is written to stderr.
//!
//! With the `auto-register` feature a constructor performs the registration
//! before `main`. Hosts whose linker drops the constructor from a static
//! archive can call [`register`] (or the C entry `vecinit_register`) instead.
//!
//! The `ffi` module is the **only** file that contains `unsafe` code or C
//! types.

#[cfg(all(feature = "standard", feature = "vendored"))]
compile_error!("features `standard` and `vendored` are mutually exclusive");

#[cfg(not(any(feature = "standard", feature = "vendored")))]
compile_error!("enable exactly one host feature: `standard` or `vendored`");

mod ffi;

#[cfg(all(feature = "auto-register", not(target_arch = "wasm32")))]
mod autoinit;

pub mod error;
pub mod host;
pub mod logger;
pub mod registrar;

#[cfg(feature = "standard")]
pub mod probe;

pub use error::{RegistrationError, ResultCode};
pub use ffi::HostLoader;
pub use host::{HostVariant, Reporting};
pub use registrar::{
    AutoExtensionLoader, Event, EventSink, Registrar, Registration, Status, StderrSink,
};

/// The process-wide registrar bound to the host selected at build time.
static HOST_REGISTRAR: Registrar<HostLoader> =
    Registrar::new(HostLoader, HostVariant::ACTIVE.reporting());

/// Registers `sqlite-vec` as an auto-extension of the host `SQLite`.
///
/// Safe to call any number of times: once registered, later calls return
/// [`Registration::AlreadyRegistered`] without touching the host. A failed
/// registration is not retried; the same error is returned again.
///
/// # Errors
///
/// Returns a [`RegistrationError`] carrying the host's result code when the
/// loader rejects the entry point (e.g. `SQLITE_NOMEM`).
pub fn register() -> Result<Registration, RegistrationError> {
    HOST_REGISTRAR.register()
}

/// Removes `sqlite-vec` from the host's auto-extension list.
///
/// Connections that are already open keep the extension. Returns `true` if a
/// registration was removed.
pub fn unregister() -> bool {
    HOST_REGISTRAR.unregister()
}

/// Returns the current registration status of this process.
#[must_use]
pub fn status() -> Status {
    HOST_REGISTRAR.status()
}

/// Returns the host `SQLite` variant this build targets.
#[must_use]
pub const fn host_variant() -> HostVariant {
    HostVariant::ACTIVE
}
