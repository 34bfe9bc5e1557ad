//! Raw FFI declarations for the host loader and the `sqlite-vec` entry point.
//!
//! This is the **only** module in the crate that contains `unsafe` code or C
//! types. Everything it exposes to the rest of the crate is safe.
//!
//! Exactly one host block is compiled in, selected by the `standard` or
//! `vendored` feature:
//!
//! * **standard**: `sqlite3_auto_extension` and friends from the `SQLite`
//!   bundled by `rusqlite`.
//! * **vendored**: the framework's renamed `exsqlite3_*` symbols, declared
//!   here with their C signatures instead of going through the framework's
//!   headers. They are left unresolved and bound when the host application
//!   links against its vendored `SQLite`.

use std::os::raw::{c_char, c_int};

use crate::registrar::AutoExtensionLoader;

#[cfg(feature = "standard")]
use rusqlite::ffi::{sqlite3, sqlite3_api_routines};

/// Opaque vendored `sqlite3` connection handle.
#[cfg(not(feature = "standard"))]
#[allow(non_camel_case_types)]
#[repr(C)]
pub struct sqlite3 {
    _private: [u8; 0],
}

/// Opaque vendored `sqlite3_api_routines` table.
#[cfg(not(feature = "standard"))]
#[allow(non_camel_case_types)]
#[repr(C)]
pub struct sqlite3_api_routines {
    _private: [u8; 0],
}

/// Signature of `sqlite3_vec_init`.
pub type VecEntryPoint = unsafe extern "C" fn(
    db: *mut sqlite3,
    pz_err_msg: *mut *mut c_char,
    p_api: *const sqlite3_api_routines,
) -> c_int;

/// `SQLITE_OK`.
const SQLITE_OK: c_int = 0;

/// Returns the `sqlite-vec` entry point with its real signature.
///
/// The `sqlite-vec` crate declares `sqlite3_vec_init` without parameters; the
/// compiled symbol takes the connection, error slot and API table.
fn vec_entry_point() -> VecEntryPoint {
    // SAFETY: `sqlite3_vec_init` is defined in the `sqlite_vec0` static
    // library with exactly the `VecEntryPoint` signature.
    unsafe {
        std::mem::transmute::<*const (), VecEntryPoint>(sqlite_vec::sqlite3_vec_init as *const ())
    }
}

#[cfg(feature = "standard")]
mod host {
    use std::os::raw::c_int;

    use super::VecEntryPoint;

    pub fn auto_extension(entry: VecEntryPoint) -> c_int {
        // SAFETY: `entry` is a valid extension entry point for the lifetime of
        // the process (it lives in a statically linked library).
        unsafe { rusqlite::ffi::sqlite3_auto_extension(Some(entry)) }
    }

    pub fn cancel_auto_extension(entry: VecEntryPoint) -> c_int {
        // SAFETY: see `auto_extension`.
        unsafe { rusqlite::ffi::sqlite3_cancel_auto_extension(Some(entry)) }
    }
}

#[cfg(not(feature = "standard"))]
mod host {
    use std::os::raw::c_int;

    use super::VecEntryPoint;

    /// The C API declares the entry point as `void (*)(void)`.
    type AutoExtensionEntry = unsafe extern "C" fn();

    extern "C" {
        #[link_name = "exsqlite3_auto_extension"]
        fn vendored_auto_extension(x_entry_point: Option<AutoExtensionEntry>) -> c_int;

        #[link_name = "exsqlite3_cancel_auto_extension"]
        fn vendored_cancel_auto_extension(x_entry_point: Option<AutoExtensionEntry>) -> c_int;
    }

    const fn erase(entry: VecEntryPoint) -> AutoExtensionEntry {
        // SAFETY: function pointers share one representation; `SQLite` casts
        // the pointer back to the extension signature before calling it.
        unsafe { std::mem::transmute::<VecEntryPoint, AutoExtensionEntry>(entry) }
    }

    pub fn auto_extension(entry: VecEntryPoint) -> c_int {
        // SAFETY: the host application links its vendored `SQLite`, which
        // defines this symbol with the declared signature.
        unsafe { vendored_auto_extension(Some(erase(entry))) }
    }

    pub fn cancel_auto_extension(entry: VecEntryPoint) -> c_int {
        // SAFETY: see `auto_extension`.
        unsafe { vendored_cancel_auto_extension(Some(erase(entry))) }
    }
}

/// Auto-extension loader of the host `SQLite` selected at build time.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostLoader;

impl AutoExtensionLoader for HostLoader {
    fn symbol(&self) -> &'static str {
        crate::HostVariant::ACTIVE.symbol()
    }

    fn register(&self) -> i32 {
        host::auto_extension(vec_entry_point())
    }

    fn cancel(&self) -> bool {
        host::cancel_auto_extension(vec_entry_point()) == 1
    }
}

/// Registers `sqlite-vec` with the host `SQLite` from C.
///
/// For hosts that strip the load-time constructor out of the static archive.
/// Returns `SQLITE_OK` on success or when already registered, otherwise the
/// loader's failure code.
#[no_mangle]
pub extern "C" fn vecinit_register() -> c_int {
    match crate::register() {
        Ok(_) => SQLITE_OK,
        Err(err) => err.code.0,
    }
}
