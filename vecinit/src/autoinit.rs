//! Load-time hook.
//!
//! Runs before `main` (or when the dynamic library is loaded) so that the
//! first connection the host opens already has `sqlite-vec`. The outcome has
//! been reported by the registrar and stays queryable via [`crate::status`].

#[ctor::ctor]
fn register_sqlite_vec() {
    let _ = crate::register();
}
