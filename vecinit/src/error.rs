//! Error types for registration and extension probing.

use std::fmt;

use thiserror::Error;

/// Result code returned by a `SQLite` API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResultCode(pub i32);

impl ResultCode {
    /// `SQLITE_OK`.
    pub const OK: Self = Self(0);

    /// Returns `true` for `SQLITE_OK`.
    #[must_use]
    pub const fn is_ok(self) -> bool {
        self.0 == Self::OK.0
    }

    /// Returns the `SQLITE_*` name of the primary result code, if known.
    ///
    /// Extended codes are reduced to their primary code (`rc & 0xff`).
    #[must_use]
    pub const fn name(self) -> Option<&'static str> {
        let name = match self.0 & 0xff {
            0 => "SQLITE_OK",
            1 => "SQLITE_ERROR",
            2 => "SQLITE_INTERNAL",
            3 => "SQLITE_PERM",
            4 => "SQLITE_ABORT",
            5 => "SQLITE_BUSY",
            6 => "SQLITE_LOCKED",
            7 => "SQLITE_NOMEM",
            8 => "SQLITE_READONLY",
            9 => "SQLITE_INTERRUPT",
            10 => "SQLITE_IOERR",
            11 => "SQLITE_CORRUPT",
            12 => "SQLITE_NOTFOUND",
            13 => "SQLITE_FULL",
            14 => "SQLITE_CANTOPEN",
            15 => "SQLITE_PROTOCOL",
            16 => "SQLITE_EMPTY",
            17 => "SQLITE_SCHEMA",
            18 => "SQLITE_TOOBIG",
            19 => "SQLITE_CONSTRAINT",
            20 => "SQLITE_MISMATCH",
            21 => "SQLITE_MISUSE",
            22 => "SQLITE_NOLFS",
            23 => "SQLITE_AUTH",
            24 => "SQLITE_FORMAT",
            25 => "SQLITE_RANGE",
            26 => "SQLITE_NOTADB",
            27 => "SQLITE_NOTICE",
            28 => "SQLITE_WARNING",
            100 => "SQLITE_ROW",
            101 => "SQLITE_DONE",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} ({name})", self.0),
            None => write!(f, "{}", self.0),
        }
    }
}

/// The host loader rejected the `sqlite-vec` entry point.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{symbol} failed with code {code}")]
pub struct RegistrationError {
    /// Loader symbol that was called.
    pub symbol: &'static str,
    /// Status returned by the loader.
    pub code: ResultCode,
}

impl RegistrationError {
    /// Creates a new registration error.
    pub(crate) const fn new(symbol: &'static str, code: i32) -> Self {
        Self {
            symbol,
            code: ResultCode(code),
        }
    }
}

/// Errors raised while exercising the extension on a connection.
#[cfg(feature = "standard")]
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The connection does not have `sqlite-vec` loaded.
    #[error("sqlite-vec is not loaded on this connection: {0}")]
    ExtensionMissing(String),
    /// The two input vectors have different lengths.
    #[error("vector dimensions differ: {left} vs {right}")]
    DimensionMismatch {
        /// Length of the left operand.
        left: usize,
        /// Length of the right operand.
        right: usize,
    },
    /// An input vector has no elements.
    #[error("vectors must have at least one element")]
    EmptyVector,
    /// An input vector contains NaN or an infinity.
    #[error("{side} vector has a non-finite element at index {index}")]
    NonFinite {
        /// `"left"` or `"right"`.
        side: &'static str,
        /// Position of the first offending element.
        index: usize,
    },
    /// The distance is undefined for these inputs (`SQL NULL`), e.g. the
    /// cosine distance of a zero vector.
    #[error("{function} is undefined for these vectors")]
    UndefinedDistance {
        /// The SQL function that returned NULL.
        function: &'static str,
    },
    /// Any other `SQLite` failure.
    #[error(transparent)]
    Sqlite(rusqlite::Error),
}

#[cfg(feature = "standard")]
impl From<rusqlite::Error> for ProbeError {
    fn from(err: rusqlite::Error) -> Self {
        // Unknown functions surface at prepare time as `SqlInputError` (with
        // the bundled, modern SQLite) or as a plain `SqliteFailure`.
        let message = match &err {
            rusqlite::Error::SqlInputError { msg, .. }
            | rusqlite::Error::SqliteFailure(_, Some(msg)) => Some(msg),
            _ => None,
        };
        match message {
            Some(msg) if is_missing_extension(msg) => Self::ExtensionMissing(msg.clone()),
            _ => Self::Sqlite(err),
        }
    }
}

#[cfg(feature = "standard")]
fn is_missing_extension(message: &str) -> bool {
    message.starts_with("no such function") || message.starts_with("no such module")
}
