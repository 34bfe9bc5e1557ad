//! Build-time selection of the host `SQLite` distribution.

use std::fmt;
use std::str::FromStr;

/// The `SQLite` distribution the extension is registered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostVariant {
    /// Upstream `SQLite` with its standard `sqlite3_*` symbols.
    Standard,
    /// A framework-vendored `SQLite` whose symbols carry the `exsqlite3_`
    /// prefix to avoid clashing with the platform's system copy.
    Vendored,
}

/// How registration events are surfaced besides the `log` facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reporting {
    /// Only the `log` facade receives events.
    Silent,
    /// Events are also written to stderr, one line each.
    Stderr,
}

impl HostVariant {
    /// The variant selected by the enabled Cargo feature.
    #[cfg(feature = "standard")]
    pub const ACTIVE: Self = Self::Standard;

    /// The variant selected by the enabled Cargo feature.
    #[cfg(all(feature = "vendored", not(feature = "standard")))]
    pub const ACTIVE: Self = Self::Vendored;

    /// Symbol prefix of the host's public API.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Standard => "sqlite3_",
            Self::Vendored => "exsqlite3_",
        }
    }

    /// Name of the auto-extension registration symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Standard => "sqlite3_auto_extension",
            Self::Vendored => "exsqlite3_auto_extension",
        }
    }

    /// Name of the auto-extension removal symbol.
    #[must_use]
    pub const fn cancel_symbol(self) -> &'static str {
        match self {
            Self::Standard => "sqlite3_cancel_auto_extension",
            Self::Vendored => "exsqlite3_cancel_auto_extension",
        }
    }

    /// Diagnostics policy for this host.
    ///
    /// The vendored build runs inside mobile apps where stderr is the only
    /// channel available before the app installs a logger.
    #[must_use]
    pub const fn reporting(self) -> Reporting {
        match self {
            Self::Standard => Reporting::Silent,
            Self::Vendored => Reporting::Stderr,
        }
    }
}

impl fmt::Display for HostVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => f.write_str("standard"),
            Self::Vendored => f.write_str("vendored"),
        }
    }
}

/// Error returned when parsing an unknown host variant name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown host variant `{0}` (expected `standard` or `vendored`)")]
pub struct UnknownHostVariant(pub String);

impl FromStr for HostVariant {
    type Err = UnknownHostVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(Self::Standard),
            "vendored" => Ok(Self::Vendored),
            other => Err(UnknownHostVariant(other.to_string())),
        }
    }
}
