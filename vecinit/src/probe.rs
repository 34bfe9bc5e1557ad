//! Checks that `sqlite-vec` is usable on a connection.
//!
//! Used by integration tests and the CLI to confirm that registration
//! actually reached the connections the host opens.

use std::fmt;
use std::str::FromStr;

use rusqlite::Connection;

use crate::error::ProbeError;

/// Versions reported by a connection with `sqlite-vec` loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    /// Result of `sqlite_version()`.
    pub sqlite_version: String,
    /// Result of `vec_version()`, e.g. `v0.1.6`.
    pub vec_version: String,
}

/// Distance functions provided by `sqlite-vec` for float vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Metric {
    /// Euclidean distance.
    #[default]
    L2,
    /// Manhattan distance.
    L1,
    /// Cosine distance (`1 - cosine similarity`).
    Cosine,
}

impl Metric {
    /// The SQL function implementing this metric.
    #[must_use]
    pub const fn function(self) -> &'static str {
        match self {
            Self::L2 => "vec_distance_l2",
            Self::L1 => "vec_distance_l1",
            Self::Cosine => "vec_distance_cosine",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::L2 => "l2",
            Self::L1 => "l1",
            Self::Cosine => "cosine",
        })
    }
}

/// Error returned when parsing an unknown metric name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown metric `{0}` (expected `l2`, `l1` or `cosine`)")]
pub struct UnknownMetric(pub String);

impl FromStr for Metric {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "l2" => Ok(Self::L2),
            "l1" => Ok(Self::L1),
            "cosine" => Ok(Self::Cosine),
            _ => Err(UnknownMetric(s.to_string())),
        }
    }
}

/// Queries the `SQLite` and `sqlite-vec` versions.
///
/// # Errors
///
/// Returns [`ProbeError::ExtensionMissing`] if `sqlite-vec` is not loaded on
/// `conn`.
pub fn probe(conn: &Connection) -> Result<ProbeReport, ProbeError> {
    let (sqlite_version, vec_version) =
        conn.query_row("select sqlite_version(), vec_version()", [], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?;
    Ok(ProbeReport {
        sqlite_version,
        vec_version,
    })
}

/// Returns `true` if `sqlite-vec` functions resolve on `conn`.
#[must_use]
pub fn is_loaded(conn: &Connection) -> bool {
    conn.query_row("select vec_version()", [], |row| row.get::<_, String>(0))
        .is_ok()
}

/// Computes the distance between two float vectors with `sqlite-vec`.
///
/// The vectors are bound as little-endian `f32` blobs, the native vector
/// format of `sqlite-vec`.
///
/// # Errors
///
/// Returns [`ProbeError::EmptyVector`], [`ProbeError::DimensionMismatch`] or
/// [`ProbeError::NonFinite`] for invalid input,
/// [`ProbeError::UndefinedDistance`] when `sqlite-vec` yields NULL (cosine of
/// a zero vector), and [`ProbeError::ExtensionMissing`] if `sqlite-vec` is not
/// loaded on `conn`.
pub fn distance(
    conn: &Connection,
    metric: Metric,
    a: &[f32],
    b: &[f32],
) -> Result<f64, ProbeError> {
    if a.is_empty() || b.is_empty() {
        return Err(ProbeError::EmptyVector);
    }
    if a.len() != b.len() {
        return Err(ProbeError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    check_finite("left", a)?;
    check_finite("right", b)?;

    let sql = format!("select {}(?1, ?2)", metric.function());
    let value: Option<f64> =
        conn.query_row(&sql, [to_blob(a), to_blob(b)], |row| row.get(0))?;
    value.ok_or(ProbeError::UndefinedDistance {
        function: metric.function(),
    })
}

fn check_finite(side: &'static str, vector: &[f32]) -> Result<(), ProbeError> {
    match vector.iter().position(|x| !x.is_finite()) {
        Some(index) => Err(ProbeError::NonFinite { side, index }),
        None => Ok(()),
    }
}

fn to_blob(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|x| x.to_le_bytes()).collect()
}
