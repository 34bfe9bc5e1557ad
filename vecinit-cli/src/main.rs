//! `vecinit` developer CLI.
//!
//! The binary links `vecinit` with the load-time hook enabled, so by the time
//! `main` runs every connection it opens should already have `sqlite-vec`.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::{Parser, Subcommand};
use eyre::{bail, Result, WrapErr};
use rusqlite::Connection;
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use vecinit::probe::{self, Metric};
use vecinit::Status;

#[derive(Debug, Parser)]
#[command(name = "vecinit", version, about = "Inspect sqlite-vec auto-registration")]
struct Cli {
    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the host variant and the registration status of this process.
    Status,
    /// Open a database and report the SQLite and sqlite-vec versions.
    Probe {
        /// Database file to open. Defaults to an in-memory database.
        #[arg(long, env = "VECINIT_DB")]
        db: Option<PathBuf>,
    },
    /// Compute the distance between two vectors given as JSON arrays.
    Distance {
        /// Distance metric: l2, l1 or cosine.
        #[arg(long, default_value_t = Metric::L2)]
        metric: Metric,
        /// Left vector, e.g. `[1, 2]`.
        a: Vector,
        /// Right vector, e.g. `[4, 6]`.
        b: Vector,
    },
}

/// A float vector parsed from a JSON array.
#[derive(Debug, Clone, PartialEq)]
struct Vector(Vec<f32>);

impl FromStr for Vector {
    type Err = serde_json::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(s).map(Self)
    }
}

#[derive(Debug, Serialize)]
struct StatusOutput {
    host: String,
    symbol: &'static str,
    status: String,
}

#[derive(Debug, Serialize)]
struct ProbeOutput {
    database: String,
    sqlite_version: String,
    vec_version: String,
}

#[derive(Debug, Serialize)]
struct DistanceOutput {
    metric: String,
    distance: f64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    run(&cli, &mut std::io::stdout().lock())
}

fn run(cli: &Cli, out: &mut impl Write) -> Result<()> {
    match &cli.command {
        Command::Status => {
            let host = vecinit::host_variant();
            let output = StatusOutput {
                host: host.to_string(),
                symbol: host.symbol(),
                status: vecinit::status().to_string(),
            };
            if cli.json {
                writeln!(out, "{}", serde_json::to_string_pretty(&output)?)?;
            } else {
                writeln!(out, "host:   {}", output.host)?;
                writeln!(out, "symbol: {}", output.symbol)?;
                writeln!(out, "status: {}", output.status)?;
            }
        }
        Command::Probe { db } => {
            ensure_registered()?;
            let (conn, database) = open(db.as_deref())?;
            let report = probe::probe(&conn).wrap_err("sqlite-vec probe failed")?;
            let output = ProbeOutput {
                database,
                sqlite_version: report.sqlite_version,
                vec_version: report.vec_version,
            };
            if cli.json {
                writeln!(out, "{}", serde_json::to_string_pretty(&output)?)?;
            } else {
                writeln!(out, "database:       {}", output.database)?;
                writeln!(out, "sqlite_version: {}", output.sqlite_version)?;
                writeln!(out, "vec_version:    {}", output.vec_version)?;
            }
        }
        Command::Distance { metric, a, b } => {
            ensure_registered()?;
            let conn = Connection::open_in_memory()?;
            let distance = probe::distance(&conn, *metric, &a.0, &b.0)?;
            if cli.json {
                let output = DistanceOutput {
                    metric: metric.to_string(),
                    distance,
                };
                writeln!(out, "{}", serde_json::to_string_pretty(&output)?)?;
            } else {
                writeln!(out, "{distance}")?;
            }
        }
    }
    Ok(())
}

/// Makes sure the extension is registered, covering builds where the
/// constructor was not run.
fn ensure_registered() -> Result<()> {
    match vecinit::status() {
        Status::Registered => Ok(()),
        Status::Failed(code) => bail!("sqlite-vec registration failed with code {code}"),
        Status::Unregistered => {
            tracing::debug!("load-time hook did not run, registering now");
            vecinit::register().wrap_err("failed to register sqlite-vec")?;
            Ok(())
        }
    }
}

fn open(db: Option<&Path>) -> Result<(Connection, String)> {
    match db {
        Some(path) => {
            let conn = Connection::open(path)
                .wrap_err_with(|| format!("failed to open {}", path.display()))?;
            Ok((conn, path.display().to_string()))
        }
        None => Ok((Connection::open_in_memory()?, ":memory:".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_distance_command() {
        let cli = Cli::try_parse_from([
            "vecinit", "--json", "distance", "--metric", "cosine", "[1, 0]", "[0, 1.5]",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Command::Distance { metric, a, b } => {
                assert_eq!(metric, Metric::Cosine);
                assert_eq!(a, Vector(vec![1.0, 0.0]));
                assert_eq!(b, Vector(vec![0.0, 1.5]));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_non_array_vectors() {
        assert!(Cli::try_parse_from(["vecinit", "distance", "1,2", "[1, 2]"]).is_err());
        assert!(Cli::try_parse_from(["vecinit", "distance", "--metric", "dot", "[1]", "[1]"])
            .is_err());
    }

    fn output_of(args: &[&str]) -> String {
        let cli = Cli::try_parse_from(args).unwrap();
        let mut out = Vec::new();
        run(&cli, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn probe_opens_a_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probe.db");
        let output = output_of(&["vecinit", "probe", "--db", path.to_str().unwrap()]);
        assert!(path.exists());
        assert!(output.contains("vec_version:    v"));
    }

    #[test]
    fn distance_command_prints_the_distance() {
        assert_eq!(output_of(&["vecinit", "distance", "[1, 2]", "[4, 6]"]), "5\n");
    }

    #[test]
    fn distance_command_json() {
        let output = output_of(&[
            "vecinit", "--json", "distance", "--metric", "l1", "[1, 2]", "[4, 6]",
        ]);
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["metric"], "l1");
        let distance = value["distance"].as_f64().unwrap();
        assert!((distance - 7.0).abs() < 1e-6);
    }

    #[test]
    fn status_reports_the_standard_host() {
        let output = output_of(&["vecinit", "status"]);
        assert!(output.starts_with("host:   standard\nsymbol: sqlite3_auto_extension\n"));
    }
}
