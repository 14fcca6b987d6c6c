use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use leakprobe_core::{CommitMode, ConnectOptions, NameMatch, Scenario, Topology};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ScenarioArg {
    /// CREATE TABLE / DROP TABLE
    Table,
    /// CREATE DOMAIN / DROP DOMAIN
    Domain,
    /// INSERT / DELETE of a single row
    Row,
    /// CREATE DATABASE / DROP DATABASE
    Database,
}

impl From<ScenarioArg> for Scenario {
    fn from(v: ScenarioArg) -> Self {
        match v {
            ScenarioArg::Table => Scenario::Table,
            ScenarioArg::Domain => Scenario::Domain,
            ScenarioArg::Row => Scenario::Row,
            ScenarioArg::Database => Scenario::Database,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ArchArg {
    /// Classic server: sample the per-attachment worker process
    #[value(alias = "classic")]
    Cs,
    /// SuperServer: sample the main server process
    #[value(alias = "super")]
    Ss,
}

impl From<ArchArg> for Topology {
    fn from(v: ArchArg) -> Self {
        match v {
            ArchArg::Cs => Topology::SeparateWorker,
            ArchArg::Ss => Topology::SingleProcess,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CommitArg {
    /// Commit after every statement
    Statement,
    /// Commit once per grow/shrink pair
    Pair,
}

impl From<CommitArg> for CommitMode {
    fn from(v: CommitArg) -> Self {
        match v {
            CommitArg::Statement => CommitMode::EachStatement,
            CommitArg::Pair => CommitMode::EachPair,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "leakprobe",
    author,
    version,
    about = "Memory leak probe for Firebird servers",
    long_about = "leakprobe drives a Firebird server through a fixed grow/shrink statement pair (create/drop table, create/drop domain, insert/delete, create/drop database) many times, sampling the server's resident memory after every batch.\n\nA steadily positive difference between batches points at a leak in the server.",
    after_help = "Examples:\n  leakprobe run table\n  leakprobe run domain --arch ss --count 100\n  leakprobe run row --batch-size 500 --trace-statements\n  leakprobe run database --allow-missing-process\n  leakprobe verify\n\nCtrl-C stops a run or a verify pass before the next iteration or case, closes the connection and prints a partial summary. A second Ctrl-C exits immediately with status 130 and leaves the attachment for the server to reap."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a leak-measurement workload
    #[command(
        long_about = "Run a workload and report the server's memory after every batch.\n\nThe scratch database is deleted and recreated before the run. Ctrl-C stops at the next iteration, closes the connection and prints a partial summary. The `database` scenario has no long-lived attachment, so with `--arch cs` it samples the main server process."
    )]
    Run(RunArgs),

    /// Run the built-in statement expectation cases (UTF8 default-length checks)
    Verify(VerifyArgs),
}

#[derive(Debug, Args)]
pub struct ConnectionArgs {
    /// Server user (must exist on the server)
    #[arg(short = 'u', long, env = "LEAKPROBE_USER", default_value = "sysdba")]
    pub user: String,

    /// Server user password
    #[arg(
        short = 'p',
        long,
        alias = "upass",
        env = "LEAKPROBE_PASSWORD",
        hide_env_values = true,
        default_value = "masterkey"
    )]
    pub password: String,

    /// Server host
    #[arg(long, env = "LEAKPROBE_HOST", default_value = "localhost")]
    pub host: String,

    /// Server port (defaults to the client's default, 3050)
    #[arg(long, env = "LEAKPROBE_PORT")]
    pub port: Option<u16>,
}

impl ConnectionArgs {
    pub fn options(&self) -> ConnectOptions {
        ConnectOptions {
            host: self.host.clone(),
            port: self.port,
            user: self.user.clone(),
            password: self.password.clone(),
        }
    }
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Workload to run
    #[arg(value_enum)]
    pub scenario: ScenarioArg,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Server architecture
    #[arg(short = 'a', long, value_enum, ignore_case = true, default_value_t = ArchArg::Cs)]
    pub arch: ArchArg,

    /// Number of batches (otherwise the scenario default)
    #[arg(short = 'c', long = "count")]
    pub iterations: Option<u64>,

    /// Grow/shrink pairs per batch (otherwise the scenario default)
    #[arg(short = 'b', long, value_parser = clap::value_parser!(u64).range(1..))]
    pub batch_size: Option<u64>,

    /// Scratch database path on the server (otherwise the scenario default)
    #[arg(long, env = "LEAKPROBE_DATABASE")]
    pub database: Option<PathBuf>,

    /// Server process name to sample
    #[arg(long, env = "LEAKPROBE_PROCESS", default_value = "firebird")]
    pub process_name: String,

    /// Match the process name as a case-insensitive prefix
    #[arg(long)]
    pub name_prefix: bool,

    /// Commit granularity
    #[arg(long, value_enum, default_value_t = CommitArg::Statement)]
    pub commit: CommitArg,

    /// Time and sample every statement; report per-kind averages per batch
    #[arg(long)]
    pub trace_statements: bool,

    /// Keep going with memory tracking disabled if the server process is not found
    /// (e.g. when it runs under valgrind)
    #[arg(long)]
    pub allow_missing_process: bool,

    /// Attach to an existing database instead of recreating it
    #[arg(long)]
    pub reuse_database: bool,

    /// Delete the scratch database after the run
    #[arg(long, conflicts_with = "keep_database")]
    pub cleanup: bool,

    /// Keep the scratch database after the run (the `database` scenario deletes it by default)
    #[arg(long)]
    pub keep_database: bool,
}

impl RunArgs {
    pub fn name_match(&self) -> NameMatch {
        if self.name_prefix {
            NameMatch::Prefix(self.process_name.clone())
        } else {
            NameMatch::Exact(self.process_name.clone())
        }
    }
}

#[derive(Debug, Args)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Scratch database path on the server
    #[arg(long, env = "LEAKPROBE_DATABASE", default_value = "/tmp/failed_test.fdb")]
    pub database: PathBuf,

    /// Keep the scratch database after the run
    #[arg(long)]
    pub keep_database: bool,
}
