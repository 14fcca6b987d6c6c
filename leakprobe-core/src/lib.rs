#![forbid(unsafe_code)]

mod db;
mod driver;
mod error;
mod expect;
mod process;
mod sampler;
mod scratch;
mod sql;
mod workload;

pub use db::{ConnectOptions, Connection, Connector, DbError};
pub use driver::{
    BatchReport, BatchStats, KindStats, Progress, RunContext, RunSummary, run_workload,
};
pub use error::{Error, ErrorKind, Result};
pub use expect::{Case, CaseOutcome, Tally, Verdict, charset_default_cases, run_cases};
pub use process::{
    NameMatch, ProcessHandle, ProcessTable, ProcessTarget, SysinfoProcessTable, Topology,
    locate_main, locate_worker,
};
pub use sampler::{MemorySampler, MemoryTracker, Sample, SampleDelta};
pub use scratch::remove_scratch;
pub use sql::{Ident, Statement, Value};
pub use workload::{
    CommitMode, ROW_PAYLOAD, Scenario, ScenarioDefaults, StatementKind, WorkloadSpec,
};
