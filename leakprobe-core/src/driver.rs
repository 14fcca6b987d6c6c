use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::db::{Connection, Connector};
use crate::error::{Error, Result};
use crate::process::{ProcessHandle, ProcessTable, ProcessTarget, Topology};
use crate::sampler::{MemorySampler, MemoryTracker, Sample, SampleDelta, kb_delta};
use crate::scratch::remove_scratch;
use crate::sql::Statement;
use crate::workload::{CommitMode, StatementKind, WorkloadSpec};

/// Everything a run needs, built once per invocation.
pub struct RunContext<'a> {
    pub connector: &'a dyn Connector,
    pub processes: &'a mut dyn ProcessTable,
    pub target: ProcessTarget,
    /// Set by the interrupt handler; checked before every iteration.
    pub stop: Arc<AtomicBool>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    Started {
        target: Option<ProcessHandle>,
        baseline_kb: u64,
    },
    Batch(BatchReport),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    /// 1-based.
    pub batch: u64,
    /// Cumulative grow/shrink pairs.
    pub operations: u64,
    /// `None` when memory tracking is disabled.
    pub memory: Option<SampleDelta>,
    /// Present when statements are traced.
    pub stats: Option<BatchStats>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindStats {
    pub count: u64,
    pub elapsed: Duration,
    pub mem_kb: i64,
}

impl KindStats {
    #[must_use]
    pub fn avg_elapsed(&self) -> Duration {
        match u32::try_from(self.count) {
            Ok(0) => Duration::ZERO,
            Ok(n) => self.elapsed / n,
            Err(_) => Duration::from_secs_f64(self.elapsed.as_secs_f64() / self.count as f64),
        }
    }

    #[must_use]
    pub fn avg_mem_kb(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.mem_kb as f64 / self.count as f64
    }
}

/// Per statement kind totals within one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    kinds: [KindStats; 3],
}

impl BatchStats {
    #[must_use]
    pub fn get(&self, kind: StatementKind) -> KindStats {
        self.kinds[kind.index()]
    }

    pub fn record(&mut self, kind: StatementKind, elapsed: Duration, mem_kb: i64) {
        let k = &mut self.kinds[kind.index()];
        k.count += 1;
        k.elapsed += elapsed;
        k.mem_kb += mem_kb;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub batches: u64,
    pub operations: u64,
    pub interrupted: bool,
    pub tracking: bool,
    pub baseline_kb: u64,
    pub last_kb: u64,
}

impl RunSummary {
    #[must_use]
    pub fn total_delta_kb(&self) -> i64 {
        kb_delta(self.baseline_kb, self.last_kb)
    }
}

/// Run `spec` to completion (or interruption), reporting after every batch.
///
/// Any statement failure aborts the run: a failed grow/shrink makes the
/// measurement meaningless. The connection is released on every path.
pub fn run_workload(
    ctx: &mut RunContext<'_>,
    spec: &WorkloadSpec,
    progress: &mut dyn FnMut(&Progress),
) -> Result<RunSummary> {
    spec.validate()?;

    let main = ctx.target.find_main(ctx.processes)?;

    if !spec.reuse_database {
        remove_scratch(&spec.database)?;
    }

    let mut conn = if spec.scenario.recreates_database() {
        None
    } else {
        let mut conn = open(ctx.connector, spec)?;
        if let Some(setup) = spec.scenario.setup()? {
            execute(conn.as_mut(), &setup)?;
            commit(conn.as_mut())?;
        }
        Some(conn)
    };

    let target = if spec.scenario.recreates_database() {
        // Each cycle's attachment (and its worker) ends with the cycle.
        if ctx.target.topology == Topology::SeparateWorker {
            log::warn!(
                "{} scenario has no long-lived attachment; sampling the main server process",
                spec.scenario
            );
        }
        main
    } else {
        ctx.target.resolve(ctx.processes, main)?
    };
    let mut sampler = MemorySampler::new(ctx.processes, target);
    let baseline_kb = sampler.sample()?;
    progress(&Progress::Started {
        target: sampler.target().cloned(),
        baseline_kb,
    });

    log::info!(
        "running {} x {} {} pairs ({} total), commit={}",
        spec.iterations,
        spec.batch_size,
        spec.scenario,
        spec.total_pairs(),
        spec.commit
    );

    let mut tracker = MemoryTracker::new(Sample {
        operations: 0,
        rss_kb: baseline_kb,
    });
    let mut operations = 0u64;
    let mut batches = 0u64;
    let mut interrupted = false;

    'run: for batch in 1..=spec.iterations {
        let mut steps = Steps {
            sampler: &mut sampler,
            trace: spec.trace_statements.then(|| Trace {
                stats: BatchStats::default(),
                last_kb: tracker.last().rss_kb,
            }),
        };

        for j in 0..spec.batch_size {
            if ctx.stop.load(Ordering::Relaxed) {
                interrupted = true;
                break 'run;
            }
            match conn.as_mut() {
                Some(conn) => run_pair(&mut steps, conn.as_mut(), spec, j)?,
                None => run_database_cycle(&mut steps, ctx.connector, spec, j)?,
            }
            operations += 1;
        }

        let stats = steps.trace.map(|t| t.stats);
        let rss_kb = sampler.sample()?;
        let memory = sampler.is_tracking().then(|| {
            tracker.record(Sample {
                operations,
                rss_kb,
            })
        });
        batches = batch;
        progress(&Progress::Batch(BatchReport {
            batch,
            operations,
            memory,
            stats,
        }));
    }

    if let Some(mut conn) = conn.take() {
        if !interrupted && let Some(teardown) = spec.scenario.teardown()? {
            execute(conn.as_mut(), &teardown)?;
            commit(conn.as_mut())?;
        }
        conn.close()
            .map_err(Error::database("failed to close connection"))?;
    }

    if spec.cleanup {
        remove_scratch(&spec.database)?;
    }

    if interrupted {
        log::info!("interrupted after {operations} pairs");
    }

    Ok(RunSummary {
        batches,
        operations,
        interrupted,
        tracking: sampler.is_tracking(),
        baseline_kb,
        last_kb: tracker.last().rss_kb,
    })
}

fn open(connector: &dyn Connector, spec: &WorkloadSpec) -> Result<Box<dyn Connection>> {
    if spec.reuse_database {
        connector
            .connect(&spec.database)
            .map_err(Error::database("failed to connect"))
    } else {
        connector
            .create_database(&spec.database)
            .map_err(Error::database("failed to create database"))
    }
}

fn execute(conn: &mut dyn Connection, stmt: &Statement) -> Result<()> {
    conn.execute(stmt).map_err(|source| Error::Statement {
        sql: stmt.sql().to_string(),
        source,
    })
}

fn commit(conn: &mut dyn Connection) -> Result<()> {
    conn.commit().map_err(Error::database("commit failed"))
}

fn run_pair(
    steps: &mut Steps<'_, '_>,
    conn: &mut dyn Connection,
    spec: &WorkloadSpec,
    j: u64,
) -> Result<()> {
    let grow = spec.scenario.grow(j)?;
    steps.run(StatementKind::Grow, || execute(conn, &grow))?;
    if spec.commit == CommitMode::EachStatement {
        steps.run(StatementKind::Commit, || commit(conn))?;
    }

    if let Some(shrink) = spec.scenario.shrink(j)? {
        steps.run(StatementKind::Shrink, || execute(conn, &shrink))?;
    }
    steps.run(StatementKind::Commit, || commit(conn))
}

fn run_database_cycle(
    steps: &mut Steps<'_, '_>,
    connector: &dyn Connector,
    spec: &WorkloadSpec,
    j: u64,
) -> Result<()> {
    let body = spec.scenario.grow(j)?;

    let mut conn = steps.run(StatementKind::Grow, || {
        remove_scratch(&spec.database)?;
        let mut conn = connector
            .create_database(&spec.database)
            .map_err(Error::database("failed to create database"))?;
        execute(conn.as_mut(), &body)?;
        Ok(conn)
    })?;
    steps.run(StatementKind::Commit, || commit(conn.as_mut()))?;

    steps.run(StatementKind::Shrink, move || {
        conn.close()
            .map_err(Error::database("failed to close connection"))?;
        remove_scratch(&spec.database).map(|_| ())
    })
}

struct Trace {
    stats: BatchStats,
    last_kb: u64,
}

struct Steps<'s, 'a> {
    sampler: &'s mut MemorySampler<'a>,
    trace: Option<Trace>,
}

impl Steps<'_, '_> {
    fn run<T>(&mut self, kind: StatementKind, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let Some(trace) = self.trace.as_mut() else {
            return f();
        };

        let started = Instant::now();
        let out = f()?;
        let elapsed = started.elapsed();

        let rss_kb = self.sampler.sample()?;
        trace
            .stats
            .record(kind, elapsed, kb_delta(trace.last_kb, rss_kb));
        trace.last_kb = rss_kb;
        Ok(out)
    }
}
