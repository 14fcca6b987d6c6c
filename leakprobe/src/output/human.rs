use std::fmt::Write as _;

use leakprobe_core::{
    BatchReport, BatchStats, CaseOutcome, Progress, RunSummary, Scenario, StatementKind, Tally,
    WorkloadSpec,
};

mod format;

use format::{
    banner, format_avg_kb, format_delta_kb, format_kb, format_secs, separator, sql_preview,
};

const SQL_PREVIEW_CHARS: usize = 50;

/// Plain-text reporter for workload runs and expectation cases.
pub(crate) struct HumanOutput {
    scenario: Scenario,
}

impl HumanOutput {
    pub(crate) fn new(scenario: Scenario) -> Self {
        Self { scenario }
    }

    pub(crate) fn print_header(&self, spec: &WorkloadSpec) {
        print!("{}", self.render_header(spec));
    }

    pub(crate) fn progress(&self, p: &Progress) {
        print!("{}", self.render_progress(p));
    }

    pub(crate) fn print_summary(&self, summary: &RunSummary) {
        print!("{}", self.render_summary(summary));
    }

    fn render_header(&self, spec: &WorkloadSpec) -> String {
        format!(
            "scenario: {} database={} iterations={} batch_size={} pairs={} commit={}\n",
            self.scenario,
            spec.database.display(),
            spec.iterations,
            spec.batch_size,
            spec.total_pairs(),
            spec.commit,
        )
    }

    fn render_progress(&self, p: &Progress) -> String {
        match p {
            Progress::Started {
                target: Some(target),
                baseline_kb,
            } => format!(
                "process: {} (pid {})\nInitial memory usage: {}\n{}\n",
                target.name,
                target.pid,
                format_kb(*baseline_kb),
                banner()
            ),
            Progress::Started {
                target: None,
                baseline_kb,
            } => format!(
                "Initial memory usage: {} (memory tracking disabled)\n{}\n",
                format_kb(*baseline_kb),
                banner()
            ),
            Progress::Batch(report) => self.render_batch(report),
        }
    }

    fn render_batch(&self, report: &BatchReport) -> String {
        let mut out = String::new();
        match &report.memory {
            Some(m) => {
                let _ = writeln!(out, "After {} operations:", report.operations);
                let _ = writeln!(out, "Used:        {}", format_kb(m.sample.rss_kb));
                let _ = writeln!(out, "Difference:  {}", format_delta_kb(m.delta_kb));
            }
            None => {
                let _ = writeln!(
                    out,
                    "{} cycle [{}] ({} operations)",
                    self.scenario.label(StatementKind::Grow),
                    report.batch,
                    report.operations
                );
            }
        }
        if let Some(stats) = &report.stats {
            out.push_str(&self.render_stats(stats));
        }
        let _ = writeln!(out, "{}", separator());
        out
    }

    fn render_stats(&self, stats: &BatchStats) -> String {
        let mut out = String::new();
        for kind in StatementKind::ALL {
            let s = stats.get(kind);
            if s.count == 0 {
                continue;
            }
            let _ = writeln!(
                out,
                "Average [{}] time: {}, average memory increase: {}",
                self.scenario.label(kind),
                format_secs(s.avg_elapsed()),
                format_avg_kb(s.avg_mem_kb())
            );
        }
        out
    }

    fn render_summary(&self, summary: &RunSummary) -> String {
        let mut out = String::new();
        if summary.interrupted {
            out.push_str("\nInterrupted by user.\n");
        }
        let _ = writeln!(out, "{}", banner());
        let _ = write!(
            out,
            "{} operations in {} batches",
            summary.operations, summary.batches
        );
        if summary.tracking {
            let _ = write!(
                out,
                ", memory {} -> {} ({})",
                format_kb(summary.baseline_kb),
                format_kb(summary.last_kb),
                format_delta_kb(summary.total_delta_kb())
            );
        }
        out.push('\n');
        out
    }
}

pub(crate) fn print_case(outcome: &CaseOutcome) {
    print!("{}", render_case(outcome));
}

pub(crate) fn print_tally(tally: &Tally, interrupted: bool) {
    print!("{}", render_tally(tally, interrupted));
}

fn render_case(outcome: &CaseOutcome) -> String {
    format!(
        "Running statement #{}: {}\n{}\n{}\n",
        outcome.index,
        sql_preview(&outcome.sql, SQL_PREVIEW_CHARS),
        outcome.verdict,
        separator()
    )
}

fn render_tally(tally: &Tally, interrupted: bool) -> String {
    let mut out = String::new();
    if interrupted {
        out.push_str("\nInterrupted by user.\n");
    }
    let _ = writeln!(
        out,
        "{}\n{} passed, {} failed",
        banner(),
        tally.passed,
        tally.failed
    );
    out
}
