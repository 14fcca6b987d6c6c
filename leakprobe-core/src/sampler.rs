use crate::error::{Error, Result};
use crate::process::{ProcessHandle, ProcessTable};

/// Reads the resident memory of the tracked server process.
pub struct MemorySampler<'a> {
    table: &'a mut dyn ProcessTable,
    target: Option<ProcessHandle>,
}

impl<'a> MemorySampler<'a> {
    pub fn new(table: &'a mut dyn ProcessTable, target: Option<ProcessHandle>) -> Self {
        Self { table, target }
    }

    #[must_use]
    pub fn target(&self) -> Option<&ProcessHandle> {
        self.target.as_ref()
    }

    #[must_use]
    pub fn is_tracking(&self) -> bool {
        self.target.is_some()
    }

    /// Current RSS in kilobytes; `0` when tracking is disabled.
    pub fn sample(&mut self) -> Result<u64> {
        let Some(target) = &self.target else {
            return Ok(0);
        };
        self.table
            .rss_kb(target.pid)
            .ok_or(Error::ProcessGone { pid: target.pid })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    /// Cumulative operations executed when the sample was taken.
    pub operations: u64,
    pub rss_kb: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleDelta {
    pub sample: Sample,
    /// `rss_kb - previous.rss_kb`, unclamped.
    pub delta_kb: i64,
}

/// Keeps only the latest sample.
#[derive(Debug, Clone, Copy)]
pub struct MemoryTracker {
    last: Sample,
}

impl MemoryTracker {
    #[must_use]
    pub fn new(baseline: Sample) -> Self {
        Self { last: baseline }
    }

    pub fn record(&mut self, sample: Sample) -> SampleDelta {
        let delta_kb = kb_delta(self.last.rss_kb, sample.rss_kb);
        self.last = sample;
        SampleDelta { sample, delta_kb }
    }

    #[must_use]
    pub fn last(&self) -> Sample {
        self.last
    }
}

pub(crate) fn kb_delta(prev: u64, cur: u64) -> i64 {
    (cur as i128 - prev as i128) as i64
}
