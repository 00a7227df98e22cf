//! Run-level reduction of stream counters
//!
//! A [`RunSummary`] is created empty at the start of a run, receives one
//! merge per stream as each stream finishes its share of the run, and is
//! read once at the end of the run to produce the [`CounterTable`].
//!
//! Merges are commutative, so stream completion order does not matter, but
//! they are not synchronized here: a summary shared between threads must be
//! guarded by the caller (the runtime keeps it behind a `Mutex`).

use crate::stats::{ColumnNames, CounterMap, CounterTable};
use serde::{Deserialize, Serialize};

/// Counters of a single run
#[derive(Debug, Clone)]
pub struct RunSummary {
    run: u32,
    counters: CounterMap,
    streams_merged: usize,
}

impl RunSummary {
    /// Empty summary for `run` (global begin-run)
    pub fn new(run: u32) -> Self {
        Self { run, counters: CounterMap::new(), streams_merged: 0 }
    }

    pub fn run(&self) -> u32 {
        self.run
    }

    /// Add one stream's counters (stream end-run)
    pub fn merge_stream(&mut self, stream: &CounterMap) {
        self.counters.merge(stream);
        self.streams_merged += 1;
    }

    pub fn counters(&self) -> &CounterMap {
        &self.counters
    }

    /// Number of streams merged so far
    pub fn streams_merged(&self) -> usize {
        self.streams_merged
    }

    /// Emit the run's counter table (global end-run)
    pub fn produce(&self, names: &ColumnNames) -> CounterTable {
        let table = CounterTable::from_counter_map(&self.counters, names);
        tracing::info!(
            "Run {}: {} labels from {} streams",
            self.run,
            self.counters.len(),
            self.streams_merged
        );
        table
    }
}

/// Outcome of processing one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run: u32,
    /// Events seen by the producers, including skipped ones
    pub events_processed: u64,
    /// Events without a generator weight
    pub events_skipped: u64,
    /// Events accepted by the skim chain
    pub events_selected: u64,
    pub table: CounterTable,
}

/// Counters combined across all runs of a job
#[derive(Debug, Clone, Default)]
pub struct JobSummary {
    counters: CounterMap,
    runs: Vec<u32>,
}

impl JobSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a finished run
    pub fn merge_run(&mut self, run: &RunSummary) {
        self.counters.merge(run.counters());
        self.runs.push(run.run());
    }

    /// Add another job's counters
    pub fn merge(&mut self, other: &JobSummary) {
        self.counters.merge(&other.counters);
        self.runs.extend_from_slice(&other.runs);
    }

    pub fn counters(&self) -> &CounterMap {
        &self.counters
    }

    /// Runs merged so far, in merge order
    pub fn runs(&self) -> &[u32] {
        &self.runs
    }

    /// Emit the job-wide counter table
    pub fn produce(&self, names: &ColumnNames) -> CounterTable {
        CounterTable::from_counter_map(&self.counters, names)
    }
}
