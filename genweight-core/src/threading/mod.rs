//! Thread-per-stream runtime
//!
//! Plays the part of the event-processing framework: it owns one
//! [`StreamProducer`] per stream, hands each stream a disjoint share of a
//! run's luminosity blocks, and calls the producer lifecycle hooks in order.
//! Uses native OS threads (scoped, so producers are lent to the threads and
//! survive across runs) with a start barrier.
//!
//! The run-level [`RunSummary`] is the only shared state. Streams merge into
//! it under a mutex as each one finishes; per-event accumulation is lock-free.

use crate::config::ProcessConfig;
use crate::event::{EventDataset, RunData};
use crate::producer::{EventRecord, StreamProducer};
use crate::run::{JobSummary, RunReport, RunSummary};
use crate::skim::SkimChain;
use crate::stats::CounterTable;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::sync::{Barrier, Mutex};
use std::thread;

/// Receives every per-event record: `(stream_id, record, selected)`
pub trait EventSink: Sync {
    fn record(&self, stream_id: usize, record: &EventRecord, selected: bool) -> Result<()>;
}

/// Sink that drops every record
pub struct DiscardSink;

impl EventSink for DiscardSink {
    fn record(&self, _stream_id: usize, _record: &EventRecord, _selected: bool) -> Result<()> {
        Ok(())
    }
}

/// Per-stream event tallies for one run
#[derive(Debug, Clone, Copy, Default)]
struct StreamTally {
    processed: u64,
    skipped: u64,
    selected: u64,
}

/// Results of a whole job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobReport {
    pub runs: Vec<RunReport>,
    /// Counters summed over all runs
    pub total: CounterTable,
}

/// Multi-stream runtime driving the weight producers
pub struct ThreadingRuntime {
    config: ProcessConfig,
    producers: Vec<StreamProducer>,
    skim: SkimChain,
}

impl ThreadingRuntime {
    /// Create the runtime and begin every stream
    pub fn new(config: ProcessConfig) -> Result<Self> {
        config.validate()?;
        let producers = (0..config.runtime.streams)
            .map(|id| StreamProducer::begin_stream(id, &config.producer))
            .collect();
        let skim = SkimChain::new(&config.skim);
        Ok(Self { config, producers, skim })
    }

    /// Number of concurrent streams
    pub fn num_streams(&self) -> usize {
        self.producers.len()
    }

    /// Process one run, discarding per-event records
    pub fn run(&mut self, run: &RunData) -> Result<RunReport> {
        self.run_with_sink(run, &DiscardSink).map(|(_, report)| report)
    }

    /// Process one run, handing per-event records to `sink`
    pub fn run_with_sink<S: EventSink>(
        &mut self,
        run: &RunData,
        sink: &S,
    ) -> Result<(RunSummary, RunReport)> {
        let num_streams = self.producers.len();
        tracing::info!(
            "Run {}: {} blocks, {} events on {} streams",
            run.run,
            run.blocks.len(),
            run.event_count(),
            num_streams
        );

        let summary = Mutex::new(RunSummary::new(run.run));
        let barrier = Barrier::new(num_streams);
        let skim = &self.skim;
        let producers = &mut self.producers;

        let results: Vec<Result<StreamTally>> = thread::scope(|scope| {
            let handles: Vec<_> = producers
                .iter_mut()
                .map(|producer| {
                    let summary = &summary;
                    let barrier = &barrier;
                    scope.spawn(move || {
                        barrier.wait();
                        run_stream(producer, run, num_streams, skim, sink, summary)
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .map_err(|e| Error::Worker(format!("Stream thread panicked: {:?}", e)))
                        .and_then(|result| result)
                })
                .collect()
        });

        let mut total = StreamTally::default();
        for result in results {
            let tally = result.inspect_err(|e| {
                tracing::error!("Run {} failed: {}", run.run, e);
            })?;
            total.processed += tally.processed;
            total.skipped += tally.skipped;
            total.selected += tally.selected;
        }

        let summary = summary
            .into_inner()
            .map_err(|_| Error::Worker("run summary lock poisoned".to_string()))?;
        let table = summary.produce(&self.config.producer.column_names());

        if total.skipped > 0 {
            tracing::warn!("Run {}: {} events had no generator weight", run.run, total.skipped);
        }

        let report = RunReport {
            run: run.run,
            events_processed: total.processed,
            events_skipped: total.skipped,
            events_selected: total.selected,
            table,
        };
        Ok((summary, report))
    }

    /// Process every run of a dataset in order and combine the results
    pub fn run_job(&mut self, dataset: &EventDataset) -> Result<JobReport> {
        self.run_job_with_sink(dataset, &DiscardSink)
    }

    pub fn run_job_with_sink<S: EventSink>(
        &mut self,
        dataset: &EventDataset,
        sink: &S,
    ) -> Result<JobReport> {
        let mut job = JobSummary::new();
        let mut runs = Vec::with_capacity(dataset.runs.len());
        for run in &dataset.runs {
            let (summary, report) = self.run_with_sink(run, sink)?;
            job.merge_run(&summary);
            runs.push(report);
        }
        Ok(JobReport { runs, total: job.produce(&self.config.producer.column_names()) })
    }
}

/// Body of one stream thread for one run
fn run_stream<S: EventSink>(
    producer: &mut StreamProducer,
    run: &RunData,
    num_streams: usize,
    skim: &SkimChain,
    sink: &S,
    summary: &Mutex<RunSummary>,
) -> Result<StreamTally> {
    let stream_id = producer.stream_id();
    producer.begin_run(run.run);

    let mut tally = StreamTally::default();
    for block in run.blocks.iter().skip(stream_id).step_by(num_streams) {
        producer.begin_block(block);
        for event in &block.events {
            tally.processed += 1;
            let selected = skim.accept(event);
            if selected {
                tally.selected += 1;
            }
            match producer.produce(event)? {
                Some(record) => sink.record(stream_id, &record, selected)?,
                None => tally.skipped += 1,
            }
        }
    }

    let mut summary =
        summary.lock().map_err(|_| Error::Worker("run summary lock poisoned".to_string()))?;
    producer.end_run_summary(&mut summary);
    Ok(tally)
}
