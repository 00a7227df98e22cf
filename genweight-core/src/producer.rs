//! Stream-local weight producer
//!
//! One [`StreamProducer`] exists per concurrent stream. It owns that
//! stream's [`CounterMap`] exclusively, so per-event accumulation takes no
//! lock. The runtime calls the lifecycle hooks in a fixed order:
//!
//! ```text
//! begin_run -> (begin_block -> produce*)* -> end_run_summary
//! ```

use crate::config::{ProducerConfig, ProducerFlavor};
use crate::event::{Event, LuminosityBlock};
use crate::label::{model_tag, LabelPolicy};
use crate::run::RunSummary;
use crate::stats::CounterMap;
use crate::Result;
use serde::{Deserialize, Serialize};

/// Per-event output of the producer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Generator weight, stored at single precision
    pub gen_weight: f32,
    /// `GenModel_<label>` or empty; `None` for flavors that do not tag events
    pub gen_model: Option<String>,
}

/// Weight producer bound to a single stream
#[derive(Debug)]
pub struct StreamProducer {
    stream_id: usize,
    flavor: ProducerFlavor,
    policy: LabelPolicy,
    counters: CounterMap,
    skipped: u64,
}

impl StreamProducer {
    /// Create the producer for `stream_id` (begin-stream)
    pub fn begin_stream(stream_id: usize, config: &ProducerConfig) -> Self {
        tracing::debug!("Stream {} starting with {:?} producer", stream_id, config.flavor);
        Self {
            stream_id,
            flavor: config.flavor,
            policy: config.flavor.label_policy(),
            counters: CounterMap::new(),
            skipped: 0,
        }
    }

    pub fn stream_id(&self) -> usize {
        self.stream_id
    }

    /// Zero the stream's counters for a new run
    pub fn begin_run(&mut self, run: u32) {
        tracing::debug!("Stream {} begin run {}", self.stream_id, run);
        self.counters.reset();
        self.skipped = 0;
    }

    /// Resolve and activate the label for the events of `block`
    pub fn begin_block(&mut self, block: &LuminosityBlock) {
        let label = self.policy.resolve(block);
        tracing::trace!("Stream {} block {} label '{}'", self.stream_id, block.id, label);
        self.counters.set_active(&label);
    }

    /// Count one event and build its per-event record.
    ///
    /// Events without a generator weight are logged and skipped (`Ok(None)`);
    /// they are not counted. Fails with [`crate::Error::LabelNotSet`] if no
    /// block has begun since the last `begin_run`.
    pub fn produce(&mut self, event: &Event) -> Result<Option<EventRecord>> {
        let counter = self.counters.active_counter()?;

        let Some(weight) = event.weight else {
            tracing::error!("Stream {}: event has no generator weight, skipping", self.stream_id);
            self.skipped += 1;
            return Ok(None);
        };

        counter.observe(weight);

        let gen_model = if self.flavor.emits_model_tag() {
            Some(model_tag(self.counters.active_label()?))
        } else {
            None
        };

        Ok(Some(EventRecord { gen_weight: weight as f32, gen_model }))
    }

    /// Merge this stream's counters into the run summary (stream end-run)
    pub fn end_run_summary(&self, summary: &mut RunSummary) {
        tracing::debug!(
            "Stream {} merging {} labels into run {}",
            self.stream_id,
            self.counters.len(),
            summary.run()
        );
        summary.merge_stream(&self.counters);
    }

    /// The stream's counters
    pub fn counters(&self) -> &CounterMap {
        &self.counters
    }

    /// Events skipped for lack of a weight in the current run
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}
