//! Event, luminosity block and run data
//!
//! These are the inputs handed to the stream producers by the runtime.
//! Datasets can be loaded from JSON or produced by [`crate::source`].

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Reconstructed muon candidate, as seen by the muon skim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Muon {
    pub pt: f64,
    pub eta: f64,
    /// Transverse impact parameter w.r.t. the primary vertex
    pub dxy: f64,
    /// Longitudinal impact parameter w.r.t. the primary vertex
    pub dz: f64,
    #[serde(default)]
    pub is_medium: bool,
}

/// A single collision event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Generator weight, absent for events without generator information
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub muons: Vec<Muon>,
    /// Names of the trigger paths that fired
    #[serde(default)]
    pub triggers: Vec<String>,
}

impl Event {
    /// Event carrying only a generator weight
    pub fn weighted(weight: f64) -> Self {
        Self { weight: Some(weight), ..Default::default() }
    }
}

/// Generator header attached to a luminosity block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenLumiInfoHeader {
    /// Configuration description of the generator (model string)
    pub config_description: String,
    /// Headers may be present but flagged invalid by upstream producers
    #[serde(default = "default_valid")]
    pub valid: bool,
}

fn default_valid() -> bool {
    true
}

impl GenLumiInfoHeader {
    pub fn new(config_description: impl Into<String>) -> Self {
        Self { config_description: config_description.into(), valid: true }
    }
}

/// Contiguous batch of events sharing one generator header
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LuminosityBlock {
    pub id: u32,
    #[serde(default)]
    pub header: Option<GenLumiInfoHeader>,
    #[serde(default)]
    pub events: Vec<Event>,
}

impl LuminosityBlock {
    /// Block without a generator header
    pub fn new(id: u32, events: Vec<Event>) -> Self {
        Self { id, header: None, events }
    }

    /// Block whose header carries `config_description`
    pub fn with_model(id: u32, config_description: &str, events: Vec<Event>) -> Self {
        Self { id, header: Some(GenLumiInfoHeader::new(config_description)), events }
    }

    /// Header if present and valid
    pub fn valid_header(&self) -> Option<&GenLumiInfoHeader> {
        self.header.as_ref().filter(|h| h.valid)
    }
}

/// One run: an ordered list of luminosity blocks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunData {
    pub run: u32,
    #[serde(default)]
    pub blocks: Vec<LuminosityBlock>,
}

impl RunData {
    pub fn new(run: u32, blocks: Vec<LuminosityBlock>) -> Self {
        Self { run, blocks }
    }

    /// Total number of events across all blocks
    pub fn event_count(&self) -> usize {
        self.blocks.iter().map(|b| b.events.len()).sum()
    }
}

/// A whole input dataset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventDataset {
    pub runs: Vec<RunData>,
}

impl EventDataset {
    /// Load a dataset from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let dataset: EventDataset = serde_json::from_str(&content).map_err(|e| {
            Error::Source(format!("failed to parse dataset {}: {e}", path.display()))
        })?;
        tracing::debug!(
            "Loaded dataset {} with {} runs",
            path.display(),
            dataset.runs.len()
        );
        Ok(dataset)
    }

    /// Write the dataset as pretty-printed JSON
    pub fn write_json_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn event_count(&self) -> usize {
        self.runs.iter().map(RunData::event_count).sum()
    }
}
