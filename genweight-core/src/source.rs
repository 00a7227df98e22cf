//! Synthetic event source
//!
//! Produces reproducible datasets for exercising the pipeline without real
//! input files: runs of luminosity blocks, each block tagged with a
//! generator model, and events with normally distributed weights (a
//! configurable fraction flipped negative), muon candidates and fired
//! trigger paths.

use crate::event::{Event, EventDataset, GenLumiInfoHeader, LuminosityBlock, Muon, RunData};
use crate::seed::{components, derive_run_seed};
use crate::{Error, Result};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp, Normal, Poisson};
use serde::{Deserialize, Serialize};

/// Generator weight distribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct WeightConfig {
    #[serde(default = "default_weight_mean")]
    pub mean: f64,
    #[serde(default = "default_weight_std_dev")]
    pub std_dev: f64,
    /// Fraction of events whose weight is flipped negative
    #[serde(default)]
    pub negative_fraction: f64,
    /// Fraction of events with no weight at all
    #[serde(default)]
    pub missing_fraction: f64,
}

fn default_weight_mean() -> f64 {
    1.0
}

fn default_weight_std_dev() -> f64 {
    0.1
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            mean: default_weight_mean(),
            std_dev: default_weight_std_dev(),
            negative_fraction: 0.0,
            missing_fraction: 0.0,
        }
    }
}

/// Muon candidate generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct MuonGenConfig {
    /// Mean number of muon candidates per event (Poisson)
    #[serde(default = "default_mean_multiplicity")]
    pub mean_multiplicity: f64,
    /// Mean transverse momentum (exponential)
    #[serde(default = "default_mean_pt")]
    pub mean_pt: f64,
    /// Probability that a candidate passes the medium identification
    #[serde(default = "default_medium_fraction")]
    pub medium_fraction: f64,
}

fn default_mean_multiplicity() -> f64 {
    2.0
}

fn default_mean_pt() -> f64 {
    8.0
}

fn default_medium_fraction() -> f64 {
    0.8
}

impl Default for MuonGenConfig {
    fn default() -> Self {
        Self {
            mean_multiplicity: default_mean_multiplicity(),
            mean_pt: default_mean_pt(),
            medium_fraction: default_medium_fraction(),
        }
    }
}

/// Synthetic dataset layout and distributions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct SyntheticConfig {
    /// Master seed; `None` draws from OS entropy
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_first_run")]
    pub first_run: u32,
    #[serde(default = "default_runs")]
    pub runs: u32,
    #[serde(default = "default_blocks_per_run")]
    pub blocks_per_run: u32,
    #[serde(default = "default_events_per_block")]
    pub events_per_block: usize,
    /// Raw generator model strings; blocks cycle through them. Empty means
    /// blocks carry no generator header.
    #[serde(default)]
    pub models: Vec<String>,
    #[serde(default)]
    pub weight: WeightConfig,
    #[serde(default)]
    pub muons: MuonGenConfig,
    /// Trigger paths that may fire
    #[serde(default)]
    pub trigger_paths: Vec<String>,
    /// Probability that each listed path fires
    #[serde(default = "default_trigger_probability")]
    pub trigger_probability: f64,
}

fn default_first_run() -> u32 {
    1
}

fn default_runs() -> u32 {
    1
}

fn default_blocks_per_run() -> u32 {
    8
}

fn default_events_per_block() -> usize {
    1000
}

fn default_trigger_probability() -> f64 {
    0.5
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            seed: None,
            first_run: default_first_run(),
            runs: default_runs(),
            blocks_per_run: default_blocks_per_run(),
            events_per_block: default_events_per_block(),
            models: Vec::new(),
            weight: WeightConfig::default(),
            muons: MuonGenConfig::default(),
            trigger_paths: Vec::new(),
            trigger_probability: default_trigger_probability(),
        }
    }
}

impl SyntheticConfig {
    pub fn validate(&self) -> Result<()> {
        let fractions = [
            ("weight.negative_fraction", self.weight.negative_fraction),
            ("weight.missing_fraction", self.weight.missing_fraction),
            ("muons.medium_fraction", self.muons.medium_fraction),
            ("trigger_probability", self.trigger_probability),
        ];
        for (name, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Config(format!("{name} must be within [0, 1], got {value}")));
            }
        }
        if self.weight.std_dev <= 0.0 {
            return Err(Error::Config("weight.std_dev must be > 0".to_string()));
        }
        if self.muons.mean_multiplicity <= 0.0 || self.muons.mean_pt <= 0.0 {
            return Err(Error::Config(
                "muons.mean_multiplicity and muons.mean_pt must be > 0".to_string(),
            ));
        }
        if self.runs == 0 {
            return Err(Error::Config("runs must be > 0".to_string()));
        }
        if self.first_run.checked_add(self.runs - 1).is_none() {
            return Err(Error::Config(format!(
                "first_run {} with {} runs exceeds the largest run number",
                self.first_run, self.runs
            )));
        }
        Ok(())
    }
}

/// Reproducible dataset generator
pub struct SyntheticSource {
    config: SyntheticConfig,
    master_seed: u64,
    weight_dist: Normal<f64>,
    multiplicity_dist: Poisson<f64>,
    pt_dist: Exp<f64>,
    ip_dist: Normal<f64>,
}

impl SyntheticSource {
    pub fn new(config: SyntheticConfig) -> Result<Self> {
        config.validate()?;

        let master_seed = match config.seed {
            Some(seed) => seed,
            None => rand::random(),
        };
        let weight_dist = Normal::new(config.weight.mean, config.weight.std_dev)
            .map_err(|e| Error::Source(format!("weight distribution: {e}")))?;
        let multiplicity_dist = Poisson::new(config.muons.mean_multiplicity)
            .map_err(|e| Error::Source(format!("muon multiplicity: {e}")))?;
        let pt_dist = Exp::new(1.0 / config.muons.mean_pt)
            .map_err(|e| Error::Source(format!("muon pt: {e}")))?;
        let ip_dist =
            Normal::new(0.0, 0.1).map_err(|e| Error::Source(format!("impact parameter: {e}")))?;

        Ok(Self { config, master_seed, weight_dist, multiplicity_dist, pt_dist, ip_dist })
    }

    /// Master seed in use (reported so entropy-seeded runs can be replayed)
    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Generate every configured run
    pub fn generate(&self) -> EventDataset {
        let runs = (0..self.config.runs)
            .map(|i| self.generate_run(self.config.first_run + i))
            .collect();
        EventDataset { runs }
    }

    /// Generate a single run; identical for identical seed and run number
    pub fn generate_run(&self, run: u32) -> RunData {
        let rng_for = |component| SmallRng::seed_from_u64(derive_run_seed(self.master_seed, component, run));
        let mut weight_rng = rng_for(components::WEIGHTS);
        let mut missing_rng = rng_for(components::MISSING);
        let mut model_rng = rng_for(components::MODELS);
        let mut muon_rng = rng_for(components::MUONS);
        let mut trigger_rng = rng_for(components::TRIGGERS);

        let mut blocks = Vec::with_capacity(self.config.blocks_per_run as usize);
        for id in 1..=self.config.blocks_per_run {
            let header = if self.config.models.is_empty() {
                None
            } else {
                let idx = model_rng.random_range(0..self.config.models.len());
                Some(GenLumiInfoHeader::new(self.config.models[idx].clone()))
            };

            let events = (0..self.config.events_per_block)
                .map(|_| Event {
                    weight: self.sample_weight(&mut weight_rng, &mut missing_rng),
                    muons: self.sample_muons(&mut muon_rng),
                    triggers: self.sample_triggers(&mut trigger_rng),
                })
                .collect();

            blocks.push(LuminosityBlock { id, header, events });
        }

        tracing::debug!(
            "Generated run {} with {} blocks of {} events",
            run,
            blocks.len(),
            self.config.events_per_block
        );
        RunData::new(run, blocks)
    }

    fn sample_weight(&self, rng: &mut SmallRng, missing_rng: &mut SmallRng) -> Option<f64> {
        if missing_rng.random_bool(self.config.weight.missing_fraction) {
            return None;
        }
        let magnitude = self.weight_dist.sample(rng);
        if rng.random_bool(self.config.weight.negative_fraction) {
            Some(-magnitude.abs())
        } else {
            Some(magnitude)
        }
    }

    fn sample_muons(&self, rng: &mut SmallRng) -> Vec<Muon> {
        let n = self.multiplicity_dist.sample(rng) as usize;
        (0..n)
            .map(|_| Muon {
                pt: self.pt_dist.sample(rng),
                eta: rng.random_range(-3.0..3.0),
                dxy: self.ip_dist.sample(rng),
                dz: self.ip_dist.sample(rng),
                is_medium: rng.random_bool(self.config.muons.medium_fraction),
            })
            .collect()
    }

    fn sample_triggers(&self, rng: &mut SmallRng) -> Vec<String> {
        self.config
            .trigger_paths
            .iter()
            .filter(|_| rng.random_bool(self.config.trigger_probability))
            .cloned()
            .collect()
    }
}
