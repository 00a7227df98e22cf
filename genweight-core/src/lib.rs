//! Genweight Core Library
//!
//! This crate provides the core functionality for accumulating generator-weight
//! statistics over an event stream: per-label weight counters, the
//! multi-stream runtime that reduces them per run, trigger and muon skims,
//! and a reproducible synthetic event source.

pub mod config;
pub mod error;
pub mod event;
pub mod label;
pub mod producer;
pub mod run;
pub mod seed;
pub mod skim;
pub mod source;
pub mod stats;
pub mod threading;

pub use config::{ProcessConfig, ProducerConfig, ProducerFlavor, RuntimeConfig};
pub use error::{Error, Result};
pub use event::{Event, EventDataset, LuminosityBlock, RunData};
pub use run::{JobSummary, RunReport, RunSummary};
pub use threading::{JobReport, ThreadingRuntime};
