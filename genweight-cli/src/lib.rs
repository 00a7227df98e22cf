//! Genweight CLI library
//!
//! This library exposes configuration and output types for testing and reuse.

pub mod completions;
pub mod config;
pub mod output;
