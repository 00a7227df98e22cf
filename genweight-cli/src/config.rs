//! Configuration file support for genweight
//!
//! A job is described by a TOML profile: where events come from, which weight
//! producer runs, the skim applied after counting, the number of streams and
//! where results go. Any value can be overridden on the command line with
//! `--set key.path=value`.

use anyhow::{bail, Context, Result};
use genweight_core::config::{ProcessConfig, ProducerConfig, RuntimeConfig};
use genweight_core::event::EventDataset;
use genweight_core::skim::SkimConfig;
use genweight_core::source::{SyntheticConfig, SyntheticSource};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level profile configuration
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct ProfileConfig {
    pub job: JobConfig,
    #[serde(default)]
    pub producer: ProducerConfig,
    #[serde(default)]
    pub skim: SkimConfig,
    pub source: SourceConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
    pub output: OutputConfig,
}

/// Job metadata
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct JobConfig {
    /// Job name
    pub name: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
}

/// Where events come from
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceConfig {
    /// Seeded synthetic events
    Synthetic(SyntheticConfig),
    /// Recorded events in a JSON dataset file
    Dataset {
        /// Path to the dataset, relative to the working directory
        path: PathBuf,
    },
}

impl SourceConfig {
    /// Materialize the dataset; also returns the master seed of synthetic sources
    pub fn load(&self) -> Result<(EventDataset, Option<u64>)> {
        match self {
            SourceConfig::Synthetic(config) => {
                let source = SyntheticSource::new(config.clone())?;
                tracing::info!("Synthetic source, master seed {}", source.master_seed());
                Ok((source.generate(), Some(source.master_seed())))
            }
            SourceConfig::Dataset { path } => {
                let dataset = EventDataset::from_json_file(path)
                    .with_context(|| format!("Failed to load dataset: {}", path.display()))?;
                Ok((dataset, None))
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct OutputConfig {
    /// Output file path for the result tables (JSON)
    pub file: PathBuf,
    /// Optional JSON-lines file receiving one record per weighted event
    #[serde(default)]
    pub events_file: Option<PathBuf>,
    /// Print the human-readable summary
    #[serde(default = "default_print")]
    pub print: bool,
}

fn default_print() -> bool {
    true
}

impl ProfileConfig {
    /// Load profile from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: ProfileConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load profile from TOML file with --set style overrides
    pub fn from_file_with_overrides<P: AsRef<Path>>(path: P, overrides: &[String]) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut value: toml::Value = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        for override_str in overrides {
            let (key, val) = parse_key_value(override_str)
                .with_context(|| format!("Invalid override format: {}", override_str))?;

            set_toml_path(&mut value, &key, &val)
                .with_context(|| format!("Failed to apply override: {}", override_str))?;
        }

        let config: ProfileConfig = value
            .try_into()
            .with_context(|| "Failed to deserialize modified configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.job.name.is_empty() {
            bail!("Job name cannot be empty");
        }

        self.process_config().validate()?;

        match &self.source {
            SourceConfig::Synthetic(config) => config.validate()?,
            SourceConfig::Dataset { path } => {
                if path.as_os_str().is_empty() {
                    bail!("Dataset path cannot be empty");
                }
            }
        }

        if self.output.file.as_os_str().is_empty() {
            bail!("Output file cannot be empty");
        }
        if self.output.events_file.as_ref() == Some(&self.output.file) {
            bail!("Output file and events file must differ");
        }

        Ok(())
    }

    /// The core process configuration carried by this profile
    pub fn process_config(&self) -> ProcessConfig {
        ProcessConfig {
            producer: self.producer.clone(),
            skim: self.skim.clone(),
            runtime: self.runtime.clone(),
        }
    }
}

/// Parse a "key=value" string into (key, value) tuple
fn parse_key_value(override_str: &str) -> Result<(String, String)> {
    let Some((key, value)) = override_str.split_once('=') else {
        bail!("Invalid override format '{}'. Expected 'key=value'", override_str);
    };
    Ok((key.to_string(), value.to_string()))
}

/// Set a value in TOML using dot-notation path
fn set_toml_path(root: &mut toml::Value, path: &str, value_str: &str) -> Result<()> {
    let parts = parse_path(path);

    if parts.is_empty() {
        bail!("Empty path");
    }

    let mut current = root;
    for (i, part) in parts.iter().enumerate() {
        let is_last = i == parts.len() - 1;

        match part {
            PathSegment::Key(key) => {
                let toml::Value::Table(table) = current else {
                    bail!("Cannot set key '{}' on non-table value", key);
                };
                if is_last {
                    table.insert(key.clone(), parse_value(value_str)?);
                    return Ok(());
                }
                // Intermediate tables are created on demand
                current = table
                    .entry(key.clone())
                    .or_insert_with(|| toml::Value::Table(Default::default()));
            }
            PathSegment::Index(idx) => {
                let toml::Value::Array(arr) = current else {
                    bail!("Cannot index non-array value");
                };
                if *idx >= arr.len() {
                    bail!("Array index {} out of bounds (length: {})", idx, arr.len());
                }
                if is_last {
                    arr[*idx] = parse_value(value_str)?;
                    return Ok(());
                }
                current = &mut arr[*idx];
            }
            PathSegment::Append => {
                if !is_last {
                    bail!("Append operation '+' can only be at the end of path");
                }
                let toml::Value::Array(arr) = current else {
                    bail!("Cannot append to non-array value");
                };
                arr.push(parse_value(value_str)?);
                return Ok(());
            }
        }
    }

    Ok(())
}

/// Path segment types
enum PathSegment {
    Key(String),
    Index(usize),
    Append,
}

/// Parse a path string into segments (handles "key", "0", "+")
fn parse_path(path: &str) -> Vec<PathSegment> {
    path.split('.')
        .filter(|part| !part.is_empty())
        .map(|part| {
            if part == "+" {
                PathSegment::Append
            } else if let Ok(idx) = part.parse::<usize>() {
                PathSegment::Index(idx)
            } else {
                PathSegment::Key(part.to_string())
            }
        })
        .collect()
}

/// Parse a string value with type inference
fn parse_value(value_str: &str) -> Result<toml::Value> {
    let trimmed = value_str.trim();

    match trimmed {
        "true" => return Ok(toml::Value::Boolean(true)),
        "false" => return Ok(toml::Value::Boolean(false)),
        _ => {}
    }

    if let Ok(int_val) = trimmed.parse::<i64>() {
        return Ok(toml::Value::Integer(int_val));
    }
    if let Ok(float_val) = trimmed.parse::<f64>() {
        return Ok(toml::Value::Float(float_val));
    }

    // Arrays and inline tables go through the TOML parser
    let bracketed = (trimmed.starts_with('[') && trimmed.ends_with(']'))
        || (trimmed.starts_with('{') && trimmed.ends_with('}'));
    if bracketed {
        let wrapped = format!("value = {}", trimmed);
        if let Ok(toml::Value::Table(mut table)) = toml::from_str::<toml::Value>(&wrapped) {
            if let Some(value) = table.remove("value") {
                return Ok(value);
            }
        }
        bail!("Failed to parse value: {}", trimmed);
    }

    let string_val = if trimmed.len() >= 2
        && ((trimmed.starts_with('"') && trimmed.ends_with('"'))
            || (trimmed.starts_with('\'') && trimmed.ends_with('\'')))
    {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    };

    Ok(toml::Value::String(string_val.to_string()))
}
