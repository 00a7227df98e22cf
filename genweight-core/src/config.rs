//! Configuration types for genweight core

use crate::label::LabelPolicy;
use crate::skim::SkimConfig;
use crate::stats::ColumnNames;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Which weight producer runs on each stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "kebab-case")]
pub enum ProducerFlavor {
    /// Single global counter, no per-event model tag
    GenWeight,
    /// Counters keyed by the model label of each luminosity block
    #[default]
    PreSkim,
}

impl ProducerFlavor {
    /// Name as written in profiles and result files
    pub fn as_str(&self) -> &'static str {
        match self {
            ProducerFlavor::GenWeight => "gen-weight",
            ProducerFlavor::PreSkim => "pre-skim",
        }
    }

    /// Label policy this flavor resolves blocks with
    pub fn label_policy(&self) -> LabelPolicy {
        match self {
            ProducerFlavor::GenWeight => LabelPolicy::Fixed,
            ProducerFlavor::PreSkim => LabelPolicy::Dynamic,
        }
    }

    /// Whether events are tagged with their model label
    pub fn emits_model_tag(&self) -> bool {
        matches!(self, ProducerFlavor::PreSkim)
    }
}

/// Weight producer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct ProducerConfig {
    #[serde(default)]
    pub flavor: ProducerFlavor,
    /// Appended to every output column name, e.g. `genEventSumw<suffix>`
    #[serde(default = "default_name_suffix")]
    pub name_suffix: String,
}

fn default_name_suffix() -> String {
    "PreSkim".to_string()
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self { flavor: ProducerFlavor::default(), name_suffix: default_name_suffix() }
    }
}

impl ProducerConfig {
    pub fn with_flavor(flavor: ProducerFlavor) -> Self {
        Self { flavor, ..Default::default() }
    }

    pub fn column_names(&self) -> ColumnNames {
        ColumnNames::with_suffix(&self.name_suffix)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name_suffix.contains(['-', '/']) {
            return Err(Error::Config(format!(
                "name_suffix '{}' contains characters not allowed in column names",
                self.name_suffix
            )));
        }
        Ok(())
    }
}

/// Stream runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct RuntimeConfig {
    /// Number of concurrent streams
    #[serde(default = "default_streams")]
    pub streams: usize,
}

fn default_streams() -> usize {
    4
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self { streams: default_streams() }
    }
}

impl RuntimeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.streams == 0 {
            return Err(Error::Config("streams must be > 0".to_string()));
        }
        Ok(())
    }
}

/// Everything a job needs to process events
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct ProcessConfig {
    #[serde(default)]
    pub producer: ProducerConfig,
    #[serde(default)]
    pub skim: SkimConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

impl ProcessConfig {
    pub fn validate(&self) -> Result<()> {
        self.producer.validate()?;
        self.skim.validate()?;
        self.runtime.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flavor_policies() {
        assert_eq!(ProducerFlavor::GenWeight.label_policy(), LabelPolicy::Fixed);
        assert_eq!(ProducerFlavor::PreSkim.label_policy(), LabelPolicy::Dynamic);
        assert!(!ProducerFlavor::GenWeight.emits_model_tag());
        assert!(ProducerFlavor::PreSkim.emits_model_tag());
    }

    #[test]
    fn test_defaults_from_empty_json() {
        let config: ProcessConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.producer.flavor, ProducerFlavor::PreSkim);
        assert_eq!(config.producer.name_suffix, "PreSkim");
        assert_eq!(config.runtime.streams, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_flavor_kebab_case() {
        let config: ProducerConfig = serde_json::from_str(r#"{"flavor":"gen-weight"}"#).unwrap();
        assert_eq!(config.flavor, ProducerFlavor::GenWeight);
        for flavor in [ProducerFlavor::GenWeight, ProducerFlavor::PreSkim] {
            assert_eq!(serde_json::to_value(flavor).unwrap(), flavor.as_str());
        }
    }

    #[test]
    fn test_invalid_values() {
        let producer = ProducerConfig { name_suffix: "Pre-Skim".into(), ..Default::default() };
        assert!(matches!(producer.validate(), Err(Error::Config(_))));

        let runtime = RuntimeConfig { streams: 0 };
        assert!(matches!(runtime.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_column_names_follow_suffix() {
        let producer = ProducerConfig { name_suffix: "".into(), ..Default::default() };
        assert_eq!(producer.column_names().count, "genEventCount");
    }
}
