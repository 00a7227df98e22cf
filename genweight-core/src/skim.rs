//! Event selection applied after the weights have been counted
//!
//! The chain is a trigger-path filter followed by a muon multiplicity skim.
//! Both stages are plain per-event predicates; they never touch the
//! counters, which always see every event.

use crate::event::{Event, Muon};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// How trigger patterns combine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum TriggerMode {
    /// Accept if any pattern matches a fired path
    #[default]
    Any,
    /// Accept only if every pattern matches a fired path
    All,
}

/// Trigger-path filter configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct TriggerFilterConfig {
    /// Path name patterns; `*` matches any run of characters
    pub paths: Vec<String>,
    #[serde(default)]
    pub mode: TriggerMode,
}

/// Accepts events whose fired trigger paths match the configured patterns
#[derive(Debug, Clone)]
pub struct TriggerFilter {
    patterns: Vec<String>,
    mode: TriggerMode,
}

impl TriggerFilter {
    pub fn new(config: &TriggerFilterConfig) -> Self {
        Self { patterns: config.paths.clone(), mode: config.mode }
    }

    pub fn accept(&self, event: &Event) -> bool {
        let fired = |pattern: &str| event.triggers.iter().any(|path| wildcard_match(pattern, path));
        match self.mode {
            TriggerMode::Any => self.patterns.iter().any(|p| fired(p)),
            TriggerMode::All => self.patterns.iter().all(|p| fired(p)),
        }
    }
}

/// Glob match supporting only `*`
fn wildcard_match(pattern: &str, text: &str) -> bool {
    let mut parts = pattern.split('*');
    let Some(first) = parts.next() else {
        return text.is_empty();
    };
    let Some(mut rest) = text.strip_prefix(first) else {
        return false;
    };

    let mut parts: Vec<&str> = parts.collect();
    let Some(last) = parts.pop() else {
        // No '*' at all: exact match.
        return rest.is_empty();
    };

    for part in parts {
        match rest.find(part) {
            Some(pos) => rest = &rest[pos + part.len()..],
            None => return false,
        }
    }
    rest.ends_with(last)
}

/// Muon skim thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct MuonSkimConfig {
    #[serde(default = "default_mu_minpt")]
    pub mu_minpt: f64,
    #[serde(default = "default_mu_maxeta")]
    pub mu_maxeta: f64,
    #[serde(default = "default_mu_dxy")]
    pub mu_dxy: f64,
    #[serde(default = "default_mu_dz")]
    pub mu_dz: f64,
    /// At least one selected muon must exceed this pt
    #[serde(default = "default_leadmu_pt")]
    pub leadmu_pt: f64,
}

fn default_mu_minpt() -> f64 {
    3.0
}

fn default_mu_maxeta() -> f64 {
    2.5
}

fn default_mu_dxy() -> f64 {
    0.2
}

fn default_mu_dz() -> f64 {
    0.2
}

fn default_leadmu_pt() -> f64 {
    5.0
}

impl Default for MuonSkimConfig {
    fn default() -> Self {
        Self {
            mu_minpt: default_mu_minpt(),
            mu_maxeta: default_mu_maxeta(),
            mu_dxy: default_mu_dxy(),
            mu_dz: default_mu_dz(),
            leadmu_pt: default_leadmu_pt(),
        }
    }
}

/// Accepts events with more than two selected muons, one of them leading
#[derive(Debug, Clone)]
pub struct MuonSkim {
    config: MuonSkimConfig,
}

impl MuonSkim {
    /// Minimum number of selected muons is this plus one
    const MIN_MUONS_EXCLUSIVE: usize = 2;

    pub fn new(config: MuonSkimConfig) -> Self {
        Self { config }
    }

    fn selected(&self, muon: &Muon) -> bool {
        muon.eta.abs() < self.config.mu_maxeta
            && muon.pt > self.config.mu_minpt
            && muon.dxy.abs() < self.config.mu_dxy
            && muon.dz.abs() < self.config.mu_dz
            && muon.is_medium
    }

    pub fn accept(&self, event: &Event) -> bool {
        let mut n_selected = 0;
        let mut has_leading = false;
        for muon in event.muons.iter().filter(|m| self.selected(m)) {
            n_selected += 1;
            if muon.pt > self.config.leadmu_pt {
                has_leading = true;
            }
        }
        n_selected > Self::MIN_MUONS_EXCLUSIVE && has_leading
    }
}

/// Skim chain configuration; a missing stage accepts everything
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct SkimConfig {
    #[serde(default)]
    pub trigger: Option<TriggerFilterConfig>,
    #[serde(default)]
    pub muon: Option<MuonSkimConfig>,
}

impl SkimConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(trigger) = &self.trigger {
            if trigger.paths.is_empty() {
                return Err(Error::Config("trigger filter needs at least one path".to_string()));
            }
        }
        if let Some(muon) = &self.muon {
            let cuts = [muon.mu_minpt, muon.mu_maxeta, muon.mu_dxy, muon.mu_dz, muon.leadmu_pt];
            if cuts.iter().any(|c| !c.is_finite() || *c < 0.0) {
                return Err(Error::Config("muon skim cuts must be finite and >= 0".to_string()));
            }
        }
        Ok(())
    }
}

/// Trigger filter then muon skim
#[derive(Debug, Clone, Default)]
pub struct SkimChain {
    trigger: Option<TriggerFilter>,
    muon: Option<MuonSkim>,
}

impl SkimChain {
    pub fn new(config: &SkimConfig) -> Self {
        Self {
            trigger: config.trigger.as_ref().map(TriggerFilter::new),
            muon: config.muon.clone().map(MuonSkim::new),
        }
    }

    pub fn accept(&self, event: &Event) -> bool {
        if let Some(trigger) = &self.trigger {
            if !trigger.accept(event) {
                return false;
            }
        }
        self.muon.as_ref().map_or(true, |skim| skim.accept(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn good_muon(pt: f64) -> Muon {
        Muon { pt, eta: 0.5, dxy: 0.01, dz: 0.02, is_medium: true }
    }

    fn event_with(muons: Vec<Muon>, triggers: &[&str]) -> Event {
        Event {
            weight: Some(1.0),
            muons,
            triggers: triggers.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_wildcard_match() {
        assert!(wildcard_match("HLT_TripleMu_12_10_5_v*", "HLT_TripleMu_12_10_5_v3"));
        assert!(wildcard_match("HLT_TripleMu_12_10_5_v*", "HLT_TripleMu_12_10_5_v"));
        assert!(!wildcard_match("HLT_TripleMu_12_10_5_v*", "HLT_DoubleMu_v1"));
        assert!(wildcard_match("HLT_*_DZ_v*", "HLT_TripleMu_10_5_5_DZ_v2"));
        assert!(wildcard_match("exact", "exact"));
        assert!(!wildcard_match("exact", "exact_v1"));
        assert!(wildcard_match("*", "anything"));
    }

    #[test]
    fn test_trigger_any() {
        let filter = TriggerFilter::new(&TriggerFilterConfig {
            paths: vec!["HLT_TripleMu_5_3_3_v*".into(), "HLT_TripleMu_12_10_5_v*".into()],
            mode: TriggerMode::Any,
        });
        assert!(filter.accept(&event_with(vec![], &["HLT_TripleMu_12_10_5_v2"])));
        assert!(!filter.accept(&event_with(vec![], &["HLT_Mu50_v1"])));
        assert!(!filter.accept(&event_with(vec![], &[])));
    }

    #[test]
    fn test_trigger_all() {
        let filter = TriggerFilter::new(&TriggerFilterConfig {
            paths: vec!["A_v*".into(), "B_v*".into()],
            mode: TriggerMode::All,
        });
        assert!(filter.accept(&event_with(vec![], &["A_v1", "B_v4"])));
        assert!(!filter.accept(&event_with(vec![], &["A_v1"])));
    }

    #[test]
    fn test_muon_skim_needs_three_muons() {
        let skim = MuonSkim::new(MuonSkimConfig::default());
        let two = event_with(vec![good_muon(10.0), good_muon(4.0)], &[]);
        assert!(!skim.accept(&two));

        let three = event_with(vec![good_muon(10.0), good_muon(4.0), good_muon(3.5)], &[]);
        assert!(skim.accept(&three));
    }

    #[test]
    fn test_muon_skim_needs_leading_muon() {
        let skim = MuonSkim::new(MuonSkimConfig::default());
        let soft = event_with(vec![good_muon(4.0), good_muon(4.5), good_muon(3.5)], &[]);
        assert!(!skim.accept(&soft));
    }

    #[test]
    fn test_muon_selection_cuts() {
        let skim = MuonSkim::new(MuonSkimConfig::default());
        let mut forward = good_muon(10.0);
        forward.eta = -2.7;
        let mut displaced = good_muon(10.0);
        displaced.dxy = -0.3;
        let mut loose = good_muon(10.0);
        loose.is_medium = false;

        for bad in [forward, displaced, loose] {
            let event = event_with(vec![bad, good_muon(4.0), good_muon(4.0)], &[]);
            assert!(!skim.accept(&event));
        }
    }

    #[test]
    fn test_chain_order_and_defaults() {
        let open = SkimChain::new(&SkimConfig::default());
        assert!(open.accept(&Event::weighted(1.0)));

        let chain = SkimChain::new(&SkimConfig {
            trigger: Some(TriggerFilterConfig { paths: vec!["HLT_*".into()], mode: TriggerMode::Any }),
            muon: Some(MuonSkimConfig::default()),
        });
        let muons = vec![good_muon(10.0), good_muon(4.0), good_muon(4.0)];
        assert!(chain.accept(&event_with(muons.clone(), &["HLT_X"])));
        assert!(!chain.accept(&event_with(muons, &[])));
    }

    #[test]
    fn test_validate() {
        let empty_trigger = SkimConfig {
            trigger: Some(TriggerFilterConfig::default()),
            muon: None,
        };
        assert!(matches!(empty_trigger.validate(), Err(Error::Config(_))));

        let negative = SkimConfig {
            trigger: None,
            muon: Some(MuonSkimConfig { mu_dz: -1.0, ..Default::default() }),
        };
        assert!(negative.validate().is_err());
    }
}
