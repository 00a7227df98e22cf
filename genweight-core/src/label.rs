//! Model label resolution
//!
//! At the start of each luminosity block the producer decides which label
//! the following events are counted under. The fixed policy always uses the
//! empty label (one global counter). The dynamic policy takes the model
//! string from the block's generator header.

use crate::event::LuminosityBlock;
use serde::{Deserialize, Serialize};

/// Characters that may not appear in output column names
const FORBIDDEN_CHARS: [char; 2] = ['-', '/'];

/// Prefix of the per-event model tag
pub const MODEL_TAG_PREFIX: &str = "GenModel_";

/// How the active label is chosen for each block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "kebab-case")]
pub enum LabelPolicy {
    /// Always the empty label
    #[default]
    Fixed,
    /// Sanitized model string from the block header, empty if absent
    Dynamic,
}

impl LabelPolicy {
    /// Label for the events of `block`
    pub fn resolve(&self, block: &LuminosityBlock) -> String {
        match self {
            LabelPolicy::Fixed => String::new(),
            LabelPolicy::Dynamic => match block.valid_header() {
                Some(header) => sanitize_label(&header.config_description),
                None => {
                    tracing::debug!("Block {} has no valid generator header", block.id);
                    String::new()
                }
            },
        }
    }
}

/// Replace characters forbidden in output names with `_`
pub fn sanitize_label(raw: &str) -> String {
    raw.replace(FORBIDDEN_CHARS, "_")
}

/// Per-event model tag: `GenModel_<label>`, or empty for the empty label
pub fn model_tag(label: &str) -> String {
    if label.is_empty() {
        String::new()
    } else {
        format!("{MODEL_TAG_PREFIX}{label}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{GenLumiInfoHeader, LuminosityBlock};

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize_label("QCD-HT/100to200"), "QCD_HT_100to200");
        assert_eq!(sanitize_label("plain"), "plain");
        assert_eq!(sanitize_label("a--b//c"), "a__b__c");
        assert_eq!(sanitize_label(""), "");
    }

    #[test]
    fn test_sanitized_output_suffix() {
        let label = sanitize_label("QCD-HT/100to200");
        assert_eq!(format!("_{label}"), "_QCD_HT_100to200");
    }

    #[test]
    fn test_fixed_ignores_header() {
        let block = LuminosityBlock::with_model(1, "SUEP-mS125/T2", vec![]);
        assert_eq!(LabelPolicy::Fixed.resolve(&block), "");
    }

    #[test]
    fn test_dynamic_uses_header() {
        let block = LuminosityBlock::with_model(1, "SUEP-mS125/T2", vec![]);
        assert_eq!(LabelPolicy::Dynamic.resolve(&block), "SUEP_mS125_T2");
    }

    #[test]
    fn test_dynamic_without_header() {
        let block = LuminosityBlock::new(3, vec![]);
        assert_eq!(LabelPolicy::Dynamic.resolve(&block), "");

        let invalid = LuminosityBlock {
            id: 4,
            header: Some(GenLumiInfoHeader { config_description: "x".into(), valid: false }),
            events: vec![],
        };
        assert_eq!(LabelPolicy::Dynamic.resolve(&invalid), "");
    }

    #[test]
    fn test_model_tag() {
        assert_eq!(model_tag("modelA"), "GenModel_modelA");
        assert_eq!(model_tag(""), "");
    }
}
