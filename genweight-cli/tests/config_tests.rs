//! Tests for profile parsing and validation

use genweight_cli::config::{ProfileConfig, SourceConfig};
use genweight_core::config::ProducerFlavor;
use genweight_core::skim::TriggerMode;
use std::path::PathBuf;

#[test]
fn test_load_preskim_synthetic_profile() {
    let config = ProfileConfig::from_file("../profiles/preskim-synthetic.toml")
        .expect("Failed to load preskim-synthetic profile");
    config.validate().expect("profile should be valid");

    assert_eq!(config.job.name, "preskim-synthetic");
    assert_eq!(config.producer.flavor, ProducerFlavor::PreSkim);
    assert_eq!(config.producer.name_suffix, "PreSkim");
    assert_eq!(config.runtime.streams, 4);

    let trigger = config.skim.trigger.as_ref().expect("trigger filter configured");
    assert_eq!(trigger.mode, TriggerMode::Any);
    assert_eq!(trigger.paths.len(), 2);
    let muon = config.skim.muon.as_ref().expect("muon skim configured");
    assert_eq!(muon.leadmu_pt, 5.0);

    let SourceConfig::Synthetic(source) = &config.source else {
        panic!("expected synthetic source");
    };
    assert_eq!(source.seed, Some(42));
    assert_eq!(source.runs, 2);
    assert_eq!(source.models.len(), 2);
    assert_eq!(source.weight.negative_fraction, 0.05);
}

#[test]
fn test_load_genweight_dataset_profile() {
    let config = ProfileConfig::from_file("../profiles/genweight-dataset.toml")
        .expect("Failed to load genweight-dataset profile");

    assert_eq!(config.producer.flavor, ProducerFlavor::GenWeight);
    // Unspecified sections take their defaults
    assert_eq!(config.producer.name_suffix, "PreSkim");
    assert!(config.skim.trigger.is_none());
    assert!(config.skim.muon.is_none());
    assert!(!config.output.print);
    assert_eq!(
        config.output.events_file,
        Some(PathBuf::from("genweight-dataset.events.jsonl"))
    );

    let SourceConfig::Dataset { path } = &config.source else {
        panic!("expected dataset source");
    };
    assert_eq!(path, &PathBuf::from("data/events.json"));
}

#[test]
fn test_overrides_applied() {
    let overrides = vec![
        "runtime.streams=16".to_string(),
        "producer.flavor=gen-weight".to_string(),
        "source.seed=7".to_string(),
        "source.models.+=QCD-HT/200to300".to_string(),
        "skim.trigger.mode=all".to_string(),
    ];
    let config =
        ProfileConfig::from_file_with_overrides("../profiles/preskim-synthetic.toml", &overrides)
            .expect("overrides should apply");

    assert_eq!(config.runtime.streams, 16);
    assert_eq!(config.producer.flavor, ProducerFlavor::GenWeight);
    assert_eq!(config.skim.trigger.as_ref().map(|t| t.mode), Some(TriggerMode::All));
    let SourceConfig::Synthetic(source) = &config.source else {
        panic!("expected synthetic source");
    };
    assert_eq!(source.seed, Some(7));
    assert_eq!(source.models.last().map(String::as_str), Some("QCD-HT/200to300"));
}

#[test]
fn test_override_switches_source_kind() {
    let overrides = vec!["source.path=/tmp/events.json".to_string()];
    let config =
        ProfileConfig::from_file_with_overrides("../profiles/genweight-dataset.toml", &overrides)
            .unwrap();
    assert!(matches!(config.source, SourceConfig::Dataset { ref path } if path == &PathBuf::from("/tmp/events.json")));
}

#[test]
fn test_invalid_overrides_rejected() {
    let profile = "../profiles/preskim-synthetic.toml";

    let zero_streams = vec!["runtime.streams=0".to_string()];
    assert!(ProfileConfig::from_file_with_overrides(profile, &zero_streams).is_err());

    let bad_suffix = vec!["producer.name_suffix=Pre-Skim".to_string()];
    assert!(ProfileConfig::from_file_with_overrides(profile, &bad_suffix).is_err());

    let bad_fraction = vec!["source.weight.negative_fraction=2.0".to_string()];
    assert!(ProfileConfig::from_file_with_overrides(profile, &bad_fraction).is_err());

    let unknown_flavor = vec!["producer.flavor=post-skim".to_string()];
    assert!(ProfileConfig::from_file_with_overrides(profile, &unknown_flavor).is_err());

    let malformed = vec!["runtime.streams".to_string()];
    assert!(ProfileConfig::from_file_with_overrides(profile, &malformed).is_err());

    let empty_name = vec!["job.name=''".to_string()];
    assert!(ProfileConfig::from_file_with_overrides(profile, &empty_name).is_err());
}

#[test]
fn test_missing_profile_fails() {
    assert!(ProfileConfig::from_file("../profiles/does-not-exist.toml").is_err());
}
