//! Config hash stability
//!
//! GREEN when:
//! - `load_layered_yaml_from_strings` called twice on the same inputs returns
//!   identical config_hash.
//! - Reordering keys within YAML doesn't change the hash (canonicalization).
//! - Different values produce different hashes.
//! - Overlays override base values and the typed view sees the override.

use cad_config::load_layered_yaml_from_strings;

const BASE_YAML: &str = r#"
portfolio:
  counterparty_count: 10
  initial_cet1_ratio: 0.14
  target_cet1_ratio: 0.125
generator:
  seed: 42
  pd_min: 0.001
  pd_max: 0.05
"#;

/// Same content as BASE_YAML but with keys in different order.
const BASE_YAML_REORDERED: &str = r#"
generator:
  pd_max: 0.05
  seed: 42
  pd_min: 0.001
portfolio:
  target_cet1_ratio: 0.125
  initial_cet1_ratio: 0.14
  counterparty_count: 10
"#;

const STRESS_OVERLAY_YAML: &str = r#"
portfolio:
  target_cet1_ratio: 0.16
allocation:
  max_reduction_fraction: 0.5
  floor_fraction: 0.5
"#;

#[test]
fn same_input_produces_identical_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    assert_eq!(a.config_hash, b.config_hash);
    assert_eq!(a.canonical_json, b.canonical_json);
}

#[test]
fn reordered_keys_produce_same_hash() {
    let original = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let reordered = load_layered_yaml_from_strings(&[BASE_YAML_REORDERED]).unwrap();
    assert_eq!(
        original.config_hash, reordered.config_hash,
        "reordering keys in YAML must not change the hash"
    );
}

#[test]
fn different_values_produce_different_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML, STRESS_OVERLAY_YAML]).unwrap();
    assert_ne!(a.config_hash, b.config_hash);
}

#[test]
fn overlay_overrides_base_and_keeps_siblings() {
    let loaded = load_layered_yaml_from_strings(&[BASE_YAML, STRESS_OVERLAY_YAML]).unwrap();
    let cfg = loaded.simulation().unwrap();

    assert_eq!(cfg.portfolio.target_cet1_ratio, 0.16);
    assert_eq!(cfg.portfolio.initial_cet1_ratio, 0.14);
    assert_eq!(cfg.portfolio.counterparty_count, 10);
    assert_eq!(cfg.generator.seed, Some(42));
    assert_eq!(cfg.allocation.floor_fraction, 0.5);
}

#[test]
fn empty_layer_does_not_wipe_base() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML, ""]).unwrap();
    assert_eq!(a.config_hash, b.config_hash);
}

#[test]
fn hash_is_64_hex_chars() {
    let loaded = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    assert_eq!(loaded.config_hash.len(), 64);
    assert!(loaded.config_hash.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn invalid_yaml_is_an_error() {
    let err = load_layered_yaml_from_strings(&["portfolio: [unclosed"]).unwrap_err();
    assert!(format!("{err:#}").contains("invalid yaml"));
}
