//! cad-config
//!
//! Layered YAML configuration for simulation runs.
//! - Documents merge in order; later layers override earlier ones key by key
//! - The merged document is hashed over its canonical (sorted-key) JSON
//! - Keys nothing reads are reported, and rejected under `UnusedKeyPolicy::Fail`

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fs;

mod settings;

pub use settings::{AllocationSection, GeneratorSection, PortfolioSection, SimulationConfig};

/// Every leaf `SimulationConfig` reads, as a JSON pointer.
///
/// An entry also covers anything nested below it, so `/generator` would
/// cover the whole section.
pub const CONSUMED_POINTERS: &[&str] = &[
    "/portfolio/counterparty_count",
    "/portfolio/initial_cet1_ratio",
    "/portfolio/target_cet1_ratio",
    "/generator/seed",
    "/generator/pd_min",
    "/generator/pd_max",
    "/generator/lgd_min",
    "/generator/lgd_max",
    "/generator/exposure_min",
    "/generator/exposure_max",
    "/allocation/max_reduction_fraction",
    "/allocation/floor_fraction",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnusedKeyPolicy {
    Warn,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnusedKeyReport {
    /// Registry the document was checked against, sorted and deduplicated.
    pub consumed_prefixes: Vec<String>,
    /// Leaves no registry entry covers, sorted.
    pub unused_leaf_pointers: Vec<String>,
}

impl UnusedKeyReport {
    pub fn is_clean(&self) -> bool {
        self.unused_leaf_pointers.is_empty()
    }
}

/// Check `config_json` against [`CONSUMED_POINTERS`].
pub fn report_unused_keys(config_json: &Value, policy: UnusedKeyPolicy) -> Result<UnusedKeyReport> {
    report_unused_keys_against(CONSUMED_POINTERS, config_json, policy)
}

/// Check `config_json` against an explicit registry. `Fail` turns a
/// non-empty report into a `CONFIG_UNUSED_KEYS` error.
pub fn report_unused_keys_against(
    consumed_pointers: &[&str],
    config_json: &Value,
    policy: UnusedKeyPolicy,
) -> Result<UnusedKeyReport> {
    let registry: BTreeSet<String> = consumed_pointers.iter().map(|p| trim_pointer(p)).collect();

    let mut leaves = BTreeSet::new();
    walk_leaves(config_json, String::new(), &mut leaves);

    let unused: Vec<String> = leaves
        .into_iter()
        .filter(|leaf| !registry.iter().any(|entry| covers(entry, leaf)))
        .collect();

    if policy == UnusedKeyPolicy::Fail && !unused.is_empty() {
        let shown: Vec<&str> = unused.iter().take(12).map(String::as_str).collect();
        bail!(
            "CONFIG_UNUSED_KEYS: {} config key(s) are not read by the simulator \
             (typo or stale layer?): {}",
            unused.len(),
            shown.join(", ")
        );
    }

    Ok(UnusedKeyReport {
        consumed_prefixes: registry.into_iter().collect(),
        unused_leaf_pointers: unused,
    })
}

/// Leading `/`, no trailing `/` (the root stays `/`).
fn trim_pointer(p: &str) -> String {
    let body = p.trim().trim_end_matches('/');
    if body.starts_with('/') {
        body.to_string()
    } else {
        format!("/{body}")
    }
}

/// `entry` covers `leaf` when it is the leaf or one of its ancestors.
/// `/a/b` covers `/a/b/c` but not `/a/bc`.
fn covers(entry: &str, leaf: &str) -> bool {
    entry == "/"
        || match leaf.strip_prefix(entry) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
}

fn walk_leaves(v: &Value, path: String, out: &mut BTreeSet<String>) {
    match v {
        Value::Object(map) => {
            for (key, child) in map {
                // RFC 6901 escaping: `~` first, then `/`.
                let token = key.replace('~', "~0").replace('/', "~1");
                walk_leaves(child, format!("{path}/{token}"), out);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                walk_leaves(child, format!("{path}/{i}"), out);
            }
        }
        _ if path.is_empty() => {
            out.insert("/".to_string());
        }
        _ => {
            out.insert(path);
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// SHA-256 of `canonical_json`, lowercase hex.
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

impl LoadedConfig {
    /// Typed view of the merged document (defaults fill missing keys).
    pub fn simulation(&self) -> Result<SimulationConfig> {
        SimulationConfig::from_json(&self.config_json)
    }
}

/// Read and merge YAML files, first path is the base layer.
pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let docs = paths
        .iter()
        .map(|p| fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}")))
        .collect::<Result<Vec<String>>>()?;
    let refs: Vec<&str> = docs.iter().map(String::as_str).collect();
    load_layered_yaml_from_strings(&refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = Value::Object(serde_json::Map::new());
    for (layer, raw) in yaml_docs.iter().enumerate() {
        let doc: serde_yaml::Value =
            serde_yaml::from_str(raw).with_context(|| format!("invalid yaml in layer {layer}"))?;
        let doc = serde_json::to_value(doc)
            .with_context(|| format!("layer {layer} is not representable as JSON"))?;
        // An empty document parses to null and must not wipe earlier layers.
        if !doc.is_null() {
            overlay(&mut merged, doc);
        }
    }

    // serde_json::Map is BTreeMap-backed here, so keys serialize sorted.
    let canonical_json = serde_json::to_string(&merged).context("canonical json serialize failed")?;
    let config_hash = hex::encode(Sha256::digest(canonical_json.as_bytes()));
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

/// Objects merge recursively; anything else in `top` replaces `base`.
fn overlay(base: &mut Value, top: Value) {
    match (base, top) {
        (Value::Object(base_map), Value::Object(top_map)) => {
            for (key, top_val) in top_map {
                match base_map.get_mut(&key) {
                    Some(base_val) => overlay(base_val, top_val),
                    None => {
                        base_map.insert(key, top_val);
                    }
                }
            }
        }
        (slot, top) => *slot = top,
    }
}
