//! Layer loading: read, merge, guard, type, hash.

use std::fs;

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::{secret_guard, MountSyncConfig};

/// A fully merged and validated configuration plus its fingerprint.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// SHA-256 hex of `canonical_json`.
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
    pub config: MountSyncConfig,
}

/// Load YAML files in order; later files override earlier ones.
pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let texts = paths
        .iter()
        .map(|p| fs::read_to_string(p).with_context(|| format!("config layer {p}: unreadable")))
        .collect::<Result<Vec<_>>>()?;
    let labelled: Vec<(&str, &str)> = paths
        .iter()
        .copied()
        .zip(texts.iter().map(String::as_str))
        .collect();
    load_labelled(&labelled)
}

/// Same as [`load_layered_yaml`] for in-memory documents. An empty slice
/// yields the built-in defaults.
pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let names: Vec<String> = (0..yaml_docs.len()).map(|i| format!("#{i}")).collect();
    let labelled: Vec<(&str, &str)> = names
        .iter()
        .map(String::as_str)
        .zip(yaml_docs.iter().copied())
        .collect();
    load_labelled(&labelled)
}

fn load_labelled(layers: &[(&str, &str)]) -> Result<LoadedConfig> {
    let mut merged = Value::Object(Map::new());
    for (name, text) in layers {
        let layer = parse_layer(name, text)?;
        overlay(&mut merged, layer);
    }

    secret_guard::check(&merged)?;

    let config: MountSyncConfig =
        serde_json::from_value(merged.clone()).context("CONFIG_INVALID: schema mismatch")?;
    config.validate()?;

    // serde_json maps are ordered by key, so this text is independent of the
    // key order in the source files.
    let canonical_json = serde_json::to_string(&merged)?;
    let config_hash = hex::encode(Sha256::digest(canonical_json.as_bytes()));
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
        config,
    })
}

fn parse_layer(name: &str, text: &str) -> Result<Value> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(text)
        .with_context(|| format!("CONFIG_INVALID: layer {name} is not valid yaml"))?;
    let json = serde_json::to_value(yaml)
        .with_context(|| format!("CONFIG_INVALID: layer {name} has non-string keys"))?;
    match json {
        Value::Null => Ok(Value::Object(Map::new())),
        Value::Object(_) => Ok(json),
        _ => anyhow::bail!("CONFIG_INVALID: layer {name} must be a mapping at top level"),
    }
}

/// Mappings merge key by key; anything else in `top` replaces `base`.
fn overlay(base: &mut Value, top: Value) {
    match (base, top) {
        (Value::Object(base_map), Value::Object(top_map)) => {
            for (key, value) in top_map {
                match base_map.get_mut(&key) {
                    Some(slot) => overlay(slot, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
