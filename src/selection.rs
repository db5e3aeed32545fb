use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};

/// Per-client test lists, e.g. `{"acme": ["Test Case 1", "Test Case 2"]}`.
pub type SelectionConfig = HashMap<String, Vec<String>>;

pub fn load(path: &Path) -> Result<SelectionConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}

/// Tests configured for `client`; empty when the client is unset or unknown.
pub fn tests_for_client(config: &SelectionConfig, client: Option<&str>) -> Vec<String> {
    client
        .and_then(|c| config.get(c))
        .cloned()
        .unwrap_or_default()
}

/// Resolve the selection for `client` and write it as a JSON array to `out`.
pub fn write_selection(config_path: &Path, out: &Path, client: Option<&str>) -> Result<Vec<String>> {
    let config = load(config_path)?;
    let tests = tests_for_client(&config, client);
    let json = serde_json::to_string(&tests)?;
    std::fs::write(out, json).with_context(|| format!("failed to write {}", out.display()))?;
    Ok(tests)
}
