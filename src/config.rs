//! Variable sources for tplexpand.
//! Loads variables files (JSON or YAML) and `NAME=VALUE` assignments and
//! merges them into one [`VariableTable`].

use crate::error::{Error, Result};
use crate::resolver::VariableTable;
use indexmap::IndexMap;
use log::debug;
use std::path::Path;

/// Reads a variables file from disk.
///
/// # Arguments
/// * `path` - JSON or YAML file whose root is a mapping
///
/// # Returns
/// * `Result<VariableTable>` - Flattened variables in file order
///
/// # Errors
/// * `Error::IoError` if the file cannot be read
/// * `Error::ConfigError` if the content is not a mapping of scalars
pub fn load_variables_file<P: AsRef<Path>>(path: P) -> Result<VariableTable> {
    let path = path.as_ref();
    debug!("Loading variables from {}", path.display());
    let content = std::fs::read_to_string(path)?;
    parse_variables(&content)
        .map_err(|e| Error::ConfigError(format!("{}: {}", path.display(), config_reason(e))))
}

fn config_reason(err: Error) -> String {
    match err {
        Error::ConfigError(reason) => reason,
        other => other.to_string(),
    }
}

/// Parses variables content, trying JSON first and YAML second.
///
/// Scalars are stringified, `null` becomes the empty string and nested
/// mappings are flattened with `.` (`{a: {b: 1}}` defines `a.b`).
pub fn parse_variables(content: &str) -> Result<VariableTable> {
    let raw: IndexMap<String, serde_json::Value> = match serde_json::from_str(content) {
        Ok(v) => v,
        Err(_) => serde_yaml::from_str(content)
            .map_err(|e| Error::ConfigError(format!("Invalid variables format: {}", e)))?,
    };

    let mut table = VariableTable::new();
    for (key, value) in raw {
        flatten(&key, &value, &mut table)?;
    }
    Ok(table)
}

fn flatten(prefix: &str, value: &serde_json::Value, out: &mut VariableTable) -> Result<()> {
    match value {
        serde_json::Value::Object(map) => {
            for (k, v) in map {
                flatten(&format!("{prefix}.{k}"), v, out)?;
            }
        }
        serde_json::Value::String(s) => out.insert(prefix, s.as_str()),
        serde_json::Value::Number(n) => out.insert(prefix, n.to_string()),
        serde_json::Value::Bool(b) => out.insert(prefix, b.to_string()),
        serde_json::Value::Null => out.insert(prefix, ""),
        serde_json::Value::Array(_) => {
            return Err(Error::ConfigError(format!(
                "variable '{prefix}' is a list, only scalar values are supported"
            )))
        }
    }
    Ok(())
}

/// Parses a `NAME=VALUE` assignment. The value may be empty and may
/// contain further `=` characters.
pub fn parse_assignment(s: &str) -> std::result::Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid assignment '{s}', expected NAME=VALUE"))?;
    if name.is_empty() {
        return Err(format!("invalid assignment '{s}', variable name is empty"));
    }
    Ok((name.to_string(), value.to_string()))
}

/// Builds the variable table for a run. Files apply in order, then
/// assignments in order; a later definition replaces an earlier one.
pub fn collect_variables<P: AsRef<Path>>(
    files: &[P],
    assignments: &[(String, String)],
) -> Result<VariableTable> {
    let mut table = VariableTable::new();
    for file in files {
        table.merge(load_variables_file(file)?);
    }
    table.merge(assignments.iter().cloned().collect());
    debug!("Collected {} variables", table.len());
    Ok(table)
}
