// ============================================================
// Layer 6 — Generic File and Map Utilities
// ============================================================
// Small persistence helpers shared across layers: JSON objects,
// one-string-per-line lists, and top-k selection over score maps.
// Writers create the output directory if it is missing; readers
// surface a NotFound-style error untouched.

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    collections::HashMap,
    fs,
    io::{BufRead, BufReader, Write},
    path::Path,
};

/// Serialize `obj` as JSON to `{dir}/{fname}`, creating `dir` if absent.
pub fn write_json<T: Serialize>(obj: &T, fname: &str, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;
    let path = dir.join(fname);
    let json = serde_json::to_string(obj)?;
    fs::write(&path, json)
        .with_context(|| format!("Cannot write JSON to '{}'", path.display()))?;
    Ok(())
}

/// Read and deserialize JSON from `{dir}/{fname}`.
pub fn read_json<T: DeserializeOwned>(fname: &str, dir: &Path) -> Result<T> {
    let path = dir.join(fname);
    let json = fs::read_to_string(&path)
        .with_context(|| format!("Cannot read JSON from '{}'", path.display()))?;
    Ok(serde_json::from_str(&json)?)
}

/// Write strings one per line to `{dir}/{fname}`, creating `dir` if absent.
/// Embedded newlines are not escaped.
pub fn write_list(items: &[String], fname: &str, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;
    let path = dir.join(fname);
    let mut f = fs::File::create(&path)
        .with_context(|| format!("Cannot create '{}'", path.display()))?;
    for item in items {
        writeln!(f, "{item}")?;
    }
    Ok(())
}

/// Read a one-string-per-line file, trimming surrounding whitespace.
pub fn read_list(fname: &str, dir: &Path) -> Result<Vec<String>> {
    let path = dir.join(fname);
    let f = fs::File::open(&path)
        .with_context(|| format!("Cannot open '{}'", path.display()))?;
    let mut items = Vec::new();
    for line in BufReader::new(f).lines() {
        items.push(line?.trim().to_string());
    }
    Ok(items)
}

/// The min(k, len) highest-scoring entries of a map, descending by score.
/// Equal scores break toward the smaller key, so the result is
/// deterministic.
pub fn top_k_entries(map: &HashMap<String, f64>, k: usize) -> Vec<(String, f64)> {
    let mut entries: Vec<(String, f64)> = map.iter().map(|(k, &v)| (k.clone(), v)).collect();
    entries.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    entries.truncate(k);
    entries
}
