// 📈 Vulnerability Loader - SVI scores from a delimited file
// The file's schema varies by vintage: column names are negotiated
// against alias lists instead of assuming positions. Identifiers are
// fixed-width codes, never numbers — leading zeros must survive.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::SourceError;

/// Accepted names for the identifier column, case-insensitive.
pub const GEOID_ALIASES: [&str; 3] = ["FIPS", "GEOID", "STCOFIPS"];

/// Accepted names for the overall score column, case-insensitive.
pub const SCORE_ALIASES: [&str; 3] = ["RPL_THEMES", "SVI", "RPL_THEMES_OVERALL"];

/// Resolved column positions after schema negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub geoid: usize,
    pub score: usize,
}

/// Locate the identifier and score columns by alias. Returns a typed
/// failure naming the missing column and the headers actually seen.
pub fn resolve_columns(headers: &csv::StringRecord) -> Result<ColumnMap, SourceError> {
    let find = |aliases: &[&str]| {
        headers
            .iter()
            .position(|h| aliases.iter().any(|a| a.eq_ignore_ascii_case(h.trim())))
    };
    let unrecognized = |missing| SourceError::SchemaUnrecognized {
        missing,
        headers: headers.iter().map(str::to_string).collect(),
    };

    let geoid = find(&GEOID_ALIASES).ok_or_else(|| unrecognized("identifier"))?;
    let score = find(&SCORE_ALIASES).ok_or_else(|| unrecognized("score"))?;
    Ok(ColumnMap { geoid, score })
}

/// Validate a raw score against [0,1]. The CDC encodes missing data as
/// -999, which lands here along with any other out-of-band value.
pub fn check_score(value: f64) -> Result<f64, SourceError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(SourceError::ValueOutOfRange { value })
    }
}

/// Load the SVI mapping from a file. Never raises: an unreadable file or
/// unrecognized schema degrades to an empty mapping with a warning, and
/// the merge step's default covers every tract.
pub fn load_svi(path: &Path) -> HashMap<String, f64> {
    println!("📈 Loading SVI from {}...", path.display());
    match try_load(path) {
        Ok(map) => {
            println!("✓ Mapped SVI for {} tracts", map.len());
            map
        }
        Err(e) => {
            eprintln!("⚠️ SVI load failed: {:#}", e);
            HashMap::new()
        }
    }
}

fn try_load(path: &Path) -> Result<HashMap<String, f64>> {
    let file = File::open(path)
        .with_context(|| format!("failed to open vulnerability file: {}", path.display()))?;
    load_from_reader(file)
}

/// Reader-based loader so tests can feed CSV text directly.
pub fn load_from_reader<R: Read>(reader: R) -> Result<HashMap<String, f64>> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rdr
        .headers()
        .context("vulnerability file has no header row")?
        .clone();
    let columns = resolve_columns(&headers)?;

    let mut out = HashMap::new();
    for record in rdr.records() {
        let record = match record {
            Ok(r) => r,
            Err(_) => continue, // ragged or unparseable row
        };

        let geoid = match record.get(columns.geoid).map(str::trim) {
            Some(g) if !g.is_empty() => g.to_string(),
            _ => continue,
        };
        let raw: f64 = match record.get(columns.score).and_then(|s| s.trim().parse().ok()) {
            Some(v) => v,
            None => continue,
        };
        // Sentinel / out-of-range values are excluded, not clamped;
        // the gap is filled by the merge default.
        if let Ok(score) = check_score(raw) {
            out.insert(geoid, score);
        }
    }
    Ok(out)
}
