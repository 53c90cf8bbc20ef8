// 🌍 Geography Fetcher - Tract boundaries from TIGERweb
// The geography result is the join backbone: every other source merges
// onto it by GEOID. Failure here degrades to "no units", never a crash.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::geoid;

/// TIGERweb Current, Layer 8 (census tracts).
pub const TIGERWEB_URL: &str =
    "https://tigerweb.geo.census.gov/arcgis/rest/services/TIGERweb/tigerWMS_Current/MapServer/8/query";

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// One tract as returned by the geography service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TractFeature {
    pub geoid: String,
    pub name: String,
    /// GeoJSON geometry, kept serialized — the store persists it as a
    /// blob and the map UI parses it, so we never interpret it.
    pub geometry: String,
}

pub struct GeographyFetcher {
    agent: ureq::Agent,
    url: String,
}

impl GeographyFetcher {
    pub fn new() -> Self {
        Self::with_url(TIGERWEB_URL)
    }

    /// Point at a different endpoint (tests, mirrors).
    pub fn with_url(url: &str) -> Self {
        GeographyFetcher {
            agent: ureq::AgentBuilder::new().timeout(FETCH_TIMEOUT).build(),
            url: url.to_string(),
        }
    }

    /// Fetch tract features for the given counties. Network and parse
    /// failures degrade to an empty list with a warning — the pipeline
    /// must tolerate zero geography.
    pub fn fetch(&self, state: &str, counties: &[String]) -> Vec<TractFeature> {
        println!("🌍 Fetching geography for counties {:?}...", counties);
        match self.try_fetch(state, counties) {
            Ok(tracts) => {
                println!("✓ Loaded {} valid tracts", tracts.len());
                tracts
            }
            Err(e) => {
                eprintln!("⚠️ Geography fetch failed: {:#}", e);
                Vec::new()
            }
        }
    }

    fn try_fetch(&self, state: &str, counties: &[String]) -> Result<Vec<TractFeature>> {
        let county_list = counties
            .iter()
            .map(|c| format!("'{}'", c))
            .collect::<Vec<_>>()
            .join(",");
        let where_clause = format!("STATE='{}' AND COUNTY IN ({})", state, county_list);

        let body: serde_json::Value = self
            .agent
            .get(&self.url)
            .query("where", &where_clause)
            .query("outFields", "GEOID,NAME")
            .query("f", "geojson")
            .call()
            .context("TIGERweb request failed")?
            .into_json()
            .context("TIGERweb response was not valid JSON")?;

        Ok(parse_feature_collection(&body))
    }
}

impl Default for GeographyFetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract tract features from a GeoJSON feature collection.
/// Features whose GEOID is not tract-level (state/county aggregates the
/// service sometimes includes) are silently dropped.
pub fn parse_feature_collection(body: &serde_json::Value) -> Vec<TractFeature> {
    let features = body.get("features").and_then(|f| f.as_array());

    let mut out = Vec::new();
    for feature in features.into_iter().flatten() {
        let props = feature.get("properties");
        let geoid = match props.and_then(|p| p.get("GEOID")).and_then(|g| g.as_str()) {
            Some(g) if geoid::is_tract_geoid(g) => g,
            _ => continue,
        };
        let name = props
            .and_then(|p| p.get("NAME"))
            .and_then(|n| n.as_str())
            .unwrap_or_default();
        let geometry = feature
            .get("geometry")
            .cloned()
            .unwrap_or(serde_json::Value::Null);

        out.push(TractFeature {
            geoid: geoid.to_string(),
            name: name.to_string(),
            geometry: geometry.to_string(),
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_keeps_only_tract_level_features() {
        let body = json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "properties": {"GEOID": "36045060100", "NAME": "601"},
                    "geometry": {"type": "Polygon", "coordinates": [[[0.0, 0.0]]]}
                },
                // county rollup: 5 digits, must be dropped
                {
                    "properties": {"GEOID": "36045", "NAME": "Jefferson"},
                    "geometry": {"type": "Polygon", "coordinates": [[[0.0, 0.0]]]}
                },
                // no GEOID at all
                {
                    "properties": {"NAME": "mystery"},
                    "geometry": null
                }
            ]
        });

        let tracts = parse_feature_collection(&body);
        assert_eq!(tracts.len(), 1);
        assert_eq!(tracts[0].geoid, "36045060100");
        assert_eq!(tracts[0].name, "601");
    }

    #[test]
    fn test_parse_serializes_geometry_for_storage() {
        let body = json!({
            "features": [{
                "properties": {"GEOID": "36045060100", "NAME": "601"},
                "geometry": {"type": "MultiPolygon", "coordinates": []}
            }]
        });

        let tracts = parse_feature_collection(&body);
        let geom: serde_json::Value = serde_json::from_str(&tracts[0].geometry).unwrap();
        assert_eq!(geom["type"], "MultiPolygon");
    }

    #[test]
    fn test_parse_tolerates_malformed_body() {
        assert!(parse_feature_collection(&json!({"error": "timeout"})).is_empty());
        assert!(parse_feature_collection(&json!(null)).is_empty());
        assert!(parse_feature_collection(&json!({"features": "nope"})).is_empty());
    }
}
