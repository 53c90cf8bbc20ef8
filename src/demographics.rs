// 📊 Demographics Fetcher - ACS 5-Year Profile
// ACS returns the GEOID decomposed into trailing state/county/tract
// fields; they must be concatenated (in that order) to match the
// geography source's composite key.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::geoid;

/// ACS 5-Year Data Profile endpoint.
pub const ACS_URL: &str = "https://api.census.gov/data/2023/acs/acs5/profile";

/// Requested variables, in order. Row parsing indexes by these
/// positions, so order matters:
/// total pop, under 18, 65+, white, Black, Hispanic, uninsured %, broadband %.
pub const ACS_VARIABLES: [&str; 8] = [
    "DP05_0001E",
    "DP05_0019E",
    "DP05_0024E",
    "DP05_0037E",
    "DP05_0038E",
    "DP05_0071E",
    "DP03_0099PE",
    "DP02_0153PE",
];

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Percentage attributes for one tract. All fields are optional: a tract
/// with no matching ACS row carries the default (everything absent),
/// which serializes to `{}` rather than null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DemographicProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pop: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pct_under_18: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pct_senior: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pct_white: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pct_black: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pct_hispanic: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pct_uninsured: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pct_broadband: Option<f64>,
}

pub struct DemographicsFetcher {
    agent: ureq::Agent,
    url: String,
}

impl DemographicsFetcher {
    pub fn new() -> Self {
        Self::with_url(ACS_URL)
    }

    pub fn with_url(url: &str) -> Self {
        DemographicsFetcher {
            agent: ureq::AgentBuilder::new().timeout(FETCH_TIMEOUT).build(),
            url: url.to_string(),
        }
    }

    /// Fetch demographics keyed by composite GEOID. On failure the
    /// mapping is simply empty — downstream tracts get default
    /// profiles, not an error.
    pub fn fetch(&self, state: &str, counties: &[String]) -> HashMap<String, DemographicProfile> {
        println!("📊 Fetching demographics (age, race, insurance, broadband)...");
        match self.try_fetch(state, counties) {
            Ok(map) => {
                println!("✓ Demographics for {} tracts", map.len());
                map
            }
            Err(e) => {
                eprintln!("⚠️ Demographics fetch failed: {:#}", e);
                HashMap::new()
            }
        }
    }

    fn try_fetch(
        &self,
        state: &str,
        counties: &[String],
    ) -> Result<HashMap<String, DemographicProfile>> {
        let body: serde_json::Value = self
            .agent
            .get(&self.url)
            .query("get", &ACS_VARIABLES.join(","))
            .query("for", "tract:*")
            .query("in", &format!("state:{}", state))
            .call()
            .context("ACS request failed")?
            .into_json()
            .context("ACS response was not valid JSON")?;

        Ok(parse_acs_rows(&body, counties))
    }
}

impl Default for DemographicsFetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse the ACS response: a header row followed by data rows whose last
/// three fields are the state/county/tract GEOID fragments.
///
/// Rows outside the configured counties are skipped (the `in=state`
/// filter is statewide). Rows with zero total population are skipped:
/// the percentage computation would be undefined.
pub fn parse_acs_rows(
    body: &serde_json::Value,
    counties: &[String],
) -> HashMap<String, DemographicProfile> {
    let rows = match body.as_array() {
        Some(rows) => rows,
        None => return HashMap::new(),
    };

    let mut out = HashMap::new();
    for row in rows.iter().skip(1) {
        let fields = match row.as_array() {
            // variables plus the three trailing geography fragments
            Some(f) if f.len() >= ACS_VARIABLES.len() + 3 => f,
            _ => continue,
        };
        let cell = |i: usize| fields.get(i).and_then(|v| v.as_str()).unwrap_or("");

        let n = fields.len();
        let county_frag = cell(n - 2);
        if !counties.iter().any(|c| c == county_frag) {
            continue;
        }
        let geoid = geoid::compose_geoid(cell(n - 3), county_frag, cell(n - 1));

        let total: u32 = cell(0).parse().unwrap_or(0);
        if total == 0 {
            continue;
        }

        // Count variables become percentages of total; the *PE variables
        // arrive as percentages already. Both are clamped to [0,100] —
        // ACS encodes missing rates with negative sentinels.
        let count_pct = |i: usize| {
            let count: f64 = cell(i).parse().unwrap_or(0.0);
            Some(round1(count / total as f64 * 100.0).clamp(0.0, 100.0))
        };
        let rate = |i: usize| Some(cell(i).parse::<f64>().unwrap_or(0.0).clamp(0.0, 100.0));

        out.insert(
            geoid,
            DemographicProfile {
                total_pop: Some(total),
                pct_under_18: count_pct(1),
                pct_senior: count_pct(2),
                pct_white: count_pct(3),
                pct_black: count_pct(4),
                pct_hispanic: count_pct(5),
                pct_uninsured: rate(6),
                pct_broadband: rate(7),
            },
        );
    }
    out
}

/// Round to one decimal place.
fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
