// 🔑 GEOID Normalization - Shared identifier reconciliation
// TIGERweb reports the full 11-digit tract GEOID; ACS reports the same code
// as separate state/county/tract fragments. Every source must collapse to
// byte-identical keys or the merge silently drops rows.

/// Digits in a state fragment.
pub const STATE_LEN: usize = 2;

/// Digits in a county fragment.
pub const COUNTY_LEN: usize = 3;

/// Digits in a tract fragment.
pub const TRACT_LEN: usize = 6;

/// Full tract GEOID length: state (2) + county (3) + tract (6).
pub const TRACT_GEOID_LEN: usize = STATE_LEN + COUNTY_LEN + TRACT_LEN;

/// Rebuild the composite GEOID from separately-reported fragments,
/// zero-padding each to its fixed width so keys match the geography
/// source exactly (leading zeros are load-bearing here).
pub fn compose_geoid(state: &str, county: &str, tract: &str) -> String {
    format!(
        "{:0>state_w$}{:0>county_w$}{:0>tract_w$}",
        state.trim(),
        county.trim(),
        tract.trim(),
        state_w = STATE_LEN,
        county_w = COUNTY_LEN,
        tract_w = TRACT_LEN,
    )
}

/// Strict tract check: exactly 11 digits. County (5) and state (2)
/// rollups fail this and are dropped at ingestion.
pub fn is_tract_geoid(geoid: &str) -> bool {
    geoid.len() == TRACT_GEOID_LEN && geoid.bytes().all(|b| b.is_ascii_digit())
}
