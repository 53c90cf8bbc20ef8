// 🏷️ Profile Aggregation - Need/capacity classification
// The context tag is a pure function of (score, asset count). The store's
// reporting view mirrors this rule table in SQL; this module is the
// authoritative definition.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Need/capacity category assigned to each tract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContextTag {
    UrgentDesert,
    HighCapacityHub,
    StableLowNeed,
    GeneralOpportunity,
}

impl ContextTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextTag::UrgentDesert => "Urgent Desert",
            ContextTag::HighCapacityHub => "High-Capacity Hub",
            ContextTag::StableLowNeed => "Stable / Low Need",
            ContextTag::GeneralOpportunity => "General Opportunity",
        }
    }
}

impl fmt::Display for ContextTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered rule table, first match wins:
///
/// 1. score > 0.75 and assets < 2  → Urgent Desert
/// 2. score > 0.75 and assets >= 4 → High-Capacity Hub
/// 3. score < 0.25                 → Stable / Low Need
/// 4. otherwise                    → General Opportunity
///
/// score > 0.75 with 2 or 3 assets intentionally falls through to
/// General Opportunity. There is no "mixed" tier; do not close the gap.
pub fn context_tag(score: f64, asset_count: i64) -> ContextTag {
    if score > 0.75 && asset_count < 2 {
        ContextTag::UrgentDesert
    } else if score > 0.75 && asset_count >= 4 {
        ContextTag::HighCapacityHub
    } else if score < 0.25 {
        ContextTag::StableLowNeed
    } else {
        ContextTag::GeneralOpportunity
    }
}

/// Derived per-tract profile as read back from the store's view.
/// Never persisted independently; recomputed on every read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub tract_id: String,
    pub name: String,
    /// Serialized GeoJSON geometry.
    pub geometry: String,
    pub overall_svi: f64,
    /// Serialized demographic blob (`{}` when no source row matched).
    pub demographics_json: String,
    /// 1-based position ordering tracts by score descending.
    pub local_svi_rank: i64,
    pub count_assets: i64,
    pub context_tag: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_high_need_low_capacity_is_urgent_desert() {
        assert_eq!(context_tag(0.90, 1), ContextTag::UrgentDesert);
        assert_eq!(context_tag(0.76, 0), ContextTag::UrgentDesert);
    }

    #[test]
    fn test_high_need_high_capacity_is_hub() {
        assert_eq!(context_tag(0.90, 5), ContextTag::HighCapacityHub);
        assert_eq!(context_tag(0.90, 4), ContextTag::HighCapacityHub);
    }

    #[test]
    fn test_low_need_is_stable_regardless_of_assets() {
        assert_eq!(context_tag(0.10, 0), ContextTag::StableLowNeed);
        assert_eq!(context_tag(0.10, 4), ContextTag::StableLowNeed);
        assert_eq!(context_tag(0.10, 100), ContextTag::StableLowNeed);
    }

    #[test]
    fn test_middle_band_is_general_opportunity() {
        assert_eq!(context_tag(0.50, 2), ContextTag::GeneralOpportunity);
        assert_eq!(context_tag(0.25, 0), ContextTag::GeneralOpportunity);
        assert_eq!(context_tag(0.75, 0), ContextTag::GeneralOpportunity);
    }

    #[test]
    fn test_gap_case_falls_to_general_opportunity() {
        // score > 0.75 with 2 or 3 assets matches neither desert nor hub
        assert_eq!(context_tag(0.80, 2), ContextTag::GeneralOpportunity);
        assert_eq!(context_tag(0.80, 3), ContextTag::GeneralOpportunity);
    }

    #[test]
    fn test_tag_is_deterministic() {
        for _ in 0..10 {
            assert_eq!(context_tag(0.80, 3), context_tag(0.80, 3));
        }
    }
}
