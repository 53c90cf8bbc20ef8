// 🔄 Rebuild Pipeline - fetch → merge → fallback-fill → persist
// Sequential batch job, triggered explicitly. Destructive: the prior
// snapshot is dropped before repopulation, and there is no partial
// update path.

use anyhow::Result;
use chrono::Utc;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::assets::{AssetEstimator, AssetSource};
use crate::demographics::{DemographicProfile, DemographicsFetcher};
use crate::geography::{GeographyFetcher, TractFeature};
use crate::store::{RecordStore, TractRecord};
use crate::vulnerability;

/// Neutral score substituted when the vulnerability source has no row
/// for a tract (or its row carried a sentinel).
pub const DEFAULT_SVI: f64 = 0.5;

/// Fixed state/county configuration plus file locations. The SVI file
/// location is deliberately caller-supplied; the loader itself has no
/// path policy.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub state: String,
    pub counties: Vec<String>,
    pub svi_csv_path: PathBuf,
    pub db_path: PathBuf,
    /// Fixed seed for the asset estimator; None uses OS entropy.
    pub asset_seed: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            // Jefferson, Lewis, St. Lawrence counties, NY
            state: "36".to_string(),
            counties: vec!["045".to_string(), "049".to_string(), "089".to_string()],
            svi_csv_path: PathBuf::from("data/svi_interactive_map.csv"),
            db_path: PathBuf::from("grant_maker.db"),
            asset_seed: None,
        }
    }
}

/// What a rebuild produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildSummary {
    pub tracts: usize,
    pub assets: usize,
    /// Tracts that matched a demographic row (the rest got defaults).
    pub demographic_matches: usize,
    /// Tracts that matched a vulnerability row (the rest got DEFAULT_SVI).
    pub svi_matches: usize,
}

/// Run the full rebuild against the live external sources.
pub fn run_rebuild(config: &PipelineConfig) -> Result<RebuildSummary> {
    let store = RecordStore::open(&config.db_path)?;

    // The three source pulls are independent; merge is keyed by GEOID,
    // not arrival order.
    let tracts = GeographyFetcher::new().fetch(&config.state, &config.counties);
    let demographics = DemographicsFetcher::new().fetch(&config.state, &config.counties);
    let svi_map = vulnerability::load_svi(&config.svi_csv_path);

    let mut estimator = match config.asset_seed {
        Some(seed) => AssetEstimator::seeded(seed),
        None => AssetEstimator::from_entropy(),
    };

    rebuild(&store, &tracts, &demographics, &svi_map, &mut estimator)
}

/// Merge and persist. Left-join from geography: every fetched tract is
/// retained, with defaults filling whatever the other sources missed.
/// Reset-then-insert is not transactional (see RecordStore::reset).
pub fn rebuild(
    store: &RecordStore,
    tracts: &[TractFeature],
    demographics: &HashMap<String, DemographicProfile>,
    svi_map: &HashMap<String, f64>,
    assets: &mut dyn AssetSource,
) -> Result<RebuildSummary> {
    println!("💾 Rebuilding store with {} tracts...", tracts.len());
    store.reset()?;

    let mut summary = RebuildSummary {
        tracts: 0,
        assets: 0,
        demographic_matches: 0,
        svi_matches: 0,
    };

    for tract in tracts {
        let score = match svi_map.get(&tract.geoid) {
            Some(&v) => {
                summary.svi_matches += 1;
                v
            }
            None => DEFAULT_SVI,
        };
        let profile = match demographics.get(&tract.geoid) {
            Some(p) => {
                summary.demographic_matches += 1;
                p.clone()
            }
            None => DemographicProfile::default(),
        };

        store.insert_tract(&TractRecord {
            tract_id: tract.geoid.clone(),
            name: format!("Tract {}", tract.name),
            geometry: tract.geometry.clone(),
            overall_svi: score,
            demographics_json: serde_json::to_string(&profile)?,
        })?;
        summary.tracts += 1;

        // No authoritative inventory exists for these counties, so the
        // asset source is the vulnerability-weighted estimator.
        for asset in assets.assets_for(&tract.geoid, score) {
            store.insert_asset(&asset)?;
            summary.assets += 1;
        }
    }

    store.mark_rebuilt(Utc::now())?;
    println!(
        "🚀 Rebuild complete: {} tracts ({} with demographics, {} with SVI), {} assets",
        summary.tracts, summary.demographic_matches, summary.svi_matches, summary.assets
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::Asset;
    use crate::vulnerability::load_from_reader;

    /// Deterministic stand-in: always produces `count` Library assets.
    struct FixedAssets {
        count: u32,
    }

    impl AssetSource for FixedAssets {
        fn assets_for(&mut self, tract_id: &str, _score: f64) -> Vec<Asset> {
            (0..self.count)
                .map(|i| Asset {
                    asset_id: format!("{}-{}", tract_id, i),
                    tract_id: tract_id.to_string(),
                    category: "Library".to_string(),
                })
                .collect()
        }
    }

    fn feature(geoid: &str, name: &str) -> TractFeature {
        TractFeature {
            geoid: geoid.to_string(),
            name: name.to_string(),
            geometry: r#"{"type":"Polygon","coordinates":[]}"#.to_string(),
        }
    }

    fn profile_for(store: &RecordStore, geoid: &str) -> crate::profile::ProfileRecord {
        store
            .profiles()
            .unwrap()
            .into_iter()
            .find(|p| p.tract_id == geoid)
            .unwrap()
    }

    #[test]
    fn test_left_join_retains_tracts_missing_from_both_sources() {
        let store = RecordStore::open_in_memory().unwrap();
        let tracts = vec![feature("36045060100", "601"), feature("36045060200", "602")];
        let mut demographics = HashMap::new();
        demographics.insert(
            "36045060100".to_string(),
            DemographicProfile {
                total_pop: Some(1200),
                pct_under_18: Some(21.0),
                ..Default::default()
            },
        );
        let mut svi_map = HashMap::new();
        svi_map.insert("36045060100".to_string(), 0.82);

        let summary = rebuild(
            &store,
            &tracts,
            &demographics,
            &svi_map,
            &mut FixedAssets { count: 0 },
        )
        .unwrap();

        assert_eq!(summary.tracts, 2);
        assert_eq!(summary.demographic_matches, 1);
        assert_eq!(summary.svi_matches, 1);

        let matched = profile_for(&store, "36045060100");
        assert_eq!(matched.overall_svi, 0.82);
        assert!(matched.demographics_json.contains("1200"));

        // Unmatched tract still present, with defaults
        let defaulted = profile_for(&store, "36045060200");
        assert_eq!(defaulted.overall_svi, DEFAULT_SVI);
        assert_eq!(defaulted.demographics_json, "{}");
        assert_eq!(defaulted.name, "Tract 602");
    }

    #[test]
    fn test_sentinel_svi_row_falls_back_to_default() {
        // The -999 sentinel never reaches the mapping, so the merge
        // default covers that tract.
        let svi_map = load_from_reader(
            "FIPS,RPL_THEMES\n36045060100,-999\n".as_bytes(),
        )
        .unwrap();

        let store = RecordStore::open_in_memory().unwrap();
        rebuild(
            &store,
            &[feature("36045060100", "601")],
            &HashMap::new(),
            &svi_map,
            &mut FixedAssets { count: 0 },
        )
        .unwrap();

        assert_eq!(profile_for(&store, "36045060100").overall_svi, 0.5);
    }

    #[test]
    fn test_rebuild_is_destructive() {
        let store = RecordStore::open_in_memory().unwrap();
        let empty = HashMap::new();
        let no_svi = HashMap::new();

        rebuild(
            &store,
            &[feature("36045060100", "601")],
            &empty,
            &no_svi,
            &mut FixedAssets { count: 3 },
        )
        .unwrap();
        assert_eq!(store.tract_count().unwrap(), 1);
        assert_eq!(store.asset_count().unwrap(), 3);

        // Second rebuild with different geography fully replaces the first
        rebuild(
            &store,
            &[feature("36045060200", "602")],
            &empty,
            &no_svi,
            &mut FixedAssets { count: 1 },
        )
        .unwrap();

        let profiles = store.profiles().unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].tract_id, "36045060200");
        assert_eq!(store.asset_count().unwrap(), 1);
    }

    #[test]
    fn test_zero_geography_yields_empty_store_not_error() {
        let store = RecordStore::open_in_memory().unwrap();
        let summary = rebuild(
            &store,
            &[],
            &HashMap::new(),
            &HashMap::new(),
            &mut FixedAssets { count: 2 },
        )
        .unwrap();

        assert_eq!(summary.tracts, 0);
        assert_eq!(summary.assets, 0);
        assert!(store.profiles().unwrap().is_empty());
    }

    #[test]
    fn test_persisted_scores_stay_in_unit_interval() {
        let store = RecordStore::open_in_memory().unwrap();
        let svi_map = load_from_reader(
            "FIPS,SVI\n\
             36045060100,0.97\n\
             36045060200,-999\n\
             36045060300,0.0\n"
                .as_bytes(),
        )
        .unwrap();
        let tracts = vec![
            feature("36045060100", "601"),
            feature("36045060200", "602"),
            feature("36045060300", "603"),
        ];

        rebuild(&store, &tracts, &HashMap::new(), &svi_map, &mut FixedAssets { count: 0 })
            .unwrap();

        for profile in store.profiles().unwrap() {
            assert!((0.0..=1.0).contains(&profile.overall_svi));
        }
    }

    #[test]
    fn test_seeded_estimator_gives_reproducible_rebuilds() {
        let run = || {
            let store = RecordStore::open_in_memory().unwrap();
            let mut estimator = AssetEstimator::seeded(1234);
            let tracts: Vec<TractFeature> = (1..=6)
                .map(|i| feature(&format!("3604506{:04}", i), &i.to_string()))
                .collect();
            rebuild(&store, &tracts, &HashMap::new(), &HashMap::new(), &mut estimator)
                .unwrap()
                .assets
        };
        assert_eq!(run(), run());
    }
}
