// 🏛️ Asset Estimator - Vulnerability-weighted asset synthesis
// Stand-in for a real infrastructure inventory: higher vulnerability
// biases toward fewer assets (deserts), lower toward more (hubs). The
// RNG is injected so tests can pin exact outputs.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fixed category vocabulary.
pub const ASSET_CATEGORIES: [&str; 5] =
    ["Library", "School", "Community Center", "Park", "Clinic"];

/// Discrete per-tract asset count outcomes.
const COUNT_OUTCOMES: [u32; 4] = [0, 1, 2, 4];

/// One community asset owned by a tract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub asset_id: String,
    pub tract_id: String,
    pub category: String,
}

/// Anything that can produce the asset inventory for a tract. The
/// simulated estimator implements this; a real inventory source would
/// slot in here without touching the pipeline or the store.
pub trait AssetSource {
    fn assets_for(&mut self, tract_id: &str, score: f64) -> Vec<Asset>;
}

pub struct AssetEstimator<R: Rng> {
    rng: R,
}

impl AssetEstimator<StdRng> {
    /// Deterministic estimator for tests and reproducible rebuilds.
    pub fn seeded(seed: u64) -> Self {
        AssetEstimator::new(StdRng::seed_from_u64(seed))
    }

    /// OS-entropy estimator for normal rebuilds.
    pub fn from_entropy() -> Self {
        AssetEstimator::new(StdRng::from_entropy())
    }
}

impl<R: Rng> AssetEstimator<R> {
    pub fn new(rng: R) -> Self {
        AssetEstimator { rng }
    }

    /// Sample an asset count. Weights over {0,1,2,4} are
    /// [svi*6, svi*3, (1-svi)*2, (1-svi)*4]: at svi=1 only {0,1} are
    /// reachable, at svi=0 only {2,4}.
    fn sample_count(&mut self, score: f64) -> u32 {
        let weights = [
            score * 6.0,
            score * 3.0,
            (1.0 - score) * 2.0,
            (1.0 - score) * 4.0,
        ];
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return 0;
        }

        let mut roll = self.rng.gen::<f64>() * total;
        for (outcome, weight) in COUNT_OUTCOMES.iter().zip(weights) {
            if roll < weight {
                return *outcome;
            }
            roll -= weight;
        }
        COUNT_OUTCOMES[COUNT_OUTCOMES.len() - 1]
    }
}

impl<R: Rng> AssetSource for AssetEstimator<R> {
    fn assets_for(&mut self, tract_id: &str, score: f64) -> Vec<Asset> {
        let count = self.sample_count(score);
        (0..count)
            .map(|_| Asset {
                asset_id: Uuid::new_v4().to_string(),
                tract_id: tract_id.to_string(),
                category: ASSET_CATEGORIES[self.rng.gen_range(0..ASSET_CATEGORIES.len())]
                    .to_string(),
            })
            .collect()
    }
}
