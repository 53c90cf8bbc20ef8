// GrantScope - Regional Need/Capacity Reconciliation
// Ingests tract-level geography, demographics, and vulnerability scores
// from independent sources, reconciles them by GEOID, and derives the
// need/capacity classification the map UI reads.

pub mod assets;
pub mod demographics;
pub mod error;
pub mod geography;
pub mod geoid;
pub mod pipeline;
pub mod profile;
pub mod store;
pub mod vulnerability;

// Re-export commonly used types
pub use assets::{Asset, AssetEstimator, AssetSource, ASSET_CATEGORIES};
pub use demographics::{DemographicProfile, DemographicsFetcher, ACS_VARIABLES};
pub use error::SourceError;
pub use geography::{GeographyFetcher, TractFeature};
pub use geoid::{compose_geoid, is_tract_geoid, TRACT_GEOID_LEN};
pub use pipeline::{rebuild, run_rebuild, PipelineConfig, RebuildSummary, DEFAULT_SVI};
pub use profile::{context_tag, ContextTag, ProfileRecord};
pub use store::{RecordStore, TractRecord};
pub use vulnerability::{load_svi, resolve_columns, ColumnMap, GEOID_ALIASES, SCORE_ALIASES};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
