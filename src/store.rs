// 💾 Record Store - SQLite persistence for tracts and assets
// Rebuild-only lifecycle: reset drops everything, inserts are
// insert-only within a rebuild, reads go through the reporting view.
// The store is fully rebuildable from the external sources.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;

use crate::assets::Asset;
use crate::profile::ProfileRecord;

/// Reconciled per-tract row as persisted (the merge output).
#[derive(Debug, Clone)]
pub struct TractRecord {
    pub tract_id: String,
    pub name: String,
    /// Serialized GeoJSON geometry blob.
    pub geometry: String,
    pub overall_svi: f64,
    /// Serialized demographic profile (`{}` when defaulted).
    pub demographics_json: String,
}

pub struct RecordStore {
    conn: Connection,
}

impl RecordStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open store at {}", path.display()))?;
        // WAL mode for crash recovery
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(RecordStore { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory store")?;
        Ok(RecordStore { conn })
    }

    /// Idempotently destroy and recreate the full schema, including the
    /// reporting view. After this the store holds zero tracts and zero
    /// assets. Not transactional with the repopulation that follows: a
    /// rebuild that dies mid-insert leaves a partial store (callers
    /// wanting safety snapshot the file first).
    pub fn reset(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "DROP VIEW IF EXISTS vw_tract_profile;
                 DROP TABLE IF EXISTS raw_assets;
                 DROP TABLE IF EXISTS raw_tracts;

                 CREATE TABLE raw_tracts (
                     tract_id TEXT PRIMARY KEY,
                     name TEXT NOT NULL,
                     geometry JSON,
                     overall_svi REAL NOT NULL,
                     demographics_json JSON
                 );

                 CREATE TABLE raw_assets (
                     asset_id TEXT PRIMARY KEY,
                     tract_id TEXT NOT NULL,
                     category TEXT NOT NULL
                 );

                 CREATE INDEX idx_assets_tract ON raw_assets(tract_id);

                 CREATE TABLE IF NOT EXISTS meta (
                     key TEXT PRIMARY KEY,
                     value TEXT NOT NULL
                 );

                 CREATE VIEW vw_tract_profile AS
                 SELECT
                     t.tract_id,
                     t.name,
                     t.geometry,
                     t.overall_svi,
                     t.demographics_json,
                     RANK() OVER (ORDER BY t.overall_svi DESC) AS local_svi_rank,
                     COUNT(DISTINCT a.asset_id) AS count_assets,
                     CASE
                         WHEN t.overall_svi > 0.75 AND COUNT(DISTINCT a.asset_id) < 2
                             THEN 'Urgent Desert'
                         WHEN t.overall_svi > 0.75 AND COUNT(DISTINCT a.asset_id) >= 4
                             THEN 'High-Capacity Hub'
                         WHEN t.overall_svi < 0.25
                             THEN 'Stable / Low Need'
                         ELSE 'General Opportunity'
                     END AS context_tag
                 FROM raw_tracts t
                 LEFT JOIN raw_assets a ON t.tract_id = a.tract_id
                 GROUP BY t.tract_id;",
            )
            .context("failed to reset store schema")
    }

    pub fn insert_tract(&self, tract: &TractRecord) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO raw_tracts (tract_id, name, geometry, overall_svi, demographics_json)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    tract.tract_id,
                    tract.name,
                    tract.geometry,
                    tract.overall_svi,
                    tract.demographics_json,
                ],
            )
            .with_context(|| format!("failed to insert tract {}", tract.tract_id))?;
        Ok(())
    }

    pub fn insert_asset(&self, asset: &Asset) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO raw_assets (asset_id, tract_id, category) VALUES (?1, ?2, ?3)",
                params![asset.asset_id, asset.tract_id, asset.category],
            )
            .with_context(|| format!("failed to insert asset for tract {}", asset.tract_id))?;
        Ok(())
    }

    /// Record when the last rebuild finished.
    pub fn mark_rebuilt(&self, at: DateTime<Utc>) -> Result<()> {
        self.conn.execute(
            "INSERT INTO meta (key, value) VALUES ('rebuilt_at', ?1)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![at.to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn tract_count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM raw_tracts", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn asset_count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM raw_assets", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Materialize the derived profiles, best rank first. Recomputed by
    /// the view on every call; nothing derived is stored.
    pub fn profiles(&self) -> Result<Vec<ProfileRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT tract_id, name, geometry, overall_svi, demographics_json,
                    local_svi_rank, count_assets, context_tag
             FROM vw_tract_profile
             ORDER BY local_svi_rank, tract_id",
        )?;

        let profiles = stmt
            .query_map([], |row| {
                Ok(ProfileRecord {
                    tract_id: row.get(0)?,
                    name: row.get(1)?,
                    geometry: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    overall_svi: row.get(3)?,
                    demographics_json: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                    local_svi_rank: row.get(5)?,
                    count_assets: row.get(6)?,
                    context_tag: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(profiles)
    }
}
