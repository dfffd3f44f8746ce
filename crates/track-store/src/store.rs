//! Persisted Track Store (C5, spec §4.5, §6).

use std::path::Path;

use model::{AnalysisError, CornerRecord, CornerType, Result, TrackCharacter, TrackRecord, TrackType};
use parking_lot::RwLock;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use crate::landmarks::{normalize_name, resolve_native_track_id, LandmarksDataset};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS tracks (
    track_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    config TEXT NOT NULL,
    length_meters REAL NOT NULL,
    track_type TEXT NOT NULL,
    character TEXT NOT NULL,
    notes TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS corners (
    corner_id INTEGER PRIMARY KEY AUTOINCREMENT,
    track_id TEXT NOT NULL REFERENCES tracks(track_id),
    corner_number INTEGER NOT NULL,
    name TEXT NOT NULL,
    distance_start_meters REAL NOT NULL,
    distance_end_meters REAL NOT NULL,
    corner_type TEXT NOT NULL,
    notes TEXT NOT NULL DEFAULT '',
    UNIQUE(track_id, corner_number)
);
"#;

/// Persisted store for `TrackRecord`/`CornerRecord`. Readers proceed
/// concurrently; seeding takes the write half of the lock for the whole
/// transaction so partial seeds are never visible (spec §5).
pub struct TrackStore {
    conn: RwLock<Connection>,
}

impl TrackStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| AnalysisError::TrackStoreUnavailable(format!("open {}: {e}", path.display())))?;
        Self::from_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AnalysisError::TrackStoreUnavailable(format!("open in-memory store: {e}")))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| AnalysisError::TrackStoreUnavailable(format!("schema migration: {e}")))?;
        Ok(Self { conn: RwLock::new(conn) })
    }

    pub fn upsert_track(&self, record: &TrackRecord) -> Result<()> {
        let conn = self.conn.write();
        conn.execute(
            "INSERT INTO tracks (track_id, name, config, length_meters, track_type, character, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(track_id) DO UPDATE SET
                name = excluded.name, config = excluded.config, length_meters = excluded.length_meters,
                track_type = excluded.track_type, character = excluded.character, notes = excluded.notes",
            params![
                record.id,
                record.name,
                record.config,
                record.length_m,
                track_type_tag(record.track_type),
                track_character_tag(record.character),
                record.notes,
            ],
        )
        .map_err(|e| AnalysisError::TrackStoreUnavailable(format!("upsert_track: {e}")))?;
        Ok(())
    }

    pub fn get_track(&self, track_id: &str) -> Result<Option<TrackRecord>> {
        let conn = self.conn.read();
        conn.query_row(
            "SELECT track_id, name, config, length_meters, track_type, character, notes
             FROM tracks WHERE track_id = ?1",
            params![track_id],
            |row| {
                Ok(TrackRecord {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    config: row.get(2)?,
                    length_m: row.get(3)?,
                    track_type: track_type_from_tag(&row.get::<_, String>(4)?),
                    character: track_character_from_tag(&row.get::<_, String>(5)?),
                    notes: row.get(6)?,
                })
            },
        )
        .optional()
        .map_err(|e| AnalysisError::TrackStoreUnavailable(format!("get_track: {e}")))
    }

    pub fn upsert_corner(&self, record: &CornerRecord) -> Result<()> {
        let conn = self.conn.write();
        conn.execute(
            "INSERT INTO corners (track_id, corner_number, name, distance_start_meters, distance_end_meters, corner_type, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(track_id, corner_number) DO UPDATE SET
                name = excluded.name, distance_start_meters = excluded.distance_start_meters,
                distance_end_meters = excluded.distance_end_meters, corner_type = excluded.corner_type,
                notes = excluded.notes",
            params![
                record.track_id,
                record.number,
                record.name,
                record.distance_start_m,
                record.distance_end_m,
                corner_type_tag(record.corner_type),
                record.notes,
            ],
        )
        .map_err(|e| AnalysisError::TrackStoreUnavailable(format!("upsert_corner: {e}")))?;
        Ok(())
    }

    /// Ordered by `distance_start_m` (spec §3 invariant).
    pub fn list_corners(&self, track_id: &str) -> Result<Vec<CornerRecord>> {
        let conn = self.conn.read();
        let mut stmt = conn
            .prepare(
                "SELECT track_id, corner_number, name, distance_start_meters, distance_end_meters, corner_type, notes
                 FROM corners WHERE track_id = ?1 ORDER BY distance_start_meters ASC",
            )
            .map_err(|e| AnalysisError::TrackStoreUnavailable(format!("list_corners: {e}")))?;
        let rows = stmt
            .query_map(params![track_id], |row| {
                Ok(CornerRecord {
                    track_id: row.get(0)?,
                    number: row.get(1)?,
                    name: row.get(2)?,
                    distance_start_m: row.get(3)?,
                    distance_end_m: row.get(4)?,
                    corner_type: corner_type_from_tag(&row.get::<_, String>(5)?),
                    notes: row.get(6)?,
                })
            })
            .map_err(|e| AnalysisError::TrackStoreUnavailable(format!("list_corners: {e}")))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| AnalysisError::TrackStoreUnavailable(format!("list_corners: {e}")))
    }

    pub fn has_named_corners(&self, track_id: &str) -> Result<bool> {
        let conn = self.conn.read();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM corners WHERE track_id = ?1", params![track_id], |row| row.get(0))
            .map_err(|e| AnalysisError::TrackStoreUnavailable(format!("has_named_corners: {e}")))?;
        Ok(count > 0)
    }

    /// Imports every track in `dataset` that resolves to a native track id,
    /// atomically. Dataset keys with no resolvable native id are skipped —
    /// not an error (spec §4.5).
    pub fn seed_from_landmarks_dataset(&self, dataset: &LandmarksDataset) -> Result<()> {
        let mut conn = self.conn.write();
        let tx = conn
            .transaction()
            .map_err(|e| AnalysisError::SeedingFailed(format!("begin transaction: {e}")))?;

        for (key, corners) in &dataset.tracks {
            let Some(track_id) = resolve_native_track_id(key) else {
                debug!(key, "landmarks key has no resolvable native track id, skipping");
                continue;
            };
            for (i, corner) in corners.iter().enumerate() {
                let number = (i + 1) as u32;
                let corner_type = corner.corner_type.unwrap_or(CornerType::Unknown);
                tx.execute(
                    "INSERT INTO corners (track_id, corner_number, name, distance_start_meters, distance_end_meters, corner_type, notes)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, '')
                     ON CONFLICT(track_id, corner_number) DO UPDATE SET
                        name = excluded.name, distance_start_meters = excluded.distance_start_meters,
                        distance_end_meters = excluded.distance_end_meters, corner_type = excluded.corner_type",
                    params![
                        track_id,
                        number,
                        normalize_name(&corner.name),
                        corner.distance_start_m,
                        corner.distance_end_m,
                        corner_type_tag(corner_type),
                    ],
                )
                .map_err(|e| AnalysisError::SeedingFailed(format!("insert corner for {track_id}: {e}")))?;
            }
            info!(track_id, corners = corners.len(), "seeded landmarks");
        }

        tx.commit().map_err(|e| AnalysisError::SeedingFailed(format!("commit transaction: {e}")))?;
        Ok(())
    }

    /// Lazy seeding entry point: seeds `track_id` from `dataset` only if it
    /// has no named corners yet (spec §4.5). Never fatal — a seeding
    /// failure is recorded and `Ok(false)` without corrupting existing
    /// state.
    pub fn seed_track_if_needed(&self, track_id: &str, dataset: &LandmarksDataset) -> Result<bool> {
        if self.has_named_corners(track_id)? {
            return Ok(false);
        }
        let matching: LandmarksDataset = LandmarksDataset {
            tracks: dataset
                .tracks
                .iter()
                .filter(|(key, _)| resolve_native_track_id(key).as_deref() == Some(track_id))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        };
        if matching.tracks.is_empty() {
            warn!(track_id, "no landmarks dataset entry for track, leaving unnamed");
            return Ok(false);
        }
        self.seed_from_landmarks_dataset(&matching)?;
        Ok(true)
    }
}

fn track_type_tag(t: TrackType) -> &'static str {
    match t {
        TrackType::Road => "road",
        TrackType::Street => "street",
        TrackType::Oval => "oval",
    }
}

fn track_type_from_tag(s: &str) -> TrackType {
    match s {
        "street" => TrackType::Street,
        "oval" => TrackType::Oval,
        _ => TrackType::Road,
    }
}

fn track_character_tag(c: TrackCharacter) -> &'static str {
    match c {
        TrackCharacter::Momentum => "momentum",
        TrackCharacter::PointAndShoot => "point_and_shoot",
        TrackCharacter::Mixed => "mixed",
    }
}

fn track_character_from_tag(s: &str) -> TrackCharacter {
    match s {
        "momentum" => TrackCharacter::Momentum,
        "point_and_shoot" => TrackCharacter::PointAndShoot,
        _ => TrackCharacter::Mixed,
    }
}

fn corner_type_tag(t: CornerType) -> &'static str {
    match t {
        CornerType::Hairpin => "hairpin",
        CornerType::Sweeper => "sweeper",
        CornerType::Chicane => "chicane",
        CornerType::Kink => "kink",
        CornerType::HeavyBraking => "heavy_braking",
        CornerType::Unknown => "unknown",
    }
}

fn corner_type_from_tag(s: &str) -> CornerType {
    match s {
        "hairpin" => CornerType::Hairpin,
        "sweeper" => CornerType::Sweeper,
        "chicane" => CornerType::Chicane,
        "kink" => CornerType::Kink,
        "heavy_braking" => CornerType::HeavyBraking,
        _ => CornerType::Unknown,
    }
}
