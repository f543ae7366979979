//! v002: raw and processed vector blobs with their checksums.

use rusqlite::Connection;

use exprvec_core::errors::ExprResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> ExprResult<()> {
    conn.execute_batch(
        "
        -- Raw vectors carry no uniqueness constraint: the loader may write
        -- duplicates, and the rebuild must detect and reject them.
        CREATE TABLE IF NOT EXISTS raw_vectors (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            experiment_id  INTEGER NOT NULL REFERENCES experiments(id) ON DELETE CASCADE,
            probe_id       INTEGER NOT NULL REFERENCES probes(id),
            descriptor_id  INTEGER NOT NULL REFERENCES quantitation_descriptors(id),
            dimension_id   INTEGER NOT NULL REFERENCES bioassay_dimensions(id),
            data           BLOB NOT NULL,
            checksum       TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_raw_experiment_probe
            ON raw_vectors(experiment_id, probe_id);

        CREATE TABLE IF NOT EXISTS processed_vectors (
            experiment_id  INTEGER NOT NULL REFERENCES experiments(id) ON DELETE CASCADE,
            probe_id       INTEGER NOT NULL REFERENCES probes(id),
            descriptor_id  INTEGER NOT NULL REFERENCES quantitation_descriptors(id),
            dimension_id   INTEGER NOT NULL REFERENCES bioassay_dimensions(id),
            data           BLOB NOT NULL,
            checksum       TEXT NOT NULL,
            rank_by_mean   REAL,
            rank_by_max    REAL,
            PRIMARY KEY (experiment_id, probe_id)
        );

        CREATE INDEX IF NOT EXISTS idx_processed_probe ON processed_vectors(probe_id);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
