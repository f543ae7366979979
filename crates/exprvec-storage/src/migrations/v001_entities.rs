//! v001: platforms, probes, gene annotations, experiments, samples, bioassay
//! dimensions, quantitation descriptors, sub-cohorts.

use rusqlite::Connection;

use exprvec_core::errors::ExprResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> ExprResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS platforms (
            id          INTEGER PRIMARY KEY,
            short_name  TEXT NOT NULL,
            technology  TEXT
        );

        CREATE TABLE IF NOT EXISTS probes (
            id           INTEGER PRIMARY KEY,
            platform_id  INTEGER NOT NULL REFERENCES platforms(id),
            name         TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_probes_platform ON probes(platform_id);

        CREATE TABLE IF NOT EXISTS probe_genes (
            probe_id  INTEGER NOT NULL REFERENCES probes(id) ON DELETE CASCADE,
            gene_id   INTEGER NOT NULL,
            PRIMARY KEY (probe_id, gene_id)
        );

        CREATE INDEX IF NOT EXISTS idx_probe_genes_gene ON probe_genes(gene_id);

        CREATE TABLE IF NOT EXISTS experiments (
            id          INTEGER PRIMARY KEY,
            short_name  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS experiment_platforms (
            experiment_id  INTEGER NOT NULL REFERENCES experiments(id) ON DELETE CASCADE,
            platform_id    INTEGER NOT NULL REFERENCES platforms(id),
            position       INTEGER NOT NULL,
            PRIMARY KEY (experiment_id, platform_id)
        );

        CREATE TABLE IF NOT EXISTS samples (
            id  INTEGER PRIMARY KEY
        );

        CREATE TABLE IF NOT EXISTS bioassay_dimensions (
            id  INTEGER PRIMARY KEY
        );

        CREATE TABLE IF NOT EXISTS dimension_samples (
            dimension_id  INTEGER NOT NULL REFERENCES bioassay_dimensions(id) ON DELETE CASCADE,
            position      INTEGER NOT NULL,
            sample_id     INTEGER NOT NULL REFERENCES samples(id),
            PRIMARY KEY (dimension_id, position)
        );

        CREATE TABLE IF NOT EXISTS quantitation_descriptors (
            id                        INTEGER PRIMARY KEY AUTOINCREMENT,
            name                      TEXT NOT NULL,
            description               TEXT NOT NULL DEFAULT '',
            primitive_type            TEXT NOT NULL,
            general_type              TEXT NOT NULL,
            quantitation_type         TEXT NOT NULL,
            scale                     TEXT NOT NULL,
            is_preferred              INTEGER NOT NULL DEFAULT 0,
            is_masked_preferred       INTEGER NOT NULL DEFAULT 0,
            is_background             INTEGER NOT NULL DEFAULT 0,
            is_background_subtracted  INTEGER NOT NULL DEFAULT 0,
            is_normalized             INTEGER NOT NULL DEFAULT 0,
            is_ratio                  INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS experiment_descriptors (
            experiment_id  INTEGER NOT NULL REFERENCES experiments(id) ON DELETE CASCADE,
            descriptor_id  INTEGER NOT NULL
                REFERENCES quantitation_descriptors(id) ON DELETE CASCADE,
            PRIMARY KEY (experiment_id, descriptor_id)
        );

        CREATE TABLE IF NOT EXISTS sub_cohorts (
            id                    INTEGER PRIMARY KEY,
            name                  TEXT NOT NULL,
            source_experiment_id  INTEGER NOT NULL REFERENCES experiments(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS sub_cohort_samples (
            sub_cohort_id  INTEGER NOT NULL REFERENCES sub_cohorts(id) ON DELETE CASCADE,
            position       INTEGER NOT NULL,
            sample_id      INTEGER NOT NULL REFERENCES samples(id),
            PRIMARY KEY (sub_cohort_id, position)
        );
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
