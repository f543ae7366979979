//! Processed (masked-preferred) vectors.

use rusqlite::{params, Connection};

use exprvec_core::errors::ExprResult;
use exprvec_core::{DescriptorId, DimensionId, ExperimentId, ProbeId, ProcessedVector};

use super::checksum::{checksum, verify};
use crate::to_storage_err;

pub fn delete_for_experiment(conn: &Connection, experiment: ExperimentId) -> ExprResult<usize> {
    conn.execute(
        "DELETE FROM processed_vectors WHERE experiment_id = ?1",
        params![experiment.value()],
    )
    .map_err(|e| to_storage_err(e.to_string()))
}

/// Insert `vectors` under `descriptor`, ignoring each vector's own
/// descriptor field.
pub fn insert_processed_vectors(
    conn: &Connection,
    experiment: ExperimentId,
    descriptor: DescriptorId,
    vectors: &[ProcessedVector],
) -> ExprResult<usize> {
    let mut stmt = conn
        .prepare_cached(
            "INSERT INTO processed_vectors
                (experiment_id, probe_id, descriptor_id, dimension_id, data, checksum,
                 rank_by_mean, rank_by_max)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    for vector in vectors {
        stmt.execute(params![
            experiment.value(),
            vector.probe.value(),
            descriptor.value(),
            vector.dimension.value(),
            vector.data,
            checksum(&vector.data),
            vector.rank_by_mean,
            vector.rank_by_max,
        ])
        .map_err(|e| to_storage_err(format!("processed vector for probe {}: {e}", vector.probe)))?;
    }
    Ok(vectors.len())
}

pub fn get_processed_vectors(
    conn: &Connection,
    probes: &[ProbeId],
    experiments: &[ExperimentId],
) -> ExprResult<Vec<ProcessedVector>> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT descriptor_id, dimension_id, data, checksum, rank_by_mean, rank_by_max
             FROM processed_vectors
             WHERE experiment_id = ?1 AND probe_id = ?2",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut vectors = Vec::new();
    for &experiment in experiments {
        for &probe in probes {
            let rows = stmt
                .query_map(params![experiment.value(), probe.value()], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, Vec<u8>>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, Option<f64>>(4)?,
                        row.get::<_, Option<f64>>(5)?,
                    ))
                })
                .map_err(|e| to_storage_err(e.to_string()))?;
            for row in rows {
                let (descriptor, dimension, data, sum, rank_by_mean, rank_by_max) =
                    row.map_err(|e| to_storage_err(e.to_string()))?;
                verify(
                    "processed_vectors",
                    &format!("{experiment}/{probe}"),
                    &data,
                    &sum,
                )?;
                vectors.push(ProcessedVector {
                    experiment,
                    probe,
                    descriptor: Some(DescriptorId(descriptor)),
                    dimension: DimensionId(dimension),
                    data,
                    rank_by_mean,
                    rank_by_max,
                });
            }
        }
    }
    Ok(vectors)
}

pub fn count_for_experiment(conn: &Connection, experiment: ExperimentId) -> ExprResult<usize> {
    conn.query_row(
        "SELECT COUNT(*) FROM processed_vectors WHERE experiment_id = ?1",
        params![experiment.value()],
        |row| row.get::<_, i64>(0),
    )
    .map(|n| n as usize)
    .map_err(|e| to_storage_err(e.to_string()))
}
