//! Raw vectors as written by the loader.

use std::collections::HashSet;

use rusqlite::{params, Connection};

use exprvec_core::errors::ExprResult;
use exprvec_core::{DescriptorId, DimensionId, ExperimentId, ProbeId, RawVector};

use super::checksum::{checksum, verify};
use crate::to_storage_err;

/// Insert one raw vector, returning its row id.
pub fn insert_raw_vector(conn: &Connection, vector: &RawVector) -> ExprResult<i64> {
    conn.prepare_cached(
        "INSERT INTO raw_vectors
            (experiment_id, probe_id, descriptor_id, dimension_id, data, checksum)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .and_then(|mut stmt| {
        stmt.execute(params![
            vector.experiment.value(),
            vector.probe.value(),
            vector.descriptor.value(),
            vector.dimension.value(),
            vector.data,
            checksum(&vector.data),
        ])
    })
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(conn.last_insert_rowid())
}

/// Raw vectors of `probes` in `experiments` under any of `descriptors`.
/// Duplicates are returned as stored.
pub fn get_raw_vectors(
    conn: &Connection,
    probes: &[ProbeId],
    experiments: &[ExperimentId],
    descriptors: &HashSet<DescriptorId>,
) -> ExprResult<Vec<RawVector>> {
    if descriptors.is_empty() {
        return Ok(Vec::new());
    }
    let mut stmt = conn
        .prepare_cached(
            "SELECT id, descriptor_id, dimension_id, data, checksum FROM raw_vectors
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
                        row.get::<_, i64>(2)?,
                        row.get::<_, Vec<u8>>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                })
                .map_err(|e| to_storage_err(e.to_string()))?;
            for row in rows {
                let (id, descriptor, dimension, data, sum) =
                    row.map_err(|e| to_storage_err(e.to_string()))?;
                let descriptor = DescriptorId(descriptor);
                if !descriptors.contains(&descriptor) {
                    continue;
                }
                verify("raw_vectors", &id.to_string(), &data, &sum)?;
                vectors.push(RawVector {
                    experiment,
                    probe,
                    descriptor,
                    dimension: DimensionId(dimension),
                    data,
                });
            }
        }
    }
    Ok(vectors)
}
