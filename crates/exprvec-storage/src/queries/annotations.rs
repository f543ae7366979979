//! Gene annotations of probes.

use std::collections::{BTreeSet, HashMap};

use rusqlite::{params, Connection};

use exprvec_core::errors::ExprResult;
use exprvec_core::{GeneId, PlatformId, ProbeId};

use crate::to_storage_err;

/// Replace the gene annotations of `probe`.
pub fn set_probe_genes(conn: &Connection, probe: ProbeId, genes: &[GeneId]) -> ExprResult<()> {
    conn.execute(
        "DELETE FROM probe_genes WHERE probe_id = ?1",
        params![probe.value()],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    let mut stmt = conn
        .prepare_cached("INSERT OR IGNORE INTO probe_genes (probe_id, gene_id) VALUES (?1, ?2)")
        .map_err(|e| to_storage_err(e.to_string()))?;
    for gene in genes {
        stmt.execute(params![probe.value(), gene.value()])
            .map_err(|e| to_storage_err(e.to_string()))?;
    }
    Ok(())
}

/// Probes on `platforms` annotated to each of `genes`. Genes without probes
/// are absent from the map.
pub fn gene_to_probes(
    conn: &Connection,
    genes: &[GeneId],
    platforms: &[PlatformId],
) -> ExprResult<HashMap<GeneId, Vec<ProbeId>>> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT pg.probe_id FROM probe_genes pg
             JOIN probes p ON p.id = pg.probe_id
             WHERE pg.gene_id = ?1 AND p.platform_id = ?2
             ORDER BY pg.probe_id",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut map: HashMap<GeneId, Vec<ProbeId>> = HashMap::new();
    for &gene in genes {
        for platform in platforms {
            let rows = stmt
                .query_map(params![gene.value(), platform.value()], |row| {
                    row.get::<_, i64>(0).map(ProbeId)
                })
                .map_err(|e| to_storage_err(e.to_string()))?;
            for row in rows {
                let probe = row.map_err(|e| to_storage_err(e.to_string()))?;
                map.entry(gene).or_default().push(probe);
            }
        }
    }
    Ok(map)
}

/// Genes of each of `probes`. Unannotated probes map to an empty set.
pub fn probe_genes(
    conn: &Connection,
    probes: &[ProbeId],
) -> ExprResult<HashMap<ProbeId, BTreeSet<GeneId>>> {
    let mut stmt = conn
        .prepare_cached("SELECT gene_id FROM probe_genes WHERE probe_id = ?1")
        .map_err(|e| to_storage_err(e.to_string()))?;
    let mut map = HashMap::with_capacity(probes.len());
    for &probe in probes {
        let genes = stmt
            .query_map(params![probe.value()], |row| row.get::<_, i64>(0).map(GeneId))
            .map_err(|e| to_storage_err(e.to_string()))?
            .collect::<Result<BTreeSet<_>, _>>()
            .map_err(|e| to_storage_err(e.to_string()))?;
        map.insert(probe, genes);
    }
    Ok(map)
}
