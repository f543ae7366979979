//! Platforms, probes, experiments, dimensions, and sub-cohorts.

use rusqlite::{params, Connection, OptionalExtension};

use exprvec_core::errors::{ExprResult, StorageError};
use exprvec_core::models::{Platform, Probe, TechnologyType};
use exprvec_core::{
    DimensionId, Experiment, ExperimentId, PlatformId, ProbeId, SampleArrangement, SampleId,
    SubCohort, SubCohortId,
};

use crate::to_storage_err;

pub fn insert_platform(conn: &Connection, platform: &Platform) -> ExprResult<()> {
    conn.execute(
        "INSERT INTO platforms (id, short_name, technology) VALUES (?1, ?2, ?3)
         ON CONFLICT(id) DO UPDATE SET
            short_name = excluded.short_name,
            technology = excluded.technology",
        params![
            platform.id.value(),
            platform.short_name,
            platform.technology.map(TechnologyType::as_str),
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn get_platforms(conn: &Connection, ids: &[PlatformId]) -> ExprResult<Vec<Platform>> {
    let mut stmt = conn
        .prepare_cached("SELECT id, short_name, technology FROM platforms WHERE id = ?1")
        .map_err(|e| to_storage_err(e.to_string()))?;
    let mut platforms = Vec::with_capacity(ids.len());
    for id in ids {
        let row = stmt
            .query_row(params![id.value()], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            })
            .optional()
            .map_err(|e| to_storage_err(e.to_string()))?;
        let Some((id, short_name, technology)) = row else {
            continue;
        };
        let technology = match technology {
            Some(t) => Some(TechnologyType::parse(&t).ok_or_else(|| StorageError::Corruption {
                details: format!("platform {id}: unknown technology {t:?}"),
            })?),
            None => None,
        };
        platforms.push(Platform {
            id: PlatformId(id),
            short_name,
            technology,
        });
    }
    Ok(platforms)
}

/// Update a platform's technology; `None` marks it unclassified.
pub fn set_technology(
    conn: &Connection,
    platform: PlatformId,
    technology: Option<TechnologyType>,
) -> ExprResult<()> {
    let updated = conn
        .execute(
            "UPDATE platforms SET technology = ?2 WHERE id = ?1",
            params![platform.value(), technology.map(TechnologyType::as_str)],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    if updated == 0 {
        return Err(StorageError::NotFound {
            entity: "platform",
            id: platform.to_string(),
        }
        .into());
    }
    Ok(())
}

pub fn insert_probe(conn: &Connection, probe: &Probe) -> ExprResult<()> {
    conn.execute(
        "INSERT INTO probes (id, platform_id, name) VALUES (?1, ?2, ?3)
         ON CONFLICT(id) DO UPDATE SET
            platform_id = excluded.platform_id,
            name = excluded.name",
        params![probe.id.value(), probe.platform.value(), probe.name],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn get_probe_ids(conn: &Connection, platforms: &[PlatformId]) -> ExprResult<Vec<ProbeId>> {
    let mut stmt = conn
        .prepare_cached("SELECT id FROM probes WHERE platform_id = ?1 ORDER BY id")
        .map_err(|e| to_storage_err(e.to_string()))?;
    let mut ids = Vec::new();
    for platform in platforms {
        let rows = stmt
            .query_map(params![platform.value()], |row| row.get::<_, i64>(0))
            .map_err(|e| to_storage_err(e.to_string()))?;
        for row in rows {
            ids.push(ProbeId(row.map_err(|e| to_storage_err(e.to_string()))?));
        }
    }
    Ok(ids)
}

pub fn insert_experiment(conn: &Connection, experiment: &Experiment) -> ExprResult<()> {
    conn.execute(
        "INSERT INTO experiments (id, short_name) VALUES (?1, ?2)
         ON CONFLICT(id) DO UPDATE SET short_name = excluded.short_name",
        params![experiment.id.value(), experiment.short_name],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    conn.execute(
        "DELETE FROM experiment_platforms WHERE experiment_id = ?1",
        params![experiment.id.value()],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    for (position, platform) in experiment.platforms.iter().enumerate() {
        conn.execute(
            "INSERT INTO experiment_platforms (experiment_id, platform_id, position)
             VALUES (?1, ?2, ?3)",
            params![experiment.id.value(), platform.value(), position as i64],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    }
    Ok(())
}

pub fn get_experiment(conn: &Connection, id: ExperimentId) -> ExprResult<Option<Experiment>> {
    let short_name: Option<String> = conn
        .query_row(
            "SELECT short_name FROM experiments WHERE id = ?1",
            params![id.value()],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;
    let Some(short_name) = short_name else {
        return Ok(None);
    };

    let mut stmt = conn
        .prepare_cached(
            "SELECT platform_id FROM experiment_platforms
             WHERE experiment_id = ?1 ORDER BY position",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    let platforms = stmt
        .query_map(params![id.value()], |row| row.get::<_, i64>(0).map(PlatformId))
        .map_err(|e| to_storage_err(e.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| to_storage_err(e.to_string()))?;

    Ok(Some(Experiment {
        id,
        short_name,
        platforms,
    }))
}

fn insert_samples(conn: &Connection, samples: &[SampleId]) -> ExprResult<()> {
    let mut stmt = conn
        .prepare_cached("INSERT OR IGNORE INTO samples (id) VALUES (?1)")
        .map_err(|e| to_storage_err(e.to_string()))?;
    for sample in samples {
        stmt.execute(params![sample.value()])
            .map_err(|e| to_storage_err(e.to_string()))?;
    }
    Ok(())
}

/// Insert a stored arrangement. Derived arrangements are never persisted.
pub fn insert_dimension(conn: &Connection, dimension: &SampleArrangement) -> ExprResult<()> {
    let Some(id) = dimension.id else {
        return Err(StorageError::Corruption {
            details: "cannot persist a derived sample arrangement".to_string(),
        }
        .into());
    };
    insert_samples(conn, &dimension.samples)?;
    conn.execute(
        "INSERT OR IGNORE INTO bioassay_dimensions (id) VALUES (?1)",
        params![id.value()],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    conn.execute(
        "DELETE FROM dimension_samples WHERE dimension_id = ?1",
        params![id.value()],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    let mut stmt = conn
        .prepare_cached(
            "INSERT INTO dimension_samples (dimension_id, position, sample_id)
             VALUES (?1, ?2, ?3)",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    for (position, sample) in dimension.samples.iter().enumerate() {
        stmt.execute(params![id.value(), position as i64, sample.value()])
            .map_err(|e| to_storage_err(e.to_string()))?;
    }
    Ok(())
}

pub fn get_dimensions(
    conn: &Connection,
    ids: &[DimensionId],
) -> ExprResult<Vec<SampleArrangement>> {
    let mut exists = conn
        .prepare_cached("SELECT 1 FROM bioassay_dimensions WHERE id = ?1")
        .map_err(|e| to_storage_err(e.to_string()))?;
    let mut samples = conn
        .prepare_cached(
            "SELECT sample_id FROM dimension_samples WHERE dimension_id = ?1 ORDER BY position",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut dimensions = Vec::with_capacity(ids.len());
    for id in ids {
        let found = exists
            .exists(params![id.value()])
            .map_err(|e| to_storage_err(e.to_string()))?;
        if !found {
            continue;
        }
        let ordered = samples
            .query_map(params![id.value()], |row| row.get::<_, i64>(0).map(SampleId))
            .map_err(|e| to_storage_err(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| to_storage_err(e.to_string()))?;
        dimensions.push(SampleArrangement::new(*id, ordered));
    }
    Ok(dimensions)
}

pub fn insert_sub_cohort(conn: &Connection, sub_cohort: &SubCohort) -> ExprResult<()> {
    insert_samples(conn, &sub_cohort.samples)?;
    conn.execute(
        "INSERT INTO sub_cohorts (id, name, source_experiment_id) VALUES (?1, ?2, ?3)
         ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            source_experiment_id = excluded.source_experiment_id",
        params![
            sub_cohort.id.value(),
            sub_cohort.name,
            sub_cohort.source.value()
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    conn.execute(
        "DELETE FROM sub_cohort_samples WHERE sub_cohort_id = ?1",
        params![sub_cohort.id.value()],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    for (position, sample) in sub_cohort.samples.iter().enumerate() {
        conn.execute(
            "INSERT INTO sub_cohort_samples (sub_cohort_id, position, sample_id)
             VALUES (?1, ?2, ?3)",
            params![sub_cohort.id.value(), position as i64, sample.value()],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    }
    Ok(())
}

pub fn get_sub_cohort(conn: &Connection, id: SubCohortId) -> ExprResult<Option<SubCohort>> {
    let row: Option<(String, i64)> = conn
        .query_row(
            "SELECT name, source_experiment_id FROM sub_cohorts WHERE id = ?1",
            params![id.value()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;
    let Some((name, source)) = row else {
        return Ok(None);
    };

    let mut stmt = conn
        .prepare_cached(
            "SELECT sample_id FROM sub_cohort_samples WHERE sub_cohort_id = ?1 ORDER BY position",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    let samples = stmt
        .query_map(params![id.value()], |row| row.get::<_, i64>(0).map(SampleId))
        .map_err(|e| to_storage_err(e.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| to_storage_err(e.to_string()))?;

    Ok(Some(SubCohort {
        id,
        name,
        source: ExperimentId(source),
        samples,
    }))
}
