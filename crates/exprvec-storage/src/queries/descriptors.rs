//! Quantitation descriptors and their registration against experiments.

use rusqlite::{params, Connection, Row};

use exprvec_core::errors::{ExprResult, StorageError};
use exprvec_core::models::{GeneralType, ScaleType, StandardQuantitationType};
use exprvec_core::{DescriptorId, ExperimentId, PrimitiveType, QuantitationDescriptor};

use crate::to_storage_err;

const DESCRIPTOR_COLUMNS: &str = "d.id, d.name, d.description, d.primitive_type, d.general_type,
    d.quantitation_type, d.scale, d.is_preferred, d.is_masked_preferred, d.is_background,
    d.is_background_subtracted, d.is_normalized, d.is_ratio";

/// Insert a descriptor and register it against `experiment`. An explicit id
/// is kept; otherwise SQLite assigns one.
pub fn insert_descriptor(
    conn: &Connection,
    experiment: ExperimentId,
    descriptor: &QuantitationDescriptor,
) -> ExprResult<DescriptorId> {
    conn.execute(
        "INSERT INTO quantitation_descriptors (
            id, name, description, primitive_type, general_type, quantitation_type, scale,
            is_preferred, is_masked_preferred, is_background, is_background_subtracted,
            is_normalized, is_ratio
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            descriptor.id.map(DescriptorId::value),
            descriptor.name,
            descriptor.description,
            descriptor.primitive_type.as_str(),
            descriptor.general_type.as_str(),
            descriptor.quantitation_type.as_str(),
            descriptor.scale.as_str(),
            descriptor.is_preferred,
            descriptor.is_masked_preferred,
            descriptor.is_background,
            descriptor.is_background_subtracted,
            descriptor.is_normalized,
            descriptor.is_ratio,
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    let id = DescriptorId(conn.last_insert_rowid());

    conn.execute(
        "INSERT INTO experiment_descriptors (experiment_id, descriptor_id) VALUES (?1, ?2)",
        params![experiment.value(), id.value()],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(id)
}

pub fn get_descriptors(
    conn: &Connection,
    experiment: ExperimentId,
) -> ExprResult<Vec<QuantitationDescriptor>> {
    let mut stmt = conn
        .prepare_cached(&format!(
            "SELECT {DESCRIPTOR_COLUMNS}
             FROM quantitation_descriptors d
             JOIN experiment_descriptors ed ON ed.descriptor_id = d.id
             WHERE ed.experiment_id = ?1
             ORDER BY d.id"
        ))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![experiment.value()], read_row)
        .map_err(|e| to_storage_err(e.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| to_storage_err(e.to_string()))?;
    rows.into_iter().map(parse_row).collect()
}

/// Delete the experiment's masked-preferred descriptors. Their vectors must
/// already be gone.
pub fn delete_masked_preferred(conn: &Connection, experiment: ExperimentId) -> ExprResult<usize> {
    conn.execute(
        "DELETE FROM quantitation_descriptors
         WHERE is_masked_preferred = 1
           AND id IN (SELECT descriptor_id FROM experiment_descriptors WHERE experiment_id = ?1)",
        params![experiment.value()],
    )
    .map_err(|e| to_storage_err(e.to_string()))
}

struct DescriptorRow {
    id: i64,
    name: String,
    description: String,
    primitive_type: String,
    general_type: String,
    quantitation_type: String,
    scale: String,
    flags: [bool; 6],
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<DescriptorRow> {
    Ok(DescriptorRow {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        primitive_type: row.get(3)?,
        general_type: row.get(4)?,
        quantitation_type: row.get(5)?,
        scale: row.get(6)?,
        flags: [
            row.get(7)?,
            row.get(8)?,
            row.get(9)?,
            row.get(10)?,
            row.get(11)?,
            row.get(12)?,
        ],
    })
}

fn parse_row(row: DescriptorRow) -> ExprResult<QuantitationDescriptor> {
    let id = row.id;
    let bad = |column: &str, value: &str| StorageError::Corruption {
        details: format!("descriptor {id}: unknown {column} {value:?}"),
    };
    let [is_preferred, is_masked_preferred, is_background, is_background_subtracted, is_normalized, is_ratio] =
        row.flags;
    Ok(QuantitationDescriptor {
        id: Some(DescriptorId(id)),
        primitive_type: PrimitiveType::parse(&row.primitive_type)
            .ok_or_else(|| bad("primitive type", &row.primitive_type))?,
        general_type: GeneralType::parse(&row.general_type)
            .ok_or_else(|| bad("general type", &row.general_type))?,
        quantitation_type: StandardQuantitationType::parse(&row.quantitation_type)
            .ok_or_else(|| bad("quantitation type", &row.quantitation_type))?,
        scale: ScaleType::parse(&row.scale).ok_or_else(|| bad("scale", &row.scale))?,
        name: row.name,
        description: row.description,
        is_preferred,
        is_masked_preferred,
        is_background,
        is_background_subtracted,
        is_normalized,
        is_ratio,
    })
}
