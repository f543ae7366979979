//! MaskingPipeline: merges preferred signal with presence/absence calls.
//!
//! One-channel data has no presence matrix and passes through unchanged.
//! Two-channel data gets NaN wherever the presence call is false.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use tracing::{debug, warn};

use exprvec_core::errors::{ExprResult, MaskingError};
use exprvec_core::models::{DescriptorId, DimensionId, PrimitiveType};
use exprvec_core::{ExperimentId, ProbeId, QuantitationDescriptor, RawVector};

/// A decoded numeric vector moving through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalVector {
    pub experiment: ExperimentId,
    pub probe: ProbeId,
    pub dimension: DimensionId,
    pub values: Vec<f64>,
    /// Whether the masking step has been applied.
    pub masked: bool,
}

/// Result of one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct MaskingOutcome {
    pub vectors: Vec<SignalVector>,
    /// Number of values replaced by NaN.
    pub masked_values: usize,
    /// Probes that had signal but no presence vector (left unmasked).
    pub probes_without_presence: Vec<ProbeId>,
}

/// Stateless masking pipeline. Deterministic for identical inputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaskingPipeline {
    strict: bool,
}

impl MaskingPipeline {
    /// `strict` turns a missing presence vector into an error instead of a
    /// warning.
    pub fn new(strict: bool) -> Self {
        Self { strict }
    }

    /// Run the pipeline.
    ///
    /// `descriptors` must cover every descriptor referenced by `signal`.
    /// `presence` is `None` for one-channel data.
    pub fn run(
        &self,
        signal: &[RawVector],
        descriptors: &[QuantitationDescriptor],
        presence: Option<&[RawVector]>,
    ) -> ExprResult<MaskingOutcome> {
        let mut vectors = decode_signal(signal, descriptors)?;

        let Some(presence) = presence else {
            vectors.iter_mut().for_each(|v| v.masked = true);
            debug!(vectors = vectors.len(), "no presence data, nothing to mask");
            return Ok(MaskingOutcome {
                vectors,
                ..Default::default()
            });
        };

        let calls = decode_presence(presence)?;
        let mut masked_values = 0usize;
        let mut without_presence = Vec::new();

        for vector in &mut vectors {
            match calls.get(&(vector.experiment, vector.probe)) {
                None => without_presence.push(vector.probe),
                Some(present) => {
                    if present.len() != vector.values.len() {
                        return Err(MaskingError::ShapeMismatch {
                            probe: vector.probe,
                            signal_len: vector.values.len(),
                            presence_len: present.len(),
                        }
                        .into());
                    }
                    for (value, &is_present) in vector.values.iter_mut().zip(present) {
                        if !is_present {
                            *value = f64::NAN;
                            masked_values += 1;
                        }
                    }
                }
            }
            vector.masked = true;
        }

        if let Some(&first) = without_presence.first() {
            if self.strict {
                return Err(MaskingError::MissingPresenceData {
                    first,
                    count: without_presence.len(),
                }
                .into());
            }
            // Once per run, not per probe.
            warn!(
                probes = without_presence.len(),
                first = %first,
                "presence data missing for some probes; treating them as fully present"
            );
        }

        debug!(
            vectors = vectors.len(),
            masked_values,
            "masking complete"
        );

        Ok(MaskingOutcome {
            vectors,
            masked_values,
            probes_without_presence: without_presence,
        })
    }
}

fn decode_signal(
    signal: &[RawVector],
    descriptors: &[QuantitationDescriptor],
) -> ExprResult<Vec<SignalVector>> {
    let primitive_of: HashMap<DescriptorId, PrimitiveType> = descriptors
        .iter()
        .filter_map(|d| d.id.map(|id| (id, d.primitive_type)))
        .collect();

    signal
        .iter()
        .map(|raw| -> ExprResult<SignalVector> {
            let primitive = primitive_of.get(&raw.descriptor).copied().ok_or(
                MaskingError::UnknownDescriptor {
                    probe: raw.probe,
                    descriptor: raw.descriptor,
                },
            )?;
            Ok(SignalVector {
                experiment: raw.experiment,
                probe: raw.probe,
                dimension: raw.dimension,
                values: exprvec_codec::decode_numeric(&raw.data, primitive)?,
                masked: false,
            })
        })
        .collect()
}

fn decode_presence(
    presence: &[RawVector],
) -> ExprResult<HashMap<(ExperimentId, ProbeId), Vec<bool>>> {
    let mut calls = HashMap::with_capacity(presence.len());
    for raw in presence {
        match calls.entry((raw.experiment, raw.probe)) {
            Entry::Occupied(_) => {
                return Err(MaskingError::DuplicatePresenceCall { probe: raw.probe }.into());
            }
            Entry::Vacant(slot) => {
                slot.insert(exprvec_codec::decode_booleans(&raw.data)?);
            }
        }
    }
    Ok(calls)
}

#[cfg(test)]
mod tests {
    use exprvec_codec::{encode, VectorValues};
    use exprvec_core::models::{GeneralType, ScaleType, StandardQuantitationType};
    use exprvec_core::ExprError;

    use super::*;

    const SIGNAL: DescriptorId = DescriptorId(1);
    const PRESENCE: DescriptorId = DescriptorId(2);

    fn descriptor(id: DescriptorId, primitive: PrimitiveType) -> QuantitationDescriptor {
        QuantitationDescriptor {
            id: Some(id),
            name: "d".to_string(),
            description: String::new(),
            primitive_type: primitive,
            general_type: GeneralType::Quantitative,
            quantitation_type: StandardQuantitationType::Amount,
            scale: ScaleType::Linear,
            is_preferred: id == SIGNAL,
            is_masked_preferred: false,
            is_background: false,
            is_background_subtracted: false,
            is_normalized: false,
            is_ratio: false,
        }
    }

    fn descriptors() -> Vec<QuantitationDescriptor> {
        vec![
            descriptor(SIGNAL, PrimitiveType::Double),
            descriptor(PRESENCE, PrimitiveType::Boolean),
        ]
    }

    fn signal(probe: i64, values: &[f64]) -> RawVector {
        RawVector {
            experiment: ExperimentId(1),
            probe: ProbeId(probe),
            descriptor: SIGNAL,
            dimension: DimensionId(1),
            data: exprvec_codec::encode_doubles(values),
        }
    }

    fn presence(probe: i64, calls: &[bool]) -> RawVector {
        RawVector {
            experiment: ExperimentId(1),
            probe: ProbeId(probe),
            descriptor: PRESENCE,
            dimension: DimensionId(1),
            data: encode(&VectorValues::Boolean(calls.to_vec()), PrimitiveType::Boolean).unwrap(),
        }
    }

    #[test]
    fn absent_calls_become_nan() {
        let out = MaskingPipeline::default()
            .run(
                &[signal(1, &[1.0, 2.0, 3.0, 4.0])],
                &descriptors(),
                Some(&[presence(1, &[true, false, true, false])]),
            )
            .unwrap();
        let v = &out.vectors[0];
        assert!(v.masked);
        assert_eq!(v.values[0], 1.0);
        assert!(v.values[1].is_nan());
        assert_eq!(v.values[2], 3.0);
        assert!(v.values[3].is_nan());
        assert_eq!(out.masked_values, 2);
    }

    #[test]
    fn length_mismatch_is_fatal() {
        let err = MaskingPipeline::default()
            .run(
                &[signal(1, &[1.0, 2.0, 3.0, 4.0])],
                &descriptors(),
                Some(&[presence(1, &[true, false, true])]),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            ExprError::MaskingError(MaskingError::ShapeMismatch {
                signal_len: 4,
                presence_len: 3,
                ..
            })
        ));
    }

    #[test]
    fn second_presence_vector_for_a_probe_is_rejected() {
        let err = MaskingPipeline::default()
            .run(
                &[signal(1, &[1.0, 2.0])],
                &descriptors(),
                Some(&[presence(1, &[true, true]), presence(1, &[false, false])]),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            ExprError::MaskingError(MaskingError::DuplicatePresenceCall { probe: ProbeId(1) })
        ));
    }

    #[test]
    fn one_channel_passes_through_flagged_masked() {
        let out = MaskingPipeline::default()
            .run(&[signal(1, &[1.0, 2.0]), signal(2, &[3.0, 4.0])], &descriptors(), None)
            .unwrap();
        assert_eq!(out.vectors.len(), 2);
        assert!(out.vectors.iter().all(|v| v.masked));
        assert_eq!(out.vectors[0].values, vec![1.0, 2.0]);
        assert_eq!(out.masked_values, 0);
    }

    #[test]
    fn missing_presence_falls_back_to_unmasked() {
        let out = MaskingPipeline::default()
            .run(
                &[signal(1, &[1.0, 2.0]), signal(2, &[3.0, 4.0])],
                &descriptors(),
                Some(&[presence(1, &[false, true])]),
            )
            .unwrap();
        assert_eq!(out.probes_without_presence, vec![ProbeId(2)]);
        let p2 = out.vectors.iter().find(|v| v.probe == ProbeId(2)).unwrap();
        assert!(p2.masked);
        assert_eq!(p2.values, vec![3.0, 4.0]);
    }

    #[test]
    fn strict_mode_rejects_missing_presence() {
        let err = MaskingPipeline::new(true)
            .run(
                &[signal(1, &[1.0, 2.0]), signal(2, &[3.0, 4.0])],
                &descriptors(),
                Some(&[presence(1, &[false, true])]),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            ExprError::MaskingError(MaskingError::MissingPresenceData { count: 1, .. })
        ));
    }

    #[test]
    fn unknown_descriptor_is_reported() {
        let err = MaskingPipeline::default()
            .run(&[signal(1, &[1.0])], &[], None)
            .unwrap_err();
        assert!(matches!(
            err,
            ExprError::MaskingError(MaskingError::UnknownDescriptor { .. })
        ));
    }

    #[test]
    fn integer_signal_is_widened() {
        let mut raw = signal(1, &[]);
        raw.descriptor = DescriptorId(3);
        raw.data = encode(&VectorValues::Int(vec![5, 6]), PrimitiveType::Int).unwrap();
        let mut ds = descriptors();
        ds.push(descriptor(DescriptorId(3), PrimitiveType::Int));
        let out = MaskingPipeline::default().run(&[raw], &ds, None).unwrap();
        assert_eq!(out.vectors[0].values, vec![5.0, 6.0]);
    }

    #[test]
    fn malformed_signal_blob_propagates() {
        let mut raw = signal(1, &[1.0]);
        raw.data.push(0);
        let err = MaskingPipeline::default()
            .run(&[raw], &descriptors(), None)
            .unwrap_err();
        assert!(matches!(err, ExprError::CodecError(_)));
    }
}
