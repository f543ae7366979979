use std::fmt;

use serde::{Deserialize, Serialize};

use super::ids::DescriptorId;

/// Element encoding of a stored vector blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveType {
    Double,
    Float,
    Int,
    Long,
    Boolean,
    String,
    DoubleArray,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 7] = [
        PrimitiveType::Double,
        PrimitiveType::Float,
        PrimitiveType::Int,
        PrimitiveType::Long,
        PrimitiveType::Boolean,
        PrimitiveType::String,
        PrimitiveType::DoubleArray,
    ];

    /// Stable one-byte tag written at the head of every blob.
    /// These values are part of the storage format and must never change.
    pub fn tag(self) -> u8 {
        match self {
            PrimitiveType::Double => 1,
            PrimitiveType::Float => 2,
            PrimitiveType::Int => 3,
            PrimitiveType::Long => 4,
            PrimitiveType::Boolean => 5,
            PrimitiveType::String => 6,
            PrimitiveType::DoubleArray => 7,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.tag() == tag)
    }

    /// Width in bytes of one element, or `None` for variable-width types.
    pub fn element_width(self) -> Option<usize> {
        match self {
            PrimitiveType::Double | PrimitiveType::Long => Some(8),
            PrimitiveType::Float | PrimitiveType::Int => Some(4),
            PrimitiveType::Boolean => Some(1),
            PrimitiveType::String | PrimitiveType::DoubleArray => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PrimitiveType::Double => "double",
            PrimitiveType::Float => "float",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::String => "string",
            PrimitiveType::DoubleArray => "double_array",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == s)
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneralType {
    Quantitative,
    Categorical,
}

/// What the values measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StandardQuantitationType {
    Amount,
    Count,
    /// Presence/absence call. Boolean vectors of this type are the
    /// missing-value matrix of two-channel experiments.
    PresentAbsent,
    Correlation,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleType {
    Linear,
    Log2,
    Log10,
    Ln,
    Percent,
    Count,
    Other,
}

macro_rules! string_enum {
    ($ty:ty { $($variant:ident => $s:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }

            pub fn parse(s: &str) -> Option<Self> {
                match s {
                    $($s => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

string_enum!(GeneralType {
    Quantitative => "quantitative",
    Categorical => "categorical",
});

string_enum!(StandardQuantitationType {
    Amount => "amount",
    Count => "count",
    PresentAbsent => "present_absent",
    Correlation => "correlation",
    Other => "other",
});

string_enum!(ScaleType {
    Linear => "linear",
    Log2 => "log2",
    Log10 => "log10",
    Ln => "ln",
    Percent => "percent",
    Count => "count",
    Other => "other",
});

/// Describes a vector's numeric encoding and role within its experiment.
///
/// `id` is `None` until the store has registered the descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantitationDescriptor {
    pub id: Option<DescriptorId>,
    pub name: String,
    pub description: String,
    pub primitive_type: PrimitiveType,
    pub general_type: GeneralType,
    pub quantitation_type: StandardQuantitationType,
    pub scale: ScaleType,
    pub is_preferred: bool,
    pub is_masked_preferred: bool,
    pub is_background: bool,
    pub is_background_subtracted: bool,
    pub is_normalized: bool,
    pub is_ratio: bool,
}

impl QuantitationDescriptor {
    /// Whether vectors of this descriptor are the presence/absence matrix.
    pub fn is_presence_call(&self) -> bool {
        self.quantitation_type == StandardQuantitationType::PresentAbsent
            && self.primitive_type == PrimitiveType::Boolean
    }

    /// Derive the masked-preferred descriptor from this (preferred) one.
    ///
    /// Scale, representation, and background flags carry over; the result is
    /// always double-encoded, not preferred, and unregistered.
    pub fn derive_masked_preferred(&self) -> QuantitationDescriptor {
        QuantitationDescriptor {
            id: None,
            name: format!("{} - Masked", self.name),
            description: format!(
                "{} Masked with missing values from the presence/absence calls",
                self.description
            )
            .trim()
            .to_string(),
            primitive_type: PrimitiveType::Double,
            general_type: self.general_type,
            quantitation_type: self.quantitation_type,
            scale: self.scale,
            is_preferred: false,
            is_masked_preferred: true,
            is_background: self.is_background,
            is_background_subtracted: self.is_background_subtracted,
            is_normalized: self.is_normalized,
            is_ratio: self.is_ratio,
        }
    }
}
