use exprvec_core::errors::CodecError;
use exprvec_core::PrimitiveType;

/// A decoded vector, typed by its primitive encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum VectorValues {
    Double(Vec<f64>),
    Float(Vec<f32>),
    Int(Vec<i32>),
    Long(Vec<i64>),
    Boolean(Vec<bool>),
    String(Vec<String>),
    DoubleArray(Vec<Vec<f64>>),
}

impl VectorValues {
    pub fn primitive_type(&self) -> PrimitiveType {
        match self {
            VectorValues::Double(_) => PrimitiveType::Double,
            VectorValues::Float(_) => PrimitiveType::Float,
            VectorValues::Int(_) => PrimitiveType::Int,
            VectorValues::Long(_) => PrimitiveType::Long,
            VectorValues::Boolean(_) => PrimitiveType::Boolean,
            VectorValues::String(_) => PrimitiveType::String,
            VectorValues::DoubleArray(_) => PrimitiveType::DoubleArray,
        }
    }

    /// Number of elements (one per sample).
    pub fn len(&self) -> usize {
        match self {
            VectorValues::Double(v) => v.len(),
            VectorValues::Float(v) => v.len(),
            VectorValues::Int(v) => v.len(),
            VectorValues::Long(v) => v.len(),
            VectorValues::Boolean(v) => v.len(),
            VectorValues::String(v) => v.len(),
            VectorValues::DoubleArray(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Widen numeric values to `f64`. Booleans map to 1.0/0.0.
    pub fn to_f64(&self) -> Result<Vec<f64>, CodecError> {
        match self {
            VectorValues::Double(v) => Ok(v.clone()),
            VectorValues::Float(v) => Ok(v.iter().map(|x| f64::from(*x)).collect()),
            VectorValues::Int(v) => Ok(v.iter().map(|x| f64::from(*x)).collect()),
            VectorValues::Long(v) => Ok(v.iter().map(|x| *x as f64).collect()),
            VectorValues::Boolean(v) => Ok(v.iter().map(|b| if *b { 1.0 } else { 0.0 }).collect()),
            VectorValues::String(_) | VectorValues::DoubleArray(_) => Err(CodecError::NotNumeric {
                primitive: self.primitive_type(),
            }),
        }
    }

    pub fn into_doubles(self) -> Result<Vec<f64>, CodecError> {
        match self {
            VectorValues::Double(v) => Ok(v),
            other => other.to_f64(),
        }
    }
}
