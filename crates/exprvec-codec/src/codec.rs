//! encode/decode between `VectorValues` and tagged blobs.

use exprvec_core::errors::CodecError;
use exprvec_core::PrimitiveType;

use crate::values::VectorValues;

const HEADER_LEN: usize = 1;
const LEN_PREFIX: usize = 4;

/// Encode `values` as a blob of type `primitive`.
///
/// Fails with `TypeMismatch` if the values are not of that type.
pub fn encode(values: &VectorValues, primitive: PrimitiveType) -> Result<Vec<u8>, CodecError> {
    let actual = values.primitive_type();
    if actual != primitive {
        return Err(CodecError::TypeMismatch {
            expected: primitive,
            actual,
        });
    }

    let width = primitive.element_width().unwrap_or(LEN_PREFIX);
    let mut out = Vec::with_capacity(HEADER_LEN + values.len() * width);
    out.push(primitive.tag());

    match values {
        VectorValues::Double(v) => v.iter().for_each(|x| out.extend_from_slice(&x.to_le_bytes())),
        VectorValues::Float(v) => v.iter().for_each(|x| out.extend_from_slice(&x.to_le_bytes())),
        VectorValues::Int(v) => v.iter().for_each(|x| out.extend_from_slice(&x.to_le_bytes())),
        VectorValues::Long(v) => v.iter().for_each(|x| out.extend_from_slice(&x.to_le_bytes())),
        VectorValues::Boolean(v) => out.extend(v.iter().map(|b| u8::from(*b))),
        VectorValues::String(v) => {
            for s in v {
                write_len(&mut out, s.len(), primitive)?;
                out.extend_from_slice(s.as_bytes());
            }
        }
        VectorValues::DoubleArray(v) => {
            for row in v {
                write_len(&mut out, row.len(), primitive)?;
                row.iter()
                    .for_each(|x| out.extend_from_slice(&x.to_le_bytes()));
            }
        }
    }

    Ok(out)
}

/// Encode doubles. Infallible shorthand for the processed-vector path.
pub fn encode_doubles(values: &[f64]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + values.len() * 8);
    out.push(PrimitiveType::Double.tag());
    values
        .iter()
        .for_each(|x| out.extend_from_slice(&x.to_le_bytes()));
    out
}

/// Decode a blob that is expected to hold `primitive` values.
pub fn decode(bytes: &[u8], primitive: PrimitiveType) -> Result<VectorValues, CodecError> {
    let payload = split_header(bytes, primitive)?;

    let values = match primitive {
        PrimitiveType::Double => VectorValues::Double(fixed::<8, _>(payload, primitive, f64::from_le_bytes)?),
        PrimitiveType::Float => VectorValues::Float(fixed::<4, _>(payload, primitive, f32::from_le_bytes)?),
        PrimitiveType::Int => VectorValues::Int(fixed::<4, _>(payload, primitive, i32::from_le_bytes)?),
        PrimitiveType::Long => VectorValues::Long(fixed::<8, _>(payload, primitive, i64::from_le_bytes)?),
        PrimitiveType::Boolean => VectorValues::Boolean(booleans(payload)?),
        PrimitiveType::String => VectorValues::String(strings(payload)?),
        PrimitiveType::DoubleArray => VectorValues::DoubleArray(double_arrays(payload)?),
    };
    Ok(values)
}

/// Decode a blob of doubles.
pub fn decode_doubles(bytes: &[u8]) -> Result<Vec<f64>, CodecError> {
    match decode(bytes, PrimitiveType::Double)? {
        VectorValues::Double(v) => Ok(v),
        other => Err(CodecError::TypeMismatch {
            expected: PrimitiveType::Double,
            actual: other.primitive_type(),
        }),
    }
}

/// Decode a blob of booleans.
pub fn decode_booleans(bytes: &[u8]) -> Result<Vec<bool>, CodecError> {
    match decode(bytes, PrimitiveType::Boolean)? {
        VectorValues::Boolean(v) => Ok(v),
        other => Err(CodecError::TypeMismatch {
            expected: PrimitiveType::Boolean,
            actual: other.primitive_type(),
        }),
    }
}

/// Decode any numeric blob and widen it to doubles.
pub fn decode_numeric(bytes: &[u8], primitive: PrimitiveType) -> Result<Vec<f64>, CodecError> {
    decode(bytes, primitive)?.into_doubles()
}

fn malformed(primitive: PrimitiveType, reason: String) -> CodecError {
    CodecError::MalformedVector { primitive, reason }
}

fn split_header(bytes: &[u8], primitive: PrimitiveType) -> Result<&[u8], CodecError> {
    let Some((&tag, payload)) = bytes.split_first() else {
        return Err(malformed(primitive, "empty blob, missing type tag".to_string()));
    };
    match PrimitiveType::from_tag(tag) {
        None => Err(malformed(primitive, format!("unknown type tag {tag}"))),
        Some(actual) if actual != primitive => Err(CodecError::TypeMismatch {
            expected: primitive,
            actual,
        }),
        Some(_) => Ok(payload),
    }
}

fn write_len(out: &mut Vec<u8>, len: usize, primitive: PrimitiveType) -> Result<(), CodecError> {
    let len = u32::try_from(len)
        .map_err(|_| malformed(primitive, format!("element length {len} exceeds u32")))?;
    out.extend_from_slice(&len.to_le_bytes());
    Ok(())
}

fn fixed<const W: usize, T>(
    payload: &[u8],
    primitive: PrimitiveType,
    convert: impl Fn([u8; W]) -> T,
) -> Result<Vec<T>, CodecError> {
    if payload.len() % W != 0 {
        return Err(malformed(
            primitive,
            format!(
                "payload of {} bytes is not a multiple of the {W}-byte element width",
                payload.len()
            ),
        ));
    }
    Ok(payload
        .chunks_exact(W)
        .map(|chunk| {
            let mut buf = [0u8; W];
            buf.copy_from_slice(chunk);
            convert(buf)
        })
        .collect())
}

fn booleans(payload: &[u8]) -> Result<Vec<bool>, CodecError> {
    payload
        .iter()
        .enumerate()
        .map(|(i, byte)| match byte {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(malformed(
                PrimitiveType::Boolean,
                format!("invalid boolean byte {other:#04x} at index {i}"),
            )),
        })
        .collect()
}

/// Cursor over a variable-width payload.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
    primitive: PrimitiveType,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8], primitive: PrimitiveType) -> Self {
        Self {
            buf,
            pos: 0,
            primitive,
        }
    }

    fn is_done(&self) -> bool {
        self.pos == self.buf.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.buf.len())
            .ok_or_else(|| {
                malformed(
                    self.primitive,
                    format!(
                        "truncated payload: need {n} bytes at offset {}, have {}",
                        self.pos,
                        self.buf.len() - self.pos
                    ),
                )
            })?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_len(&mut self) -> Result<usize, CodecError> {
        let mut buf = [0u8; LEN_PREFIX];
        buf.copy_from_slice(self.take(LEN_PREFIX)?);
        Ok(u32::from_le_bytes(buf) as usize)
    }
}

fn strings(payload: &[u8]) -> Result<Vec<String>, CodecError> {
    let mut reader = Reader::new(payload, PrimitiveType::String);
    let mut out = Vec::new();
    while !reader.is_done() {
        let len = reader.read_len()?;
        let bytes = reader.take(len)?;
        let s = std::str::from_utf8(bytes).map_err(|e| {
            malformed(PrimitiveType::String, format!("invalid UTF-8 in element {}: {e}", out.len()))
        })?;
        out.push(s.to_string());
    }
    Ok(out)
}

fn double_arrays(payload: &[u8]) -> Result<Vec<Vec<f64>>, CodecError> {
    let mut reader = Reader::new(payload, PrimitiveType::DoubleArray);
    let mut out = Vec::new();
    while !reader.is_done() {
        let count = reader.read_len()?;
        let byte_len = count.checked_mul(8).ok_or_else(|| {
            malformed(PrimitiveType::DoubleArray, format!("element count {count} overflows"))
        })?;
        let bytes = reader.take(byte_len)?;
        out.push(fixed::<8, _>(bytes, PrimitiveType::DoubleArray, f64::from_le_bytes)?);
    }
    Ok(out)
}
