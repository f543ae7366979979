//! # exprvec-codec
//!
//! Converts between typed value arrays and the binary blobs stored for raw
//! and processed vectors.
//!
//! ## Blob layout
//!
//! ```text
//! [tag: u8][payload ...]
//! ```
//!
//! `tag` is [`PrimitiveType::tag`](exprvec_core::PrimitiveType::tag).
//! Fixed-width types store little-endian elements back to back. `string`
//! elements are a `u32` byte length followed by UTF-8 bytes; `double_array`
//! elements are a `u32` element count followed by that many `f64`s.
//! Floats are stored bit-exact, so NaN payloads survive a round trip.

mod codec;
mod values;

pub use codec::{decode, decode_booleans, decode_doubles, decode_numeric, encode, encode_doubles};
pub use values::VectorValues;
