//! Entropy coding for streams of nonzero integers (match lengths, distances,
//! and similar length-limited values).
//!
//! Each value splits into a magnitude symbol (its bit length minus one) and a
//! mantissa stored as raw bits with the top bit implied. Only the magnitudes
//! go through the FSE core, so the alphabet stays tiny (16 symbols for u16,
//! 26 for u32) while values span their full range. The framing is the byte
//! codec's: the same mode byte, distribution header, stream descriptor and
//! termination checks, with a single ANS state.

mod codec;
mod errors;

pub use codec::{compress_u16, compress_u32, decompress_u16, decompress_u32};
pub use errors::Error;

/// Values must stay below `1 << MAX_BITS_U32`; the magnitude alphabet and the
/// mantissa reader are sized for it.
pub const MAX_BITS_U32: u32 = 26;

pub const MAX_TABLE_LOG_U16: u32 = 10;
pub const MAX_TABLE_LOG_U32: u32 = 11;
