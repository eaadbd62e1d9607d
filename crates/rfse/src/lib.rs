//! Finite State Entropy codec: a tabulated ANS entropy coder for byte
//! streams.
//!
//! A block is compressed by counting its symbols, normalizing the counts to a
//! power-of-two total, serializing that distribution into a compact header,
//! and then running the tANS state machine backwards over the input so the
//! decoder can stream forwards. Blocks that do not shrink are stored raw;
//! constant blocks collapse to two bytes.
//!
//! The building blocks (histogram, normalization, header codec, spread,
//! tables, descriptor) are exported so layered codecs can reuse them on
//! non-byte alphabets.

use rfse_foundation::const_assert;

mod block;
mod count;
mod decode;
mod descriptor;
mod encode;
mod errors;
pub mod header;
mod metrics;
mod normalize;
mod spread;

pub use block::{
    compress, compress_bound, compress_observed, compress_with, decompress, decompress_safe,
};
pub use count::histogram;
pub use decode::{Decoder, DecodingTable, decompress_using_table};
pub use descriptor::StreamDescriptor;
pub use encode::{Encoder, EncodingTable, compress_using_table};
pub use errors::Error;
pub use metrics::{BlockMetrics, BlockMode, BlockObserver};
pub use normalize::{Normalization, normalize};
pub use spread::spread_symbols;

pub const MIN_TABLE_LOG: u32 = 5;
/// From a memory-usage tuning constant of 14 (16 KiB of tables), minus 2.
pub const MAX_TABLE_LOG: u32 = 12;
pub const MAX_SYMBOLS: usize = 256;

// State values must fit the 16-bit table entries, and seeding a state with
// its last symbol requires the alphabet to fit the table.
const_assert!(MAX_TABLE_LOG <= 15);
const_assert!(MIN_TABLE_LOG >= 1);
const_assert!(MIN_TABLE_LOG <= MAX_TABLE_LOG);
const_assert!(MAX_SYMBOLS <= 1 << MAX_TABLE_LOG);
