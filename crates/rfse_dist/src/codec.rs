use rfse::{
    Decoder, DecodingTable, Encoder, EncodingTable, Normalization, StreamDescriptor, header,
    normalize,
};
use rfse_io::{BitWriter, ReverseBitReader};

use crate::Error;

/// An integer type the magnitude codec understands. The alphabet is the
/// value's bit length, so it stays far below the byte codec's 256 symbols.
trait Value: Copy + Eq {
    const MAX_SYMBOLS: usize;
    const MAX_TABLE_LOG: u32;
    const SIZE: usize;

    fn to_u32(self) -> u32;
    fn from_u32(v: u32) -> Self;
    fn write_le(self, dst: &mut [u8]);
    fn read_le(src: &[u8]) -> Self;
}

impl Value for u16 {
    const MAX_SYMBOLS: usize = 16;
    const MAX_TABLE_LOG: u32 = crate::MAX_TABLE_LOG_U16;
    const SIZE: usize = 2;

    fn to_u32(self) -> u32 {
        u32::from(self)
    }
    fn from_u32(v: u32) -> Self {
        v as u16
    }
    fn write_le(self, dst: &mut [u8]) {
        dst[..2].copy_from_slice(&self.to_le_bytes());
    }
    fn read_le(src: &[u8]) -> Self {
        u16::from_le_bytes(src[..2].try_into().expect("slice length is guaranteed to be 2"))
    }
}

impl Value for u32 {
    const MAX_SYMBOLS: usize = crate::MAX_BITS_U32 as usize;
    const MAX_TABLE_LOG: u32 = crate::MAX_TABLE_LOG_U32;
    const SIZE: usize = 4;

    fn to_u32(self) -> u32 {
        self
    }
    fn from_u32(v: u32) -> Self {
        v
    }
    fn write_le(self, dst: &mut [u8]) {
        dst[..4].copy_from_slice(&self.to_le_bytes());
    }
    fn read_le(src: &[u8]) -> Self {
        u32::from_le_bytes(src[..4].try_into().expect("slice length is guaranteed to be 4"))
    }
}

/// Compresses nonzero u16 values. `table_log` of 0 picks the codec default.
pub fn compress_u16(dst: &mut [u8], src: &[u16], table_log: u32) -> Result<usize, Error> {
    compress_values(dst, src, table_log)
}

/// Decompresses into `dst` (whose length is the original value count) and
/// returns the compressed bytes consumed.
pub fn decompress_u16(dst: &mut [u16], src: &[u8]) -> Result<usize, Error> {
    decompress_values(dst, src)
}

/// Compresses nonzero u32 values below `1 << 26`.
pub fn compress_u32(dst: &mut [u8], src: &[u32], table_log: u32) -> Result<usize, Error> {
    compress_values(dst, src, table_log)
}

pub fn decompress_u32(dst: &mut [u32], src: &[u8]) -> Result<usize, Error> {
    decompress_values(dst, src)
}

fn magnitude<T: Value>(value: T) -> Result<u32, Error> {
    let v = value.to_u32();
    if v == 0 {
        return Err(Error::BadValue(v));
    }
    let magnitude = v.ilog2();
    if magnitude as usize >= T::MAX_SYMBOLS {
        return Err(Error::BadValue(v));
    }
    Ok(magnitude)
}

fn compress_values<T: Value>(dst: &mut [u8], src: &[T], table_log: u32) -> Result<usize, Error> {
    let table_log = if table_log == 0 {
        T::MAX_TABLE_LOG
    } else {
        table_log
    };
    if table_log > T::MAX_TABLE_LOG {
        return Err(Error::TableLogOutOfRange(table_log));
    }

    if src.len() > u32::MAX as usize {
        return Err(rfse::Error::BlockTooLarge(src.len()).into());
    }
    if src.len() <= 1 {
        if let Some(&v) = src.first() {
            magnitude(v)?;
        }
        return write_raw(dst, src);
    }
    if src.iter().all(|&v| v == src[0]) {
        magnitude(src[0])?;
        return write_single_value(dst, src[0]);
    }

    let mut counts = vec![0u32; T::MAX_SYMBOLS];
    for &v in src {
        counts[magnitude(v)? as usize] += 1;
    }
    let mut nb_symbols = T::MAX_SYMBOLS;
    while counts[nb_symbols - 1] == 0 {
        nb_symbols -= 1;
    }

    let counts = &mut counts[..nb_symbols];
    let table_log = match normalize(counts, src.len() as u32, table_log)? {
        // Every value shares one magnitude but they differ in their
        // mantissas; the symbol channel carries nothing, so store the block
        // as it is rather than lose the mantissas.
        Normalization::SingleSymbol => return write_raw(dst, src),
        Normalization::Distribution { table_log } => table_log,
    };

    let attempt = (|| -> Result<usize, Error> {
        let header_bytes = header::write(dst, counts, table_log)?;
        let table = EncodingTable::new(counts, table_log)?;

        let stream = &mut dst[header_bytes..];
        if stream.len() < StreamDescriptor::SIZE {
            return Err(Error::Io(rfse_io::Error::DstTooSmall));
        }
        let (descriptor, payload) = stream.split_at_mut(StreamDescriptor::SIZE);
        let mut w = BitWriter::new(payload);
        let mut state = Encoder::new(&table);

        for &v in src.iter().rev() {
            let sym = magnitude(v)?;
            // Mantissa first, magnitude second: the decoder pops them in
            // reverse.
            w.add_bits(u64::from(v.to_u32()), sym);
            state.encode(&mut w, sym as u8);
            w.flush()?;
        }
        state.finish(&mut w);
        let (payload_bytes, padding_bits) = w.close()?;

        let byte_len = StreamDescriptor::SIZE + payload_bytes;
        StreamDescriptor {
            byte_len,
            padding_bits,
            nb_states: 1,
        }
        .write(descriptor)?;
        Ok(header_bytes + byte_len)
    })();

    match attempt {
        Ok(total) if total < T::SIZE * src.len() - 1 => {
            tracing::debug!(total, raw = T::SIZE * src.len(), table_log, "dist block");
            Ok(total)
        }
        Ok(_) => write_raw(dst, src),
        Err(Error::Io(rfse_io::Error::DstTooSmall))
        | Err(Error::Fse(rfse::Error::Io(rfse_io::Error::DstTooSmall))) => write_raw(dst, src),
        Err(e) => Err(e),
    }
}

fn decompress_values<T: Value>(dst: &mut [T], src: &[u8]) -> Result<usize, Error> {
    let Some(&mode) = src.first() else {
        return Err(Error::Truncated {
            needed: 1,
            available: 0,
        });
    };

    match mode {
        0 => {
            let needed = 1 + T::SIZE * dst.len();
            if src.len() < needed {
                return Err(Error::Truncated {
                    needed,
                    available: src.len(),
                });
            }
            for (i, slot) in dst.iter_mut().enumerate() {
                *slot = T::read_le(&src[1 + i * T::SIZE..]);
            }
            Ok(needed)
        }
        1 => {
            let needed = 1 + T::SIZE;
            if src.len() < needed {
                return Err(Error::Truncated {
                    needed,
                    available: src.len(),
                });
            }
            dst.fill(T::read_le(&src[1..]));
            Ok(needed)
        }
        m if m & 3 == 2 => {
            let (dist, header_bytes) = header::read(src)?;
            if dist.nb_symbols > T::MAX_SYMBOLS {
                return Err(Error::MalformedStream);
            }
            let table = DecodingTable::new(&dist.counts[..dist.nb_symbols], dist.table_log)?;

            let stream = &src[header_bytes..];
            let desc = StreamDescriptor::read(stream)?;
            if desc.nb_states != 1 {
                return Err(Error::MalformedStream);
            }
            if desc.byte_len > stream.len() {
                return Err(Error::Truncated {
                    needed: desc.byte_len,
                    available: stream.len(),
                });
            }

            let block = &stream[..desc.byte_len];
            let mut r = ReverseBitReader::new(block, desc.byte_len, desc.padding_bits)?;
            let mut state = Decoder::new(&table, &mut r);
            r.reload()?;

            for slot in dst.iter_mut() {
                let sym = u32::from(state.decode(&mut r));
                r.reload()?;
                let mantissa = r.read_bits(sym);
                r.reload()?;
                *slot = T::from_u32((1 << sym) + mantissa);
            }

            if !r.fully_consumed() {
                return Err(Error::MalformedStream);
            }
            Ok(header_bytes + desc.byte_len)
        }
        _ => Err(Error::MalformedStream),
    }
}

fn write_raw<T: Value>(dst: &mut [u8], src: &[T]) -> Result<usize, Error> {
    let total = 1 + T::SIZE * src.len();
    if dst.len() < total {
        return Err(Error::Io(rfse_io::Error::DstTooSmall));
    }

    dst[0] = 0;
    for (i, &v) in src.iter().enumerate() {
        v.write_le(&mut dst[1 + i * T::SIZE..]);
    }
    Ok(total)
}

fn write_single_value<T: Value>(dst: &mut [u8], value: T) -> Result<usize, Error> {
    let total = 1 + T::SIZE;
    if dst.len() < total {
        return Err(Error::Io(rfse_io::Error::DstTooSmall));
    }

    dst[0] = 1;
    value.write_le(&mut dst[1..]);
    Ok(total)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn bound(values: usize, size: usize) -> usize {
        values * (size + 1) + 64
    }

    fn round_trip_u16(src: &[u16]) -> Vec<u8> {
        let mut compressed = vec![0u8; bound(src.len(), 2)];
        let written = compress_u16(&mut compressed, src, 0).expect("compress");
        compressed.truncate(written);

        let mut out = vec![0u16; src.len()];
        let consumed = decompress_u16(&mut out, &compressed).expect("decompress");
        assert_eq!(consumed, written);
        assert_eq!(out, src);
        compressed
    }

    fn round_trip_u32(src: &[u32]) -> Vec<u8> {
        let mut compressed = vec![0u8; bound(src.len(), 4)];
        let written = compress_u32(&mut compressed, src, 0).expect("compress");
        compressed.truncate(written);

        let mut out = vec![0u32; src.len()];
        let consumed = decompress_u32(&mut out, &compressed).expect("decompress");
        assert_eq!(consumed, written);
        assert_eq!(out, src);
        compressed
    }

    #[test]
    fn test_skewed_magnitudes_compress() {
        // Mostly short distances with a few long ones, as an LZ match stream
        // would produce.
        let src: Vec<u16> = (0..4000u32)
            .map(|i| match i % 10 {
                0 => 1000 + (i % 31) as u16,
                1 | 2 => 40 + (i % 7) as u16,
                _ => 3 + (i % 2) as u16,
            })
            .collect();

        let compressed = round_trip_u16(&src);
        assert_eq!(compressed[0] & 3, 2);
        assert!(compressed.len() < 2 * src.len());
    }

    #[test]
    fn test_u32_round_trip() {
        let src: Vec<u32> = (0..3000u32)
            .map(|i| match i % 7 {
                0 => (1 << 20) + i,
                1 | 2 => 500 + i % 400,
                _ => 2 + i % 6,
            })
            .collect();

        let compressed = round_trip_u32(&src);
        assert_eq!(compressed[0] & 3, 2);
        assert!(compressed.len() < 4 * src.len());
    }

    #[test]
    fn test_constant_values_become_single_frame() {
        let src = [742u16; 500];
        let compressed = round_trip_u16(&src);
        assert_eq!(compressed.len(), 3);
        assert_eq!(compressed[0], 1);
        assert_eq!(u16::from_le_bytes([compressed[1], compressed[2]]), 742);
    }

    #[test]
    fn test_same_magnitude_distinct_values_stay_lossless() {
        // One magnitude bucket, differing mantissas: must not collapse to a
        // single-value frame.
        let src: Vec<u16> = (0..100u16).map(|i| 64 + (i % 64)).collect();
        let compressed = round_trip_u16(&src);
        assert_eq!(compressed[0], 0);
    }

    #[test]
    fn test_tiny_input_is_raw() {
        let compressed = round_trip_u16(&[1, 2]);
        assert_eq!(compressed, [0, 1, 0, 2, 0]);
    }

    #[test]
    fn test_zero_value_rejected() {
        let mut dst = [0u8; 64];
        assert!(matches!(
            compress_u16(&mut dst, &[4, 0, 2], 0),
            Err(Error::BadValue(0))
        ));
    }

    #[test]
    fn test_oversized_u32_rejected() {
        let mut dst = [0u8; 64];
        assert!(matches!(
            compress_u32(&mut dst, &[1, 1 << 26, 2], 0),
            Err(Error::BadValue(_))
        ));
    }

    #[test]
    fn test_oversized_table_log_rejected() {
        let mut dst = [0u8; 64];
        assert!(matches!(
            compress_u16(&mut dst, &[1, 2, 3], crate::MAX_TABLE_LOG_U16 + 1),
            Err(Error::TableLogOutOfRange(_))
        ));
    }

    #[test]
    fn test_truncated_stream_rejected() {
        let src: Vec<u16> = (0..2000u32).map(|i| 3 + (i % 4) as u16).collect();
        let mut compressed = vec![0u8; bound(src.len(), 2)];
        let written = compress_u16(&mut compressed, &src, 0).expect("compress");
        assert_eq!(compressed[0] & 3, 2, "want an fse frame for this test");

        let mut out = vec![0u16; src.len()];
        for k in (0..written).step_by(7) {
            assert!(
                decompress_u16(&mut out, &compressed[..k]).is_err(),
                "truncation to {k} bytes must fail"
            );
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn test_fuzz_u16_round_trip(
            src in proptest::collection::vec(1u16..=u16::MAX, 1..2000)
        ) {
            round_trip_u16(&src);
        }

        #[test]
        fn test_fuzz_u32_round_trip(
            src in proptest::collection::vec(1u32..(1 << 26), 1..2000)
        ) {
            round_trip_u32(&src);
        }
    }
}
