//! Compressed representation of a normalized distribution.
//!
//! Writer and reader walk the same state machine: `remaining` starts at the
//! table size and shrinks by each count; `threshold` halves (and the field
//! width shrinks with it) whenever `remaining` drops below it. A count is
//! stored in `nb_bits - 1` bits when its low bits fall below the split point
//! `max = 2 * threshold - 1 - remaining`, and in `nb_bits` bits (offset by
//! `max`) otherwise, so frequent small counts cost a fractional bit less.
//! Zero runs are packed separately: one 0xFFFF word per 24 zeros, 2-bit
//! groups of 3 to continue, and a closing 2-bit group.

use rfse_io::{BitReader, BitWriter};

use crate::{Error, MAX_SYMBOLS, MAX_TABLE_LOG, MIN_TABLE_LOG};

/// A parsed distribution header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Distribution {
    pub counts: [u32; MAX_SYMBOLS],
    pub nb_symbols: usize,
    pub table_log: u32,
}

/// Serializes `counts` (summing to `1 << table_log`). The first byte carries
/// the header id `2` in its low 2 bits and `table_log - MIN_TABLE_LOG` in the
/// next 4. Returns the byte length, always rounded up to a byte boundary.
pub fn write(dst: &mut [u8], counts: &[u32], table_log: u32) -> Result<usize, Error> {
    if !(MIN_TABLE_LOG..=MAX_TABLE_LOG).contains(&table_log) {
        return Err(Error::TableLogOutOfRange(table_log));
    }

    let table_size = 1i32 << table_log;
    let mut w = BitWriter::new(dst);
    w.add_bits(2, 2);
    w.add_bits(u64::from(table_log - MIN_TABLE_LOG), 4);

    let mut remaining = table_size;
    let mut threshold = table_size;
    let mut nb_bits = table_log + 1;
    let mut charnum = 0usize;
    let mut previous0 = false;

    while remaining > 0 {
        if previous0 {
            let start = charnum;
            while counts.get(charnum) == Some(&0) {
                charnum += 1;
            }
            if charnum >= counts.len() {
                return Err(Error::SumMismatch(remaining));
            }

            let mut run = charnum - start;
            while run >= 24 {
                run -= 24;
                w.add_bits(0xFFFF, 16);
                w.flush()?;
            }
            while run >= 3 {
                run -= 3;
                w.add_bits(3, 2);
            }
            w.add_bits(run as u64, 2);
            w.flush()?;
        }

        let Some(&count) = counts.get(charnum) else {
            return Err(Error::SumMismatch(remaining));
        };
        charnum += 1;

        let count = count as i32;
        let max = (2 * threshold - 1) - remaining;
        remaining -= count;
        let value = if count >= threshold { count + max } else { count };
        w.add_bits(value as u64, nb_bits - u32::from(value < max));
        previous0 = count == 0;
        while remaining < threshold {
            nb_bits -= 1;
            threshold >>= 1;
        }
        w.flush()?;
    }

    if remaining < 0 {
        return Err(Error::SumMismatch(remaining));
    }

    let (bytes, _padding) = w.close()?;
    Ok(bytes)
}

/// Parses a distribution header, returning it together with its byte length.
///
/// Bit reads past the end of `src` see zeros; the final consumption check
/// rejects any header that claimed more input than it was given.
pub fn read(src: &[u8]) -> Result<(Distribution, usize), Error> {
    let mut r = BitReader::new(src);

    if r.read(2) != 2 {
        return Err(Error::MalformedStream);
    }
    let table_log = r.read(4) + MIN_TABLE_LOG;
    if table_log > MAX_TABLE_LOG {
        return Err(Error::TableLogOutOfRange(table_log));
    }

    let mut counts = [0u32; MAX_SYMBOLS];
    let mut remaining = 1i32 << table_log;
    let mut threshold = 1i32 << table_log;
    let mut nb_bits = table_log + 1;
    let mut charnum = 0usize;
    let mut previous0 = false;

    while remaining > 0 {
        if previous0 {
            while r.peek(16) == 0xFFFF {
                r.consume(16);
                charnum += 24;
            }
            while r.peek(2) == 3 {
                r.consume(2);
                charnum += 3;
            }
            charnum += r.read(2) as usize;
        }

        if charnum >= MAX_SYMBOLS {
            return Err(Error::TooManySymbols(charnum));
        }

        let max = (2 * threshold - 1) - remaining;
        let small = (r.peek(nb_bits) as i32) & (threshold - 1);
        let count = if small < max {
            r.consume(nb_bits - 1);
            small
        } else {
            let wide = (r.peek(nb_bits) as i32) & (2 * threshold - 1);
            r.consume(nb_bits);
            if wide >= threshold { wide - max } else { wide }
        };

        remaining -= count;
        counts[charnum] = count as u32;
        charnum += 1;
        previous0 = count == 0;
        while remaining < threshold {
            nb_bits -= 1;
            threshold >>= 1;
        }
    }

    if remaining < 0 {
        return Err(Error::SumMismatch(remaining));
    }
    r.check_consumed(src.len())?;

    Ok((
        Distribution {
            counts,
            nb_symbols: charnum,
            table_log,
        },
        r.bytes_consumed(),
    ))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::normalize::{Normalization, normalize};

    fn round_trip(counts: &[u32], table_log: u32) {
        let mut buf = [0u8; 1024];
        let bytes = write(&mut buf, counts, table_log).expect("write");
        let (dist, consumed) = read(&buf[..bytes]).expect("read");

        assert_eq!(consumed, bytes);
        assert_eq!(dist.table_log, table_log);
        assert_eq!(dist.nb_symbols, counts.len());
        assert_eq!(&dist.counts[..dist.nb_symbols], counts);
    }

    #[test]
    fn test_round_trip_simple() {
        round_trip(&[16, 8, 4, 4], 5);
    }

    #[test]
    fn test_round_trip_with_zero_counts() {
        round_trip(&[30, 0, 0, 1, 0, 1], 5);
    }

    #[test]
    fn test_round_trip_long_zero_run() {
        // 60 zeros between the live symbols: two 24-runs plus 2-bit groups.
        let mut counts = vec![0u32; 62];
        counts[0] = 63;
        counts[61] = 1;
        round_trip(&counts, 6);
    }

    #[test]
    fn test_round_trip_dense_alphabet() {
        let counts = vec![1u32; 256];
        round_trip(&counts, 8);
    }

    #[test]
    fn test_header_starts_with_id_and_table_log() {
        let mut buf = [0u8; 64];
        write(&mut buf, &[16, 16], 5).expect("write");
        assert_eq!(buf[0] & 3, 2);
        assert_eq!((buf[0] >> 2) & 0xF, 0);

        write(&mut buf, &[2048, 2048], 12).expect("write");
        assert_eq!(buf[0] & 3, 2);
        assert_eq!((buf[0] >> 2) & 0xF, 7);
    }

    #[test]
    fn test_write_rejects_bad_table_log() {
        let mut buf = [0u8; 64];
        assert!(matches!(
            write(&mut buf, &[1, 1], 4),
            Err(Error::TableLogOutOfRange(4))
        ));
        assert!(matches!(
            write(&mut buf, &[1, 1], 13),
            Err(Error::TableLogOutOfRange(13))
        ));
    }

    #[test]
    fn test_write_rejects_underfilled_distribution() {
        // Sums to 24, not 32.
        let mut buf = [0u8; 64];
        assert!(matches!(
            write(&mut buf, &[16, 8], 5),
            Err(Error::SumMismatch(_))
        ));
    }

    #[test]
    fn test_write_rejects_overfilled_distribution() {
        let mut buf = [0u8; 64];
        assert!(matches!(
            write(&mut buf, &[31, 7], 5),
            Err(Error::SumMismatch(_))
        ));
    }

    #[test]
    fn test_read_rejects_wrong_header_id() {
        assert!(matches!(read(&[0x00, 0x00]), Err(Error::MalformedStream)));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        #[test]
        fn test_fuzz_round_trip_normalized(
            raw in proptest::collection::vec(0u32..10_000, 2..256),
            hint in 0u32..=MAX_TABLE_LOG,
        ) {
            let total: u32 = raw.iter().sum();
            prop_assume!(total > 0);
            prop_assume!(raw.iter().filter(|&&c| c > 0).count() > 1);
            // The writer's run scan stops at the last live symbol.
            prop_assume!(*raw.last().expect("nonempty") > 0);

            let mut counts = raw;
            let Normalization::Distribution { table_log } =
                normalize(&mut counts, total, hint).expect("normalize")
            else {
                return Ok(());
            };

            let mut buf = vec![0u8; 2 * counts.len() + 16];
            let bytes = write(&mut buf, &counts, table_log).expect("write");
            let (dist, consumed) = read(&buf[..bytes]).expect("read");

            prop_assert_eq!(consumed, bytes);
            prop_assert_eq!(dist.table_log, table_log);
            prop_assert_eq!(dist.nb_symbols, counts.len());
            prop_assert_eq!(&dist.counts[..dist.nb_symbols], counts.as_slice());
        }
    }
}
