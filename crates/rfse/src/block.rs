//! Block framing. The first byte selects the mode: 0 is a raw copy, 1 a
//! single repeated symbol, and a low-bit pattern of `0b10` starts a normal
//! FSE frame (distribution header, then descriptor-prefixed bitstream).

use crate::{
    Error, MAX_SYMBOLS, count,
    decode::{DecodingTable, decompress_using_table},
    encode::{EncodingTable, compress_using_table},
    header,
    metrics::{BlockMetrics, BlockMode, BlockObserver},
    normalize::{Normalization, normalize},
};

/// Worst-case compressed size for `src_size` input bytes. A destination this
/// large never forces the raw-mode fallback for lack of room.
pub const fn compress_bound(src_size: usize) -> usize {
    src_size + (src_size >> 7) + 65
}

/// Compresses with the default alphabet (256 symbols) and automatic table
/// log selection.
pub fn compress(dst: &mut [u8], src: &[u8]) -> Result<usize, Error> {
    compress_with(dst, src, MAX_SYMBOLS, 0)
}

/// Compresses with an explicit symbol cap and table log (0 = auto).
pub fn compress_with(
    dst: &mut [u8],
    src: &[u8],
    max_symbols: usize,
    table_log: u32,
) -> Result<usize, Error> {
    compress_observed(dst, src, max_symbols, table_log, &mut ())
}

/// [`compress_with`], reporting one [`BlockMetrics`] to `observer`.
pub fn compress_observed(
    dst: &mut [u8],
    src: &[u8],
    max_symbols: usize,
    table_log: u32,
    observer: &mut impl BlockObserver,
) -> Result<usize, Error> {
    if src.len() > u32::MAX as usize {
        return Err(Error::BlockTooLarge(src.len()));
    }
    if src.len() <= 1 {
        return write_raw(dst, src, 0.0, observer);
    }

    let mut counts = [0u32; MAX_SYMBOLS];
    let nb_symbols = count::histogram(src, &mut counts, max_symbols)?;
    if nb_symbols == 1 {
        return write_single_symbol(dst, src[0], src.len(), observer);
    }

    let entropy_bits = shannon_bits(&counts[..nb_symbols], src.len());

    let counts = &mut counts[..nb_symbols];
    let table_log = match normalize(counts, src.len() as u32, table_log)? {
        Normalization::SingleSymbol => {
            return write_single_symbol(dst, src[0], src.len(), observer);
        }
        Normalization::Distribution { table_log } => table_log,
    };

    let attempt = (|| {
        let header_bytes = header::write(dst, counts, table_log)?;
        let table = EncodingTable::new(counts, table_log)?;
        let payload_bytes = compress_using_table(&mut dst[header_bytes..], src, &table)?;
        Ok::<_, Error>((header_bytes, payload_bytes))
    })();

    match attempt {
        Ok((header_bytes, payload_bytes)) if header_bytes + payload_bytes < src.len() - 1 => {
            tracing::debug!(
                table_log,
                header_bytes,
                payload_bytes,
                src_len = src.len(),
                "fse block"
            );
            observer.record(&BlockMetrics {
                mode: BlockMode::Fse,
                uncompressed_bytes: src.len(),
                header_bytes,
                payload_bytes,
                table_log,
                entropy_bits,
            });
            Ok(header_bytes + payload_bytes)
        }
        // Not compressible enough, or the destination could not hold the
        // attempt: ship the bytes as they are.
        Ok(_) => write_raw(dst, src, entropy_bits, observer),
        Err(Error::Io(rfse_io::Error::DstTooSmall)) => write_raw(dst, src, entropy_bits, observer),
        Err(e) => Err(e),
    }
}

/// Decompresses one block into `dst` (whose length is the original size).
/// Returns the number of compressed bytes consumed. Trusts the producer's
/// framing; every slice access is still bounds-checked.
pub fn decompress(dst: &mut [u8], src: &[u8]) -> Result<usize, Error> {
    decompress_inner(dst, src)
}

/// [`decompress`] with an explicit input budget: no read crosses
/// `max_src_size`, and truncated frames report [`Error::Truncated`].
pub fn decompress_safe(dst: &mut [u8], src: &[u8], max_src_size: usize) -> Result<usize, Error> {
    let bounded = &src[..max_src_size.min(src.len())];
    decompress_inner(dst, bounded)
}

fn decompress_inner(dst: &mut [u8], src: &[u8]) -> Result<usize, Error> {
    let Some(&mode) = src.first() else {
        return Err(Error::Truncated {
            needed: 1,
            available: 0,
        });
    };

    match mode {
        0 => {
            let needed = dst.len() + 1;
            if src.len() < needed {
                return Err(Error::Truncated {
                    needed,
                    available: src.len(),
                });
            }
            dst.copy_from_slice(&src[1..needed]);
            Ok(needed)
        }
        1 => {
            let Some(&symbol) = src.get(1) else {
                return Err(Error::Truncated {
                    needed: 2,
                    available: src.len(),
                });
            };
            dst.fill(symbol);
            Ok(2)
        }
        m if m & 3 == 2 => {
            let (dist, header_bytes) = header::read(src)?;
            tracing::debug!(
                table_log = dist.table_log,
                nb_symbols = dist.nb_symbols,
                header_bytes,
                "fse block header"
            );
            let table = DecodingTable::new(&dist.counts[..dist.nb_symbols], dist.table_log)?;
            let payload_bytes = decompress_using_table(dst, &src[header_bytes..], &table)?;
            Ok(header_bytes + payload_bytes)
        }
        _ => Err(Error::MalformedStream),
    }
}

fn write_raw(
    dst: &mut [u8],
    src: &[u8],
    entropy_bits: f64,
    observer: &mut impl BlockObserver,
) -> Result<usize, Error> {
    let total = src.len() + 1;
    if dst.len() < total {
        return Err(rfse_io::Error::DstTooSmall.into());
    }

    dst[0] = 0;
    dst[1..total].copy_from_slice(src);
    observer.record(&BlockMetrics {
        mode: BlockMode::Raw,
        uncompressed_bytes: src.len(),
        header_bytes: 0,
        payload_bytes: src.len(),
        table_log: 0,
        entropy_bits,
    });
    Ok(total)
}

fn write_single_symbol(
    dst: &mut [u8],
    symbol: u8,
    src_len: usize,
    observer: &mut impl BlockObserver,
) -> Result<usize, Error> {
    if dst.len() < 2 {
        return Err(rfse_io::Error::DstTooSmall.into());
    }

    dst[0] = 1;
    dst[1] = symbol;
    observer.record(&BlockMetrics {
        mode: BlockMode::SingleSymbol,
        uncompressed_bytes: src_len,
        header_bytes: 0,
        payload_bytes: 1,
        table_log: 0,
        entropy_bits: 0.0,
    });
    Ok(2)
}

fn shannon_bits(counts: &[u32], total: usize) -> f64 {
    let total = total as f64;
    counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| f64::from(c) * (total / f64::from(c)).log2())
        .sum()
}
