use crate::{Error, MAX_SYMBOLS};

/// Fills `counts` with per-symbol frequencies and returns the used alphabet
/// size, i.e. the smallest `n` such that `counts[n - 1] > 0`.
///
/// Four independent lanes walk interleaved input positions so consecutive
/// increments never hit the same counter slot, then the lanes are summed.
pub fn histogram(
    src: &[u8],
    counts: &mut [u32; MAX_SYMBOLS],
    max_symbols: usize,
) -> Result<usize, Error> {
    if src.is_empty() {
        return Err(Error::EmptyInput);
    }
    if max_symbols == 0 || max_symbols > MAX_SYMBOLS {
        return Err(Error::TooManySymbols(max_symbols));
    }

    let mut lane1 = [0u32; MAX_SYMBOLS];
    let mut lane2 = [0u32; MAX_SYMBOLS];
    let mut lane3 = [0u32; MAX_SYMBOLS];
    let mut lane4 = [0u32; MAX_SYMBOLS];

    let mut chunks = src.chunks_exact(4);
    for chunk in &mut chunks {
        lane1[chunk[0] as usize] += 1;
        lane2[chunk[1] as usize] += 1;
        lane3[chunk[2] as usize] += 1;
        lane4[chunk[3] as usize] += 1;
    }
    for &b in chunks.remainder() {
        lane1[b as usize] += 1;
    }

    for (s, slot) in counts.iter_mut().enumerate() {
        *slot = lane1[s] + lane2[s] + lane3[s] + lane4[s];
    }

    // The C original silently dropped counts at or above the cap and produced
    // a stream the decoder could not invert; reject them instead.
    if let Some(bad) = (max_symbols..MAX_SYMBOLS).find(|&s| counts[s] != 0) {
        return Err(Error::BadSymbol {
            symbol: bad as u8,
            cap: max_symbols,
        });
    }

    let mut nb_symbols = max_symbols;
    while counts[nb_symbols - 1] == 0 {
        nb_symbols -= 1;
    }
    Ok(nb_symbols)
}
