use rfse_foundation::const_assert;
use rfse_io::ReverseBitReader;

use crate::{
    Error, MAX_SYMBOLS, MAX_TABLE_LOG, descriptor::StreamDescriptor, spread::spread_symbols,
};

/// One decoding step: the symbol this state emits, how many payload bits
/// rebuild the next state, and the base those bits are added to.
#[derive(Debug, Clone, Copy, Default)]
struct Entry {
    new_state: u16,
    symbol: u8,
    nb_bits: u8,
}

const_assert!(std::mem::size_of::<Entry>() == 4);

/// Decoder table: the dual of [`EncodingTable`](crate::EncodingTable), built
/// from the same normalized counts through the same spread.
#[derive(Debug)]
pub struct DecodingTable {
    table_log: u32,
    entries: Vec<Entry>,
}

impl DecodingTable {
    pub fn new(counts: &[u32], table_log: u32) -> Result<Self, Error> {
        if counts.len() > MAX_SYMBOLS {
            return Err(Error::TooManySymbols(counts.len()));
        }
        if table_log > MAX_TABLE_LOG {
            return Err(Error::TableLogOutOfRange(table_log));
        }

        let table_size = 1u32 << table_log;
        let spread = spread_symbols(counts, table_log)?;

        let mut symbol_next = counts.to_vec();
        let mut entries = vec![Entry::default(); table_size as usize];
        for (entry, &symbol) in entries.iter_mut().zip(spread.iter()) {
            let counter = symbol_next[symbol as usize];
            symbol_next[symbol as usize] += 1;

            let nb_bits = table_log - counter.ilog2();
            *entry = Entry {
                symbol,
                nb_bits: nb_bits as u8,
                new_state: ((counter << nb_bits) - table_size) as u16,
            };
        }

        Ok(Self { table_log, entries })
    }

    #[inline(always)]
    pub const fn table_log(&self) -> u32 {
        self.table_log
    }
}

/// One live ANS state walking a [`DecodingTable`].
///
/// Reload cadence is the caller's contract: at most two decodes fit in the
/// 32-bit window between [`ReverseBitReader::reload`] calls at the maximum
/// table log.
#[derive(Debug)]
pub struct Decoder<'t> {
    table: &'t DecodingTable,
    state: usize,
}

impl<'t> Decoder<'t> {
    /// Rebuilds the state the encoder flushed at close.
    pub fn new(table: &'t DecodingTable, r: &mut ReverseBitReader<'_>) -> Self {
        let state = r.read_bits(table.table_log) as usize;
        Self { table, state }
    }

    #[inline(always)]
    pub fn decode(&mut self, r: &mut ReverseBitReader<'_>) -> u8 {
        let entry = self.table.entries[self.state];
        self.state = usize::from(entry.new_state) + r.read_bits(u32::from(entry.nb_bits)) as usize;
        entry.symbol
    }

    /// The final state's low byte is the stream's last symbol ("cheap
    /// last-symbol storage").
    #[inline(always)]
    pub const fn last_symbol(&self) -> u8 {
        self.state as u8
    }
}

/// Decompresses a descriptor-prefixed bitstream, filling `dst` completely.
/// Returns the stream's byte length (descriptor included).
pub fn decompress_using_table(
    dst: &mut [u8],
    src: &[u8],
    table: &DecodingTable,
) -> Result<usize, Error> {
    let desc = StreamDescriptor::read(src)?;
    if desc.byte_len > src.len() {
        return Err(Error::Truncated {
            needed: desc.byte_len,
            available: src.len(),
        });
    }
    if desc.byte_len < StreamDescriptor::SIZE + 1 {
        return Err(Error::MalformedStream);
    }

    let block = &src[..desc.byte_len];
    let mut r = ReverseBitReader::new(block, desc.byte_len, desc.padding_bits)?;

    match desc.nb_states {
        1 => decode_streams::<1>(dst, &mut r, table)?,
        2 => decode_streams::<2>(dst, &mut r, table)?,
        n => return Err(Error::UnsupportedStateCount(n)),
    }

    Ok(desc.byte_len)
}

fn decode_streams<const NB_STATES: usize>(
    dst: &mut [u8],
    r: &mut ReverseBitReader<'_>,
    table: &DecodingTable,
) -> Result<(), Error> {
    if dst.len() < NB_STATES {
        return Err(Error::MalformedStream);
    }

    // States come off the stream in declaration order.
    let mut state1 = Decoder::new(table, r);
    r.reload()?;
    let mut state2 = if NB_STATES == 2 {
        let state = Decoder::new(table, r);
        r.reload()?;
        state
    } else {
        Decoder { table, state: 0 }
    };

    let trailing = dst.len() - NB_STATES;
    let paired = trailing - trailing % NB_STATES;

    let mut op = 0usize;
    while op < paired {
        if NB_STATES == 2 {
            dst[op] = state2.decode(r);
            op += 1;
        }
        dst[op] = state1.decode(r);
        op += 1;
        r.reload()?;
    }

    // Leftover symbols the encoder warmed up on state 1.
    while op < trailing {
        dst[op] = state1.decode(r);
        op += 1;
        r.reload()?;
    }

    if NB_STATES == 2 {
        dst[op] = state2.last_symbol();
        op += 1;
    }
    dst[op] = state1.last_symbol();

    if !r.fully_consumed() {
        return Err(Error::MalformedStream);
    }
    Ok(())
}
