use crate::{Error, MAX_TABLE_LOG, MIN_TABLE_LOG};

const VIRTUAL_LOG: u32 = 30;
const VIRTUAL_RANGE: u32 = 1 << VIRTUAL_LOG;

/// Outcome of scaling a histogram down to a power-of-two total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalization {
    /// The counts now sum to exactly `1 << table_log`.
    Distribution { table_log: u32 },
    /// One symbol owns the entire mass; the caller should emit a
    /// single-symbol frame instead of a table.
    SingleSymbol,
}

/// Rescales `counts` in place so they sum to `1 << table_log`, preserving a
/// weight of at least 1 for every symbol that occurred.
///
/// `table_log_hint` of 0 means auto: start from [`MAX_TABLE_LOG`], then give
/// up precision the source cannot use and take precision the alphabet needs.
pub fn normalize(
    counts: &mut [u32],
    total: u32,
    table_log_hint: u32,
) -> Result<Normalization, Error> {
    if total == 0 {
        return Err(Error::EmptyInput);
    }

    let nb_symbols = counts.len();
    let mut table_log = if table_log_hint == 0 {
        MAX_TABLE_LOG
    } else {
        table_log_hint
    };

    // No point being more precise than the source is long.
    let src_log = if total <= 1 { 1 } else { (total - 1).ilog2() + 1 };
    if src_log < table_log {
        table_log = src_log;
    }
    // Every symbol value must remain representable.
    let min_log = if nb_symbols <= 1 {
        1
    } else {
        (nb_symbols as u32 - 1).ilog2() + 1
    };
    if min_log > table_log {
        table_log = min_log;
    }
    if table_log < MIN_TABLE_LOG {
        table_log = MIN_TABLE_LOG;
    }
    if table_log > MAX_TABLE_LOG {
        return Err(Error::TableLogOutOfRange(table_log));
    }

    // Pre-shift huge totals so the virtual-range products stay within 32 bits.
    let mut v_total = total;
    let max_log = VIRTUAL_LOG - table_log;
    if src_log > max_log {
        let shift = src_log - max_log;
        let base = (1u32 << shift) - 1;
        v_total = 0;
        for c in counts.iter_mut() {
            *c = c.wrapping_add(base) >> shift;
            v_total += *c;
        }
    }

    // When the source outnumbers the table, bias every live count so none of
    // them rounds down to zero. `min_base` is the fixed point of
    // x <- (x * nb_symbols) >> table_log, seeded from the total.
    if u64::from(total) > 1 << table_log {
        let nb = nb_symbols as u32;
        let mut min_base = total;
        let mut add = min_base.wrapping_mul(nb) >> table_log;
        loop {
            min_base = min_base.wrapping_add(add);
            let next = add.wrapping_mul(nb) >> table_log;
            if next == 0 || next == add {
                // `next == add` only when the alphabet fills the table
                // exactly; the series stalls and the bias saturates here.
                break;
            }
            add = next;
        }
        min_base >>= table_log;

        for c in counts.iter_mut() {
            if *c > 0 {
                *c += min_base;
                v_total = v_total.wrapping_add(min_base);
            }
        }
    }

    if v_total == 0 {
        return Err(Error::SumMismatch(0));
    }

    let scale = VIRTUAL_LOG - table_log;
    let v_step = 1u32 << scale;
    let step = VIRTUAL_RANGE / v_total;
    let error = VIRTUAL_RANGE - step * v_total;
    let mut cumulative_rest = (v_step + error) >> 1;
    if error > v_step {
        // The total is too large for this precision; the surplus goes to the
        // first live symbol.
        cumulative_rest = error;
    }

    for c in counts.iter_mut() {
        if *c == v_total {
            return Ok(Normalization::SingleSymbol);
        }
        if *c > 0 {
            let scaled = c.wrapping_mul(step);
            let mut size = scaled >> scale;
            cumulative_rest += scaled - (size << scale);
            size += cumulative_rest >> scale;
            cumulative_rest &= v_step - 1;
            *c = size;
        }
    }

    Ok(Normalization::Distribution { table_log })
}
