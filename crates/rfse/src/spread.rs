use crate::{Error, MAX_SYMBOLS};

/// Lays every symbol out over the state table, `counts[s]` slots each.
///
/// The walk advances by a fixed odd step, so it is coprime with the
/// power-of-two table size and visits every slot exactly once; it must land
/// back on slot 0, otherwise the counts do not sum to the table size. Encoder
/// and decoder build their tables from this same layout — it is part of the
/// wire format.
pub fn spread_symbols(counts: &[u32], table_log: u32) -> Result<Vec<u8>, Error> {
    debug_assert!(counts.len() <= MAX_SYMBOLS);

    let table_size = 1usize << table_log;
    let step = (table_size >> 1) + (table_size >> 3) + 3;
    let mask = table_size - 1;

    let mut table = vec![0u8; table_size];
    let mut position = 0usize;
    for (symbol, &count) in counts.iter().enumerate() {
        for _ in 0..count {
            table[position] = symbol as u8;
            position = (position + step) & mask;
        }
    }

    if position != 0 {
        return Err(Error::SpreadMisalignment(position));
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::normalize::{Normalization, normalize};

    #[test]
    fn test_each_symbol_appears_count_times() {
        let counts = [16u32, 8, 4, 4];
        let table = spread_symbols(&counts, 5).expect("spread");

        assert_eq!(table.len(), 32);
        for (s, &c) in counts.iter().enumerate() {
            let seen = table.iter().filter(|&&x| x == s as u8).count();
            assert_eq!(seen, c as usize, "symbol {s}");
        }
    }

    #[test]
    fn test_rejects_underfilled_counts() {
        assert!(matches!(
            spread_symbols(&[16, 8], 5),
            Err(Error::SpreadMisalignment(_))
        ));
    }

    #[test]
    fn test_rejects_overfilled_counts() {
        assert!(matches!(
            spread_symbols(&[31, 7], 5),
            Err(Error::SpreadMisalignment(_))
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        #[test]
        fn test_fuzz_spread_is_a_permutation(
            raw in proptest::collection::vec(0u32..10_000, 2..256),
            hint in 0u32..=crate::MAX_TABLE_LOG,
        ) {
            let total: u32 = raw.iter().sum();
            prop_assume!(total > 0);
            prop_assume!(raw.iter().filter(|&&c| c > 0).count() > 1);

            let mut counts = raw;
            let Normalization::Distribution { table_log } =
                normalize(&mut counts, total, hint).expect("normalize")
            else {
                return Ok(());
            };

            let table = spread_symbols(&counts, table_log).expect("spread");
            let mut seen = vec![0u32; counts.len()];
            for &s in &table {
                seen[s as usize] += 1;
            }
            prop_assert_eq!(seen, counts);
        }
    }
}
