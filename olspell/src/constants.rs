use crate::types::{SymbolNumber, TransitionTableIndex};

/// Bytes per index table entry: input symbol + target index.
pub const INDEX_TABLE_SIZE: usize = 6;

/// Bytes per transition table entry: input, output, target, weight.
pub const TRANS_TABLE_SIZE: usize = 12;

/// Table index values at or above this refer to the transition table;
/// values below it refer to the index table.
pub const TARGET_TABLE: TransitionTableIndex = 2_147_483_648;

/// Sentinel for "no symbol" in packed tables.
pub const NO_SYMBOL: SymbolNumber = u16::MAX;

/// Sentinel for "no target" in packed tables.
pub const NO_TABLE_INDEX: TransitionTableIndex = u32::MAX;

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;

    #[test]
    fn test_INDEX_TABLE_SIZE() {
        use crate::types::*;
        use std::mem;

        let c = mem::size_of::<SymbolNumber>() + mem::size_of::<TransitionTableIndex>();

        assert!(INDEX_TABLE_SIZE == c);
    }

    #[test]
    fn test_TRANS_TABLE_SIZE() {
        use crate::types::*;
        use std::mem;

        let c = 2 * mem::size_of::<SymbolNumber>()
            + mem::size_of::<TransitionTableIndex>()
            + mem::size_of::<Weight>();

        assert!(TRANS_TABLE_SIZE == c);
    }
}
