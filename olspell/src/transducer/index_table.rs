use byteorder::{ByteOrder, LittleEndian};
use std::fmt;

use crate::constants::{INDEX_TABLE_SIZE, NO_SYMBOL, NO_TABLE_INDEX};
use crate::types::{SymbolNumber, TransitionTableIndex, Weight};

/// The packed index table of a transducer.
///
/// One entry per cell: a `u16` input symbol and a `u32` first transition
/// index. The table owns its bytes; all reads decode little-endian fields,
/// which is the on-disk order on every host.
pub struct IndexTable {
    size: TransitionTableIndex,
    buf: Vec<u8>,
}

impl fmt::Debug for IndexTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Index table size: {}", self.size)
    }
}

impl IndexTable {
    pub(crate) fn new(buf: Vec<u8>, size: TransitionTableIndex) -> IndexTable {
        IndexTable { size, buf }
    }

    /// Number of entries.
    pub fn size(&self) -> TransitionTableIndex {
        self.size
    }

    /// Input symbol of cell `i`, or `None` for the no-symbol marker.
    #[inline(always)]
    pub fn input_symbol(&self, i: TransitionTableIndex) -> Option<SymbolNumber> {
        if i >= self.size {
            return None;
        }

        let index = INDEX_TABLE_SIZE * i as usize;
        let input_symbol = LittleEndian::read_u16(&self.buf[index..]);

        if input_symbol == NO_SYMBOL {
            None
        } else {
            Some(input_symbol)
        }
    }

    /// Target of cell `i`, or `None` for the no-target marker.
    #[inline(always)]
    pub fn target(&self, i: TransitionTableIndex) -> Option<TransitionTableIndex> {
        if i >= self.size {
            return None;
        }

        let index = INDEX_TABLE_SIZE * i as usize + 2;
        let target = LittleEndian::read_u32(&self.buf[index..]);

        if target == NO_TABLE_INDEX {
            None
        } else {
            Some(target)
        }
    }

    /// Final weight stored in cell `i`.
    ///
    /// The file format overloads the target slot: on a final index cell the
    /// same four bytes hold an `f32` weight instead of a table index.
    #[inline(always)]
    pub fn final_weight(&self, i: TransitionTableIndex) -> Option<Weight> {
        if i >= self.size {
            return None;
        }

        let index = INDEX_TABLE_SIZE * i as usize + 2;
        Some(LittleEndian::read_f32(&self.buf[index..]))
    }

    /// Whether cell `i` marks a final state.
    #[inline(always)]
    pub fn is_final(&self, i: TransitionTableIndex) -> bool {
        self.input_symbol(i).is_none() && self.target(i).is_some()
    }
}
