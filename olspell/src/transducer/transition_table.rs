use byteorder::{ByteOrder, LittleEndian};
use std::fmt;

use crate::constants::{NO_SYMBOL, NO_TABLE_INDEX, TRANS_TABLE_SIZE};
use crate::transducer::symbol_transition::SymbolTransition;
use crate::types::{SymbolNumber, TransitionTableIndex, Weight};

/// The packed transition table of a transducer.
///
/// One entry per transition: `u16` input, `u16` output, `u32` target and
/// `f32` weight, all little-endian on disk and decoded as such.
pub struct TransitionTable {
    size: TransitionTableIndex,
    buf: Vec<u8>,
}

impl fmt::Debug for TransitionTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Transition table size: {}", self.size)
    }
}

impl TransitionTable {
    pub(crate) fn new(buf: Vec<u8>, size: TransitionTableIndex) -> TransitionTable {
        TransitionTable { size, buf }
    }

    /// Number of entries.
    pub fn size(&self) -> TransitionTableIndex {
        self.size
    }

    #[inline(always)]
    fn read_symbol(&self, index: usize) -> Option<SymbolNumber> {
        let x = LittleEndian::read_u16(&self.buf[index..]);
        if x == NO_SYMBOL {
            None
        } else {
            Some(x)
        }
    }

    /// Input symbol of transition `i`.
    #[inline(always)]
    pub fn input_symbol(&self, i: TransitionTableIndex) -> Option<SymbolNumber> {
        if i >= self.size {
            return None;
        }

        self.read_symbol(TRANS_TABLE_SIZE * i as usize)
    }

    /// Output symbol of transition `i`.
    #[inline(always)]
    pub fn output_symbol(&self, i: TransitionTableIndex) -> Option<SymbolNumber> {
        if i >= self.size {
            return None;
        }

        self.read_symbol(TRANS_TABLE_SIZE * i as usize + 2)
    }

    /// Target state of transition `i`.
    #[inline(always)]
    pub fn target(&self, i: TransitionTableIndex) -> Option<TransitionTableIndex> {
        if i >= self.size {
            return None;
        }

        let x = LittleEndian::read_u32(&self.buf[TRANS_TABLE_SIZE * i as usize + 4..]);
        if x == NO_TABLE_INDEX {
            None
        } else {
            Some(x)
        }
    }

    /// Weight of transition `i`.
    #[inline(always)]
    pub fn weight(&self, i: TransitionTableIndex) -> Option<Weight> {
        if i >= self.size {
            return None;
        }

        Some(LittleEndian::read_f32(
            &self.buf[TRANS_TABLE_SIZE * i as usize + 8..],
        ))
    }

    /// Whether entry `i` marks a final state.
    #[inline(always)]
    pub fn is_final(&self, i: TransitionTableIndex) -> bool {
        self.input_symbol(i).is_none()
            && self.output_symbol(i).is_none()
            && self.target(i) == Some(1)
    }

    /// The (target, output, weight) triple of transition `i`.
    #[inline(always)]
    pub fn symbol_transition(&self, i: TransitionTableIndex) -> SymbolTransition {
        SymbolTransition::new(self.target(i), self.output_symbol(i), self.weight(i))
    }
}
