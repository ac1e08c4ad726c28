//! Optimized-lookup transducer parsing and traversal.

pub mod alphabet;
pub mod encoder;
pub mod header;
pub mod index_table;
pub mod symbol_transition;
pub mod transition_table;
pub mod tree_node;

use std::fmt;

use self::alphabet::{TransducerAlphabet, TransducerAlphabetParser};
use self::encoder::Encoder;
use self::header::TransducerHeader;
use self::index_table::IndexTable;
use self::symbol_transition::SymbolTransition;
use self::transition_table::TransitionTable;
use crate::constants::{INDEX_TABLE_SIZE, TARGET_TABLE, TRANS_TABLE_SIZE};
use crate::types::{HeaderFlag, SymbolNumber, TransitionTableIndex, Weight};

/// Failure to load a transducer from its binary representation.
#[derive(Debug, thiserror::Error)]
pub enum TransducerError {
    /// The header was truncated or names a non-optimized-lookup type.
    #[error("Malformed transducer header: {0}")]
    HeaderParsing(String),

    /// The alphabet section ended early or contains a malformed flag
    /// diacritic.
    #[error("Malformed transducer alphabet: {0}")]
    AlphabetParsing(String),

    /// One of the bulk tables could not be read in full.
    #[error("Transducer table truncated: {0}")]
    TableRead(String),

    /// A mutator symbol could not be translated into the lexicon.
    ///
    /// Not raised under the current policy: the lexicon alphabet is
    /// extended with the missing symbol instead.
    #[error("Untranslatable symbol: {0}")]
    AlphabetTranslation(String),
}

/// A weighted optimized-lookup transducer.
///
/// Owns its packed tables. Read-only after load, except that the alphabet
/// and encoder accept runtime-registered symbols for input characters the
/// file's alphabet cannot tokenise.
pub struct Transducer {
    header: TransducerHeader,
    alphabet: TransducerAlphabet,
    encoder: Encoder,
    index_table: IndexTable,
    transition_table: TransitionTable,
}

impl fmt::Debug for Transducer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{:?}", self.header)?;
        writeln!(f, "{:?}", self.alphabet)?;
        writeln!(f, "{:?}", self.index_table)?;
        writeln!(f, "{:?}", self.transition_table)?;
        Ok(())
    }
}

impl Transducer {
    /// Parses a transducer from its binary representation, with or without
    /// the HFST3 wrapper.
    pub fn load(buf: &[u8]) -> Result<Transducer, TransducerError> {
        let header = TransducerHeader::read(buf)?;
        let alphabet_offset = header.len();
        let alphabet =
            TransducerAlphabetParser::parse(&buf[alphabet_offset..], header.symbol_count())?;

        let index_table_offset = alphabet_offset + alphabet.len();
        let index_table_len = INDEX_TABLE_SIZE * header.index_table_size();
        let index_table_end = index_table_offset + index_table_len;
        if buf.len() < index_table_end {
            return Err(TransducerError::TableRead(
                "index table ended unexpectedly".to_owned(),
            ));
        }

        let transition_table_len = TRANS_TABLE_SIZE * header.target_table_size();
        let transition_table_end = index_table_end + transition_table_len;
        if buf.len() < transition_table_end {
            return Err(TransducerError::TableRead(
                "transition table ended unexpectedly".to_owned(),
            ));
        }

        let index_table = IndexTable::new(
            buf[index_table_offset..index_table_end].to_vec(),
            header.index_table_size() as TransitionTableIndex,
        );
        let transition_table = TransitionTable::new(
            buf[index_table_end..transition_table_end].to_vec(),
            header.target_table_size() as TransitionTableIndex,
        );
        let encoder = Encoder::new(alphabet.key_table(), header.input_symbol_count());

        Ok(Transducer {
            header,
            alphabet,
            encoder,
            index_table,
            transition_table,
        })
    }

    /// The header read from the file.
    pub fn header(&self) -> &TransducerHeader {
        &self.header
    }

    /// Whether transitions carry weights.
    pub fn is_weighted(&self) -> bool {
        self.header.has_flag(HeaderFlag::Weighted)
    }

    /// The symbol table.
    #[inline(always)]
    pub fn alphabet(&self) -> &TransducerAlphabet {
        &self.alphabet
    }

    /// The symbol table, for runtime symbol registration.
    #[inline(always)]
    pub fn mut_alphabet(&mut self) -> &mut TransducerAlphabet {
        &mut self.alphabet
    }

    /// The input tokeniser.
    #[inline(always)]
    pub fn encoder(&self) -> &Encoder {
        &self.encoder
    }

    /// The input tokeniser, for runtime symbol registration.
    #[inline(always)]
    pub fn mut_encoder(&mut self) -> &mut Encoder {
        &mut self.encoder
    }

    /// Whether state `i` is final.
    #[inline(always)]
    pub fn is_final(&self, i: TransitionTableIndex) -> bool {
        if i >= TARGET_TABLE {
            self.transition_table.is_final(i - TARGET_TABLE)
        } else {
            self.index_table.is_final(i)
        }
    }

    /// Final weight of state `i`; meaningful only when
    /// [`is_final`](Self::is_final) holds.
    #[inline(always)]
    pub fn final_weight(&self, i: TransitionTableIndex) -> Option<Weight> {
        if i >= TARGET_TABLE {
            self.transition_table.weight(i - TARGET_TABLE)
        } else {
            self.index_table.final_weight(i)
        }
    }

    /// Whether the cell for `symbol` at `i` really holds `symbol`.
    ///
    /// Callers position `i` one past the state base, per the table layout.
    #[inline(always)]
    pub fn has_transitions(&self, i: TransitionTableIndex, symbol: Option<SymbolNumber>) -> bool {
        let symbol = match symbol {
            Some(symbol) => symbol,
            None => return false,
        };

        if i >= TARGET_TABLE {
            self.transition_table.input_symbol(i - TARGET_TABLE) == Some(symbol)
        } else {
            self.index_table.input_symbol(i + u32::from(symbol)) == Some(symbol)
        }
    }

    /// Whether an epsilon- or flag-input transition leaves state `i`.
    #[inline(always)]
    pub fn has_epsilons_or_flags(&self, i: TransitionTableIndex) -> bool {
        if i >= TARGET_TABLE {
            match self.transition_table.input_symbol(i - TARGET_TABLE) {
                Some(symbol) => symbol == 0 || self.alphabet.is_flag(symbol),
                None => false,
            }
        } else {
            self.index_table.input_symbol(i) == Some(0)
        }
    }

    /// First transition row for `symbol` out of state `i`.
    ///
    /// The `+ 1` bias past the state base is part of the file format.
    #[inline(always)]
    pub fn next(
        &self,
        i: TransitionTableIndex,
        symbol: SymbolNumber,
    ) -> Option<TransitionTableIndex> {
        if i >= TARGET_TABLE {
            Some(i - TARGET_TABLE + 1)
        } else {
            self.index_table
                .target(i + 1 + u32::from(symbol))
                .map(|target| target - TARGET_TABLE)
        }
    }

    /// The transition at row `i` if its input is epsilon.
    #[inline(always)]
    pub fn take_epsilons(&self, i: TransitionTableIndex) -> Option<SymbolTransition> {
        if self.transition_table.input_symbol(i) != Some(0) {
            return None;
        }
        Some(self.transition_table.symbol_transition(i))
    }

    /// The transition at row `i` if its input is epsilon or a flag
    /// diacritic.
    #[inline(always)]
    pub fn take_epsilons_and_flags(&self, i: TransitionTableIndex) -> Option<SymbolTransition> {
        match self.transition_table.input_symbol(i) {
            Some(symbol) if symbol == 0 || self.alphabet.is_flag(symbol) => {
                Some(self.transition_table.symbol_transition(i))
            }
            _ => None,
        }
    }

    /// The transition at row `i` if its input is `symbol`.
    #[inline(always)]
    pub fn take_non_epsilons(
        &self,
        i: TransitionTableIndex,
        symbol: SymbolNumber,
    ) -> Option<SymbolTransition> {
        if self.transition_table.input_symbol(i) != Some(symbol) {
            return None;
        }
        Some(self.transition_table.symbol_transition(i))
    }

    /// Input symbol of transition row `i`.
    #[inline(always)]
    pub fn transition_input_symbol(&self, i: TransitionTableIndex) -> Option<SymbolNumber> {
        self.transition_table.input_symbol(i)
    }
}
