use smol_str::SmolStr;

use crate::constants::NO_SYMBOL;
use crate::types::SymbolNumber;

/// Byte trie used for tokenising multi-byte symbols.
///
/// Each node holds child links and, where a symbol ends at this node, the
/// symbol number of the matched string. Lookup is longest-match with full
/// backtracking.
struct LetterTrie {
    letters: Vec<Option<Box<LetterTrie>>>,
    symbols: Vec<SymbolNumber>,
}

impl Default for LetterTrie {
    fn default() -> Self {
        LetterTrie {
            letters: (0..=u8::MAX).map(|_| None).collect(),
            symbols: vec![NO_SYMBOL; usize::from(u8::MAX) + 1],
        }
    }
}

impl LetterTrie {
    fn add_string(&mut self, bytes: &[u8], key: SymbolNumber) {
        if bytes.len() == 1 {
            self.symbols[bytes[0] as usize] = key;
            return;
        }
        self.letters[bytes[0] as usize]
            .get_or_insert_with(Default::default)
            .add_string(&bytes[1..], key);
    }

    fn has_key_starting_with(&self, byte: u8) -> bool {
        self.letters[byte as usize].is_some()
    }

    /// Advances `pos` over the longest matching symbol. On a miss the
    /// position is restored to just after the longest prefix that did match;
    /// with no match at all the result is [`NO_SYMBOL`].
    ///
    /// The end of the input acts as one consumed pseudo-byte so that each
    /// unwinding step can retreat exactly once.
    fn find_key(&self, input: &[u8], pos: &mut usize) -> SymbolNumber {
        let byte = input.get(*pos).copied();
        *pos += 1;
        let byte = match byte {
            Some(byte) => byte,
            None => return NO_SYMBOL,
        };

        match &self.letters[byte as usize] {
            None => self.symbols[byte as usize],
            Some(child) => {
                let symbol = child.find_key(input, pos);
                if symbol == NO_SYMBOL {
                    *pos -= 1;
                    self.symbols[byte as usize]
                } else {
                    symbol
                }
            }
        }
    }
}

/// Tokeniser from raw UTF-8 bytes to symbol numbers.
///
/// Combines a 256-entry ASCII fast path with a byte trie for everything
/// longer. An ASCII byte occupies its fast-path slot only while no longer
/// symbol begins with the same byte; adding such a symbol at runtime
/// unshadows the slot and lookup falls back to the trie.
pub struct Encoder {
    ascii_symbols: Vec<SymbolNumber>,
    letters: LetterTrie,
}

impl std::fmt::Debug for Encoder {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mapped = self
            .ascii_symbols
            .iter()
            .filter(|s| **s != NO_SYMBOL)
            .count();
        write!(f, "Encoder with {} ascii fast-path symbols", mapped)
    }
}

impl Encoder {
    /// Builds an encoder from the first `input_symbols` entries of a key
    /// table.
    pub fn new(key_table: &[SmolStr], input_symbols: SymbolNumber) -> Encoder {
        let mut encoder = Encoder {
            ascii_symbols: vec![NO_SYMBOL; usize::from(u8::MAX) + 1],
            letters: LetterTrie::default(),
        };

        for (key, string) in key_table.iter().enumerate().take(input_symbols as usize) {
            encoder.read_input_symbol(string, key as SymbolNumber);
        }

        encoder
    }

    /// Registers `string` as input symbol `key`.
    pub fn read_input_symbol(&mut self, string: &str, key: SymbolNumber) {
        let bytes = string.as_bytes();

        let first = match bytes.first() {
            Some(byte) => *byte,
            None => return,
        };

        if bytes.len() == 1 && first <= 127 && !self.letters.has_key_starting_with(first) {
            self.ascii_symbols[first as usize] = key;
        } else if first <= 127 && self.ascii_symbols[first as usize] != NO_SYMBOL {
            // a longer symbol now shares this first byte, unshadow the slot
            self.ascii_symbols[first as usize] = NO_SYMBOL;
        }

        self.letters.add_string(bytes, key);
    }

    /// Tokenises the next symbol at `pos`, advancing past it.
    ///
    /// Returns `None` if no symbol of the alphabet is a prefix of the
    /// remaining input; `pos` then still points at the offending byte.
    pub fn find_key(&self, input: &[u8], pos: &mut usize) -> Option<SymbolNumber> {
        let byte = *input.get(*pos)?;

        if self.ascii_symbols[byte as usize] != NO_SYMBOL {
            *pos += 1;
            return Some(self.ascii_symbols[byte as usize]);
        }

        let start = *pos;
        let symbol = self.letters.find_key(input, pos);
        if symbol == NO_SYMBOL {
            *pos = start;
            None
        } else {
            Some(symbol)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoder_for(symbols: &[&str]) -> Encoder {
        let keys: Vec<SmolStr> = symbols.iter().map(|s| SmolStr::new(s)).collect();
        Encoder::new(&keys, keys.len() as SymbolNumber)
    }

    fn tokenize(encoder: &Encoder, input: &str) -> Option<Vec<SymbolNumber>> {
        let bytes = input.as_bytes();
        let mut pos = 0;
        let mut out = vec![];
        while pos < bytes.len() {
            out.push(encoder.find_key(bytes, &mut pos)?);
        }
        Some(out)
    }

    #[test]
    fn ascii_fast_path() {
        let encoder = encoder_for(&["", "a", "b"]);
        assert_eq!(tokenize(&encoder, "aba"), Some(vec![1, 2, 1]));
    }

    #[test]
    fn longest_match_wins() {
        let encoder = encoder_for(&["", "c", "h", "ch", "a"]);
        assert_eq!(tokenize(&encoder, "cha"), Some(vec![3, 4]));
        assert_eq!(tokenize(&encoder, "cah"), Some(vec![1, 4, 2]));
    }

    #[test]
    fn multibyte_symbols() {
        let encoder = encoder_for(&["", "ä", "a", "+N"]);
        assert_eq!(tokenize(&encoder, "aä"), Some(vec![2, 1]));
        assert_eq!(tokenize(&encoder, "a+N"), Some(vec![2, 3]));
    }

    #[test]
    fn unknown_input_restores_position() {
        let encoder = encoder_for(&["", "a"]);
        let bytes = "ax".as_bytes();
        let mut pos = 0;
        assert_eq!(encoder.find_key(bytes, &mut pos), Some(1));
        assert_eq!(encoder.find_key(bytes, &mut pos), None);
        assert_eq!(pos, 1);
    }

    #[test]
    fn partial_match_backtracks_to_char_boundary() {
        let encoder = encoder_for(&["", "a", "ach"]);
        // "ac" matches a prefix of "ach" but not the whole symbol
        assert_eq!(tokenize(&encoder, "ach"), Some(vec![2]));
        let bytes = "acx".as_bytes();
        let mut pos = 0;
        assert_eq!(encoder.find_key(bytes, &mut pos), Some(1));
        assert_eq!(pos, 1);
    }

    #[test]
    fn runtime_symbols_unshadow_ascii() {
        let mut encoder = Encoder::new(
            &[SmolStr::default(), SmolStr::new("c")],
            2 as SymbolNumber,
        );
        assert_eq!(tokenize(&encoder, "cc"), Some(vec![1, 1]));

        encoder.read_input_symbol("ch", 2);
        assert_eq!(tokenize(&encoder, "chc"), Some(vec![2, 1]));
    }
}
