use hashbrown::HashMap;
use smol_str::SmolStr;

use super::TransducerError;
use crate::types::{
    FlagDiacriticOperation, FlagDiacriticOperator, OperationsMap, SymbolNumber, ValueNumber,
};

/// Symbol table of a transducer.
///
/// Immutable after load apart from [`add_symbol`](Self::add_symbol), which
/// registers symbols encountered at runtime. Symbols added that way are not
/// part of the original alphabet: [`initial_symbol_count`](Self::initial_symbol_count)
/// records the boundary, above which the unknown/identity fallback applies.
#[derive(Debug)]
pub struct TransducerAlphabet {
    pub(crate) key_table: Vec<SmolStr>,
    pub(crate) initial_symbol_count: SymbolNumber,
    pub(crate) flag_state_size: SymbolNumber,
    pub(crate) length: usize,
    pub(crate) string_to_symbol: HashMap<SmolStr, SymbolNumber>,
    pub(crate) operations: OperationsMap,
    pub(crate) identity_symbol: Option<SymbolNumber>,
    pub(crate) unknown_symbol: Option<SymbolNumber>,
}

impl TransducerAlphabet {
    /// Printable strings for each symbol. Entry 0 is the empty string.
    pub fn key_table(&self) -> &Vec<SmolStr> {
        &self.key_table
    }

    /// Number of distinct flag diacritic features.
    pub fn state_size(&self) -> SymbolNumber {
        self.flag_state_size
    }

    /// Flag diacritic operations keyed by symbol.
    pub fn operations(&self) -> &OperationsMap {
        &self.operations
    }

    /// Reverse mapping from printable strings to symbols.
    pub fn string_to_symbol(&self) -> &HashMap<SmolStr, SymbolNumber> {
        &self.string_to_symbol
    }

    /// Whether `symbol` is a flag diacritic.
    pub fn is_flag(&self, symbol: SymbolNumber) -> bool {
        self.operations.contains_key(&symbol)
    }

    /// Whether `string` has a symbol in this alphabet.
    pub fn has_string(&self, string: &str) -> bool {
        self.string_to_symbol.contains_key(string)
    }

    /// Registers a new symbol at runtime, assigning it the next free number.
    pub fn add_symbol(&mut self, string: &str) {
        self.string_to_symbol
            .insert(string.into(), self.key_table.len() as SymbolNumber);
        self.key_table.push(string.into());
    }

    /// The `@_IDENTITY_SYMBOL_@` if the alphabet has one.
    pub fn identity(&self) -> Option<SymbolNumber> {
        self.identity_symbol
    }

    /// The `@_UNKNOWN_SYMBOL_@` if the alphabet has one.
    pub fn unknown(&self) -> Option<SymbolNumber> {
        self.unknown_symbol
    }

    /// Number of symbols present in the transducer file itself.
    pub fn initial_symbol_count(&self) -> SymbolNumber {
        self.initial_symbol_count
    }

    /// Bytes the alphabet section occupied in the transducer file.
    pub fn len(&self) -> usize {
        self.length
    }

    /// Whether the alphabet section was empty.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Concatenates the printable forms of `symbols`.
    pub fn string_from_symbols(&self, symbols: &[SymbolNumber]) -> SmolStr {
        symbols
            .iter()
            .filter(|s| (**s as usize) < self.key_table.len())
            .map(|s| self.key_table[*s as usize].as_str())
            .collect()
    }

    /// The printable forms of `symbols`, kept separate.
    pub fn strings_from_symbols(&self, symbols: &[SymbolNumber]) -> Vec<SmolStr> {
        symbols
            .iter()
            .filter(|s| (**s as usize) < self.key_table.len())
            .map(|s| self.key_table[*s as usize].clone())
            .collect()
    }
}

/// Parser for the NUL-terminated string section of a transducer file.
pub struct TransducerAlphabetParser {
    key_table: Vec<SmolStr>,
    string_to_symbol: HashMap<SmolStr, SymbolNumber>,
    operations: OperationsMap,
    feature_bucket: HashMap<SmolStr, SymbolNumber>,
    value_bucket: HashMap<SmolStr, ValueNumber>,
    val_n: ValueNumber,
    feat_n: SymbolNumber,
    identity_symbol: Option<SymbolNumber>,
    unknown_symbol: Option<SymbolNumber>,
    offset: usize,
}

fn alphabet_error(msg: &str) -> TransducerError {
    TransducerError::AlphabetParsing(msg.to_owned())
}

impl TransducerAlphabetParser {
    fn new() -> TransducerAlphabetParser {
        let mut value_bucket = HashMap::new();
        // the empty value is neutral and maps to zero
        value_bucket.insert(SmolStr::default(), 0);

        TransducerAlphabetParser {
            key_table: Vec::with_capacity(64),
            string_to_symbol: HashMap::new(),
            operations: HashMap::new(),
            feature_bucket: HashMap::new(),
            value_bucket,
            val_n: 1,
            feat_n: 0,
            identity_symbol: None,
            unknown_symbol: None,
            offset: 0,
        }
    }

    fn next_string<'a>(&mut self, buf: &'a [u8]) -> Result<&'a str, TransducerError> {
        let rest = &buf[self.offset.min(buf.len())..];
        let end = rest
            .iter()
            .position(|b| *b == 0)
            .ok_or_else(|| alphabet_error("alphabet ended unexpectedly"))?;
        self.offset += end + 1;
        std::str::from_utf8(&rest[..end])
            .map_err(|_| alphabet_error("symbol is not valid UTF-8"))
    }

    fn handle_flag_diacritic(&mut self, i: SymbolNumber, key: &str) -> Result<(), TransducerError> {
        use std::str::FromStr;

        let mut chunks = key.split('.');
        let op_chunk = chunks.next().unwrap_or("");
        let operation = FlagDiacriticOperator::from_str(&op_chunk[1..])
            .map_err(|_| alphabet_error(&format!("unrecognized flag diacritic: {}", key)))?;
        let feature: SmolStr = chunks
            .next()
            .unwrap_or("")
            .chars()
            .filter(|c| c != &'@')
            .collect();
        let value: SmolStr = chunks
            .next()
            .unwrap_or("")
            .chars()
            .filter(|c| c != &'@')
            .collect();

        if !self.feature_bucket.contains_key(&feature) {
            self.feature_bucket.insert(feature.clone(), self.feat_n);
            self.feat_n += 1;
        }
        if !self.value_bucket.contains_key(&value) {
            self.value_bucket.insert(value.clone(), self.val_n);
            self.val_n += 1;
        }

        self.operations.insert(
            i,
            FlagDiacriticOperation {
                operation,
                feature: self.feature_bucket[&feature],
                value: self.value_bucket[&value],
            },
        );
        self.key_table.push(SmolStr::default());
        Ok(())
    }

    fn parse_inner(&mut self, buf: &[u8], symbols: SymbolNumber) -> Result<(), TransducerError> {
        // symbol 0 is always epsilon; whatever string the file carries for
        // it is discarded
        self.key_table.push(SmolStr::default());
        self.next_string(buf)?;

        for i in 1..symbols {
            let key = self.next_string(buf)?;

            if key.len() > 1 && key.starts_with('@') && key.ends_with('@') {
                if key.len() >= 5 && key.as_bytes()[2] == b'.' {
                    self.handle_flag_diacritic(i, key)?;
                } else if key == "@_UNKNOWN_SYMBOL_@" {
                    self.unknown_symbol = Some(i);
                    self.key_table.push(SmolStr::default());
                } else if key == "@_IDENTITY_SYMBOL_@" {
                    self.identity_symbol = Some(i);
                    self.key_table.push(SmolStr::default());
                } else {
                    // an unrecognized special symbol, suppress its output
                    self.key_table.push(SmolStr::default());
                }
            } else {
                let key = SmolStr::new(key);
                self.key_table.push(key.clone());
                self.string_to_symbol.insert(key, i);
            }
        }

        Ok(())
    }

    /// Parses `symbols` NUL-terminated strings from the start of `buf`.
    pub fn parse(
        buf: &[u8],
        symbols: SymbolNumber,
    ) -> Result<TransducerAlphabet, TransducerError> {
        let mut p = TransducerAlphabetParser::new();
        p.parse_inner(buf, symbols)?;

        Ok(TransducerAlphabet {
            key_table: p.key_table,
            initial_symbol_count: symbols,
            flag_state_size: p.feature_bucket.len() as SymbolNumber,
            length: p.offset,
            string_to_symbol: p.string_to_symbol,
            operations: p.operations,
            identity_symbol: p.identity_symbol,
            unknown_symbol: p.unknown_symbol,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alphabet_bytes(symbols: &[&str]) -> Vec<u8> {
        let mut buf = vec![];
        for sym in symbols {
            buf.extend_from_slice(sym.as_bytes());
            buf.push(0);
        }
        buf
    }

    #[test]
    fn plain_symbols() {
        let buf = alphabet_bytes(&["@_EPSILON_SYMBOL_@", "a", "b", "ch"]);
        let alphabet = TransducerAlphabetParser::parse(&buf, 4).unwrap();

        assert_eq!(alphabet.key_table()[0], "");
        assert_eq!(alphabet.key_table()[3], "ch");
        assert_eq!(alphabet.string_to_symbol()["a"], 1);
        assert_eq!(alphabet.initial_symbol_count(), 4);
        assert_eq!(alphabet.len(), buf.len());
        assert_eq!(alphabet.state_size(), 0);
    }

    #[test]
    fn flags_and_specials() {
        let buf = alphabet_bytes(&[
            "@_EPSILON_SYMBOL_@",
            "@U.CASE.Acc@",
            "@R.CASE.Gen@",
            "@D.NEG@",
            "@_UNKNOWN_SYMBOL_@",
            "@_IDENTITY_SYMBOL_@",
            "@#@",
            "x",
        ]);
        let alphabet = TransducerAlphabetParser::parse(&buf, 8).unwrap();

        assert_eq!(alphabet.state_size(), 2); // CASE and NEG
        assert!(alphabet.is_flag(1));
        assert!(alphabet.is_flag(3));
        assert!(!alphabet.is_flag(7));
        assert_eq!(alphabet.unknown(), Some(4));
        assert_eq!(alphabet.identity(), Some(5));

        let unify = &alphabet.operations()[&1];
        let require = &alphabet.operations()[&2];
        assert_eq!(unify.operation, FlagDiacriticOperator::Unification);
        assert_eq!(unify.feature, require.feature);
        assert_ne!(unify.value, require.value);

        let disallow = &alphabet.operations()[&3];
        assert_eq!(disallow.operation, FlagDiacriticOperator::Disallow);
        assert_eq!(disallow.value, 0);

        // flags and specials are suppressed in the key table
        assert_eq!(alphabet.key_table()[1], "");
        assert_eq!(alphabet.key_table()[4], "");
        assert_eq!(alphabet.key_table()[6], "");
        assert_eq!(alphabet.key_table()[7], "x");
    }

    #[test]
    fn truncated_alphabet_is_rejected() {
        let mut buf = alphabet_bytes(&["@_EPSILON_SYMBOL_@", "a"]);
        buf.pop();
        assert!(matches!(
            TransducerAlphabetParser::parse(&buf, 3),
            Err(TransducerError::AlphabetParsing(_))
        ));
    }

    #[test]
    fn malformed_flag_is_rejected() {
        let buf = alphabet_bytes(&["@_EPSILON_SYMBOL_@", "@X.CASE.Acc@"]);
        assert!(TransducerAlphabetParser::parse(&buf, 2).is_err());
    }

    #[test]
    fn runtime_symbols_extend_the_key_table() {
        let buf = alphabet_bytes(&["@_EPSILON_SYMBOL_@", "a"]);
        let mut alphabet = TransducerAlphabetParser::parse(&buf, 2).unwrap();

        assert!(!alphabet.has_string("ü"));
        alphabet.add_symbol("ü");
        assert_eq!(alphabet.string_to_symbol()["ü"], 2);
        assert_eq!(alphabet.initial_symbol_count(), 2);
        assert_eq!(alphabet.string_from_symbols(&[1, 2]), "aü");
    }
}
