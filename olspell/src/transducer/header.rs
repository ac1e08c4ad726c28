use byteorder::{ByteOrder, LittleEndian};

use super::TransducerError;
use crate::types::{HeaderFlag, SymbolNumber, TransitionTableIndex};

const HFST3_COOKIE: &[u8] = b"HFST\0";

/// Fixed-size header of an optimized-lookup transducer.
///
/// Immutable after load. An optional HFST3 wrapper may precede the header
/// proper; it is validated (its `type` property must name an
/// optimized-lookup automaton) and skipped.
#[derive(Debug)]
pub struct TransducerHeader {
    input_symbols: SymbolNumber,
    symbols: SymbolNumber,
    trans_index_table: usize,
    trans_target_table: usize,
    states: TransitionTableIndex,
    transitions: TransitionTableIndex,

    properties: [bool; 9],
    header_size: usize,
}

fn header_error(msg: &str) -> TransducerError {
    TransducerError::HeaderParsing(msg.to_owned())
}

/// Consumes the HFST3 wrapper if one is present, returning the offset of the
/// OL stream proper.
fn skip_hfst3_header(buf: &[u8]) -> Result<usize, TransducerError> {
    if buf.len() < HFST3_COOKIE.len() || &buf[..HFST3_COOKIE.len()] != HFST3_COOKIE {
        return Ok(0);
    }

    let mut offset = HFST3_COOKIE.len();
    if buf.len() < offset + 3 {
        return Err(header_error("wrapper ended unexpectedly"));
    }

    let remaining_len = LittleEndian::read_u16(&buf[offset..]) as usize;
    offset += 2;
    if buf[offset] != 0 {
        return Err(header_error("malformed wrapper length terminator"));
    }
    offset += 1;

    let end = offset + remaining_len;
    if buf.len() < end || remaining_len == 0 || buf[end - 1] != 0 {
        return Err(header_error("wrapper properties ended unexpectedly"));
    }

    validate_type_property(&buf[offset..end])?;
    Ok(end)
}

/// The wrapper properties are NUL-terminated key/value pairs. If a `type`
/// key is present its value must be `HFST_OL` or `HFST_OLW`.
fn validate_type_property(props: &[u8]) -> Result<(), TransducerError> {
    let mut fields = props.split(|b| *b == 0);

    while let Some(key) = fields.next() {
        let value = fields.next().unwrap_or(b"");
        if key == b"type" {
            if value != b"HFST_OL" && value != b"HFST_OLW" {
                return Err(header_error(
                    "transducer type is not hfst-optimized-lookup",
                ));
            }
            return Ok(());
        }
    }

    Ok(())
}

impl TransducerHeader {
    /// Parses a header from the start of `buf`.
    pub fn read(buf: &[u8]) -> Result<TransducerHeader, TransducerError> {
        let start = skip_hfst3_header(buf)?;

        // 2 u16 counts, 4 u32 counts, 9 u32 property words
        let fixed_len = 2 * 2 + 4 * 4 + 9 * 4;
        if buf.len() < start + fixed_len {
            return Err(header_error("header ended unexpectedly"));
        }

        let mut pos = start;
        let input_symbols = LittleEndian::read_u16(&buf[pos..]);
        pos += 2;
        let symbols = LittleEndian::read_u16(&buf[pos..]);
        pos += 2;
        let trans_index_table = LittleEndian::read_u32(&buf[pos..]) as usize;
        pos += 4;
        let trans_target_table = LittleEndian::read_u32(&buf[pos..]) as usize;
        pos += 4;
        let states = LittleEndian::read_u32(&buf[pos..]);
        pos += 4;
        let transitions = LittleEndian::read_u32(&buf[pos..]);
        pos += 4;

        let mut properties = [false; 9];
        for prop in properties.iter_mut() {
            *prop = LittleEndian::read_u32(&buf[pos..]) != 0;
            pos += 4;
        }

        Ok(TransducerHeader {
            input_symbols,
            symbols,
            trans_index_table,
            trans_target_table,
            states,
            transitions,
            properties,
            header_size: pos,
        })
    }

    /// Total number of symbols in the alphabet.
    pub fn symbol_count(&self) -> SymbolNumber {
        self.symbols
    }

    /// Number of symbols that can occur on the input side.
    pub fn input_symbol_count(&self) -> SymbolNumber {
        self.input_symbols
    }

    /// Number of entries in the index table.
    pub fn index_table_size(&self) -> usize {
        self.trans_index_table
    }

    /// Number of entries in the transition table.
    pub fn target_table_size(&self) -> usize {
        self.trans_target_table
    }

    /// Number of states in the automaton.
    pub fn states(&self) -> TransitionTableIndex {
        self.states
    }

    /// Number of transitions in the automaton.
    pub fn transitions(&self) -> TransitionTableIndex {
        self.transitions
    }

    /// Queries one of the nine boolean header properties.
    pub fn has_flag(&self, flag: HeaderFlag) -> bool {
        self.properties[flag as usize]
    }

    /// Bytes consumed by the header, wrapper included.
    pub fn len(&self) -> usize {
        self.header_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;

    fn bare_header_bytes() -> Vec<u8> {
        let mut buf = vec![];
        buf.write_u16::<LittleEndian>(4).unwrap(); // input symbols
        buf.write_u16::<LittleEndian>(5).unwrap(); // symbols
        buf.write_u32::<LittleEndian>(10).unwrap(); // index table
        buf.write_u32::<LittleEndian>(20).unwrap(); // transition table
        buf.write_u32::<LittleEndian>(7).unwrap(); // states
        buf.write_u32::<LittleEndian>(13).unwrap(); // transitions
        for i in 0..9 {
            buf.write_u32::<LittleEndian>(u32::from(i == 0)).unwrap();
        }
        buf
    }

    fn wrap_hfst3(props: &[u8], inner: &[u8]) -> Vec<u8> {
        let mut buf = b"HFST\0".to_vec();
        buf.write_u16::<LittleEndian>(props.len() as u16).unwrap();
        buf.push(0);
        buf.extend_from_slice(props);
        buf.extend_from_slice(inner);
        buf
    }

    #[test]
    fn bare_header() {
        let header = TransducerHeader::read(&bare_header_bytes()).unwrap();
        assert_eq!(header.input_symbol_count(), 4);
        assert_eq!(header.symbol_count(), 5);
        assert_eq!(header.index_table_size(), 10);
        assert_eq!(header.target_table_size(), 20);
        assert_eq!(header.states(), 7);
        assert_eq!(header.transitions(), 13);
        assert!(header.has_flag(HeaderFlag::Weighted));
        assert!(!header.has_flag(HeaderFlag::Cyclic));
        assert_eq!(header.len(), 56);
    }

    #[test]
    fn wrapped_header() {
        let buf = wrap_hfst3(b"version\0 3.3.0\0type\0HFST_OLW\0", &bare_header_bytes());
        let header = TransducerHeader::read(&buf).unwrap();
        assert_eq!(header.symbol_count(), 5);
        assert_eq!(header.len(), buf.len());
    }

    #[test]
    fn wrong_type_is_rejected() {
        let buf = wrap_hfst3(b"type\0HFST_SFST\0", &bare_header_bytes());
        assert!(matches!(
            TransducerHeader::read(&buf),
            Err(TransducerError::HeaderParsing(_))
        ));
    }

    #[test]
    fn truncated_header_is_rejected() {
        let buf = bare_header_bytes();
        assert!(TransducerHeader::read(&buf[..buf.len() - 4]).is_err());
    }

    #[test]
    fn truncated_wrapper_is_rejected() {
        assert!(TransducerHeader::read(b"HFST\0\x40").is_err());
    }
}
