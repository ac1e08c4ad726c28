//! Builder for optimized-lookup binary images used by the integration
//! tests. Each test binary uses its own subset of the fixtures.
#![allow(dead_code)]
//!
//! States are laid out in the index table only: each state has a block of
//! `1 + symbol_count` cells. The first cell of a block carries finality (the
//! format overloads its target slot with the final weight), cell `1 + sym`
//! points at the first transition row of the group consuming `sym`. Groups
//! of transition rows are separated by guard rows so a scan never runs into
//! the next group.

use byteorder::{LittleEndian, WriteBytesExt};

pub const NO_SYMBOL: u16 = u16::MAX;
pub const NO_TABLE_INDEX: u32 = u32::MAX;
pub const TARGET_TABLE: u32 = 2_147_483_648;

/// One transition of a fixture automaton. `target` is a state number.
#[derive(Debug, Clone)]
pub struct Arc {
    pub input: u16,
    pub output: u16,
    pub target: usize,
    pub weight: f32,
}

pub fn arc(input: u16, output: u16, target: usize, weight: f32) -> Arc {
    Arc {
        input,
        output,
        target,
        weight,
    }
}

/// One state of a fixture automaton. Arcs with epsilon or flag input must
/// precede the rest so they land in the state's epsilon run.
#[derive(Debug, Clone, Default)]
pub struct State {
    pub final_weight: Option<f32>,
    pub arcs: Vec<Arc>,
}

pub fn state(final_weight: Option<f32>, arcs: Vec<Arc>) -> State {
    State { final_weight, arcs }
}

/// Serialises an automaton. `flag_symbols` lists the symbol numbers whose
/// arcs belong in the epsilon runs alongside input-epsilon arcs.
pub fn build_ol(symbols: &[&str], flag_symbols: &[u16], states: &[State]) -> Vec<u8> {
    let symbol_count = symbols.len() as u16;
    let block = 1 + symbols.len();
    let index_size = states.len() * block;
    let state_base = |state: usize| (state * block) as u32;
    let is_eps_like = |input: u16| input == 0 || flag_symbols.contains(&input);

    // (input symbol of index cell, target word)
    let mut index_cells: Vec<(u16, u32)> = vec![(NO_SYMBOL, NO_TABLE_INDEX); index_size];
    // (input, output, target word, weight)
    let mut rows: Vec<(u16, u16, u32, f32)> = vec![];
    let mut arc_count = 0u32;

    for (state_no, state) in states.iter().enumerate() {
        let base = state_no * block;

        if let Some(weight) = state.final_weight {
            index_cells[base] = (NO_SYMBOL, weight.to_bits());
        }

        // the epsilon run first, then one group per plain input symbol in
        // order of first appearance
        let mut groups: Vec<(u16, Vec<&Arc>)> = vec![];
        let eps_run: Vec<&Arc> = state.arcs.iter().filter(|a| is_eps_like(a.input)).collect();
        if !eps_run.is_empty() {
            groups.push((0, eps_run));
        }
        for arc in state.arcs.iter().filter(|a| !is_eps_like(a.input)) {
            match groups.iter_mut().find(|(input, _)| *input == arc.input) {
                Some((_, group)) => group.push(arc),
                None => groups.push((arc.input, vec![arc])),
            }
        }

        for (group_input, group) in groups {
            let start_row = rows.len() as u32;
            index_cells[base + 1 + group_input as usize] =
                (group_input, TARGET_TABLE + start_row);

            for arc in group {
                rows.push((arc.input, arc.output, state_base(arc.target), arc.weight));
                arc_count += 1;
            }
            rows.push((NO_SYMBOL, NO_SYMBOL, NO_TABLE_INDEX, f32::INFINITY));
        }
    }

    let mut buf = vec![];
    buf.write_u16::<LittleEndian>(symbol_count).unwrap();
    buf.write_u16::<LittleEndian>(symbol_count).unwrap();
    buf.write_u32::<LittleEndian>(index_size as u32).unwrap();
    buf.write_u32::<LittleEndian>(rows.len() as u32).unwrap();
    buf.write_u32::<LittleEndian>(states.len() as u32).unwrap();
    buf.write_u32::<LittleEndian>(arc_count).unwrap();
    for prop in 0..9 {
        // weighted, everything else off
        buf.write_u32::<LittleEndian>(u32::from(prop == 0)).unwrap();
    }

    for symbol in symbols {
        buf.extend_from_slice(symbol.as_bytes());
        buf.push(0);
    }

    for (input, target) in index_cells {
        buf.write_u16::<LittleEndian>(input).unwrap();
        buf.write_u32::<LittleEndian>(target).unwrap();
    }

    for (input, output, target, weight) in rows {
        buf.write_u16::<LittleEndian>(input).unwrap();
        buf.write_u16::<LittleEndian>(output).unwrap();
        buf.write_u32::<LittleEndian>(target).unwrap();
        buf.write_f32::<LittleEndian>(weight).unwrap();
    }

    buf
}

/// Wraps an OL image in the HFST3 container header.
pub fn wrap_hfst3(inner: &[u8]) -> Vec<u8> {
    let props = b"version\0 3.3.0\0type\0HFST_OLW\0";
    let mut buf = b"HFST\0".to_vec();
    buf.write_u16::<LittleEndian>(props.len() as u16).unwrap();
    buf.push(0);
    buf.extend_from_slice(props);
    buf.extend_from_slice(inner);
    buf
}

// Lexicon over {a,c,d,g,o,t} accepting "cat" and "dog" at weight zero.
// Symbols: a=1 c=2 d=3 g=4 o=5 t=6.
pub fn cat_dog_lexicon() -> Vec<u8> {
    let symbols = ["@_EPSILON_SYMBOL_@", "a", "c", "d", "g", "o", "t"];
    let states = vec![
        state(None, vec![arc(2, 2, 1, 0.0), arc(3, 3, 4, 0.0)]),
        state(None, vec![arc(1, 1, 2, 0.0)]),
        state(None, vec![arc(6, 6, 3, 0.0)]),
        state(Some(0.0), vec![]),
        state(None, vec![arc(5, 5, 5, 0.0)]),
        state(None, vec![arc(4, 4, 6, 0.0)]),
        state(Some(0.0), vec![]),
    ];
    build_ol(&symbols, &[], &states)
}

/// Symbols of the edit-distance error model: a=1 c=2 d=3 g=4 i=5 o=6 t=7.
/// The letter `i` is deliberately absent from the lexicon alphabet.
pub const ERRMODEL_LETTERS: std::ops::Range<u16> = 1..8;

// Edit distance ≤ 2 error model over {a,c,d,g,i,o,t}: identity at weight 0,
// insertion, deletion and substitution at weight 1 each.
pub fn edit_distance_2_errmodel() -> Vec<u8> {
    let symbols = ["@_EPSILON_SYMBOL_@", "a", "c", "d", "g", "i", "o", "t"];
    let mut states = vec![];

    for edits in 0..3usize {
        let mut arcs = vec![];
        if edits < 2 {
            for letter in ERRMODEL_LETTERS {
                arcs.push(arc(0, letter, edits + 1, 1.0)); // insertion
            }
        }
        for letter in ERRMODEL_LETTERS {
            arcs.push(arc(letter, letter, edits, 0.0)); // identity
            if edits < 2 {
                for substituted in ERRMODEL_LETTERS {
                    if substituted != letter {
                        arcs.push(arc(letter, substituted, edits + 1, 1.0));
                    }
                }
                arcs.push(arc(letter, 0, edits + 1, 1.0)); // deletion
            }
        }
        states.push(state(Some(0.0), arcs));
    }

    build_ol(&symbols, &[], &states)
}

// Two-tape lexicon mapping the surface form "cat" to the analysis "cat+N".
// Symbols: a=1 c=2 t=3 +N=4.
pub fn cat_analysis_lexicon() -> Vec<u8> {
    let symbols = ["@_EPSILON_SYMBOL_@", "a", "c", "t", "+N"];
    let states = vec![
        state(None, vec![arc(2, 2, 1, 0.0)]),
        state(None, vec![arc(1, 1, 2, 0.0)]),
        state(None, vec![arc(3, 3, 3, 0.0)]),
        state(None, vec![arc(0, 4, 4, 0.0)]),
        state(Some(0.0), vec![]),
    ];
    build_ol(&symbols, &[], &states)
}
