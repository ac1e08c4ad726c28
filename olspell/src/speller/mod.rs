//! Spell-checking, correction and analysis over a transducer pair.

use serde::{Deserialize, Serialize};

use crate::transducer::tree_node::TreeNode;
use crate::transducer::Transducer;
use crate::types::{SymbolNumber, Weight};

use self::suggestion::{Suggestion, SymbolsAnalysis};
use self::worker::SpellerWorker;

mod limits;
pub mod suggestion;
mod worker;

/// What a traversal is being used for. The mode decides which encoder
/// tokenises the input and what the output tape records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    /// acceptance of the input by the lexicon alone
    Check,
    /// ranked corrections from the composed mutator∘lexicon
    Correct,
    /// output strings of the lexicon alone
    Lookup,
}

/// Precomputed search state for one first input symbol.
///
/// Holds every node reachable after consuming exactly one input symbol,
/// plus the complete results for inputs of length zero and one. Populated
/// lazily, never invalidated.
#[derive(Debug, Clone)]
pub(crate) struct CacheContainer {
    pub(crate) nodes: Vec<TreeNode>,
    pub(crate) results_len_0: Vec<Suggestion>,
    pub(crate) results_len_1: Vec<Suggestion>,
    pub(crate) empty: bool,
}

impl Default for CacheContainer {
    fn default() -> Self {
        CacheContainer {
            nodes: vec![],
            results_len_0: vec![],
            results_len_1: vec![],
            empty: true,
        }
    }
}

/// Tuning of the correction search.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SpellerConfig {
    /// upper limit on the number of results; `None` disables
    #[serde(default)]
    pub n_best: Option<usize>,
    /// upper limit on the weight of any result; `None` disables
    #[serde(default)]
    pub max_weight: Option<Weight>,
    /// largest allowed weight gap above the best result; `None` disables
    #[serde(default)]
    pub beam: Option<Weight>,
    /// wall-clock budget for one correction call, in seconds
    #[serde(default)]
    pub time_cutoff: Option<f32>,
    /// size of the search node pool
    #[serde(default = "default_node_pool_size")]
    pub node_pool_size: usize,
}

impl SpellerConfig {
    /// A configuration with no limits enabled.
    pub const fn default() -> SpellerConfig {
        SpellerConfig {
            n_best: None,
            max_weight: None,
            beam: None,
            time_cutoff: None,
            node_pool_size: default_node_pool_size(),
        }
    }
}

const fn default_node_pool_size() -> usize {
    128
}

/// How many bytes the UTF-8 sequence starting with `byte` occupies, or 0
/// when `byte` cannot start a sequence.
pub(crate) fn byte_len_utf8(byte: u8) -> usize {
    if byte <= 127 {
        1
    } else if byte & 0b1111_0000 == 0b1111_0000 {
        4
    } else if byte & 0b1110_0000 == 0b1110_0000 {
        3
    } else if byte & 0b1100_0000 == 0b1100_0000 {
        2
    } else {
        0
    }
}

/// Maps every mutator symbol to the lexicon's symbol for the same printable
/// string, extending the lexicon's alphabet where it has no counterpart.
fn build_alphabet_translator(mutator: &Transducer, lexicon: &mut Transducer) -> Vec<SymbolNumber> {
    let from_keys = mutator.alphabet().key_table();
    let mut translator = Vec::with_capacity(from_keys.len());
    translator.push(0);

    for from_sym in from_keys.iter().skip(1) {
        if let Some(&sym) = lexicon.alphabet().string_to_symbol().get(from_sym) {
            translator.push(sym);
        } else {
            let lexicon_key = lexicon.alphabet().key_table().len() as SymbolNumber;
            lexicon.mut_encoder().read_input_symbol(from_sym, lexicon_key);
            lexicon.mut_alphabet().add_symbol(from_sym);
            translator.push(lexicon_key);
        }
    }

    translator
}

/// A spell-checking unit: an optional error model (the mutator) composed
/// with a language model (the lexicon).
///
/// The speller is a mutable search cursor; one instance must not be used
/// from several threads at once. It owns its transducers and extends their
/// alphabets in place when the input contains characters the transducer
/// files never saw.
#[derive(Debug)]
pub struct Speller {
    mutator: Option<Transducer>,
    lexicon: Transducer,
    alphabet_translator: Vec<SymbolNumber>,
    input: Vec<SymbolNumber>,
    cache: Vec<CacheContainer>,
    mode: Mode,
    config: SpellerConfig,
}

impl Speller {
    /// Creates a speller. Without a mutator only `check` and the analyses
    /// work; `suggest` returns nothing.
    pub fn new(mutator: Option<Transducer>, mut lexicon: Transducer) -> Speller {
        let mut alphabet_translator = vec![];
        let mut cache = vec![];

        if let Some(mutator) = &mutator {
            alphabet_translator = build_alphabet_translator(mutator, &mut lexicon);
            cache = vec![CacheContainer::default(); mutator.alphabet().key_table().len()];
        }

        Speller {
            mutator,
            lexicon,
            alphabet_translator,
            input: vec![],
            cache,
            mode: Mode::Correct,
            config: SpellerConfig::default(),
        }
    }

    /// The error model, if one is attached.
    pub fn mutator(&self) -> Option<&Transducer> {
        self.mutator.as_ref()
    }

    /// The language model.
    pub fn lexicon(&self) -> &Transducer {
        &self.lexicon
    }

    /// Whether corrections can be produced.
    pub fn can_correct(&self) -> bool {
        self.mutator.is_some()
    }

    /// The current search configuration.
    pub fn config(&self) -> &SpellerConfig {
        &self.config
    }

    /// Caps the number of results of `suggest` and the analyses.
    /// `0` disables the cap.
    pub fn set_queue_limit(&mut self, limit: usize) {
        self.config.n_best = if limit == 0 { None } else { Some(limit) };
    }

    /// Caps the weight of any returned result. Negative disables the cap.
    pub fn set_weight_limit(&mut self, limit: Weight) {
        self.config.max_weight = if limit < 0.0 { None } else { Some(limit) };
    }

    /// Caps the weight gap above the best result. Negative disables the cap.
    pub fn set_beam(&mut self, beam: Weight) {
        self.config.beam = if beam < 0.0 { None } else { Some(beam) };
    }

    /// Caps the wall-clock time of one correction call, in seconds.
    /// Zero or negative disables the cap.
    pub fn set_time_cutoff(&mut self, seconds: f32) {
        self.config.time_cutoff = if seconds <= 0.0 { None } else { Some(seconds) };
    }

    /// Whether `word` is accepted by the lexicon.
    pub fn check(&mut self, word: &str) -> bool {
        let config = self.config.clone();
        self.check_with_config(word, &config)
    }

    /// Like [`check`](Self::check) with an explicit configuration.
    pub fn check_with_config(&mut self, word: &str, config: &SpellerConfig) -> bool {
        self.mode = Mode::Check;
        if !self.init_input(word) {
            return false;
        }

        let mut worker = SpellerWorker::new(
            self.mutator.as_ref(),
            &self.lexicon,
            &self.alphabet_translator,
            &self.input,
            Mode::Check,
            config,
        );
        worker.is_correct()
    }

    /// Ranked corrections for `word`, ascending by weight.
    pub fn suggest(&mut self, word: &str) -> Vec<Suggestion> {
        let config = self.config.clone();
        self.suggest_with_config(word, &config)
    }

    /// Like [`suggest`](Self::suggest) with an explicit configuration.
    pub fn suggest_with_config(&mut self, word: &str, config: &SpellerConfig) -> Vec<Suggestion> {
        if self.mutator.is_none() {
            return vec![];
        }

        self.mode = Mode::Correct;
        if !self.init_input(word) {
            return vec![];
        }
        log::trace!("suggesting for {:?}, {} input symbols", word, self.input.len());

        let first_input = self.input.first().copied().unwrap_or(0);
        if self.cache[first_input as usize].empty {
            let container = {
                let mut worker = SpellerWorker::new(
                    self.mutator.as_ref(),
                    &self.lexicon,
                    &self.alphabet_translator,
                    &self.input,
                    Mode::Correct,
                    config,
                );
                worker.build_cache(first_input)
            };
            self.cache[first_input as usize] = container;
        }

        let container = &self.cache[first_input as usize];
        let mut worker = SpellerWorker::new(
            self.mutator.as_ref(),
            &self.lexicon,
            &self.alphabet_translator,
            &self.input,
            Mode::Correct,
            config,
        );

        if self.input.len() <= 1 {
            let results = if self.input.is_empty() {
                &container.results_len_0
            } else {
                &container.results_len_1
            };
            return worker.corrections_from_cache(results);
        }

        worker.correct(&container.nodes)
    }

    /// Morphological analyses of `word` against the lexicon, ascending by
    /// weight.
    pub fn analyse(&mut self, word: &str) -> Vec<Suggestion> {
        let config = self.config.clone();
        self.analyse_with_config(word, &config)
    }

    /// Like [`analyse`](Self::analyse) with an explicit configuration.
    pub fn analyse_with_config(&mut self, word: &str, config: &SpellerConfig) -> Vec<Suggestion> {
        self.mode = Mode::Lookup;
        if !self.init_input(word) {
            return vec![];
        }

        let mut worker = SpellerWorker::new(
            self.mutator.as_ref(),
            &self.lexicon,
            &self.alphabet_translator,
            &self.input,
            Mode::Lookup,
            config,
        );
        worker.analyze()
    }

    /// Like [`analyse`](Self::analyse), but keeps the output symbols of
    /// each analysis separate instead of concatenating them.
    pub fn analyse_symbols(&mut self, word: &str) -> Vec<SymbolsAnalysis> {
        let config = self.config.clone();
        self.analyse_symbols_with_config(word, &config)
    }

    /// Like [`analyse_symbols`](Self::analyse_symbols) with an explicit
    /// configuration.
    pub fn analyse_symbols_with_config(
        &mut self,
        word: &str,
        config: &SpellerConfig,
    ) -> Vec<SymbolsAnalysis> {
        self.mode = Mode::Lookup;
        if !self.init_input(word) {
            return vec![];
        }

        let mut worker = SpellerWorker::new(
            self.mutator.as_ref(),
            &self.lexicon,
            &self.alphabet_translator,
            &self.input,
            Mode::Lookup,
            config,
        );
        worker.analyze_symbols()
    }

    /// Tokenises `line` into `self.input` with the active encoder.
    ///
    /// A character the encoder cannot tokenise is peeled off as one UTF-8
    /// sequence and registered in both alphabets, their encoders, the
    /// alphabet translator and the cache; tokenisation then resumes behind
    /// it. Only a byte that cannot start a UTF-8 sequence fails the call.
    fn init_input(&mut self, line: &str) -> bool {
        self.input.clear();
        let bytes = line.as_bytes();
        let mut pos = 0;

        while pos < bytes.len() {
            let old_pos = pos;

            let key = if self.mutator.is_some() && self.mode != Mode::Check {
                self.mutator
                    .as_ref()
                    .unwrap()
                    .encoder()
                    .find_key(bytes, &mut pos)
            } else {
                self.lexicon.encoder().find_key(bytes, &mut pos)
            };

            if let Some(key) = key {
                self.input.push(key);
                continue;
            }

            let char_len = byte_len_utf8(bytes[old_pos]);
            if char_len == 0 {
                return false;
            }
            let new_symbol = &line[old_pos..old_pos + char_len];
            pos = old_pos + char_len;

            self.cache.push(CacheContainer::default());

            if !self.lexicon.alphabet().has_string(new_symbol) {
                self.lexicon.mut_alphabet().add_symbol(new_symbol);
            }
            let lexicon_key = self.lexicon.alphabet().string_to_symbol()[new_symbol];
            self.lexicon
                .mut_encoder()
                .read_input_symbol(new_symbol, lexicon_key);

            if let Some(mutator) = self.mutator.as_mut() {
                if !mutator.alphabet().has_string(new_symbol) {
                    mutator.mut_alphabet().add_symbol(new_symbol);
                }
                let mutator_key = mutator.alphabet().string_to_symbol()[new_symbol];
                mutator.mut_encoder().read_input_symbol(new_symbol, mutator_key);

                if mutator_key as usize >= self.alphabet_translator.len() {
                    self.alphabet_translator.push(lexicon_key);
                }
                self.input.push(mutator_key);
            } else {
                self.input.push(lexicon_key);
            }
        }

        true
    }
}
