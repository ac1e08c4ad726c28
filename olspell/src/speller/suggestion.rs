//! Result types for corrections and analyses.
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::cmp::Ordering;
use std::cmp::Ordering::Equal;

use crate::types::Weight;

/// A correction or analysis of a word form, with its total penalty weight.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Suggestion {
    /// the suggested word form or analysis string
    pub value: SmolStr,
    /// total penalty weight of the suggestion
    pub weight: Weight,
}

impl Suggestion {
    /// Creates a suggestion.
    pub fn new(value: SmolStr, weight: Weight) -> Suggestion {
        Suggestion { value, weight }
    }

    /// The suggested word form.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The penalty weight of the suggestion.
    pub fn weight(&self) -> Weight {
        self.weight
    }
}

impl PartialOrd for Suggestion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Suggestion {
    fn cmp(&self, other: &Self) -> Ordering {
        let by_weight = self.weight.partial_cmp(&other.weight).unwrap_or(Equal);

        if let Equal = by_weight {
            return self.value.cmp(&other.value);
        }

        by_weight
    }
}

impl PartialEq for Suggestion {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.weight == other.weight
    }
}

impl Eq for Suggestion {}

/// An analysis with its output symbols kept separate, making multi-character
/// tags of the automaton visible.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SymbolsAnalysis {
    /// output symbols in order of emission
    pub symbols: Vec<SmolStr>,
    /// total penalty weight of the analysis
    pub weight: Weight,
}

impl SymbolsAnalysis {
    /// Creates a symbols analysis.
    pub fn new(symbols: Vec<SmolStr>, weight: Weight) -> SymbolsAnalysis {
        SymbolsAnalysis { symbols, weight }
    }
}

impl PartialOrd for SymbolsAnalysis {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SymbolsAnalysis {
    fn cmp(&self, other: &Self) -> Ordering {
        let by_weight = self.weight.partial_cmp(&other.weight).unwrap_or(Equal);

        if let Equal = by_weight {
            return self.symbols.cmp(&other.symbols);
        }

        by_weight
    }
}

impl PartialEq for SymbolsAnalysis {
    fn eq(&self, other: &Self) -> bool {
        self.symbols == other.symbols && self.weight == other.weight
    }
}

impl Eq for SymbolsAnalysis {}

/// A correction paired with one of its analyses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalyzedSuggestion {
    /// the corrected word form
    pub value: SmolStr,
    /// an analysis of the corrected form
    pub analysis: SmolStr,
    /// weight of the analysis
    pub weight: Weight,
}

impl PartialOrd for AnalyzedSuggestion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AnalyzedSuggestion {
    fn cmp(&self, other: &Self) -> Ordering {
        let by_weight = self.weight.partial_cmp(&other.weight).unwrap_or(Equal);

        if let Equal = by_weight {
            return (&self.value, &self.analysis).cmp(&(&other.value, &other.analysis));
        }

        by_weight
    }
}

impl PartialEq for AnalyzedSuggestion {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.analysis == other.analysis && self.weight == other.weight
    }
}

impl Eq for AnalyzedSuggestion {}
