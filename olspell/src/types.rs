use serde::{Deserialize, Serialize};

/// Identifier of a symbol in a transducer alphabet.
///
/// Symbol 0 is always epsilon (the empty string).
pub type SymbolNumber = u16;

/// Position in a transducer's packed tables.
///
/// Values at or above [`TARGET_TABLE`](crate::constants::TARGET_TABLE) point
/// into the transition table, values below it into the index table.
pub type TransitionTableIndex = u32;

/// Penalty weight of a transition or a complete path. Lower is better.
pub type Weight = f32;

/// Value side of a flag diacritic feature.
pub type ValueNumber = i16;

/// Per-path state of the flag diacritic features.
///
/// One slot per feature: `0` unset, positive `v` set to `v`, negative `-v`
/// negatively set to `v`.
pub type FlagDiacriticState = Vec<ValueNumber>;

/// Map from flag diacritic symbols to their operations.
pub type OperationsMap = hashbrown::HashMap<SymbolNumber, FlagDiacriticOperation>;

/// Operator of a flag diacritic, from the `@X.FEATURE.VALUE@` notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlagDiacriticOperator {
    /// `P`: set a feature to a value
    PositiveSet,
    /// `N`: set a feature negatively to a value
    NegativeSet,
    /// `R`: require a feature to be set (to a value)
    Require,
    /// `D`: disallow a feature being set (to a value)
    Disallow,
    /// `C`: clear a feature
    Clear,
    /// `U`: unify a feature with a value
    Unification,
}

impl std::str::FromStr for FlagDiacriticOperator {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "P" => Ok(FlagDiacriticOperator::PositiveSet),
            "N" => Ok(FlagDiacriticOperator::NegativeSet),
            "R" => Ok(FlagDiacriticOperator::Require),
            "D" => Ok(FlagDiacriticOperator::Disallow),
            "C" => Ok(FlagDiacriticOperator::Clear),
            "U" => Ok(FlagDiacriticOperator::Unification),
            _ => Err(()),
        }
    }
}

/// One flag diacritic constraint carried on a transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagDiacriticOperation {
    /// The operator to apply
    pub operation: FlagDiacriticOperator,
    /// Index of the feature operated on
    pub feature: SymbolNumber,
    /// The value; `0` means neutral/unset
    pub value: ValueNumber,
}

/// Boolean properties recorded in a transducer header.
#[derive(Debug, Clone, Copy)]
pub enum HeaderFlag {
    /// Transitions carry weights
    Weighted,
    /// The automaton is deterministic
    Deterministic,
    /// The input side is deterministic
    InputDeterministic,
    /// The automaton is minimized
    Minimized,
    /// The automaton contains cycles
    Cyclic,
    /// Has epsilon-to-epsilon transitions
    HasEpsilonEpsilonTransitions,
    /// Has input-epsilon transitions
    HasInputEpsilonTransitions,
    /// Has input-epsilon cycles
    HasInputEpsilonCycles,
    /// Has unweighted input-epsilon cycles
    HasUnweightedInputEpsilonCycles,
}
