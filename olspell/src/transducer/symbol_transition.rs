use crate::types::{SymbolNumber, TransitionTableIndex, Weight};

/// One outgoing transition as seen by the search: target state, output
/// symbol and weight.
#[derive(Debug, Clone)]
pub struct SymbolTransition {
    target: Option<TransitionTableIndex>,
    symbol: Option<SymbolNumber>,
    weight: Option<Weight>,
}

impl SymbolTransition {
    pub(crate) fn new(
        target: Option<TransitionTableIndex>,
        symbol: Option<SymbolNumber>,
        weight: Option<Weight>,
    ) -> SymbolTransition {
        SymbolTransition {
            target,
            symbol,
            weight,
        }
    }

    /// Target state of the transition.
    #[inline(always)]
    pub fn target(&self) -> Option<TransitionTableIndex> {
        self.target
    }

    /// Output symbol of the transition.
    #[inline(always)]
    pub fn symbol(&self) -> Option<SymbolNumber> {
        self.symbol
    }

    /// Weight of the transition.
    #[inline(always)]
    pub fn weight(&self) -> Option<Weight> {
        self.weight
    }

    /// A copy of this transition with its output suppressed to epsilon.
    #[inline(always)]
    pub fn clone_with_epsilon_symbol(&self) -> SymbolTransition {
        SymbolTransition {
            target: self.target,
            symbol: Some(0),
            weight: self.weight,
        }
    }
}
