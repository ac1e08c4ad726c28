use lifeguard::{Pool, Recycled};

use super::symbol_transition::SymbolTransition;
use crate::types::{
    FlagDiacriticOperation, FlagDiacriticOperator, FlagDiacriticState, SymbolNumber,
    TransitionTableIndex, ValueNumber, Weight,
};

/// One state of the search over the mutator×lexicon product.
///
/// Nodes are value objects: the `update_*` methods hand out fresh copies
/// drawn from an object pool, never mutate the receiver.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    /// Output symbols produced so far
    pub string: Vec<SymbolNumber>,
    /// Position in the input symbol vector
    pub input_state: u32,
    /// Current state in the error model
    pub mutator_state: TransitionTableIndex,
    /// Current state in the language model
    pub lexicon_state: TransitionTableIndex,
    /// Current values of the flag diacritic features
    pub flag_state: FlagDiacriticState,
    /// Accumulated weight
    pub weight: Weight,
}

impl lifeguard::Recycleable for TreeNode {
    fn new() -> Self {
        TreeNode {
            string: Vec::with_capacity(1),
            input_state: 0,
            mutator_state: 0,
            lexicon_state: 0,
            flag_state: vec![],
            weight: 0.0,
        }
    }

    fn reset(&mut self) {
        // Fields are overwritten on reuse.
    }
}

impl lifeguard::InitializeWith<&TreeNode> for TreeNode {
    fn initialize_with(&mut self, source: &TreeNode) {
        self.string.truncate(0);
        self.string.extend(&source.string);
        self.input_state = source.input_state;
        self.mutator_state = source.mutator_state;
        self.lexicon_state = source.lexicon_state;
        self.flag_state.truncate(0);
        self.flag_state.extend_from_slice(&source.flag_state);
        self.weight = source.weight;
    }
}

impl TreeNode {
    /// The root node: both automata at their start states, nothing consumed,
    /// all features unset.
    #[inline(always)]
    pub fn empty(pool: &Pool<TreeNode>, start_state: FlagDiacriticState) -> Recycled<'_, TreeNode> {
        pool.attach(TreeNode {
            string: vec![],
            input_state: 0,
            mutator_state: 0,
            lexicon_state: 0,
            flag_state: start_state,
            weight: 0.0,
        })
    }

    #[inline(always)]
    fn copy_into<'a>(&self, pool: &'a Pool<TreeNode>) -> Recycled<'a, TreeNode> {
        let mut node = pool.new();
        node.initialize_from(self);
        node
    }

    #[inline(always)]
    fn initialize_from(&mut self, source: &TreeNode) {
        use lifeguard::InitializeWith;
        self.initialize_with(source);
    }

    /// Successor over a lexicon epsilon arc: the lexicon advances, the
    /// transition's output (unless suppressed to 0) is appended.
    #[inline(always)]
    pub fn update_lexicon<'a>(
        &self,
        pool: &'a Pool<TreeNode>,
        transition: SymbolTransition,
    ) -> Recycled<'a, TreeNode> {
        let mut node = self.copy_into(pool);

        if let Some(symbol) = transition.symbol() {
            if symbol != 0 {
                node.string.push(symbol);
            }
        }
        node.lexicon_state = transition.target().unwrap();
        node.weight = self.weight + transition.weight().unwrap();

        node
    }

    /// Successor over a mutator epsilon arc: only the mutator advances.
    #[inline(always)]
    pub fn update_mutator<'a>(
        &self,
        pool: &'a Pool<TreeNode>,
        transition: SymbolTransition,
    ) -> Recycled<'a, TreeNode> {
        let mut node = self.copy_into(pool);

        node.mutator_state = transition.target().unwrap();
        node.weight = self.weight + transition.weight().unwrap();

        node
    }

    /// General successor: output symbol appended (unless 0), both automata
    /// states replaced, input position advanced to `next_input` if given.
    #[inline(always)]
    pub fn update<'a>(
        &self,
        pool: &'a Pool<TreeNode>,
        output_symbol: SymbolNumber,
        next_input: Option<u32>,
        next_mutator: TransitionTableIndex,
        next_lexicon: TransitionTableIndex,
        weight: Weight,
    ) -> Recycled<'a, TreeNode> {
        let mut node = self.copy_into(pool);

        if output_symbol != 0 {
            node.string.push(output_symbol);
        }
        node.mutator_state = next_mutator;
        node.lexicon_state = next_lexicon;
        node.weight = self.weight + weight;
        if let Some(input) = next_input {
            node.input_state = input;
        }

        node
    }

    /// Successor over a flag diacritic arc: like an epsilon but with a flag
    /// feature rewritten.
    #[inline(always)]
    fn update_flag<'a>(
        &self,
        pool: &'a Pool<TreeNode>,
        feature: SymbolNumber,
        value: ValueNumber,
        transition: &SymbolTransition,
    ) -> Recycled<'a, TreeNode> {
        let mut node = self.apply_transition(pool, transition);
        node.flag_state[feature as usize] = value;
        node
    }

    /// Successor advancing the lexicon without emitting output.
    #[inline(always)]
    pub fn apply_transition<'a>(
        &self,
        pool: &'a Pool<TreeNode>,
        transition: &SymbolTransition,
    ) -> Recycled<'a, TreeNode> {
        let mut node = self.copy_into(pool);

        node.lexicon_state = transition.target().unwrap();
        node.weight = self.weight + transition.weight().unwrap();

        node
    }

    /// Attempts a flag diacritic operation against this node's flag state.
    ///
    /// Returns the successor if the operation is compatible, `None` if the
    /// path is blocked. The receiver is never modified.
    #[inline(always)]
    pub fn apply_operation<'a>(
        &self,
        pool: &'a Pool<TreeNode>,
        op: &FlagDiacriticOperation,
        transition: &SymbolTransition,
    ) -> Option<Recycled<'a, TreeNode>> {
        let feature = op.feature as usize;

        match op.operation {
            FlagDiacriticOperator::PositiveSet => {
                Some(self.update_flag(pool, op.feature, op.value, transition))
            }
            FlagDiacriticOperator::NegativeSet => {
                Some(self.update_flag(pool, op.feature, -op.value, transition))
            }
            FlagDiacriticOperator::Require => {
                let allowed = if op.value == 0 {
                    self.flag_state[feature] != 0
                } else {
                    self.flag_state[feature] == op.value
                };

                if allowed {
                    Some(self.apply_transition(pool, transition))
                } else {
                    None
                }
            }
            FlagDiacriticOperator::Disallow => {
                let allowed = if op.value == 0 {
                    self.flag_state[feature] == 0
                } else {
                    self.flag_state[feature] != op.value
                };

                if allowed {
                    Some(self.apply_transition(pool, transition))
                } else {
                    None
                }
            }
            FlagDiacriticOperator::Clear => Some(self.update_flag(pool, op.feature, 0, transition)),
            FlagDiacriticOperator::Unification => {
                // succeeds if the feature is unset, already unified with
                // this value, or negatively set to a different value
                let current = self.flag_state[feature];

                if current == 0
                    || current == op.value
                    || (current < 0 && -current != op.value)
                {
                    Some(self.update_flag(pool, op.feature, op.value, transition))
                } else {
                    None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> Pool<TreeNode> {
        Pool::with_size_and_max(0, 0)
    }

    fn op(
        operation: FlagDiacriticOperator,
        feature: SymbolNumber,
        value: ValueNumber,
    ) -> FlagDiacriticOperation {
        FlagDiacriticOperation {
            operation,
            feature,
            value,
        }
    }

    fn arc() -> SymbolTransition {
        SymbolTransition::new(Some(7), Some(0), Some(0.5))
    }

    fn node_with_flags(flags: FlagDiacriticState) -> TreeNode {
        TreeNode {
            string: vec![],
            input_state: 0,
            mutator_state: 0,
            lexicon_state: 0,
            flag_state: flags,
            weight: 0.0,
        }
    }

    #[test]
    fn positive_and_negative_set() {
        let pool = pool();
        let node = node_with_flags(vec![0, 0]);

        let set = node
            .apply_operation(&pool, &op(FlagDiacriticOperator::PositiveSet, 0, 3), &arc())
            .unwrap();
        assert_eq!(set.flag_state, vec![3, 0]);

        let negated = node
            .apply_operation(&pool, &op(FlagDiacriticOperator::NegativeSet, 1, 2), &arc())
            .unwrap();
        assert_eq!(negated.flag_state, vec![0, -2]);

        // the source node is untouched
        assert_eq!(node.flag_state, vec![0, 0]);
    }

    #[test]
    fn require() {
        let pool = pool();
        let unset = node_with_flags(vec![0]);
        let set = node_with_flags(vec![2]);

        let plain = op(FlagDiacriticOperator::Require, 0, 0);
        assert!(unset.apply_operation(&pool, &plain, &arc()).is_none());
        assert!(set.apply_operation(&pool, &plain, &arc()).is_some());

        let valued = op(FlagDiacriticOperator::Require, 0, 2);
        assert!(set.apply_operation(&pool, &valued, &arc()).is_some());
        let other = node_with_flags(vec![1]);
        assert!(other.apply_operation(&pool, &valued, &arc()).is_none());
    }

    #[test]
    fn disallow() {
        let pool = pool();
        let unset = node_with_flags(vec![0]);
        let set = node_with_flags(vec![2]);

        let plain = op(FlagDiacriticOperator::Disallow, 0, 0);
        assert!(unset.apply_operation(&pool, &plain, &arc()).is_some());
        assert!(set.apply_operation(&pool, &plain, &arc()).is_none());

        let valued = op(FlagDiacriticOperator::Disallow, 0, 2);
        assert!(set.apply_operation(&pool, &valued, &arc()).is_none());
        let other = node_with_flags(vec![1]);
        assert!(other.apply_operation(&pool, &valued, &arc()).is_some());
    }

    #[test]
    fn clear() {
        let pool = pool();
        let set = node_with_flags(vec![5]);
        let cleared = set
            .apply_operation(&pool, &op(FlagDiacriticOperator::Clear, 0, 0), &arc())
            .unwrap();
        assert_eq!(cleared.flag_state, vec![0]);
    }

    #[test]
    fn unification_tri_state() {
        let pool = pool();
        let unify = op(FlagDiacriticOperator::Unification, 0, 2);

        // unset unifies and sets
        let unset = node_with_flags(vec![0]);
        let unified = unset.apply_operation(&pool, &unify, &arc()).unwrap();
        assert_eq!(unified.flag_state, vec![2]);

        // already this value unifies
        assert!(node_with_flags(vec![2])
            .apply_operation(&pool, &unify, &arc())
            .is_some());

        // positively set to another value is blocked
        assert!(node_with_flags(vec![1])
            .apply_operation(&pool, &unify, &arc())
            .is_none());

        // negatively set to another value unifies
        let negated = node_with_flags(vec![-1]);
        let unified = negated.apply_operation(&pool, &unify, &arc()).unwrap();
        assert_eq!(unified.flag_state, vec![2]);

        // negatively set to this very value is blocked
        assert!(node_with_flags(vec![-2])
            .apply_operation(&pool, &unify, &arc())
            .is_none());
    }

    #[test]
    fn update_accumulates_weight_and_output() {
        let pool = pool();
        let root = node_with_flags(vec![0]);

        let step = root.update(&pool, 4, Some(1), 9, 11, 1.5);
        assert_eq!(step.string, vec![4]);
        assert_eq!(step.input_state, 1);
        assert_eq!(step.mutator_state, 9);
        assert_eq!(step.lexicon_state, 11);
        assert_eq!(step.weight, 1.5);

        // epsilon output is not recorded
        let quiet = step.update(&pool, 0, None, 9, 12, 0.25);
        assert_eq!(quiet.string, vec![4]);
        assert_eq!(quiet.input_state, 1);
        assert_eq!(quiet.weight, 1.75);
    }
}
