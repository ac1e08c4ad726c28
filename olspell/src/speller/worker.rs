//! Depth-first search over the mutator×lexicon product.

use std::time::Instant;

use hashbrown::HashMap;
use lifeguard::{Pool, Recycled};
use smol_str::SmolStr;

use super::limits::Limiter;
use super::suggestion::{Suggestion, SymbolsAnalysis};
use super::{CacheContainer, Mode, SpellerConfig};
use crate::transducer::tree_node::TreeNode;
use crate::transducer::Transducer;
use crate::types::{SymbolNumber, TransitionTableIndex, Weight};

/// How many nodes are expanded between wall-clock samples.
const CLOCK_POLL_INTERVAL: u64 = 1_000_000;

/// One traversal over the automata: the work stack, pruning state and
/// wall-clock bookkeeping of a single `check`/`suggest`/`analyse` call.
pub(crate) struct SpellerWorker<'a> {
    mutator: Option<&'a Transducer>,
    lexicon: &'a Transducer,
    alphabet_translator: &'a [SymbolNumber],
    input: &'a [SymbolNumber],
    mode: Mode,
    config: &'a SpellerConfig,
    limiter: Limiter,
    start_clock: Instant,
    call_counter: u64,
    limit_reached: bool,
}

impl<'a> SpellerWorker<'a> {
    pub(crate) fn new(
        mutator: Option<&'a Transducer>,
        lexicon: &'a Transducer,
        alphabet_translator: &'a [SymbolNumber],
        input: &'a [SymbolNumber],
        mode: Mode,
        config: &'a SpellerConfig,
    ) -> SpellerWorker<'a> {
        SpellerWorker {
            mutator,
            lexicon,
            alphabet_translator,
            input,
            mode,
            config,
            limiter: Limiter::unlimited(),
            start_clock: Instant::now(),
            call_counter: 0,
            limit_reached: false,
        }
    }

    #[inline(always)]
    fn state_size(&self) -> usize {
        self.lexicon.alphabet().state_size() as usize
    }

    fn start_node<'p>(&self, pool: &'p Pool<TreeNode>) -> Vec<Recycled<'p, TreeNode>> {
        let mut nodes = Vec::with_capacity(256);
        nodes.push(TreeNode::empty(pool, vec![0; self.state_size()]));
        nodes
    }

    /// Polls the wall clock every [`CLOCK_POLL_INTERVAL`] expansions. Once
    /// the cutoff is overrun the search stays aborted.
    #[inline(always)]
    fn check_time_cutoff(&mut self) -> bool {
        let max_time = match self.config.time_cutoff {
            Some(t) => t,
            None => return false,
        };

        if self.limit_reached {
            return true;
        }
        self.call_counter += 1;
        if self.call_counter % CLOCK_POLL_INTERVAL == 0
            && self.start_clock.elapsed().as_secs_f32() > max_time
        {
            self.limit_reached = true;
            return true;
        }
        false
    }

    /// Expands epsilon- and flag-input transitions of the lexicon.
    fn lexicon_epsilons<'p>(
        &self,
        pool: &'p Pool<TreeNode>,
        next_node: &TreeNode,
        output_nodes: &mut Vec<Recycled<'p, TreeNode>>,
    ) {
        let lexicon = self.lexicon;

        if !lexicon.has_epsilons_or_flags(next_node.lexicon_state + 1) {
            return;
        }

        let mut next = match lexicon.next(next_node.lexicon_state, 0) {
            Some(next) => next,
            None => return,
        };

        while let Some(transition) = lexicon.take_epsilons_and_flags(next) {
            if let Some(input_sym) = lexicon.transition_input_symbol(next) {
                let transition_weight = transition.weight().unwrap();

                if self
                    .limiter
                    .is_under_weight_limit(next_node.weight + transition_weight)
                {
                    if input_sym == 0 {
                        // in correction mode lexicon epsilon output is
                        // suppressed; lookup emits the analysis tape
                        let new_node = if self.mode == Mode::Correct {
                            next_node.update_lexicon(pool, transition.clone_with_epsilon_symbol())
                        } else {
                            next_node.update_lexicon(pool, transition)
                        };
                        output_nodes.push(new_node);
                    } else if let Some(op) = lexicon.alphabet().operations().get(&input_sym) {
                        if let Some(applied_node) = next_node.apply_operation(pool, op, &transition)
                        {
                            output_nodes.push(applied_node);
                        }
                    }
                }
            }

            next += 1;
        }
    }

    /// Expands epsilon-input transitions of the mutator, fanning their
    /// outputs out against the lexicon.
    fn mutator_epsilons<'p>(
        &self,
        pool: &'p Pool<TreeNode>,
        next_node: &TreeNode,
        output_nodes: &mut Vec<Recycled<'p, TreeNode>>,
    ) {
        let mutator = match self.mutator {
            Some(mutator) => mutator,
            None => return,
        };
        let lexicon = self.lexicon;

        if !mutator.has_transitions(next_node.mutator_state + 1, Some(0)) {
            return;
        }

        let mut next_m = match mutator.next(next_node.mutator_state, 0) {
            Some(next) => next,
            None => return,
        };

        while let Some(transition) = mutator.take_epsilons(next_m) {
            if let Some(0) = transition.symbol() {
                if self
                    .limiter
                    .is_under_weight_limit(next_node.weight + transition.weight().unwrap())
                {
                    output_nodes.push(next_node.update_mutator(pool, transition));
                }
                next_m += 1;
                continue;
            }

            if let Some(sym) = transition.symbol() {
                let trans_sym = self.alphabet_translator[sym as usize];

                if !lexicon.has_transitions(next_node.lexicon_state + 1, Some(trans_sym)) {
                    if trans_sym >= lexicon.alphabet().initial_symbol_count() {
                        // not in the lexicon's own alphabet, so the
                        // unknown and identity arcs may still apply
                        if lexicon
                            .has_transitions(next_node.lexicon_state + 1, lexicon.alphabet().unknown())
                        {
                            self.queue_lexicon_arcs(
                                pool,
                                next_node,
                                lexicon.alphabet().unknown().unwrap(),
                                transition.target().unwrap(),
                                transition.weight().unwrap(),
                                0,
                                output_nodes,
                            );
                        }
                        if lexicon
                            .has_transitions(next_node.lexicon_state + 1, lexicon.alphabet().identity())
                        {
                            self.queue_lexicon_arcs(
                                pool,
                                next_node,
                                lexicon.alphabet().identity().unwrap(),
                                transition.target().unwrap(),
                                transition.weight().unwrap(),
                                0,
                                output_nodes,
                            );
                        }
                    }
                    next_m += 1;
                    continue;
                }

                self.queue_lexicon_arcs(
                    pool,
                    next_node,
                    trans_sym,
                    transition.target().unwrap(),
                    transition.weight().unwrap(),
                    0,
                    output_nodes,
                );
            }

            next_m += 1;
        }
    }

    /// Consumes `input_sym` against the lexicon, carrying over a weight
    /// already paid in the mutator.
    #[allow(clippy::too_many_arguments)]
    fn queue_lexicon_arcs<'p>(
        &self,
        pool: &'p Pool<TreeNode>,
        next_node: &TreeNode,
        input_sym: SymbolNumber,
        mutator_state: TransitionTableIndex,
        mutator_weight: Weight,
        input_increment: u32,
        output_nodes: &mut Vec<Recycled<'p, TreeNode>>,
    ) {
        let lexicon = self.lexicon;
        let identity = lexicon.alphabet().identity();

        let mut next = match lexicon.next(next_node.lexicon_state, input_sym) {
            Some(next) => next,
            None => return,
        };

        while let Some(noneps_trans) = lexicon.take_non_epsilons(next, input_sym) {
            if let Some(mut sym) = noneps_trans.symbol() {
                if identity == Some(sym) {
                    // the identity arc stands for the actual input symbol
                    if let Some(cur) = self.input.get(next_node.input_state as usize) {
                        sym = *cur;
                    }
                }

                let weight = noneps_trans.weight().unwrap() + mutator_weight;

                if self
                    .limiter
                    .is_under_weight_limit(next_node.weight + weight)
                {
                    let emitted = if self.mode == Mode::Correct {
                        input_sym
                    } else {
                        sym
                    };
                    output_nodes.push(next_node.update(
                        pool,
                        emitted,
                        Some(next_node.input_state + input_increment),
                        mutator_state,
                        noneps_trans.target().unwrap(),
                        weight,
                    ));
                }
            }

            next += 1;
        }
    }

    /// Consumes `input_sym` against the mutator and fans the emitted
    /// symbols out against the lexicon.
    fn queue_mutator_arcs<'p>(
        &self,
        pool: &'p Pool<TreeNode>,
        next_node: &TreeNode,
        input_sym: SymbolNumber,
        output_nodes: &mut Vec<Recycled<'p, TreeNode>>,
    ) {
        let mutator = match self.mutator {
            Some(mutator) => mutator,
            None => return,
        };
        let lexicon = self.lexicon;

        let mut next_m = match mutator.next(next_node.mutator_state, input_sym) {
            Some(next) => next,
            None => return,
        };

        while let Some(transition) = mutator.take_non_epsilons(next_m, input_sym) {
            if let Some(0) = transition.symbol() {
                let transition_weight = transition.weight().unwrap();
                if self
                    .limiter
                    .is_under_weight_limit(next_node.weight + transition_weight)
                {
                    output_nodes.push(next_node.update(
                        pool,
                        0,
                        Some(next_node.input_state + 1),
                        transition.target().unwrap(),
                        next_node.lexicon_state,
                        transition_weight,
                    ));
                }
                next_m += 1;
                continue;
            }

            if let Some(sym) = transition.symbol() {
                let trans_sym = self.alphabet_translator[sym as usize];

                if !lexicon.has_transitions(next_node.lexicon_state + 1, Some(trans_sym)) {
                    if trans_sym >= lexicon.alphabet().initial_symbol_count() {
                        if lexicon
                            .has_transitions(next_node.lexicon_state + 1, lexicon.alphabet().unknown())
                        {
                            self.queue_lexicon_arcs(
                                pool,
                                next_node,
                                lexicon.alphabet().unknown().unwrap(),
                                transition.target().unwrap(),
                                transition.weight().unwrap(),
                                1,
                                output_nodes,
                            );
                        }
                        if lexicon
                            .has_transitions(next_node.lexicon_state + 1, lexicon.alphabet().identity())
                        {
                            self.queue_lexicon_arcs(
                                pool,
                                next_node,
                                lexicon.alphabet().identity().unwrap(),
                                transition.target().unwrap(),
                                transition.weight().unwrap(),
                                1,
                                output_nodes,
                            );
                        }
                    }
                    next_m += 1;
                    continue;
                }

                self.queue_lexicon_arcs(
                    pool,
                    next_node,
                    trans_sym,
                    transition.target().unwrap(),
                    transition.weight().unwrap(),
                    1,
                    output_nodes,
                );
            }

            next_m += 1;
        }
    }

    /// Consumes the next input symbol against the mutator, falling back to
    /// its unknown/identity arcs for symbols outside its original alphabet.
    fn consume_input<'p>(
        &self,
        pool: &'p Pool<TreeNode>,
        next_node: &TreeNode,
        output_nodes: &mut Vec<Recycled<'p, TreeNode>>,
    ) {
        let mutator = match self.mutator {
            Some(mutator) => mutator,
            None => return,
        };
        let input_state = next_node.input_state as usize;

        if input_state >= self.input.len() {
            return;
        }

        let input_sym = self.input[input_state];

        if !mutator.has_transitions(next_node.mutator_state + 1, Some(input_sym)) {
            if input_sym >= mutator.alphabet().initial_symbol_count() {
                if mutator
                    .has_transitions(next_node.mutator_state + 1, mutator.alphabet().identity())
                {
                    self.queue_mutator_arcs(
                        pool,
                        next_node,
                        mutator.alphabet().identity().unwrap(),
                        output_nodes,
                    );
                }
                if mutator
                    .has_transitions(next_node.mutator_state + 1, mutator.alphabet().unknown())
                {
                    self.queue_mutator_arcs(
                        pool,
                        next_node,
                        mutator.alphabet().unknown().unwrap(),
                        output_nodes,
                    );
                }
            }
        } else {
            self.queue_mutator_arcs(pool, next_node, input_sym, output_nodes);
        }
    }

    /// Consumes the next input symbol against the lexicon alone.
    fn lexicon_consume<'p>(
        &self,
        pool: &'p Pool<TreeNode>,
        next_node: &TreeNode,
        output_nodes: &mut Vec<Recycled<'p, TreeNode>>,
    ) {
        let lexicon = self.lexicon;
        let input_state = next_node.input_state as usize;

        if input_state >= self.input.len() {
            return;
        }

        // input symbols are in the mutator's numbering unless the lexicon
        // tokenised them itself
        let this_input = if self.mutator.is_some() && self.mode != Mode::Check {
            self.alphabet_translator[self.input[input_state] as usize]
        } else {
            self.input[input_state]
        };
        let next_lexicon_state = next_node.lexicon_state + 1;

        if !lexicon.has_transitions(next_lexicon_state, Some(this_input)) {
            if this_input >= lexicon.alphabet().initial_symbol_count() {
                if lexicon.has_transitions(next_lexicon_state, lexicon.alphabet().unknown()) {
                    self.queue_lexicon_arcs(
                        pool,
                        next_node,
                        lexicon.alphabet().unknown().unwrap(),
                        next_node.mutator_state,
                        0.0,
                        1,
                        output_nodes,
                    );
                }
                if lexicon.has_transitions(next_lexicon_state, lexicon.alphabet().identity()) {
                    self.queue_lexicon_arcs(
                        pool,
                        next_node,
                        lexicon.alphabet().identity().unwrap(),
                        next_node.mutator_state,
                        0.0,
                        1,
                        output_nodes,
                    );
                }
            }
            return;
        }

        self.queue_lexicon_arcs(
            pool,
            next_node,
            this_input,
            next_node.mutator_state,
            0.0,
            1,
            output_nodes,
        );
    }

    /// Whether the lexicon alone accepts the input.
    pub(crate) fn is_correct(&mut self) -> bool {
        self.limiter = Limiter::unlimited();
        let pool = Pool::with_size_and_max(0, 0);
        let mut nodes = self.start_node(&pool);

        while let Some(next_node) = nodes.pop() {
            if next_node.input_state as usize == self.input.len()
                && self.lexicon.is_final(next_node.lexicon_state)
            {
                return true;
            }

            self.lexicon_epsilons(&pool, &next_node, &mut nodes);
            self.lexicon_consume(&pool, &next_node, &mut nodes);
        }

        false
    }

    /// All accepted output paths of the lexicon for the input, deduplicated
    /// to their lowest weight.
    fn lookup_paths(&mut self) -> HashMap<Vec<SymbolNumber>, Weight> {
        self.limiter = Limiter::unlimited();
        let pool = Pool::with_size_and_max(self.config.node_pool_size, self.config.node_pool_size);
        let mut nodes = self.start_node(&pool);
        let mut outputs: HashMap<Vec<SymbolNumber>, Weight> = HashMap::new();

        while let Some(next_node) = nodes.pop() {
            if next_node.input_state as usize == self.input.len()
                && self.lexicon.is_final(next_node.lexicon_state)
            {
                let weight = next_node.weight
                    + self
                        .lexicon
                        .final_weight(next_node.lexicon_state)
                        .unwrap();

                let entry = outputs
                    .entry(next_node.string.clone())
                    .or_insert(Weight::MAX);
                if *entry > weight {
                    *entry = weight;
                }
            }

            self.lexicon_epsilons(&pool, &next_node, &mut nodes);
            self.lexicon_consume(&pool, &next_node, &mut nodes);
        }

        outputs
    }

    /// Morphological analyses of the input, ascending by weight.
    pub(crate) fn analyze(&mut self) -> Vec<Suggestion> {
        log::trace!("Beginning analyze");
        let mut best: HashMap<SmolStr, Weight> = HashMap::new();

        for (symbols, weight) in self.lookup_paths() {
            let string = self.lexicon.alphabet().string_from_symbols(&symbols);
            let entry = best.entry(string).or_insert(Weight::MAX);
            if *entry > weight {
                *entry = weight;
            }
        }

        let mut analyses: Vec<Suggestion> = best
            .into_iter()
            .map(|(value, weight)| Suggestion::new(value, weight))
            .collect();
        analyses.sort();
        if let Some(n_best) = self.config.n_best {
            analyses.truncate(n_best);
        }
        analyses
    }

    /// Like [`analyze`](Self::analyze), but with the output symbols kept
    /// separate.
    pub(crate) fn analyze_symbols(&mut self) -> Vec<SymbolsAnalysis> {
        log::trace!("Beginning analyze_symbols");
        let mut analyses: Vec<SymbolsAnalysis> = self
            .lookup_paths()
            .into_iter()
            .map(|(symbols, weight)| {
                SymbolsAnalysis::new(
                    self.lexicon.alphabet().strings_from_symbols(&symbols),
                    weight,
                )
            })
            .collect();
        analyses.sort();
        if let Some(n_best) = self.config.n_best {
            analyses.truncate(n_best);
        }
        analyses
    }

    /// Precomputes the search frontier and complete results for inputs that
    /// start with `first_sym` and are at most one symbol long.
    pub(crate) fn build_cache(&mut self, first_sym: SymbolNumber) -> CacheContainer {
        let mutator = match self.mutator {
            Some(mutator) => mutator,
            None => return CacheContainer::default(),
        };

        self.limiter = Limiter::unlimited();
        let pool = Pool::with_size_and_max(self.config.node_pool_size, self.config.node_pool_size);
        let mut nodes = self.start_node(&pool);

        let mut corrections_len_0: HashMap<SmolStr, Weight> = HashMap::new();
        let mut corrections_len_1: HashMap<SmolStr, Weight> = HashMap::new();
        let mut cached_nodes: Vec<TreeNode> = vec![];

        while let Some(next_node) = nodes.pop() {
            self.lexicon_epsilons(&pool, &next_node, &mut nodes);
            self.mutator_epsilons(&pool, &next_node, &mut nodes);

            if mutator.is_final(next_node.mutator_state)
                && self.lexicon.is_final(next_node.lexicon_state)
            {
                let weight = next_node.weight
                    + self
                        .lexicon
                        .final_weight(next_node.lexicon_state)
                        .unwrap()
                    + mutator.final_weight(next_node.mutator_state).unwrap();
                let string = self
                    .lexicon
                    .alphabet()
                    .string_from_symbols(&next_node.string);

                let corrections = if next_node.input_state == 0 {
                    &mut corrections_len_0
                } else {
                    &mut corrections_len_1
                };
                let entry = corrections.entry(string).or_insert(Weight::MAX);
                if *entry > weight {
                    *entry = weight;
                }
            }

            if next_node.input_state == 1 {
                cached_nodes.push((*next_node).clone());
            }
            if first_sym > 0 && next_node.input_state == 0 {
                self.consume_input(&pool, &next_node, &mut nodes);
            }
        }

        let collect = |map: HashMap<SmolStr, Weight>| {
            let mut results: Vec<Suggestion> = map
                .into_iter()
                .map(|(value, weight)| Suggestion::new(value, weight))
                .collect();
            results.sort();
            results
        };

        CacheContainer {
            nodes: cached_nodes,
            results_len_0: collect(corrections_len_0),
            results_len_1: collect(corrections_len_1),
            empty: false,
        }
    }

    /// Applies the configured limits to precomputed cache results.
    pub(crate) fn corrections_from_cache(&mut self, results: &[Suggestion]) -> Vec<Suggestion> {
        self.limiter = Limiter::new(self.config);
        for suggestion in results {
            self.limiter.record(suggestion.weight);
        }
        self.finish_corrections(results.to_vec())
    }

    /// Runs the correction search from the cached depth-one frontier.
    pub(crate) fn correct(&mut self, seed: &[TreeNode]) -> Vec<Suggestion> {
        log::trace!("Beginning correct, {} seed nodes", seed.len());

        let mutator = match self.mutator {
            Some(mutator) => mutator,
            None => return vec![],
        };

        self.limiter = Limiter::new(self.config);
        self.start_clock = Instant::now();
        self.call_counter = 0;
        self.limit_reached = false;

        let pool = Pool::with_size_and_max(self.config.node_pool_size, self.config.node_pool_size);
        let mut nodes: Vec<Recycled<TreeNode>> =
            seed.iter().map(|node| pool.attach(node.clone())).collect();
        let mut corrections: HashMap<SmolStr, Weight> = HashMap::new();

        while let Some(next_node) = nodes.pop() {
            if self.check_time_cutoff() {
                log::warn!(
                    "time cutoff overrun after {} iterations, returning partial results",
                    self.call_counter
                );
                break;
            }

            self.limiter.adjust_weight_limits();
            if !self.limiter.is_under_weight_limit(next_node.weight) {
                continue;
            }

            if next_node.input_state > 1 {
                // depth zero and one were expanded when the cache for this
                // first symbol was built
                self.lexicon_epsilons(&pool, &next_node, &mut nodes);
                self.mutator_epsilons(&pool, &next_node, &mut nodes);
            }

            if next_node.input_state as usize != self.input.len() {
                self.consume_input(&pool, &next_node, &mut nodes);
                continue;
            }

            if !mutator.is_final(next_node.mutator_state)
                || !self.lexicon.is_final(next_node.lexicon_state)
            {
                continue;
            }

            let weight = next_node.weight
                + self
                    .lexicon
                    .final_weight(next_node.lexicon_state)
                    .unwrap()
                + mutator.final_weight(next_node.mutator_state).unwrap();

            if weight > self.limiter.limit() {
                continue;
            }

            let string = self
                .lexicon
                .alphabet()
                .string_from_symbols(&next_node.string);

            let entry = corrections.entry(string).or_insert(Weight::MAX);
            if *entry > weight {
                *entry = weight;
                self.limiter.record(weight);
            }
        }

        let suggestions = corrections
            .into_iter()
            .map(|(value, weight)| Suggestion::new(value, weight))
            .collect();
        self.finish_corrections(suggestions)
    }

    fn finish_corrections(&mut self, mut suggestions: Vec<Suggestion>) -> Vec<Suggestion> {
        self.limiter.adjust_weight_limits();
        let limit = self.limiter.limit();

        suggestions.sort();
        suggestions.retain(|s| s.weight <= limit);
        if let Some(n_best) = self.config.n_best {
            suggestions.truncate(n_best);
        }
        suggestions
    }
}
