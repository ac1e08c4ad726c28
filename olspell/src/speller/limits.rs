//! Weight-limit bookkeeping for the correction search.

use crate::types::Weight;

use super::SpellerConfig;

/// Ordered list of the weights of the best results found so far, capped at
/// the n-best count. Kept sorted ascending: the front is the lowest weight,
/// the back the highest.
#[derive(Debug, Default, Clone)]
pub(crate) struct WeightQueue {
    weights: Vec<Weight>,
}

impl WeightQueue {
    pub fn push(&mut self, weight: Weight) {
        let at = self
            .weights
            .iter()
            .position(|w| *w > weight)
            .unwrap_or(self.weights.len());
        self.weights.insert(at, weight);
    }

    /// Drops the highest weight.
    pub fn pop(&mut self) {
        self.weights.pop();
    }

    pub fn get_lowest(&self) -> Weight {
        self.weights.first().copied().unwrap_or(Weight::MAX)
    }

    pub fn get_highest(&self) -> Weight {
        self.weights.last().copied().unwrap_or(Weight::MAX)
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }
}

/// Which pruning axes are active, selected once per call from the presence
/// of the three user parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LimitingBehaviour {
    None,
    MaxWeight,
    Nbest,
    Beam,
    MaxWeightNbest,
    MaxWeightBeam,
    NbestBeam,
    MaxWeightNbestBeam,
}

/// The current weight ceiling of a search, tightened as results accumulate.
#[derive(Debug, Clone)]
pub(crate) struct Limiter {
    limiting: LimitingBehaviour,
    limit: Weight,
    best_suggestion: Weight,
    nbest_queue: WeightQueue,
    n_best: Option<usize>,
    beam: Option<Weight>,
}

impl Limiter {
    pub fn new(config: &SpellerConfig) -> Limiter {
        let limiting = match (
            config.max_weight.is_some(),
            config.n_best.is_some(),
            config.beam.is_some(),
        ) {
            (false, false, false) => LimitingBehaviour::None,
            (true, false, false) => LimitingBehaviour::MaxWeight,
            (false, true, false) => LimitingBehaviour::Nbest,
            (false, false, true) => LimitingBehaviour::Beam,
            (true, true, false) => LimitingBehaviour::MaxWeightNbest,
            (true, false, true) => LimitingBehaviour::MaxWeightBeam,
            (false, true, true) => LimitingBehaviour::NbestBeam,
            (true, true, true) => LimitingBehaviour::MaxWeightNbestBeam,
        };

        Limiter {
            limiting,
            limit: config.max_weight.unwrap_or(Weight::MAX),
            best_suggestion: Weight::MAX,
            nbest_queue: WeightQueue::default(),
            n_best: config.n_best,
            beam: config.beam,
        }
    }

    /// A limiter that never prunes, for cache construction and checking.
    pub fn unlimited() -> Limiter {
        Limiter {
            limiting: LimitingBehaviour::None,
            limit: Weight::MAX,
            best_suggestion: Weight::MAX,
            nbest_queue: WeightQueue::default(),
            n_best: None,
            beam: None,
        }
    }

    pub fn limit(&self) -> Weight {
        self.limit
    }

    /// Whether a path of weight `w` may still lead to an acceptable result.
    ///
    /// Under pure n-best limiting the comparison is strict, which keeps the
    /// bounded frontier from stalling on ties.
    #[inline(always)]
    pub fn is_under_weight_limit(&self, w: Weight) -> bool {
        if self.limiting == LimitingBehaviour::Nbest {
            return w < self.limit;
        }
        w <= self.limit
    }

    /// Records a completed result of weight `w`.
    pub fn record(&mut self, w: Weight) {
        if w < self.best_suggestion {
            self.best_suggestion = w;
        }
        if let Some(n_best) = self.n_best {
            self.nbest_queue.push(w);
            if self.nbest_queue.len() > n_best {
                self.nbest_queue.pop();
            }
        }
    }

    /// Recomputes the weight ceiling from the results recorded so far.
    pub fn adjust_weight_limits(&mut self) {
        use LimitingBehaviour::*;

        let n_best = self.n_best.unwrap_or(0);
        let beam = self.beam.unwrap_or(0.0);

        match self.limiting {
            None | MaxWeight => {}
            Nbest => {
                if self.nbest_queue.len() >= n_best {
                    self.limit = self.nbest_queue.get_highest();
                }
            }
            MaxWeightNbest => {
                if self.nbest_queue.len() >= n_best {
                    self.limit = self.limit.min(self.nbest_queue.get_lowest());
                }
            }
            Beam => {
                if self.best_suggestion < Weight::MAX {
                    self.limit = self.best_suggestion + beam;
                }
            }
            NbestBeam => {
                if self.best_suggestion < Weight::MAX {
                    self.limit = if self.nbest_queue.len() >= n_best {
                        (self.best_suggestion + beam).min(self.nbest_queue.get_lowest())
                    } else {
                        self.best_suggestion + beam
                    };
                }
            }
            MaxWeightBeam => {
                if self.best_suggestion < Weight::MAX {
                    self.limit = self.limit.min(self.best_suggestion + beam);
                }
            }
            MaxWeightNbestBeam => {
                if self.best_suggestion < Weight::MAX {
                    self.limit = self.limit.min(self.best_suggestion + beam);
                }
                if self.nbest_queue.len() >= n_best {
                    self.limit = self.limit.min(self.nbest_queue.get_lowest());
                }
            }
        }
    }
}
