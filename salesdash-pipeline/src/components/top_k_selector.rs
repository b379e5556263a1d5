use crate::selector::{Ranked, Selector};

/// Selects the top K entries by their rank value.
pub struct TopKSelector {
    pub k: usize,
}

impl TopKSelector {
    pub fn new(k: usize) -> Self {
        Self { k }
    }
}

impl Default for TopKSelector {
    fn default() -> Self {
        Self {
            k: salesdash_stats::defaults::DEFAULT_TOP_K,
        }
    }
}

impl<C: Ranked> Selector<C> for TopKSelector {
    fn score(&self, candidate: &C) -> f64 {
        candidate.rank_value()
    }

    fn size(&self) -> Option<usize> {
        Some(self.k)
    }
}
