use crate::types::GameError;
use rand::seq::IteratorRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Per-session draw state for one colour of cards: the catalog subset
/// selected for the chosen packs, split into drawn and remaining.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardPool {
    drawn: BTreeSet<usize>,
    remaining: BTreeSet<usize>,
}

impl CardPool {
    pub fn new(indices: BTreeSet<usize>) -> Self {
        Self {
            drawn: BTreeSet::new(),
            remaining: indices,
        }
    }

    pub fn remaining_len(&self) -> usize {
        self.remaining.len()
    }

    pub fn drawn(&self) -> &BTreeSet<usize> {
        &self.drawn
    }

    pub fn remaining(&self) -> &BTreeSet<usize> {
        &self.remaining
    }

    /// Draw up to `n` distinct cards uniformly without replacement. The
    /// sole source of dealing randomness: hands, prompts, decoys and
    /// replenishment all go through here.
    ///
    /// `less_ok = false` demands the full `n`; `empty_ok = true` permits
    /// drawing from (and into) an empty pool near game end.
    pub fn take(
        &mut self,
        rng: &mut impl Rng,
        n: usize,
        empty_ok: bool,
        less_ok: bool,
    ) -> Result<BTreeSet<usize>, GameError> {
        if !less_ok && self.remaining.len() < n {
            return Err(GameError::OutOfCards("not enough"));
        }
        if self.remaining.is_empty() && !empty_ok {
            return Err(GameError::OutOfCards("empty"));
        }
        let taken: BTreeSet<usize> = self
            .remaining
            .iter()
            .copied()
            .choose_multiple(rng, n)
            .into_iter()
            .collect();
        for idx in &taken {
            self.remaining.remove(idx);
        }
        self.drawn.extend(taken.iter().copied());
        Ok(taken)
    }
}
