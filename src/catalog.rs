use crate::types::PackName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Marker for a blank in prompt card text
pub const BLANK: &str = "____";

/// One card: immutable text plus the packs it ships in. Referenced
/// everywhere else by catalog index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub text: String,
    pub packs: BTreeSet<PackName>,
}

impl Card {
    pub fn new(text: impl Into<String>, packs: impl IntoIterator<Item = impl Into<PackName>>) -> Self {
        Self {
            text: text.into(),
            packs: packs.into_iter().map(Into::into).collect(),
        }
    }

    fn in_packs(&self, packs: &BTreeSet<PackName>) -> bool {
        packs.is_empty() || self.packs.iter().any(|p| packs.contains(p))
    }
}

/// Process-wide set of prompt ("black") and response ("white") cards.
/// Built once at startup by the host process and never mutated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CardCatalog {
    prompts: Vec<Card>,
    responses: Vec<Card>,
}

impl CardCatalog {
    pub fn new(prompts: Vec<Card>, responses: Vec<Card>) -> Self {
        Self { prompts, responses }
    }

    pub fn prompt(&self, idx: usize) -> Option<&Card> {
        self.prompts.get(idx)
    }

    pub fn response(&self, idx: usize) -> Option<&Card> {
        self.responses.get(idx)
    }

    /// Answers a prompt card asks for; a prompt with no markers still takes one.
    pub fn blanks(&self, prompt_idx: usize) -> usize {
        self.prompt(prompt_idx)
            .map(|c| c.text.matches(BLANK).count())
            .unwrap_or(0)
            .max(1)
    }

    /// Catalog indices playable with the chosen packs, prompts and
    /// responses separately. Deterministic for a fixed catalog and pack
    /// set; used once per session to seed its pools.
    pub fn select_playable(
        &self,
        packs: &BTreeSet<PackName>,
    ) -> (BTreeSet<usize>, BTreeSet<usize>) {
        let pick = |cards: &[Card]| {
            cards
                .iter()
                .enumerate()
                .filter(|(_, c)| c.in_packs(packs))
                .map(|(i, _)| i)
                .collect()
        };
        (pick(&self.prompts), pick(&self.responses))
    }
}
