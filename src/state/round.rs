use super::session::Session;
use super::view::SessionView;
use super::Registry;
use crate::catalog::CardCatalog;
use crate::types::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One player's answer for the current round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub player: PlayerName,
    pub cards: Vec<usize>,
}

/// What a ballot landed on: a player's answer or one of the decoys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ballot {
    Answer(usize),
    Decoy,
}

/// The active round: governs one prompt card from deal to resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Round {
    /// Prompt card index; also seeds the reveal shuffle
    pub prompt: usize,
    pub blanks: usize,
    /// `None` in voting mode, where no seat judges
    pub judge: Option<PlayerName>,
    /// Decoy answers drawn from the pool, identified by position only
    pub decoys: Vec<Vec<usize>>,
    /// Insertion order is the tie-break order for answer matching
    pub submissions: Vec<Submission>,
    /// Voting mode: one ballot per player
    pub votes: BTreeMap<PlayerName, Ballot>,
}

impl Round {
    pub fn submission_of(&self, name: &str) -> Option<&Submission> {
        self.submissions.iter().find(|s| s.player == name)
    }

    /// Players expected to answer: everyone but the judge.
    pub fn eligible(&self, player_count: usize) -> usize {
        match self.judge {
            Some(_) => player_count.saturating_sub(1),
            None => player_count,
        }
    }

    pub fn complete(&self, player_count: usize) -> bool {
        self.submissions.len() >= self.eligible(player_count)
    }

    /// Decoys and answers in display order. The shuffle is seeded from
    /// the prompt card so every poller recomputes the identical order and
    /// nothing has to be stored.
    pub fn reveal(&self) -> Vec<Vec<usize>> {
        let mut entries: Vec<Vec<usize>> = self
            .decoys
            .iter()
            .cloned()
            .chain(self.submissions.iter().map(|s| s.cards.clone()))
            .collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.prompt as u64);
        entries.shuffle(&mut rng);
        entries
    }
}

/// A resolved round, kept for the lobby view until the next one starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundSummary {
    pub prompt: usize,
    pub blanks: usize,
    pub answers: Vec<Vec<usize>>,
}

impl Session {
    /// Advance the judge and deal the next prompt. Fails `OutOfCards`
    /// when the prompts run dry or any seated player cannot cover the
    /// blanks; both mean the game is over.
    pub(crate) fn begin_round(&mut self, catalog: &CardCatalog) -> Result<(), GameError> {
        if self.in_round() {
            return Err(GameError::InvalidAction("round already started"));
        }
        if self.players.is_empty() {
            return Err(GameError::InvalidAction("no players"));
        }
        let mut rng = rand::rng();

        let judge = match self.opts.mode {
            JudgingMode::Czar => {
                let seat = match self.judge_seat {
                    Some(j) => (j + 1) % self.players.len(),
                    None => 0,
                };
                self.judge_seat = Some(seat);
                Some(self.players[seat].clone())
            }
            JudgingMode::Vote => None,
        };

        let prompt = self
            .prompts
            .take(&mut rng, 1, false, false)?
            .pop_first()
            .ok_or(GameError::OutOfCards("empty"))?;
        let blanks = catalog.blanks(prompt);

        let decoy_count = self.opts.decoys.min(self.responses.remaining_len() / blanks);
        let mut decoys = Vec::with_capacity(decoy_count);
        for _ in 0..decoy_count {
            let cards = self.responses.take(&mut rng, blanks, false, false)?;
            decoys.push(cards.into_iter().collect::<Vec<_>>());
        }

        // every seated player must be able to cover the blanks
        for name in &self.players {
            if self.hands.get(name).map(BTreeSet::len).unwrap_or(0) < blanks {
                return Err(GameError::OutOfCards("empty hand"));
            }
        }

        // multi-blank prompts burn cards fast; refill hands up front
        if blanks > 2 {
            for name in self.players.clone() {
                let hand = self.hands.entry(name).or_default();
                let want = self.opts.hand_size.saturating_sub(hand.len());
                if want > 0 {
                    let refill = self.responses.take(&mut rng, want, true, true)?;
                    hand.extend(refill);
                }
            }
        }

        self.msg = None;
        self.last_round = None;
        self.round = Some(Round {
            prompt,
            blanks,
            judge,
            decoys,
            submissions: Vec::new(),
            votes: BTreeMap::new(),
        });
        Ok(())
    }

    /// Play exactly one distinct card per blank, all from hand, with an
    /// optional extra discard, then refill the hand from the pool.
    pub(crate) fn play(
        &mut self,
        name: &str,
        cards: &[usize],
        discard: Option<usize>,
    ) -> Result<(), GameError> {
        if !self.is_seated(name) {
            return Err(GameError::InvalidParam("name"));
        }
        let round = self
            .round
            .as_mut()
            .ok_or(GameError::InvalidAction("no round in progress"))?;
        if round.judge.as_deref() == Some(name) {
            return Err(GameError::InvalidAction("the czar does not answer"));
        }
        if round.submission_of(name).is_some() {
            return Err(GameError::InvalidAction("already answered"));
        }

        let played: BTreeSet<usize> = cards.iter().copied().collect();
        if cards.len() != round.blanks || played.len() != round.blanks {
            return Err(GameError::InvalidParam("cards"));
        }
        let hand = self
            .hands
            .get_mut(name)
            .ok_or(GameError::InvalidParam("name"))?;
        if !played.is_subset(hand) {
            return Err(GameError::InvalidParam("cards"));
        }
        if let Some(d) = discard {
            if played.contains(&d) || !hand.contains(&d) {
                return Err(GameError::InvalidParam("discard"));
            }
        }

        for card in &played {
            hand.remove(card);
        }
        if let Some(d) = discard {
            hand.remove(&d);
        }
        let want = self.opts.hand_size.saturating_sub(hand.len());
        let refill = self.responses.take(&mut rand::rng(), want, true, true)?;
        hand.extend(refill);

        round.submissions.push(Submission {
            player: name.to_string(),
            cards: cards.to_vec(),
        });
        Ok(())
    }
}

impl Registry {
    /// LOBBY -> ROUND_ACTIVE: rotate the judge, deal a prompt and decoys.
    pub async fn start_round(&self, game: &str) -> Result<SessionView, GameError> {
        let view = self
            .mutate(game, |session| {
                session.begin_round(self.catalog())?;
                Ok(SessionView::render(session, self.catalog(), None))
            })
            .await?;
        tracing::info!("game {} started a round", game);
        Ok(view)
    }

    /// A player's answer for the active round.
    pub async fn submit(
        &self,
        game: &str,
        name: &str,
        cards: &[usize],
        discard: Option<usize>,
    ) -> Result<SessionView, GameError> {
        if !valid_ident(name) {
            return Err(GameError::InvalidParam("name"));
        }
        let view = self
            .mutate(game, |session| {
                session.play(name, cards, discard)?;
                Ok(SessionView::render(session, self.catalog(), Some(name)))
            })
            .await?;
        tracing::debug!("{} answered in game {}", name, game);
        Ok(view)
    }
}
