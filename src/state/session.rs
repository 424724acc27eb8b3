use super::pool::CardPool;
use super::round::{Round, RoundSummary};
use super::view::SessionView;
use super::Registry;
use crate::catalog::CardCatalog;
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// One game's full mutable state. Only ever mutated through
/// `Registry::mutate`, which owns atomicity and the tick bump.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub(crate) opts: SessionOptions,
    pub(crate) prompts: CardPool,
    pub(crate) responses: CardPool,
    /// Join order; drives judge rotation
    pub(crate) players: Vec<PlayerName>,
    /// Hands and points outlive a leave, so a returning player picks up
    /// where they left off
    pub(crate) hands: HashMap<PlayerName, BTreeSet<usize>>,
    pub(crate) points: HashMap<PlayerName, u32>,
    /// Seat of the previous round's judge (czar mode)
    pub(crate) judge_seat: Option<usize>,
    pub(crate) round: Option<Round>,
    /// Resolved round kept around for the lobby view
    pub(crate) last_round: Option<RoundSummary>,
    pub(crate) msg: Option<String>,
    pub(crate) tick: u64,
}

impl Session {
    pub fn new(catalog: &CardCatalog, opts: SessionOptions) -> Self {
        let (black, white) = catalog.select_playable(&opts.packs);
        Self {
            prompts: CardPool::new(black),
            responses: CardPool::new(white),
            opts,
            players: Vec::new(),
            hands: HashMap::new(),
            points: HashMap::new(),
            judge_seat: None,
            round: None,
            last_round: None,
            msg: None,
            tick: 0,
        }
    }

    pub fn in_round(&self) -> bool {
        self.round.is_some()
    }

    pub fn is_seated(&self, name: &str) -> bool {
        self.players.iter().any(|p| p == name)
    }

    /// A returning player: their hand or score is still on file.
    fn is_known(&self, name: &str) -> bool {
        self.hands.contains_key(name) || self.points.contains_key(name)
    }

    pub fn points_of(&self, name: &str) -> u32 {
        self.points.get(name).copied().unwrap_or(0)
    }

    /// Monotonic version counter, floored to wall-clock seconds so it
    /// also advances between mutation batches.
    pub(crate) fn bump_tick(&mut self) {
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        self.tick = (self.tick + 1).max(now);
    }

    /// Seat a player. New players get a full hand; known returning ones
    /// keep their stored hand and score and draw nothing.
    pub(crate) fn admit(&mut self, name: &str) -> Result<(), GameError> {
        if self.in_round() {
            return Err(GameError::InProgress);
        }
        if !self.is_known(name) {
            let hand = self
                .responses
                .take(&mut rand::rng(), self.opts.hand_size, false, false)?;
            self.hands.insert(name.to_string(), hand);
        }
        self.players.push(name.to_string());
        Ok(())
    }

    /// Unseat a player, keeping hand and points on file for a rejoin.
    pub(crate) fn dismiss(&mut self, name: &str) -> Result<(), GameError> {
        if self.in_round() {
            return Err(GameError::InProgress);
        }
        let seat = self
            .players
            .iter()
            .position(|p| p == name)
            .ok_or(GameError::InvalidParam("name"))?;
        self.players.remove(seat);
        // rotation continues from the same seat
        self.judge_seat = match self.judge_seat {
            Some(j) if seat <= j => j.checked_sub(1),
            other => other,
        };
        Ok(())
    }
}

impl Registry {
    /// Create-or-join. Creates the session on first reference using
    /// `opts`; later joins ignore them. Joining mid-round is rejected so
    /// hand and answer bookkeeping stay consistent.
    pub async fn join(
        &self,
        game: &str,
        name: &str,
        opts: Option<SessionOptions>,
    ) -> Result<SessionView, GameError> {
        if !valid_ident(game) {
            return Err(GameError::InvalidParam("game"));
        }
        if !valid_ident(name) {
            return Err(GameError::InvalidParam("name"));
        }
        let cell = self.session_or_create(game, opts).await;
        let mut session = cell.lock().await;
        if session.is_seated(name) {
            // already at the table; plain re-render, no state change
            return Ok(SessionView::render(&session, self.catalog(), Some(name)));
        }
        let mut draft = session.clone();
        draft.bump_tick();
        draft.admit(name)?;
        *session = draft;
        tracing::debug!("{} joined game {}", name, game);
        Ok(SessionView::render(&session, self.catalog(), Some(name)))
    }

    /// Remove a player from the table. Their hand and score stay on file.
    pub async fn leave(&self, game: &str, name: &str) -> Result<SessionView, GameError> {
        if !valid_ident(name) {
            return Err(GameError::InvalidParam("name"));
        }
        let view = self
            .mutate(game, |session| {
                session.dismiss(name)?;
                Ok(SessionView::render(session, self.catalog(), None))
            })
            .await?;
        tracing::debug!("{} left game {}", name, game);
        Ok(view)
    }
}
