use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Opaque ID types for type safety
pub type GameId = String;
pub type PlayerName = String;
pub type PackName = String;

/// Default hand size dealt to a joining player
pub const HAND_SIZE: usize = 10;
/// Default number of decoy answers mixed into each round
pub const DECOYS: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JudgingMode {
    /// A rotating judge picks the winning answer each round
    Czar,
    /// No judge; every player casts one anonymous vote
    Vote,
}

/// Per-session settings, fixed at creation and ignored on later joins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionOptions {
    /// Card packs in play; an empty set selects the whole catalog
    pub packs: BTreeSet<PackName>,
    pub hand_size: usize,
    pub decoys: usize,
    pub mode: JudgingMode,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            packs: BTreeSet::new(),
            hand_size: HAND_SIZE,
            decoys: DECOYS,
            mode: JudgingMode::Czar,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// Malformed or missing session id, player name, or card list
    #[error("invalid parameter: {0}")]
    InvalidParam(&'static str),
    /// Join or leave attempted while a round is active
    #[error("in progress")]
    InProgress,
    /// A pool or hand cannot satisfy a required draw; the game is over
    #[error("out of cards: {0}")]
    OutOfCards(&'static str),
    /// Rule violation with state otherwise valid; rejected, no state change
    #[error("invalid action: {0}")]
    InvalidAction(&'static str),
}

/// Game and player identifiers: non-empty, printable, no whitespace.
pub fn valid_ident(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| !c.is_whitespace() && !c.is_control())
}
