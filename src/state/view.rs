use super::round::RoundSummary;
use super::session::Session;
use super::Registry;
use crate::catalog::CardCatalog;
use crate::types::*;
use serde::{Deserialize, Serialize};

/// One row of the standings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerView {
    pub name: PlayerName,
    pub points: u32,
    pub czar: bool,
}

/// Snapshot returned by every mutating call so the caller can re-render
/// immediately instead of issuing a second read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    /// Standings, sorted by name for display
    pub players: Vec<PlayerView>,
    /// Current prompt card, while a round is active
    pub card: Option<usize>,
    pub card_text: Option<String>,
    pub blanks: Option<usize>,
    /// The viewer's hand
    pub hand: Vec<usize>,
    pub you_czar: bool,
    /// Players who have answered so far
    pub answered: Vec<PlayerName>,
    /// Players who have voted so far (voting mode)
    pub voted: Vec<PlayerName>,
    /// Every expected answer is in; `answers` is showable
    pub complete: bool,
    /// Decoys and answers in display order, once complete
    pub answers: Option<Vec<Vec<usize>>>,
    /// The previously resolved round, for the lobby screen
    pub last_round: Option<RoundSummary>,
    pub msg: Option<String>,
    pub tick: u64,
}

impl SessionView {
    pub fn render(session: &Session, catalog: &CardCatalog, viewer: Option<&str>) -> Self {
        let round = session.round.as_ref();
        let judge = round.and_then(|r| r.judge.as_deref());
        let mut names: Vec<&str> = session.players.iter().map(String::as_str).collect();
        names.sort_unstable();
        let players = names
            .into_iter()
            .map(|name| PlayerView {
                name: name.to_string(),
                points: session.points_of(name),
                czar: Some(name) == judge,
            })
            .collect();
        let complete = round
            .map(|r| r.complete(session.players.len()))
            .unwrap_or(false);
        Self {
            players,
            card: round.map(|r| r.prompt),
            card_text: round
                .and_then(|r| catalog.prompt(r.prompt))
                .map(|c| c.text.clone()),
            blanks: round.map(|r| r.blanks),
            hand: viewer
                .and_then(|v| session.hands.get(v))
                .map(|h| h.iter().copied().collect())
                .unwrap_or_default(),
            you_czar: judge.is_some() && viewer == judge,
            answered: round
                .map(|r| r.submissions.iter().map(|s| s.player.clone()).collect())
                .unwrap_or_default(),
            voted: round
                .map(|r| r.votes.keys().cloned().collect())
                .unwrap_or_default(),
            complete,
            answers: if complete { round.map(|r| r.reveal()) } else { None },
            last_round: session.last_round.clone(),
            msg: session.msg.clone(),
            tick: session.tick,
        }
    }
}

impl Registry {
    /// Read-only render for a poller whose tick went stale.
    pub async fn view(&self, game: &str, viewer: Option<&str>) -> Result<SessionView, GameError> {
        if let Some(v) = viewer {
            if !valid_ident(v) {
                return Err(GameError::InvalidParam("name"));
            }
        }
        let cell = self.session(game).await?;
        let session = cell.lock().await;
        Ok(SessionView::render(&session, self.catalog(), viewer))
    }
}
