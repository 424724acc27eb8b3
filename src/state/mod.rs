mod pool;
mod round;
mod session;
mod view;
mod vote;

pub use pool::CardPool;
pub use round::{Ballot, Round, RoundSummary, Submission};
pub use session::Session;
pub use view::{PlayerView, SessionView};

use crate::catalog::CardCatalog;
use crate::types::*;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Process-wide session registry: one entry per live game, keyed by the
/// session id minted by the host process. Each session sits behind its
/// own mutex, held across the whole read-modify-write of an operation,
/// so a concurrent host gets per-session exclusion for free.
pub struct Registry {
    catalog: Arc<CardCatalog>,
    sessions: RwLock<HashMap<GameId, Arc<Mutex<Session>>>>,
}

impl Registry {
    pub fn new(catalog: Arc<CardCatalog>) -> Self {
        Self {
            catalog,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn catalog(&self) -> &CardCatalog {
        &self.catalog
    }

    /// Look up a session. `InvalidParam` covers a malformed id and an
    /// unknown one alike.
    pub(crate) async fn session(&self, game: &str) -> Result<Arc<Mutex<Session>>, GameError> {
        if !valid_ident(game) {
            return Err(GameError::InvalidParam("game"));
        }
        self.sessions
            .read()
            .await
            .get(game)
            .cloned()
            .ok_or(GameError::InvalidParam("game"))
    }

    /// Fetch-or-create for join. Options are only honored at creation;
    /// the session keeps them for its whole lifetime.
    pub(crate) async fn session_or_create(
        &self,
        game: &str,
        opts: Option<SessionOptions>,
    ) -> Arc<Mutex<Session>> {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(game.to_string())
            .or_insert_with(|| {
                tracing::info!("creating session {}", game);
                Arc::new(Mutex::new(Session::new(
                    &self.catalog,
                    opts.unwrap_or_default(),
                )))
            })
            .clone()
    }

    /// Run one operation against a draft of the session and commit it,
    /// tick bump included, in a single step. A failed operation leaves
    /// the stored session untouched.
    pub(crate) async fn mutate<T>(
        &self,
        game: &str,
        op: impl FnOnce(&mut Session) -> Result<T, GameError>,
    ) -> Result<T, GameError> {
        let cell = self.session(game).await?;
        let mut session = cell.lock().await;
        let mut draft = session.clone();
        draft.bump_tick();
        let out = op(&mut draft)?;
        *session = draft;
        Ok(out)
    }

    /// Current version counter, for `GET /status` style polling.
    pub async fn tick(&self, game: &str) -> Result<u64, GameError> {
        let cell = self.session(game).await?;
        let tick = cell.lock().await.tick;
        Ok(tick)
    }

    /// Destroy the session entirely; the next join recreates it from
    /// scratch. Deleting an id that is not registered is a no-op.
    pub async fn restart(&self, game: &str) -> Result<(), GameError> {
        if !valid_ident(game) {
            return Err(GameError::InvalidParam("game"));
        }
        if self.sessions.write().await.remove(game).is_some() {
            tracing::info!("session {} restarted", game);
        }
        Ok(())
    }
}
