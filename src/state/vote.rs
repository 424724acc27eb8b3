use super::round::{Ballot, Round, RoundSummary, Submission};
use super::session::Session;
use super::view::SessionView;
use super::Registry;
use crate::types::*;
use std::collections::BTreeSet;

#[derive(Debug)]
enum Match {
    Answer(usize),
    Decoy,
}

/// Compare a picked card set against the round's entries by unordered
/// value equality. The first hit in submission insertion order wins
/// ties; decoys only match when no player's answer does.
fn match_pick(round: &Round, pick: &BTreeSet<usize>) -> Result<Match, GameError> {
    let as_set = |cards: &[usize]| cards.iter().copied().collect::<BTreeSet<_>>();
    for (i, sub) in round.submissions.iter().enumerate() {
        if as_set(&sub.cards) == *pick {
            return Ok(Match::Answer(i));
        }
    }
    for decoy in &round.decoys {
        if as_set(decoy) == *pick {
            return Ok(Match::Decoy);
        }
    }
    Err(GameError::InvalidParam("cards"))
}

fn checked_pick(round: &Round, cards: &[usize]) -> Result<BTreeSet<usize>, GameError> {
    let pick: BTreeSet<usize> = cards.iter().copied().collect();
    if cards.len() != round.blanks || pick.len() != round.blanks {
        return Err(GameError::InvalidParam("cards"));
    }
    Ok(pick)
}

impl Session {
    /// Czar mode: the judge names the winning answer. A real answer
    /// scores its author a point; a decoy means nobody does.
    pub(crate) fn choose_answer(&mut self, name: &str, cards: &[usize]) -> Result<(), GameError> {
        let round = self
            .round
            .as_ref()
            .ok_or(GameError::InvalidAction("no round in progress"))?;
        if round.judge.as_deref() != Some(name) {
            return Err(GameError::InvalidAction("not the czar"));
        }
        let pick = checked_pick(round, cards)?;
        match match_pick(round, &pick)? {
            Match::Answer(i) => {
                let winner = round.submissions[i].player.clone();
                if winner == name {
                    return Err(GameError::InvalidAction("vote for own answer"));
                }
                *self.points.entry(winner.clone()).or_insert(0) += 1;
                self.msg = Some(format!("Winner: {}.", winner));
            }
            Match::Decoy => {
                self.msg = Some("The random card won.".to_string());
            }
        }
        self.finish_round();
        Ok(())
    }

    /// Voting mode: one anonymous ballot per seated player, own answer
    /// excluded. The round resolves once everyone has voted; every
    /// ballot naming a real answer scores its author a point.
    pub(crate) fn cast_vote(&mut self, name: &str, cards: &[usize]) -> Result<(), GameError> {
        if !self.is_seated(name) {
            return Err(GameError::InvalidParam("name"));
        }
        let round = self
            .round
            .as_ref()
            .ok_or(GameError::InvalidAction("no round in progress"))?;
        if round.votes.contains_key(name) {
            return Err(GameError::InvalidAction("already voted"));
        }
        let pick = checked_pick(round, cards)?;
        let ballot = match match_pick(round, &pick)? {
            Match::Answer(i) => {
                if round.submissions[i].player == name {
                    return Err(GameError::InvalidAction("vote for own answer"));
                }
                Ballot::Answer(i)
            }
            Match::Decoy => Ballot::Decoy,
        };

        let round = self
            .round
            .as_mut()
            .ok_or(GameError::InvalidAction("no round in progress"))?;
        round.votes.insert(name.to_string(), ballot);
        if round.votes.len() >= self.players.len() {
            let winners = tally(round.votes.values(), &round.submissions);
            for (player, n) in &winners {
                *self.points.entry(player.clone()).or_insert(0) += n;
            }
            self.msg = Some(if winners.is_empty() {
                "The random card won.".to_string()
            } else {
                let names: Vec<&str> = winners.iter().map(|(p, _)| p.as_str()).collect();
                format!("Winner: {}.", names.join(", "))
            });
            self.finish_round();
        }
        Ok(())
    }

    /// RESOLVED collapses back into LOBBY: snapshot the reveal for
    /// display, clear the active round.
    pub(crate) fn finish_round(&mut self) {
        if let Some(round) = self.round.take() {
            self.last_round = Some(RoundSummary {
                prompt: round.prompt,
                blanks: round.blanks,
                answers: round.reveal(),
            });
        }
    }
}

/// One point per ballot naming a real answer; decoy ballots award
/// nothing. Returned in submission order.
fn tally<'a>(
    votes: impl Iterator<Item = &'a Ballot>,
    submissions: &[Submission],
) -> Vec<(PlayerName, u32)> {
    let mut counts = vec![0u32; submissions.len()];
    for ballot in votes {
        if let Ballot::Answer(i) = ballot {
            counts[*i] += 1;
        }
    }
    submissions
        .iter()
        .zip(&counts)
        .filter(|(_, n)| **n > 0)
        .map(|(s, n)| (s.player.clone(), *n))
        .collect()
}

impl Registry {
    /// Judge pick or anonymous vote, dispatched by the session's mode.
    pub async fn resolve(
        &self,
        game: &str,
        name: &str,
        cards: &[usize],
    ) -> Result<SessionView, GameError> {
        if !valid_ident(name) {
            return Err(GameError::InvalidParam("name"));
        }
        let view = self
            .mutate(game, |session| {
                match session.opts.mode {
                    JudgingMode::Czar => session.choose_answer(name, cards)?,
                    JudgingMode::Vote => session.cast_vote(name, cards)?,
                }
                Ok(SessionView::render(session, self.catalog(), Some(name)))
            })
            .await?;
        if view.card.is_none() {
            tracing::info!("game {} round resolved: {:?}", game, view.msg);
        }
        Ok(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::{catalog_with_blanks, session_with_players};
    use std::collections::BTreeMap;

    fn voting_session() -> Session {
        let catalog = catalog_with_blanks(1);
        let mut session = session_with_players(&catalog, &["a", "b", "c", "d"]);
        session.opts.mode = JudgingMode::Vote;
        // 3 real answers and one decoy, as if d never answered
        session.round = Some(Round {
            prompt: 0,
            blanks: 1,
            judge: None,
            decoys: vec![vec![500]],
            submissions: vec![
                Submission { player: "a".into(), cards: vec![501] },
                Submission { player: "b".into(), cards: vec![502] },
                Submission { player: "c".into(), cards: vec![503] },
            ],
            votes: BTreeMap::new(),
        });
        session
    }

    #[test]
    fn test_first_match_in_insertion_order_wins() {
        // two authors played the same multiset in a different order
        let round = Round {
            prompt: 0,
            blanks: 2,
            judge: None,
            decoys: vec![vec![1, 2]],
            submissions: vec![
                Submission { player: "a".into(), cards: vec![7, 9] },
                Submission { player: "b".into(), cards: vec![9, 7] },
            ],
            votes: BTreeMap::new(),
        };
        match match_pick(&round, &[9, 7].into_iter().collect()).unwrap() {
            Match::Answer(i) => assert_eq!(i, 0),
            Match::Decoy => panic!("matched a decoy"),
        }
        // decoys only match when no answer does
        match match_pick(&round, &[1, 2].into_iter().collect()).unwrap() {
            Match::Decoy => {}
            Match::Answer(i) => panic!("matched answer {}", i),
        }
        assert_eq!(
            match_pick(&round, &[1, 9].into_iter().collect()).unwrap_err(),
            GameError::InvalidParam("cards")
        );
    }

    #[test]
    fn test_choose_answer_requires_the_czar() {
        let catalog = catalog_with_blanks(1);
        let mut session = session_with_players(&catalog, &["alice", "bob"]);
        session.begin_round(&catalog).unwrap();
        assert_eq!(
            session.choose_answer("bob", &[0]).unwrap_err(),
            GameError::InvalidAction("not the czar")
        );
    }

    #[test]
    fn test_choose_answer_awards_the_winner() {
        let catalog = catalog_with_blanks(1);
        let mut session = session_with_players(&catalog, &["alice", "bob", "carol"]);
        session.begin_round(&catalog).unwrap();
        let judge = session.round.as_ref().unwrap().judge.clone().unwrap();
        assert_eq!(judge, "alice");
        let bob_card = *session.hands.get("bob").unwrap().iter().next().unwrap();
        session.play("bob", &[bob_card], None).unwrap();

        session.choose_answer("alice", &[bob_card]).unwrap();
        assert_eq!(session.points_of("bob"), 1);
        assert_eq!(session.msg.as_deref(), Some("Winner: bob."));
        assert!(session.round.is_none());
        assert!(session.last_round.is_some());
    }

    #[test]
    fn test_choose_answer_decoy_wins_nothing() {
        let catalog = catalog_with_blanks(1);
        let mut session = session_with_players(&catalog, &["alice", "bob"]);
        session.begin_round(&catalog).unwrap();
        let decoy = session.round.as_ref().unwrap().decoys[0].clone();
        session.choose_answer("alice", &decoy).unwrap();
        assert_eq!(session.msg.as_deref(), Some("The random card won."));
        assert!(session.players.iter().all(|p| session.points_of(p) == 0));
    }

    #[test]
    fn test_anonymous_scoring() {
        // 4 players, 3 real answers, 1 decoy:
        // a -> b's, b -> c's, c -> decoy, d -> b's  =>  b +2, c +1
        let mut session = voting_session();
        session.cast_vote("a", &[502]).unwrap();
        session.cast_vote("b", &[503]).unwrap();
        session.cast_vote("c", &[500]).unwrap();
        assert!(session.in_round(), "round must stay open until all vote");
        session.cast_vote("d", &[502]).unwrap();

        assert!(!session.in_round());
        assert_eq!(session.points_of("a"), 0);
        assert_eq!(session.points_of("b"), 2);
        assert_eq!(session.points_of("c"), 1);
        assert_eq!(session.points_of("d"), 0);
        assert_eq!(session.msg.as_deref(), Some("Winner: b, c."));
    }

    #[test]
    fn test_all_decoy_votes_score_nobody() {
        let mut session = voting_session();
        for voter in ["a", "b", "c", "d"] {
            session.cast_vote(voter, &[500]).unwrap();
        }
        assert!(!session.in_round());
        assert!(session.players.iter().all(|p| session.points_of(p) == 0));
        assert_eq!(session.msg.as_deref(), Some("The random card won."));
    }

    #[test]
    fn test_vote_rejections() {
        let mut session = voting_session();
        assert_eq!(
            session.cast_vote("a", &[501]).unwrap_err(),
            GameError::InvalidAction("vote for own answer")
        );
        session.cast_vote("a", &[502]).unwrap();
        assert_eq!(
            session.cast_vote("a", &[503]).unwrap_err(),
            GameError::InvalidAction("already voted")
        );
        assert_eq!(
            session.cast_vote("stranger", &[502]).unwrap_err(),
            GameError::InvalidParam("name")
        );
        assert_eq!(
            session.cast_vote("b", &[999]).unwrap_err(),
            GameError::InvalidParam("cards")
        );
    }
}
