use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use mineduel_core::*;
use mineduel_protocol::{LobbyMatch, LobbySnapshot};
use rand::prelude::*;

use crate::{Clock, Result, ServerConfig, SessionError, SystemClock, lock};

const ID_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// A successful in-match action: the outcome plus the state to broadcast.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchAction<T> {
    pub outcome: T,
    pub view: MatchView,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Leave {
    /// `None` once the match was discarded.
    pub view: Option<MatchView>,
}

/// Owns every live match, the lobby and the history archive.
///
/// Lock order is map, then a single match, then history; the lobby and the
/// random source are only ever held on their own or innermost. Each match has
/// its own lock so different matches proceed in parallel.
pub struct SessionRegistry {
    config: ServerConfig,
    matches: Mutex<HashMap<MatchId, Arc<Mutex<Match>>>>,
    lobby: Mutex<HashSet<PlayerId>>,
    history: Mutex<HistoryStore>,
    rng: Mutex<SmallRng>,
    clock: Arc<dyn Clock>,
}

impl SessionRegistry {
    pub fn new(config: ServerConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: ServerConfig, clock: Arc<dyn Clock>) -> Self {
        let config = config.normalized();
        let seed = config.seed.unwrap_or_else(rand::random);
        log::info!("Session registry ready (seeded: {})", config.seed.is_some());
        Self {
            history: Mutex::new(HistoryStore::with_limit(config.history_limit)),
            config,
            matches: Mutex::new(HashMap::new()),
            lobby: Mutex::new(HashSet::new()),
            rng: Mutex::new(SmallRng::seed_from_u64(seed)),
            clock,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn connect(&self, conn: &PlayerId) {
        lock(&self.lobby).insert(conn.clone());
        log::debug!("{}: connected", conn);
    }

    pub fn create_match(
        &self,
        conn: &PlayerId,
        name: &str,
        difficulty: Difficulty,
        max_players: u8,
    ) -> Result<MatchView> {
        let name = PlayerName::parse(name)?;

        let view = {
            let mut matches = lock(&self.matches);
            let id = self.unique_match_id(&matches);
            let seed = lock(&self.rng).random();
            let game = Match::new(
                id.clone(),
                difficulty,
                max_players,
                seed,
                Player::new(conn.clone(), name),
            );
            let view = MatchView::from_match(&game);
            matches.insert(id, Arc::new(Mutex::new(game)));
            view
        };

        lock(&self.lobby).remove(conn);
        log::info!(
            "{}: created by {} ({}, up to {} players)",
            view.match_id,
            conn,
            difficulty,
            view.max_players
        );
        Ok(view)
    }

    pub fn join_match(&self, id: &MatchId, conn: &PlayerId, name: &str) -> Result<MatchView> {
        let name = PlayerName::parse(name)?;

        // holding the map lock keeps a concurrent leave from discarding the
        // match between lookup and join
        let view = {
            let matches = lock(&self.matches);
            let game = matches.get(id).ok_or(SessionError::NotFound)?;
            let mut game = lock(game);
            game.add_player(conn.clone(), name)?;
            MatchView::from_match(&game)
        };

        lock(&self.lobby).remove(conn);
        Ok(view)
    }

    /// Starts `id`; only its host may do so.
    pub fn start_match(&self, id: &MatchId, conn: &PlayerId) -> Result<MatchView> {
        let game = self.live_match(id)?;
        let mut game = lock(&game);
        if !game.has_player(conn) {
            return Err(GameError::UnknownPlayer.into());
        }
        if !game.is_host(conn) {
            return Err(SessionError::NotHost);
        }
        game.start(self.clock.now())?;
        Ok(MatchView::from_match(&game))
    }

    pub fn reveal(
        &self,
        id: &MatchId,
        conn: &PlayerId,
        coords: Coord2,
    ) -> Result<MatchAction<RevealOutcome>> {
        let game = self.live_match(id)?;
        let (outcome, view, finished) = {
            let mut game = lock(&game);
            let outcome = game.reveal(coords, conn, self.clock.now())?;
            let finished = if outcome.is_terminal() {
                game.history_entry()
            } else {
                None
            };
            (outcome, MatchView::from_match(&game), finished)
        };

        if let Some(entry) = finished {
            self.archive(entry);
        }
        Ok(MatchAction { outcome, view })
    }

    pub fn toggle_flag(
        &self,
        id: &MatchId,
        conn: &PlayerId,
        coords: Coord2,
    ) -> Result<MatchAction<FlagOutcome>> {
        let game = self.live_match(id)?;
        let mut game = lock(&game);
        let outcome = game.toggle_flag(coords, conn)?;
        Ok(MatchAction {
            outcome,
            view: MatchView::from_match(&game),
        })
    }

    /// Removes `conn` from `id` and returns it to the lobby. The match is
    /// discarded when nobody is left.
    pub fn leave_match(&self, id: &MatchId, conn: &PlayerId) -> Result<Leave> {
        let view = {
            let mut matches = lock(&self.matches);
            let game = matches.get(id).ok_or(SessionError::NotFound)?.clone();
            let mut game = lock(&game);
            if !game.has_player(conn) {
                return Err(GameError::UnknownPlayer.into());
            }

            if game.remove_player(conn).delete_match {
                matches.remove(id);
                log::info!("{}: last player left, match discarded", id);
                None
            } else {
                Some(MatchView::from_match(&game))
            }
        };

        lock(&self.lobby).insert(conn.clone());
        Ok(Leave { view })
    }

    /// Drops `conn` everywhere. Returns the matches it left that are still
    /// alive, so their remaining players can be told.
    pub fn disconnect(&self, conn: &PlayerId) -> Vec<MatchView> {
        lock(&self.lobby).remove(conn);

        let mut survivors = Vec::new();
        let mut matches = lock(&self.matches);
        matches.retain(|id, game| {
            let mut game = lock(game);
            let departure = game.remove_player(conn);
            if departure.delete_match {
                log::info!("{}: discarded after {} disconnected", id, conn);
                return false;
            }
            if departure.removed {
                survivors.push(MatchView::from_match(&game));
            }
            true
        });
        drop(matches);

        log::debug!("{}: disconnected from {} live matches", conn, survivors.len());
        survivors.sort_by(|a, b| a.match_id.cmp(&b.match_id));
        survivors
    }

    pub fn match_view(&self, id: &MatchId) -> Result<MatchView> {
        let game = self.live_match(id)?;
        let game = lock(&game);
        Ok(MatchView::from_match(&game))
    }

    pub fn match_count(&self) -> usize {
        lock(&self.matches).len()
    }

    /// Lobby population and joinable matches, computed fresh on every call.
    pub fn lobby_snapshot(&self) -> LobbySnapshot {
        let mut available_matches: Vec<LobbyMatch> = lock(&self.matches)
            .values()
            .filter_map(|game| {
                let game = lock(game);
                (game.state() == MatchState::Waiting).then(|| LobbyMatch {
                    match_id: game.id().clone(),
                    players: game.players().len(),
                    max_players: game.max_players(),
                })
            })
            .collect();
        available_matches.sort_by(|a, b| a.match_id.cmp(&b.match_id));

        LobbySnapshot {
            active_connections: lock(&self.lobby).len(),
            available_matches,
        }
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        lock(&self.history).list()
    }

    pub fn leaderboard(&self, filter: LeaderboardFilter) -> Vec<LeaderboardEntry> {
        lock(&self.history).leaderboard(filter, self.config.leaderboard_size)
    }

    pub fn replay(&self, id: &MatchId) -> Result<HistoryEntry> {
        lock(&self.history)
            .get(id)
            .cloned()
            .ok_or(SessionError::NotFound)
    }

    fn live_match(&self, id: &MatchId) -> Result<Arc<Mutex<Match>>> {
        lock(&self.matches)
            .get(id)
            .cloned()
            .ok_or(SessionError::NotFound)
    }

    fn archive(&self, entry: HistoryEntry) {
        lock(&self.history).record(entry);
    }

    fn unique_match_id(&self, live: &HashMap<MatchId, Arc<Mutex<Match>>>) -> MatchId {
        let history = lock(&self.history);
        let mut rng = lock(&self.rng);
        loop {
            let id: String = (0..self.config.match_id_length)
                .map(|_| char::from(ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())]))
                .collect();
            let id = MatchId::new(id);
            if !live.contains_key(&id) && !history.contains(&id) {
                return id;
            }
            log::debug!("{}: match id collision, regenerating", id);
        }
    }
}
