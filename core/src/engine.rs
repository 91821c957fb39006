use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::*;

pub const MIN_PLAYERS: u8 = 2;
pub const MAX_PLAYERS: u8 = 4;

/// Short opaque match identifier, unique among live matches.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(String);

impl MatchId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MatchId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchState {
    #[default]
    Waiting,
    Playing,
    Finished,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    MineHit,
    Completed,
}

/// One entry of the append-only move log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Move {
    GameStart {
        players: SmallVec<[PlayerId; MAX_PLAYERS as usize]>,
    },
    Reveal {
        player: PlayerId,
        row: Coord,
        col: Coord,
        turn: u32,
    },
    Flag {
        player: PlayerId,
        row: Coord,
        col: Coord,
        flagged: bool,
        turn: u32,
    },
    GameEnd {
        reason: EndReason,
        winner: Option<PlayerId>,
        duration: DurationMs,
    },
}

impl Move {
    /// True for the moves a replay steps through.
    pub const fn is_board_action(&self) -> bool {
        matches!(self, Self::Reveal { .. } | Self::Flag { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RevealOutcome {
    Revealed {
        cells: Vec<Coord2>,
        points: CellCount,
        next_player: usize,
    },
    MineHit {
        mines: Vec<Coord2>,
        winner: Option<PlayerId>,
    },
    Completed {
        cells: Vec<Coord2>,
        points: CellCount,
        winner: Option<PlayerId>,
    },
}

impl RevealOutcome {
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Revealed { .. })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FlagOutcome {
    pub flagged: bool,
    pub next_player: usize,
}

/// Result of removing a player.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[must_use]
pub struct Departure {
    pub removed: bool,
    /// The match has no players left and should be discarded.
    pub delete_match: bool,
}

/// Authoritative state of one match: players in turn order, the board, and
/// the move log. Every mutation validates first and only then changes state,
/// so a rejected action leaves the match exactly as it was.
#[derive(Clone, Debug, PartialEq)]
pub struct Match {
    id: MatchId,
    difficulty: Difficulty,
    max_players: u8,
    host: PlayerId,
    players: Vec<Player>,
    state: MatchState,
    current_player: usize,
    board: Board,
    seed: u64,
    turns: u32,
    moves: Vec<Move>,
    started_at: Option<Timestamp>,
    ended_at: Option<Timestamp>,
    end_reason: Option<EndReason>,
    winner: Option<PlayerId>,
}

impl Match {
    /// New match in `Waiting`, with the creator seated first as host.
    pub fn new(
        id: MatchId,
        difficulty: Difficulty,
        max_players: u8,
        seed: u64,
        host: Player,
    ) -> Self {
        let max_players = max_players.clamp(MIN_PLAYERS, MAX_PLAYERS);
        Self {
            id,
            difficulty,
            max_players,
            host: host.id.clone(),
            players: alloc::vec![host],
            state: MatchState::Waiting,
            current_player: 0,
            board: Board::new(difficulty.config()),
            seed,
            turns: 0,
            moves: Vec::new(),
            started_at: None,
            ended_at: None,
            end_reason: None,
            winner: None,
        }
    }

    pub fn id(&self) -> &MatchId {
        &self.id
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn max_players(&self) -> u8 {
        self.max_players
    }

    pub fn host(&self) -> &PlayerId {
        &self.host
    }

    pub fn is_host(&self, player: &PlayerId) -> bool {
        &self.host == player
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player_index(&self, player: &PlayerId) -> Option<usize> {
        self.players.iter().position(|p| &p.id == player)
    }

    pub fn has_player(&self, player: &PlayerId) -> bool {
        self.player_index(player).is_some()
    }

    pub fn state(&self) -> MatchState {
        self.state
    }

    pub fn current_player(&self) -> usize {
        self.current_player
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn started_at(&self) -> Option<Timestamp> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<Timestamp> {
        self.ended_at
    }

    pub fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    pub fn winner(&self) -> Option<&PlayerId> {
        self.winner.as_ref()
    }

    pub fn add_player(&mut self, id: PlayerId, name: PlayerName) -> Result<()> {
        if self.state != MatchState::Waiting {
            return Err(GameError::AlreadyStarted);
        }
        if self.has_player(&id) {
            return Err(GameError::DuplicatePlayer);
        }
        if self.players.len() >= usize::from(self.max_players) {
            return Err(GameError::Full);
        }

        log::debug!("{}: {} joined as {}", self.id, id, name);
        self.players.push(Player::new(id, name));
        Ok(())
    }

    pub fn remove_player(&mut self, id: &PlayerId) -> Departure {
        let Some(index) = self.player_index(id) else {
            return Departure {
                removed: false,
                delete_match: self.players.is_empty(),
            };
        };

        self.players.remove(index);
        log::debug!("{}: {} left ({} remaining)", self.id, id, self.players.len());

        if index <= self.current_player && self.current_player >= self.players.len() {
            self.current_player = 0;
        }
        if &self.host == id {
            if let Some(next_host) = self.players.first() {
                self.host = next_host.id.clone();
            }
        }

        Departure {
            removed: true,
            delete_match: self.players.is_empty(),
        }
    }

    pub fn start(&mut self, now: Timestamp) -> Result<()> {
        if self.state != MatchState::Waiting {
            return Err(GameError::AlreadyStarted);
        }
        if self.players.len() < usize::from(MIN_PLAYERS) {
            return Err(GameError::InsufficientPlayers);
        }

        self.state = MatchState::Playing;
        self.current_player = 0;
        self.started_at = Some(now);
        self.moves.push(Move::GameStart {
            players: self.players.iter().map(|p| p.id.clone()).collect(),
        });
        log::info!("{}: started with {} players", self.id, self.players.len());
        Ok(())
    }

    pub fn reveal(
        &mut self,
        coords: Coord2,
        player: &PlayerId,
        now: Timestamp,
    ) -> Result<RevealOutcome> {
        let index = self.check_turn(player)?;
        let coords = self.board.validate_coords(coords)?;
        if !self.board.cell_at(coords).is_clickable() {
            return Err(GameError::NotClickable);
        }
        self.board.ensure_mines(self.seed, coords)?;

        let turn = self.next_turn();
        self.moves.push(Move::Reveal {
            player: player.clone(),
            row: coords.0,
            col: coords.1,
            turn,
        });

        let cells = match self.board.reveal(coords, player) {
            RevealEffect::Mine => {
                let mines = self.board.reveal_all_mines();
                log::debug!("{}: {} hit a mine at {:?}", self.id, player, coords);
                let winner = self.finish(EndReason::MineHit, now);
                return Ok(RevealOutcome::MineHit { mines, winner });
            }
            RevealEffect::Opened(cells) => cells,
        };

        // a board has at most 256 cells, so a turn's haul always fits
        let points = cells.len() as CellCount;
        self.players[index].score += points;
        log::debug!(
            "{}: {} revealed {:?}, opened {} cells",
            self.id,
            player,
            coords,
            points
        );

        if self.board.is_cleared() {
            let winner = self.finish(EndReason::Completed, now);
            return Ok(RevealOutcome::Completed {
                cells,
                points,
                winner,
            });
        }

        let next_player = self.advance_turn();
        Ok(RevealOutcome::Revealed {
            cells,
            points,
            next_player,
        })
    }

    pub fn toggle_flag(&mut self, coords: Coord2, player: &PlayerId) -> Result<FlagOutcome> {
        self.check_turn(player)?;
        let coords = self.board.validate_coords(coords)?;
        let flagged = self.board.toggle_flag(coords)?;

        let turn = self.next_turn();
        self.moves.push(Move::Flag {
            player: player.clone(),
            row: coords.0,
            col: coords.1,
            flagged,
            turn,
        });
        log::debug!("{}: {} set flag {:?} to {}", self.id, player, coords, flagged);

        let next_player = self.advance_turn();
        Ok(FlagOutcome {
            flagged,
            next_player,
        })
    }

    /// Highest score wins; ties go to the earliest player in turn order.
    pub fn leader(&self) -> Option<&Player> {
        self.players
            .iter()
            .fold(None, |best: Option<&Player>, player| match best {
                Some(best) if best.score >= player.score => Some(best),
                _ => Some(player),
            })
    }

    /// Archival record, available once the match has finished.
    pub fn history_entry(&self) -> Option<HistoryEntry> {
        let (Some(reason), Some(ended_at)) = (self.end_reason, self.ended_at) else {
            return None;
        };
        let started_at = self.started_at.unwrap_or(ended_at);
        let winner_name = self
            .winner
            .as_ref()
            .and_then(|winner| self.players.iter().find(|p| &p.id == winner))
            .map(|p| p.name.clone());

        Some(HistoryEntry {
            match_id: self.id.clone(),
            difficulty: self.difficulty,
            size: self.board.size(),
            mine_count: self.board.mine_count(),
            players: self.players.clone(),
            winner: self.winner.clone(),
            winner_name,
            reason,
            started_at,
            ended_at,
            duration: ended_at.saturating_sub(started_at),
            moves: self.moves.clone(),
            mines: self.board.mine_positions(),
        })
    }

    fn check_turn(&self, player: &PlayerId) -> Result<usize> {
        if self.state != MatchState::Playing {
            return Err(GameError::NotActive);
        }
        let index = self.player_index(player).ok_or(GameError::UnknownPlayer)?;
        if index != self.current_player {
            return Err(GameError::NotYourTurn);
        }
        Ok(index)
    }

    fn next_turn(&mut self) -> u32 {
        self.turns += 1;
        self.turns
    }

    fn advance_turn(&mut self) -> usize {
        self.current_player = (self.current_player + 1) % self.players.len().max(1);
        self.current_player
    }

    fn finish(&mut self, reason: EndReason, now: Timestamp) -> Option<PlayerId> {
        let winner = self.leader().map(|p| p.id.clone());
        let duration = now.saturating_sub(self.started_at.unwrap_or(now));

        self.state = MatchState::Finished;
        self.ended_at = Some(now);
        self.end_reason = Some(reason);
        self.winner = winner.clone();
        self.moves.push(Move::GameEnd {
            reason,
            winner: winner.clone(),
            duration,
        });
        log::info!(
            "{}: finished ({:?}) after {} ms, winner {:?}",
            self.id,
            reason,
            duration,
            winner
        );
        winner
    }
}
