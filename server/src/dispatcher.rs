use std::sync::Arc;

use mineduel_core::{MatchView, PlayerId};
use mineduel_protocol::{ClientMessage, ServerMessage, decode_client};

use crate::{Notifier, SessionError, SessionRegistry};

/// Turns requests from one connection into registry calls and outbound events.
///
/// Every event is emitted after the registry call returned, so no registry
/// lock is held while the notifier runs.
pub struct Dispatcher<N> {
    registry: Arc<SessionRegistry>,
    notifier: N,
}

impl<N: Notifier> Dispatcher<N> {
    pub fn new(registry: Arc<SessionRegistry>, notifier: N) -> Self {
        Self { registry, notifier }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn connect(&self, conn: &PlayerId) {
        self.registry.connect(conn);
        self.notifier.send(conn, ServerMessage::LobbyJoined);
        self.broadcast_lobby();
    }

    pub fn disconnect(&self, conn: &PlayerId) {
        for view in self.registry.disconnect(conn) {
            self.publish(view);
        }
        self.broadcast_lobby();
    }

    /// Decodes a raw text frame and handles it. Undecodable frames are
    /// answered with an error like any other rejected action.
    pub fn handle_text(&self, conn: &PlayerId, text: &str) {
        match decode_client(text) {
            Ok(message) => self.handle(conn, message),
            Err(err) => {
                log::warn!("{}: undecodable message: {}", conn, err);
                self.notifier
                    .send(conn, ServerMessage::error(format!("Invalid message: {err}")));
            }
        }
    }

    pub fn handle(&self, conn: &PlayerId, message: ClientMessage) {
        if let Err(err) = self.apply(conn, message) {
            log::warn!("{}: action rejected: {}", conn, err);
            self.notifier.send(conn, ServerMessage::error(err));
        }
    }

    fn apply(&self, conn: &PlayerId, message: ClientMessage) -> Result<(), SessionError> {
        match message {
            ClientMessage::CreateMatch {
                player_name,
                difficulty,
                max_players,
            } => {
                let config = self.registry.config();
                let difficulty = config.difficulty_or_default(difficulty.as_deref());
                let max_players = config.max_players_or_default(max_players);
                let view = self
                    .registry
                    .create_match(conn, &player_name, difficulty, max_players)?;
                self.notifier.send(
                    conn,
                    ServerMessage::MatchCreated {
                        match_id: view.match_id.clone(),
                        state: view,
                    },
                );
                self.broadcast_lobby();
            }
            ClientMessage::JoinMatch {
                match_id,
                player_name,
            } => {
                let view = self.registry.join_match(&match_id, conn, &player_name)?;
                self.notifier.send(
                    conn,
                    ServerMessage::MatchJoined {
                        match_id,
                        state: view.clone(),
                    },
                );
                self.publish(view);
                self.broadcast_lobby();
            }
            ClientMessage::StartMatch { match_id } => {
                let view = self.registry.start_match(&match_id, conn)?;
                self.publish(view);
                self.broadcast_lobby();
            }
            ClientMessage::RevealCell { match_id, row, col } => {
                let action = self.registry.reveal(&match_id, conn, (row, col))?;
                self.publish(action.view);
            }
            ClientMessage::ToggleFlag { match_id, row, col } => {
                let action = self.registry.toggle_flag(&match_id, conn, (row, col))?;
                self.publish(action.view);
            }
            ClientMessage::LeaveMatch { match_id } => {
                let leave = self.registry.leave_match(&match_id, conn)?;
                if let Some(view) = leave.view {
                    self.publish(view);
                }
                self.notifier.send(conn, ServerMessage::LobbyJoined);
                self.broadcast_lobby();
            }
            ClientMessage::GetHistory => {
                let entries = self.registry.history();
                self.notifier.send(conn, ServerMessage::HistoryList { entries });
            }
            ClientMessage::GetLeaderboard { filter } => {
                let entries = self.registry.leaderboard(filter);
                let message = ServerMessage::LeaderboardList { filter, entries };
                self.notifier.send(conn, message);
            }
            ClientMessage::GetReplay { match_id } => {
                let entry = self.registry.replay(&match_id)?;
                self.notifier.send(conn, ServerMessage::ReplayData { entry });
            }
        }
        Ok(())
    }

    /// Sends `view` to everyone seated in its match.
    fn publish(&self, view: MatchView) {
        let players: Vec<PlayerId> = view.players.iter().map(|p| p.id.clone()).collect();
        self.notifier.send_many(&players, ServerMessage::MatchUpdate { state: view });
    }

    fn broadcast_lobby(&self) {
        let snapshot = self.registry.lobby_snapshot();
        self.notifier.broadcast(ServerMessage::LobbyUpdate(snapshot));
    }
}
