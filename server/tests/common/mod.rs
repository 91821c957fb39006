#![allow(dead_code)]

use std::sync::Arc;

use futures_channel::mpsc::UnboundedReceiver;
use futures_util::{FutureExt, StreamExt};
use mineduel_core::{MatchView, PlayerId};
use mineduel_protocol::ServerMessage;
use mineduel_server::*;

pub type Inbox = UnboundedReceiver<ServerMessage>;

pub struct Harness {
    pub dispatcher: Dispatcher<ChannelNotifier>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(ServerConfig {
            seed: Some(7),
            ..ServerConfig::default()
        })
    }

    pub fn with_config(config: ServerConfig) -> Self {
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let registry = SessionRegistry::with_clock(config, clock.clone());
        Self {
            dispatcher: Dispatcher::new(Arc::new(registry), ChannelNotifier::new()),
            clock,
        }
    }

    /// Registers an outbound channel for `name` and connects it.
    pub fn connect(&self, name: &str) -> (PlayerId, Inbox) {
        let id = PlayerId::new(name);
        let inbox = self.dispatcher.notifier().register(id.clone());
        self.dispatcher.connect(&id);
        (id, inbox)
    }

    pub fn send(&self, from: &PlayerId, json: &str) {
        self.dispatcher.handle_text(from, json);
    }
}

/// Everything queued for a connection so far, without waiting for more.
pub fn drain(inbox: &mut Inbox) -> Vec<ServerMessage> {
    let mut out = Vec::new();
    while let Some(Some(message)) = inbox.next().now_or_never() {
        out.push(message);
    }
    out
}

/// Most recent match state among `messages`, from any match event.
pub fn last_view(messages: &[ServerMessage]) -> Option<MatchView> {
    messages.iter().rev().find_map(|message| match message {
        ServerMessage::MatchUpdate { state }
        | ServerMessage::MatchCreated { state, .. }
        | ServerMessage::MatchJoined { state, .. } => Some(state.clone()),
        _ => None,
    })
}

pub fn errors(messages: &[ServerMessage]) -> Vec<String> {
    messages
        .iter()
        .filter_map(|message| match message {
            ServerMessage::ActionError { reason } => Some(reason.clone()),
            _ => None,
        })
        .collect()
}
