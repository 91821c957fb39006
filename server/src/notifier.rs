use std::collections::HashMap;
use std::sync::Mutex;

use futures_channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use mineduel_core::PlayerId;
use mineduel_protocol::ServerMessage;

use crate::lock;

/// Outbound side of the transport. Implementations must not block; they are
/// called after all registry locks are released.
pub trait Notifier: Send + Sync {
    fn send(&self, to: &PlayerId, message: ServerMessage);

    /// Every connected client.
    fn broadcast(&self, message: ServerMessage);

    fn send_many<'a>(&self, to: impl IntoIterator<Item = &'a PlayerId>, message: ServerMessage)
    where
        Self: Sized,
    {
        for id in to {
            self.send(id, message.clone());
        }
    }
}

/// One unbounded channel per connection; the transport drains the receivers.
#[derive(Debug, Default)]
pub struct ChannelNotifier {
    senders: Mutex<HashMap<PlayerId, UnboundedSender<ServerMessage>>>,
}

impl ChannelNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, id: PlayerId) -> UnboundedReceiver<ServerMessage> {
        let (tx, rx) = mpsc::unbounded();
        if lock(&self.senders).insert(id.clone(), tx).is_some() {
            log::warn!("{}: replaced an existing outbound channel", id);
        }
        rx
    }

    pub fn unregister(&self, id: &PlayerId) {
        lock(&self.senders).remove(id);
    }

    pub fn connection_count(&self) -> usize {
        lock(&self.senders).len()
    }
}

impl Notifier for ChannelNotifier {
    fn send(&self, to: &PlayerId, message: ServerMessage) {
        let mut senders = lock(&self.senders);
        let Some(sender) = senders.get(to) else {
            log::trace!("{}: no channel, dropping message", to);
            return;
        };
        if sender.unbounded_send(message).is_err() {
            log::debug!("{}: receiver gone, pruning channel", to);
            senders.remove(to);
        }
    }

    fn broadcast(&self, message: ServerMessage) {
        lock(&self.senders).retain(|id, sender| {
            let delivered = sender.unbounded_send(message.clone()).is_ok();
            if !delivered {
                log::debug!("{}: receiver gone, pruning channel", id);
            }
            delivered
        });
    }
}
