use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use emberfall_game_common::ids::PlayerId;
use emberfall_game_common::messages::ServerMessage;

use crate::game::world::Outbound;

/// Serialised frame ready for a session's writer. Broadcasts encode
/// once and share the line across sessions.
pub type Frame = Arc<String>;

pub const SESSION_QUEUE_CAPACITY: usize = 256;

struct SessionHandle {
    sender: tokio::sync::mpsc::Sender<Frame>,
    in_world: bool,
}

/// All connected sessions and their outbound queues. Lives outside
/// the world lock: broadcast fan-out never blocks gameplay.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<PlayerId, SessionHandle>>,
    next_id: AtomicU64,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Session ids are handed out monotonically; they double as the
    /// player id and the join-order key.
    pub fn allocate_id(&self) -> PlayerId {
        PlayerId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    pub fn register(&self, id: PlayerId, sender: tokio::sync::mpsc::Sender<Frame>) {
        self.sessions
            .write()
            .insert(id, SessionHandle { sender, in_world: false });
    }

    pub fn set_in_world(&self, id: PlayerId, in_world: bool) {
        if let Some(handle) = self.sessions.write().get_mut(&id) {
            handle.in_world = in_world;
        }
    }

    pub fn unregister(&self, id: PlayerId) {
        self.sessions.write().remove(&id);
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    fn encode(message: &ServerMessage) -> Option<Frame> {
        match serde_json::to_string(message) {
            Ok(line) => Some(Arc::new(line)),
            Err(error) => {
                log::error!("Failed to encode server message: {}", error);
                None
            }
        }
    }

    /// Enqueue one frame; a full queue disconnects the slow session by
    /// dropping its sender.
    fn enqueue(&self, id: PlayerId, frame: Frame) {
        let full = {
            let sessions = self.sessions.read();
            let Some(handle) = sessions.get(&id) else {
                return;
            };
            match handle.sender.try_send(frame) {
                Ok(()) => false,
                Err(tokio::sync::mpsc::error::TrySendError::Full(_)) => true,
                Err(tokio::sync::mpsc::error::TrySendError::Closed(_)) => false,
            }
        };

        if full {
            log::warn!("Session {} overflowed its outbound queue; disconnecting", id);
            self.unregister(id);
        }
    }

    pub fn send_to(&self, id: PlayerId, message: &ServerMessage) {
        if let Some(frame) = Self::encode(message) {
            self.enqueue(id, frame);
        }
    }

    /// Fan a message out to every in-world session.
    pub fn broadcast(&self, message: &ServerMessage) {
        self.broadcast_except(None, message);
    }

    pub fn broadcast_except(&self, except: Option<PlayerId>, message: &ServerMessage) {
        let Some(frame) = Self::encode(message) else {
            return;
        };
        let targets: Vec<PlayerId> = {
            let sessions = self.sessions.read();
            sessions
                .iter()
                .filter(|(id, handle)| handle.in_world && Some(**id) != except)
                .map(|(id, _)| *id)
                .collect()
        };
        for id in targets {
            self.enqueue(id, frame.clone());
        }
    }

    /// Deliver a batch of world-produced messages in order.
    pub fn dispatch(&self, outbox: Vec<Outbound>) {
        for outbound in outbox {
            match outbound {
                Outbound::Broadcast(message) => self.broadcast(&message),
                Outbound::To(id, message) => self.send_to(id, &message),
            }
        }
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic() {
        let registry = SessionRegistry::new();
        let first = registry.allocate_id();
        let second = registry.allocate_id();
        assert!(second > first);
    }

    #[test]
    fn broadcast_skips_sessions_outside_the_world() {
        let registry = SessionRegistry::new();
        let (tx_a, mut rx_a) = tokio::sync::mpsc::channel(8);
        let (tx_b, mut rx_b) = tokio::sync::mpsc::channel(8);
        let a = registry.allocate_id();
        let b = registry.allocate_id();
        registry.register(a, tx_a);
        registry.register(b, tx_b);
        registry.set_in_world(a, true);

        registry.broadcast(&ServerMessage::PlayerDisconnected { player_id: a });
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn overflow_unregisters_the_session() {
        let registry = SessionRegistry::new();
        let (tx, _rx) = tokio::sync::mpsc::channel(1);
        let id = registry.allocate_id();
        registry.register(id, tx);
        registry.set_in_world(id, true);

        let message = ServerMessage::PlayerDisconnected { player_id: id };
        registry.send_to(id, &message);
        registry.send_to(id, &message);
        assert_eq!(registry.session_count(), 0);
    }
}
