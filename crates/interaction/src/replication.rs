use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{ActorId, InteractionKind, InteractionResult, PointId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    TryStartInteraction,
    TryStopInteraction,
}

/// A point's own state change, scoped by the point's visibility policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointStateNotice {
    pub point: PointId,
    pub result: InteractionResult,
    pub interactor: ActorId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notification {
    InteractorState {
        result: InteractionResult,
        kind: InteractionKind,
        target_actor: Option<ActorId>,
        /// Set when both policies are owner-only; the target's notice rides
        /// along instead of going out as a second message.
        point_state: Option<PointStateNotice>,
    },
    PointState(PointStateNotice),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyUpdate {
    Interacting(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payload {
    Command(Command),
    Notification(Notification),
    Property(PropertyUpdate),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub actor: ActorId,
    pub payload: Payload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    ToAuthority,
    ToOwner,
    Broadcast,
}

/// Fire-and-forget transport between the authority and its observers.
///
/// Commands travel to the authority copy of `actor`; notifications travel to
/// the owning node or to every observer; property updates reach every
/// non-authority observer.
pub trait ReplicationChannel {
    fn send_command(&mut self, actor: ActorId, command: Command);

    fn send_to_owner(&mut self, actor: ActorId, notification: Notification);

    fn send_broadcast(&mut self, actor: ActorId, notification: Notification);

    fn sync_property(&mut self, actor: ActorId, update: PropertyUpdate);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outgoing {
    pub route: Route,
    pub envelope: Envelope,
}

/// Buffers outgoing traffic until a transport drains it.
#[derive(Debug, Default)]
pub struct Outbox {
    pending: Vec<Outgoing>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&mut self) -> Vec<Outgoing> {
        std::mem::take(&mut self.pending)
    }

    pub fn pending(&self) -> &[Outgoing] {
        &self.pending
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    fn push(&mut self, route: Route, actor: ActorId, payload: Payload) {
        self.pending.push(Outgoing {
            route,
            envelope: Envelope { actor, payload },
        });
    }
}

impl ReplicationChannel for Outbox {
    fn send_command(&mut self, actor: ActorId, command: Command) {
        self.push(Route::ToAuthority, actor, Payload::Command(command));
    }

    fn send_to_owner(&mut self, actor: ActorId, notification: Notification) {
        self.push(Route::ToOwner, actor, Payload::Notification(notification));
    }

    fn send_broadcast(&mut self, actor: ActorId, notification: Notification) {
        self.push(Route::Broadcast, actor, Payload::Notification(notification));
    }

    fn sync_property(&mut self, actor: ActorId, update: PropertyUpdate) {
        self.push(Route::Broadcast, actor, Payload::Property(update));
    }
}

#[derive(Debug, Error)]
pub enum WireError {
    #[error("failed to encode envelope: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to decode envelope: {0}")]
    Decode(#[source] serde_json::Error),
}

pub fn encode_envelope(envelope: &Envelope) -> Result<String, WireError> {
    serde_json::to_string(envelope).map_err(WireError::Encode)
}

pub fn decode_envelope(raw: &str) -> Result<Envelope, WireError> {
    serde_json::from_str(raw).map_err(WireError::Decode)
}
