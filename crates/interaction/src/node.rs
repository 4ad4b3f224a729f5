use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};

use crate::config::{validate_interactor, InteractorConfig, PointConfig};
use crate::events::{EventBus, InteractionEvent};
use crate::fanout::{plan_fanout, Delivery, FanoutRequest, FanoutTarget};
use crate::interactor::Interactor;
use crate::point::{InteractionError, InteractionPoint};
use crate::probe::TargetingProbe;
use crate::replication::{
    Command, Envelope, Notification, Payload, PropertyUpdate, ReplicationChannel,
};
use crate::scheduler::DeadlineScheduler;
use crate::types::{
    ActorId, InteractionKind, InteractionResult, NetMode, NetRole, NodeId, PointId,
};

/// Game-content veto consulted before a start is accepted.
pub trait CapabilityCheck {
    fn can_interact_with(&self, self_owner: ActorId, other_owner: ActorId) -> bool;
}

impl<F> CapabilityCheck for F
where
    F: Fn(ActorId, ActorId) -> bool,
{
    fn can_interact_with(&self, self_owner: ActorId, other_owner: ActorId) -> bool {
        self(self_owner, other_owner)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorRecord {
    /// Node that locally controls the actor; `None` when the authority does.
    pub owner: Option<NodeId>,
}

/// One simulated network node and its copy of every interaction component.
pub struct Node<P, C> {
    id: NodeId,
    mode: NetMode,
    now_seconds: f64,
    actors: BTreeMap<ActorId, ActorRecord>,
    pub(crate) points: BTreeMap<PointId, InteractionPoint>,
    pub(crate) interactors: BTreeMap<ActorId, Interactor>,
    capabilities: HashMap<ActorId, Box<dyn CapabilityCheck>>,
    pub(crate) probe: P,
    pub(crate) deadlines: DeadlineScheduler,
    pub(crate) events: EventBus,
    pub(crate) channel: C,
}

impl<P: TargetingProbe, C: ReplicationChannel> Node<P, C> {
    pub fn new(id: NodeId, mode: NetMode, probe: P, channel: C) -> Self {
        Self {
            id,
            mode,
            now_seconds: 0.0,
            actors: BTreeMap::new(),
            points: BTreeMap::new(),
            interactors: BTreeMap::new(),
            capabilities: HashMap::new(),
            probe,
            deadlines: DeadlineScheduler::default(),
            events: EventBus::default(),
            channel,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn mode(&self) -> NetMode {
        self.mode
    }

    pub fn now_seconds(&self) -> f64 {
        self.now_seconds
    }

    pub fn has_authority(&self) -> bool {
        self.mode.is_authority()
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    pub fn probe_mut(&mut self) -> &mut P {
        &mut self.probe
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<InteractionEvent> {
        self.events.drain()
    }

    pub fn deadlines(&self) -> &DeadlineScheduler {
        &self.deadlines
    }

    pub fn register_actor(
        &mut self,
        actor: ActorId,
        owner: Option<NodeId>,
    ) -> Result<(), InteractionError> {
        if self.actors.contains_key(&actor) {
            return Err(InteractionError::DuplicateActor(actor));
        }
        self.actors.insert(actor, ActorRecord { owner });
        Ok(())
    }

    pub fn actor(&self, actor: ActorId) -> Option<ActorRecord> {
        self.actors.get(&actor).copied()
    }

    pub fn add_point(
        &mut self,
        point: PointId,
        owner: ActorId,
        config: &PointConfig,
    ) -> Result<(), InteractionError> {
        if !self.actors.contains_key(&owner) {
            return Err(InteractionError::UnknownActor(owner));
        }
        if self.points.contains_key(&point) {
            return Err(InteractionError::DuplicatePoint(point));
        }
        let created = InteractionPoint::new(point, owner, config)?;
        self.points.insert(point, created);
        Ok(())
    }

    pub fn add_interactor(
        &mut self,
        actor: ActorId,
        config: InteractorConfig,
    ) -> Result<(), InteractionError> {
        if !self.actors.contains_key(&actor) {
            return Err(InteractionError::UnknownActor(actor));
        }
        if self.interactors.contains_key(&actor) {
            return Err(InteractionError::DuplicateActor(actor));
        }
        validate_interactor(&config)
            .map_err(|error| InteractionError::InvalidConfig(error.to_string()))?;
        self.interactors.insert(actor, Interactor::new(actor, config));
        Ok(())
    }

    pub fn set_capability(&mut self, actor: ActorId, check: Box<dyn CapabilityCheck>) {
        self.capabilities.insert(actor, check);
    }

    pub fn clear_capability(&mut self, actor: ActorId) {
        self.capabilities.remove(&actor);
    }

    pub fn point(&self, point: PointId) -> Option<&InteractionPoint> {
        self.points.get(&point)
    }

    pub fn interactor(&self, actor: ActorId) -> Option<&Interactor> {
        self.interactors.get(&actor)
    }

    pub fn interaction_kind(&self, point: PointId) -> InteractionKind {
        self.points
            .get(&point)
            .map(InteractionPoint::kind)
            .unwrap_or(InteractionKind::None)
    }

    pub fn interaction_duration(&self, point: PointId) -> Option<f32> {
        self.points
            .get(&point)
            .and_then(InteractionPoint::interaction_duration)
    }

    pub fn set_interaction_duration(
        &mut self,
        point: PointId,
        value: f32,
    ) -> Result<(), InteractionError> {
        self.points
            .get_mut(&point)
            .ok_or(InteractionError::UnknownPoint(point))?
            .set_interaction_duration(value)
    }

    /// Tears down everything the actor hosts. Interactors bound to one of
    /// its points resolve as `Failed` first.
    pub fn remove_actor(&mut self, actor: ActorId) {
        let owned_points = self
            .points
            .values()
            .filter(|point| point.owner() == actor)
            .map(InteractionPoint::id)
            .collect::<Vec<_>>();
        let bound = self
            .interactors
            .values()
            .filter_map(|interactor| {
                interactor
                    .focused_target()
                    .filter(|point| owned_points.contains(point))
                    .map(|point| (interactor.actor(), interactor.is_interacting(), point))
            })
            .collect::<Vec<_>>();
        for (interactor, interacting, point) in bound {
            if interacting && self.has_authority() {
                warn!(
                    interactor = interactor.0,
                    point = point.0,
                    "bound_point_destroyed"
                );
                self.end_interaction(interactor, InteractionResult::Failed, point);
            }
            if let Some(entry) = self.interactors.get_mut(&interactor) {
                entry.set_focused(None);
            }
        }
        for point in owned_points {
            self.points.remove(&point);
        }

        if self.interactors.remove(&actor).is_some() {
            self.deadlines.cancel(actor);
            for point in self.points.values_mut() {
                point.forget_interactor(actor);
            }
        }
        self.capabilities.remove(&actor);
        self.actors.remove(&actor);
    }

    pub fn role_of(&self, actor: ActorId) -> NetRole {
        let Some(record) = self.actors.get(&actor) else {
            return NetRole::None;
        };
        if self.has_authority() {
            return NetRole::Authority;
        }
        if record.owner == Some(self.id) {
            NetRole::AutonomousProxy
        } else {
            NetRole::SimulatedProxy
        }
    }

    pub fn remote_role_of(&self, actor: ActorId) -> NetRole {
        let Some(record) = self.actors.get(&actor) else {
            return NetRole::None;
        };
        match self.mode {
            NetMode::Standalone => NetRole::None,
            NetMode::Client => NetRole::Authority,
            NetMode::DedicatedServer | NetMode::ListenServer => match record.owner {
                Some(owner) if owner != self.id => NetRole::AutonomousProxy,
                _ => NetRole::SimulatedProxy,
            },
        }
    }

    /// True on the node that runs focus acquisition for this actor.
    pub fn is_local_interactor(&self, actor: ActorId) -> bool {
        if !self.actors.contains_key(&actor) {
            return false;
        }
        let role = self.role_of(actor);
        match self.mode {
            NetMode::Standalone => true,
            NetMode::Client => role == NetRole::AutonomousProxy,
            NetMode::DedicatedServer | NetMode::ListenServer => {
                role == NetRole::Authority
                    && self.remote_role_of(actor) != NetRole::AutonomousProxy
            }
        }
    }

    pub(crate) fn owner_is_local(&self, actor: ActorId) -> bool {
        match self.actors.get(&actor).and_then(|record| record.owner) {
            None => self.has_authority(),
            Some(owner) => owner == self.id,
        }
    }

    pub(crate) fn capability_allows(&self, host: ActorId, other: ActorId) -> bool {
        self.capabilities
            .get(&host)
            .map_or(true, |check| check.can_interact_with(host, other))
    }

    /// One fixed step: due deadlines fire first, then every local
    /// interactor runs focus acquisition.
    pub fn advance(&mut self, dt_seconds: f32) {
        self.now_seconds += f64::from(dt_seconds);

        for actor in self.deadlines.take_due(self.now_seconds) {
            self.on_deadline_elapsed(actor);
        }

        let local = self
            .interactors
            .keys()
            .copied()
            .filter(|actor| self.is_local_interactor(*actor))
            .collect::<Vec<_>>();
        for actor in local {
            self.tick_focus(actor);
        }

        self.expire_stale_requests();
        self.events.finish_tick_rollover();
    }

    /// Applies one message that arrived from `from`.
    pub fn receive(&mut self, from: NodeId, envelope: Envelope) {
        let actor = envelope.actor;
        match envelope.payload {
            Payload::Command(command) => {
                if !self.has_authority() {
                    warn!(node = self.id.0, actor = actor.0, "command_on_non_authority");
                    return;
                }
                let owner = self.actors.get(&actor).and_then(|record| record.owner);
                if owner != Some(from) {
                    warn!(
                        node = self.id.0,
                        actor = actor.0,
                        sender = from.0,
                        "command_from_non_owner"
                    );
                    return;
                }
                match command {
                    Command::TryStartInteraction => self.try_start_interaction(actor),
                    Command::TryStopInteraction => self.try_stop_interaction(actor),
                }
            }
            Payload::Notification(notification) => self.deliver_notification(actor, notification),
            Payload::Property(PropertyUpdate::Interacting(interacting)) => {
                if self.has_authority() {
                    warn!(node = self.id.0, actor = actor.0, "property_sync_on_authority");
                    return;
                }
                self.apply_replicated_interacting(actor, interacting);
            }
        }
    }

    pub(crate) fn notify_interaction(
        &mut self,
        actor: ActorId,
        result: InteractionResult,
        point: Option<PointId>,
    ) {
        let Some(interactor) = self.interactors.get(&actor) else {
            return;
        };
        let target = point
            .and_then(|point| self.points.get(&point))
            .map(|point| FanoutTarget {
                point: point.id(),
                actor: point.owner(),
                kind: point.kind(),
                visibility: point.visibility(),
            });
        let plan = plan_fanout(FanoutRequest {
            interactor: actor,
            result,
            interactor_visibility: interactor.state_visibility(),
            owner_is_local: self.owner_is_local(actor),
            target,
        });
        debug!(
            node = self.id.0,
            actor = actor.0,
            result = result.as_token(),
            messages = plan.len(),
            "notify_interaction"
        );
        for (delivery, notification) in plan {
            match delivery {
                Delivery::Local => self.deliver_notification(actor, notification),
                Delivery::ToOwner => self.channel.send_to_owner(actor, notification),
                Delivery::LocalAndBroadcast => {
                    self.deliver_notification(actor, notification);
                    self.channel.send_broadcast(actor, notification);
                }
            }
        }
    }

    pub(crate) fn deliver_notification(&mut self, actor: ActorId, notification: Notification) {
        match notification {
            Notification::InteractorState {
                result,
                kind,
                target_actor,
                point_state,
            } => {
                self.events.emit(InteractionEvent::InteractorStateChanged {
                    interactor: actor,
                    result,
                    kind,
                    target_actor,
                });
                if let Some(notice) = point_state {
                    self.events.emit(InteractionEvent::InteractionStateChanged {
                        point: notice.point,
                        result: notice.result,
                        interactor: notice.interactor,
                    });
                }
                if result.is_terminal() && !self.has_authority() {
                    if let Some(interactor) = self.interactors.get_mut(&actor) {
                        interactor.clear_request();
                    }
                }
            }
            Notification::PointState(notice) => {
                self.events.emit(InteractionEvent::InteractionStateChanged {
                    point: notice.point,
                    result: notice.result,
                    interactor: notice.interactor,
                });
            }
        }
    }

    /// Authority-side write of the replicated flag.
    pub(crate) fn set_interacting(&mut self, actor: ActorId, interacting: bool) {
        let Some(interactor) = self.interactors.get_mut(&actor) else {
            return;
        };
        if interactor.is_interacting() == interacting {
            return;
        }
        interactor.set_interacting(interacting);
        self.channel
            .sync_property(actor, PropertyUpdate::Interacting(interacting));
        if self.mode != NetMode::DedicatedServer {
            self.events.emit(InteractionEvent::InteractingChanged {
                interactor: actor,
                interacting,
            });
        }
    }

    fn apply_replicated_interacting(&mut self, actor: ActorId, interacting: bool) {
        let Some(interactor) = self.interactors.get_mut(&actor) else {
            warn!(node = self.id.0, actor = actor.0, "property_sync_unknown_interactor");
            return;
        };
        let changed = interactor.is_interacting() != interacting;
        interactor.set_interacting(interacting);
        if changed {
            self.events.emit(InteractionEvent::InteractingChanged {
                interactor: actor,
                interacting,
            });
        }
    }

    fn expire_stale_requests(&mut self) {
        let now = self.now_seconds;
        for interactor in self.interactors.values_mut() {
            if interactor.request_expired(now) {
                debug!(actor = interactor.actor().0, "request_timed_out");
                interactor.clear_request();
            }
        }
    }
}
