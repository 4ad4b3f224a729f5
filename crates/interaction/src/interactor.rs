use tracing::{debug, error, info, warn};

use crate::config::InteractorConfig;
use crate::events::InteractionEvent;
use crate::node::Node;
use crate::point::StartOutcome;
use crate::probe::TargetingProbe;
use crate::replication::{Command, ReplicationChannel};
use crate::types::{
    ActorId, InteractionKind, InteractionResult, PointId, VisibilityPolicy,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractorPhase {
    Idle,
    /// A start command is in flight to the authority.
    Requesting,
    Interacting,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Interactor {
    actor: ActorId,
    config: InteractorConfig,
    is_interacting: bool,
    focused: Option<PointId>,
    requested_at: Option<f64>,
    stop_requested: bool,
}

impl Interactor {
    pub(crate) fn new(actor: ActorId, config: InteractorConfig) -> Self {
        Self {
            actor,
            config,
            is_interacting: false,
            focused: None,
            requested_at: None,
            stop_requested: false,
        }
    }

    pub fn actor(&self) -> ActorId {
        self.actor
    }

    pub fn config(&self) -> &InteractorConfig {
        &self.config
    }

    pub fn is_interacting(&self) -> bool {
        self.is_interacting
    }

    pub fn focused_target(&self) -> Option<PointId> {
        self.focused
    }

    pub fn state_visibility(&self) -> VisibilityPolicy {
        self.config.state_visibility
    }

    pub fn reach_distance(&self) -> f32 {
        self.config.reach_distance
    }

    pub fn phase(&self) -> InteractorPhase {
        if self.is_interacting {
            InteractorPhase::Interacting
        } else if self.requested_at.is_some() {
            InteractorPhase::Requesting
        } else {
            InteractorPhase::Idle
        }
    }

    pub(crate) fn set_interacting(&mut self, interacting: bool) {
        self.is_interacting = interacting;
        self.requested_at = None;
        self.stop_requested = false;
    }

    pub(crate) fn set_focused(&mut self, point: Option<PointId>) {
        self.focused = point;
    }

    pub(crate) fn mark_requesting(&mut self, now: f64) {
        if !self.is_interacting {
            self.requested_at = Some(now);
            self.stop_requested = false;
        }
    }

    pub(crate) fn stop_requested(&self) -> bool {
        self.stop_requested
    }

    pub(crate) fn mark_stop_requested(&mut self) {
        self.stop_requested = true;
    }

    pub(crate) fn clear_request(&mut self) {
        self.requested_at = None;
    }

    pub(crate) fn request_expired(&self, now: f64) -> bool {
        self.requested_at.is_some_and(|since| {
            now - since >= f64::from(self.config.request_timeout_seconds)
        })
    }
}

impl<P: TargetingProbe, C: ReplicationChannel> Node<P, C> {
    /// Requests a start. Off-authority this only forwards the command; the
    /// authority re-derives the target itself and never trusts the caller's
    /// focus.
    pub fn try_start_interaction(&mut self, actor: ActorId) {
        let now = self.now_seconds();
        let authority = self.has_authority();
        let Some(interactor) = self.interactors.get_mut(&actor) else {
            warn!(actor = actor.0, "start_unknown_interactor");
            return;
        };
        if !authority {
            interactor.mark_requesting(now);
            self.channel.send_command(actor, Command::TryStartInteraction);
            debug!(actor = actor.0, "start_forwarded_to_authority");
            return;
        }
        if interactor.is_interacting() {
            warn!(actor = actor.0, "start_rejected_already_interacting");
            return;
        }
        let reach = interactor.reach_distance();

        let Some(hit) = self.probe.try_get_interaction(actor, reach) else {
            debug!(actor = actor.0, "start_rejected_no_candidate");
            return;
        };
        let Some(point) = self.points.get(&hit.point) else {
            warn!(actor = actor.0, point = hit.point.0, "start_rejected_unknown_point");
            return;
        };
        let point_id = point.id();
        if !self.point_can_interact_with(point_id, actor) {
            debug!(actor = actor.0, point = point_id.0, "start_rejected_by_point");
            return;
        }
        if !self.interactor_can_interact_with(actor, point_id) {
            debug!(actor = actor.0, point = point_id.0, "start_rejected_by_interactor");
            return;
        }

        self.bind_target(actor, point_id);
        self.deadlines.cancel(actor);
        self.set_interacting(actor, true);

        let outcome = match self.points.get_mut(&point_id) {
            Some(point) => point.start_interaction(actor, now),
            None => StartOutcome::Rejected,
        };
        match outcome {
            StartOutcome::Rejected => {
                info!(actor = actor.0, point = point_id.0, "start_rejected_by_target");
                self.set_interacting(actor, false);
                self.notify_interaction(actor, InteractionResult::Failed, Some(point_id));
            }
            StartOutcome::Accepted => {
                if let Some(duration) = self.interaction_duration(point_id) {
                    self.deadlines.schedule(actor, now + f64::from(duration));
                }
                info!(actor = actor.0, point = point_id.0, "interaction_started");
                self.notify_interaction(actor, InteractionResult::Started, Some(point_id));
            }
            StartOutcome::Completed(result) => {
                info!(actor = actor.0, point = point_id.0, "interaction_started");
                self.notify_interaction(actor, InteractionResult::Started, Some(point_id));
                self.end_interaction(actor, result, point_id);
            }
        }
    }

    pub fn try_stop_interaction(&mut self, actor: ActorId) {
        let Some(interactor) = self.interactors.get(&actor) else {
            warn!(actor = actor.0, "stop_unknown_interactor");
            return;
        };
        if !self.has_authority() {
            if interactor.is_interacting() && interactor.stop_requested() {
                debug!(actor = actor.0, "stop_already_forwarded");
                return;
            }
            if let Some(interactor) = self.interactors.get_mut(&actor) {
                interactor.mark_stop_requested();
            }
            self.channel.send_command(actor, Command::TryStopInteraction);
            debug!(actor = actor.0, "stop_forwarded_to_authority");
            return;
        }
        if !interactor.is_interacting() {
            debug!(actor = actor.0, "stop_ignored_not_interacting");
            return;
        }
        let Some(point_id) = interactor.focused_target() else {
            debug!(actor = actor.0, "stop_ignored_no_target");
            return;
        };
        let Some(point) = self.points.get_mut(&point_id) else {
            warn!(actor = actor.0, point = point_id.0, "stop_unknown_point");
            return;
        };
        match point.stop_interaction(actor) {
            Some(result) => self.end_interaction(actor, result, point_id),
            None => debug!(actor = actor.0, point = point_id.0, "stop_nothing_in_progress"),
        }
    }

    /// Single authority-side completion entry point. A result from anything
    /// but the bound target is coerced to `Failed`; a result for an
    /// interactor that is not interacting is dropped.
    pub fn end_interaction(&mut self, actor: ActorId, result: InteractionResult, from: PointId) {
        if !self.has_authority() {
            warn!(actor = actor.0, "end_interaction_on_non_authority");
            return;
        }
        let Some(interactor) = self.interactors.get(&actor) else {
            warn!(actor = actor.0, "end_interaction_unknown_interactor");
            return;
        };
        if !interactor.is_interacting() {
            warn!(
                actor = actor.0,
                from = from.0,
                result = result.as_token(),
                "end_interaction_not_interacting"
            );
            return;
        }
        let bound = interactor.focused_target();
        let mut result = result;
        if bound != Some(from) {
            warn!(
                actor = actor.0,
                from = from.0,
                bound = bound.map(|point| point.0),
                "end_interaction_target_mismatch"
            );
            result = InteractionResult::Failed;
            if let Some(point) = bound.and_then(|point| self.points.get_mut(&point)) {
                point.forget_interactor(actor);
            }
        }

        self.set_interacting(actor, false);
        self.deadlines.cancel(actor);

        match result {
            InteractionResult::Successful => info!(actor = actor.0, "interaction_successful"),
            InteractionResult::Failed => info!(actor = actor.0, "interaction_failed"),
            InteractionResult::Interrupted => info!(actor = actor.0, "interaction_interrupted"),
            InteractionResult::None | InteractionResult::Started => {
                debug!(actor = actor.0, result = result.as_token(), "interaction_ended")
            }
        }
        self.notify_interaction(actor, result, bound.or(Some(from)));
    }

    /// This interactor's side of the symmetric capability check.
    pub fn interactor_can_interact_with(&self, actor: ActorId, point: PointId) -> bool {
        let Some(entry) = self.points.get(&point) else {
            warn!(actor = actor.0, point = point.0, "can_interact_unknown_point");
            return false;
        };
        self.capability_allows(actor, entry.owner())
    }

    /// The target's side of the symmetric capability check.
    pub fn point_can_interact_with(&self, point: PointId, actor: ActorId) -> bool {
        let Some(entry) = self.points.get(&point) else {
            return false;
        };
        if !self.interactors.contains_key(&actor) {
            warn!(actor = actor.0, point = point.0, "can_interact_unknown_interactor");
            return false;
        }
        self.capability_allows(entry.owner(), actor)
    }

    pub(crate) fn on_deadline_elapsed(&mut self, actor: ActorId) {
        let Some(interactor) = self.interactors.get(&actor) else {
            return;
        };
        if !interactor.is_interacting() {
            debug!(actor = actor.0, "deadline_without_interaction");
            return;
        }
        let Some(point_id) = interactor.focused_target() else {
            error!(actor = actor.0, "deadline_without_bound_target");
            self.set_interacting(actor, false);
            self.notify_interaction(actor, InteractionResult::Failed, None);
            return;
        };
        let now = self.now_seconds();
        let result = match self.points.get_mut(&point_id) {
            Some(point) if point.kind() == InteractionKind::Timed => {
                point.hold_completed(actor, now)
            }
            Some(point) => {
                error!(
                    actor = actor.0,
                    point = point_id.0,
                    kind = point.kind().as_token(),
                    "deadline_on_non_timed_target"
                );
                InteractionResult::Failed
            }
            None => {
                error!(actor = actor.0, point = point_id.0, "deadline_on_missing_target");
                InteractionResult::Failed
            }
        };
        self.end_interaction(actor, result, point_id);
    }

    /// Focus loop for a local interactor: follow the view while idle,
    /// re-validate the bound target while interacting. Focus is held while a
    /// start is in flight so the target the authority binds is the one
    /// checked once the flag arrives.
    pub(crate) fn tick_focus(&mut self, actor: ActorId) {
        let Some(interactor) = self.interactors.get(&actor) else {
            return;
        };
        let focused = interactor.focused_target();
        let candidate = self
            .probe
            .try_get_interaction(actor, interactor.reach_distance())
            .map(|hit| hit.point)
            .filter(|point| self.points.contains_key(point));

        if interactor.is_interacting() {
            match focused {
                Some(_) if candidate != focused => {
                    debug!(actor = actor.0, "bound_target_lost");
                    self.deregister_focus(actor);
                }
                Some(_) => {}
                None => self.stop_unbound(actor),
            }
            return;
        }
        if focused.is_some() && interactor.phase() == InteractorPhase::Requesting {
            return;
        }

        match candidate {
            Some(point) if Some(point) != focused => self.register_focus(actor, point),
            Some(_) => {}
            None if focused.is_some() => self.deregister_focus(actor),
            None => {}
        }
    }

    pub(crate) fn register_focus(&mut self, actor: ActorId, point: PointId) {
        let Some(interactor) = self.interactors.get(&actor) else {
            return;
        };
        if interactor.focused_target() == Some(point) {
            return;
        }
        if interactor.focused_target().is_some() {
            self.deregister_focus(actor);
        }
        if let Some(interactor) = self.interactors.get_mut(&actor) {
            interactor.set_focused(Some(point));
        }
        self.emit_focus_changed(point, true);
        self.events.emit(InteractionEvent::NewFocusTarget {
            interactor: actor,
            point: Some(point),
        });
    }

    /// Drops focus; an interaction still in progress is asked to stop first
    /// so its completion still matches the bound target.
    pub(crate) fn deregister_focus(&mut self, actor: ActorId) {
        let Some(interactor) = self.interactors.get(&actor) else {
            return;
        };
        let Some(old) = interactor.focused_target() else {
            return;
        };
        if interactor.is_interacting() {
            self.try_stop_interaction(actor);
        }
        if self.has_authority() {
            if self.interactors.get(&actor).is_some_and(Interactor::is_interacting) {
                warn!(actor = actor.0, point = old.0, "focus_lost_interaction_unresolved");
                self.end_interaction(actor, InteractionResult::Interrupted, old);
            }
            self.deadlines.cancel(actor);
        }
        if let Some(interactor) = self.interactors.get_mut(&actor) {
            interactor.set_focused(None);
        }
        self.emit_focus_changed(old, false);
        self.events.emit(InteractionEvent::NewFocusTarget {
            interactor: actor,
            point: None,
        });
    }

    /// Interacting with nothing focused. A client asks the authority to stop;
    /// the authority resolves it directly.
    fn stop_unbound(&mut self, actor: ActorId) {
        if !self.has_authority() {
            self.try_stop_interaction(actor);
            return;
        }
        warn!(actor = actor.0, "interacting_without_bound_target");
        for point in self.points.values_mut() {
            point.forget_interactor(actor);
        }
        self.set_interacting(actor, false);
        self.deadlines.cancel(actor);
        self.notify_interaction(actor, InteractionResult::Interrupted, None);
    }

    /// Authority binding of a freshly acquired target. Local nodes go
    /// through focus registration so focus events stay paired.
    fn bind_target(&mut self, actor: ActorId, point: PointId) {
        if self.is_local_interactor(actor) {
            self.register_focus(actor, point);
        } else if let Some(interactor) = self.interactors.get_mut(&actor) {
            interactor.set_focused(Some(point));
        }
    }

    fn emit_focus_changed(&mut self, point: PointId, focused: bool) {
        let visible = self
            .points
            .get(&point)
            .is_some_and(|entry| entry.visibility() != VisibilityPolicy::None);
        if visible {
            self.events
                .emit(InteractionEvent::FocusChanged { point, focused });
        }
    }
}
