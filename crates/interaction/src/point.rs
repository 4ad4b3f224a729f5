use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{is_positive_finite, PointBehaviorConfig, PointConfig};
use crate::types::{ActorId, InteractionKind, InteractionResult, PointId, VisibilityPolicy};

/// Slack subtracted from the required hold duration so a deadline that fires
/// a little early (tick/timer granularity) still counts.
pub const HOLD_TOLERANCE_SECONDS: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InteractionError {
    #[error("interaction duration must be finite and > 0, got {0}")]
    InvalidDuration(f32),
    #[error("{0} has no adjustable duration")]
    NotTimed(PointId),
    #[error("unknown actor {0}")]
    UnknownActor(ActorId),
    #[error("unknown interaction point {0}")]
    UnknownPoint(PointId),
    #[error("{0} is already registered")]
    DuplicateActor(ActorId),
    #[error("{0} is already registered")]
    DuplicatePoint(PointId),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Rejected,
    Accepted,
    Completed(InteractionResult),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimedState {
    required_duration: f32,
    active_interactors: HashMap<ActorId, f64>,
}

impl TimedState {
    fn new(required_duration: f32) -> Self {
        Self {
            required_duration,
            active_interactors: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PointBehavior {
    Instant,
    Timed(TimedState),
}

#[derive(Debug, Clone, PartialEq)]
pub struct InteractionPoint {
    id: PointId,
    owner: ActorId,
    allow_concurrent_interactors: bool,
    visibility: VisibilityPolicy,
    behavior: PointBehavior,
}

impl InteractionPoint {
    pub fn new(id: PointId, owner: ActorId, config: &PointConfig) -> Result<Self, InteractionError> {
        let behavior = match config.behavior {
            PointBehaviorConfig::Instant => PointBehavior::Instant,
            PointBehaviorConfig::Timed { duration_seconds } => {
                if !is_positive_finite(duration_seconds) {
                    return Err(InteractionError::InvalidDuration(duration_seconds));
                }
                PointBehavior::Timed(TimedState::new(duration_seconds))
            }
        };
        Ok(Self {
            id,
            owner,
            allow_concurrent_interactors: config.allow_concurrent_interactors,
            visibility: config.visibility,
            behavior,
        })
    }

    pub fn id(&self) -> PointId {
        self.id
    }

    pub fn owner(&self) -> ActorId {
        self.owner
    }

    pub fn visibility(&self) -> VisibilityPolicy {
        self.visibility
    }

    pub fn allows_concurrent_interactors(&self) -> bool {
        self.allow_concurrent_interactors
    }

    pub fn kind(&self) -> InteractionKind {
        match self.behavior {
            PointBehavior::Instant => InteractionKind::Instant,
            PointBehavior::Timed(_) => InteractionKind::Timed,
        }
    }

    pub fn interaction_duration(&self) -> Option<f32> {
        match &self.behavior {
            PointBehavior::Instant => None,
            PointBehavior::Timed(state) => Some(state.required_duration),
        }
    }

    /// Takes effect for holds started after the change; open holds keep
    /// their already-scheduled deadline.
    pub fn set_interaction_duration(&mut self, value: f32) -> Result<(), InteractionError> {
        if !is_positive_finite(value) {
            return Err(InteractionError::InvalidDuration(value));
        }
        match &mut self.behavior {
            PointBehavior::Instant => Err(InteractionError::NotTimed(self.id)),
            PointBehavior::Timed(state) => {
                state.required_duration = value;
                Ok(())
            }
        }
    }

    pub fn is_active_interactor(&self, interactor: ActorId) -> bool {
        match &self.behavior {
            PointBehavior::Instant => false,
            PointBehavior::Timed(state) => state.active_interactors.contains_key(&interactor),
        }
    }

    pub fn active_interactor_count(&self) -> usize {
        match &self.behavior {
            PointBehavior::Instant => 0,
            PointBehavior::Timed(state) => state.active_interactors.len(),
        }
    }

    /// Capability checks are resolved by the caller; this only applies the
    /// variant's own admission policy.
    pub fn start_interaction(&mut self, interactor: ActorId, now_seconds: f64) -> StartOutcome {
        let allow_concurrent = self.allow_concurrent_interactors;
        match &mut self.behavior {
            PointBehavior::Instant => StartOutcome::Completed(InteractionResult::Successful),
            PointBehavior::Timed(state) => {
                if state.active_interactors.contains_key(&interactor) {
                    warn!(
                        point = self.id.0,
                        interactor = interactor.0,
                        "timed_start_rejected_already_active"
                    );
                    return StartOutcome::Rejected;
                }
                if !allow_concurrent && !state.active_interactors.is_empty() {
                    debug!(
                        point = self.id.0,
                        interactor = interactor.0,
                        active = state.active_interactors.len(),
                        "timed_start_rejected_concurrency"
                    );
                    return StartOutcome::Rejected;
                }
                state.active_interactors.insert(interactor, now_seconds);
                StartOutcome::Accepted
            }
        }
    }

    /// Returns the result to hand back to the interactor, or `None` when
    /// there was nothing in progress to stop.
    pub fn stop_interaction(&mut self, interactor: ActorId) -> Option<InteractionResult> {
        match &mut self.behavior {
            PointBehavior::Instant => None,
            PointBehavior::Timed(state) => state
                .active_interactors
                .remove(&interactor)
                .map(|_| InteractionResult::Interrupted),
        }
    }

    /// Resolves an open hold. Instant points and interactors without an
    /// open hold resolve as `Failed`.
    pub fn hold_completed(&mut self, interactor: ActorId, now_seconds: f64) -> InteractionResult {
        let PointBehavior::Timed(state) = &mut self.behavior else {
            return InteractionResult::Failed;
        };
        let Some(started_at) = state.active_interactors.remove(&interactor) else {
            warn!(
                point = self.id.0,
                interactor = interactor.0,
                "hold_completed_without_active_entry"
            );
            return InteractionResult::Failed;
        };
        let elapsed = now_seconds - started_at;
        if hold_duration_met(elapsed, state.required_duration) {
            InteractionResult::Successful
        } else {
            InteractionResult::Failed
        }
    }

    /// Drops any open hold for an interactor that went away.
    pub fn forget_interactor(&mut self, interactor: ActorId) -> bool {
        match &mut self.behavior {
            PointBehavior::Instant => false,
            PointBehavior::Timed(state) => state.active_interactors.remove(&interactor).is_some(),
        }
    }
}

pub fn hold_duration_met(elapsed_seconds: f64, required_duration: f32) -> bool {
    elapsed_seconds >= f64::from(required_duration) - HOLD_TOLERANCE_SECONDS
}
