use crate::types::{ActorId, InteractionKind, InteractionResult, PointId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionEvent {
    FocusChanged {
        point: PointId,
        focused: bool,
    },
    InteractionStateChanged {
        point: PointId,
        result: InteractionResult,
        interactor: ActorId,
    },
    InteractorStateChanged {
        interactor: ActorId,
        result: InteractionResult,
        kind: InteractionKind,
        target_actor: Option<ActorId>,
    },
    NewFocusTarget {
        interactor: ActorId,
        point: Option<PointId>,
    },
    InteractingChanged {
        interactor: ActorId,
        interacting: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionEventKind {
    FocusChanged,
    InteractionStateChanged,
    InteractorStateChanged,
    NewFocusTarget,
    InteractingChanged,
}

impl InteractionEvent {
    pub fn kind(self) -> InteractionEventKind {
        match self {
            Self::FocusChanged { .. } => InteractionEventKind::FocusChanged,
            Self::InteractionStateChanged { .. } => InteractionEventKind::InteractionStateChanged,
            Self::InteractorStateChanged { .. } => InteractionEventKind::InteractorStateChanged,
            Self::NewFocusTarget { .. } => InteractionEventKind::NewFocusTarget,
            Self::InteractingChanged { .. } => InteractionEventKind::InteractingChanged,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventCounts {
    pub total: u32,
    pub focus_changed: u32,
    pub interaction_state_changed: u32,
    pub interactor_state_changed: u32,
    pub new_focus_target: u32,
    pub interacting_changed: u32,
}

impl EventCounts {
    fn record(&mut self, kind: InteractionEventKind) {
        self.total = self.total.saturating_add(1);
        match kind {
            InteractionEventKind::FocusChanged => {
                self.focus_changed = self.focus_changed.saturating_add(1)
            }
            InteractionEventKind::InteractionStateChanged => {
                self.interaction_state_changed = self.interaction_state_changed.saturating_add(1)
            }
            InteractionEventKind::InteractorStateChanged => {
                self.interactor_state_changed = self.interactor_state_changed.saturating_add(1)
            }
            InteractionEventKind::NewFocusTarget => {
                self.new_focus_target = self.new_focus_target.saturating_add(1)
            }
            InteractionEventKind::InteractingChanged => {
                self.interacting_changed = self.interacting_changed.saturating_add(1)
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct EventBus {
    pending: Vec<InteractionEvent>,
    current_tick_counts: EventCounts,
    last_tick_counts: EventCounts,
    lifetime_counts: EventCounts,
}

impl EventBus {
    pub fn emit(&mut self, event: InteractionEvent) {
        let kind = event.kind();
        self.current_tick_counts.record(kind);
        self.lifetime_counts.record(kind);
        self.pending.push(event);
    }

    pub fn drain(&mut self) -> Vec<InteractionEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn pending(&self) -> &[InteractionEvent] {
        &self.pending
    }

    pub fn finish_tick_rollover(&mut self) {
        self.last_tick_counts = std::mem::take(&mut self.current_tick_counts);
    }

    pub fn last_tick_counts(&self) -> EventCounts {
        self.last_tick_counts
    }

    pub fn lifetime_counts(&self) -> EventCounts {
        self.lifetime_counts
    }
}
