pub mod config;
pub mod events;
pub mod fanout;
pub mod interactor;
pub mod loopback;
pub mod node;
pub mod point;
pub mod probe;
pub mod replication;
pub mod scheduler;
pub mod types;

#[cfg(test)]
mod tests;

pub use config::{
    validate_interactor, validate_point, ConfigError, InteractorConfig, NetworkConfig,
    PointBehaviorConfig, PointConfig, SandboxConfig, DEFAULT_DELIVERY_DELAY_TICKS,
    DEFAULT_FIXED_DT_SECONDS, DEFAULT_REACH_DISTANCE, DEFAULT_REQUEST_TIMEOUT_SECONDS,
    DEFAULT_TIMED_DURATION_SECONDS,
};
pub use events::{EventBus, EventCounts, InteractionEvent, InteractionEventKind};
pub use fanout::{plan_fanout, Delivery, FanoutRequest, FanoutTarget};
pub use interactor::{Interactor, InteractorPhase};
pub use loopback::{LoopbackNetwork, LoopbackNode, TrafficStats, AUTHORITY_NODE};
pub use node::{ActorRecord, CapabilityCheck, Node};
pub use point::{
    hold_duration_met, InteractionError, InteractionPoint, StartOutcome, HOLD_TOLERANCE_SECONDS,
};
pub use probe::{EyeView, ProbeHit, RayScene, TargetingProbe, FACING_THRESHOLD, PROBE_RANGE};
pub use replication::{
    decode_envelope, encode_envelope, Command, Envelope, Notification, Outbox, Outgoing, Payload,
    PointStateNotice, PropertyUpdate, ReplicationChannel, Route, WireError,
};
pub use scheduler::{Deadline, DeadlineScheduler};
pub use types::{
    ActorId, InteractionKind, InteractionResult, NetMode, NetRole, NodeId, PointId, Vec3,
    VisibilityPolicy, WorldTransform,
};
