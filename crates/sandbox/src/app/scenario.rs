use interaction::{
    ActorId, InteractionError, InteractionEvent, InteractionResult, LoopbackNetwork, NetMode,
    NodeId, PointBehaviorConfig, PointId, SandboxConfig, TrafficStats, Vec3, WorldTransform,
    AUTHORITY_NODE,
};
use tracing::{debug, info};

const HOLDER_NODE: NodeId = NodeId(1);
const OBSERVER_NODE: NodeId = NodeId(2);
const HOLDER: ActorId = ActorId(1);
const OBSERVER: ActorId = ActorId(2);
const DOOR: ActorId = ActorId(100);
const DOOR_POINT: PointId = PointId(1000);
const CRATE: ActorId = ActorId(200);
const CRATE_POINT: PointId = PointId(2000);
const TARGET_POSITION: Vec3 = Vec3::new(5.0, 0.0, 0.0);
const PLAYER_RADIUS: f32 = 0.5;
const TARGET_RADIUS: f32 = 1.0;
const SETTLE_SECONDS: f64 = 1.0;

pub(crate) struct ScenarioReport {
    pub(crate) name: &'static str,
    pub(crate) expected: Vec<InteractionResult>,
    pub(crate) observed: Vec<InteractionResult>,
    pub(crate) traffic: TrafficStats,
}

impl ScenarioReport {
    pub(crate) fn passed(&self) -> bool {
        self.expected == self.observed
    }
}

/// A held interaction on a dedicated server: interrupted once, then held to
/// completion, observed from the holder's client.
pub(crate) fn run_hold_scenario(config: &SandboxConfig) -> Result<ScenarioReport, InteractionError> {
    let PointBehaviorConfig::Timed { duration_seconds } = config.hold_point.behavior else {
        return Err(InteractionError::InvalidConfig(
            "hold scenario needs a timed point".to_string(),
        ));
    };
    let duration = f64::from(duration_seconds);
    let stop_at = duration * 0.3;
    let restart_at = duration * 0.5;

    let mut network = LoopbackNetwork::new(NetMode::DedicatedServer, 2, config.network)?;
    network.spawn_actor(HOLDER, Some(HOLDER_NODE), Vec3::ZERO, PLAYER_RADIUS)?;
    network.spawn_actor(
        OBSERVER,
        Some(OBSERVER_NODE),
        Vec3::new(0.0, 2.0, 0.0),
        PLAYER_RADIUS,
    )?;
    network.spawn_actor(DOOR, None, TARGET_POSITION, TARGET_RADIUS)?;
    network.attach_point(
        DOOR_POINT,
        DOOR,
        facing_west(TARGET_POSITION - Vec3::new(1.0, 0.0, 0.0)),
        &config.hold_point,
    )?;
    network.add_interactor(HOLDER, config.interactor)?;
    network.add_interactor(OBSERVER, config.interactor)?;
    network.step();
    info!(duration_seconds, stop_at, restart_at, "hold_scenario_begin");

    let origin = network.now_seconds();
    network.try_start_interaction(HOLDER);
    run_until(&mut network, origin + stop_at);
    network.try_stop_interaction(HOLDER);
    run_until(&mut network, origin + restart_at);
    network.try_start_interaction(HOLDER);
    run_until(&mut network, origin + restart_at + duration + SETTLE_SECONDS);

    let holder_events = drain_and_log(&mut network, HOLDER_NODE);
    drain_and_log(&mut network, OBSERVER_NODE);
    drain_and_log(&mut network, AUTHORITY_NODE);
    log_counts(&network);

    Ok(ScenarioReport {
        name: "hold",
        expected: vec![
            InteractionResult::Started,
            InteractionResult::Interrupted,
            InteractionResult::Started,
            InteractionResult::Successful,
        ],
        observed: interactor_results(&holder_events, HOLDER),
        traffic: network.stats(),
    })
}

/// An instant pickup in a standalone session.
pub(crate) fn run_pickup_scenario(
    config: &SandboxConfig,
) -> Result<ScenarioReport, InteractionError> {
    let mut network = LoopbackNetwork::new(NetMode::Standalone, 0, config.network)?;
    network.spawn_actor(HOLDER, None, Vec3::ZERO, PLAYER_RADIUS)?;
    network.spawn_actor(CRATE, None, TARGET_POSITION, TARGET_RADIUS)?;
    network.attach_point(
        CRATE_POINT,
        CRATE,
        facing_west(TARGET_POSITION - Vec3::new(1.0, 0.0, 0.0)),
        &config.pickup_point,
    )?;
    network.add_interactor(HOLDER, config.interactor)?;
    network.step();
    info!("pickup_scenario_begin");

    network.try_start_interaction(HOLDER);
    network.run_for_seconds(SETTLE_SECONDS);

    let events = drain_and_log(&mut network, AUTHORITY_NODE);
    log_counts(&network);

    Ok(ScenarioReport {
        name: "pickup",
        expected: vec![InteractionResult::Started, InteractionResult::Successful],
        observed: interactor_results(&events, HOLDER),
        traffic: network.stats(),
    })
}

fn facing_west(position: Vec3) -> WorldTransform {
    WorldTransform {
        position,
        forward: Vec3::new(-1.0, 0.0, 0.0),
    }
}

fn run_until(network: &mut LoopbackNetwork, until_seconds: f64) {
    let remaining = until_seconds - network.now_seconds();
    network.run_for_seconds(remaining);
}

fn drain_and_log(network: &mut LoopbackNetwork, node: NodeId) -> Vec<InteractionEvent> {
    let Some(entry) = network.node_mut(node) else {
        return Vec::new();
    };
    let events = entry.drain_events();
    for event in &events {
        debug!(node = node.0, event = ?event, "interaction_event");
    }
    events
}

fn log_counts(network: &LoopbackNetwork) {
    for id in network.node_ids() {
        let Some(node) = network.node(id) else {
            continue;
        };
        let counts = node.events().lifetime_counts();
        info!(
            node = id.0,
            mode = ?node.mode(),
            total = counts.total,
            interactor_state = counts.interactor_state_changed,
            point_state = counts.interaction_state_changed,
            focus = counts.focus_changed,
            "node_event_counts"
        );
    }
}

fn interactor_results(events: &[InteractionEvent], actor: ActorId) -> Vec<InteractionResult> {
    events
        .iter()
        .filter_map(|event| match event {
            InteractionEvent::InteractorStateChanged {
                interactor, result, ..
            } if *interactor == actor => Some(*result),
            _ => None,
        })
        .collect()
}
