use crate::config::{InteractorConfig, NetworkConfig, PointConfig};
use crate::events::InteractionEvent;
use crate::loopback::{LoopbackNetwork, AUTHORITY_NODE};
use crate::replication::{Command, ReplicationChannel};
use crate::types::{
    ActorId, InteractionKind, InteractionResult, NetMode, NetRole, NodeId, PointId, Vec3,
    VisibilityPolicy, WorldTransform,
};

const CLIENT_A: NodeId = NodeId(1);
const CLIENT_B: NodeId = NodeId(2);
const PLAYER_A: ActorId = ActorId(1);
const PLAYER_B: ActorId = ActorId(2);
const DOOR: ActorId = ActorId(100);
const CHEST: ActorId = ActorId(101);
const DOOR_POINT: PointId = PointId(1000);
const CHEST_POINT: PointId = PointId(1001);
const DOOR_POSITION: Vec3 = Vec3::new(5.0, 0.0, 0.0);

fn network_config(delay: u32) -> NetworkConfig {
    NetworkConfig {
        fixed_dt_seconds: 0.1,
        delivery_delay_ticks: delay,
    }
}

fn facing_west(position: Vec3) -> WorldTransform {
    WorldTransform {
        position,
        forward: Vec3::new(-1.0, 0.0, 0.0),
    }
}

/// Dedicated server with two clients, each owning one player, and a door
/// in front of player A.
fn dedicated_world(door: PointConfig, interactor: InteractorConfig) -> LoopbackNetwork {
    let mut network = LoopbackNetwork::new(NetMode::DedicatedServer, 2, network_config(1))
        .expect("network");
    network
        .spawn_actor(PLAYER_A, Some(CLIENT_A), Vec3::ZERO, 0.5)
        .expect("player a");
    network
        .spawn_actor(PLAYER_B, Some(CLIENT_B), Vec3::new(0.0, 1.5, 0.0), 0.5)
        .expect("player b");
    network
        .spawn_actor(DOOR, None, DOOR_POSITION, 1.0)
        .expect("door");
    network
        .attach_point(DOOR_POINT, DOOR, facing_west(Vec3::new(4.0, 0.0, 0.0)), &door)
        .expect("door point");
    network.add_interactor(PLAYER_A, interactor).expect("interactor a");
    network.add_interactor(PLAYER_B, interactor).expect("interactor b");
    network.step();
    network
}

fn drain(network: &mut LoopbackNetwork, node: NodeId) -> Vec<InteractionEvent> {
    network.node_mut(node).expect("node").drain_events()
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

fn point_results(events: &[InteractionEvent], point: PointId) -> Vec<InteractionResult> {
    events
        .iter()
        .filter_map(|event| match event {
            InteractionEvent::InteractionStateChanged {
                point: changed,
                result,
                ..
            } if *changed == point => Some(*result),
            _ => None,
        })
        .collect()
}

fn is_interacting(network: &LoopbackNetwork, node: NodeId, actor: ActorId) -> bool {
    network
        .node(node)
        .and_then(|node| node.interactor(actor))
        .is_some_and(|interactor| interactor.is_interacting())
}

fn active_on_door(network: &LoopbackNetwork) -> usize {
    network
        .authority()
        .point(DOOR_POINT)
        .expect("door point")
        .active_interactor_count()
}

#[test]
fn hold_interrupted_then_completed_across_nodes() {
    let mut network = dedicated_world(PointConfig::timed(10.0), InteractorConfig::default());

    network.try_start_interaction(PLAYER_A);
    network.run_for_seconds(0.5);
    assert!(is_interacting(&network, AUTHORITY_NODE, PLAYER_A));
    assert!(is_interacting(&network, CLIENT_A, PLAYER_A));
    assert!(is_interacting(&network, CLIENT_B, PLAYER_A));
    assert_eq!(active_on_door(&network), 1);

    network.run_for_seconds(2.7);
    network.try_stop_interaction(PLAYER_A);
    network.run_for_seconds(0.5);
    assert!(!is_interacting(&network, AUTHORITY_NODE, PLAYER_A));
    assert!(!is_interacting(&network, CLIENT_A, PLAYER_A));
    assert_eq!(active_on_door(&network), 0);
    assert!(!network.authority().deadlines().is_pending(PLAYER_A));
    let owner_events = drain(&mut network, CLIENT_A);
    assert_eq!(
        interactor_results(&owner_events, PLAYER_A),
        vec![InteractionResult::Started, InteractionResult::Interrupted]
    );

    network.run_for_seconds(1.5);
    network.try_start_interaction(PLAYER_A);
    network.run_for_seconds(0.5);
    network.run_for_seconds(9.0);
    assert!(is_interacting(&network, AUTHORITY_NODE, PLAYER_A));
    assert_eq!(
        interactor_results(&drain(&mut network, CLIENT_A), PLAYER_A),
        vec![InteractionResult::Started]
    );

    network.run_for_seconds(1.0);
    assert!(!is_interacting(&network, AUTHORITY_NODE, PLAYER_A));
    assert!(!is_interacting(&network, CLIENT_A, PLAYER_A));
    assert_eq!(active_on_door(&network), 0);
    assert_eq!(
        interactor_results(&drain(&mut network, CLIENT_A), PLAYER_A),
        vec![InteractionResult::Successful]
    );
}

#[test]
fn owner_only_results_stay_private_while_point_results_broadcast() {
    let mut network = dedicated_world(PointConfig::timed(2.0), InteractorConfig::default());

    network.try_start_interaction(PLAYER_A);
    network.run_for_seconds(3.0);

    let owner = drain(&mut network, CLIENT_A);
    let observer = drain(&mut network, CLIENT_B);
    let server = drain(&mut network, AUTHORITY_NODE);
    let expected = vec![InteractionResult::Started, InteractionResult::Successful];

    assert_eq!(interactor_results(&owner, PLAYER_A), expected);
    assert!(interactor_results(&observer, PLAYER_A).is_empty());
    assert!(interactor_results(&server, PLAYER_A).is_empty());
    assert_eq!(point_results(&owner, DOOR_POINT), expected);
    assert_eq!(point_results(&observer, DOOR_POINT), expected);
    assert_eq!(point_results(&server, DOOR_POINT), expected);
}

#[test]
fn owner_only_pair_reaches_owner_in_one_message() {
    let door = PointConfig {
        visibility: VisibilityPolicy::OwnerOnly,
        ..PointConfig::timed(2.0)
    };
    let mut network = dedicated_world(door, InteractorConfig::default());

    network.try_start_interaction(PLAYER_A);
    network.run_for_seconds(3.0);

    let owner = drain(&mut network, CLIENT_A);
    let observer = drain(&mut network, CLIENT_B);
    let expected = vec![InteractionResult::Started, InteractionResult::Successful];
    assert_eq!(interactor_results(&owner, PLAYER_A), expected);
    assert_eq!(point_results(&owner, DOOR_POINT), expected);
    assert!(point_results(&observer, DOOR_POINT).is_empty());
}

#[test]
fn visibility_all_and_none_for_interactor_results() {
    let everyone = InteractorConfig {
        state_visibility: VisibilityPolicy::All,
        ..InteractorConfig::default()
    };
    let mut network = dedicated_world(PointConfig::instant(), everyone);
    network.try_start_interaction(PLAYER_A);
    network.run_for_seconds(0.5);
    assert_eq!(
        interactor_results(&drain(&mut network, CLIENT_B), PLAYER_A),
        vec![InteractionResult::Started, InteractionResult::Successful]
    );

    let silent = InteractorConfig {
        state_visibility: VisibilityPolicy::None,
        ..InteractorConfig::default()
    };
    let door = PointConfig {
        visibility: VisibilityPolicy::None,
        ..PointConfig::instant()
    };
    let mut network = dedicated_world(door, silent);
    network.try_start_interaction(PLAYER_A);
    network.run_for_seconds(0.5);
    for node in [AUTHORITY_NODE, CLIENT_A, CLIENT_B] {
        let events = drain(&mut network, node);
        assert!(interactor_results(&events, PLAYER_A).is_empty());
        assert!(point_results(&events, DOOR_POINT).is_empty());
    }
}

#[test]
fn second_start_while_interacting_is_a_no_op() {
    let mut network = dedicated_world(PointConfig::timed(10.0), InteractorConfig::default());
    network.try_start_interaction(PLAYER_A);
    network.run_for_seconds(0.5);
    let deadline = network
        .authority()
        .deadlines()
        .get(PLAYER_A)
        .expect("deadline");
    drain(&mut network, CLIENT_A);

    network.try_start_interaction(PLAYER_A);
    network.run_for_seconds(0.5);

    assert_eq!(network.authority().deadlines().get(PLAYER_A), Some(deadline));
    assert_eq!(active_on_door(&network), 1);
    assert!(interactor_results(&drain(&mut network, CLIENT_A), PLAYER_A).is_empty());
}

#[test]
fn commands_from_non_owners_are_ignored() {
    let mut network = dedicated_world(PointConfig::timed(10.0), InteractorConfig::default());
    network
        .node_mut(CLIENT_B)
        .expect("client b")
        .channel_mut()
        .send_command(PLAYER_A, Command::TryStartInteraction);
    network.run_for_seconds(0.5);

    assert!(!is_interacting(&network, AUTHORITY_NODE, PLAYER_A));
    assert_eq!(active_on_door(&network), 0);
}

#[test]
fn authority_rederives_target_and_request_times_out() {
    let mut network = dedicated_world(PointConfig::timed(10.0), InteractorConfig::default());
    network
        .authority_mut()
        .probe_mut()
        .set_view_direction(PLAYER_A, Vec3::new(0.0, -1.0, 0.0));

    assert_eq!(
        network
            .node(CLIENT_A)
            .and_then(|node| node.interactor(PLAYER_A))
            .and_then(|interactor| interactor.focused_target()),
        Some(DOOR_POINT)
    );
    network.try_start_interaction(PLAYER_A);
    assert_eq!(
        network
            .node(CLIENT_A)
            .and_then(|node| node.interactor(PLAYER_A))
            .map(|interactor| interactor.phase()),
        Some(crate::interactor::InteractorPhase::Requesting)
    );

    network.run_for_seconds(0.5);
    assert!(!is_interacting(&network, AUTHORITY_NODE, PLAYER_A));
    assert!(interactor_results(&drain(&mut network, CLIENT_A), PLAYER_A).is_empty());

    network.run_for_seconds(1.0);
    assert_eq!(
        network
            .node(CLIENT_A)
            .and_then(|node| node.interactor(PLAYER_A))
            .map(|interactor| interactor.phase()),
        Some(crate::interactor::InteractorPhase::Idle)
    );
}

#[test]
fn capability_veto_rejects_silently() {
    let mut network = dedicated_world(PointConfig::timed(10.0), InteractorConfig::default());
    network
        .authority_mut()
        .set_capability(DOOR, Box::new(|_: ActorId, _: ActorId| false));

    assert!(!network.authority().point_can_interact_with(DOOR_POINT, PLAYER_A));
    assert!(network
        .authority()
        .interactor_can_interact_with(PLAYER_A, DOOR_POINT));

    network.try_start_interaction(PLAYER_A);
    network.run_for_seconds(0.5);

    assert!(!is_interacting(&network, AUTHORITY_NODE, PLAYER_A));
    for node in [AUTHORITY_NODE, CLIENT_A, CLIENT_B] {
        let events = drain(&mut network, node);
        assert!(interactor_results(&events, PLAYER_A).is_empty());
        assert!(point_results(&events, DOOR_POINT).is_empty());
    }
}

#[test]
fn interactor_side_capability_veto_rejects() {
    let mut network = dedicated_world(PointConfig::timed(10.0), InteractorConfig::default());
    network.authority_mut().set_capability(
        PLAYER_A,
        Box::new(|_: ActorId, other: ActorId| other != DOOR),
    );
    network.try_start_interaction(PLAYER_A);
    network.run_for_seconds(0.5);
    assert!(!is_interacting(&network, AUTHORITY_NODE, PLAYER_A));

    network.authority_mut().clear_capability(PLAYER_A);
    network.try_start_interaction(PLAYER_A);
    network.run_for_seconds(0.5);
    assert!(is_interacting(&network, AUTHORITY_NODE, PLAYER_A));
}

#[test]
fn exclusive_point_fails_second_interactor() {
    let door = PointConfig {
        allow_concurrent_interactors: false,
        ..PointConfig::timed(10.0)
    };
    let mut network = dedicated_world(door, InteractorConfig::default());
    network.look_at(PLAYER_B, DOOR_POSITION);

    network.try_start_interaction(PLAYER_A);
    network.run_for_seconds(0.5);
    network.try_start_interaction(PLAYER_B);
    network.run_for_seconds(0.5);

    assert!(is_interacting(&network, AUTHORITY_NODE, PLAYER_A));
    assert!(!is_interacting(&network, AUTHORITY_NODE, PLAYER_B));
    assert!(!is_interacting(&network, CLIENT_B, PLAYER_B));
    assert_eq!(active_on_door(&network), 1);
    assert!(!network.authority().deadlines().is_pending(PLAYER_B));
    assert_eq!(
        interactor_results(&drain(&mut network, CLIENT_B), PLAYER_B),
        vec![InteractionResult::Failed]
    );
}

#[test]
fn concurrent_point_runs_independent_holds() {
    let mut network = dedicated_world(PointConfig::timed(2.0), InteractorConfig::default());
    network.look_at(PLAYER_B, DOOR_POSITION);

    network.try_start_interaction(PLAYER_A);
    network.run_for_seconds(1.0);
    network.try_start_interaction(PLAYER_B);
    network.run_for_seconds(0.5);
    assert_eq!(active_on_door(&network), 2);

    network.try_stop_interaction(PLAYER_B);
    network.run_for_seconds(1.0);
    assert!(!is_interacting(&network, AUTHORITY_NODE, PLAYER_A));
    assert_eq!(active_on_door(&network), 0);
    assert_eq!(
        interactor_results(&drain(&mut network, CLIENT_A), PLAYER_A),
        vec![InteractionResult::Started, InteractionResult::Successful]
    );
    assert_eq!(
        interactor_results(&drain(&mut network, CLIENT_B), PLAYER_B),
        vec![InteractionResult::Started, InteractionResult::Interrupted]
    );
}

#[test]
fn client_looking_away_interrupts_hold() {
    let mut network = dedicated_world(PointConfig::timed(10.0), InteractorConfig::default());
    network.try_start_interaction(PLAYER_A);
    network.run_for_seconds(1.0);
    assert!(is_interacting(&network, AUTHORITY_NODE, PLAYER_A));

    network.look_at(PLAYER_A, Vec3::new(0.0, -5.0, 0.0));
    network.run_for_seconds(0.5);

    assert!(!is_interacting(&network, AUTHORITY_NODE, PLAYER_A));
    assert!(!network.authority().deadlines().is_pending(PLAYER_A));
    let events = drain(&mut network, CLIENT_A);
    assert_eq!(
        interactor_results(&events, PLAYER_A),
        vec![InteractionResult::Started, InteractionResult::Interrupted]
    );
    assert!(events.contains(&InteractionEvent::NewFocusTarget {
        interactor: PLAYER_A,
        point: None,
    }));
}

#[test]
fn looking_away_before_the_flag_arrives_still_interrupts() {
    let mut network = dedicated_world(PointConfig::timed(2.0), InteractorConfig::default());
    network.try_start_interaction(PLAYER_A);
    network.step();
    network.step();
    assert!(is_interacting(&network, AUTHORITY_NODE, PLAYER_A));
    assert!(!is_interacting(&network, CLIENT_A, PLAYER_A));

    network.look_at(PLAYER_A, Vec3::new(0.0, -5.0, 0.0));
    network.step();
    assert!(is_interacting(&network, CLIENT_A, PLAYER_A));
    network.run_for_seconds(3.0);

    assert!(!is_interacting(&network, AUTHORITY_NODE, PLAYER_A));
    assert!(!is_interacting(&network, CLIENT_A, PLAYER_A));
    assert_eq!(active_on_door(&network), 0);
    assert_eq!(
        interactor_results(&drain(&mut network, CLIENT_A), PLAYER_A),
        vec![InteractionResult::Started, InteractionResult::Interrupted]
    );
}

#[test]
fn host_player_looking_away_interrupts_on_listen_server() {
    let mut network =
        LoopbackNetwork::new(NetMode::ListenServer, 1, network_config(1)).expect("network");
    network
        .spawn_actor(PLAYER_A, None, Vec3::ZERO, 0.5)
        .expect("host player");
    network.spawn_actor(DOOR, None, DOOR_POSITION, 1.0).expect("door");
    network
        .attach_point(
            DOOR_POINT,
            DOOR,
            facing_west(Vec3::new(4.0, 0.0, 0.0)),
            &PointConfig::timed(5.0),
        )
        .expect("door point");
    network
        .add_interactor(PLAYER_A, InteractorConfig::default())
        .expect("interactor");
    network.step();

    assert!(network.authority().is_local_interactor(PLAYER_A));
    network.try_start_interaction(PLAYER_A);
    assert!(is_interacting(&network, AUTHORITY_NODE, PLAYER_A));

    network.run_for_seconds(2.0);
    network.look_at(PLAYER_A, Vec3::new(0.0, 5.0, 0.0));
    network.step();

    assert!(!is_interacting(&network, AUTHORITY_NODE, PLAYER_A));
    let events = drain(&mut network, AUTHORITY_NODE);
    assert_eq!(
        interactor_results(&events, PLAYER_A),
        vec![InteractionResult::Started, InteractionResult::Interrupted]
    );
    assert!(events.contains(&InteractionEvent::InteractingChanged {
        interactor: PLAYER_A,
        interacting: false,
    }));
}

#[test]
fn destroying_bound_point_fails_interaction() {
    let mut network = dedicated_world(PointConfig::timed(10.0), InteractorConfig::default());
    network.try_start_interaction(PLAYER_A);
    network.run_for_seconds(0.5);

    network.remove_actor(DOOR);
    network.run_for_seconds(0.5);

    assert!(!is_interacting(&network, AUTHORITY_NODE, PLAYER_A));
    assert!(!is_interacting(&network, CLIENT_A, PLAYER_A));
    assert!(!network.authority().deadlines().is_pending(PLAYER_A));
    assert_eq!(
        interactor_results(&drain(&mut network, CLIENT_A), PLAYER_A),
        vec![InteractionResult::Started, InteractionResult::Failed]
    );

    network.run_for_seconds(11.0);
    assert!(interactor_results(&drain(&mut network, CLIENT_A), PLAYER_A).is_empty());
}

#[test]
fn completion_from_unbound_point_is_forced_to_failed() {
    let mut network = dedicated_world(PointConfig::timed(10.0), InteractorConfig::default());
    network
        .spawn_actor(CHEST, None, Vec3::new(0.0, -6.0, 0.0), 1.0)
        .expect("chest");
    network
        .attach_point(
            CHEST_POINT,
            CHEST,
            facing_west(Vec3::new(0.0, -5.0, 0.0)),
            &PointConfig::instant(),
        )
        .expect("chest point");
    network.try_start_interaction(PLAYER_A);
    network.run_for_seconds(0.5);
    drain(&mut network, CLIENT_A);

    network
        .authority_mut()
        .end_interaction(PLAYER_A, InteractionResult::Successful, CHEST_POINT);
    network.run_for_seconds(0.5);

    assert!(!is_interacting(&network, AUTHORITY_NODE, PLAYER_A));
    assert_eq!(active_on_door(&network), 0);
    assert!(!network.authority().deadlines().is_pending(PLAYER_A));
    assert_eq!(
        interactor_results(&drain(&mut network, CLIENT_A), PLAYER_A),
        vec![InteractionResult::Failed]
    );
}

#[test]
fn repeated_completion_after_success_is_ignored() {
    let mut network = dedicated_world(PointConfig::timed(2.0), InteractorConfig::default());
    network.try_start_interaction(PLAYER_A);
    network.run_for_seconds(3.0);
    assert_eq!(
        interactor_results(&drain(&mut network, CLIENT_A), PLAYER_A),
        vec![InteractionResult::Started, InteractionResult::Successful]
    );
    drain(&mut network, CLIENT_B);

    network
        .authority_mut()
        .end_interaction(PLAYER_A, InteractionResult::Successful, DOOR_POINT);
    network.run_for_seconds(0.5);

    assert!(!is_interacting(&network, AUTHORITY_NODE, PLAYER_A));
    assert!(interactor_results(&drain(&mut network, CLIENT_A), PLAYER_A).is_empty());
    assert!(point_results(&drain(&mut network, CLIENT_B), DOOR_POINT).is_empty());
}

#[test]
fn standalone_instant_pickup_reports_started_then_successful() {
    let mut network =
        LoopbackNetwork::new(NetMode::Standalone, 0, network_config(0)).expect("network");
    network
        .spawn_actor(PLAYER_A, None, Vec3::ZERO, 0.5)
        .expect("player");
    network.spawn_actor(CHEST, None, DOOR_POSITION, 1.0).expect("chest");
    network
        .attach_point(
            CHEST_POINT,
            CHEST,
            facing_west(Vec3::new(4.0, 0.0, 0.0)),
            &PointConfig::instant(),
        )
        .expect("chest point");
    network
        .add_interactor(PLAYER_A, InteractorConfig::default())
        .expect("interactor");
    network.step();

    network.try_start_interaction(PLAYER_A);
    network.step();

    assert!(!is_interacting(&network, AUTHORITY_NODE, PLAYER_A));
    let events = drain(&mut network, AUTHORITY_NODE);
    assert_eq!(
        interactor_results(&events, PLAYER_A),
        vec![InteractionResult::Started, InteractionResult::Successful]
    );
    assert!(events.contains(&InteractionEvent::InteractorStateChanged {
        interactor: PLAYER_A,
        result: InteractionResult::Successful,
        kind: InteractionKind::Instant,
        target_actor: Some(CHEST),
    }));
    let flags = events
        .iter()
        .filter_map(|event| match event {
            InteractionEvent::InteractingChanged { interacting, .. } => Some(*interacting),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(flags, vec![true, false]);
}

#[test]
fn roles_follow_ownership_and_net_mode() {
    let network = dedicated_world(PointConfig::timed(10.0), InteractorConfig::default());
    let server = network.authority();
    assert_eq!(server.role_of(PLAYER_A), NetRole::Authority);
    assert_eq!(server.remote_role_of(PLAYER_A), NetRole::AutonomousProxy);
    assert_eq!(server.remote_role_of(DOOR), NetRole::SimulatedProxy);
    assert!(!server.is_local_interactor(PLAYER_A));

    let owner = network.node(CLIENT_A).expect("client a");
    assert_eq!(owner.role_of(PLAYER_A), NetRole::AutonomousProxy);
    assert_eq!(owner.remote_role_of(PLAYER_A), NetRole::Authority);
    assert!(owner.is_local_interactor(PLAYER_A));

    let observer = network.node(CLIENT_B).expect("client b");
    assert_eq!(observer.role_of(PLAYER_A), NetRole::SimulatedProxy);
    assert!(!observer.is_local_interactor(PLAYER_A));
    assert_eq!(observer.role_of(ActorId(999)), NetRole::None);
}

#[test]
fn dedicated_server_skips_flag_change_event() {
    let mut network = dedicated_world(PointConfig::timed(10.0), InteractorConfig::default());
    network.try_start_interaction(PLAYER_A);
    network.run_for_seconds(0.5);

    let changed = |events: &[InteractionEvent]| {
        events.iter().any(|event| {
            matches!(
                event,
                InteractionEvent::InteractingChanged {
                    interactor: PLAYER_A,
                    interacting: true,
                }
            )
        })
    };
    assert!(!changed(&drain(&mut network, AUTHORITY_NODE)));
    assert!(changed(&drain(&mut network, CLIENT_A)));
    assert!(changed(&drain(&mut network, CLIENT_B)));
}

#[test]
fn focus_events_follow_the_view_on_the_owning_client() {
    let mut network = dedicated_world(PointConfig::timed(10.0), InteractorConfig::default());
    let events = drain(&mut network, CLIENT_A);
    assert!(events.contains(&InteractionEvent::FocusChanged {
        point: DOOR_POINT,
        focused: true,
    }));
    assert!(events.contains(&InteractionEvent::NewFocusTarget {
        interactor: PLAYER_A,
        point: Some(DOOR_POINT),
    }));
    let server_events = drain(&mut network, AUTHORITY_NODE);
    assert!(!server_events
        .iter()
        .any(|event| matches!(event, InteractionEvent::NewFocusTarget { .. })));

    network.look_at(PLAYER_A, Vec3::new(0.0, -5.0, 0.0));
    network.step();
    let events = drain(&mut network, CLIENT_A);
    assert!(events.contains(&InteractionEvent::FocusChanged {
        point: DOOR_POINT,
        focused: false,
    }));
}

#[test]
fn wire_traffic_is_accounted() {
    let mut network = dedicated_world(PointConfig::timed(1.0), InteractorConfig::default());
    network.try_start_interaction(PLAYER_A);
    network.run_for_seconds(2.0);
    let stats = network.stats();
    assert!(stats.sent > 0);
    assert_eq!(stats.sent, stats.delivered);
    assert_eq!(stats.dropped, 0);
    assert_eq!(network.in_flight_count(), 0);
}

#[test]
fn switching_focus_releases_the_old_point_first() {
    let mut network = dedicated_world(PointConfig::timed(10.0), InteractorConfig::default());
    network
        .spawn_actor(CHEST, None, Vec3::new(0.0, -5.0, 0.0), 1.0)
        .expect("chest");
    network
        .attach_point(
            CHEST_POINT,
            CHEST,
            WorldTransform {
                position: Vec3::new(0.0, -4.0, 0.0),
                forward: Vec3::new(0.0, 1.0, 0.0),
            },
            &PointConfig::instant(),
        )
        .expect("chest point");
    drain(&mut network, CLIENT_A);

    network.step();
    assert!(drain(&mut network, CLIENT_A).is_empty());

    network.look_at(PLAYER_A, Vec3::new(0.0, -5.0, 0.0));
    network.step();
    let events = drain(&mut network, CLIENT_A);
    let position = |wanted: &InteractionEvent| {
        events
            .iter()
            .position(|event| event == wanted)
            .expect("focus event raised")
    };
    let door_lost = position(&InteractionEvent::FocusChanged {
        point: DOOR_POINT,
        focused: false,
    });
    let chest_gained = position(&InteractionEvent::FocusChanged {
        point: CHEST_POINT,
        focused: true,
    });
    let new_target = position(&InteractionEvent::NewFocusTarget {
        interactor: PLAYER_A,
        point: Some(CHEST_POINT),
    });
    assert!(door_lost < chest_gained);
    assert!(chest_gained < new_target);
    assert_eq!(
        network
            .node(CLIENT_A)
            .and_then(|node| node.interactor(PLAYER_A))
            .and_then(|interactor| interactor.focused_target()),
        Some(CHEST_POINT)
    );

    network.step();
    assert!(drain(&mut network, CLIENT_A).is_empty());
}
