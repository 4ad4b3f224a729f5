use std::collections::VecDeque;

use tracing::{debug, info, warn};

use crate::config::{InteractorConfig, NetworkConfig, PointConfig};
use crate::node::Node;
use crate::point::InteractionError;
use crate::probe::RayScene;
use crate::replication::{decode_envelope, encode_envelope, Outbox, Outgoing, Route};
use crate::types::{ActorId, NetMode, NodeId, PointId, Vec3, WorldTransform};

pub type LoopbackNode = Node<RayScene, Outbox>;

pub const AUTHORITY_NODE: NodeId = NodeId(0);

#[derive(Debug, Clone)]
struct InFlight {
    deliver_at_tick: u64,
    from: NodeId,
    to: NodeId,
    wire: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrafficStats {
    pub sent: u64,
    pub delivered: u64,
    pub dropped: u64,
}

/// In-process network: one authority node plus client nodes, exchanging
/// wire-encoded envelopes after a fixed tick delay.
pub struct LoopbackNetwork {
    config: NetworkConfig,
    nodes: Vec<LoopbackNode>,
    in_flight: VecDeque<InFlight>,
    tick: u64,
    stats: TrafficStats,
}

impl LoopbackNetwork {
    pub fn new(
        authority_mode: NetMode,
        client_count: usize,
        config: NetworkConfig,
    ) -> Result<Self, InteractionError> {
        match authority_mode {
            NetMode::Client => {
                return Err(InteractionError::InvalidConfig(
                    "authority node cannot run in client mode".to_string(),
                ))
            }
            NetMode::Standalone if client_count > 0 => {
                return Err(InteractionError::InvalidConfig(
                    "standalone node cannot host clients".to_string(),
                ))
            }
            _ => {}
        }
        let mut nodes = Vec::with_capacity(client_count + 1);
        nodes.push(Node::new(
            AUTHORITY_NODE,
            authority_mode,
            RayScene::new(),
            Outbox::new(),
        ));
        for index in 1..=client_count {
            let id = u32::try_from(index).map_err(|_| {
                InteractionError::InvalidConfig(format!("too many clients: {client_count}"))
            })?;
            nodes.push(Node::new(
                NodeId(id),
                NetMode::Client,
                RayScene::new(),
                Outbox::new(),
            ));
        }
        info!(
            mode = ?authority_mode,
            clients = client_count,
            delay_ticks = config.delivery_delay_ticks,
            "loopback_network_ready"
        );
        Ok(Self {
            config,
            nodes,
            in_flight: VecDeque::new(),
            tick: 0,
            stats: TrafficStats::default(),
        })
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn now_seconds(&self) -> f64 {
        self.authority().now_seconds()
    }

    pub fn stats(&self) -> TrafficStats {
        self.stats
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().map(Node::id)
    }

    pub fn authority(&self) -> &LoopbackNode {
        &self.nodes[0]
    }

    pub fn authority_mut(&mut self) -> &mut LoopbackNode {
        &mut self.nodes[0]
    }

    pub fn node(&self, id: NodeId) -> Option<&LoopbackNode> {
        self.nodes.get(id.0 as usize)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut LoopbackNode> {
        self.nodes.get_mut(id.0 as usize)
    }

    /// Node that drives the actor's input: its owning client, or the
    /// authority for server-controlled actors.
    pub fn controlling_node(&self, actor: ActorId) -> Option<NodeId> {
        let record = self.authority().actor(actor)?;
        Some(record.owner.unwrap_or(AUTHORITY_NODE))
    }

    pub fn spawn_actor(
        &mut self,
        actor: ActorId,
        owner: Option<NodeId>,
        position: Vec3,
        radius: f32,
    ) -> Result<(), InteractionError> {
        if let Some(owner) = owner {
            if self.node(owner).is_none() {
                return Err(InteractionError::InvalidConfig(format!(
                    "owner {owner} is not part of the network"
                )));
            }
        }
        for node in &mut self.nodes {
            node.register_actor(actor, owner)?;
            node.probe_mut().add_actor(actor, position, radius);
        }
        debug!(actor = actor.0, owner = owner.map(|id| id.0), "actor_spawned");
        Ok(())
    }

    pub fn attach_point(
        &mut self,
        point: PointId,
        actor: ActorId,
        transform: WorldTransform,
        config: &PointConfig,
    ) -> Result<(), InteractionError> {
        for node in &mut self.nodes {
            node.add_point(point, actor, config)?;
            node.probe_mut().attach_point(point, actor, transform);
        }
        Ok(())
    }

    pub fn add_interactor(
        &mut self,
        actor: ActorId,
        config: InteractorConfig,
    ) -> Result<(), InteractionError> {
        for node in &mut self.nodes {
            node.add_interactor(actor, config)?;
        }
        Ok(())
    }

    pub fn remove_actor(&mut self, actor: ActorId) {
        for node in &mut self.nodes {
            node.remove_actor(actor);
            node.probe_mut().remove_actor(actor);
        }
    }

    /// Movement is not replicated through the channel; every node's scene
    /// sees the same pose immediately.
    pub fn look_at(&mut self, actor: ActorId, target: Vec3) {
        for node in &mut self.nodes {
            node.probe_mut().look_at(actor, target);
        }
    }

    pub fn set_actor_position(&mut self, actor: ActorId, position: Vec3) {
        for node in &mut self.nodes {
            node.probe_mut().set_actor_position(actor, position);
        }
    }

    pub fn try_start_interaction(&mut self, actor: ActorId) {
        if let Some(node) = self.controlling_node_mut(actor) {
            node.try_start_interaction(actor);
        }
    }

    pub fn try_stop_interaction(&mut self, actor: ActorId) {
        if let Some(node) = self.controlling_node_mut(actor) {
            node.try_stop_interaction(actor);
        }
    }

    /// One fixed step on every node, then transport.
    pub fn step(&mut self) {
        self.tick += 1;
        let dt = self.config.fixed_dt_seconds;
        for node in &mut self.nodes {
            node.advance(dt);
        }
        self.pump();
    }

    pub fn run_for_seconds(&mut self, seconds: f64) {
        let dt = f64::from(self.config.fixed_dt_seconds);
        let steps = (seconds / dt).round().max(0.0) as u64;
        for _ in 0..steps {
            self.step();
        }
    }

    /// Flushes outboxes and delivers everything due this tick, including
    /// replies produced by those deliveries.
    pub fn pump(&mut self) {
        let max_rounds = self.nodes.len() * 8 + 8;
        for _ in 0..max_rounds {
            self.flush_outboxes();
            if !self.deliver_due() {
                return;
            }
        }
        warn!(tick = self.tick, "loopback_pump_round_limit");
    }

    fn controlling_node_mut(&mut self, actor: ActorId) -> Option<&mut LoopbackNode> {
        let Some(id) = self.controlling_node(actor) else {
            warn!(actor = actor.0, "input_for_unknown_actor");
            return None;
        };
        self.node_mut(id)
    }

    fn flush_outboxes(&mut self) {
        let deliver_at_tick = self.tick + u64::from(self.config.delivery_delay_ticks);
        for index in 0..self.nodes.len() {
            let from = self.nodes[index].id();
            let outgoing = self.nodes[index].channel_mut().drain();
            for message in outgoing {
                let wire = match encode_envelope(&message.envelope) {
                    Ok(wire) => wire,
                    Err(error) => {
                        warn!(node = from.0, %error, "loopback_encode_failed");
                        self.stats.dropped += 1;
                        continue;
                    }
                };
                for to in self.destinations(from, &message) {
                    self.stats.sent += 1;
                    self.in_flight.push_back(InFlight {
                        deliver_at_tick,
                        from,
                        to,
                        wire: wire.clone(),
                    });
                }
            }
        }
    }

    fn destinations(&self, from: NodeId, message: &Outgoing) -> Vec<NodeId> {
        match message.route {
            Route::ToAuthority if from != AUTHORITY_NODE => vec![AUTHORITY_NODE],
            Route::ToAuthority => Vec::new(),
            Route::ToOwner => {
                let owner = self
                    .authority()
                    .actor(message.envelope.actor)
                    .and_then(|record| record.owner);
                match owner {
                    Some(owner) if owner != from => vec![owner],
                    _ => {
                        debug!(
                            actor = message.envelope.actor.0,
                            "owner_route_without_remote_owner"
                        );
                        Vec::new()
                    }
                }
            }
            Route::Broadcast => self.node_ids().filter(|id| *id != from).collect(),
        }
    }

    fn deliver_due(&mut self) -> bool {
        let mut delivered_any = false;
        let mut waiting = VecDeque::with_capacity(self.in_flight.len());
        while let Some(message) = self.in_flight.pop_front() {
            if message.deliver_at_tick > self.tick {
                waiting.push_back(message);
                continue;
            }
            delivered_any = true;
            let envelope = match decode_envelope(&message.wire) {
                Ok(envelope) => envelope,
                Err(error) => {
                    warn!(from = message.from.0, to = message.to.0, %error, "loopback_decode_failed");
                    self.stats.dropped += 1;
                    continue;
                }
            };
            match self.nodes.get_mut(message.to.0 as usize) {
                Some(node) => {
                    node.receive(message.from, envelope);
                    self.stats.delivered += 1;
                }
                None => self.stats.dropped += 1,
            }
        }
        self.in_flight = waiting;
        delivered_any
    }
}
