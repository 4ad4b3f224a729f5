use std::collections::BTreeMap;

use crate::types::{ActorId, PointId, Vec3, WorldTransform};

pub const PROBE_RANGE: f32 = 1200.0;
/// cos(60 degrees)
pub const FACING_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeView {
    pub origin: Vec3,
    pub forward: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeHit {
    pub point: PointId,
    pub actor: ActorId,
}

pub trait TargetingProbe {
    /// First interaction point on the nearest actor hit by a forward ray,
    /// ignoring the prober itself.
    fn acquire_candidate(&self, prober: ActorId, eye: EyeView, max_range: f32) -> Option<ProbeHit>;

    fn eye_view(&self, actor: ActorId) -> Option<EyeView>;

    fn actor_location(&self, actor: ActorId) -> Option<Vec3>;

    fn point_transform(&self, point: PointId) -> Option<WorldTransform>;

    fn validate_direction(&self, prober: ActorId, point: PointId) -> bool {
        let (Some(prober_location), Some(point_transform)) =
            (self.actor_location(prober), self.point_transform(point))
        else {
            return false;
        };
        let toward_prober = (prober_location - point_transform.position).normalized();
        toward_prober.dot(point_transform.forward.normalized()) > FACING_THRESHOLD
    }

    fn try_get_interaction(&self, prober: ActorId, max_range: f32) -> Option<ProbeHit> {
        let eye = self.eye_view(prober)?;
        let hit = self.acquire_candidate(prober, eye, max_range)?;
        self.validate_direction(prober, hit.point).then_some(hit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct SceneActor {
    position: Vec3,
    view: Vec3,
    radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ScenePoint {
    actor: ActorId,
    transform: WorldTransform,
}

/// Actors are spheres.
#[derive(Debug, Clone, Default)]
pub struct RayScene {
    actors: BTreeMap<ActorId, SceneActor>,
    points: BTreeMap<PointId, ScenePoint>,
}

impl RayScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_actor(&mut self, actor: ActorId, position: Vec3, radius: f32) {
        self.actors.insert(
            actor,
            SceneActor {
                position,
                view: Vec3::FORWARD,
                radius,
            },
        );
    }

    pub fn remove_actor(&mut self, actor: ActorId) {
        self.actors.remove(&actor);
        self.points.retain(|_, point| point.actor != actor);
    }

    pub fn attach_point(&mut self, point: PointId, actor: ActorId, transform: WorldTransform) {
        self.points.insert(point, ScenePoint { actor, transform });
    }

    pub fn set_actor_position(&mut self, actor: ActorId, position: Vec3) -> bool {
        let Some(entry) = self.actors.get_mut(&actor) else {
            return false;
        };
        entry.position = position;
        true
    }

    pub fn set_view_direction(&mut self, actor: ActorId, view: Vec3) -> bool {
        let Some(entry) = self.actors.get_mut(&actor) else {
            return false;
        };
        entry.view = view.normalized();
        true
    }

    /// Points the actor's view at a world position.
    pub fn look_at(&mut self, actor: ActorId, target: Vec3) -> bool {
        let Some(position) = self.actors.get(&actor).map(|entry| entry.position) else {
            return false;
        };
        self.set_view_direction(actor, target - position)
    }
}

impl TargetingProbe for RayScene {
    fn acquire_candidate(&self, prober: ActorId, eye: EyeView, max_range: f32) -> Option<ProbeHit> {
        let direction = eye.forward.normalized();
        if direction == Vec3::ZERO {
            return None;
        }
        let nearest = self
            .actors
            .iter()
            .filter(|(id, _)| **id != prober)
            .filter_map(|(id, actor)| {
                ray_sphere_distance(eye.origin, direction, actor.position, actor.radius)
                    .filter(|distance| *distance <= max_range)
                    .map(|distance| (*id, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))?;
        let hit_actor = nearest.0;
        self.points
            .iter()
            .find(|(_, point)| point.actor == hit_actor)
            .map(|(point_id, _)| ProbeHit {
                point: *point_id,
                actor: hit_actor,
            })
    }

    fn eye_view(&self, actor: ActorId) -> Option<EyeView> {
        self.actors.get(&actor).map(|entry| EyeView {
            origin: entry.position,
            forward: entry.view,
        })
    }

    fn actor_location(&self, actor: ActorId) -> Option<Vec3> {
        self.actors.get(&actor).map(|entry| entry.position)
    }

    fn point_transform(&self, point: PointId) -> Option<WorldTransform> {
        self.points.get(&point).map(|entry| entry.transform)
    }
}

fn ray_sphere_distance(origin: Vec3, direction: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let to_center = center - origin;
    let along = to_center.dot(direction);
    let closest_sq = to_center.length_squared() - along * along;
    let radius_sq = radius * radius;
    if closest_sq > radius_sq {
        return None;
    }
    let half_chord = (radius_sq - closest_sq).sqrt();
    let near = along - half_chord;
    let far = along + half_chord;
    if near >= 0.0 {
        Some(near)
    } else if far >= 0.0 {
        Some(0.0)
    } else {
        None
    }
}
