//! World position model.
//!
//! The ego vehicle never moves: it sits at the origin and everything else
//! scrolls toward it along +z. Actors that scroll past the camera are sent
//! back by the world span, so a finite set of scenery makes an endless road.

use bevy_ecs::prelude::*;
use bevy_log::debug;
use bevy_time::Time;
use glam::Vec3;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;

use crate::{
    Arena, Id, Kinematics, ScenarioController, ScenarioKind, SignalState, SimulationConfig,
    SimulationError, SimulationResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneryKind {
    Tree,
    Building,
    ParkedCar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    Lead,
    Pedestrian,
    TrafficLight,
    StopLine,
    Scenery(SceneryKind),
    Oncoming,
}

impl ActorKind {
    /// Everything but the lead vehicle rides the scrolling environment.
    pub fn is_environment(&self) -> bool {
        !matches!(self, ActorKind::Lead)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub kind: ActorKind,
    pub position: Vec3,
    /// Hazard lights switched on by a V2V brake broadcast
    pub hazard_lit: bool,
    /// Tail lights as rendered: hazard or mirrored red signal
    pub brake_lights: bool,
}

impl Actor {
    fn new(kind: ActorKind, position: Vec3) -> Self {
        Self {
            kind,
            position,
            hazard_lit: false,
            brake_lights: false,
        }
    }
}

#[derive(Resource, Default)]
pub struct Roadway {
    pub actors: Arena<Actor>,
    lead: Option<Id<Actor>>,
    pedestrian: Option<Id<Actor>>,
    traffic_light: Option<Id<Actor>>,
    stop_line: Option<Id<Actor>>,
    /// Manual displacement waiting for the next scroll
    pending_shift: f32,
}

impl Roadway {
    /// Builds the demo road: lead, pedestrian, signal, and recycled scenery.
    pub fn from_config(config: &SimulationConfig) -> Self {
        let layout = &config.layout;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut road = Roadway::default();

        let side = |rng: &mut StdRng| -> f32 {
            if rng.random_bool(0.5) {
                1.0
            } else {
                -1.0
            }
        };

        road.lead = Some(road.add(ActorKind::Lead, layout.lead_start));
        road.pedestrian = Some(road.add(ActorKind::Pedestrian, layout.pedestrian_home));
        road.traffic_light = Some(road.add(ActorKind::TrafficLight, layout.traffic_light));
        road.stop_line = Some(road.add(ActorKind::StopLine, layout.stop_line));

        for i in 0..layout.tree_count {
            let x = side(&mut rng) * (24.0 + rng.random::<f32>() * 5.0);
            road.add(
                ActorKind::Scenery(SceneryKind::Tree),
                Vec3::new(x, 0.0, -(i as f32) * 30.0),
            );
        }

        for i in 0..layout.building_count {
            let x = side(&mut rng) * 38.0;
            road.add(
                ActorKind::Scenery(SceneryKind::Building),
                Vec3::new(x, 0.0, -(i as f32) * 120.0),
            );
        }

        for i in 0..layout.parked_count {
            let x = side(&mut rng) * 14.5;
            road.add(
                ActorKind::Scenery(SceneryKind::ParkedCar),
                Vec3::new(x, 0.0, -(i as f32) * 45.0 - 20.0),
            );
        }

        // Opposite lane, spaced far enough apart to read as separate cars
        for i in 0..layout.oncoming_count {
            road.add(
                ActorKind::Oncoming,
                Vec3::new(-5.0, 0.0, -150.0 - i as f32 * 200.0),
            );
        }

        road
    }

    pub fn add(&mut self, kind: ActorKind, position: Vec3) -> Id<Actor> {
        self.actors.alloc(Actor::new(kind, position))
    }

    /// Registers an actor in a tracked role, replacing any previous one.
    pub fn track(&mut self, kind: ActorKind, position: Vec3) -> Id<Actor> {
        let id = self.add(kind, position);
        match kind {
            ActorKind::Lead => self.lead = Some(id),
            ActorKind::Pedestrian => self.pedestrian = Some(id),
            ActorKind::TrafficLight => self.traffic_light = Some(id),
            ActorKind::StopLine => self.stop_line = Some(id),
            ActorKind::Scenery(_) | ActorKind::Oncoming => {}
        }
        id
    }

    fn slot(&self, kind: ActorKind) -> Option<Id<Actor>> {
        match kind {
            ActorKind::Lead => self.lead,
            ActorKind::Pedestrian => self.pedestrian,
            ActorKind::TrafficLight => self.traffic_light,
            ActorKind::StopLine => self.stop_line,
            ActorKind::Scenery(_) | ActorKind::Oncoming => None,
        }
    }

    /// Looks up one of the tracked actors (lead, pedestrian, light, line).
    pub fn tracked(&self, kind: ActorKind) -> SimulationResult<&Actor> {
        self.slot(kind)
            .and_then(|id| self.actors.get(&id))
            .ok_or(SimulationError::MissingActorReference(kind))
    }

    pub fn tracked_mut(&mut self, kind: ActorKind) -> SimulationResult<&mut Actor> {
        let id = self
            .slot(kind)
            .ok_or(SimulationError::MissingActorReference(kind))?;
        self.actors
            .get_mut(&id)
            .ok_or(SimulationError::MissingActorReference(kind))
    }

    /// Signed distance from the ego bumper line to a tracked actor.
    /// Negative once the actor is behind the ego.
    pub fn distance_ahead(&self, kind: ActorKind) -> SimulationResult<f32> {
        self.tracked(kind).map(|actor| -actor.position.z)
    }

    /// Queues a one-shot displacement for the next scroll.
    pub fn shift(&mut self, distance: f32) {
        self.pending_shift += distance;
    }

    pub fn pending_shift(&self) -> f32 {
        self.pending_shift
    }

    /// Moves every environment actor toward the camera by the ego travel
    /// plus any queued manual shift, then recycles what passed the camera.
    pub fn scroll(&mut self, travelled: f32, dt: f32, config: &SimulationConfig) {
        let shift = (travelled + std::mem::take(&mut self.pending_shift)) * config.scroll_scale;
        let oncoming = config.oncoming_speed * dt * config.scroll_scale;

        for actor in self.actors.iter_mut().filter(|a| a.kind.is_environment()) {
            actor.position.z += shift;
            if actor.kind == ActorKind::Oncoming {
                actor.position.z += oncoming;
            }
            recycle(actor, config.recycle_threshold, config.world_span);
        }
    }

    /// Lead moves relative to ego: it falls back when ego is faster.
    pub fn advance_lead(&mut self, relative: f32) {
        if let Ok(lead) = self.tracked_mut(ActorKind::Lead) {
            lead.position.z += relative;
        }
    }

    /// Crossing step: `lateral` toward the ego lane, plus `forward` on top
    /// of the regular scroll.
    pub fn walk_pedestrian(&mut self, lateral: f32, forward: f32) {
        if let Ok(pedestrian) = self.tracked_mut(ActorKind::Pedestrian) {
            pedestrian.position.x -= lateral;
            pedestrian.position.z += forward;
        }
    }

    pub fn set_z(&mut self, kind: ActorKind, z: f32) -> SimulationResult<()> {
        self.tracked_mut(kind)?.position.z = z;
        Ok(())
    }

    pub fn place(&mut self, kind: ActorKind, position: Vec3) -> SimulationResult<()> {
        self.tracked_mut(kind)?.position = position;
        Ok(())
    }

    pub fn set_lead_hazard(&mut self, lit: bool) -> SimulationResult<()> {
        let lead = self.tracked_mut(ActorKind::Lead)?;
        lead.hazard_lit = lit;
        lead.brake_lights = lit;
        Ok(())
    }

    /// Tail lights show the hazard flag, or a red signal the lead is queuing at.
    pub fn update_brake_lights(&mut self, signal_ahead: bool) {
        if let Ok(lead) = self.tracked_mut(ActorKind::Lead) {
            lead.brake_lights = lead.hazard_lit || signal_ahead;
        }
    }
}

fn recycle(actor: &mut Actor, threshold: f32, span: f32) {
    if actor.position.z > threshold {
        actor.position.z -= span;
        debug!("recycled {:?} to z={:.1}", actor.kind, actor.position.z);
    }
}

pub fn scroll_world(
    time: Res<Time>,
    config: Res<SimulationConfig>,
    kinematics: Res<Kinematics>,
    controller: Res<ScenarioController>,
    signal: Res<SignalState>,
    mut roadway: ResMut<Roadway>,
) {
    let dt = time.delta_secs();
    let speed = kinematics.speed;

    roadway.scroll(speed * dt, dt, &config);
    roadway.advance_lead((speed - kinematics.lead_speed) * dt * config.scroll_scale);

    // Crosses only while the ego is below walking pace threshold
    if controller.active() == Some(ScenarioKind::PedestrianIncursion)
        && speed < config.pedestrian_walk_below
    {
        roadway.walk_pedestrian(
            config.pedestrian_walk_speed * dt,
            speed * dt * config.scroll_scale,
        );
    }

    let queuing_at_red = signal.is_red()
        && roadway
            .distance_ahead(ActorKind::StopLine)
            .is_ok_and(|distance| distance.abs() < config.signal_mirror_distance);
    roadway.update_brake_lights(queuing_at_red);
}
