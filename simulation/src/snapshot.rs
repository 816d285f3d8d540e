use bevy_ecs::prelude::*;
use serde::Serialize;

use crate::{
    driver::Kinematics, Actor, ActorKind, Alert, DriveState, Hud, Roadway, ScenarioController,
    ScenarioKind, Severity, SignalPhase, SignalState,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActorView {
    pub kind: ActorKind,
    pub position: [f32; 3],
    pub brake_lights: bool,
}

impl From<&Actor> for ActorView {
    fn from(actor: &Actor) -> Self {
        Self {
            kind: actor.kind,
            position: actor.position.to_array(),
            brake_lights: actor.brake_lights,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalView {
    pub phase: SignalPhase,
    pub timer: f32,
    pub seconds_remaining: u32,
    pub stop_line_locked: bool,
}

/// Everything a renderer needs for one frame. Read-only copy of the state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub speed: f32,
    pub target_speed: f32,
    pub lead_speed: f32,
    pub label: &'static str,
    pub severity: Severity,
    pub signal: SignalView,
    pub scenario: Option<ScenarioKind>,
    pub ticker: String,
    pub alert: Option<Alert>,
    pub actors: Vec<ActorView>,
}

impl Snapshot {
    pub fn capture(world: &World) -> Self {
        let kinematics = world.resource::<Kinematics>();
        let drive = world.resource::<DriveState>();
        let signal = world.resource::<SignalState>();
        let hud = world.resource::<Hud>();

        Self {
            speed: kinematics.speed,
            target_speed: kinematics.target_speed,
            lead_speed: kinematics.lead_speed,
            label: drive.label,
            severity: drive.severity,
            signal: SignalView {
                phase: signal.phase,
                timer: signal.timer,
                seconds_remaining: signal.seconds_remaining(),
                stop_line_locked: signal.stop_line_locked,
            },
            scenario: world.resource::<ScenarioController>().active(),
            ticker: hud.ticker.clone(),
            alert: hud.alert.clone(),
            actors: world
                .resource::<Roadway>()
                .actors
                .iter()
                .map(ActorView::from)
                .collect(),
        }
    }

    /// Forward coordinate of the first actor of `kind`.
    pub fn z_of(&self, kind: ActorKind) -> Option<f32> {
        self.actors
            .iter()
            .find(|actor| actor.kind == kind)
            .map(|actor| actor.position[2])
    }
}
