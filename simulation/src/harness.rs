//! Caller-driven stepping.
//!
//! [`Simulation`] owns an [`App`] with the [`SimulationPlugin`] and a manually
//! advanced clock, so the host decides how long each frame is. It is also the
//! single entry point for everything pushed in from outside the frame loop.

use std::time::Duration;

use bevy_app::prelude::*;
use bevy_ecs::{prelude::*, system::SystemState};
use bevy_log::{info, warn};
use bevy_time::Time;

use crate::{
    Alert, Hud, Kinematics, RevertToken, RiskFeed, RiskLevel, Roadway, ScenarioKind,
    ScenarioStage, SimulationConfig, SimulationError, SimulationPlugin, SimulationResult,
    Snapshot,
};

pub struct Simulation {
    app: App,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Self {
        let mut app = App::new();
        app.insert_resource(config)
            .init_resource::<Time>()
            .add_plugins(SimulationPlugin);
        Self { app }
    }

    /// For hosts that want to add their own plugins (logging, rendering).
    pub fn app_mut(&mut self) -> &mut App {
        &mut self.app
    }

    pub fn world(&self) -> &World {
        self.app.world()
    }

    pub fn resource<R: Resource>(&self) -> &R {
        self.app.world().resource::<R>()
    }

    pub fn resource_mut<R: Resource>(&mut self) -> Mut<'_, R> {
        self.app.world_mut().resource_mut::<R>()
    }

    /// Runs one frame of `dt`.
    pub fn step(&mut self, dt: Duration) {
        self.app.world_mut().resource_mut::<Time>().advance_by(dt);
        self.app.update();
    }

    /// Runs one frame of `dt` seconds. Negative or non-finite deltas run a
    /// zero-length frame.
    pub fn step_secs(&mut self, dt: f32) {
        let dt = if dt.is_finite() && dt > 0.0 {
            Duration::from_secs_f32(dt)
        } else {
            warn!("ignoring frame delta {dt}");
            Duration::ZERO
        };
        self.step(dt);
    }

    /// Runs frames of `dt` until `duration` seconds have elapsed. Runs
    /// nothing unless `dt` is positive and the frame count is finite.
    pub fn run_for(&mut self, duration: f32, dt: f32) {
        let frames = (duration / dt).round();
        if !(dt.is_finite() && dt > 0.0 && frames.is_finite()) {
            warn!("ignoring run of {duration}s in steps of {dt}s");
            return;
        }
        let frames = frames.max(0.0) as usize;
        for _ in 0..frames {
            self.step_secs(dt);
        }
    }

    /// Starts a named scenario (`braking`, `pedestrian`, `signal`).
    pub fn trigger(&mut self, kind: &str) -> SimulationResult<RevertToken> {
        let kind = kind.parse::<ScenarioKind>().inspect_err(|err| warn!("{err}"))?;
        Ok(self.trigger_kind(kind))
    }

    pub fn trigger_kind(&mut self, kind: ScenarioKind) -> RevertToken {
        let world = self.app.world_mut();
        let mut state: SystemState<ScenarioStage> = SystemState::new(world);
        let token = state.get_mut(world).trigger(kind);
        token
    }

    /// Replaces the current V2X classification. Unknown tags are refused and
    /// leave the previous classification in force.
    pub fn push_risk(&mut self, risk: &str, event: impl Into<String>) -> SimulationResult<RiskLevel> {
        let event = event.into();
        let level = self
            .resource_mut::<RiskFeed>()
            .push(risk, event.clone())
            .inspect_err(|err| warn!("{err}"))?;
        info!("risk {level:?}: {event}");
        Ok(level)
    }

    /// Queues a one-shot forward displacement for the next frame.
    pub fn request_displacement(&mut self, distance: f32) -> SimulationResult<()> {
        if !distance.is_finite() {
            return Err(SimulationError::InvalidDisplacement(distance));
        }

        let limit = self.resource::<SimulationConfig>().max_manual_shift;
        if distance > limit {
            warn!("manual move of {distance} refused, AEB engaged");
            self.raise_aeb_alert();
            return Err(SimulationError::DisplacementRejected {
                requested: distance,
                limit,
            });
        }

        self.resource_mut::<Roadway>().shift(distance);
        Ok(())
    }

    pub fn raise_aeb_alert(&mut self) {
        self.resource_mut::<Hud>().raise(Alert::aeb_active());
    }

    /// Sets the driver's cruise set-point, clamped to the cruise ceiling.
    /// Returns the value applied.
    pub fn set_cruise_set_point(&mut self, value: f32) -> f32 {
        let ceiling = self.resource::<SimulationConfig>().cruise_speed;
        let mut kinematics = self.resource_mut::<Kinematics>();
        if value.is_finite() {
            kinematics.set_point = value.clamp(0.0, ceiling);
        } else {
            warn!("ignoring set-point {value}");
        }
        kinematics.set_point
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self.world())
    }
}
