//! Longitudinal speed state for the ego and lead vehicles.
//!
//! Units:
//! - Speed: world units per second
//! - Acceleration: world units per second squared
//! - Time: seconds (s)

use bevy_ecs::prelude::*;
use bevy_time::Time;

use crate::{RampRates, SimulationConfig};

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct Kinematics {
    pub speed: f32,
    pub target_speed: f32,
    pub lead_speed: f32,
    pub lead_target_speed: f32,
    /// Driver set-point the geometry engine cruises at
    pub set_point: f32,
}

impl Kinematics {
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            speed: config.cruise_speed,
            target_speed: config.cruise_speed,
            lead_speed: config.cruise_speed,
            lead_target_speed: config.cruise_speed,
            set_point: config.cruise_speed,
        }
    }

    /// Immediate stop, bypassing the ramp.
    pub fn halt(&mut self) {
        self.speed = 0.0;
        self.target_speed = 0.0;
    }

    /// Moves ego speed one step toward its target.
    pub fn realize(&mut self, rates: RampRates, stop_snap: f32, dt: f32) {
        let target = self.target_speed.max(0.0);
        self.speed = ramp(self.speed, target, rates, dt);
        if self.speed < stop_snap {
            self.speed = 0.0;
        }
    }

    pub fn realize_lead(&mut self, rates: RampRates, dt: f32) {
        let target = self.lead_target_speed.max(0.0);
        self.lead_speed = ramp(self.lead_speed, target, rates, dt);
    }
}

/// Steps `current` toward `target` without passing it.
pub fn ramp(current: f32, target: f32, rates: RampRates, dt: f32) -> f32 {
    let dt = dt.max(0.0);
    let next = if current < target {
        (current + rates.acceleration * dt).min(target)
    } else if current > target {
        (current - rates.deceleration_toward(target) * dt).max(target)
    } else {
        current
    };
    next.max(0.0)
}

pub fn realize_speed(
    time: Res<Time>,
    config: Res<SimulationConfig>,
    mut kinematics: ResMut<Kinematics>,
) {
    let dt = time.delta_secs();
    kinematics.realize(config.ego_ramp(), config.stop_snap, dt);
    kinematics.realize_lead(config.lead_rates, dt);
}
