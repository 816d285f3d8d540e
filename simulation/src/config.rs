//! Tunables for the longitudinal control loop.
//!
//! Units:
//! - Distance/Position: world units along the road (z, negative = ahead)
//! - Speed: world units per second
//! - Time: seconds (s)
//!
//! The world is rendered at `scroll_scale` times the speed the HUD shows, so
//! a displacement of `speed * dt` moves scenery by `speed * dt * scroll_scale`.

use std::str::FromStr;

use bevy_ecs::prelude::*;
use glam::Vec3;

/// Which input drives the target speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlMode {
    /// Distances to lead, pedestrian and stop line.
    #[default]
    Geometry,
    /// Externally pushed V2X risk classifications.
    RiskFeed,
}

impl FromStr for ControlMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "geometry" => Ok(ControlMode::Geometry),
            "risk" | "risk_feed" => Ok(ControlMode::RiskFeed),
            other => Err(format!("unknown control mode {other:?}")),
        }
    }
}

/// Three distance bands around a hazard: proportional following below
/// `follow`, target zero below `brake`, instant stop below `clamp`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityTiers {
    pub follow: f32,
    pub brake: f32,
    pub clamp: f32,
}

/// Acceleration pair used to walk a speed toward its target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RampRates {
    pub acceleration: f32,
    pub deceleration: f32,
    /// Used instead of `deceleration` when the target is zero
    pub emergency_deceleration: Option<f32>,
}

impl RampRates {
    pub fn deceleration_toward(&self, target: f32) -> f32 {
        match self.emergency_deceleration {
            Some(emergency) if target <= 0.0 => emergency,
            _ => self.deceleration,
        }
    }
}

/// Where things sit when the world is built and where scenarios move them.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub lead_start: Vec3,
    pub pedestrian_home: Vec3,
    pub pedestrian_incursion: Vec3,
    pub traffic_light: Vec3,
    pub stop_line: Vec3,
    /// Forward coordinate the signal-approach scenario moves the light to
    pub encounter_light_z: f32,
    /// Forward coordinate of the stop line and lead during signal approach
    pub encounter_line_z: f32,
    pub tree_count: usize,
    pub building_count: usize,
    pub parked_count: usize,
    pub oncoming_count: usize,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            lead_start: Vec3::new(5.0, 0.0, -40.0),
            pedestrian_home: Vec3::new(16.0, 0.0, -30.0),
            pedestrian_incursion: Vec3::new(10.0, 0.0, -50.0),
            traffic_light: Vec3::new(12.0, 0.0, -180.0),
            stop_line: Vec3::new(5.0, 0.05, -170.0),
            encounter_light_z: -120.0,
            encounter_line_z: -112.0,
            tree_count: 80,
            building_count: 20,
            parked_count: 40,
            oncoming_count: 6,
        }
    }
}

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub mode: ControlMode,
    /// Default cruise set-point, also the lead vehicle's cruise speed
    pub cruise_speed: f32,
    pub lead_tiers: ProximityTiers,
    pub pedestrian_tiers: ProximityTiers,
    /// Red signal forces a stop when the stop line is closer than this
    pub signal_stop_distance: f32,
    /// Lead brake lights follow a red signal inside this distance
    pub signal_mirror_distance: f32,
    pub ego_rates: RampRates,
    pub risk_rates: RampRates,
    pub lead_rates: RampRates,
    /// Speeds below this snap to exactly zero
    pub stop_snap: f32,
    pub scroll_scale: f32,
    /// Extra closing speed of oncoming traffic, independent of ego speed
    pub oncoming_speed: f32,
    /// Environment actors past this forward coordinate are recycled
    pub recycle_threshold: f32,
    /// Distance a recycled actor is sent back by
    pub world_span: f32,
    pub signal_period: f32,
    pub scenario_duration: f32,
    /// Ego target while the lead broadcasts an emergency brake
    pub lead_brake_target: f32,
    pub pedestrian_walk_speed: f32,
    /// The pedestrian only steps out once ego is slower than this
    pub pedestrian_walk_below: f32,
    /// Manual displacement requests above this are refused
    pub max_manual_shift: f32,
    pub layout: Layout,
    /// Seed for scenery side placement
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            mode: ControlMode::Geometry,
            cruise_speed: 45.0,
            lead_tiers: ProximityTiers {
                follow: 35.0,
                brake: 15.0,
                clamp: 7.0,
            },
            pedestrian_tiers: ProximityTiers {
                follow: 50.0,
                brake: 20.0,
                clamp: 5.0,
            },
            signal_stop_distance: 50.0,
            signal_mirror_distance: 120.0,
            ego_rates: RampRates {
                acceleration: 15.0,
                deceleration: 32.0,
                emergency_deceleration: Some(75.0),
            },
            risk_rates: RampRates {
                acceleration: 15.0,
                deceleration: 32.0,
                emergency_deceleration: None,
            },
            lead_rates: RampRates {
                acceleration: 20.0,
                deceleration: 45.0,
                emergency_deceleration: None,
            },
            stop_snap: 0.1,
            scroll_scale: 1.5,
            oncoming_speed: 40.0,
            recycle_threshold: 50.0,
            world_span: 1000.0,
            signal_period: 15.0,
            scenario_duration: 5.0,
            lead_brake_target: 20.0,
            pedestrian_walk_speed: 4.0,
            pedestrian_walk_below: 15.0,
            max_manual_shift: 150.0,
            layout: Layout::default(),
            seed: 0x5eed,
        }
    }
}

impl SimulationConfig {
    pub fn with_mode(mut self, mode: ControlMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Ramp rates for the ego vehicle in the current mode
    pub fn ego_ramp(&self) -> RampRates {
        match self.mode {
            ControlMode::Geometry => self.ego_rates,
            ControlMode::RiskFeed => self.risk_rates,
        }
    }
}
