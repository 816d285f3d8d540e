//! Staged safety overrides for the geometry-driven engine.
//!
//! Every hazard can only lower the speed ceiling. The drive state reported
//! is the one from the most severe stage that fired; on equal severity the
//! hazard evaluated first wins (lead, then pedestrian, then signal).

use serde::Serialize;

use crate::{hud::labels, ProximityTiers, Severity, SignalPhase, SimulationConfig};

/// Stages ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Cruise,
    SignalStop,
    Following,
    HardBraking,
    PhysicalClamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Hazard {
    Lead,
    Pedestrian,
    Signal,
}

struct Rule {
    hazard: Hazard,
    stage: Stage,
    label: &'static str,
    severity: Severity,
}

const RULES: &[Rule] = &[
    Rule {
        hazard: Hazard::Lead,
        stage: Stage::Following,
        label: labels::ADAPTIVE_DISTANCE,
        severity: Severity::Nominal,
    },
    Rule {
        hazard: Hazard::Lead,
        stage: Stage::HardBraking,
        label: labels::AEB_LEAD,
        severity: Severity::Critical,
    },
    Rule {
        hazard: Hazard::Lead,
        stage: Stage::PhysicalClamp,
        label: labels::AEB_LEAD,
        severity: Severity::Critical,
    },
    Rule {
        hazard: Hazard::Pedestrian,
        stage: Stage::Following,
        label: labels::VRU_BRAKING,
        severity: Severity::Nominal,
    },
    Rule {
        hazard: Hazard::Pedestrian,
        stage: Stage::HardBraking,
        label: labels::AEB_HUMAN,
        severity: Severity::Critical,
    },
    Rule {
        hazard: Hazard::Pedestrian,
        stage: Stage::PhysicalClamp,
        label: labels::AEB_HUMAN,
        severity: Severity::Critical,
    },
    Rule {
        hazard: Hazard::Signal,
        stage: Stage::SignalStop,
        label: labels::SIGNAL_STOP,
        severity: Severity::Caution,
    },
];

fn rule(hazard: Hazard, stage: Stage) -> Option<&'static Rule> {
    RULES
        .iter()
        .find(|rule| rule.hazard == hazard && rule.stage == stage)
}

/// What the engine sees this tick. Distances are already sanitized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub speed: f32,
    pub set_point: f32,
    pub distance_to_lead: f32,
    /// Only present while a pedestrian incursion is live
    pub distance_to_pedestrian: Option<f32>,
    /// `None` once the stop line is behind the ego
    pub distance_to_stop_line: Option<f32>,
    pub signal: SignalPhase,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Decision {
    pub target_speed: f32,
    pub stage: Stage,
    pub hazard: Option<Hazard>,
    pub label: &'static str,
    pub severity: Severity,
    /// Current speed must be zeroed this tick
    pub clamp_speed: bool,
}

impl Decision {
    fn cruise(target_speed: f32) -> Self {
        Self {
            target_speed,
            stage: Stage::Cruise,
            hazard: None,
            label: labels::CRUISE,
            severity: Severity::Nominal,
            clamp_speed: false,
        }
    }

    /// Lowers the ceiling and adopts the stage's label if it is more severe.
    fn tighten(&mut self, hazard: Hazard, stage: Stage, ceiling: f32) {
        self.target_speed = self.target_speed.min(ceiling);
        self.clamp_speed |= stage == Stage::PhysicalClamp;

        if stage > self.stage {
            if let Some(rule) = rule(hazard, stage) {
                self.stage = stage;
                self.hazard = Some(hazard);
                self.label = rule.label;
                self.severity = rule.severity;
            }
        }
    }
}

/// Clamps a raw hazard distance to something the rules can act on. Anything
/// unusable reads as contact.
pub fn sanitize_distance(raw: f32) -> f32 {
    if raw.is_nan() || raw < 0.0 {
        0.0
    } else {
        raw
    }
}

/// Proportional following, hard braking and physical clamp bands.
fn proximity(distance: f32, tiers: ProximityTiers, speed: f32) -> Option<(Stage, f32)> {
    if distance >= tiers.follow {
        None
    } else if distance < tiers.clamp {
        Some((Stage::PhysicalClamp, 0.0))
    } else if distance < tiers.brake {
        Some((Stage::HardBraking, 0.0))
    } else {
        Some((Stage::Following, (speed * distance / tiers.follow).max(0.0)))
    }
}

pub fn decide(observation: &Observation, config: &SimulationConfig) -> Decision {
    let mut decision = Decision::cruise(observation.set_point.max(0.0));

    if let Some((stage, ceiling)) = proximity(
        observation.distance_to_lead,
        config.lead_tiers,
        observation.speed,
    ) {
        decision.tighten(Hazard::Lead, stage, ceiling);
    }

    if let Some(distance) = observation.distance_to_pedestrian {
        if let Some((stage, ceiling)) =
            proximity(distance, config.pedestrian_tiers, observation.speed)
        {
            decision.tighten(Hazard::Pedestrian, stage, ceiling);
        }
    }

    if observation.signal == SignalPhase::Red {
        if let Some(distance) = observation.distance_to_stop_line {
            if distance < config.signal_stop_distance {
                decision.tighten(Hazard::Signal, Stage::SignalStop, 0.0);
            }
        }
    }

    decision
}
