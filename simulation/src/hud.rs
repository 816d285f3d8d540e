//! Driver-facing status: drive state label, ticker line and alert banner.

use bevy_ecs::prelude::*;
use serde::Serialize;

pub mod labels {
    pub const CRUISE: &str = "Active Cruise Control";
    pub const ADAPTIVE_DISTANCE: &str = "Adaptive Distance Control";
    pub const AEB_LEAD: &str = "AEB: Leading Vehicle";
    pub const VRU_BRAKING: &str = "VRU Safety Braking";
    pub const AEB_HUMAN: &str = "AEB: Human Detection";
    pub const SIGNAL_STOP: &str = "V2I Signal Stop";
    pub const APPROACH_INTERSECTION: &str = "Approach Intersection";
    pub const V2X_CAUTION: &str = "V2X Caution: Reduced Speed";
    pub const V2X_HAZARD: &str = "V2X Hazard Response";
    pub const V2X_CRITICAL: &str = "AEB: V2X Critical Risk";
}

pub mod ticker {
    pub const NOMINAL: &str = "SYSTEM NOMINAL. SCANNING V2X DATA STREAMS.";
    pub const LEAD_BRAKE: &str = "V2V BROADCAST: LEAD VEHICLE EMERGENCY BRAKE (BSM)";
    pub const PEDESTRIAN: &str = "V2P: VRU DETECTED ON TRAJECTORY. DEPLOYING BRAKE PROTOCOL.";
    pub const SIGNAL_RED: &str = "V2I: SPAT BROADCAST - INTERSECTION RED";
    pub const STOP_COMMITTED: &str = "V2I: STOP COMMITTED AT SIGNAL";
}

/// How alarming a state is; drives the HUD color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Nominal,
    Caution,
    Critical,
}

#[derive(Resource, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriveState {
    pub label: &'static str,
    pub severity: Severity,
}

impl Default for DriveState {
    fn default() -> Self {
        Self {
            label: labels::CRUISE,
            severity: Severity::Nominal,
        }
    }
}

impl DriveState {
    pub fn set(&mut self, label: &'static str, severity: Severity) {
        self.label = label;
        self.severity = severity;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

impl Alert {
    pub fn new(title: impl Into<String>, description: impl Into<String>, severity: Severity) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity,
        }
    }

    pub fn aeb_active() -> Self {
        Self::new(
            "AEB ACTIVE",
            "Requested displacement exceeds the safe envelope.",
            Severity::Critical,
        )
    }
}

#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub struct Hud {
    pub ticker: String,
    pub alert: Option<Alert>,
}

impl Default for Hud {
    fn default() -> Self {
        Self {
            ticker: ticker::NOMINAL.to_string(),
            alert: None,
        }
    }
}

impl Hud {
    pub fn announce(&mut self, message: &str) {
        message.clone_into(&mut self.ticker);
    }

    pub fn raise(&mut self, alert: Alert) {
        self.alert = Some(alert);
    }

    pub fn dismiss(&mut self) {
        self.alert = None;
    }
}
