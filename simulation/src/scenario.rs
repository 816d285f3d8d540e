//! Time-boxed hazard injection.
//!
//! At most one scenario is live. Triggering arms a revert that fires after
//! `scenario_duration` simulated seconds; triggering again cancels the
//! pending revert and arms a fresh one, so one activation never sees two
//! reverts.

use std::str::FromStr;

use bevy_ecs::{prelude::*, system::SystemParam};
use bevy_log::{debug, info, warn};
use bevy_time::Time;
use serde::Serialize;

use crate::{
    hud::{labels, ticker},
    ActorKind, Alert, DriveState, Hud, Kinematics, Layout, Roadway, Severity, SignalPhase,
    SignalState, SimulationConfig, SimulationError, SimulationResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    LeadBrake,
    PedestrianIncursion,
    SignalApproach,
}

impl ScenarioKind {
    /// Name used by the trigger buttons and the V2X bridge.
    pub fn wire_name(&self) -> &'static str {
        match self {
            ScenarioKind::LeadBrake => "braking",
            ScenarioKind::PedestrianIncursion => "pedestrian",
            ScenarioKind::SignalApproach => "signal",
        }
    }
}

impl FromStr for ScenarioKind {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "braking" | "lead_brake" => Ok(ScenarioKind::LeadBrake),
            "pedestrian" | "pedestrian_incursion" => Ok(ScenarioKind::PedestrianIncursion),
            "signal" | "signal_approach" => Ok(ScenarioKind::SignalApproach),
            _ => Err(SimulationError::InvalidScenarioKind(s.to_string())),
        }
    }
}

/// Identifies one armed revert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RevertToken(u64);

#[derive(Debug, Clone, PartialEq)]
struct PendingRevert {
    token: RevertToken,
    remaining: f32,
}

#[derive(Resource, Debug, Default, Clone, PartialEq)]
pub struct ScenarioController {
    active: Option<ScenarioKind>,
    pending: Option<PendingRevert>,
    issued: u64,
}

impl ScenarioController {
    pub fn active(&self) -> Option<ScenarioKind> {
        self.active
    }

    pub fn pending_revert(&self) -> Option<RevertToken> {
        self.pending.as_ref().map(|pending| pending.token)
    }

    /// Installs `kind` and arms its revert, cancelling any earlier one.
    pub fn arm(&mut self, kind: ScenarioKind, duration: f32) -> RevertToken {
        if let Some(cancelled) = self.cancel() {
            debug!("cancelled pending revert {cancelled:?}");
        }
        self.issued += 1;
        let token = RevertToken(self.issued);
        self.active = Some(kind);
        self.pending = Some(PendingRevert {
            token,
            remaining: duration,
        });
        token
    }

    pub fn cancel(&mut self) -> Option<RevertToken> {
        self.pending.take().map(|pending| pending.token)
    }

    /// Counts the pending revert down. Returns its token once it is due.
    pub fn tick(&mut self, dt: f32) -> Option<RevertToken> {
        let pending = self.pending.as_mut()?;
        pending.remaining -= dt;
        if pending.remaining > 0.0 {
            return None;
        }
        self.cancel()
    }

    /// Clears the live scenario.
    fn finish(&mut self) {
        self.active = None;
        self.pending = None;
    }
}

/// Everything a scenario touches when it starts or ends.
#[derive(SystemParam)]
pub struct ScenarioStage<'w> {
    pub config: Res<'w, SimulationConfig>,
    pub controller: ResMut<'w, ScenarioController>,
    pub kinematics: ResMut<'w, Kinematics>,
    pub roadway: ResMut<'w, Roadway>,
    pub signal: ResMut<'w, SignalState>,
    pub drive: ResMut<'w, DriveState>,
    pub hud: ResMut<'w, Hud>,
}

impl ScenarioStage<'_> {
    pub fn trigger(&mut self, kind: ScenarioKind) -> RevertToken {
        let config = &*self.config;
        let layout = &config.layout;

        self.kinematics.target_speed = self.kinematics.set_point;
        self.kinematics.lead_target_speed = config.cruise_speed;
        self.signal.stop_line_locked = false;
        self.hud.dismiss();

        let placed = match kind {
            ScenarioKind::LeadBrake => {
                self.kinematics.lead_target_speed = 0.0;
                self.kinematics.target_speed = config.lead_brake_target;
                self.hud.announce(ticker::LEAD_BRAKE);
                self.hud.raise(Alert::new(
                    "V2V EMERGENCY BRAKE",
                    "Lead vehicle broadcasted hard stop. Initiating response.",
                    Severity::Critical,
                ));
                self.roadway.set_lead_hazard(true)
            }
            ScenarioKind::PedestrianIncursion => {
                self.hud.announce(ticker::PEDESTRIAN);
                self.hud.raise(Alert::new(
                    "V2P HUMAN DETECTION",
                    "Pedestrian detected on intersection path. Automatic stop engaged.",
                    Severity::Critical,
                ));
                self.roadway
                    .place(ActorKind::Pedestrian, layout.pedestrian_incursion)
            }
            ScenarioKind::SignalApproach => {
                self.signal.force_red();
                self.hud.announce(ticker::SIGNAL_RED);
                self.drive
                    .set(labels::APPROACH_INTERSECTION, Severity::Caution);
                stage_encounter(&mut self.roadway, layout)
            }
        };
        if let Err(err) = placed {
            warn!("{} scenario partially applied: {err}", kind.wire_name());
        }

        let token = self.controller.arm(kind, config.scenario_duration);
        info!("scenario {} armed as {token:?}", kind.wire_name());
        token
    }

    /// Puts the demo back to its resting state.
    pub fn revert(&mut self) {
        let config = &*self.config;
        let layout = &config.layout;

        if let Some(kind) = self.controller.active() {
            info!("scenario {} reverted", kind.wire_name());
        }
        self.controller.finish();

        self.kinematics.target_speed = self.kinematics.set_point;
        self.kinematics.lead_target_speed = config.cruise_speed;
        self.kinematics.lead_speed = config.cruise_speed;

        self.signal.stop_line_locked = false;
        self.signal.phase = SignalPhase::Green;

        self.drive.set(labels::CRUISE, Severity::Nominal);
        self.hud.dismiss();
        self.hud.announce(ticker::NOMINAL);

        let restored = restore_roadway(&mut self.roadway, layout);
        if let Err(err) = restored {
            warn!("revert left the roadway incomplete: {err}");
        }
    }
}

pub fn tick_scenario_timer(time: Res<Time>, mut stage: ScenarioStage) {
    if let Some(token) = stage.controller.tick(time.delta_secs()) {
        debug!("revert {token:?} due");
        stage.revert();
    }
}

/// Light, line and lead move together to the new encounter point.
fn stage_encounter(roadway: &mut Roadway, layout: &Layout) -> SimulationResult<()> {
    roadway.set_z(ActorKind::TrafficLight, layout.encounter_light_z)?;
    roadway.set_z(ActorKind::StopLine, layout.encounter_line_z)?;
    roadway.set_z(ActorKind::Lead, layout.encounter_line_z)
}

fn restore_roadway(roadway: &mut Roadway, layout: &Layout) -> SimulationResult<()> {
    roadway.place(ActorKind::Pedestrian, layout.pedestrian_home)?;
    roadway.set_lead_hazard(false)?;
    roadway.set_z(ActorKind::Lead, layout.lead_start.z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_names() {
        assert_eq!("braking".parse(), Ok(ScenarioKind::LeadBrake));
        assert_eq!("pedestrian".parse(), Ok(ScenarioKind::PedestrianIncursion));
        assert_eq!("signal".parse(), Ok(ScenarioKind::SignalApproach));
        assert_eq!(
            "weather".parse::<ScenarioKind>(),
            Err(SimulationError::InvalidScenarioKind("weather".to_string()))
        );
    }

    #[test]
    fn revert_fires_once_after_duration() {
        let mut controller = ScenarioController::default();
        let token = controller.arm(ScenarioKind::LeadBrake, 5.0);

        assert_eq!(controller.tick(2.5), None);
        assert_eq!(controller.tick(2.5), Some(token));
        assert_eq!(controller.tick(2.5), None);
    }

    #[test]
    fn retrigger_cancels_previous_revert() {
        let mut controller = ScenarioController::default();
        let first = controller.arm(ScenarioKind::LeadBrake, 5.0);
        controller.tick(4.0);

        let second = controller.arm(ScenarioKind::PedestrianIncursion, 5.0);
        assert_ne!(first, second);
        assert_eq!(controller.active(), Some(ScenarioKind::PedestrianIncursion));
        assert_eq!(controller.pending_revert(), Some(second));

        // The first activation's deadline passes without a revert
        assert_eq!(controller.tick(1.5), None);
        assert_eq!(controller.tick(3.5), Some(second));
    }
}
