mod kinematics;
pub use kinematics::*;

mod rules;
pub use rules::*;

mod risk;
pub use risk::*;

use bevy_ecs::prelude::*;
use bevy_log::warn;

use crate::{
    hud::ticker, ActorKind, ControlMode, DriveState, Hud, Roadway, ScenarioController,
    ScenarioKind, SignalPhase, SignalState, SimulationConfig,
};

/// Reads the roadway into what the rules need. A tracked actor that is
/// missing reads as contact, so the engine brakes rather than guesses.
pub fn observe(
    roadway: &Roadway,
    signal: &SignalState,
    scenario: Option<ScenarioKind>,
    kinematics: &Kinematics,
) -> Observation {
    let hazard = |kind: ActorKind| match roadway.distance_ahead(kind) {
        Ok(distance) => sanitize_distance(distance),
        Err(err) => {
            warn!("{err}; braking as if in contact");
            0.0
        }
    };

    let distance_to_pedestrian =
        (scenario == Some(ScenarioKind::PedestrianIncursion)).then(|| hazard(ActorKind::Pedestrian));

    let distance_to_stop_line = match roadway.distance_ahead(ActorKind::StopLine) {
        Ok(distance) if distance >= 0.0 => Some(distance),
        Ok(_) => None,
        Err(err) => {
            warn!("{err}; holding at the signal");
            Some(0.0)
        }
    };

    Observation {
        speed: kinematics.speed,
        set_point: kinematics.set_point,
        distance_to_lead: hazard(ActorKind::Lead),
        distance_to_pedestrian,
        distance_to_stop_line,
        signal: signal.phase,
    }
}

#[allow(clippy::too_many_arguments)]
pub fn evaluate_decision(
    config: Res<SimulationConfig>,
    feed: Res<RiskFeed>,
    controller: Res<ScenarioController>,
    roadway: Res<Roadway>,
    mut signal: ResMut<SignalState>,
    mut kinematics: ResMut<Kinematics>,
    mut drive: ResMut<DriveState>,
    mut hud: ResMut<Hud>,
) {
    match config.mode {
        ControlMode::Geometry => {
            let observation = observe(&roadway, &signal, controller.active(), &kinematics);
            let decision = decide(&observation, &config);

            if decision.clamp_speed {
                kinematics.halt();
            }
            kinematics.target_speed = decision.target_speed;
            drive.set(decision.label, decision.severity);

            // One stop commitment per red phase
            if signal_fired(&observation, &config) && !signal.stop_line_locked {
                signal.stop_line_locked = true;
                hud.announce(ticker::STOP_COMMITTED);
            }
        }
        ControlMode::RiskFeed => {
            let tier = feed.level().tier();
            kinematics.target_speed = tier.target_speed;
            drive.set(tier.label, tier.severity);

            // The banner follows the latest report only
            if feed.is_changed() {
                match feed.latest().and_then(RiskReport::alert) {
                    Some(alert) => hud.raise(alert),
                    None => hud.dismiss(),
                }
            }
        }
    }
}

fn signal_fired(observation: &Observation, config: &SimulationConfig) -> bool {
    observation.signal == SignalPhase::Red
        && observation
            .distance_to_stop_line
            .is_some_and(|distance| distance < config.signal_stop_distance)
}
