//! Line protocol between the safety loop and the outside world.
//!
//! Two sources feed the loop: the V2X socket, which speaks JSON objects
//! tagged by `kind`, and the speed potentiometer, which writes
//! `POT_VAL:<n>` serial lines. Both parse into a [`Message`] that
//! [`dispatch`] applies to a [`Simulation`].

use bevy_log::{debug, info};
use serde::Deserialize;
use simulation::{ScenarioKind, Simulation, SimulationError};
use thiserror::Error;

const POT_PREFIX: &str = "POT_VAL:";

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("malformed message {line:?}: {source}")]
    Malformed {
        line: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unreadable potentiometer value {0:?}")]
    Potentiometer(String),

    #[error("script line {line}: {source}")]
    Script {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Message {
    /// Starts a named scenario (`braking`, `pedestrian`, `signal`)
    Trigger { scenario: String },
    /// Replaces the V2X risk classification
    Risk {
        risk: String,
        #[serde(default)]
        event: String,
    },
    ManualMove { distance: f32 },
    V2xUpdate(V2xEvent),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event")]
pub enum V2xEvent {
    /// Lead vehicle broadcast a hard stop
    #[serde(rename = "braking")]
    Braking,
    #[serde(rename = "AEB_ACTIVE")]
    AebActive,
    #[serde(rename = "speed_change")]
    SpeedChange { value: f32 },
}

/// Parses one line from either source. Blank lines are not messages.
pub fn parse_line(line: &str) -> Result<Option<Message>, BridgeError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    if let Some(raw) = line.strip_prefix(POT_PREFIX) {
        let value = raw
            .trim()
            .parse::<f32>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| BridgeError::Potentiometer(raw.to_string()))?;
        return Ok(Some(Message::V2xUpdate(V2xEvent::SpeedChange { value })));
    }

    serde_json::from_str(line)
        .map(Some)
        .map_err(|source| BridgeError::Malformed {
            line: line.to_string(),
            source,
        })
}

/// Applies a message to the loop. Rejected inputs leave the loop untouched,
/// except an oversized manual move, which still raises the AEB alert.
pub fn dispatch(sim: &mut Simulation, message: &Message) -> Result<(), BridgeError> {
    debug!("dispatching {message:?}");
    match message {
        Message::Trigger { scenario } => {
            sim.trigger(scenario)?;
        }
        Message::Risk { risk, event } => {
            sim.push_risk(risk, event.clone())?;
        }
        Message::ManualMove { distance } => {
            sim.request_displacement(*distance)?;
        }
        Message::V2xUpdate(V2xEvent::Braking) => {
            sim.trigger_kind(ScenarioKind::LeadBrake);
        }
        Message::V2xUpdate(V2xEvent::AebActive) => {
            sim.raise_aeb_alert();
        }
        Message::V2xUpdate(V2xEvent::SpeedChange { value }) => {
            let applied = sim.set_cruise_set_point(*value);
            info!("set-point {applied}");
        }
    }
    Ok(())
}

/// One scripted message, delivered once simulated time reaches `at`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScriptEntry {
    pub at: f32,
    #[serde(flatten)]
    pub message: Message,
}

/// Reads a JSON-lines script. Lines starting with `#` are comments. Entries
/// come back ordered by time; entries sharing a time keep file order.
pub fn load_script(text: &str) -> Result<Vec<ScriptEntry>, BridgeError> {
    let mut entries = text
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(index, line)| {
            serde_json::from_str::<ScriptEntry>(line).map_err(|source| BridgeError::Script {
                line: index + 1,
                source,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    entries.sort_by(|a, b| a.at.total_cmp(&b.at));
    Ok(entries)
}
