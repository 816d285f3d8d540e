use thiserror::Error;

use crate::ActorKind;

/// Inputs the simulation refuses to act on.
///
/// None of these are fatal: the frame loop keeps running and the state is
/// left exactly as it was before the rejected call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    #[error("unknown scenario kind: {0:?}")]
    InvalidScenarioKind(String),

    #[error("unknown risk tag: {0:?}")]
    InvalidRiskTag(String),

    #[error("no {0:?} actor on the roadway")]
    MissingActorReference(ActorKind),

    #[error("displacement must be finite, got {0}")]
    InvalidDisplacement(f32),

    #[error("displacement of {requested}m exceeds the {limit}m manual envelope")]
    DisplacementRejected { requested: f32, limit: f32 },
}

pub type SimulationResult<T> = Result<T, SimulationError>;
