pub use crate::{
    driver::{Decision, Hazard, Kinematics, RiskLevel, Stage},
    ActorKind, Alert, ControlMode, Severity, SignalPhase, Simulation, SimulationConfig,
    SimulationError, SimulationPlugin, SimulationResult, Snapshot, ScenarioKind,
};
