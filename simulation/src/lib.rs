use bevy_app::prelude::*;
use bevy_ecs::prelude::*;

mod arena;
mod config;
pub mod driver;
mod error;
mod harness;
pub mod hud;
pub mod prelude;
mod roadway;
mod scenario;
mod signal;
mod snapshot;

pub use arena::*;
pub use config::*;
pub use driver::{Kinematics, RiskFeed, RiskLevel};
pub use error::*;
pub use harness::*;
pub use hud::{Alert, DriveState, Hud, Severity};
pub use roadway::*;
pub use scenario::*;
pub use signal::*;
pub use snapshot::*;

use crate::driver::{evaluate_decision, realize_speed};

/// Longitudinal safety loop. Expects a `bevy_time::Time` resource; add
/// `TimePlugin` or drive the clock yourself as [`Simulation`] does.
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SimulationConfig>();
        let config = app.world().resource::<SimulationConfig>().clone();

        app.insert_resource(Kinematics::new(&config))
            .insert_resource(Roadway::from_config(&config))
            .insert_resource(SignalState::new(config.signal_period))
            .init_resource::<ScenarioController>()
            .init_resource::<RiskFeed>()
            .init_resource::<DriveState>()
            .init_resource::<Hud>();

        app.add_systems(
            Update,
            (
                tick_scenario_timer,
                evaluate_decision,
                realize_speed,
                scroll_world,
                tick_signal,
            )
                .chain(),
        );
    }
}
