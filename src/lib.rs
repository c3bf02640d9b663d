pub mod config;
pub mod constants;
pub mod control;
pub mod errors;
pub mod logging;
pub mod telemetry_system;
pub mod trajectory_system;

pub use config::{AutopilotConfig, ConfigFile, SimulationConfig};
pub use constants::*;
pub use control::pid::{PidConfig, PidController};
pub use control::simulation::{
    Boundary, DriverConfig, Simulation, SimulationResult, SimulationState,
};
pub use errors::SimulationError;

// Re-export commonly used items from trajectory_system
pub use trajectory_system::aerodynamics::{DragAltitude, DragConfig};
pub use trajectory_system::kinematics::{Plant, RocketAltitude, RocketConfig};

// Re-export commonly used items from telemetry_system
pub use telemetry_system::telemetry::{FlightSummary, Telemetry, TickRecord};
