use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, trace, warn};

use crate::config::{AutopilotConfig, SimulationConfig};
use crate::control::pid::PidController;
use crate::errors::SimulationError;
use crate::telemetry_system::telemetry::TickRecord;
use crate::trajectory_system::aerodynamics::DragAltitude;
use crate::trajectory_system::kinematics::{Plant, RocketAltitude};

// Upper bound on records reserved up front; longer runs grow on demand.
const RECORD_CAPACITY_HINT: u32 = 4096;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriverConfig {
    pub sim_time_limit: u32,
    /// Added to the plant's hover thrust to form a lower bound on the
    /// commanded thrust. `None` passes the controller output through.
    pub hover_margin: Option<f64>,
    pub upper_bound: f64,
    pub lower_bound: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Upper,
    Lower,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationState {
    Running,
    StoppedNormal,
    StoppedOutOfBounds(Boundary),
    Cancelled,
}

impl SimulationState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SimulationState::Running)
    }
}

#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub state: SimulationState,
    pub ticks: u32,
    pub records: Vec<TickRecord>,
}

/// Tick loop mediating between a controller and a plant.
///
/// Each tick reads the plant position, asks the controller for thrust,
/// applies the hover floor, advances the plant and evaluates the stop
/// conditions. Ticks run as fast as they are requested; pacing belongs to
/// the caller.
pub struct Simulation<P: Plant> {
    pub controller: PidController,
    pub plant: P,
    config: DriverConfig,
    state: SimulationState,
    tick: u32,
    records: Vec<TickRecord>,
}

impl Simulation<RocketAltitude> {
    pub fn from_config(config: &SimulationConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        Ok(Simulation::new(
            PidController::new(config.pid_config()),
            RocketAltitude::new(config.rocket_config()),
            config.driver_config(),
        ))
    }
}

impl Simulation<DragAltitude> {
    pub fn autopilot(config: &AutopilotConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        Ok(Simulation::new(
            PidController::new(config.pid_config()),
            DragAltitude::new(config.drag_config()),
            config.driver_config(),
        ))
    }
}

impl<P: Plant> Simulation<P> {
    pub fn new(controller: PidController, plant: P, config: DriverConfig) -> Self {
        Simulation {
            controller,
            plant,
            config,
            state: SimulationState::Running,
            tick: 0,
            records: Vec::with_capacity(config.sim_time_limit.min(RECORD_CAPACITY_HINT) as usize),
        }
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub fn tick(&self) -> u32 {
        self.tick
    }

    pub fn records(&self) -> &[TickRecord] {
        &self.records
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Advance one tick. Does nothing once a terminal state is reached.
    pub fn step(&mut self) -> SimulationState {
        if self.state.is_terminal() {
            return self.state;
        }
        if self.tick >= self.config.sim_time_limit {
            info!(ticks = self.tick, "tick limit reached before stepping");
            self.state = SimulationState::StoppedNormal;
            return self.state;
        }

        let control = self.controller.compute(self.plant.position());
        let thrust = match self.config.hover_margin {
            Some(margin) => control.max(self.plant.hover_thrust() + margin),
            None => control,
        };
        let position = self.plant.step(thrust);
        self.tick += 1;

        let record = TickRecord {
            tick: self.tick,
            position,
            thrust: self.plant.effective_thrust(thrust),
            p_term: self.controller.p_term(),
            i_term: self.controller.i_term(),
            d_term: self.controller.d_term(),
        };
        trace!(
            tick = record.tick,
            position,
            velocity = self.plant.velocity(),
            thrust,
            "tick"
        );
        self.records.push(record);

        self.state = self.evaluate_stop_conditions(position);
        match self.state {
            SimulationState::StoppedNormal => {
                info!(ticks = self.tick, position, "simulation ended");
            }
            SimulationState::StoppedOutOfBounds(boundary) => {
                warn!(tick = self.tick, position, ?boundary, "out of bounds");
            }
            SimulationState::Running | SimulationState::Cancelled => {}
        }

        self.state
    }

    fn evaluate_stop_conditions(&self, position: f64) -> SimulationState {
        if self.tick >= self.config.sim_time_limit {
            SimulationState::StoppedNormal
        } else if position > self.config.upper_bound {
            SimulationState::StoppedOutOfBounds(Boundary::Upper)
        } else if position < self.config.lower_bound {
            SimulationState::StoppedOutOfBounds(Boundary::Lower)
        } else {
            SimulationState::Running
        }
    }

    pub fn run(self) -> SimulationResult {
        self.run_with(|_| {})
    }

    /// Run to completion, handing every record to `observer` as it is produced.
    pub fn run_with<F>(self, observer: F) -> SimulationResult
    where
        F: FnMut(&TickRecord),
    {
        self.run_cancellable(&AtomicBool::new(false), observer)
    }

    pub fn run_cancellable<F>(mut self, cancel: &AtomicBool, mut observer: F) -> SimulationResult
    where
        F: FnMut(&TickRecord),
    {
        while !self.state.is_terminal() {
            if cancel.load(Ordering::Relaxed) {
                warn!(tick = self.tick, "simulation cancelled");
                self.state = SimulationState::Cancelled;
                break;
            }

            let recorded = self.records.len();
            self.step();
            if self.records.len() > recorded {
                if let Some(record) = self.records.last() {
                    observer(record);
                }
            }
        }

        self.finish()
    }

    pub fn finish(self) -> SimulationResult {
        SimulationResult {
            state: self.state,
            ticks: self.tick,
            records: self.records,
        }
    }
}
