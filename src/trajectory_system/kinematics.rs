use crate::constants::{
    DEADBAND_THRESHOLD, GRAVITY, INITIAL_POSITION, INITIAL_VELOCITY, PROXIMITY_DAMPING_FACTOR,
    ROCKET_MASS, SETPOINT, TIME_STEP,
};

/// One-dimensional physical model driven by a thrust command each tick.
pub trait Plant {
    /// Advance the model by one fixed time step and return the new position.
    fn step(&mut self, commanded_thrust: f64) -> f64;

    fn position(&self) -> f64;

    fn velocity(&self) -> f64;

    /// Thrust that exactly cancels gravity. Zero for models without gravity.
    fn hover_thrust(&self) -> f64 {
        0.0
    }

    /// Input the model actually applies for a given command, as recorded in telemetry.
    fn effective_thrust(&self, commanded_thrust: f64) -> f64 {
        commanded_thrust
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RocketConfig {
    pub mass: f64,
    pub gravity: f64,
    pub dt: f64,
    pub setpoint: f64,
    pub proximity_threshold: f64,
    pub proximity_damping_factor: f64,
    pub initial_position: f64,
    pub initial_velocity: f64,
}

impl Default for RocketConfig {
    fn default() -> Self {
        RocketConfig {
            mass: ROCKET_MASS,
            gravity: GRAVITY,
            dt: TIME_STEP,
            setpoint: SETPOINT,
            proximity_threshold: DEADBAND_THRESHOLD,
            proximity_damping_factor: PROXIMITY_DAMPING_FACTOR,
            initial_position: INITIAL_POSITION,
            initial_velocity: INITIAL_VELOCITY,
        }
    }
}

/// Vertical rocket integrated with explicit Euler.
///
/// Thrust is first reduced by the hover thrust `mass * |gravity|`, so gravity
/// enters the acceleration once. Within `proximity_threshold` of the setpoint
/// the remaining net thrust is scaled by `proximity_damping_factor`.
#[derive(Debug, Clone)]
pub struct RocketAltitude {
    pub position: f64,
    pub velocity: f64,
    pub acceleration: f64,
    config: RocketConfig,
}

impl RocketAltitude {
    pub fn new(config: RocketConfig) -> Self {
        RocketAltitude {
            position: config.initial_position,
            velocity: config.initial_velocity,
            acceleration: 0.0,
            config,
        }
    }

    pub fn update_acceleration(&mut self, commanded_thrust: f64) -> f64 {
        let mut net_thrust = commanded_thrust - self.hover_thrust();

        if self.is_near_setpoint() {
            net_thrust *= self.config.proximity_damping_factor;
        }

        self.acceleration = net_thrust / self.config.mass;
        self.acceleration
    }

    pub fn is_near_setpoint(&self) -> bool {
        (self.position - self.config.setpoint).abs() < self.config.proximity_threshold
    }

    pub fn get_acceleration(&self) -> f64 {
        self.acceleration
    }

    pub fn config(&self) -> &RocketConfig {
        &self.config
    }
}

impl Plant for RocketAltitude {
    fn step(&mut self, commanded_thrust: f64) -> f64 {
        self.update_acceleration(commanded_thrust);
        self.velocity += self.acceleration * self.config.dt;
        self.position += self.velocity * self.config.dt;
        self.position
    }

    fn position(&self) -> f64 {
        self.position
    }

    fn velocity(&self) -> f64 {
        self.velocity
    }

    fn hover_thrust(&self) -> f64 {
        self.config.mass * self.config.gravity.abs()
    }
}
