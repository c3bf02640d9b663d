// Physical Constants
pub const GRAVITY: f64 = -9.81; // m/s², negative is down
pub const ROCKET_MASS: f64 = 1.0; // kg

// Rocket Constants
pub const MAX_THRUST: f64 = 25.0; // N
pub const HOVER_MARGIN: f64 = 2.0; // N above hover thrust
pub const INITIAL_POSITION: f64 = 0.0; // m
pub const INITIAL_VELOCITY: f64 = 0.0; // m/s

// Controller Gains
pub const KP: f64 = 0.8;
pub const KI: f64 = 0.02;
pub const KD: f64 = 0.15;
pub const SETPOINT: f64 = 230.0; // m

// Near-target behaviour
pub const DEADBAND_THRESHOLD: f64 = 5.0; // m
pub const DEADBAND_ATTENUATION: f64 = 0.5;
pub const PROXIMITY_DAMPING_FACTOR: f64 = 0.3;

// Simulation Parameters
pub const TIME_STEP: f64 = 0.1; // s
pub const SIM_TIME_LIMIT: u32 = 500; // ticks
pub const OUT_OF_BOUNDS_UPPER_MARGIN: f64 = 50.0; // m above setpoint
pub const OUT_OF_BOUNDS_LOWER_BOUND: f64 = -10.0; // m

// Autopilot Tuning Constants
pub const AUTOPILOT_KP: f64 = 3.5;
pub const AUTOPILOT_KI: f64 = 0.2;
pub const AUTOPILOT_KD: f64 = 0.8;
pub const AUTOPILOT_TARGET_ALTITUDE: f64 = 1000.0; // m
pub const AUTOPILOT_SIM_TIME: f64 = 10.0; // s
pub const AUTOPILOT_OUTPUT_LIMIT: f64 = 5000.0; // symmetric throttle limit
pub const AUTOPILOT_THRUST_FACTOR: f64 = 1.0;
pub const AUTOPILOT_DRAG_COEFFICIENT: f64 = 0.1; // 1/s
