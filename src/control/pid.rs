use tracing::debug;

use crate::constants::{
    DEADBAND_ATTENUATION, DEADBAND_THRESHOLD, KD, KI, KP, MAX_THRUST, SETPOINT, TIME_STEP,
};

/// Parameters owned by a [`PidController`].
///
/// The deadband scales the raw output by `deadband_attenuation` whenever
/// `|error| < deadband_threshold`. A threshold of zero disables it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidConfig {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub setpoint: f64,
    pub dt: f64,
    pub output_min: f64,
    pub output_max: f64,
    pub deadband_threshold: f64,
    pub deadband_attenuation: f64,
}

impl Default for PidConfig {
    fn default() -> Self {
        PidConfig {
            kp: KP,
            ki: KI,
            kd: KD,
            setpoint: SETPOINT,
            dt: TIME_STEP,
            output_min: 0.0,
            output_max: MAX_THRUST,
            deadband_threshold: DEADBAND_THRESHOLD,
            deadband_attenuation: DEADBAND_ATTENUATION,
        }
    }
}

/// Discrete-time PID controller with a clamped output.
///
/// The integral accumulates on every call, including while the output sits
/// on a clamp boundary, so it winds up under sustained saturation.
#[derive(Debug, Clone)]
pub struct PidController {
    config: PidConfig,
    error: f64,
    integral_error: f64,
    error_last: f64,
    derivative_error: f64,
    output: f64,
}

impl PidController {
    pub fn new(config: PidConfig) -> Self {
        PidController {
            config,
            error: 0.0,
            integral_error: 0.0,
            error_last: 0.0,
            derivative_error: 0.0,
            output: 0.0,
        }
    }

    pub fn compute(&mut self, measured_value: f64) -> f64 {
        let dt = self.config.dt;
        self.error = self.config.setpoint - measured_value;

        self.derivative_error = if dt > 0.0 {
            (self.error - self.error_last) / dt
        } else {
            debug!(dt, "non-positive time step, derivative term zeroed");
            0.0
        };
        self.integral_error += self.error * dt;

        let mut output = self.config.kp * self.error
            + self.config.ki * self.integral_error
            + self.config.kd * self.derivative_error;

        if self.error.abs() < self.config.deadband_threshold {
            output *= self.config.deadband_attenuation;
        }

        self.output = output.max(self.config.output_min).min(self.config.output_max);
        self.error_last = self.error;

        self.output
    }

    pub fn p_term(&self) -> f64 {
        self.config.kp * self.error
    }

    pub fn i_term(&self) -> f64 {
        self.config.ki * self.integral_error
    }

    pub fn d_term(&self) -> f64 {
        self.config.kd * self.derivative_error
    }

    pub fn error(&self) -> f64 {
        self.error
    }

    pub fn error_last(&self) -> f64 {
        self.error_last
    }

    pub fn integral_error(&self) -> f64 {
        self.integral_error
    }

    pub fn derivative_error(&self) -> f64 {
        self.derivative_error
    }

    pub fn output(&self) -> f64 {
        self.output
    }

    pub fn setpoint(&self) -> f64 {
        self.config.setpoint
    }

    pub fn set_setpoint(&mut self, setpoint: f64) {
        self.config.setpoint = setpoint;
    }

    pub fn config(&self) -> &PidConfig {
        &self.config
    }

    pub fn reset(&mut self) {
        self.error = 0.0;
        self.integral_error = 0.0;
        self.error_last = 0.0;
        self.derivative_error = 0.0;
        self.output = 0.0;
    }
}
