use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::constants::*;
use crate::control::pid::PidConfig;
use crate::control::simulation::DriverConfig;
use crate::errors::SimulationError;
use crate::trajectory_system::aerodynamics::DragConfig;
use crate::trajectory_system::kinematics::RocketConfig;

/// Tunables of the rocket hover loop.
///
/// Every field falls back to its default in [`crate::constants`] when absent
/// from a config file. The component configs are derived from this struct so
/// the controller and the rocket always agree on the shared values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub setpoint: f64,
    pub dt: f64,
    pub mass: f64,
    pub gravity: f64,
    pub max_thrust: f64,
    pub sim_time_limit: u32,
    pub deadband_threshold: f64,
    pub deadband_attenuation_factor: f64,
    pub proximity_damping_factor: f64,
    pub out_of_bounds_upper_margin: f64,
    pub out_of_bounds_lower_bound: f64,
    pub hover_margin: f64,
    pub initial_position: f64,
    pub initial_velocity: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            kp: KP,
            ki: KI,
            kd: KD,
            setpoint: SETPOINT,
            dt: TIME_STEP,
            mass: ROCKET_MASS,
            gravity: GRAVITY,
            max_thrust: MAX_THRUST,
            sim_time_limit: SIM_TIME_LIMIT,
            deadband_threshold: DEADBAND_THRESHOLD,
            deadband_attenuation_factor: DEADBAND_ATTENUATION,
            proximity_damping_factor: PROXIMITY_DAMPING_FACTOR,
            out_of_bounds_upper_margin: OUT_OF_BOUNDS_UPPER_MARGIN,
            out_of_bounds_lower_bound: OUT_OF_BOUNDS_LOWER_BOUND,
            hover_margin: HOVER_MARGIN,
            initial_position: INITIAL_POSITION,
            initial_velocity: INITIAL_VELOCITY,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), SimulationError> {
        check_gains(self.kp, self.ki, self.kd)?;
        check_finite("setpoint", self.setpoint)?;
        check_positive("dt", self.dt)?;
        check_positive("mass", self.mass)?;
        check_finite("gravity", self.gravity)?;
        check_finite("initial_position", self.initial_position)?;
        check_finite("initial_velocity", self.initial_velocity)?;
        check_finite("hover_margin", self.hover_margin)?;
        check_unit_factor("deadband_attenuation_factor", self.deadband_attenuation_factor)?;
        check_unit_factor("proximity_damping_factor", self.proximity_damping_factor)?;

        if !(self.max_thrust.is_finite() && self.max_thrust >= 0.0) {
            return Err(SimulationError::ConfigurationError(format!(
                "max_thrust must be finite and non-negative, got {}",
                self.max_thrust
            )));
        }
        if self.deadband_threshold.is_nan() || self.deadband_threshold < 0.0 {
            return Err(SimulationError::ConfigurationError(format!(
                "deadband_threshold must be non-negative, got {}",
                self.deadband_threshold
            )));
        }
        if self.sim_time_limit == 0 {
            return Err(SimulationError::ConfigurationError(
                "sim_time_limit must be at least one tick".to_string(),
            ));
        }
        check_finite("out_of_bounds_upper_margin", self.out_of_bounds_upper_margin)?;
        check_finite("out_of_bounds_lower_bound", self.out_of_bounds_lower_bound)?;
        let upper_bound = self.setpoint + self.out_of_bounds_upper_margin;
        if self.out_of_bounds_lower_bound >= upper_bound {
            return Err(SimulationError::ConfigurationError(format!(
                "lower bound {} must lie below upper bound {}",
                self.out_of_bounds_lower_bound, upper_bound
            )));
        }

        Ok(())
    }

    pub fn pid_config(&self) -> PidConfig {
        PidConfig {
            kp: self.kp,
            ki: self.ki,
            kd: self.kd,
            setpoint: self.setpoint,
            dt: self.dt,
            output_min: 0.0,
            output_max: self.max_thrust,
            deadband_threshold: self.deadband_threshold,
            deadband_attenuation: self.deadband_attenuation_factor,
        }
    }

    pub fn rocket_config(&self) -> RocketConfig {
        RocketConfig {
            mass: self.mass,
            gravity: self.gravity,
            dt: self.dt,
            setpoint: self.setpoint,
            proximity_threshold: self.deadband_threshold,
            proximity_damping_factor: self.proximity_damping_factor,
            initial_position: self.initial_position,
            initial_velocity: self.initial_velocity,
        }
    }

    pub fn driver_config(&self) -> DriverConfig {
        DriverConfig {
            sim_time_limit: self.sim_time_limit,
            hover_margin: Some(self.hover_margin),
            upper_bound: self.setpoint + self.out_of_bounds_upper_margin,
            lower_bound: self.out_of_bounds_lower_bound,
        }
    }
}

/// Tunables of the drag-plant autopilot loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutopilotConfig {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub target_altitude: f64,
    pub dt: f64,
    /// Seconds of simulated flight.
    pub sim_time: f64,
    pub output_limit: f64,
    pub thrust_factor: f64,
    pub drag_coefficient: f64,
}

impl Default for AutopilotConfig {
    fn default() -> Self {
        AutopilotConfig {
            kp: AUTOPILOT_KP,
            ki: AUTOPILOT_KI,
            kd: AUTOPILOT_KD,
            target_altitude: AUTOPILOT_TARGET_ALTITUDE,
            dt: TIME_STEP,
            sim_time: AUTOPILOT_SIM_TIME,
            output_limit: AUTOPILOT_OUTPUT_LIMIT,
            thrust_factor: AUTOPILOT_THRUST_FACTOR,
            drag_coefficient: AUTOPILOT_DRAG_COEFFICIENT,
        }
    }
}

impl AutopilotConfig {
    pub fn validate(&self) -> Result<(), SimulationError> {
        check_gains(self.kp, self.ki, self.kd)?;
        check_finite("target_altitude", self.target_altitude)?;
        check_positive("dt", self.dt)?;
        check_positive("sim_time", self.sim_time)?;
        check_positive("output_limit", self.output_limit)?;
        check_finite("thrust_factor", self.thrust_factor)?;
        check_finite("drag_coefficient", self.drag_coefficient)?;

        let ticks = self.tick_count();
        if ticks < 1.0 {
            return Err(SimulationError::ConfigurationError(format!(
                "sim_time {} is shorter than one time step {}",
                self.sim_time, self.dt
            )));
        }
        if ticks > f64::from(u32::MAX) {
            return Err(SimulationError::ConfigurationError(format!(
                "sim_time {} needs {} ticks of {} s, more than {} allowed",
                self.sim_time,
                ticks,
                self.dt,
                u32::MAX
            )));
        }

        Ok(())
    }

    /// One tick per time step in `[0, sim_time)`, a partial last step included.
    pub fn tick_limit(&self) -> u32 {
        self.tick_count() as u32
    }

    fn tick_count(&self) -> f64 {
        let steps = self.sim_time / self.dt;
        let nearest = steps.round();
        // whole multiples of dt must not gain a tick from rounding noise
        if (steps - nearest).abs() < 1e-9 {
            nearest
        } else {
            steps.ceil()
        }
    }

    pub fn pid_config(&self) -> PidConfig {
        PidConfig {
            kp: self.kp,
            ki: self.ki,
            kd: self.kd,
            setpoint: self.target_altitude,
            dt: self.dt,
            output_min: -self.output_limit,
            output_max: self.output_limit,
            deadband_threshold: 0.0,
            deadband_attenuation: 1.0,
        }
    }

    pub fn drag_config(&self) -> DragConfig {
        DragConfig {
            dt: self.dt,
            drag_coefficient: self.drag_coefficient,
            thrust_factor: self.thrust_factor,
            initial_altitude: 0.0,
        }
    }

    pub fn driver_config(&self) -> DriverConfig {
        DriverConfig {
            sim_time_limit: self.tick_limit(),
            hover_margin: None,
            upper_bound: f64::INFINITY,
            lower_bound: f64::NEG_INFINITY,
        }
    }
}

/// Contents of a TOML config file with `[rocket]` and `[autopilot]` tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub rocket: SimulationConfig,
    pub autopilot: AutopilotConfig,
}

impl ConfigFile {
    pub fn from_toml_str(toml_str: &str) -> Result<Self, SimulationError> {
        let config: ConfigFile = toml::from_str(toml_str)?;
        config.rocket.validate()?;
        config.autopilot.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SimulationError> {
        let path = path.as_ref();
        let toml_str = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&toml_str)?;
        info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, SimulationError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

fn check_finite(name: &str, value: f64) -> Result<(), SimulationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SimulationError::ConfigurationError(format!(
            "{} must be finite, got {}",
            name, value
        )))
    }
}

fn check_positive(name: &str, value: f64) -> Result<(), SimulationError> {
    check_finite(name, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(SimulationError::ConfigurationError(format!(
            "{} must be positive, got {}",
            name, value
        )))
    }
}

fn check_unit_factor(name: &str, value: f64) -> Result<(), SimulationError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SimulationError::ConfigurationError(format!(
            "{} must lie in [0, 1], got {}",
            name, value
        )))
    }
}

fn check_gains(kp: f64, ki: f64, kd: f64) -> Result<(), SimulationError> {
    check_finite("kp", kp)?;
    check_finite("ki", ki)?;
    check_finite("kd", kd)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configs_are_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
        assert!(AutopilotConfig::default().validate().is_ok());
    }

    #[test]
    fn test_derived_configs_share_values() {
        let config = SimulationConfig {
            setpoint: 150.0,
            dt: 0.05,
            deadband_threshold: 3.0,
            ..SimulationConfig::default()
        };

        let pid = config.pid_config();
        let rocket = config.rocket_config();
        let driver = config.driver_config();

        assert_eq!(pid.setpoint, rocket.setpoint);
        assert_eq!(pid.dt, rocket.dt);
        assert_eq!(pid.deadband_threshold, rocket.proximity_threshold);
        assert_eq!(pid.output_min, 0.0);
        assert_eq!(driver.upper_bound, 200.0);
        assert_eq!(driver.lower_bound, -10.0);
        assert_eq!(driver.hover_margin, Some(HOVER_MARGIN));
    }

    #[test]
    fn test_rejects_non_positive_time_step() {
        let config = SimulationConfig {
            dt: 0.0,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SimulationError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_rejects_bad_factors_and_mass() {
        let bad = [
            SimulationConfig {
                mass: 0.0,
                ..SimulationConfig::default()
            },
            SimulationConfig {
                proximity_damping_factor: 1.5,
                ..SimulationConfig::default()
            },
            SimulationConfig {
                deadband_attenuation_factor: -0.1,
                ..SimulationConfig::default()
            },
            SimulationConfig {
                sim_time_limit: 0,
                ..SimulationConfig::default()
            },
            SimulationConfig {
                kp: f64::NAN,
                ..SimulationConfig::default()
            },
            SimulationConfig {
                out_of_bounds_lower_bound: 500.0,
                ..SimulationConfig::default()
            },
        ];

        for config in bad {
            assert!(config.validate().is_err(), "{:?} should be rejected", config);
        }
    }

    #[test]
    fn test_autopilot_tick_limit_and_limits() {
        let config = AutopilotConfig::default();
        assert_eq!(config.tick_limit(), 100);

        let pid = config.pid_config();
        assert_eq!(pid.output_min, -AUTOPILOT_OUTPUT_LIMIT);
        assert_eq!(pid.output_max, AUTOPILOT_OUTPUT_LIMIT);
        assert_eq!(pid.deadband_threshold, 0.0);

        let driver = config.driver_config();
        assert_eq!(driver.hover_margin, None);
        assert!(driver.upper_bound.is_infinite());
    }

    #[test]
    fn test_autopilot_partial_step_counts_as_tick() {
        let config = AutopilotConfig {
            sim_time: 1.0,
            dt: 0.3,
            ..AutopilotConfig::default()
        };
        // steps start at 0.0, 0.3, 0.6 and 0.9
        assert_eq!(config.tick_limit(), 4);

        let whole = AutopilotConfig {
            sim_time: 0.3,
            dt: 0.1,
            ..AutopilotConfig::default()
        };
        assert_eq!(whole.tick_limit(), 3, "Whole multiples of dt must not gain a tick");
    }

    #[test]
    fn test_autopilot_rejects_tick_overflow() {
        let config = AutopilotConfig {
            sim_time: 1.0e12,
            ..AutopilotConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SimulationError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_config_survives_toml_round_trip() {
        let config = ConfigFile {
            rocket: SimulationConfig {
                kp: 1.25,
                setpoint: 120.0,
                sim_time_limit: 300,
                ..SimulationConfig::default()
            },
            autopilot: AutopilotConfig {
                thrust_factor: 0.7,
                ..AutopilotConfig::default()
            },
        };

        let toml_str = config.to_toml_string().expect("config serializes");
        assert!(toml_str.contains("[rocket]"));
        assert!(toml_str.contains("[autopilot]"));

        let parsed = ConfigFile::from_toml_str(&toml_str).expect("serialized config parses");
        assert_eq!(parsed, config, "Round trip should preserve every field");
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config = ConfigFile::from_toml_str(
            r#"
            [rocket]
            kp = 1.2
            setpoint = 100.0

            [autopilot]
            thrust_factor = 0.5
            "#,
        )
        .expect("valid config");

        assert_eq!(config.rocket.kp, 1.2);
        assert_eq!(config.rocket.setpoint, 100.0);
        assert_eq!(config.rocket.ki, KI);
        assert_eq!(config.autopilot.thrust_factor, 0.5);
        assert_eq!(config.autopilot.kp, AUTOPILOT_KP);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = ConfigFile::from_toml_str("").expect("empty config is valid");
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        assert!(matches!(
            ConfigFile::from_toml_str("[rocket]\nkp = \"fast\""),
            Err(SimulationError::ParseError(_))
        ));
    }

    #[test]
    fn test_invalid_value_in_toml_is_configuration_error() {
        assert!(matches!(
            ConfigFile::from_toml_str("[rocket]\nmass = -1.0"),
            Err(SimulationError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            ConfigFile::load("/nonexistent/pid_rocket_sim.toml"),
            Err(SimulationError::IoError(_))
        ));
    }
}
