use crate::constants::{AUTOPILOT_DRAG_COEFFICIENT, AUTOPILOT_THRUST_FACTOR, TIME_STEP};

use super::kinematics::Plant;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragConfig {
    pub dt: f64,
    pub drag_coefficient: f64,
    pub thrust_factor: f64,
    pub initial_altitude: f64,
}

impl Default for DragConfig {
    fn default() -> Self {
        DragConfig {
            dt: TIME_STEP,
            drag_coefficient: AUTOPILOT_DRAG_COEFFICIENT,
            thrust_factor: AUTOPILOT_THRUST_FACTOR,
            initial_altitude: 0.0,
        }
    }
}

/// First-order altitude model used for autopilot gain tuning.
///
/// The scaled control input acts as a thrust impulse per tick and air
/// resistance grows linearly with altitude. There is no gravity term.
#[derive(Debug, Clone)]
pub struct DragAltitude {
    pub altitude: f64,
    pub climb_rate: f64,
    config: DragConfig,
}

impl DragAltitude {
    pub fn new(config: DragConfig) -> Self {
        DragAltitude {
            altitude: config.initial_altitude,
            climb_rate: 0.0,
            config,
        }
    }

    pub fn calculate_drag(&self) -> f64 {
        self.config.drag_coefficient * self.altitude
    }

    pub fn config(&self) -> &DragConfig {
        &self.config
    }
}

impl Plant for DragAltitude {
    fn step(&mut self, commanded_thrust: f64) -> f64 {
        let control_input = self.effective_thrust(commanded_thrust);
        let impulse = control_input * self.config.dt;
        self.climb_rate = impulse - self.calculate_drag();
        self.altitude += self.climb_rate * self.config.dt;
        self.altitude
    }

    fn position(&self) -> f64 {
        self.altitude
    }

    fn velocity(&self) -> f64 {
        self.climb_rate
    }

    fn effective_thrust(&self, commanded_thrust: f64) -> f64 {
        commanded_thrust * self.config.thrust_factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_first_step_from_ground() {
        let mut plant = DragAltitude::new(DragConfig::default());
        assert_relative_eq!(plant.step(5000.0), 50.0, epsilon = 1e-9);
        assert_eq!(plant.hover_thrust(), 0.0);
    }

    #[test]
    fn test_drag_opposes_altitude() {
        let mut plant = DragAltitude::new(DragConfig {
            initial_altitude: 100.0,
            ..DragConfig::default()
        });
        assert_relative_eq!(plant.calculate_drag(), 10.0, epsilon = 1e-12);

        plant.step(0.0);
        assert_relative_eq!(plant.position(), 99.0, epsilon = 1e-9);
        assert!(plant.velocity() < 0.0);
    }

    #[test]
    fn test_thrust_factor_scales_input() {
        let mut half = DragAltitude::new(DragConfig {
            thrust_factor: 0.5,
            ..DragConfig::default()
        });
        let mut full = DragAltitude::new(DragConfig::default());

        half.step(1000.0);
        full.step(1000.0);
        assert_relative_eq!(half.position() * 2.0, full.position(), epsilon = 1e-9);
        assert_relative_eq!(half.effective_thrust(1000.0), 500.0, epsilon = 1e-12);
    }

    #[test]
    fn test_equilibrium_altitude() {
        let mut plant = DragAltitude::new(DragConfig::default());
        for _ in 0..2000 {
            plant.step(100.0);
        }
        // impulse 10 per tick balances drag at 100 m
        assert_relative_eq!(plant.position(), 100.0, epsilon = 1e-3);
    }
}
