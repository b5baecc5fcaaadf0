//! [`WheelPair`] – the fixed left/right motors of a differential-drive base.

use smarthome_types::SmarthomeError;

use crate::engine::Engine;
use crate::motor::Motor;

/// Exactly two wheel motors.  There is no way to add or remove one.
pub struct WheelPair {
    pub left: Motor,
    pub right: Motor,
}

impl WheelPair {
    /// Bind both wheel motors by name.
    ///
    /// # Errors
    ///
    /// Returns [`SmarthomeError::DeviceNotFound`] if either motor is missing;
    /// the right motor is bound first.
    pub fn new(
        engine: &dyn Engine,
        left_name: &str,
        right_name: &str,
        max_speed: f64,
    ) -> Result<Self, SmarthomeError> {
        let right = Motor::new(engine, right_name, max_speed)?;
        let left = Motor::new(engine, left_name, max_speed)?;
        Ok(Self { left, right })
    }

    /// Command both wheels with logical velocities.
    pub fn set_velocities(&mut self, left: f64, right: f64) {
        self.left.set_velocity(left);
        self.right.set_velocity(right);
    }

    pub fn stop(&mut self) {
        self.set_velocities(0.0, 0.0);
    }
}
