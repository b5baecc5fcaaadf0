//! [`Motor`] – continuous-rotation wheel motor with a logical speed scale.
//!
//! Control logic commands a logical velocity in `[-10, 10]` (tenths of the
//! robot's top speed).  The adapter rescales it through `max_speed`, so two
//! robots with different top speeds reach different physical speeds for the
//! same command.  Out-of-range commands are passed straight through.

use smarthome_types::SmarthomeError;
use tracing::debug;

use crate::engine::{Engine, RawMotor};

/// Full-scale logical velocity.
pub const LOGICAL_FULL_SCALE: f64 = 10.0;

/// Physical angular velocity for a logical command.
pub fn to_physical(velocity: f64, max_speed: f64) -> f64 {
    velocity * max_speed / LOGICAL_FULL_SCALE
}

pub struct Motor {
    name: String,
    max_speed: f64,
    raw: Box<dyn RawMotor>,
}

impl Motor {
    /// Bind the motor `name` and switch it to velocity control by setting an
    /// unbounded target position.
    ///
    /// # Errors
    ///
    /// Returns [`SmarthomeError::DeviceNotFound`] if the engine has no motor
    /// called `name`.
    pub fn new(engine: &dyn Engine, name: &str, max_speed: f64) -> Result<Self, SmarthomeError> {
        let mut raw = engine.bind_motor(name)?;
        raw.set_position(f64::INFINITY);
        debug!(device = name, max_speed, "motor bound");
        Ok(Self {
            name: name.to_string(),
            max_speed,
            raw,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_speed(&self) -> f64 {
        self.max_speed
    }

    /// Command a logical velocity.
    pub fn set_velocity(&mut self, velocity: f64) {
        self.raw.set_velocity(to_physical(velocity, self.max_speed));
    }

    /// The current command on the logical scale.  A motor with zero top
    /// speed always reports 0.
    pub fn velocity(&self) -> f64 {
        if self.max_speed == 0.0 {
            return 0.0;
        }
        self.raw.velocity() * LOGICAL_FULL_SCALE / self.max_speed
    }

    /// The target angular velocity last sent to the device (rad/s).
    pub fn physical_velocity(&self) -> f64 {
        self.raw.velocity()
    }
}
