//! [`InertialUnit`] – heading in degrees from the raw yaw angle.

use std::f64::consts::PI;

use smarthome_types::SmarthomeError;
use tracing::debug;

use crate::engine::{Engine, RawInertialUnit};

/// Heading in degrees, normalised into `[0, 360)`, for a yaw in radians.
pub fn yaw_to_rotation(yaw: f64) -> f64 {
    // rem_euclid keeps the result non-negative for yaw below -π.
    ((yaw / PI) * 180.0 + 360.0).rem_euclid(360.0)
}

pub struct InertialUnit {
    name: String,
    raw: Box<dyn RawInertialUnit>,
}

impl InertialUnit {
    /// Bind the inertial unit `name` and enable it with `time_step`.
    ///
    /// # Errors
    ///
    /// Returns [`SmarthomeError::DeviceNotFound`] if the engine has no
    /// inertial unit called `name`.
    pub fn new(engine: &dyn Engine, name: &str, time_step: u32) -> Result<Self, SmarthomeError> {
        let mut raw = engine.bind_inertial_unit(name)?;
        raw.enable(time_step);
        debug!(device = name, time_step, "inertial unit bound");
        Ok(Self {
            name: name.to_string(),
            raw,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Heading in degrees in `[0, 360)`.
    pub fn rotation(&self) -> f64 {
        yaw_to_rotation(self.raw.roll_pitch_yaw()[2])
    }

    /// Raw roll, pitch and yaw in radians.
    pub fn roll_pitch_yaw(&self) -> [f64; 3] {
        self.raw.roll_pitch_yaw()
    }
}
