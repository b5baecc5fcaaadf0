//! [`Gps`] – positioning sensor, reported without conversion.

use smarthome_types::{Position, SmarthomeError};
use tracing::debug;

use crate::engine::{Engine, RawGps};

pub struct Gps {
    name: String,
    raw: Box<dyn RawGps>,
}

impl Gps {
    /// Bind the GPS `name` and enable it with `time_step`.
    ///
    /// # Errors
    ///
    /// Returns [`SmarthomeError::DeviceNotFound`] if the engine has no GPS
    /// called `name`.
    pub fn new(engine: &dyn Engine, name: &str, time_step: u32) -> Result<Self, SmarthomeError> {
        let mut raw = engine.bind_gps(name)?;
        raw.enable(time_step);
        debug!(device = name, time_step, "gps bound");
        Ok(Self {
            name: name.to_string(),
            raw,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> Position {
        Position::from(self.raw.values())
    }
}
