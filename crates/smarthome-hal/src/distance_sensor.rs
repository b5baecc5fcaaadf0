//! [`DistanceSensor`] – ranging sensor with an integer-scaled reading.
//!
//! Thresholds in control logic are written against the scaled value
//! (`sensor.is_below(200.0)`), so the comparison helpers delegate to
//! [`DistanceSensor::value`] rather than the raw reading.

use std::cmp::Ordering;

use smarthome_types::SmarthomeError;
use tracing::debug;

use crate::engine::{Engine, RawDistanceSensor};

/// Factor between the raw reading and the reported value.
pub const VALUE_SCALE: f64 = 10.0 * 32.0;

/// Scaled reading for a raw value, truncated toward zero.  A NaN reading
/// (sensor not yet sampled) scales to 0.
pub fn scale_reading(raw: f64) -> i64 {
    (raw * VALUE_SCALE) as i64
}

pub struct DistanceSensor {
    name: String,
    raw: Box<dyn RawDistanceSensor>,
}

impl DistanceSensor {
    /// Bind the ranging sensor `name` and enable it with `time_step`.
    ///
    /// # Errors
    ///
    /// Returns [`SmarthomeError::DeviceNotFound`] if the engine has no
    /// distance sensor called `name`.
    pub fn new(engine: &dyn Engine, name: &str, time_step: u32) -> Result<Self, SmarthomeError> {
        let mut raw = engine.bind_distance_sensor(name)?;
        raw.enable(time_step);
        debug!(device = name, time_step, "distance sensor bound");
        Ok(Self {
            name: name.to_string(),
            raw,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> i64 {
        scale_reading(self.raw.value())
    }

    /// Order the scaled value against `threshold`.  `None` when `threshold`
    /// is NaN.
    pub fn compare(&self, threshold: f64) -> Option<Ordering> {
        (self.value() as f64).partial_cmp(&threshold)
    }

    pub fn is_below(&self, threshold: f64) -> bool {
        self.compare(threshold) == Some(Ordering::Less)
    }

    pub fn is_above(&self, threshold: f64) -> bool {
        self.compare(threshold) == Some(Ordering::Greater)
    }
}

impl std::fmt::Debug for DistanceSensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistanceSensor")
            .field("name", &self.name)
            .field("value", &self.value())
            .finish()
    }
}
