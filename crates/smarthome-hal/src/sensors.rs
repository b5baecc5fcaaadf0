//! [`SensorSet`] – the distance sensors a robot model actually exposes.
//!
//! The set is discovered, not declared: every engine device whose name starts
//! with the configured prefix becomes a [`DistanceSensor`].  Its keys are
//! fixed once built.
//!
//! Control logic usually addresses sensors by position (`"front_left"`)
//! rather than by device name (`"D1"`).  The set keeps an alias table for
//! that; aliases resolve to a discovered device name and never add keys.

use std::collections::BTreeMap;

use smarthome_types::SmarthomeError;
use tracing::debug;

use crate::distance_sensor::DistanceSensor;
use crate::engine::Engine;

#[derive(Debug)]
pub struct SensorSet {
    sensors: BTreeMap<String, DistanceSensor>,
    aliases: BTreeMap<String, String>,
}

impl SensorSet {
    /// Build a distance sensor for every name in `device_names` starting
    /// with `prefix`, then keep the `aliases` whose target was discovered.
    ///
    /// # Errors
    ///
    /// Returns [`SmarthomeError::DeviceNotFound`] if a matching name is not
    /// a distance sensor.
    pub fn discover<S: AsRef<str>>(
        engine: &dyn Engine,
        device_names: &[S],
        prefix: &str,
        time_step: u32,
        aliases: &BTreeMap<String, String>,
    ) -> Result<Self, SmarthomeError> {
        let mut sensors = BTreeMap::new();
        for name in device_names.iter().map(AsRef::as_ref) {
            if name.starts_with(prefix) && !sensors.contains_key(name) {
                sensors.insert(name.to_string(), DistanceSensor::new(engine, name, time_step)?);
            }
        }

        let aliases = aliases
            .iter()
            .filter(|(alias, target)| {
                let found = sensors.contains_key(target.as_str());
                if !found {
                    debug!(alias = %alias, target = %target, "sensor alias has no device");
                }
                found
            })
            .map(|(alias, target)| (alias.clone(), target.clone()))
            .collect();

        debug!(count = sensors.len(), prefix, "distance sensors discovered");
        Ok(Self { sensors, aliases })
    }

    /// Look up a sensor by device name or alias.
    ///
    /// # Errors
    ///
    /// Returns [`SmarthomeError::SensorNotFound`] when `name` is neither.
    pub fn get(&self, name: &str) -> Result<&DistanceSensor, SmarthomeError> {
        let key = self.aliases.get(name).map_or(name, String::as_str);
        self.sensors
            .get(key)
            .ok_or_else(|| SmarthomeError::SensorNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_ok()
    }

    /// Number of discovered sensors.
    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    /// Discovered device names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sensors.keys().map(String::as_str)
    }

    /// Aliases that resolved, with their device names.
    pub fn aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(a, t)| (a.as_str(), t.as_str()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DistanceSensor)> {
        self.sensors.iter().map(|(name, sensor)| (name.as_str(), sensor))
    }

    /// Scaled value of every sensor, keyed by device name.
    pub fn snapshot(&self) -> BTreeMap<String, i64> {
        self.iter()
            .map(|(name, sensor)| (name.to_string(), sensor.value()))
            .collect()
    }
}
