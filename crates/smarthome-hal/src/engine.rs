//! Raw device handles and the [`Engine`] registry that hands them out.
//!
//! The simulation engine is an external collaborator: it advances physical
//! state and exposes one raw handle per named device.  Everything above this
//! module only ever talks to these traits, so the adapters work the same
//! against a live simulator binding or the in-process
//! [`SimEngine`][crate::sim::SimEngine].

use smarthome_types::SmarthomeError;

/// A directional radio transmitter.
pub trait RawEmitter: Send {
    fn set_channel(&mut self, channel: i32);

    /// Queue `payload` for transmission.  Returns `false` when the engine
    /// refused the packet (e.g. its send buffer is full).
    fn send(&mut self, payload: &[u8]) -> bool;
}

/// A directional radio receiver with an engine-owned packet queue.
pub trait RawReceiver: Send {
    fn enable(&mut self, period_ms: u32);
    fn set_channel(&mut self, channel: i32);

    /// Number of packets waiting in the queue.
    fn queue_length(&self) -> usize;

    /// The packet at the head of the queue, without removing it.
    fn data(&self) -> Option<Vec<u8>>;

    /// Drop the packet at the head of the queue.
    fn next_packet(&mut self);
}

/// A rotary actuator.
pub trait RawMotor: Send {
    fn set_position(&mut self, position: f64);
    fn set_velocity(&mut self, velocity: f64);

    /// Most recently commanded target velocity (rad/s).
    fn velocity(&self) -> f64;
}

/// An orientation sensor.
pub trait RawInertialUnit: Send {
    fn enable(&mut self, period_ms: u32);

    /// Roll, pitch and yaw in radians.
    fn roll_pitch_yaw(&self) -> [f64; 3];
}

/// A ranging sensor.
pub trait RawDistanceSensor: Send {
    fn enable(&mut self, period_ms: u32);
    fn value(&self) -> f64;
}

/// A positioning sensor.
pub trait RawGps: Send {
    fn enable(&mut self, period_ms: u32);
    fn values(&self) -> [f64; 3];
}

/// The engine's name-keyed device registry and tick source.
///
/// Every `bind_*` method returns [`SmarthomeError::DeviceNotFound`] when no
/// device of that kind exists under `name`.
pub trait Engine {
    /// Fixed simulated time quantum in milliseconds.
    fn basic_time_step(&self) -> f64;

    /// Names of every device the robot model currently exposes.
    fn device_names(&self) -> Vec<String>;

    fn has_device(&self, name: &str) -> bool {
        self.device_names().iter().any(|n| n == name)
    }

    fn bind_emitter(&self, name: &str) -> Result<Box<dyn RawEmitter>, SmarthomeError>;
    fn bind_receiver(&self, name: &str) -> Result<Box<dyn RawReceiver>, SmarthomeError>;
    fn bind_motor(&self, name: &str) -> Result<Box<dyn RawMotor>, SmarthomeError>;
    fn bind_inertial_unit(&self, name: &str)
    -> Result<Box<dyn RawInertialUnit>, SmarthomeError>;
    fn bind_distance_sensor(
        &self,
        name: &str,
    ) -> Result<Box<dyn RawDistanceSensor>, SmarthomeError>;
    fn bind_gps(&self, name: &str) -> Result<Box<dyn RawGps>, SmarthomeError>;

    /// Advance the simulation by `duration_ms`.  Returns `false` once the
    /// engine has terminated and the controller should exit.
    fn step(&mut self, duration_ms: u32) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use smarthome_types::DeviceKind;

    /// Registry that only knows device names, used to check the default
    /// `has_device` implementation.
    struct NamesOnly(Vec<String>);

    fn missing<T>(name: &str, kind: DeviceKind) -> Result<T, SmarthomeError> {
        Err(SmarthomeError::DeviceNotFound {
            name: name.to_string(),
            kind,
        })
    }

    impl Engine for NamesOnly {
        fn basic_time_step(&self) -> f64 {
            16.0
        }
        fn device_names(&self) -> Vec<String> {
            self.0.clone()
        }
        fn bind_emitter(&self, name: &str) -> Result<Box<dyn RawEmitter>, SmarthomeError> {
            missing(name, DeviceKind::Emitter)
        }
        fn bind_receiver(&self, name: &str) -> Result<Box<dyn RawReceiver>, SmarthomeError> {
            missing(name, DeviceKind::Receiver)
        }
        fn bind_motor(&self, name: &str) -> Result<Box<dyn RawMotor>, SmarthomeError> {
            missing(name, DeviceKind::Motor)
        }
        fn bind_inertial_unit(
            &self,
            name: &str,
        ) -> Result<Box<dyn RawInertialUnit>, SmarthomeError> {
            missing(name, DeviceKind::InertialUnit)
        }
        fn bind_distance_sensor(
            &self,
            name: &str,
        ) -> Result<Box<dyn RawDistanceSensor>, SmarthomeError> {
            missing(name, DeviceKind::DistanceSensor)
        }
        fn bind_gps(&self, name: &str) -> Result<Box<dyn RawGps>, SmarthomeError> {
            missing(name, DeviceKind::Gps)
        }
        fn step(&mut self, _duration_ms: u32) -> bool {
            true
        }
    }

    #[test]
    fn has_device_uses_enumeration() {
        let engine = NamesOnly(vec!["gps".to_string(), "D1".to_string()]);
        assert!(engine.has_device("gps"));
        assert!(engine.has_device("D1"));
        assert!(!engine.has_device("inertial_unit"));
    }

    #[test]
    fn bind_on_missing_device_reports_kind() {
        let engine = NamesOnly(Vec::new());
        let err = engine.bind_gps("gps").err().unwrap();
        assert_eq!(
            err,
            SmarthomeError::DeviceNotFound {
                name: "gps".to_string(),
                kind: DeviceKind::Gps,
            }
        );
    }
}
