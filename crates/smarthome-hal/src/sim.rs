//! In-process simulation engine for tests and headless runs.
//!
//! [`SimEngine`] implements [`Engine`] with stub devices that record every
//! command and return whatever readings the test injected.  The engine, its
//! clones and every handle it binds share one state, so a test can keep a
//! clone of the engine after handing the original to a
//! [`Robot`][crate::robot::Robot] and keep inspecting it.
//!
//! # Stub behaviour
//!
//! | Device | Stub behaviour |
//! |---|---|
//! | Emitter | Records every accepted payload; refuses packets once `send_capacity` is reached. |
//! | Receiver | FIFO queue fed by [`SimEngine::deliver`] on a matching channel. |
//! | Motor | Stores the last target position and velocity. |
//! | Sensors | Return the injected reading once enabled, `NaN` before. |
//!
//! # Example
//!
//! ```rust
//! use smarthome_hal::engine::Engine;
//! use smarthome_hal::sim::SimEngine;
//!
//! let engine = SimEngine::builder()
//!     .time_step(16)
//!     .with_motor("wheel1 motor")
//!     .with_distance_sensor("D1")
//!     .build();
//!
//! assert_eq!(engine.basic_time_step(), 16.0);
//! assert!(engine.has_device("D1"));
//! ```

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use smarthome_types::{BROADCAST_CHANNEL, DEFAULT_CHANNEL, DeviceKind, SmarthomeError};

use crate::engine::{
    Engine, RawDistanceSensor, RawEmitter, RawGps, RawInertialUnit, RawMotor, RawReceiver,
};

// ─────────────────────────────────────────────────────────────────────────────
// Shared state
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
enum SimDevice {
    Emitter {
        channel: i32,
        sent: Vec<Vec<u8>>,
    },
    Receiver {
        channel: i32,
        period: Option<u32>,
        queue: VecDeque<Vec<u8>>,
    },
    Motor {
        position: f64,
        velocity: f64,
    },
    InertialUnit {
        period: Option<u32>,
        roll_pitch_yaw: [f64; 3],
    },
    DistanceSensor {
        period: Option<u32>,
        value: f64,
    },
    Gps {
        period: Option<u32>,
        values: [f64; 3],
    },
}

impl SimDevice {
    fn kind(&self) -> DeviceKind {
        match self {
            SimDevice::Emitter { .. } => DeviceKind::Emitter,
            SimDevice::Receiver { .. } => DeviceKind::Receiver,
            SimDevice::Motor { .. } => DeviceKind::Motor,
            SimDevice::InertialUnit { .. } => DeviceKind::InertialUnit,
            SimDevice::DistanceSensor { .. } => DeviceKind::DistanceSensor,
            SimDevice::Gps { .. } => DeviceKind::Gps,
        }
    }

    fn period(&self) -> Option<u32> {
        match self {
            SimDevice::Receiver { period, .. }
            | SimDevice::InertialUnit { period, .. }
            | SimDevice::DistanceSensor { period, .. }
            | SimDevice::Gps { period, .. } => *period,
            SimDevice::Emitter { .. } | SimDevice::Motor { .. } => None,
        }
    }

    fn set_period(&mut self, period_ms: u32) {
        match self {
            SimDevice::Receiver { period, .. }
            | SimDevice::InertialUnit { period, .. }
            | SimDevice::DistanceSensor { period, .. }
            | SimDevice::Gps { period, .. } => *period = Some(period_ms),
            SimDevice::Emitter { .. } | SimDevice::Motor { .. } => {}
        }
    }
}

#[derive(Debug)]
struct SimState {
    time_step: u32,
    send_capacity: usize,
    elapsed_ms: u64,
    running: bool,
    devices: BTreeMap<String, SimDevice>,
}

type Shared = Arc<Mutex<SimState>>;

fn lock(state: &Shared) -> MutexGuard<'_, SimState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ─────────────────────────────────────────────────────────────────────────────
// Stub handles
// ─────────────────────────────────────────────────────────────────────────────

/// Handle onto one named device inside the shared state.
struct SimHandle {
    state: Shared,
    name: String,
}

impl SimHandle {
    /// Run `f` against this handle's device.  Devices are never removed
    /// once registered, so `R::default()` is only a formality.
    fn with<R: Default>(&self, f: impl FnOnce(&mut SimDevice) -> R) -> R {
        lock(&self.state)
            .devices
            .get_mut(&self.name)
            .map(f)
            .unwrap_or_default()
    }

    fn enable(&mut self, period_ms: u32) {
        self.with(|d| d.set_period(period_ms));
    }

    fn set_channel(&mut self, new_channel: i32) {
        self.with(|d| match d {
            SimDevice::Emitter { channel, .. } | SimDevice::Receiver { channel, .. } => {
                *channel = new_channel
            }
            _ => {}
        });
    }
}

impl RawEmitter for SimHandle {
    fn set_channel(&mut self, channel: i32) {
        SimHandle::set_channel(self, channel);
    }

    fn send(&mut self, payload: &[u8]) -> bool {
        let mut state = lock(&self.state);
        let capacity = state.send_capacity;
        match state.devices.get_mut(&self.name) {
            Some(SimDevice::Emitter { sent, .. }) if sent.len() < capacity => {
                sent.push(payload.to_vec());
                true
            }
            _ => false,
        }
    }
}

impl RawReceiver for SimHandle {
    fn enable(&mut self, period_ms: u32) {
        SimHandle::enable(self, period_ms);
    }

    fn set_channel(&mut self, channel: i32) {
        SimHandle::set_channel(self, channel);
    }

    fn queue_length(&self) -> usize {
        self.with(|d| match d {
            SimDevice::Receiver { queue, .. } => queue.len(),
            _ => 0,
        })
    }

    fn data(&self) -> Option<Vec<u8>> {
        self.with(|d| match d {
            SimDevice::Receiver { queue, .. } => queue.front().cloned(),
            _ => None,
        })
    }

    fn next_packet(&mut self) {
        self.with(|d| {
            if let SimDevice::Receiver { queue, .. } = d {
                queue.pop_front();
            }
        });
    }
}

impl RawMotor for SimHandle {
    fn set_position(&mut self, target: f64) {
        self.with(|d| {
            if let SimDevice::Motor { position, .. } = d {
                *position = target;
            }
        });
    }

    fn set_velocity(&mut self, target: f64) {
        self.with(|d| {
            if let SimDevice::Motor { velocity, .. } = d {
                *velocity = target;
            }
        });
    }

    fn velocity(&self) -> f64 {
        self.with(|d| match d {
            SimDevice::Motor { velocity, .. } => *velocity,
            _ => 0.0,
        })
    }
}

impl RawInertialUnit for SimHandle {
    fn enable(&mut self, period_ms: u32) {
        SimHandle::enable(self, period_ms);
    }

    fn roll_pitch_yaw(&self) -> [f64; 3] {
        self.with(|d| match d {
            SimDevice::InertialUnit {
                period: Some(_),
                roll_pitch_yaw,
            } => *roll_pitch_yaw,
            _ => [f64::NAN; 3],
        })
    }
}

impl RawDistanceSensor for SimHandle {
    fn enable(&mut self, period_ms: u32) {
        SimHandle::enable(self, period_ms);
    }

    fn value(&self) -> f64 {
        self.with(|d| match d {
            SimDevice::DistanceSensor {
                period: Some(_),
                value,
            } => *value,
            _ => f64::NAN,
        })
    }
}

impl RawGps for SimHandle {
    fn enable(&mut self, period_ms: u32) {
        SimHandle::enable(self, period_ms);
    }

    fn values(&self) -> [f64; 3] {
        self.with(|d| match d {
            SimDevice::Gps {
                period: Some(_),
                values,
            } => *values,
            _ => [f64::NAN; 3],
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SimEngine
// ─────────────────────────────────────────────────────────────────────────────

/// In-process [`Engine`] backed by stub devices.
///
/// Cloning a `SimEngine` yields another view onto the same simulated world.
#[derive(Clone)]
pub struct SimEngine {
    state: Shared,
}

impl SimEngine {
    /// Start building a simulated world.
    pub fn builder() -> SimEngineBuilder {
        SimEngineBuilder::default()
    }

    /// The stock two-wheeled robot: radio, both wheel motors and the eight
    /// ranging sensors `D1`..`D8`.  No inertial unit, no GPS.
    pub fn standard_robot() -> Self {
        let mut builder = Self::builder()
            .with_emitter("emitter")
            .with_receiver("receiver")
            .with_motor("wheel1 motor")
            .with_motor("wheel2 motor");
        for i in 1..=8 {
            builder = builder.with_distance_sensor(format!("D{i}"));
        }
        builder.build()
    }

    fn bind(&self, name: &str, kind: DeviceKind) -> Result<SimHandle, SmarthomeError> {
        let state = lock(&self.state);
        match state.devices.get(name) {
            Some(device) if device.kind() == kind => Ok(SimHandle {
                state: Arc::clone(&self.state),
                name: name.to_string(),
            }),
            _ => Err(SmarthomeError::DeviceNotFound {
                name: name.to_string(),
                kind,
            }),
        }
    }

    /// Set the raw reading of a distance sensor.  Unknown names are ignored.
    pub fn set_distance(&self, name: &str, reading: f64) {
        if let Some(SimDevice::DistanceSensor { value, .. }) = lock(&self.state).devices.get_mut(name)
        {
            *value = reading;
        }
    }

    /// Set the yaw (radians) of an inertial unit, leaving roll and pitch at 0.
    pub fn set_yaw(&self, name: &str, yaw: f64) {
        if let Some(SimDevice::InertialUnit { roll_pitch_yaw, .. }) =
            lock(&self.state).devices.get_mut(name)
        {
            *roll_pitch_yaw = [0.0, 0.0, yaw];
        }
    }

    /// Set the raw coordinates reported by a GPS.
    pub fn set_gps(&self, name: &str, position: [f64; 3]) {
        if let Some(SimDevice::Gps { values, .. }) = lock(&self.state).devices.get_mut(name) {
            *values = position;
        }
    }

    /// Deliver `payload` to every receiver listening on `channel`.
    ///
    /// [`BROADCAST_CHANNEL`] on either side matches any channel.  Returns the
    /// number of receivers that queued the packet.
    pub fn deliver(&self, channel: i32, payload: impl AsRef<[u8]>) -> usize {
        let payload = payload.as_ref();
        let mut delivered = 0;
        for device in lock(&self.state).devices.values_mut() {
            if let SimDevice::Receiver {
                channel: listening,
                queue,
                ..
            } = device
                && (channel == BROADCAST_CHANNEL
                    || *listening == BROADCAST_CHANNEL
                    || *listening == channel)
            {
                queue.push_back(payload.to_vec());
                delivered += 1;
            }
        }
        delivered
    }

    /// Payloads accepted so far by the named emitter.
    pub fn sent_messages(&self, name: &str) -> Vec<Vec<u8>> {
        match lock(&self.state).devices.get(name) {
            Some(SimDevice::Emitter { sent, .. }) => sent.clone(),
            _ => Vec::new(),
        }
    }

    pub fn motor_velocity(&self, name: &str) -> Option<f64> {
        match lock(&self.state).devices.get(name) {
            Some(SimDevice::Motor { velocity, .. }) => Some(*velocity),
            _ => None,
        }
    }

    pub fn motor_position(&self, name: &str) -> Option<f64> {
        match lock(&self.state).devices.get(name) {
            Some(SimDevice::Motor { position, .. }) => Some(*position),
            _ => None,
        }
    }

    /// Channel an emitter or receiver is configured for.
    pub fn channel(&self, name: &str) -> Option<i32> {
        match lock(&self.state).devices.get(name) {
            Some(SimDevice::Emitter { channel, .. } | SimDevice::Receiver { channel, .. }) => {
                Some(*channel)
            }
            _ => None,
        }
    }

    /// Sampling period a sensor or receiver was enabled with, if any.
    pub fn enabled_period(&self, name: &str) -> Option<u32> {
        lock(&self.state).devices.get(name).and_then(SimDevice::period)
    }

    /// Packets waiting in the named receiver's queue.
    pub fn queue_length(&self, name: &str) -> usize {
        match lock(&self.state).devices.get(name) {
            Some(SimDevice::Receiver { queue, .. }) => queue.len(),
            _ => 0,
        }
    }

    /// Simulated time elapsed through [`Engine::step`].
    pub fn elapsed_ms(&self) -> u64 {
        lock(&self.state).elapsed_ms
    }

    /// Terminate the simulation; every later `step` returns `false`.
    pub fn stop(&self) {
        lock(&self.state).running = false;
    }
}

impl Engine for SimEngine {
    fn basic_time_step(&self) -> f64 {
        f64::from(lock(&self.state).time_step)
    }

    fn device_names(&self) -> Vec<String> {
        lock(&self.state).devices.keys().cloned().collect()
    }

    fn has_device(&self, name: &str) -> bool {
        lock(&self.state).devices.contains_key(name)
    }

    fn bind_emitter(&self, name: &str) -> Result<Box<dyn RawEmitter>, SmarthomeError> {
        Ok(Box::new(self.bind(name, DeviceKind::Emitter)?))
    }

    fn bind_receiver(&self, name: &str) -> Result<Box<dyn RawReceiver>, SmarthomeError> {
        Ok(Box::new(self.bind(name, DeviceKind::Receiver)?))
    }

    fn bind_motor(&self, name: &str) -> Result<Box<dyn RawMotor>, SmarthomeError> {
        Ok(Box::new(self.bind(name, DeviceKind::Motor)?))
    }

    fn bind_inertial_unit(
        &self,
        name: &str,
    ) -> Result<Box<dyn RawInertialUnit>, SmarthomeError> {
        Ok(Box::new(self.bind(name, DeviceKind::InertialUnit)?))
    }

    fn bind_distance_sensor(
        &self,
        name: &str,
    ) -> Result<Box<dyn RawDistanceSensor>, SmarthomeError> {
        Ok(Box::new(self.bind(name, DeviceKind::DistanceSensor)?))
    }

    fn bind_gps(&self, name: &str) -> Result<Box<dyn RawGps>, SmarthomeError> {
        Ok(Box::new(self.bind(name, DeviceKind::Gps)?))
    }

    fn step(&mut self, duration_ms: u32) -> bool {
        let mut state = lock(&self.state);
        if !state.running {
            return false;
        }
        state.elapsed_ms += u64::from(duration_ms);
        true
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Builder
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for a [`SimEngine`].  Registering a name twice keeps the last
/// registration.
pub struct SimEngineBuilder {
    time_step: u32,
    send_capacity: usize,
    devices: BTreeMap<String, SimDevice>,
}

impl Default for SimEngineBuilder {
    fn default() -> Self {
        Self {
            time_step: 32,
            send_capacity: usize::MAX,
            devices: BTreeMap::new(),
        }
    }
}

impl SimEngineBuilder {
    /// Basic time step in milliseconds (default 32).
    pub fn time_step(mut self, ms: u32) -> Self {
        self.time_step = ms;
        self
    }

    /// Maximum number of packets each emitter accepts before refusing more.
    pub fn send_capacity(mut self, packets: usize) -> Self {
        self.send_capacity = packets;
        self
    }

    pub fn with_emitter(mut self, name: impl Into<String>) -> Self {
        self.devices.insert(
            name.into(),
            SimDevice::Emitter {
                channel: DEFAULT_CHANNEL,
                sent: Vec::new(),
            },
        );
        self
    }

    pub fn with_receiver(mut self, name: impl Into<String>) -> Self {
        self.devices.insert(
            name.into(),
            SimDevice::Receiver {
                channel: DEFAULT_CHANNEL,
                period: None,
                queue: VecDeque::new(),
            },
        );
        self
    }

    pub fn with_motor(mut self, name: impl Into<String>) -> Self {
        self.devices.insert(
            name.into(),
            SimDevice::Motor {
                position: 0.0,
                velocity: 0.0,
            },
        );
        self
    }

    pub fn with_inertial_unit(mut self, name: impl Into<String>) -> Self {
        self.devices.insert(
            name.into(),
            SimDevice::InertialUnit {
                period: None,
                roll_pitch_yaw: [0.0; 3],
            },
        );
        self
    }

    pub fn with_distance_sensor(mut self, name: impl Into<String>) -> Self {
        self.devices.insert(
            name.into(),
            SimDevice::DistanceSensor {
                period: None,
                value: 0.0,
            },
        );
        self
    }

    pub fn with_gps(mut self, name: impl Into<String>) -> Self {
        self.devices.insert(
            name.into(),
            SimDevice::Gps {
                period: None,
                values: [0.0; 3],
            },
        );
        self
    }

    /// Consume the builder and return the engine.
    pub fn build(self) -> SimEngine {
        SimEngine {
            state: Arc::new(Mutex::new(SimState {
                time_step: self.time_step,
                send_capacity: self.send_capacity,
                elapsed_ms: 0,
                running: true,
                devices: self.devices,
            })),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_robot_exposes_stock_devices() {
        let engine = SimEngine::standard_robot();
        let names = engine.device_names();
        assert_eq!(names.len(), 12);
        for expected in ["emitter", "receiver", "wheel1 motor", "wheel2 motor", "D1", "D8"] {
            assert!(engine.has_device(expected), "missing {expected}");
        }
        assert!(!engine.has_device("gps"));
        assert!(!engine.has_device("inertial_unit"));
    }

    #[test]
    fn bind_rejects_unknown_name_and_wrong_kind() {
        let engine = SimEngine::standard_robot();
        assert!(matches!(
            engine.bind_motor("wheel3 motor"),
            Err(SmarthomeError::DeviceNotFound { kind: DeviceKind::Motor, .. })
        ));
        assert!(matches!(
            engine.bind_gps("D1"),
            Err(SmarthomeError::DeviceNotFound { kind: DeviceKind::Gps, .. })
        ));
    }

    #[test]
    fn sensors_read_nan_until_enabled() {
        let engine = SimEngine::builder().with_distance_sensor("D1").build();
        engine.set_distance("D1", 0.25);

        let mut sensor = engine.bind_distance_sensor("D1").unwrap();
        assert!(sensor.value().is_nan());
        assert_eq!(engine.enabled_period("D1"), None);

        sensor.enable(32);
        assert_eq!(engine.enabled_period("D1"), Some(32));
        assert!((sensor.value() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn deliver_honours_receiver_channel() {
        let engine = SimEngine::builder()
            .with_receiver("near")
            .with_receiver("far")
            .build();
        engine.bind_receiver("far").unwrap().set_channel(7);

        assert_eq!(engine.deliver(1, "a"), 1);
        assert_eq!(engine.queue_length("near"), 1);
        assert_eq!(engine.queue_length("far"), 0);

        assert_eq!(engine.deliver(BROADCAST_CHANNEL, "b"), 2);
        assert_eq!(engine.queue_length("far"), 1);
    }

    #[test]
    fn receiver_queue_is_fifo() {
        let engine = SimEngine::builder().with_receiver("receiver").build();
        let mut rx = engine.bind_receiver("receiver").unwrap();
        engine.deliver(1, "first");
        engine.deliver(1, "second");

        assert_eq!(rx.queue_length(), 2);
        assert_eq!(rx.data().as_deref(), Some(b"first".as_slice()));
        rx.next_packet();
        assert_eq!(rx.data().as_deref(), Some(b"second".as_slice()));
        rx.next_packet();
        assert_eq!(rx.data(), None);
        rx.next_packet();
        assert_eq!(rx.queue_length(), 0);
    }

    #[test]
    fn emitter_refuses_beyond_capacity() {
        let engine = SimEngine::builder()
            .send_capacity(1)
            .with_emitter("emitter")
            .build();
        let mut tx = engine.bind_emitter("emitter").unwrap();
        assert!(tx.send(b"one"));
        assert!(!tx.send(b"two"));
        assert_eq!(engine.sent_messages("emitter"), vec![b"one".to_vec()]);
    }

    #[test]
    fn clones_share_state() {
        let engine = SimEngine::builder().with_motor("m").build();
        let observer = engine.clone();
        let mut motor = engine.bind_motor("m").unwrap();
        motor.set_velocity(1.5);
        motor.set_position(f64::INFINITY);
        assert_eq!(observer.motor_velocity("m"), Some(1.5));
        assert_eq!(observer.motor_position("m"), Some(f64::INFINITY));
    }

    #[test]
    fn step_advances_until_stopped() {
        let mut engine = SimEngine::builder().time_step(16).build();
        assert!(engine.step(16));
        assert!(engine.step(16));
        assert_eq!(engine.elapsed_ms(), 32);

        engine.stop();
        assert!(!engine.step(16));
        assert_eq!(engine.elapsed_ms(), 32);
    }
}
