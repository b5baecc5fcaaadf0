//! [`Robot`] – composition root of the device layer.
//!
//! # Construction protocol
//!
//! The steps run in a fixed order and the first failure aborts construction:
//!
//! 1. Read the engine's basic time step.
//! 2. Bind the emitter and receiver on the configured channel.
//! 3. Announce the robot's name once over the emitter.
//! 4. Bind the two wheel motors.
//! 5. Discover the distance sensors from the engine's device list.
//! 6. Bind the inertial unit and GPS only if the device list names them.
//!
//! # Battery telemetry
//!
//! The battery level is pushed by the simulated world as a UTF-8 decimal
//! string on the robot's channel.  [`Robot::battery`] reads it fresh on every
//! call and consumes at most one queued message.

use smarthome_types::{RobotConfig, SmarthomeError};
use tracing::{debug, info};

use crate::engine::Engine;
use crate::gps::Gps;
use crate::inertial_unit::InertialUnit;
use crate::radio::{Emitter, Receiver};
use crate::sensors::SensorSet;
use crate::wheels::WheelPair;

/// Battery level reported when no reading is pending.
pub const NO_BATTERY_READING: f64 = 0.0;

pub struct Robot<E: Engine> {
    engine: E,
    name: String,
    max_speed: f64,
    time_step: u32,
    emitter: Emitter,
    receiver: Receiver,
    wheels: WheelPair,
    sensors: SensorSet,
    inertial_unit: Option<InertialUnit>,
    gps: Option<Gps>,
}

impl<E: Engine> Robot<E> {
    /// Assemble the stock robot model with the given identity and top speed.
    ///
    /// # Errors
    ///
    /// Returns [`SmarthomeError::DeviceNotFound`] if a mandatory device is
    /// missing from the engine.
    pub fn new(engine: E, name: &str, max_speed: f64) -> Result<Self, SmarthomeError> {
        Self::with_config(engine, RobotConfig::new(name, max_speed))
    }

    /// Assemble a robot from explicit device names.
    ///
    /// # Errors
    ///
    /// Returns [`SmarthomeError::DeviceNotFound`] if the radio, either wheel
    /// motor, or a prefix-matched sensor cannot be bound.
    pub fn with_config(engine: E, config: RobotConfig) -> Result<Self, SmarthomeError> {
        // Engines report the step as a float; sensors are enabled in whole ms.
        let time_step = engine.basic_time_step() as u32;

        let mut emitter = Emitter::new(&engine, &config.emitter, config.channel)?;
        let receiver = Receiver::new(&engine, &config.receiver, time_step, config.channel)?;

        emitter.send(config.name.as_bytes());
        info!(robot = %config.name, channel = config.channel, "identity announced");

        let wheels = WheelPair::new(
            &engine,
            &config.left_motor,
            &config.right_motor,
            config.max_speed,
        )?;

        let devices = engine.device_names();
        let sensors = SensorSet::discover(
            &engine,
            &devices,
            &config.sensor_prefix,
            time_step,
            &config.sensor_aliases,
        )?;

        let present = |name: &str| devices.iter().any(|d| d == name);

        let inertial_unit = if present(&config.inertial_unit) {
            Some(InertialUnit::new(&engine, &config.inertial_unit, time_step)?)
        } else {
            debug!(device = %config.inertial_unit, "no inertial unit on this model");
            None
        };

        let gps = if present(&config.gps) {
            Some(Gps::new(&engine, &config.gps, time_step)?)
        } else {
            debug!(device = %config.gps, "no gps on this model");
            None
        };

        Ok(Self {
            engine,
            name: config.name,
            max_speed: config.max_speed,
            time_step,
            emitter,
            receiver,
            wheels,
            sensors,
            inertial_unit,
            gps,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_speed(&self) -> f64 {
        self.max_speed
    }

    /// Tick period (ms) every sensor was enabled with.
    pub fn time_step(&self) -> u32 {
        self.time_step
    }

    /// Set both wheel velocities on the logical `[-10, 10]` scale.  Values
    /// are neither smoothed nor range-checked.
    pub fn move_wheels(&mut self, left: f64, right: f64) {
        self.wheels.set_velocities(left, right);
    }

    /// Read the latest battery level pushed over the radio.
    ///
    /// Returns [`NO_BATTERY_READING`] when the queue is empty.  A message
    /// with empty text also yields [`NO_BATTERY_READING`] and stays at the
    /// head of the queue.  Otherwise the head message is consumed and parsed.
    ///
    /// # Errors
    ///
    /// Returns [`SmarthomeError::MalformedTelemetry`] when the consumed
    /// message is not a decimal number.
    pub fn battery(&mut self) -> Result<f64, SmarthomeError> {
        if self.receiver.queue_length() == 0 {
            return Ok(NO_BATTERY_READING);
        }
        let text = match self.receiver.peek_text() {
            Some(text) if !text.is_empty() => text,
            _ => return Ok(NO_BATTERY_READING),
        };
        self.receiver.next_packet();
        text.trim()
            .parse::<f64>()
            .map_err(|e| SmarthomeError::MalformedTelemetry {
                payload: text.clone(),
                details: e.to_string(),
            })
    }

    /// Advance the engine by one basic time step.  Returns `false` once the
    /// simulation has terminated.
    pub fn step(&mut self) -> bool {
        self.engine.step(self.time_step)
    }

    pub fn wheels(&self) -> &WheelPair {
        &self.wheels
    }

    pub fn wheels_mut(&mut self) -> &mut WheelPair {
        &mut self.wheels
    }

    pub fn sensors(&self) -> &SensorSet {
        &self.sensors
    }

    /// The inertial unit, if this robot model has one.
    pub fn inertial_unit(&self) -> Option<&InertialUnit> {
        self.inertial_unit.as_ref()
    }

    /// The GPS, if this robot model has one.
    pub fn gps(&self) -> Option<&Gps> {
        self.gps.as_ref()
    }

    pub fn emitter_mut(&mut self) -> &mut Emitter {
        &mut self.emitter
    }

    pub fn receiver(&self) -> &Receiver {
        &self.receiver
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }
}
