use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Radio channel every robot uses unless configured otherwise.
pub const DEFAULT_CHANNEL: i32 = 1;

/// Channel value that reaches every receiver regardless of its own channel.
pub const BROADCAST_CHANNEL: i32 = -1;

/// The kinds of raw device handle an engine can expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    Emitter,
    Receiver,
    Motor,
    InertialUnit,
    DistanceSensor,
    Gps,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeviceKind::Emitter => "emitter",
            DeviceKind::Receiver => "receiver",
            DeviceKind::Motor => "motor",
            DeviceKind::InertialUnit => "inertial unit",
            DeviceKind::DistanceSensor => "distance sensor",
            DeviceKind::Gps => "gps",
        };
        f.write_str(s)
    }
}

/// A position reported by a GPS device, in world coordinates (metres).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl From<[f64; 3]> for Position {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }
}

/// Device names and tuning values used to assemble a robot.
///
/// Every field has a default matching the stock two-wheeled smart-home robot
/// model, so a TOML table only needs to name what differs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    /// Identity announced over the radio once at construction.
    pub name: String,
    /// Physical top speed of a wheel motor (rad/s).
    pub max_speed: f64,
    /// Radio channel for both emitter and receiver.
    pub channel: i32,
    pub emitter: String,
    pub receiver: String,
    pub right_motor: String,
    pub left_motor: String,
    /// Every device whose name starts with this prefix becomes a distance sensor.
    pub sensor_prefix: String,
    pub inertial_unit: String,
    pub gps: String,
    /// Positional names (e.g. `front_left`) mapped to discovered device names.
    pub sensor_aliases: BTreeMap<String, String>,
}

impl RobotConfig {
    /// Default configuration with the given identity and top speed.
    pub fn new(name: impl Into<String>, max_speed: f64) -> Self {
        Self {
            name: name.into(),
            max_speed,
            ..Self::default()
        }
    }
}

/// The sensor layout of the stock robot model: eight ranging sensors
/// `D1`..`D8` arranged around the chassis.
pub fn default_sensor_aliases() -> BTreeMap<String, String> {
    [
        ("front_left", "D1"),
        ("left_front", "D2"),
        ("back_left", "D3"),
        ("left_back", "D4"),
        ("back_right", "D5"),
        ("right_back", "D6"),
        ("right_front", "D7"),
        ("front_right", "D8"),
    ]
    .into_iter()
    .map(|(alias, device)| (alias.to_string(), device.to_string()))
    .collect()
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            name: "robot".to_string(),
            max_speed: 10.0,
            channel: DEFAULT_CHANNEL,
            emitter: "emitter".to_string(),
            receiver: "receiver".to_string(),
            right_motor: "wheel1 motor".to_string(),
            left_motor: "wheel2 motor".to_string(),
            sensor_prefix: "D".to_string(),
            inertial_unit: "inertial_unit".to_string(),
            gps: "gps".to_string(),
            sensor_aliases: default_sensor_aliases(),
        }
    }
}

/// Error type shared by the device layer and its callers.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SmarthomeError {
    /// The engine exposes no device of the requested kind under this name.
    #[error("Device Not Found: no {kind} named '{name}'")]
    DeviceNotFound { name: String, kind: DeviceKind },

    #[error("Sensor Not Found: '{0}'")]
    SensorNotFound(String),

    /// A battery telemetry payload that does not parse as a number.
    #[error("Malformed Telemetry '{payload}': {details}")]
    MalformedTelemetry { payload: String, details: String },

    #[error("Configuration Error: {0}")]
    Config(String),
}
