//! `smarthome-hal` – device layer for the smart-home robot
//!
//! Sits between the simulation engine's raw device handles and the control
//! logic that drives the robot.
//!
//! # Modules
//!
//! - [`engine`] – raw handle traits and the [`Engine`][engine::Engine]
//!   device registry every adapter binds against.
//! - [`radio`], [`motor`], [`inertial_unit`], [`distance_sensor`], [`gps`] –
//!   one adapter per device kind, each owning its raw handle and applying
//!   enablement, channel assignment and unit conversion.
//! - [`wheels`] – [`WheelPair`][wheels::WheelPair], the fixed left/right
//!   motors.
//! - [`sensors`] – [`SensorSet`][sensors::SensorSet], the distance sensors
//!   discovered on the robot model, with positional aliases.
//! - [`robot`] – [`Robot`][robot::Robot], the composition root exposing
//!   motion commands and battery telemetry.
//! - [`sim`] – [`SimEngine`][sim::SimEngine], an in-process engine for tests
//!   and headless runs.

pub mod distance_sensor;
pub mod engine;
pub mod gps;
pub mod inertial_unit;
pub mod motor;
pub mod radio;
pub mod robot;
pub mod sensors;
pub mod sim;
pub mod wheels;

pub use distance_sensor::DistanceSensor;
pub use engine::Engine;
pub use gps::Gps;
pub use inertial_unit::InertialUnit;
pub use motor::Motor;
pub use radio::{Emitter, Receiver};
pub use robot::Robot;
pub use sensors::SensorSet;
pub use sim::SimEngine;
pub use wheels::WheelPair;
