//! Headless run loop: assemble a robot inside a [`SimEngine`] and drive it
//! for a fixed number of ticks.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use smarthome_hal::{Robot, SimEngine};
use smarthome_types::{Position, SmarthomeError};
use tracing::{debug, info, warn};

use crate::config::Config;

/// What the robot reported during one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub tick: u32,
    /// `None` when the battery payload was malformed.
    pub battery: Option<f64>,
    pub rotation: Option<f64>,
    pub position: Option<Position>,
    pub sensors: BTreeMap<String, i64>,
}

/// Totals for a finished run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    pub ticks: u32,
    pub last_battery: f64,
    pub malformed_telemetry: u32,
}

/// Build the simulated world described by `cfg.sim`, using the device names
/// from `cfg.robot`.
pub fn build_engine(cfg: &Config) -> SimEngine {
    let robot = &cfg.robot;
    let mut builder = SimEngine::builder()
        .time_step(cfg.sim.time_step_ms)
        .with_emitter(&robot.emitter)
        .with_receiver(&robot.receiver)
        .with_motor(&robot.right_motor)
        .with_motor(&robot.left_motor);
    for name in &cfg.sim.sensors {
        builder = builder.with_distance_sensor(name);
    }
    if cfg.sim.inertial_unit {
        builder = builder.with_inertial_unit(&robot.inertial_unit);
    }
    if cfg.sim.gps {
        builder = builder.with_gps(&robot.gps);
    }
    let engine = builder.build();

    for (name, reading) in &cfg.sim.distances {
        engine.set_distance(name, *reading);
    }
    engine.set_yaw(&robot.inertial_unit, cfg.sim.yaw);
    engine.set_gps(&robot.gps, cfg.sim.position);
    engine
}

/// Run the configured session, calling `on_tick` after every step.
///
/// Stops early when `shutdown` is raised or the engine terminates.  The
/// wheels are stopped before returning.
///
/// # Errors
///
/// Returns [`SmarthomeError::DeviceNotFound`] if the robot cannot be
/// assembled.  Malformed telemetry is counted, not returned.
pub fn run(
    cfg: &Config,
    shutdown: &Arc<AtomicBool>,
    mut on_tick: impl FnMut(&TickReport),
) -> Result<Summary, SmarthomeError> {
    let engine = build_engine(cfg);
    let mut robot = Robot::with_config(engine.clone(), cfg.robot.clone())?;
    info!(
        robot = robot.name(),
        sensors = robot.sensors().len(),
        inertial_unit = robot.inertial_unit().is_some(),
        gps = robot.gps().is_some(),
        "robot assembled"
    );

    let mut summary = Summary::default();
    let mut feed = cfg.sim.battery_feed.iter();

    for tick in 0..cfg.run.ticks {
        if shutdown.load(Ordering::SeqCst) {
            warn!(tick, "run interrupted");
            break;
        }
        if let Some(payload) = feed.next() {
            engine.deliver(robot.receiver().channel(), payload);
        }

        robot.move_wheels(cfg.run.left, cfg.run.right);
        if !robot.step() {
            debug!(tick, "engine terminated");
            break;
        }

        let battery = match robot.battery() {
            Ok(level) => {
                summary.last_battery = level;
                Some(level)
            }
            Err(e) => {
                warn!(error = %e, tick, "discarding battery reading");
                summary.malformed_telemetry += 1;
                None
            }
        };

        let report = TickReport {
            tick,
            battery,
            rotation: robot.inertial_unit().map(|imu| imu.rotation()),
            position: robot.gps().map(|gps| gps.position()),
            sensors: robot.sensors().snapshot(),
        };
        debug!(?report, "tick");
        on_tick(&report);
        summary.ticks += 1;
    }

    robot.wheels_mut().stop();
    info!(ticks = summary.ticks, battery = summary.last_battery, "run finished");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RunConfig, SimConfig};
    use smarthome_hal::Engine;

    fn config(ticks: u32, feed: &[&str]) -> Config {
        Config {
            sim: SimConfig {
                battery_feed: feed.iter().map(|s| s.to_string()).collect(),
                ..SimConfig::default()
            },
            run: RunConfig {
                ticks,
                left: 5.0,
                right: -5.0,
            },
            ..Config::default()
        }
    }

    #[test]
    fn build_engine_follows_sim_config() {
        let mut cfg = Config::default();
        cfg.sim.gps = false;
        cfg.sim.distances.insert("D2".to_string(), 1.0);
        let engine = build_engine(&cfg);

        assert_eq!(engine.basic_time_step(), 32.0);
        assert!(engine.has_device("inertial_unit"));
        assert!(!engine.has_device("gps"));
        assert!(engine.has_device("D8"));
        assert_eq!(engine.device_names().len(), 4 + 8 + 1);
    }

    #[test]
    fn run_reports_every_tick() {
        let cfg = config(3, &["3.7", "", "3.5"]);
        let shutdown = Arc::new(AtomicBool::new(false));
        let mut reports = Vec::new();

        let summary = run(&cfg, &shutdown, |r| reports.push(r.clone())).unwrap();

        assert_eq!(summary.ticks, 3);
        assert_eq!(reports.len(), 3);
        assert_eq!(reports[0].battery, Some(3.7));
        // the empty payload blocks the queue head, so every later read is 0
        assert_eq!(reports[1].battery, Some(0.0));
        assert_eq!(reports[2].battery, Some(0.0));
        assert_eq!(reports[0].sensors.len(), 8);
        assert!(reports[0].rotation.is_some());
        assert!(reports[0].position.is_some());
    }

    #[test]
    fn malformed_telemetry_is_counted_not_fatal() {
        let cfg = config(2, &["low", "2.5"]);
        let shutdown = Arc::new(AtomicBool::new(false));
        let summary = run(&cfg, &shutdown, |_| {}).unwrap();
        assert_eq!(summary.ticks, 2);
        assert_eq!(summary.malformed_telemetry, 1);
        assert_eq!(summary.last_battery, 2.5);
    }

    #[test]
    fn shutdown_flag_stops_the_run() {
        let cfg = config(50, &[]);
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);
        let summary = run(&cfg, &shutdown, |r| {
            if r.tick == 4 {
                flag.store(true, Ordering::SeqCst);
            }
        })
        .unwrap();
        assert_eq!(summary.ticks, 5);
    }

    #[test]
    fn robot_config_naming_an_absent_motor_fails() {
        let cfg = config(1, &[]);
        let engine = build_engine(&cfg);
        let mut robot_cfg = cfg.robot.clone();
        robot_cfg.left_motor = "wheel4 motor".to_string();
        assert!(matches!(
            Robot::with_config(engine, robot_cfg),
            Err(SmarthomeError::DeviceNotFound { ref name, .. }) if name == "wheel4 motor"
        ));
    }
}
