//! Run configuration – reads/writes `~/.smarthome/config.toml`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use smarthome_types::{RobotConfig, SmarthomeError};

/// Persisted configuration for a simulated run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub robot: RobotConfig,
    pub sim: SimConfig,
    pub run: RunConfig,
}

/// The simulated world the robot is assembled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Basic time step of the engine in milliseconds.
    pub time_step_ms: u32,
    /// Distance sensor device names on the robot model.
    pub sensors: Vec<String>,
    pub inertial_unit: bool,
    pub gps: bool,
    /// Initial yaw in radians.
    pub yaw: f64,
    /// Initial GPS coordinates.
    pub position: [f64; 3],
    /// Initial raw readings by sensor device name.
    pub distances: BTreeMap<String, f64>,
    /// Battery payloads pushed on the robot's channel, one per tick.
    pub battery_feed: Vec<String>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            time_step_ms: 32,
            sensors: (1..=8).map(|i| format!("D{i}")).collect(),
            inertial_unit: true,
            gps: true,
            yaw: 0.0,
            position: [0.0; 3],
            distances: BTreeMap::new(),
            battery_feed: Vec::new(),
        }
    }
}

/// What the run loop commands each tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub ticks: u32,
    /// Logical left wheel velocity.
    pub left: f64,
    /// Logical right wheel velocity.
    pub right: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            ticks: 100,
            left: 5.0,
            right: 5.0,
        }
    }
}

/// Return the config path: `$SMARTHOME_CONFIG` if set, otherwise
/// `~/.smarthome/config.toml`.
pub fn config_path() -> PathBuf {
    if let Ok(p) = std::env::var("SMARTHOME_CONFIG") {
        return PathBuf::from(p);
    }
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".smarthome").join("config.toml")
}

/// Load the config from a specific path.  Returns `None` if the file does
/// not exist.
pub fn load_from(path: &Path) -> Result<Option<Config>, SmarthomeError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|e| {
        SmarthomeError::Config(format!("failed to read {}: {}", path.display(), e))
    })?;
    let mut cfg: Config = toml::from_str(&raw)
        .map_err(|e| SmarthomeError::Config(format!("failed to parse {}: {}", path.display(), e)))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `SMARTHOME_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `SMARTHOME_ROBOT_NAME` | `robot.name` |
/// | `SMARTHOME_MAX_SPEED` | `robot.max_speed` |
/// | `SMARTHOME_TICKS` | `run.ticks` |
///
/// Values that do not parse are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("SMARTHOME_ROBOT_NAME") {
        cfg.robot.name = v;
    }
    if let Ok(v) = std::env::var("SMARTHOME_MAX_SPEED")
        && let Ok(speed) = v.parse::<f64>()
    {
        cfg.robot.max_speed = speed;
    }
    if let Ok(v) = std::env::var("SMARTHOME_TICKS")
        && let Ok(ticks) = v.parse::<u32>()
    {
        cfg.run.ticks = ticks;
    }
}

/// Save the config to a specific path, creating parent directories.
pub fn save_to(cfg: &Config, path: &Path) -> Result<(), SmarthomeError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            SmarthomeError::Config(format!("failed to create {}: {}", parent.display(), e))
        })?;
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| SmarthomeError::Config(format!("failed to serialize config: {}", e)))?;
    fs::write(path, raw).map_err(|e| {
        SmarthomeError::Config(format!("failed to write {}: {}", path.display(), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        let cfg = Config::default();
        save_to(&cfg, &path).expect("save");

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.sim, SimConfig::default());
        assert_eq!(loaded.run.left, 5.0);
        assert_eq!(loaded.run.right, 5.0);
        assert_eq!(loaded.robot.right_motor, "wheel1 motor");
        assert_eq!(loaded.robot.sensor_aliases.len(), 8);
    }

    #[test]
    fn config_path_points_to_smarthome_dir() {
        let p = config_path_for_home("/home/testuser");
        assert!(p.to_string_lossy().contains(".smarthome"));
        assert!(p.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        assert!(load_from(&path).expect("no error").is_none());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
            [sim]
            gps = false
            battery_feed = ["3.7", "3.6"]

            [sim.distances]
            D1 = 0.5

            [run]
            left = -2.0
            "#,
        )
        .unwrap();

        let cfg = load_from(&path).unwrap().unwrap();
        assert!(!cfg.sim.gps);
        assert!(cfg.sim.inertial_unit);
        assert_eq!(cfg.sim.battery_feed, ["3.7", "3.6"]);
        assert_eq!(cfg.sim.distances["D1"], 0.5);
        assert_eq!(cfg.run.left, -2.0);
        assert_eq!(cfg.run.right, 5.0);
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "[run\nticks = ").unwrap();
        assert!(matches!(load_from(&path), Err(SmarthomeError::Config(_))));
    }

    // All env var manipulation lives in one test: the test harness runs tests
    // on parallel threads and the variables are process-global.
    #[test]
    fn apply_env_overrides_reads_smarthome_vars() {
        // SAFETY: the other tests that load a config never assert on these fields.
        unsafe {
            std::env::set_var("SMARTHOME_ROBOT_NAME", "kitchen-bot");
            std::env::set_var("SMARTHOME_MAX_SPEED", "6.28");
            std::env::set_var("SMARTHOME_TICKS", "not-a-number");
        }
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.robot.name, "kitchen-bot");
        assert!((cfg.robot.max_speed - 6.28).abs() < f64::EPSILON);
        assert_eq!(cfg.run.ticks, RunConfig::default().ticks);

        unsafe { std::env::set_var("SMARTHOME_TICKS", "7") };
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.run.ticks, 7);

        unsafe {
            std::env::remove_var("SMARTHOME_ROBOT_NAME");
            std::env::remove_var("SMARTHOME_MAX_SPEED");
            std::env::remove_var("SMARTHOME_TICKS");
        }
    }
}
