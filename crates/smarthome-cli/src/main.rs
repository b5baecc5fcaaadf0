//! `smarthome-cli` – headless runner for the smart-home robot device layer
//!
//! This binary:
//!
//! 1. Loads `~/.smarthome/config.toml` (or `$SMARTHOME_CONFIG`), writing the
//!    defaults on first run.
//! 2. Builds a simulated world from the `[sim]` table and assembles the robot
//!    described by `[robot]`.
//! 3. Drives the wheels for `[run].ticks` steps, printing battery, heading
//!    and position each tick.
//! 4. Intercepts **Ctrl-C** to stop the wheels and exit cleanly.

mod config;
mod session;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use colored::Colorize;
use tracing::warn;

use crate::session::TickReport;

fn main() {
    // ── Structured logging ────────────────────────────────────────────────
    // RUST_LOG selects the filter (default "info"); SMARTHOME_LOG_FORMAT=json
    // switches to newline-delimited JSON.
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    if std::env::var("SMARTHOME_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .compact()
            .init();
    }

    print_banner();

    // ── Ctrl-C handler ────────────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = Arc::clone(&shutdown);
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – stopping the robot …".yellow().bold());
        shutdown_clone.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; the run can only end by tick count");
    }

    // ── Configuration ─────────────────────────────────────────────────────
    let path = config::config_path();
    let cfg = match config::load_from(&path) {
        Ok(Some(cfg)) => {
            println!("  Config loaded from {}", path.display().to_string().bold());
            cfg
        }
        Ok(None) => {
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            match config::save_to(&config::Config::default(), &path) {
                Ok(()) => println!(
                    "  {} Default config written to {}",
                    "✓".green().bold(),
                    path.display().to_string().bold()
                ),
                Err(e) => println!("{}: {}", "Error saving config".red(), e),
            }
            cfg
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
    };

    println!(
        "  Robot {} (max speed {}), {} tick(s) at {} ms\n",
        cfg.robot.name.bold(),
        cfg.robot.max_speed,
        cfg.run.ticks,
        cfg.sim.time_step_ms
    );

    // ── Run ───────────────────────────────────────────────────────────────
    match session::run(&cfg, &shutdown, print_tick) {
        Ok(summary) => {
            println!();
            println!(
                "  {} {} tick(s), last battery {:.2}, {} malformed reading(s)",
                "✓".green().bold(),
                summary.ticks,
                summary.last_battery,
                summary.malformed_telemetry
            );
        }
        Err(e) => {
            println!("{}: {}", "Robot assembly failed".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn print_tick(report: &TickReport) {
    let battery = match report.battery {
        Some(level) => format!("{level:6.2}").green(),
        None => "  ?   ".red(),
    };
    let heading = report
        .rotation
        .map_or_else(|| "   -  ".dimmed(), |r| format!("{r:6.1}°").normal());
    let position = report.position.map_or_else(
        || "-".dimmed(),
        |p| format!("({:.2}, {:.2}, {:.2})", p.x, p.y, p.z).normal(),
    );
    let peak = report
        .sensors
        .iter()
        .max_by_key(|(_, value)| **value)
        .map(|(name, value)| format!("{name}={value}"))
        .unwrap_or_default();
    println!(
        "  {:>5}  battery {}  heading {}  at {}  peak {}",
        report.tick.to_string().dimmed(),
        battery,
        heading,
        position,
        peak.cyan()
    );
}

fn print_banner() {
    println!();
    println!("  {} {}",
        "smarthome".bold().cyan(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Robot device layer – headless simulation run");
    println!();
}
