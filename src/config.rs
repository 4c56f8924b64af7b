//! Tunable constants and command-line configuration.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

// ── Physics ─────────────────────────────────────────────────────────────────

/// Simulation constants, in core coordinate units per tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Physics {
    /// Added to the entity's velocity every tick (positive = downward).
    pub gravity: f64,
    /// Velocity set by a jump. Overwrites, never adds.
    pub jump_velocity: f64,
    pub pipe_speed: f64,
    /// Distance past the right edge where new obstacles appear.
    pub pipe_spacing: f64,
    pub obstacle_width: f64,
    pub obstacle_height: f64,
    /// Opening between the top and bottom barrier, used for drawing only.
    pub gap: f64,
    pub max_obstacles: usize,
    pub start_x: f64,
    pub start_y: f64,
    pub entity_size: f64,
}

impl Default for Physics {
    fn default() -> Self {
        Self {
            gravity: 0.6,
            jump_velocity: -12.0,
            pipe_speed: 2.5,
            pipe_spacing: 200.0,
            obstacle_width: 50.0,
            obstacle_height: 200.0,
            gap: 120.0,
            max_obstacles: 3,
            start_x: 100.0,
            start_y: 200.0,
            entity_size: 40.0,
        }
    }
}

// ── Run configuration ───────────────────────────────────────────────────────

pub const DEFAULT_TICK_MS: u64 = 20;
pub const DEFAULT_SCALE: f64 = 10.0;
/// Finer scales blow game geometry up past what the renderer draws.
pub const MIN_SCALE: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub physics: Physics,
    pub tick: Duration,
    /// Core units per terminal pixel.
    pub scale: f64,
    pub seed: Option<u64>,
    pub mute: bool,
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            physics: Physics::default(),
            tick: Duration::from_millis(DEFAULT_TICK_MS),
            scale: DEFAULT_SCALE,
            seed: None,
            mute: false,
            log_file: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Play(Config),
    Help,
    Version,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("missing value for {0}")]
    MissingValue(&'static str),
    #[error("invalid value {value:?} for {flag}")]
    InvalidValue { flag: &'static str, value: String },
    #[error("{flag} must be {expected}")]
    OutOfRange {
        flag: &'static str,
        expected: &'static str,
    },
    #[error("unknown argument {0:?}")]
    UnknownFlag(String),
}

pub const USAGE: &str = "\
Usage: flapper [OPTIONS]

Options:
  --seed <N>      Seed the obstacle generator for a repeatable run
  --tick-ms <N>   Milliseconds per simulation tick [default: 20]
  --scale <F>     Game units per terminal pixel, at least 0.5 [default: 10]
  --mute          Disable sound
  --log <PATH>    Write logs to PATH (filter with RUST_LOG)
  -h, --help      Print help
  -V, --version   Print version

Controls: Space/Up/Enter or click to flap, q/Esc to quit.";

/// Parse the arguments that follow the program name.
pub fn parse_args<I>(args: I) -> Result<Command, ConfigError>
where
    I: IntoIterator<Item = String>,
{
    let mut config = Config::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "-V" | "--version" => return Ok(Command::Version),
            "--mute" => config.mute = true,
            "--seed" => config.seed = Some(parse_value("--seed", args.next())?),
            "--tick-ms" => {
                let ms: u64 = parse_value("--tick-ms", args.next())?;
                if ms == 0 {
                    return Err(ConfigError::OutOfRange {
                        flag: "--tick-ms",
                        expected: "at least 1",
                    });
                }
                config.tick = Duration::from_millis(ms);
            }
            "--scale" => {
                let scale: f64 = parse_value("--scale", args.next())?;
                if !scale.is_finite() || scale < MIN_SCALE {
                    return Err(ConfigError::OutOfRange {
                        flag: "--scale",
                        expected: "a finite number of at least 0.5",
                    });
                }
                config.scale = scale;
            }
            "--log" => {
                let path = args.next().ok_or(ConfigError::MissingValue("--log"))?;
                config.log_file = Some(PathBuf::from(path));
            }
            _ => return Err(ConfigError::UnknownFlag(arg)),
        }
    }

    Ok(Command::Play(config))
}

fn parse_value<T: std::str::FromStr>(
    flag: &'static str,
    value: Option<String>,
) -> Result<T, ConfigError> {
    let value = value.ok_or(ConfigError::MissingValue(flag))?;
    value
        .parse()
        .map_err(|_| ConfigError::InvalidValue { flag, value })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Command, ConfigError> {
        parse_args(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_defaults_without_arguments() {
        let Command::Play(config) = parse(&[]).unwrap() else {
            panic!("expected play command");
        };
        assert_eq!(config, Config::default());
        assert_eq!(config.tick, Duration::from_millis(20));
        assert!((config.physics.gravity - 0.6).abs() < f64::EPSILON);
        assert!((config.physics.jump_velocity + 12.0).abs() < f64::EPSILON);
        assert!((config.physics.pipe_speed - 2.5).abs() < f64::EPSILON);
        assert_eq!(config.physics.max_obstacles, 3);
    }

    #[test]
    fn test_all_flags() {
        let Command::Play(config) = parse(&[
            "--seed", "42", "--tick-ms", "33", "--scale", "8.5", "--mute", "--log", "run.log",
        ])
        .unwrap() else {
            panic!("expected play command");
        };
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.tick, Duration::from_millis(33));
        assert!((config.scale - 8.5).abs() < f64::EPSILON);
        assert!(config.mute);
        assert_eq!(config.log_file, Some(PathBuf::from("run.log")));
    }

    #[test]
    fn test_help_and_version_short_circuit() {
        assert_eq!(parse(&["--help", "--bogus"]).unwrap(), Command::Help);
        assert_eq!(parse(&["-V"]).unwrap(), Command::Version);
    }

    #[test]
    fn test_missing_value() {
        assert_eq!(
            parse(&["--seed"]).unwrap_err(),
            ConfigError::MissingValue("--seed")
        );
        assert_eq!(
            parse(&["--log"]).unwrap_err(),
            ConfigError::MissingValue("--log")
        );
    }

    #[test]
    fn test_invalid_value() {
        assert_eq!(
            parse(&["--tick-ms", "fast"]).unwrap_err(),
            ConfigError::InvalidValue {
                flag: "--tick-ms",
                value: "fast".to_string()
            }
        );
    }

    #[test]
    fn test_out_of_range() {
        assert!(matches!(
            parse(&["--tick-ms", "0"]),
            Err(ConfigError::OutOfRange { flag: "--tick-ms", .. })
        ));
        assert!(matches!(
            parse(&["--scale", "-1"]),
            Err(ConfigError::OutOfRange { flag: "--scale", .. })
        ));
        assert!(matches!(
            parse(&["--scale", "0.00000001"]),
            Err(ConfigError::OutOfRange { flag: "--scale", .. })
        ));
        assert!(matches!(
            parse(&["--scale", "0.4"]),
            Err(ConfigError::OutOfRange { flag: "--scale", .. })
        ));
        assert!(matches!(parse(&["--scale", "0.5"]), Ok(Command::Play(_))));
        assert!(matches!(
            parse(&["--scale", "NaN"]),
            Err(ConfigError::OutOfRange { flag: "--scale", .. })
        ));
    }

    #[test]
    fn test_unknown_flag() {
        assert_eq!(
            parse(&["--fly"]).unwrap_err(),
            ConfigError::UnknownFlag("--fly".to_string())
        );
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ConfigError::MissingValue("--seed").to_string(),
            "missing value for --seed"
        );
        assert_eq!(
            ConfigError::UnknownFlag("x".into()).to_string(),
            "unknown argument \"x\""
        );
    }
}
