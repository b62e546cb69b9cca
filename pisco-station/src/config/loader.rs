//! Configuration loading
//!
//! Loads the station configuration from the file named by `PISCO_CONFIG`.
//! Falls back to the embedded defaults if the file is missing or invalid.

use std::{env, fmt, fs, io};

use log::{debug, info, warn};
use pisco_core::sequence::RecipeError;

use super::StationConfig;

/// Environment variable naming an override config file
pub const CONFIG_ENV: &str = "PISCO_CONFIG";

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    /// Config file could not be read
    Io(io::Error),
    /// TOML parsing failed
    Parse(toml::de::Error),
    /// Recipe failed validation
    Recipe(RecipeError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "cannot read config: {}", e),
            ConfigError::Parse(e) => write!(f, "invalid config: {}", e),
            ConfigError::Recipe(e) => write!(f, "invalid recipe: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<io::Error> for ConfigError {
    fn from(e: io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl From<RecipeError> for ConfigError {
    fn from(e: RecipeError) -> Self {
        ConfigError::Recipe(e)
    }
}

/// Load the station configuration
///
/// Tries the file named by [`CONFIG_ENV`] first, then the embedded config.
pub fn load(embedded: &str) -> Result<StationConfig, ConfigError> {
    if let Some(path) = env::var_os(CONFIG_ENV) {
        info!("Loading configuration from {}", path.to_string_lossy());
        match load_file(&path) {
            Ok(config) => return Ok(config),
            Err(e) => warn!("{}, using embedded defaults", e),
        }
    } else {
        debug!("{} not set, using embedded defaults", CONFIG_ENV);
    }

    let config = parse_config(embedded)?;
    log_config_summary(&config);
    Ok(config)
}

fn load_file(path: impl AsRef<std::path::Path>) -> Result<StationConfig, ConfigError> {
    let text = fs::read_to_string(path)?;
    debug!("Read {} bytes of TOML", text.len());

    let config = parse_config(&text)?;
    log_config_summary(&config);
    Ok(config)
}

/// Parse and validate a TOML configuration
pub fn parse_config(input: &str) -> Result<StationConfig, ConfigError> {
    let config: StationConfig = toml::from_str(input)?;
    config.recipe.validate()?;
    Ok(config)
}

/// Log a summary of the loaded configuration
fn log_config_summary(config: &StationConfig) {
    info!("Configuration loaded successfully");
    debug!("  recipe {}", config.recipe.label);
    debug!("  {} steps", config.recipe.steps.len());
    debug!("  {} gates", config.recipe.gates.len());
    debug!("  {} gated waits", config.recipe.wait_count());
    debug!("  {} scripted inputs", config.simulation.input.len());
    debug!("  {} scripted events", config.simulation.event.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EventKind;
    use pisco_core::config::TimeoutPolicy;
    use pisco_hal::ControllerState;

    const STATION: &str = include_str!("../../station.toml");

    const MINIMAL: &str = r#"
[arm]
address = "10.0.0.2"

[recipe]
label = "test"

[[recipe.gates]]
name = "lid"
channel = 0
satisfied_level = false

[[recipe.steps]]
move_line = { pose = [180.0, 62.0, 208.0, 180.0, 0.0, 0.0] }

[[recipe.steps]]
wait_sensor = { gate = "lid" }
"#;

    #[test]
    fn test_embedded_config_parses() {
        let config = parse_config(STATION).unwrap();

        assert_eq!(config.arm.address, "192.168.1.196");
        assert_eq!(config.recipe.label.as_str(), "pisco-sour");
        assert_eq!(config.recipe.steps.len(), 104);
        assert_eq!(config.recipe.gates.len(), 2);
        assert!(config.recipe.wait_count() > 0);

        let lid = config.recipe.find_gate("mixer_lid").unwrap();
        assert_eq!(lid.channel, 0);
        assert!(!lid.satisfied_level);
        assert_eq!(lid.on_timeout, TimeoutPolicy::Continue);
    }

    #[test]
    fn test_minimal_config_defaults() {
        let config = parse_config(MINIMAL).unwrap();

        assert!(!config.simulation.realtime);
        assert_eq!(config.simulation.motion_ms, crate::config::DEFAULT_MOTION_MS);
        assert!(config.simulation.input.is_empty());

        let gate = config.recipe.find_gate("lid").unwrap();
        assert_eq!(gate.timeout_s, 5.0);
        assert_eq!(gate.wait_config().timeout_ms, 5000);
    }

    #[test]
    fn test_unknown_gate_rejected() {
        let input = MINIMAL.replace("gate = \"lid\"", "gate = \"door\"");
        let result = parse_config(&input);
        assert!(matches!(
            result,
            Err(ConfigError::Recipe(RecipeError::UnknownGate(1)))
        ));
    }

    #[test]
    fn test_bad_toml_rejected() {
        let result = parse_config("[arm\naddress = 1");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_unknown_step_rejected() {
        let input = MINIMAL.replace("move_line", "teleport");
        assert!(matches!(parse_config(&input), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_event_kinds() {
        let input = format!(
            "{}\n{}",
            MINIMAL,
            r#"
[[simulation.event]]
at_ms = 1234
kind = "fault"
code = 19

[[simulation.event]]
at_ms = 2000
kind = "state"
state = "stopped"

[[simulation.event]]
at_ms = 3000
kind = "disconnect"
"#
        );
        let config = parse_config(&input).unwrap();
        let kinds: Vec<EventKind> = config.simulation.event.iter().map(|e| e.kind).collect();

        assert_eq!(
            kinds,
            vec![
                EventKind::Fault { code: 19 },
                EventKind::State {
                    state: ControllerState::Stopped
                },
                EventKind::Disconnect,
            ]
        );
        assert_eq!(config.simulation.event[0].at_ms, 1234);
    }
}
