//! Build script for pisco-station
//!
//! Validates station.toml at compile time so the embedded config is always
//! loadable.

use std::fs;
use std::path::Path;

/// Step operations the sequencer understands
const STEP_OPS: [&str; 7] = [
    "move_line",
    "move_circle",
    "controller_output",
    "tool_output",
    "pause",
    "speed",
    "wait_sensor",
];

/// Controller input channels
const MAX_CHANNEL: i64 = 7;

/// Longest gate poll tick (ms)
const MAX_POLL_MS: i64 = 100;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    validate_config();
}

/// Validate station.toml at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=station.toml");

    let config_path = Path::new("station.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: station.toml not found!                                  ║\n\
            ║                                                                  ║\n\
            ║  The station embeds a default station.toml configuration.        ║\n\
            ║  Please create one in the pisco-station directory.               ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read station.toml                              ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in station.toml                      ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    validate_required_sections(&config);
    validate_gates(&config);
    validate_steps(&config);
    validate_simulation(&config);
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.chars().count() > 64 {
                format!("{}...", line.chars().take(61).collect::<String>())
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Panic with a boxed list of errors, if there are any
fn report(title: &str, errors: &[String]) {
    if errors.is_empty() {
        return;
    }

    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        errors
            .iter()
            .map(|e| format!("║  • {:<62} ║", e))
            .collect::<Vec<_>>()
            .join("\n")
    );
}

/// Validate that required sections exist
fn validate_required_sections(config: &toml::Value) {
    let mut errors = Vec::new();

    match config.get("arm").and_then(|a| a.get("address")) {
        Some(toml::Value::String(_)) => {}
        Some(_) => errors.push("[arm] address must be a string".to_string()),
        None => errors.push("Missing [arm] address".to_string()),
    }

    match config.get("recipe") {
        Some(toml::Value::Table(recipe)) => {
            if !matches!(recipe.get("label"), Some(toml::Value::String(_))) {
                errors.push("[recipe] missing 'label'".to_string());
            }
        }
        Some(_) => errors.push("[recipe] must be a table".to_string()),
        None => errors.push("Missing [recipe] section".to_string()),
    }

    report("Missing required sections in station.toml", &errors);
}

/// Gate names defined under [[recipe.gates]]
fn gate_names(config: &toml::Value) -> Vec<String> {
    config
        .get("recipe")
        .and_then(|r| r.get("gates"))
        .and_then(|g| g.as_array())
        .map(|gates| {
            gates
                .iter()
                .filter_map(|g| g.get("name"))
                .filter_map(|n| n.as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Validate sensor gate configurations
fn validate_gates(config: &toml::Value) {
    let gates = match config.get("recipe").and_then(|r| r.get("gates")) {
        Some(toml::Value::Array(gates)) => gates,
        Some(_) => {
            report(
                "Invalid gate configuration",
                &["[[recipe.gates]] must be an array of tables".to_string()],
            );
            return;
        }
        None => return,
    };

    let mut errors = Vec::new();
    let mut seen: Vec<&str> = Vec::new();

    for (i, gate) in gates.iter().enumerate() {
        let gate = match gate.as_table() {
            Some(t) => t,
            None => {
                errors.push(format!("gate {} must be a table", i));
                continue;
            }
        };

        let name = match gate.get("name").and_then(|n| n.as_str()) {
            Some(name) => name,
            None => {
                errors.push(format!("gate {} missing 'name'", i));
                continue;
            }
        };
        if seen.contains(&name) {
            errors.push(format!("gate '{}' defined twice", name));
        }
        seen.push(name);

        match gate.get("channel") {
            Some(toml::Value::Integer(ch)) if (0..=MAX_CHANNEL).contains(ch) => {}
            Some(_) => errors.push(format!("gate '{}' channel must be 0-{}", name, MAX_CHANNEL)),
            None => errors.push(format!("gate '{}' missing 'channel'", name)),
        }

        if !matches!(gate.get("satisfied_level"), Some(toml::Value::Boolean(_))) {
            errors.push(format!("gate '{}' missing 'satisfied_level'", name));
        }

        let timeout = match gate.get("timeout_s") {
            Some(toml::Value::Float(t)) => Some(*t),
            Some(toml::Value::Integer(t)) => Some(*t as f64),
            _ => None,
        };
        if timeout.is_some_and(|t| t < 0.0) {
            errors.push(format!("gate '{}' timeout_s cannot be negative", name));
        }

        match gate.get("poll_ms") {
            Some(toml::Value::Integer(ms)) if (1..=MAX_POLL_MS).contains(ms) => {}
            Some(_) => errors.push(format!(
                "gate '{}' poll_ms must be 1-{}",
                name, MAX_POLL_MS
            )),
            None => {}
        }

        if let Some(toml::Value::String(policy)) = gate.get("on_timeout") {
            if !["continue", "halt"].contains(&policy.as_str()) {
                errors.push(format!(
                    "gate '{}' on_timeout must be 'continue' or 'halt'",
                    name
                ));
            }
        }
    }

    report("Invalid gate configuration", &errors);
}

/// Validate recipe steps
fn validate_steps(config: &toml::Value) {
    let gates = gate_names(config);
    let mut errors = Vec::new();

    match config.get("recipe").and_then(|r| r.get("steps")) {
        Some(toml::Value::Array(steps)) => {
            if steps.is_empty() {
                errors.push("[recipe] steps cannot be empty".to_string());
            }

            for (i, step) in steps.iter().enumerate() {
                let step = match step.as_table() {
                    Some(t) if t.len() == 1 => t,
                    _ => {
                        errors.push(format!("step {} must hold exactly one operation", i));
                        continue;
                    }
                };

                for (op, args) in step {
                    if !STEP_OPS.contains(&op.as_str()) {
                        errors.push(format!("step {} has unknown operation '{}'", i, op));
                        continue;
                    }

                    if op == "wait_sensor" {
                        match args.get("gate").and_then(|g| g.as_str()) {
                            Some(gate) if gates.iter().any(|g| g == gate) => {}
                            Some(gate) => errors.push(format!(
                                "step {} waits on unknown gate '{}'",
                                i, gate
                            )),
                            None => errors.push(format!("step {} missing 'gate'", i)),
                        }
                    }
                }
            }
        }
        Some(_) => errors.push("[recipe] steps must be an array".to_string()),
        None => errors.push("[recipe] missing 'steps'".to_string()),
    }

    report("Invalid recipe steps", &errors);
}

/// Validate the simulated controller script
fn validate_simulation(config: &toml::Value) {
    let inputs = match config
        .get("simulation")
        .and_then(|s| s.get("input"))
        .and_then(|i| i.as_array())
    {
        Some(inputs) => inputs,
        None => return,
    };

    let mut errors = Vec::new();

    for (i, input) in inputs.iter().enumerate() {
        match input.get("channel") {
            Some(toml::Value::Integer(ch)) if (0..=MAX_CHANNEL).contains(ch) => {}
            _ => errors.push(format!(
                "simulation input {} channel must be 0-{}",
                i, MAX_CHANNEL
            )),
        }
    }

    report("Invalid simulation configuration", &errors);
}
