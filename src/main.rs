//! Flowprint CLI Entry Point
//!
//! Provides a command-line interface for resolving blueprint templates.
//!
//! # Usage
//!
//! ```bash
//! # List the arguments a template expects
//! flowprint notify.yaml --list-args
//!
//! # Resolve a template
//! flowprint notify.yaml --flow-id reminders --namespace company.team --set recipient=ops
//!
//! # Read argument values from a file and write the flow to disk
//! flowprint notify.yaml --flow-id reminders --namespace company.team \
//!     --inputs values.yaml --output reminders.yaml
//! ```

use std::collections::HashMap;
use std::env;
use std::process::ExitCode;

use colored::Colorize;
use log::{error, info};

use flowprint::blueprint::{load_inputs, load_template, save_output, InputValue};
use flowprint::{APP_NAME, VERSION};

/// Command-line configuration parsed from arguments.
#[derive(Debug, Default)]
struct Config {
    template_path: Option<String>,
    flow_id: String,
    namespace: String,
    assignments: Vec<(String, String)>,
    inputs_path: Option<String>,
    output_path: Option<String>,
    list_args: bool,
    json: bool,
    verbose: bool,
}

/// Configures the logging system with appropriate formatting.
fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            use std::io::Write;

            match record.level() {
                log::Level::Warn | log::Level::Error => {
                    writeln!(buf, "[{}] {}", record.level(), record.args())
                }
                _ => writeln!(buf, "{}", record.args()),
            }
        })
        .init();
}

/// Prints usage information.
fn print_usage() {
    println!("Usage: flowprint [OPTIONS] <TEMPLATE_FILE>");
    println!();
    println!("Arguments:");
    println!("  <TEMPLATE_FILE>     Path to blueprint template file");
    println!();
    println!("Options:");
    println!("  --flow-id ID        Flow id of the resolved definition");
    println!("  --namespace NS      Namespace of the resolved definition");
    println!("  --set KEY=VALUE     Template argument value (repeatable)");
    println!("  --inputs FILE       YAML or JSON file of argument values");
    println!("  --output FILE       Write the resolved flow to FILE");
    println!("  --list-args         Print the template's arguments and exit");
    println!("  --json              Print --list-args output as JSON");
    println!("  --verbose           Enable debug logging");
    println!("  --help              Show this help message");
    println!("  --version           Show version information");
    println!();
    println!("Examples:");
    println!("  flowprint notify.yaml --list-args");
    println!("  flowprint notify.yaml --flow-id reminders --namespace company.team --set recipient=ops");
}

/// Parses command-line arguments into a Config struct.
fn parse_arguments(args: &[String]) -> Result<Config, String> {
    let mut config = Config::default();
    let mut i = 1; // Skip program name

    while i < args.len() {
        let arg = &args[i];

        match arg.as_str() {
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("{} {}", APP_NAME, VERSION);
                std::process::exit(0);
            }
            "--list-args" => config.list_args = true,
            "--json" => config.json = true,
            "--verbose" | "-v" => config.verbose = true,
            "--flow-id" => config.flow_id = option_value(args, &mut i, "--flow-id")?,
            "--namespace" => config.namespace = option_value(args, &mut i, "--namespace")?,
            "--inputs" => config.inputs_path = Some(option_value(args, &mut i, "--inputs")?),
            "--output" => config.output_path = Some(option_value(args, &mut i, "--output")?),
            "--set" => {
                let assignment = option_value(args, &mut i, "--set")?;
                let (key, value) = assignment
                    .split_once('=')
                    .ok_or_else(|| format!("Invalid --set value '{}', expected KEY=VALUE", assignment))?;
                config
                    .assignments
                    .push((key.trim().to_string(), value.to_string()));
            }
            arg if arg.starts_with('-') => {
                return Err(format!("Unknown option: {}", arg));
            }
            _ => {
                if config.template_path.is_some() {
                    return Err(format!("Unexpected argument: {}", arg));
                }
                config.template_path = Some(arg.clone());
            }
        }
        i += 1;
    }

    Ok(config)
}

/// Reads the value following an option.
fn option_value(args: &[String], i: &mut usize, option: &str) -> Result<String, String> {
    *i += 1;
    args.get(*i)
        .cloned()
        .ok_or_else(|| format!("{} requires a value", option))
}

/// Collects argument values; `--set` wins over the inputs file.
fn collect_inputs(config: &Config) -> Result<HashMap<String, InputValue>, Box<dyn std::error::Error>> {
    let mut inputs = match config.inputs_path {
        Some(ref path) => load_inputs(path)?,
        None => HashMap::new(),
    };

    for (key, value) in &config.assignments {
        inputs.insert(key.clone(), InputValue::from(value.as_str()));
    }

    Ok(inputs)
}

/// Main application entry point.
fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    // Parse arguments
    let config = parse_arguments(&args).map_err(|e| {
        eprintln!("Error: {}", e);
        eprintln!();
        print_usage();
        e
    })?;

    // Setup logging
    setup_logging(config.verbose);
    info!("{} v{}", APP_NAME, VERSION);

    let template_path = config
        .template_path
        .as_deref()
        .ok_or("No template file specified")?;

    let blueprint = load_template(template_path).map_err(|e| {
        error!("Failed to load template: {}", e);
        e
    })?;

    if config.list_args {
        let listing = if config.json {
            serde_json::to_string_pretty(blueprint.arguments())?
        } else {
            serde_yaml::to_string(blueprint.arguments())?
        };
        println!("{}", listing.trim_end());
        return Ok(());
    }

    let inputs = collect_inputs(&config)?;

    let output = match blueprint.resolve(&config.flow_id, &config.namespace, &inputs) {
        Ok(output) => output,
        Err(errors) => {
            eprintln!("{}", "Template arguments are invalid:".red().bold());
            for (field, message) in errors.iter() {
                eprintln!("  {} {}", format!("{}:", field).yellow(), message);
            }
            return Err(format!("{} field(s) failed validation", errors.len()).into());
        }
    };

    match config.output_path {
        Some(ref path) => save_output(&output, path)?,
        None => print!("{}", output),
    }

    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!();
            eprintln!("{} {}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("flowprint")
            .chain(list.iter().copied())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_parse_full_command() {
        let config = parse_arguments(&args(&[
            "notify.yaml",
            "--flow-id",
            "reminders",
            "--namespace",
            "company.team",
            "--set",
            "recipient=ops",
            "--set",
            "query=a=b",
            "--output",
            "out.yaml",
        ]))
        .unwrap();

        assert_eq!(config.template_path.as_deref(), Some("notify.yaml"));
        assert_eq!(config.flow_id, "reminders");
        assert_eq!(config.namespace, "company.team");
        assert_eq!(
            config.assignments,
            vec![
                ("recipient".to_string(), "ops".to_string()),
                ("query".to_string(), "a=b".to_string()),
            ]
        );
        assert_eq!(config.output_path.as_deref(), Some("out.yaml"));
        assert!(!config.list_args);
    }

    #[test]
    fn test_parse_list_args() {
        let config = parse_arguments(&args(&["t.yaml", "--list-args", "--json", "-v"])).unwrap();
        assert!(config.list_args);
        assert!(config.json);
        assert!(config.verbose);
    }

    #[test]
    fn test_parse_missing_option_value() {
        assert!(parse_arguments(&args(&["t.yaml", "--flow-id"])).is_err());
    }

    #[test]
    fn test_parse_bad_assignment() {
        let err = parse_arguments(&args(&["t.yaml", "--set", "novalue"])).unwrap_err();
        assert!(err.contains("KEY=VALUE"));
    }

    #[test]
    fn test_parse_unknown_option() {
        assert!(parse_arguments(&args(&["--frobnicate"])).is_err());
    }

    #[test]
    fn test_parse_extra_positional() {
        assert!(parse_arguments(&args(&["a.yaml", "b.yaml"])).is_err());
    }

    #[test]
    fn test_collect_inputs_set_overrides_file() {
        use tempfile::tempdir;

        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("values.yaml");
        std::fs::write(&path, "recipient: file\nretries: 2\n").unwrap();

        let config = Config {
            inputs_path: Some(path.to_str().unwrap().to_string()),
            assignments: vec![("recipient".to_string(), "cli".to_string())],
            ..Config::default()
        };

        let inputs = collect_inputs(&config).unwrap();
        assert_eq!(inputs.get("recipient"), Some(&InputValue::from("cli")));
        assert_eq!(inputs.get("retries"), Some(&InputValue::Integer(2)));
    }
}
