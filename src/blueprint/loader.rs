//! Blueprint File Loading
//!
//! Reads templates and argument values from disk and writes resolved
//! output back.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::{debug, info};

use super::model::InputValue;
use super::resolver::Blueprint;
use crate::error::BlueprintError;

/// Loads a blueprint template from a file.
///
/// # Example
///
/// ```rust,no_run
/// use flowprint::blueprint::load_template;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let blueprint = load_template("templates/notify.yaml")?;
///     println!("{} arguments", blueprint.arguments().len());
///     Ok(())
/// }
/// ```
pub fn load_template(path: impl AsRef<Path>) -> Result<Blueprint, BlueprintError> {
    let path = path.as_ref();
    info!("Loading template from: {}", path.display());

    let template = read_file(path)?;
    debug!("Template loaded ({} bytes)", template.len());

    let blueprint = Blueprint::new(template);
    info!("Template declares {} arguments", blueprint.arguments().len());
    Ok(blueprint)
}

/// Loads argument values from a file.
///
/// The file holds a mapping of argument id to value. Files ending in
/// `.json` are read as JSON, anything else as YAML. An empty file yields
/// no values.
pub fn load_inputs(path: impl AsRef<Path>) -> Result<HashMap<String, InputValue>, BlueprintError> {
    let path = path.as_ref();
    info!("Loading argument values from: {}", path.display());

    let content = read_file(path)?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let inputs = parse_inputs(&content, is_json).map_err(|message| BlueprintError::InvalidInputs {
        path: path.display().to_string(),
        message,
    })?;

    debug!("Loaded {} argument values", inputs.len());
    Ok(inputs)
}

/// Parses a mapping of argument values from YAML or JSON text.
pub fn parse_inputs(content: &str, is_json: bool) -> Result<HashMap<String, InputValue>, String> {
    if content.trim().is_empty() {
        return Ok(HashMap::new());
    }

    if is_json {
        serde_json::from_str(content).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str(content).map_err(|e| e.to_string())
    }
}

/// Writes resolved output to a file.
pub fn save_output(output: &str, path: impl AsRef<Path>) -> Result<(), BlueprintError> {
    let path = path.as_ref();
    fs::write(path, output).map_err(|source| BlueprintError::Write {
        path: path.display().to_string(),
        source,
    })?;
    info!("Resolved flow saved to: {}", path.display());
    Ok(())
}

fn read_file(path: &Path) -> Result<String, BlueprintError> {
    fs::read_to_string(path).map_err(|source| BlueprintError::Read {
        path: path.display().to_string(),
        source,
    })
}
