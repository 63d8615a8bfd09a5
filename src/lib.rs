//! Flowprint - Blueprint Template Resolution
//!
//! Turns reusable flow templates ("blueprints") into concrete flow
//! definitions. A template is YAML (or plain text) containing placeholder
//! tokens; resolving it validates the user's values, fills in the tokens,
//! and strips the authoring-time argument declarations.
//!
//! # Architecture
//!
//! - [`blueprint`]: Argument extraction, validation, resolution and file I/O
//! - [`error`]: Errors raised while reading or writing blueprint files
//!
//! # Example
//!
//! ```rust,no_run
//! use std::collections::HashMap;
//! use flowprint::blueprint::{load_template, InputValue};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Load a template from YAML
//!     let blueprint = load_template("templates/notify.yaml")?;
//!
//!     // Supply argument values
//!     let mut inputs = HashMap::new();
//!     inputs.insert("recipient".to_string(), InputValue::from("ops"));
//!
//!     // Resolve into a flow definition
//!     let flow = blueprint.resolve("notify-ops", "company.team", &inputs)?;
//!     println!("{}", flow);
//!     Ok(())
//! }
//! ```

pub mod blueprint;
pub mod error;

// Re-export commonly used types
pub use blueprint::{
    extract_template_arguments, resolve_blueprint, Blueprint, FieldErrors, InputValue,
    TemplateArgument,
};
pub use error::BlueprintError;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "Flowprint";
