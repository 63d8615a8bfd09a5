//! Blueprint Template Module
//!
//! Provides data structures and utilities for turning reusable flow
//! templates into concrete flow definitions.
//!
//! # Structure
//!
//! - [`model`]: Core data structures (TemplateArgument, InputValue, FieldErrors)
//! - [`arguments`]: Argument extraction from template text
//! - [`validator`]: Validation of flow id, namespace and argument values
//! - [`resolver`]: Token substitution and the [`Blueprint`] type
//! - [`normalize`]: Metadata stripping and header fix-up of resolved output
//! - [`loader`]: Reading and writing blueprint files

pub mod arguments;
pub mod loader;
pub mod model;
pub mod normalize;
pub mod resolver;
pub mod validator;

pub use arguments::extract_template_arguments;
pub use loader::{load_inputs, load_template, save_output};
pub use model::{ArgumentType, FieldErrors, InputValue, ResolvedValue, TemplateArgument};
pub use resolver::{resolve_blueprint, Blueprint};
pub use validator::{validate_inputs, ValidatedInputs};
