//! Blueprint Data Model
//!
//! Core data structures describing template arguments, the raw values a
//! user supplies for them, and the validated values that get substituted.
//!
//! # Example YAML Format
//!
//! ```yaml
//! id: <<flow_id>>
//! namespace: <<namespace>>
//! tasks:
//!   - id: notify
//!     type: io.kestra.plugin.core.log.Log
//!     message: "Sending <<arg.retries>> reminders to <<arg.recipient>>"
//! extend:
//!   templateArguments:
//!     - id: recipient
//!       displayName: Recipient
//!       type: STRING
//!       required: true
//!     - id: retries
//!       type: INT
//!       defaults: 3
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// Token replaced by the resolved flow id.
pub const FLOW_ID_TOKEN: &str = "<<flow_id>>";

/// Token replaced by the resolved namespace.
pub const NAMESPACE_TOKEN: &str = "<<namespace>>";

/// Top-level key holding authoring-time metadata.
pub const EXTEND_KEY: &str = "extend";

/// Key under [`EXTEND_KEY`] declaring the template's arguments.
pub const TEMPLATE_ARGUMENTS_KEY: &str = "templateArguments";

/// Error field name used for the flow id.
pub const FLOW_ID_FIELD: &str = "flowId";

/// Error field name used for the namespace.
pub const NAMESPACE_FIELD: &str = "namespace";

/// Message recorded against a missing required field.
pub const REQUIRED_MESSAGE: &str = "This field is required";

/// True for argument ids that would collide with a header field in
/// [`FieldErrors`].
pub fn is_reserved_id(id: &str) -> bool {
    id == FLOW_ID_FIELD || id == NAMESPACE_FIELD
}

/// Builds the substitution token for an argument id.
///
/// # Example
///
/// ```
/// use flowprint::blueprint::model::argument_token;
///
/// assert_eq!(argument_token("recipient"), "<<arg.recipient>>");
/// ```
pub fn argument_token(id: &str) -> String {
    format!("<<arg.{}>>", id)
}

/// Declared value type of a template argument.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum ArgumentType {
    #[default]
    String,
    Int,
    Bool,
}

impl ArgumentType {
    /// Maps a declared type name onto a variant, defaulting to `STRING`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "INT" => Self::Int,
            "BOOL" => Self::Bool,
            _ => Self::String,
        }
    }
}

impl fmt::Display for ArgumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "STRING"),
            Self::Int => write!(f, "INT"),
            Self::Bool => write!(f, "BOOL"),
        }
    }
}

/// Accepts any scalar for `type`, falling back to `STRING` for unknown names.
fn lenient_type<'de, D>(deserializer: D) -> Result<ArgumentType, D::Error>
where
    D: Deserializer<'de>,
{
    let val = Value::deserialize(deserializer)?;
    Ok(match val {
        Value::String(name) => ArgumentType::from_name(&name),
        _ => ArgumentType::String,
    })
}

/// Reads an argument id, trimming surrounding whitespace.
fn trimmed_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let id = String::deserialize(deserializer)?;
    Ok(id.trim().to_string())
}

/// A declared, typed input slot of a template.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TemplateArgument {
    /// Unique id, also the name used in `<<arg.id>>` tokens
    #[serde(deserialize_with = "trimmed_id")]
    pub id: String,

    /// Optional human-readable label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Declared value type
    #[serde(rename = "type", default, deserialize_with = "lenient_type")]
    pub arg_type: ArgumentType,

    /// Whether a value must be supplied
    #[serde(default)]
    pub required: bool,

    /// Value used when the user leaves the field empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<InputValue>,
}

impl TemplateArgument {
    /// Creates an optional `STRING` argument with no label or default.
    ///
    /// # Example
    ///
    /// ```
    /// use flowprint::blueprint::{ArgumentType, InputValue, TemplateArgument};
    ///
    /// let arg = TemplateArgument::new("retries")
    ///     .with_type(ArgumentType::Int)
    ///     .with_default(InputValue::Integer(3))
    ///     .required();
    /// assert_eq!(arg.label(), "retries");
    /// ```
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into().trim().to_string(),
            display_name: None,
            arg_type: ArgumentType::String,
            required: false,
            defaults: None,
        }
    }

    /// Sets the display name.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Sets the declared type.
    pub fn with_type(mut self, arg_type: ArgumentType) -> Self {
        self.arg_type = arg_type;
        self
    }

    /// Sets the default value.
    pub fn with_default(mut self, value: impl Into<InputValue>) -> Self {
        self.defaults = Some(value.into());
        self
    }

    /// Marks the argument as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Label used in error messages: the display name if set, else the id.
    pub fn label(&self) -> &str {
        match self.display_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => &self.id,
        }
    }

    /// Substitution token for this argument.
    pub fn token(&self) -> String {
        argument_token(&self.id)
    }
}

/// A raw value supplied by a user or declared as a default.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum InputValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl InputValue {
    /// True for text that is empty after trimming.
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Text(text) if text.trim().is_empty())
    }
}

impl From<&str> for InputValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for InputValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for InputValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for InputValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for InputValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for InputValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl fmt::Display for InputValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

/// A validated value, ready for substitution.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedValue {
    Text(String),
    Integer(i64),
    Boolean(bool),
    /// Optional argument left unset; substitutes as an empty string
    Empty,
}

impl fmt::Display for ResolvedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{}", s),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Empty => Ok(()),
        }
    }
}

/// Field-level validation errors, keyed by field id.
///
/// Keys are `flowId`, `namespace`, or an argument id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: BTreeMap<String, String>,
}

impl FieldErrors {
    /// Creates an empty error set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error against a field, replacing any earlier one.
    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.insert(field.into(), message.into());
    }

    /// Returns the message recorded for a field.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    /// Returns true if the field has an error.
    pub fn contains(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    /// Iterates over `(field, message)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the number of fields with errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns true if no errors were recorded.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Consumes the set, returning the underlying map.
    pub fn into_map(self) -> BTreeMap<String, String> {
        self.errors
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let details: Vec<String> = self
            .iter()
            .map(|(field, message)| format!("{}: {}", field, message))
            .collect();
        write!(
            f,
            "{} field(s) failed validation: {}",
            self.len(),
            details.join("; ")
        )
    }
}

impl std::error::Error for FieldErrors {}
