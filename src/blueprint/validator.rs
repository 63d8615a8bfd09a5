//! Blueprint Input Validation
//!
//! Checks the flow id, the namespace, and every template argument's value
//! before anything is substituted. Validation is exhaustive: all problems are
//! collected into one [`FieldErrors`] so a form can show them together.

use std::collections::HashMap;

use log::{debug, info, warn};

use super::model::{
    ArgumentType, FieldErrors, InputValue, ResolvedValue, TemplateArgument, FLOW_ID_FIELD,
    NAMESPACE_FIELD, REQUIRED_MESSAGE,
};

/// Values that passed validation, ready for substitution.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedInputs {
    /// Trimmed flow id
    pub flow_id: String,

    /// Trimmed namespace
    pub namespace: String,

    /// `(argument id, value)` pairs in declaration order
    pub values: Vec<(String, ResolvedValue)>,
}

impl ValidatedInputs {
    /// Returns the validated value of an argument.
    pub fn value(&self, id: &str) -> Option<&ResolvedValue> {
        self.values
            .iter()
            .find(|(arg_id, _)| arg_id == id)
            .map(|(_, value)| value)
    }
}

/// Validates a resolution request.
///
/// # Arguments
///
/// * `flow_id` - Flow id; must be non-empty after trimming
/// * `namespace` - Namespace; must be non-empty after trimming
/// * `arguments` - Declared template arguments
/// * `inputs` - User-supplied values keyed by argument id
///
/// # Returns
///
/// * `Ok(ValidatedInputs)` - Every field is valid
/// * `Err(FieldErrors)` - One message per invalid field
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use flowprint::blueprint::{validate_inputs, ArgumentType, InputValue, TemplateArgument};
///
/// let args = vec![TemplateArgument::new("count").with_type(ArgumentType::Int).required()];
/// let mut inputs = HashMap::new();
/// inputs.insert("count".to_string(), InputValue::from("abc"));
///
/// let errors = validate_inputs("", "company.team", &args, &inputs).unwrap_err();
/// assert_eq!(errors.get("flowId"), Some("This field is required"));
/// assert_eq!(errors.get("count"), Some("count must be an integer"));
/// ```
pub fn validate_inputs(
    flow_id: &str,
    namespace: &str,
    arguments: &[TemplateArgument],
    inputs: &HashMap<String, InputValue>,
) -> Result<ValidatedInputs, FieldErrors> {
    info!("Validating blueprint inputs for {} arguments", arguments.len());

    let mut errors = FieldErrors::new();

    let flow_id = flow_id.trim();
    if flow_id.is_empty() {
        errors.insert(FLOW_ID_FIELD, REQUIRED_MESSAGE);
    }

    let namespace = namespace.trim();
    if namespace.is_empty() {
        errors.insert(NAMESPACE_FIELD, REQUIRED_MESSAGE);
    }

    let mut values = Vec::with_capacity(arguments.len());
    for argument in arguments {
        match validate_argument(argument, inputs) {
            Ok(value) => {
                debug!("Argument '{}' resolved to {:?}", argument.id, value);
                values.push((argument.id.clone(), value));
            }
            Err(message) => {
                debug!("Argument '{}' rejected: {}", argument.id, message);
                if errors.contains(&argument.id) {
                    warn!(
                        "Argument '{}' shares its id with a header field, keeping the header error",
                        argument.id
                    );
                } else {
                    errors.insert(argument.id.clone(), message);
                }
            }
        }
    }

    if !errors.is_empty() {
        info!("Blueprint validation failed for {} field(s)", errors.len());
        return Err(errors);
    }

    Ok(ValidatedInputs {
        flow_id: flow_id.to_string(),
        namespace: namespace.to_string(),
        values,
    })
}

/// Validates a single argument against its user input or default.
///
/// Returns the error message for the field on failure.
pub fn validate_argument(
    argument: &TemplateArgument,
    inputs: &HashMap<String, InputValue>,
) -> Result<ResolvedValue, String> {
    let Some(value) = effective_value(argument, inputs) else {
        if argument.required {
            return Err(REQUIRED_MESSAGE.to_string());
        }
        return Ok(ResolvedValue::Empty);
    };

    match argument.arg_type {
        ArgumentType::String => Ok(ResolvedValue::Text(match value {
            InputValue::Text(text) => text.trim().to_string(),
            other => other.to_string(),
        })),
        ArgumentType::Int => parse_integer(value)
            .map(ResolvedValue::Integer)
            .ok_or_else(|| format!("{} must be an integer", argument.label())),
        ArgumentType::Bool => parse_boolean(value)
            .map(ResolvedValue::Boolean)
            .ok_or_else(|| format!("{} must be true or false", argument.label())),
    }
}

/// User input when present and non-blank, else the declared default.
fn effective_value<'a>(
    argument: &'a TemplateArgument,
    inputs: &'a HashMap<String, InputValue>,
) -> Option<&'a InputValue> {
    inputs
        .get(&argument.id)
        .filter(|value| !value.is_blank())
        .or_else(|| argument.defaults.as_ref().filter(|value| !value.is_blank()))
}

/// Interprets a value as a whole number.
///
/// Accepts integers, floats without a fractional part, and text holding
/// either of those.
pub fn parse_integer(value: &InputValue) -> Option<i64> {
    match value {
        InputValue::Integer(i) => Some(*i),
        InputValue::Float(x) => whole_number(*x),
        InputValue::Text(text) => {
            let text = text.trim();
            text.parse::<i64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().and_then(whole_number))
        }
        InputValue::Boolean(_) => None,
    }
}

/// Interprets a value as a boolean: `true`/`false` in any letter case.
pub fn parse_boolean(value: &InputValue) -> Option<bool> {
    match value {
        InputValue::Boolean(b) => Some(*b),
        InputValue::Text(text) => {
            let text = text.trim();
            if text.eq_ignore_ascii_case("true") {
                Some(true)
            } else if text.eq_ignore_ascii_case("false") {
                Some(false)
            } else {
                None
            }
        }
        InputValue::Integer(_) | InputValue::Float(_) => None,
    }
}

fn whole_number(x: f64) -> Option<i64> {
    if x.is_finite() && x.fract() == 0.0 && x >= i64::MIN as f64 && x < i64::MAX as f64 {
        Some(x as i64)
    } else {
        None
    }
}
