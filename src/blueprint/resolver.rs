//! Blueprint Resolution
//!
//! Turns a template plus user input into a ready-to-save flow definition:
//! 1. Validate the flow id, namespace and every argument value
//! 2. Substitute `<<flow_id>>`, `<<namespace>>` and `<<arg.NAME>>` tokens
//! 3. Normalize the output (strip template metadata, fix the header)

use std::collections::HashMap;

use log::{debug, info};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::arguments::extract_template_arguments;
use super::model::{FieldErrors, InputValue, TemplateArgument, FLOW_ID_TOKEN, NAMESPACE_TOKEN};
use super::normalize::normalize_output;
use super::validator::{validate_inputs, ValidatedInputs};

/// Matches `<<flow_id>>`, `<<namespace>>` and `<<arg.NAME>>` in one pattern.
static TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<<(?:flow_id|namespace|arg\.([A-Za-z0-9_-]+))>>").unwrap()
});

/// Resolves a blueprint template into final output text.
///
/// Nothing is substituted unless every field validates; on failure the
/// returned [`FieldErrors`] lists each invalid field.
///
/// # Arguments
///
/// * `template` - Template text with placeholder tokens
/// * `flow_id` - Flow id of the resulting definition
/// * `namespace` - Namespace of the resulting definition
/// * `arguments` - Declared template arguments, usually from
///   [`extract_template_arguments`]
/// * `inputs` - User-supplied values keyed by argument id
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use flowprint::blueprint::{extract_template_arguments, resolve_blueprint, InputValue};
///
/// let template = "id: <<flow_id>>\nnamespace: <<namespace>>\nmessage: Hi <<arg.name>>\n";
/// let arguments = extract_template_arguments(template);
///
/// let mut inputs = HashMap::new();
/// inputs.insert("name".to_string(), InputValue::from("Ada"));
///
/// let output = resolve_blueprint(template, "greet", "demo", &arguments, &inputs).unwrap();
/// assert_eq!(output, "id: greet\nnamespace: demo\nmessage: Hi Ada\n");
/// ```
pub fn resolve_blueprint(
    template: &str,
    flow_id: &str,
    namespace: &str,
    arguments: &[TemplateArgument],
    inputs: &HashMap<String, InputValue>,
) -> Result<String, FieldErrors> {
    let validated = validate_inputs(flow_id, namespace, arguments, inputs)?;

    let substituted = substitute_tokens(template, &validated);
    let output = normalize_output(&substituted, &validated.flow_id, &validated.namespace);

    info!(
        "Resolved blueprint into flow '{}.{}' ({} bytes)",
        validated.namespace,
        validated.flow_id,
        output.len()
    );
    Ok(output)
}

/// Replaces every token with its validated value.
///
/// Substitution is a single pass over the template, so token text inside a
/// substituted value is kept literally. Tokens of undeclared arguments are
/// left in place.
pub fn substitute_tokens(template: &str, validated: &ValidatedInputs) -> String {
    TOKEN
        .replace_all(template, |caps: &Captures| {
            let token = &caps[0];
            match caps.get(1) {
                Some(id) => match validated.value(id.as_str()) {
                    Some(value) => {
                        debug!("Substituting {}", token);
                        value.to_string()
                    }
                    None => token.to_string(),
                },
                None if token == FLOW_ID_TOKEN => validated.flow_id.clone(),
                None if token == NAMESPACE_TOKEN => validated.namespace.clone(),
                None => token.to_string(),
            }
        })
        .into_owned()
}

/// A template together with the arguments it declares.
#[derive(Debug, Clone, PartialEq)]
pub struct Blueprint {
    template: String,
    arguments: Vec<TemplateArgument>,
}

impl Blueprint {
    /// Creates a blueprint, extracting its arguments from the text.
    ///
    /// # Example
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use flowprint::blueprint::Blueprint;
    ///
    /// let blueprint = Blueprint::new("id: <<flow_id>>\nnamespace: <<namespace>>\n");
    /// assert!(blueprint.arguments().is_empty());
    ///
    /// let output = blueprint.resolve("hello", "demo", &HashMap::new()).unwrap();
    /// assert_eq!(output, "id: hello\nnamespace: demo\n");
    /// ```
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let arguments = extract_template_arguments(&template);
        Self {
            template,
            arguments,
        }
    }

    /// Creates a blueprint with an explicit argument list.
    pub fn with_arguments(template: impl Into<String>, arguments: Vec<TemplateArgument>) -> Self {
        Self {
            template: template.into(),
            arguments,
        }
    }

    /// Raw template text.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Declared arguments, in declaration order.
    pub fn arguments(&self) -> &[TemplateArgument] {
        &self.arguments
    }

    /// Looks up an argument by id.
    pub fn argument(&self, id: &str) -> Option<&TemplateArgument> {
        self.arguments.iter().find(|a| a.id == id)
    }

    /// Resolves the template. See [`resolve_blueprint`].
    pub fn resolve(
        &self,
        flow_id: &str,
        namespace: &str,
        inputs: &HashMap<String, InputValue>,
    ) -> Result<String, FieldErrors> {
        resolve_blueprint(&self.template, flow_id, namespace, &self.arguments, inputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::model::{ArgumentType, ResolvedValue, FLOW_ID_FIELD, REQUIRED_MESSAGE};
    use serde_yaml::Value;

    const NOTIFY_TEMPLATE: &str = r#"id: <<flow_id>>
namespace: <<namespace>>
description: Send reminders
tasks:
  - id: notify
    type: io.kestra.plugin.core.log.Log
    message: "Reminding <<arg.recipient>> <<arg.retries>> times (urgent: <<arg.urgent>>)"
extend:
  templateArguments:
    - id: recipient
      type: STRING
      required: true
    - id: retries
      displayName: Retry Count
      type: INT
      required: true
    - id: urgent
      type: BOOL
      defaults: false
"#;

    fn inputs(pairs: &[(&str, &str)]) -> HashMap<String, InputValue> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), InputValue::from(*v)))
            .collect()
    }

    fn resolve(template: &str, flow_id: &str, namespace: &str, pairs: &[(&str, &str)]) -> Result<String, FieldErrors> {
        let arguments = extract_template_arguments(template);
        resolve_blueprint(template, flow_id, namespace, &arguments, &inputs(pairs))
    }

    fn parse(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn test_empty_flow_id_always_fails() {
        let errors = resolve(
            NOTIFY_TEMPLATE,
            "",
            "company.team",
            &[("recipient", "ops"), ("retries", "2")],
        )
        .unwrap_err();

        assert_eq!(errors.get(FLOW_ID_FIELD), Some(REQUIRED_MESSAGE));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_integer_argument() {
        let template = "Run <<arg.count>> times";
        let arguments = vec![TemplateArgument::new("count")
            .with_type(ArgumentType::Int)
            .required()];

        let errors = resolve_blueprint(template, "f", "n", &arguments, &inputs(&[("count", "abc")]))
            .unwrap_err();
        assert!(errors.get("count").unwrap().contains("must be an integer"));

        let output =
            resolve_blueprint(template, "f", "n", &arguments, &inputs(&[("count", "42")])).unwrap();
        assert!(output.contains("Run 42 times"));
    }

    #[test]
    fn test_boolean_argument_any_case() {
        let template = "enabled: <<arg.flag>>\n";
        let arguments = vec![TemplateArgument::new("flag").with_type(ArgumentType::Bool)];

        let output =
            resolve_blueprint(template, "f", "n", &arguments, &inputs(&[("flag", "TRUE")])).unwrap();
        assert_eq!(parse(&output).get("enabled"), Some(&Value::Bool(true)));
        assert!(output.contains("enabled: true"));
    }

    #[test]
    fn test_no_substitution_on_failure() {
        let errors = resolve(NOTIFY_TEMPLATE, "f", "n", &[("retries", "x")]).unwrap_err();

        assert_eq!(errors.get("recipient"), Some(REQUIRED_MESSAGE));
        assert_eq!(errors.get("retries"), Some("Retry Count must be an integer"));
        assert!(!errors.contains("urgent"));
    }

    #[test]
    fn test_metadata_stripped_and_keys_preserved() {
        let output = resolve(
            NOTIFY_TEMPLATE,
            "reminders",
            "company.team",
            &[("recipient", " ops "), ("retries", "3")],
        )
        .unwrap();

        let original = parse(NOTIFY_TEMPLATE);
        let resolved = parse(&output);

        assert!(resolved.get("extend").is_none());
        assert_eq!(resolved.get("description"), original.get("description"));
        assert_eq!(resolved.get("id"), Some(&Value::String("reminders".to_string())));
        assert_eq!(
            resolved.get("namespace"),
            Some(&Value::String("company.team".to_string()))
        );

        let message = resolved["tasks"][0]["message"].as_str().unwrap();
        assert_eq!(message, "Reminding ops 3 times (urgent: false)");
    }

    #[test]
    fn test_header_forced_over_stale_values() {
        let template = "id: old-flow\nnamespace: old.ns\ntasks: []\n";
        let output = resolve(template, "  new-flow ", " new.ns ", &[]).unwrap();
        let resolved = parse(&output);

        assert_eq!(resolved["id"].as_str(), Some("new-flow"));
        assert_eq!(resolved["namespace"].as_str(), Some("new.ns"));
    }

    #[test]
    fn test_header_inserted_when_missing() {
        let output = resolve("tasks: []\n", "flow", "ns", &[]).unwrap();
        assert_eq!(output, "id: flow\nnamespace: ns\ntasks: []\n");
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let pairs = [("recipient", "ops"), ("retries", "3")];
        let once = resolve(NOTIFY_TEMPLATE, "reminders", "company.team", &pairs).unwrap();
        let twice = resolve(&once, "reminders", "company.team", &[]).unwrap();

        assert_eq!(once, twice);
    }

    #[test]
    fn test_plain_text_template_uses_textual_header() {
        let output = resolve("Hello <<arg.recipient>>!", "greet", "demo", &[("recipient", "Bob")])
            .unwrap();

        assert_eq!(output, "id: greet\nnamespace: demo\nHello Bob!");

        let again = resolve(&output, "greet", "demo", &[]).unwrap();
        assert_eq!(again, output);
    }

    #[test]
    fn test_optional_argument_substitutes_empty() {
        let template = "note: '[<<arg.suffix>>]'\n";
        let arguments = vec![TemplateArgument::new("suffix")];

        let output = resolve_blueprint(template, "f", "n", &arguments, &HashMap::new()).unwrap();
        assert_eq!(parse(&output)["note"].as_str(), Some("[]"));
    }

    #[test]
    fn test_undeclared_tokens_left_in_place() {
        let template = "a: <<arg.known>>\nb: <<arg.unknown>>\n";
        let arguments = vec![TemplateArgument::new("known").required()];

        let output =
            resolve_blueprint(template, "f", "n", &arguments, &inputs(&[("known", "v")])).unwrap();
        assert!(output.contains("<<arg.unknown>>"));
    }

    #[test]
    fn test_header_tokens_in_values_kept_literally() {
        let template =
            "id: <<flow_id>>\nnamespace: <<namespace>>\nmsg: 'flow <<flow_id>> in <<namespace>>'\n";
        let output = resolve(template, "<<namespace>>", "prod", &[]).unwrap();
        let resolved = parse(&output);

        assert_eq!(resolved["msg"].as_str(), Some("flow <<namespace>> in prod"));
        assert_eq!(resolved["id"].as_str(), Some("<<namespace>>"));
    }

    #[test]
    fn test_argument_tokens_in_values_kept_literally() {
        let template = "a: <<arg.a>>\nb: <<arg.b>>\n";
        let arguments = vec![TemplateArgument::new("a"), TemplateArgument::new("b")];

        let output = resolve_blueprint(
            template,
            "f",
            "n",
            &arguments,
            &inputs(&[("a", "<<arg.b>>"), ("b", "X")]),
        )
        .unwrap();
        let resolved = parse(&output);

        assert_eq!(resolved["a"].as_str(), Some("<<arg.b>>"));
        assert_eq!(resolved["b"].as_str(), Some("X"));
    }

    #[test]
    fn test_substitute_tokens_single_pass() {
        let validated = ValidatedInputs {
            flow_id: "<<arg.x>>".to_string(),
            namespace: "ns".to_string(),
            values: vec![
                ("x".to_string(), ResolvedValue::Text("<<flow_id>>".to_string())),
                ("n".to_string(), ResolvedValue::Integer(7)),
            ],
        };

        let output = substitute_tokens("<<flow_id>>|<<arg.x>>|<<arg.n>>|<<namespace>>|<<arg.y>>", &validated);
        assert_eq!(output, "<<arg.x>>|<<flow_id>>|7|ns|<<arg.y>>");
    }

    #[test]
    fn test_value_breaking_yaml_keeps_metadata() {
        let template =
            "message: Hello <<arg.who>>\nextend:\n  templateArguments:\n    - id: who\n      required: true\n";

        let output = resolve(template, "f", "n", &[("who", "team: ops")]).unwrap();

        assert_eq!(
            output,
            "id: f\nnamespace: n\nmessage: Hello team: ops\nextend:\n  templateArguments:\n    - id: who\n      required: true\n"
        );
    }

    #[test]
    fn test_blueprint_wrapper() {
        let blueprint = Blueprint::new(NOTIFY_TEMPLATE);

        assert_eq!(blueprint.arguments().len(), 3);
        assert_eq!(
            blueprint.argument("retries").map(|a| a.arg_type),
            Some(ArgumentType::Int)
        );
        assert!(blueprint.argument("missing").is_none());

        let output = blueprint
            .resolve("f", "n", &inputs(&[("recipient", "a"), ("retries", "1"), ("urgent", "False")]))
            .unwrap();
        assert!(output.contains("urgent: false"));
    }

    #[test]
    fn test_blueprint_with_explicit_arguments() {
        let blueprint = Blueprint::with_arguments(
            "size: <<arg.size>>\n",
            vec![TemplateArgument::new("size")
                .with_type(ArgumentType::Int)
                .with_default(InputValue::Integer(10))],
        );

        assert_eq!(blueprint.template(), "size: <<arg.size>>\n");
        let output = blueprint.resolve("f", "n", &HashMap::new()).unwrap();
        assert_eq!(parse(&output)["size"].as_i64(), Some(10));
    }
}
