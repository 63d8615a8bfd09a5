//! Resolved Output Normalization
//!
//! After substitution the output is made self-consistent:
//! - The authoring-only `extend.templateArguments` block is removed
//! - Top-level `id` and `namespace` are forced to the resolved values
//!
//! Two strategies are used. [`normalize_structured`] works on the parsed
//! YAML mapping; when the text is not a YAML mapping, [`normalize_textual`]
//! rewrites the `id:` and `namespace:` lines directly. The textual strategy
//! only fixes the header and leaves any `extend.templateArguments` block in
//! the output.

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};
use serde_yaml::{Mapping, Value};
use thiserror::Error;

use super::model::{EXTEND_KEY, TEMPLATE_ARGUMENTS_KEY};

const ID_KEY: &str = "id";
const NAMESPACE_KEY: &str = "namespace";

static ID_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^id:[^\r\n]*").unwrap());

static NAMESPACE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^namespace:[^\r\n]*").unwrap());

/// Reasons the structured strategy cannot handle a text.
#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("output is not valid YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("output is not a YAML mapping")]
    NotAMapping,
}

/// Normalizes resolved output, falling back to line edits when needed.
///
/// # Example
///
/// ```
/// use flowprint::blueprint::normalize::normalize_output;
///
/// let output = normalize_output("id: stale\ntasks: []\n", "fresh", "company.team");
/// assert_eq!(output, "id: fresh\nnamespace: company.team\ntasks: []\n");
/// ```
pub fn normalize_output(text: &str, flow_id: &str, namespace: &str) -> String {
    match normalize_structured(text, flow_id, namespace) {
        Ok(output) => output,
        Err(NormalizeError::Parse(e)) => {
            warn!(
                "Resolved output is not valid YAML, fixing header lines as text; \
                 template argument declarations are left in place: {}",
                e
            );
            normalize_textual(text, flow_id, namespace)
        }
        Err(NormalizeError::NotAMapping) => {
            debug!("Resolved output is not a YAML mapping, fixing header lines as text");
            normalize_textual(text, flow_id, namespace)
        }
    }
}

/// Normalizes a YAML mapping document.
///
/// The text is returned unchanged when it carries no template metadata and
/// its header already matches; otherwise the mapping is re-serialized.
pub fn normalize_structured(
    text: &str,
    flow_id: &str,
    namespace: &str,
) -> Result<String, NormalizeError> {
    let document: Value = serde_yaml::from_str(text)?;
    let Value::Mapping(mut mapping) = document else {
        return Err(NormalizeError::NotAMapping);
    };

    let stripped = strip_template_metadata(&mut mapping);
    let header_changed = apply_header(&mut mapping, flow_id, namespace);

    if !stripped && !header_changed {
        debug!("Resolved output already normalized");
        return Ok(text.to_string());
    }

    Ok(serde_yaml::to_string(&Value::Mapping(mapping))?)
}

/// Rewrites the first top-level `id:` and `namespace:` lines.
///
/// A missing `id:` line is prepended; a missing `namespace:` line is placed
/// right after the `id:` line.
///
/// # Example
///
/// ```
/// use flowprint::blueprint::normalize::normalize_textual;
///
/// let output = normalize_textual("Hello Bob!", "greet", "demo");
/// assert_eq!(output, "id: greet\nnamespace: demo\nHello Bob!");
/// ```
pub fn normalize_textual(text: &str, flow_id: &str, namespace: &str) -> String {
    let id_line = format!("id: {}", flow_id);
    let namespace_line = format!("namespace: {}", namespace);

    let text = if ID_LINE.is_match(text) {
        ID_LINE.replace(text, NoExpand(&id_line)).into_owned()
    } else if text.is_empty() {
        format!("{}\n", id_line)
    } else {
        format!("{}\n{}", id_line, text)
    };

    if NAMESPACE_LINE.is_match(&text) {
        NAMESPACE_LINE
            .replace(&text, NoExpand(&namespace_line))
            .into_owned()
    } else {
        let header = format!("{}\n{}", id_line, namespace_line);
        ID_LINE.replace(&text, NoExpand(&header)).into_owned()
    }
}

/// Removes `extend.templateArguments`, and `extend` itself if that leaves it
/// empty. Returns true if anything was removed.
pub fn strip_template_metadata(mapping: &mut Mapping) -> bool {
    let remaining: Mapping = match mapping.get(EXTEND_KEY) {
        Some(Value::Mapping(extend)) if extend.contains_key(TEMPLATE_ARGUMENTS_KEY) => extend
            .iter()
            .filter(|(key, _)| key.as_str() != Some(TEMPLATE_ARGUMENTS_KEY))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
        _ => return false,
    };

    let mut remaining = Some(remaining);
    *mapping = std::mem::take(mapping)
        .into_iter()
        .filter_map(|(key, value)| {
            if key.as_str() != Some(EXTEND_KEY) {
                return Some((key, value));
            }
            remaining
                .take()
                .filter(|extend| !extend.is_empty())
                .map(|extend| (key, Value::Mapping(extend)))
        })
        .collect();

    debug!("Stripped template argument declarations from output");
    true
}

/// Forces top-level `id` and `namespace`. Keys already present keep their
/// position; a missing `id` goes first and a missing `namespace` follows
/// `id`. Returns true if the mapping changed.
pub fn apply_header(mapping: &mut Mapping, flow_id: &str, namespace: &str) -> bool {
    let id_value = Value::String(flow_id.to_string());
    let namespace_value = Value::String(namespace.to_string());

    if mapping.get(ID_KEY) == Some(&id_value) && mapping.get(NAMESPACE_KEY) == Some(&namespace_value)
    {
        return false;
    }

    let id_key = Value::String(ID_KEY.to_string());
    let namespace_key = Value::String(NAMESPACE_KEY.to_string());
    let has_id = mapping.contains_key(ID_KEY);
    let has_namespace = mapping.contains_key(NAMESPACE_KEY);

    let mut header = Mapping::new();
    if !has_id {
        header.insert(id_key.clone(), id_value.clone());
        if !has_namespace {
            header.insert(namespace_key.clone(), namespace_value.clone());
        }
    }

    for (key, value) in std::mem::take(mapping) {
        match key.as_str() {
            Some(ID_KEY) => {
                header.insert(key, id_value.clone());
                if !has_namespace {
                    header.insert(namespace_key.clone(), namespace_value.clone());
                }
            }
            Some(NAMESPACE_KEY) => {
                header.insert(key, namespace_value.clone());
            }
            _ => {
                header.insert(key, value);
            }
        }
    }

    *mapping = header;
    true
}
