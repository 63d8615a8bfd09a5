//! Template Argument Extraction
//!
//! Discovers the arguments a template expects:
//! - Reads an explicit `extend.templateArguments` declaration when the
//!   template is YAML and carries one
//! - Otherwise scans the text for `<<arg.NAME>>` tokens

use std::collections::HashSet;

use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_yaml::Value;

use super::model::{
    is_reserved_id, ArgumentType, TemplateArgument, EXTEND_KEY, TEMPLATE_ARGUMENTS_KEY,
};

/// Matches `<<arg.NAME>>` where NAME is letters, digits, `-` or `_`.
static ARGUMENT_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<<arg\.([A-Za-z0-9_-]+)>>").unwrap());

/// Extracts the ordered, de-duplicated argument list of a template.
///
/// A declared `extend.templateArguments` block is authoritative. Without one
/// (or when the template is not valid YAML) every distinct `<<arg.NAME>>`
/// token becomes a required `STRING` argument, in order of first appearance.
///
/// # Example
///
/// ```
/// use flowprint::blueprint::{extract_template_arguments, ArgumentType};
///
/// let args = extract_template_arguments("message: Hello <<arg.first_name>>!");
/// assert_eq!(args.len(), 1);
/// assert_eq!(args[0].id, "first_name");
/// assert_eq!(args[0].display_name.as_deref(), Some("First Name"));
/// assert_eq!(args[0].arg_type, ArgumentType::String);
/// assert!(args[0].required);
/// ```
pub fn extract_template_arguments(template: &str) -> Vec<TemplateArgument> {
    if template.trim().is_empty() {
        return Vec::new();
    }

    if let Some(declared) = declared_arguments(template) {
        info!("Using {} declared template arguments", declared.len());
        return declared;
    }

    let scanned = scan_argument_tokens(template);
    info!("Found {} template arguments by token scan", scanned.len());
    scanned
}

/// Reads the `extend.templateArguments` sequence, if the template has one.
///
/// Returns `None` when the template is not a YAML mapping or has no such
/// sequence. Entries without a usable `id` are skipped, as are the ids
/// `flowId` and `namespace`; repeated ids keep their first entry.
pub fn declared_arguments(template: &str) -> Option<Vec<TemplateArgument>> {
    let document: Value = match serde_yaml::from_str(template) {
        Ok(value) => value,
        Err(e) => {
            debug!("Template is not valid YAML, scanning tokens instead: {}", e);
            return None;
        }
    };

    let entries = document
        .get(EXTEND_KEY)
        .and_then(|extend| extend.get(TEMPLATE_ARGUMENTS_KEY))
        .and_then(Value::as_sequence)?;

    let mut seen = HashSet::new();
    let mut arguments = Vec::new();

    for (index, entry) in entries.iter().enumerate() {
        let argument: TemplateArgument = match serde_yaml::from_value(entry.clone()) {
            Ok(argument) => argument,
            Err(e) => {
                debug!("Skipping template argument #{}: {}", index, e);
                continue;
            }
        };

        if argument.id.is_empty() {
            debug!("Skipping template argument #{}: empty id", index);
            continue;
        }

        if is_reserved_id(&argument.id) {
            warn!(
                "Skipping template argument '{}': the id is reserved for the flow header",
                argument.id
            );
            continue;
        }

        if !seen.insert(argument.id.clone()) {
            debug!("Skipping duplicate template argument '{}'", argument.id);
            continue;
        }

        arguments.push(argument);
    }

    Some(arguments)
}

/// Collects `<<arg.NAME>>` tokens in order of first appearance.
pub fn scan_argument_tokens(template: &str) -> Vec<TemplateArgument> {
    let mut seen = HashSet::new();

    ARGUMENT_TOKEN
        .captures_iter(template)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .filter(|id| seen.insert(id.to_string()))
        .filter(|id| {
            if is_reserved_id(id) {
                warn!("Ignoring <<arg.{}>>: the id is reserved for the flow header", id);
                return false;
            }
            true
        })
        .map(|id| TemplateArgument {
            id: id.to_string(),
            display_name: Some(display_name_for(id)),
            arg_type: ArgumentType::String,
            required: true,
            defaults: None,
        })
        .collect()
}

/// Derives a label from an argument id.
///
/// `-` and `_` become spaces and the first letter of each word is
/// capitalized.
///
/// # Example
///
/// ```
/// use flowprint::blueprint::arguments::display_name_for;
///
/// assert_eq!(display_name_for("max-retry_count"), "Max Retry Count");
/// ```
pub fn display_name_for(id: &str) -> String {
    let mut label = String::with_capacity(id.len());
    let mut word_start = true;

    for ch in id.chars() {
        match ch {
            '-' | '_' | ' ' => {
                label.push(' ');
                word_start = true;
            }
            _ if word_start => {
                label.extend(ch.to_uppercase());
                word_start = false;
            }
            _ => label.push(ch),
        }
    }

    label
}
