//! A single macro record and its validation rules.

use serde::{Deserialize, Serialize};
use tangelo_types::error::{Result, TangeloError};

/// Template length ceiling, in characters.
pub const MAX_OUTPUT_LEN: usize = 500;

/// Description length ceiling, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 150;

/// Description stored when the author left the field blank.
pub const DEFAULT_DESCRIPTION: &str = "No description.";

fn registry_err(msg: impl Into<String>) -> TangeloError {
    TangeloError::Registry(msg.into())
}

/// Inclusive range for the `<random_number>` placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberRange {
    pub min: i64,
    pub max: i64,
}

impl NumberRange {
    pub fn new(min: i64, max: i64) -> Result<Self> {
        if min >= max {
            return Err(registry_err(format!(
                "random number range requires min < max (got {min}..{max})"
            )));
        }
        Ok(NumberRange { min, max })
    }
}

/// One stored macro. Names are stored lowercase; optional fields are left
/// out of the serialized document entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandRecord {
    pub name: String,
    pub output: String,
    pub description: String,
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub random_number: Option<NumberRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub random_choice: Option<Vec<String>>,
}

impl CommandRecord {
    /// Argument names this record's template requires, in positional order.
    pub fn required_args(&self) -> Vec<String> {
        tangelo_template::required_args(&self.output)
    }
}

/// Author-supplied fields for a new record.
#[derive(Debug, Clone)]
pub struct CommandDraft {
    pub name: String,
    pub output: String,
    pub description: Option<String>,
    pub random_number: Option<NumberRange>,
    pub random_choice: Option<Vec<String>>,
}

impl CommandDraft {
    pub fn new(name: &str, output: &str) -> Self {
        CommandDraft {
            name: name.to_string(),
            output: output.to_string(),
            description: None,
            random_number: None,
            random_choice: None,
        }
    }
}

/// Replacement fields for an edit. Everything but the name is replaced
/// wholesale, matching the edit-form behavior.
#[derive(Debug, Clone)]
pub struct CommandUpdate {
    pub output: String,
    pub description: Option<String>,
    pub random_number: Option<NumberRange>,
    pub random_choice: Option<Vec<String>>,
}

/// Lowercase and validate a record name: non-empty, ASCII alphanumeric.
pub fn normalize_name(raw: &str) -> Result<String> {
    let name = raw.trim().to_lowercase();
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(registry_err(format!(
            "command name must be alphanumeric: '{raw}'"
        )));
    }
    Ok(name)
}

pub(crate) fn validate_output(output: &str) -> Result<()> {
    let len = output.chars().count();
    if len > MAX_OUTPUT_LEN {
        return Err(registry_err(format!(
            "command output is {len} characters; the limit is {MAX_OUTPUT_LEN}"
        )));
    }
    Ok(())
}

/// Validate and normalize a description. Blank input becomes the default.
pub(crate) fn validate_description(description: Option<String>) -> Result<String> {
    let description = description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());
    let len = description.chars().count();
    if len > MAX_DESCRIPTION_LEN {
        return Err(registry_err(format!(
            "description is {len} characters; the limit is {MAX_DESCRIPTION_LEN}"
        )));
    }
    Ok(description)
}

pub(crate) fn validate_choices(choices: &Option<Vec<String>>) -> Result<()> {
    if let Some(options) = choices
        && options.iter().all(|o| o.trim().is_empty())
    {
        return Err(registry_err(
            "random choice requires at least one non-empty option",
        ));
    }
    Ok(())
}

/// Split a comma-separated option list into trimmed, non-empty options.
pub fn parse_choice_options(raw: &str) -> Result<Vec<String>> {
    let options: Vec<String> = raw
        .split(',')
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect();
    if options.is_empty() {
        return Err(registry_err(
            "random choice requires at least one non-empty option",
        ));
    }
    Ok(options)
}
