/// The fixed validation-support declaration set emitted once per output
/// directory: the outcome marker type, the reason-code enum, the error
/// record with its static message-template constructors, and the two
/// path-prefixing helpers. Generated types import from this module.

pub fn support_file_name() -> &'static str {
    "validation.rs"
}

pub fn emit_support(package: &str) -> String {
    format!(
        "//! Validation support declarations for package `{package}`; do not edit.\n\n{SUPPORT_BODY}"
    )
}

const SUPPORT_BODY: &str = r#"/// Closed enumeration of violated-constraint kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationReason {
    Required,
    StringLength,
    StringPattern,
    NumberLimit,
}

/// One flattened, path-qualified validation failure.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub field: String,
    pub reason: ValidationReason,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &str, reason: ValidationReason, message: String) -> Self {
        ValidationError {
            field: field.to_string(),
            reason,
            message,
        }
    }

    pub fn message_for_required() -> String {
        "Required field is missing".to_string()
    }

    pub fn message_for_string_max(max: u64) -> String {
        format!("Character length must be less than or equal to {max}")
    }

    pub fn message_for_string_min(min: u64) -> String {
        format!("Character length must be greater than or equal to {min}")
    }

    pub fn message_for_string_pattern(pattern: &str) -> String {
        format!("String must match pattern: {pattern}")
    }

    pub fn message_for_minimum(min: &str) -> String {
        format!("Value must be greater than {min}")
    }

    pub fn message_for_maximum(max: &str) -> String {
        format!("Value must be less than {max}")
    }

    pub fn message_for_exclusive_minimum(min: &str) -> String {
        format!("Value must be greater than or equal to {min}")
    }

    pub fn message_for_exclusive_maximum(max: &str) -> String {
        format!("Value must be less than or equal to {max}")
    }
}

/// Composite validation outcome; Invalid is ordinary data.
#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    Valid,
    Invalid {
        name: String,
        errors: Vec<ValidationError>,
    },
}

impl Validation {
    pub fn from_errors(name: &str, errors: Vec<ValidationError>) -> Validation {
        if errors.is_empty() {
            Validation::Valid
        } else {
            Validation::Invalid {
                name: name.to_string(),
                errors,
            }
        }
    }

    /// Nested errors re-rooted under a parent field name.
    pub fn as_children_of(self, parent: &str) -> Vec<ValidationError> {
        match self {
            Validation::Valid => vec![],
            Validation::Invalid { errors, .. } => as_children_of(errors, parent),
        }
    }
}

/// Dot-prefix every error path with a parent field name.
pub fn as_children_of(errors: Vec<ValidationError>, parent: &str) -> Vec<ValidationError> {
    errors
        .into_iter()
        .map(|e| ValidationError {
            field: format!("{parent}.{}", e.field),
            ..e
        })
        .collect()
}

pub fn matches_pattern(value: &str, pattern: &str) -> bool {
    regex::Regex::new(pattern)
        .map(|re| re.is_match(value))
        .unwrap_or(false)
}
"#;
