/// Validation-rule compilation: derives per-field constraint rules from an
/// object schema and defines the composite outcome shared with generated
/// code. `validate_instance` is the executable form of those semantics over
/// `serde_json::Value` instances; generated validators must agree with it.
use std::cmp::Ordering;

use regex::Regex;
use serde_json::{Number, Value};

use crate::ast::{TypeDeclaration, TypePool};
use crate::schema::{Schema, TypeTag};

/// Structural misuse: rule compilation was invoked on a schema that is not
/// an object shape.
#[derive(Debug, thiserror::Error)]
#[error("validation rules require an object schema")]
pub struct NotAnObjectSchema;

/// Closed enumeration of violated-constraint kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReasonCode {
    Required,
    StringLength,
    StringPattern,
    NumberLimit,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::Required => "REQUIRED",
            ReasonCode::StringLength => "STRING_LENGTH",
            ReasonCode::StringPattern => "STRING_PATTERN",
            ReasonCode::NumberLimit => "NUMBER_LIMIT",
        }
    }
}

/// One derived constraint. Numeric comparators: `Minimum` is violated when
/// the value <= the bound and `Maximum` when the value >= the bound
/// (inclusive-at-equal), while the exclusive pair is violated strictly
/// beyond the bound.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    MaxLength(u64),
    MinLength(u64),
    Pattern(String),
    Minimum(Number),
    Maximum(Number),
    ExclusiveMinimum(Number),
    ExclusiveMaximum(Number),
    /// Delegate to a declared type, dot-prefixing nested error paths.
    Nested(String),
}

impl Constraint {
    pub fn reason(&self) -> Option<ReasonCode> {
        match self {
            Constraint::MaxLength(_) | Constraint::MinLength(_) => Some(ReasonCode::StringLength),
            Constraint::Pattern(_) => Some(ReasonCode::StringPattern),
            Constraint::Minimum(_)
            | Constraint::Maximum(_)
            | Constraint::ExclusiveMinimum(_)
            | Constraint::ExclusiveMaximum(_) => Some(ReasonCode::NumberLimit),
            Constraint::Nested(_) => None,
        }
    }

    pub fn message(&self) -> Option<String> {
        match self {
            Constraint::MaxLength(max) => Some(message_for_string_max(*max)),
            Constraint::MinLength(min) => Some(message_for_string_min(*min)),
            Constraint::Pattern(pattern) => Some(message_for_string_pattern(pattern)),
            Constraint::Minimum(min) => Some(message_for_minimum(min)),
            Constraint::Maximum(max) => Some(message_for_maximum(max)),
            Constraint::ExclusiveMinimum(min) => Some(message_for_exclusive_minimum(min)),
            Constraint::ExclusiveMaximum(max) => Some(message_for_exclusive_maximum(max)),
            Constraint::Nested(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationRule {
    pub field: String,
    pub required: bool,
    pub constraint: Constraint,
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

pub fn message_for_minimum(min: &Number) -> String {
    format!("Value must be greater than {min}")
}

pub fn message_for_maximum(max: &Number) -> String {
    format!("Value must be less than {max}")
}

pub fn message_for_exclusive_minimum(min: &Number) -> String {
    format!("Value must be greater than or equal to {min}")
}

pub fn message_for_exclusive_maximum(max: &Number) -> String {
    format!("Value must be less than or equal to {max}")
}

pub fn message_for_required() -> String {
    "Required field is missing".to_string()
}

/// Derive the rule set for an object schema. Properties-less schemas are
/// accepted only when they still declare a catch-all (additionalProperties
/// included); anything else is a structural error.
pub fn rules_for_object(schema: &Schema) -> Result<Vec<ValidationRule>, NotAnObjectSchema> {
    let props = match &schema.properties {
        Some(props) => props,
        None if schema.additional_properties.included => return Ok(vec![]),
        None => return Err(NotAnObjectSchema),
    };

    let mut rules = Vec::new();
    for (name, def) in props.iter() {
        let Some(prop) = def.as_schema() else { continue };
        let required = schema.is_required(name);
        let push = |rules: &mut Vec<ValidationRule>, constraint: Constraint| {
            rules.push(ValidationRule {
                field: name.clone(),
                required,
                constraint,
            });
        };
        match prop.primary_type() {
            Some(TypeTag::String) => {
                if let Some(max) = prop.max_length {
                    push(&mut rules, Constraint::MaxLength(max));
                }
                if let Some(min) = prop.min_length {
                    push(&mut rules, Constraint::MinLength(min));
                }
                if let Some(pattern) = &prop.pattern {
                    push(&mut rules, Constraint::Pattern(pattern.clone()));
                }
            }
            Some(TypeTag::Number) | Some(TypeTag::Integer) => {
                if let Some(min) = &prop.minimum {
                    push(&mut rules, Constraint::Minimum(min.clone()));
                }
                if let Some(max) = &prop.maximum {
                    push(&mut rules, Constraint::Maximum(max.clone()));
                }
                if let Some(min) = &prop.exclusive_minimum {
                    push(&mut rules, Constraint::ExclusiveMinimum(min.clone()));
                }
                if let Some(max) = &prop.exclusive_maximum {
                    push(&mut rules, Constraint::ExclusiveMaximum(max.clone()));
                }
            }
            _ => {
                if let Some(reference) = &prop.reference {
                    push(
                        &mut rules,
                        Constraint::Nested(crate::schema::ref_target(reference).to_string()),
                    );
                }
            }
        }
    }
    Ok(rules)
}

/// One flattened, path-qualified validation failure.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub field: String,
    pub reason: ReasonCode,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &str, reason: ReasonCode, message: String) -> Self {
        ValidationError {
            field: field.to_string(),
            reason,
            message,
        }
    }
}

/// Composite validation outcome. Invalid is ordinary data, never an error.
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

/// Evaluate a declaration's rule set against a JSON instance. Required
/// fields are always checked; constraints on optional fields are skipped
/// when the field is absent.
pub fn validate_instance(decl: &TypeDeclaration, value: &Value, pool: &TypePool) -> Validation {
    let object = value.as_object();
    let field_value = |name: &str| {
        object
            .and_then(|m| m.get(name))
            .filter(|v| !v.is_null())
    };

    let mut errors = Vec::new();
    for field in &decl.fields {
        if field.required && field_value(&field.name).is_none() {
            errors.push(ValidationError::new(
                &field.name,
                ReasonCode::Required,
                message_for_required(),
            ));
        }
    }

    for rule in &decl.rules {
        let Some(value) = field_value(&rule.field) else {
            continue;
        };
        match &rule.constraint {
            Constraint::Nested(type_name) => {
                if let Some(nested) = pool.get(type_name) {
                    let outcome = validate_instance(nested, value, pool);
                    errors.extend(outcome.as_children_of(&rule.field));
                }
            }
            constraint => {
                if violates(constraint, value) {
                    // Leaf constraints always carry a reason and message.
                    if let (Some(reason), Some(message)) =
                        (constraint.reason(), constraint.message())
                    {
                        errors.push(ValidationError::new(&rule.field, reason, message));
                    }
                }
            }
        }
    }
    Validation::from_errors(&decl.name, errors)
}

fn violates(constraint: &Constraint, value: &Value) -> bool {
    match constraint {
        Constraint::MaxLength(max) => value
            .as_str()
            .map_or(false, |s| s.chars().count() as u64 > *max),
        Constraint::MinLength(min) => value
            .as_str()
            .map_or(false, |s| (s.chars().count() as u64) < *min),
        Constraint::Pattern(pattern) => match (value.as_str(), Regex::new(pattern)) {
            (Some(s), Ok(re)) => !re.is_match(s),
            _ => false,
        },
        Constraint::Minimum(bound) => cmp(value, bound, |o| o != Ordering::Greater),
        Constraint::Maximum(bound) => cmp(value, bound, |o| o != Ordering::Less),
        Constraint::ExclusiveMinimum(bound) => cmp(value, bound, |o| o == Ordering::Less),
        Constraint::ExclusiveMaximum(bound) => cmp(value, bound, |o| o == Ordering::Greater),
        Constraint::Nested(_) => false,
    }
}

fn cmp(value: &Value, bound: &Number, violated: fn(Ordering) -> bool) -> bool {
    match value {
        Value::Number(n) => number_ord(n, bound).map_or(false, violated),
        _ => false,
    }
}

/// Integral pairs compare exactly; generated validators compare exact
/// `i64`/decimal values, and the f64 fallback loses integers above 2^53.
fn number_ord(value: &Number, bound: &Number) -> Option<Ordering> {
    if let (Some(v), Some(b)) = (value.as_i64(), bound.as_i64()) {
        return Some(v.cmp(&b));
    }
    if let (Some(v), Some(b)) = (value.as_u64(), bound.as_u64()) {
        return Some(v.cmp(&b));
    }
    match (value.as_f64(), bound.as_f64()) {
        (Some(v), Some(b)) => v.partial_cmp(&b),
        _ => None,
    }
}
