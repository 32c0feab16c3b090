use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

/// Where a validated field is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// The `{id}` path segment of the route.
    Path,
    /// A top-level field of the JSON request body.
    Body,
}

/// Whether a field must be present in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
}

/// Type and length constraint applied to a present field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// The value must parse as an integer.
    Integer,
    /// The value must be a string, optionally bounded in length. `hint` is
    /// appended to the length error message, e.g. `e.g., #FFFFFF`.
    Text {
        max_len: Option<usize>,
        hint: Option<&'static str>,
    },
    /// The value must be a JSON boolean.
    Boolean,
}

/// A declarative constraint attached to one input field of one route.
/// Routes declare an ordered list of these; [`evaluate`] runs the whole list
/// and collects every failure.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: &'static str,
    /// Human-facing field name used in error messages.
    pub label: &'static str,
    pub location: Location,
    pub presence: Presence,
    pub constraint: Constraint,
}

/// A single failed rule, reported back to the client.
#[derive(Debug, Serialize, PartialEq, Eq, Clone, ToSchema)]
pub struct FieldError {
    /// Name of the field that failed validation.
    pub field: String,
    /// Human-readable description of the failure.
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: String) -> Self {
        Self {
            field: field.to_string(),
            message,
        }
    }
}

/// Result of evaluating a route's rule list against one request.
#[derive(Debug)]
pub struct Outcome {
    path_id: Option<i32>,
    errors: Vec<FieldError>,
}

impl Outcome {
    /// Succeeds only when no rule failed.
    pub fn into_result(self) -> Result<(), Vec<FieldError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }

    /// Succeeds with the parsed path ID only when no rule failed.
    pub fn require_path_id(self) -> Result<i32, Vec<FieldError>> {
        if !self.errors.is_empty() {
            return Err(self.errors);
        }
        self.path_id
            .ok_or_else(|| vec![FieldError::new("id", integer_message("ID"))])
    }
}

/// Evaluates every rule in order against the request's path segment and JSON
/// body, collecting all failures rather than stopping at the first.
///
/// A `null` body field is treated the same as an absent one. A non-object
/// body is treated as an empty object, so required body fields are reported
/// individually.
pub fn evaluate(rules: &[FieldRule], path_id: Option<&str>, body: &Value) -> Outcome {
    let mut outcome = Outcome {
        path_id: None,
        errors: Vec::new(),
    };
    for rule in rules {
        match rule.location {
            Location::Path => check_path_rule(rule, path_id, &mut outcome),
            Location::Body => check_body_rule(rule, body, &mut outcome),
        }
    }
    outcome
}

fn check_path_rule(rule: &FieldRule, path_id: Option<&str>, outcome: &mut Outcome) {
    let Some(raw) = path_id else {
        if rule.presence == Presence::Required {
            outcome
                .errors
                .push(FieldError::new(rule.field, required_message(rule.label)));
        }
        return;
    };

    match rule.constraint {
        Constraint::Integer => match raw.parse::<i32>() {
            Ok(id) => outcome.path_id = Some(id),
            Err(_) => outcome
                .errors
                .push(FieldError::new(rule.field, integer_message(rule.label))),
        },
        Constraint::Text { max_len, hint } => {
            if let Some(max) = max_len {
                if raw.chars().count() > max {
                    outcome.errors.push(FieldError::new(
                        rule.field,
                        length_message(rule.label, max, hint),
                    ));
                }
            }
        }
        Constraint::Boolean => {
            if raw.parse::<bool>().is_err() {
                outcome
                    .errors
                    .push(FieldError::new(rule.field, boolean_message(rule.label)));
            }
        }
    }
}

fn check_body_rule(rule: &FieldRule, body: &Value, outcome: &mut Outcome) {
    let value = body.get(rule.field).filter(|value| !value.is_null());

    let Some(value) = value else {
        if rule.presence == Presence::Required {
            outcome
                .errors
                .push(FieldError::new(rule.field, required_message(rule.label)));
        }
        return;
    };

    match rule.constraint {
        Constraint::Integer => {
            if !value.as_i64().is_some_and(|n| i32::try_from(n).is_ok()) {
                outcome
                    .errors
                    .push(FieldError::new(rule.field, integer_message(rule.label)));
            }
        }
        Constraint::Text { max_len, hint } => match value {
            Value::String(text) => {
                if text.is_empty() && rule.presence == Presence::Required {
                    outcome
                        .errors
                        .push(FieldError::new(rule.field, required_message(rule.label)));
                } else if let Some(max) = max_len {
                    if text.chars().count() > max {
                        outcome.errors.push(FieldError::new(
                            rule.field,
                            length_message(rule.label, max, hint),
                        ));
                    }
                }
            }
            _ => outcome
                .errors
                .push(FieldError::new(rule.field, string_message(rule.label))),
        },
        Constraint::Boolean => {
            if !value.is_boolean() {
                outcome
                    .errors
                    .push(FieldError::new(rule.field, boolean_message(rule.label)));
            }
        }
    }
}

fn required_message(label: &str) -> String {
    format!("{} is required", label)
}

fn integer_message(label: &str) -> String {
    format!("{} must be an integer", label)
}

fn string_message(label: &str) -> String {
    format!("{} must be a string", label)
}

fn boolean_message(label: &str) -> String {
    format!("{} must be a boolean", label)
}

fn length_message(label: &str, max: usize, hint: Option<&str>) -> String {
    match hint {
        Some(hint) => format!("{} must not exceed {} characters ({})", label, max, hint),
        None => format!("{} must not exceed {} characters", label, max),
    }
}
