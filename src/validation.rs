//! Form validation pipeline.
//!
//! Every submitted form goes through the same steps before anything is
//! written: trim, declarative field rules (`validator` attributes), HTML
//! escaping, then conversion into the typed write model. Failures are
//! collected as `{field, message}` pairs so the form can be shown again.

use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

/// ASCII letters and digits only. Empty values pass; emptiness is a
/// separate `length` rule.
pub static ALPHANUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9]*$").expect("alphanumeric pattern is valid"));

/// A single failed field rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A submitted form that can be run through [`check`].
pub trait FormInput: Validate + Sized {
    /// Typed value produced from a valid form
    type Output;

    /// Field order used when reporting errors
    const FIELDS: &'static [&'static str];

    fn trim(self) -> Self;

    /// Escape HTML-significant characters in free-text fields
    fn escape(self) -> Self {
        self
    }

    /// Convert the sanitized form, reporting fields that do not parse
    fn build(&self) -> Result<Self::Output, Vec<FieldError>>;
}

/// A form that failed validation, with its sanitized values
#[derive(Debug)]
pub struct Invalid<F> {
    pub form: F,
    pub errors: Vec<FieldError>,
}

/// Run a submitted form through the pipeline
pub fn check<F: FormInput>(raw: F) -> Result<F::Output, Invalid<F>> {
    let form = raw.trim();
    let mut errors = rule_errors(&form);
    let form = form.escape();

    match form.build() {
        Ok(output) if errors.is_empty() => Ok(output),
        Ok(_) => Err(Invalid { form, errors }),
        Err(more) => {
            errors.extend(more);
            sort_errors(&mut errors, F::FIELDS);
            Err(Invalid { form, errors })
        }
    }
}

/// Trimmed and escaped copy of a submitted form, for redisplay after a
/// check that runs past the field rules fails
pub fn sanitize<F: FormInput>(raw: F) -> F {
    raw.trim().escape()
}

/// Errors from the declarative `validator` rules, in form field order
fn rule_errors<F: FormInput>(form: &F) -> Vec<FieldError> {
    let mut out = Vec::new();
    if let Err(errors) = form.validate() {
        for (field, errs) in errors.field_errors() {
            for err in errs.iter() {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for {}", field));
                out.push(FieldError::new(field.to_string(), message));
            }
        }
    }
    sort_errors(&mut out, F::FIELDS);
    out
}

fn sort_errors(errors: &mut [FieldError], order: &[&str]) {
    errors.sort_by_key(|e| {
        order
            .iter()
            .position(|f| *f == e.field)
            .unwrap_or(usize::MAX)
    });
}

pub fn trimmed(value: String) -> String {
    let trimmed = value.trim();
    if trimmed.len() == value.len() {
        value
    } else {
        trimmed.to_string()
    }
}

/// Replace `& < > " ' /` with HTML entities
pub fn escaped(value: String) -> String {
    html_escape::encode_safe(&value).into_owned()
}

/// Parse an ISO-8601 date (`2024-03-01`) or date-time
/// (`2024-03-01T10:00:00Z`), keeping the calendar date.
pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

/// Empty means absent; anything else must be an ISO-8601 date
pub fn optional_date(
    field: &str,
    value: &str,
    message: &str,
) -> Result<Option<NaiveDate>, FieldError> {
    if value.is_empty() {
        return Ok(None);
    }
    parse_iso_date(value)
        .map(Some)
        .ok_or_else(|| FieldError::new(field, message))
}

/// Parse a reference to another entity. Empty values are reported by the
/// `length` rule already and yield no extra error here.
pub fn reference(field: &str, value: &str, message: &str) -> Result<Option<Uuid>, FieldError> {
    if value.is_empty() {
        return Ok(None);
    }
    Uuid::parse_str(value)
        .map(Some)
        .map_err(|_| FieldError::new(field, message))
}

/// Collects build-step failures while still producing the fields that parse
#[derive(Debug, Default)]
pub struct Collector {
    errors: Vec<FieldError>,
}

impl Collector {
    pub fn take<T: Default>(&mut self, result: Result<T, FieldError>) -> T {
        match result {
            Ok(value) => value,
            Err(e) => {
                self.errors.push(e);
                T::default()
            }
        }
    }

    pub fn push(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    pub fn finish<T>(self, value: T) -> Result<T, Vec<FieldError>> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(self.errors)
        }
    }
}
