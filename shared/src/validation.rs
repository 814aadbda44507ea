//! Input validation helpers
//!
//! Client-side checks run before a form is submitted. Every violated field is
//! reported, so a form can show all of its inline errors at once.

use std::fmt;

use thiserror::Error;

use crate::models::{DiningTable, ReservationCreate, TABLE_CAPACITIES};
use crate::types::{Instant, TableId};

// ── Text length limits ──────────────────────────────────────────────

/// Entity names: table, customer, user
pub const MAX_NAME_LEN: usize = 200;

/// Short identifiers: phone, etc.
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_PASSWORD_LEN: usize = 128;

// ── Error collection ────────────────────────────────────────────────

/// One violated form field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// All field errors of one form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First message recorded for `field`
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ValidationError(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", e.field, e.message)?;
        }
        Ok(())
    }
}

/// Form rejected before submission
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Validation failed: {0}")]
pub struct ValidationError(pub FieldErrors);

impl ValidationError {
    pub fn fields(&self) -> &FieldErrors {
        &self.0
    }
}

// ── Field helpers ───────────────────────────────────────────────────

/// Required string: non-empty after trimming and within the length limit.
fn check_required_text(errors: &mut FieldErrors, value: &str, field: &'static str, max_len: usize) {
    if value.trim().is_empty() {
        errors.push(field, format!("{field} must not be empty"));
    } else if value.chars().count() > max_len {
        errors.push(
            field,
            format!(
                "{field} is too long ({} chars, max {max_len})",
                value.chars().count()
            ),
        );
    }
}

fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.starts_with('.')
                && domain.contains('.')
                && !domain.ends_with('.')
                && !value.contains(char::is_whitespace)
        }
        None => false,
    }
}

// ── Forms ───────────────────────────────────────────────────────────

/// Table create/edit form.
///
/// `editing` is the id of the table being edited, which may keep its own name.
pub fn validate_table(
    name: &str,
    capacity: i32,
    existing: &[DiningTable],
    editing: Option<TableId>,
) -> Result<(), ValidationError> {
    let mut errors = FieldErrors::new();
    check_required_text(&mut errors, name, "name", MAX_NAME_LEN);

    let wanted = name.trim().to_lowercase();
    if !wanted.is_empty()
        && existing
            .iter()
            .any(|t| Some(t.id) != editing && t.name.trim().to_lowercase() == wanted)
    {
        errors.push("name", format!("A table named '{}' already exists", name.trim()));
    }

    if !TABLE_CAPACITIES.contains(&capacity) {
        errors.push(
            "capacity",
            format!("capacity must be one of {TABLE_CAPACITIES:?}"),
        );
    }
    errors.into_result()
}

/// Registration / new user form
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

pub fn validate_registration(form: &RegistrationForm) -> Result<(), ValidationError> {
    let mut errors = FieldErrors::new();

    check_required_text(&mut errors, &form.username, "username", MAX_NAME_LEN);
    if !form.username.trim().is_empty() && form.username.trim().chars().count() < MIN_USERNAME_LEN
    {
        errors.push(
            "username",
            format!("username must be at least {MIN_USERNAME_LEN} characters"),
        );
    }

    check_required_text(&mut errors, &form.email, "email", MAX_EMAIL_LEN);
    if !form.email.trim().is_empty() && !looks_like_email(form.email.trim()) {
        errors.push("email", "email is not a valid address");
    }

    let password_len = form.password.chars().count();
    if password_len < MIN_PASSWORD_LEN {
        errors.push(
            "password",
            format!("password must be at least {MIN_PASSWORD_LEN} characters"),
        );
    } else if password_len > MAX_PASSWORD_LEN {
        errors.push(
            "password",
            format!("password is too long (max {MAX_PASSWORD_LEN})"),
        );
    }

    if form.password != form.confirm_password {
        errors.push("confirm_password", "passwords do not match");
    }

    errors.into_result()
}

/// Reservation form.
///
/// `capacity` is the chosen table's capacity when known. `now` is set for new
/// bookings, which may not start in the past.
pub fn validate_reservation(
    draft: &ReservationCreate,
    capacity: Option<i32>,
    now: Option<Instant>,
) -> Result<(), ValidationError> {
    let mut errors = FieldErrors::new();

    check_required_text(&mut errors, &draft.customer_name, "customer_name", MAX_NAME_LEN);
    check_required_text(
        &mut errors,
        &draft.customer_phone,
        "customer_phone",
        MAX_SHORT_TEXT_LEN,
    );

    if draft.guest_count < 1 {
        errors.push("guest_count", "guest count must be at least 1");
    } else if let Some(capacity) = capacity.filter(|c| draft.guest_count > *c) {
        errors.push(
            "guest_count",
            format!("table seats {capacity}, got {} guests", draft.guest_count),
        );
    }

    if draft.reserved_from >= draft.reserved_to {
        errors.push("reserved_to", "end time must be after start time");
    }
    if let Some(now) = now.filter(|now| draft.reserved_from < *now) {
        errors.push(
            "reserved_from",
            format!("start time is in the past ({})", now.format("%Y-%m-%d %H:%M")),
        );
    }

    errors.into_result()
}
