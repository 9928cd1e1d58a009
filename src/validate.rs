//! Form validation shared by registration, login and the student forms.
//!
//! Validation collects every failing field before reporting, so a client can
//! show all messages next to their inputs at once.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;

use crate::err::Error;

lazy_static! {
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

pub const MIN_PASSWORD_LEN: usize = 6;

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

#[derive(Debug, Default)]
pub struct FieldErrors {
    fields: BTreeMap<&'static str, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<S: Into<String>>(&mut self, field: &'static str, message: S) {
        self.fields.entry(field).or_insert_with(|| message.into());
    }

    /// Records `message` when `value` is blank. Returns whether the value was present.
    pub fn require(&mut self, field: &'static str, value: &str, message: &str) -> bool {
        if value.trim().is_empty() {
            self.add(field, message);
            return false;
        }
        true
    }

    pub fn email(&mut self, field: &'static str, value: &str) {
        if self.require(field, value, "Email is required") && !is_valid_email(value) {
            self.add(field, "Invalid email format");
        }
    }

    pub fn finish(self) -> Result<(), Error> {
        if self.fields.is_empty() {
            return Ok(());
        }
        Err(Error::ValidationFailed {
            message: "Please correct the highlighted fields".to_string(),
            fields: self.fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_addresses() {
        assert!(is_valid_email("alice@school.edu"));
        assert!(is_valid_email("a.b+c@mail.example.org"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        for email in ["", "alice", "alice@school", "@school.edu", "al ice@school.edu", "a@@b.c"] {
            assert!(!is_valid_email(email), "{} should be rejected", email);
        }
    }

    #[test]
    fn collects_every_failing_field() {
        let mut errors = FieldErrors::new();
        errors.require("name", "  ", "Name is required");
        errors.email("email", "nope");
        match errors.finish() {
            Err(Error::ValidationFailed { fields, .. }) => {
                assert_eq!(fields["name"], "Name is required");
                assert_eq!(fields["email"], "Invalid email format");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn first_message_per_field_wins() {
        let mut errors = FieldErrors::new();
        errors.email("email", "");
        errors.add("email", "something else");
        match errors.finish() {
            Err(Error::ValidationFailed { fields, .. }) => {
                assert_eq!(fields["email"], "Email is required")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
