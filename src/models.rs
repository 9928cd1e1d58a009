use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::err::Error;
use crate::validate::{FieldErrors, MIN_PASSWORD_LEN};

const AVATAR_BASE: &str = "https://ui-avatars.com/api/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Student {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub roll_number: String,
    pub photo: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Student {
    /// The stored photo, or a generated avatar built from the student's initials.
    pub fn photo_url(&self) -> String {
        match &self.photo {
            Some(photo) => photo.clone(),
            None => format!("{}?name={}&background=random", AVATAR_BASE, initials(&self.name)),
        }
    }
}

fn initials(name: &str) -> String {
    let initials: String = name
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .filter(char::is_ascii_alphanumeric)
        .take(2)
        .collect();
    if initials.is_empty() {
        "S".to_string()
    } else {
        initials
    }
}

/// Body of the create and update student requests. Every field except the id is replaced on update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub roll_number: String,
    #[serde(default)]
    pub photo: Option<String>,
}

impl StudentForm {
    pub fn validate(&self) -> Result<(), Error> {
        let mut errors = FieldErrors::new();
        errors.require("name", &self.name, "Name is required");
        errors.email("email", &self.email);
        errors.require("roll_number", &self.roll_number, "Roll number is required");
        errors.finish()
    }

    /// Blank photo strings mean "no photo".
    pub fn photo(&self) -> Option<String> {
        self.photo
            .as_deref()
            .map(str::trim)
            .filter(|photo| !photo.is_empty())
            .map(str::to_string)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterAccount {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

impl RegisterAccount {
    pub fn validate(&self) -> Result<(), Error> {
        let mut errors = FieldErrors::new();
        errors.require("name", &self.name, "Name is required");
        errors.email("email", &self.email);
        if errors.require("password", &self.password, "Password is required")
            && self.password.chars().count() < MIN_PASSWORD_LEN
        {
            errors.add(
                "password",
                format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
            );
        }
        errors.finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginAccount {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginAccount {
    pub fn validate(&self) -> Result<(), Error> {
        let mut errors = FieldErrors::new();
        errors.email("email", &self.email);
        errors.require("password", &self.password, "Password is required");
        errors.finish()
    }
}

/// An authenticated client context, keyed by its bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub ssid: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::err::Error;

    fn student(name: &str, photo: Option<&str>) -> Student {
        Student {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: "s@school.edu".to_string(),
            roll_number: "R-1".to_string(),
            photo: photo.map(str::to_string),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn photo_url_prefers_stored_photo() {
        let s = student("Alice Smith", Some("https://cdn.example.com/alice.png"));
        assert_eq!(s.photo_url(), "https://cdn.example.com/alice.png");
    }

    #[test]
    fn photo_url_falls_back_to_initials_avatar() {
        let s = student("alice mary smith", None);
        assert_eq!(
            s.photo_url(),
            "https://ui-avatars.com/api/?name=AM&background=random"
        );
    }

    #[test]
    fn blank_photo_is_treated_as_absent() {
        let form = StudentForm {
            photo: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(form.photo(), None);
    }

    #[test]
    fn student_form_requires_every_field() {
        match StudentForm::default().validate() {
            Err(Error::ValidationFailed { fields, .. }) => {
                assert_eq!(fields.len(), 3);
                assert_eq!(fields["roll_number"], "Roll number is required");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn short_passwords_are_rejected() {
        let form = RegisterAccount {
            name: "Alice".to_string(),
            email: "alice@school.edu".to_string(),
            password: "12345".to_string(),
            role: Role::User,
        };
        match form.validate() {
            Err(Error::ValidationFailed { fields, .. }) => {
                assert_eq!(fields["password"], "Password must be at least 6 characters");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn role_defaults_to_user() {
        let form: RegisterAccount =
            serde_json::from_str(r#"{"name":"A","email":"a@b.co","password":"secret"}"#).unwrap();
        assert_eq!(form.role, Role::User);
    }
}
