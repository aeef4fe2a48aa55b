use serde::Deserialize;

use crate::validation::{is_valid_email, length, required, FieldErrors};

pub const USERNAME_MAX: usize = 64;
pub const EMAIL_MAX: usize = 120;
pub const PASSWORD_MIN: usize = 8;

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Submitted by the sign-in page.
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    // unchecked boxes are absent from the body
    #[serde(default)]
    pub remember: Option<String>,
}

impl LoginForm {
    pub fn remember(&self) -> bool {
        matches!(self.remember.as_deref(), Some("y" | "on" | "true" | "1"))
    }

    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        required(&mut errors, "username", &self.username);
        required(&mut errors, "password", &self.password);
        errors.into_result()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RegistrationForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password2: String,
}

impl RegistrationForm {
    /// Trims the username and lower-cases the email before validation and storage.
    pub fn normalize(&mut self) {
        self.username = self.username.trim().to_string();
        self.email = self.email.trim().to_lowercase();
    }

    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        if required(&mut errors, "username", &self.username) {
            length(&mut errors, "username", &self.username, 1, USERNAME_MAX);
            if self.username.chars().any(char::is_whitespace) {
                errors.add("username", "Username must not contain spaces.");
            }
        }

        if required(&mut errors, "email", &self.email) {
            length(&mut errors, "email", &self.email, 3, EMAIL_MAX);
            if !is_valid_email(&self.email) {
                errors.add("email", "Invalid email address.");
            }
        }

        if required(&mut errors, "password", &self.password)
            && self.password.chars().count() < PASSWORD_MIN
        {
            errors.add(
                "password",
                format!("Password must be at least {PASSWORD_MIN} characters long."),
            );
        }

        if required(&mut errors, "password2", &self.password2) && self.password2 != self.password {
            errors.add("password2", "Field must be equal to password.");
        }

        errors.into_result()
    }
}
