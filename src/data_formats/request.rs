use serde::{Deserialize, Serialize};

use crate::errors::{FieldErrors, RequestError};

const USERNAME_MAX_LENGTH: usize = 100;
const GENDER_MAX_LENGTH: usize = 20;
const BLANK: &str = "This field may not be blank.";

// ----------------- Token Request -----------------
#[derive(Deserialize, Serialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct RefreshRequest {
    pub refresh: String,
}

// ----------------- User Request -----------------
#[derive(Deserialize, Serialize, Debug)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        let mut errors = FieldErrors::new();
        check_username(&mut errors, &self.username);
        check_email(&mut errors, &self.email);
        if self.password.is_empty() {
            errors.add("password", BLANK);
        }
        if let Some(gender) = &self.gender {
            check_gender(&mut errors, gender);
        }
        errors.into_result()
    }
}

/// Absent and `null` fields both keep their stored value.
#[derive(Deserialize, Serialize, Debug, Default)]
#[serde(default)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub gender: Option<String>,
}

impl UpdateUserRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        let mut errors = FieldErrors::new();
        if let Some(username) = &self.username {
            check_username(&mut errors, username);
        }
        if let Some(email) = &self.email {
            check_email(&mut errors, email);
        }
        if let Some(gender) = &self.gender {
            check_gender(&mut errors, gender);
        }
        errors.into_result()
    }
}

/// Without an `avatar` the stored one is left alone.
#[derive(Deserialize, Serialize, Debug, Default)]
#[serde(default)]
pub struct UpdateAvatarRequest {
    pub avatar: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Default)]
#[serde(default)]
pub struct UserSearchParams {
    pub username: Option<String>,
}

// ----------------- Post Request -----------------
#[derive(Deserialize, Serialize, Debug)]
pub struct CreatePostRequest {
    pub message: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl CreatePostRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        check_message(&self.message)
    }
}

#[derive(Deserialize, Serialize, Debug, Default)]
#[serde(default)]
pub struct UpdatePostRequest {
    pub message: Option<String>,
    pub image: Option<String>,
}

impl UpdatePostRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        match &self.message {
            Some(message) => check_message(message),
            None => Ok(()),
        }
    }
}

#[derive(Deserialize, Serialize, Debug)]
pub struct CommentRequest {
    pub message: String,
}

impl CommentRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        check_message(&self.message)
    }
}

// ----------------- Follow Request -----------------
#[derive(Deserialize, Serialize, Debug)]
pub struct FollowRequest {
    pub follow_id: i64,
}

// ----------------- Password Reset Request -----------------
#[derive(Deserialize, Serialize, Debug)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct PasswordResetConfirmRequest {
    pub uidb64: String,
    pub token: String,
    pub password: String,
}

impl PasswordResetConfirmRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.password.is_empty() {
            return Err(RequestError::Validation(FieldErrors::single(
                "password", BLANK,
            )));
        }
        Ok(())
    }
}

// ----------------- Field checks -----------------
fn check_username(errors: &mut FieldErrors, username: &str) {
    if username.trim().is_empty() {
        errors.add("username", BLANK);
    } else if username.chars().count() > USERNAME_MAX_LENGTH {
        errors.add(
            "username",
            format!("Ensure this field has no more than {USERNAME_MAX_LENGTH} characters."),
        );
    }
}

fn check_email(errors: &mut FieldErrors, email: &str) {
    if email.trim().is_empty() {
        errors.add("email", BLANK);
    } else if !is_valid_email(email) {
        errors.add("email", "Enter a valid email address.");
    }
}

fn check_gender(errors: &mut FieldErrors, gender: &str) {
    if gender.chars().count() > GENDER_MAX_LENGTH {
        errors.add(
            "gender",
            format!("Ensure this field has no more than {GENDER_MAX_LENGTH} characters."),
        );
    }
}

fn check_message(message: &str) -> Result<(), RequestError> {
    if message.trim().is_empty() {
        return Err(RequestError::Validation(FieldErrors::single(
            "message", BLANK,
        )));
    }
    Ok(())
}

fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}
