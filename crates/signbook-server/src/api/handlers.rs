//! HTTP request handlers for the account routes.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Deserializer};
use signbook_core::accounts::{ErrorKind, NewAccount};
use tracing::info;

use super::{
    response::{LookupReply, MessageReply, StatusReply},
    AppState,
};

/// Sign-up form. Absent or null keys read as empty and fail validation.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignupRequest {
    #[serde(deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub email: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub phone: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub password: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub gender: String,
}

impl From<SignupRequest> for NewAccount {
    fn from(req: SignupRequest) -> Self {
        NewAccount {
            name: req.name,
            email: req.email,
            phone: req.phone,
            password: req.password,
            gender: req.gender,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    #[serde(deserialize_with = "null_as_empty")]
    pub email: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VerifyRequest {
    #[serde(deserialize_with = "null_as_empty")]
    pub email: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub phone: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResetRequest {
    #[serde(deserialize_with = "null_as_empty")]
    pub email: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub new_password: String,
}

/// Reads an explicit JSON `null` as an empty string.
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// POST /signup
pub async fn signup(State(state): State<AppState>, Json(req): Json<SignupRequest>) -> Response {
    info!(email = %req.email, "signup request");

    match state.accounts.register(req.into()).await {
        Ok(_) => StatusReply::ok(
            StatusCode::CREATED,
            "Signup successful! You can now log in.",
        ),
        Err(err) => {
            let message = match err.kind() {
                ErrorKind::Validation => "All fields are required",
                ErrorKind::Conflict => "User already exists",
                _ => "Error signing up",
            };
            StatusReply::failure(&err, message)
        }
    }
}

/// POST /login
pub async fn login(State(state): State<AppState>, Json(req): Json<LoginRequest>) -> Response {
    info!(email = %req.email, "login attempt");

    match state.accounts.authenticate(&req.email, &req.password).await {
        Ok(_) => StatusReply::ok(StatusCode::OK, "Login successful"),
        Err(err) => {
            let message = match err.kind() {
                ErrorKind::InvalidCredentials => "Invalid credentials",
                _ => "Internal Server Error",
            };
            StatusReply::failure(&err, message)
        }
    }
}

/// POST /verify-user
pub async fn verify_user(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> Response {
    info!(email = %req.email, "identity verification");

    match state.accounts.verify_identity(&req.email, &req.phone).await {
        Ok(_) => LookupReply::found("User verified. You can now set a new password."),
        Err(err) => {
            let message = match err.kind() {
                ErrorKind::Validation => "Email and phone are required for verification.",
                ErrorKind::NotFound => "User not found or details do not match.",
                _ => "Server error during verification.",
            };
            LookupReply::failure(&err, message)
        }
    }
}

/// POST /reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetRequest>,
) -> Response {
    info!(email = %req.email, "password reset");

    match state
        .accounts
        .reset_credential(&req.email, &req.new_password)
        .await
    {
        Ok(_) => StatusReply::ok(StatusCode::OK, "Password updated successfully!"),
        Err(err) => {
            let message = match err.kind() {
                ErrorKind::Validation => "Email and new password are required.",
                ErrorKind::NotFound => "User not found.",
                _ => "Server error during password reset.",
            };
            StatusReply::failure(&err, message)
        }
    }
}

/// GET /users
pub async fn list_users(State(state): State<AppState>) -> Response {
    match state.accounts.list_users().await {
        Ok(users) => (StatusCode::OK, Json(users)).into_response(),
        Err(err) => MessageReply::failure(&err, "Error reading users"),
    }
}
