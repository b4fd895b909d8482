//! Authentication and account routes

use axum::{
    Extension, Json,
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::error::ApiError;
use crate::middleware::bearer_token;
use crate::models::{CurrentUser, NewUser};
use crate::session::random_hex;
use crate::state::AppState;
use crate::validation;

/// How long a password-reset token stays usable
const RESET_TOKEN_TTL_MINUTES: i64 = 5;

/// Request for user registration
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub registration_number: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub security_code: String,
    #[serde(default)]
    pub security_code_hint: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

/// Request for user login
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    pub registration_number: String,
    #[serde(default)]
    pub password: String,
}

/// Request carrying only a registration number
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationNumberRequest {
    #[serde(default)]
    pub registration_number: String,
}

/// Request for security-code verification
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifySecurityCodeRequest {
    #[serde(default)]
    pub registration_number: String,
    #[serde(default)]
    pub security_code: String,
}

/// Request for a token-based password reset
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub new_password: String,
}

/// Register a new user
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.registration_number.is_empty()
        || payload.name.trim().is_empty()
        || payload.password.is_empty()
        || payload.security_code.is_empty()
    {
        return Err(ApiError::Validation(
            "Registration number, name, password, and security code are required".to_string(),
        ));
    }

    validation::validate_security_code(&payload.security_code).map_err(ApiError::Validation)?;
    validation::validate_password(&payload.password).map_err(ApiError::Validation)?;

    let formatted = validation::format(&payload.registration_number).ok_or_else(|| {
        ApiError::Validation(
            "Invalid registration number format. Use format like: 225/88 or 225-88 or 225 88"
                .to_string(),
        )
    })?;

    if !validation::is_valid(&formatted) {
        return Err(ApiError::Validation(format!(
            "Invalid registration number \"{formatted}\". Please check the number against the enrollment records."
        )));
    }

    let existing = state
        .user_repository
        .find_by_registration(&formatted)
        .await
        .map_err(|e| {
            error!("Failed to check for existing user: {}", e);
            ApiError::Internal
        })?;

    if existing.is_some() {
        return Err(ApiError::Validation(
            "Registration number already exists".to_string(),
        ));
    }

    let new_user = NewUser {
        registration_number: formatted.clone(),
        name: payload.name,
        password: payload.password,
        security_code: payload.security_code,
        security_code_hint: payload.security_code_hint,
        email: payload.email,
        phone: payload.phone,
    };

    state.user_repository.create(&new_user).await.map_err(|e| {
        error!("Failed to create user: {}", e);
        ApiError::Internal
    })?;

    Ok(Json(json!({
        "success": true,
        "message": "Registration successful",
        "registrationNumber": formatted,
    })))
}

/// Verify credentials and issue a session token
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let formatted = validation::format(&payload.registration_number).ok_or_else(|| {
        ApiError::Validation("Invalid registration number format".to_string())
    })?;

    let user = state
        .user_repository
        .find_by_registration(&formatted)
        .await
        .map_err(|e| {
            error!("Failed to look up user at login: {}", e);
            ApiError::Internal
        })?
        .ok_or_else(|| {
            ApiError::Validation("Invalid registration number or password".to_string())
        })?;

    let password_matches = state
        .user_repository
        .verify_password(&user, &payload.password)
        .map_err(|e| {
            error!("Failed to verify password: {}", e);
            ApiError::Internal
        })?;

    if !password_matches {
        return Err(ApiError::Validation(
            "Invalid registration number or password".to_string(),
        ));
    }

    let token = state.sessions.issue(user.id).await;
    info!("User {} logged in", user.registration_number);

    Ok(Json(json!({
        "success": true,
        "user": CurrentUser::from(&user),
        "token": token,
    })))
}

/// Revoke the caller's session token
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    Extension(user): Extension<CurrentUser>,
) -> impl IntoResponse {
    if let Some(token) = bearer_token(&headers) {
        state.sessions.revoke(token).await;
    }
    info!("User {} logged out", user.registration_number);

    Json(json!({"success": true, "message": "Logged out successfully"}))
}

/// Report whether the caller is authenticated
pub async fn check(user: Option<Extension<CurrentUser>>) -> impl IntoResponse {
    match user {
        Some(Extension(user)) => Json(json!({"loggedIn": true, "user": user})),
        None => Json(json!({"loggedIn": false})),
    }
}

/// Current user's profile, including the security-code hint
pub async fn profile(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .user_repository
        .find_by_id(current.id)
        .await
        .map_err(|e| {
            error!("Failed to load profile: {}", e);
            ApiError::Internal
        })?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(json!({
        "id": user.id,
        "registrationNumber": user.registration_number,
        "name": user.name,
        "email": user.email,
        "phone": user.phone,
        "securityCodeHint": user.security_code_hint,
        "createdAt": user.created_at,
    })))
}

/// Validate a registration number's format and range without touching
/// any account
pub async fn validate_registration(
    Json(payload): Json<RegistrationNumberRequest>,
) -> impl IntoResponse {
    if payload.registration_number.is_empty() {
        return Json(json!({
            "valid": false,
            "message": "Registration number is required",
        }));
    }

    let Some(formatted) = validation::format(&payload.registration_number) else {
        return Json(json!({
            "valid": false,
            "message": "Invalid format. Use format like: 225/88, 225-88, or 225 88",
        }));
    };

    let valid = validation::is_valid(&formatted);
    let message = if valid {
        format!("Valid registration number: {formatted}")
    } else {
        format!("Invalid registration number \"{formatted}\". Number does not exist in the enrollment records.")
    };

    Json(json!({
        "valid": valid,
        "formatted": formatted,
        "message": message,
    }))
}

/// Check whether an account exists and surface its security-code hint
pub async fn verify_registration(
    State(state): State<AppState>,
    Json(payload): Json<RegistrationNumberRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(formatted) = validation::format(&payload.registration_number) else {
        return Ok(Json(json!({"exists": false})));
    };

    let user = state
        .user_repository
        .find_by_registration(&formatted)
        .await
        .map_err(|e| {
            error!("Failed to verify registration: {}", e);
            ApiError::Internal
        })?;

    Ok(match user {
        Some(user) => Json(json!({
            "exists": true,
            "registrationNumber": user.registration_number,
            "hint": user.security_code_hint,
        })),
        None => Json(json!({"exists": false})),
    })
}

/// Verify the security code and mint a single-use reset token
pub async fn verify_security_code(
    State(state): State<AppState>,
    Json(payload): Json<VerifySecurityCodeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.registration_number.is_empty() || payload.security_code.is_empty() {
        return Err(ApiError::Validation(
            "Registration number and security code are required".to_string(),
        ));
    }

    let Some(formatted) = validation::format(&payload.registration_number) else {
        return Ok(Json(json!({"valid": false, "error": "User not found"})));
    };

    let Some(user) = state
        .user_repository
        .find_by_registration(&formatted)
        .await
        .map_err(|e| {
            error!("Failed to look up user for security check: {}", e);
            ApiError::Internal
        })?
    else {
        return Ok(Json(json!({"valid": false, "error": "User not found"})));
    };

    let code_matches = state
        .user_repository
        .verify_security_code(&user, &payload.security_code)
        .map_err(|e| {
            error!("Failed to verify security code: {}", e);
            ApiError::Internal
        })?;

    if !code_matches {
        return Ok(Json(json!({"valid": false, "error": "Invalid security code"})));
    }

    let reset_token = random_hex(20);
    let expires = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);

    state
        .user_repository
        .set_reset_token(user.id, &reset_token, expires)
        .await
        .map_err(|e| {
            error!("Failed to store reset token: {}", e);
            ApiError::Internal
        })?;

    info!(
        "Security code verified for {}, reset token generated",
        formatted
    );

    Ok(Json(json!({"valid": true, "resetToken": reset_token})))
}

/// Consume a reset token and set the new password
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.token.is_empty() || payload.new_password.is_empty() {
        return Err(ApiError::Validation(
            "Token and new password are required".to_string(),
        ));
    }

    validation::validate_password(&payload.new_password).map_err(ApiError::Validation)?;

    let reset = state
        .user_repository
        .reset_password_with_token(&payload.token, &payload.new_password)
        .await
        .map_err(|e| {
            error!("Failed to reset password: {}", e);
            ApiError::Internal
        })?;

    if !reset {
        return Err(ApiError::Validation(
            "Invalid or expired reset token".to_string(),
        ));
    }

    Ok(Json(json!({
        "success": true,
        "message": "Password reset successful. You can now login with your new password.",
    })))
}

/// Batch prefixes accepted at registration
pub async fn valid_prefixes() -> impl IntoResponse {
    Json(json!({"prefixes": validation::valid_prefixes()}))
}
