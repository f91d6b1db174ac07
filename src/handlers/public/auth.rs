// Public auth surface: account creation and token issuance. The protected
// routes only ever see the token this module mints.

use axum::{
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::auth::{generate_access_token, Claims};
use crate::config;
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::user::{Principal, User, PRINCIPAL_COLUMNS};
use crate::error::ApiError;
use crate::middleware::auth::ACCESS_TOKEN_COOKIE;
use crate::middleware::response::ApiResponse;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub avatar: Option<String>,
    pub cover_image: Option<String>,
}

/// POST /auth/register - create an account
pub async fn register(Json(payload): Json<RegisterRequest>) -> Result<ApiResponse<Principal>, ApiError> {
    for (field, value) in [
        ("username", &payload.username),
        ("email", &payload.email),
        ("full_name", &payload.full_name),
        ("password", &payload.password),
    ] {
        if value.trim().is_empty() {
            return Err(ApiError::bad_request(format!("{} is required", field)));
        }
    }

    let pool = DatabaseManager::pool().await?;
    let password_hash = hash_password(&payload.password);
    let sql = format!(
        "INSERT INTO users (username, email, full_name, password_hash, avatar, cover_image) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
        PRINCIPAL_COLUMNS
    );

    let created = sqlx::query_as::<_, Principal>(&sql)
        .bind(payload.username.trim())
        .bind(payload.email.trim())
        .bind(payload.full_name.trim())
        .bind(&password_hash)
        .bind(&payload.avatar)
        .bind(&payload.cover_image)
        .fetch_one(&pool)
        .await;

    match created {
        Ok(principal) => {
            Ok(ApiResponse::created(principal).with_message("User registered successfully"))
        }
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            Err(ApiError::conflict("Username or email already in use"))
        }
        Err(e) => Err(DatabaseError::from(e).into()),
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// POST /auth/login - verify credentials and issue an access token. The token
/// is returned in the body and also set as the accessToken cookie.
pub async fn login(Json(payload): Json<LoginRequest>) -> Result<Response, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let user = sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE username = $1 OR email = $1",
    )
    .bind(payload.username.trim())
    .fetch_optional(&pool)
    .await
    .map_err(DatabaseError::from)?;

    // One rejection for unknown account and wrong password alike
    let user = user
        .filter(|u| verify_password(&payload.password, &u.password_hash))
        .ok_or_else(|| ApiError::unauthorized("Invalid username or password"))?;

    let claims = Claims::new(user.id, user.username.clone());
    let token = generate_access_token(&claims).map_err(|e| {
        tracing::error!("failed to issue access token: {}", e);
        ApiError::internal_server_error("Failed to issue access token")
    })?;

    let security = &config::config().security;
    let expires_in = security.jwt_expiry_hours * 3600;
    let cookie = format!(
        "{}={}; HttpOnly; Path=/; Max-Age={}; SameSite=Lax{}",
        ACCESS_TOKEN_COOKIE,
        token,
        expires_in,
        if security.secure_cookies { "; Secure" } else { "" }
    );

    let principal = Principal {
        id: user.id,
        username: user.username,
        email: user.email,
        full_name: user.full_name,
        avatar: user.avatar,
        cover_image: user.cover_image,
        created_at: user.created_at,
        updated_at: user.updated_at,
    };

    let body = ApiResponse::success(json!({
        "user": principal,
        "token": token,
        "expires_in": expires_in,
    }))
    .with_message("Logged in successfully");

    Ok(([(header::SET_COOKIE, cookie)], body).into_response())
}

/// Salted SHA-256, stored as `salt$hexdigest`
fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    format!("{}${}", salt, digest(&salt, password))
}

fn verify_password(password: &str, stored: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, expected)) => digest(salt, password) == expected,
        None => false,
    }
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trips() {
        let stored = hash_password("chai-aur-code");
        assert!(verify_password("chai-aur-code", &stored));
        assert!(!verify_password("chai-aur-c0de", &stored));
    }

    #[test]
    fn distinct_salts_give_distinct_hashes() {
        assert_ne!(hash_password("same"), hash_password("same"));
    }

    #[test]
    fn malformed_stored_hash_never_verifies() {
        assert!(!verify_password("anything", "no-separator-here"));
    }
}
