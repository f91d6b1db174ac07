use axum::{
    extract::Request,
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use uuid::Uuid;

use crate::auth::Claims;
use crate::config;
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::user::{Principal, PRINCIPAL_COLUMNS};
use crate::error::ApiError;

/// Cookie carrying the access token; the Authorization header is the fallback
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";

/// Single client-visible message for every authentication failure. Which step
/// failed (missing credential, bad signature, expired, unknown account) is
/// logged but never exposed, so responses don't become a token/account oracle.
const UNAUTHORIZED_MESSAGE: &str = "Unauthorized request";

/// Authenticated principal attached to request extensions
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: Uuid,
    pub username: String,
    pub avatar: Option<String>,
}

impl From<Principal> for CurrentUser {
    fn from(principal: Principal) -> Self {
        Self {
            id: principal.id,
            username: principal.username,
            avatar: principal.avatar,
        }
    }
}

/// Why authentication failed. Internal only; the client sees one 401.
#[derive(Debug)]
enum AuthFailure {
    MissingCredential,
    InvalidToken(jsonwebtoken::errors::Error),
    UnknownPrincipal(Uuid),
    SecretMissing,
    Store(DatabaseError),
}

impl std::fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthFailure::MissingCredential => write!(f, "no credential supplied"),
            AuthFailure::InvalidToken(e) => write!(f, "invalid or expired credential: {}", e),
            AuthFailure::UnknownPrincipal(id) => write!(f, "principal {} no longer exists", id),
            AuthFailure::SecretMissing => write!(f, "ACCESS_TOKEN_SECRET not configured"),
            AuthFailure::Store(e) => write!(f, "principal lookup failed: {}", e),
        }
    }
}

/// JWT authentication middleware. Verifies the bearer credential, resolves it
/// to a [`CurrentUser`] and injects it into request extensions. Handlers
/// behind this layer may rely on the extension being present.
pub async fn jwt_auth_middleware(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    match authenticate(&headers).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            Ok(next.run(request).await)
        }
        Err(failure) => {
            tracing::debug!(reason = %failure, "rejected request credential");
            Err(rejection_for(&failure))
        }
    }
}

/// Map an internal failure to the client-visible error. Credential problems
/// all collapse to the same 401; server-side problems surface as 5xx.
fn rejection_for(failure: &AuthFailure) -> ApiError {
    match failure {
        AuthFailure::MissingCredential
        | AuthFailure::InvalidToken(_)
        | AuthFailure::UnknownPrincipal(_) => ApiError::unauthorized(UNAUTHORIZED_MESSAGE),
        AuthFailure::SecretMissing => {
            tracing::error!("JWT secret not configured");
            ApiError::internal_server_error("Server configuration error")
        }
        AuthFailure::Store(err) => {
            tracing::error!("principal lookup failed: {}", err);
            ApiError::internal_server_error("An error occurred while processing your request")
        }
    }
}

async fn authenticate(headers: &HeaderMap) -> Result<CurrentUser, AuthFailure> {
    // No store round-trip happens unless the token verifies first
    let token = extract_token(headers).ok_or(AuthFailure::MissingCredential)?;
    let claims = verify_token(&token)?;

    let principal = find_principal(claims.sub)
        .await
        .map_err(AuthFailure::Store)?
        .ok_or(AuthFailure::UnknownPrincipal(claims.sub))?;

    Ok(CurrentUser::from(principal))
}

/// Extract the credential: accessToken cookie first, Bearer header fallback
fn extract_token(headers: &HeaderMap) -> Option<String> {
    cookie_token(headers).or_else(|| bearer_token(headers))
}

fn cookie_token(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == ACCESS_TOKEN_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = auth.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

fn verify_token(token: &str) -> Result<Claims, AuthFailure> {
    let secret = &config::config().security.jwt_secret;
    if secret.is_empty() {
        return Err(AuthFailure::SecretMissing);
    }
    verify_token_with(token, secret).map_err(AuthFailure::InvalidToken)
}

/// Signature and expiry check against an explicit secret. `Validation`
/// rejects expired tokens; malformed, tampered and expired tokens all come
/// back as the same error type.
fn verify_token_with(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())?;
    Ok(token_data.claims)
}

/// Resolve the subject claim against the users table. The projection excludes
/// password_hash and refresh_token.
async fn find_principal(id: Uuid) -> Result<Option<Principal>, DatabaseError> {
    let pool = DatabaseManager::pool().await?;
    let sql = format!("SELECT {} FROM users WHERE id = $1", PRINCIPAL_COLUMNS);
    let principal = sqlx::query_as::<_, Principal>(&sql)
        .bind(id)
        .fetch_optional(&pool)
        .await?;
    Ok(principal)
}
