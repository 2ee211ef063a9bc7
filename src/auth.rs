use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    config::AppConfig,
    error::AppError,
    models::has_admin_role,
    query,
    repository::{Collection, Repository, RepositoryState},
};

/// Lifetime of every issued token.
pub const TOKEN_TTL_HOURS: i64 = 1;

/// Claims
///
/// The payload carried inside a bearer token. Besides the standard timestamps it
/// holds the subject's email and whatever other fields the client sent to POST /jwt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// The authenticated subject. Used for the admin lookup and the self check.
    #[serde(default)]
    pub email: String,
    /// Issued At (iat), seconds since the epoch.
    pub iat: i64,
    /// Expiration Time (exp), seconds since the epoch.
    pub exp: i64,
    /// Any other caller-supplied fields, signed as given.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    /// Builds claims from a token request body, valid for [`TOKEN_TTL_HOURS`] from now.
    ///
    /// Body fields named `iat` or `exp` are discarded in favor of server timestamps.
    /// A body without a string `email` yields an empty subject.
    pub fn from_payload(mut payload: Map<String, Value>) -> Self {
        let email = match payload.remove("email") {
            Some(Value::String(email)) => email,
            _ => String::new(),
        };
        payload.remove("iat");
        payload.remove("exp");

        let now = Utc::now();
        Self {
            email,
            iat: now.timestamp(),
            exp: (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
            extra: payload,
        }
    }
}

/// Signs `claims` with the shared secret (HS256).
pub fn sign(claims: &Claims, secret: &str) -> Result<String, AppError> {
    let key = EncodingKey::from_secret(secret.as_bytes());
    Ok(encode(&Header::new(Algorithm::HS256), claims, &key)?)
}

/// Token Verifier
///
/// Validates the raw `Authorization` header value and returns the decoded claims.
/// Anything other than a well-formed, unexpired, correctly signed `Bearer` token is
/// `AppError::Unauthenticated`.
pub fn verify_bearer(authorization: Option<&str>, secret: &str) -> Result<Claims, AppError> {
    let token = authorization
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AppError::Unauthenticated)?;

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    // No clock skew: a token is dead the second it expires.
    validation.leeway = 0;
    // Tokens carry arbitrary client fields; an `aud` among them must not fail validation.
    validation.validate_aud = false;

    let key = DecodingKey::from_secret(secret.as_bytes());
    decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!(error = %e, "rejected bearer token");
            AppError::Unauthenticated
        })
}

/// Role Gate
///
/// Passes only when the user record for `claims.email` exists and has the admin role.
/// Must run after [`verify_bearer`] has succeeded.
pub async fn require_admin(repo: &dyn Repository, claims: &Claims) -> Result<(), AppError> {
    let user = repo
        .find_one(Collection::Users, query::email_filter(Some(claims.email.as_str())))
        .await?;

    if user.as_ref().is_some_and(has_admin_role) {
        Ok(())
    } else {
        tracing::warn!(email = %claims.email, "admin check failed");
        Err(AppError::Forbidden("Unauthorized"))
    }
}

/// Self check for GET /users/admin/{email}: the path email must equal the token's
/// email exactly. This is not the role gate.
pub fn require_self(claims: &Claims, email: &str) -> Result<(), AppError> {
    if claims.email == email {
        Ok(())
    } else {
        Err(AppError::Forbidden("Forbidden"))
    }
}

/// AuthUser
///
/// The verified identity of a request. Extracting it runs the Token Verifier; on
/// failure the request is rejected with 401 before the handler runs.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub claims: Claims,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);

        let authorization = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        let claims = verify_bearer(authorization, &config.jwt_secret)?;
        Ok(AuthUser { claims })
    }
}

/// AdminUser
///
/// An `AuthUser` that also passed the Role Gate: 401 if the token is bad, 403 if the
/// subject is not an admin.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub claims: Claims,
}

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser { claims } = AuthUser::from_request_parts(parts, state).await?;

        let repo = RepositoryState::from_ref(state);
        require_admin(repo.as_ref(), &claims).await?;

        Ok(AdminUser { claims })
    }
}
