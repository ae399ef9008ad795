//! JWT authentication module.
//!
//! Handles token issuing at login, bearer validation, role gates and
//! password hashing.
//!
//! ## Request Flow
//! ```text
//! Authorization: Bearer <jwt>
//!       │
//!       ▼
//! require_auth ── missing/invalid/expired ──► 401
//!       │ inserts CurrentUser extension
//!       ▼
//! require_staff / require_admin ── wrong role ──► 403
//!       │
//!       ▼
//! handler (Extension<CurrentUser>)
//! ```

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::error::ApiError;
use crate::AppState;
use carniceria_core::{Customer, Role};

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (customer id)
    pub sub: String,

    pub email: String,

    pub rol: Role,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

/// JWT token manager.
#[derive(Clone)]
pub struct JwtManager {
    secret: String,
    lifetime_secs: i64,
}

impl std::fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtManager")
            .field("lifetime_secs", &self.lifetime_secs)
            .finish_non_exhaustive()
    }
}

impl JwtManager {
    pub fn new(secret: String, lifetime_secs: i64) -> Self {
        JwtManager {
            secret,
            lifetime_secs,
        }
    }

    /// Issues a token for a logged-in account.
    pub fn generate_token(&self, customer: &Customer) -> Result<String, ApiError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.lifetime_secs);

        let claims = Claims {
            sub: customer.id.to_string(),
            email: customer.email.clone(),
            rol: customer.role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ApiError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Validate and decode a token.
    pub fn validate_token(&self, token: &str) -> Result<Claims, ApiError> {
        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => ApiError::Unauthorized("Token expired".to_string()),
            _ => ApiError::Unauthorized("Invalid token".to_string()),
        })?;

        Ok(token_data.claims)
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

// =============================================================================
// Current User
// =============================================================================

/// The authenticated caller, inserted into request extensions by
/// [`require_auth`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
    pub email: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }

    /// Staff may act on anyone; a customer only on itself.
    pub fn ensure_can_act_for(&self, customer_id: i64) -> Result<(), ApiError> {
        if self.is_staff() || self.id == customer_id {
            Ok(())
        } else {
            warn!(user_id = self.id, customer_id, "Cross-customer access denied");
            Err(ApiError::Forbidden("Not allowed to act for this customer".to_string()))
        }
    }
}

impl TryFrom<Claims> for CurrentUser {
    type Error = ApiError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let id = claims
            .sub
            .parse()
            .map_err(|_| ApiError::Unauthorized("Invalid token".to_string()))?;
        Ok(CurrentUser {
            id,
            email: claims.email,
            role: claims.rol,
        })
    }
}

// =============================================================================
// Middleware
// =============================================================================

/// Requires a valid bearer token and injects [`CurrentUser`].
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match header {
        Some(header) => extract_bearer_token(header)
            .ok_or_else(|| ApiError::Unauthorized("Invalid authorization header".to_string()))?,
        None => {
            warn!(uri = %req.uri(), "Missing bearer token");
            return Err(ApiError::Unauthorized("Authentication required".to_string()));
        }
    };

    let claims = state.jwt.validate_token(token).map_err(|e| {
        warn!(uri = %req.uri(), error = %e, "Token rejected");
        e
    })?;
    let user = CurrentUser::try_from(claims)?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Requires `empleado` or `admin`. Must run after [`require_auth`].
pub async fn require_staff(req: Request, next: Next) -> Result<Response, ApiError> {
    require_role(req, next, Role::is_staff).await
}

/// Requires `admin`. Must run after [`require_auth`].
pub async fn require_admin(req: Request, next: Next) -> Result<Response, ApiError> {
    require_role(req, next, |role| *role == Role::Admin).await
}

async fn require_role(
    req: Request,
    next: Next,
    allowed: impl Fn(&Role) -> bool,
) -> Result<Response, ApiError> {
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;

    if !allowed(&user.role) {
        warn!(
            user_id = user.id,
            role = user.role.as_str(),
            uri = %req.uri(),
            "Permission denied"
        );
        return Err(ApiError::Forbidden("Insufficient permissions".to_string()));
    }

    Ok(next.run(req).await)
}

// =============================================================================
// Passwords
// =============================================================================

/// Hash a password for storage (Argon2id PHC string).
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    use argon2::{
        password_hash::{rand_core::OsRng, SaltString},
        Argon2, PasswordHasher,
    };

    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

/// Verify a password against its stored hash. A malformed hash never
/// verifies.
pub fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};

    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn customer(role: Role) -> Customer {
        Customer {
            id: 7,
            first_name: "Ana".to_string(),
            last_name: None,
            email: "ana@example.com".to_string(),
            phone: None,
            address: None,
            role,
            created_at: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test-secret".to_string(), 3600);
        let token = manager.generate_token(&customer(Role::Employee)).unwrap();

        let claims = manager.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "7");
        assert_eq!(claims.rol, Role::Employee);

        let user = CurrentUser::try_from(claims).unwrap();
        assert_eq!(user.id, 7);
        assert!(user.is_staff());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = JwtManager::new("secret-a".to_string(), 3600);
        let verifier = JwtManager::new("secret-b".to_string(), 3600);
        let token = issuer.generate_token(&customer(Role::Customer)).unwrap();

        assert!(matches!(
            verifier.validate_token(&token),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        // Beyond the default 60 s leeway
        let manager = JwtManager::new("test-secret".to_string(), -3600);
        let token = manager.generate_token(&customer(Role::Customer)).unwrap();

        let err = manager.validate_token(&token).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(msg) if msg.contains("expired")));
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
    }

    #[test]
    fn test_customer_can_only_act_for_itself() {
        let me = CurrentUser {
            id: 3,
            email: "a@b.c".to_string(),
            role: Role::Customer,
        };
        assert!(me.ensure_can_act_for(3).is_ok());
        assert!(matches!(me.ensure_can_act_for(4), Err(ApiError::Forbidden(_))));

        let admin = CurrentUser {
            role: Role::Admin,
            ..me
        };
        assert!(admin.ensure_can_act_for(4).is_ok());
    }

    #[test]
    fn test_password_hash_and_verify() {
        let hash = hash_password("s3creto").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("s3creto", &hash));
        assert!(!verify_password("otro", &hash));
        assert!(!verify_password("s3creto", "not-a-phc-string"));
    }
}
