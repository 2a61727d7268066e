use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::{header, request::Parts},
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use sea_orm::EntityTrait;
use uuid::Uuid;

use crate::{
    dto::auth::Claims,
    entity::Users,
    error::{AppError, AppResult},
    models::{AccountStatus, Role, VerificationStatus},
    state::AppState,
};

/// Caller identity, re-read from the database on every request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    pub verification: VerificationStatus,
}

pub fn ensure_role(user: &AuthUser, role: Role) -> Result<(), AppError> {
    if user.role != role {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, Role::Admin)
}

pub fn ensure_buyer(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, Role::Buyer)
}

pub fn ensure_seller(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, Role::Seller)
}

/// Sellers may only list products once an admin has verified them.
pub fn ensure_verified_seller(user: &AuthUser) -> Result<(), AppError> {
    ensure_seller(user)?;
    if user.verification != VerificationStatus::Verified {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn decode_token(token: &str, secret: &str) -> AppResult<Claims> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;
    Ok(decoded.claims)
}

fn bearer_token(parts: &Parts) -> AppResult<Option<&str>> {
    let Some(auth_header) = parts.headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;

    let token = auth_str
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Invalid Authorization scheme".into()))?
        .trim();
    Ok(Some(token))
}

/// Resolve verified claims against the current `users` row.
pub async fn authenticate(state: &AppState, claims: &Claims) -> AppResult<AuthUser> {
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Unauthorized("Invalid user id in token".into()))?;

    let user = Users::find_by_id(user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Account no longer exists".into()))?;

    if !user.email.eq_ignore_ascii_case(&claims.email) {
        return Err(AppError::Unauthorized("Token does not match account".into()));
    }
    if user.status_akun.parse::<AccountStatus>()? != AccountStatus::Active {
        return Err(AppError::Forbidden);
    }

    Ok(AuthUser {
        user_id: user.id,
        email: user.email,
        role: user.role.parse()?,
        verification: user.status_verifikasi.parse()?,
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;
        let claims = decode_token(token, &state.config.jwt_secret)?;
        authenticate(state, &claims).await
    }
}

impl OptionalFromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        let Some(token) = bearer_token(parts)? else {
            return Ok(None);
        };
        let claims = decode_token(token, &state.config.jwt_secret)?;
        authenticate(state, &claims).await.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role, verification: VerificationStatus) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            email: "someone@campus.ac.id".into(),
            role,
            verification,
        }
    }

    #[test]
    fn admin_guard_rejects_other_roles() {
        assert!(ensure_admin(&user(Role::Admin, VerificationStatus::Verified)).is_ok());
        assert!(matches!(
            ensure_admin(&user(Role::Buyer, VerificationStatus::Verified)),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn pending_seller_cannot_list_products() {
        assert!(ensure_verified_seller(&user(Role::Seller, VerificationStatus::Pending)).is_err());
        assert!(ensure_verified_seller(&user(Role::Seller, VerificationStatus::Rejected)).is_err());
        assert!(ensure_verified_seller(&user(Role::Seller, VerificationStatus::Verified)).is_ok());
        assert!(ensure_verified_seller(&user(Role::Buyer, VerificationStatus::Verified)).is_err());
    }

    #[test]
    fn garbage_token_is_unauthorized() {
        let err = decode_token("not.a.jwt", "0123456789abcdef0123456789abcdef").unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
