use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    audit,
    dto::auth::{
        Claims, LoginRequest, LoginResponse, Profile, RegisterRequest, RegisterSellerRequest,
        SellerRegistration,
    },
    entity::{
        tokos::{ActiveModel as TokoActive, Column as TokoCol, Entity as Tokos},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{AccountStatus, Role, Toko, User, VerificationStatus},
    response::ApiResponse,
    services::validate,
    state::AppState,
};

const EMAIL_TAKEN: &str = "Email is already taken";
const INVALID_CREDENTIALS: &str = "Invalid email or password";

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Sign a token for `user` valid for `ttl_hours`.
pub fn issue_token(
    user_id: Uuid,
    email: &str,
    role: Role,
    secret: &str,
    ttl_hours: i64,
) -> AppResult<(String, DateTime<Utc>)> {
    let expires_at = Utc::now()
        .checked_add_signed(Duration::hours(ttl_hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        role: role.as_str().to_string(),
        exp: expires_at.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;

    Ok((token, expires_at))
}

async fn ensure_email_free<C: ConnectionTrait>(conn: &C, email: &str) -> AppResult<()> {
    let exist = Users::find()
        .filter(UserCol::Email.eq(email))
        .one(conn)
        .await?;
    if exist.is_some() {
        return Err(AppError::Conflict(EMAIL_TAKEN.into()));
    }
    Ok(())
}

fn new_user(
    name: String,
    email: String,
    password_hash: String,
    phone: Option<String>,
    role: Role,
    verification: VerificationStatus,
) -> UserActive {
    UserActive {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        email: Set(email),
        password_hash: Set(password_hash),
        phone: Set(phone),
        role: Set(role.as_str().into()),
        status_akun: Set(AccountStatus::Active.as_str().into()),
        status_verifikasi: Set(verification.as_str().into()),
        created_at: NotSet,
        updated_at: NotSet,
    }
}

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<User>> {
    let name = validate::required("name", &payload.name)?;
    let email = validate::email(&payload.email)?;
    validate::password(&payload.password)?;

    ensure_email_free(&state.orm, &email).await?;

    let user = new_user(
        name,
        email,
        hash_password(&payload.password)?,
        validate::optional(payload.phone),
        Role::Buyer,
        VerificationStatus::Verified,
    )
    .insert(&state.orm)
    .await
    .map_err(|e| AppError::conflict_on_unique(e, EMAIL_TAKEN))?;

    audit::record(
        &state.orm,
        Some(user.id),
        "user_register",
        "users",
        serde_json::json!({ "user_id": user.id, "role": user.role }),
    )
    .await;

    Ok(ApiResponse::ok("User created", User::from(user)))
}

pub async fn register_seller(
    state: &AppState,
    payload: RegisterSellerRequest,
) -> AppResult<ApiResponse<SellerRegistration>> {
    let name = validate::required("name", &payload.name)?;
    let email = validate::email(&payload.email)?;
    validate::password(&payload.password)?;
    let shop_name = validate::required("shop_name", &payload.shop_name)?;
    let password_hash = hash_password(&payload.password)?;

    let txn = state.orm.begin().await?;
    ensure_email_free(&txn, &email).await?;

    let user = new_user(
        name,
        email,
        password_hash,
        validate::optional(payload.phone),
        Role::Seller,
        VerificationStatus::Pending,
    )
    .insert(&txn)
    .await
    .map_err(|e| AppError::conflict_on_unique(e, EMAIL_TAKEN))?;

    let toko = TokoActive {
        id: Set(Uuid::new_v4()),
        seller_id: Set(user.id),
        name: Set(shop_name),
        description: Set(validate::optional(payload.shop_description)),
        address: Set(validate::optional(payload.shop_address)),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    tracing::info!(seller_id = %user.id, "seller registered, awaiting verification");
    audit::record(
        &state.orm,
        Some(user.id),
        "seller_register",
        "users",
        serde_json::json!({ "user_id": user.id, "toko_id": toko.id }),
    )
    .await;

    Ok(ApiResponse::ok(
        "Seller registered, awaiting verification",
        SellerRegistration {
            user: User::from(user),
            toko: Toko::from(toko),
        },
    ))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let email = payload.email.trim().to_lowercase();
    let user: Option<UserModel> = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;

    let user = match user {
        Some(u) => u,
        None => return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into())),
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    if user.status_akun.parse::<AccountStatus>()? != AccountStatus::Active {
        tracing::info!(user_id = %user.id, "login refused for inactive account");
        return Err(AppError::Forbidden);
    }

    let role: Role = user.role.parse()?;
    let (token, expires_at) = issue_token(
        user.id,
        &user.email,
        role,
        &state.config.jwt_secret,
        state.config.jwt_ttl_hours,
    )?;

    audit::record(
        &state.orm,
        Some(user.id),
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::ok(
        "Logged in",
        LoginResponse {
            token,
            token_type: "Bearer".into(),
            expires_at,
            user: User::from(user),
        },
    ))
}

pub async fn profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Profile>> {
    let model = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let toko = if user.role == Role::Seller {
        Tokos::find()
            .filter(TokoCol::SellerId.eq(user.user_id))
            .one(&state.orm)
            .await?
            .map(Toko::from)
    } else {
        None
    };

    Ok(ApiResponse::ok(
        "Profile",
        Profile {
            user: User::from(model),
            toko,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::auth::decode_token;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn issued_token_decodes_with_same_secret() {
        let id = Uuid::new_v4();
        let (token, expires_at) =
            issue_token(id, "siti@kampus.ac.id", Role::Seller, SECRET, 24).unwrap();
        let claims = decode_token(&token, SECRET).unwrap();

        assert_eq!(claims.sub, id.to_string());
        assert_eq!(claims.email, "siti@kampus.ac.id");
        assert_eq!(claims.role, "seller");
        assert_eq!(claims.exp, expires_at.timestamp() as usize);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let (token, _) =
            issue_token(Uuid::new_v4(), "a@kampus.ac.id", Role::Buyer, SECRET, 1).unwrap();
        assert!(decode_token(&token, "ffffffffffffffffffffffffffffffff").is_err());
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("rahasia123").unwrap();
        assert!(verify_password("rahasia123", &hash).unwrap());
        assert!(!verify_password("salah12345", &hash).unwrap());
    }
}
