use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, EntityTrait, QueryFilter, Set,
};
use serde::Serialize;

use crate::{
    audit,
    dto::auth::{
        AdminClaims, AdminLoginRequest, Claims, LoginRequest, LoginResponse, ResendOtpRequest,
        SignupRequest, VerifyOtpRequest,
    },
    entity::{
        admins::{Column as AdminCol, Entity as Admins},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::ADMIN_SUBJECT,
    models::User,
    response::{ApiResponse, Meta},
    state::AppState,
    validation,
};

const USER_TOKEN_HOURS: i64 = 24;
const ADMIN_TOKEN_HOURS: i64 = 3;
const ADMIN_ISSUER: &str = "storefront-api";

pub async fn signup(state: &AppState, payload: SignupRequest) -> AppResult<ApiResponse<User>> {
    let name = payload.name.trim().to_string();
    let email = payload.email.trim().to_lowercase();
    let phone = payload.phone.trim().to_string();

    if name.chars().count() < 3 {
        return Err(AppError::BadRequest(
            "name must be at least 3 characters".into(),
        ));
    }
    if !validation::is_valid_email(&email) {
        return Err(AppError::BadRequest("invalid email".into()));
    }
    if !validation::is_valid_phone(&phone) {
        return Err(AppError::BadRequest("phone must be 10 digits".into()));
    }
    if !validation::is_strong_password(&payload.password) {
        return Err(AppError::BadRequest(
            "password must be at least 8 characters with a letter, a digit and a symbol".into(),
        ));
    }

    let exist = Users::find()
        .filter(
            Condition::any()
                .add(UserCol::Email.eq(email.as_str()))
                .add(UserCol::Phone.eq(phone.as_str())),
        )
        .one(&state.orm)
        .await?;
    if let Some(existing) = exist {
        let field = if existing.email == email { "email" } else { "phone" };
        return Err(AppError::Conflict(format!("{field} is already registered")));
    }

    let password_hash = hash_password(&payload.password)?;

    let user = UserActive {
        id: NotSet,
        name: Set(name),
        email: Set(email.clone()),
        phone: Set(phone),
        password_hash: Set(password_hash),
        verified: Set(false),
        blocked: Set(false),
        wallet_balance: Set(0),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    let code = state.otp.issue(&email).await?;
    send_otp(state, email, code);

    audit::record(
        state,
        Some(user.id),
        "user_signup",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "User created, verify the otp sent to your email",
        User::from(user),
        None,
    ))
}

pub async fn verify_otp(
    state: &AppState,
    payload: VerifyOtpRequest,
) -> AppResult<ApiResponse<User>> {
    let email = payload.email.trim().to_lowercase();
    if !state.otp.verify(&email, payload.otp.trim()).await? {
        return Err(AppError::Unauthorized("Invalid or expired otp".into()));
    }

    let user = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: UserActive = user.into();
    active.verified = Set(true);
    let user = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Email verified",
        User::from(user),
        Some(Meta::empty()),
    ))
}

pub async fn resend_otp(
    state: &AppState,
    payload: ResendOtpRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let email = payload.email.trim().to_lowercase();
    let user = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    if user.verified {
        return Err(AppError::BadRequest("user is already verified".into()));
    }

    let code = state.otp.resend(&email).await?;
    send_otp(state, email, code);

    Ok(ApiResponse::success(
        "Otp sent",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn login(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { email, password } = payload;
    let email = email.trim().to_lowercase();

    let user = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".into()))?;

    if !password_matches(&user.password_hash, &password)? {
        return Err(AppError::Unauthorized("Invalid email or password".into()));
    }
    if !user.verified || user.blocked {
        return Err(AppError::Forbidden);
    }

    let claims = Claims {
        sub: user.email.clone(),
        user_id: user.id,
        exp: expiry(USER_TOKEN_HOURS)?,
    };
    let token = sign(&claims, &state.config.jwt_secret)?;

    audit::record(
        state,
        Some(user.id),
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            token: format!("Bearer {}", token),
        },
        Some(Meta::empty()),
    ))
}

pub async fn admin_login(
    state: &AppState,
    payload: AdminLoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let admin = Admins::find()
        .filter(AdminCol::Username.eq(payload.username.trim()))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid username or password".into()))?;

    if !password_matches(&admin.password_hash, &payload.password)? {
        return Err(AppError::Unauthorized("Invalid username or password".into()));
    }

    let claims = AdminClaims {
        sub: ADMIN_SUBJECT.to_string(),
        iss: ADMIN_ISSUER.to_string(),
        exp: expiry(ADMIN_TOKEN_HOURS)?,
    };
    let token = sign(&claims, &state.config.admin_jwt_secret)?;

    audit::record(
        state,
        None,
        "admin_login",
        "admins",
        serde_json::json!({ "admin_id": admin.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            token: format!("Bearer {}", token),
        },
        Some(Meta::empty()),
    ))
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

fn password_matches(hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

fn expiry(hours: i64) -> AppResult<usize> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;
    Ok(expiration.timestamp() as usize)
}

fn sign<T: Serialize>(claims: &T, secret: &str) -> AppResult<String> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

/// Mail delivery runs in the background; a failed send only logs.
fn send_otp(state: &AppState, email: String, code: String) {
    let mailer = state.mailer.clone();
    tokio::spawn(async move {
        let body = format!("Your verification code is {code}. It expires in 5 minutes.");
        if let Err(err) = mailer.send(&email, "Your verification code", &body).await {
            tracing::warn!(error = %err, email, "otp mail failed");
        }
    });
}
