mod common;

use std::sync::Arc;

use jsonwebtoken::{DecodingKey, Validation, decode};
use storefront_api::{
    dto::auth::{Claims, LoginRequest, ResendOtpRequest, SignupRequest, VerifyOtpRequest},
    error::AppError,
    otp::{MemoryOtpStore, OtpService, OtpStore},
    services::{admin_service, auth_service},
};

fn signup_request(email: &str, phone: &str) -> SignupRequest {
    SignupRequest {
        name: "Jane Doe".into(),
        email: email.into(),
        phone: phone.into(),
        password: "Secret@123".into(),
    }
}

fn login_request() -> LoginRequest {
    LoginRequest {
        email: "Jane@Example.com".into(),
        password: "Secret@123".into(),
    }
}

#[tokio::test]
async fn signup_verify_and_login() -> anyhow::Result<()> {
    let Some(mut state) = common::setup_state().await? else {
        return Ok(());
    };
    let otp_store = Arc::new(MemoryOtpStore::new());
    state.otp = OtpService::new(otp_store.clone());

    let user = auth_service::signup(&state, signup_request("jane@example.com", "9123456780"))
        .await?
        .data
        .expect("user");
    assert!(!user.verified);

    let err = auth_service::signup(&state, signup_request("jane@example.com", "9000000000"))
        .await
        .expect_err("duplicate email");
    assert!(matches!(err, AppError::Conflict(_)));
    let err = auth_service::signup(&state, signup_request("weak@example.com", "123"))
        .await
        .expect_err("bad phone");
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = auth_service::login(&state, login_request())
        .await
        .expect_err("unverified login");
    assert!(matches!(err, AppError::Forbidden));

    let err = auth_service::resend_otp(
        &state,
        ResendOtpRequest {
            email: "jane@example.com".into(),
        },
    )
    .await
    .expect_err("resend right after signup");
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = auth_service::verify_otp(
        &state,
        VerifyOtpRequest {
            email: "jane@example.com".into(),
            otp: "000000x".into(),
        },
    )
    .await
    .expect_err("wrong otp");
    assert!(matches!(err, AppError::Unauthorized(_)));

    let code = otp_store
        .get("jane@example.com")
        .await?
        .expect("issued otp")
        .code;
    let verified = auth_service::verify_otp(
        &state,
        VerifyOtpRequest {
            email: "jane@example.com".into(),
            otp: code,
        },
    )
    .await?
    .data
    .expect("user");
    assert!(verified.verified);

    let err = auth_service::login(
        &state,
        LoginRequest {
            email: "jane@example.com".into(),
            password: "Wrong@123".into(),
        },
    )
    .await
    .expect_err("wrong password");
    assert!(matches!(err, AppError::Unauthorized(_)));

    let token = auth_service::login(&state, login_request())
        .await?
        .data
        .expect("token")
        .token;
    let raw = token.strip_prefix("Bearer ").expect("bearer prefix");
    let claims = decode::<Claims>(
        raw,
        &DecodingKey::from_secret(state.config.jwt_secret.as_bytes()),
        &Validation::default(),
    )?
    .claims;
    assert_eq!(claims.user_id, user.id);
    assert_eq!(claims.sub, "jane@example.com");

    admin_service::block_user(&state, &common::admin(), user.id).await?;
    let err = auth_service::login(&state, login_request())
        .await
        .expect_err("blocked login");
    assert!(matches!(err, AppError::Forbidden));
    let err = admin_service::block_user(&state, &common::admin(), user.id)
        .await
        .expect_err("already blocked");
    assert!(matches!(err, AppError::Conflict(_)));

    Ok(())
}
