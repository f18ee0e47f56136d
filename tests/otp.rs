use std::sync::Arc;

use chrono::{Duration, Utc};
use storefront_api::otp::{
    MemoryOtpStore, OtpEntry, OtpError, OtpService, OtpStore, RESEND_DELAY_SECS, generate_code,
};

const EMAIL: &str = "jane@example.com";

#[tokio::test]
async fn verify_consumes_the_code() -> anyhow::Result<()> {
    let otp = OtpService::new(Arc::new(MemoryOtpStore::new()));
    let code = otp.issue(EMAIL).await?;

    assert!(!otp.verify(EMAIL, "not-it").await?);
    assert!(otp.verify(EMAIL, &code).await?);
    assert!(!otp.verify(EMAIL, &code).await?, "code must be single use");
    Ok(())
}

#[tokio::test]
async fn expired_code_is_rejected() -> anyhow::Result<()> {
    let store = Arc::new(MemoryOtpStore::new());
    let otp = OtpService::new(store.clone());
    let now = Utc::now();
    store
        .put(
            EMAIL,
            OtpEntry {
                code: "123456".into(),
                expires_at: now - Duration::seconds(1),
                last_sent_at: now - Duration::minutes(6),
            },
        )
        .await?;

    assert!(!otp.verify(EMAIL, "123456").await?);
    Ok(())
}

#[tokio::test]
async fn resend_is_throttled() -> anyhow::Result<()> {
    let otp = OtpService::new(Arc::new(MemoryOtpStore::new()));
    otp.issue(EMAIL).await?;

    match otp.resend(EMAIL).await {
        Err(OtpError::ResendTooSoon { seconds }) => assert_eq!(seconds, RESEND_DELAY_SECS),
        other => panic!("expected throttling, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn resend_reuses_a_live_code() -> anyhow::Result<()> {
    let store = Arc::new(MemoryOtpStore::new());
    let otp = OtpService::new(store.clone());
    let now = Utc::now();
    store
        .put(
            EMAIL,
            OtpEntry {
                code: "654321".into(),
                expires_at: now + Duration::minutes(4),
                last_sent_at: now - Duration::seconds(RESEND_DELAY_SECS + 1),
            },
        )
        .await?;

    assert_eq!(otp.resend(EMAIL).await?, "654321");
    assert!(otp.verify(EMAIL, "654321").await?);
    Ok(())
}

#[test]
fn codes_are_six_digits() {
    for _ in 0..50 {
        let code = generate_code();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }
}
