mod common;

use storefront_api::{dto::users::UpdateProfileRequest, error::AppError, services::profile_service};

fn update(name: &str, phone: &str) -> UpdateProfileRequest {
    UpdateProfileRequest {
        name: name.to_string(),
        phone: phone.to_string(),
    }
}

#[tokio::test]
async fn profile_shows_and_updates_contact_details() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };

    let user = common::create_user(&state, "profile@example.com", "9000000041", 0).await?;
    common::create_user(&state, "other@example.com", "9000000042", 0).await?;

    let profile = profile_service::show_profile(&state, &user)
        .await?
        .data
        .expect("profile");
    assert_eq!(profile.name, "Test User");
    assert_eq!(profile.email, "profile@example.com");
    assert_eq!(profile.phone, "9000000041");

    let updated =
        profile_service::update_profile(&state, &user, update("  Asha Nair ", " 9000000049 "))
            .await?
            .data
            .expect("updated profile");
    assert_eq!(updated.name, "Asha Nair");
    assert_eq!(updated.phone, "9000000049");
    assert_eq!(updated.email, "profile@example.com");

    let err = profile_service::update_profile(&state, &user, update("  Al ", "9000000049"))
        .await
        .expect_err("short name must be rejected");
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = profile_service::update_profile(&state, &user, update("Asha", "90000-0004"))
        .await
        .expect_err("phone must be 10 digits");
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = profile_service::update_profile(&state, &user, update("Asha", "9000000042"))
        .await
        .expect_err("phone of another account must be rejected");
    assert!(matches!(err, AppError::Conflict(_)));

    // Keeping one's own phone is fine.
    profile_service::update_profile(&state, &user, update("Asha N", "9000000049")).await?;
    let profile = profile_service::show_profile(&state, &user)
        .await?
        .data
        .expect("profile");
    assert_eq!(profile.name, "Asha N");
    assert_eq!(profile.phone, "9000000049");

    Ok(())
}
