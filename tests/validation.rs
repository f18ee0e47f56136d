use storefront_api::validation::{
    is_numeric, is_strong_password, is_valid_email, is_valid_phone, is_valid_zip,
};

#[test]
fn emails() {
    assert!(is_valid_email("jane.doe+shop@example.co.in"));
    assert!(!is_valid_email("jane@example"));
    assert!(!is_valid_email("@example.com"));
    assert!(!is_valid_email("jane example@example.com"));
}

#[test]
fn phones_and_zips() {
    assert!(is_valid_phone("9876543210"));
    assert!(!is_valid_phone("98765-4321"));
    assert!(!is_valid_phone("987654321"));
    assert!(is_valid_zip("560001"));
    assert!(!is_valid_zip("56000"));
    assert!(!is_valid_zip("56000a"));
    assert!(!is_numeric(""));
}

#[test]
fn passwords() {
    assert!(is_strong_password("User@1234"));
    assert!(!is_strong_password("User1234"));
    assert!(!is_strong_password("User@abc"));
    assert!(!is_strong_password("U@1"));
}
