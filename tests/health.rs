use storefront_api::{response::Meta, routes::health::health_check};

#[tokio::test]
async fn health_check_returns_ok() {
    let response = health_check().await;
    assert_eq!(response.0.message, "Health check");

    let data = response.0.data.expect("health data");
    assert_eq!(data.status, "ok");
    assert_eq!(data.version, env!("CARGO_PKG_VERSION"));
}

#[test]
fn meta_counts_pages() {
    assert_eq!(Meta::new(1, 20, 0).total_pages, Some(0));
    assert_eq!(Meta::new(1, 20, 20).total_pages, Some(1));
    assert_eq!(Meta::new(2, 20, 41).total_pages, Some(3));
    assert_eq!(Meta::empty().total_pages, None);
}
