use chrono::{Duration, Utc};
use storefront_api::pricing::{self, CouponRejection, CouponTerms, PricedLine};

fn line(product_id: i64, quantity: i32, unit_price: i64, offer: Option<i32>) -> PricedLine {
    PricedLine {
        product_id,
        quantity,
        unit_price,
        offer_percentage: offer,
    }
}

fn coupon(pct: i32, max: i64, min: i64) -> CouponTerms {
    let now = Utc::now();
    CouponTerms {
        code: "MIN50".into(),
        discount_percentage: pct,
        max_discount_amount: max,
        min_order_amount: min,
        usage_limit: 5,
        used_count: 0,
        starts_at: now - Duration::days(1),
        ends_at: now + Duration::days(1),
    }
}

#[test]
fn offer_discount_applies_per_line() {
    let lines = vec![line(1, 2, 10_000, Some(10))];
    let quote = pricing::quote(&lines, None, Utc::now()).expect("quote");

    assert_eq!(quote.subtotal, 20_000);
    assert_eq!(quote.offer_discount, 2_000);
    assert_eq!(quote.coupon_discount, 0);
    assert_eq!(quote.total, 18_000);
}

#[test]
fn coupon_discount_is_capped() {
    let terms = coupon(10, 3_000, 5_000);
    let lines = vec![line(1, 1, 40_000, None)];
    let quote = pricing::quote(&lines, Some(&terms), Utc::now()).expect("quote");

    assert_eq!(quote.coupon_discount, 3_000);
    assert_eq!(quote.total, 37_000);
}

#[test]
fn coupon_and_offer_discounts_add_up() {
    let terms = coupon(10, 100_000, 0);
    let lines = vec![line(1, 1, 10_000, Some(50)), line(2, 2, 5_000, None)];
    let quote = pricing::quote(&lines, Some(&terms), Utc::now()).expect("quote");

    assert_eq!(quote.subtotal, 20_000);
    assert_eq!(quote.coupon_discount, 2_000);
    assert_eq!(quote.offer_discount, 5_000);
    assert_eq!(quote.total, 13_000);
}

#[test]
fn total_never_goes_negative() {
    let terms = coupon(100, 100_000, 0);
    let lines = vec![line(1, 1, 1_000, Some(100))];
    let quote = pricing::quote(&lines, Some(&terms), Utc::now()).expect("quote");

    assert_eq!(quote.coupon_discount + quote.offer_discount, 2_000);
    assert_eq!(quote.total, 0);
}

#[test]
fn coupon_rejections() {
    let now = Utc::now();

    let mut expired = coupon(10, 1_000, 0);
    expired.ends_at = now - Duration::hours(1);
    assert_eq!(
        expired.discount_for(10_000, now),
        Err(CouponRejection::OutsideValidityWindow)
    );

    let mut not_started = coupon(10, 1_000, 0);
    not_started.starts_at = now + Duration::hours(1);
    assert_eq!(
        not_started.discount_for(10_000, now),
        Err(CouponRejection::OutsideValidityWindow)
    );

    let mut used_up = coupon(10, 1_000, 0);
    used_up.used_count = used_up.usage_limit;
    assert_eq!(
        used_up.discount_for(10_000, now),
        Err(CouponRejection::UsageLimitReached)
    );

    let minimum = coupon(10, 1_000, 5_000);
    assert_eq!(
        minimum.discount_for(4_999, now),
        Err(CouponRejection::BelowMinimumOrder)
    );
    assert_eq!(minimum.discount_for(5_000, now), Ok(500));
}

#[test]
fn rejected_coupon_fails_the_quote() {
    let mut terms = coupon(10, 1_000, 0);
    terms.used_count = terms.usage_limit;
    let lines = vec![line(1, 1, 10_000, None)];

    assert_eq!(
        pricing::quote(&lines, Some(&terms), Utc::now()),
        Err(CouponRejection::UsageLimitReached)
    );
}

#[test]
fn percent_of_truncates() {
    assert_eq!(pricing::percent_of(999, 10), 99);
    assert_eq!(pricing::percent_of(0, 50), 0);
}
