use storefront_api::order_state::{
    OrderStatus, PaymentMethod, PaymentStatus, TransitionError, check_admin_transition,
    check_user_cancel, refund_due, releases_stock,
};

#[test]
fn statuses_parse_their_stored_names() {
    for status in [
        OrderStatus::Pending,
        OrderStatus::PendingCodVerification,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
        OrderStatus::Returned,
    ] {
        assert_eq!(OrderStatus::parse(status.as_str()), Ok(status));
    }
    assert_eq!(
        OrderStatus::parse("Lost"),
        Err(TransitionError::UnknownStatus("Lost".into()))
    );
    assert_eq!(PaymentStatus::parse("Completed"), Some(PaymentStatus::Completed));
    assert_eq!(PaymentStatus::parse("completed"), None);
}

#[test]
fn admin_transitions() {
    use OrderStatus::*;

    assert!(check_admin_transition(Pending, Shipped).is_ok());
    assert!(check_admin_transition(Shipped, Delivered).is_ok());
    assert!(check_admin_transition(Pending, Cancelled).is_ok());
    assert!(check_admin_transition(Delivered, Returned).is_ok());
    assert!(check_admin_transition(Cancelled, Returned).is_ok());

    assert_eq!(
        check_admin_transition(Pending, PendingCodVerification),
        Err(TransitionError::NotAssignable(PendingCodVerification))
    );
    assert_eq!(
        check_admin_transition(Delivered, Cancelled),
        Err(TransitionError::Illegal {
            from: Delivered,
            to: Cancelled
        })
    );
    assert_eq!(
        check_admin_transition(Cancelled, Shipped),
        Err(TransitionError::Illegal {
            from: Cancelled,
            to: Shipped
        })
    );
    assert_eq!(
        check_admin_transition(Returned, Returned),
        Err(TransitionError::AlreadyInStatus(Returned))
    );
}

#[test]
fn owner_cancellation() {
    assert!(check_user_cancel(OrderStatus::Pending).is_ok());
    assert!(check_user_cancel(OrderStatus::PendingCodVerification).is_ok());
    assert!(check_user_cancel(OrderStatus::Shipped).is_ok());
    assert_eq!(
        check_user_cancel(OrderStatus::Cancelled),
        Err(TransitionError::AlreadyInStatus(OrderStatus::Cancelled))
    );
    assert!(check_user_cancel(OrderStatus::Delivered).is_err());
    assert!(check_user_cancel(OrderStatus::Returned).is_err());
}

#[test]
fn refunds_only_for_collected_payments() {
    assert!(refund_due(OrderStatus::Cancelled, PaymentStatus::Paid));
    assert!(refund_due(OrderStatus::Returned, PaymentStatus::Completed));
    assert!(!refund_due(OrderStatus::Cancelled, PaymentStatus::Pending));
    assert!(!refund_due(OrderStatus::Cancelled, PaymentStatus::Processing));
    assert!(!refund_due(OrderStatus::Shipped, PaymentStatus::Paid));
}

#[test]
fn payment_methods() {
    assert_eq!(PaymentMethod::parse("COD"), PaymentMethod::Cod);
    assert_eq!(PaymentMethod::parse("PayPal"), PaymentMethod::Gateway);
    assert_eq!(PaymentMethod::parse("wallet"), PaymentMethod::Wallet);
    assert_eq!(
        PaymentMethod::parse(" bank transfer "),
        PaymentMethod::Offline("bank transfer".into())
    );
    assert_eq!(PaymentMethod::Gateway.as_str(), "paypal");

    assert!(!PaymentMethod::Cod.redeems_coupons());
    assert!(PaymentMethod::Wallet.redeems_coupons());
    assert!(PaymentMethod::Gateway.redeems_coupons());
}

#[test]
fn initial_statuses_per_method() {
    assert_eq!(
        PaymentMethod::Cod.initial_statuses(),
        (OrderStatus::PendingCodVerification, PaymentStatus::Pending)
    );
    assert_eq!(
        PaymentMethod::Wallet.initial_statuses(),
        (OrderStatus::Pending, PaymentStatus::Paid)
    );
    assert_eq!(
        PaymentMethod::Gateway.initial_statuses(),
        (OrderStatus::Pending, PaymentStatus::Processing)
    );
    assert_eq!(
        PaymentMethod::Offline("upi".into()).initial_statuses(),
        (OrderStatus::Pending, PaymentStatus::Processing)
    );
}

#[test]
fn stock_returns_only_for_goods_still_in_the_warehouse() {
    use OrderStatus::*;

    assert!(releases_stock(Pending, Cancelled));
    assert!(releases_stock(Shipped, Cancelled));
    assert!(releases_stock(Pending, Returned));
    assert!(releases_stock(PendingCodVerification, Returned));

    assert!(!releases_stock(Shipped, Returned));
    assert!(!releases_stock(Delivered, Returned));
    assert!(!releases_stock(Cancelled, Returned));
    assert!(!releases_stock(Pending, Shipped));
}
