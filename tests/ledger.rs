use storefront_api::{
    gateway::gateway_amount,
    services::{
        order_service::next_reference_id,
        wallet_service::{TransactionType, ledger_balance},
    },
};

#[test]
fn ledger_balance_sums_signed_entries() {
    let entries = [("Refund", 5_000), ("Debit", 1_500), ("Refund", 250)];
    assert_eq!(ledger_balance(entries), 3_750);
    assert_eq!(ledger_balance(std::iter::empty::<(&str, i64)>()), 0);
}

#[test]
fn unknown_entry_types_do_not_count() {
    assert_eq!(ledger_balance([("Refund", 100), ("Bonus", 900)]), 100);
}

#[test]
fn transaction_types() {
    assert_eq!(TransactionType::parse("Debit"), Some(TransactionType::Debit));
    assert_eq!(TransactionType::Refund.signed(700), 700);
    assert_eq!(TransactionType::Debit.signed(700), -700);
}

#[test]
fn gateway_amount_converts_minor_units() {
    assert_eq!(gateway_amount(18_000, 0.012), "2.16");
    assert_eq!(gateway_amount(100, 1.0), "1.00");
    assert_eq!(gateway_amount(0, 0.012), "0.00");
}

#[test]
fn reference_ids_are_unique_and_ordered() {
    let ids: Vec<String> = (0..1_000).map(|_| next_reference_id()).collect();
    let numbers: Vec<i64> = ids
        .iter()
        .map(|id| {
            id.strip_prefix("ORD-")
                .and_then(|n| n.parse().ok())
                .expect("ORD-<number>")
        })
        .collect();
    assert!(numbers.windows(2).all(|pair| pair[0] < pair[1]));
}
