//! Inventory ledger tests
//!
//! Tests for the summary update rules including:
//! - Ending stock always equals opening + total in - total out
//! - Average price only moves on priced stock-in movements
//! - Stock-out beyond ending stock is rejected without side effects
//! - Totals are independent of the order movements were recorded in

use chrono::{DateTime, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{
    apply_movement, replay, validate_transaction, InventorySummary, LedgerError,
    RecordTransactionInput, StockTransaction, TransactionType,
};
use std::str::FromStr;
use uuid::Uuid;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn submitted_at() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-06-01T09:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn request(
    product_id: Uuid,
    kind: TransactionType,
    quantity: Decimal,
    price: Option<Decimal>,
) -> RecordTransactionInput {
    RecordTransactionInput {
        product_id,
        transaction_type: kind.as_str().to_string(),
        quantity,
        price_per_unit: price,
        ..Default::default()
    }
}

/// Validate and apply one movement, returning the new summary
fn record(
    summary: &InventorySummary,
    kind: TransactionType,
    quantity: Decimal,
    price: Option<Decimal>,
) -> Result<shared::LedgerUpdate, LedgerError> {
    let movement = validate_transaction(
        request(summary.product_id, kind, quantity, price),
        submitted_at(),
    )?;
    apply_movement(summary, &movement)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Two receipts, an issue, then an issue larger than what is left
    #[test]
    fn test_receipts_issue_and_rejected_issue() {
        let start = InventorySummary::new(Uuid::new_v4(), dec("5"));

        let first = record(&start, TransactionType::In, dec("10"), Some(dec("2.0"))).unwrap();
        assert_eq!(first.new_ending_stock, dec("10"));
        assert_eq!(first.average_price, dec("2.0"));

        let second = record(&first.summary, TransactionType::In, dec("5"), Some(dec("4.0"))).unwrap();
        assert_eq!(second.summary.total_in, dec("15"));
        assert_eq!(second.average_price.round_dp(3), dec("2.667"));

        let third = record(&second.summary, TransactionType::Out, dec("12"), None).unwrap();
        assert_eq!(third.previous_ending_stock, dec("15"));
        assert_eq!(third.new_ending_stock, dec("3"));
        assert_eq!(third.average_price, second.average_price);
        assert!(third.is_low_stock);

        let rejected = record(&third.summary, TransactionType::Out, dec("5"), None).unwrap_err();
        assert_eq!(
            rejected,
            LedgerError::InsufficientStock {
                product_id: start.product_id,
                requested: dec("5"),
                available: dec("3"),
            }
        );
        // Rejection leaves the summary untouched
        assert_eq!(third.summary.ending_stock, dec("3"));
        assert!(third.summary.is_balanced());
    }

    /// Issuing exactly what is on hand empties the product
    #[test]
    fn test_issue_of_entire_stock_succeeds() {
        let start = InventorySummary::new(Uuid::new_v4(), dec("5"));
        let stocked = record(&start, TransactionType::In, dec("7"), None).unwrap();
        let emptied = record(&stocked.summary, TransactionType::Out, dec("7"), None).unwrap();
        assert_eq!(emptied.new_ending_stock, Decimal::ZERO);
        assert!(emptied.summary.is_balanced());
    }

    /// Issue from an empty product is rejected
    #[test]
    fn test_issue_from_empty_product_rejected() {
        let start = InventorySummary::new(Uuid::new_v4(), dec("5"));
        let err = record(&start, TransactionType::Out, dec("0.001"), None).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientStock { .. }));
    }

    /// Crossing the threshold flags low stock
    #[test]
    fn test_low_stock_flag_after_issue() {
        let mut summary = InventorySummary::new(Uuid::new_v4(), dec("5"));
        summary.total_in = dec("6");
        summary.ending_stock = dec("6");

        let update = record(&summary, TransactionType::Out, dec("2"), None).unwrap();
        assert_eq!(update.new_ending_stock, dec("4"));
        assert!(update.is_low_stock);
    }

    /// Ending stock equal to the threshold counts as low
    #[test]
    fn test_low_stock_flag_at_threshold() {
        let mut summary = InventorySummary::new(Uuid::new_v4(), dec("5"));
        summary.total_in = dec("8");
        summary.ending_stock = dec("8");

        let update = record(&summary, TransactionType::Out, dec("3"), None).unwrap();
        assert!(update.is_low_stock);

        let update = record(&summary, TransactionType::Out, dec("2"), None).unwrap();
        assert!(!update.is_low_stock);
    }

    /// Receipt without a price leaves the average alone
    #[test]
    fn test_unpriced_receipt_keeps_average() {
        let start = InventorySummary::new(Uuid::new_v4(), dec("5"));
        let priced = record(&start, TransactionType::In, dec("4"), Some(dec("3.5"))).unwrap();

        let free = record(&priced.summary, TransactionType::In, dec("3"), Some(Decimal::ZERO)).unwrap();
        assert_eq!(free.summary.total_in, dec("7"));
        assert_eq!(free.new_ending_stock, dec("7"));
        assert_eq!(free.average_price, dec("3.5"));

        let none = record(&free.summary, TransactionType::In, dec("1"), None).unwrap();
        assert_eq!(none.average_price, dec("3.5"));
    }

    /// Average stays zero until the first priced receipt
    #[test]
    fn test_average_zero_until_first_priced_receipt() {
        let start = InventorySummary::new(Uuid::new_v4(), dec("5"));
        let free = record(&start, TransactionType::In, dec("10"), None).unwrap();
        assert_eq!(free.average_price, Decimal::ZERO);
    }

    /// Opening stock is carried and never rewritten
    #[test]
    fn test_opening_stock_is_preserved() {
        let mut summary = InventorySummary::new(Uuid::new_v4(), dec("5"));
        summary.opening_stock = dec("20");
        summary.ending_stock = dec("20");

        let update = record(&summary, TransactionType::Out, dec("15"), None).unwrap();
        assert_eq!(update.summary.opening_stock, dec("20"));
        assert_eq!(update.new_ending_stock, dec("5"));
        assert!(update.summary.is_balanced());
    }

    /// Replaying the log reproduces the incrementally maintained summary
    #[test]
    fn test_replay_matches_incremental_updates() {
        let product_id = Uuid::new_v4();
        let mut summary = InventorySummary::new(product_id, dec("5"));
        let mut log = Vec::new();
        let movements = [
            (TransactionType::In, dec("10"), Some(dec("2.0"))),
            (TransactionType::In, dec("5"), Some(dec("4.0"))),
            (TransactionType::Out, dec("12"), None),
            (TransactionType::In, dec("3"), None),
        ];

        for (i, (kind, quantity, price)) in movements.into_iter().enumerate() {
            let update = record(&summary, kind, quantity, price).unwrap();
            summary = update.summary;
            log.push(StockTransaction {
                id: i as i64 + 1,
                product_id,
                transaction_type: kind,
                quantity,
                price_per_unit: price,
                total_value: None,
                department: None,
                transaction_timestamp: submitted_at(),
                notes: None,
            });
        }

        let replayed = replay(&summary, &log).unwrap();
        assert_eq!(replayed, summary);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for generating valid quantities (positive decimals)
    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=10000i64).prop_map(|n| Decimal::new(n, 1)) // 0.1 to 1000.0
    }

    /// Strategy for generating unit prices, zero included
    fn price_strategy() -> impl Strategy<Value = Option<Decimal>> {
        prop_oneof![
            Just(None),
            Just(Some(Decimal::ZERO)),
            (1i64..=100000i64).prop_map(|n| Some(Decimal::new(n, 2))), // 0.01 to 1000.00
        ]
    }

    fn kind_strategy() -> impl Strategy<Value = TransactionType> {
        prop_oneof![Just(TransactionType::In), Just(TransactionType::Out)]
    }

    fn movement_strategy() -> impl Strategy<Value = (TransactionType, Decimal, Option<Decimal>)> {
        (kind_strategy(), quantity_strategy(), price_strategy())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Ending stock stays balanced and never negative, whatever is accepted
        #[test]
        fn prop_summary_stays_balanced(
            movements in prop::collection::vec(movement_strategy(), 1..40)
        ) {
            let mut summary = InventorySummary::new(Uuid::new_v4(), dec("5"));
            for (kind, quantity, price) in movements {
                match record(&summary, kind, quantity, price) {
                    Ok(update) => summary = update.summary,
                    Err(LedgerError::InsufficientStock { available, .. }) => {
                        prop_assert_eq!(kind, TransactionType::Out);
                        prop_assert!(quantity > available);
                    }
                    Err(e) => prop_assert!(false, "unexpected rejection: {}", e),
                }
                prop_assert!(summary.is_balanced());
                prop_assert!(summary.ending_stock >= Decimal::ZERO);
            }
        }

        /// Average price only changes on priced receipts
        #[test]
        fn prop_average_moves_only_on_priced_receipts(
            movements in prop::collection::vec(movement_strategy(), 1..40)
        ) {
            let mut summary = InventorySummary::new(Uuid::new_v4(), dec("5"));
            for (kind, quantity, price) in movements {
                if let Ok(update) = record(&summary, kind, quantity, price) {
                    let priced_in = kind == TransactionType::In
                        && price.map_or(false, |p| p > Decimal::ZERO);
                    if !priced_in {
                        prop_assert_eq!(update.average_price, update.previous_average_price);
                    }
                    summary = update.summary;
                }
            }
        }

        /// A rejected stock-out changes nothing
        #[test]
        fn prop_rejected_issue_has_no_effect(
            stock in quantity_strategy(),
            excess in quantity_strategy()
        ) {
            let start = InventorySummary::new(Uuid::new_v4(), dec("5"));
            let stocked = record(&start, TransactionType::In, stock, Some(dec("1.5"))).unwrap();
            let before = stocked.summary.clone();

            let result = record(&stocked.summary, TransactionType::Out, stock + excess, None);
            let is_insufficient = matches!(result, Err(LedgerError::InsufficientStock { .. }));
            prop_assert!(is_insufficient);
            prop_assert_eq!(stocked.summary, before);
        }

        /// Totals and ending stock do not depend on the order of receipts and issues
        #[test]
        fn prop_totals_are_order_independent(
            receipts in prop::collection::vec((quantity_strategy(), price_strategy()), 1..15),
            issues in prop::collection::vec(quantity_strategy(), 0..15)
        ) {
            let total_received: Decimal = receipts.iter().map(|(q, _)| *q).sum();
            let total_issued: Decimal = issues.iter().map(|q| *q).sum();
            prop_assume!(total_issued <= total_received);

            let product_id = Uuid::new_v4();
            let entry = |id: i64, kind, quantity, price| StockTransaction {
                id,
                product_id,
                transaction_type: kind,
                quantity,
                price_per_unit: price,
                total_value: None,
                department: None,
                transaction_timestamp: submitted_at(),
                notes: None,
            };

            // Receipts first, then issues
            let mut forward = Vec::new();
            for (q, p) in &receipts {
                forward.push(entry(forward.len() as i64, TransactionType::In, *q, *p));
            }
            for q in &issues {
                forward.push(entry(forward.len() as i64, TransactionType::Out, *q, None));
            }

            // Interleaved, reversed receipts
            let mut interleaved = Vec::new();
            let mut pending_issues = issues.iter();
            for (q, p) in receipts.iter().rev() {
                interleaved.push(entry(interleaved.len() as i64, TransactionType::In, *q, *p));
                if let Some(q) = pending_issues.next() {
                    interleaved.push(entry(interleaved.len() as i64, TransactionType::Out, *q, None));
                }
            }
            for q in pending_issues {
                interleaved.push(entry(interleaved.len() as i64, TransactionType::Out, *q, None));
            }

            let base = InventorySummary::new(product_id, dec("5"));
            let a = replay(&base, &forward).unwrap();
            let b = replay(&base, &interleaved).unwrap();

            prop_assert_eq!(a.total_in, b.total_in);
            prop_assert_eq!(a.total_out, b.total_out);
            prop_assert_eq!(a.ending_stock, b.ending_stock);
            prop_assert_eq!(a.ending_stock, total_received - total_issued);
        }

        /// With every receipt priced, the average is the value-weighted mean in any order
        #[test]
        fn prop_priced_average_is_order_independent(
            receipts in prop::collection::vec(
                (quantity_strategy(), (1i64..=100000i64).prop_map(|n| Decimal::new(n, 2))),
                1..15
            )
        ) {
            let product_id = Uuid::new_v4();
            let to_log = |items: Vec<(Decimal, Decimal)>| -> Vec<StockTransaction> {
                items
                    .into_iter()
                    .enumerate()
                    .map(|(i, (q, p))| StockTransaction {
                        id: i as i64,
                        product_id,
                        transaction_type: TransactionType::In,
                        quantity: q,
                        price_per_unit: Some(p),
                        total_value: None,
                        department: None,
                        transaction_timestamp: submitted_at(),
                        notes: None,
                    })
                    .collect()
            };

            let base = InventorySummary::new(product_id, dec("5"));
            let forward = replay(&base, &to_log(receipts.clone())).unwrap();
            let reversed = replay(&base, &to_log(receipts.iter().rev().cloned().collect())).unwrap();

            let value: Decimal = receipts.iter().map(|(q, p)| q * p).sum();
            let quantity: Decimal = receipts.iter().map(|(q, _)| *q).sum();
            let expected = value / quantity;
            let tolerance = dec("0.000001");

            prop_assert!((forward.average_price - expected).abs() < tolerance);
            prop_assert!((reversed.average_price - expected).abs() < tolerance);
        }
    }
}
