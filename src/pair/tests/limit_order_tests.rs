//! Limit order insertion: resting, matching, and entry accounting.

use super::test_helpers::*;
use crate::pair::error::BookError;
use crate::pair::ledger::AccountId;
use crate::pair::order_store::OrderStatus;
use crate::pair::types::{Fill, Side};
use crypto_bigint::{CheckedAdd, CheckedSub, U256};

#[test]
fn test_first_buy_rests_on_empty_book() {
    let (ledger, pair) = setup();
    let price = price_units(2_000);
    let amount = base_units(1);
    let quote_before = ledger.balance(ALICE, QUOTE);

    let order_id = pair
        .insert_limit_order(ALICE, Side::Buy, price, amount)
        .unwrap();

    assert_eq!(order_id, 0);
    assert_eq!(pair.liquidity(price, Side::Buy), amount);
    assert_eq!(pair.used_liquidity(price, Side::Buy), U256::ZERO);
    assert_eq!(pair.best_bid(), Some(price));
    assert_eq!(pair.latest_trade_price(), None);

    // The full notional is escrowed: 1 base at 2000 = 2000 quote.
    assert_eq!(
        quote_before.checked_sub(&ledger.balance(ALICE, QUOTE)).unwrap(),
        quote_units(2_000)
    );

    let record = pair.order(0).unwrap();
    assert_eq!(record.owner, ALICE);
    assert_eq!(record.side, Side::Buy);
    assert_eq!(record.token_amount, amount);
    assert_eq!(record.queue_index, 0);
    assert_eq!(record.queue_position_ahead, U256::ZERO);
    assert_eq!(record.status, OrderStatus::Open);
}

#[test]
fn test_crossing_sell_matches_resting_buy() {
    let (ledger, pair) = setup();
    let price = price_units(2_000);
    let amount = base_units(1);
    pair.insert_limit_order(ALICE, Side::Buy, price, amount)
        .unwrap();

    let bob_quote_before = ledger.balance(BOB, QUOTE);
    let bob_base_before = ledger.balance(BOB, BASE);
    let sell_id = pair
        .insert_limit_order(BOB, Side::Sell, price, amount)
        .unwrap();

    assert_eq!(sell_id, 1);
    // Fully matched: no resting record for the seller.
    assert!(pair.order(sell_id).is_none());
    assert_eq!(pair.latest_trade_price(), Some(price));
    assert_eq!(pair.liquidity(price, Side::Buy), U256::ZERO);
    assert_eq!(pair.used_liquidity(price, Side::Buy), amount);

    // The seller paid 1 base and received 2000 quote net of the taker fee:
    // 2000e18 * 20 / 1e6 = 4e16 withheld.
    assert_eq!(
        bob_base_before.checked_sub(&ledger.balance(BOB, BASE)).unwrap(),
        amount
    );
    let received = ledger
        .balance(BOB, QUOTE)
        .checked_sub(&bob_quote_before)
        .unwrap();
    assert_eq!(received, U256::from(1_999_960_000_000_000_000_000u128));
    let (quote_fees, base_fees) = pair.fee_balances();
    assert_eq!(quote_fees, U256::from(40_000_000_000_000_000u128));
    assert_eq!(base_fees, U256::ZERO);
}

#[test]
fn test_partial_match_rests_residual() {
    let (ledger, pair) = setup();
    let price = price_units(2_000);
    pair.insert_limit_order(BOB, Side::Sell, price, base_units(1))
        .unwrap();

    let quote_before = ledger.balance(ALICE, QUOTE);
    let order_id = pair
        .insert_limit_order(ALICE, Side::Buy, price, base_units(3))
        .unwrap();

    let record = pair.order(order_id).unwrap();
    assert_eq!(record.token_amount, base_units(2));
    assert_eq!(record.queue_index, 0);
    assert_eq!(record.queue_position_ahead, U256::ZERO);
    assert_eq!(pair.liquidity(price, Side::Buy), base_units(2));
    assert_eq!(pair.liquidity(price, Side::Sell), U256::ZERO);

    // Debit = consumed fill (1 at 2000) + residual escrow (2 at 2000).
    assert_eq!(
        quote_before.checked_sub(&ledger.balance(ALICE, QUOTE)).unwrap(),
        quote_units(6_000)
    );
    // Taker leg credited base net of fee: 1e18 less 20 millionths.
    // Minted 1_000_000 base, spent nothing, received the fill.
    assert_eq!(
        ledger.balance(ALICE, BASE),
        base_units(1_000_000)
            .checked_add(&U256::from(999_980_000_000_000_000u128))
            .unwrap()
    );
}

#[test]
fn test_queue_positions_stack_per_side() {
    let (_ledger, pair) = setup();
    let price = price_units(2_000);
    let first = pair
        .insert_limit_order(ALICE, Side::Buy, price, base_units(2))
        .unwrap();
    let second = pair
        .insert_limit_order(BOB, Side::Buy, price, base_units(3))
        .unwrap();
    // The opposite side queues independently.
    let third = pair
        .insert_limit_order(CAROL, Side::Sell, price_units(3_000), base_units(5))
        .unwrap();

    let first = pair.order(first).unwrap();
    let second = pair.order(second).unwrap();
    let third = pair.order(third).unwrap();
    assert_eq!(first.queue_index, 0);
    assert_eq!(second.queue_index, 1);
    assert_eq!(second.queue_position_ahead, base_units(2));
    assert_eq!(third.queue_index, 0);
    assert_eq!(third.queue_position_ahead, U256::ZERO);
    assert_eq!(pair.resting_order_count(price, Side::Buy), 2);
}

#[test]
fn test_buy_fills_at_better_price() {
    let (ledger, pair) = setup();
    // The only ask is one step below the buyer's limit.
    pair.insert_limit_order(BOB, Side::Sell, price_units(1_999), base_units(1))
        .unwrap();

    let quote_before = ledger.balance(ALICE, QUOTE);
    pair.insert_limit_order(ALICE, Side::Buy, price_units(2_000), base_units(1))
        .unwrap();

    // Fully filled at 1999: exactly 1999 quote spent, nothing rested.
    assert_eq!(
        quote_before.checked_sub(&ledger.balance(ALICE, QUOTE)).unwrap(),
        quote_units(1_999)
    );
    assert_eq!(pair.liquidity(price_units(2_000), Side::Buy), U256::ZERO);
    assert_eq!(pair.latest_trade_price(), Some(price_units(1_999)));
}

#[test]
fn test_match_walks_multiple_levels_in_order() {
    let (_ledger, pair) = setup();
    pair.insert_limit_order(BOB, Side::Sell, price_units(1_998), base_units(4))
        .unwrap();
    pair.insert_limit_order(CAROL, Side::Sell, price_units(2_000), base_units(2))
        .unwrap();

    // The buy consumes 2 at 2000 first, then 3 of the 4 at 1998.
    pair.insert_limit_order(ALICE, Side::Buy, price_units(2_000), base_units(5))
        .unwrap();

    assert_eq!(pair.used_liquidity(price_units(2_000), Side::Sell), base_units(2));
    assert_eq!(pair.used_liquidity(price_units(1_998), Side::Sell), base_units(3));
    assert_eq!(pair.liquidity(price_units(1_998), Side::Sell), base_units(1));
    // Last matched level becomes the trade price.
    assert_eq!(pair.latest_trade_price(), Some(price_units(1_998)));
}

#[test]
fn test_zero_amount_rejected() {
    let (_ledger, pair) = setup();
    assert!(matches!(
        pair.insert_limit_order(ALICE, Side::Buy, price_units(2_000), U256::ZERO),
        Err(BookError::InvalidAmount)
    ));
}

#[test]
fn test_unaligned_price_rejected() {
    let (_ledger, pair) = setup();
    let off_grid = price_units(2_000).checked_add(&U256::ONE).unwrap();
    assert!(matches!(
        pair.insert_limit_order(ALICE, Side::Buy, off_grid, base_units(1)),
        Err(BookError::InvalidPrice { .. })
    ));
    assert!(matches!(
        pair.insert_limit_order(ALICE, Side::Buy, U256::ZERO, base_units(1)),
        Err(BookError::InvalidPrice { .. })
    ));
}

#[test]
fn test_failed_debit_changes_nothing() {
    let (ledger, pair) = setup();
    let pauper = AccountId(99);
    let err = pair
        .insert_limit_order(pauper, Side::Buy, price_units(2_000), base_units(1))
        .unwrap_err();
    assert!(matches!(err, BookError::Ledger(_)));
    assert_eq!(pair.best_bid(), None);
    assert!(pair.order(0).is_none());
    // No id was burned on the failed insert.
    let next = pair
        .insert_limit_order(ALICE, Side::Buy, price_units(2_000), base_units(1))
        .unwrap();
    assert_eq!(next, 0);
    assert_eq!(ledger.balance(pauper, QUOTE), U256::ZERO);
}

#[test]
fn test_fill_vector_reported_in_event() {
    use crate::pair::book::{Pair, PairConfig};
    use crate::pair::events::MarketEvent;
    use crate::pair::ledger::InMemoryLedger;
    use std::sync::{Arc, Mutex};

    let ledger = Arc::new(InMemoryLedger::new());
    ledger.mint(ALICE, QUOTE, quote_units(100_000));
    ledger.mint(BOB, BASE, base_units(100));
    let observed: Arc<Mutex<Vec<Vec<Fill>>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = observed.clone();
    let pair = Pair::with_listener(
        PairConfig {
            base: BASE,
            quote: QUOTE,
            quote_unit: SCALE_QUANTUM,
            maker_fee: MAKER_FEE,
            taker_fee: TAKER_FEE,
            price_precision: PRICE_PRECISION,
            governance: GOVERNANCE,
        },
        ledger,
        Arc::new(move |observation| {
            if let MarketEvent::LimitOrderInserted { matched, .. } = &observation.event {
                sink.lock().unwrap().push(matched.clone());
            }
        }),
    )
    .unwrap();

    pair.insert_limit_order(BOB, Side::Sell, price_units(2_000), base_units(1))
        .unwrap();
    pair.insert_limit_order(ALICE, Side::Buy, price_units(2_000), base_units(1))
        .unwrap();

    let observed = observed.lock().unwrap();
    assert_eq!(observed.len(), 2);
    assert!(observed[0].is_empty());
    assert_eq!(
        observed[1],
        vec![Fill {
            price: price_units(2_000),
            amount: base_units(1),
        }]
    );
}
