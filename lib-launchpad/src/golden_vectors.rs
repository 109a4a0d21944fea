//! Golden Vector Tests for Curve Pricing
//!
//! Exact expected outputs for fixed inputs. A failure here means quoting,
//! fee rounding or the migration split changed behavior, which changes what
//! every client and indexer computes for the same trade.
//!
//! # Updating Golden Vectors
//!
//! 1. Update the computation
//! 2. Recompute these values independently and update them
//! 3. Call out the change in the commit message

use crate::curve::{CurveParams, CurveSnapshot, FeeSchedule};
use crate::migration::{split_liquidity, ConstantProductDeposit, LiquidityDepositRule};
use crate::registry::MigrationScale;

const SUPPLY: u64 = 1_000_000_000_000_000;
const SELL: u64 = 793_100_000_000_000;

// =========================================================================
// GOLDEN VECTOR: Virtual reserve derivation
// =========================================================================

/// A = 793.1e12, M = 206.9e12, d = 586.2e12
/// - virtual_base = floor(A² / d) = 1_073_025_605_595_359
/// - virtual_quote = ceil(85e9 * M / d) = 30_000_852_952
#[test]
fn golden_derive_default_sale() {
    let params = CurveParams::derive(SUPPLY, SELL, 0, 85_000_000_000).unwrap();

    assert_eq!(params.migrate_allotment, 206_900_000_000_000);
    assert_eq!(params.virtual_base, 1_073_025_605_595_359);
    assert_eq!(params.virtual_quote, 30_000_852_952);
}

#[test]
fn golden_derive_with_locked_allocation() {
    let params = CurveParams::derive(SUPPLY, SELL, 10_000_000_000_000, 5_000_000_000).unwrap();

    assert_eq!(params.migrate_allotment, 196_900_000_000_000);
    assert_eq!(params.virtual_base, 1_055_027_859_778_597);
    assert_eq!(params.virtual_quote, 1_651_291_513);
}

// =========================================================================
// GOLDEN VECTOR: Buys
// =========================================================================

/// 1e9 quote in at 1% protocol fee against an 85e9 goal
/// - fee = ceil(1e9 * 100 / 10000) = 10_000_000
/// - net = 990_000_000
/// - base_out = floor(vb * net / (vq + net)) = 34_277_706_108_468
#[test]
fn golden_buy_with_protocol_fee() {
    let params = CurveParams::derive(SUPPLY, SELL, 0, 85_000_000_000).unwrap();
    let snap = CurveSnapshot::new(params, FeeSchedule::new(100, 0, 0).unwrap());

    let quote = snap.quote_buy(1_000_000_000).unwrap();
    assert_eq!(quote.fee_amount, 10_000_000);
    assert_eq!(quote.output_amount, 34_277_706_108_468);
}

/// Full fill of an 85e9 goal without fees leaves 5_441 base unsold
#[test]
fn golden_full_fill() {
    let params = CurveParams::derive(SUPPLY, SELL, 0, 85_000_000_000).unwrap();
    let snap = CurveSnapshot::new(params, FeeSchedule::default());

    let quote = snap.quote_buy(85_000_000_000).unwrap();
    assert_eq!(quote.output_amount, 793_099_999_994_559);
    assert_eq!(SELL - quote.new_sold_base, 5_441);
}

/// Split fee 25 / 100 / 50 bps on 1e9
/// - total = ceil(1e9 * 175 / 10000) = 17_500_000
/// - platform = 10_000_000, creator = 5_000_000, protocol = 2_500_000
#[test]
fn golden_buy_with_split_fees() {
    let params = CurveParams::derive(SUPPLY, SELL, 0, 5_000_000_000).unwrap();
    let snap = CurveSnapshot::new(params, FeeSchedule::new(25, 100, 50).unwrap());

    let quote = snap.quote_buy(1_000_000_000).unwrap();
    assert_eq!(quote.fees.protocol, 2_500_000);
    assert_eq!(quote.fees.platform, 10_000_000);
    assert_eq!(quote.fees.creator, 5_000_000);
    assert_eq!(quote.output_amount, 383_745_685_151_904);
}

// =========================================================================
// GOLDEN VECTOR: Sell back
// =========================================================================

/// Selling the whole position back returns gross 989_999_999 and leaves one
/// unit of quote dust on the curve
#[test]
fn golden_sell_back() {
    let params = CurveParams::derive(SUPPLY, SELL, 0, 5_000_000_000).unwrap();
    let mut snap = CurveSnapshot::new(params, FeeSchedule::new(100, 0, 0).unwrap());

    let buy = snap.quote_buy(1_000_000_000).unwrap();
    assert_eq!(buy.output_amount, 385_622_293_932_586);
    snap.raised_quote = buy.new_raised_quote;
    snap.sold_base = buy.new_sold_base;

    let sell = snap.quote_sell(buy.output_amount).unwrap();
    assert_eq!(sell.curve_quote, 989_999_999);
    assert_eq!(sell.fee_amount, 9_900_000);
    assert_eq!(sell.output_amount, 980_099_999);
    assert_eq!(sell.new_raised_quote, 1);
}

// =========================================================================
// GOLDEN VECTOR: Migration
// =========================================================================

/// Migration of a filled 5e9 sale
/// - base = 1e15 - 793_099_999_994_559 = 206_900_000_005_441
/// - lp = isqrt(base * 5e9) - 100 = 1_017_103_731_103
/// - split 80% / 15% / 5%
#[test]
fn golden_migration_split() {
    let lp = ConstantProductDeposit::default()
        .liquidity_for(206_900_000_005_441, 5_000_000_000)
        .unwrap();
    assert_eq!(lp, 1_017_103_731_103);

    let split = split_liquidity(lp, &MigrationScale::new(800_000, 150_000, 50_000)).unwrap();
    assert_eq!(split.platform, 813_682_984_882);
    assert_eq!(split.creator, 152_565_559_665);
    assert_eq!(split.burn, 50_855_186_556);
}
