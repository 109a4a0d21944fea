//! Bonding Curve Engine
//!
//! Constant-product pricing over virtual reserves:
//!
//! ```text
//! (virtual_base - sold_base) * (virtual_quote + raised_quote) >= k
//! ```
//!
//! The virtual reserves are derived from the sale parameters so that the curve
//! starts at `(0, 0)` and ends exactly at `(total_sell_allocation, funding_goal)`
//! with a final price equal to the migration pool's opening price
//! (`funding_goal / migrate_allotment`).
//!
//! Every quote is pure: it reads a `CurveSnapshot` and never mutates anything.
//! Outputs round down and fees round up, so `k` never decreases.

use serde::{Deserialize, Serialize};

use crate::errors::{LaunchpadError, LaunchpadResult};
use crate::math::{mul_div_ceil, mul_div_floor, to_u64};
use crate::primitives::{Bps, BPS_DENOMINATOR};

/// Fixed-point scale used by `spot_price_x18`
pub const PRICE_SCALE: u128 = 1_000_000_000_000_000_000;

// =============================================================================
// FEES
// =============================================================================

/// Combined trade fee rates charged on every curve trade
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Launch config trade fee
    pub protocol_bps: Bps,
    /// Platform trade fee
    pub platform_bps: Bps,
    /// Creator trade fee (zero when the pool charges no creator fee)
    pub creator_bps: Bps,
}

impl FeeSchedule {
    /// Build a schedule, rejecting a combined rate of 100% or more
    pub fn new(protocol_bps: Bps, platform_bps: Bps, creator_bps: Bps) -> LaunchpadResult<Self> {
        let schedule = Self { protocol_bps, platform_bps, creator_bps };
        if schedule.total_bps() >= BPS_DENOMINATOR {
            return Err(LaunchpadError::Validation(format!(
                "combined fee rate {} bps must be below {}",
                schedule.total_bps(),
                BPS_DENOMINATOR
            )));
        }
        Ok(schedule)
    }

    pub fn total_bps(&self) -> u64 {
        self.protocol_bps as u64 + self.platform_bps as u64 + self.creator_bps as u64
    }

    /// Charge fees on `amount`
    ///
    /// The total is rounded up. Platform and creator parts are floored and the
    /// protocol takes the remainder, so the parts always sum to the total.
    pub fn charge(&self, amount: u64) -> LaunchpadResult<FeeBreakdown> {
        let total_bps = self.total_bps() as u128;
        if total_bps == 0 || amount == 0 {
            return Ok(FeeBreakdown::default());
        }
        if total_bps >= BPS_DENOMINATOR as u128 {
            return Err(LaunchpadError::Validation(format!(
                "combined fee rate {} bps must be below {}",
                total_bps, BPS_DENOMINATOR
            )));
        }

        let total = mul_div_ceil(amount as u128, total_bps, BPS_DENOMINATOR as u128)?;
        let platform = mul_div_floor(total, self.platform_bps as u128, total_bps)?;
        let creator = mul_div_floor(total, self.creator_bps as u128, total_bps)?;
        let protocol = total - platform - creator;

        Ok(FeeBreakdown {
            protocol: to_u64(protocol)?,
            platform: to_u64(platform)?,
            creator: to_u64(creator)?,
        })
    }
}

/// Fee charged on a single trade, per recipient
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub protocol: u64,
    pub platform: u64,
    pub creator: u64,
}

impl FeeBreakdown {
    pub fn total(&self) -> u64 {
        self.protocol + self.platform + self.creator
    }
}

// =============================================================================
// CURVE PARAMETERS
// =============================================================================

/// Immutable curve shape for one pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurveParams {
    pub total_sell_allocation: u64,
    pub funding_goal: u64,
    /// Base tokens reserved for the migration pool
    pub migrate_allotment: u64,
    pub virtual_base: u64,
    pub virtual_quote: u64,
}

impl CurveParams {
    /// Derive virtual reserves from the sale parameters
    ///
    /// With `A = total_sell_allocation`, `M = migrate_allotment`, `d = A - M`:
    /// `virtual_base = floor(A² / d)` and `virtual_quote = ceil(goal * M / d)`.
    ///
    /// Rejects shapes whose final base reserve (`virtual_base - A`) is below
    /// the final quote reserve (`virtual_quote + goal`). With that bound every
    /// net quote unit buys at least one base unit, so the goal is always
    /// reachable exactly.
    pub fn derive(
        total_supply: u64,
        total_sell_allocation: u64,
        locked_amount: u64,
        funding_goal: u64,
    ) -> LaunchpadResult<Self> {
        if total_sell_allocation == 0 || funding_goal == 0 {
            return Err(LaunchpadError::Validation(
                "sell allocation and funding goal must be non-zero".into(),
            ));
        }
        let migrate_allotment = total_supply
            .checked_sub(total_sell_allocation)
            .and_then(|rest| rest.checked_sub(locked_amount))
            .ok_or_else(|| {
                LaunchpadError::Validation(
                    "sell allocation plus locked amount exceeds total supply".into(),
                )
            })?;
        if migrate_allotment == 0 || migrate_allotment >= total_sell_allocation {
            return Err(LaunchpadError::Validation(format!(
                "migration allotment {} must be non-zero and below the sell allocation {}",
                migrate_allotment, total_sell_allocation
            )));
        }

        let a = total_sell_allocation as u128;
        let d = a - migrate_allotment as u128;
        let virtual_base = to_u64(mul_div_floor(a, a, d)?).map_err(|_| too_steep())?;
        let virtual_quote =
            to_u64(mul_div_ceil(funding_goal as u128, migrate_allotment as u128, d)?)
                .map_err(|_| too_steep())?;

        // End price must stay at or below one quote unit per base unit, or the
        // last few quote units of the raise could never buy a whole base unit
        let end_base_reserve = (virtual_base - total_sell_allocation) as u128;
        let end_quote_reserve = virtual_quote as u128 + funding_goal as u128;
        if end_base_reserve < end_quote_reserve {
            return Err(LaunchpadError::Validation(format!(
                "funding goal {} prices the end of the curve above one quote unit per base \
                 unit; raise the supply or base decimals",
                funding_goal
            )));
        }

        Ok(Self {
            total_sell_allocation,
            funding_goal,
            migrate_allotment,
            virtual_base,
            virtual_quote,
        })
    }

    /// Initial constant product
    pub fn k(&self) -> u128 {
        self.virtual_base as u128 * self.virtual_quote as u128
    }
}

fn too_steep() -> LaunchpadError {
    LaunchpadError::Validation("curve parameters produce virtual reserves beyond u64".into())
}

// =============================================================================
// QUOTES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeDirection {
    /// Quote in, base out
    Buy,
    /// Base in, quote out
    Sell,
}

/// Result of quoting one trade against a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeQuote {
    pub direction: TradeDirection,
    /// Gross amount the trader pays (quote for buys, base for sells)
    pub input_amount: u64,
    /// Net amount the trader receives (base for buys, quote for sells)
    pub output_amount: u64,
    /// Total fee charged, in quote units
    pub fee_amount: u64,
    pub fees: FeeBreakdown,
    /// Quote moving into (buy) or out of (sell) the curve, fees excluded
    pub curve_quote: u64,
    /// Base moving out of (buy) or into (sell) the curve
    pub base_amount: u64,
    /// Spot price movement caused by the trade
    pub price_impact_bps: u32,
    pub new_raised_quote: u64,
    pub new_sold_base: u64,
}

/// Consistent copy of the curve state a quote is computed against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurveSnapshot {
    pub params: CurveParams,
    pub fees: FeeSchedule,
    pub raised_quote: u64,
    pub sold_base: u64,
}

impl CurveSnapshot {
    pub fn new(params: CurveParams, fees: FeeSchedule) -> Self {
        Self { params, fees, raised_quote: 0, sold_base: 0 }
    }

    /// Remaining base reserve of the virtual curve
    fn base_reserve(&self) -> LaunchpadResult<u128> {
        self.params
            .virtual_base
            .checked_sub(self.sold_base)
            .map(u128::from)
            .ok_or_else(|| {
                LaunchpadError::Validation(format!(
                    "sold {} exceeds virtual base {}",
                    self.sold_base, self.params.virtual_base
                ))
            })
    }

    /// Current quote reserve of the virtual curve
    fn quote_reserve(&self) -> u128 {
        self.params.virtual_quote as u128 + self.raised_quote as u128
    }

    /// Quote still accepted (net of fees) before the goal is reached
    pub fn remaining_quote_capacity(&self) -> u64 {
        self.params.funding_goal.saturating_sub(self.raised_quote)
    }

    /// Quote a buy of `quote_in` gross quote units
    ///
    /// Fees come off the input first. Fails with `CurveExhausted` when the net
    /// amount would push the raise past the funding goal.
    pub fn quote_buy(&self, quote_in: u64) -> LaunchpadResult<TradeQuote> {
        if quote_in == 0 {
            return Err(LaunchpadError::ZeroAmount);
        }

        let fees = self.fees.charge(quote_in)?;
        let net_in = quote_in.checked_sub(fees.total()).ok_or(LaunchpadError::Overflow)?;
        let remaining = self.remaining_quote_capacity();
        if net_in > remaining {
            return Err(LaunchpadError::CurveExhausted { requested: net_in, remaining });
        }
        if net_in == 0 {
            return Err(LaunchpadError::ZeroAmount);
        }

        // base_out = base_reserve * net_in / (quote_reserve + net_in)
        let base_reserve = self.base_reserve()?;
        let quote_reserve = self.quote_reserve();
        let new_quote_reserve = quote_reserve + net_in as u128;
        let base_out = to_u64(mul_div_floor(base_reserve, net_in as u128, new_quote_reserve)?)?;
        if base_out == 0 {
            return Err(LaunchpadError::ZeroAmount);
        }

        let new_sold_base = self.sold_base.checked_add(base_out).ok_or(LaunchpadError::Overflow)?;
        if new_sold_base > self.params.total_sell_allocation {
            return Err(LaunchpadError::CurveExhausted { requested: net_in, remaining });
        }
        let new_base_reserve = base_reserve - base_out as u128;
        self.check_invariant(new_base_reserve, new_quote_reserve)?;

        Ok(TradeQuote {
            direction: TradeDirection::Buy,
            input_amount: quote_in,
            output_amount: base_out,
            fee_amount: fees.total(),
            fees,
            curve_quote: net_in,
            base_amount: base_out,
            price_impact_bps: price_impact_bps(
                quote_reserve,
                base_reserve,
                new_quote_reserve,
                new_base_reserve,
            ),
            new_raised_quote: self.raised_quote + net_in,
            new_sold_base,
        })
    }

    /// Quote a sell of `base_in` base units back into the curve
    ///
    /// Fees come off the gross quote output.
    pub fn quote_sell(&self, base_in: u64) -> LaunchpadResult<TradeQuote> {
        if base_in == 0 {
            return Err(LaunchpadError::ZeroAmount);
        }
        if base_in > self.sold_base {
            return Err(LaunchpadError::InsufficientReserve {
                requested: base_in,
                available: self.sold_base,
            });
        }

        // gross_out = quote_reserve * base_in / (base_reserve + base_in)
        let base_reserve = self.base_reserve()?;
        let quote_reserve = self.quote_reserve();
        let new_base_reserve = base_reserve + base_in as u128;
        let gross_out = to_u64(mul_div_floor(quote_reserve, base_in as u128, new_base_reserve)?)?;
        if gross_out > self.raised_quote {
            return Err(LaunchpadError::InsufficientReserve {
                requested: gross_out,
                available: self.raised_quote,
            });
        }

        let fees = self.fees.charge(gross_out)?;
        let quote_out = gross_out.checked_sub(fees.total()).ok_or(LaunchpadError::Overflow)?;
        if quote_out == 0 {
            return Err(LaunchpadError::ZeroAmount);
        }
        let new_quote_reserve = quote_reserve - gross_out as u128;
        self.check_invariant(new_base_reserve, new_quote_reserve)?;

        Ok(TradeQuote {
            direction: TradeDirection::Sell,
            input_amount: base_in,
            output_amount: quote_out,
            fee_amount: fees.total(),
            fees,
            curve_quote: gross_out,
            base_amount: base_in,
            price_impact_bps: price_impact_bps(
                quote_reserve,
                base_reserve,
                new_quote_reserve,
                new_base_reserve,
            ),
            new_raised_quote: self.raised_quote - gross_out,
            new_sold_base: self.sold_base - base_in,
        })
    }

    /// Smallest gross input whose net-of-fee amount is exactly `net`
    ///
    /// `gross = ceil(net * 10_000 / (10_000 - fee_bps))`
    pub fn gross_input_for_net(&self, net: u64) -> LaunchpadResult<u64> {
        let keep_bps = BPS_DENOMINATOR
            .checked_sub(self.fees.total_bps())
            .filter(|keep| *keep > 0)
            .ok_or_else(|| {
                LaunchpadError::Validation(format!(
                    "combined fee rate {} bps leaves nothing to trade",
                    self.fees.total_bps()
                ))
            })?;
        to_u64(mul_div_ceil(net as u128, BPS_DENOMINATOR as u128, keep_bps as u128)?)
    }

    /// Gross quote input that fills the curve exactly to the funding goal
    pub fn max_buy_input(&self) -> LaunchpadResult<u64> {
        self.gross_input_for_net(self.remaining_quote_capacity())
    }

    /// Clamp a requested gross buy input to what the curve can still accept
    pub fn clamp_buy_input(&self, quote_in: u64) -> LaunchpadResult<u64> {
        Ok(quote_in.min(self.max_buy_input()?))
    }

    /// Marginal price in quote units per base unit, scaled by 1e18
    pub fn spot_price_x18(&self) -> LaunchpadResult<u128> {
        mul_div_floor(self.quote_reserve(), PRICE_SCALE, self.base_reserve()?)
    }

    fn check_invariant(&self, base_reserve: u128, quote_reserve: u128) -> LaunchpadResult<()> {
        let before = self
            .base_reserve()?
            .checked_mul(self.quote_reserve())
            .ok_or(LaunchpadError::Overflow)?;
        let after = base_reserve.checked_mul(quote_reserve).ok_or(LaunchpadError::Overflow)?;
        if after < before {
            return Err(LaunchpadError::Validation("constant product would decrease".into()));
        }
        Ok(())
    }
}

/// Relative spot price change in basis points, saturating at `u32::MAX`
fn price_impact_bps(
    quote_before: u128,
    base_before: u128,
    quote_after: u128,
    base_after: u128,
) -> u32 {
    // |q1/b1 - q0/b0| / (q0/b0) = |q1*b0 - q0*b1| / (q0*b1)
    let lhs = quote_after.checked_mul(base_before);
    let rhs = quote_before.checked_mul(base_after);
    let (lhs, rhs) = match (lhs, rhs) {
        (Some(lhs), Some(rhs)) => (lhs, rhs),
        _ => return u32::MAX,
    };
    if rhs == 0 {
        return u32::MAX;
    }
    let diff = lhs.abs_diff(rhs);
    diff.checked_mul(BPS_DENOMINATOR as u128)
        .map(|scaled| scaled / rhs)
        .and_then(|bps| u32::try_from(bps).ok())
        .unwrap_or(u32::MAX)
}

// =============================================================================
// SLIPPAGE HELPERS
// =============================================================================

/// Lowest acceptable output for a quoted `output` at `slippage_bps` tolerance
pub fn min_output_with_slippage(output: u64, slippage_bps: Bps) -> LaunchpadResult<u64> {
    if slippage_bps as u64 > BPS_DENOMINATOR {
        return Err(LaunchpadError::Validation(format!(
            "slippage {} bps exceeds {}",
            slippage_bps, BPS_DENOMINATOR
        )));
    }
    to_u64(mul_div_floor(
        output as u128,
        (BPS_DENOMINATOR - slippage_bps as u64) as u128,
        BPS_DENOMINATOR as u128,
    )?)
}

/// Highest acceptable input for a quoted `input` at `slippage_bps` tolerance
pub fn max_input_with_slippage(input: u64, slippage_bps: Bps) -> LaunchpadResult<u64> {
    to_u64(mul_div_ceil(
        input as u128,
        (BPS_DENOMINATOR + slippage_bps as u64) as u128,
        BPS_DENOMINATOR as u128,
    )?)
}
