use crate::error::{Error, MathError};
use crate::math::liquidity_math::add_delta;
use crate::math::sqrt_price_math::{amount0_delta_signed, amount1_delta_signed};
use crate::math::tick_bitmap::flip_tick;
use crate::math::tick_math::{MAX_TICK, MIN_TICK, sqrt_price_at_tick, tick_at_sqrt_price};
use crate::pool::position::{Position, PositionKey};
use crate::{BalanceDelta, FEE_DENOMINATOR, FastMap};
use alloy_primitives::{Address, B256, I256, U256, keccak256};

/// Maximum tick spacing; bounded so compressed ticks fit the bitmap word
/// index.
pub const MAX_TICK_SPACING: i32 = i16::MAX as i32;

/// Stable pool identifier derived from the pool key.
pub type PoolId = B256;

/// Immutable identity of a pool: the currency pair (sorted), fee tier in
/// pips, and tick spacing.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PoolKey {
    pub currency0: Address,
    pub currency1: Address,
    pub fee: u32,
    pub tick_spacing: i32,
}

impl PoolKey {
    /// Builds a pool key, sorting the currencies into canonical order.
    ///
    /// The fee must be below the pip denominator and the tick spacing in
    /// `[1, MAX_TICK_SPACING]`; the currencies must differ.
    pub fn new(
        currency_a: Address,
        currency_b: Address,
        fee: u32,
        tick_spacing: i32,
    ) -> Result<Self, Error> {
        if fee >= FEE_DENOMINATOR || tick_spacing < 1 || tick_spacing > MAX_TICK_SPACING {
            return Err(Error::InvalidPoolKey { fee, tick_spacing });
        }
        if currency_a == currency_b {
            return Err(Error::InvalidPoolKey { fee, tick_spacing });
        }

        let (currency0, currency1) = if currency_a < currency_b {
            (currency_a, currency_b)
        } else {
            (currency_b, currency_a)
        };

        Ok(Self {
            currency0,
            currency1,
            fee,
            tick_spacing,
        })
    }

    /// Hash of the key fields, used as the lookup identifier for the pool.
    pub fn id(&self) -> PoolId {
        let mut buf = [0u8; 48];
        buf[..20].copy_from_slice(self.currency0.as_slice());
        buf[20..40].copy_from_slice(self.currency1.as_slice());
        buf[40..44].copy_from_slice(&self.fee.to_be_bytes());
        buf[44..48].copy_from_slice(&self.tick_spacing.to_be_bytes());
        keccak256(buf)
    }
}

/// Per-tick liquidity bookkeeping. A tick is initialized iff
/// `liquidity_gross > 0`; `liquidity_net` is applied to active liquidity
/// when the price crosses the tick upward.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TickInfo {
    pub liquidity_gross: u128,
    pub liquidity_net: i128,
    pub fee_growth_outside0_x128: U256,
    pub fee_growth_outside1_x128: U256,
}

/// Authoritative in-memory state of one pool: price, active liquidity, the
/// tick ledger with its bitmap index, and the position store.
#[derive(Clone, Debug)]
pub struct Pool {
    pub sqrt_price_x96: U256,
    pub tick: i32,
    pub liquidity: u128,
    pub fee: u32,
    pub tick_spacing: i32,
    pub fee_growth_global0_x128: U256,
    pub fee_growth_global1_x128: U256,
    pub bitmap: FastMap<i16, U256>,
    pub ticks: FastMap<i32, TickInfo>,
    pub positions: FastMap<PositionKey, Position>,
}

impl Pool {
    /// Creates a pool at the given starting price with no liquidity.
    pub fn new(fee: u32, tick_spacing: i32, sqrt_price_x96: U256) -> Result<Self, Error> {
        let tick = tick_at_sqrt_price(sqrt_price_x96)?;
        Ok(Self {
            sqrt_price_x96,
            tick,
            liquidity: 0,
            fee,
            tick_spacing,
            fee_growth_global0_x128: U256::ZERO,
            fee_growth_global1_x128: U256::ZERO,
            bitmap: FastMap::default(),
            ticks: FastMap::default(),
            positions: FastMap::default(),
        })
    }

    pub fn position(&self, key: &PositionKey) -> Option<&Position> {
        self.positions.get(key)
    }

    /// Adds or removes liquidity over `[tick_lower, tick_upper)` for
    /// `owner`, returning the caller's balance delta: negative amounts are
    /// owed to the pool, positive amounts (withdrawn principal and accrued
    /// fees) are owed to the caller.
    ///
    /// All fallible computation happens before any state is written, so a
    /// failure leaves the pool untouched.
    pub fn modify_position(
        &mut self,
        owner: Address,
        tick_lower: i32,
        tick_upper: i32,
        liquidity_delta: i128,
    ) -> Result<BalanceDelta, Error> {
        self.check_tick_range(tick_lower, tick_upper)?;

        let sqrt_price_lower = sqrt_price_at_tick(tick_lower)?;
        let sqrt_price_upper = sqrt_price_at_tick(tick_upper)?;

        let lower_before = self.ticks.get(&tick_lower).copied().unwrap_or_default();
        let upper_before = self.ticks.get(&tick_upper).copied().unwrap_or_default();
        let (lower_after, lower_flipped) =
            self.updated_tick(lower_before, tick_lower, liquidity_delta, false)?;
        let (upper_after, upper_flipped) =
            self.updated_tick(upper_before, tick_upper, liquidity_delta, true)?;

        let key = PositionKey {
            owner,
            tick_lower,
            tick_upper,
        };
        let mut position = self.positions.get(&key).copied().unwrap_or_default();
        let position_liquidity = add_delta(position.liquidity, liquidity_delta)?;

        let (fee_growth_inside0, fee_growth_inside1) = fee_growth_inside(
            &lower_after,
            &upper_after,
            tick_lower,
            tick_upper,
            self.tick,
            self.fee_growth_global0_x128,
            self.fee_growth_global1_x128,
        );
        let (fees_owed0, fees_owed1) =
            position.checkpoint_fees(fee_growth_inside0, fee_growth_inside1)?;
        position.liquidity = position_liquidity;

        // Principal amounts, signed from the caller's perspective: positive
        // when adding (caller owes), negative when removing (pool owes).
        let in_range = tick_lower <= self.tick && self.tick < tick_upper;
        let (amount0, amount1) = if self.tick < tick_lower {
            (
                amount0_delta_signed(sqrt_price_lower, sqrt_price_upper, liquidity_delta)?,
                I256::ZERO,
            )
        } else if in_range {
            (
                amount0_delta_signed(self.sqrt_price_x96, sqrt_price_upper, liquidity_delta)?,
                amount1_delta_signed(sqrt_price_lower, self.sqrt_price_x96, liquidity_delta)?,
            )
        } else {
            (
                I256::ZERO,
                amount1_delta_signed(sqrt_price_lower, sqrt_price_upper, liquidity_delta)?,
            )
        };

        let pool_liquidity = if in_range {
            add_delta(self.liquidity, liquidity_delta)?
        } else {
            self.liquidity
        };

        // Everything fallible has succeeded; commit.
        self.commit_tick(tick_lower, lower_after, lower_flipped)?;
        self.commit_tick(tick_upper, upper_after, upper_flipped)?;
        self.liquidity = pool_liquidity;
        if position.liquidity == 0 {
            self.positions.remove(&key);
        } else {
            self.positions.insert(key, position);
        }

        Ok(BalanceDelta::new(
            -amount0 + I256::from_raw(fees_owed0),
            -amount1 + I256::from_raw(fees_owed1),
        ))
    }

    fn check_tick_range(&self, tick_lower: i32, tick_upper: i32) -> Result<(), Error> {
        if tick_lower >= tick_upper
            || tick_lower < MIN_TICK
            || tick_upper > MAX_TICK
            || tick_lower % self.tick_spacing != 0
            || tick_upper % self.tick_spacing != 0
        {
            return Err(Error::InvalidTickRange {
                lower: tick_lower,
                upper: tick_upper,
            });
        }
        Ok(())
    }

    /// Computes the post-update state of a boundary tick without touching
    /// the ledger. `upper` controls the sign applied to `liquidity_net`.
    fn updated_tick(
        &self,
        info: TickInfo,
        tick: i32,
        liquidity_delta: i128,
        upper: bool,
    ) -> Result<(TickInfo, bool), Error> {
        let gross_before = info.liquidity_gross;
        let gross_after = add_delta(gross_before, liquidity_delta)?;
        let flipped = (gross_after == 0) != (gross_before == 0);

        let mut after = info;
        if gross_before == 0 && tick <= self.tick {
            // By convention all prior growth happened below a tick that
            // starts at or under the current tick.
            after.fee_growth_outside0_x128 = self.fee_growth_global0_x128;
            after.fee_growth_outside1_x128 = self.fee_growth_global1_x128;
        }
        after.liquidity_gross = gross_after;
        after.liquidity_net = if upper {
            after.liquidity_net.checked_sub(liquidity_delta)
        } else {
            after.liquidity_net.checked_add(liquidity_delta)
        }
        .ok_or(Error::Math(MathError::Overflow))?;

        Ok((after, flipped))
    }

    fn commit_tick(&mut self, tick: i32, info: TickInfo, flipped: bool) -> Result<(), Error> {
        if flipped {
            flip_tick(&mut self.bitmap, tick, self.tick_spacing)?;
        }
        if info.liquidity_gross == 0 {
            self.ticks.remove(&tick);
        } else {
            self.ticks.insert(tick, info);
        }
        Ok(())
    }
}

/// Fee growth accumulated inside a tick range, derived from the free-running
/// global accumulators and the boundary ticks' outside values.
pub(crate) fn fee_growth_inside(
    lower: &TickInfo,
    upper: &TickInfo,
    tick_lower: i32,
    tick_upper: i32,
    current_tick: i32,
    fee_growth_global0_x128: U256,
    fee_growth_global1_x128: U256,
) -> (U256, U256) {
    let (below0, below1) = if current_tick >= tick_lower {
        (
            lower.fee_growth_outside0_x128,
            lower.fee_growth_outside1_x128,
        )
    } else {
        (
            fee_growth_global0_x128.wrapping_sub(lower.fee_growth_outside0_x128),
            fee_growth_global1_x128.wrapping_sub(lower.fee_growth_outside1_x128),
        )
    };
    let (above0, above1) = if current_tick < tick_upper {
        (
            upper.fee_growth_outside0_x128,
            upper.fee_growth_outside1_x128,
        )
    } else {
        (
            fee_growth_global0_x128.wrapping_sub(upper.fee_growth_outside0_x128),
            fee_growth_global1_x128.wrapping_sub(upper.fee_growth_outside1_x128),
        )
    };

    (
        fee_growth_global0_x128
            .wrapping_sub(below0)
            .wrapping_sub(above0),
        fee_growth_global1_x128
            .wrapping_sub(below1)
            .wrapping_sub(above1),
    )
}
