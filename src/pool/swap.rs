use crate::Q128;
use crate::error::Error;
use crate::math::full_math::{mul_div, unlikely};
use crate::math::liquidity_math::add_delta;
use crate::math::swap_math::compute_swap_step;
use crate::math::tick_bitmap::next_initialized_tick_within_one_word;
use crate::math::tick_math::{
    MAX_SQRT_RATIO, MAX_TICK, MIN_SQRT_RATIO, MIN_TICK, sqrt_price_at_tick, tick_at_sqrt_price,
};
use crate::pool::state::Pool;
use alloy_primitives::{I256, U256};
use std::ops::{Add, Sub};

#[derive(Copy, Clone, Debug)]
pub struct SwapParams {
    /// Swap direction: `true` for currency0 in, currency1 out.
    pub zero_for_one: bool,
    /// Signed amount: positive is exact input, negative is exact output.
    pub amount_specified: I256,
    /// Q64.96 price the swap may not move past; must lie strictly between
    /// the current price and the global bound for the chosen direction.
    pub sqrt_price_limit_x96: U256,
}

impl SwapParams {
    #[inline]
    pub fn new(zero_for_one: bool, amount_specified: I256, sqrt_price_limit_x96: U256) -> Self {
        Self {
            zero_for_one,
            amount_specified,
            sqrt_price_limit_x96,
        }
    }
}

/// Outcome of a swap, mirroring the fields surfaced for observability:
/// caller-signed amounts (positive means the pool owes the caller) and the
/// pool state after the swap.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SwapEvent {
    pub amount0: I256,
    pub amount1: I256,
    pub sqrt_price_x96: U256,
    pub liquidity: u128,
    pub tick: i32,
    /// Total fee charged, denominated in the input currency.
    pub fee_amount: U256,
}

// Running state of the swap loop; written back to the pool only after the
// whole loop has succeeded.
struct SwapState {
    amount_specified_remaining: I256,
    amount_calculated: I256,
    sqrt_price_x96: U256,
    tick: i32,
    liquidity: u128,
    fee_growth_global_x128: U256,
    fee_amount: U256,
}

#[derive(Default)]
struct StepComputations {
    sqrt_price_start_x96: U256,
    tick_next: i32,
    initialized: bool,
    sqrt_price_next_x96: U256,
    amount_in: U256,
    amount_out: U256,
    fee_amount: U256,
}

// A tick crossed during the loop, with the outside accumulators it flips to.
struct CrossedTick {
    tick: i32,
    fee_growth_outside0_x128: U256,
    fee_growth_outside1_x128: U256,
}

impl Pool {
    /// Executes a swap against the pool, walking the price across
    /// initialized ticks until the specified amount is exhausted or the
    /// price limit is reached.
    ///
    /// A zero `amount_specified` is a no-op that leaves the pool unchanged.
    /// State is mutated only after the entire loop has succeeded.
    pub fn swap(&mut self, params: SwapParams) -> Result<SwapEvent, Error> {
        let amount_specified = params.amount_specified;
        if unlikely(amount_specified.is_zero()) {
            return Ok(SwapEvent {
                amount0: I256::ZERO,
                amount1: I256::ZERO,
                sqrt_price_x96: self.sqrt_price_x96,
                liquidity: self.liquidity,
                tick: self.tick,
                fee_amount: U256::ZERO,
            });
        }

        let zero_for_one = params.zero_for_one;
        let sqrt_price_limit_x96 = params.sqrt_price_limit_x96;
        if zero_for_one {
            if unlikely(
                sqrt_price_limit_x96 >= self.sqrt_price_x96
                    || sqrt_price_limit_x96 <= MIN_SQRT_RATIO,
            ) {
                return Err(Error::InvalidPriceLimit {
                    limit: sqrt_price_limit_x96,
                    sqrt_price: self.sqrt_price_x96,
                });
            }
        } else if unlikely(
            sqrt_price_limit_x96 <= self.sqrt_price_x96 || sqrt_price_limit_x96 >= MAX_SQRT_RATIO,
        ) {
            return Err(Error::InvalidPriceLimit {
                limit: sqrt_price_limit_x96,
                sqrt_price: self.sqrt_price_x96,
            });
        }

        let exact_input = amount_specified.is_positive();

        let mut state = SwapState {
            amount_specified_remaining: amount_specified,
            amount_calculated: I256::ZERO,
            sqrt_price_x96: self.sqrt_price_x96,
            tick: self.tick,
            liquidity: self.liquidity,
            fee_growth_global_x128: if zero_for_one {
                self.fee_growth_global0_x128
            } else {
                self.fee_growth_global1_x128
            },
            fee_amount: U256::ZERO,
        };
        let mut crossed: Vec<CrossedTick> = Vec::new();

        while state.amount_specified_remaining != I256::ZERO
            && state.sqrt_price_x96 != sqrt_price_limit_x96
        {
            let mut step = StepComputations {
                sqrt_price_start_x96: state.sqrt_price_x96,
                ..StepComputations::default()
            };

            (step.tick_next, step.initialized) = next_initialized_tick_within_one_word(
                &self.bitmap,
                state.tick,
                self.tick_spacing,
                zero_for_one,
            )?;

            step.tick_next = step.tick_next.clamp(MIN_TICK, MAX_TICK);
            step.sqrt_price_next_x96 = sqrt_price_at_tick(step.tick_next)?;

            (
                state.sqrt_price_x96,
                step.amount_in,
                step.amount_out,
                step.fee_amount,
            ) = compute_swap_step(
                state.sqrt_price_x96,
                if zero_for_one {
                    if step.sqrt_price_next_x96 < sqrt_price_limit_x96 {
                        sqrt_price_limit_x96
                    } else {
                        step.sqrt_price_next_x96
                    }
                } else if step.sqrt_price_next_x96 > sqrt_price_limit_x96 {
                    sqrt_price_limit_x96
                } else {
                    step.sqrt_price_next_x96
                },
                state.liquidity,
                state.amount_specified_remaining,
                self.fee,
            )?;

            state.fee_amount += step.fee_amount;
            if state.liquidity > 0 {
                state.fee_growth_global_x128 = state.fee_growth_global_x128.wrapping_add(mul_div(
                    step.fee_amount,
                    Q128,
                    U256::from(state.liquidity),
                )?);
            }

            if exact_input {
                state.amount_specified_remaining -=
                    I256::from_raw(step.amount_in + step.fee_amount);
                state.amount_calculated =
                    state.amount_calculated.sub(I256::from_raw(step.amount_out));
            } else {
                state.amount_specified_remaining += I256::from_raw(step.amount_out);
                state.amount_calculated = state
                    .amount_calculated
                    .add(I256::from_raw(step.amount_in + step.fee_amount));
            }

            if state.sqrt_price_x96 == step.sqrt_price_next_x96 {
                if step.initialized {
                    if let Some(info) = self.ticks.get(&step.tick_next) {
                        let (global0, global1) = if zero_for_one {
                            (state.fee_growth_global_x128, self.fee_growth_global1_x128)
                        } else {
                            (self.fee_growth_global0_x128, state.fee_growth_global_x128)
                        };
                        crossed.push(CrossedTick {
                            tick: step.tick_next,
                            fee_growth_outside0_x128: global0
                                .wrapping_sub(info.fee_growth_outside0_x128),
                            fee_growth_outside1_x128: global1
                                .wrapping_sub(info.fee_growth_outside1_x128),
                        });

                        let mut liquidity_net = info.liquidity_net;
                        if zero_for_one {
                            liquidity_net = -liquidity_net;
                        }
                        state.liquidity = add_delta(state.liquidity, liquidity_net)?;
                    }
                }
                state.tick = if zero_for_one {
                    step.tick_next - 1
                } else {
                    step.tick_next
                };
            } else if state.sqrt_price_x96 != step.sqrt_price_start_x96 {
                state.tick = tick_at_sqrt_price(state.sqrt_price_x96)?;
            }
        }

        let (amount0, amount1) = if zero_for_one == exact_input {
            (
                amount_specified - state.amount_specified_remaining,
                state.amount_calculated,
            )
        } else {
            (
                state.amount_calculated,
                amount_specified - state.amount_specified_remaining,
            )
        };

        // Commit.
        self.sqrt_price_x96 = state.sqrt_price_x96;
        self.tick = state.tick;
        self.liquidity = state.liquidity;
        if zero_for_one {
            self.fee_growth_global0_x128 = state.fee_growth_global_x128;
        } else {
            self.fee_growth_global1_x128 = state.fee_growth_global_x128;
        }
        for cross in crossed {
            if let Some(info) = self.ticks.get_mut(&cross.tick) {
                info.fee_growth_outside0_x128 = cross.fee_growth_outside0_x128;
                info.fee_growth_outside1_x128 = cross.fee_growth_outside1_x128;
            }
        }

        // Flip to the caller's perspective: positive means the pool owes
        // the caller.
        Ok(SwapEvent {
            amount0: -amount0,
            amount1: -amount1,
            sqrt_price_x96: self.sqrt_price_x96,
            liquidity: self.liquidity,
            tick: self.tick,
            fee_amount: state.fee_amount,
        })
    }
}
