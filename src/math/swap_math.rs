use crate::FEE_DENOMINATOR;
use crate::error::MathError;
use crate::math::full_math::{mul_div, mul_div_rounding_up};
use crate::math::sqrt_price_math;
use alloy_primitives::{I256, U256};

/// Computes a single step of a swap within one tick range.
///
/// The direction is inferred from the prices: `zero_for_one` when
/// `sqrt_price_current_x96 >= sqrt_price_target_x96`. A non-negative
/// `amount_remaining` is an exact-input step (fee taken from the input), a
/// negative one is exact-output.
///
/// Returns `(sqrt_price_next, amount_in, amount_out, fee_amount)`. The price
/// never moves past the target, and for exact input `amount_in + fee_amount`
/// never exceeds the remaining amount. With zero liquidity the step produces
/// zero amounts and jumps straight to the target price.
pub fn compute_swap_step(
    sqrt_price_current_x96: U256,
    sqrt_price_target_x96: U256,
    liquidity: u128,
    amount_remaining: I256,
    fee_pips: u32,
) -> Result<(U256, U256, U256, U256), MathError> {
    let zero_for_one = sqrt_price_current_x96 >= sqrt_price_target_x96;
    let exact_in = amount_remaining >= I256::ZERO;

    let fee_complement = U256::from(FEE_DENOMINATOR - fee_pips);

    let sqrt_price_next_x96: U256;
    let mut amount_in = U256::ZERO;
    let mut amount_out = U256::ZERO;

    if exact_in {
        let amount_remaining_less_fee = mul_div(
            amount_remaining.into_raw(),
            fee_complement,
            U256::from(FEE_DENOMINATOR),
        )?;
        amount_in = if zero_for_one {
            sqrt_price_math::amount0_delta(
                sqrt_price_target_x96,
                sqrt_price_current_x96,
                liquidity,
                true,
            )?
        } else {
            sqrt_price_math::amount1_delta(
                sqrt_price_current_x96,
                sqrt_price_target_x96,
                liquidity,
                true,
            )?
        };
        sqrt_price_next_x96 = if amount_remaining_less_fee >= amount_in {
            sqrt_price_target_x96
        } else {
            sqrt_price_math::next_sqrt_price_from_input(
                sqrt_price_current_x96,
                liquidity,
                amount_remaining_less_fee,
                zero_for_one,
            )?
        };
    } else {
        amount_out = if zero_for_one {
            sqrt_price_math::amount1_delta(
                sqrt_price_target_x96,
                sqrt_price_current_x96,
                liquidity,
                false,
            )?
        } else {
            sqrt_price_math::amount0_delta(
                sqrt_price_current_x96,
                sqrt_price_target_x96,
                liquidity,
                false,
            )?
        };
        sqrt_price_next_x96 = if amount_remaining.unsigned_abs() > amount_out {
            sqrt_price_target_x96
        } else {
            sqrt_price_math::next_sqrt_price_from_output(
                sqrt_price_current_x96,
                liquidity,
                amount_remaining.unsigned_abs(),
                zero_for_one,
            )?
        };
    }

    let max = sqrt_price_target_x96 == sqrt_price_next_x96;

    if zero_for_one {
        if !(max && exact_in) {
            amount_in = sqrt_price_math::amount0_delta(
                sqrt_price_next_x96,
                sqrt_price_current_x96,
                liquidity,
                true,
            )?;
        }
        if !(max && !exact_in) {
            amount_out = sqrt_price_math::amount1_delta(
                sqrt_price_next_x96,
                sqrt_price_current_x96,
                liquidity,
                false,
            )?;
        }
    } else {
        if !(max && exact_in) {
            amount_in = sqrt_price_math::amount1_delta(
                sqrt_price_current_x96,
                sqrt_price_next_x96,
                liquidity,
                true,
            )?;
        }
        if !(max && !exact_in) {
            amount_out = sqrt_price_math::amount0_delta(
                sqrt_price_current_x96,
                sqrt_price_next_x96,
                liquidity,
                false,
            )?;
        }
    }

    // Cap the output at what was asked for.
    if !exact_in && amount_out > amount_remaining.unsigned_abs() {
        amount_out = amount_remaining.unsigned_abs();
    }

    let fee_amount = if exact_in && sqrt_price_next_x96 != sqrt_price_target_x96 {
        // The step consumed the whole remaining input; the leftover is the fee.
        amount_remaining
            .unsigned_abs()
            .checked_sub(amount_in)
            .ok_or(MathError::Underflow)?
    } else {
        mul_div_rounding_up(amount_in, U256::from(fee_pips), fee_complement)?
    };

    Ok((sqrt_price_next_x96, amount_in, amount_out, fee_amount))
}
