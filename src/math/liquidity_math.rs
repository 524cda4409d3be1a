use crate::Q96;
use crate::error::{Error, MathError};
use crate::math::full_math::mul_div;
use crate::math::sqrt_price_math;
use alloy_primitives::U256;

/// Applies a signed liquidity change to an unsigned liquidity amount.
///
/// Removing more than is held is reported as `InsufficientLiquidity`;
/// exceeding `u128::MAX` is an overflow.
pub fn add_delta(liquidity: u128, delta: i128) -> Result<u128, Error> {
    if delta < 0 {
        liquidity
            .checked_sub(delta.unsigned_abs())
            .ok_or(Error::InsufficientLiquidity { liquidity, delta })
    } else {
        liquidity
            .checked_add(delta as u128)
            .ok_or(Error::Math(MathError::Overflow))
    }
}

/// Maximum liquidity obtainable from `amount0` over the price range
/// `[sqrt_ratio_a, sqrt_ratio_b]`.
pub fn liquidity_for_amount0(
    mut sqrt_ratio_a_x96: U256,
    mut sqrt_ratio_b_x96: U256,
    amount0: U256,
) -> Result<u128, Error> {
    if sqrt_ratio_a_x96 > sqrt_ratio_b_x96 {
        (sqrt_ratio_a_x96, sqrt_ratio_b_x96) = (sqrt_ratio_b_x96, sqrt_ratio_a_x96)
    };
    if sqrt_ratio_a_x96 >= sqrt_ratio_b_x96 {
        return Err(Error::InvalidRange {
            lower: sqrt_ratio_a_x96,
            upper: sqrt_ratio_b_x96,
        });
    }

    let intermediate = mul_div(sqrt_ratio_a_x96, sqrt_ratio_b_x96, Q96)?;
    let liquidity = mul_div(amount0, intermediate, sqrt_ratio_b_x96 - sqrt_ratio_a_x96)?;
    to_u128(liquidity)
}

/// Maximum liquidity obtainable from `amount1` over the price range
/// `[sqrt_ratio_a, sqrt_ratio_b]`.
pub fn liquidity_for_amount1(
    mut sqrt_ratio_a_x96: U256,
    mut sqrt_ratio_b_x96: U256,
    amount1: U256,
) -> Result<u128, Error> {
    if sqrt_ratio_a_x96 > sqrt_ratio_b_x96 {
        (sqrt_ratio_a_x96, sqrt_ratio_b_x96) = (sqrt_ratio_b_x96, sqrt_ratio_a_x96)
    };
    if sqrt_ratio_a_x96 >= sqrt_ratio_b_x96 {
        return Err(Error::InvalidRange {
            lower: sqrt_ratio_a_x96,
            upper: sqrt_ratio_b_x96,
        });
    }

    let liquidity = mul_div(amount1, Q96, sqrt_ratio_b_x96 - sqrt_ratio_a_x96)?;
    to_u128(liquidity)
}

/// Maximum liquidity obtainable from both token amounts given the current
/// price. Below the range only token0 counts, above it only token1, inside
/// it the smaller of the two candidates wins.
pub fn liquidity_for_amounts(
    sqrt_ratio_x96: U256,
    sqrt_ratio_lower_x96: U256,
    sqrt_ratio_upper_x96: U256,
    amount0: U256,
    amount1: U256,
) -> Result<u128, Error> {
    if sqrt_ratio_lower_x96 >= sqrt_ratio_upper_x96 {
        return Err(Error::InvalidRange {
            lower: sqrt_ratio_lower_x96,
            upper: sqrt_ratio_upper_x96,
        });
    }

    if sqrt_ratio_x96 <= sqrt_ratio_lower_x96 {
        liquidity_for_amount0(sqrt_ratio_lower_x96, sqrt_ratio_upper_x96, amount0)
    } else if sqrt_ratio_x96 >= sqrt_ratio_upper_x96 {
        liquidity_for_amount1(sqrt_ratio_lower_x96, sqrt_ratio_upper_x96, amount1)
    } else {
        let liquidity0 = liquidity_for_amount0(sqrt_ratio_x96, sqrt_ratio_upper_x96, amount0)?;
        let liquidity1 = liquidity_for_amount1(sqrt_ratio_lower_x96, sqrt_ratio_x96, amount1)?;
        Ok(liquidity0.min(liquidity1))
    }
}

/// Token amounts currently backing `liquidity` over a price range, with the
/// current price clamped into the range.
pub fn amounts_for_liquidity(
    sqrt_ratio_x96: U256,
    sqrt_ratio_lower_x96: U256,
    sqrt_ratio_upper_x96: U256,
    liquidity: u128,
) -> Result<(U256, U256), Error> {
    if sqrt_ratio_lower_x96 >= sqrt_ratio_upper_x96 {
        return Err(Error::InvalidRange {
            lower: sqrt_ratio_lower_x96,
            upper: sqrt_ratio_upper_x96,
        });
    }

    let clamped = sqrt_ratio_x96
        .max(sqrt_ratio_lower_x96)
        .min(sqrt_ratio_upper_x96);

    let amount0 = if clamped < sqrt_ratio_upper_x96 {
        sqrt_price_math::amount0_delta(clamped, sqrt_ratio_upper_x96, liquidity, false)?
    } else {
        U256::ZERO
    };
    let amount1 = if clamped > sqrt_ratio_lower_x96 {
        sqrt_price_math::amount1_delta(sqrt_ratio_lower_x96, clamped, liquidity, false)?
    } else {
        U256::ZERO
    };

    Ok((amount0, amount1))
}

fn to_u128(value: U256) -> Result<u128, Error> {
    let limbs = value.as_limbs();
    if limbs[2] != 0 || limbs[3] != 0 {
        return Err(Error::Math(MathError::Overflow));
    }
    Ok((limbs[0] as u128) | ((limbs[1] as u128) << 64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::tick_math::sqrt_price_at_tick;

    #[test]
    fn add_delta_basic() {
        assert_eq!(add_delta(1, 0).unwrap(), 1);
        assert_eq!(add_delta(1, -1).unwrap(), 0);
        assert_eq!(add_delta(1, 1).unwrap(), 2);
    }

    #[test]
    fn add_delta_overflow() {
        assert!(matches!(
            add_delta(u128::MAX, 1),
            Err(Error::Math(MathError::Overflow))
        ));
    }

    #[test]
    fn add_delta_removal_exceeds_held() {
        assert_eq!(
            add_delta(3, -4),
            Err(Error::InsufficientLiquidity {
                liquidity: 3,
                delta: -4
            })
        );
    }

    #[test]
    fn liquidity_for_amounts_rejects_degenerate_range() {
        let price = sqrt_price_at_tick(0).unwrap();
        assert!(matches!(
            liquidity_for_amounts(price, price, price, U256::from(1u8), U256::from(1u8)),
            Err(Error::InvalidRange { .. })
        ));
    }

    #[test]
    fn liquidity_for_amounts_inside_range_takes_min() {
        let lower = sqrt_price_at_tick(-600).unwrap();
        let upper = sqrt_price_at_tick(600).unwrap();
        let current = sqrt_price_at_tick(0).unwrap();
        let amount = U256::from(1_000_000_000_000_000_000u128);

        let combined = liquidity_for_amounts(current, lower, upper, amount, amount).unwrap();
        let liquidity0 = liquidity_for_amount0(current, upper, amount).unwrap();
        let liquidity1 = liquidity_for_amount1(lower, current, amount).unwrap();
        assert_eq!(combined, liquidity0.min(liquidity1));
        assert!(combined > 0);
    }

    #[test]
    fn liquidity_for_amounts_outside_range_uses_single_token() {
        let lower = sqrt_price_at_tick(-600).unwrap();
        let upper = sqrt_price_at_tick(600).unwrap();
        let amount = U256::from(1_000_000_000_000_000_000u128);

        let below = liquidity_for_amounts(
            sqrt_price_at_tick(-1200).unwrap(),
            lower,
            upper,
            amount,
            U256::ZERO,
        )
        .unwrap();
        assert_eq!(below, liquidity_for_amount0(lower, upper, amount).unwrap());

        let above = liquidity_for_amounts(
            sqrt_price_at_tick(1200).unwrap(),
            lower,
            upper,
            U256::ZERO,
            amount,
        )
        .unwrap();
        assert_eq!(above, liquidity_for_amount1(lower, upper, amount).unwrap());
    }

    #[test]
    fn amounts_round_trip_through_liquidity() {
        let lower = sqrt_price_at_tick(-600).unwrap();
        let upper = sqrt_price_at_tick(600).unwrap();
        let current = sqrt_price_at_tick(0).unwrap();
        let liquidity = 1_000_000_000_000_000_000u128;

        let (amount0, amount1) =
            amounts_for_liquidity(current, lower, upper, liquidity).unwrap();
        assert!(amount0 > U256::ZERO);
        assert!(amount1 > U256::ZERO);

        // Round-down amounts can only reproduce at most the original liquidity.
        let recovered = liquidity_for_amounts(current, lower, upper, amount0, amount1).unwrap();
        assert!(recovered <= liquidity);
        assert!(recovered > liquidity - 1_000_000);
    }
}
