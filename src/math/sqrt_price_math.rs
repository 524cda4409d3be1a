use crate::RESOLUTION;
use crate::error::MathError;
use crate::math::full_math::{div_rounding_up, mul_div, mul_div_rounding_up, unlikely};
use crate::{Q96, U160_MAX};
use alloy_primitives::{I256, U256};

/// Computes the next sqrt price after an `amount` of token0 is added to
/// (`add`) or removed from the pool, rounding the resulting price up.
///
/// Rounding up keeps the invariant conservative for the pool in both swap
/// directions.
pub fn next_sqrt_price_from_amount0_rounding_up(
    sqrt_price_x96: U256,
    liquidity: u128,
    amount: U256,
    add: bool,
) -> Result<U256, MathError> {
    if amount.is_zero() {
        return Ok(sqrt_price_x96);
    }

    let numerator1: U256 = U256::from(liquidity) << RESOLUTION;
    let product: U256 = amount.wrapping_mul(sqrt_price_x96);

    if add {
        if product / amount == sqrt_price_x96 {
            let denominator = numerator1 + product;
            if denominator >= numerator1 {
                return mul_div_rounding_up(numerator1, sqrt_price_x96, denominator);
            }
        }
        Ok(div_rounding_up(
            numerator1,
            (numerator1 / sqrt_price_x96) + amount,
        ))
    } else {
        // Removing more token0 than the virtual reserves hold has no
        // representable price.
        if product / amount != sqrt_price_x96 || numerator1 <= product {
            return Err(MathError::Underflow);
        }
        let denominator = numerator1 - product;
        mul_div_rounding_up(numerator1, sqrt_price_x96, denominator)
    }
}

/// Computes the next sqrt price after an `amount` of token1 is added to
/// (`add`) or removed from the pool, rounding the resulting price down.
pub fn next_sqrt_price_from_amount1_rounding_down(
    sqrt_price_x96: U256,
    liquidity: u128,
    amount: U256,
    add: bool,
) -> Result<U256, MathError> {
    let liquidity = U256::from(liquidity);
    if add {
        let quotient: U256 = if amount <= U160_MAX {
            (amount << RESOLUTION) / liquidity
        } else {
            mul_div(amount, Q96, liquidity)?
        };

        let (result, overflow) = sqrt_price_x96.overflowing_add(quotient);
        if overflow || result > U160_MAX {
            return Err(MathError::Overflow);
        }
        Ok(result)
    } else {
        let quotient: U256 = if amount <= U160_MAX {
            div_rounding_up(amount << RESOLUTION, liquidity)
        } else {
            mul_div_rounding_up(amount, Q96, liquidity)?
        };

        if sqrt_price_x96 <= quotient {
            return Err(MathError::Underflow);
        }
        Ok(sqrt_price_x96 - quotient)
    }
}

/// Token0 amount between two sqrt prices for a given liquidity, optionally
/// rounding up. The price arguments may be passed in either order.
pub fn amount0_delta(
    mut sqrt_ratio_a_x96: U256,
    mut sqrt_ratio_b_x96: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<U256, MathError> {
    if sqrt_ratio_a_x96 > sqrt_ratio_b_x96 {
        (sqrt_ratio_a_x96, sqrt_ratio_b_x96) = (sqrt_ratio_b_x96, sqrt_ratio_a_x96)
    };

    if sqrt_ratio_a_x96.is_zero() {
        return Err(MathError::ZeroValue);
    }

    let numerator1 = U256::from(liquidity) << RESOLUTION;
    let numerator2 = sqrt_ratio_b_x96 - sqrt_ratio_a_x96;

    if round_up {
        Ok(div_rounding_up(
            mul_div_rounding_up(numerator1, numerator2, sqrt_ratio_b_x96)?,
            sqrt_ratio_a_x96,
        ))
    } else {
        Ok(mul_div(numerator1, numerator2, sqrt_ratio_b_x96)? / sqrt_ratio_a_x96)
    }
}

/// Token1 amount between two sqrt prices for a given liquidity, optionally
/// rounding up. The price arguments may be passed in either order.
pub fn amount1_delta(
    mut sqrt_ratio_a_x96: U256,
    mut sqrt_ratio_b_x96: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<U256, MathError> {
    if sqrt_ratio_a_x96 > sqrt_ratio_b_x96 {
        (sqrt_ratio_a_x96, sqrt_ratio_b_x96) = (sqrt_ratio_b_x96, sqrt_ratio_a_x96)
    };
    let liquidity = U256::from(liquidity);

    if round_up {
        mul_div_rounding_up(liquidity, sqrt_ratio_b_x96 - sqrt_ratio_a_x96, Q96)
    } else {
        mul_div(liquidity, sqrt_ratio_b_x96 - sqrt_ratio_a_x96, Q96)
    }
}

/// Signed token0 delta for a signed liquidity change: rounds up (against the
/// owner) when liquidity is added, down when removed.
pub fn amount0_delta_signed(
    sqrt_ratio_a_x96: U256,
    sqrt_ratio_b_x96: U256,
    liquidity: i128,
) -> Result<I256, MathError> {
    if liquidity < 0 {
        Ok(-I256::from_raw(amount0_delta(
            sqrt_ratio_a_x96,
            sqrt_ratio_b_x96,
            liquidity.unsigned_abs(),
            false,
        )?))
    } else {
        Ok(I256::from_raw(amount0_delta(
            sqrt_ratio_a_x96,
            sqrt_ratio_b_x96,
            liquidity as u128,
            true,
        )?))
    }
}

/// Signed token1 delta for a signed liquidity change, with the same rounding
/// policy as [`amount0_delta_signed`].
pub fn amount1_delta_signed(
    sqrt_ratio_a_x96: U256,
    sqrt_ratio_b_x96: U256,
    liquidity: i128,
) -> Result<I256, MathError> {
    if liquidity < 0 {
        Ok(-I256::from_raw(amount1_delta(
            sqrt_ratio_a_x96,
            sqrt_ratio_b_x96,
            liquidity.unsigned_abs(),
            false,
        )?))
    } else {
        Ok(I256::from_raw(amount1_delta(
            sqrt_ratio_a_x96,
            sqrt_ratio_b_x96,
            liquidity as u128,
            true,
        )?))
    }
}

/// Next sqrt price when `amount_in` enters the pool, picking the token0 or
/// token1 branch from the swap direction.
pub fn next_sqrt_price_from_input(
    sqrt_price_x96: U256,
    liquidity: u128,
    amount_in: U256,
    zero_for_one: bool,
) -> Result<U256, MathError> {
    if unlikely(sqrt_price_x96.is_zero()) || unlikely(liquidity == 0) {
        return Err(MathError::ZeroValue);
    }

    if zero_for_one {
        next_sqrt_price_from_amount0_rounding_up(sqrt_price_x96, liquidity, amount_in, true)
    } else {
        next_sqrt_price_from_amount1_rounding_down(sqrt_price_x96, liquidity, amount_in, true)
    }
}

/// Next sqrt price when `amount_out` leaves the pool, picking the token0 or
/// token1 branch from the swap direction.
pub fn next_sqrt_price_from_output(
    sqrt_price_x96: U256,
    liquidity: u128,
    amount_out: U256,
    zero_for_one: bool,
) -> Result<U256, MathError> {
    if unlikely(sqrt_price_x96.is_zero()) || unlikely(liquidity == 0) {
        return Err(MathError::ZeroValue);
    }

    if zero_for_one {
        next_sqrt_price_from_amount1_rounding_down(sqrt_price_x96, liquidity, amount_out, false)
    } else {
        next_sqrt_price_from_amount0_rounding_up(sqrt_price_x96, liquidity, amount_out, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::U256_1;
    use std::{
        ops::{Add, Sub},
        str::FromStr,
    };

    const U256_2: U256 = U256::from_limbs([2, 0, 0, 0]);

    #[test]
    fn next_price_from_input_rejects_zero_inputs() {
        let result =
            next_sqrt_price_from_input(U256::ZERO, 0, U256::from(100000000000000000u128), false);
        assert!(matches!(result, Err(MathError::ZeroValue)));

        let result =
            next_sqrt_price_from_input(U256_1, 0, U256::from(100000000000000000u128), true);
        assert!(matches!(result, Err(MathError::ZeroValue)));
    }

    #[test]
    fn next_price_from_input_overflow_and_underflow_edges() {
        // input amount overflows the price
        let result = next_sqrt_price_from_input(U160_MAX, 1024, U256::from(1024), false);
        assert!(matches!(result, Err(MathError::Overflow)));

        // any input amount cannot underflow the price
        let result = next_sqrt_price_from_input(
            U256_1,
            1,
            U256::from_str(
                "57896044618658097711785492504343953926634992332820282019728792003956564819968",
            )
            .unwrap(),
            true,
        );
        assert_eq!(result.unwrap(), U256_1);

        // minimum price for max inputs
        let sqrt_price = U160_MAX;
        let liquidity = u128::MAX;
        let max_amount_no_overflow = U256::MAX - ((U256::from(liquidity) << 96) / sqrt_price);
        let result =
            next_sqrt_price_from_input(sqrt_price, liquidity, max_amount_no_overflow, true);
        assert_eq!(result.unwrap(), U256_1);

        // can return 1 with enough amount in and zero_for_one = true
        let result = next_sqrt_price_from_input(
            U256::from_str("79228162514264337593543950336").unwrap(),
            1,
            U256::MAX / U256_2,
            true,
        );
        assert_eq!(result.unwrap(), U256_1);
    }

    #[test]
    fn next_price_from_input_zero_amount_is_identity() {
        for zero_for_one in [true, false] {
            let result = next_sqrt_price_from_input(
                U256::from_str("79228162514264337593543950336").unwrap(),
                1e17 as u128,
                U256::ZERO,
                zero_for_one,
            );
            assert_eq!(
                result.unwrap(),
                U256::from_str("79228162514264337593543950336").unwrap()
            );
        }
    }

    #[test]
    fn next_price_from_input_reference_values() {
        // input amount of 0.1 token1
        let result = next_sqrt_price_from_input(
            U256::from_str("79228162514264337593543950336").unwrap(),
            1e18 as u128,
            U256::from_str("100000000000000000").unwrap(),
            false,
        );
        assert_eq!(
            result.unwrap(),
            U256::from_str("87150978765690771352898345369").unwrap()
        );

        // input amount of 0.1 token0
        let result = next_sqrt_price_from_input(
            U256::from_str("79228162514264337593543950336").unwrap(),
            1e18 as u128,
            U256::from_str("100000000000000000").unwrap(),
            true,
        );
        assert_eq!(
            result.unwrap(),
            U256::from_str("72025602285694852357767227579").unwrap()
        );

        // amount_in > type(uint96).max and zero_for_one = true
        let result = next_sqrt_price_from_input(
            U256::from_str("79228162514264337593543950336").unwrap(),
            1e19 as u128,
            U256::from_str("1267650600228229401496703205376").unwrap(),
            true,
        );
        assert_eq!(
            result.unwrap(),
            U256::from_str("624999999995069620").unwrap()
        );
    }

    #[test]
    fn next_price_from_output_rejects_zero_inputs() {
        let result = next_sqrt_price_from_output(U256::ZERO, 0, U256::from(1000000000), false);
        assert!(matches!(result, Err(MathError::ZeroValue)));

        let result = next_sqrt_price_from_output(U256_1, 0, U256::from(1000000000), false);
        assert!(matches!(result, Err(MathError::ZeroValue)));
    }

    #[test]
    fn next_price_from_output_reserve_exhaustion() {
        let price = U256::from_str("20282409603651670423947251286016").unwrap();

        // output equal to or above the virtual reserves of token0
        for amount in [4u64, 5] {
            let result = next_sqrt_price_from_output(price, 1024, U256::from(amount), false);
            assert!(matches!(result, Err(MathError::Underflow)));
        }

        // output equal to or above the virtual reserves of token1
        for amount in [262144u64, 262145] {
            let result = next_sqrt_price_from_output(price, 1024, U256::from(amount), true);
            assert!(matches!(result, Err(MathError::Underflow)));
        }

        // just below the virtual reserves of token1
        let result = next_sqrt_price_from_output(price, 1024, U256::from(262143u64), true);
        assert_eq!(
            result.unwrap(),
            U256::from_str("77371252455336267181195264").unwrap()
        );
    }

    #[test]
    fn next_price_from_output_reference_values() {
        // output amount of 0.1 token1
        let result = next_sqrt_price_from_output(
            U256::from_str("79228162514264337593543950336").unwrap(),
            1e18 as u128,
            U256::from(1e17 as u128),
            false,
        );
        assert_eq!(
            result.unwrap(),
            U256::from_str("88031291682515930659493278152").unwrap()
        );

        // output amount of 0.1 token0
        let result = next_sqrt_price_from_output(
            U256::from_str("79228162514264337593543950336").unwrap(),
            1e18 as u128,
            U256::from(1e17 as u128),
            true,
        );
        assert_eq!(
            result.unwrap(),
            U256::from_str("71305346262837903834189555302").unwrap()
        );

        // impossible output in the zero for one direction
        let result = next_sqrt_price_from_output(
            U256::from_str("79228162514264337593543950336").unwrap(),
            1,
            U256::MAX,
            true,
        );
        assert!(matches!(result, Err(MathError::Overflow)));

        // impossible output in the one for zero direction
        let result = next_sqrt_price_from_output(
            U256::from_str("79228162514264337593543950336").unwrap(),
            1,
            U256::MAX,
            false,
        );
        assert!(matches!(result, Err(MathError::Underflow)));
    }

    #[test]
    fn amount0_delta_reference_values() {
        // zero liquidity or equal prices give zero
        let amount_0 = amount0_delta(
            U256::from_str("79228162514264337593543950336").unwrap(),
            U256::from_str("79228162514264337593543950336").unwrap(),
            0,
            true,
        );
        assert_eq!(amount_0.unwrap(), U256::ZERO);

        let amount_0 = amount0_delta(
            U256::from_str("79228162514264337593543950336").unwrap(),
            U256::from_str("87150978765690771352898345369").unwrap(),
            0,
            true,
        );
        assert_eq!(amount_0.unwrap(), U256::ZERO);

        // price of 1 to 1.21
        let amount_0 = amount0_delta(
            U256::from_str("79228162514264337593543950336").unwrap(),
            U256::from_str("87150978765690771352898345369").unwrap(),
            1e18 as u128,
            true,
        )
        .unwrap();
        assert_eq!(amount_0, U256::from_str("90909090909090910").unwrap());

        let amount_0_rounded_down = amount0_delta(
            U256::from_str("79228162514264337593543950336").unwrap(),
            U256::from_str("87150978765690771352898345369").unwrap(),
            1e18 as u128,
            false,
        );
        assert_eq!(amount_0_rounded_down.unwrap(), amount_0.sub(U256_1));

        // prices whose product overflows 256 bits
        let amount_0_up = amount0_delta(
            U256::from_str("2787593149816327892691964784081045188247552").unwrap(),
            U256::from_str("22300745198530623141535718272648361505980416").unwrap(),
            1e18 as u128,
            true,
        )
        .unwrap();
        let amount_0_down = amount0_delta(
            U256::from_str("2787593149816327892691964784081045188247552").unwrap(),
            U256::from_str("22300745198530623141535718272648361505980416").unwrap(),
            1e18 as u128,
            false,
        )
        .unwrap();
        assert_eq!(amount_0_up, amount_0_down.add(U256_1));
    }

    #[test]
    fn amount1_delta_reference_values() {
        let amount_1 = amount1_delta(
            U256::from_str("79228162514264337593543950336").unwrap(),
            U256::from_str("87150978765690771352898345369").unwrap(),
            0,
            true,
        );
        assert_eq!(amount_1.unwrap(), U256::ZERO);

        // price of 1 to 1.21
        let amount_1 = amount1_delta(
            U256::from_str("79228162514264337593543950336").unwrap(),
            U256::from_str("87150978765690771352898345369").unwrap(),
            1e18 as u128,
            true,
        )
        .unwrap();
        assert_eq!(amount_1, U256::from_str("100000000000000000").unwrap());

        let amount_1_rounded_down = amount1_delta(
            U256::from_str("79228162514264337593543950336").unwrap(),
            U256::from_str("87150978765690771352898345369").unwrap(),
            1e18 as u128,
            false,
        );
        assert_eq!(amount_1_rounded_down.unwrap(), amount_1.sub(U256_1));
    }

    #[test]
    fn signed_deltas_negate_between_add_and_remove() {
        let a = U256::from_str("79228162514264337593543950336").unwrap();
        let b = U256::from_str("87150978765690771352898345369").unwrap();

        let add0 = amount0_delta_signed(a, b, 1e18 as i128).unwrap();
        let remove0 = amount0_delta_signed(a, b, -(1e18 as i128)).unwrap();
        assert!(add0 > I256::ZERO);
        assert!(remove0 < I256::ZERO);
        // Rounding works against the owner, so the magnitudes differ by one.
        assert_eq!(add0 + remove0, I256::ONE);

        let add1 = amount1_delta_signed(a, b, 1e18 as i128).unwrap();
        let remove1 = amount1_delta_signed(a, b, -(1e18 as i128)).unwrap();
        assert!(add1 > I256::ZERO);
        assert!(remove1 < I256::ZERO);
        assert_eq!(add1 + remove1, I256::ONE);
    }

    #[test]
    fn swap_computation_regression() {
        let sqrt_price =
            U256::from_str("1025574284609383690408304870162715216695788925244").unwrap();
        let liquidity = 50015962439936049619261659728067971248;
        let amount_in = U256::from(406);

        let sqrt_q = next_sqrt_price_from_input(sqrt_price, liquidity, amount_in, true).unwrap();
        assert_eq!(
            sqrt_q,
            U256::from_str("1025574284609383582644711336373707553698163132913").unwrap()
        );

        let amount_0 = amount0_delta(sqrt_q, sqrt_price, liquidity, true).unwrap();
        assert_eq!(amount_0, U256::from(406));
    }
}
