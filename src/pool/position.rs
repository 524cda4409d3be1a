use crate::Q128;
use crate::error::Error;
use crate::math::full_math::mul_div;
use alloy_primitives::{Address, U256};

/// Identifies a liquidity position: one owner, one tick range, one record.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PositionKey {
    pub owner: Address,
    pub tick_lower: i32,
    pub tick_upper: i32,
}

/// Per-position liquidity and the fee-growth checkpoint taken at the last
/// update. Fees accrued between checkpoints are paid out on every update.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Position {
    pub liquidity: u128,
    pub fee_growth_inside0_last_x128: U256,
    pub fee_growth_inside1_last_x128: U256,
}

impl Position {
    /// Moves the checkpoint forward to the given in-range fee growth and
    /// returns the token amounts earned since the previous checkpoint.
    ///
    /// Growth accumulators are free-running and may wrap; the difference is
    /// taken with wrapping arithmetic.
    pub fn checkpoint_fees(
        &mut self,
        fee_growth_inside0_x128: U256,
        fee_growth_inside1_x128: U256,
    ) -> Result<(U256, U256), Error> {
        let owed0 = mul_div(
            fee_growth_inside0_x128.wrapping_sub(self.fee_growth_inside0_last_x128),
            U256::from(self.liquidity),
            Q128,
        )?;
        let owed1 = mul_div(
            fee_growth_inside1_x128.wrapping_sub(self.fee_growth_inside1_last_x128),
            U256::from(self.liquidity),
            Q128,
        )?;

        self.fee_growth_inside0_last_x128 = fee_growth_inside0_x128;
        self.fee_growth_inside1_last_x128 = fee_growth_inside1_x128;

        Ok((owed0, owed1))
    }
}
