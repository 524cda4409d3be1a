use alloy_primitives::{Address, I256, U256};
use thiserror::Error;

/// Low-level arithmetic failures surfaced by the fixed-point helpers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MathError {
    #[error("math error - overflow")]
    Overflow,
    #[error("math error - underflow")]
    Underflow,
    #[error("math error - division by zero")]
    DivisionByZero,
    #[error("math error - zero input value")]
    ZeroValue,
    #[error("math error - value out of bounds")]
    OutOfBounds,
}

/// Engine-level errors. Every variant carries the offending values so the
/// immediate caller can act on it; all validation happens before any state
/// mutation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// A tick index or sqrt price outside the representable range.
    /// Ticks are widened to `I256` so both kinds share one payload shape.
    #[error("value {value} outside valid range [{min}, {max}]")]
    OutOfRange { value: I256, min: I256, max: I256 },

    /// Malformed or non-usable position bounds: not ordered, not aligned to
    /// the pool's tick spacing, or outside the global tick range.
    #[error("invalid tick range [{lower}, {upper}]")]
    InvalidTickRange { lower: i32, upper: i32 },

    /// Degenerate price range handed to the liquidity math.
    #[error("invalid price range: lower {lower} >= upper {upper}")]
    InvalidRange { lower: U256, upper: U256 },

    /// A removal that exceeds the liquidity actually held.
    #[error("insufficient liquidity: position holds {liquidity}, delta {delta}")]
    InsufficientLiquidity { liquidity: u128, delta: i128 },

    /// Swap price limit on the wrong side of the current price, or outside
    /// the global price bounds.
    #[error("invalid price limit {limit} for current sqrt price {sqrt_price}")]
    InvalidPriceLimit { limit: U256, sqrt_price: U256 },

    /// A settlement context was released while a currency still had a
    /// nonzero net delta.
    #[error("unsettled currency {currency}: outstanding delta {amount}")]
    UnsettledCurrency { currency: Address, amount: I256 },

    /// A state transition was attempted without an active settlement context.
    #[error("no active settlement context")]
    NoActiveContext,

    /// Operation against a pool that has not been initialized.
    #[error("pool not initialized")]
    PoolNotInitialized,

    /// `initialize` called twice for the same pool key.
    #[error("pool already initialized")]
    PoolAlreadyInitialized,

    /// Fee tier or tick spacing outside the supported bounds.
    #[error("invalid pool key: fee {fee} pips, tick spacing {tick_spacing}")]
    InvalidPoolKey { fee: u32, tick_spacing: i32 },

    #[error(transparent)]
    Math(#[from] MathError),
}
