//! Concentrated-liquidity AMM engine in pure Rust.
//!
//! This crate exposes:
//! - Low-level fixed-point math primitives (`math::*`) for ticks, Q64.96
//!   sqrt prices and initialized-tick bitmaps.
//! - An in-memory [`Pool`] holding the tick ledger and position store, with
//!   the two state transitions: [`Pool::modify_position`] and [`Pool::swap`].
//! - A [`PoolManager`] façade that owns all pools and enforces the
//!   lock/callback settlement protocol ("flash accounting"): every
//!   `modify_position`/`swap` runs inside a [`PoolManager::unlock`] sequence
//!   and must net out to zero per currency before the sequence completes.
//!
//! # Example
//!
//! ```no_run
//! use clamm::{PoolManager, PoolKey, U256, Address};
//! use clamm::math::tick_math::sqrt_price_at_tick;
//!
//! let currency0 = Address::from([1u8; 20]);
//! let currency1 = Address::from([2u8; 20]);
//! let key = PoolKey::new(currency0, currency1, 3000, 60).unwrap();
//!
//! let mut manager = PoolManager::new();
//! manager.initialize(&key, sqrt_price_at_tick(0).unwrap()).unwrap();
//!
//! let sender = Address::from([9u8; 20]);
//! manager
//!     .unlock(sender, |pm| {
//!         let delta = pm.modify_position(&key, -600, 600, 1_000_000_000_000i128)?;
//!         // The callback settles what it owes before the lock is released.
//!         pm.settle(currency0, (-delta.amount0).into_raw())?;
//!         pm.settle(currency1, (-delta.amount1).into_raw())?;
//!         Ok(())
//!     })
//!     .unwrap();
//! ```

pub use alloy_primitives::{Address, B256, I256, U256};

pub mod error;
mod hash;
pub mod math;
pub mod pool;

pub use hash::FastMap;

mod manager;
mod settlement;

pub use error::{Error, MathError};
pub use manager::PoolManager;
pub use pool::state::{Pool, PoolId, PoolKey, TickInfo};
pub use pool::swap::{SwapEvent, SwapParams};
pub use settlement::BalanceDelta;

pub(crate) const U256_1: U256 = U256::from_limbs([1, 0, 0, 0]);
pub(crate) const U256_127: U256 = U256::from_limbs([127, 0, 0, 0]);
pub(crate) const U256_128: U256 = U256::from_limbs([128, 0, 0, 0]);

pub(crate) const U160_MAX: U256 = U256::from_limbs([0, 0, 4294967296, 0]);

/// Fee denominator: pool fees are expressed in pips (hundredths of a bip).
pub const FEE_DENOMINATOR: u32 = 1_000_000;

/// Number of fractional bits in the Q64.96 sqrt price representation.
pub const RESOLUTION: u8 = 96;

/// 2^96, the Q64.96 scale factor.
pub const Q96: U256 = U256::from_limbs([0, 4294967296, 0, 0]);

/// 2^128, the scale of the Q128 fee-growth accumulators.
pub const Q128: U256 = U256::from_limbs([0, 0, 1, 0]);
