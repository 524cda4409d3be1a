use crate::FastMap;
use crate::pool::state::{Pool, PoolId};
use alloy_primitives::{Address, I256};

/// Signed token amounts produced by a pool operation, from the caller's
/// perspective: positive means the pool owes the caller, negative means the
/// caller owes the pool.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BalanceDelta {
    pub amount0: I256,
    pub amount1: I256,
}

impl BalanceDelta {
    pub const ZERO: Self = Self {
        amount0: I256::ZERO,
        amount1: I256::ZERO,
    };

    #[inline]
    pub fn new(amount0: I256, amount1: I256) -> Self {
        Self { amount0, amount1 }
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.amount0.is_zero() && self.amount1.is_zero()
    }
}

/// One level of the lock stack. Tracks the per-currency net deltas accrued
/// inside the callback and holds a snapshot of pool state for rollback if
/// the callback fails or leaves a nonzero balance.
pub(crate) struct SettlementContext {
    pub(crate) sender: Address,
    deltas: FastMap<Address, I256>,
    pub(crate) snapshot: FastMap<PoolId, Pool>,
}

impl SettlementContext {
    pub(crate) fn new(sender: Address, snapshot: FastMap<PoolId, Pool>) -> Self {
        Self {
            sender,
            deltas: FastMap::default(),
            snapshot,
        }
    }

    /// Accrues a signed amount against a currency. Zero entries are pruned
    /// so a settled currency drops out of the ledger entirely.
    pub(crate) fn accrue(&mut self, currency: Address, amount: I256) {
        let entry = self.deltas.entry(currency).or_insert(I256::ZERO);
        *entry += amount;
        if entry.is_zero() {
            self.deltas.remove(&currency);
        }
    }

    /// Returns a currency with a nonzero net delta, if any remains.
    pub(crate) fn first_unsettled(&self) -> Option<(Address, I256)> {
        self.deltas.iter().next().map(|(c, a)| (*c, *a))
    }
}
