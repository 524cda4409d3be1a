use crate::FastMap;
use crate::error::Error;
use crate::pool::state::{Pool, PoolId, PoolKey};
use crate::pool::swap::SwapParams;
use crate::settlement::{BalanceDelta, SettlementContext};
use alloy_primitives::{Address, I256, U256};
use tracing::{debug, info};

/// Owns every pool and mediates all access to them through the
/// lock/callback settlement protocol.
///
/// Pool mutations ([`PoolManager::modify_position`], [`PoolManager::swap`])
/// are only available inside an [`PoolManager::unlock`] callback. The
/// manager tracks the net token delta per currency across the callback and
/// requires each currency to be settled to zero before the lock is
/// released; otherwise all state changes made under the lock are rolled
/// back.
#[derive(Default)]
pub struct PoolManager {
    pools: FastMap<PoolId, Pool>,
    contexts: Vec<SettlementContext>,
}

impl PoolManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the pool identified by `key` at the given starting price and
    /// returns its initial tick.
    ///
    /// May be called outside a lock. Fails if the pool already exists.
    pub fn initialize(&mut self, key: &PoolKey, sqrt_price_x96: U256) -> Result<i32, Error> {
        let id = key.id();
        if self.pools.contains_key(&id) {
            return Err(Error::PoolAlreadyInitialized);
        }

        let pool = Pool::new(key.fee, key.tick_spacing, sqrt_price_x96)?;
        let tick = pool.tick;
        self.pools.insert(id, pool);

        info!(
            pool = %id,
            currency0 = %key.currency0,
            currency1 = %key.currency1,
            fee = key.fee,
            tick_spacing = key.tick_spacing,
            %sqrt_price_x96,
            tick,
            "pool initialized"
        );
        Ok(tick)
    }

    /// Read access to a pool's current state.
    pub fn pool(&self, key: &PoolKey) -> Option<&Pool> {
        self.pools.get(&key.id())
    }

    /// Opens a settlement context for `sender` and runs the callback inside
    /// it. Locks nest: a callback may call `unlock` again, and each level
    /// keeps its own ledger.
    ///
    /// If the callback errors, or finishes with any currency netting to a
    /// nonzero amount, every pool mutation made under this lock is rolled
    /// back and the error is returned.
    pub fn unlock<F, R>(&mut self, sender: Address, f: F) -> Result<R, Error>
    where
        F: FnOnce(&mut PoolManager) -> Result<R, Error>,
    {
        self.contexts
            .push(SettlementContext::new(sender, self.pools.clone()));

        let result = f(self).and_then(|value| {
            let ctx = self
                .contexts
                .last()
                .ok_or(Error::NoActiveContext)?;
            match ctx.first_unsettled() {
                Some((currency, amount)) => Err(Error::UnsettledCurrency { currency, amount }),
                None => Ok(value),
            }
        });

        // The context pushed above is only removed here, so the stack
        // cannot be empty.
        let ctx = match self.contexts.pop() {
            Some(ctx) => ctx,
            None => return Err(Error::NoActiveContext),
        };
        if result.is_err() {
            self.pools = ctx.snapshot;
        }
        result
    }

    /// Records a payment from the caller to the pool manager, reducing the
    /// caller's debt (or building a credit) in `currency`.
    pub fn settle(&mut self, currency: Address, amount: U256) -> Result<(), Error> {
        let ctx = self.contexts.last_mut().ok_or(Error::NoActiveContext)?;
        ctx.accrue(currency, I256::from_raw(amount));
        debug!(%currency, %amount, "settle");
        Ok(())
    }

    /// Records a withdrawal of `currency` by the caller, consuming a credit
    /// (or building a debt) that must be repaid before the lock releases.
    pub fn take(&mut self, currency: Address, amount: U256) -> Result<(), Error> {
        let ctx = self.contexts.last_mut().ok_or(Error::NoActiveContext)?;
        ctx.accrue(currency, -I256::from_raw(amount));
        debug!(%currency, %amount, "take");
        Ok(())
    }

    /// Adds or removes liquidity in the pool identified by `key`, on behalf
    /// of the current lock's sender. Requires an active lock.
    ///
    /// The returned delta (principal plus any fees owed to the position) is
    /// accrued against the lock's ledger.
    pub fn modify_position(
        &mut self,
        key: &PoolKey,
        tick_lower: i32,
        tick_upper: i32,
        liquidity_delta: i128,
    ) -> Result<BalanceDelta, Error> {
        let sender = self
            .contexts
            .last()
            .ok_or(Error::NoActiveContext)?
            .sender;
        let pool = self
            .pools
            .get_mut(&key.id())
            .ok_or(Error::PoolNotInitialized)?;

        let delta = pool.modify_position(sender, tick_lower, tick_upper, liquidity_delta)?;
        self.accrue(key, delta)?;

        debug!(
            pool = %key.id(),
            %sender,
            tick_lower,
            tick_upper,
            liquidity_delta,
            amount0 = %delta.amount0,
            amount1 = %delta.amount1,
            "position modified"
        );
        Ok(delta)
    }

    /// Executes a swap in the pool identified by `key`, on behalf of the
    /// current lock's sender. Requires an active lock.
    ///
    /// The swap amounts are accrued against the lock's ledger.
    pub fn swap(&mut self, key: &PoolKey, params: SwapParams) -> Result<BalanceDelta, Error> {
        let sender = self
            .contexts
            .last()
            .ok_or(Error::NoActiveContext)?
            .sender;
        let pool = self
            .pools
            .get_mut(&key.id())
            .ok_or(Error::PoolNotInitialized)?;

        let event = pool.swap(params)?;
        let delta = BalanceDelta::new(event.amount0, event.amount1);
        self.accrue(key, delta)?;

        info!(
            pool = %key.id(),
            %sender,
            amount0 = %event.amount0,
            amount1 = %event.amount1,
            sqrt_price_x96 = %event.sqrt_price_x96,
            liquidity = event.liquidity,
            tick = event.tick,
            fee = key.fee,
            "swap"
        );
        Ok(delta)
    }

    fn accrue(&mut self, key: &PoolKey, delta: BalanceDelta) -> Result<(), Error> {
        let ctx = self.contexts.last_mut().ok_or(Error::NoActiveContext)?;
        ctx.accrue(key.currency0, delta.amount0);
        ctx.accrue(key.currency1, delta.amount1);
        Ok(())
    }
}
