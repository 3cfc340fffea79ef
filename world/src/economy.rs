//! Per-side currency balances and the summon cost curve.

use lucky_defense_core::DataProvider;
use serde::Deserialize;
use thiserror::Error;

/// Number of summon counts resolved against the data provider up front.
const COST_HORIZON: usize = 1024;

/// Tuning shared by both sides' economies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Gems each side starts with.
    pub starting_gem: u32,
    /// Unit cap reported to observers; not enforced.
    pub max_units: u32,
    /// Gold credited for a regular kill.
    pub kill_gold: u32,
    /// Gems credited for a boss kill.
    pub boss_gems: u32,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            starting_gem: 0,
            max_units: 25,
            kill_gold: 2,
            boss_gems: 2,
        }
    }
}

/// Reasons a ledger debit may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
pub enum LedgerError {
    /// Not enough gold.
    #[error("insufficient gold: {required} required, {available} available")]
    InsufficientGold {
        /// Amount requested.
        required: u32,
        /// Amount held.
        available: u32,
    },
    /// Not enough gems.
    #[error("insufficient gems: {required} required, {available} available")]
    InsufficientGems {
        /// Amount requested.
        required: u32,
        /// Amount held.
        available: u32,
    },
}

/// Gold cost of the next summon as a function of previous summons.
///
/// Costs are clamped to their running maximum so the curve never decreases,
/// even when the underlying table does.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SummonCostCurve {
    prefix: Vec<u32>,
}

impl SummonCostCurve {
    /// Resolves the curve from the provider's summon cost table.
    #[must_use]
    pub fn from_provider(provider: &dyn DataProvider) -> Self {
        let mut prefix = Vec::with_capacity(COST_HORIZON);
        let mut running = 0u32;
        for summon_count in 0..COST_HORIZON as u32 {
            running = running.max(provider.summon_cost(summon_count));
            prefix.push(running);
        }
        Self { prefix }
    }

    /// Cost of the summon following `summon_count` previous summons.
    #[must_use]
    pub fn cost(&self, summon_count: u32) -> u32 {
        let index = summon_count as usize;
        if let Some(cost) = self.prefix.get(index) {
            return *cost;
        }
        let linear = summon_count.saturating_mul(10).saturating_add(10);
        self.prefix.last().copied().unwrap_or(0).max(linear)
    }
}

/// Currency balances and summon bookkeeping for one side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EconomyLedger {
    gold: u32,
    gem: u32,
    summon_count: u32,
    max_units: u32,
    next_cost: u32,
}

impl EconomyLedger {
    /// Creates a ledger with the provided opening balances.
    #[must_use]
    pub const fn new(gold: u32, gem: u32, max_units: u32, next_cost: u32) -> Self {
        Self {
            gold,
            gem,
            summon_count: 0,
            max_units,
            next_cost,
        }
    }

    /// Gold held.
    #[must_use]
    pub const fn gold(&self) -> u32 {
        self.gold
    }

    /// Gems held.
    #[must_use]
    pub const fn gem(&self) -> u32 {
        self.gem
    }

    /// Number of successful summons so far.
    #[must_use]
    pub const fn summon_count(&self) -> u32 {
        self.summon_count
    }

    /// Unit cap reported to observers.
    #[must_use]
    pub const fn max_units(&self) -> u32 {
        self.max_units
    }

    /// Gold cost of the next summon.
    #[must_use]
    pub const fn next_cost(&self) -> u32 {
        self.next_cost
    }

    /// Spends gold for a summon, bumps the counter and stores the following cost.
    pub fn pay_for_summon(&mut self, curve: &SummonCostCurve) -> Result<u32, LedgerError> {
        let cost = curve.cost(self.summon_count);
        self.spend_gold(cost)?;
        self.summon_count = self.summon_count.saturating_add(1);
        self.next_cost = curve.cost(self.summon_count);
        Ok(cost)
    }

    /// Removes gold, rejecting the debit when the balance is too small.
    pub fn spend_gold(&mut self, amount: u32) -> Result<(), LedgerError> {
        self.gold = self
            .gold
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientGold {
                required: amount,
                available: self.gold,
            })?;
        Ok(())
    }

    /// Removes gems, rejecting the debit when the balance is too small.
    pub fn spend_gems(&mut self, amount: u32) -> Result<(), LedgerError> {
        self.gem = self
            .gem
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientGems {
                required: amount,
                available: self.gem,
            })?;
        Ok(())
    }

    /// Adds gold.
    pub fn credit_gold(&mut self, amount: u32) {
        self.gold = self.gold.saturating_add(amount);
    }

    /// Adds gems.
    pub fn credit_gems(&mut self, amount: u32) {
        self.gem = self.gem.saturating_add(amount);
    }
}
