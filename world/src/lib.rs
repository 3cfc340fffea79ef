#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative per-side state for Lucky Defense.
//!
//! Each [`Side`] owns one [`SideBoard`]: a [`GridState`] of stacked units, an
//! [`EconomyLedger`], and the [`SummonCostCurve`] resolved from static data.
//! The two boards never share mutable state. Systems mutate a board through
//! the primitives exposed here; adapters read it through [`query`].

mod economy;
mod grid;

use lucky_defense_core::{DataProvider, Side};

pub use economy::{EconomyConfig, EconomyLedger, LedgerError, SummonCostCurve};
pub use grid::{GridError, GridState, Stack};

/// Grid, ledger and cost curve belonging to one side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SideBoard {
    side: Side,
    grid: GridState,
    ledger: EconomyLedger,
    costs: SummonCostCurve,
}

impl SideBoard {
    /// Creates an empty board funded from the provider's starting gold.
    #[must_use]
    pub fn new(side: Side, provider: &dyn DataProvider, config: &EconomyConfig) -> Self {
        let costs = SummonCostCurve::from_provider(provider);
        let ledger = EconomyLedger::new(
            provider.starting_gold(),
            config.starting_gem,
            config.max_units,
            costs.cost(0),
        );
        Self {
            side,
            grid: GridState::new(),
            ledger,
            costs,
        }
    }

    /// Side that owns the board.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Read access to the grid.
    #[must_use]
    pub const fn grid(&self) -> &GridState {
        &self.grid
    }

    /// Mutable access to the grid.
    pub fn grid_mut(&mut self) -> &mut GridState {
        &mut self.grid
    }

    /// Read access to the ledger.
    #[must_use]
    pub const fn ledger(&self) -> &EconomyLedger {
        &self.ledger
    }

    /// Mutable access to the ledger.
    pub fn ledger_mut(&mut self) -> &mut EconomyLedger {
        &mut self.ledger
    }

    /// Cost curve used for this side's summons.
    #[must_use]
    pub const fn costs(&self) -> &SummonCostCurve {
        &self.costs
    }

    /// Gold cost of the next summon.
    #[must_use]
    pub fn next_summon_cost(&self) -> u32 {
        self.costs.cost(self.ledger.summon_count())
    }

    /// Charges the next summon against the ledger.
    pub fn pay_for_summon(&mut self) -> Result<u32, LedgerError> {
        self.ledger.pay_for_summon(&self.costs)
    }
}

/// Both sides' boards plus the economy tuning they share.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct World {
    boards: [SideBoard; 2],
    config: EconomyConfig,
}

impl World {
    /// Creates a world at match start.
    #[must_use]
    pub fn new(provider: &dyn DataProvider, config: EconomyConfig) -> Self {
        Self {
            boards: Side::ALL.map(|side| SideBoard::new(side, provider, &config)),
            config,
        }
    }

    /// Board owned by `side`.
    #[must_use]
    pub fn board(&self, side: Side) -> &SideBoard {
        &self.boards[side.index()]
    }

    /// Mutable board owned by `side`.
    pub fn board_mut(&mut self, side: Side) -> &mut SideBoard {
        &mut self.boards[side.index()]
    }

    /// Economy tuning shared by both sides.
    #[must_use]
    pub const fn config(&self) -> &EconomyConfig {
        &self.config
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use lucky_defense_core::Side;

    use super::{GridState, World};

    /// Gold held by a side.
    #[must_use]
    pub fn gold(world: &World, side: Side) -> u32 {
        world.board(side).ledger().gold()
    }

    /// Gems held by a side.
    #[must_use]
    pub fn gem(world: &World, side: Side) -> u32 {
        world.board(side).ledger().gem()
    }

    /// Units placed on a side's grid.
    #[must_use]
    pub fn unit_count(world: &World, side: Side) -> usize {
        world.board(side).grid().unit_count()
    }

    /// Unit cap reported for a side.
    #[must_use]
    pub fn unit_cap(world: &World, side: Side) -> u32 {
        world.board(side).ledger().max_units()
    }

    /// Gold cost of a side's next summon.
    #[must_use]
    pub fn next_summon_cost(world: &World, side: Side) -> u32 {
        world.board(side).ledger().next_cost()
    }

    /// Read access to a side's grid.
    #[must_use]
    pub fn grid(world: &World, side: Side) -> &GridState {
        world.board(side).grid()
    }

    /// Economy readings for one side, polled by observers.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct EconomySnapshot {
        /// Side the readings belong to.
        pub side: Side,
        /// Gold held.
        pub gold: u32,
        /// Gems held.
        pub gem: u32,
        /// Units placed.
        pub unit_count: usize,
        /// Unit cap reported to observers.
        pub unit_cap: u32,
        /// Gold cost of the next summon.
        pub next_summon_cost: u32,
    }

    /// Captures every economy reading for a side.
    #[must_use]
    pub fn economy(world: &World, side: Side) -> EconomySnapshot {
        EconomySnapshot {
            side,
            gold: gold(world, side),
            gem: gem(world, side),
            unit_count: unit_count(world, side),
            unit_cap: unit_cap(world, side),
            next_summon_cost: next_summon_cost(world, side),
        }
    }
}
