//! One side's player-facing operations, bound to the engines of a match.

use lucky_defense_core::{
    DataProvider, Event, FusionError, GambleError, GambleOutcome, MythCombo, PlacedTower,
    RandomSource, RarityTier, RelocateError, Side, SlotCoord, SlotError, SummonError,
};
use lucky_defense_system_ai::SideOperations;
use lucky_defense_system_fusion::{FusionEngine, SoldUnit};
use lucky_defense_system_summon::SummonEngine;
use lucky_defense_system_tower_combat::CombatResolver;
use lucky_defense_world::{GridState, SideBoard};

/// Borrowed view of everything one operation may touch.
///
/// Each operation reports its outcome as an [`Event`] and keeps the combat
/// roster in step with the grid.
pub(crate) struct SideContext<'a> {
    pub(crate) board: &'a mut SideBoard,
    pub(crate) data: &'a dyn DataProvider,
    pub(crate) summon: &'a SummonEngine,
    pub(crate) fusion: &'a FusionEngine,
    pub(crate) combat: &'a mut CombatResolver,
    pub(crate) rng: &'a mut dyn RandomSource,
    pub(crate) out: &'a mut Vec<Event>,
}

impl SideContext<'_> {
    fn sync(&mut self) {
        self.combat.sync(self.board.side(), self.board.grid(), self.data);
    }

    pub(crate) fn summon(&mut self) -> Result<PlacedTower, SummonError> {
        let side = self.board.side();
        let cost = self.board.next_summon_cost();
        let result = self.summon.try_summon(self.board, self.rng);
        match result {
            Ok(placement) => {
                self.sync();
                self.out.push(Event::TowerSummoned {
                    side,
                    placement,
                    cost,
                });
            }
            Err(reason) => self.out.push(Event::SummonRejected { side, reason }),
        }
        result
    }

    pub(crate) fn gamble(&mut self, tier: RarityTier) -> Result<GambleOutcome, GambleError> {
        let side = self.board.side();
        let result = self.summon.try_gamble(self.board, tier, self.rng);
        match result {
            Ok(outcome) => {
                if outcome.placement().is_some() {
                    self.sync();
                }
                self.out.push(Event::GambleResolved {
                    side,
                    tier,
                    gem_cost: self.summon.gamble_cost(tier).unwrap_or_default(),
                    outcome,
                });
            }
            Err(reason) => self.out.push(Event::GambleRejected { side, tier, reason }),
        }
        result
    }

    pub(crate) fn upgrade_fusion(&mut self, slot: SlotCoord) -> Result<PlacedTower, FusionError> {
        let side = self.board.side();
        let consumed = self.board.grid().stack(slot).map(|stack| stack.kind());
        let result = self.fusion.try_upgrade_fusion(self.board, slot, self.rng);
        match (result, consumed) {
            (Ok(placement), Some(consumed)) => {
                self.sync();
                self.out.push(Event::UpgradeFused {
                    side,
                    source: slot,
                    consumed,
                    placement,
                });
            }
            (Ok(_), None) => self.sync(),
            (Err(reason), _) => self.out.push(Event::FusionRejected { side, reason }),
        }
        result
    }

    pub(crate) fn myth_fusion(&mut self, combo: u8) -> Result<PlacedTower, FusionError> {
        let side = self.board.side();
        let result = self.fusion.try_myth_fusion(self.board, combo);
        match (result, MythCombo::from_id(combo)) {
            (Ok(placement), Some(combo)) => {
                self.sync();
                self.out.push(Event::MythFused {
                    side,
                    combo,
                    placement,
                });
            }
            (Ok(_), None) => self.sync(),
            (Err(reason), _) => self.out.push(Event::FusionRejected { side, reason }),
        }
        result
    }

    pub(crate) fn sell(&mut self, slot: SlotCoord) -> Result<SoldUnit, SlotError> {
        let side = self.board.side();
        let result = self.fusion.sell(self.board, slot);
        match result {
            Ok(sold) => {
                self.sync();
                self.out.push(Event::TowerSold {
                    side,
                    slot,
                    kind: sold.kind,
                    remaining: sold.remaining,
                    refund: sold.refund,
                });
            }
            Err(reason) => self.out.push(Event::SlotRequestRejected { side, slot, reason }),
        }
        result
    }

    pub(crate) fn relocate(
        &mut self,
        from: SlotCoord,
        to: SlotCoord,
    ) -> Result<bool, RelocateError> {
        let side = self.board.side();
        let result = self.fusion.relocate(self.board, from, to);
        match result {
            Ok(swapped) => self.out.push(Event::StackRelocated {
                side,
                from,
                to,
                swapped,
            }),
            Err(reason) => self.out.push(Event::RelocateRejected { side, reason }),
        }
        result
    }

    pub(crate) fn upgrade_units(&mut self, slot: SlotCoord) -> Result<usize, SlotError> {
        let side = self.board.side();
        let result = if slot.is_valid() {
            self.board
                .grid()
                .stack(slot)
                .map(|stack| self.combat.upgrade_stack(side, stack.id()))
                .ok_or(SlotError::EmptySlot)
        } else {
            Err(SlotError::InvalidSlotIndex)
        };
        match result {
            Ok(units) => self.out.push(Event::UnitsUpgraded { side, slot, units }),
            Err(reason) => self.out.push(Event::SlotRequestRejected { side, slot, reason }),
        }
        result
    }
}

impl SideOperations for SideContext<'_> {
    fn side(&self) -> Side {
        self.board.side()
    }

    fn grid(&self) -> &GridState {
        self.board.grid()
    }

    fn rng(&mut self) -> &mut dyn RandomSource {
        &mut *self.rng
    }

    fn summon(&mut self) -> Result<PlacedTower, SummonError> {
        SideContext::summon(self)
    }

    fn gamble(&mut self, tier: RarityTier) -> Result<GambleOutcome, GambleError> {
        SideContext::gamble(self, tier)
    }

    fn upgrade_fusion(&mut self, slot: SlotCoord) -> Result<PlacedTower, FusionError> {
        SideContext::upgrade_fusion(self, slot)
    }

    fn myth_fusion(&mut self, combo: u8) -> Result<PlacedTower, FusionError> {
        SideContext::myth_fusion(self, combo)
    }
}
