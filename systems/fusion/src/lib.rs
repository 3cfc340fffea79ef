#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Stack-merge and myth-combination rules, plus sales and relocation.
//!
//! Every operation either applies completely or leaves the board untouched:
//! destinations are resolved before any unit is consumed.

use lucky_defense_core::{
    FusionError, MythCombo, PlacedTower, RandomSource, RarityTier, RelocateError, SlotCoord,
    SlotError, TowerKind,
};
use lucky_defense_world::{GridError, GridState, SideBoard};
use serde::Deserialize;
use tracing::debug;

/// Configuration parameters required to construct the fusion engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Gold credited per unit sold.
    pub sell_refund: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self { sell_refund: 10 }
    }
}

/// Receipt of a single-unit sale.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SoldUnit {
    /// Kind of the sold unit.
    pub kind: TowerKind,
    /// Units left in the slot.
    pub remaining: u8,
    /// Gold credited.
    pub refund: u32,
}

/// Fusion engine shared by both sides.
#[derive(Clone, Copy, Debug, Default)]
pub struct FusionEngine {
    config: Config,
}

impl FusionEngine {
    /// Creates a fusion engine using the supplied configuration.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    /// Consumes a full non-myth stack and places one unit of a random kind
    /// from the next tier.
    ///
    /// The consumed slot is not a candidate destination; when no other slot
    /// accepts the new unit the stack stays in place.
    pub fn try_upgrade_fusion(
        &self,
        board: &mut SideBoard,
        slot: SlotCoord,
        rng: &mut dyn RandomSource,
    ) -> Result<PlacedTower, FusionError> {
        if !slot.is_valid() {
            return Err(FusionError::InvalidSlotIndex);
        }
        let stack = board
            .grid()
            .stack(slot)
            .filter(|stack| stack.is_full())
            .ok_or(FusionError::InvalidFusionPreconditions)?;
        let next_tier = stack
            .kind()
            .tier()
            .next()
            .ok_or(FusionError::InvalidFusionPreconditions)?;

        let kinds = next_tier.kinds();
        let kind = kinds[rng.pick_index(kinds.len())];
        let destination = board
            .grid()
            .select_slot(kind, Some(slot), rng)
            .ok_or(FusionError::NoAvailableSlot)?;

        let grid = board.grid_mut();
        let _ = grid.take(slot).map_err(fusion_error)?;
        let placed = grid.add_unit(destination, kind).map_err(fusion_error)?;

        debug!(
            side = ?board.side(),
            consumed = stack.kind().get(),
            ?slot,
            kind = kind.get(),
            ?destination,
            "upgrade fusion"
        );
        Ok(PlacedTower {
            kind,
            slot: destination,
            stack: placed.count(),
        })
    }

    /// Consumes one unit of each ingredient of the recipe identified by
    /// `combo_id` and places its myth product in the first empty slot.
    pub fn try_myth_fusion(
        &self,
        board: &mut SideBoard,
        combo_id: u8,
    ) -> Result<PlacedTower, FusionError> {
        let combo = MythCombo::from_id(combo_id).ok_or(FusionError::InvalidFusionPreconditions)?;
        let sources =
            myth_sources(board.grid(), combo).ok_or(FusionError::InvalidFusionPreconditions)?;
        let destination = board
            .grid()
            .first_empty()
            .ok_or(FusionError::NoAvailableSlot)?;

        let grid = board.grid_mut();
        for source in sources {
            let _ = grid.remove_unit(source).map_err(fusion_error)?;
        }
        let placed = grid
            .add_unit(destination, combo.product())
            .map_err(fusion_error)?;

        debug!(side = ?board.side(), combo = combo.id(), ?destination, "myth fusion");
        Ok(PlacedTower {
            kind: combo.product(),
            slot: destination,
            stack: placed.count(),
        })
    }

    /// Sells one unit from the slot for the configured refund.
    pub fn sell(&self, board: &mut SideBoard, slot: SlotCoord) -> Result<SoldUnit, SlotError> {
        let before = board.grid_mut().remove_unit(slot).map_err(slot_error)?;
        let refund = self.config.sell_refund;
        board.ledger_mut().credit_gold(refund);

        debug!(side = ?board.side(), ?slot, kind = before.kind().get(), refund, "sold unit");
        Ok(SoldUnit {
            kind: before.kind(),
            remaining: before.count() - 1,
            refund,
        })
    }

    /// Moves the stack at `from` into `to`, swapping with any stack already
    /// there. Returns whether a swap happened.
    pub fn relocate(
        &self,
        board: &mut SideBoard,
        from: SlotCoord,
        to: SlotCoord,
    ) -> Result<bool, RelocateError> {
        if !from.is_valid() || !to.is_valid() {
            return Err(RelocateError::InvalidSlotIndex);
        }
        if from == to {
            return Err(RelocateError::SameSlot);
        }
        if board.grid().stack(from).is_none() {
            return Err(RelocateError::EmptySource);
        }

        let swapped = board.grid().stack(to).is_some();
        board
            .grid_mut()
            .swap(from, to)
            .map_err(|_| RelocateError::InvalidSlotIndex)?;
        Ok(swapped)
    }
}

/// Source slots for a recipe: the first slot in row-major order holding each
/// ingredient. `None` when any ingredient is missing.
#[must_use]
pub fn myth_sources(grid: &GridState, combo: MythCombo) -> Option<[SlotCoord; 3]> {
    let [first, second, third] = combo.ingredients();
    Some([
        grid.first_holding(first)?,
        grid.first_holding(second)?,
        grid.first_holding(third)?,
    ])
}

/// Whether a recipe could run on the grid right now.
#[must_use]
pub fn myth_fusion_ready(grid: &GridState, combo: MythCombo) -> bool {
    myth_sources(grid, combo).is_some() && grid.first_empty().is_some()
}

/// First full stack of the lowest kind id in `kinds` that can be upgraded.
#[must_use]
pub fn first_upgradable(
    grid: &GridState,
    kinds: impl IntoIterator<Item = TowerKind>,
) -> Option<SlotCoord> {
    kinds
        .into_iter()
        .filter(|kind| kind.tier() != RarityTier::Myth)
        .find_map(|kind| grid.first_full(kind))
}

fn fusion_error(error: GridError) -> FusionError {
    match error {
        GridError::InvalidSlotIndex => FusionError::InvalidSlotIndex,
        GridError::EmptySlot | GridError::KindMismatch => FusionError::InvalidFusionPreconditions,
        GridError::StackFull => FusionError::NoAvailableSlot,
    }
}

fn slot_error(error: GridError) -> SlotError {
    match error {
        GridError::InvalidSlotIndex => SlotError::InvalidSlotIndex,
        GridError::EmptySlot | GridError::KindMismatch | GridError::StackFull => {
            SlotError::EmptySlot
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lucky_defense_core::{ScriptedSource, Side};
    use lucky_defense_data::StaticTables;
    use lucky_defense_world::EconomyConfig;

    fn board() -> SideBoard {
        SideBoard::new(Side::Player, &StaticTables::empty(), &EconomyConfig::default())
    }

    fn kind(id: u8) -> TowerKind {
        TowerKind::new(id).expect("valid tower kind")
    }

    fn put(board: &mut SideBoard, slot: SlotCoord, id: u8, count: u8) {
        for _ in 0..count {
            let _ = board.grid_mut().add_unit(slot, kind(id)).expect("slot accepts unit");
        }
    }

    #[test]
    fn upgrade_turns_a_full_normal_stack_into_one_rare_unit() {
        let mut board = board();
        let source = SlotCoord::new(0, 0);
        put(&mut board, source, 1, 3);
        let mut rng = ScriptedSource::new().with_picks([1, 0]);

        let placed = FusionEngine::default()
            .try_upgrade_fusion(&mut board, source, &mut rng)
            .expect("fusion succeeds");

        assert_eq!(placed.kind, kind(4));
        assert_eq!(placed.slot, SlotCoord::new(0, 1));
        assert_eq!(placed.stack, 1);
        assert_eq!(board.grid().stack(source), None);
        assert_eq!(board.grid().unit_count(), 1);
    }

    #[test]
    fn upgrade_rolls_back_when_no_destination_exists() {
        let mut board = board();
        let source = SlotCoord::new(1, 2);
        for slot in SlotCoord::all() {
            if slot == source {
                put(&mut board, slot, 1, 3);
            } else {
                put(&mut board, slot, 2, 3);
            }
        }
        let before = board.clone();

        let result = FusionEngine::default().try_upgrade_fusion(
            &mut board,
            source,
            &mut ScriptedSource::new(),
        );

        assert_eq!(result, Err(FusionError::NoAvailableSlot));
        assert_eq!(board, before);
        assert_eq!(board.grid().stack(source).map(|stack| stack.count()), Some(3));
    }

    #[test]
    fn hero_stacks_upgrade_into_myth_units() {
        let mut board = board();
        let source = SlotCoord::new(2, 5);
        put(&mut board, source, 6, 3);
        let mut rng = ScriptedSource::new().with_picks([0, 0]);

        let placed = FusionEngine::default()
            .try_upgrade_fusion(&mut board, source, &mut rng)
            .expect("fusion succeeds");

        assert_eq!(placed.kind.tier(), RarityTier::Myth);
    }

    #[test]
    fn upgrade_rejects_partial_myth_and_invalid_slots() {
        let mut board = board();
        put(&mut board, SlotCoord::new(0, 0), 3, 2);
        put(&mut board, SlotCoord::new(0, 1), 7, 1);
        let engine = FusionEngine::default();
        let mut rng = ScriptedSource::new();

        assert_eq!(
            engine.try_upgrade_fusion(&mut board, SlotCoord::new(0, 0), &mut rng),
            Err(FusionError::InvalidFusionPreconditions)
        );
        assert_eq!(
            engine.try_upgrade_fusion(&mut board, SlotCoord::new(0, 1), &mut rng),
            Err(FusionError::InvalidFusionPreconditions)
        );
        assert_eq!(
            engine.try_upgrade_fusion(&mut board, SlotCoord::new(0, 2), &mut rng),
            Err(FusionError::InvalidFusionPreconditions)
        );
        assert_eq!(
            engine.try_upgrade_fusion(&mut board, SlotCoord::new(4, 0), &mut rng),
            Err(FusionError::InvalidSlotIndex)
        );
    }

    #[test]
    fn myth_fusion_consumes_one_unit_of_each_ingredient() {
        let mut board = board();
        put(&mut board, SlotCoord::new(0, 0), 1, 2);
        put(&mut board, SlotCoord::new(0, 1), 3, 1);
        put(&mut board, SlotCoord::new(0, 3), 5, 3);

        let placed = FusionEngine::default()
            .try_myth_fusion(&mut board, 1)
            .expect("fusion succeeds");

        assert_eq!(placed.kind, kind(7));
        assert_eq!(placed.slot, SlotCoord::new(0, 2));
        assert_eq!(placed.stack, 1);
        let grid = board.grid();
        assert_eq!(grid.stack(SlotCoord::new(0, 0)).map(|s| s.count()), Some(1));
        assert_eq!(grid.stack(SlotCoord::new(0, 1)), None);
        assert_eq!(grid.stack(SlotCoord::new(0, 3)).map(|s| s.count()), Some(2));
    }

    #[test]
    fn myth_fusion_without_an_empty_slot_consumes_nothing() {
        let mut board = board();
        put(&mut board, SlotCoord::new(0, 0), 2, 1);
        put(&mut board, SlotCoord::new(0, 1), 4, 1);
        put(&mut board, SlotCoord::new(0, 2), 6, 1);
        for slot in SlotCoord::all().skip(3) {
            put(&mut board, slot, 8, 1);
        }
        let before = board.clone();

        let result = FusionEngine::default().try_myth_fusion(&mut board, 2);

        assert_eq!(result, Err(FusionError::NoAvailableSlot));
        assert_eq!(board, before);
    }

    #[test]
    fn myth_fusion_requires_every_ingredient_and_a_known_combo() {
        let mut board = board();
        put(&mut board, SlotCoord::new(0, 0), 1, 3);
        put(&mut board, SlotCoord::new(0, 1), 3, 3);
        let engine = FusionEngine::default();

        assert_eq!(
            engine.try_myth_fusion(&mut board, 1),
            Err(FusionError::InvalidFusionPreconditions)
        );
        assert_eq!(
            engine.try_myth_fusion(&mut board, 3),
            Err(FusionError::InvalidFusionPreconditions)
        );
        assert!(!myth_fusion_ready(board.grid(), MythCombo::First));
    }

    #[test]
    fn selling_decrements_then_clears_and_refunds() {
        let mut board = board();
        let slot = SlotCoord::new(1, 1);
        put(&mut board, slot, 2, 2);
        let engine = FusionEngine::default();

        let first = engine.sell(&mut board, slot).expect("slot occupied");
        assert_eq!(first.remaining, 1);
        assert_eq!(first.refund, 10);
        assert_eq!(board.grid().stack(slot).map(|s| s.count()), Some(1));
        assert_eq!(board.ledger().gold(), 110);

        let second = engine.sell(&mut board, slot).expect("slot occupied");
        assert_eq!(second.remaining, 0);
        assert_eq!(board.grid().stack(slot), None);
        assert_eq!(board.ledger().gold(), 120);

        assert_eq!(engine.sell(&mut board, slot), Err(SlotError::EmptySlot));
        assert_eq!(
            engine.sell(&mut board, SlotCoord::new(0, 9)),
            Err(SlotError::InvalidSlotIndex)
        );
        assert_eq!(board.ledger().gold(), 120);
    }

    #[test]
    fn relocation_moves_or_swaps_stacks() {
        let mut board = board();
        let a = SlotCoord::new(0, 0);
        let b = SlotCoord::new(2, 4);
        let c = SlotCoord::new(1, 5);
        put(&mut board, a, 1, 2);
        put(&mut board, b, 3, 1);
        let engine = FusionEngine::default();

        assert_eq!(engine.relocate(&mut board, a, c), Ok(false));
        assert_eq!(board.grid().stack(c).map(|s| s.kind()), Some(kind(1)));
        assert_eq!(board.grid().stack(a), None);

        assert_eq!(engine.relocate(&mut board, c, b), Ok(true));
        assert_eq!(board.grid().stack(b).map(|s| s.kind()), Some(kind(1)));
        assert_eq!(board.grid().stack(c).map(|s| s.kind()), Some(kind(3)));

        assert_eq!(engine.relocate(&mut board, a, b), Err(RelocateError::EmptySource));
        assert_eq!(engine.relocate(&mut board, b, b), Err(RelocateError::SameSlot));
        assert_eq!(
            engine.relocate(&mut board, b, SlotCoord::new(3, 3)),
            Err(RelocateError::InvalidSlotIndex)
        );
    }

    #[test]
    fn first_upgradable_scans_kinds_in_the_given_order() {
        let mut board = board();
        put(&mut board, SlotCoord::new(0, 0), 4, 3);
        put(&mut board, SlotCoord::new(2, 0), 2, 3);
        put(&mut board, SlotCoord::new(1, 0), 1, 2);

        let found = first_upgradable(board.grid(), (1..=4).filter_map(TowerKind::new));

        assert_eq!(found, Some(SlotCoord::new(2, 0)));
    }
}
