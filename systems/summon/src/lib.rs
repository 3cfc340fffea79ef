#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Gold summons and gem gambles that place new units onto a side's grid.

use lucky_defense_core::{
    GambleError, GambleOutcome, PlacedTower, RandomSource, RarityTier, SummonError, TowerKind,
};
use lucky_defense_world::SideBoard;
use serde::Deserialize;
use tracing::debug;

/// Rarity thresholds for gold summons, in percent. Normal takes the remainder.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SummonTuning {
    /// Chance of rolling a hero-tier unit.
    pub hero_percent: f32,
    /// Chance of rolling a rare-tier unit.
    pub rare_percent: f32,
}

impl Default for SummonTuning {
    fn default() -> Self {
        Self {
            hero_percent: 0.5,
            rare_percent: 1.97,
        }
    }
}

/// Success chance and gem price of gambling for one tier.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct GambleOdds {
    /// Chance that a paid gamble places a unit, in percent.
    pub success_percent: f32,
    /// Gems charged per attempt.
    pub gem_cost: u32,
}

/// Gamble odds for every tier that can be gambled for.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GambleTuning {
    /// Odds for the normal tier.
    pub normal: GambleOdds,
    /// Odds for the rare tier.
    pub rare: GambleOdds,
    /// Odds for the hero tier.
    pub hero: GambleOdds,
}

impl Default for GambleTuning {
    fn default() -> Self {
        Self {
            normal: GambleOdds {
                success_percent: 60.0,
                gem_cost: 1,
            },
            rare: GambleOdds {
                success_percent: 20.0,
                gem_cost: 1,
            },
            hero: GambleOdds {
                success_percent: 10.0,
                gem_cost: 2,
            },
        }
    }
}

impl GambleTuning {
    /// Odds for `tier`, or `None` for tiers that cannot be gambled for.
    #[must_use]
    pub const fn odds(&self, tier: RarityTier) -> Option<GambleOdds> {
        match tier {
            RarityTier::Normal => Some(self.normal),
            RarityTier::Rare => Some(self.rare),
            RarityTier::Hero => Some(self.hero),
            RarityTier::Myth => None,
        }
    }
}

/// Configuration parameters required to construct the summon engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Rarity weights for gold summons.
    pub summon: SummonTuning,
    /// Odds for gem gambles.
    pub gamble: GambleTuning,
}

/// Summon engine shared by both sides.
#[derive(Clone, Copy, Debug, Default)]
pub struct SummonEngine {
    config: Config,
}

impl SummonEngine {
    /// Creates a summon engine using the supplied configuration.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Rolls the rarity tier of a gold summon.
    pub fn roll_tier(&self, rng: &mut dyn RandomSource) -> RarityTier {
        let tuning = self.config.summon;
        let roll = rng.roll_percent();
        if roll < tuning.hero_percent {
            RarityTier::Hero
        } else if roll < tuning.hero_percent + tuning.rare_percent {
            RarityTier::Rare
        } else {
            RarityTier::Normal
        }
    }

    /// Spends gold to place a unit of a randomly rolled kind.
    ///
    /// Nothing changes when the side cannot pay or no slot accepts the
    /// rolled kind.
    pub fn try_summon(
        &self,
        board: &mut SideBoard,
        rng: &mut dyn RandomSource,
    ) -> Result<PlacedTower, SummonError> {
        let required = board.next_summon_cost();
        let available = board.ledger().gold();
        if available < required {
            return Err(SummonError::InsufficientFunds {
                required,
                available,
            });
        }

        let kind = pick_kind(self.roll_tier(rng), rng);
        let slot = board
            .grid()
            .select_slot(kind, None, rng)
            .ok_or(SummonError::NoAvailableSlot)?;
        let stack = board
            .grid_mut()
            .add_unit(slot, kind)
            .map_err(|_| SummonError::NoAvailableSlot)?;

        let cost = match board.pay_for_summon() {
            Ok(cost) => cost,
            Err(_) => {
                let _ = board.grid_mut().remove_unit(slot);
                return Err(SummonError::InsufficientFunds {
                    required,
                    available,
                });
            }
        };

        debug!(
            side = ?board.side(),
            kind = kind.get(),
            ?slot,
            stack = stack.count(),
            cost,
            "summoned tower"
        );
        Ok(PlacedTower {
            kind,
            slot,
            stack: stack.count(),
        })
    }

    /// Gem price of gambling for `tier`.
    #[must_use]
    pub const fn gamble_cost(&self, tier: RarityTier) -> Option<u32> {
        match self.config.gamble.odds(tier) {
            Some(odds) => Some(odds.gem_cost),
            None => None,
        }
    }

    /// Spends gems on a chance to place a unit of `tier`.
    ///
    /// Gems are kept by the ledger whatever the roll produces; only an
    /// unaffordable or unsupported gamble leaves the side untouched.
    pub fn try_gamble(
        &self,
        board: &mut SideBoard,
        tier: RarityTier,
        rng: &mut dyn RandomSource,
    ) -> Result<GambleOutcome, GambleError> {
        let odds = self
            .config
            .gamble
            .odds(tier)
            .ok_or(GambleError::UnsupportedTier(tier))?;
        let available = board.ledger().gem();
        board
            .ledger_mut()
            .spend_gems(odds.gem_cost)
            .map_err(|_| GambleError::InsufficientGems {
                required: odds.gem_cost,
                available,
            })?;

        let outcome = if rng.roll_percent() >= odds.success_percent {
            GambleOutcome::Missed
        } else {
            let kind = pick_kind(tier, rng);
            match board.grid().select_slot(kind, None, rng) {
                None => GambleOutcome::NoAvailableSlot,
                Some(slot) => match board.grid_mut().add_unit(slot, kind) {
                    Ok(stack) => GambleOutcome::Placed(PlacedTower {
                        kind,
                        slot,
                        stack: stack.count(),
                    }),
                    Err(_) => GambleOutcome::NoAvailableSlot,
                },
            }
        };

        debug!(side = ?board.side(), ?tier, gems = odds.gem_cost, ?outcome, "gamble resolved");
        Ok(outcome)
    }
}

fn pick_kind(tier: RarityTier, rng: &mut dyn RandomSource) -> TowerKind {
    let kinds = tier.kinds();
    kinds[rng.pick_index(kinds.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use lucky_defense_core::{ScriptedSource, Side, SlotCoord};
    use lucky_defense_data::StaticTables;
    use lucky_defense_world::EconomyConfig;

    fn board_with(gold_cost_table: &StaticTables, gems: u32) -> SideBoard {
        let config = EconomyConfig {
            starting_gem: gems,
            ..EconomyConfig::default()
        };
        SideBoard::new(Side::Player, gold_cost_table, &config)
    }

    fn kind(id: u8) -> TowerKind {
        TowerKind::new(id).expect("valid tower kind")
    }

    #[test]
    fn rarity_thresholds_split_the_roll_range() {
        let engine = SummonEngine::default();
        let mut rng = ScriptedSource::new().with_percents([0.0, 0.49, 0.5, 2.46, 2.5, 99.9]);
        let tiers: Vec<_> = (0..6).map(|_| engine.roll_tier(&mut rng)).collect();
        assert_eq!(
            tiers,
            vec![
                RarityTier::Hero,
                RarityTier::Hero,
                RarityTier::Rare,
                RarityTier::Rare,
                RarityTier::Normal,
                RarityTier::Normal,
            ]
        );
    }

    #[test]
    fn summon_spends_gold_and_places_a_unit() {
        let tables = StaticTables::empty();
        let mut board = board_with(&tables, 0);
        let engine = SummonEngine::default();
        let mut rng = ScriptedSource::new()
            .with_percents([50.0])
            .with_picks([1, 4]);

        let placed = engine.try_summon(&mut board, &mut rng).expect("summon succeeds");

        assert_eq!(placed.kind, kind(2));
        assert_eq!(placed.slot, SlotCoord::new(0, 4));
        assert_eq!(placed.stack, 1);
        assert_eq!(board.ledger().gold(), 90);
        assert_eq!(board.ledger().summon_count(), 1);
        assert_eq!(board.ledger().next_cost(), 20);
    }

    #[test]
    fn unaffordable_summon_changes_nothing() {
        let tables = StaticTables::empty();
        let mut board = board_with(&tables, 0);
        board.ledger_mut().spend_gold(95).expect("enough gold");
        let before = board.clone();
        let engine = SummonEngine::default();

        let result = engine.try_summon(&mut board, &mut ScriptedSource::new());

        assert_eq!(
            result,
            Err(SummonError::InsufficientFunds {
                required: 10,
                available: 5,
            })
        );
        assert_eq!(board, before);
    }

    #[test]
    fn summon_into_a_full_grid_is_not_charged() {
        let tables = StaticTables::empty();
        let mut board = board_with(&tables, 0);
        for slot in SlotCoord::all() {
            let _ = board.grid_mut().add_unit(slot, kind(7)).expect("empty slot");
        }
        let before = board.clone();

        let result = SummonEngine::default().try_summon(&mut board, &mut ScriptedSource::new());

        assert_eq!(result, Err(SummonError::NoAvailableSlot));
        assert_eq!(board, before);
    }

    #[test]
    fn summon_stacks_onto_an_existing_matching_slot() {
        let tables = StaticTables::empty();
        let mut board = board_with(&tables, 0);
        let existing = SlotCoord::new(2, 5);
        let _ = board.grid_mut().add_unit(existing, kind(1)).expect("empty slot");
        let mut rng = ScriptedSource::new().with_percents([80.0]).with_picks([0, 0]);

        let placed = SummonEngine::default()
            .try_summon(&mut board, &mut rng)
            .expect("summon succeeds");

        assert_eq!(placed.slot, existing);
        assert_eq!(placed.stack, 2);
    }

    #[test]
    fn gamble_spends_gems_even_when_it_misses() {
        let tables = StaticTables::empty();
        let mut board = board_with(&tables, 3);
        let mut rng = ScriptedSource::new().with_percents([75.0]);

        let outcome = SummonEngine::default()
            .try_gamble(&mut board, RarityTier::Normal, &mut rng)
            .expect("gamble is affordable");

        assert_eq!(outcome, GambleOutcome::Missed);
        assert_eq!(board.ledger().gem(), 2);
        assert_eq!(board.grid().unit_count(), 0);
        assert_eq!(board.ledger().gold(), 100);
    }

    #[test]
    fn successful_gamble_places_a_unit_of_the_requested_tier() {
        let tables = StaticTables::empty();
        let mut board = board_with(&tables, 2);
        let mut rng = ScriptedSource::new().with_percents([5.0]).with_picks([1, 0]);

        let outcome = SummonEngine::default()
            .try_gamble(&mut board, RarityTier::Hero, &mut rng)
            .expect("gamble is affordable");

        let placed = outcome.placement().expect("gamble placed a unit");
        assert_eq!(placed.kind, kind(6));
        assert_eq!(placed.slot, SlotCoord::new(0, 0));
        assert_eq!(board.ledger().gem(), 0);
        assert_eq!(board.ledger().summon_count(), 0);
    }

    #[test]
    fn unaffordable_or_myth_gambles_are_rejected_without_charge() {
        let tables = StaticTables::empty();
        let mut board = board_with(&tables, 1);
        let engine = SummonEngine::default();

        assert_eq!(
            engine.try_gamble(&mut board, RarityTier::Hero, &mut ScriptedSource::new()),
            Err(GambleError::InsufficientGems {
                required: 2,
                available: 1,
            })
        );
        assert_eq!(
            engine.try_gamble(&mut board, RarityTier::Myth, &mut ScriptedSource::new()),
            Err(GambleError::UnsupportedTier(RarityTier::Myth))
        );
        assert_eq!(board.ledger().gem(), 1);
    }

    #[test]
    fn winning_gamble_on_a_full_grid_keeps_the_gems() {
        let tables = StaticTables::empty();
        let mut board = board_with(&tables, 1);
        for slot in SlotCoord::all() {
            let _ = board.grid_mut().add_unit(slot, kind(8)).expect("empty slot");
        }
        let mut rng = ScriptedSource::new().with_percents([1.0]);

        let outcome = SummonEngine::default()
            .try_gamble(&mut board, RarityTier::Rare, &mut rng)
            .expect("gamble is affordable");

        assert_eq!(outcome, GambleOutcome::NoAvailableSlot);
        assert_eq!(board.ledger().gem(), 0);
    }
}
