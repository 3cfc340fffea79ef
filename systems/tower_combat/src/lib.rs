#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Combat resolution for the units standing on both sides' grids.
//!
//! The resolver keeps one roster per side that mirrors the grid: every stack
//! owns as many combat units as its count. Units are created with the tower
//! table stats of their kind and keep their own cooldown and upgrades for as
//! long as their stack lives, including across relocations.

use std::{collections::BTreeMap, time::Duration};

use lucky_defense_core::{
    Battlefield, DataProvider, EnemyContact, EnemyId, GridLayout, RandomSource, Side, StackId,
    TowerKind, TowerStats,
};
use lucky_defense_system_tower_targeting::TowerTargeting;
use lucky_defense_world::GridState;
use tracing::trace;

const UPGRADE_ATTACK_FACTOR: f32 = 1.2;
const UPGRADE_INTERVAL_FACTOR: f32 = 0.9;
const UPGRADE_CRIT_RATE_BONUS: f32 = 2.0;

/// A single combat entity backing one unit of a stack.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CombatUnit {
    stats: TowerStats,
    cooldown: Duration,
    upgrades: u32,
}

impl CombatUnit {
    /// Creates a unit ready to attack with the provided stats.
    #[must_use]
    pub const fn new(stats: TowerStats) -> Self {
        Self {
            stats,
            cooldown: Duration::ZERO,
            upgrades: 0,
        }
    }

    /// Current stats including upgrades.
    #[must_use]
    pub const fn stats(&self) -> &TowerStats {
        &self.stats
    }

    /// Time left before the unit may attack again.
    #[must_use]
    pub const fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Number of upgrades applied.
    #[must_use]
    pub const fn upgrades(&self) -> u32 {
        self.upgrades
    }

    /// Multiplies damage by 1.2, shortens the interval by 10% and adds two
    /// points of crit rate. Repeated upgrades compound without a cap.
    pub fn upgrade(&mut self) {
        self.stats.attack *= UPGRADE_ATTACK_FACTOR;
        self.stats.attack_interval = self.stats.attack_interval.mul_f32(UPGRADE_INTERVAL_FACTOR);
        self.stats.crit_rate += UPGRADE_CRIT_RATE_BONUS;
        self.upgrades = self.upgrades.saturating_add(1);
    }
}

/// Damage dealt by one attack.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DamageRoll {
    /// Damage applied to the target.
    pub amount: f32,
    /// Whether the crit roll hit.
    pub critical: bool,
}

impl DamageRoll {
    /// Integer damage shown to observers.
    #[must_use]
    pub fn display_amount(&self) -> u32 {
        self.amount.max(0.0).round() as u32
    }
}

/// Rolls the damage of one attack: base attack, multiplied by
/// `crit_damage / 100` when a roll under `crit_rate` percent hits.
pub fn roll_damage(stats: &TowerStats, rng: &mut dyn RandomSource) -> DamageRoll {
    let critical = rng.roll_percent() < stats.crit_rate;
    let amount = if critical {
        stats.attack * stats.crit_damage / 100.0
    } else {
        stats.attack
    };
    DamageRoll { amount, critical }
}

/// Outcome of one resolved attack.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AttackReport {
    /// Side owning the attacking unit.
    pub side: Side,
    /// Stack the attacking unit belongs to.
    pub stack: StackId,
    /// Enemy that was hit.
    pub enemy: EnemyId,
    /// Damage dealt.
    pub damage: DamageRoll,
    /// Whether the hit killed the enemy.
    pub killed: bool,
    /// Whether the enemy was a boss.
    pub boss: bool,
}

#[derive(Clone, Debug, Default)]
struct StackUnits {
    kind: Option<TowerKind>,
    units: Vec<CombatUnit>,
}

#[derive(Clone, Debug, Default)]
struct Roster {
    stacks: BTreeMap<StackId, StackUnits>,
}

/// Combat resolver shared by both sides.
#[derive(Debug, Default)]
pub struct CombatResolver {
    rosters: [Roster; 2],
    targeting: TowerTargeting,
    contacts: Vec<EnemyContact>,
}

impl CombatResolver {
    /// Creates a resolver with empty rosters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconciles a side's roster with its grid.
    ///
    /// Stacks that grew receive fresh units with table stats, stacks that
    /// shrank drop their most recent units, and vanished stacks are removed.
    pub fn sync(&mut self, side: Side, grid: &GridState, data: &dyn DataProvider) {
        let roster = &mut self.rosters[side.index()];
        roster
            .stacks
            .retain(|id, _| grid.stacks().any(|(_, stack)| stack.id() == *id));

        for (_, stack) in grid.stacks() {
            let entry = roster.stacks.entry(stack.id()).or_default();
            if entry.kind != Some(stack.kind()) {
                entry.kind = Some(stack.kind());
                entry.units.clear();
            }
            let wanted = usize::from(stack.count());
            if entry.units.len() > wanted {
                entry.units.truncate(wanted);
            }
            while entry.units.len() < wanted {
                entry.units.push(CombatUnit::new(data.tower_stats(stack.kind())));
            }
        }
    }

    /// Upgrades every unit of a stack; returns how many were upgraded.
    pub fn upgrade_stack(&mut self, side: Side, stack: StackId) -> usize {
        match self.rosters[side.index()].stacks.get_mut(&stack) {
            Some(entry) => {
                entry.units.iter_mut().for_each(CombatUnit::upgrade);
                entry.units.len()
            }
            None => 0,
        }
    }

    /// Units backing a stack.
    #[must_use]
    pub fn units(&self, side: Side, stack: StackId) -> &[CombatUnit] {
        self.rosters[side.index()]
            .stacks
            .get(&stack)
            .map(|entry| entry.units.as_slice())
            .unwrap_or(&[])
    }

    /// Number of combat units fielded by a side.
    #[must_use]
    pub fn unit_count(&self, side: Side) -> usize {
        self.rosters[side.index()]
            .stacks
            .values()
            .map(|entry| entry.units.len())
            .sum()
    }

    /// Advances cooldowns by `dt` and resolves one attack for every ready unit
    /// of `side` that has a target in range.
    ///
    /// Units are processed in row-major slot order. A unit without a target
    /// stays ready.
    #[allow(clippy::too_many_arguments)]
    pub fn tick(
        &mut self,
        side: Side,
        dt: Duration,
        grid: &GridState,
        layout: &GridLayout,
        field: &mut dyn Battlefield,
        rng: &mut dyn RandomSource,
        out: &mut Vec<AttackReport>,
    ) {
        let roster = &mut self.rosters[side.index()];
        for (slot, stack) in grid.stacks() {
            let Some(entry) = roster.stacks.get_mut(&stack.id()) else {
                continue;
            };
            let origin = layout.slot_center(slot);

            for unit in &mut entry.units {
                unit.cooldown = unit.cooldown.saturating_sub(dt);
                if !unit.cooldown.is_zero() {
                    continue;
                }

                self.contacts.clear();
                field.enemies_in_range(origin, unit.stats.range, &mut self.contacts);
                let Some(enemy) =
                    self.targeting
                        .select(unit.stats.target, origin, &self.contacts, rng)
                else {
                    continue;
                };

                let damage = roll_damage(&unit.stats, rng);
                let Some(report) = field.apply_damage(enemy, damage.amount) else {
                    continue;
                };
                unit.cooldown = unit.stats.attack_interval;

                trace!(
                    ?side,
                    stack = stack.id().get(),
                    enemy = enemy.get(),
                    damage = damage.display_amount(),
                    critical = damage.critical,
                    "unit attacked"
                );
                out.push(AttackReport {
                    side,
                    stack: stack.id(),
                    enemy,
                    damage,
                    killed: report.killed,
                    boss: report.boss,
                });
            }
        }
    }
}
