#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Autonomous opponent that spends one side's economy on a timer.
//!
//! The policy never touches the board directly. It drives the same
//! operations a human player has through [`SideOperations`], and treats every
//! rejection as an expected no-op.

use std::time::Duration;

use lucky_defense_core::{
    FusionError, GambleError, GambleOutcome, MythCombo, PlacedTower, RandomSource, RarityTier,
    Side, SlotCoord, SummonError, TowerKind,
};
use lucky_defense_system_fusion::{first_upgradable, myth_fusion_ready};
use lucky_defense_world::GridState;
use serde::Deserialize;
use tracing::debug;

/// Shortest wait between two activations.
const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Kind ids scanned, in order, for a full stack to upgrade.
const UPGRADE_SCAN: [u8; 4] = [1, 2, 3, 4];

/// Player-facing operations of one side, as seen by the policy.
pub trait SideOperations {
    /// Side the operations act on.
    fn side(&self) -> Side;

    /// Current grid of the side.
    fn grid(&self) -> &GridState;

    /// Random source shared with the operations themselves.
    fn rng(&mut self) -> &mut dyn RandomSource;

    /// Pays gold for a summon.
    fn summon(&mut self) -> Result<PlacedTower, SummonError>;

    /// Pays gems for a gamble on `tier`.
    fn gamble(&mut self, tier: RarityTier) -> Result<GambleOutcome, GambleError>;

    /// Upgrades the full stack in `slot`.
    fn upgrade_fusion(&mut self, slot: SlotCoord) -> Result<PlacedTower, FusionError>;

    /// Runs the myth recipe with the numeric identifier `combo`.
    fn myth_fusion(&mut self, combo: u8) -> Result<PlacedTower, FusionError>;
}

/// Fixed pacing presets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
pub enum AiStrategy {
    /// Acts every two seconds.
    Aggressive,
    /// Acts every three seconds.
    Balanced,
    /// Acts every four seconds.
    Defensive,
    /// Acts every five seconds.
    Economic,
}

impl AiStrategy {
    /// Wait between two activations.
    #[must_use]
    pub const fn interval(self) -> Duration {
        match self {
            Self::Aggressive => Duration::from_secs(2),
            Self::Balanced => Duration::from_secs(3),
            Self::Defensive => Duration::from_secs(4),
            Self::Economic => Duration::from_secs(5),
        }
    }
}

/// Pacing of the policy.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Lower bound of the randomized wait, in seconds.
    pub min_interval: f32,
    /// Upper bound of the randomized wait, in seconds.
    pub max_interval: f32,
    /// Fixed preset that replaces the randomized wait when set.
    pub strategy: Option<AiStrategy>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            min_interval: 1.0,
            max_interval: 3.0,
            strategy: None,
        }
    }
}

/// What a single activation managed to do.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Activation {
    /// Tier the gamble targeted.
    pub gamble_tier: RarityTier,
    /// Result of the gamble.
    pub gamble: Result<GambleOutcome, GambleError>,
    /// Result of the summon.
    pub summon: Result<PlacedTower, SummonError>,
    /// Result of the fusion attempt, if any recipe or stack was eligible.
    pub fusion: Option<Result<PlacedTower, FusionError>>,
}

/// Timer-driven policy for one side.
#[derive(Debug)]
pub struct AiPolicy {
    side: Side,
    config: AiConfig,
    until_next: Option<Duration>,
}

impl AiPolicy {
    /// Creates a policy for `side`; the first wait is drawn on the first tick.
    #[must_use]
    pub const fn new(side: Side, config: AiConfig) -> Self {
        Self {
            side,
            config,
            until_next: None,
        }
    }

    /// Side the policy plays.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Time left until the next activation, once drawn.
    #[must_use]
    pub const fn until_next(&self) -> Option<Duration> {
        self.until_next
    }

    /// Advances the timer by `dt`, running every activation that falls due.
    pub fn tick(
        &mut self,
        dt: Duration,
        ops: &mut dyn SideOperations,
        out: &mut Vec<Activation>,
    ) {
        debug_assert_eq!(ops.side(), self.side, "operations bound to another side");

        let mut budget = dt;
        loop {
            let wait = match self.until_next {
                Some(wait) => wait,
                None => self.draw_interval(ops.rng()),
            };
            if budget < wait {
                self.until_next = Some(wait - budget);
                return;
            }

            budget -= wait;
            self.until_next = None;
            out.push(self.activate(ops));
        }
    }

    fn draw_interval(&self, rng: &mut dyn RandomSource) -> Duration {
        let wait = match self.config.strategy {
            Some(strategy) => strategy.interval(),
            None => {
                let seconds = rng.range_f32(self.config.min_interval, self.config.max_interval);
                Duration::try_from_secs_f32(seconds).unwrap_or(MIN_INTERVAL)
            }
        };
        wait.max(MIN_INTERVAL)
    }

    /// Gambles, summons, then fuses once: myth recipes first, otherwise the
    /// first full stack of kinds 1 to 4.
    fn activate(&self, ops: &mut dyn SideOperations) -> Activation {
        let gamble_tier = {
            let tiers = RarityTier::GAMBLE_TIERS;
            tiers[ops.rng().pick_index(tiers.len()).min(tiers.len() - 1)]
        };
        let gamble = ops.gamble(gamble_tier);
        let summon = ops.summon();

        let fusion = match next_fusion(ops.grid()) {
            Some(FusionChoice::Myth(combo)) => Some(ops.myth_fusion(combo.id())),
            Some(FusionChoice::Upgrade(slot)) => Some(ops.upgrade_fusion(slot)),
            None => None,
        };

        let activation = Activation {
            gamble_tier,
            gamble,
            summon,
            fusion,
        };
        debug!(side = ?self.side, ?activation, "ai activation");
        activation
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FusionChoice {
    Myth(MythCombo),
    Upgrade(SlotCoord),
}

fn next_fusion(grid: &GridState) -> Option<FusionChoice> {
    if let Some(combo) = MythCombo::ALL
        .into_iter()
        .find(|combo| myth_fusion_ready(grid, *combo))
    {
        return Some(FusionChoice::Myth(combo));
    }

    first_upgradable(grid, UPGRADE_SCAN.into_iter().filter_map(TowerKind::new))
        .map(FusionChoice::Upgrade)
}
