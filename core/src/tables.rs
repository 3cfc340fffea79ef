//! Static game data records and the lookup contract that serves them.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

use crate::TowerKind;

/// Target-selection policy configured per tower kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TargetType {
    /// Closest enemy in range.
    #[default]
    Nearest,
    /// Farthest enemy in range.
    Farthest,
    /// Enemy with the least remaining health.
    LowestHp,
    /// Enemy with the most remaining health.
    HighestHp,
    /// Uniformly random enemy in range.
    Random,
}

impl TargetType {
    /// Decodes the numeric table code; unknown codes fall back to `Nearest`.
    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        match code {
            2 => Self::Farthest,
            3 => Self::LowestHp,
            4 => Self::HighestHp,
            5 => Self::Random,
            _ => Self::Nearest,
        }
    }

    /// Numeric table code of the policy.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Nearest => 1,
            Self::Farthest => 2,
            Self::LowestHp => 3,
            Self::HighestHp => 4,
            Self::Random => 5,
        }
    }
}

/// Difficulty track whose wave schedule is played.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum ArenaType {
    /// Entry difficulty.
    #[default]
    Normal,
    /// Second difficulty.
    Hard,
    /// Third difficulty.
    Hell,
    /// Hardest difficulty.
    Demon,
}

/// Combat statistics of a tower kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerStats {
    /// Base damage per attack.
    pub attack: f32,
    /// Time between attacks.
    pub attack_interval: Duration,
    /// Attack radius in world units.
    pub range: f32,
    /// Target-selection policy.
    pub target: TargetType,
    /// Chance of a critical hit, in percent.
    pub crit_rate: f32,
    /// Critical damage multiplier, in percent.
    pub crit_damage: f32,
}

impl TowerStats {
    /// Stats substituted when a tower kind has no table row.
    pub const FALLBACK: TowerStats = TowerStats {
        attack: 50.0,
        attack_interval: Duration::from_secs(1),
        range: 3.0,
        target: TargetType::Nearest,
        crit_rate: 5.0,
        crit_damage: 150.0,
    };
}

/// Statistics of a regular monster or a boss, already scaled for a wave.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyStats {
    /// Starting health.
    pub health: f32,
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Attack value carried for completeness; enemies do not attack units.
    pub attack: f32,
    /// Gold value listed by the table.
    pub gold: u32,
}

/// Immutable description of a single wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WaveRecord {
    /// One-based index of the wave within its arena.
    pub wave_index: u32,
    /// Countdown length of the wave.
    pub duration: Duration,
    /// Monster spawned during a regular wave.
    pub monster_id: u32,
    /// Boss spawned during a boss wave.
    pub boss_id: u32,
    /// Whether the wave ends with a boss check.
    pub is_boss: bool,
}

impl WaveRecord {
    /// Duration substituted when a wave has no table row.
    pub const FALLBACK_DURATION: Duration = Duration::from_secs(30);

    /// Record substituted when a wave has no table row.
    #[must_use]
    pub const fn fallback(wave_index: u32) -> Self {
        Self {
            wave_index,
            duration: Self::FALLBACK_DURATION,
            monster_id: 1,
            boss_id: 0,
            is_boss: false,
        }
    }
}

/// Read-only lookup tables consulted by every subsystem.
///
/// Every lookup is total: absent rows yield documented fallback values so a
/// missing entry never interrupts play.
pub trait DataProvider: fmt::Debug {
    /// Combat stats for a tower kind.
    fn tower_stats(&self, kind: TowerKind) -> TowerStats;

    /// Monster stats scaled for the provided wave.
    fn monster_stats(&self, monster_id: u32, wave_index: u32) -> EnemyStats;

    /// Boss stats for the provided wave.
    fn boss_stats(&self, boss_id: u32, wave_index: u32) -> EnemyStats;

    /// Wave record for an arena and one-based wave index.
    fn wave_record(&self, arena: ArenaType, wave_index: u32) -> WaveRecord;

    /// Raw summon cost after `summon_count` previous summons.
    fn summon_cost(&self, summon_count: u32) -> u32;

    /// Gold each side starts the match with.
    fn starting_gold(&self) -> u32;

    /// Highest wave index defined for an arena; zero when it has no waves.
    fn max_wave_index(&self, arena: ArenaType) -> u32;
}
