#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Lucky Defense engine.
//!
//! This crate defines the vocabulary that connects adapters, the
//! authoritative per-side boards, and the pure systems that mutate them.
//! Adapters submit [`Command`] values describing the operations a player (or
//! the AI policy) wants to perform, the simulation executes them against the
//! owning side's grid and ledger, and then broadcasts [`Event`] values so
//! observers can react deterministically. Static game data is consumed through
//! the [`DataProvider`] trait and every random decision flows through a single
//! injectable [`RandomSource`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod contracts;
mod random;
mod tables;

pub use contracts::{Battlefield, DamageReport, EnemyContact, EnemySpawner};
#[cfg(any(test, feature = "scripted_rng"))]
pub use random::ScriptedSource;
pub use random::{ChaChaSource, RandomSource};
pub use tables::{ArenaType, DataProvider, EnemyStats, TargetType, TowerStats, WaveRecord};

/// Number of rows contained in every side's grid.
pub const GRID_ROWS: u8 = 3;

/// Number of columns contained in every side's grid.
pub const GRID_COLUMNS: u8 = 6;

/// Total number of addressable slots in a single grid.
pub const SLOT_COUNT: usize = GRID_ROWS as usize * GRID_COLUMNS as usize;

/// Identifies one of the two independent economies competing in a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    /// The human-controlled side.
    Player,
    /// The side driven by the autonomous policy.
    Ai,
}

impl Side {
    /// Both sides in canonical processing order.
    pub const ALL: [Side; 2] = [Side::Player, Side::Ai];

    /// Dense index used to address per-side storage.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Player => 0,
            Self::Ai => 1,
        }
    }

    /// Returns the competing side.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Player => Self::Ai,
            Self::Ai => Self::Player,
        }
    }
}

/// Location of a single grid slot expressed as row and column indices.
///
/// Coordinates are not validated on construction; grid operations reject
/// out-of-range coordinates with an `InvalidSlotIndex` error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotCoord {
    row: u8,
    column: u8,
}

impl SlotCoord {
    /// Creates a new slot coordinate.
    #[must_use]
    pub const fn new(row: u8, column: u8) -> Self {
        Self { row, column }
    }

    /// Zero-based row index of the slot.
    #[must_use]
    pub const fn row(&self) -> u8 {
        self.row
    }

    /// Zero-based column index of the slot.
    #[must_use]
    pub const fn column(&self) -> u8 {
        self.column
    }

    /// Reports whether the coordinate addresses a slot inside the grid.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.row < GRID_ROWS && self.column < GRID_COLUMNS
    }

    /// Row-major index of the slot, or `None` when the coordinate is out of range.
    #[must_use]
    pub const fn index(&self) -> Option<usize> {
        if self.is_valid() {
            Some(self.row as usize * GRID_COLUMNS as usize + self.column as usize)
        } else {
            None
        }
    }

    /// Converts a row-major index back into a coordinate.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < SLOT_COUNT {
            Some(Self::new(
                (index / GRID_COLUMNS as usize) as u8,
                (index % GRID_COLUMNS as usize) as u8,
            ))
        } else {
            None
        }
    }

    /// Iterates over every slot of a grid in row-major order.
    pub fn all() -> impl Iterator<Item = SlotCoord> {
        (0..SLOT_COUNT).filter_map(Self::from_index)
    }
}

/// Tower type identifier. Valid identifiers range from 1 through 8.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerKind(u8);

impl TowerKind {
    /// Smallest valid tower identifier.
    pub const MIN: u8 = 1;
    /// Largest valid tower identifier.
    pub const MAX: u8 = 8;

    /// Creates a tower kind when the identifier lies in the valid range.
    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        if value >= Self::MIN && value <= Self::MAX {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Retrieves the numeric identifier.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }

    /// Rarity tier derived from the identifier range.
    #[must_use]
    pub const fn tier(&self) -> RarityTier {
        RarityTier::of(*self)
    }

    /// Maximum number of units a single slot may stack for this kind.
    #[must_use]
    pub const fn stack_cap(&self) -> u8 {
        self.tier().stack_cap()
    }

    /// Iterates over every valid tower kind in ascending order.
    pub fn all() -> impl Iterator<Item = TowerKind> {
        (Self::MIN..=Self::MAX).map(TowerKind)
    }
}

/// Rarity classification derived from a tower identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RarityTier {
    /// Identifiers 1 and 2.
    Normal,
    /// Identifiers 3 and 4.
    Rare,
    /// Identifiers 5 and 6.
    Hero,
    /// Identifiers 7 and 8; only produced by myth fusion.
    Myth,
}

impl RarityTier {
    /// Tiers that can be targeted by a gem gamble.
    pub const GAMBLE_TIERS: [RarityTier; 3] =
        [RarityTier::Normal, RarityTier::Rare, RarityTier::Hero];

    /// Maps a tower kind onto its tier.
    #[must_use]
    pub const fn of(kind: TowerKind) -> Self {
        match kind.0 {
            1 | 2 => Self::Normal,
            3 | 4 => Self::Rare,
            5 | 6 => Self::Hero,
            _ => Self::Myth,
        }
    }

    /// The two tower kinds belonging to the tier.
    #[must_use]
    pub const fn kinds(self) -> [TowerKind; 2] {
        let first = match self {
            Self::Normal => 1,
            Self::Rare => 3,
            Self::Hero => 5,
            Self::Myth => 7,
        };
        [TowerKind(first), TowerKind(first + 1)]
    }

    /// Tier produced by a three-of-a-kind upgrade, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Normal => Some(Self::Rare),
            Self::Rare => Some(Self::Hero),
            Self::Hero => Some(Self::Myth),
            Self::Myth => None,
        }
    }

    /// Maximum stack height for slots holding this tier.
    #[must_use]
    pub const fn stack_cap(self) -> u8 {
        match self {
            Self::Myth => 1,
            _ => 3,
        }
    }
}

/// Fixed recipes that combine three lower-tier units into a myth unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MythCombo {
    /// Consumes kinds 1, 3 and 5 to produce kind 7.
    First,
    /// Consumes kinds 2, 4 and 6 to produce kind 8.
    Second,
}

impl MythCombo {
    /// Both recipes in evaluation order.
    pub const ALL: [MythCombo; 2] = [MythCombo::First, MythCombo::Second];

    /// Resolves a numeric combo identifier (1 or 2).
    #[must_use]
    pub const fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Self::First),
            2 => Some(Self::Second),
            _ => None,
        }
    }

    /// Numeric identifier of the recipe.
    #[must_use]
    pub const fn id(self) -> u8 {
        match self {
            Self::First => 1,
            Self::Second => 2,
        }
    }

    /// Kinds consumed by the recipe, one unit each.
    #[must_use]
    pub const fn ingredients(self) -> [TowerKind; 3] {
        match self {
            Self::First => [TowerKind(1), TowerKind(3), TowerKind(5)],
            Self::Second => [TowerKind(2), TowerKind(4), TowerKind(6)],
        }
    }

    /// Myth kind produced by the recipe.
    #[must_use]
    pub const fn product(self) -> TowerKind {
        match self {
            Self::First => TowerKind(7),
            Self::Second => TowerKind(8),
        }
    }
}

/// Stable handle of a stack; combat units belonging to the stack follow it
/// when it is relocated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StackId(u32);

impl StackId {
    /// Creates a new stack identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to an enemy by the spawner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Continuous position in world units.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    x: f32,
    y: f32,
}

impl Position {
    /// Creates a new position.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal component.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical component.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Squared euclidean distance to another position.
    #[must_use]
    pub fn distance_squared(self, other: Position) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }

    /// Euclidean distance to another position.
    #[must_use]
    pub fn distance(self, other: Position) -> f32 {
        self.distance_squared(other).sqrt()
    }
}

/// Placement of a grid in world space used to locate slot centers.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridLayout {
    origin: Position,
    slot_length: f32,
}

impl GridLayout {
    /// Creates a layout whose slot (0, 0) spans from `origin`.
    #[must_use]
    pub const fn new(origin: Position, slot_length: f32) -> Self {
        Self {
            origin,
            slot_length,
        }
    }

    /// Upper-left corner of the grid.
    #[must_use]
    pub const fn origin(&self) -> Position {
        self.origin
    }

    /// Side length of one square slot.
    #[must_use]
    pub const fn slot_length(&self) -> f32 {
        self.slot_length
    }

    /// Center of the provided slot in world units.
    #[must_use]
    pub fn slot_center(&self, slot: SlotCoord) -> Position {
        Position::new(
            self.origin.x() + (f32::from(slot.column()) + 0.5) * self.slot_length,
            self.origin.y() + (f32::from(slot.row()) + 0.5) * self.slot_length,
        )
    }
}

/// Result of a successful placement into a grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlacedTower {
    /// Kind of the unit that was placed.
    pub kind: TowerKind,
    /// Slot that received the unit.
    pub slot: SlotCoord,
    /// Stack height of the slot after placement.
    pub stack: u8,
}

/// Outcome of a gamble whose gem cost was paid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GambleOutcome {
    /// The success roll hit and a unit was placed.
    Placed(PlacedTower),
    /// The success roll missed.
    Missed,
    /// The success roll hit but the grid had no qualifying slot.
    NoAvailableSlot,
}

impl GambleOutcome {
    /// Placement produced by the gamble, if any.
    #[must_use]
    pub const fn placement(&self) -> Option<PlacedTower> {
        match self {
            Self::Placed(placed) => Some(*placed),
            _ => None,
        }
    }
}

/// Why a match ended without a victory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DefeatReason {
    /// Active enemies exceeded the configured ceiling.
    EnemyOverflow,
    /// A boss was still alive when its wave timer expired.
    BossSurvived,
    /// The arena defines no waves to play.
    NoWaves,
}

/// Terminal result of a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchOutcome {
    /// The final boss wave was cleared.
    Victory,
    /// The match was lost.
    GameOver(DefeatReason),
}

/// Currency rewarded for an enemy kill.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reward {
    /// Gold credited to the ledger.
    Gold(u32),
    /// Gems credited to the ledger.
    Gems(u32),
}

/// Commands that express every operation a side may request.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    /// Starts the first wave of the match.
    StartGame,
    /// Stops the active wave without touching either economy.
    StopWave,
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests a gold-cost summon.
    Summon {
        /// Side paying for the summon.
        side: Side,
    },
    /// Requests a gem-cost gamble targeting a tier.
    Gamble {
        /// Side paying for the gamble.
        side: Side,
        /// Tier whose kinds may be placed on success.
        tier: RarityTier,
    },
    /// Requests a three-of-a-kind upgrade fusion of a full slot.
    UpgradeFusion {
        /// Side owning the slot.
        side: Side,
        /// Full slot to consume.
        slot: SlotCoord,
    },
    /// Requests a myth fusion using a numeric combo identifier.
    MythFusion {
        /// Side owning the ingredients.
        side: Side,
        /// Combo identifier, 1 or 2.
        combo: u8,
    },
    /// Sells one unit from a slot.
    Sell {
        /// Side owning the slot.
        side: Side,
        /// Slot to sell from.
        slot: SlotCoord,
    },
    /// Moves a stack into another slot, swapping when the destination is occupied.
    Relocate {
        /// Side owning both slots.
        side: Side,
        /// Slot holding the stack to move.
        from: SlotCoord,
        /// Destination slot.
        to: SlotCoord,
    },
    /// Upgrades every combat unit of the stack in a slot.
    UpgradeUnits {
        /// Side owning the slot.
        side: Side,
        /// Slot whose units are upgraded.
        slot: SlotCoord,
    },
}

/// Events broadcast by the simulation after processing commands and ticks.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// A summon placed a unit.
    TowerSummoned {
        /// Side that paid for the summon.
        side: Side,
        /// Where the unit landed.
        placement: PlacedTower,
        /// Gold spent.
        cost: u32,
    },
    /// A summon request was rejected without side effects.
    SummonRejected {
        /// Side that requested the summon.
        side: Side,
        /// Specific reason the summon failed.
        reason: SummonError,
    },
    /// A gamble consumed gems and resolved.
    GambleResolved {
        /// Side that paid for the gamble.
        side: Side,
        /// Tier that was targeted.
        tier: RarityTier,
        /// Gems spent.
        gem_cost: u32,
        /// What the success roll produced.
        outcome: GambleOutcome,
    },
    /// A gamble request was rejected without side effects.
    GambleRejected {
        /// Side that requested the gamble.
        side: Side,
        /// Tier that was targeted.
        tier: RarityTier,
        /// Specific reason the gamble failed.
        reason: GambleError,
    },
    /// A full stack was upgraded into a unit of the next tier.
    UpgradeFused {
        /// Side owning the grid.
        side: Side,
        /// Slot emptied by the fusion.
        source: SlotCoord,
        /// Kind of the consumed stack.
        consumed: TowerKind,
        /// Where the new unit landed.
        placement: PlacedTower,
    },
    /// A myth recipe consumed its ingredients and placed a myth unit.
    MythFused {
        /// Side owning the grid.
        side: Side,
        /// Recipe that was used.
        combo: MythCombo,
        /// Where the myth unit landed.
        placement: PlacedTower,
    },
    /// A fusion request was rejected without side effects.
    FusionRejected {
        /// Side that requested the fusion.
        side: Side,
        /// Specific reason the fusion failed.
        reason: FusionError,
    },
    /// One unit was sold from a slot.
    TowerSold {
        /// Side owning the slot.
        side: Side,
        /// Slot that was sold from.
        slot: SlotCoord,
        /// Kind of the sold unit.
        kind: TowerKind,
        /// Units left in the slot.
        remaining: u8,
        /// Gold credited.
        refund: u32,
    },
    /// A stack was moved between slots.
    StackRelocated {
        /// Side owning the grid.
        side: Side,
        /// Slot the stack left.
        from: SlotCoord,
        /// Slot the stack occupies now.
        to: SlotCoord,
        /// Whether a stack previously at `to` moved to `from`.
        swapped: bool,
    },
    /// Every unit of a stack was upgraded.
    UnitsUpgraded {
        /// Side owning the slot.
        side: Side,
        /// Slot holding the upgraded stack.
        slot: SlotCoord,
        /// Number of units upgraded.
        units: usize,
    },
    /// A slot-level request was rejected without side effects.
    SlotRequestRejected {
        /// Side that issued the request.
        side: Side,
        /// Slot named by the request.
        slot: SlotCoord,
        /// Specific reason the request failed.
        reason: SlotError,
    },
    /// A relocation request was rejected without side effects.
    RelocateRejected {
        /// Side that issued the request.
        side: Side,
        /// Specific reason the relocation failed.
        reason: RelocateError,
    },
    /// A wave became active.
    WaveStarted {
        /// Record describing the wave.
        record: WaveRecord,
    },
    /// The active wave was cancelled.
    WaveStopped {
        /// Index of the cancelled wave.
        wave_index: u32,
    },
    /// The spawner created an enemy.
    EnemySpawned {
        /// Identifier of the new enemy.
        enemy: EnemyId,
        /// Lane the enemy walks.
        lane: Side,
        /// Whether the enemy is a boss.
        boss: bool,
    },
    /// A unit attacked an enemy.
    UnitAttacked {
        /// Side owning the unit.
        side: Side,
        /// Stack the unit belongs to.
        stack: StackId,
        /// Enemy that was hit.
        enemy: EnemyId,
        /// Integer damage for floating text.
        damage: u32,
        /// Whether the hit was critical.
        critical: bool,
    },
    /// An enemy's health reached zero.
    EnemyKilled {
        /// Identifier of the slain enemy.
        enemy: EnemyId,
        /// Side credited with the kill.
        by: Side,
        /// Whether the enemy was a boss.
        boss: bool,
        /// Currency credited to the killer.
        reward: Reward,
    },
    /// The match reached a terminal state.
    MatchEnded {
        /// How the match ended.
        outcome: MatchOutcome,
    },
}

/// Reasons a gold summon may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum SummonError {
    /// The side cannot afford the next summon.
    #[error("insufficient funds: summon costs {required} gold but only {available} is available")]
    InsufficientFunds {
        /// Gold required by the cost curve.
        required: u32,
        /// Gold held by the ledger.
        available: u32,
    },
    /// No slot can accept the rolled kind.
    #[error("no available slot for the summoned unit")]
    NoAvailableSlot,
}

/// Reasons a gem gamble may be rejected before any gems are spent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum GambleError {
    /// The side holds fewer gems than the tier costs.
    #[error("insufficient gems: gamble costs {required} but only {available} are available")]
    InsufficientGems {
        /// Gems required for the tier.
        required: u32,
        /// Gems held by the ledger.
        available: u32,
    },
    /// Myth units cannot be gambled for.
    #[error("tier {0:?} cannot be gambled for")]
    UnsupportedTier(RarityTier),
}

/// Reasons a fusion may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum FusionError {
    /// The slot coordinate lies outside the grid.
    #[error("slot index is outside the grid")]
    InvalidSlotIndex,
    /// The grid does not satisfy the recipe.
    #[error("fusion preconditions are not met")]
    InvalidFusionPreconditions,
    /// No slot can accept the fused unit.
    #[error("no available slot for the fused unit")]
    NoAvailableSlot,
}

/// Reasons a slot-level request such as a sale may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum SlotError {
    /// The slot coordinate lies outside the grid.
    #[error("slot index is outside the grid")]
    InvalidSlotIndex,
    /// The slot holds no units.
    #[error("slot is empty")]
    EmptySlot,
}

/// Reasons a relocation may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum RelocateError {
    /// One of the coordinates lies outside the grid.
    #[error("slot index is outside the grid")]
    InvalidSlotIndex,
    /// The source slot holds no units.
    #[error("source slot is empty")]
    EmptySource,
    /// Source and destination are the same slot.
    #[error("source and destination are the same slot")]
    SameSlot,
}
