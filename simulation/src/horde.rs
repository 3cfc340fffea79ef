//! Reference enemy horde: two looping lanes, one around each side's grid.

use std::{collections::BTreeMap, fmt, sync::Arc, time::Duration};

use lucky_defense_core::{
    Battlefield, DamageReport, DataProvider, EnemyContact, EnemyId, EnemySpawner, EnemyStats,
    Event, GridLayout, Position, Side, WaveRecord, GRID_COLUMNS, GRID_ROWS,
};
use serde::Deserialize;
use tracing::debug;

/// Enemy bookkeeping the simulation needs beyond spawning and spatial queries.
pub trait EnemyHorde: EnemySpawner + Battlefield {
    /// Moves live enemies and performs spawns that fell due during `dt`.
    fn advance(&mut self, dt: Duration, out: &mut Vec<Event>);

    /// Placement of a side's grid in the coordinate space of the lanes.
    fn grid_layout(&self, side: Side) -> GridLayout;
}

/// Geometry and pacing of the reference horde.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct HordeConfig {
    /// Seconds between two regular spawns.
    pub spawn_interval: f32,
    /// Edge length of one grid slot.
    pub slot_length: f32,
    /// Distance between a grid's edge and its lane.
    pub lane_margin: f32,
    /// Empty space between the two sides' lanes.
    pub lane_gap: f32,
    /// Keeps spawning bosses on the interval for the whole boss wave instead
    /// of one boss per lane.
    pub continuous_bosses: bool,
    /// Most bosses alive at once when bosses spawn continuously.
    pub boss_pool: usize,
}

impl Default for HordeConfig {
    fn default() -> Self {
        Self {
            spawn_interval: 0.5,
            slot_length: 1.0,
            lane_margin: 0.5,
            lane_gap: 6.0,
            continuous_bosses: false,
            boss_pool: 10,
        }
    }
}

impl HordeConfig {
    /// Interval between two regular spawns.
    #[must_use]
    pub fn spawn_interval(&self) -> Duration {
        Duration::try_from_secs_f32(self.spawn_interval).unwrap_or(Duration::ZERO)
    }

    /// Placement of a side's grid; the player's grid sits at the origin and
    /// the AI's grid below it.
    #[must_use]
    pub fn grid_layout(&self, side: Side) -> GridLayout {
        let stride =
            f32::from(GRID_ROWS) * self.slot_length + 2.0 * self.lane_margin + self.lane_gap;
        GridLayout::new(Position::new(0.0, side.index() as f32 * stride), self.slot_length)
    }

    /// Lane looping around a side's grid.
    #[must_use]
    pub fn lane(&self, side: Side) -> Lane {
        let layout = self.grid_layout(side);
        let origin = layout.origin();
        Lane {
            min: Position::new(origin.x() - self.lane_margin, origin.y() - self.lane_margin),
            max: Position::new(
                origin.x() + f32::from(GRID_COLUMNS) * self.slot_length + self.lane_margin,
                origin.y() + f32::from(GRID_ROWS) * self.slot_length + self.lane_margin,
            ),
        }
    }
}

/// Axis-aligned rectangular loop walked clockwise from its top-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lane {
    min: Position,
    max: Position,
}

impl Lane {
    /// Length of one full loop.
    #[must_use]
    pub fn perimeter(&self) -> f32 {
        2.0 * (self.width() + self.height())
    }

    /// Position after walking `distance` from the start of the loop.
    #[must_use]
    pub fn point_at(&self, distance: f32) -> Position {
        let perimeter = self.perimeter();
        if !(perimeter > 0.0) {
            return self.min;
        }

        let (width, height) = (self.width(), self.height());
        let along = distance.rem_euclid(perimeter);
        if along < width {
            Position::new(self.min.x() + along, self.min.y())
        } else if along < width + height {
            Position::new(self.max.x(), self.min.y() + (along - width))
        } else if along < 2.0 * width + height {
            Position::new(self.max.x() - (along - width - height), self.max.y())
        } else {
            Position::new(self.min.x(), self.max.y() - (along - 2.0 * width - height))
        }
    }

    fn width(&self) -> f32 {
        self.max.x() - self.min.x()
    }

    fn height(&self) -> f32 {
        self.max.y() - self.min.y()
    }
}

#[derive(Clone, Copy, Debug)]
struct Enemy {
    lane: Side,
    boss: bool,
    health: f32,
    speed: f32,
    travelled: f32,
}

#[derive(Clone, Debug)]
struct SpawnSchedule {
    record: WaveRecord,
    lanes: Vec<Side>,
    next_lane: usize,
    since_spawn: Duration,
    bosses_pending: bool,
}

/// In-memory horde that owns every enemy's health pool.
///
/// Regular waves spawn one monster per interval, alternating lanes, until the
/// schedule is replaced or stopped. Boss waves spawn one boss per lane, or
/// with [`HordeConfig::continuous_bosses`] one boss per interval up to the
/// boss pool.
pub struct Horde {
    config: HordeConfig,
    data: Arc<dyn DataProvider>,
    lanes: [Lane; 2],
    enemies: BTreeMap<EnemyId, Enemy>,
    next_enemy: u32,
    schedule: Option<SpawnSchedule>,
}

impl fmt::Debug for Horde {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Horde")
            .field("config", &self.config)
            .field("enemies", &self.enemies.len())
            .field("next_enemy", &self.next_enemy)
            .field("schedule", &self.schedule)
            .finish_non_exhaustive()
    }
}

impl Horde {
    /// Creates an empty horde that reads enemy stats from `data`.
    #[must_use]
    pub fn new(config: HordeConfig, data: Arc<dyn DataProvider>) -> Self {
        Self {
            lanes: [config.lane(Side::Player), config.lane(Side::Ai)],
            config,
            data,
            enemies: BTreeMap::new(),
            next_enemy: 0,
            schedule: None,
        }
    }

    /// Configuration the horde was built with.
    #[must_use]
    pub const fn config(&self) -> &HordeConfig {
        &self.config
    }

    /// Live enemies walking a side's lane.
    #[must_use]
    pub fn lane_population(&self, side: Side) -> usize {
        self.enemies.values().filter(|enemy| enemy.lane == side).count()
    }

    /// Remaining health of a live enemy.
    #[must_use]
    pub fn health(&self, enemy: EnemyId) -> Option<f32> {
        self.enemies.get(&enemy).map(|enemy| enemy.health)
    }

    fn live_bosses(&self) -> usize {
        self.enemies.values().filter(|enemy| enemy.boss).count()
    }

    fn position(&self, enemy: &Enemy) -> Position {
        self.lanes[enemy.lane.index()].point_at(enemy.travelled)
    }

    fn spawn(&mut self, lane: Side, boss: bool, stats: EnemyStats, out: &mut Vec<Event>) {
        let id = EnemyId::new(self.next_enemy);
        self.next_enemy = self.next_enemy.wrapping_add(1);
        let _ = self.enemies.insert(
            id,
            Enemy {
                lane,
                boss,
                health: stats.health,
                speed: stats.speed,
                travelled: 0.0,
            },
        );
        out.push(Event::EnemySpawned {
            enemy: id,
            lane,
            boss,
        });
    }
}

impl EnemySpawner for Horde {
    fn spawn_wave(&mut self, record: &WaveRecord, lanes: &[Side]) {
        if lanes.is_empty() {
            self.schedule = None;
            return;
        }
        debug!(wave_index = record.wave_index, boss = record.is_boss, "spawn schedule replaced");
        self.schedule = Some(SpawnSchedule {
            record: *record,
            lanes: lanes.to_vec(),
            next_lane: 0,
            since_spawn: Duration::ZERO,
            bosses_pending: record.is_boss && !self.config.continuous_bosses,
        });
    }

    fn active_enemy_count(&self) -> usize {
        self.enemies.len()
    }

    fn stop_wave(&mut self) {
        self.schedule = None;
    }

    fn clear_all(&mut self) {
        self.schedule = None;
        self.enemies.clear();
    }

    fn boss_alive(&self) -> bool {
        self.enemies.values().any(|enemy| enemy.boss)
    }
}

impl Battlefield for Horde {
    fn enemies_in_range(&self, center: Position, radius: f32, out: &mut Vec<EnemyContact>) {
        let radius_sq = radius * radius;
        for (id, enemy) in &self.enemies {
            let position = self.position(enemy);
            if position.distance_squared(center) <= radius_sq {
                out.push(EnemyContact {
                    id: *id,
                    position,
                    health: enemy.health,
                });
            }
        }
    }

    fn apply_damage(&mut self, enemy: EnemyId, amount: f32) -> Option<DamageReport> {
        let target = self.enemies.get_mut(&enemy)?;
        target.health -= amount;
        let report = DamageReport {
            killed: target.health <= 0.0,
            boss: target.boss,
        };
        if report.killed {
            let _ = self.enemies.remove(&enemy);
        }
        Some(report)
    }
}

impl EnemyHorde for Horde {
    fn advance(&mut self, dt: Duration, out: &mut Vec<Event>) {
        let seconds = dt.as_secs_f32();
        for enemy in self.enemies.values_mut() {
            enemy.travelled += enemy.speed * seconds;
        }

        let Some(mut schedule) = self.schedule.take() else {
            return;
        };
        let record = schedule.record;

        if schedule.bosses_pending {
            schedule.bosses_pending = false;
            let stats = self.data.boss_stats(record.boss_id, record.wave_index);
            for &lane in &schedule.lanes {
                self.spawn(lane, true, stats, out);
            }
        }

        let interval = self.config.spawn_interval();
        let continuous = !record.is_boss || self.config.continuous_bosses;
        if continuous && !interval.is_zero() {
            let stats = if record.is_boss {
                self.data.boss_stats(record.boss_id, record.wave_index)
            } else {
                self.data.monster_stats(record.monster_id, record.wave_index)
            };
            schedule.since_spawn = schedule.since_spawn.saturating_add(dt);
            while schedule.since_spawn >= interval {
                schedule.since_spawn -= interval;
                if record.is_boss && self.live_bosses() >= self.config.boss_pool {
                    continue;
                }
                let lane = schedule.lanes[schedule.next_lane % schedule.lanes.len()];
                schedule.next_lane = (schedule.next_lane + 1) % schedule.lanes.len();
                self.spawn(lane, record.is_boss, stats, out);
            }
        }

        self.schedule = Some(schedule);
    }

    fn grid_layout(&self, side: Side) -> GridLayout {
        self.config.grid_layout(side)
    }
}
