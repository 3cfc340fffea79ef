//! Seams to the enemy side of the simulation: spawning and spatial queries.

use crate::{EnemyId, Position, Side, WaveRecord};

/// An enemy visible to a spatial query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyContact {
    /// Identifier of the enemy.
    pub id: EnemyId,
    /// Current position.
    pub position: Position,
    /// Remaining health.
    pub health: f32,
}

/// Result of applying damage to a live enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DamageReport {
    /// Whether the hit reduced the enemy's health to zero.
    pub killed: bool,
    /// Whether the enemy is a boss.
    pub boss: bool,
}

/// Spatial queries and health pools of the live enemies.
pub trait Battlefield {
    /// Appends every live enemy whose distance to `center` is at most
    /// `radius`, ordered by identifier. `out` is not cleared.
    fn enemies_in_range(&self, center: Position, radius: f32, out: &mut Vec<EnemyContact>);

    /// Subtracts `amount` from the enemy's health and removes it when the
    /// health reaches zero. Returns `None` for unknown or dead enemies.
    fn apply_damage(&mut self, enemy: EnemyId, amount: f32) -> Option<DamageReport>;
}

/// Creates, counts and removes enemies on behalf of the wave scheduler.
pub trait EnemySpawner {
    /// Begins spawning the wave described by `record` on the provided lanes,
    /// replacing any previous spawn schedule.
    fn spawn_wave(&mut self, record: &WaveRecord, lanes: &[Side]);

    /// Number of live enemies.
    fn active_enemy_count(&self) -> usize;

    /// Cancels the pending spawn schedule; live enemies remain.
    fn stop_wave(&mut self);

    /// Removes every live enemy and cancels the spawn schedule.
    fn clear_all(&mut self);

    /// Whether a boss spawned for the current wave is still alive.
    fn boss_alive(&self) -> bool;
}
