#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave progression state machine that decides when a match is won or lost.
//!
//! The scheduler owns the wave countdown. Enemy bookkeeping stays behind the
//! [`EnemySpawner`] seam; the scheduler only asks it to spawn, stop, count
//! enemies and report whether the boss is still standing.

use std::time::Duration;

use lucky_defense_core::{
    ArenaType, DataProvider, DefeatReason, EnemySpawner, Event, MatchOutcome, Side, WaveRecord,
};
use serde::Deserialize;
use tracing::info;

/// Tuning of the wave scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    /// Arena whose wave schedule is played.
    pub arena: ArenaType,
    /// Live enemy count above which the match is lost.
    pub enemy_ceiling: usize,
    /// Seconds between two live enemy count checks.
    pub check_interval: f32,
    /// Countdown left after a boss falls on a non-final wave, in seconds.
    pub boss_clear_grace: f32,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            arena: ArenaType::Normal,
            enemy_ceiling: 100,
            check_interval: 0.5,
            boss_clear_grace: 5.0,
        }
    }
}

impl WaveConfig {
    /// Interval between two live enemy count checks.
    #[must_use]
    pub fn check_interval(&self) -> Duration {
        seconds(self.check_interval)
    }

    /// Countdown left after a boss falls on a non-final wave.
    #[must_use]
    pub fn boss_clear_grace(&self) -> Duration {
        seconds(self.boss_clear_grace)
    }
}

fn seconds(value: f32) -> Duration {
    Duration::try_from_secs_f32(value).unwrap_or(Duration::ZERO)
}

/// Lifecycle phase of the scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WavePhase {
    /// No wave is running; the match has not started or the wave was stopped.
    Idle,
    /// A wave countdown is running.
    Active,
    /// The match was lost.
    GameOver(DefeatReason),
    /// The final wave was survived.
    Victory,
}

impl WavePhase {
    /// Reports whether the phase ends the match.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::GameOver(_) | Self::Victory)
    }

    /// Outcome of the match when the phase is terminal.
    #[must_use]
    pub const fn outcome(self) -> Option<MatchOutcome> {
        match self {
            Self::GameOver(reason) => Some(MatchOutcome::GameOver(reason)),
            Self::Victory => Some(MatchOutcome::Victory),
            Self::Idle | Self::Active => None,
        }
    }
}

/// Drives wave timing and detects the end of the match.
#[derive(Debug)]
pub struct WaveScheduler {
    config: WaveConfig,
    phase: WavePhase,
    current: Option<WaveRecord>,
    remaining: Duration,
    since_check: Duration,
}

impl WaveScheduler {
    /// Creates an idle scheduler.
    #[must_use]
    pub fn new(config: WaveConfig) -> Self {
        Self {
            config,
            phase: WavePhase::Idle,
            current: None,
            remaining: Duration::ZERO,
            since_check: Duration::ZERO,
        }
    }

    /// Configuration the scheduler was built with.
    #[must_use]
    pub const fn config(&self) -> &WaveConfig {
        &self.config
    }

    /// Current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> WavePhase {
        self.phase
    }

    /// Outcome of the match once a terminal phase was reached.
    #[must_use]
    pub const fn outcome(&self) -> Option<MatchOutcome> {
        self.phase.outcome()
    }

    /// Record of the most recently started wave.
    #[must_use]
    pub const fn current_wave(&self) -> Option<&WaveRecord> {
        self.current.as_ref()
    }

    /// One-based index of the most recent wave, zero before the first.
    #[must_use]
    pub fn wave_index(&self) -> u32 {
        self.current.map_or(0, |record| record.wave_index)
    }

    /// Whether the most recent wave is a boss wave.
    #[must_use]
    pub fn is_boss_wave(&self) -> bool {
        self.current.is_some_and(|record| record.is_boss)
    }

    /// Countdown left in the active wave; zero while no wave runs.
    #[must_use]
    pub fn time_remaining(&self) -> Duration {
        if self.phase == WavePhase::Active {
            self.remaining
        } else {
            Duration::ZERO
        }
    }

    /// `MM:SS` rendering of [`WaveScheduler::time_remaining`].
    #[must_use]
    pub fn clock_label(&self) -> String {
        clock_label(self.time_remaining())
    }

    /// `Wave N`, `Wave N (BOSS)` or `Wave -` before the first wave.
    #[must_use]
    pub fn wave_label(&self) -> String {
        wave_label(self.current.as_ref())
    }

    /// Starts the match from wave one.
    ///
    /// Ignored while a wave is running or after the match ended. An arena
    /// without waves ends the match immediately.
    pub fn start(
        &mut self,
        data: &dyn DataProvider,
        spawner: &mut dyn EnemySpawner,
        out: &mut Vec<Event>,
    ) {
        if self.phase != WavePhase::Idle {
            return;
        }

        if data.max_wave_index(self.config.arena) == 0 {
            self.finish(WavePhase::GameOver(DefeatReason::NoWaves), spawner, out);
            return;
        }

        self.since_check = Duration::ZERO;
        self.begin_wave(1, data, spawner, out);
    }

    /// Cancels the running wave and its countdown. Live enemies remain.
    pub fn stop(&mut self, spawner: &mut dyn EnemySpawner, out: &mut Vec<Event>) {
        if self.phase != WavePhase::Active {
            return;
        }

        spawner.stop_wave();
        self.phase = WavePhase::Idle;
        self.remaining = Duration::ZERO;
        let wave_index = self.wave_index();
        info!(wave_index, "wave stopped");
        out.push(Event::WaveStopped { wave_index });
    }

    /// Advances the countdown by `dt` and resolves any transition it triggers.
    pub fn tick(
        &mut self,
        dt: Duration,
        data: &dyn DataProvider,
        spawner: &mut dyn EnemySpawner,
        out: &mut Vec<Event>,
    ) {
        if self.phase != WavePhase::Active {
            return;
        }

        self.remaining = self.remaining.saturating_sub(dt);
        self.since_check = self.since_check.saturating_add(dt);

        if self.since_check >= self.config.check_interval() {
            self.since_check = Duration::ZERO;
            if spawner.active_enemy_count() > self.config.enemy_ceiling {
                self.finish(
                    WavePhase::GameOver(DefeatReason::EnemyOverflow),
                    spawner,
                    out,
                );
                return;
            }
        }

        if !self.remaining.is_zero() {
            return;
        }

        let Some(record) = self.current else {
            return;
        };

        if record.is_boss && spawner.boss_alive() {
            self.finish(
                WavePhase::GameOver(DefeatReason::BossSurvived),
                spawner,
                out,
            );
        } else if record.wave_index >= data.max_wave_index(self.config.arena) {
            self.finish(WavePhase::Victory, spawner, out);
        } else {
            self.begin_wave(record.wave_index + 1, data, spawner, out);
        }
    }

    /// Shortens the countdown once the boss of a non-final wave is defeated.
    ///
    /// Returns `true` when the countdown was clamped to the grace period.
    pub fn notify_boss_defeated(&mut self, data: &dyn DataProvider) -> bool {
        if self.phase != WavePhase::Active {
            return false;
        }
        let Some(record) = self.current else {
            return false;
        };
        if !record.is_boss || record.wave_index >= data.max_wave_index(self.config.arena) {
            return false;
        }

        let grace = self.config.boss_clear_grace();
        if self.remaining <= grace {
            return false;
        }
        self.remaining = grace;
        true
    }

    fn begin_wave(
        &mut self,
        wave_index: u32,
        data: &dyn DataProvider,
        spawner: &mut dyn EnemySpawner,
        out: &mut Vec<Event>,
    ) {
        let record = data.wave_record(self.config.arena, wave_index);
        self.current = Some(record);
        self.remaining = record.duration;
        self.phase = WavePhase::Active;

        spawner.spawn_wave(&record, &Side::ALL);
        info!(
            wave_index,
            boss = record.is_boss,
            seconds = record.duration.as_secs_f32(),
            "wave started"
        );
        out.push(Event::WaveStarted { record });
    }

    fn finish(&mut self, phase: WavePhase, spawner: &mut dyn EnemySpawner, out: &mut Vec<Event>) {
        self.phase = phase;
        self.remaining = Duration::ZERO;
        spawner.stop_wave();

        if let Some(outcome) = phase.outcome() {
            info!(?outcome, wave_index = self.wave_index(), "match ended");
            out.push(Event::MatchEnded { outcome });
        }
    }
}

/// Renders a countdown as `MM:SS`, truncating partial seconds.
#[must_use]
pub fn clock_label(remaining: Duration) -> String {
    let seconds = remaining.as_secs();
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Renders the wave banner for an optional wave record.
#[must_use]
pub fn wave_label(record: Option<&WaveRecord>) -> String {
    match record {
        None => String::from("Wave -"),
        Some(record) if record.is_boss => format!("Wave {} (BOSS)", record.wave_index),
        Some(record) => format!("Wave {}", record.wave_index),
    }
}
