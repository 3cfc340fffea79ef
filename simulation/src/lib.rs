#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Explicit match context that wires the world, the engines and the horde.
//!
//! A [`Simulation`] owns everything a match needs and advances it one
//! deterministic step at a time. Within a tick the wave timer is evaluated
//! first, then the horde moves and spawns, then both sides' units attack,
//! and finally the AI policies act.

mod horde;
mod side;

use std::{mem, sync::Arc, time::Duration};

use lucky_defense_core::{
    ChaChaSource, Command, DataProvider, EnemySpawner, Event, FusionError, GambleError,
    GambleOutcome, MatchOutcome, PlacedTower, RandomSource, RarityTier, RelocateError, Reward,
    Side, SlotCoord, SlotError, SummonError,
};
use lucky_defense_system_ai::{Activation, AiConfig, AiPolicy};
use lucky_defense_system_fusion::{Config as FusionConfig, FusionEngine, SoldUnit};
use lucky_defense_system_summon::{Config as SummonConfig, SummonEngine};
use lucky_defense_system_tower_combat::{AttackReport, CombatResolver};
use lucky_defense_system_waves::{WaveConfig, WaveScheduler};
use lucky_defense_world::{query, EconomyConfig, World};
use serde::Deserialize;
use tracing::info;

pub use horde::{EnemyHorde, Horde, HordeConfig, Lane};

use side::SideContext;

/// Every tunable of a match, loadable from TOML.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Economy shared by both sides.
    pub economy: EconomyConfig,
    /// Summon rarity weights and gamble odds.
    pub summon: SummonConfig,
    /// Fusion and sale settings.
    pub fusion: FusionConfig,
    /// Wave scheduler settings.
    pub waves: WaveConfig,
    /// Pacing of every AI policy.
    pub ai: AiConfig,
    /// Geometry and pacing of the reference horde.
    pub horde: HordeConfig,
    /// Lets a second policy play the player side.
    pub player_ai: bool,
}

impl MatchConfig {
    /// Parses a configuration from TOML text; absent keys keep their defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }
}

/// Readings polled by observers once per frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Telemetry {
    /// Economy readings, indexed by [`Side::index`].
    pub economy: [query::EconomySnapshot; 2],
    /// One-based index of the current wave, zero before the first.
    pub wave_index: u32,
    /// Whether the current wave is a boss wave.
    pub boss_wave: bool,
    /// Countdown left in the active wave.
    pub time_remaining: Duration,
    /// `MM:SS` rendering of the countdown.
    pub clock: String,
    /// Wave banner.
    pub wave_label: String,
    /// Live enemies.
    pub enemies: usize,
    /// Simulated time since the simulation was created.
    pub elapsed: Duration,
    /// Outcome once the match ended.
    pub outcome: Option<MatchOutcome>,
}

/// Authoritative state of one match.
#[derive(Debug)]
pub struct Simulation<H: EnemyHorde> {
    data: Arc<dyn DataProvider>,
    config: MatchConfig,
    world: World,
    rng: Box<dyn RandomSource>,
    summon: SummonEngine,
    fusion: FusionEngine,
    waves: WaveScheduler,
    combat: CombatResolver,
    policies: Vec<AiPolicy>,
    horde: H,
    elapsed: Duration,
    attacks: Vec<AttackReport>,
    activations: Vec<Activation>,
}

impl Simulation<Horde> {
    /// Creates a match against the reference horde, seeded for replay.
    #[must_use]
    pub fn seeded(data: Arc<dyn DataProvider>, config: MatchConfig, seed: u64) -> Self {
        let horde = Horde::new(config.horde, Arc::clone(&data));
        Self::new(data, config, horde, Box::new(ChaChaSource::from_seed(seed)))
    }
}

impl<H: EnemyHorde> Simulation<H> {
    /// Creates a match whose every random decision is drawn from `rng`.
    #[must_use]
    pub fn new(
        data: Arc<dyn DataProvider>,
        config: MatchConfig,
        horde: H,
        rng: Box<dyn RandomSource>,
    ) -> Self {
        let world = World::new(data.as_ref(), config.economy);
        let mut policies = vec![AiPolicy::new(Side::Ai, config.ai)];
        if config.player_ai {
            policies.push(AiPolicy::new(Side::Player, config.ai));
        }

        Self {
            world,
            rng,
            summon: SummonEngine::new(config.summon),
            fusion: FusionEngine::new(config.fusion),
            waves: WaveScheduler::new(config.waves),
            combat: CombatResolver::new(),
            policies,
            horde,
            elapsed: Duration::ZERO,
            attacks: Vec::new(),
            activations: Vec::new(),
            data,
            config,
        }
    }

    /// Configuration the match was created with.
    #[must_use]
    pub const fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Both sides' boards.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Wave state machine.
    #[must_use]
    pub const fn waves(&self) -> &WaveScheduler {
        &self.waves
    }

    /// Combat rosters of both sides.
    #[must_use]
    pub const fn combat(&self) -> &CombatResolver {
        &self.combat
    }

    /// Enemy horde.
    #[must_use]
    pub const fn horde(&self) -> &H {
        &self.horde
    }

    /// Simulated time since creation.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Outcome once the match reached a terminal state.
    #[must_use]
    pub fn outcome(&self) -> Option<MatchOutcome> {
        self.waves.outcome()
    }

    /// Captures every polled reading.
    #[must_use]
    pub fn telemetry(&self) -> Telemetry {
        Telemetry {
            economy: Side::ALL.map(|side| query::economy(&self.world, side)),
            wave_index: self.waves.wave_index(),
            boss_wave: self.waves.is_boss_wave(),
            time_remaining: self.waves.time_remaining(),
            clock: self.waves.clock_label(),
            wave_label: self.waves.wave_label(),
            enemies: self.horde.active_enemy_count(),
            elapsed: self.elapsed,
            outcome: self.outcome(),
        }
    }

    /// Applies a command, appending every resulting event to `out`.
    pub fn execute(&mut self, command: Command, out: &mut Vec<Event>) {
        match command {
            Command::StartGame => self.waves.start(self.data.as_ref(), &mut self.horde, out),
            Command::StopWave => self.waves.stop(&mut self.horde, out),
            Command::Tick { dt } => self.tick(dt, out),
            Command::Summon { side } => {
                let _ = self.summon(side, out);
            }
            Command::Gamble { side, tier } => {
                let _ = self.gamble(side, tier, out);
            }
            Command::UpgradeFusion { side, slot } => {
                let _ = self.upgrade_fusion(side, slot, out);
            }
            Command::MythFusion { side, combo } => {
                let _ = self.myth_fusion(side, combo, out);
            }
            Command::Sell { side, slot } => {
                let _ = self.sell(side, slot, out);
            }
            Command::Relocate { side, from, to } => {
                let _ = self.relocate(side, from, to, out);
            }
            Command::UpgradeUnits { side, slot } => {
                let _ = self.upgrade_units(side, slot, out);
            }
        }
    }

    /// Pays gold for a summon on behalf of `side`.
    pub fn summon(
        &mut self,
        side: Side,
        out: &mut Vec<Event>,
    ) -> Result<PlacedTower, SummonError> {
        self.side_context(side, out).summon()
    }

    /// Pays gems for a gamble on behalf of `side`.
    pub fn gamble(
        &mut self,
        side: Side,
        tier: RarityTier,
        out: &mut Vec<Event>,
    ) -> Result<GambleOutcome, GambleError> {
        self.side_context(side, out).gamble(tier)
    }

    /// Upgrades the full stack in `slot`.
    pub fn upgrade_fusion(
        &mut self,
        side: Side,
        slot: SlotCoord,
        out: &mut Vec<Event>,
    ) -> Result<PlacedTower, FusionError> {
        self.side_context(side, out).upgrade_fusion(slot)
    }

    /// Runs the myth recipe with the numeric identifier `combo`.
    pub fn myth_fusion(
        &mut self,
        side: Side,
        combo: u8,
        out: &mut Vec<Event>,
    ) -> Result<PlacedTower, FusionError> {
        self.side_context(side, out).myth_fusion(combo)
    }

    /// Sells one unit from `slot`.
    pub fn sell(
        &mut self,
        side: Side,
        slot: SlotCoord,
        out: &mut Vec<Event>,
    ) -> Result<SoldUnit, SlotError> {
        self.side_context(side, out).sell(slot)
    }

    /// Moves the stack at `from` into `to`, swapping when `to` is occupied.
    pub fn relocate(
        &mut self,
        side: Side,
        from: SlotCoord,
        to: SlotCoord,
        out: &mut Vec<Event>,
    ) -> Result<bool, RelocateError> {
        self.side_context(side, out).relocate(from, to)
    }

    /// Upgrades every combat unit of the stack in `slot`.
    pub fn upgrade_units(
        &mut self,
        side: Side,
        slot: SlotCoord,
        out: &mut Vec<Event>,
    ) -> Result<usize, SlotError> {
        self.side_context(side, out).upgrade_units(slot)
    }

    /// Advances the match by `dt`. A finished match ignores ticks.
    pub fn tick(&mut self, dt: Duration, out: &mut Vec<Event>) {
        if self.waves.phase().is_terminal() {
            return;
        }
        self.elapsed = self.elapsed.saturating_add(dt);
        out.push(Event::TimeAdvanced { dt });

        self.waves.tick(dt, self.data.as_ref(), &mut self.horde, out);
        if self.waves.phase().is_terminal() {
            return;
        }

        self.horde.advance(dt, out);
        self.resolve_combat(dt, out);

        for policy in &mut self.policies {
            let mut ops = SideContext {
                board: self.world.board_mut(policy.side()),
                data: self.data.as_ref(),
                summon: &self.summon,
                fusion: &self.fusion,
                combat: &mut self.combat,
                rng: &mut *self.rng,
                out: &mut *out,
            };
            policy.tick(dt, &mut ops, &mut self.activations);
        }
        self.activations.clear();
    }

    fn resolve_combat(&mut self, dt: Duration, out: &mut Vec<Event>) {
        let mut attacks = mem::take(&mut self.attacks);
        for side in Side::ALL {
            let layout = self.horde.grid_layout(side);
            self.combat.tick(
                side,
                dt,
                self.world.board(side).grid(),
                &layout,
                &mut self.horde,
                &mut *self.rng,
                &mut attacks,
            );
        }

        for report in attacks.drain(..) {
            self.resolve_attack(report, out);
        }
        self.attacks = attacks;
    }

    fn resolve_attack(&mut self, report: AttackReport, out: &mut Vec<Event>) {
        out.push(Event::UnitAttacked {
            side: report.side,
            stack: report.stack,
            enemy: report.enemy,
            damage: report.damage.display_amount(),
            critical: report.damage.critical,
        });
        if !report.killed {
            return;
        }

        let economy = self.config.economy;
        let ledger = self.world.board_mut(report.side).ledger_mut();
        let reward = if report.boss {
            ledger.credit_gems(economy.boss_gems);
            Reward::Gems(economy.boss_gems)
        } else {
            ledger.credit_gold(economy.kill_gold);
            Reward::Gold(economy.kill_gold)
        };
        out.push(Event::EnemyKilled {
            enemy: report.enemy,
            by: report.side,
            boss: report.boss,
            reward,
        });

        if report.boss && !self.horde.boss_alive() {
            let shortened = self.waves.notify_boss_defeated(self.data.as_ref());
            info!(wave_index = self.waves.wave_index(), shortened, "wave boss defeated");
        }
    }

    fn side_context<'a>(&'a mut self, side: Side, out: &'a mut Vec<Event>) -> SideContext<'a> {
        SideContext {
            board: self.world.board_mut(side),
            data: self.data.as_ref(),
            summon: &self.summon,
            fusion: &self.fusion,
            combat: &mut self.combat,
            rng: &mut *self.rng,
            out,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lucky_defense_core::ScriptedSource;
    use lucky_defense_data::StaticTables;

    fn tables() -> Arc<dyn DataProvider> {
        Arc::new(StaticTables::standard())
    }

    fn scripted(config: MatchConfig, rng: ScriptedSource) -> Simulation<Horde> {
        let data = tables();
        let horde = Horde::new(config.horde, Arc::clone(&data));
        Simulation::new(data, config, horde, Box::new(rng))
    }

    #[test]
    fn config_parses_partial_toml() {
        let config = MatchConfig::from_toml_str(
            r#"
            player_ai = true

            [economy]
            starting_gem = 4

            [waves]
            arena = "Hard"
            enemy_ceiling = 60

            [ai]
            strategy = "Economic"

            [horde]
            continuous_bosses = true
            "#,
        )
        .expect("valid configuration");

        assert!(config.player_ai);
        assert_eq!(config.economy.starting_gem, 4);
        assert_eq!(config.economy.kill_gold, 2, "unspecified keys keep defaults");
        assert_eq!(config.waves.enemy_ceiling, 60);
        assert_eq!(config.waves.check_interval, 0.5);
        assert_eq!(config.ai.strategy, Some(lucky_defense_system_ai::AiStrategy::Economic));
        assert_eq!(config.fusion.sell_refund, 10);
        assert!(config.horde.continuous_bosses);
        assert_eq!(config.horde.boss_pool, 10);
    }

    #[test]
    fn config_rejects_unknown_arena() {
        assert!(MatchConfig::from_toml_str("[waves]\narena = \"Nightmare\"").is_err());
    }

    #[test]
    fn summon_command_emits_event_and_syncs_combat() {
        let mut simulation = scripted(MatchConfig::default(), ScriptedSource::new());
        let mut out = Vec::new();

        simulation.execute(Command::Summon { side: Side::Player }, &mut out);

        let placement = match out.as_slice() {
            [Event::TowerSummoned {
                side: Side::Player,
                placement,
                cost: 20,
            }] => *placement,
            other => panic!("unexpected events {other:?}"),
        };
        assert_eq!(placement.kind.tier(), lucky_defense_core::RarityTier::Normal);
        assert_eq!(simulation.combat().unit_count(Side::Player), 1);
        assert_eq!(query::gold(simulation.world(), Side::Player), 80);
        assert_eq!(query::next_summon_cost(simulation.world(), Side::Player), 22);
    }

    #[test]
    fn rejected_operations_are_reported_as_events() {
        let mut simulation = scripted(MatchConfig::default(), ScriptedSource::new());
        let mut out = Vec::new();
        let slot = SlotCoord::new(1, 1);

        simulation.execute(Command::Sell { side: Side::Ai, slot }, &mut out);
        simulation.execute(
            Command::Gamble {
                side: Side::Ai,
                tier: RarityTier::Rare,
            },
            &mut out,
        );
        simulation.execute(
            Command::MythFusion {
                side: Side::Ai,
                combo: 3,
            },
            &mut out,
        );

        assert_eq!(
            out,
            vec![
                Event::SlotRequestRejected {
                    side: Side::Ai,
                    slot,
                    reason: SlotError::EmptySlot,
                },
                Event::GambleRejected {
                    side: Side::Ai,
                    tier: RarityTier::Rare,
                    reason: GambleError::InsufficientGems {
                        required: 1,
                        available: 0,
                    },
                },
                Event::FusionRejected {
                    side: Side::Ai,
                    reason: FusionError::InvalidFusionPreconditions,
                },
            ]
        );
    }

    #[test]
    fn upgrade_units_targets_the_stack_in_the_slot() {
        let mut simulation = scripted(MatchConfig::default(), ScriptedSource::new());
        let mut out = Vec::new();
        let placement = simulation
            .summon(Side::Player, &mut out)
            .expect("first summon is affordable");

        assert_eq!(simulation.upgrade_units(Side::Player, placement.slot, &mut out), Ok(1));
        let stack = simulation
            .world()
            .board(Side::Player)
            .grid()
            .stack(placement.slot)
            .expect("stack placed");
        let units = simulation.combat().units(Side::Player, stack.id());
        assert_eq!(units[0].upgrades(), 1);

        let empty = SlotCoord::new(2, 5);
        assert_ne!(placement.slot, empty, "scripted picks land on the first slot");
        assert_eq!(
            simulation.upgrade_units(Side::Player, empty, &mut out),
            Err(SlotError::EmptySlot)
        );
        assert_eq!(
            simulation.upgrade_units(Side::Player, SlotCoord::new(3, 0), &mut out),
            Err(SlotError::InvalidSlotIndex)
        );
    }

    #[test]
    fn relocated_stack_keeps_its_upgraded_units() {
        let mut simulation = scripted(MatchConfig::default(), ScriptedSource::new());
        let mut out = Vec::new();
        let placement = simulation
            .summon(Side::Player, &mut out)
            .expect("first summon is affordable");
        let _ = simulation
            .upgrade_units(Side::Player, placement.slot, &mut out)
            .expect("stack exists");
        let to = SlotCoord::new(2, 5);

        assert_eq!(
            simulation.relocate(Side::Player, placement.slot, to, &mut out),
            Ok(false)
        );
        let stack = simulation
            .world()
            .board(Side::Player)
            .grid()
            .stack(to)
            .expect("stack moved");
        assert_eq!(stack.kind(), placement.kind);
        assert_eq!(
            simulation.combat().units(Side::Player, stack.id())[0].upgrades(),
            1
        );
    }

    #[test]
    fn sell_refunds_and_shrinks_the_roster() {
        let mut simulation = scripted(MatchConfig::default(), ScriptedSource::new());
        let mut out = Vec::new();
        let placement = simulation
            .summon(Side::Player, &mut out)
            .expect("first summon is affordable");
        out.clear();

        let sold = simulation
            .sell(Side::Player, placement.slot, &mut out)
            .expect("slot is occupied");

        assert_eq!(sold.remaining, 0);
        assert_eq!(query::gold(simulation.world(), Side::Player), 90);
        assert_eq!(simulation.combat().unit_count(Side::Player), 0);
        assert_eq!(
            out,
            vec![Event::TowerSold {
                side: Side::Player,
                slot: placement.slot,
                kind: placement.kind,
                remaining: 0,
                refund: 10,
            }]
        );
    }

    #[test]
    fn ticks_before_start_only_run_the_ai() {
        let config = MatchConfig {
            ai: AiConfig {
                strategy: Some(lucky_defense_system_ai::AiStrategy::Aggressive),
                ..AiConfig::default()
            },
            ..MatchConfig::default()
        };
        let mut simulation = scripted(config, ScriptedSource::new());
        let mut out = Vec::new();

        simulation.execute(
            Command::Tick {
                dt: Duration::from_secs(2),
            },
            &mut out,
        );

        assert_eq!(simulation.waves().wave_index(), 0);
        assert!(out.iter().any(|event| matches!(
            event,
            Event::TowerSummoned {
                side: Side::Ai,
                ..
            }
        )));
        assert_eq!(query::unit_count(simulation.world(), Side::Player), 0);
        assert_eq!(simulation.telemetry().wave_label, "Wave -");
    }

    #[test]
    fn kill_rewards_credit_the_attacking_side() {
        let mut simulation = scripted(MatchConfig::default(), ScriptedSource::new());
        let mut out = Vec::new();
        let report = AttackReport {
            side: Side::Player,
            stack: lucky_defense_core::StackId::new(0),
            enemy: lucky_defense_core::EnemyId::new(7),
            damage: lucky_defense_system_tower_combat::DamageRoll {
                amount: 30.4,
                critical: false,
            },
            killed: true,
            boss: false,
        };

        simulation.resolve_attack(report, &mut out);
        simulation.resolve_attack(AttackReport { boss: true, ..report }, &mut out);

        assert_eq!(query::gold(simulation.world(), Side::Player), 102);
        assert_eq!(query::gem(simulation.world(), Side::Player), 2);
        assert_eq!(
            out[1],
            Event::EnemyKilled {
                enemy: report.enemy,
                by: Side::Player,
                boss: false,
                reward: Reward::Gold(2),
            }
        );
        assert_eq!(
            out[0],
            Event::UnitAttacked {
                side: Side::Player,
                stack: report.stack,
                enemy: report.enemy,
                damage: 30,
                critical: false,
            }
        );
    }
}
