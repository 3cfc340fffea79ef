//! Tallies match events into a printable summary.

use std::fmt;

use lucky_defense_core::{Event, MatchOutcome, Side};
use lucky_defense_simulation::Telemetry;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct SideTally {
    summons: u32,
    gambles_won: u32,
    fusions: u32,
    sold: u32,
    rejected: u32,
    attacks: u32,
    critical_hits: u32,
    kills: u32,
    boss_kills: u32,
}

/// Running totals for one match plus the final telemetry reading.
#[derive(Debug, Default)]
pub(crate) struct MatchReport {
    sides: [SideTally; 2],
    waves_started: u32,
    enemies_spawned: u32,
    telemetry: Option<Telemetry>,
}

impl MatchReport {
    pub(crate) fn record(&mut self, events: &[Event]) {
        for event in events {
            self.record_event(event);
        }
    }

    pub(crate) fn finish(&mut self, telemetry: Telemetry) {
        self.telemetry = Some(telemetry);
    }

    fn tally(&mut self, side: Side) -> &mut SideTally {
        &mut self.sides[side.index()]
    }

    fn record_event(&mut self, event: &Event) {
        match *event {
            Event::TowerSummoned { side, .. } => self.tally(side).summons += 1,
            Event::GambleResolved { side, outcome, .. } => {
                if outcome.placement().is_some() {
                    self.tally(side).gambles_won += 1;
                }
            }
            Event::UpgradeFused { side, .. } | Event::MythFused { side, .. } => {
                self.tally(side).fusions += 1;
            }
            Event::TowerSold { side, .. } => self.tally(side).sold += 1,
            Event::SummonRejected { side, .. }
            | Event::GambleRejected { side, .. }
            | Event::FusionRejected { side, .. }
            | Event::SlotRequestRejected { side, .. }
            | Event::RelocateRejected { side, .. } => self.tally(side).rejected += 1,
            Event::UnitAttacked { side, critical, .. } => {
                let tally = self.tally(side);
                tally.attacks += 1;
                if critical {
                    tally.critical_hits += 1;
                }
            }
            Event::EnemyKilled { by, boss, .. } => {
                let tally = self.tally(by);
                tally.kills += 1;
                if boss {
                    tally.boss_kills += 1;
                }
            }
            Event::WaveStarted { .. } => self.waves_started += 1,
            Event::EnemySpawned { .. } => self.enemies_spawned += 1,
            Event::TimeAdvanced { .. }
            | Event::StackRelocated { .. }
            | Event::UnitsUpgraded { .. }
            | Event::WaveStopped { .. }
            | Event::MatchEnded { .. } => {}
        }
    }
}

fn outcome_label(outcome: Option<MatchOutcome>) -> String {
    match outcome {
        Some(MatchOutcome::Victory) => "victory".to_owned(),
        Some(MatchOutcome::GameOver(reason)) => format!("game over ({reason:?})"),
        None => "unfinished".to_owned(),
    }
}

impl fmt::Display for MatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(telemetry) = &self.telemetry {
            writeln!(
                f,
                "{} after {:.1}s: {}",
                telemetry.wave_label,
                telemetry.elapsed.as_secs_f32(),
                outcome_label(telemetry.outcome)
            )?;
            writeln!(
                f,
                "waves started {}, enemies spawned {}, alive {}",
                self.waves_started, self.enemies_spawned, telemetry.enemies
            )?;
        }

        for side in Side::ALL {
            let tally = self.sides[side.index()];
            write!(
                f,
                "{side:?}: summons {}, gambles won {}, fusions {}, sold {}, rejected {}, \
                 attacks {} ({} crit), kills {} ({} boss)",
                tally.summons,
                tally.gambles_won,
                tally.fusions,
                tally.sold,
                tally.rejected,
                tally.attacks,
                tally.critical_hits,
                tally.kills,
                tally.boss_kills
            )?;
            if let Some(economy) = self.telemetry.as_ref().map(|t| t.economy[side.index()]) {
                write!(
                    f,
                    ", gold {}, gems {}, units {}/{}",
                    economy.gold, economy.gem, economy.unit_count, economy.unit_cap
                )?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
