#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Static game tables for Lucky Defense.
//!
//! [`StaticTables`] implements [`DataProvider`] over rows loaded from a TOML
//! document (or the built-in [`StaticTables::standard`] set). Lookups never
//! fail: absent rows resolve to the documented fallback values.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use lucky_defense_core::{
    ArenaType, DataProvider, EnemyStats, TargetType, TowerKind, TowerStats, WaveRecord,
};
use serde::Deserialize;
use thiserror::Error;

const SUPPORTED_TABLES_VERSION: u32 = 1;
const FALLBACK_STARTING_GOLD: u32 = 100;

/// Errors raised while loading a tables document.
#[derive(Debug, Error)]
pub enum TableError {
    /// The document could not be read from disk.
    #[error("failed to read tables at {path}")]
    Io {
        /// Location that was read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The document is not valid TOML for the tables schema.
    #[error("failed to parse tables toml contents")]
    Parse(#[from] toml::de::Error),
    /// The document declares a schema version this crate does not understand.
    #[error("unsupported tables version {found}; expected {SUPPORTED_TABLES_VERSION}")]
    UnsupportedVersion {
        /// Version declared by the document.
        found: u32,
    },
    /// A tower row names an identifier outside 1 through 8.
    #[error("tower row names invalid kind {0}")]
    InvalidTowerKind(u8),
    /// A table lists the same key twice.
    #[error("{table} table contains duplicate entry for {key}")]
    DuplicateRow {
        /// Name of the offending table.
        table: &'static str,
        /// Human-readable duplicate key.
        key: String,
    },
    /// A numeric field holds a value the simulation cannot use.
    #[error("{table} row {key} has invalid {field}")]
    InvalidValue {
        /// Name of the offending table.
        table: &'static str,
        /// Human-readable row key.
        key: String,
        /// Field holding the invalid value.
        field: &'static str,
    },
}

/// In-memory lookup tables; immutable once built.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StaticTables {
    starting_gold: Option<u32>,
    towers: BTreeMap<TowerKind, TowerStats>,
    monsters: BTreeMap<u32, EnemyStats>,
    bosses: BTreeMap<u32, EnemyStats>,
    waves: BTreeMap<(ArenaType, u32), WaveRecord>,
    summon_costs: BTreeMap<u32, u32>,
}

impl StaticTables {
    /// Tables with no rows; every lookup resolves to its fallback.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Built-in tables shipped with the game.
    ///
    /// Mirrors `tables/standard.toml` in this crate.
    #[must_use]
    pub fn standard() -> Self {
        let mut tables = Self {
            starting_gold: Some(100),
            ..Self::default()
        };

        let towers: [(u8, f32, f32, f32, TargetType, f32, f32); 8] = [
            (1, 20.0, 1.0, 3.0, TargetType::Nearest, 5.0, 150.0),
            (2, 15.0, 0.6, 2.5, TargetType::LowestHp, 5.0, 150.0),
            (3, 60.0, 1.0, 3.0, TargetType::Farthest, 10.0, 150.0),
            (4, 45.0, 0.8, 3.5, TargetType::HighestHp, 10.0, 175.0),
            (5, 150.0, 1.2, 3.5, TargetType::Nearest, 15.0, 200.0),
            (6, 110.0, 0.9, 4.0, TargetType::Random, 15.0, 200.0),
            (7, 400.0, 1.0, 4.5, TargetType::HighestHp, 20.0, 250.0),
            (8, 320.0, 0.7, 4.5, TargetType::Nearest, 20.0, 250.0),
        ];
        for (id, attack, interval, range, target, crit_rate, crit_damage) in towers {
            if let Some(kind) = TowerKind::new(id) {
                let _ = tables.towers.insert(
                    kind,
                    TowerStats {
                        attack,
                        attack_interval: Duration::from_secs_f32(interval),
                        range,
                        target,
                        crit_rate,
                        crit_damage,
                    },
                );
            }
        }

        let _ = tables.monsters.insert(1, enemy(120.0, 1.5, 5.0, 2));
        let _ = tables.monsters.insert(2, enemy(180.0, 1.2, 8.0, 3));
        let _ = tables.bosses.insert(101, enemy(6_000.0, 0.8, 50.0, 100));
        let _ = tables.bosses.insert(102, enemy(20_000.0, 0.7, 80.0, 200));

        for (arena, regular_secs, early_monster) in
            [(ArenaType::Normal, 20, 1), (ArenaType::Hard, 18, 2)]
        {
            for wave_index in 1..=10 {
                let record = match wave_index {
                    5 => boss_wave(wave_index, 45, early_monster, 101),
                    10 => boss_wave(wave_index, 60, 2, 102),
                    _ => WaveRecord {
                        wave_index,
                        duration: Duration::from_secs(regular_secs),
                        monster_id: if wave_index < 5 { early_monster } else { 2 },
                        boss_id: 0,
                        is_boss: false,
                    },
                };
                let _ = tables.waves.insert((arena, wave_index), record);
            }
        }

        for summon in 1..=10 {
            let _ = tables.summon_costs.insert(summon, 20 + 2 * (summon - 1));
        }

        tables
    }

    /// Parses tables from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, TableError> {
        let document: TablesDocument = toml::from_str(contents)?;
        Self::from_document(document)
    }

    /// Reads and parses tables from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    fn from_document(document: TablesDocument) -> Result<Self, TableError> {
        if document.version != SUPPORTED_TABLES_VERSION {
            return Err(TableError::UnsupportedVersion {
                found: document.version,
            });
        }

        let mut tables = Self {
            starting_gold: document.starting_gold,
            ..Self::default()
        };

        for row in document.towers {
            let kind = TowerKind::new(row.id).ok_or(TableError::InvalidTowerKind(row.id))?;
            let attack_interval = positive_duration(row.attack_interval).ok_or_else(|| {
                TableError::InvalidValue {
                    table: "towers",
                    key: row.id.to_string(),
                    field: "attack_interval",
                }
            })?;
            let stats = TowerStats {
                attack: row.attack,
                attack_interval,
                range: row.range,
                target: TargetType::from_code(row.target),
                crit_rate: row.crit_rate,
                crit_damage: row.crit_damage,
            };
            if tables.towers.insert(kind, stats).is_some() {
                return Err(duplicate("towers", row.id));
            }
        }

        for row in document.monsters {
            if tables.monsters.insert(row.id, row.stats()).is_some() {
                return Err(duplicate("monsters", row.id));
            }
        }

        for row in document.bosses {
            if tables.bosses.insert(row.id, row.stats()).is_some() {
                return Err(duplicate("bosses", row.id));
            }
        }

        for row in document.waves {
            let key = format!("{:?} wave {}", row.arena, row.index);
            if row.index == 0 {
                return Err(TableError::InvalidValue {
                    table: "waves",
                    key,
                    field: "index",
                });
            }
            let Some(duration) = positive_duration(row.duration) else {
                return Err(TableError::InvalidValue {
                    table: "waves",
                    key,
                    field: "duration",
                });
            };
            let record = WaveRecord {
                wave_index: row.index,
                duration,
                monster_id: row.monster,
                boss_id: row.boss,
                is_boss: row.is_boss,
            };
            if tables.waves.insert((row.arena, row.index), record).is_some() {
                return Err(TableError::DuplicateRow {
                    table: "waves",
                    key,
                });
            }
        }

        for row in document.summon_costs {
            if tables.summon_costs.insert(row.summon, row.cost).is_some() {
                return Err(duplicate("summon_costs", row.summon));
            }
        }

        Ok(tables)
    }
}

impl DataProvider for StaticTables {
    fn tower_stats(&self, kind: TowerKind) -> TowerStats {
        self.towers
            .get(&kind)
            .copied()
            .unwrap_or(TowerStats::FALLBACK)
    }

    fn monster_stats(&self, monster_id: u32, wave_index: u32) -> EnemyStats {
        let scale = wave_index.max(1);
        match self.monsters.get(&monster_id) {
            Some(row) => EnemyStats {
                health: row.health * scale as f32,
                speed: row.speed,
                attack: row.attack * scale as f32,
                gold: row.gold.saturating_mul(scale),
            },
            None => EnemyStats {
                health: 100.0 * scale as f32,
                speed: 2.0,
                attack: 10.0 * scale as f32,
                gold: 10u32.saturating_mul(scale),
            },
        }
    }

    fn boss_stats(&self, boss_id: u32, wave_index: u32) -> EnemyStats {
        let scale = wave_index.max(1);
        self.bosses
            .get(&boss_id)
            .copied()
            .unwrap_or(EnemyStats {
                health: 500.0 * scale as f32,
                speed: 1.5,
                attack: 50.0 * scale as f32,
                gold: 100u32.saturating_mul(scale),
            })
    }

    fn wave_record(&self, arena: ArenaType, wave_index: u32) -> WaveRecord {
        self.waves
            .get(&(arena, wave_index))
            .copied()
            .unwrap_or(WaveRecord::fallback(wave_index))
    }

    fn summon_cost(&self, summon_count: u32) -> u32 {
        let summon = summon_count.saturating_add(1);
        self.summon_costs
            .get(&summon)
            .copied()
            .unwrap_or_else(|| summon_count.saturating_mul(10).saturating_add(10))
    }

    fn starting_gold(&self) -> u32 {
        self.starting_gold.unwrap_or(FALLBACK_STARTING_GOLD)
    }

    fn max_wave_index(&self, arena: ArenaType) -> u32 {
        self.waves
            .range((arena, 0)..=(arena, u32::MAX))
            .next_back()
            .map_or(0, |((_, index), _)| *index)
    }
}

fn enemy(health: f32, speed: f32, attack: f32, gold: u32) -> EnemyStats {
    EnemyStats {
        health,
        speed,
        attack,
        gold,
    }
}

fn boss_wave(wave_index: u32, secs: u64, monster_id: u32, boss_id: u32) -> WaveRecord {
    WaveRecord {
        wave_index,
        duration: Duration::from_secs(secs),
        monster_id,
        boss_id,
        is_boss: true,
    }
}

fn duplicate(table: &'static str, key: impl ToString) -> TableError {
    TableError::DuplicateRow {
        table,
        key: key.to_string(),
    }
}

/// Strictly positive seconds that fit in a [`Duration`].
fn positive_duration(seconds: f32) -> Option<Duration> {
    Duration::try_from_secs_f32(seconds)
        .ok()
        .filter(|duration| !duration.is_zero())
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TablesDocument {
    version: u32,
    #[serde(default)]
    starting_gold: Option<u32>,
    #[serde(default)]
    towers: Vec<TowerRow>,
    #[serde(default)]
    monsters: Vec<EnemyRow>,
    #[serde(default)]
    bosses: Vec<EnemyRow>,
    #[serde(default)]
    waves: Vec<WaveRow>,
    #[serde(default)]
    summon_costs: Vec<SummonCostRow>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TowerRow {
    id: u8,
    attack: f32,
    attack_interval: f32,
    range: f32,
    #[serde(default = "default_target_code")]
    target: u8,
    crit_rate: f32,
    crit_damage: f32,
}

fn default_target_code() -> u8 {
    TargetType::Nearest.code()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EnemyRow {
    id: u32,
    health: f32,
    speed: f32,
    attack: f32,
    gold: u32,
}

impl EnemyRow {
    fn stats(&self) -> EnemyStats {
        enemy(self.health, self.speed, self.attack, self.gold)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WaveRow {
    arena: ArenaType,
    index: u32,
    duration: f32,
    monster: u32,
    #[serde(default)]
    boss: u32,
    #[serde(default)]
    is_boss: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SummonCostRow {
    summon: u32,
    cost: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(id: u8) -> TowerKind {
        TowerKind::new(id).expect("valid tower kind")
    }

    #[test]
    fn empty_tables_resolve_every_lookup_to_fallbacks() {
        let tables = StaticTables::empty();

        assert_eq!(tables.tower_stats(kind(3)), TowerStats::FALLBACK);
        assert_eq!(tables.starting_gold(), 100);
        assert_eq!(tables.max_wave_index(ArenaType::Normal), 0);
        assert_eq!(tables.wave_record(ArenaType::Hell, 4), WaveRecord::fallback(4));
        assert_eq!(tables.summon_cost(0), 10);
        assert_eq!(tables.summon_cost(7), 80);

        let monster = tables.monster_stats(99, 3);
        assert!((monster.health - 300.0).abs() < f32::EPSILON);
        assert!((monster.speed - 2.0).abs() < f32::EPSILON);
        assert_eq!(monster.gold, 30);

        let boss = tables.boss_stats(99, 2);
        assert!((boss.health - 1_000.0).abs() < f32::EPSILON);
        assert!((boss.speed - 1.5).abs() < f32::EPSILON);
        assert_eq!(boss.gold, 200);
    }

    #[test]
    fn table_monsters_scale_with_wave_but_bosses_do_not() {
        let tables = StaticTables::standard();

        let monster = tables.monster_stats(1, 4);
        assert!((monster.health - 480.0).abs() < f32::EPSILON);
        assert!((monster.speed - 1.5).abs() < f32::EPSILON);
        assert_eq!(monster.gold, 8);

        let boss = tables.boss_stats(101, 5);
        assert!((boss.health - 6_000.0).abs() < f32::EPSILON);
    }

    #[test]
    fn max_wave_index_reads_the_highest_row_of_the_arena() {
        let tables = StaticTables::standard();
        assert_eq!(tables.max_wave_index(ArenaType::Normal), 10);
        assert_eq!(tables.max_wave_index(ArenaType::Hard), 10);
        assert_eq!(tables.max_wave_index(ArenaType::Demon), 0);
        assert!(tables.wave_record(ArenaType::Normal, 10).is_boss);
    }

    #[test]
    fn summon_table_takes_precedence_over_the_linear_fallback() {
        let tables = StaticTables::standard();
        assert_eq!(tables.summon_cost(0), 20);
        assert_eq!(tables.summon_cost(9), 38);
        assert_eq!(tables.summon_cost(10), 110);
    }

    #[test]
    fn bundled_document_matches_built_in_tables() {
        let contents = include_str!("../tables/standard.toml");
        let parsed = StaticTables::from_toml_str(contents).expect("bundled tables parse");
        assert_eq!(parsed, StaticTables::standard());
    }

    #[test]
    fn unknown_target_codes_fall_back_to_nearest() {
        let document = r#"
            version = 1

            [[towers]]
            id = 2
            attack = 10.0
            attack_interval = 0.5
            range = 2.0
            target = 9
            crit_rate = 0.0
            crit_damage = 100.0
        "#;
        let tables = StaticTables::from_toml_str(document).expect("document parses");
        assert_eq!(tables.tower_stats(kind(2)).target, TargetType::Nearest);
    }

    #[test]
    fn rejects_unsupported_versions() {
        let result = StaticTables::from_toml_str("version = 2");
        assert!(matches!(
            result,
            Err(TableError::UnsupportedVersion { found: 2 })
        ));
    }

    #[test]
    fn rejects_duplicate_waves() {
        let document = r#"
            version = 1

            [[waves]]
            arena = "Normal"
            index = 1
            duration = 10.0
            monster = 1

            [[waves]]
            arena = "Normal"
            index = 1
            duration = 12.0
            monster = 2
        "#;
        let result = StaticTables::from_toml_str(document);
        assert!(
            matches!(result, Err(TableError::DuplicateRow { table: "waves", .. })),
            "duplicate wave rows must be rejected: {result:?}"
        );
    }

    #[test]
    fn rejects_invalid_tower_kinds() {
        let document = r#"
            version = 1

            [[towers]]
            id = 9
            attack = 10.0
            attack_interval = 1.0
            range = 2.0
            crit_rate = 0.0
            crit_damage = 100.0
        "#;
        assert!(matches!(
            StaticTables::from_toml_str(document),
            Err(TableError::InvalidTowerKind(9))
        ));
    }

    #[test]
    fn rejects_wave_durations_too_long_to_represent() {
        let document = r#"
            version = 1

            [[waves]]
            arena = "Hard"
            index = 3
            duration = 1e30
            monster = 1
        "#;
        let result = StaticTables::from_toml_str(document);
        assert!(
            matches!(
                result,
                Err(TableError::InvalidValue {
                    table: "waves",
                    field: "duration",
                    ..
                })
            ),
            "oversized durations must be rejected: {result:?}"
        );
    }

    #[test]
    fn rejects_attack_intervals_that_are_not_positive_durations() {
        for interval in ["1e30", "0.0", "-1.0", "nan"] {
            let document = format!(
                r#"
                version = 1

                [[towers]]
                id = 4
                attack = 10.0
                attack_interval = {interval}
                range = 2.0
                crit_rate = 0.0
                crit_damage = 100.0
                "#
            );
            let result = StaticTables::from_toml_str(&document);
            assert!(
                matches!(
                    result,
                    Err(TableError::InvalidValue {
                        table: "towers",
                        field: "attack_interval",
                        ..
                    })
                ),
                "attack_interval = {interval} must be rejected: {result:?}"
            );
        }
    }

    #[test]
    fn missing_files_report_their_path() {
        let error = StaticTables::load("does/not/exist.toml").expect_err("missing file");
        assert!(error.to_string().contains("does/not/exist.toml"));
    }
}
