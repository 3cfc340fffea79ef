#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that selects a unit's target among in-range enemy contacts.

use std::cmp::Ordering;

use lucky_defense_core::{EnemyContact, EnemyId, Position, RandomSource, TargetType};

/// Tower targeting system that reuses a scratch buffer to avoid repeated
/// allocations.
#[derive(Debug, Default)]
pub struct TowerTargeting {
    workspace: Vec<EnemyContact>,
}

impl TowerTargeting {
    /// Creates a new tower targeting system with an empty scratch buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Chooses the target for a unit at `origin` among `contacts` according
    /// to `policy`.
    ///
    /// Health policies break ties by distance; every policy finally breaks
    /// ties by enemy identifier so the choice never depends on input order.
    pub fn select(
        &mut self,
        policy: TargetType,
        origin: Position,
        contacts: &[EnemyContact],
        rng: &mut dyn RandomSource,
    ) -> Option<EnemyId> {
        if contacts.is_empty() {
            return None;
        }

        if policy == TargetType::Random {
            self.workspace.clear();
            self.workspace.extend_from_slice(contacts);
            self.workspace.sort_by_key(|contact| contact.id);
            let index = rng.pick_index(self.workspace.len());
            return self.workspace.get(index).map(|contact| contact.id);
        }

        let mut best: Option<BestCandidate> = None;
        for contact in contacts {
            let current = BestCandidate {
                distance_sq: origin.distance_squared(contact.position),
                health: contact.health,
                enemy: contact.id,
            };

            match &mut best {
                Some(existing) => {
                    if current.precedes(existing, policy) {
                        *existing = current;
                    }
                }
                None => best = Some(current),
            }
        }

        best.map(|candidate| candidate.enemy)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct BestCandidate {
    distance_sq: f32,
    health: f32,
    enemy: EnemyId,
}

impl BestCandidate {
    fn precedes(&self, other: &Self, policy: TargetType) -> bool {
        let nearer = self.distance_sq.total_cmp(&other.distance_sq);
        let ordering = match policy {
            TargetType::Nearest | TargetType::Random => nearer,
            TargetType::Farthest => nearer.reverse(),
            TargetType::LowestHp => self.health.total_cmp(&other.health).then(nearer),
            TargetType::HighestHp => self.health.total_cmp(&other.health).reverse().then(nearer),
        };

        match ordering {
            Ordering::Less => true,
            Ordering::Greater => false,
            Ordering::Equal => self.enemy < other.enemy,
        }
    }
}
