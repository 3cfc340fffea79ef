use lucky_defense_core::{ChaChaSource, EnemyContact, EnemyId, Position, TargetType};
use lucky_defense_system_tower_targeting::TowerTargeting;

const POLICIES: [TargetType; 4] = [
    TargetType::Nearest,
    TargetType::Farthest,
    TargetType::LowestHp,
    TargetType::HighestHp,
];

#[test]
fn selection_is_independent_of_contact_order() {
    let contacts = vec![
        contact(1, (1.0, 1.0), 30.0),
        contact(2, (-1.0, 1.0), 30.0),
        contact(3, (0.0, 2.5), 80.0),
        contact(4, (2.5, 0.0), 80.0),
        contact(5, (0.5, 0.0), 5.0),
    ];
    let origin = Position::new(0.0, 0.0);
    let mut targeting = TowerTargeting::new();
    let mut rng = ChaChaSource::from_seed(1);

    for policy in POLICIES {
        let expected = targeting.select(policy, origin, &contacts, &mut rng);
        for rotation in 1..contacts.len() {
            let mut rotated = contacts.clone();
            rotated.rotate_left(rotation);
            let mut reversed = rotated.clone();
            reversed.reverse();

            assert_eq!(
                targeting.select(policy, origin, &rotated, &mut rng),
                expected,
                "{policy:?} depends on rotation {rotation}"
            );
            assert_eq!(
                targeting.select(policy, origin, &reversed, &mut rng),
                expected,
                "{policy:?} depends on reversed rotation {rotation}"
            );
        }
    }
}

#[test]
fn random_policy_only_returns_supplied_contacts() {
    let contacts = vec![
        contact(11, (1.0, 0.0), 10.0),
        contact(12, (2.0, 0.0), 10.0),
        contact(13, (3.0, 0.0), 10.0),
    ];
    let mut targeting = TowerTargeting::new();
    let mut rng = ChaChaSource::from_seed(99);
    let mut seen = [false; 3];

    for _ in 0..200 {
        let chosen = targeting
            .select(TargetType::Random, Position::new(0.0, 0.0), &contacts, &mut rng)
            .expect("contacts are not empty");
        let index = (chosen.get() - 11) as usize;
        assert!(index < 3, "unexpected target {chosen:?}");
        seen[index] = true;
    }

    assert!(seen.iter().all(|hit| *hit), "every contact should be sampled");
}

fn contact(id: u32, position: (f32, f32), health: f32) -> EnemyContact {
    EnemyContact {
        id: EnemyId::new(id),
        position: Position::new(position.0, position.1),
        health,
    }
}
