use lucky_defense_core::{
    ChaChaSource, FusionError, MythCombo, RarityTier, RelocateError, Side, SlotCoord, TowerKind,
};
use lucky_defense_data::StaticTables;
use lucky_defense_system_fusion::{first_upgradable, myth_fusion_ready, FusionEngine};
use lucky_defense_world::{EconomyConfig, SideBoard};

fn board() -> SideBoard {
    SideBoard::new(
        Side::Ai,
        &StaticTables::standard(),
        &EconomyConfig::default(),
    )
}

fn kind(id: u8) -> TowerKind {
    TowerKind::new(id).expect("valid tower kind")
}

fn fill(board: &mut SideBoard, slot: SlotCoord, id: u8, count: u8) {
    for _ in 0..count {
        let _ = board
            .grid_mut()
            .add_unit(slot, kind(id))
            .expect("slot accepts unit");
    }
}

#[test]
fn repeated_upgrades_climb_tiers_and_consume_two_units_each() {
    let engine = FusionEngine::default();

    for seed in 0..32 {
        let mut board = board();
        let mut rng = ChaChaSource::from_seed(seed);
        for (column, id) in [1, 1, 2, 2, 1, 2].into_iter().enumerate() {
            fill(&mut board, SlotCoord::new(0, column as u8), id, 3);
        }

        while let Some(source) = first_upgradable(board.grid(), TowerKind::all()) {
            let consumed = board
                .grid()
                .stack(source)
                .expect("upgradable slot holds a stack")
                .kind();
            let before = board.grid().unit_count();

            let placed = engine
                .try_upgrade_fusion(&mut board, source, &mut rng)
                .unwrap_or_else(|error| panic!("seed {seed}: upgrade failed with {error}"));

            assert_eq!(board.grid().unit_count(), before - 2, "seed {seed}");
            assert_eq!(Some(placed.kind.tier()), consumed.tier().next(), "seed {seed}");
            assert_ne!(placed.slot, source, "the consumed slot is never the destination");
            for (_, stack) in board.grid().stacks() {
                assert!(stack.count() <= stack.kind().stack_cap(), "seed {seed}");
            }
        }

        assert!(
            board
                .grid()
                .stacks()
                .all(|(_, stack)| !stack.is_full() || stack.kind().tier() == RarityTier::Myth),
            "seed {seed}: a full stack was left unfused"
        );
    }
}

#[test]
fn myth_recipe_runs_once_per_set_of_ingredients() {
    let engine = FusionEngine::default();
    let mut board = board();
    fill(&mut board, SlotCoord::new(0, 0), 1, 2);
    fill(&mut board, SlotCoord::new(1, 4), 3, 1);
    fill(&mut board, SlotCoord::new(2, 2), 5, 1);
    assert!(myth_fusion_ready(board.grid(), MythCombo::First));
    assert!(!myth_fusion_ready(board.grid(), MythCombo::Second));

    let placed = engine
        .try_myth_fusion(&mut board, MythCombo::First.id())
        .expect("every ingredient is present");

    assert_eq!(placed.kind, kind(7));
    assert_eq!(placed.slot, SlotCoord::new(0, 1));
    assert_eq!(board.grid().unit_count(), 2);
    assert_eq!(
        board.grid().stack(SlotCoord::new(0, 0)).map(|stack| stack.count()),
        Some(1)
    );
    assert!(!myth_fusion_ready(board.grid(), MythCombo::First));
    assert_eq!(
        engine.try_myth_fusion(&mut board, MythCombo::First.id()),
        Err(FusionError::InvalidFusionPreconditions)
    );
}

#[test]
fn sold_and_relocated_myth_units_keep_the_grid_consistent() {
    let engine = FusionEngine::default();
    let mut board = board();
    fill(&mut board, SlotCoord::new(0, 0), 7, 1);
    fill(&mut board, SlotCoord::new(0, 1), 2, 2);
    let gold = board.ledger().gold();

    let swapped = engine
        .relocate(&mut board, SlotCoord::new(0, 0), SlotCoord::new(0, 1))
        .expect("both slots are valid");
    assert!(swapped);
    assert_eq!(
        board.grid().stack(SlotCoord::new(0, 1)).map(|stack| stack.kind()),
        Some(kind(7))
    );
    assert_eq!(
        engine.relocate(&mut board, SlotCoord::new(2, 5), SlotCoord::new(0, 0)),
        Err(RelocateError::EmptySource)
    );

    let sold = engine
        .sell(&mut board, SlotCoord::new(0, 1))
        .expect("slot holds the myth unit");
    assert_eq!(sold.kind, kind(7));
    assert_eq!(sold.remaining, 0);
    assert_eq!(board.ledger().gold(), gold + sold.refund);
    assert_eq!(board.grid().unit_count(), 2);
}
