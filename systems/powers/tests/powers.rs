use std::collections::BTreeSet;

use torus_core::{
    AttributeKind, BoardPosition, ContractViolation, Event, Height, KillCause, PieceId,
    PiecePlacement, PowerDirection, PowerKind, PowerOutcome, PowerType, ScriptedRandom, Team,
};
use torus_system_powers::{activate, targets, Decisions};
use torus_world::{query, World};

fn spawn(world: &mut World, team: Team, column: u32, row: u32) -> PieceId {
    let mut events = Vec::new();
    world
        .spawn_piece(team, BoardPosition::new(column, row), &mut events)
        .expect("spawn piece")
}

fn give(world: &mut World, piece: PieceId, power: PowerType, count: u32) {
    let mut events = Vec::new();
    assert!(world
        .grant_power(piece, power, count, &mut events)
        .expect("grant power"));
}

fn directed(kind: PowerKind, direction: PowerDirection) -> PowerType {
    PowerType::directed(kind, direction)
}

fn wall_row() -> PowerType {
    directed(PowerKind::Wall, PowerDirection::Row)
}

fn roll(
    world: &mut World,
    piece: PieceId,
    power: PowerType,
    random: &mut ScriptedRandom,
    events: &mut Vec<Event>,
) -> PowerOutcome {
    activate(world, piece, power, Decisions::Roll(random), events).expect("activate power")
}

#[test]
fn acidic_radius_kills_neighbours_and_poisons_their_tiles() {
    let mut world = World::new(5, 5);
    let actor = spawn(&mut world, Team::One, 2, 2);
    let west = spawn(&mut world, Team::Two, 1, 2);
    let south_east = spawn(&mut world, Team::Two, 3, 3);
    let distant = spawn(&mut world, Team::Two, 4, 4);
    let acidic = directed(PowerKind::Acidic, PowerDirection::Radius);
    give(&mut world, actor, acidic, 1);

    let mut random = ScriptedRandom::new(vec![3]);
    let mut events = Vec::new();
    let outcome = roll(&mut world, actor, acidic, &mut random, &mut events);

    assert_eq!(outcome, PowerOutcome::Resolved);
    assert_eq!(random.draws(), 0);
    assert!(query::piece(&world, west).is_none());
    assert!(query::piece(&world, south_east).is_none());
    assert!(query::piece(&world, distant).is_some());
    assert_eq!(query::score(&world, Team::One), 2);
    assert!(!query::piece(&world, actor)
        .expect("actor survives")
        .holds(acidic));

    for position in [BoardPosition::new(1, 2), BoardPosition::new(3, 3)] {
        assert!(query::board(&world)
            .tile_at(position)
            .is_some_and(|tile| tile.is_acid()));
        assert!(!world
            .place_orb(position, wall_row(), &mut events)
            .expect("place orb"));
    }
    assert!(!query::board(&world)
        .tile_at(BoardPosition::new(2, 2))
        .is_some_and(|tile| tile.is_acid()));
    assert!(events.contains(&Event::PieceKilled {
        piece: west,
        position: BoardPosition::new(1, 2),
        cause: KillCause::Acid,
    }));
}

#[test]
fn row_and_column_targets_span_the_whole_board() {
    let mut world = World::new(9, 9);
    let actor = spawn(&mut world, Team::One, 0, 4);
    let far_row = spawn(&mut world, Team::Two, 8, 4);
    let near_row = spawn(&mut world, Team::Two, 3, 4);
    let far_column = spawn(&mut world, Team::Two, 0, 0);
    let off_line = spawn(&mut world, Team::Two, 5, 5);
    let ally = spawn(&mut world, Team::One, 6, 4);

    let destroy_row = directed(PowerKind::Destroy, PowerDirection::Row);
    let destroy_column = directed(PowerKind::Destroy, PowerDirection::Column);
    assert_eq!(
        targets::pieces(&world, actor, destroy_row).expect("targets"),
        vec![near_row, far_row]
    );
    assert_eq!(
        targets::pieces(&world, actor, destroy_column).expect("targets"),
        vec![far_column]
    );
    assert_eq!(
        targets::tiles(&world, actor, wall_row()).expect("targets").len(),
        9
    );
    assert_eq!(
        targets::tiles(&world, actor, directed(PowerKind::Wall, PowerDirection::Column))
            .expect("targets")
            .len(),
        9
    );

    give(&mut world, actor, destroy_row, 1);
    give(&mut world, actor, wall_row(), 1);
    let mut random = ScriptedRandom::new(Vec::new());
    let mut events = Vec::new();
    let _ = roll(&mut world, actor, destroy_row, &mut random, &mut events);
    let _ = roll(&mut world, actor, wall_row(), &mut random, &mut events);

    assert!(query::piece(&world, far_row).is_none());
    assert!(query::piece(&world, near_row).is_none());
    assert!(query::piece(&world, far_column).is_some());
    assert!(query::piece(&world, off_line).is_some());
    assert!(query::piece(&world, ally).is_some());
    for column in 0..9 {
        assert_eq!(
            query::board(&world).tile(column, 4).map(|tile| tile.height()),
            Some(Height::Highest)
        );
    }
    assert_eq!(
        query::board(&world).tile(0, 3).map(|tile| tile.height()),
        Some(Height::Middle)
    );
}

#[test]
fn learning_past_the_stack_limit_kills_the_learner() {
    let mut world = World::new(3, 3);
    let learner = spawn(&mut world, Team::One, 1, 1);
    let mentor = spawn(&mut world, Team::One, 1, 2);
    let learn = directed(PowerKind::Learn, PowerDirection::Radius);
    give(&mut world, learner, learn, 1);
    give(&mut world, learner, wall_row(), 19);
    give(&mut world, mentor, wall_row(), 5);

    let mut random = ScriptedRandom::new(Vec::new());
    let mut events = Vec::new();
    let _ = roll(&mut world, learner, learn, &mut random, &mut events);

    assert!(query::piece(&world, learner).is_none());
    assert_eq!(
        query::piece(&world, mentor).map(|piece| piece.power_count(wall_row())),
        Some(5)
    );
    assert!(query::board(&world)
        .tile_at(BoardPosition::new(1, 1))
        .is_some_and(|tile| tile.is_acid()));
    assert!(events.contains(&Event::PieceKilled {
        piece: learner,
        position: BoardPosition::new(1, 1),
        cause: KillCause::Overflow,
    }));
    assert!(!events.contains(&Event::PowersChanged { piece: learner }));
}

#[test]
fn learning_merges_every_ally() {
    let mut world = World::new(3, 3);
    let learner = spawn(&mut world, Team::One, 1, 1);
    let first = spawn(&mut world, Team::One, 0, 0);
    let second = spawn(&mut world, Team::One, 2, 2);
    let learn = directed(PowerKind::Learn, PowerDirection::Radius);
    let destroy = directed(PowerKind::Destroy, PowerDirection::Radius);
    give(&mut world, learner, learn, 1);
    give(&mut world, first, wall_row(), 2);
    give(&mut world, second, wall_row(), 3);
    give(&mut world, second, destroy, 1);

    let mut random = ScriptedRandom::new(Vec::new());
    let mut events = Vec::new();
    let _ = roll(&mut world, learner, learn, &mut random, &mut events);

    let piece = query::piece(&world, learner).expect("learner");
    assert_eq!(piece.power_count(wall_row()), 5);
    assert_eq!(piece.power_count(destroy), 1);
    assert!(!piece.holds(learn));
    assert_eq!(
        query::piece(&world, first).map(|p| p.power_count(wall_row())),
        Some(2)
    );
}

#[test]
fn teaching_continues_after_an_ally_overflows() {
    let mut world = World::new(3, 3);
    let mentor = spawn(&mut world, Team::One, 1, 1);
    let saturated = spawn(&mut world, Team::One, 1, 0);
    let pupil = spawn(&mut world, Team::One, 1, 2);
    let enemy = spawn(&mut world, Team::Two, 0, 1);
    let teach = directed(PowerKind::Teach, PowerDirection::Radius);
    give(&mut world, mentor, teach, 1);
    give(&mut world, mentor, wall_row(), 10);
    give(&mut world, saturated, wall_row(), 15);

    let mut random = ScriptedRandom::new(Vec::new());
    let mut events = Vec::new();
    let _ = roll(&mut world, mentor, teach, &mut random, &mut events);

    assert!(query::piece(&world, saturated).is_none());
    assert!(query::board(&world)
        .tile_at(BoardPosition::new(1, 0))
        .is_some_and(|tile| tile.is_acid()));
    let taught = query::piece(&world, pupil).expect("pupil");
    assert_eq!(taught.power_count(wall_row()), 10);
    assert!(!taught.holds(teach));
    assert_eq!(
        query::piece(&world, mentor).map(|p| p.power_count(wall_row())),
        Some(10)
    );
    assert!(query::piece(&world, enemy)
        .expect("enemy")
        .powers()
        .is_empty());
    assert_eq!(query::score(&world, Team::Two), 1);
}

#[test]
fn pilfering_drains_the_enemy() {
    let mut world = World::new(3, 1);
    let thief = spawn(&mut world, Team::Two, 1, 0);
    let victim = spawn(&mut world, Team::One, 2, 0);
    let pilfer = directed(PowerKind::Pilfer, PowerDirection::Row);
    let jump_proof = PowerType::undirected(PowerKind::JumpProof);
    give(&mut world, thief, pilfer, 2);
    give(&mut world, victim, wall_row(), 4);
    give(&mut world, victim, jump_proof, 1);

    let mut random = ScriptedRandom::new(Vec::new());
    let mut events = Vec::new();
    let _ = roll(&mut world, thief, pilfer, &mut random, &mut events);

    let thief = query::piece(&world, thief).expect("thief");
    assert_eq!(thief.power_count(pilfer), 1);
    assert_eq!(thief.power_count(wall_row()), 4);
    assert_eq!(thief.power_count(jump_proof), 1);
    assert!(query::piece(&world, victim)
        .expect("victim")
        .powers()
        .is_empty());
}

#[test]
fn status_powers_mark_enemies_and_the_actor() {
    let mut world = World::new(3, 3);
    let actor = spawn(&mut world, Team::One, 1, 1);
    let enemy = spawn(&mut world, Team::Two, 2, 1);
    let inhibit = directed(PowerKind::Inhibit, PowerDirection::Radius);
    let tripwire = directed(PowerKind::Tripwire, PowerDirection::Row);
    let diagonal = PowerType::undirected(PowerKind::MoveDiagonal);
    let climb = PowerType::undirected(PowerKind::ClimbTile);
    let jump_proof = PowerType::undirected(PowerKind::JumpProof);
    for power in [inhibit, tripwire, diagonal, climb, jump_proof] {
        give(&mut world, actor, power, 1);
    }

    let mut random = ScriptedRandom::new(Vec::new());
    let mut events = Vec::new();
    for power in [inhibit, tripwire, diagonal, climb, jump_proof] {
        let _ = roll(&mut world, actor, power, &mut random, &mut events);
    }

    let marked = query::piece(&world, enemy).expect("enemy").attributes();
    assert!(marked.inhibited && marked.tripwired);
    let own = query::piece(&world, actor).expect("actor").attributes();
    assert!(own.diagonal && own.climb && own.jump_proof);
    assert!(!own.inhibited && !own.tripwired);
    assert!(events.contains(&Event::AttributeGranted {
        piece: enemy,
        attribute: AttributeKind::Tripwired,
    }));
}

#[test]
fn tile_powers_saturate() {
    let mut world = World::new(2, 2);
    let actor = spawn(&mut world, Team::One, 0, 0);
    let raise = PowerType::undirected(PowerKind::RaiseTile);
    let lower = PowerType::undirected(PowerKind::LowerTile);
    let trench = directed(PowerKind::Trench, PowerDirection::Radius);
    give(&mut world, actor, raise, 3);
    give(&mut world, actor, lower, 1);
    give(&mut world, actor, trench, 1);

    let mut random = ScriptedRandom::new(Vec::new());
    let mut events = Vec::new();
    for _ in 0..3 {
        let _ = roll(&mut world, actor, raise, &mut random, &mut events);
    }
    let height = |world: &World| query::board(world).tile(0, 0).map(|tile| tile.height());
    assert_eq!(height(&world), Some(Height::Highest));

    let _ = roll(&mut world, actor, lower, &mut random, &mut events);
    assert_eq!(height(&world), Some(Height::High));

    let _ = roll(&mut world, actor, trench, &mut random, &mut events);
    assert!(query::board(&world)
        .tiles()
        .all(|tile| tile.height() == Height::Lowest));
}

#[test]
fn recruiting_reassigns_identity_from_the_recruiting_team() {
    let mut world = World::new(3, 3);
    let actor = spawn(&mut world, Team::One, 0, 0);
    let enemy = spawn(&mut world, Team::Two, 1, 0);
    let recruit = directed(PowerKind::Recruit, PowerDirection::Radius);
    give(&mut world, actor, recruit, 1);
    give(&mut world, enemy, wall_row(), 2);
    let mut events = Vec::new();
    world
        .grant_attribute(enemy, AttributeKind::Climb, &mut events)
        .expect("climb");
    world
        .grant_attribute(enemy, AttributeKind::Inhibited, &mut events)
        .expect("inhibit");

    let mut random = ScriptedRandom::new(Vec::new());
    let _ = roll(&mut world, actor, recruit, &mut random, &mut events);

    let recruited = query::piece_at(&world, BoardPosition::new(1, 0)).expect("recruit");
    assert_eq!(recruited.id(), PieceId::new(Team::One, 1));
    assert_eq!(recruited.power_count(wall_row()), 2);
    assert!(recruited.attributes().climb);
    assert!(!recruited.attributes().inhibited);
    assert!(query::piece(&world, enemy).is_none());
    assert_eq!(query::piece_count(&world, Team::Two), 0);
    assert_eq!(query::next_number(&world, Team::Two), 1);
    assert_eq!(query::score(&world, Team::One), 0);
}

#[test]
fn missile_strike_hits_the_rolled_neighbourhood() {
    let mut world = World::new(5, 5);
    let actor = spawn(&mut world, Team::One, 0, 0);
    let ally = spawn(&mut world, Team::One, 1, 1);
    let enemy = spawn(&mut world, Team::Two, 3, 3);
    let outside = spawn(&mut world, Team::Two, 4, 4);
    let missile = PowerType::undirected(PowerKind::MissileStrike);
    give(&mut world, actor, missile, 1);

    let mut random = ScriptedRandom::new(vec![12]);
    let mut events = Vec::new();
    let outcome = roll(&mut world, actor, missile, &mut random, &mut events);

    assert_eq!(
        outcome,
        PowerOutcome::MissileStrike {
            center: Some(BoardPosition::new(2, 2))
        }
    );
    assert!(query::piece(&world, actor).is_some());
    assert!(query::piece(&world, ally).is_none());
    assert!(query::piece(&world, enemy).is_none());
    assert!(query::piece(&world, outside).is_some());
    assert_eq!(query::score(&world, Team::One), 1);
    assert_eq!(query::score(&world, Team::Two), 1);
}

#[test]
fn float_and_respawn_pick_open_tiles() {
    let mut world = World::new(4, 1);
    let actor = spawn(&mut world, Team::Two, 0, 0);
    let mut events = Vec::new();
    world
        .acidify(BoardPosition::new(1, 0), &mut events)
        .expect("acid");
    let float = PowerType::undirected(PowerKind::Float);
    let respawn = PowerType::undirected(PowerKind::Respawn);
    give(&mut world, actor, float, 1);
    give(&mut world, actor, respawn, 1);

    let mut random = ScriptedRandom::new(vec![1, 0]);
    let outcome = roll(&mut world, actor, float, &mut random, &mut events);
    assert_eq!(
        outcome,
        PowerOutcome::Float {
            destination: Some(BoardPosition::new(3, 0))
        }
    );

    let outcome = roll(&mut world, actor, respawn, &mut random, &mut events);
    let spawned = PiecePlacement {
        piece: PieceId::new(Team::Two, 1),
        position: BoardPosition::new(0, 0),
    };
    assert_eq!(
        outcome,
        PowerOutcome::Respawn {
            spawned: Some(spawned)
        }
    );
    assert_eq!(query::piece_count(&world, Team::Two), 2);
}

#[test]
fn scramble_permutes_pieces_over_their_own_tiles() {
    let mut world = World::new(4, 2);
    let actor = spawn(&mut world, Team::One, 0, 0);
    let _ = spawn(&mut world, Team::Two, 1, 0);
    let _ = spawn(&mut world, Team::Two, 3, 0);
    let _ = spawn(&mut world, Team::One, 2, 1);
    let scramble = directed(PowerKind::Scramble, PowerDirection::Row);
    give(&mut world, actor, scramble, 1);

    let before: BTreeSet<_> = query::board(&world)
        .tiles()
        .filter(|tile| tile.occupant().is_some())
        .map(|tile| tile.position())
        .collect();

    let mut random = ScriptedRandom::new(vec![0, 0]);
    let mut events = Vec::new();
    let outcome = roll(&mut world, actor, scramble, &mut random, &mut events);

    let PowerOutcome::Scramble { placements } = outcome else {
        panic!("unexpected outcome {outcome:?}");
    };
    assert_eq!(placements.len(), 3);
    assert_eq!(
        query::piece(&world, actor).map(|piece| piece.position()),
        Some(BoardPosition::new(1, 0))
    );
    let after: BTreeSet<_> = query::board(&world)
        .tiles()
        .filter(|tile| tile.occupant().is_some())
        .map(|tile| tile.position())
        .collect();
    assert_eq!(before, after);
}

fn tripwire(world: &mut World, piece: PieceId) {
    let mut events = Vec::new();
    world
        .grant_attribute(piece, AttributeKind::Tripwired, &mut events)
        .expect("tripwire");
}

fn still_tripwired(world: &World, piece: PieceId) -> bool {
    query::piece(world, piece).is_some_and(|piece| piece.attributes().tripwired)
}

fn kills(events: &[Event]) -> usize {
    events
        .iter()
        .filter(|event| matches!(event, Event::PieceKilled { .. }))
        .count()
}

#[test]
fn floating_does_not_spring_a_tripwire() {
    let mut world = World::new(3, 1);
    let actor = spawn(&mut world, Team::One, 0, 0);
    let float = PowerType::undirected(PowerKind::Float);
    give(&mut world, actor, float, 1);
    tripwire(&mut world, actor);

    let mut random = ScriptedRandom::new(vec![0]);
    let mut events = Vec::new();
    let outcome = roll(&mut world, actor, float, &mut random, &mut events);

    assert_eq!(
        outcome,
        PowerOutcome::Float {
            destination: Some(BoardPosition::new(1, 0))
        }
    );
    assert_eq!(
        query::piece(&world, actor).map(|piece| piece.position()),
        Some(BoardPosition::new(1, 0))
    );
    assert!(still_tripwired(&world, actor));
    assert_eq!(kills(&events), 0);
}

#[test]
fn scrambling_does_not_spring_a_tripwire() {
    let mut world = World::new(3, 1);
    let actor = spawn(&mut world, Team::One, 0, 0);
    let enemy = spawn(&mut world, Team::Two, 2, 0);
    let scramble = directed(PowerKind::Scramble, PowerDirection::Row);
    give(&mut world, actor, scramble, 1);
    tripwire(&mut world, actor);
    tripwire(&mut world, enemy);

    let mut random = ScriptedRandom::new(vec![0]);
    let mut events = Vec::new();
    let _ = roll(&mut world, actor, scramble, &mut random, &mut events);

    assert_eq!(
        query::piece(&world, actor).map(|piece| piece.position()),
        Some(BoardPosition::new(2, 0))
    );
    assert_eq!(
        query::piece(&world, enemy).map(|piece| piece.position()),
        Some(BoardPosition::new(0, 0))
    );
    assert!(still_tripwired(&world, actor));
    assert!(still_tripwired(&world, enemy));
    assert_eq!(kills(&events), 0);
}

#[test]
fn recorded_outcomes_replay_without_randomness() {
    let powers = [
        directed(PowerKind::Burrow, PowerDirection::Radius),
        PowerType::undirected(PowerKind::Float),
        directed(PowerKind::Scramble, PowerDirection::Column),
        PowerType::undirected(PowerKind::MissileStrike),
        PowerType::undirected(PowerKind::Respawn),
    ];

    for (seed, power) in powers.into_iter().enumerate() {
        let mut world = World::new(6, 6);
        let actor = spawn(&mut world, Team::One, 2, 2);
        let _ = spawn(&mut world, Team::One, 2, 4);
        let _ = spawn(&mut world, Team::Two, 2, 0);
        let _ = spawn(&mut world, Team::Two, 3, 3);
        give(&mut world, actor, power, 1);
        let mut replica = world.clone();

        let mut random = ScriptedRandom::new(vec![seed + 7, 3, seed, 11, 2]);
        let mut events = Vec::new();
        let outcome = roll(&mut world, actor, power, &mut random, &mut events);
        assert!(random.draws() > 0, "{power} drew nothing");

        let mut replayed_events = Vec::new();
        let replayed = activate(
            &mut replica,
            actor,
            power,
            Decisions::Recorded(&outcome),
            &mut replayed_events,
        )
        .expect("replay power");

        assert_eq!(replayed, outcome);
        assert_eq!(replica.capture(), world.capture(), "{power} diverged");
        assert_eq!(query::scores(&replica), query::scores(&world));
        assert_eq!(replayed_events, events);
    }
}

#[test]
fn mismatched_records_are_contract_violations() {
    let mut world = World::new(3, 3);
    let actor = spawn(&mut world, Team::One, 1, 1);
    let float = PowerType::undirected(PowerKind::Float);
    let respawn = PowerType::undirected(PowerKind::Respawn);
    give(&mut world, actor, float, 1);
    give(&mut world, actor, respawn, 1);
    give(&mut world, actor, wall_row(), 1);
    let mut events = Vec::new();

    assert_eq!(
        activate(
            &mut world.clone(),
            actor,
            float,
            Decisions::Recorded(&PowerOutcome::Resolved),
            &mut events,
        ),
        Err(ContractViolation::OutcomeMismatch { power: float })
    );
    assert_eq!(
        activate(
            &mut world.clone(),
            actor,
            wall_row(),
            Decisions::Recorded(&PowerOutcome::Float { destination: None }),
            &mut events,
        ),
        Err(ContractViolation::OutcomeMismatch { power: wall_row() })
    );

    let forged = PowerOutcome::Respawn {
        spawned: Some(PiecePlacement {
            piece: PieceId::new(Team::One, 7),
            position: BoardPosition::new(0, 0),
        }),
    };
    assert_eq!(
        activate(
            &mut world.clone(),
            actor,
            respawn,
            Decisions::Recorded(&forged),
            &mut events,
        ),
        Err(ContractViolation::SpawnMismatch {
            recorded: PieceId::new(Team::One, 7),
            allocated: PieceId::new(Team::One, 1),
        })
    );

    let off_board = PowerOutcome::Float {
        destination: Some(BoardPosition::new(5, 5)),
    };
    assert!(activate(
        &mut world.clone(),
        actor,
        float,
        Decisions::Recorded(&off_board),
        &mut events,
    )
    .is_err());
}

#[test]
fn unheld_powers_are_refused() {
    let mut world = World::new(2, 2);
    let actor = spawn(&mut world, Team::One, 0, 0);
    let mut random = ScriptedRandom::new(Vec::new());
    let mut events = Vec::new();

    assert_eq!(
        activate(
            &mut world,
            actor,
            wall_row(),
            Decisions::Roll(&mut random),
            &mut events,
        ),
        Err(ContractViolation::PowerNotHeld {
            piece: actor,
            power: wall_row(),
        })
    );
    assert!(events.is_empty());
}
