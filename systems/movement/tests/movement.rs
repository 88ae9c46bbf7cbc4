use torus_core::{
    AttributeKind, BoardPosition, Event, Height, KillCause, MoveType, PieceId, PowerDirection,
    PowerKind, PowerType, Team, MAX_POWER_STACK,
};
use torus_system_movement::{perform, resolve, valid_moves};
use torus_world::{query, World};

fn spawn(world: &mut World, team: Team, column: u32, row: u32) -> PieceId {
    let mut events = Vec::new();
    world
        .spawn_piece(team, BoardPosition::new(column, row), &mut events)
        .expect("spawn piece")
}

fn set_height(world: &mut World, column: u32, row: u32, height: Height) {
    let mut events = Vec::new();
    world
        .set_tile_height(BoardPosition::new(column, row), height, &mut events)
        .expect("set height");
}

fn grant(world: &mut World, piece: PieceId, attribute: AttributeKind) {
    let mut events = Vec::new();
    world
        .grant_attribute(piece, attribute, &mut events)
        .expect("grant attribute");
}

fn wall_row() -> PowerType {
    PowerType::directed(PowerKind::Wall, PowerDirection::Row)
}

#[test]
fn climbing_unlocks_steep_drops() {
    let mut world = World::new(4, 4);
    let piece = spawn(&mut world, Team::One, 1, 1);
    set_height(&mut world, 1, 1, Height::High);
    set_height(&mut world, 2, 1, Height::Middle);
    set_height(&mut world, 1, 2, Height::Low);

    assert_eq!(
        resolve(&world, piece, BoardPosition::new(2, 1)),
        MoveType::Normal
    );
    assert_eq!(
        resolve(&world, piece, BoardPosition::new(1, 2)),
        MoveType::Invalid
    );

    grant(&mut world, piece, AttributeKind::Climb);
    assert_eq!(
        resolve(&world, piece, BoardPosition::new(1, 2)),
        MoveType::Normal
    );
}

#[test]
fn climbing_up_is_never_vetoed_by_height() {
    let mut world = World::new(3, 3);
    let piece = spawn(&mut world, Team::One, 0, 0);
    set_height(&mut world, 0, 0, Height::Lowest);
    set_height(&mut world, 1, 0, Height::Highest);

    assert_eq!(
        resolve(&world, piece, BoardPosition::new(1, 0)),
        MoveType::Normal
    );
}

#[test]
fn acid_tiles_cannot_be_entered() {
    let mut world = World::new(3, 3);
    let piece = spawn(&mut world, Team::One, 1, 1);
    let mut events = Vec::new();
    world
        .acidify(BoardPosition::new(1, 0), &mut events)
        .expect("acidify");

    assert_eq!(
        resolve(&world, piece, BoardPosition::new(1, 0)),
        MoveType::Invalid
    );
    assert!(!valid_moves(&world, piece)
        .iter()
        .any(|(position, _)| *position == BoardPosition::new(1, 0)));
}

#[test]
fn diagonal_moves_require_the_attribute() {
    let mut world = World::new(3, 3);
    let piece = spawn(&mut world, Team::One, 1, 1);

    assert_eq!(valid_moves(&world, piece).len(), 4);
    assert_eq!(
        resolve(&world, piece, BoardPosition::new(2, 2)),
        MoveType::Invalid
    );

    grant(&mut world, piece, AttributeKind::Diagonal);
    assert_eq!(valid_moves(&world, piece).len(), 8);
    assert_eq!(
        resolve(&world, piece, BoardPosition::new(2, 2)),
        MoveType::Normal
    );
}

#[test]
fn moves_further_than_one_tile_are_invalid() {
    let mut world = World::new(4, 4);
    let piece = spawn(&mut world, Team::One, 0, 0);

    assert_eq!(
        resolve(&world, piece, BoardPosition::new(2, 0)),
        MoveType::Invalid
    );
    assert_eq!(
        resolve(&world, piece, BoardPosition::new(0, 0)),
        MoveType::Invalid
    );
}

#[test]
fn occupancy_decides_between_attack_and_invalid() {
    let mut world = World::new(3, 3);
    let piece = spawn(&mut world, Team::One, 1, 1);
    let _ally = spawn(&mut world, Team::One, 1, 0);
    let enemy = spawn(&mut world, Team::Two, 0, 1);
    let shielded = spawn(&mut world, Team::Two, 2, 1);
    grant(&mut world, shielded, AttributeKind::JumpProof);

    assert_eq!(
        resolve(&world, piece, BoardPosition::new(1, 0)),
        MoveType::Invalid
    );
    assert_eq!(
        resolve(&world, piece, BoardPosition::new(2, 1)),
        MoveType::Invalid
    );
    assert_eq!(
        resolve(&world, piece, BoardPosition::new(0, 1)),
        MoveType::Attack
    );
    assert_eq!(
        valid_moves(&world, piece),
        vec![
            (BoardPosition::new(0, 1), MoveType::Attack),
            (BoardPosition::new(1, 2), MoveType::Normal),
        ]
    );
    assert!(query::piece(&world, enemy).is_some());
}

#[test]
fn attack_kills_the_defender_and_leaves_its_orb() {
    let mut world = World::new(3, 3);
    let piece = spawn(&mut world, Team::One, 1, 1);
    let enemy = spawn(&mut world, Team::Two, 1, 2);
    let mut events = Vec::new();
    let _ = world
        .place_orb(BoardPosition::new(1, 2), wall_row(), &mut events)
        .expect("orb");

    events.clear();
    let move_type = perform(&mut world, piece, BoardPosition::new(1, 2), &mut events)
        .expect("perform");

    assert_eq!(move_type, MoveType::Attack);
    assert!(query::piece(&world, enemy).is_none());
    assert_eq!(
        query::piece(&world, piece).map(|p| p.position()),
        Some(BoardPosition::new(1, 2))
    );
    assert_eq!(
        query::board(&world)
            .tile_at(BoardPosition::new(1, 2))
            .and_then(|tile| tile.orb()),
        Some(wall_row())
    );
    assert_eq!(query::score(&world, Team::One), 1);
    assert_eq!(
        events.first(),
        Some(&Event::PieceKilled {
            piece: enemy,
            position: BoardPosition::new(1, 2),
            cause: KillCause::Attack,
        })
    );
}

#[test]
fn orb_pickup_grants_the_reward_unless_inhibited() {
    let mut world = World::new(3, 3);
    let piece = spawn(&mut world, Team::One, 0, 0);
    let mut events = Vec::new();
    let _ = world
        .place_orb(BoardPosition::new(1, 0), wall_row(), &mut events)
        .expect("orb");
    let _ = world
        .place_orb(BoardPosition::new(0, 1), wall_row(), &mut events)
        .expect("orb");

    let move_type = perform(&mut world, piece, BoardPosition::new(1, 0), &mut events)
        .expect("perform");
    assert_eq!(move_type, MoveType::OrbPickup);
    assert_eq!(
        query::piece(&world, piece).map(|p| p.power_count(wall_row())),
        Some(1)
    );

    grant(&mut world, piece, AttributeKind::Inhibited);
    let _ = perform(&mut world, piece, BoardPosition::new(0, 0), &mut events).expect("perform");
    assert_eq!(
        resolve(&world, piece, BoardPosition::new(0, 1)),
        MoveType::Normal
    );
}

#[test]
fn orb_pickup_can_overflow_the_mover() {
    let mut world = World::new(2, 1);
    let piece = spawn(&mut world, Team::Two, 0, 0);
    let mut events = Vec::new();
    let _ = world
        .grant_power(piece, wall_row(), MAX_POWER_STACK, &mut events)
        .expect("grant");
    let _ = world
        .place_orb(BoardPosition::new(1, 0), wall_row(), &mut events)
        .expect("orb");

    events.clear();
    let move_type = perform(&mut world, piece, BoardPosition::new(1, 0), &mut events)
        .expect("perform");

    assert_eq!(move_type, MoveType::OrbPickup);
    assert!(query::piece(&world, piece).is_none());
    assert!(query::board(&world)
        .tile_at(BoardPosition::new(1, 0))
        .is_some_and(|tile| {
            tile.is_acid() && tile.occupant().is_none() && tile.orb().is_none()
        }));
    assert_eq!(query::score(&world, Team::One), 1);
}

#[test]
fn tripwire_kills_after_the_next_move() {
    let mut world = World::new(3, 1);
    let piece = spawn(&mut world, Team::One, 0, 0);
    grant(&mut world, piece, AttributeKind::Tripwired);

    let mut events = Vec::new();
    let move_type = perform(&mut world, piece, BoardPosition::new(1, 0), &mut events)
        .expect("perform");

    assert_eq!(move_type, MoveType::Normal);
    assert!(query::piece(&world, piece).is_none());
    assert_eq!(
        events.last(),
        Some(&Event::PieceKilled {
            piece,
            position: BoardPosition::new(1, 0),
            cause: KillCause::Tripwire,
        })
    );
}

#[test]
fn invalid_moves_leave_the_world_untouched() {
    let mut world = World::new(3, 3);
    let piece = spawn(&mut world, Team::One, 0, 0);
    let before = world.capture();

    let mut events = Vec::new();
    let move_type = perform(&mut world, piece, BoardPosition::new(2, 2), &mut events)
        .expect("perform");

    assert_eq!(move_type, MoveType::Invalid);
    assert!(events.is_empty());
    assert_eq!(world.capture(), before);
}
