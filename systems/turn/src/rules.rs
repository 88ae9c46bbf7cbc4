//! Match-level rules: board setup, orb seeding, turn closing and win detection.

use torus_core::{
    BoardPosition, ContractViolation, Event, Height, OrbPlacement, PowerType, RandomSource, Team,
    ORB_FRACTION,
};
use torus_world::{query, World};

use crate::GameConfig;

/// Builds the starting board of a match.
///
/// Tiles get random heights between [`Height::Low`] and [`Height::High`].
/// Team One lines up on the first row and Team Two on the last, spread evenly
/// across the columns. Every piece starts with one random catalog power and
/// the board receives an initial orb spawn.
pub fn setup_board(
    config: &GameConfig,
    random: &mut dyn RandomSource,
) -> Result<World, ContractViolation> {
    let mut world = World::new(config.columns, config.rows);
    let mut events = Vec::new();

    for row in 0..config.rows {
        for column in 0..config.columns {
            let level = u8::try_from(random.next_index(3)).unwrap_or(0) + Height::Low.level();
            let height = Height::from_level(level).unwrap_or_default();
            world.set_tile_height(BoardPosition::new(column, row), height, &mut events)?;
        }
    }

    let catalog = PowerType::catalog();
    let home_rows = [(Team::One, 0), (Team::Two, config.rows.saturating_sub(1))];
    for (team, row) in home_rows {
        for slot in 0..config.pieces_per_team {
            let column = home_column(slot, config.pieces_per_team, config.columns);
            let piece = world.spawn_piece(team, BoardPosition::new(column, row), &mut events)?;
            if let Some(power) = catalog.get(random.next_index(catalog.len())) {
                let _ = world.grant_power(piece, *power, 1, &mut events)?;
            }
        }
    }

    let _ = spawn_orbs(&mut world, random, &mut events)?;
    Ok(world)
}

fn home_column(slot: u32, pieces: u32, columns: u32) -> u32 {
    let spread = (u64::from(slot) * 2 + 1) * u64::from(columns) / (u64::from(pieces.max(1)) * 2);
    u32::try_from(spread)
        .unwrap_or(0)
        .min(columns.saturating_sub(1))
}

/// Seeds orbs onto a fifth of the eligible tiles, each with a random catalog power.
///
/// Returns the placements in the order they were made.
pub fn spawn_orbs(
    world: &mut World,
    random: &mut dyn RandomSource,
    out_events: &mut Vec<Event>,
) -> Result<Vec<OrbPlacement>, ContractViolation> {
    let mut candidates = query::board(world).orb_candidates();
    candidates.sort_by_key(|position| (position.row(), position.column()));
    let count = candidates.len() / ORB_FRACTION;
    let catalog = PowerType::catalog();

    let mut placements = Vec::with_capacity(count);
    for _ in 0..count {
        if candidates.is_empty() || catalog.is_empty() {
            break;
        }
        let slot = random.next_index(candidates.len()).min(candidates.len() - 1);
        let position = candidates.swap_remove(slot);
        let power = catalog[random.next_index(catalog.len()).min(catalog.len() - 1)];
        if !world.place_orb(position, power, out_events)? {
            return Err(ContractViolation::OrbRejected { position });
        }
        placements.push(OrbPlacement { position, power });
    }
    Ok(placements)
}

/// Deterministic bookkeeping run whenever `team` closes a turn.
///
/// Both the committing client and the replaying client run it, so it is
/// never recorded as a change.
pub fn close_turn(world: &mut World, team: Team) {
    world.clear_inhibited(team);
}

/// Team that has won, if any.
///
/// A team without pieces loses. When both rosters are empty the team that
/// just acted loses.
#[must_use]
pub fn winner_found(world: &World, acting: Team) -> Option<Team> {
    let alive = |team| query::piece_count(world, team) > 0;
    match (alive(Team::One), alive(Team::Two)) {
        (true, true) => None,
        (true, false) => Some(Team::One),
        (false, true) => Some(Team::Two),
        (false, false) => Some(acting.opponent()),
    }
}
