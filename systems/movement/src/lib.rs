#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Movement resolver that classifies and applies single-tile piece moves.

use torus_core::{BoardPosition, ContractViolation, Event, KillCause, MoveType, PieceId};
use torus_world::{query, Piece, World};
use tracing::debug;

/// Classifies a move of `piece` onto `destination`.
///
/// The rules are evaluated in order and the first veto wins: height, tile
/// status, adjacency, occupancy. Unknown pieces and off-board destinations
/// resolve as [`MoveType::Invalid`].
#[must_use]
pub fn resolve(world: &World, piece: PieceId, destination: BoardPosition) -> MoveType {
    let Some(mover) = query::piece(world, piece) else {
        return MoveType::Invalid;
    };
    let board = query::board(world);
    let origin = mover.position();
    let (Some(source), Some(target)) = (board.tile_at(origin), board.tile_at(destination)) else {
        return MoveType::Invalid;
    };
    let attributes = mover.attributes();

    if !attributes.climb && source.height().drop_to(target.height()) > 1 {
        return MoveType::Invalid;
    }

    if target.is_acid() {
        return MoveType::Invalid;
    }

    let adjacent = origin.is_cardinal_neighbor(destination)
        || (attributes.diagonal && origin.is_diagonal_neighbor(destination));
    if !adjacent {
        return MoveType::Invalid;
    }

    match target.occupant().and_then(|id| query::piece(world, id)) {
        Some(occupant) if occupant.team() == mover.team() => MoveType::Invalid,
        Some(occupant) if occupant.attributes().jump_proof => MoveType::Invalid,
        Some(_) => MoveType::Attack,
        None if target.orb().is_some() && !attributes.inhibited => MoveType::OrbPickup,
        None => MoveType::Normal,
    }
}

/// Every legal destination in the 3×3 neighbourhood of a piece, row-major.
#[must_use]
pub fn valid_moves(world: &World, piece: PieceId) -> Vec<(BoardPosition, MoveType)> {
    let Some(origin) = query::piece(world, piece).map(Piece::position) else {
        return Vec::new();
    };
    let board = query::board(world);

    let mut moves = Vec::new();
    for row_offset in -1_i64..=1 {
        for column_offset in -1_i64..=1 {
            if row_offset == 0 && column_offset == 0 {
                continue;
            }
            let Some(destination) = offset(origin, column_offset, row_offset) else {
                continue;
            };
            if !board.contains(destination) {
                continue;
            }
            let move_type = resolve(world, piece, destination);
            if move_type.is_valid() {
                moves.push((destination, move_type));
            }
        }
    }
    moves
}

/// Applies a move and its consequences, returning how it resolved.
///
/// An attack kills the defender before the attacker moves in and leaves any
/// orb on that tile pending. An orb pickup collects the orb after the move,
/// which may overflow the mover. A surviving tripwired mover is killed once
/// the move completes. Invalid moves change nothing.
pub fn perform(
    world: &mut World,
    piece: PieceId,
    destination: BoardPosition,
    out_events: &mut Vec<Event>,
) -> Result<MoveType, ContractViolation> {
    let move_type = resolve(world, piece, destination);
    debug!(%piece, %destination, ?move_type, "resolving move");

    match move_type {
        MoveType::Invalid => return Ok(MoveType::Invalid),
        MoveType::Attack => {
            let defender = query::piece_at(world, destination)
                .map(Piece::id)
                .ok_or(ContractViolation::MissingTile {
                    operation: "attack",
                    position: destination,
                })?;
            world.kill_piece(defender, KillCause::Attack, out_events)?;
            let _ = world.relocate_piece(piece, destination, out_events)?;
        }
        MoveType::Normal => {
            let _ = world.relocate_piece(piece, destination, out_events)?;
        }
        MoveType::OrbPickup => {
            let _ = world.relocate_piece(piece, destination, out_events)?;
            let _ = world.collect_orb(piece, out_events)?;
        }
    }

    if query::piece(world, piece).is_some() && world.disarm_tripwire(piece)? {
        world.kill_piece(piece, KillCause::Tripwire, out_events)?;
    }

    Ok(move_type)
}

fn offset(origin: BoardPosition, column_offset: i64, row_offset: i64) -> Option<BoardPosition> {
    let column = u32::try_from(i64::from(origin.column()) + column_offset).ok()?;
    let row = u32::try_from(i64::from(origin.row()) + row_offset).ok()?;
    Some(BoardPosition::new(column, row))
}
