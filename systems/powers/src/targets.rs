//! Shared target selection for every power.
//!
//! A power's area is derived from the actor's tile and the power's direction;
//! its category then filters the area down to the entities it affects.
//! Every list is ordered row-major so local resolution and replay visit
//! targets identically.

use torus_core::{
    BoardPosition, ContractViolation, PieceId, PowerCategory, PowerDirection, PowerType,
};
use torus_world::{query, Board, Piece, Tile, World};

/// Reports whether `position` lies in the area `direction` spans from `origin`.
#[must_use]
pub fn in_area(origin: BoardPosition, direction: PowerDirection, position: BoardPosition) -> bool {
    match direction {
        PowerDirection::Radius => origin.chebyshev_distance(position) <= 1,
        PowerDirection::Row => origin.row() == position.row(),
        PowerDirection::Column => origin.column() == position.column(),
    }
}

/// Tiles of the area around `origin`, row-major, clipped to the board.
#[must_use]
pub fn area(board: &Board, origin: BoardPosition, direction: PowerDirection) -> Vec<BoardPosition> {
    board
        .tiles()
        .map(Tile::position)
        .filter(|position| in_area(origin, direction, *position))
        .collect()
}

/// Tiles targeted by a power, including the actor's own.
///
/// Undirected powers cover the actor's neighbourhood.
pub fn tiles(
    world: &World,
    actor: PieceId,
    power: PowerType,
) -> Result<Vec<BoardPosition>, ContractViolation> {
    let origin = actor_position(world, actor)?;
    let direction = power.direction().unwrap_or(PowerDirection::Radius);
    Ok(area(query::board(world), origin, direction))
}

/// Pieces targeted by a power after filtering its area by category.
///
/// Terrain powers target no pieces.
pub fn pieces(
    world: &World,
    actor: PieceId,
    power: PowerType,
) -> Result<Vec<PieceId>, ContractViolation> {
    let category = power.kind().category();
    if category == PowerCategory::Personal {
        let _ = actor_position(world, actor)?;
        return Ok(vec![actor]);
    }
    if category == PowerCategory::Terrain {
        return Ok(Vec::new());
    }

    let area = tiles(world, actor, power)?;
    Ok(area
        .into_iter()
        .filter_map(|position| query::piece_at(world, position))
        .filter(|piece| match category {
            PowerCategory::Offensive => piece.team() != actor.team(),
            PowerCategory::Supportive => piece.team() == actor.team() && piece.id() != actor,
            PowerCategory::Chaos => true,
            PowerCategory::Terrain | PowerCategory::Personal => false,
        })
        .map(Piece::id)
        .collect())
}

/// Pieces of either team inside the neighbourhood of `center`, row-major.
#[must_use]
pub fn pieces_around(world: &World, center: BoardPosition) -> Vec<PieceId> {
    area(query::board(world), center, PowerDirection::Radius)
        .into_iter()
        .filter_map(|position| query::piece_at(world, position))
        .map(Piece::id)
        .collect()
}

fn actor_position(world: &World, actor: PieceId) -> Result<BoardPosition, ContractViolation> {
    query::piece(world, actor)
        .map(Piece::position)
        .ok_or(ContractViolation::MissingPiece {
            operation: "select targets",
            piece: actor,
        })
}
