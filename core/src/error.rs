//! Contract violations raised when game state or a change stream is inconsistent.

use thiserror::Error;

use crate::{BoardPosition, MoveType, PieceId, PowerType};

/// Unrecoverable inconsistency between an operation and the state it runs against.
///
/// These indicate corrupted synchronization or a programming error. The
/// operation that raised one must be abandoned; the only recovery is reloading
/// a persisted baseline.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ContractViolation {
    /// A piece referenced by the operation does not exist.
    #[error("{operation}: piece {piece} does not exist")]
    MissingPiece {
        /// Operation that performed the lookup.
        operation: &'static str,
        /// Identity that was looked up.
        piece: PieceId,
    },
    /// A tile referenced by the operation does not exist.
    #[error("{operation}: no tile at {position}")]
    MissingTile {
        /// Operation that performed the lookup.
        operation: &'static str,
        /// Position that was looked up.
        position: BoardPosition,
    },
    /// A tile that had to be free already hosts a piece.
    #[error("{operation}: tile {position} is already occupied")]
    TileOccupied {
        /// Operation that attempted the placement.
        operation: &'static str,
        /// Occupied position.
        position: BoardPosition,
    },
    /// A piece tried to spend a power it does not hold.
    #[error("piece {piece} does not hold {power}")]
    PowerNotHeld {
        /// Acting piece.
        piece: PieceId,
        /// Requested power.
        power: PowerType,
    },
    /// A recorded move no longer resolves the way it did when it was recorded.
    #[error("move of {piece} to {to} was recorded as {recorded:?} but resolves as {resolved:?}")]
    MoveMismatch {
        /// Moving piece.
        piece: PieceId,
        /// Destination tile.
        to: BoardPosition,
        /// Classification stored in the change.
        recorded: MoveType,
        /// Classification computed during replay.
        resolved: MoveType,
    },
    /// A recorded power outcome does not fit the power it belongs to.
    #[error("recorded outcome does not match power {power}")]
    OutcomeMismatch {
        /// Power whose outcome was malformed.
        power: PowerType,
    },
    /// A recorded respawn allocated a different identity than replay does.
    #[error("respawn recorded {recorded} but replay allocated {allocated}")]
    SpawnMismatch {
        /// Identity stored in the change.
        recorded: PieceId,
        /// Identity allocated during replay.
        allocated: PieceId,
    },
    /// A recorded orb could not be placed on its tile.
    #[error("orb placement on {position} was rejected")]
    OrbRejected {
        /// Tile that refused the orb.
        position: BoardPosition,
    },
    /// Replaying a turn did not reproduce its committed post-turn state.
    #[error("replay of turn {turn} diverged from the committed state")]
    Desync {
        /// Turn whose replay diverged.
        turn: u32,
    },
    /// A snapshot describes a board that cannot exist.
    #[error("malformed snapshot: {reason}")]
    MalformedSnapshot {
        /// Description of the defect.
        reason: String,
    },
}
