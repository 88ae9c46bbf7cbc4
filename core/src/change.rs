//! Replayable records of resolved game effects.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{BoardPosition, Height, MoveType, PieceId, PowerType};

/// One resolved game effect, recorded in the order it happened.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    kind: ChangeKind,
    duration_hint_ms: u32,
}

impl Change {
    /// Wraps a change kind, estimating how long presenting it should take.
    #[must_use]
    pub fn new(kind: ChangeKind) -> Self {
        let duration_hint_ms = kind.estimated_duration_ms();
        Self {
            kind,
            duration_hint_ms,
        }
    }

    /// Effect described by the change.
    #[must_use]
    pub const fn kind(&self) -> &ChangeKind {
        &self.kind
    }

    /// Animation pacing hint; irrelevant to game state.
    #[must_use]
    pub fn duration_hint(&self) -> Duration {
        Duration::from_millis(u64::from(self.duration_hint_ms))
    }
}

/// Typed payload of a [`Change`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    /// A piece moved onto an adjacent tile.
    Move {
        /// Moving piece.
        piece: PieceId,
        /// Tile the piece left.
        from: BoardPosition,
        /// Tile the piece entered.
        to: BoardPosition,
        /// How the movement resolver classified the move.
        move_type: MoveType,
    },
    /// A piece activated a power.
    Power {
        /// Acting piece.
        piece: PieceId,
        /// Activated power.
        power: PowerType,
        /// Resolved outcome of any random decisions the power made.
        outcome: PowerOutcome,
    },
    /// Orbs were seeded onto the board.
    PlaceOrbs {
        /// Tiles that received an orb, with the reward of each.
        orbs: Vec<OrbPlacement>,
    },
    /// A piece received stacks of a power directly.
    GrantPower {
        /// Receiving piece.
        piece: PieceId,
        /// Granted power.
        power: PowerType,
        /// Number of stacks granted.
        count: u32,
    },
}

impl ChangeKind {
    fn estimated_duration_ms(&self) -> u32 {
        match self {
            Self::Move { move_type, .. } => match move_type {
                MoveType::Attack => 750,
                MoveType::OrbPickup => 450,
                MoveType::Normal | MoveType::Invalid => 300,
            },
            Self::Power { outcome, .. } => 250 + outcome.estimated_duration_ms(),
            Self::PlaceOrbs { orbs } => 150_u32.saturating_mul(count_u32(orbs.len())),
            Self::GrantPower { .. } => 150,
        }
    }
}

/// Result of the random decisions made while resolving a power.
///
/// Replaying a change applies these values instead of drawing new ones.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerOutcome {
    /// The power made no random decisions.
    Resolved,
    /// Heights rolled for every tile in the burrow area.
    Burrow {
        /// Height assigned to each tile.
        elevations: Vec<TileElevation>,
    },
    /// Tile the actor floated to, absent when no tile was free.
    Float {
        /// Destination of the actor.
        destination: Option<BoardPosition>,
    },
    /// Tiles assigned to every shuffled piece.
    Scramble {
        /// Final tile of each piece in the scramble area.
        placements: Vec<PiecePlacement>,
    },
    /// Tile at the centre of a missile strike, absent on an empty board.
    MissileStrike {
        /// Centre of the blast.
        center: Option<BoardPosition>,
    },
    /// Piece brought into play, absent when no tile was free.
    Respawn {
        /// Identity and tile of the spawned piece.
        spawned: Option<PiecePlacement>,
    },
}

impl PowerOutcome {
    fn estimated_duration_ms(&self) -> u32 {
        match self {
            Self::Resolved => 200,
            Self::Burrow { elevations } => 100_u32.saturating_mul(count_u32(elevations.len())),
            Self::Float { .. } => 600,
            Self::Scramble { placements } => 300_u32.saturating_add(
                50_u32.saturating_mul(count_u32(placements.len())),
            ),
            Self::MissileStrike { .. } => 900,
            Self::Respawn { .. } => 400,
        }
    }
}

/// Height assigned to a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileElevation {
    /// Tile whose height changed.
    pub position: BoardPosition,
    /// Height after the change.
    pub height: Height,
}

/// Tile assigned to a piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PiecePlacement {
    /// Placed piece.
    pub piece: PieceId,
    /// Tile the piece occupies.
    pub position: BoardPosition,
}

/// Orb seeded onto a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrbPlacement {
    /// Tile hosting the orb.
    pub position: BoardPosition,
    /// Power granted to the collector.
    pub power: PowerType,
}

fn count_u32(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}
