//! Serializable descriptions of the board at a turn boundary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    Attributes, BoardPosition, Change, Height, PieceId, PowerType, Team, TileStatus,
};

/// Persisted state of a single tile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileDescription {
    /// Location of the tile.
    pub position: BoardPosition,
    /// Elevation of the tile.
    pub height: Height,
    /// Surface condition of the tile.
    pub status: TileStatus,
    /// Reward of the orb waiting on the tile, if any.
    pub orb: Option<PowerType>,
}

/// Persisted state of a single piece.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceDescription {
    /// Stable identity of the piece.
    pub id: PieceId,
    /// Tile the piece occupies.
    pub position: BoardPosition,
    /// Stacks held per power type; every count is positive.
    pub powers: BTreeMap<PowerType, u32>,
    /// Status attributes of the piece.
    pub attributes: Attributes,
}

/// Persisted roster of a team.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamDescription {
    /// Live pieces ordered by number.
    pub pieces: Vec<PieceDescription>,
    /// Number the team will allocate to its next piece.
    pub next_number: u32,
}

/// Complete board and roster state at one turn boundary.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardState {
    /// Number of tile columns.
    pub columns: u32,
    /// Number of tile rows.
    pub rows: u32,
    /// Every tile in row-major order.
    pub tiles: Vec<TileDescription>,
    /// Roster of [`Team::One`].
    pub team_one: TeamDescription,
    /// Roster of [`Team::Two`].
    pub team_two: TeamDescription,
}

impl BoardState {
    /// Roster of the provided team.
    #[must_use]
    pub const fn team(&self, team: Team) -> &TeamDescription {
        match team {
            Team::One => &self.team_one,
            Team::Two => &self.team_two,
        }
    }

    /// Reports whether the state describes no board at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

/// Authoritative description of one turn exchanged between clients.
///
/// The pre-turn board is the baseline the receiver replays `changes` against;
/// the post-turn board is the committed result it must arrive at.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// Number of committed turns, including this one.
    pub turn: u32,
    /// Set while the snapshot carries the first turn of the match.
    pub first_move: bool,
    /// Identifier of the player controlling [`Team::One`].
    pub player_one: Option<String>,
    /// Identifier of the player controlling [`Team::Two`].
    pub player_two: Option<String>,
    /// Team that acts next.
    pub current_team: Team,
    /// Surviving team once the match is decided.
    pub winner: Option<Team>,
    /// Score of [`Team::One`].
    pub score_one: u32,
    /// Score of [`Team::Two`].
    pub score_two: u32,
    /// Board before the turn's changes were applied.
    pub pre_turn: BoardState,
    /// Board after the turn's changes were applied.
    pub post_turn: BoardState,
    /// Ordered effects of the turn.
    pub changes: Vec<Change>,
}

impl GameSnapshot {
    /// Reports whether the snapshot carries no match, as produced by decode fallbacks.
    #[must_use]
    pub fn is_fresh(&self) -> bool {
        self.post_turn.is_empty()
    }

    /// Score of the provided team.
    #[must_use]
    pub const fn score(&self, team: Team) -> u32 {
        match team {
            Team::One => self.score_one,
            Team::Two => self.score_two,
        }
    }
}
