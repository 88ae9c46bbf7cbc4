#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Torus engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and the rule systems. Adapters submit [`Command`]
//! values describing player intent, the turn orchestrator resolves them
//! against the world, and every resolved effect is broadcast as an [`Event`]
//! for presentation layers to animate. Effects that mutate game state are also
//! captured as [`Change`] records so the opposing client can reproduce the
//! turn without re-running any randomness.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

mod change;
mod error;
mod power;
mod random;
mod snapshot;

pub use change::{Change, ChangeKind, OrbPlacement, PiecePlacement, PowerOutcome, TileElevation};
pub use error::ContractViolation;
pub use power::{PowerCategory, PowerDirection, PowerKind, PowerType};
pub use random::{RandomSource, ScriptedRandom};
pub use snapshot::{BoardState, GameSnapshot, PieceDescription, TeamDescription, TileDescription};

/// Largest stack of a single power type a piece may hold before it overloads.
pub const MAX_POWER_STACK: u32 = 20;

/// Orbs are seeded on every turn number divisible by this interval.
pub const ORB_INTERVAL: u32 = 10;

/// One in this many orb candidate tiles receives an orb when orbs are seeded.
pub const ORB_FRACTION: usize = 5;

/// Identifies one of the two sides playing a match.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Team {
    /// Side that takes the opening turn.
    #[default]
    One,
    /// Side that responds to the opening turn.
    Two,
}

impl Team {
    /// Both teams in turn order.
    pub const ALL: [Team; 2] = [Team::One, Team::Two];

    /// Returns the opposing team.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::One,
        }
    }

    /// Dense index suitable for per-team arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::One => 0,
            Self::Two => 1,
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One => write!(f, "team one"),
            Self::Two => write!(f, "team two"),
        }
    }
}

/// Stable identity of a piece: its team plus the sequence number it was created with.
///
/// Numbers are allocated per team and never reused, so the identity remains a
/// valid join key for every change recorded during a match.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct PieceId {
    team: Team,
    number: u32,
}

impl PieceId {
    /// Creates a piece identity from its team and sequence number.
    #[must_use]
    pub const fn new(team: Team, number: u32) -> Self {
        Self { team, number }
    }

    /// Team owning the piece.
    #[must_use]
    pub const fn team(&self) -> Team {
        self.team
    }

    /// Sequence number allocated when the piece was created.
    #[must_use]
    pub const fn number(&self) -> u32 {
        self.number
    }
}

impl fmt::Display for PieceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.team, self.number)
    }
}

/// Location of a single board tile expressed as column and row coordinates.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct BoardPosition {
    column: u32,
    row: u32,
}

impl BoardPosition {
    /// Creates a new board position.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two positions.
    #[must_use]
    pub fn manhattan_distance(self, other: BoardPosition) -> u32 {
        self.column.abs_diff(other.column) + self.row.abs_diff(other.row)
    }

    /// Computes the Chebyshev (king-move) distance between two positions.
    #[must_use]
    pub fn chebyshev_distance(self, other: BoardPosition) -> u32 {
        self.column
            .abs_diff(other.column)
            .max(self.row.abs_diff(other.row))
    }

    /// Reports whether `other` is one of the four edge-sharing neighbours.
    #[must_use]
    pub fn is_cardinal_neighbor(self, other: BoardPosition) -> bool {
        self.manhattan_distance(other) == 1
    }

    /// Reports whether `other` touches this position only at a corner.
    #[must_use]
    pub fn is_diagonal_neighbor(self, other: BoardPosition) -> bool {
        self.column.abs_diff(other.column) == 1 && self.row.abs_diff(other.row) == 1
    }
}

impl fmt::Display for BoardPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

/// Discrete elevation of a tile, ordered from lowest to highest.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Height {
    /// Bottom of the range; trenches dig down to this level.
    Lowest,
    /// One level above the bottom.
    Low,
    /// Neutral starting elevation.
    #[default]
    Middle,
    /// One level below the top.
    High,
    /// Top of the range; walls raise tiles to this level.
    Highest,
}

impl Height {
    /// Every level in ascending order.
    pub const LEVELS: [Height; 5] = [
        Height::Lowest,
        Height::Low,
        Height::Middle,
        Height::High,
        Height::Highest,
    ];

    /// Zero-based level index, `0` being [`Height::Lowest`].
    #[must_use]
    pub const fn level(self) -> u8 {
        match self {
            Self::Lowest => 0,
            Self::Low => 1,
            Self::Middle => 2,
            Self::High => 3,
            Self::Highest => 4,
        }
    }

    /// Looks up the height with the provided level index.
    #[must_use]
    pub fn from_level(level: u8) -> Option<Self> {
        Self::LEVELS.get(usize::from(level)).copied()
    }

    /// One level higher, saturating at [`Height::Highest`].
    #[must_use]
    pub fn raised(self) -> Self {
        Self::from_level(self.level().saturating_add(1)).unwrap_or(Self::Highest)
    }

    /// One level lower, saturating at [`Height::Lowest`].
    #[must_use]
    pub fn lowered(self) -> Self {
        self.level()
            .checked_sub(1)
            .and_then(Self::from_level)
            .unwrap_or(Self::Lowest)
    }

    /// Number of levels `other` sits below `self`; zero when it is level or above.
    #[must_use]
    pub const fn drop_to(self, other: Height) -> u8 {
        self.level().saturating_sub(other.level())
    }
}

/// Surface condition of a tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileStatus {
    /// Regular ground that pieces may enter.
    #[default]
    Normal,
    /// Permanently corroded ground; impassable and never hosts orbs.
    Acid,
}

/// Binary status attributes a piece may carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeKind {
    /// Diagonal neighbours become legal destinations.
    Diagonal,
    /// The height rule no longer restricts movement.
    Climb,
    /// Enemies can no longer attack the piece.
    JumpProof,
    /// Orb pickups are blocked until the piece's team closes its next turn.
    Inhibited,
    /// The piece dies after its next completed move.
    Tripwired,
}

/// Set of attributes held by a piece.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attributes {
    /// Diagonal movement unlocked.
    pub diagonal: bool,
    /// Tile climbing unlocked.
    pub climb: bool,
    /// Immune to attacks.
    pub jump_proof: bool,
    /// Orb pickup blocked for the current turn cycle.
    pub inhibited: bool,
    /// Armed to kill the piece after its next move.
    pub tripwired: bool,
}

impl Attributes {
    /// Reports whether the attribute is present.
    #[must_use]
    pub const fn has(&self, kind: AttributeKind) -> bool {
        match kind {
            AttributeKind::Diagonal => self.diagonal,
            AttributeKind::Climb => self.climb,
            AttributeKind::JumpProof => self.jump_proof,
            AttributeKind::Inhibited => self.inhibited,
            AttributeKind::Tripwired => self.tripwired,
        }
    }

    /// Sets the attribute, returning `true` when it was not already present.
    pub fn grant(&mut self, kind: AttributeKind) -> bool {
        let slot = match kind {
            AttributeKind::Diagonal => &mut self.diagonal,
            AttributeKind::Climb => &mut self.climb,
            AttributeKind::JumpProof => &mut self.jump_proof,
            AttributeKind::Inhibited => &mut self.inhibited,
            AttributeKind::Tripwired => &mut self.tripwired,
        };
        let newly_granted = !*slot;
        *slot = true;
        newly_granted
    }

    /// Copy of the attributes with the per-turn effects removed.
    #[must_use]
    pub const fn without_transient(self) -> Self {
        Self {
            inhibited: false,
            tripwired: false,
            ..self
        }
    }
}

/// Outcome category of moving a piece onto a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveType {
    /// The destination cannot be entered.
    Invalid,
    /// Plain relocation onto an empty tile.
    Normal,
    /// The destination holds an enemy that will be killed.
    Attack,
    /// The destination holds an orb the piece will collect.
    OrbPickup,
}

impl MoveType {
    /// Reports whether the move may be performed.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        !matches!(self, Self::Invalid)
    }
}

/// Reason a piece was removed from play.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KillCause {
    /// Defeated by an attacking move.
    Attack,
    /// Dissolved by an acidic power; the tile turned to acid.
    Acid,
    /// Removed by a destroy power.
    Destroy,
    /// Triggered a tripwire by moving.
    Tripwire,
    /// Overloaded by holding more than [`MAX_POWER_STACK`] of a power.
    Overflow,
    /// Caught in the blast of a missile strike.
    MissileStrike,
}

/// Commands that express player intent during a local turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Requests selection of a piece owned by the acting team.
    SelectPiece {
        /// Identity of the piece to select.
        piece: PieceId,
    },
    /// Requests moving the selected piece onto a tile.
    SelectTile {
        /// Destination tile.
        position: BoardPosition,
    },
    /// Requests activation of a power held by the selected piece.
    ActivatePower {
        /// Power to activate.
        power: PowerType,
    },
    /// Clears the current selection.
    Deselect,
    /// Closes the turn without moving.
    EndTurn,
}

/// Reasons a command was refused without touching game state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RejectionReason {
    /// The command came from a team that is not allowed to act right now.
    NotYourTurn,
    /// A remote turn is still being replayed.
    ReplayInProgress,
    /// The command requires a selected piece.
    NoPieceSelected,
    /// The movement resolver rejected the destination.
    InvalidMove,
    /// The selected piece does not hold the requested power.
    PowerNotHeld,
    /// The referenced piece does not exist.
    UnknownPiece,
    /// The match already has a winner.
    GameOver,
    /// The turn is closed and waits for the transport to accept it.
    AwaitingSubmission,
}

/// Events broadcast after resolving commands or replaying changes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A command was refused.
    InputRejected {
        /// Why the command was refused.
        reason: RejectionReason,
    },
    /// A piece became the active selection.
    PieceSelected {
        /// Selected piece.
        piece: PieceId,
        /// Destinations the piece may move to and how each move resolves.
        valid_moves: Vec<(BoardPosition, MoveType)>,
    },
    /// The active selection was cleared.
    PieceDeselected,
    /// A piece relocated between two tiles.
    PieceMoved {
        /// Piece that moved.
        piece: PieceId,
        /// Tile the piece left.
        from: BoardPosition,
        /// Tile the piece entered.
        to: BoardPosition,
    },
    /// A piece was removed from play.
    PieceKilled {
        /// Piece that died.
        piece: PieceId,
        /// Tile the piece occupied.
        position: BoardPosition,
        /// What killed the piece.
        cause: KillCause,
    },
    /// A new piece entered play.
    PieceCreated {
        /// Identity allocated to the piece.
        piece: PieceId,
        /// Tile the piece occupies.
        position: BoardPosition,
    },
    /// A piece changed sides, receiving a new identity.
    PieceConverted {
        /// Identity the piece held before conversion.
        from: PieceId,
        /// Identity allocated by the recruiting team.
        to: PieceId,
    },
    /// A piece spent one stack of a power.
    PowerActivated {
        /// Acting piece.
        piece: PieceId,
        /// Power that was spent.
        power: PowerType,
    },
    /// A piece's power inventory changed.
    PowersChanged {
        /// Piece whose inventory changed.
        piece: PieceId,
    },
    /// A piece gained an attribute.
    AttributeGranted {
        /// Piece that gained the attribute.
        piece: PieceId,
        /// Attribute that was granted.
        attribute: AttributeKind,
    },
    /// A tile changed height.
    TileHeightChanged {
        /// Affected tile.
        position: BoardPosition,
        /// Height after the change.
        height: Height,
    },
    /// A tile turned to acid.
    TileAcidified {
        /// Affected tile.
        position: BoardPosition,
    },
    /// An orb appeared on a tile.
    OrbPlaced {
        /// Tile hosting the orb.
        position: BoardPosition,
        /// Power granted to the collector.
        power: PowerType,
    },
    /// A piece collected an orb.
    OrbCollected {
        /// Collecting piece.
        piece: PieceId,
        /// Tile that hosted the orb.
        position: BoardPosition,
        /// Power granted by the orb.
        power: PowerType,
    },
    /// A turn was accepted by the transport or replayed from a remote client.
    TurnCommitted {
        /// Turn counter after the commit.
        turn: u32,
        /// Team that acts next.
        next_team: Team,
    },
    /// A team lost its last piece.
    GameWon {
        /// Surviving team.
        winner: Team,
    },
    /// Local state was reset to a fresh match.
    NewGame,
}

impl Event {
    /// Suggested animation length for presentation layers pacing the event stream.
    #[must_use]
    pub const fn suggested_duration(&self) -> Duration {
        match self {
            Self::PieceMoved { .. } => Duration::from_millis(300),
            Self::PieceKilled { .. } => Duration::from_millis(450),
            Self::PieceCreated { .. } | Self::PieceConverted { .. } => Duration::from_millis(400),
            Self::PowerActivated { .. } => Duration::from_millis(250),
            Self::TileHeightChanged { .. } | Self::TileAcidified { .. } => {
                Duration::from_millis(200)
            }
            Self::OrbPlaced { .. } | Self::OrbCollected { .. } => Duration::from_millis(150),
            Self::InputRejected { .. }
            | Self::PieceSelected { .. }
            | Self::PieceDeselected
            | Self::PowersChanged { .. }
            | Self::AttributeGranted { .. }
            | Self::TurnCommitted { .. }
            | Self::GameWon { .. }
            | Self::NewGame => Duration::ZERO,
        }
    }
}
