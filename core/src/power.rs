//! Power catalog: every power kind, its targeting category and directional scope.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Named abilities a piece can stockpile and later activate.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum PowerKind {
    /// Kills targeted enemies and turns their tiles to acid.
    Acidic,
    /// Kills targeted enemies.
    Destroy,
    /// Blocks targeted enemies from collecting orbs.
    Inhibit,
    /// Makes the actor immune to attacks.
    JumpProof,
    /// Copies the inventories of targeted allies into the actor.
    Learn,
    /// Lowers the actor's tile by one level.
    LowerTile,
    /// Raises the actor's tile by one level.
    RaiseTile,
    /// Unlocks diagonal movement for the actor.
    MoveDiagonal,
    /// Drains the inventories of targeted enemies into the actor.
    Pilfer,
    /// Copies the actor's inventory into targeted allies.
    Teach,
    /// Drops targeted tiles to the lowest level.
    Trench,
    /// Lifts targeted tiles to the highest level.
    Wall,
    /// Arms targeted enemies to die after their next move.
    Tripwire,
    /// Lets the actor ignore the height rule.
    ClimbTile,
    /// Assigns random heights to targeted tiles.
    Burrow,
    /// Relocates the actor to a random free tile.
    Float,
    /// Shuffles the targeted pieces of both teams among their tiles.
    Scramble,
    /// Strikes a random tile, killing every piece around it.
    MissileStrike,
    /// Brings a new piece into play for the actor's team.
    Respawn,
    /// Converts targeted enemies to the actor's team.
    Recruit,
}

/// Which entities a power affects once its target area is resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PowerCategory {
    /// Pieces of the opposing team.
    Offensive,
    /// Pieces of the actor's own team, excluding the actor.
    Supportive,
    /// Tiles, including the actor's own.
    Terrain,
    /// Pieces of both teams, including the actor.
    Chaos,
    /// Only the actor.
    Personal,
}

impl PowerKind {
    /// Every power kind in catalog order.
    pub const ALL: [PowerKind; 20] = [
        PowerKind::Acidic,
        PowerKind::Destroy,
        PowerKind::Inhibit,
        PowerKind::JumpProof,
        PowerKind::Learn,
        PowerKind::LowerTile,
        PowerKind::RaiseTile,
        PowerKind::MoveDiagonal,
        PowerKind::Pilfer,
        PowerKind::Teach,
        PowerKind::Trench,
        PowerKind::Wall,
        PowerKind::Tripwire,
        PowerKind::ClimbTile,
        PowerKind::Burrow,
        PowerKind::Float,
        PowerKind::Scramble,
        PowerKind::MissileStrike,
        PowerKind::Respawn,
        PowerKind::Recruit,
    ];

    /// Target category used when resolving the power's area.
    #[must_use]
    pub const fn category(self) -> PowerCategory {
        match self {
            Self::Acidic
            | Self::Destroy
            | Self::Inhibit
            | Self::Pilfer
            | Self::Tripwire
            | Self::Recruit => PowerCategory::Offensive,
            Self::Learn | Self::Teach => PowerCategory::Supportive,
            Self::Trench | Self::Wall | Self::Burrow => PowerCategory::Terrain,
            Self::Scramble | Self::MissileStrike => PowerCategory::Chaos,
            Self::JumpProof
            | Self::LowerTile
            | Self::RaiseTile
            | Self::MoveDiagonal
            | Self::ClimbTile
            | Self::Float
            | Self::Respawn => PowerCategory::Personal,
        }
    }

    /// Reports whether the power carries a direction.
    ///
    /// Missile strikes pick their own target, so they are exempt even though
    /// they affect both teams.
    #[must_use]
    pub const fn is_directional(self) -> bool {
        match self.category() {
            PowerCategory::Offensive | PowerCategory::Supportive | PowerCategory::Terrain => true,
            PowerCategory::Chaos => matches!(self, Self::Scramble),
            PowerCategory::Personal => false,
        }
    }

    /// Reports whether resolving the power consumes random draws.
    #[must_use]
    pub const fn is_random(self) -> bool {
        matches!(
            self,
            Self::Burrow | Self::Float | Self::Scramble | Self::MissileStrike | Self::Respawn
        )
    }
}

impl fmt::Display for PowerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Acidic => "Acidic",
            Self::Destroy => "Destroy",
            Self::Inhibit => "Inhibit",
            Self::JumpProof => "Jump Proof",
            Self::Learn => "Learn",
            Self::LowerTile => "Lower Tile",
            Self::RaiseTile => "Raise Tile",
            Self::MoveDiagonal => "Move Diagonal",
            Self::Pilfer => "Pilfer",
            Self::Teach => "Teach",
            Self::Trench => "Trench",
            Self::Wall => "Wall",
            Self::Tripwire => "Tripwire",
            Self::ClimbTile => "Climb Tile",
            Self::Burrow => "Burrow",
            Self::Float => "Float",
            Self::Scramble => "Scramble",
            Self::MissileStrike => "Missile Strike",
            Self::Respawn => "Respawn",
            Self::Recruit => "Recruit",
        };
        f.write_str(name)
    }
}

/// Shape of the area a directional power covers.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum PowerDirection {
    /// The 3×3 neighbourhood around the actor.
    Radius,
    /// The actor's entire row.
    Row,
    /// The actor's entire column.
    Column,
}

impl PowerDirection {
    /// Every direction in catalog order.
    pub const ALL: [PowerDirection; 3] = [
        PowerDirection::Radius,
        PowerDirection::Row,
        PowerDirection::Column,
    ];
}

impl fmt::Display for PowerDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Radius => f.write_str("Radius"),
            Self::Row => f.write_str("Row"),
            Self::Column => f.write_str("Column"),
        }
    }
}

/// A power kind paired with its direction, if the kind takes one.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct PowerType {
    kind: PowerKind,
    direction: Option<PowerDirection>,
}

impl PowerType {
    /// Creates a directional power.
    ///
    /// The direction is discarded for direction-exempt kinds so equality stays
    /// structural across both clients.
    #[must_use]
    pub const fn directed(kind: PowerKind, direction: PowerDirection) -> Self {
        if kind.is_directional() {
            Self {
                kind,
                direction: Some(direction),
            }
        } else {
            Self {
                kind,
                direction: None,
            }
        }
    }

    /// Creates a direction-exempt power.
    ///
    /// Directional kinds fall back to [`PowerDirection::Radius`].
    #[must_use]
    pub const fn undirected(kind: PowerKind) -> Self {
        Self::directed(kind, PowerDirection::Radius)
    }

    /// Kind of the power.
    #[must_use]
    pub const fn kind(&self) -> PowerKind {
        self.kind
    }

    /// Direction of the power, absent for direction-exempt kinds.
    #[must_use]
    pub const fn direction(&self) -> Option<PowerDirection> {
        self.direction
    }

    /// Every valid power type: directional kinds once per direction, exempt kinds once.
    #[must_use]
    pub fn catalog() -> Vec<PowerType> {
        PowerKind::ALL
            .iter()
            .flat_map(|&kind| {
                let directions: &'static [PowerDirection] = if kind.is_directional() {
                    &PowerDirection::ALL
                } else {
                    &[PowerDirection::Radius]
                };
                directions
                    .iter()
                    .map(move |&direction| PowerType::directed(kind, direction))
            })
            .collect()
    }
}

impl fmt::Display for PowerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            Some(direction) => write!(f, "{} {}", self.kind, direction),
            None => write!(f, "{}", self.kind),
        }
    }
}
