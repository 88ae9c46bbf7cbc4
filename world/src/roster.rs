//! Pieces and the per-team rosters that allocate their identities.

use std::collections::BTreeMap;

use torus_core::{Attributes, BoardPosition, PieceDescription, PieceId, PowerType, Team};

/// A team-owned unit occupying exactly one tile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Piece {
    pub(crate) id: PieceId,
    pub(crate) position: BoardPosition,
    pub(crate) powers: BTreeMap<PowerType, u32>,
    pub(crate) attributes: Attributes,
}

impl Piece {
    pub(crate) fn new(id: PieceId, position: BoardPosition) -> Self {
        Self {
            id,
            position,
            powers: BTreeMap::new(),
            attributes: Attributes::default(),
        }
    }

    /// Stable identity of the piece.
    #[must_use]
    pub const fn id(&self) -> PieceId {
        self.id
    }

    /// Team owning the piece.
    #[must_use]
    pub const fn team(&self) -> Team {
        self.id.team()
    }

    /// Tile the piece occupies.
    #[must_use]
    pub const fn position(&self) -> BoardPosition {
        self.position
    }

    /// Stacks held per power type.
    #[must_use]
    pub const fn powers(&self) -> &BTreeMap<PowerType, u32> {
        &self.powers
    }

    /// Number of stacks held of the provided power.
    #[must_use]
    pub fn power_count(&self, power: PowerType) -> u32 {
        self.powers.get(&power).copied().unwrap_or(0)
    }

    /// Reports whether at least one stack of the power is held.
    #[must_use]
    pub fn holds(&self, power: PowerType) -> bool {
        self.power_count(power) > 0
    }

    /// Status attributes of the piece.
    #[must_use]
    pub const fn attributes(&self) -> Attributes {
        self.attributes
    }

    /// Persistable description of the piece.
    #[must_use]
    pub fn describe(&self) -> PieceDescription {
        PieceDescription {
            id: self.id,
            position: self.position,
            powers: self.powers.clone(),
            attributes: self.attributes,
        }
    }
}

/// Live pieces of one team plus its identity counter.
#[derive(Clone, Debug)]
pub(crate) struct TeamRoster {
    team: Team,
    pieces: BTreeMap<u32, Piece>,
    next_number: u32,
}

impl TeamRoster {
    pub(crate) fn new(team: Team) -> Self {
        Self {
            team,
            pieces: BTreeMap::new(),
            next_number: 0,
        }
    }

    pub(crate) fn with_next_number(team: Team, next_number: u32) -> Self {
        Self {
            team,
            pieces: BTreeMap::new(),
            next_number,
        }
    }

    pub(crate) const fn next_number(&self) -> u32 {
        self.next_number
    }

    pub(crate) fn allocate(&mut self) -> PieceId {
        let id = PieceId::new(self.team, self.next_number);
        self.next_number = self.next_number.saturating_add(1);
        id
    }

    pub(crate) fn insert(&mut self, piece: Piece) {
        let _ = self.pieces.insert(piece.id.number(), piece);
    }

    pub(crate) fn remove(&mut self, id: PieceId) -> Option<Piece> {
        self.pieces.remove(&id.number())
    }

    pub(crate) fn get(&self, id: PieceId) -> Option<&Piece> {
        self.pieces.get(&id.number())
    }

    pub(crate) fn get_mut(&mut self, id: PieceId) -> Option<&mut Piece> {
        self.pieces.get_mut(&id.number())
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Piece> {
        self.pieces.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Piece> {
        self.pieces.values_mut()
    }

    pub(crate) fn len(&self) -> usize {
        self.pieces.len()
    }
}
