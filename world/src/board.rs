//! Tile storage with position-indexed lookup and an incrementally maintained free set.

use torus_core::{
    BoardPosition, ContractViolation, Height, PieceId, PowerType, TileDescription, TileStatus,
};

/// A single board tile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tile {
    position: BoardPosition,
    height: Height,
    status: TileStatus,
    occupant: Option<PieceId>,
    orb: Option<PowerType>,
}

impl Tile {
    fn new(position: BoardPosition) -> Self {
        Self {
            position,
            height: Height::default(),
            status: TileStatus::Normal,
            occupant: None,
            orb: None,
        }
    }

    /// Location of the tile.
    #[must_use]
    pub const fn position(&self) -> BoardPosition {
        self.position
    }

    /// Elevation of the tile.
    #[must_use]
    pub const fn height(&self) -> Height {
        self.height
    }

    /// Surface condition of the tile.
    #[must_use]
    pub const fn status(&self) -> TileStatus {
        self.status
    }

    /// Reports whether the tile turned to acid.
    #[must_use]
    pub fn is_acid(&self) -> bool {
        self.status == TileStatus::Acid
    }

    /// Piece standing on the tile. The piece's own position is authoritative.
    #[must_use]
    pub const fn occupant(&self) -> Option<PieceId> {
        self.occupant
    }

    /// Reward of the orb waiting on the tile.
    #[must_use]
    pub const fn orb(&self) -> Option<PowerType> {
        self.orb
    }

    /// Persistable description of the tile.
    #[must_use]
    pub fn describe(&self) -> TileDescription {
        TileDescription {
            position: self.position,
            height: self.height,
            status: self.status,
            orb: self.orb,
        }
    }

    pub(crate) fn set_height(&mut self, height: Height) {
        self.height = height;
    }

    pub(crate) fn acidify(&mut self) {
        self.status = TileStatus::Acid;
        self.orb = None;
    }

    pub(crate) fn place_orb(&mut self, power: PowerType) -> bool {
        if self.is_acid() {
            return false;
        }
        self.orb = Some(power);
        true
    }

    pub(crate) fn take_orb(&mut self) -> Option<PowerType> {
        self.orb.take()
    }
}

/// Fixed-size grid of tiles stored in row-major order.
#[derive(Clone, Debug)]
pub struct Board {
    columns: u32,
    rows: u32,
    tiles: Vec<Tile>,
    free: FreeTiles,
}

impl Board {
    pub(crate) fn new(columns: u32, rows: u32) -> Self {
        let capacity_u64 = u64::from(columns) * u64::from(rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        let mut tiles = Vec::with_capacity(capacity);
        for row in 0..rows {
            for column in 0..columns {
                tiles.push(Tile::new(BoardPosition::new(column, row)));
            }
        }
        let free = FreeTiles::filled(&tiles, columns);
        Self {
            columns,
            rows,
            tiles,
            free,
        }
    }

    /// Number of tile columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of tile rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Looks up the tile at the provided coordinates.
    #[must_use]
    pub fn tile(&self, column: u32, row: u32) -> Option<&Tile> {
        self.tile_at(BoardPosition::new(column, row))
    }

    /// Looks up the tile at the provided position.
    #[must_use]
    pub fn tile_at(&self, position: BoardPosition) -> Option<&Tile> {
        self.index(position).and_then(|index| self.tiles.get(index))
    }

    /// Iterator over every tile in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    /// Positions of every tile without an occupant, in no particular order.
    #[must_use]
    pub fn unoccupied(&self) -> &[BoardPosition] {
        &self.free.slots
    }

    /// Unoccupied tiles that may receive an orb or an arriving piece.
    #[must_use]
    pub fn orb_candidates(&self) -> Vec<BoardPosition> {
        self.free
            .slots
            .iter()
            .copied()
            .filter(|position| {
                self.tile_at(*position)
                    .is_some_and(|tile| !tile.is_acid() && tile.orb.is_none())
            })
            .collect()
    }

    /// Unoccupied tiles that are not acid, regardless of orbs.
    #[must_use]
    pub fn open_tiles(&self) -> Vec<BoardPosition> {
        self.free
            .slots
            .iter()
            .copied()
            .filter(|position| self.tile_at(*position).is_some_and(|tile| !tile.is_acid()))
            .collect()
    }

    /// Reports whether the position lies on the board.
    #[must_use]
    pub fn contains(&self, position: BoardPosition) -> bool {
        position.column() < self.columns && position.row() < self.rows
    }

    pub(crate) fn tile_mut(
        &mut self,
        position: BoardPosition,
        operation: &'static str,
    ) -> Result<&mut Tile, ContractViolation> {
        let index = self
            .index(position)
            .ok_or(ContractViolation::MissingTile {
                operation,
                position,
            })?;
        self.tiles
            .get_mut(index)
            .ok_or(ContractViolation::MissingTile {
                operation,
                position,
            })
    }

    pub(crate) fn occupy(
        &mut self,
        position: BoardPosition,
        piece: PieceId,
        operation: &'static str,
    ) -> Result<(), ContractViolation> {
        let index = self
            .index(position)
            .ok_or(ContractViolation::MissingTile {
                operation,
                position,
            })?;
        let tile = &mut self.tiles[index];
        if tile.occupant.is_some() {
            return Err(ContractViolation::TileOccupied {
                operation,
                position,
            });
        }
        tile.occupant = Some(piece);
        self.free.remove(index);
        Ok(())
    }

    pub(crate) fn vacate(&mut self, position: BoardPosition) -> Option<PieceId> {
        let index = self.index(position)?;
        let occupant = self.tiles[index].occupant.take();
        if occupant.is_some() {
            self.free.insert(index, position);
        }
        occupant
    }

    pub(crate) fn replace_occupant(&mut self, position: BoardPosition, piece: PieceId) {
        if let Some(index) = self.index(position) {
            if self.tiles[index].occupant.is_some() {
                self.tiles[index].occupant = Some(piece);
            }
        }
    }

    fn index(&self, position: BoardPosition) -> Option<usize> {
        if !self.contains(position) {
            return None;
        }
        let row = usize::try_from(position.row()).ok()?;
        let column = usize::try_from(position.column()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        Some(row * width + column)
    }
}

/// Dense set of unoccupied positions with O(1) insertion and removal.
#[derive(Clone, Debug)]
struct FreeTiles {
    columns: usize,
    slots: Vec<BoardPosition>,
    slot_of_tile: Vec<Option<usize>>,
}

impl FreeTiles {
    fn filled(tiles: &[Tile], columns: u32) -> Self {
        Self {
            columns: usize::try_from(columns).unwrap_or(0),
            slots: tiles.iter().map(Tile::position).collect(),
            slot_of_tile: (0..tiles.len()).map(Some).collect(),
        }
    }

    fn insert(&mut self, tile_index: usize, position: BoardPosition) {
        if self.slot_of_tile[tile_index].is_some() {
            return;
        }
        self.slot_of_tile[tile_index] = Some(self.slots.len());
        self.slots.push(position);
    }

    fn remove(&mut self, tile_index: usize) {
        let Some(slot) = self.slot_of_tile[tile_index].take() else {
            return;
        };
        let _ = self.slots.swap_remove(slot);
        let moved = self.slots.get(slot).copied();
        if let Some(moved_index) = moved.and_then(|position| self.tile_index(position)) {
            self.slot_of_tile[moved_index] = Some(slot);
        }
    }

    fn tile_index(&self, position: BoardPosition) -> Option<usize> {
        let row = usize::try_from(position.row()).ok()?;
        let column = usize::try_from(position.column()).ok()?;
        Some(row * self.columns + column)
    }
}
