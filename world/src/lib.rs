#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative board and roster state for Torus.
//!
//! The world owns every tile and piece. Rule systems read it through the
//! [`query`] module and mutate it exclusively through the primitives on
//! [`World`], each of which reports what it did as [`Event`] values.

use std::collections::BTreeMap;

use torus_core::{
    AttributeKind, BoardPosition, BoardState, ContractViolation, Event, Height, KillCause,
    PieceId, PiecePlacement, PowerType, Team, TeamDescription, TileStatus, MAX_POWER_STACK,
};
use tracing::debug;

mod board;
mod roster;

pub use board::{Board, Tile};
pub use roster::Piece;

use roster::TeamRoster;

/// Represents the authoritative Torus board, both rosters and the score.
#[derive(Clone, Debug)]
pub struct World {
    board: Board,
    rosters: [TeamRoster; 2],
    scores: [u32; 2],
}

impl World {
    /// Creates an empty world with flat, normal tiles.
    #[must_use]
    pub fn new(columns: u32, rows: u32) -> Self {
        Self {
            board: Board::new(columns, rows),
            rosters: [TeamRoster::new(Team::One), TeamRoster::new(Team::Two)],
            scores: [0, 0],
        }
    }

    /// Rebuilds a world from a persisted board description.
    ///
    /// Scores are not part of the board description and start at zero.
    pub fn from_state(state: &BoardState) -> Result<Self, ContractViolation> {
        let expected = u64::from(state.columns) * u64::from(state.rows);
        if u64::try_from(state.tiles.len()).ok() != Some(expected) {
            return Err(ContractViolation::MalformedSnapshot {
                reason: format!(
                    "{}x{} board lists {} tiles",
                    state.columns,
                    state.rows,
                    state.tiles.len()
                ),
            });
        }

        let mut world = Self::new(state.columns, state.rows);
        for description in &state.tiles {
            let tile = world.board.tile_mut(description.position, "load tile")?;
            tile.set_height(description.height);
            if description.status == TileStatus::Acid {
                tile.acidify();
            }
            if let Some(power) = description.orb {
                if !tile.place_orb(power) {
                    return Err(ContractViolation::MalformedSnapshot {
                        reason: format!("orb on acid tile {}", description.position),
                    });
                }
            }
        }

        for team in Team::ALL {
            let description = state.team(team);
            world.rosters[team.index()] = world.load_roster(team, description)?;
        }
        Ok(world)
    }

    fn load_roster(
        &mut self,
        team: Team,
        description: &TeamDescription,
    ) -> Result<TeamRoster, ContractViolation> {
        let mut roster = TeamRoster::with_next_number(team, description.next_number);
        for piece in &description.pieces {
            if piece.id.team() != team || piece.id.number() >= description.next_number {
                return Err(ContractViolation::MalformedSnapshot {
                    reason: format!("piece {} listed in the roster of {team}", piece.id),
                });
            }
            if piece.powers.values().any(|count| *count == 0) {
                return Err(ContractViolation::MalformedSnapshot {
                    reason: format!("piece {} holds an empty power stack", piece.id),
                });
            }
            self.board.occupy(piece.position, piece.id, "load piece")?;
            roster.insert(Piece {
                id: piece.id,
                position: piece.position,
                powers: piece.powers.clone(),
                attributes: piece.attributes,
            });
        }
        Ok(roster)
    }

    /// Captures the persistable board description.
    #[must_use]
    pub fn capture(&self) -> BoardState {
        let describe_team = |team: Team| {
            let roster = &self.rosters[team.index()];
            TeamDescription {
                pieces: roster.iter().map(Piece::describe).collect(),
                next_number: roster.next_number(),
            }
        };
        BoardState {
            columns: self.board.columns(),
            rows: self.board.rows(),
            tiles: self.board.tiles().map(Tile::describe).collect(),
            team_one: describe_team(Team::One),
            team_two: describe_team(Team::Two),
        }
    }

    /// Overwrites both team scores.
    pub fn set_scores(&mut self, scores: [u32; 2]) {
        self.scores = scores;
    }

    /// Places a new piece for `team` on a free tile.
    pub fn spawn_piece(
        &mut self,
        team: Team,
        position: BoardPosition,
        out_events: &mut Vec<Event>,
    ) -> Result<PieceId, ContractViolation> {
        let roster = &mut self.rosters[team.index()];
        let id = PieceId::new(team, roster.next_number());
        self.board.occupy(position, id, "spawn piece")?;
        let allocated = roster.allocate();
        roster.insert(Piece::new(allocated, position));
        out_events.push(Event::PieceCreated {
            piece: allocated,
            position,
        });
        Ok(allocated)
    }

    /// Moves a piece onto a free tile, returning the tile it left.
    pub fn relocate_piece(
        &mut self,
        piece: PieceId,
        to: BoardPosition,
        out_events: &mut Vec<Event>,
    ) -> Result<BoardPosition, ContractViolation> {
        let from = self.piece_ref(piece, "relocate piece")?.position;
        if from == to {
            return Ok(from);
        }
        self.board.occupy(to, piece, "relocate piece")?;
        let _ = self.board.vacate(from);
        self.piece_mut(piece, "relocate piece")?.position = to;
        out_events.push(Event::PieceMoved { piece, from, to });
        Ok(from)
    }

    /// Reassigns several pieces to new tiles at once, allowing them to swap places.
    pub fn rearrange(
        &mut self,
        placements: &[PiecePlacement],
        out_events: &mut Vec<Event>,
    ) -> Result<(), ContractViolation> {
        let mut origins = Vec::with_capacity(placements.len());
        for placement in placements {
            origins.push(self.piece_ref(placement.piece, "rearrange pieces")?.position);
        }
        for origin in &origins {
            let _ = self.board.vacate(*origin);
        }
        for (placement, from) in placements.iter().zip(origins) {
            self.board
                .occupy(placement.position, placement.piece, "rearrange pieces")?;
            self.piece_mut(placement.piece, "rearrange pieces")?.position = placement.position;
            if from != placement.position {
                out_events.push(Event::PieceMoved {
                    piece: placement.piece,
                    from,
                    to: placement.position,
                });
            }
        }
        Ok(())
    }

    /// Removes a piece from play and credits its opponent.
    pub fn kill_piece(
        &mut self,
        piece: PieceId,
        cause: KillCause,
        out_events: &mut Vec<Event>,
    ) -> Result<(), ContractViolation> {
        let removed = self.rosters[piece.team().index()]
            .remove(piece)
            .ok_or(ContractViolation::MissingPiece {
                operation: "kill piece",
                piece,
            })?;
        let _ = self.board.vacate(removed.position);
        let credited = piece.team().opponent().index();
        self.scores[credited] = self.scores[credited].saturating_add(1);
        debug!(%piece, position = %removed.position, ?cause, "piece killed");
        out_events.push(Event::PieceKilled {
            piece,
            position: removed.position,
            cause,
        });
        Ok(())
    }

    /// Moves a piece to the opposing team under a freshly allocated identity.
    ///
    /// The inventory and permanent attributes travel with the piece; transient
    /// effects are dropped.
    pub fn convert_piece(
        &mut self,
        piece: PieceId,
        out_events: &mut Vec<Event>,
    ) -> Result<PieceId, ContractViolation> {
        let removed = self.rosters[piece.team().index()]
            .remove(piece)
            .ok_or(ContractViolation::MissingPiece {
                operation: "convert piece",
                piece,
            })?;
        let roster = &mut self.rosters[piece.team().opponent().index()];
        let converted = roster.allocate();
        self.board.replace_occupant(removed.position, converted);
        roster.insert(Piece {
            id: converted,
            position: removed.position,
            powers: removed.powers,
            attributes: removed.attributes.without_transient(),
        });
        out_events.push(Event::PieceConverted {
            from: piece,
            to: converted,
        });
        Ok(converted)
    }

    /// Spends one stack of a power.
    pub fn take_power(&mut self, piece: PieceId, power: PowerType) -> Result<(), ContractViolation> {
        let held = &mut self.piece_mut(piece, "take power")?.powers;
        let Some(count) = held.get_mut(&power) else {
            return Err(ContractViolation::PowerNotHeld { piece, power });
        };
        *count = count.saturating_sub(1);
        if *count == 0 {
            let _ = held.remove(&power);
        }
        Ok(())
    }

    /// Empties a piece's inventory, returning what it held.
    pub fn drain_powers(
        &mut self,
        piece: PieceId,
        out_events: &mut Vec<Event>,
    ) -> Result<BTreeMap<PowerType, u32>, ContractViolation> {
        let drained = std::mem::take(&mut self.piece_mut(piece, "drain powers")?.powers);
        if !drained.is_empty() {
            out_events.push(Event::PowersChanged { piece });
        }
        Ok(drained)
    }

    /// Adds stacks of a single power to a piece. See [`World::grant_powers`].
    pub fn grant_power(
        &mut self,
        piece: PieceId,
        power: PowerType,
        count: u32,
        out_events: &mut Vec<Event>,
    ) -> Result<bool, ContractViolation> {
        let mut powers = BTreeMap::new();
        let _ = powers.insert(power, count);
        self.grant_powers(piece, &powers, out_events)
    }

    /// Merges stacks into a piece's inventory.
    ///
    /// When any resulting stack would exceed [`MAX_POWER_STACK`] the merge is
    /// discarded and the piece dies like an acid victim: it is killed and its
    /// tile turns to acid. Returns whether the piece survived.
    pub fn grant_powers(
        &mut self,
        piece: PieceId,
        powers: &BTreeMap<PowerType, u32>,
        out_events: &mut Vec<Event>,
    ) -> Result<bool, ContractViolation> {
        let holder = self.piece_ref(piece, "grant powers")?;
        let (position, held) = (holder.position, &holder.powers);
        let mut merged = held.clone();
        for (power, count) in powers.iter().filter(|(_, count)| **count > 0) {
            let slot = merged.entry(*power).or_insert(0);
            *slot = slot.saturating_add(*count);
        }
        if merged.values().any(|count| *count > MAX_POWER_STACK) {
            debug!(%piece, "power stack overflow");
            self.kill_piece(piece, KillCause::Overflow, out_events)?;
            self.acidify(position, out_events)?;
            return Ok(false);
        }
        if merged != *held {
            self.piece_mut(piece, "grant powers")?.powers = merged;
            out_events.push(Event::PowersChanged { piece });
        }
        Ok(true)
    }

    /// Sets an attribute on a piece.
    pub fn grant_attribute(
        &mut self,
        piece: PieceId,
        attribute: AttributeKind,
        out_events: &mut Vec<Event>,
    ) -> Result<(), ContractViolation> {
        if self
            .piece_mut(piece, "grant attribute")?
            .attributes
            .grant(attribute)
        {
            out_events.push(Event::AttributeGranted { piece, attribute });
        }
        Ok(())
    }

    /// Consumes an armed tripwire, returning whether one was armed.
    pub fn disarm_tripwire(&mut self, piece: PieceId) -> Result<bool, ContractViolation> {
        let attributes = &mut self.piece_mut(piece, "disarm tripwire")?.attributes;
        let armed = attributes.tripwired;
        attributes.tripwired = false;
        Ok(armed)
    }

    /// Lifts the orb-pickup block from every piece of a team.
    pub fn clear_inhibited(&mut self, team: Team) {
        for piece in self.rosters[team.index()].iter_mut() {
            piece.attributes.inhibited = false;
        }
    }

    /// Collects the orb under a piece, granting its reward.
    ///
    /// Returns the collected power, or `None` when the tile held no orb.
    pub fn collect_orb(
        &mut self,
        piece: PieceId,
        out_events: &mut Vec<Event>,
    ) -> Result<Option<PowerType>, ContractViolation> {
        let position = self.piece_ref(piece, "collect orb")?.position;
        let Some(power) = self.board.tile_mut(position, "collect orb")?.take_orb() else {
            return Ok(None);
        };
        out_events.push(Event::OrbCollected {
            piece,
            position,
            power,
        });
        let _ = self.grant_power(piece, power, 1, out_events)?;
        Ok(Some(power))
    }

    /// Forces a tile to the provided height.
    pub fn set_tile_height(
        &mut self,
        position: BoardPosition,
        height: Height,
        out_events: &mut Vec<Event>,
    ) -> Result<(), ContractViolation> {
        let tile = self.board.tile_mut(position, "set tile height")?;
        if tile.height() != height {
            tile.set_height(height);
            out_events.push(Event::TileHeightChanged { position, height });
        }
        Ok(())
    }

    /// Raises a tile by one level, saturating at the top.
    pub fn raise_tile(
        &mut self,
        position: BoardPosition,
        out_events: &mut Vec<Event>,
    ) -> Result<Height, ContractViolation> {
        let height = self.board.tile_mut(position, "raise tile")?.height().raised();
        self.set_tile_height(position, height, out_events)?;
        Ok(height)
    }

    /// Lowers a tile by one level, saturating at the bottom.
    pub fn lower_tile(
        &mut self,
        position: BoardPosition,
        out_events: &mut Vec<Event>,
    ) -> Result<Height, ContractViolation> {
        let height = self.board.tile_mut(position, "lower tile")?.height().lowered();
        self.set_tile_height(position, height, out_events)?;
        Ok(height)
    }

    /// Turns a tile to acid permanently, dissolving any orb on it.
    pub fn acidify(
        &mut self,
        position: BoardPosition,
        out_events: &mut Vec<Event>,
    ) -> Result<(), ContractViolation> {
        let tile = self.board.tile_mut(position, "acidify tile")?;
        if !tile.is_acid() {
            tile.acidify();
            out_events.push(Event::TileAcidified { position });
        }
        Ok(())
    }

    /// Places an orb on a tile. Acid tiles reject orbs and return `false`.
    pub fn place_orb(
        &mut self,
        position: BoardPosition,
        power: PowerType,
        out_events: &mut Vec<Event>,
    ) -> Result<bool, ContractViolation> {
        let placed = self.board.tile_mut(position, "place orb")?.place_orb(power);
        if placed {
            out_events.push(Event::OrbPlaced { position, power });
        }
        Ok(placed)
    }

    fn piece_ref(&self, piece: PieceId, operation: &'static str) -> Result<&Piece, ContractViolation> {
        self.rosters[piece.team().index()]
            .get(piece)
            .ok_or(ContractViolation::MissingPiece { operation, piece })
    }

    fn piece_mut(
        &mut self,
        piece: PieceId,
        operation: &'static str,
    ) -> Result<&mut Piece, ContractViolation> {
        self.rosters[piece.team().index()]
            .get_mut(piece)
            .ok_or(ContractViolation::MissingPiece { operation, piece })
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::{Board, Piece, World};
    use torus_core::{BoardPosition, PieceId, Team};

    /// Provides read-only access to the board.
    #[must_use]
    pub fn board(world: &World) -> &Board {
        &world.board
    }

    /// Looks up a live piece by identity.
    #[must_use]
    pub fn piece(world: &World, piece: PieceId) -> Option<&Piece> {
        world.rosters[piece.team().index()].get(piece)
    }

    /// Looks up the piece standing on a tile.
    #[must_use]
    pub fn piece_at(world: &World, position: BoardPosition) -> Option<&Piece> {
        let occupant = world.board.tile_at(position)?.occupant()?;
        piece(world, occupant)
    }

    /// Iterator over the live pieces of a team ordered by number.
    pub fn pieces(world: &World, team: Team) -> impl Iterator<Item = &Piece> {
        world.rosters[team.index()].iter()
    }

    /// Number of live pieces on a team.
    #[must_use]
    pub fn piece_count(world: &World, team: Team) -> usize {
        world.rosters[team.index()].len()
    }

    /// Number the team will allocate to its next piece.
    #[must_use]
    pub fn next_number(world: &World, team: Team) -> u32 {
        world.rosters[team.index()].next_number()
    }

    /// Score of a team.
    #[must_use]
    pub fn score(world: &World, team: Team) -> u32 {
        world.scores[team.index()]
    }

    /// Scores of both teams indexed by [`Team::index`].
    #[must_use]
    pub fn scores(world: &World) -> [u32; 2] {
        world.scores
    }
}
