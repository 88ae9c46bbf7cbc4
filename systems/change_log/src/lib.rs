#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Change log recorder and the replay engine that reapplies recorded turns.
//!
//! Local resolution appends every effect it applies to a [`ChangeLog`].
//! Replay walks a recorded list through the same movement and power logic,
//! feeding recorded outcomes in place of random draws. Replay never holds a
//! log, so reapplying a change cannot record it again.

use torus_core::{Change, ChangeKind, ContractViolation, Event, MoveType};
use torus_system_powers::Decisions;
use torus_world::{query, Piece, World};
use tracing::debug;

/// Append-only list of the changes applied during the local turn.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeLog {
    changes: Vec<Change>,
}

impl ChangeLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a resolved effect.
    pub fn record(&mut self, kind: ChangeKind) {
        self.changes.push(Change::new(kind));
    }

    /// Changes recorded so far, oldest first.
    #[must_use]
    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    /// Number of recorded changes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Reports whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Forgets every recorded change.
    pub fn clear(&mut self) {
        self.changes.clear();
    }

    /// Moves the recorded changes out, leaving the log empty.
    pub fn take(&mut self) -> Vec<Change> {
        std::mem::take(&mut self.changes)
    }
}

/// Step-wise cursor that reapplies a recorded change list.
#[derive(Clone, Debug)]
pub struct Replay<'a> {
    changes: &'a [Change],
    cursor: usize,
}

impl<'a> Replay<'a> {
    /// Creates a cursor positioned before the first change.
    #[must_use]
    pub const fn new(changes: &'a [Change]) -> Self {
        Self { changes, cursor: 0 }
    }

    /// Number of changes already applied.
    #[must_use]
    pub const fn applied(&self) -> usize {
        self.cursor
    }

    /// Number of changes still to apply.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.changes.len().saturating_sub(self.cursor)
    }

    /// Reports whether every change was applied.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.cursor >= self.changes.len()
    }

    /// Applies the next change, returning it, or `None` once the list is exhausted.
    pub fn step(
        &mut self,
        world: &mut World,
        out_events: &mut Vec<Event>,
    ) -> Result<Option<&'a Change>, ContractViolation> {
        let Some(change) = self.changes.get(self.cursor) else {
            return Ok(None);
        };
        debug!(index = self.cursor, kind = ?change.kind(), "replaying change");
        apply_change(world, change, out_events)?;
        self.cursor += 1;
        Ok(Some(change))
    }

    /// Applies every remaining change, returning how many were applied.
    pub fn run_to_end(
        &mut self,
        world: &mut World,
        out_events: &mut Vec<Event>,
    ) -> Result<usize, ContractViolation> {
        let mut applied = 0;
        while self.step(world, out_events)?.is_some() {
            applied += 1;
        }
        Ok(applied)
    }
}

/// Reapplies a complete change list in order.
pub fn replay(
    world: &mut World,
    changes: &[Change],
    out_events: &mut Vec<Event>,
) -> Result<(), ContractViolation> {
    let _ = Replay::new(changes).run_to_end(world, out_events)?;
    Ok(())
}

/// Reapplies a single recorded change through the local resolution logic.
pub fn apply_change(
    world: &mut World,
    change: &Change,
    out_events: &mut Vec<Event>,
) -> Result<(), ContractViolation> {
    match change.kind() {
        ChangeKind::Move {
            piece,
            from,
            to,
            move_type,
        } => {
            let origin = query::piece(world, *piece)
                .map(Piece::position)
                .ok_or(ContractViolation::MissingPiece {
                    operation: "replay move",
                    piece: *piece,
                })?;
            if origin != *from {
                return Err(ContractViolation::MoveMismatch {
                    piece: *piece,
                    to: *to,
                    recorded: *move_type,
                    resolved: MoveType::Invalid,
                });
            }
            let resolved = torus_system_movement::perform(world, *piece, *to, out_events)?;
            if resolved != *move_type {
                return Err(ContractViolation::MoveMismatch {
                    piece: *piece,
                    to: *to,
                    recorded: *move_type,
                    resolved,
                });
            }
        }
        ChangeKind::Power {
            piece,
            power,
            outcome,
        } => {
            let _ = torus_system_powers::activate(
                world,
                *piece,
                *power,
                Decisions::Recorded(outcome),
                out_events,
            )?;
        }
        ChangeKind::PlaceOrbs { orbs } => {
            for orb in orbs {
                if !world.place_orb(orb.position, orb.power, out_events)? {
                    return Err(ContractViolation::OrbRejected {
                        position: orb.position,
                    });
                }
            }
        }
        ChangeKind::GrantPower {
            piece,
            power,
            count,
        } => {
            let _ = world.grant_power(*piece, *power, *count, out_events)?;
        }
    }
    Ok(())
}
