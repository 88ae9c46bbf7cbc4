#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Power resolver that applies an activated power to the world.
//!
//! Every power is resolved by the same code whether it is activated locally
//! or replayed from a recorded change. Local activations draw random
//! decisions from a [`RandomSource`] and report them in the returned
//! [`PowerOutcome`]; replay feeds that outcome back in place of the source.

use torus_core::{
    AttributeKind, BoardPosition, ContractViolation, Event, Height, KillCause, PieceId,
    PiecePlacement, PowerKind, PowerOutcome, PowerType, RandomSource, TileElevation,
};
use torus_world::{query, Piece, Tile, World};
use tracing::debug;

pub mod targets;

/// Source of the random decisions a power makes.
pub enum Decisions<'a> {
    /// Roll fresh decisions from a random source.
    Roll(&'a mut dyn RandomSource),
    /// Reapply the decisions recorded when the power first resolved.
    Recorded(&'a PowerOutcome),
}

impl std::fmt::Debug for Decisions<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Roll(_) => f.write_str("Roll"),
            Self::Recorded(outcome) => f.debug_tuple("Recorded").field(outcome).finish(),
        }
    }
}

/// Spends one stack of `power` held by `piece` and applies its effect.
///
/// Returns the outcome to record for replay. A power the piece does not hold,
/// a recorded outcome of the wrong shape, or a recorded reference to a tile
/// or piece that does not exist is a [`ContractViolation`].
pub fn activate(
    world: &mut World,
    piece: PieceId,
    power: PowerType,
    mut decisions: Decisions<'_>,
    out_events: &mut Vec<Event>,
) -> Result<PowerOutcome, ContractViolation> {
    world.take_power(piece, power)?;
    out_events.push(Event::PowerActivated { piece, power });
    debug!(%piece, %power, ?decisions, "activating power");

    let decisions = &mut decisions;
    match power.kind() {
        PowerKind::Acidic => {
            for enemy in targets::pieces(world, piece, power)? {
                let position = position_of(world, enemy, "acidic")?;
                world.kill_piece(enemy, KillCause::Acid, out_events)?;
                world.acidify(position, out_events)?;
            }
            resolved(decisions, power)
        }
        PowerKind::Destroy => {
            for enemy in targets::pieces(world, piece, power)? {
                world.kill_piece(enemy, KillCause::Destroy, out_events)?;
            }
            resolved(decisions, power)
        }
        PowerKind::Inhibit => {
            for enemy in targets::pieces(world, piece, power)? {
                world.grant_attribute(enemy, AttributeKind::Inhibited, out_events)?;
            }
            resolved(decisions, power)
        }
        PowerKind::Tripwire => {
            for enemy in targets::pieces(world, piece, power)? {
                world.grant_attribute(enemy, AttributeKind::Tripwired, out_events)?;
            }
            resolved(decisions, power)
        }
        PowerKind::JumpProof => {
            world.grant_attribute(piece, AttributeKind::JumpProof, out_events)?;
            resolved(decisions, power)
        }
        PowerKind::MoveDiagonal => {
            world.grant_attribute(piece, AttributeKind::Diagonal, out_events)?;
            resolved(decisions, power)
        }
        PowerKind::ClimbTile => {
            world.grant_attribute(piece, AttributeKind::Climb, out_events)?;
            resolved(decisions, power)
        }
        PowerKind::Learn => {
            for ally in targets::pieces(world, piece, power)? {
                let lesson = query::piece(world, ally)
                    .map(|source| source.powers().clone())
                    .ok_or(ContractViolation::MissingPiece {
                        operation: "learn",
                        piece: ally,
                    })?;
                if !world.grant_powers(piece, &lesson, out_events)? {
                    break;
                }
            }
            resolved(decisions, power)
        }
        PowerKind::Teach => {
            let lesson = query::piece(world, piece)
                .map(|mentor| mentor.powers().clone())
                .ok_or(ContractViolation::MissingPiece {
                    operation: "teach",
                    piece,
                })?;
            for ally in targets::pieces(world, piece, power)? {
                let _ = world.grant_powers(ally, &lesson, out_events)?;
            }
            resolved(decisions, power)
        }
        PowerKind::Pilfer => {
            for enemy in targets::pieces(world, piece, power)? {
                let loot = world.drain_powers(enemy, out_events)?;
                if !world.grant_powers(piece, &loot, out_events)? {
                    break;
                }
            }
            resolved(decisions, power)
        }
        PowerKind::LowerTile => {
            let position = position_of(world, piece, "lower tile")?;
            let _ = world.lower_tile(position, out_events)?;
            resolved(decisions, power)
        }
        PowerKind::RaiseTile => {
            let position = position_of(world, piece, "raise tile")?;
            let _ = world.raise_tile(position, out_events)?;
            resolved(decisions, power)
        }
        PowerKind::Trench => {
            level_tiles(world, piece, power, Height::Lowest, out_events)?;
            resolved(decisions, power)
        }
        PowerKind::Wall => {
            level_tiles(world, piece, power, Height::Highest, out_events)?;
            resolved(decisions, power)
        }
        PowerKind::Recruit => {
            for enemy in targets::pieces(world, piece, power)? {
                let _ = world.convert_piece(enemy, out_events)?;
            }
            resolved(decisions, power)
        }
        PowerKind::Burrow => burrow(world, piece, power, decisions, out_events),
        PowerKind::Float => float(world, piece, power, decisions, out_events),
        PowerKind::Scramble => scramble(world, piece, power, decisions, out_events),
        PowerKind::MissileStrike => missile_strike(world, power, decisions, out_events),
        PowerKind::Respawn => respawn(world, piece, power, decisions, out_events),
    }
}

fn resolved(decisions: &Decisions<'_>, power: PowerType) -> Result<PowerOutcome, ContractViolation> {
    match decisions {
        Decisions::Roll(_) | Decisions::Recorded(PowerOutcome::Resolved) => {
            Ok(PowerOutcome::Resolved)
        }
        Decisions::Recorded(_) => Err(ContractViolation::OutcomeMismatch { power }),
    }
}

fn position_of(
    world: &World,
    piece: PieceId,
    operation: &'static str,
) -> Result<BoardPosition, ContractViolation> {
    query::piece(world, piece)
        .map(Piece::position)
        .ok_or(ContractViolation::MissingPiece { operation, piece })
}

fn level_tiles(
    world: &mut World,
    piece: PieceId,
    power: PowerType,
    height: Height,
    out_events: &mut Vec<Event>,
) -> Result<(), ContractViolation> {
    for position in targets::tiles(world, piece, power)? {
        world.set_tile_height(position, height, out_events)?;
    }
    Ok(())
}

fn burrow(
    world: &mut World,
    piece: PieceId,
    power: PowerType,
    decisions: &mut Decisions<'_>,
    out_events: &mut Vec<Event>,
) -> Result<PowerOutcome, ContractViolation> {
    let elevations = match decisions {
        Decisions::Roll(random) => targets::tiles(world, piece, power)?
            .into_iter()
            .map(|position| TileElevation {
                position,
                height: pick(&Height::LEVELS, *random).unwrap_or_default(),
            })
            .collect(),
        Decisions::Recorded(PowerOutcome::Burrow { elevations }) => elevations.clone(),
        Decisions::Recorded(_) => return Err(ContractViolation::OutcomeMismatch { power }),
    };
    for elevation in &elevations {
        world.set_tile_height(elevation.position, elevation.height, out_events)?;
    }
    Ok(PowerOutcome::Burrow { elevations })
}

fn float(
    world: &mut World,
    piece: PieceId,
    power: PowerType,
    decisions: &mut Decisions<'_>,
    out_events: &mut Vec<Event>,
) -> Result<PowerOutcome, ContractViolation> {
    let destination = match decisions {
        Decisions::Roll(random) => {
            let candidates = row_major(query::board(world).orb_candidates());
            pick(&candidates, *random)
        }
        Decisions::Recorded(PowerOutcome::Float { destination }) => *destination,
        Decisions::Recorded(_) => return Err(ContractViolation::OutcomeMismatch { power }),
    };
    if let Some(destination) = destination {
        let _ = world.relocate_piece(piece, destination, out_events)?;
    }
    Ok(PowerOutcome::Float { destination })
}

fn scramble(
    world: &mut World,
    piece: PieceId,
    power: PowerType,
    decisions: &mut Decisions<'_>,
    out_events: &mut Vec<Event>,
) -> Result<PowerOutcome, ContractViolation> {
    let placements = match decisions {
        Decisions::Roll(random) => {
            let shuffled = targets::pieces(world, piece, power)?;
            let mut positions = shuffled
                .iter()
                .map(|id| position_of(world, *id, "scramble"))
                .collect::<Result<Vec<_>, _>>()?;
            for index in (1..positions.len()).rev() {
                let swap = random.next_index(index + 1).min(index);
                positions.swap(index, swap);
            }
            shuffled
                .into_iter()
                .zip(positions)
                .map(|(piece, position)| PiecePlacement { piece, position })
                .collect()
        }
        Decisions::Recorded(PowerOutcome::Scramble { placements }) => placements.clone(),
        Decisions::Recorded(_) => return Err(ContractViolation::OutcomeMismatch { power }),
    };
    world.rearrange(&placements, out_events)?;
    Ok(PowerOutcome::Scramble { placements })
}

fn missile_strike(
    world: &mut World,
    power: PowerType,
    decisions: &mut Decisions<'_>,
    out_events: &mut Vec<Event>,
) -> Result<PowerOutcome, ContractViolation> {
    let center = match decisions {
        Decisions::Roll(random) => {
            let tiles: Vec<_> = query::board(world).tiles().map(Tile::position).collect();
            pick(&tiles, *random)
        }
        Decisions::Recorded(PowerOutcome::MissileStrike { center }) => *center,
        Decisions::Recorded(_) => return Err(ContractViolation::OutcomeMismatch { power }),
    };
    let Some(center) = center else {
        return Ok(PowerOutcome::MissileStrike { center: None });
    };
    if !query::board(world).contains(center) {
        return Err(ContractViolation::MissingTile {
            operation: "missile strike",
            position: center,
        });
    }
    for victim in targets::pieces_around(world, center) {
        world.kill_piece(victim, KillCause::MissileStrike, out_events)?;
    }
    Ok(PowerOutcome::MissileStrike {
        center: Some(center),
    })
}

fn respawn(
    world: &mut World,
    piece: PieceId,
    power: PowerType,
    decisions: &mut Decisions<'_>,
    out_events: &mut Vec<Event>,
) -> Result<PowerOutcome, ContractViolation> {
    let team = piece.team();
    match decisions {
        Decisions::Roll(random) => {
            let open = row_major(query::board(world).open_tiles());
            let Some(position) = pick(&open, *random) else {
                return Ok(PowerOutcome::Respawn { spawned: None });
            };
            let spawned = world.spawn_piece(team, position, out_events)?;
            Ok(PowerOutcome::Respawn {
                spawned: Some(PiecePlacement {
                    piece: spawned,
                    position,
                }),
            })
        }
        Decisions::Recorded(PowerOutcome::Respawn { spawned: None }) => {
            Ok(PowerOutcome::Respawn { spawned: None })
        }
        Decisions::Recorded(PowerOutcome::Respawn {
            spawned: Some(recorded),
        }) => {
            let allocated = world.spawn_piece(team, recorded.position, out_events)?;
            if allocated != recorded.piece {
                return Err(ContractViolation::SpawnMismatch {
                    recorded: recorded.piece,
                    allocated,
                });
            }
            Ok(PowerOutcome::Respawn {
                spawned: Some(*recorded),
            })
        }
        Decisions::Recorded(_) => Err(ContractViolation::OutcomeMismatch { power }),
    }
}

fn pick<T: Copy>(items: &[T], random: &mut dyn RandomSource) -> Option<T> {
    if items.is_empty() {
        return None;
    }
    let index = random.next_index(items.len());
    items.get(index).copied()
}

fn row_major(mut positions: Vec<BoardPosition>) -> Vec<BoardPosition> {
    positions.sort_by_key(|position| (position.row(), position.column()));
    positions
}
