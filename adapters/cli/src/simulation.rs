//! Two-client match simulation over an in-memory transport.

use anyhow::{bail, Context, Result};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use torus_core::{BoardPosition, Command, Event, PieceId, PowerType, Team};
use torus_system_turn::{
    Game, GameConfig, Reception, SeededRandom, TransportError, TurnPhase, TurnTransport,
};
use torus_world::{query, Piece};
use tracing::{debug, info};

/// Outcome of a simulated match.
pub(crate) struct Report {
    pub(crate) turns: u32,
    pub(crate) winner: Option<Team>,
    pub(crate) scores: [u32; 2],
    pub(crate) last_payload: Option<Vec<u8>>,
}

#[derive(Default)]
struct Mailbox {
    outbox: Vec<Vec<u8>>,
}

impl TurnTransport for Mailbox {
    fn submit_turn(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        self.outbox.push(payload.to_vec());
        Ok(())
    }
}

/// Picks a random piece, sometimes spends one of its powers, then moves it.
struct Agent {
    rng: ChaCha8Rng,
}

impl Agent {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    fn play_turn(&mut self, game: &mut Game, events: &mut Vec<Event>) -> Result<()> {
        let pieces: Vec<PieceId> = query::pieces(game.world(), game.local_team())
            .map(Piece::id)
            .collect();

        if let Some(piece) = pieces.choose(&mut self.rng).copied() {
            game.apply(Command::SelectPiece { piece }, events)?;

            let held: Vec<PowerType> = query::piece(game.world(), piece)
                .map(|selected| selected.powers().keys().copied().collect())
                .unwrap_or_default();
            if let Some(power) = held.choose(&mut self.rng).copied() {
                if self.rng.gen_bool(0.5) {
                    debug!(%piece, %power, "agent activates power");
                    game.apply(Command::ActivatePower { power }, events)?;
                }
            }

            if matches!(game.phase(), TurnPhase::PieceSelected { .. }) {
                let moves = offered_moves(events);
                if let Some(position) = moves.choose(&mut self.rng).copied() {
                    game.apply(Command::SelectTile { position }, events)?;
                }
            }
        }

        if game.phase() != TurnPhase::TurnCommitted {
            game.apply(Command::EndTurn, events)?;
        }
        Ok(())
    }
}

fn offered_moves(events: &[Event]) -> Vec<BoardPosition> {
    events
        .iter()
        .rev()
        .find_map(|event| match event {
            Event::PieceSelected { valid_moves, .. } => {
                Some(valid_moves.iter().map(|(position, _)| *position).collect())
            }
            _ => None,
        })
        .unwrap_or_default()
}

/// Plays up to `turns` turns, shipping every commit to the opposing client.
///
/// Fails as soon as a remote turn does not replay to its committed state.
pub(crate) fn run(config: GameConfig, turns: u32) -> Result<Report> {
    let mut host = Game::host(config, Box::new(SeededRandom::new(config.seed)))
        .context("failed to set up the host")?;
    let mut guest = Game::join(config, Box::new(SeededRandom::new(config.seed ^ u64::MAX)))
        .context("failed to set up the guest")?;
    host.set_player(Team::One, "host");
    guest.set_player(Team::Two, "guest");

    let mut agent = Agent::new(config.seed);
    let mut mailbox = Mailbox::default();
    let mut events = Vec::new();

    while host.turn() < turns && host.winner().is_none() {
        let (actor, observer) = if host.is_local_turn() {
            (&mut host, &mut guest)
        } else if guest.is_local_turn() {
            (&mut guest, &mut host)
        } else {
            bail!("neither client may act on turn {}", host.turn());
        };

        agent.play_turn(actor, &mut events)?;
        actor.submit(&mut mailbox, &mut events)?;
        let payload = mailbox.outbox.last().context("transport dropped the turn")?;
        match observer.receive(payload, &mut events)? {
            Reception::Applied { turn } => info!(turn, "remote turn verified"),
            other => bail!("remote turn was not applied: {other:?}"),
        }
        events.clear();
    }

    if host.world().capture() != guest.world().capture() {
        bail!("clients disagree after turn {}", host.turn());
    }

    Ok(Report {
        turns: host.turn(),
        winner: host.winner(),
        scores: [host.score(Team::One), host.score(Team::Two)],
        last_payload: mailbox.outbox.pop(),
    })
}
