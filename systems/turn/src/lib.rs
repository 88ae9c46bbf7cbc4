#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Turn orchestrator that drives one client of a Torus match.
//!
//! A [`Game`] owns the local world, accepts player [`Command`]s while it is
//! the local team's turn, records every resolved effect, and exchanges
//! committed turns with the opposing client as encoded [`GameSnapshot`]s.
//! Remote turns are replayed change by change against their pre-turn board
//! and verified against the committed post-turn board.

mod config;
mod random;
mod rules;
mod transport;

pub use config::{ConfigError, GameConfig};
pub use random::SeededRandom;
pub use rules::{close_turn, setup_board, spawn_orbs, winner_found};
pub use transport::{SubmitError, TransportError, TurnTransport};

use thiserror::Error;
use torus_core::{
    BoardPosition, BoardState, Change, ChangeKind, Command, ContractViolation, Event,
    GameSnapshot, PieceId, PowerType, RandomSource, RejectionReason, Team, ORB_INTERVAL,
};
use torus_system_change_log::{apply_change, ChangeLog};
use torus_system_powers::Decisions;
use torus_world::{query, Piece, World};
use tracing::{debug, info, instrument, warn};

/// Interaction state of a client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnPhase {
    /// The local team acts and no piece is selected.
    AwaitingSelection,
    /// The local team acts with a piece selected.
    PieceSelected {
        /// Selected piece.
        piece: PieceId,
    },
    /// The local turn is closed and waits for the transport to accept it.
    TurnCommitted,
    /// The opposing team acts.
    AwaitingRemote,
    /// A remote turn is being replayed.
    Replaying,
    /// The match has a winner.
    GameOver,
}

/// How an incoming snapshot was handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reception {
    /// The remote turn was replayed and verified.
    Applied {
        /// Turn counter after the remote turn.
        turn: u32,
    },
    /// Replay started; drive it with [`Game::advance_replay`].
    Replaying {
        /// Turn being replayed.
        turn: u32,
    },
    /// The snapshot is not newer than the local state and was ignored.
    Stale {
        /// Turn carried by the ignored snapshot.
        turn: u32,
    },
    /// The snapshot carried no match and the client started a new one.
    Reset,
    /// Another remote turn is still being replayed.
    Busy,
    /// A closed local turn still waits for the transport; nothing was applied.
    AwaitingSubmission,
    /// The snapshot was acted by a team that may not act now and was ignored.
    OutOfTurn {
        /// Turn carried by the ignored snapshot.
        turn: u32,
    },
}

/// Progress of a replay driven by [`Game::advance_replay`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplayStatus {
    /// No replay is in progress.
    Idle,
    /// One change was applied and more remain.
    InProgress {
        /// Changes still to apply.
        remaining: usize,
    },
    /// The replayed turn matched its committed state and was adopted.
    Completed {
        /// Turn counter after the remote turn.
        turn: u32,
    },
}

/// Reasons a client could not be created.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SetupError {
    /// The configuration cannot host a match.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Building the starting board violated a world invariant.
    #[error(transparent)]
    Contract(#[from] ContractViolation),
}

struct PendingTurn {
    snapshot: GameSnapshot,
    payload: Vec<u8>,
}

struct IncomingTurn {
    snapshot: GameSnapshot,
    applied: usize,
    prior_scores: [u32; 2],
}

/// One client of a two-player match.
pub struct Game {
    config: GameConfig,
    local_team: Team,
    random: Box<dyn RandomSource>,
    world: World,
    phase: TurnPhase,
    turn: u32,
    current_team: Team,
    winner: Option<Team>,
    players: [Option<String>; 2],
    baseline: BoardState,
    log: ChangeLog,
    pending: Option<PendingTurn>,
    incoming: Option<IncomingTurn>,
}

impl Game {
    /// Creates the hosting client, which plays [`Team::One`] and sets up the board.
    pub fn host(config: GameConfig, mut random: Box<dyn RandomSource>) -> Result<Self, SetupError> {
        config.validate()?;
        let world = setup_board(&config, random.as_mut())?;
        Ok(Self::with_world(config, Team::One, random, world))
    }

    /// Creates the joining client, which plays [`Team::Two`] and waits for the host's first turn.
    pub fn join(config: GameConfig, random: Box<dyn RandomSource>) -> Result<Self, SetupError> {
        config.validate()?;
        let world = World::new(config.columns, config.rows);
        Ok(Self::with_world(config, Team::Two, random, world))
    }

    fn with_world(
        config: GameConfig,
        local_team: Team,
        random: Box<dyn RandomSource>,
        world: World,
    ) -> Self {
        let mut game = Self {
            config,
            local_team,
            random,
            baseline: world.capture(),
            world,
            phase: TurnPhase::AwaitingRemote,
            turn: 0,
            current_team: Team::One,
            winner: None,
            players: [None, None],
            log: ChangeLog::new(),
            pending: None,
            incoming: None,
        };
        game.phase = game.resting_phase();
        game
    }

    /// Records the identifier of the player controlling `team`.
    pub fn set_player(&mut self, team: Team, player: impl Into<String>) {
        self.players[team.index()] = Some(player.into());
    }

    /// Applies a player command, reporting refusals as [`Event::InputRejected`].
    ///
    /// A move that resolves ends the turn; power activations keep it open.
    #[instrument(skip_all, fields(team = %self.local_team, turn = self.turn))]
    pub fn apply(
        &mut self,
        command: Command,
        out_events: &mut Vec<Event>,
    ) -> Result<(), ContractViolation> {
        if let Some(reason) = self.input_block() {
            reject(reason, out_events);
            return Ok(());
        }

        debug!(?command, "applying command");
        match command {
            Command::SelectPiece { piece } => self.select(piece, out_events),
            Command::SelectTile { position } => self.move_selected(position, out_events)?,
            Command::ActivatePower { power } => self.activate_selected(power, out_events)?,
            Command::Deselect => {
                if self.selected().is_some() {
                    self.phase = TurnPhase::AwaitingSelection;
                    out_events.push(Event::PieceDeselected);
                }
            }
            Command::EndTurn => self.prepare_commit(out_events)?,
        }
        Ok(())
    }

    /// Grants one stack of `power` to a piece during the local turn.
    ///
    /// The grant is recorded and may overflow the piece.
    #[instrument(skip_all, fields(team = %self.local_team, %piece, %power))]
    pub fn grant_power(
        &mut self,
        piece: PieceId,
        power: PowerType,
        out_events: &mut Vec<Event>,
    ) -> Result<(), ContractViolation> {
        if let Some(reason) = self.input_block() {
            reject(reason, out_events);
            return Ok(());
        }
        if query::piece(&self.world, piece).is_none() {
            reject(RejectionReason::UnknownPiece, out_events);
            return Ok(());
        }

        let _ = self.world.grant_power(piece, power, 1, out_events)?;
        self.log.record(ChangeKind::GrantPower {
            piece,
            power,
            count: 1,
        });
        if self.selected() == Some(piece) {
            self.refresh_selection(piece, out_events);
        }
        Ok(())
    }

    /// Hands the closed turn to the transport.
    ///
    /// Local turn state advances only once the transport accepts the payload.
    /// On failure nothing changes and a retry resends the identical bytes.
    #[instrument(skip_all, fields(team = %self.local_team))]
    pub fn submit(
        &mut self,
        transport: &mut dyn TurnTransport,
        out_events: &mut Vec<Event>,
    ) -> Result<(), SubmitError> {
        let pending = self.pending.take().ok_or(SubmitError::NothingPending)?;
        if let Err(error) = transport.submit_turn(&pending.payload) {
            warn!(%error, turn = pending.snapshot.turn, "turn submission failed");
            self.pending = Some(pending);
            return Err(error.into());
        }

        let snapshot = pending.snapshot;
        info!(turn = snapshot.turn, "turn submitted");
        self.turn = snapshot.turn;
        self.current_team = snapshot.current_team;
        self.winner = snapshot.winner;
        self.baseline = snapshot.post_turn;
        self.log.clear();
        self.phase = self.resting_phase();
        self.announce_turn(out_events);
        Ok(())
    }

    /// Processes an encoded remote snapshot completely.
    #[instrument(skip_all, fields(team = %self.local_team, length = bytes.len()))]
    pub fn receive(
        &mut self,
        bytes: &[u8],
        out_events: &mut Vec<Event>,
    ) -> Result<Reception, ContractViolation> {
        let reception = self.begin_receive(bytes, out_events)?;
        if !matches!(reception, Reception::Replaying { .. }) {
            return Ok(reception);
        }
        loop {
            match self.advance_replay(out_events)? {
                ReplayStatus::Completed { turn } => return Ok(Reception::Applied { turn }),
                ReplayStatus::InProgress { .. } => {}
                ReplayStatus::Idle => return Ok(reception),
            }
        }
    }

    /// Decodes a remote snapshot and prepares its replay.
    ///
    /// Unreadable or empty snapshots reset the client to a new match; turns
    /// that are not newer than the local state are ignored. Only a turn acted
    /// by the opposing team while it is that team's turn is replayed, and a
    /// closed local turn awaiting submission is never displaced.
    #[instrument(skip_all, fields(team = %self.local_team))]
    pub fn begin_receive(
        &mut self,
        bytes: &[u8],
        out_events: &mut Vec<Event>,
    ) -> Result<Reception, ContractViolation> {
        match self.phase {
            TurnPhase::Replaying => {
                warn!("remote turn arrived while another is replaying");
                return Ok(Reception::Busy);
            }
            TurnPhase::TurnCommitted => {
                warn!(local = self.turn, "remote turn arrived before the local turn was submitted");
                return Ok(Reception::AwaitingSubmission);
            }
            _ => {}
        }

        let snapshot = torus_persistence::decode_or_default(bytes);
        if snapshot.is_fresh() {
            self.reset(out_events)?;
            return Ok(Reception::Reset);
        }
        if snapshot.turn <= self.turn {
            warn!(received = snapshot.turn, local = self.turn, "ignoring stale snapshot");
            return Ok(Reception::Stale {
                turn: snapshot.turn,
            });
        }
        let acting = snapshot.current_team.opponent();
        if acting == self.local_team || acting != self.current_team {
            warn!(turn = snapshot.turn, %acting, "ignoring snapshot acted out of turn");
            return Ok(Reception::OutOfTurn {
                turn: snapshot.turn,
            });
        }

        let prior_scores = query::scores(&self.world);
        let mut world = World::from_state(&snapshot.pre_turn)?;
        world.set_scores(prior_scores);
        self.world = world;

        let turn = snapshot.turn;
        info!(turn, changes = snapshot.changes.len(), "replaying remote turn");
        self.incoming = Some(IncomingTurn {
            snapshot,
            applied: 0,
            prior_scores,
        });
        self.phase = TurnPhase::Replaying;
        Ok(Reception::Replaying { turn })
    }

    /// Applies the next change of the remote turn being replayed.
    ///
    /// After the last change the close-turn step runs and the resulting board
    /// must equal the committed post-turn board. Any violation abandons the
    /// remote turn and restores the last committed baseline.
    #[instrument(skip_all, fields(team = %self.local_team))]
    pub fn advance_replay(
        &mut self,
        out_events: &mut Vec<Event>,
    ) -> Result<ReplayStatus, ContractViolation> {
        let prior_scores = self.incoming.as_ref().map(|incoming| incoming.prior_scores);
        match self.step_replay(out_events) {
            Ok(status) => Ok(status),
            Err(violation) => {
                warn!(%violation, "abandoning remote turn");
                self.abort_replay(prior_scores);
                Err(violation)
            }
        }
    }

    /// Current interaction state.
    #[must_use]
    pub const fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// Team controlled by this client.
    #[must_use]
    pub const fn local_team(&self) -> Team {
        self.local_team
    }

    /// Team whose turn it is.
    #[must_use]
    pub const fn current_team(&self) -> Team {
        self.current_team
    }

    /// Number of committed turns.
    #[must_use]
    pub const fn turn(&self) -> u32 {
        self.turn
    }

    /// Winner of the match, once decided.
    #[must_use]
    pub const fn winner(&self) -> Option<Team> {
        self.winner
    }

    /// Configuration the client was created with.
    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Read-only view of the local world.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Score of a team.
    #[must_use]
    pub fn score(&self, team: Team) -> u32 {
        query::score(&self.world, team)
    }

    /// Reports whether the local team may act.
    #[must_use]
    pub fn is_local_turn(&self) -> bool {
        self.input_block().is_none()
    }

    /// Changes recorded during the open local turn.
    #[must_use]
    pub fn changes(&self) -> &[Change] {
        self.log.changes()
    }

    /// Encoded snapshot of the closed turn awaiting submission.
    #[must_use]
    pub fn pending_payload(&self) -> Option<&[u8]> {
        self.pending.as_ref().map(|pending| pending.payload.as_slice())
    }

    /// Snapshot of the current local state, with the open turn's changes.
    #[must_use]
    pub fn snapshot(&self) -> GameSnapshot {
        self.compose_snapshot(self.turn, self.current_team, self.winner)
    }

    fn input_block(&self) -> Option<RejectionReason> {
        match self.phase {
            TurnPhase::Replaying => Some(RejectionReason::ReplayInProgress),
            TurnPhase::GameOver => Some(RejectionReason::GameOver),
            TurnPhase::TurnCommitted => Some(RejectionReason::AwaitingSubmission),
            TurnPhase::AwaitingRemote => Some(RejectionReason::NotYourTurn),
            TurnPhase::AwaitingSelection | TurnPhase::PieceSelected { .. } => {
                (self.current_team != self.local_team).then_some(RejectionReason::NotYourTurn)
            }
        }
    }

    fn resting_phase(&self) -> TurnPhase {
        if self.winner.is_some() {
            TurnPhase::GameOver
        } else if self.current_team == self.local_team {
            TurnPhase::AwaitingSelection
        } else {
            TurnPhase::AwaitingRemote
        }
    }

    const fn selected(&self) -> Option<PieceId> {
        match self.phase {
            TurnPhase::PieceSelected { piece } => Some(piece),
            _ => None,
        }
    }

    fn select(&mut self, piece: PieceId, out_events: &mut Vec<Event>) {
        let Some(selected) = query::piece(&self.world, piece) else {
            reject(RejectionReason::UnknownPiece, out_events);
            return;
        };
        if selected.team() != self.local_team {
            reject(RejectionReason::NotYourTurn, out_events);
            return;
        }
        self.phase = TurnPhase::PieceSelected { piece };
        out_events.push(Event::PieceSelected {
            piece,
            valid_moves: torus_system_movement::valid_moves(&self.world, piece),
        });
    }

    fn refresh_selection(&mut self, piece: PieceId, out_events: &mut Vec<Event>) {
        if query::piece(&self.world, piece).is_some() {
            self.select(piece, out_events);
        } else {
            self.phase = TurnPhase::AwaitingSelection;
            out_events.push(Event::PieceDeselected);
        }
    }

    fn move_selected(
        &mut self,
        destination: BoardPosition,
        out_events: &mut Vec<Event>,
    ) -> Result<(), ContractViolation> {
        let Some(piece) = self.selected() else {
            reject(RejectionReason::NoPieceSelected, out_events);
            return Ok(());
        };
        let from = query::piece(&self.world, piece)
            .map(Piece::position)
            .ok_or(ContractViolation::MissingPiece {
                operation: "move selection",
                piece,
            })?;
        if !torus_system_movement::resolve(&self.world, piece, destination).is_valid() {
            reject(RejectionReason::InvalidMove, out_events);
            return Ok(());
        }

        let move_type =
            torus_system_movement::perform(&mut self.world, piece, destination, out_events)?;
        self.log.record(ChangeKind::Move {
            piece,
            from,
            to: destination,
            move_type,
        });
        self.prepare_commit(out_events)
    }

    fn activate_selected(
        &mut self,
        power: PowerType,
        out_events: &mut Vec<Event>,
    ) -> Result<(), ContractViolation> {
        let Some(piece) = self.selected() else {
            reject(RejectionReason::NoPieceSelected, out_events);
            return Ok(());
        };
        if !query::piece(&self.world, piece).is_some_and(|selected| selected.holds(power)) {
            reject(RejectionReason::PowerNotHeld, out_events);
            return Ok(());
        }

        let outcome = torus_system_powers::activate(
            &mut self.world,
            piece,
            power,
            Decisions::Roll(self.random.as_mut()),
            out_events,
        )?;
        self.log.record(ChangeKind::Power {
            piece,
            power,
            outcome,
        });
        self.refresh_selection(piece, out_events);
        Ok(())
    }

    fn prepare_commit(&mut self, out_events: &mut Vec<Event>) -> Result<(), ContractViolation> {
        if self.selected().is_some() {
            out_events.push(Event::PieceDeselected);
        }

        if self.turn.saturating_add(1) % ORB_INTERVAL == 0 {
            let orbs = spawn_orbs(&mut self.world, self.random.as_mut(), out_events)?;
            if !orbs.is_empty() {
                self.log.record(ChangeKind::PlaceOrbs { orbs });
            }
        }

        close_turn(&mut self.world, self.local_team);
        let winner = winner_found(&self.world, self.local_team);
        let snapshot = self.compose_snapshot(
            self.turn.saturating_add(1),
            self.local_team.opponent(),
            winner,
        );
        let payload = torus_persistence::encode(&snapshot).map_err(|error| {
            ContractViolation::MalformedSnapshot {
                reason: error.to_string(),
            }
        })?;

        info!(
            turn = snapshot.turn,
            changes = snapshot.changes.len(),
            ?winner,
            "turn closed"
        );
        self.pending = Some(PendingTurn { snapshot, payload });
        self.phase = TurnPhase::TurnCommitted;
        Ok(())
    }

    fn compose_snapshot(
        &self,
        turn: u32,
        current_team: Team,
        winner: Option<Team>,
    ) -> GameSnapshot {
        let [score_one, score_two] = query::scores(&self.world);
        GameSnapshot {
            turn,
            first_move: self.turn == 0,
            player_one: self.players[0].clone(),
            player_two: self.players[1].clone(),
            current_team,
            winner,
            score_one,
            score_two,
            pre_turn: self.baseline.clone(),
            post_turn: self.world.capture(),
            changes: self.log.changes().to_vec(),
        }
    }

    fn step_replay(
        &mut self,
        out_events: &mut Vec<Event>,
    ) -> Result<ReplayStatus, ContractViolation> {
        let Some(incoming) = self.incoming.as_mut() else {
            return Ok(ReplayStatus::Idle);
        };
        if let Some(change) = incoming.snapshot.changes.get(incoming.applied) {
            apply_change(&mut self.world, change, out_events)?;
            incoming.applied += 1;
            return Ok(ReplayStatus::InProgress {
                remaining: incoming.snapshot.changes.len() - incoming.applied,
            });
        }

        let Some(incoming) = self.incoming.take() else {
            return Ok(ReplayStatus::Idle);
        };
        let snapshot = incoming.snapshot;
        close_turn(&mut self.world, snapshot.current_team.opponent());
        if self.world.capture() != snapshot.post_turn {
            return Err(ContractViolation::Desync {
                turn: snapshot.turn,
            });
        }

        self.world.set_scores([snapshot.score_one, snapshot.score_two]);
        self.turn = snapshot.turn;
        self.current_team = snapshot.current_team;
        self.winner = snapshot.winner;
        for (slot, player) in self
            .players
            .iter_mut()
            .zip([snapshot.player_one, snapshot.player_two])
        {
            if player.is_some() {
                *slot = player;
            }
        }
        self.baseline = snapshot.post_turn;
        self.phase = self.resting_phase();
        info!(turn = self.turn, "remote turn adopted");
        self.announce_turn(out_events);
        Ok(ReplayStatus::Completed { turn: self.turn })
    }

    fn abort_replay(&mut self, prior_scores: Option<[u32; 2]>) {
        self.incoming = None;
        match World::from_state(&self.baseline) {
            Ok(mut world) => {
                world.set_scores(prior_scores.unwrap_or_else(|| query::scores(&self.world)));
                self.world = world;
            }
            Err(violation) => warn!(%violation, "committed baseline could not be restored"),
        }
        self.phase = self.resting_phase();
    }

    fn reset(&mut self, out_events: &mut Vec<Event>) -> Result<(), ContractViolation> {
        info!("starting a new game");
        self.world = if self.local_team == Team::One {
            setup_board(&self.config, self.random.as_mut())?
        } else {
            World::new(self.config.columns, self.config.rows)
        };
        self.turn = 0;
        self.current_team = Team::One;
        self.winner = None;
        self.baseline = self.world.capture();
        self.log.clear();
        self.pending = None;
        self.incoming = None;
        self.phase = self.resting_phase();
        out_events.push(Event::NewGame);
        Ok(())
    }

    fn announce_turn(&self, out_events: &mut Vec<Event>) {
        out_events.push(Event::TurnCommitted {
            turn: self.turn,
            next_team: self.current_team,
        });
        if let Some(winner) = self.winner {
            info!(%winner, "match decided");
            out_events.push(Event::GameWon { winner });
        }
    }
}

fn reject(reason: RejectionReason, out_events: &mut Vec<Event>) {
    debug!(?reason, "command rejected");
    out_events.push(Event::InputRejected { reason });
}
