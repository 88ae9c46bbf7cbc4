//! Match configuration shared by both clients.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Board dimensions, roster size and seed of a match.
///
/// Every field is optional when deserializing; missing fields keep their
/// default value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    /// Number of tile columns.
    pub columns: u32,
    /// Number of tile rows.
    pub rows: u32,
    /// Pieces each team starts with.
    pub pieces_per_team: u32,
    /// Seed of the host's random source.
    pub seed: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            columns: 8,
            rows: 8,
            pieces_per_team: 4,
            seed: 0,
        }
    }
}

impl GameConfig {
    /// Checks that the configured board can host both starting rosters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.columns == 0 || self.rows < 2 {
            return Err(ConfigError::BoardTooSmall {
                columns: self.columns,
                rows: self.rows,
            });
        }
        if self.pieces_per_team == 0 || self.pieces_per_team > self.columns {
            return Err(ConfigError::RosterDoesNotFit {
                pieces: self.pieces_per_team,
                columns: self.columns,
            });
        }
        Ok(())
    }
}

/// Reasons a [`GameConfig`] cannot start a match.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The board needs at least one column and two rows.
    #[error("a {columns}x{rows} board cannot host two teams")]
    BoardTooSmall {
        /// Configured columns.
        columns: u32,
        /// Configured rows.
        rows: u32,
    },
    /// Each team starts on its own home row, one piece per column at most.
    #[error("{pieces} pieces per team do not fit on a row of {columns} tiles")]
    RosterDoesNotFit {
        /// Configured roster size.
        pieces: u32,
        /// Configured columns.
        columns: u32,
    },
}
