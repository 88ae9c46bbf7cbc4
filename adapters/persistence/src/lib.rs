#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Canonical binary encoding of [`GameSnapshot`] values.
//!
//! A persisted snapshot starts with the [`SNAPSHOT_HEADER`] magic followed by
//! a single format version byte and a bincode body. Every map inside a
//! snapshot is ordered, so equal snapshots always encode to equal bytes.

use thiserror::Error;
use torus_core::GameSnapshot;
use tracing::warn;

/// Magic prefix emitted before every encoded snapshot.
pub const SNAPSHOT_HEADER: &[u8; 5] = b"TORUS";
/// Version of the snapshot body layout.
pub const SNAPSHOT_VERSION: u8 = 1;

const PREFIX_LENGTH: usize = SNAPSHOT_HEADER.len() + 1;

/// Errors raised while encoding or decoding persisted snapshots.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The payload was empty.
    #[error("snapshot payload was empty")]
    EmptyPayload,
    /// The payload did not start with the snapshot magic.
    #[error("payload does not start with the snapshot header")]
    InvalidHeader,
    /// The payload was written by an unsupported format version.
    #[error("snapshot version {0} is not supported")]
    UnsupportedVersion(u8),
    /// The body could not be serialized or deserialized.
    #[error("snapshot body is malformed: {0}")]
    Body(#[from] bincode::Error),
}

/// Encodes a snapshot into its persisted byte form.
pub fn encode(snapshot: &GameSnapshot) -> Result<Vec<u8>, PersistenceError> {
    let body = bincode::serialize(snapshot)?;
    let mut bytes = Vec::with_capacity(PREFIX_LENGTH + body.len());
    bytes.extend_from_slice(SNAPSHOT_HEADER);
    bytes.push(SNAPSHOT_VERSION);
    bytes.extend_from_slice(&body);
    Ok(bytes)
}

/// Decodes a snapshot from its persisted byte form.
pub fn decode(bytes: &[u8]) -> Result<GameSnapshot, PersistenceError> {
    if bytes.is_empty() {
        return Err(PersistenceError::EmptyPayload);
    }
    let body = bytes
        .strip_prefix(SNAPSHOT_HEADER.as_slice())
        .ok_or(PersistenceError::InvalidHeader)?;
    let (version, body) = body.split_first().ok_or(PersistenceError::InvalidHeader)?;
    if *version != SNAPSHOT_VERSION {
        return Err(PersistenceError::UnsupportedVersion(*version));
    }
    Ok(bincode::deserialize(body)?)
}

/// Decodes a snapshot, falling back to a fresh game when the bytes are unusable.
#[must_use]
pub fn decode_or_default(bytes: &[u8]) -> GameSnapshot {
    match decode(bytes) {
        Ok(snapshot) => snapshot,
        Err(error) => {
            warn!(%error, length = bytes.len(), "discarding unreadable snapshot");
            GameSnapshot::default()
        }
    }
}
