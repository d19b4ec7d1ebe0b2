//! # Model Module
//!
//! Core data records for the queue system.
//!
//! This module provides the value objects shared across the crate:
//! - [`Song`] / [`RawSong`] - a single playable track and its raw resolver shape
//! - [`Playlist`] / [`RawPlaylist`] - an authored collection of tracks
//! - [`UserId`] / [`SessionId`] - opaque identifiers for attribution and session keying
//!
//! Raw records are what an external resolver (search/URL lookup) hands in; they are
//! serde-friendly and carry no behavior. The wrapped records are built from them with
//! a plain field copy plus the requester identity and an `added_at` stamp.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod playlist;
pub mod song;

pub use playlist::{Playlist, PlaylistKind, RawPlaylist};
pub use song::{RawSong, Song};

/// Identidad opaca del usuario que pidió una canción.
///
/// Solo se usa para atribución; el core nunca la interpreta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Identificador de una sesión de voz (una cola por sesión).
///
/// Las referencias hacia atrás (Playlist → Queue, eventos → Queue) usan este
/// identificador plano en lugar de un puntero, así la propiedad va en una sola
/// dirección: Player → Queue → Playlist/Song.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for SessionId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}
