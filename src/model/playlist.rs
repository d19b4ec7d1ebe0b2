use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::config::PlaylistOptions;
use crate::model::{RawSong, SessionId, Song};

/// Discriminador del origen de una colección.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaylistKind {
    Playlist,
    Album,
}

/// Datos crudos de una playlist, tal como los entrega el resolver externo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPlaylist {
    pub name: String,
    pub author: String,
    pub url: String,
    pub songs: Vec<RawSong>,
    #[serde(rename = "type")]
    pub kind: PlaylistKind,
}

/// Una colección de canciones cargada en una cola concreta.
///
/// El orden de `songs` es el orden de reproducción; el shuffle y el recorte por
/// `max_songs` se aplican una sola vez al cargar. La referencia a la cola es el
/// [`SessionId`] plano, sin propiedad.
#[derive(Debug, Clone, PartialEq)]
pub struct Playlist {
    pub name: String,
    pub author: String,
    pub url: String,
    pub kind: PlaylistKind,
    pub songs: Vec<Song>,
    pub queue: SessionId,
}

impl Playlist {
    /// Construye la playlist aplicando la política de carga de `options`.
    pub fn new(raw: RawPlaylist, queue: SessionId, options: &PlaylistOptions) -> Self {
        let mut songs: Vec<Song> = raw
            .songs
            .into_iter()
            .map(|s| Song::new(s, options.requested_by))
            .collect();

        if options.max_songs >= 0 && songs.len() > options.max_songs as usize {
            debug!(
                "✂️ Playlist recortada de {} a {} canciones",
                songs.len(),
                options.max_songs
            );
            songs.truncate(options.max_songs as usize);
        }

        if options.shuffle {
            songs.shuffle(&mut rand::thread_rng());
            debug!("🔀 Playlist mezclada al cargar: {}", raw.name);
        }

        Self {
            name: raw.name,
            author: raw.author,
            url: raw.url,
            kind: raw.kind,
            songs,
            queue,
        }
    }
}

impl fmt::Display for Playlist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {}", self.name, self.author)
    }
}
