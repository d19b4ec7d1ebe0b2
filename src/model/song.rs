use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::UserId;

/// Datos crudos de una canción, tal como los entrega el resolver externo.
///
/// El resolver es responsable de que los campos vengan completos; aquí no se
/// valida nada más allá de la forma estructural.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSong {
    pub name: String,
    pub author: String,
    pub url: String,
    pub thumbnail: String,
    /// Duración en formato legible ("3:45"), no se parsea
    pub duration: String,
    pub is_live: bool,
}

/// Una canción lista para entrar a la cola.
///
/// Inmutable una vez construida; la cola muta su propio orden de reproducción,
/// nunca la canción.
#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    pub name: String,
    pub author: String,
    pub url: String,
    pub thumbnail: String,
    pub duration: String,
    pub is_live: bool,
    pub requested_by: Option<UserId>,
    pub added_at: DateTime<Utc>,
}

impl Song {
    /// Construye una canción a partir de los datos crudos del resolver.
    ///
    /// Copia directa de campos, sin transformación y sin camino de error.
    pub fn new(raw: RawSong, requested_by: Option<UserId>) -> Self {
        Self {
            name: raw.name,
            author: raw.author,
            url: raw.url,
            thumbnail: raw.thumbnail,
            duration: raw.duration,
            is_live: raw.is_live,
            requested_by,
            added_at: Utc::now(),
        }
    }
}

impl fmt::Display for Song {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {}", self.name, self.author)
    }
}
