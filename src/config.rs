//! # Config Module
//!
//! Defaulted option bundles for the player, single plays and playlist loads.
//!
//! Every bundle comes in two shapes: the resolved struct where every field is
//! defined, and an `*Overrides` struct of optional fields. Callers hand in a
//! partial override and get back a fully-populated snapshot; unspecified fields
//! always take the documented default, never a null that leaks into queue logic.
//!
//! Malformed values (negative timeout, negative volume) are corrected silently
//! back to the default instead of failing construction.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;
use tracing::warn;

use crate::model::UserId;

/// Calidad de transcodificación que se le pide al transporte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamQuality {
    Low,
    High,
}

/// Filtro de fecha de subida para búsquedas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadDateFilter {
    Hour,
    Today,
    Week,
    Month,
    Year,
}

/// Filtro de duración para búsquedas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationFilter {
    Short,
    Long,
}

/// Criterio de ordenamiento de resultados de búsqueda.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchSort {
    Relevance,
    Date,
    ViewCount,
    Rating,
}

impl Default for SearchSort {
    fn default() -> Self {
        Self::Relevance
    }
}

/// Opciones de sesión del reproductor, ya resueltas.
///
/// Cada cola guarda su propio snapshot al construirse; no hay configuración
/// global compartida.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerOptions {
    // Comportamiento al salir del canal
    pub leave_on_end: bool,
    pub leave_on_stop: bool,
    pub leave_on_empty: bool,

    // Comportamiento al entrar
    pub deafen_on_join: bool,

    /// Espera antes de salir por inactividad (0 = inmediato)
    pub timeout: Duration,

    /// Volumen de salida en porcentaje (100 = sin cambio)
    pub volume: f32,
    pub quality: StreamQuality,

    /// Dirección ipv4/ipv6 de salida para el resolver/transporte
    pub local_address: Option<IpAddr>,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            leave_on_end: true,
            leave_on_stop: true,
            leave_on_empty: true,
            deafen_on_join: false,
            timeout: Duration::ZERO,
            volume: 100.0,
            quality: StreamQuality::High,
            local_address: None,
        }
    }
}

/// Override parcial de [`PlayerOptions`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlayerOptionsOverrides {
    pub leave_on_end: Option<bool>,
    pub leave_on_stop: Option<bool>,
    pub leave_on_empty: Option<bool>,
    pub deafen_on_join: Option<bool>,
    /// Timeout en milisegundos; los valores negativos caen al default
    pub timeout_ms: Option<i64>,
    pub volume: Option<f32>,
    pub quality: Option<StreamQuality>,
    pub local_address: Option<IpAddr>,
}

impl PlayerOptions {
    /// Mezcla un override parcial sobre los defaults documentados.
    pub fn merged(overrides: &PlayerOptionsOverrides) -> Self {
        Self::default().apply(overrides)
    }

    /// Mezcla campo por campo un override parcial sobre `self`.
    ///
    /// Mezcla superficial: ningún campo es un objeto anidado.
    pub fn apply(&self, overrides: &PlayerOptionsOverrides) -> Self {
        Self {
            leave_on_end: overrides.leave_on_end.unwrap_or(self.leave_on_end),
            leave_on_stop: overrides.leave_on_stop.unwrap_or(self.leave_on_stop),
            leave_on_empty: overrides.leave_on_empty.unwrap_or(self.leave_on_empty),
            deafen_on_join: overrides.deafen_on_join.unwrap_or(self.deafen_on_join),
            timeout: match overrides.timeout_ms {
                Some(ms) if ms >= 0 => Duration::from_millis(ms as u64),
                Some(ms) => {
                    warn!("⚠️ Timeout negativo ({ms}ms), usando el valor por defecto");
                    self.timeout
                }
                None => self.timeout,
            },
            volume: match overrides.volume {
                Some(v) if v >= 0.0 && v.is_finite() => v,
                Some(v) => {
                    warn!("⚠️ Volumen inválido ({v}), usando el valor por defecto");
                    self.volume
                }
                None => self.volume,
            },
            quality: overrides.quality.unwrap_or(self.quality),
            local_address: overrides.local_address.or(self.local_address),
        }
    }
}

/// Opciones de una búsqueda/reproducción individual, ya resueltas.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlayOptions {
    pub upload_date: Option<UploadDateFilter>,
    pub duration: Option<DurationFilter>,
    pub sort_by: SearchSort,
    pub requested_by: Option<UserId>,
    pub local_address: Option<IpAddr>,
}

/// Override parcial de [`PlayOptions`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlayOptionsOverrides {
    pub upload_date: Option<UploadDateFilter>,
    pub duration: Option<DurationFilter>,
    pub sort_by: Option<SearchSort>,
    pub requested_by: Option<UserId>,
    pub local_address: Option<IpAddr>,
}

impl PlayOptions {
    /// Mezcla un override parcial sobre los defaults documentados.
    pub fn merged(overrides: &PlayOptionsOverrides) -> Self {
        let defaults = Self::default();
        Self {
            upload_date: overrides.upload_date.or(defaults.upload_date),
            duration: overrides.duration.or(defaults.duration),
            sort_by: overrides.sort_by.unwrap_or(defaults.sort_by),
            requested_by: overrides.requested_by.or(defaults.requested_by),
            local_address: overrides.local_address.or(defaults.local_address),
        }
    }
}

/// Opciones de carga de una playlist, ya resueltas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaylistOptions {
    /// Tope de canciones a cargar (-1 = sin límite)
    pub max_songs: i64,
    pub requested_by: Option<UserId>,
    pub shuffle: bool,
    pub local_address: Option<IpAddr>,
}

impl Default for PlaylistOptions {
    fn default() -> Self {
        Self {
            max_songs: -1,
            requested_by: None,
            shuffle: false,
            local_address: None,
        }
    }
}

/// Override parcial de [`PlaylistOptions`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlaylistOptionsOverrides {
    pub max_songs: Option<i64>,
    pub requested_by: Option<UserId>,
    pub shuffle: Option<bool>,
    pub local_address: Option<IpAddr>,
}

impl PlaylistOptions {
    /// Mezcla un override parcial sobre los defaults documentados.
    pub fn merged(overrides: &PlaylistOptionsOverrides) -> Self {
        let defaults = Self::default();
        Self {
            max_songs: overrides.max_songs.unwrap_or(defaults.max_songs),
            requested_by: overrides.requested_by.or(defaults.requested_by),
            shuffle: overrides.shuffle.unwrap_or(defaults.shuffle),
            local_address: overrides.local_address.or(defaults.local_address),
        }
    }
}
