//! # Connection Module
//!
//! The per-session streaming connection: the seam between the queue and the
//! external voice transport (songbird or equivalent in a real bot).
//!
//! [`StreamConnection`] owns the transport handle, tracks the currently
//! streaming [`AudioResource`] and carries the narrow low-level event set
//! (`start`/`end`/`error`) on its own bus, one layer below the queue events.
//! The driver integration notifies the queue when a track ends or fails; the
//! queue then advances and forwards errors upward in its own vocabulary.

use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::audio::events::{BusEvent, EventBus};
use crate::config::PlayerOptions;
use crate::model::{SessionId, Song};

/// Error de reproducción reportado por el transporte de voz.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    #[error("la fuente de audio no está disponible: {0}")]
    SourceUnavailable(String),
    #[error("el stream se interrumpió: {0}")]
    StreamLost(String),
    #[error("el transporte de voz no está conectado")]
    NotConnected,
}

/// Transporte de voz externo: unirse/salir del canal y streamear audio.
///
/// El decodificado y el envío por red viven detrás de este trait; el core solo
/// le pasa la canción y las opciones resueltas.
pub trait VoiceTransport: Send + Sync {
    /// Se une al canal de voz de la sesión.
    fn join(&self, session: SessionId) -> Result<(), PlaybackError>;

    /// Sale del canal de voz.
    fn leave(&self, session: SessionId);

    /// Empieza a streamear una canción.
    fn play(&self, song: &Song, options: &PlayerOptions) -> Result<(), PlaybackError>;

    /// Detiene el stream actual.
    fn stop(&self);

    /// Pausa el stream actual.
    fn pause(&self);

    /// Reanuda el stream pausado.
    fn resume(&self);

    /// Ajusta la ganancia de salida (1.0 = sin cambio).
    fn set_volume(&self, gain: f32);

    /// Ensordece o desensordece al bot.
    fn deafen(&self, deaf: bool);
}

/// Recurso de audio actualmente en el transporte.
#[derive(Debug, Clone)]
pub struct AudioResource {
    pub song: Song,
    /// Volumen en porcentaje con el que arrancó el stream
    pub volume: f32,
}

/// Evento de bajo nivel de la conexión de streaming.
#[derive(Debug, Clone)]
pub enum ConnectionEvent {
    /// Empezó a streamear el recurso
    Start(AudioResource),
    /// El recurso terminó de reproducirse
    End(AudioResource),
    /// Falló la reproducción del recurso actual
    Error(PlaybackError),
}

/// Nombre de evento de conexión, para suscripciones filtradas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionEventKind {
    Start,
    End,
    Error,
}

impl BusEvent for ConnectionEvent {
    type Kind = ConnectionEventKind;

    fn kind(&self) -> ConnectionEventKind {
        match self {
            Self::Start(_) => ConnectionEventKind::Start,
            Self::End(_) => ConnectionEventKind::End,
            Self::Error(_) => ConnectionEventKind::Error,
        }
    }
}

/// Conexión de streaming de una cola: transporte + recurso activo + eventos.
pub struct StreamConnection {
    session: SessionId,
    transport: Arc<dyn VoiceTransport>,
    options: PlayerOptions,
    volume: Mutex<f32>,
    current: Mutex<Option<AudioResource>>,
    events: EventBus<ConnectionEvent>,
}

impl StreamConnection {
    pub fn new(
        session: SessionId,
        transport: Arc<dyn VoiceTransport>,
        options: PlayerOptions,
    ) -> Self {
        let volume = options.volume;
        Self {
            session,
            transport,
            options,
            volume: Mutex::new(volume),
            current: Mutex::new(None),
            events: EventBus::new(),
        }
    }

    /// Se suscribe a los eventos de bajo nivel de la conexión.
    pub fn subscribe(&self) -> flume::Receiver<ConnectionEvent> {
        self.events.subscribe()
    }

    /// Se suscribe solo a un tipo de evento de conexión.
    pub fn subscribe_to(&self, kind: ConnectionEventKind) -> flume::Receiver<ConnectionEvent> {
        self.events.subscribe_to(kind)
    }

    /// Arranca el stream de una canción y emite `Start`.
    pub fn play(&self, song: &Song) -> Result<AudioResource, PlaybackError> {
        self.transport.play(song, &self.options)?;

        let volume = *self.volume.lock();
        self.transport.set_volume(volume / 100.0);

        let resource = AudioResource {
            song: song.clone(),
            volume,
        };
        *self.current.lock() = Some(resource.clone());
        self.events.emit(ConnectionEvent::Start(resource.clone()));
        debug!("🎧 Stream iniciado: {} ({})", song.name, self.session);
        Ok(resource)
    }

    /// Detiene el stream sin emitir `End` (parada explícita, no fin natural).
    pub fn stop(&self) {
        self.transport.stop();
        *self.current.lock() = None;
    }

    pub fn pause(&self) {
        self.transport.pause();
    }

    pub fn resume(&self) {
        self.transport.resume();
    }

    /// Ajusta el volumen del stream activo y de los siguientes.
    pub fn set_volume(&self, volume: f32) {
        *self.volume.lock() = volume;
        self.transport.set_volume(volume / 100.0);
        if let Some(resource) = self.current.lock().as_mut() {
            resource.volume = volume;
        }
    }

    pub fn volume(&self) -> f32 {
        *self.volume.lock()
    }

    /// El recurso que está sonando ahora, si hay alguno.
    pub fn current(&self) -> Option<AudioResource> {
        self.current.lock().clone()
    }

    /// Marca el fin natural del recurso actual y emite `End`.
    pub fn finish(&self) -> Option<AudioResource> {
        let finished = self.current.lock().take();
        if let Some(resource) = finished.clone() {
            self.events.emit(ConnectionEvent::End(resource));
        }
        finished
    }

    /// Registra una falla de reproducción y emite `Error`.
    pub fn fail(&self, error: PlaybackError) {
        *self.current.lock() = None;
        self.events.emit(ConnectionEvent::Error(error));
    }

    /// Sale del canal de voz.
    pub fn leave(&self) {
        self.transport.leave(self.session);
        *self.current.lock() = None;
        info!("👋 Conexión cerrada ({})", self.session);
    }

    /// Descarta el recurso activo sin tocar el transporte (desconexión forzada).
    pub fn reset(&self) {
        *self.current.lock() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RawSong, UserId};
    use mockall::mock;
    use mockall::predicate::always;
    use pretty_assertions::assert_eq;

    mock! {
        pub Transport {}

        impl VoiceTransport for Transport {
            fn join(&self, session: SessionId) -> Result<(), PlaybackError>;
            fn leave(&self, session: SessionId);
            fn play(&self, song: &Song, options: &PlayerOptions) -> Result<(), PlaybackError>;
            fn stop(&self);
            fn pause(&self);
            fn resume(&self);
            fn set_volume(&self, gain: f32);
            fn deafen(&self, deaf: bool);
        }
    }

    fn song(name: &str) -> Song {
        Song::new(
            RawSong {
                name: name.to_string(),
                author: "Autor".to_string(),
                url: format!("https://example.com/{name}"),
                thumbnail: String::new(),
                duration: "3:00".to_string(),
                is_live: false,
            },
            Some(UserId(1)),
        )
    }

    #[test]
    fn test_play_emits_start_and_tracks_current() {
        let mut transport = MockTransport::new();
        transport
            .expect_play()
            .with(always(), always())
            .times(1)
            .returning(|_, _| Ok(()));
        transport.expect_set_volume().times(1).return_const(());

        let connection = StreamConnection::new(
            SessionId(1),
            Arc::new(transport),
            PlayerOptions::default(),
        );
        let rx = connection.subscribe();

        let resource = connection.play(&song("A")).unwrap();
        assert_eq!(resource.volume, 100.0);
        assert_eq!(connection.current().unwrap().song.name, "A");
        assert!(matches!(rx.try_recv(), Ok(ConnectionEvent::Start(_))));
    }

    #[test]
    fn test_finish_emits_end_once() {
        let mut transport = MockTransport::new();
        transport.expect_play().returning(|_, _| Ok(()));
        transport.expect_set_volume().return_const(());

        let connection = StreamConnection::new(
            SessionId(1),
            Arc::new(transport),
            PlayerOptions::default(),
        );
        let rx = connection.subscribe_to(ConnectionEventKind::End);

        connection.play(&song("A")).unwrap();
        let finished = connection.finish().unwrap();
        assert_eq!(finished.song.name, "A");
        assert!(matches!(rx.try_recv(), Ok(ConnectionEvent::End(_))));

        // Sin recurso activo no hay segundo End
        assert!(connection.finish().is_none());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_play_failure_propagates() {
        let mut transport = MockTransport::new();
        transport
            .expect_play()
            .returning(|_, _| Err(PlaybackError::SourceUnavailable("404".to_string())));

        let connection = StreamConnection::new(
            SessionId(1),
            Arc::new(transport),
            PlayerOptions::default(),
        );
        assert!(connection.play(&song("A")).is_err());
        assert!(connection.current().is_none());
    }
}
