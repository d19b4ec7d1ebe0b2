//! # Queue Module
//!
//! The per-session queue and its repeat-mode state machine.
//!
//! The pending list is a `VecDeque` whose front is the active song while the
//! queue is playing. All transitions run synchronously under a single mutex, so
//! song-end handling is atomic with respect to concurrent `skip`/`stop`/`add`
//! calls on the same queue; queues of different sessions share no state.
//!
//! What happens when the active song finishes normally depends on the queue's
//! [`RepeatMode`]:
//! - `Disabled` drops the finished song and plays the next one
//! - `Song` replays the finished song in place
//! - `Queue` rotates the finished song to the back
//!
//! Explicit `skip`/`stop` bypass the repeat policy. The idle timeout is an
//! explicit cancellable task per queue, armed when the channel or the queue
//! empties out and cancelled as soon as a song or a listener arrives.

use parking_lot::Mutex;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::audio::connection::{
    ConnectionEvent, PlaybackError, StreamConnection, VoiceTransport,
};
use crate::audio::events::{EventBus, PlayerEvent, PlayerEventKind};
use crate::config::{PlayOptions, PlayerOptions, PlaylistOptions};
use crate::model::{Playlist, RawPlaylist, RawSong, SessionId, Song};

/// Canciones que se recuerdan como historial de reproducción.
const MAX_HISTORY: usize = 50;

/// Política de avance de la cola al terminar la canción activa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    Disabled = 0,
    Song = 1,
    Queue = 2,
}

impl RepeatMode {
    /// Convierte el discriminante numérico (0/1/2) al modo.
    pub fn from_discriminant(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Disabled),
            1 => Some(Self::Song),
            2 => Some(Self::Queue),
            _ => None,
        }
    }

    pub fn discriminant(self) -> u8 {
        self as u8
    }
}

/// Error de las operaciones de mutación de la cola.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("la playlist no contiene canciones")]
    EmptyPlaylist,
    #[error("no hay ninguna canción reproduciéndose")]
    NothingPlaying,
}

/// Estado mutable de la cola, siempre detrás del mutex.
///
/// `songs.front()` es la canción activa mientras `playing` sea true.
struct QueueState {
    songs: VecDeque<Song>,
    playing: bool,
    repeat_mode: RepeatMode,
    history: Vec<Song>,
}

impl QueueState {
    fn new() -> Self {
        Self {
            songs: VecDeque::new(),
            playing: false,
            repeat_mode: RepeatMode::Disabled,
            history: Vec::new(),
        }
    }
}

/// Temporizador de inactividad: una tarea diferida y cancelable por cola.
struct IdleTimer {
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl IdleTimer {
    fn new() -> Self {
        Self {
            handle: Mutex::new(None),
        }
    }

    /// Programa `action` tras `delay`, reemplazando lo que hubiera pendiente.
    fn schedule(&self, delay: Duration, action: impl FnOnce() + Send + 'static) {
        self.cancel();
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!("⏱️ Sin runtime de tokio, temporizador de inactividad omitido");
            return;
        };
        *self.handle.lock() = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            action();
        }));
    }

    fn cancel(&self) {
        if let Some(handle) = self.handle.lock().take() {
            handle.abort();
        }
    }
}

/// Cola de reproducción de una sesión de voz.
///
/// Expone la superficie de mutación (`add_song`, `add_playlist`,
/// `set_repeat_mode`, `skip`, `stop`) y emite los [`PlayerEvent`] por su bus;
/// las notificaciones `notify_*` las llama la integración con el transporte.
pub struct Queue {
    session: SessionId,
    options: PlayerOptions,
    state: Arc<Mutex<QueueState>>,
    connection: Arc<StreamConnection>,
    events: EventBus<PlayerEvent>,
    idle_timer: IdleTimer,
}

impl Queue {
    pub fn new(
        session: SessionId,
        options: PlayerOptions,
        transport: Arc<dyn VoiceTransport>,
    ) -> Self {
        let connection = Arc::new(StreamConnection::new(
            session,
            transport,
            options.clone(),
        ));
        Self {
            session,
            options,
            state: Arc::new(Mutex::new(QueueState::new())),
            connection,
            events: EventBus::new(),
            idle_timer: IdleTimer::new(),
        }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Snapshot de opciones con el que se construyó la cola.
    pub fn options(&self) -> &PlayerOptions {
        &self.options
    }

    /// Se suscribe a todos los eventos de la cola.
    pub fn subscribe(&self) -> flume::Receiver<PlayerEvent> {
        self.events.subscribe()
    }

    /// Se suscribe solo a un tipo de evento.
    pub fn subscribe_to(&self, kind: PlayerEventKind) -> flume::Receiver<PlayerEvent> {
        self.events.subscribe_to(kind)
    }

    /// Se suscribe a los eventos de bajo nivel de la conexión de streaming.
    pub fn connection_events(&self) -> flume::Receiver<ConnectionEvent> {
        self.connection.subscribe()
    }

    /// Agrega una canción al final de la cola.
    ///
    /// Si la cola estaba inactiva arranca la reproducción y emite `SongFirst`.
    pub fn add_song(&self, raw: RawSong, options: &PlayOptions) -> Song {
        let mut state = self.state.lock();
        let song = Song::new(raw, options.requested_by);
        state.songs.push_back(song.clone());
        info!("➕ Agregado a la cola: {}", song.name);
        self.events
            .emit(PlayerEvent::SongAdd(self.session, song.clone()));
        self.idle_timer.cancel();
        if !state.playing {
            self.play_next_or_end(&mut state, None);
        }
        song
    }

    /// Agrega las canciones de una playlist, aplicando su política de carga.
    pub fn add_playlist(
        &self,
        raw: RawPlaylist,
        options: &PlaylistOptions,
    ) -> Result<Playlist, QueueError> {
        let playlist = Playlist::new(raw, self.session, options);
        if playlist.songs.is_empty() {
            return Err(QueueError::EmptyPlaylist);
        }

        let mut state = self.state.lock();
        state.songs.extend(playlist.songs.iter().cloned());
        info!(
            "➕ Agregadas {} canciones de la playlist {}",
            playlist.songs.len(),
            playlist.name
        );
        self.events
            .emit(PlayerEvent::PlaylistAdd(self.session, playlist.clone()));
        self.idle_timer.cancel();
        if !state.playing {
            self.play_next_or_end(&mut state, None);
        }
        Ok(playlist)
    }

    /// Cambia el modo de repetición.
    ///
    /// Aplica en la próxima evaluación de fin de canción; nunca interrumpe la
    /// canción que está sonando.
    pub fn set_repeat_mode(&self, mode: RepeatMode) {
        let mut state = self.state.lock();
        state.repeat_mode = mode;
        match mode {
            RepeatMode::Disabled => info!("➡️ Repetición desactivada"),
            RepeatMode::Song => info!("🔂 Repetir canción activado"),
            RepeatMode::Queue => info!("🔁 Repetir cola activado"),
        }
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.state.lock().repeat_mode
    }

    /// Salta la canción activa, ignorando el modo de repetición.
    pub fn skip(&self) -> Result<Song, QueueError> {
        let mut state = self.state.lock();
        if !state.playing {
            return Err(QueueError::NothingPlaying);
        }
        let Some(skipped) = state.songs.pop_front() else {
            return Err(QueueError::NothingPlaying);
        };
        self.connection.stop();
        Self::remember(&mut state, skipped.clone());
        info!("⏭️ Canción saltada: {}", skipped.name);
        self.play_next_or_end(&mut state, Some(skipped.clone()));
        Ok(skipped)
    }

    /// Detiene la reproducción y vacía la cola.
    pub fn stop(&self) {
        let mut state = self.state.lock();
        state.songs.clear();
        state.playing = false;
        self.idle_timer.cancel();
        self.connection.stop();
        info!("⏹️ Reproducción detenida ({})", self.session);
        if self.options.leave_on_stop {
            self.connection.leave();
        }
    }

    /// Pausa el stream activo.
    pub fn pause(&self) {
        if self.state.lock().playing {
            self.connection.pause();
            info!("⏸️ Reproducción pausada");
        }
    }

    /// Reanuda el stream pausado.
    pub fn resume(&self) {
        if self.state.lock().playing {
            self.connection.resume();
            info!("▶️ Reproducción reanudada");
        }
    }

    /// Vacía la cola pendiente sin tocar la canción activa.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        if state.playing {
            state.songs.truncate(1);
        } else {
            state.songs.clear();
        }
        info!("🗑️ Cola limpiada ({})", self.session);
    }

    /// Mezcla las canciones pendientes, dejando la activa en su lugar.
    pub fn shuffle(&self) {
        let mut state = self.state.lock();
        let start = usize::from(state.playing);
        let songs = state.songs.make_contiguous();
        if songs.len() > start + 1 {
            songs[start..].shuffle(&mut rand::thread_rng());
            info!("🔀 Cola mezclada");
        }
    }

    /// Ajusta el volumen (porcentaje, 100 = sin cambio).
    pub fn set_volume(&self, volume: f32) {
        let volume = if volume.is_finite() {
            volume.max(0.0)
        } else {
            self.options.volume
        };
        self.connection.set_volume(volume);
        info!("🔊 Volumen ajustado a {volume}%");
    }

    pub fn volume(&self) -> f32 {
        self.connection.volume()
    }

    /// Lista pendiente completa, con la activa al frente si hay alguna.
    pub fn songs(&self) -> Vec<Song> {
        self.state.lock().songs.iter().cloned().collect()
    }

    /// La canción que está sonando ahora.
    pub fn current_song(&self) -> Option<Song> {
        let state = self.state.lock();
        if state.playing {
            state.songs.front().cloned()
        } else {
            None
        }
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().playing
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().songs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.state.lock().songs.len()
    }

    /// Canciones ya reproducidas, de la más vieja a la más reciente.
    pub fn history(&self) -> Vec<Song> {
        self.state.lock().history.clone()
    }

    /// La canción activa terminó de forma natural; avanza según el modo.
    pub fn notify_song_end(&self) {
        let mut state = self.state.lock();
        if !state.playing {
            return;
        }
        self.connection.finish();
        let Some(finished) = state.songs.front().cloned() else {
            state.playing = false;
            return;
        };

        match state.repeat_mode {
            RepeatMode::Song => {
                debug!("🔂 Repitiendo canción: {}", finished.name);
                self.replay_front(&mut state, finished);
            }
            RepeatMode::Disabled => {
                state.songs.pop_front();
                Self::remember(&mut state, finished.clone());
                self.play_next_or_end(&mut state, Some(finished));
            }
            RepeatMode::Queue => {
                state.songs.rotate_left(1);
                if state.songs.len() == 1 {
                    debug!("🔁 Única canción en modo cola: {}", finished.name);
                    self.replay_front(&mut state, finished);
                } else {
                    debug!("🔁 Canción rotada al final: {}", finished.name);
                    self.play_next_or_end(&mut state, Some(finished));
                }
            }
        }
    }

    /// El transporte reportó una falla a mitad de la canción.
    ///
    /// Se reporta el error y se descarta la canción fallida sin importar el
    /// modo de repetición; repetir una canción que falla siempre sería un loop.
    pub fn notify_playback_error(&self, playback_error: PlaybackError) {
        let mut state = self.state.lock();
        error!("❌ Error de reproducción: {playback_error}");
        self.connection.fail(playback_error.clone());
        self.events.emit(PlayerEvent::Error(
            playback_error.to_string(),
            self.session,
        ));
        if !state.playing {
            return;
        }
        if let Some(failed) = state.songs.pop_front() {
            Self::remember(&mut state, failed.clone());
            self.play_next_or_end(&mut state, Some(failed));
        } else {
            state.playing = false;
        }
    }

    /// El canal de voz se quedó sin oyentes.
    pub fn notify_channel_empty(&self) {
        info!("👥 Canal de voz sin oyentes ({})", self.session);
        self.events.emit(PlayerEvent::ChannelEmpty(self.session));
        if self.options.leave_on_empty {
            self.schedule_idle_leave("canal vacío");
        }
    }

    /// Volvió a entrar un oyente antes de que venciera el timeout.
    pub fn notify_listener_joined(&self) {
        debug!("👤 Oyente presente, timeout cancelado ({})", self.session);
        self.idle_timer.cancel();
    }

    /// El bot fue desconectado del canal a la fuerza.
    ///
    /// La cola se conserva; la reproducción queda detenida hasta reconectar.
    pub fn notify_disconnect(&self) {
        let mut state = self.state.lock();
        warn!("🔌 Bot desconectado del canal ({})", self.session);
        state.playing = false;
        self.connection.reset();
        self.idle_timer.cancel();
        self.events.emit(PlayerEvent::ClientDisconnect(self.session));
    }

    /// Alguien desensordeció al bot después de entrar ensordecido.
    pub fn notify_undeafen(&self) {
        if !self.options.deafen_on_join {
            return;
        }
        info!("🔊 Bot desensordecido ({})", self.session);
        self.events.emit(PlayerEvent::ClientUndeafen(self.session));
    }

    /// Detiene todo y sale del canal; usado al cerrar la sesión.
    pub fn destroy(&self) {
        let mut state = self.state.lock();
        state.songs.clear();
        state.playing = false;
        self.idle_timer.cancel();
        self.connection.stop();
        self.connection.leave();
    }

    // Transiciones internas; siempre con el lock de estado tomado.

    /// Reproduce el frente de la cola.
    ///
    /// Con `previous` emite `SongChanged(nueva, anterior)`; sin él emite
    /// `SongFirst`. Las canciones que fallan al arrancar se descartan con su
    /// evento `Error` y se sigue con la siguiente; si la cola se agota emite
    /// exactamente un `QueueEnd`.
    fn play_next_or_end(&self, state: &mut QueueState, previous: Option<Song>) {
        loop {
            let Some(front) = state.songs.front().cloned() else {
                state.playing = false;
                info!("📭 No quedan canciones en la cola ({})", self.session);
                self.events.emit(PlayerEvent::QueueEnd(self.session));
                if self.options.leave_on_end {
                    self.schedule_idle_leave("fin de la cola");
                }
                return;
            };

            match self.connection.play(&front) {
                Ok(_) => {
                    state.playing = true;
                    match &previous {
                        Some(old) => {
                            info!("▶️ Ahora suena: {}", front.name);
                            self.events.emit(PlayerEvent::SongChanged(
                                self.session,
                                front,
                                old.clone(),
                            ));
                        }
                        None => {
                            info!("▶️ Primera canción de la cola: {}", front.name);
                            self.events
                                .emit(PlayerEvent::SongFirst(self.session, front));
                        }
                    }
                    return;
                }
                Err(playback_error) => {
                    error!("❌ Error al reproducir {}: {playback_error}", front.name);
                    self.connection.fail(playback_error.clone());
                    self.events.emit(PlayerEvent::Error(
                        playback_error.to_string(),
                        self.session,
                    ));
                    state.songs.pop_front();
                    Self::remember(state, front);
                }
            }
        }
    }

    /// Vuelve a arrancar la canción del frente sin emitir `SongChanged`:
    /// la canción activa no cambió.
    fn replay_front(&self, state: &mut QueueState, song: Song) {
        if let Err(playback_error) = self.connection.play(&song) {
            error!("❌ Error al repetir {}: {playback_error}", song.name);
            self.connection.fail(playback_error.clone());
            self.events.emit(PlayerEvent::Error(
                playback_error.to_string(),
                self.session,
            ));
            state.songs.pop_front();
            Self::remember(state, song.clone());
            self.play_next_or_end(state, Some(song));
        }
    }

    fn schedule_idle_leave(&self, reason: &'static str) {
        let state = Arc::clone(&self.state);
        let connection = Arc::clone(&self.connection);
        let session = self.session;
        debug!(
            "⏱️ Salida programada en {:?} por {reason} ({session})",
            self.options.timeout
        );
        self.idle_timer.schedule(self.options.timeout, move || {
            let mut state = state.lock();
            state.playing = false;
            connection.stop();
            connection.leave();
            info!("👋 Saliendo del canal por {reason} ({session})");
        });
    }

    fn remember(state: &mut QueueState, song: Song) {
        state.history.push(song);
        if state.history.len() > MAX_HISTORY {
            state.history.remove(0);
        }
    }
}

impl Drop for Queue {
    fn drop(&mut self) {
        self.idle_timer.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlayerOptionsOverrides;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    /// Transporte falso que registra lo que reproduce y puede fallar por nombre.
    #[derive(Default)]
    struct FakeTransport {
        played: Mutex<Vec<String>>,
        failing: Mutex<HashSet<String>>,
    }

    impl FakeTransport {
        fn played(&self) -> Vec<String> {
            self.played.lock().clone()
        }

        fn fail_on(&self, name: &str) {
            self.failing.lock().insert(name.to_string());
        }
    }

    impl VoiceTransport for FakeTransport {
        fn join(&self, _session: SessionId) -> Result<(), PlaybackError> {
            Ok(())
        }
        fn leave(&self, _session: SessionId) {}
        fn play(&self, song: &Song, _options: &PlayerOptions) -> Result<(), PlaybackError> {
            if self.failing.lock().contains(&song.name) {
                return Err(PlaybackError::SourceUnavailable(song.name.clone()));
            }
            self.played.lock().push(song.name.clone());
            Ok(())
        }
        fn stop(&self) {}
        fn pause(&self) {}
        fn resume(&self) {}
        fn set_volume(&self, _gain: f32) {}
        fn deafen(&self, _deaf: bool) {}
    }

    fn raw(name: &str) -> RawSong {
        RawSong {
            name: name.to_string(),
            author: "Autor".to_string(),
            url: format!("https://example.com/{name}"),
            thumbnail: String::new(),
            duration: "3:00".to_string(),
            is_live: false,
        }
    }

    fn queue_with(songs: &[&str]) -> (Queue, Arc<FakeTransport>) {
        let transport = Arc::new(FakeTransport::default());
        // Sin salidas automáticas para que los tests sean deterministas
        let options = PlayerOptions::merged(&PlayerOptionsOverrides {
            leave_on_end: Some(false),
            leave_on_empty: Some(false),
            ..Default::default()
        });
        let queue = Queue::new(SessionId(1), options, transport.clone());
        for name in songs {
            queue.add_song(raw(name), &PlayOptions::default());
        }
        (queue, transport)
    }

    fn names(songs: &[Song]) -> Vec<&str> {
        songs.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_disabled_advances_and_emits_song_changed_once() {
        let (queue, _transport) = queue_with(&["A", "B"]);
        let rx = queue.subscribe_to(PlayerEventKind::SongChanged);

        queue.notify_song_end();

        assert_eq!(names(&queue.songs()), vec!["B"]);
        match rx.try_recv() {
            Ok(PlayerEvent::SongChanged(session, new_song, old_song)) => {
                assert_eq!(session, SessionId(1));
                assert_eq!(new_song.name, "B");
                assert_eq!(old_song.name, "A");
            }
            other => panic!("se esperaba SongChanged, llegó {other:?}"),
        }
        assert!(rx.try_recv().is_err(), "SongChanged debe emitirse una sola vez");
    }

    #[test]
    fn test_song_mode_replays_without_event() {
        let (queue, transport) = queue_with(&["A", "B"]);
        queue.set_repeat_mode(RepeatMode::Song);
        let rx = queue.subscribe_to(PlayerEventKind::SongChanged);

        queue.notify_song_end();

        assert_eq!(names(&queue.songs()), vec!["A", "B"]);
        assert_eq!(transport.played(), vec!["A", "A"]);
        assert!(rx.try_recv().is_err(), "repetir la misma canción no emite SongChanged");
    }

    #[test]
    fn test_queue_mode_rotates_and_emits_song_changed() {
        let (queue, _transport) = queue_with(&["A", "B"]);
        queue.set_repeat_mode(RepeatMode::Queue);
        let rx = queue.subscribe_to(PlayerEventKind::SongChanged);

        queue.notify_song_end();

        assert_eq!(names(&queue.songs()), vec!["B", "A"]);
        match rx.try_recv() {
            Ok(PlayerEvent::SongChanged(_, new_song, old_song)) => {
                assert_eq!(new_song.name, "B");
                assert_eq!(old_song.name, "A");
            }
            other => panic!("se esperaba SongChanged, llegó {other:?}"),
        }
    }

    #[test]
    fn test_queue_mode_single_song_continues_silently() {
        let (queue, transport) = queue_with(&["A"]);
        queue.set_repeat_mode(RepeatMode::Queue);
        let rx = queue.subscribe();

        queue.notify_song_end();

        assert_eq!(names(&queue.songs()), vec!["A"]);
        assert_eq!(transport.played(), vec!["A", "A"]);
        assert!(rx.try_recv().is_err(), "no hay eventos al seguir con la misma canción");
    }

    #[test]
    fn test_queue_end_emitted_exactly_once() {
        let (queue, _transport) = queue_with(&["A"]);
        let rx = queue.subscribe();

        queue.notify_song_end();

        match rx.try_recv() {
            Ok(PlayerEvent::QueueEnd(session)) => assert_eq!(session, SessionId(1)),
            other => panic!("se esperaba QueueEnd, llegó {other:?}"),
        }
        assert!(rx.try_recv().is_err());
        assert!(!queue.is_playing());

        // Fin de canción sobre una cola ya terminada no hace nada
        queue.notify_song_end();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_first_add_emits_song_first_not_changed() {
        let (queue, _transport) = queue_with(&[]);
        let rx = queue.subscribe();

        queue.add_song(raw("A"), &PlayOptions::default());

        match rx.try_recv() {
            Ok(PlayerEvent::SongAdd(_, song)) => assert_eq!(song.name, "A"),
            other => panic!("se esperaba SongAdd, llegó {other:?}"),
        }
        match rx.try_recv() {
            Ok(PlayerEvent::SongFirst(_, song)) => assert_eq!(song.name, "A"),
            other => panic!("se esperaba SongFirst, llegó {other:?}"),
        }
        assert!(rx.try_recv().is_err());
        assert!(queue.is_playing());
    }

    #[test]
    fn test_add_after_queue_end_restarts_with_song_first() {
        let (queue, _transport) = queue_with(&["A"]);
        queue.notify_song_end();
        assert!(!queue.is_playing());

        let rx = queue.subscribe_to(PlayerEventKind::SongFirst);
        queue.add_song(raw("B"), &PlayOptions::default());

        assert!(matches!(rx.try_recv(), Ok(PlayerEvent::SongFirst(_, s)) if s.name == "B"));
        assert!(queue.is_playing());
    }

    #[test]
    fn test_mode_change_applies_on_next_end() {
        let (queue, transport) = queue_with(&["A", "B"]);

        // El cambio de modo no interrumpe la canción activa
        queue.set_repeat_mode(RepeatMode::Song);
        assert_eq!(transport.played(), vec!["A"]);
        assert_eq!(queue.current_song().unwrap().name, "A");

        queue.notify_song_end();
        assert_eq!(transport.played(), vec!["A", "A"]);
    }

    #[test]
    fn test_failed_song_is_skipped_with_error_event() {
        let (queue, transport) = queue_with(&["A", "B", "C"]);
        transport.fail_on("B");
        let rx = queue.subscribe();

        queue.notify_song_end();

        // B falló y se descartó; C quedó sonando
        assert_eq!(names(&queue.songs()), vec!["C"]);
        match rx.try_recv() {
            Ok(PlayerEvent::Error(message, session)) => {
                assert!(message.contains("B"));
                assert_eq!(session, SessionId(1));
            }
            other => panic!("se esperaba Error, llegó {other:?}"),
        }
        match rx.try_recv() {
            Ok(PlayerEvent::SongChanged(_, new_song, old_song)) => {
                assert_eq!(new_song.name, "C");
                assert_eq!(old_song.name, "A");
            }
            other => panic!("se esperaba SongChanged, llegó {other:?}"),
        }
    }

    #[test]
    fn test_playback_error_advances_regardless_of_repeat() {
        let (queue, transport) = queue_with(&["A", "B"]);
        queue.set_repeat_mode(RepeatMode::Song);
        let rx = queue.subscribe();

        queue.notify_playback_error(PlaybackError::StreamLost("corte".to_string()));

        assert_eq!(names(&queue.songs()), vec!["B"]);
        assert_eq!(transport.played(), vec!["A", "B"]);
        assert!(matches!(rx.try_recv(), Ok(PlayerEvent::Error(..))));
        assert!(matches!(rx.try_recv(), Ok(PlayerEvent::SongChanged(..))));
    }

    #[test]
    fn test_skip_bypasses_repeat_mode() {
        let (queue, _transport) = queue_with(&["A", "B"]);
        queue.set_repeat_mode(RepeatMode::Song);
        let rx = queue.subscribe_to(PlayerEventKind::SongChanged);

        let skipped = queue.skip().unwrap();
        assert_eq!(skipped.name, "A");
        assert_eq!(names(&queue.songs()), vec!["B"]);
        assert!(matches!(rx.try_recv(), Ok(PlayerEvent::SongChanged(..))));
    }

    #[test]
    fn test_skip_on_idle_queue_fails() {
        let (queue, _transport) = queue_with(&[]);
        assert_eq!(queue.skip(), Err(QueueError::NothingPlaying));
    }

    #[test]
    fn test_stop_clears_without_queue_end() {
        let (queue, _transport) = queue_with(&["A", "B"]);
        let rx = queue.subscribe();

        queue.stop();

        assert!(queue.is_empty());
        assert!(!queue.is_playing());
        assert!(rx.try_recv().is_err(), "stop explícito no emite QueueEnd");
    }

    #[test]
    fn test_clear_keeps_active_song() {
        let (queue, _transport) = queue_with(&["A", "B", "C"]);
        queue.clear();
        assert_eq!(names(&queue.songs()), vec!["A"]);
        assert!(queue.is_playing());
    }

    #[test]
    fn test_empty_playlist_is_rejected() {
        let (queue, _transport) = queue_with(&[]);
        let raw_playlist = RawPlaylist {
            name: "Vacía".to_string(),
            author: "DJ".to_string(),
            url: "https://example.com/empty".to_string(),
            songs: Vec::new(),
            kind: crate::model::PlaylistKind::Playlist,
        };
        assert_eq!(
            queue.add_playlist(raw_playlist, &PlaylistOptions::default()),
            Err(QueueError::EmptyPlaylist)
        );
    }

    #[test]
    fn test_disconnect_preserves_queue() {
        let (queue, _transport) = queue_with(&["A", "B"]);
        let rx = queue.subscribe_to(PlayerEventKind::ClientDisconnect);

        queue.notify_disconnect();

        assert!(matches!(rx.try_recv(), Ok(PlayerEvent::ClientDisconnect(_))));
        assert!(!queue.is_playing());
        assert_eq!(names(&queue.songs()), vec!["A", "B"]);
    }

    #[test]
    fn test_undeafen_only_when_deafened_on_join() {
        let (queue, _transport) = queue_with(&[]);
        let rx = queue.subscribe();
        queue.notify_undeafen();
        assert!(rx.try_recv().is_err(), "sin deafen_on_join no hay evento");

        let transport = Arc::new(FakeTransport::default());
        let options = PlayerOptions::merged(&PlayerOptionsOverrides {
            deafen_on_join: Some(true),
            ..Default::default()
        });
        let deafened = Queue::new(SessionId(2), options, transport);
        let rx = deafened.subscribe();
        deafened.notify_undeafen();
        assert!(matches!(rx.try_recv(), Ok(PlayerEvent::ClientUndeafen(_))));
    }

    #[test]
    fn test_history_records_finished_songs() {
        let (queue, _transport) = queue_with(&["A", "B"]);
        queue.notify_song_end();
        assert_eq!(names(&queue.history()), vec!["A"]);
    }

    #[test]
    fn test_repeat_mode_discriminants() {
        assert_eq!(RepeatMode::from_discriminant(0), Some(RepeatMode::Disabled));
        assert_eq!(RepeatMode::from_discriminant(1), Some(RepeatMode::Song));
        assert_eq!(RepeatMode::from_discriminant(2), Some(RepeatMode::Queue));
        assert_eq!(RepeatMode::from_discriminant(3), None);
        assert_eq!(RepeatMode::Queue.discriminant(), 2);
    }
}
