//! # Events Module
//!
//! The closed event vocabulary emitted at the queue boundary, plus the
//! publish/subscribe channel that carries it.
//!
//! Subscribers register per queue and optionally per event name; emission is
//! fire-and-forget over unbounded channels, so a slow or dropped subscriber can
//! never block a state transition or corrupt queue state. Events are delivered
//! in emission order, which follows the causal order of the state machine:
//! `SongFirst` always precedes any `SongChanged` of the same playback run and
//! `QueueEnd` only fires after the last transition resolved.

use parking_lot::Mutex;

use crate::model::{Playlist, SessionId, Song};

/// Evento del ciclo de vida de una cola.
///
/// Los payloads son posicionales y cerrados; la cola se referencia por su
/// [`SessionId`] para no crear ciclos de propiedad.
#[derive(Debug, Clone)]
pub enum PlayerEvent {
    /// El canal de voz se quedó sin oyentes
    ChannelEmpty(SessionId),
    /// Se agregó una canción al final de la cola
    SongAdd(SessionId, Song),
    /// Se agregaron las canciones de una playlist
    PlaylistAdd(SessionId, Playlist),
    /// No queda nada por reproducir y el modo de repetición no rellena
    QueueEnd(SessionId),
    /// La canción activa cambió: (cola, nueva, anterior)
    SongChanged(SessionId, Song, Song),
    /// Arrancó la primera canción de una cola que estaba vacía
    SongFirst(SessionId, Song),
    /// El bot fue desconectado del canal a la fuerza
    ClientDisconnect(SessionId),
    /// El bot fue desensordecido después de entrar ensordecido
    ClientUndeafen(SessionId),
    /// Error recuperable: (mensaje, cola); la cola sigue funcionando
    Error(String, SessionId),
}

/// Nombre de evento, para suscripciones filtradas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerEventKind {
    ChannelEmpty,
    SongAdd,
    PlaylistAdd,
    QueueEnd,
    SongChanged,
    SongFirst,
    ClientDisconnect,
    ClientUndeafen,
    Error,
}

impl PlayerEvent {
    /// Nombre del evento.
    pub fn kind(&self) -> PlayerEventKind {
        match self {
            Self::ChannelEmpty(_) => PlayerEventKind::ChannelEmpty,
            Self::SongAdd(..) => PlayerEventKind::SongAdd,
            Self::PlaylistAdd(..) => PlayerEventKind::PlaylistAdd,
            Self::QueueEnd(_) => PlayerEventKind::QueueEnd,
            Self::SongChanged(..) => PlayerEventKind::SongChanged,
            Self::SongFirst(..) => PlayerEventKind::SongFirst,
            Self::ClientDisconnect(_) => PlayerEventKind::ClientDisconnect,
            Self::ClientUndeafen(_) => PlayerEventKind::ClientUndeafen,
            Self::Error(..) => PlayerEventKind::Error,
        }
    }

    /// Cola a la que pertenece el evento.
    pub fn session(&self) -> SessionId {
        match self {
            Self::ChannelEmpty(s)
            | Self::SongAdd(s, _)
            | Self::PlaylistAdd(s, _)
            | Self::QueueEnd(s)
            | Self::SongChanged(s, ..)
            | Self::SongFirst(s, _)
            | Self::ClientDisconnect(s)
            | Self::ClientUndeafen(s)
            | Self::Error(_, s) => *s,
        }
    }
}

/// Evento con nombre, emisible por un [`EventBus`].
pub trait BusEvent: Clone + Send {
    type Kind: Copy + PartialEq + Send;

    fn kind(&self) -> Self::Kind;
}

impl BusEvent for PlayerEvent {
    type Kind = PlayerEventKind;

    fn kind(&self) -> PlayerEventKind {
        self.kind()
    }
}

struct Subscriber<E: BusEvent> {
    tx: flume::Sender<E>,
    filter: Option<E::Kind>,
}

/// Canal de publicación/suscripción tipado de una cola.
///
/// Los receptores desconectados se podan en la siguiente emisión.
pub struct EventBus<E: BusEvent> {
    subscribers: Mutex<Vec<Subscriber<E>>>,
}

impl<E: BusEvent> EventBus<E> {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Se suscribe a todos los eventos del bus.
    pub fn subscribe(&self) -> flume::Receiver<E> {
        self.register(None)
    }

    /// Se suscribe solo a los eventos con el nombre dado.
    pub fn subscribe_to(&self, kind: E::Kind) -> flume::Receiver<E> {
        self.register(Some(kind))
    }

    fn register(&self, filter: Option<E::Kind>) -> flume::Receiver<E> {
        let (tx, rx) = flume::unbounded();
        self.subscribers.lock().push(Subscriber { tx, filter });
        rx
    }

    /// Emite un evento a todos los suscriptores interesados, sin bloquear.
    pub fn emit(&self, event: E) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|s| match s.filter {
            Some(kind) if kind != event.kind() => true,
            _ => s.tx.send(event.clone()).is_ok(),
        });
    }

    /// Cantidad de suscriptores vivos.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

impl<E: BusEvent> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}
