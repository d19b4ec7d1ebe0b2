//! # Player Module
//!
//! Top-level owner of the per-session queues.
//!
//! The player holds its resolved [`PlayerOptions`] and a concurrent map of
//! queues keyed by [`SessionId`]; every queue gets its own options snapshot
//! when it is created. Queues of different sessions are fully independent.

use dashmap::DashMap;
use std::sync::Arc;
use tracing::info;

use crate::audio::connection::{PlaybackError, VoiceTransport};
use crate::audio::queue::Queue;
use crate::config::{PlayerOptions, PlayerOptionsOverrides};
use crate::model::SessionId;

/// Dueño de cero o más colas, una por sesión de voz.
pub struct Player {
    queues: DashMap<SessionId, Arc<Queue>>,
    options: PlayerOptions,
}

impl Player {
    /// Crea el reproductor mezclando los overrides sobre los defaults.
    pub fn new(overrides: &PlayerOptionsOverrides) -> Self {
        Self {
            queues: DashMap::new(),
            options: PlayerOptions::merged(overrides),
        }
    }

    pub fn options(&self) -> &PlayerOptions {
        &self.options
    }

    /// Crea la cola de una sesión, uniéndose al canal de voz.
    ///
    /// Si la sesión ya tiene cola, devuelve la existente.
    pub fn create_queue(
        &self,
        session: SessionId,
        transport: Arc<dyn VoiceTransport>,
    ) -> Result<Arc<Queue>, PlaybackError> {
        self.create_queue_with(session, transport, &PlayerOptionsOverrides::default())
    }

    /// Como [`Self::create_queue`] pero con overrides propios de la cola.
    pub fn create_queue_with(
        &self,
        session: SessionId,
        transport: Arc<dyn VoiceTransport>,
        overrides: &PlayerOptionsOverrides,
    ) -> Result<Arc<Queue>, PlaybackError> {
        if let Some(queue) = self.queues.get(&session) {
            return Ok(Arc::clone(&queue));
        }

        let options = self.options.apply(overrides);
        transport.join(session)?;
        if options.deafen_on_join {
            transport.deafen(true);
        }

        let queue = Arc::new(Queue::new(session, options, transport));
        self.queues.insert(session, Arc::clone(&queue));
        info!("🎧 Cola creada para la sesión {session}");
        Ok(queue)
    }

    /// La cola de una sesión, si existe.
    pub fn get_queue(&self, session: SessionId) -> Option<Arc<Queue>> {
        self.queues.get(&session).map(|q| Arc::clone(&q))
    }

    pub fn has_queue(&self, session: SessionId) -> bool {
        self.queues.contains_key(&session)
    }

    /// Cierra la sesión: detiene la cola, sale del canal y la descarta.
    pub fn leave(&self, session: SessionId) -> bool {
        match self.queues.remove(&session) {
            Some((_, queue)) => {
                queue.destroy();
                info!("👋 Sesión cerrada: {session}");
                true
            }
            None => false,
        }
    }

    /// Sesiones con cola activa.
    pub fn sessions(&self) -> Vec<SessionId> {
        self.queues.iter().map(|entry| *entry.key()).collect()
    }

    pub fn len(&self) -> usize {
        self.queues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new(&PlayerOptionsOverrides::default())
    }
}
