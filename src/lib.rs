//! # Open Queue
//!
//! Queue and playback-state core for Discord-style music bots.
//!
//! The crate models what a music session *is* - songs, playlists, options,
//! the repeat-mode state machine and the event vocabulary - and leaves what a
//! session *does on the wire* (gateway I/O, audio encoding, search resolution)
//! to external collaborators behind the [`VoiceTransport`] trait and the raw
//! record types.
//!
//! ## Quick tour
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use open_queue::{
//!     Player, PlayerOptionsOverrides, PlayOptions, RawSong, SessionId, VoiceTransport,
//! };
//!
//! # fn example(transport: Arc<dyn VoiceTransport>) -> Result<(), open_queue::PlaybackError> {
//! let player = Player::new(&PlayerOptionsOverrides {
//!     volume: Some(50.0),
//!     ..Default::default()
//! });
//!
//! let queue = player.create_queue(SessionId(1), transport)?;
//! let events = queue.subscribe();
//!
//! let raw = RawSong {
//!     name: "Nightcall".into(),
//!     author: "Kavinsky".into(),
//!     url: "https://example.com/nightcall".into(),
//!     thumbnail: "https://example.com/thumb.jpg".into(),
//!     duration: "4:18".into(),
//!     is_live: false,
//! };
//! queue.add_song(raw, &PlayOptions::default());
//! # Ok(())
//! # }
//! ```
//!
//! The resolver that produces [`RawSong`]/[`RawPlaylist`] data and the driver
//! that reports song end/error back to the queue are the embedder's job; the
//! queue reacts through its `notify_*` surface and reports through its events.

pub mod audio;
pub mod config;
pub mod model;

pub use audio::connection::{
    AudioResource, ConnectionEvent, ConnectionEventKind, PlaybackError, StreamConnection,
    VoiceTransport,
};
pub use audio::events::{EventBus, PlayerEvent, PlayerEventKind};
pub use audio::player::Player;
pub use audio::queue::{Queue, QueueError, RepeatMode};
pub use config::{
    DurationFilter, PlayOptions, PlayOptionsOverrides, PlayerOptions, PlayerOptionsOverrides,
    PlaylistOptions, PlaylistOptionsOverrides, SearchSort, StreamQuality, UploadDateFilter,
};
pub use model::{Playlist, PlaylistKind, RawPlaylist, RawSong, SessionId, Song, UserId};
