//! # Audio Module
//!
//! Queue and playback-state core for voice-chat music sessions.
//!
//! This module provides the behavioral heart of the crate:
//!
//! ### [`queue`] - Queue Management
//! - Per-session pending list with the active song at the front
//! - Repeat-mode state machine (disabled / song / queue) driving song-end advances
//! - Cancellable idle timeout for empty channels and drained queues
//!
//! ### [`player`] - Session Coordination
//! - One queue per voice session, fully independent between sessions
//! - Options snapshot per queue, merged once at creation
//!
//! ### [`events`] - Event Vocabulary
//! - Closed set of queue lifecycle events with fixed payloads
//! - Fire-and-forget publish/subscribe per queue, filterable by event name
//!
//! ### [`connection`] - Streaming Connection
//! - The seam to the external voice transport (join/leave/stream)
//! - Low-level `start`/`end`/`error` events, one layer below the queue
//!
//! All state transitions are synchronous and fast; the actual audio I/O lives
//! behind the [`connection::VoiceTransport`] trait and is out of scope here.

pub mod connection;
pub mod events;
pub mod player;
pub mod queue;
