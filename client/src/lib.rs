//! # Draw-and-Guess Client Library
//!
//! This library provides the client side of a multiplayer drawing and guessing
//! game. It joins a room on a coordinator, renders the shared drawing surface,
//! and keeps the local view of the round in sync with what the coordinator
//! broadcasts.
//!
//! ## Architecture Overview
//!
//! The coordinator is authoritative for everything that matters: the roster,
//! scores, who draws, the secret word and the clock. The client only mirrors
//! those facts and derives its own permissions from them.
//!
//! ### One Channel, One Queue
//! A single [`network::Channel`] carries every notification for the process.
//! The active room subscribes to it, and its events are fed through
//! [`room::RoomClient::handle`] in arrival order together with local input.
//! Because the queue is strictly serialized, a round reset always clears the
//! surface before any stroke that arrived after it is painted.
//!
//! ### Local Echo
//! Strokes drawn by the local drawer are painted immediately and published as
//! segments. The coordinator does not echo them back. Remote segments are
//! painted with the same rasterizer, so every participant sees the same pixels.
//!
//! ### Derived Role
//! Whether the local participant draws, guesses or spectates is never stored.
//! It is recomputed from the current drawer and the seat assignment each time it
//! is needed, so it can never drift from the broadcasts.
//!
//! ## Module Organization
//!
//! ### Core (no windowing)
//! - `session`: join validation and connection state
//! - `network`: the framed TCP channel and its subscription slot
//! - `game`: round phase machine and role derivation
//! - `roster`: participant list and final standings
//! - `canvas`: the RGBA drawing surface
//! - `strokes`: local pointer strokes and brush settings
//! - `chat`: chat log, guess composer and typing presence
//! - `room`: the event-driven core tying the above together
//!
//! ### Presentation
//! - `layout`: window geometry
//! - `input`: mouse and keyboard sampling
//! - `app`: screen flow between join form, room and summary
//! - `rendering`: macroquad drawing of each screen
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::{Channel, ChannelConfig};
//! use client::room::{Event, RoomClient};
//! use client::session::Session;
//! use std::time::Instant;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let channel = Channel::connect("127.0.0.1:8080", ChannelConfig::default()).await?;
//!     let mut events = channel.subscribe();
//!
//!     let (session, join) = Session::join("Ann", "ABCD", channel.identity())?;
//!     channel.send(join);
//!
//!     let mut room = RoomClient::new(session);
//!     while let Some(event) = events.recv().await {
//!         for intent in room.handle(Event::from(event), Instant::now()) {
//!             channel.send(intent);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod app;
pub mod canvas;
pub mod chat;
pub mod game;
pub mod input;
pub mod layout;
pub mod network;
pub mod rendering;
pub mod room;
pub mod roster;
pub mod session;
pub mod strokes;
