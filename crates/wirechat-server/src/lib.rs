//! wirechat-server library crate.
//!
//! This crate provides the chat relay engine: it accepts raw TCP
//! connections, upgrades them with the handshake from `wirechat-core`,
//! keeps a registry of live peers, and fans every inbound text frame out to
//! all of them.
//!
//! # Architecture
//!
//! ```text
//! Chat client  (masked text frames over TCP)
//!         ↕
//! [wirechat-server]
//!   ├── domain/           ServerConfig (pure types, no I/O)
//!   ├── application/      ChatHub: registry, broadcast, single-writer event loop
//!   └── infrastructure/
//!         ├── upgrade/    Read the upgrade request, extract the client key
//!         └── ws_server/  Accept loop, per-session tasks, heartbeat
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no external dependencies (no I/O, no async, no frameworks).
//! - `application` depends on `domain` and `wirechat-core` only; it owns all
//!   registry state and is driven purely through its event channel.
//! - `infrastructure` depends on all other layers plus `tokio`; it is the
//!   only layer that touches sockets.

/// Domain layer: pure configuration types (no I/O).
pub mod domain;

/// Application layer: connection registry and broadcast event loop.
pub mod application;

/// Infrastructure layer: TCP accept loop and per-session lifecycle.
pub mod infrastructure;
