//! Infrastructure layer for wirechat-server.
//!
//! The only layer that touches sockets.  It binds the TCP listener, reads
//! the upgrade request off each new connection, and runs the per-session
//! reader/writer/heartbeat loops.  Registry state lives in the application
//! layer and is reached exclusively through the hub event channel.

pub mod upgrade;
pub mod ws_server;

// Re-export the primary entry points so `main.rs` can call them concisely.
pub use ws_server::{run_server, serve};
