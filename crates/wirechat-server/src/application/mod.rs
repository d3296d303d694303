//! Application layer for wirechat-server.
//!
//! Owns the connection registry and the broadcast logic.  Everything here is
//! driven through [`hub::HubEvent`] values arriving on a channel; no socket
//! types appear in this layer.

pub mod hub;

pub use hub::{join_notice, run_hub, ChatHub, ConnectionId, HubEvent};
