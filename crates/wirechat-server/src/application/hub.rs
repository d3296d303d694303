//! ChatHub: the connection registry and broadcast fan-out.
//!
//! The hub is the single place where the set of live connections is mutated.
//! Session tasks never touch the registry directly: they send [`HubEvent`]
//! values into the channel consumed by [`run_hub`], and the hub task applies
//! them one at a time.  Registry mutation and broadcast iteration therefore
//! never interleave, without any locking.
//!
//! # Connection lifecycle
//!
//! ```text
//! CONNECTING ──► OPEN ──► CLOSED
//! ```
//!
//! - `CONNECTING→OPEN`: the session completed the upgrade handshake and sent
//!   `Join`; the hub registers the peer and broadcasts a join notice stating
//!   the new total (delivered to every peer, the newcomer included).
//! - `OPEN→OPEN`: a decoded inbound message arrives as `Message`; the hub
//!   broadcasts it verbatim to every registered peer, the sender included.
//! - `OPEN→CLOSED`: the session ended for any reason and sent `Leave`; the
//!   hub drops the peer's outbound handle.  Terminal.
//!
//! There is no retry logic: a failure only ever ends the one affected
//! connection, and the affected connection announces its own `Leave`.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use wirechat_core::encode_text_frame;

/// Identity of one live connection.
pub type ConnectionId = Uuid;

/// Events sent by session tasks into the hub event loop.
#[derive(Debug)]
pub enum HubEvent {
    /// A connection finished its handshake and is ready to receive frames.
    Join {
        id: ConnectionId,
        /// Ready-to-write wire frames are pushed here; the connection's
        /// writer task drains them.  Sending never blocks.
        outbound: mpsc::UnboundedSender<Vec<u8>>,
    },
    /// A decoded, unmasked text message arrived from a connection.
    Message { id: ConnectionId, payload: Vec<u8> },
    /// The connection terminated (end-of-stream, close, or error).
    Leave { id: ConnectionId },
}

/// The set of currently-open peer connections.
///
/// Membership-only: the registry stores nothing about a peer beyond the
/// handle used to reach its writer task.  A peer is present iff its
/// handshake completed and its `Leave` has not yet been processed.
#[derive(Default)]
pub struct ChatHub {
    peers: HashMap<ConnectionId, mpsc::UnboundedSender<Vec<u8>>>,
}

impl ChatHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a peer.
    pub fn add(&mut self, id: ConnectionId, outbound: mpsc::UnboundedSender<Vec<u8>>) {
        self.peers.insert(id, outbound);
    }

    /// Removes a peer.  Returns `false` if it was already gone, so a second
    /// `Leave` for the same connection is harmless.
    pub fn remove(&mut self, id: ConnectionId) -> bool {
        self.peers.remove(&id).is_some()
    }

    /// Number of registered peers.
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Encodes `payload` as a text frame once and sends a copy to every
    /// registered peer, in unspecified order, including the originator.
    ///
    /// A send only fails when the peer's writer task is already gone; the
    /// failure is logged and the loop continues, because delivery to the
    /// remaining peers must not depend on any single connection.  The dead
    /// peer is removed by its own `Leave` event, not here.
    pub fn broadcast(&self, payload: &[u8]) {
        let frame = encode_text_frame(payload);
        for (id, outbound) in &self.peers {
            if outbound.send(frame.clone()).is_err() {
                warn!("connection {id}: dropped broadcast frame (writer gone)");
            }
        }
    }
}

/// Join notice broadcast when a connection is registered.
pub fn join_notice(online: usize) -> String {
    format!("A new participant has joined the chat. {online} online.")
}

/// Runs the hub event loop until every event sender is dropped.
///
/// This task is the single writer context for the registry: sessions only
/// communicate with it through the `events` channel, so the order of
/// mutations is exactly the order events were queued.
pub async fn run_hub(mut events: mpsc::Receiver<HubEvent>) {
    let mut hub = ChatHub::new();

    while let Some(event) = events.recv().await {
        match event {
            HubEvent::Join { id, outbound } => {
                hub.add(id, outbound);
                info!("connection {id} joined ({} online)", hub.len());
                hub.broadcast(join_notice(hub.len()).as_bytes());
            }
            HubEvent::Message { id, payload } => {
                debug!("connection {id}: relaying {} bytes", payload.len());
                hub.broadcast(&payload);
            }
            HubEvent::Leave { id } => {
                if hub.remove(id) {
                    info!("connection {id} left ({} online)", hub.len());
                }
            }
        }
    }

    debug!("hub event channel closed; stopping");
}

// ── Tests ─────────────────────────────────────────────────────────────────────
