//! Chat relay server: accept loop and per-session lifecycle.
//!
//! This module is responsible for:
//!
//! 1. Binding a TCP listener on the configured address.
//! 2. Accepting incoming connections and spawning one session task each.
//! 3. Completing the upgrade handshake on every new connection.
//! 4. Registering the connection with the hub and wiring its three loops:
//!    - **Reader**: decodes inbound text frames and forwards them to the hub.
//!    - **Writer**: drains the outbound frame channel onto the socket.
//!    - **Heartbeat**: enqueues the ping frame at the configured interval.
//! 5. Deregistering the connection when any of the three loops ends.
//!
//! # Cancellation
//!
//! The three loops run as plain futures inside one `select!`, not as nested
//! spawned tasks.  When any loop finishes, leaving the `select!` drops the
//! other two, so the heartbeat timer is cancelled on every termination path
//! and exactly one `Leave` event reaches the hub.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::{anyhow, Context};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::{interval, timeout};
use tracing::{debug, error, info, trace, warn};
use uuid::Uuid;

use wirechat_core::{decode_frame, unmask, upgrade_response, PING_FRAME, TEXT_FRAME};

use crate::application::hub::{run_hub, HubEvent};
use crate::domain::ServerConfig;
use crate::infrastructure::upgrade::{extract_websocket_key, read_upgrade_request};

// ── Public API ────────────────────────────────────────────────────────────────

/// Binds the listener from `config` and runs the relay until `running` is
/// cleared.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot be bound (port in use, no
/// permission).  This is the only failure that is fatal to the process;
/// everything later is scoped to a single connection.
pub async fn run_server(config: ServerConfig, running: Arc<AtomicBool>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind listener on {}", config.bind_addr))?;
    serve(listener, config, running).await
}

/// Runs the relay on an already-bound listener until `running` is cleared.
///
/// Split out from [`run_server`] so tests can bind an ephemeral port first
/// and learn its address.
pub async fn serve(
    listener: TcpListener,
    config: ServerConfig,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    info!(
        "chat relay listening on {}",
        listener.local_addr().context("listener has no local addr")?
    );

    // The hub task is the single owner of the connection registry; every
    // session reaches it through this channel.
    let (hub_tx, hub_rx) = mpsc::channel::<HubEvent>(64);
    tokio::spawn(run_hub(hub_rx));

    loop {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping accept loop");
            break;
        }

        // A short timeout on accept() lets the loop poll the shutdown flag
        // even when no clients are connecting.
        match timeout(Duration::from_millis(200), listener.accept()).await {
            Ok(Ok((stream, peer_addr))) => {
                info!("new connection from {peer_addr}");
                let hub = hub_tx.clone();
                let heartbeat_interval = config.heartbeat_interval;
                tokio::spawn(async move {
                    handle_connection(stream, peer_addr, heartbeat_interval, hub).await;
                });
            }
            Ok(Err(e)) => {
                // Transient accept failure; keep serving the other peers.
                error!("accept error: {e}");
            }
            Err(_) => {
                // Timeout; loop back to check the shutdown flag.
            }
        }
    }

    Ok(())
}

// ── Per-session handler ───────────────────────────────────────────────────────

/// Entry point of each per-connection task.  Wraps [`run_session`] and logs
/// the outcome, so `?` can be used freely inside.
async fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    heartbeat_interval: Duration,
    hub: mpsc::Sender<HubEvent>,
) {
    match run_session(stream, peer_addr, heartbeat_interval, hub).await {
        Ok(()) => info!("session {peer_addr} closed"),
        Err(e) => warn!("session {peer_addr} terminated: {e:#}"),
    }
}

/// Runs the complete lifecycle of one connection.
///
/// ```text
/// CONNECTING: read upgrade request, extract key, write 101 response
///       OPEN: Join sent; reader / writer / heartbeat loops race in select!
///     CLOSED: first loop to finish wins; Leave sent exactly once
/// ```
async fn run_session(
    mut stream: TcpStream,
    peer_addr: SocketAddr,
    heartbeat_interval: Duration,
    hub: mpsc::Sender<HubEvent>,
) -> anyhow::Result<()> {
    // ── CONNECTING: upgrade handshake ─────────────────────────────────────────
    let request = read_upgrade_request(&mut stream)
        .await
        .with_context(|| format!("upgrade request from {peer_addr}"))?;

    let key = extract_websocket_key(&request)
        .ok_or_else(|| anyhow!("upgrade request from {peer_addr} has no Sec-WebSocket-Key"))?;

    stream
        .write_all(upgrade_response(&key).as_bytes())
        .await
        .context("writing upgrade response")?;

    debug!("session {peer_addr}: handshake complete");

    // ── OPEN: register and run the three loops ────────────────────────────────
    let id = Uuid::new_v4();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Vec<u8>>();
    hub.send(HubEvent::Join {
        id,
        outbound: outbound_tx.clone(),
    })
    .await
    .map_err(|_| anyhow!("hub event loop is gone"))?;

    let (mut read_half, mut write_half) = stream.into_split();

    tokio::select! {
        // Reader: inbound frames toward the hub.
        () = async {
            let mut buf = vec![0u8; 64 * 1024];
            loop {
                let n = match read_half.read(&mut buf).await {
                    Ok(0) => {
                        debug!("connection {id}: peer closed the stream");
                        break;
                    }
                    Ok(n) => n,
                    Err(e) => {
                        debug!("connection {id}: read error: {e}");
                        break;
                    }
                };
                let data = &buf[..n];

                // Only final text frames are relayed; every other inbound
                // frame kind is dropped without a decode attempt.
                if data[0] != TEXT_FRAME {
                    trace!("connection {id}: ignoring frame kind 0x{:02X}", data[0]);
                    continue;
                }

                let message = match decode_frame(data) {
                    Ok(frame) => unmask(frame.mask, frame.payload),
                    Err(e) => {
                        // The stream is no longer at a trustworthy frame
                        // boundary; this connection is done.
                        warn!("connection {id}: {e}; terminating");
                        break;
                    }
                };

                if hub.send(HubEvent::Message { id, payload: message }).await.is_err() {
                    break;
                }
            }
        } => {
            debug!("connection {id}: reader loop ended");
        }

        // Writer: outbound frames onto the socket.
        () = async {
            while let Some(frame) = outbound_rx.recv().await {
                if let Err(e) = write_half.write_all(&frame).await {
                    debug!("connection {id}: write error: {e}");
                    break;
                }
            }
        } => {
            debug!("connection {id}: writer loop ended");
        }

        // Heartbeat: one ping frame per interval, no reply awaited.
        () = async {
            let mut ticker = interval(heartbeat_interval);
            ticker.tick().await; // Skip the immediate first tick.
            loop {
                ticker.tick().await;
                if outbound_tx.send(PING_FRAME.to_vec()).is_err() {
                    break;
                }
                trace!("connection {id}: ping");
            }
        } => {
            debug!("connection {id}: heartbeat loop ended");
        }
    }

    // ── CLOSED: deregister exactly once ───────────────────────────────────────
    let _ = hub.send(HubEvent::Leave { id }).await;
    Ok(())
}
