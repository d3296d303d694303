//! Upgrade request handling.
//!
//! The first bytes on every new connection are a plaintext, CRLF-delimited
//! HTTP-style upgrade request.  This module reads that request off the
//! socket and extracts the one header the engine needs: the client's
//! `Sec-WebSocket-Key`.  Everything after the key is extracted belongs to
//! the framing layer.

use anyhow::{bail, Context};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Upper bound on the upgrade request size.  A peer that sends more than
/// this before the terminating blank line is not speaking the protocol.
pub const MAX_UPGRADE_REQUEST: usize = 8 * 1024;

/// Reads from `reader` until the blank line that terminates the upgrade
/// request, returning the whole request as text.
///
/// # Errors
///
/// Fails if the connection closes before the request completes, the request
/// exceeds [`MAX_UPGRADE_REQUEST`] bytes, the bytes are not valid UTF-8, or
/// the underlying read fails.
pub async fn read_upgrade_request<R>(reader: &mut R) -> anyhow::Result<String>
where
    R: AsyncRead + Unpin,
{
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];

    loop {
        let n = reader
            .read(&mut buf)
            .await
            .context("reading upgrade request")?;
        if n == 0 {
            bail!("connection closed before the upgrade request completed");
        }
        request.extend_from_slice(&buf[..n]);

        if request.windows(4).any(|window| window == b"\r\n\r\n") {
            break;
        }
        if request.len() > MAX_UPGRADE_REQUEST {
            bail!("upgrade request exceeds {MAX_UPGRADE_REQUEST} bytes");
        }
    }

    String::from_utf8(request).context("upgrade request is not valid UTF-8")
}

/// Extracts the `Sec-WebSocket-Key` header value from an upgrade request.
///
/// Header names are matched case-insensitively; the value is returned with
/// surrounding whitespace trimmed.  Returns `None` when the header is
/// absent, which the caller must treat as a fatal precondition failure for
/// that connection.
pub fn extract_websocket_key(request: &str) -> Option<String> {
    request.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        if name.trim().eq_ignore_ascii_case("sec-websocket-key") {
            Some(value.trim().to_string())
        } else {
            None
        }
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
