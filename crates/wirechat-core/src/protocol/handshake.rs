//! Upgrade handshake computation.
//!
//! A client opens the session with an HTTP-style upgrade request carrying a
//! `Sec-WebSocket-Key` header.  The server proves it understood the request
//! by hashing that key with a fixed protocol constant and echoing the result
//! back in a `101` response, after which both sides switch to the binary
//! framing in [`crate::protocol::frame`].
//!
//! Everything here is a pure function of the client key.  There is no error
//! path: the caller must reject a request without a key before calling in.

use base64::prelude::*;
use sha1::{Digest, Sha1};

/// Protocol constant appended to the client key before hashing.
pub const HANDSHAKE_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Computes the accept value for a client handshake key:
/// `Base64(SHA-1(key ++ HANDSHAKE_GUID))`.
///
/// # Examples
///
/// ```rust
/// use wirechat_core::accept_key;
///
/// // The standard reference vector.
/// assert_eq!(
///     accept_key("dGhlIHNhbXBsZSBub25jZQ=="),
///     "s3pPLMBiTxaQ9kYGzzhZRbK+xOo="
/// );
/// ```
pub fn accept_key(client_key: &str) -> String {
    let mut sha1 = Sha1::new();
    sha1.update(client_key.as_bytes());
    sha1.update(HANDSHAKE_GUID.as_bytes());
    let digest = sha1.finalize();
    BASE64_STANDARD.encode(&digest[..])
}

/// Builds the complete CRLF-delimited upgrade response block for `client_key`.
///
/// The response is written back verbatim on the same channel that supplied
/// the key, terminated by an empty line:
///
/// ```text
/// HTTP/1.1 101
/// Upgrade: websocket
/// Connection: Upgrade
/// Sec-WebSocket-Accept: <accept>
/// ```
pub fn upgrade_response(client_key: &str) -> String {
    format!(
        "HTTP/1.1 101\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Accept: {}\r\n\
         \r\n",
        accept_key(client_key)
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────
