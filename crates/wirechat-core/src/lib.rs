//! # wirechat-core
//!
//! Shared library for WireChat containing the wire framing codec and the
//! upgrade handshake computation.
//!
//! This crate is used by the server binary and by anything else that needs to
//! speak the WireChat wire protocol.  It has zero dependencies on sockets,
//! async runtimes, or the OS: every function is a pure transformation from
//! bytes to bytes.
//!
//! # Architecture overview
//!
//! WireChat is a minimal text-chat relay layered directly on raw TCP.  A
//! client opens a TCP connection, performs a one-time upgrade handshake, and
//! from then on exchanges binary frames carrying short UTF-8 text payloads.
//! The server fans every inbound message out to all connected peers.
//!
//! This crate defines the two stateless halves of that protocol:
//!
//! - **`protocol::handshake`** – Computes the accept key and the full
//!   CRLF-delimited `101` response block from the client's handshake key.
//!
//! - **`protocol::frame`** – Encodes and decodes the binary framing: a
//!   one-byte opcode, a variable-width payload length, an optional 4-byte
//!   mask, and the payload itself.  Client-to-server payloads arrive masked;
//!   server-to-client frames are sent unmasked.

pub mod protocol;

// Re-export the most-used items at the crate root so callers can write
// `wirechat_core::decode_frame` instead of the full module path.
pub use protocol::frame::{
    decode_frame, encode_client_frame, encode_text_frame, unmask, DecodedFrame, FrameError,
    MASK_LENGTH, PING_FRAME, TEXT_FRAME,
};
pub use protocol::handshake::{accept_key, upgrade_response, HANDSHAKE_GUID};
