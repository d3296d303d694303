//! Protocol module containing the framing codec and the handshake negotiator.

pub mod frame;
pub mod handshake;

pub use frame::{decode_frame, encode_text_frame, unmask, DecodedFrame, FrameError};
pub use handshake::{accept_key, upgrade_response};
