//! Frame types and the outbound/inbound message value.
//!
//! A [`Message`] is a frame type tag plus a byte payload. It is the unit
//! handed from callers to the write loop and from the read loop to the
//! receive callback.
//!
//! # Example
//!
//! ```
//! use persistent_ws::{FrameType, Message};
//!
//! let msg = Message::text("hello");
//! assert_eq!(msg.frame_type(), FrameType::Text);
//! assert_eq!(msg.payload(), b"hello");
//!
//! let raw = Message::new(FrameType::Binary, vec![0, 159, 255]).unwrap();
//! assert_eq!(raw.len(), 3);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

use crate::error::{Error, Result};

// ============================================================================
// FrameType
// ============================================================================

/// WebSocket frame type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameType {
    /// UTF-8 text data frame.
    Text,
    /// Binary data frame.
    Binary,
    /// Ping control frame.
    Ping,
    /// Pong control frame.
    Pong,
    /// Close control frame.
    Close,
}

impl FrameType {
    /// Returns `true` for ping, pong and close frames.
    #[inline]
    #[must_use]
    pub const fn is_control(self) -> bool {
        matches!(self, Self::Ping | Self::Pong | Self::Close)
    }

    /// Returns the RFC 6455 opcode.
    #[inline]
    #[must_use]
    pub const fn opcode(self) -> u8 {
        match self {
            Self::Text => 0x1,
            Self::Binary => 0x2,
            Self::Close => 0x8,
            Self::Ping => 0x9,
            Self::Pong => 0xA,
        }
    }
}

impl fmt::Display for FrameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Binary => "binary",
            Self::Ping => "ping",
            Self::Pong => "pong",
            Self::Close => "close",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Message
// ============================================================================

/// A single WebSocket frame: type tag and payload.
///
/// Immutable after creation. Text payloads are always valid UTF-8 and close
/// payloads are either empty or a 2-byte status code followed by a UTF-8
/// reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Frame type tag.
    frame_type: FrameType,
    /// Raw payload bytes.
    payload: Vec<u8>,
}

// ============================================================================
// Constructors
// ============================================================================

impl Message {
    /// Creates a message from a frame type and raw payload.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidFrame`] if a text payload is not UTF-8 or a close
    /// payload is neither empty nor a status code plus UTF-8 reason.
    pub fn new(frame_type: FrameType, payload: impl Into<Vec<u8>>) -> Result<Self> {
        let payload = payload.into();

        match frame_type {
            FrameType::Text => {
                if std::str::from_utf8(&payload).is_err() {
                    return Err(Error::invalid_frame(frame_type, "payload is not valid UTF-8"));
                }
            }
            FrameType::Close => match payload.len() {
                0 => {}
                1 => {
                    return Err(Error::invalid_frame(
                        frame_type,
                        "payload must be empty or carry a 2-byte status code",
                    ));
                }
                _ => {
                    if std::str::from_utf8(&payload[2..]).is_err() {
                        return Err(Error::invalid_frame(frame_type, "reason is not valid UTF-8"));
                    }
                }
            },
            FrameType::Binary | FrameType::Ping | FrameType::Pong => {}
        }

        Ok(Self {
            frame_type,
            payload,
        })
    }

    /// Creates a text message.
    #[inline]
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            frame_type: FrameType::Text,
            payload: text.into().into_bytes(),
        }
    }

    /// Creates a binary message.
    #[inline]
    #[must_use]
    pub fn binary(data: impl Into<Vec<u8>>) -> Self {
        Self {
            frame_type: FrameType::Binary,
            payload: data.into(),
        }
    }

    /// Creates a ping with the given payload.
    #[inline]
    #[must_use]
    pub fn ping(data: impl Into<Vec<u8>>) -> Self {
        Self {
            frame_type: FrameType::Ping,
            payload: data.into(),
        }
    }

    /// Creates a pong with the given payload.
    #[inline]
    #[must_use]
    pub fn pong(data: impl Into<Vec<u8>>) -> Self {
        Self {
            frame_type: FrameType::Pong,
            payload: data.into(),
        }
    }

    /// Creates a close frame with a status code and reason.
    #[must_use]
    pub fn close(code: u16, reason: &str) -> Self {
        let mut payload = Vec::with_capacity(2 + reason.len());
        payload.extend_from_slice(&code.to_be_bytes());
        payload.extend_from_slice(reason.as_bytes());
        Self {
            frame_type: FrameType::Close,
            payload,
        }
    }
}

// ============================================================================
// Accessors
// ============================================================================

impl Message {
    /// Returns the frame type.
    #[inline]
    #[must_use]
    pub const fn frame_type(&self) -> FrameType {
        self.frame_type
    }

    /// Returns the payload bytes.
    #[inline]
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Returns the payload as text for text frames.
    #[inline]
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self.frame_type {
            FrameType::Text => std::str::from_utf8(&self.payload).ok(),
            _ => None,
        }
    }

    /// Returns the payload length in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Returns `true` if the payload is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Consumes the message and returns its payload.
    #[inline]
    #[must_use]
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }
}

// ============================================================================
// Transport Conversion
// ============================================================================

impl Message {
    /// Converts into the transport's frame representation.
    pub(crate) fn into_ws(self) -> WsMessage {
        match self.frame_type {
            // Constructors guarantee UTF-8, the lossy path never substitutes.
            FrameType::Text => {
                WsMessage::Text(String::from_utf8_lossy(&self.payload).into_owned().into())
            }
            FrameType::Binary => WsMessage::Binary(self.payload.into()),
            FrameType::Ping => WsMessage::Ping(self.payload.into()),
            FrameType::Pong => WsMessage::Pong(self.payload.into()),
            FrameType::Close => {
                if self.payload.len() < 2 {
                    return WsMessage::Close(None);
                }
                let code = u16::from_be_bytes([self.payload[0], self.payload[1]]);
                let reason = String::from_utf8_lossy(&self.payload[2..]).into_owned();
                WsMessage::Close(Some(CloseFrame {
                    code: CloseCode::from(code),
                    reason: reason.into(),
                }))
            }
        }
    }

    /// Converts from the transport's frame representation.
    ///
    /// Returns `None` for raw frames, which are never produced by reads.
    pub(crate) fn from_ws(message: WsMessage) -> Option<Self> {
        let (frame_type, payload) = match message {
            WsMessage::Text(text) => (FrameType::Text, text.as_str().as_bytes().to_vec()),
            WsMessage::Binary(data) => (FrameType::Binary, data.to_vec()),
            WsMessage::Ping(data) => (FrameType::Ping, data.to_vec()),
            WsMessage::Pong(data) => (FrameType::Pong, data.to_vec()),
            WsMessage::Close(None) => (FrameType::Close, Vec::new()),
            WsMessage::Close(Some(frame)) => {
                return Some(Self::close(u16::from(frame.code), frame.reason.as_str()));
            }
            WsMessage::Frame(_) => return None,
        };

        Some(Self {
            frame_type,
            payload,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
