//! Transport layer.
//!
//! The router talks to the socket through the `Transport` trait and receives
//! its notifications as `TransportEvent`s. `ws` provides the tungstenite-backed
//! implementation; tests plug in an in-memory one.

pub mod ws;

use cfws_core::error::{CfwsError, Result};

pub use ws::WsTransport;

/// Socket lifecycle, numbered like the browser `readyState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReadyState {
    Connecting = 0,
    Open = 1,
    Closing = 2,
    Closed = 3,
}

impl From<u8> for ReadyState {
    fn from(v: u8) -> Self {
        match v {
            0 => ReadyState::Connecting,
            1 => ReadyState::Open,
            2 => ReadyState::Closing,
            _ => ReadyState::Closed,
        }
    }
}

/// How binary frames would be surfaced. Kept for API parity only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BinaryType {
    #[default]
    Blob,
    ArrayBuffer,
}

/// Close notification details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseInfo {
    pub code: u16,
    pub reason: String,
    pub was_clean: bool,
}

impl CloseInfo {
    /// Connection dropped without a close handshake.
    pub fn abnormal() -> Self {
        Self {
            code: cfws_core::protocol::close::CLOSE_ABNORMAL,
            reason: String::new(),
            was_clean: false,
        }
    }
}

/// Notifications delivered by a transport, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Open,
    /// Text frame; `None` when the frame carried no data.
    Message(Option<String>),
    Close(CloseInfo),
    Error(String),
}

/// Raw bidirectional message transport.
pub trait Transport {
    /// Send one text frame.
    fn send_text(&mut self, text: String) -> Result<()>;

    /// Start the close handshake. Arguments are validated by the implementation.
    fn close(&mut self, code: Option<u16>, reason: Option<&str>) -> Result<()>;

    fn ready_state(&self) -> ReadyState;

    fn url(&self) -> &str;

    /// Open a fresh socket to `url`, reusing the existing event stream.
    /// Only valid once the previous socket is closed.
    fn open(&mut self, url: &str) -> Result<()> {
        let _ = url;
        Err(CfwsError::InvalidState(
            "transport does not support reopening".into(),
        ))
    }

    fn protocol(&self) -> String {
        String::new()
    }

    fn extensions(&self) -> String {
        String::new()
    }

    fn buffered_amount(&self) -> usize {
        0
    }

    fn binary_type(&self) -> BinaryType {
        BinaryType::Blob
    }

    fn set_binary_type(&mut self, binary_type: BinaryType) {
        let _ = binary_type;
    }
}
