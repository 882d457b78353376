//! Events handed to application handlers.

use serde_json::Value;

use cfws_core::protocol::InboundMessage;

use crate::transport::CloseInfo;

/// Boxed handler. Every handler (persistent, one-time, channel) has this shape.
pub type Handler = Box<dyn FnMut(&Event) + Send>;

/// A decoded server frame together with the text it came from.
#[derive(Debug, Clone)]
pub struct MessageEvent {
    pub raw: Option<String>,
    pub message: InboundMessage,
}

/// A `data` frame: the channel it was published on plus its decoded payload.
#[derive(Debug, Clone)]
pub struct DataEvent {
    pub raw: Option<String>,
    /// Set when the frame's channel has a dedicated handler.
    pub channel: Option<String>,
    pub data: Value,
    pub message: InboundMessage,
}

/// What a handler receives.
#[derive(Debug, Clone)]
pub enum Event {
    Open,
    Close(CloseInfo),
    /// Transport-level error notification.
    TransportError(String),
    Message(MessageEvent),
    Data(DataEvent),
}

impl Event {
    /// The decoded server message, for frame-carrying events.
    pub fn message(&self) -> Option<&InboundMessage> {
        match self {
            Event::Message(m) => Some(&m.message),
            Event::Data(d) => Some(&d.message),
            _ => None,
        }
    }

    /// Decoded payload of a `data` event.
    pub fn data(&self) -> Option<&Value> {
        match self {
            Event::Data(d) => Some(&d.data),
            _ => None,
        }
    }
}
