//! Inbound frame classification.
//!
//! Priority chain, first match wins:
//! 1. unparsable text            -> `error` (body = raw text)
//! 2. error code per `CodePolicy` -> `error`
//! 3. `type == "data"`           -> `data` (tagged with a registered `channelname`)
//! 4. `reqType == "subscribeTo"` -> `subscribe`, or `error` without `channelssubscribedto`
//! 5. any other `reqType`        -> category named by it
//! 6. otherwise                  -> `error`
//!
//! The generic `message` dispatch that follows every frame is the router's job.

use std::fmt;

use serde_json::{Map, Value};

use super::inbound::{decode_frame, CodePolicy, InboundMessage};

/// Request type the server uses to acknowledge the welcome / subscribe handshake.
pub const REQ_SUBSCRIBE_TO: &str = "subscribeTo";

/// Event category. Well-known names get a variant; anything else the server
/// declares in `reqType` is carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    Open,
    Close,
    Message,
    Data,
    Subscribe,
    Error,
    Request(String),
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Category::Open => "open",
            Category::Close => "close",
            Category::Message => "message",
            Category::Data => "data",
            Category::Subscribe => "subscribe",
            Category::Error => "error",
            Category::Request(name) => name.as_str(),
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "open" => Category::Open,
            "close" => Category::Close,
            "message" => Category::Message,
            "data" => Category::Data,
            "subscribe" => Category::Subscribe,
            "error" => Category::Error,
            other => Category::Request(other.to_string()),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying one frame.
#[derive(Debug, Clone)]
pub struct Classified {
    pub category: Category,
    /// Set only for `data` frames whose channel has a registered handler.
    pub channel: Option<String>,
    pub message: InboundMessage,
}

impl Classified {
    /// Payload handed to data handlers: the decoded `data`, or `{}` when the
    /// frame carried none.
    pub fn data(&self) -> Value {
        match &self.message.data {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(Value::String(s)) if s.is_empty() => Value::Object(Map::new()),
            Some(v) => v.clone(),
        }
    }
}

/// Decode and classify one inbound frame.
pub fn classify(
    text: Option<&str>,
    policy: CodePolicy,
    is_channel_registered: impl Fn(&str) -> bool,
) -> Classified {
    let message = decode_frame(text);
    let mut channel = None;

    let category = if !message.well_formed {
        Category::Error
    } else if message.code.is_some_and(|c| policy.is_error(c)) {
        Category::Error
    } else if message.msg_type.as_deref() == Some("data") {
        channel = message
            .channel_name
            .as_deref()
            .filter(|name| is_channel_registered(*name))
            .map(str::to_string);
        Category::Data
    } else if message.req_type.as_deref() == Some(REQ_SUBSCRIBE_TO) {
        if message.channels_subscribed_to.is_some() {
            Category::Subscribe
        } else {
            Category::Error
        }
    } else if let Some(req) = message.req_type.as_deref() {
        Category::from_name(req)
    } else {
        Category::Error
    };

    Classified {
        category,
        channel,
        message,
    }
}
