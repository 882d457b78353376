//! Outbound control envelopes (JSON).
//!
//! An envelope is the deep merge of three layers, later layers winning:
//! 1. `MessageDefaults` (`ns`, `appName`, `customOptions`)
//! 2. call-site fields (`type`, `channel`, `customOptions`)
//! 3. operation extras (`subscribeTo`, `data`, `username`, `password`, ...)
//!
//! Objects merge key by key; arrays and scalars are replaced wholesale.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Namespace every ColdFusion channel message is addressed to.
pub const DEFAULT_NAMESPACE: &str = "coldfusion.websocket.channels";
/// Placeholder application name; real deployments override it in config.
pub const DEFAULT_APP_NAME: &str = "MyApplicationName";

/// Control message vocabulary understood by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageType {
    Welcome,
    Subscribe,
    Unsubscribe,
    Publish,
    Authenticate,
    GetSubscriberCount,
    GetSubscriptions,
}

impl MessageType {
    /// Wire name (the `type` field).
    pub fn as_str(self) -> &'static str {
        match self {
            MessageType::Welcome => "welcome",
            MessageType::Subscribe => "subscribe",
            MessageType::Unsubscribe => "unsubscribe",
            MessageType::Publish => "publish",
            MessageType::Authenticate => "authenticate",
            MessageType::GetSubscriberCount => "getSubscriberCount",
            MessageType::GetSubscriptions => "getSubscriptions",
        }
    }
}

/// Defaults merged into every control message of a connection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MessageDefaults {
    #[serde(default = "default_ns")]
    pub ns: String,

    #[serde(default = "default_app_name")]
    pub app_name: String,

    #[serde(default)]
    pub custom_options: Map<String, Value>,
}

impl Default for MessageDefaults {
    fn default() -> Self {
        Self {
            ns: default_ns(),
            app_name: default_app_name(),
            custom_options: Map::new(),
        }
    }
}

impl MessageDefaults {
    fn to_value(&self) -> Value {
        let mut m = Map::new();
        m.insert("ns".into(), Value::String(self.ns.clone()));
        m.insert("appName".into(), Value::String(self.app_name.clone()));
        m.insert(
            "customOptions".into(),
            Value::Object(self.custom_options.clone()),
        );
        Value::Object(m)
    }
}

fn default_ns() -> String {
    DEFAULT_NAMESPACE.into()
}
fn default_app_name() -> String {
    DEFAULT_APP_NAME.into()
}

/// A control message under construction.
///
/// ```
/// use cfws_core::protocol::{ControlMessage, MessageDefaults, MessageType};
///
/// let text = ControlMessage::new(MessageType::Subscribe)
///     .channel("news")
///     .encode(&MessageDefaults::default());
/// assert!(text.contains("\"type\":\"subscribe\""));
/// ```
#[derive(Debug, Clone)]
pub struct ControlMessage {
    msg_type: MessageType,
    channel: Option<String>,
    custom_options: Option<Map<String, Value>>,
    extras: Map<String, Value>,
}

impl ControlMessage {
    pub fn new(msg_type: MessageType) -> Self {
        Self {
            msg_type,
            channel: None,
            custom_options: None,
            extras: Map::new(),
        }
    }

    pub fn msg_type(&self) -> MessageType {
        self.msg_type
    }

    pub fn channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    /// Call-site custom options. `None` keeps the defaults untouched.
    pub fn custom_options(mut self, options: Option<Map<String, Value>>) -> Self {
        self.custom_options = options;
        self
    }

    /// Add an extra top-level field.
    ///
    /// A value that fails to serialize is dropped (with a warning) instead of
    /// failing the whole message.
    pub fn extra<T: Serialize + ?Sized>(mut self, key: &str, value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(v) => {
                self.extras.insert(key.to_string(), v);
            }
            Err(e) => {
                tracing::warn!(field = key, error = %e, "dropping unserializable envelope field");
            }
        }
        self
    }

    /// Add an extra top-level field that is already a JSON value.
    pub fn extra_value(mut self, key: &str, value: Value) -> Self {
        self.extras.insert(key.to_string(), value);
        self
    }

    /// Merge defaults, call-site fields and extras into one JSON object.
    pub fn to_value(&self, defaults: &MessageDefaults) -> Value {
        let mut call_site = Map::new();
        call_site.insert("type".into(), Value::String(self.msg_type.as_str().into()));
        if let Some(channel) = &self.channel {
            call_site.insert("channel".into(), Value::String(channel.clone()));
        }
        if let Some(options) = &self.custom_options {
            call_site.insert("customOptions".into(), Value::Object(options.clone()));
        }

        let mut out = Value::Object(Map::new());
        deep_merge(&mut out, &defaults.to_value());
        deep_merge(&mut out, &Value::Object(call_site));
        deep_merge(&mut out, &Value::Object(self.extras.clone()));
        out
    }

    /// Serialize to the text frame sent over the socket.
    pub fn encode(&self, defaults: &MessageDefaults) -> String {
        self.to_value(defaults).to_string()
    }
}

/// Recursively merge `src` into `target`.
///
/// When both sides hold an object under the same key the objects are merged;
/// any other pairing replaces the target value with a clone of `src`.
pub fn deep_merge(target: &mut Value, src: &Value) {
    match (target, src) {
        (Value::Object(t), Value::Object(s)) => {
            for (k, v) in s {
                let nested = v.is_object() && t.get(k).is_some_and(Value::is_object);
                if nested {
                    if let Some(existing) = t.get_mut(k) {
                        deep_merge(existing, v);
                    }
                } else {
                    t.insert(k.clone(), v.clone());
                }
            }
        }
        (t, s) => *t = s.clone(),
    }
}
