//! Inbound frame decoding (lenient).
//!
//! Server frames are loosely typed: fields may be missing, carry unexpected
//! JSON types, or (for `data`) hold JSON encoded a second time as a string.
//! Decoding never fails; see `classify` for how the result is routed.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Which `code` values count as a server-signaled error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CodePolicy {
    /// Any defined non-zero code is an error; `0` and missing are not.
    #[default]
    NonZero,
    /// Only negative codes are errors (older server builds).
    Negative,
}

impl CodePolicy {
    pub fn is_error(self, code: f64) -> bool {
        match self {
            CodePolicy::NonZero => code != 0.0,
            CodePolicy::Negative => code < 0.0,
        }
    }
}

/// A decoded server frame.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    /// Numeric status code, when the frame carries one. Fractions are kept.
    pub code: Option<f64>,
    /// The `type` field (`"data"`, `"response"`, ...).
    pub msg_type: Option<String>,
    /// The `channelname` field.
    pub channel_name: Option<String>,
    /// The `data` field after the nested decode.
    pub data: Option<Value>,
    /// The `reqType` field.
    pub req_type: Option<String>,
    /// The `channelssubscribedto` field, verbatim.
    pub channels_subscribed_to: Option<Value>,
    /// Whole decoded body (with `data` already decoded), or the raw text when
    /// the frame was not JSON.
    pub body: Value,
    /// False when the frame text could not be parsed.
    pub well_formed: bool,
}

impl InboundMessage {
    fn malformed(raw: &str) -> Self {
        Self {
            code: None,
            msg_type: None,
            channel_name: None,
            data: None,
            req_type: None,
            channels_subscribed_to: None,
            body: Value::String(raw.to_string()),
            well_formed: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct WireMessage {
    #[serde(default)]
    code: Option<Value>,
    #[serde(default, rename = "type")]
    msg_type: Option<Value>,
    #[serde(default)]
    channelname: Option<Value>,
    #[serde(default, rename = "reqType")]
    req_type: Option<Value>,
    #[serde(default)]
    channelssubscribedto: Option<Value>,
}

/// Decode one frame. `None` and the empty string decode to `{}`.
pub fn decode_frame(text: Option<&str>) -> InboundMessage {
    let text = text.unwrap_or_default();
    let mut body = if text.is_empty() {
        Value::Object(Map::new())
    } else {
        match serde_json::from_str::<Value>(text) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(error = %e, "inbound frame is not json");
                return InboundMessage::malformed(text);
            }
        }
    };

    let data = match body.get_mut("data") {
        Some(slot) => {
            decode_nested(slot);
            Some(slot.clone())
        }
        None => None,
    };

    // Non-object bodies simply carry none of the known fields.
    let wire = if body.is_object() {
        WireMessage::deserialize(&body).unwrap_or_default()
    } else {
        WireMessage::default()
    };

    InboundMessage {
        code: wire.code.as_ref().and_then(numeric_code),
        msg_type: wire.msg_type.as_ref().and_then(as_string),
        channel_name: wire.channelname.as_ref().and_then(as_string),
        data,
        req_type: wire.req_type.as_ref().and_then(as_string),
        channels_subscribed_to: wire.channelssubscribedto.filter(|v| !v.is_null()),
        body,
        well_formed: true,
    }
}

/// Replace a JSON-in-a-string value with its decoded form; keep it otherwise.
fn decode_nested(slot: &mut Value) {
    if let Value::String(s) = slot {
        if let Ok(v) = serde_json::from_str::<Value>(s) {
            *slot = v;
        }
    }
}

fn numeric_code(v: &Value) -> Option<f64> {
    let code = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    code.filter(|c| c.is_finite())
}

fn as_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}
