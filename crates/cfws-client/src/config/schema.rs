use serde::Deserialize;
use serde_json::{Map, Value};

use cfws_core::error::{CfwsError, Result};
use cfws_core::protocol::{CodePolicy, MessageDefaults};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub version: u32,

    #[serde(default = "default_url")]
    pub url: String,

    /// Sub-protocols offered in the handshake.
    #[serde(default)]
    pub protocols: Vec<String>,

    /// Channels declared in the welcome handshake.
    #[serde(default)]
    pub channels: Vec<String>,

    #[serde(default)]
    pub code_policy: CodePolicy,

    /// `customOptions` sent with the welcome handshake only.
    #[serde(default)]
    pub welcome_options: Map<String, Value>,

    #[serde(default)]
    pub message_defaults: MessageDefaults,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            version: 1,
            url: default_url(),
            protocols: Vec::new(),
            channels: Vec::new(),
            code_policy: CodePolicy::default(),
            welcome_options: Map::new(),
            message_defaults: MessageDefaults::default(),
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(CfwsError::BadConfig(format!(
                "unsupported config version {}",
                self.version
            )));
        }
        if !(self.url.starts_with("ws://") || self.url.starts_with("wss://")) {
            return Err(CfwsError::BadConfig(
                "url must use the ws:// or wss:// scheme".into(),
            ));
        }
        if self.message_defaults.ns.trim().is_empty() {
            return Err(CfwsError::BadConfig("message_defaults.ns must not be empty".into()));
        }
        if self.message_defaults.app_name.trim().is_empty() {
            return Err(CfwsError::BadConfig(
                "message_defaults.app_name must not be empty".into(),
            ));
        }
        for ch in &self.channels {
            if ch.trim().is_empty() || ch.contains(',') {
                return Err(CfwsError::BadConfig(format!("invalid channel name: {ch:?}")));
            }
        }
        Ok(())
    }
}

fn default_url() -> String {
    "ws://localhost:8579/cfusion".into()
}
