//! In-memory transport shared by the router tests.

#![allow(clippy::unwrap_used)]
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use serde_json::{Map, Value};

use cfws_client::router::{Connection, ConnectionSettings, Event};
use cfws_client::transport::{CloseInfo, ReadyState, Transport, TransportEvent};
use cfws_core::error::{CfwsError, Result};
use cfws_core::protocol::close::validate_close;
use cfws_core::protocol::MessageDefaults;

#[derive(Debug)]
pub struct MockTransport {
    pub state: ReadyState,
    pub sent: Vec<String>,
    pub closed_with: Option<(Option<u16>, Option<String>)>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            state: ReadyState::Connecting,
            sent: Vec::new(),
            closed_with: None,
        }
    }

    /// Sent frames decoded as JSON.
    pub fn sent_json(&self) -> Vec<Value> {
        self.sent
            .iter()
            .map(|s| serde_json::from_str(s).unwrap())
            .collect()
    }
}

impl Transport for MockTransport {
    fn send_text(&mut self, text: String) -> Result<()> {
        if self.state == ReadyState::Connecting {
            return Err(CfwsError::InvalidState("connecting".into()));
        }
        self.sent.push(text);
        Ok(())
    }

    fn close(&mut self, code: Option<u16>, reason: Option<&str>) -> Result<()> {
        validate_close(code, reason)?;
        self.state = ReadyState::Closing;
        self.closed_with = Some((code, reason.map(str::to_string)));
        Ok(())
    }

    fn ready_state(&self) -> ReadyState {
        self.state
    }

    fn url(&self) -> &str {
        "ws://test.local/cfusion"
    }
}

pub fn settings() -> ConnectionSettings {
    let mut custom = Map::new();
    custom.insert("token".into(), Value::String("t0".into()));
    ConnectionSettings {
        defaults: MessageDefaults {
            ns: "coldfusion.websocket.channels".into(),
            app_name: "testapp".into(),
            custom_options: Map::new(),
        },
        custom_options: custom,
        code_policy: Default::default(),
    }
}

pub fn connection(channels: &str) -> Connection<MockTransport> {
    Connection::new(MockTransport::new(), channels, settings())
}

pub fn open(conn: &mut Connection<MockTransport>) {
    conn.transport_mut().state = ReadyState::Open;
    conn.handle_event(TransportEvent::Open);
}

pub fn close(conn: &mut Connection<MockTransport>, code: u16) {
    conn.transport_mut().state = ReadyState::Closed;
    conn.handle_event(TransportEvent::Close(CloseInfo {
        code,
        reason: String::new(),
        was_clean: true,
    }));
}

pub fn frame(conn: &mut Connection<MockTransport>, text: &str) {
    conn.handle_event(TransportEvent::Message(Some(text.to_string())));
}

/// Shared log of handler invocations.
#[derive(Debug, Clone, Default)]
pub struct Log(Arc<Mutex<Vec<String>>>);

impl Log {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handler that records `tag` each time it runs.
    pub fn tag(&self, tag: &str) -> impl FnMut(&Event) + Send + 'static {
        let inner = Arc::clone(&self.0);
        let tag = tag.to_string();
        move |_: &Event| inner.lock().unwrap().push(tag.clone())
    }

    /// Handler that records `tag` plus the event's decoded data.
    pub fn data(&self, tag: &str) -> impl FnMut(&Event) + Send + 'static {
        let inner = Arc::clone(&self.0);
        let tag = tag.to_string();
        move |e: &Event| {
            let data = e.data().map(|d| d.to_string()).unwrap_or_default();
            inner.lock().unwrap().push(format!("{tag}:{data}"));
        }
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}
