//! WebSocket transport on `tokio-tungstenite`.
//!
//! Each socket runs on its own tokio task:
//! - outbound frames arrive over an unbounded channel (so `send_text` stays sync)
//! - inbound frames, close and errors leave as `TransportEvent`s
//! - ready state and buffered amount live in atomics shared with the handle
//!
//! Ping/pong is answered by tungstenite itself.

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{
    client::IntoClientRequest,
    handshake::client::Request,
    http::{header, HeaderMap, HeaderValue},
    protocol::{frame::coding::CloseCode, CloseFrame},
    Message,
};

use cfws_core::error::{CfwsError, Result};
use cfws_core::protocol::close::{validate_close, CLOSE_NORMAL, CLOSE_NO_STATUS};

use super::{BinaryType, CloseInfo, ReadyState, Transport, TransportEvent};

/// Receiving side of a transport's notifications.
pub type EventStream = mpsc::UnboundedReceiver<TransportEvent>;

#[derive(Debug, Default)]
struct Handshake {
    protocol: String,
    extensions: String,
}

#[derive(Debug)]
struct Shared {
    ready_state: AtomicU8,
    buffered: AtomicUsize,
    handshake: RwLock<Handshake>,
}

impl Shared {
    fn new() -> Self {
        Self {
            ready_state: AtomicU8::new(ReadyState::Connecting as u8),
            buffered: AtomicUsize::new(0),
            handshake: RwLock::new(Handshake::default()),
        }
    }

    fn state(&self) -> ReadyState {
        ReadyState::from(self.ready_state.load(Ordering::SeqCst))
    }

    fn set_state(&self, s: ReadyState) {
        self.ready_state.store(s as u8, Ordering::SeqCst);
    }

    /// Connecting -> Open, unless `close` got there first.
    fn mark_open(&self) -> bool {
        self.ready_state
            .compare_exchange(
                ReadyState::Connecting as u8,
                ReadyState::Open as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }

    fn record_handshake(&self, headers: &HeaderMap) {
        let get = |name: header::HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string()
        };
        if let Ok(mut hs) = self.handshake.write() {
            hs.protocol = get(header::SEC_WEBSOCKET_PROTOCOL);
            hs.extensions = get(header::SEC_WEBSOCKET_EXTENSIONS);
        }
    }
}

#[derive(Debug)]
enum Outbound {
    Text(String),
    Close(Option<CloseFrame<'static>>),
}

/// Handle to a tungstenite-backed socket.
#[derive(Debug)]
pub struct WsTransport {
    url: String,
    protocols: Vec<String>,
    shared: Arc<Shared>,
    outbound: mpsc::UnboundedSender<Outbound>,
    events: mpsc::UnboundedSender<TransportEvent>,
    binary_type: BinaryType,
}

impl WsTransport {
    /// Start connecting to `url`. Must be called inside a tokio runtime.
    ///
    /// Fails only when the URL or protocol list cannot form a handshake
    /// request; network failures arrive later as `Error` + `Close` events.
    pub fn connect(url: &str, protocols: &[String]) -> Result<(Self, EventStream)> {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (shared, outbound) = spawn_session(url, protocols, events_tx.clone())?;
        let transport = Self {
            url: url.to_string(),
            protocols: protocols.to_vec(),
            shared,
            outbound,
            events: events_tx,
            binary_type: BinaryType::default(),
        };
        Ok((transport, events_rx))
    }
}

impl Transport for WsTransport {
    fn send_text(&mut self, text: String) -> Result<()> {
        match self.shared.state() {
            ReadyState::Connecting => Err(CfwsError::InvalidState(
                "socket is still connecting".into(),
            )),
            ReadyState::Open => {
                let len = text.len();
                self.shared.buffered.fetch_add(len, Ordering::SeqCst);
                if self.outbound.send(Outbound::Text(text)).is_err() {
                    self.shared.buffered.fetch_sub(len, Ordering::SeqCst);
                    return Err(CfwsError::Transport("socket task has stopped".into()));
                }
                Ok(())
            }
            ReadyState::Closing | ReadyState::Closed => {
                tracing::debug!(bytes = text.len(), "discarding frame on closing socket");
                Ok(())
            }
        }
    }

    fn close(&mut self, code: Option<u16>, reason: Option<&str>) -> Result<()> {
        validate_close(code, reason)?;
        if matches!(self.shared.state(), ReadyState::Closing | ReadyState::Closed) {
            return Ok(());
        }
        self.shared.set_state(ReadyState::Closing);

        let frame = match (code, reason) {
            (None, None) => None,
            (code, reason) => Some(CloseFrame {
                code: CloseCode::from(code.unwrap_or(CLOSE_NORMAL)),
                reason: reason.unwrap_or_default().to_string().into(),
            }),
        };
        if self.outbound.send(Outbound::Close(frame)).is_err() {
            tracing::debug!("close requested after socket task stopped");
        }
        Ok(())
    }

    fn ready_state(&self) -> ReadyState {
        self.shared.state()
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn open(&mut self, url: &str) -> Result<()> {
        // one live session per event stream
        let state = self.shared.state();
        if state != ReadyState::Closed {
            return Err(CfwsError::InvalidState(format!(
                "cannot reopen a socket in state {state:?}"
            )));
        }
        let (shared, outbound) = spawn_session(url, &self.protocols, self.events.clone())?;
        self.url = url.to_string();
        self.shared = shared;
        self.outbound = outbound;
        Ok(())
    }

    fn protocol(&self) -> String {
        self.shared
            .handshake
            .read()
            .map(|hs| hs.protocol.clone())
            .unwrap_or_default()
    }

    fn extensions(&self) -> String {
        self.shared
            .handshake
            .read()
            .map(|hs| hs.extensions.clone())
            .unwrap_or_default()
    }

    fn buffered_amount(&self) -> usize {
        self.shared.buffered.load(Ordering::SeqCst)
    }

    fn binary_type(&self) -> BinaryType {
        self.binary_type
    }

    fn set_binary_type(&mut self, binary_type: BinaryType) {
        self.binary_type = binary_type;
    }
}

fn build_request(url: &str, protocols: &[String]) -> Result<Request> {
    let mut request = url
        .into_client_request()
        .map_err(|e| CfwsError::Syntax(format!("invalid websocket url {url}: {e}")))?;
    if !protocols.is_empty() {
        let value = HeaderValue::from_str(&protocols.join(", "))
            .map_err(|e| CfwsError::Syntax(format!("invalid protocol list: {e}")))?;
        request
            .headers_mut()
            .insert(header::SEC_WEBSOCKET_PROTOCOL, value);
    }
    Ok(request)
}

fn spawn_session(
    url: &str,
    protocols: &[String],
    events: mpsc::UnboundedSender<TransportEvent>,
) -> Result<(Arc<Shared>, mpsc::UnboundedSender<Outbound>)> {
    let request = build_request(url, protocols)?;
    let shared = Arc::new(Shared::new());
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    tokio::spawn(run_session(request, Arc::clone(&shared), out_rx, events));
    Ok((shared, out_tx))
}

async fn run_session(
    request: Request,
    shared: Arc<Shared>,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    events: mpsc::UnboundedSender<TransportEvent>,
) {
    let (mut stream, response) = match tokio_tungstenite::connect_async(request).await {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "websocket connect failed");
            shared.set_state(ReadyState::Closed);
            let _ = events.send(TransportEvent::Error(e.to_string()));
            let _ = events.send(TransportEvent::Close(CloseInfo::abnormal()));
            return;
        }
    };

    shared.record_handshake(response.headers());
    if !shared.mark_open() {
        // closed while the handshake was in flight
        let _ = stream.close(None).await;
        shared.set_state(ReadyState::Closed);
        let _ = events.send(TransportEvent::Close(CloseInfo::abnormal()));
        return;
    }
    tracing::debug!("websocket open");
    let _ = events.send(TransportEvent::Open);

    let (mut sink, mut source) = stream.split();
    let mut close_info: Option<CloseInfo> = None;

    loop {
        tokio::select! {
            out = outbound.recv() => match out {
                Some(Outbound::Text(text)) => {
                    let len = text.len();
                    let sent = sink.send(Message::Text(text)).await;
                    shared.buffered.fetch_sub(len, Ordering::SeqCst);
                    if let Err(e) = sent {
                        tracing::debug!(error = %e, "websocket write failed");
                        break;
                    }
                }
                Some(Outbound::Close(frame)) => {
                    if let Err(e) = sink.send(Message::Close(frame)).await {
                        tracing::debug!(error = %e, "websocket close write failed");
                        break;
                    }
                }
                None => {
                    let _ = sink.close().await;
                    break;
                }
            },

            incoming = source.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    let _ = events.send(TransportEvent::Message(Some(text)));
                }
                Some(Ok(Message::Binary(bytes))) => {
                    let text = String::from_utf8_lossy(&bytes).into_owned();
                    let _ = events.send(TransportEvent::Message(Some(text)));
                }
                Some(Ok(Message::Close(frame))) => {
                    shared.set_state(ReadyState::Closing);
                    close_info = Some(match frame {
                        Some(f) => CloseInfo {
                            code: u16::from(f.code),
                            reason: f.reason.into_owned(),
                            was_clean: true,
                        },
                        None => CloseInfo {
                            code: CLOSE_NO_STATUS,
                            reason: String::new(),
                            was_clean: true,
                        },
                    });
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    if close_info.is_none() {
                        let _ = events.send(TransportEvent::Error(e.to_string()));
                    }
                    break;
                }
                None => break,
            },
        }
    }

    shared.set_state(ReadyState::Closed);
    tracing::debug!(?close_info, "websocket closed");
    let _ = events.send(TransportEvent::Close(
        close_info.unwrap_or_else(CloseInfo::abnormal),
    ));
}
