//! The connection router.
//!
//! Owns the transport handle and the handler tables. Inbound transport
//! notifications go through `handle_event`; application calls go through the
//! convenience operations, which build envelopes with the core codec.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use cfws_core::error::Result;
use cfws_core::protocol::{
    classify, Category, CodePolicy, ControlMessage, MessageDefaults, MessageType,
};

use crate::config::ClientConfig;
use crate::transport::{BinaryType, CloseInfo, ReadyState, Transport, TransportEvent};

use super::event::{DataEvent, Event, Handler, MessageEvent};
use super::registry::{Fired, Registry};

/// Free-form `customOptions` mapping.
pub type CustomOptions = Map<String, Value>;

/// Per-connection protocol settings.
#[derive(Debug, Clone, Default)]
pub struct ConnectionSettings {
    pub defaults: MessageDefaults,
    /// Sent with the welcome handshake.
    pub custom_options: CustomOptions,
    pub code_policy: CodePolicy,
}

impl From<&ClientConfig> for ConnectionSettings {
    fn from(cfg: &ClientConfig) -> Self {
        Self {
            defaults: cfg.message_defaults.clone(),
            custom_options: cfg.welcome_options.clone(),
            code_policy: cfg.code_policy,
        }
    }
}

/// Channels declared in the welcome handshake.
#[derive(Default)]
pub enum Channels {
    #[default]
    None,
    Names(Vec<String>),
    /// Each channel gets a dedicated data handler.
    Handlers(Vec<(String, Handler)>),
}

impl Channels {
    /// Convenience for building `Channels::Handlers` entries.
    pub fn handler(
        channel: impl Into<String>,
        f: impl FnMut(&Event) + Send + 'static,
    ) -> (String, Handler) {
        (channel.into(), Box::new(f))
    }

    fn into_parts(self) -> (Option<String>, Vec<(String, Handler)>) {
        match self {
            Channels::None => (None, Vec::new()),
            Channels::Names(names) if names.is_empty() => (None, Vec::new()),
            Channels::Names(names) => (Some(names.join(",")), Vec::new()),
            Channels::Handlers(list) if list.is_empty() => (None, list),
            Channels::Handlers(list) => {
                let names: Vec<&str> = list.iter().map(|(n, _)| n.as_str()).collect();
                (Some(names.join(",")), list)
            }
        }
    }
}

impl fmt::Debug for Channels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channels::None => f.write_str("None"),
            Channels::Names(n) => f.debug_tuple("Names").field(n).finish(),
            Channels::Handlers(l) => f
                .debug_tuple("Handlers")
                .field(&l.iter().map(|(n, _)| n).collect::<Vec<_>>())
                .finish(),
        }
    }
}

/// A single name or a comma-joined list.
impl From<&str> for Channels {
    fn from(list: &str) -> Self {
        let names: Vec<String> = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if names.is_empty() {
            Channels::None
        } else {
            Channels::Names(names)
        }
    }
}

impl From<String> for Channels {
    fn from(list: String) -> Self {
        Channels::from(list.as_str())
    }
}

impl From<Vec<String>> for Channels {
    fn from(names: Vec<String>) -> Self {
        Channels::Names(names)
    }
}

impl From<Vec<(String, Handler)>> for Channels {
    fn from(list: Vec<(String, Handler)>) -> Self {
        Channels::Handlers(list)
    }
}

/// Payload for the raw `send` passthrough.
#[derive(Debug, Clone, PartialEq)]
pub enum Outgoing {
    /// Sent as is.
    Text(String),
    /// Serialized to JSON text first.
    Json(Value),
}

impl From<&str> for Outgoing {
    fn from(s: &str) -> Self {
        Outgoing::Text(s.to_string())
    }
}

impl From<String> for Outgoing {
    fn from(s: String) -> Self {
        Outgoing::Text(s)
    }
}

impl From<Value> for Outgoing {
    fn from(v: Value) -> Self {
        Outgoing::Json(v)
    }
}

/// A channel connection: transport handle plus dispatch state.
#[derive(Debug)]
pub struct Connection<T> {
    transport: T,
    settings: ConnectionSettings,
    subscribe_to: Option<String>,
    registry: Registry,
    last_open: Option<Event>,
    last_close: Option<Event>,
}

impl<T: Transport> Connection<T> {
    pub fn new(transport: T, channels: impl Into<Channels>, settings: ConnectionSettings) -> Self {
        let (subscribe_to, handlers) = channels.into().into_parts();
        let mut registry = Registry::new();
        for (channel, handler) in handlers {
            registry.register_channel(channel, handler);
        }
        Self {
            transport,
            settings,
            subscribe_to,
            registry,
            last_open: None,
            last_close: None,
        }
    }

    // ---- passthrough accessors

    pub fn ready_state(&self) -> ReadyState {
        self.transport.ready_state()
    }
    pub fn url(&self) -> &str {
        self.transport.url()
    }
    pub fn protocol(&self) -> String {
        self.transport.protocol()
    }
    pub fn extensions(&self) -> String {
        self.transport.extensions()
    }
    pub fn buffered_amount(&self) -> usize {
        self.transport.buffered_amount()
    }
    pub fn binary_type(&self) -> BinaryType {
        self.transport.binary_type()
    }
    pub fn set_binary_type(&mut self, binary_type: BinaryType) -> &mut Self {
        self.transport.set_binary_type(binary_type);
        self
    }
    pub fn transport(&self) -> &T {
        &self.transport
    }
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    pub fn is_connection_open(&self) -> bool {
        self.transport.ready_state() == ReadyState::Open
    }

    // ---- inbound

    /// Feed one transport notification through classification and dispatch.
    pub fn handle_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Open => self.on_open(),
            TransportEvent::Message(raw) => self.on_frame(raw),
            TransportEvent::Close(info) => self.on_close(info),
            TransportEvent::Error(msg) => {
                tracing::debug!(error = %msg, "transport error");
                self.dispatch("error", None, &Event::TransportError(msg));
            }
        }
    }

    fn on_open(&mut self) {
        let mut welcome = ControlMessage::new(MessageType::Welcome)
            .custom_options(Some(self.settings.custom_options.clone()));
        if let Some(list) = &self.subscribe_to {
            welcome = welcome.extra("subscribeTo", list);
        }
        self.emit(welcome);

        self.last_open = Some(Event::Open);
        self.dispatch("open", None, &Event::Open);
    }

    fn on_close(&mut self, info: CloseInfo) {
        let event = Event::Close(info);
        self.last_close = Some(event.clone());
        self.dispatch("close", None, &event);
    }

    fn on_frame(&mut self, raw: Option<String>) {
        let registry = &self.registry;
        let classified = classify(raw.as_deref(), self.settings.code_policy, |c| {
            registry.has_channel(c)
        });

        let specific = match classified.category {
            Category::Data => Event::Data(DataEvent {
                raw: raw.clone(),
                channel: classified.channel.clone(),
                data: classified.data(),
                message: classified.message.clone(),
            }),
            _ => Event::Message(MessageEvent {
                raw: raw.clone(),
                message: classified.message.clone(),
            }),
        };
        self.dispatch(
            classified.category.as_str(),
            classified.channel.as_deref(),
            &specific,
        );

        let generic = Event::Message(MessageEvent {
            raw,
            message: classified.message,
        });
        self.dispatch("message", None, &generic);
    }

    fn dispatch(&mut self, event: &str, channel: Option<&str>, args: &Event) -> Fired {
        let fired = self.registry.fire(event, channel, args);
        if fired == Fired::Dropped {
            tracing::trace!(event, "no handler");
        } else {
            tracing::trace!(event, channel, ?fired, "dispatched");
        }
        fired
    }

    // ---- outbound control messages (fire-and-forget)

    fn emit(&mut self, msg: ControlMessage) {
        let text = msg.encode(&self.settings.defaults);
        tracing::debug!(msg_type = msg.msg_type().as_str(), "control message");
        if let Err(e) = self.transport.send_text(text) {
            tracing::warn!(
                msg_type = msg.msg_type().as_str(),
                error = %e,
                "control message not sent"
            );
        }
    }

    pub fn subscribe(&mut self, channel: &str, custom_options: Option<CustomOptions>) -> &mut Self {
        self.emit(
            ControlMessage::new(MessageType::Subscribe)
                .channel(channel)
                .custom_options(custom_options),
        );
        self
    }

    /// Subscribe and install `handler` as the channel's data handler.
    pub fn subscribe_with(
        &mut self,
        channel: &str,
        custom_options: Option<CustomOptions>,
        handler: impl FnMut(&Event) + Send + 'static,
    ) -> &mut Self {
        self.subscribe(channel, custom_options);
        self.registry.register_channel(channel, Box::new(handler));
        self
    }

    pub fn unsubscribe(&mut self, channel: &str) -> &mut Self {
        self.emit(ControlMessage::new(MessageType::Unsubscribe).channel(channel));
        self
    }

    /// Publish `data` on `channel`. The payload travels as JSON text in the
    /// `data` field; `options` become the message's `customOptions`.
    pub fn publish<D: Serialize + ?Sized>(
        &mut self,
        channel: &str,
        data: &D,
        options: Option<CustomOptions>,
    ) -> &mut Self {
        let msg = ControlMessage::new(MessageType::Publish)
            .channel(channel)
            .custom_options(options);
        let msg = match serde_json::to_string(data) {
            Ok(text) => msg.extra_value("data", Value::String(text)),
            Err(e) => {
                tracing::warn!(
                    channel,
                    error = %e,
                    "publish payload not encoded, sending it as is"
                );
                msg.extra("data", data)
            }
        };
        self.emit(msg);
        self
    }

    pub fn authenticate(&mut self, username: &str, password: &str) -> &mut Self {
        self.emit(
            ControlMessage::new(MessageType::Authenticate)
                .extra("username", username)
                .extra("password", password),
        );
        self
    }

    /// Authenticate and handle the server's answer once.
    pub fn authenticate_with(
        &mut self,
        username: &str,
        password: &str,
        handler: impl FnMut(&Event) + Send + 'static,
    ) -> &mut Self {
        self.authenticate(username, password);
        self.one(MessageType::Authenticate.as_str(), handler)
    }

    pub fn get_subscriber_count(&mut self, channel: &str) -> &mut Self {
        self.emit(ControlMessage::new(MessageType::GetSubscriberCount).channel(channel));
        self
    }

    pub fn get_subscriber_count_with(
        &mut self,
        channel: &str,
        handler: impl FnMut(&Event) + Send + 'static,
    ) -> &mut Self {
        self.get_subscriber_count(channel);
        self.one(MessageType::GetSubscriberCount.as_str(), handler)
    }

    pub fn get_subscriptions(&mut self) -> &mut Self {
        self.emit(ControlMessage::new(MessageType::GetSubscriptions));
        self
    }

    pub fn get_subscriptions_with(
        &mut self,
        handler: impl FnMut(&Event) + Send + 'static,
    ) -> &mut Self {
        self.get_subscriptions();
        self.one(MessageType::GetSubscriptions.as_str(), handler)
    }

    // ---- handler registration

    /// Install the persistent handler for `event`, replacing any previous one.
    pub fn on(&mut self, event: &str, handler: impl FnMut(&Event) + Send + 'static) -> &mut Self {
        self.on_boxed(event, Box::new(handler))
    }

    pub(crate) fn on_boxed(&mut self, event: &str, mut handler: Handler) -> &mut Self {
        self.replay_lifecycle(event, &mut handler);
        self.registry.register_event(event, handler);
        self
    }

    /// Install a data handler scoped to one channel.
    pub fn on_channel(
        &mut self,
        channel: &str,
        handler: impl FnMut(&Event) + Send + 'static,
    ) -> &mut Self {
        self.registry.register_channel(channel, Box::new(handler));
        self
    }

    /// Queue a handler that fires for the next `event` only.
    pub fn one(&mut self, event: &str, handler: impl FnMut(&Event) + Send + 'static) -> &mut Self {
        let mut handler: Handler = Box::new(handler);
        self.replay_lifecycle(event, &mut handler);
        self.registry.register_once(event, handler);
        self
    }

    /// Late registration: an `open` handler added while open (or a `close`
    /// handler added while closed) sees the cached event right away.
    fn replay_lifecycle(&self, event: &str, handler: &mut Handler) {
        let cached = match event {
            "open" if self.ready_state() == ReadyState::Open => self.last_open.as_ref(),
            "close" if self.ready_state() == ReadyState::Closed => self.last_close.as_ref(),
            _ => None,
        };
        if let Some(args) = cached {
            handler(args);
        }
    }

    // ---- transport passthrough

    /// Send a raw frame. This is not a channel publish.
    pub fn send(&mut self, data: impl Into<Outgoing>) -> Result<&mut Self> {
        let text = match data.into() {
            Outgoing::Text(s) => s,
            Outgoing::Json(v) => v.to_string(),
        };
        self.transport.send_text(text)?;
        Ok(self)
    }

    pub fn close(&mut self, code: Option<u16>, reason: Option<&str>) -> Result<&mut Self> {
        self.transport.close(code, reason)?;
        Ok(self)
    }

    pub fn close_connection(&mut self) -> Result<&mut Self> {
        self.close(None, None)
    }

    /// Open a new socket when the current one is not open. The welcome
    /// handshake repeats with the initial channel list.
    pub fn open_connection(&mut self, url: Option<&str>) -> Result<&mut Self> {
        if !self.is_connection_open() {
            let url = url.map_or_else(|| self.transport.url().to_string(), str::to_string);
            self.transport.open(&url)?;
        }
        Ok(self)
    }
}
