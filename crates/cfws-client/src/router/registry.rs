use std::collections::{HashMap, VecDeque};
use std::fmt;

use super::event::{Event, Handler};

/// Which table served a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fired {
    Channel,
    Once,
    Persistent,
    Dropped,
}

/// Handler tables for one connection.
///
/// Keys are event names as strings so server-declared request types route
/// without a code change.
#[derive(Default)]
pub struct Registry {
    channels: HashMap<String, Handler>,
    events: HashMap<String, Handler>,
    once: HashMap<String, VecDeque<Handler>>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("channels", &self.registered_channels())
            .field("events", &self.events.keys().collect::<Vec<_>>())
            .field(
                "once",
                &self
                    .once
                    .iter()
                    .map(|(k, q)| (k, q.len()))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last registration for a channel wins.
    pub fn register_channel(&mut self, channel: impl Into<String>, handler: Handler) {
        self.channels.insert(channel.into(), handler);
    }

    /// Last registration for an event wins.
    pub fn register_event(&mut self, event: impl Into<String>, handler: Handler) {
        self.events.insert(event.into(), handler);
    }

    pub fn register_once(&mut self, event: impl Into<String>, handler: Handler) {
        self.once.entry(event.into()).or_default().push_back(handler);
    }

    pub fn has_channel(&self, channel: &str) -> bool {
        self.channels.contains_key(channel)
    }

    pub fn registered_channels(&self) -> Vec<&str> {
        self.channels.keys().map(String::as_str).collect()
    }

    pub fn pending_once(&self, event: &str) -> usize {
        self.once.get(event).map_or(0, VecDeque::len)
    }

    /// Invoke the single handler that owns `event`.
    ///
    /// Precedence: channel handler (data events only), then the head of the
    /// one-time queue, then the persistent handler.
    pub fn fire(&mut self, event: &str, channel: Option<&str>, args: &Event) -> Fired {
        if event == "data" {
            if let Some(h) = channel.and_then(|c| self.channels.get_mut(c)) {
                h(args);
                return Fired::Channel;
            }
        }

        if let Some(queue) = self.once.get_mut(event) {
            if let Some(mut h) = queue.pop_front() {
                if queue.is_empty() {
                    self.once.remove(event);
                }
                h(args);
                return Fired::Once;
            }
        }

        if let Some(h) = self.events.get_mut(event) {
            h(args);
            return Fired::Persistent;
        }

        Fired::Dropped
    }
}
