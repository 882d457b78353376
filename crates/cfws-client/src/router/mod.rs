//! Event router: handler tables, dispatch precedence and the channel
//! convenience operations.

pub mod connection;
pub mod event;
pub mod registry;

pub use connection::{Channels, Connection, ConnectionSettings, CustomOptions, Outgoing};
pub use event::{DataEvent, Event, Handler, MessageEvent};
pub use registry::{Fired, Registry};
