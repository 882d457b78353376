//! cfws client library entry.
//!
//! This crate wires a socket transport, the envelope codec and the event
//! router into a ColdFusion channel client. It is consumed by the demo binary
//! (`main.rs`) and by integration tests.

pub mod client;
pub mod config;
pub mod router;
pub mod transport;

pub use client::{connect, run_until_closed, Listeners};
pub use router::{Channels, Connection, ConnectionSettings, Event};
pub use transport::{ReadyState, Transport, TransportEvent, WsTransport};
