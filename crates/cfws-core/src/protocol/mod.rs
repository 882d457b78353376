//! Envelope protocol modules.
//!
//! - `outbound`: control envelopes (`welcome`, `subscribe`, `publish`, ...),
//!   built as a deep merge of defaults, call-site fields and extras.
//! - `inbound`: lenient decoding of server frames, including the nested JSON
//!   carried in `data`.
//! - `classify`: the priority chain that maps a decoded frame to a category.
//! - `close`: close code / reason validation shared by transports.
//!
//! Nothing here panics on hostile input: unparsable frames become `error`
//! classifications and unserializable extras are dropped with a warning.

pub mod classify;
pub mod close;
pub mod inbound;
pub mod outbound;

pub use classify::{classify, Category, Classified};
pub use inbound::{decode_frame, CodePolicy, InboundMessage};
pub use outbound::{deep_merge, ControlMessage, MessageDefaults, MessageType};
