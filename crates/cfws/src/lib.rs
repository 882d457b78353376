//! Top-level facade crate for cfws.
//!
//! Re-exports the envelope codec and the client router so users can depend on a single crate.

pub mod core {
    pub use cfws_core::*;
}

pub mod client {
    pub use cfws_client::*;
}
