//! cfws core: the ColdFusion channel envelope codec and the shared error type.
//!
//! This crate builds outbound control envelopes and decodes/classifies inbound
//! frames. It carries no transport or runtime dependencies so the codec can be
//! driven by any socket implementation and exercised directly in tests.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. Malformed inbound
//! frames degrade to an `error` classification instead of an `Err`, and only
//! transport-facing checks (close code / reason) return `CfwsError`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{CfwsError, Result};
