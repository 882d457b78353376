//! One-call connection setup on the tungstenite transport.
//!
//! ```no_run
//! use cfws_client::{config::ClientConfig, connect, run_until_closed, Listeners};
//!
//! # async fn demo() -> cfws_core::Result<()> {
//! let cfg = ClientConfig::default();
//! let (mut conn, mut events) = connect(
//!     &cfg,
//!     "news",
//!     Listeners::data(|e| println!("{:?}", e.data())),
//! )?;
//! run_until_closed(&mut conn, &mut events).await;
//! # Ok(())
//! # }
//! ```

use std::fmt;

use cfws_core::error::Result;

use crate::config::ClientConfig;
use crate::router::{Channels, Connection, ConnectionSettings, Event, Handler};
use crate::transport::ws::EventStream;
use crate::transport::{Transport, TransportEvent, WsTransport};

/// Handlers installed right after construction.
#[derive(Default)]
pub enum Listeners {
    #[default]
    None,
    /// Persistent handlers keyed by event name.
    Events(Vec<(String, Handler)>),
    /// A single persistent `data` handler.
    Data(Handler),
}

impl Listeners {
    pub fn data(f: impl FnMut(&Event) + Send + 'static) -> Self {
        Listeners::Data(Box::new(f))
    }

    pub fn event(
        name: impl Into<String>,
        f: impl FnMut(&Event) + Send + 'static,
    ) -> (String, Handler) {
        (name.into(), Box::new(f))
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Listeners::None => f.write_str("None"),
            Listeners::Events(l) => f
                .debug_tuple("Events")
                .field(&l.iter().map(|(n, _)| n).collect::<Vec<_>>())
                .finish(),
            Listeners::Data(_) => f.write_str("Data(..)"),
        }
    }
}

/// Connect to `cfg.url` and install `listeners`. Must run inside a tokio runtime.
pub fn connect(
    cfg: &ClientConfig,
    channels: impl Into<Channels>,
    listeners: Listeners,
) -> Result<(Connection<WsTransport>, EventStream)> {
    let (transport, events) = WsTransport::connect(&cfg.url, &cfg.protocols)?;
    let mut conn = Connection::new(transport, channels, ConnectionSettings::from(cfg));
    match listeners {
        Listeners::None => {}
        Listeners::Events(list) => {
            for (name, handler) in list {
                conn.on_boxed(&name, handler);
            }
        }
        Listeners::Data(handler) => {
            conn.on_boxed("data", handler);
        }
    }
    tracing::info!(url = %cfg.url, "connecting");
    Ok((conn, events))
}

/// Pump transport notifications into `conn` until a close has been dispatched.
pub async fn run_until_closed<T: Transport>(conn: &mut Connection<T>, events: &mut EventStream) {
    while let Some(event) = events.recv().await {
        let closed = matches!(event, TransportEvent::Close(_));
        conn.handle_event(event);
        if closed {
            break;
        }
    }
}
