//! cfws client (demo)
//!
//! - Loads `cfws.yaml` (or the path given as the first argument)
//! - Connects and declares the configured channels in the welcome handshake
//! - Logs data / subscribe / error events until the socket closes
//! - Ctrl-C starts a normal close

use tracing_subscriber::{fmt, EnvFilter};

use cfws_client::{config, connect, Event, Listeners, TransportEvent};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "cfws.yaml".to_string());
    let cfg = config::load_from_file(&path).expect("config load failed");

    let (mut conn, mut events) = connect(
        &cfg,
        cfg.channels.clone(),
        Listeners::data(|e| {
            if let Event::Data(d) = e {
                tracing::info!(channel = ?d.message.channel_name, data = %d.data, "data");
            }
        }),
    )
    .expect("connect failed");

    conn.on("subscribe", |e| {
        if let Some(m) = e.message() {
            tracing::info!(channels = ?m.channels_subscribed_to, "subscribed");
        }
    })
    .on("error", |e| match e {
        Event::TransportError(msg) => tracing::warn!(%msg, "transport error"),
        other => tracing::warn!(body = ?other.message().map(|m| &m.body), "server error"),
    })
    .on("close", |e| {
        if let Event::Close(info) = e {
            tracing::info!(code = info.code, reason = %info.reason, "closed");
        }
    });

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    let mut closing = false;

    loop {
        tokio::select! {
            ev = events.recv() => {
                let Some(ev) = ev else { break; };
                let closed = matches!(ev, TransportEvent::Close(_));
                conn.handle_event(ev);
                if closed {
                    break;
                }
            }
            _ = &mut shutdown, if !closing => {
                closing = true;
                if let Err(e) = conn.close(Some(1000), Some("client shutdown")) {
                    tracing::warn!(error = %e, "close failed");
                }
            }
        }
    }
}
