//! WebSocket ingest server.
//!
//! Each connection gets its own segmenter; the transcriber, filter, and sink
//! are shared through a single dispatcher. Frames on one connection are
//! processed strictly in arrival order, with dispatch awaited inline so frame
//! N+1 never runs ahead of segment N.

use crate::audio::decode_frame;
use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::segment::ClosedSegment;
use crate::segmenter::{Segmenter, SegmenterConfig};
use anyhow::Context;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Shared state for all connections.
#[derive(Clone)]
pub struct ServiceState {
    segmenter_config: SegmenterConfig,
    dispatcher: Arc<Dispatcher>,
}

impl ServiceState {
    pub fn new(segmenter_config: SegmenterConfig, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            segmenter_config,
            dispatcher,
        }
    }
}

/// Bind and serve until ctrl-c.
pub async fn run(config: &Config, dispatcher: Arc<Dispatcher>) -> anyhow::Result<()> {
    let state = ServiceState::new(config.audio.segmenter(), dispatcher);

    let app = Router::new()
        .route("/audio", get(ws_handler))
        .with_state(state)
        .route(
            "/health",
            get(|| async { Json(serde_json::json!({"status": "ok"})) }),
        );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("failed to parse listen address")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    let actual_addr = listener
        .local_addr()
        .context("failed to read local listener address")?;

    info!(address = %actual_addr, sample_rate = config.audio.sample_rate, "listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutting down");
}

async fn ws_handler(
    State(state): State<ServiceState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    upgrade: WebSocketUpgrade,
) -> impl IntoResponse {
    upgrade.on_upgrade(move |socket| handle_socket(state, peer, socket))
}

async fn handle_socket(state: ServiceState, peer: SocketAddr, mut socket: WebSocket) {
    info!(%peer, "client connected");

    let mut segmenter = Segmenter::new(state.segmenter_config.clone());
    let mut segments: u64 = 0;

    while let Some(Ok(message)) = socket.recv().await {
        match message {
            Message::Binary(data) => {
                if let Some(segment) = ingest_frame(&mut segmenter, &data, peer) {
                    segments += 1;
                    dispatch_segment(&state.dispatcher, segment, peer).await;
                }
            }
            Message::Text(text) => {
                debug!(%peer, payload = %text, "ignoring text frame");
            }
            Message::Ping(_) | Message::Pong(_) => {}
            Message::Close(_) => break,
        }
    }

    // Partial audio is discarded on disconnect; only closed segments count.
    info!(%peer, segments, buffered_secs = segmenter.buffer_duration_secs(), "client disconnected");
}

/// Decode one binary frame and feed it to the connection's segmenter.
///
/// Malformed frames are logged and skipped without touching segmenter state.
fn ingest_frame(
    segmenter: &mut Segmenter,
    data: &[u8],
    peer: SocketAddr,
) -> Option<ClosedSegment> {
    let samples = match decode_frame(data) {
        Ok(samples) => samples,
        Err(e) => {
            warn!(%peer, "{}", e);
            return None;
        }
    };

    segmenter.push(&samples)
}

async fn dispatch_segment(dispatcher: &Arc<Dispatcher>, segment: ClosedSegment, peer: SocketAddr) {
    info!(
        %peer,
        reason = %segment.reason,
        "segment closed ({:.2}s)", segment.duration_secs
    );

    let dispatcher = dispatcher.clone();
    let result = tokio::task::spawn_blocking(move || dispatcher.dispatch(segment)).await;

    match result {
        Ok(Some(record)) => {
            info!(
                %peer,
                proc_time = record.proc_time,
                "published: {:?}", record.text
            );
        }
        Ok(None) => {
            debug!(%peer, "segment produced no transcript");
        }
        Err(e) => {
            error!(%peer, "dispatch task failed: {}", e);
        }
    }
}
