//! Push channel lifecycle.
//!
//! One background task drives the state machine
//! `Idle -> Connecting -> Open -> ClosedPendingRetry -> Connecting -> ...`.
//! The transport reports what happens to the socket as [`ChannelEvent`]s on an
//! mpsc queue; only that task reads the queue, so there is never more than one
//! connection attempt in flight.

use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::EVENT_CHANNEL_SIZE;
use crate::error::ClientError;
use crate::models::{AlertRecord, ConnectionState};
use crate::render::StatusArea;
use crate::state::SharedState;
use crate::wire;

pub const CONNECTING_TEXT: &str = "Connecting to alert server...";
pub const CONNECTED_TEXT: &str = "Connected. Waiting for crash alerts...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    Opened,
    Message(String),
    Errored(String),
    Closed(Option<String>),
}

/// Opens push channels. Each call owns one socket and reports its lifecycle
/// on `events` until the socket is gone or the returned task is aborted.
pub trait Connector: Send + Sync + 'static {
    fn open(&self, url: &Url, events: mpsc::Sender<ChannelEvent>) -> JoinHandle<()>;
}

/// WebSocket transport.
pub struct WsConnector;

impl Connector for WsConnector {
    fn open(&self, url: &Url, events: mpsc::Sender<ChannelEvent>) -> JoinHandle<()> {
        let url = url.to_string();
        tokio::spawn(async move {
            let mut stream = match tokio_tungstenite::connect_async(url.as_str()).await {
                Ok((stream, _)) => stream,
                Err(e) => {
                    let _ = events.send(ChannelEvent::Errored(e.to_string())).await;
                    return;
                }
            };
            if events.send(ChannelEvent::Opened).await.is_err() {
                return;
            }

            while let Some(frame) = stream.next().await {
                let event = match frame {
                    Ok(Message::Text(text)) => ChannelEvent::Message(text.as_str().to_string()),
                    Ok(Message::Close(frame)) => {
                        let reason = frame.map(|f| f.reason.as_str().to_string());
                        let _ = events.send(ChannelEvent::Closed(reason)).await;
                        return;
                    }
                    Ok(Message::Binary(bytes)) => {
                        debug!(len = bytes.len(), "Ignoring binary push frame");
                        continue;
                    }
                    Ok(_) => continue,
                    Err(e) => {
                        let _ = events.send(ChannelEvent::Errored(e.to_string())).await;
                        return;
                    }
                };
                if events.send(event).await.is_err() {
                    return;
                }
            }
            let _ = events.send(ChannelEvent::Closed(None)).await;
        })
    }
}

pub struct ConnectionManager {
    state: SharedState,
    connector: Arc<dyn Connector>,
    stop_tx: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ConnectionManager {
    pub fn new(state: SharedState) -> Self {
        Self::with_connector(state, Arc::new(WsConnector))
    }

    pub fn with_connector(state: SharedState, connector: Arc<dyn Connector>) -> Self {
        let (stop_tx, _) = watch::channel(false);
        Self {
            state,
            connector,
            stop_tx,
            task: Mutex::new(None),
        }
    }

    /// Start the push channel. Refused unless the manager is idle.
    pub async fn start(&self) -> Result<(), ClientError> {
        let mut task = self.task.lock().await;
        {
            let mut conn = self.state.connection.write().await;
            if *conn != ConnectionState::Idle {
                return Err(ClientError::AlreadyRunning);
            }
            *conn = ConnectionState::Connecting;
        }

        self.state
            .renderer
            .render_status(StatusArea::Notifications, CONNECTING_TEXT);

        self.stop_tx.send_replace(false);
        let stop_rx = self.stop_tx.subscribe();
        *task = Some(tokio::spawn(run_channel(
            self.state.clone(),
            self.connector.clone(),
            stop_rx,
        )));
        Ok(())
    }

    /// Tear the channel down without scheduling a reconnect.
    pub async fn stop(&self) {
        self.stop_tx.send_replace(true);
        if let Some(handle) = self.task.lock().await.take() {
            if let Err(e) = handle.await {
                warn!("Push channel task ended abnormally: {}", e);
            }
        }
        self.state.set_connection_state(ConnectionState::Idle).await;
    }

    pub async fn state(&self) -> ConnectionState {
        self.state.connection_state().await
    }
}

async fn run_channel(
    state: SharedState,
    connector: Arc<dyn Connector>,
    mut stop_rx: watch::Receiver<bool>,
) {
    let mut attempt: u64 = 0;

    loop {
        attempt += 1;
        state.set_connection_state(ConnectionState::Connecting).await;
        info!(url = %state.config.ws_url, attempt, "Connecting push channel");

        let (events_tx, mut events) = mpsc::channel(EVENT_CHANNEL_SIZE);
        let transport = connector.open(&state.config.ws_url, events_tx);

        let reason = loop {
            tokio::select! {
                _ = stop_rx.changed() => {
                    transport.abort();
                    state.set_connection_state(ConnectionState::Idle).await;
                    info!("Push channel stopped");
                    return;
                }
                event = events.recv() => match event {
                    Some(ChannelEvent::Opened) => on_open(&state).await,
                    Some(ChannelEvent::Message(raw)) => dispatch(&state, &raw).await,
                    Some(ChannelEvent::Errored(e)) => break e,
                    Some(ChannelEvent::Closed(reason)) => {
                        break reason
                            .filter(|r| !r.is_empty())
                            .unwrap_or_else(|| "connection closed".to_string())
                    }
                    None => break "transport ended".to_string(),
                },
            }
        };
        transport.abort();
        on_loss(&state, &reason).await;

        tokio::select! {
            _ = stop_rx.changed() => {
                state.set_connection_state(ConnectionState::Idle).await;
                info!("Push channel stopped while waiting to reconnect");
                return;
            }
            _ = sleep(state.config.reconnect_delay) => {}
        }
    }
}

async fn on_open(state: &SharedState) {
    state.set_connection_state(ConnectionState::Open).await;
    info!("Push channel open");
    if state.notifications.is_empty().await {
        state
            .renderer
            .render_status(StatusArea::Notifications, CONNECTED_TEXT);
    } else {
        debug!("Push channel reopened; notification status left as is");
    }
}

async fn dispatch(state: &SharedState, raw: &str) {
    if state.connection_state().await != ConnectionState::Open {
        debug!("Dropping push message received before open");
        return;
    }
    match wire::decode(raw) {
        Ok(envelope) => {
            let record = envelope.into_alert();
            info!(video = %record.video_filename, "Crash alert received");
            state.notifications.push(record.clone()).await;
            state.renderer.render_notification(&record);
        }
        Err(e) => debug!(error = %e, "Dropping push message"),
    }
}

async fn on_loss(state: &SharedState, reason: &str) {
    state
        .set_connection_state(ConnectionState::ClosedPendingRetry)
        .await;
    let delay = state.config.reconnect_delay;
    warn!(reason, retry_in_ms = delay.as_millis() as u64, "Push channel lost");

    let record = AlertRecord::connection_error(reason);
    state.notifications.push(record.clone()).await;
    state.renderer.render_notification(&record);
    state.renderer.render_status(
        StatusArea::Notifications,
        &format!(
            "Connection lost. Reconnecting in {}s...",
            delay.as_secs_f64()
        ),
    );
}
