//! Live-update connection for one job.
//!
//! The lifecycle lives in [`LinkMachine`]; this module only owns the socket.
//! Each `connect` starts a session task guarded by its own cancellation token,
//! and every machine transition is taken under the shared lock after checking
//! that token, so a replaced or disconnected session can never move the state.
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::{SinkExt, StreamExt};
use quote_core::{CloseOutcome, EventError, JobId, LinkMachine, LinkStatus, LiveEvent};
use quote_logging::{quote_debug, quote_info, quote_warn};
use serde_json::Value;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::settings::live_url;
use crate::ClientSettings;

/// Receives live events. Implementations must not block.
pub trait EventSink: Send + Sync {
    fn deliver(&self, event: &LiveEvent);

    /// A frame failed validation and was dropped.
    fn rejected(&self, _error: &EventError) {}

    fn status_changed(&self, _status: LinkStatus) {}
}

pub type SubscriptionId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LiveError {
    #[error("invalid live url: {0}")]
    InvalidUrl(String),
}

struct Session {
    token: CancellationToken,
    outbound: mpsc::UnboundedSender<String>,
}

struct Shared {
    machine: LinkMachine,
    sinks: Vec<(SubscriptionId, Arc<dyn EventSink>)>,
    next_subscription: SubscriptionId,
    session: Option<Session>,
}

impl Shared {
    fn sinks(&self) -> Vec<Arc<dyn EventSink>> {
        self.sinks.iter().map(|(_, sink)| sink.clone()).collect()
    }
}

pub struct LiveClient {
    url_template: String,
    runtime: Handle,
    shared: Arc<Mutex<Shared>>,
}

impl LiveClient {
    pub fn new(settings: &ClientSettings, runtime: Handle) -> Self {
        Self {
            url_template: settings.ws_url_template.clone(),
            runtime,
            shared: Arc::new(Mutex::new(Shared {
                machine: LinkMachine::new(settings.reconnect),
                sinks: Vec::new(),
                next_subscription: 0,
                session: None,
            })),
        }
    }

    /// Targets `job_id`, dropping any previous connection.
    pub fn connect(&self, job_id: impl Into<JobId>) -> Result<(), LiveError> {
        let job_id = job_id.into();
        let url = live_url(&self.url_template, &job_id)
            .map_err(|err| LiveError::InvalidUrl(format!("{}: {err}", self.url_template)))?;

        let token = CancellationToken::new();
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let sinks = {
            let mut shared = lock(&self.shared);
            if let Some(previous) = shared.session.take() {
                previous.token.cancel();
            }
            shared.machine.connect(job_id.clone());
            shared.session = Some(Session {
                token: token.clone(),
                outbound,
            });
            shared.sinks()
        };
        notify_status(&sinks, LinkStatus::Connecting);

        quote_info!("Opening live connection for job {} at {}", job_id, url);
        self.runtime.spawn(run_session(
            self.shared.clone(),
            url,
            token,
            outbound_rx,
        ));
        Ok(())
    }

    /// Adds a sink; events are delivered to sinks in subscription order.
    pub fn subscribe(&self, sink: Arc<dyn EventSink>) -> SubscriptionId {
        let mut shared = lock(&self.shared);
        shared.next_subscription += 1;
        let id = shared.next_subscription;
        shared.sinks.push((id, sink));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut shared = lock(&self.shared);
        let before = shared.sinks.len();
        shared.sinks.retain(|(sink_id, _)| *sink_id != id);
        shared.sinks.len() != before
    }

    /// Queues a JSON message. Returns false, with a warning, unless the link is open.
    pub fn send(&self, message: &Value) -> bool {
        let shared = lock(&self.shared);
        let status = shared.machine.status();
        let Some(session) = shared.session.as_ref().filter(|_| status == LinkStatus::Open) else {
            quote_warn!("Live connection is {}; message not sent", status.label());
            return false;
        };
        match serde_json::to_string(message) {
            Ok(text) => session.outbound.send(text).is_ok(),
            Err(err) => {
                quote_warn!("Could not encode live message: {}", err);
                false
            }
        }
    }

    /// Closes the connection, forgets the job and drops every subscriber.
    /// No reconnect happens afterwards.
    pub fn disconnect(&self) {
        let sinks = {
            let mut shared = lock(&self.shared);
            if let Some(session) = shared.session.take() {
                session.token.cancel();
            }
            shared.machine.disconnect();
            std::mem::take(&mut shared.sinks)
        };
        let sinks: Vec<_> = sinks.into_iter().map(|(_, sink)| sink).collect();
        notify_status(&sinks, LinkStatus::Disconnected);
    }

    pub fn state(&self) -> LinkStatus {
        lock(&self.shared).machine.status()
    }

    pub fn job_id(&self) -> Option<JobId> {
        lock(&self.shared).machine.job_id().map(ToOwned::to_owned)
    }

    pub fn attempts(&self) -> u32 {
        lock(&self.shared).machine.attempts()
    }
}

impl Drop for LiveClient {
    fn drop(&mut self) {
        if let Some(session) = lock(&self.shared).session.take() {
            session.token.cancel();
        }
    }
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

fn notify_status(sinks: &[Arc<dyn EventSink>], status: LinkStatus) {
    for sink in sinks {
        sink.status_changed(status);
    }
}

/// Applies a machine transition unless the session was cancelled meanwhile.
fn transition<R>(
    shared: &Mutex<Shared>,
    token: &CancellationToken,
    step: impl FnOnce(&mut LinkMachine) -> R,
) -> Option<R> {
    let (result, status, sinks) = {
        let mut shared = lock(shared);
        if token.is_cancelled() {
            return None;
        }
        let result = step(&mut shared.machine);
        (result, shared.machine.status(), shared.sinks())
    };
    notify_status(&sinks, status);
    Some(result)
}

async fn run_session(
    shared: Arc<Mutex<Shared>>,
    url: Url,
    token: CancellationToken,
    mut outbound_rx: mpsc::UnboundedReceiver<String>,
) {
    loop {
        let connected = tokio::select! {
            _ = token.cancelled() => return,
            result = tokio_tungstenite::connect_async(url.as_str()) => result,
        };

        match connected {
            Ok((stream, _response)) => {
                if transition(&shared, &token, LinkMachine::opened).is_none() {
                    return;
                }
                quote_info!("Live connection open: {}", url);
                pump(stream, &shared, &token, &mut outbound_rx).await;
                quote_info!("Live connection closed: {}", url);
            }
            Err(err) => quote_warn!("Live connection to {} failed: {}", url, err),
        }

        let Some(outcome) = transition(&shared, &token, LinkMachine::closed) else {
            return;
        };
        match outcome {
            CloseOutcome::Reconnect { attempt, delay } => {
                quote_info!(
                    "Reconnecting to {} in {:?} (attempt {})",
                    url,
                    delay,
                    attempt
                );
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = tokio::time::sleep(delay) => {}
                }
                match transition(&shared, &token, LinkMachine::reconnect_due) {
                    Some(Some(_)) => {}
                    _ => return,
                }
            }
            CloseOutcome::GiveUp => {
                quote_warn!("Giving up on live connection to {}", url);
                return;
            }
            CloseOutcome::Idle => return,
        }
    }
}

type Socket =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Moves frames until the socket closes or the session is cancelled.
async fn pump(
    stream: Socket,
    shared: &Mutex<Shared>,
    token: &CancellationToken,
    outbound_rx: &mut mpsc::UnboundedReceiver<String>,
) {
    let (mut write, mut read) = stream.split();
    loop {
        tokio::select! {
            _ = token.cancelled() => {
                let _ = write.send(Message::Close(None)).await;
                return;
            }
            Some(text) = outbound_rx.recv() => {
                if let Err(err) = write.send(Message::Text(text.into())).await {
                    quote_warn!("Live send failed: {}", err);
                    return;
                }
            }
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => dispatch_frame(shared, token, text.as_str()),
                Some(Ok(Message::Ping(payload))) => {
                    let _ = write.send(Message::Pong(payload)).await;
                }
                Some(Ok(Message::Close(_))) | None => return,
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    quote_warn!("Live connection error: {}", err);
                    return;
                }
            },
        }
    }
}

fn dispatch_frame(shared: &Mutex<Shared>, token: &CancellationToken, text: &str) {
    let sinks = {
        let shared = lock(shared);
        if token.is_cancelled() {
            return;
        }
        shared.sinks()
    };
    match LiveEvent::parse(text) {
        Ok(event) => {
            quote_debug!("Live event {} for job {}", event.type_name(), event.job_id);
            for sink in &sinks {
                sink.deliver(&event);
            }
        }
        Err(err) => {
            quote_warn!("Dropping live frame: {}", err);
            for sink in &sinks {
                sink.rejected(&err);
            }
        }
    }
}
