//! Native WebSocket client on `tokio-tungstenite`.
//!
//! A background tokio task owns the socket. It:
//! - subscribes every tracked subscription on each open
//! - sends an application-level `Ping` on a fixed interval
//! - reconnects with `base · 2^n` backoff after any close or error, without
//!   an attempt limit, resetting `n` on a successful open
//! - queues messages sent while disconnected and flushes them on reconnect
//!
//! Events reach the consumer through a bounded channel, exposed as a stream.

use std::pin::Pin;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream, Stream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::error::WsError;
use crate::ws::{
    MessageIn, MessageOut, ReadyState, ReconnectBackoff, Subscription, SubscriptionSet, WsConfig,
    WsEvent,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;

// ─── Commands from public API to background task ─────────────────────────────

enum Command {
    Send(MessageOut),
    Disconnect,
}

enum DisconnectReason {
    UserRequested,
    Dropped(String),
}

// ─── Background task state ───────────────────────────────────────────────────

struct TaskState {
    config: WsConfig,
    event_tx: mpsc::Sender<WsEvent>,
    cmd_rx: mpsc::Receiver<Command>,
    subscriptions: SubscriptionSet,
    pending_messages: Vec<MessageOut>,
    backoff: ReconnectBackoff,
    ready_state: Arc<AtomicU16>,
}

impl TaskState {
    fn emit(&self, event: WsEvent) {
        if self.event_tx.try_send(event).is_err() {
            tracing::debug!("WS event dropped, consumer is behind or gone");
        }
    }

    fn set_ready(&self, state: ReadyState) {
        self.ready_state.store(state as u16, Ordering::SeqCst);
    }
}

// ─── Public WsClient ─────────────────────────────────────────────────────────

/// Reconnecting client for the price streamer.
pub struct WsClient {
    config: WsConfig,
    cmd_tx: Option<mpsc::Sender<Command>>,
    event_rx: tokio::sync::Mutex<mpsc::Receiver<WsEvent>>,
    event_tx: mpsc::Sender<WsEvent>,
    task_handle: Option<JoinHandle<()>>,
    ready_state: Arc<AtomicU16>,
}

impl WsClient {
    /// Create a new WS client. Does not connect yet.
    pub fn new(config: WsConfig) -> Self {
        let (event_tx, event_rx) = mpsc::channel(256);
        Self {
            config,
            cmd_tx: None,
            event_rx: tokio::sync::Mutex::new(event_rx),
            event_tx,
            task_handle: None,
            ready_state: Arc::new(AtomicU16::new(ReadyState::Closed as u16)),
        }
    }

    pub fn config(&self) -> &WsConfig {
        &self.config
    }

    /// Spawn the background task. A failed first connection is not an error
    /// here: it shows up as events and is retried.
    pub async fn connect(&mut self) -> Result<(), WsError> {
        if self.cmd_tx.is_some() {
            return Ok(());
        }

        let (cmd_tx, cmd_rx) = mpsc::channel(64);
        self.cmd_tx = Some(cmd_tx);
        self.ready_state
            .store(ReadyState::Connecting as u16, Ordering::SeqCst);

        let state = TaskState {
            subscriptions: SubscriptionSet::new(&self.config.subscriptions),
            backoff: self.config.backoff(),
            config: self.config.clone(),
            event_tx: self.event_tx.clone(),
            cmd_rx,
            pending_messages: Vec::new(),
            ready_state: Arc::clone(&self.ready_state),
        };

        self.task_handle = Some(tokio::spawn(run_task(state)));
        Ok(())
    }

    /// Close gracefully and wait up to five seconds for the task to finish.
    pub async fn disconnect(&mut self) -> Result<(), WsError> {
        if let Some(tx) = self.cmd_tx.take() {
            let _ = tx.send(Command::Disconnect).await;
        }

        if let Some(handle) = self.task_handle.take() {
            let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
        }

        self.ready_state
            .store(ReadyState::Closed as u16, Ordering::SeqCst);
        Ok(())
    }

    pub fn send(&self, msg: MessageOut) -> Result<(), WsError> {
        match &self.cmd_tx {
            Some(tx) => tx.try_send(Command::Send(msg)).map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => {
                    WsError::SendFailed("Command channel full".into())
                }
                mpsc::error::TrySendError::Closed(_) => WsError::NotConnected,
            }),
            None => Err(WsError::NotConnected),
        }
    }

    pub fn subscribe(&self, subs: &[Subscription]) -> Result<(), WsError> {
        self.send(MessageOut::sub_add(subs))
    }

    pub fn unsubscribe(&self, subs: &[Subscription]) -> Result<(), WsError> {
        self.send(MessageOut::sub_remove(subs))
    }

    pub fn is_connected(&self) -> bool {
        self.ready_state() == ReadyState::Open
    }

    pub fn ready_state(&self) -> ReadyState {
        ReadyState::from(self.ready_state.load(Ordering::SeqCst))
    }

    /// Stream of connection events. Borrows `self`, so drop it before
    /// calling `disconnect()`.
    pub fn events(&self) -> Pin<Box<dyn Stream<Item = WsEvent> + Send + '_>> {
        Box::pin(futures_util::stream::unfold(
            &self.event_rx,
            |rx| async move {
                let mut guard = rx.lock().await;
                guard.recv().await.map(|event| (event, rx))
            },
        ))
    }
}

impl Drop for WsClient {
    fn drop(&mut self) {
        if let Some(handle) = self.task_handle.take() {
            handle.abort();
        }
    }
}

// ─── Background task ─────────────────────────────────────────────────────────

/// One open socket.
struct Link {
    sink: WsSink,
    stream: SplitStream<WsStream>,
}

impl Link {
    async fn open(config: &WsConfig) -> Result<Self, WsError> {
        let timeout = Duration::from_millis(config.connect_timeout_ms);
        let (socket, _) = tokio::time::timeout(timeout, connect_async(config.url.as_str()))
            .await
            .map_err(|_| WsError::ConnectionFailed("timed out".into()))?
            .map_err(|e| WsError::ConnectionFailed(e.to_string()))?;
        let (sink, stream) = socket.split();
        Ok(Self { sink, stream })
    }

    async fn send(&mut self, msg: &MessageOut) -> Result<(), WsError> {
        let json = serde_json::to_string(msg).map_err(|e| WsError::SendFailed(e.to_string()))?;
        self.sink
            .send(Message::Text(json.into()))
            .await
            .map_err(|e| WsError::SendFailed(e.to_string()))
    }

    /// Subscribe everything tracked, then replay what was queued while the
    /// socket was down. Queued `SubAdd`s are already covered by the first.
    async fn restore(&mut self, state: &mut TaskState) {
        let queued = std::mem::take(&mut state.pending_messages);
        let replay = state
            .subscriptions
            .resubscribe_message()
            .into_iter()
            .chain(queued.into_iter().filter(|m| !matches!(m, MessageOut::SubAdd { .. })));
        for msg in replay {
            if let Err(e) = self.send(&msg).await {
                tracing::warn!(error = %e, "price stream restore failed");
            }
        }
    }

    async fn close(&mut self) {
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: "Client disconnect".into(),
        };
        let _ = self.sink.send(Message::Close(Some(frame))).await;
    }
}

async fn run_task(mut state: TaskState) {
    loop {
        match Link::open(&state.config).await {
            Ok(mut link) => {
                tracing::info!(url = %state.config.url, "price stream connected");
                state.backoff.reset();
                state.set_ready(ReadyState::Open);
                state.emit(WsEvent::Connected);
                link.restore(&mut state).await;

                if let Ended::ByClient = pump(&mut state, &mut link).await {
                    state.set_ready(ReadyState::Closed);
                    return;
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "price stream connection failed");
                state.emit(WsEvent::Error(e.to_string()));
            }
        }

        state.set_ready(ReadyState::Closed);
        if !state.config.reconnect {
            return;
        }

        let (attempt, delay_ms) = state.backoff.next_delay();
        tracing::info!(attempt, delay_ms, "price stream reconnect scheduled");
        state.emit(WsEvent::ReconnectScheduled { attempt, delay_ms });
        if !wait_for_reconnect(&mut state, Duration::from_millis(delay_ms)).await {
            return;
        }
        state.set_ready(ReadyState::Connecting);
    }
}

/// Sleep through the backoff while still accepting commands. Returns `false`
/// when the client asked to stop.
async fn wait_for_reconnect(state: &mut TaskState, delay: Duration) -> bool {
    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            () = &mut sleep => return true,
            cmd = state.cmd_rx.recv() => match cmd {
                Some(Command::Send(msg)) => {
                    state.subscriptions.track(&msg);
                    if msg != MessageOut::Ping {
                        state.pending_messages.push(msg);
                    }
                }
                Some(Command::Disconnect) | None => return false,
            },
        }
    }
}

enum Ended {
    ByClient,
    Dropped,
}

/// Move frames and commands until the link breaks or the client leaves.
async fn pump(state: &mut TaskState, link: &mut Link) -> Ended {
    let mut ping = tokio::time::interval(Duration::from_millis(state.config.ping_interval_ms));
    ping.reset();
    let idle = Duration::from_millis(state.config.idle_timeout_ms);
    let mut last_frame = tokio::time::Instant::now();

    loop {
        let watchdog = tokio::time::sleep_until(last_frame + idle);
        tokio::select! {
            frame = link.stream.next() => {
                last_frame = tokio::time::Instant::now();
                match frame {
                    Some(Ok(Message::Text(text))) => on_text(state, text.as_ref()),
                    Some(Ok(Message::Ping(data))) => {
                        let _ = link.sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = close_details(frame.as_ref());
                        return dropped(state, Some(code), reason);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return dropped(state, None, e.to_string()),
                    None => return dropped(state, None, "Stream ended".into()),
                }
            }

            cmd = state.cmd_rx.recv() => match cmd {
                Some(Command::Send(msg)) => {
                    state.subscriptions.track(&msg);
                    if let Err(e) = link.send(&msg).await {
                        tracing::warn!(error = %e, "price stream send failed");
                    }
                }
                Some(Command::Disconnect) | None => {
                    link.close().await;
                    return Ended::ByClient;
                }
            },

            _ = ping.tick() => {
                if let Err(e) = link.send(&MessageOut::Ping).await {
                    tracing::warn!(error = %e, "price stream ping failed");
                }
            }

            () = watchdog, if !idle.is_zero() => {
                return dropped(state, None, format!("No frame for {}s", idle.as_secs()));
            }
        }
    }
}

fn on_text(state: &TaskState, text: &str) {
    match MessageIn::parse(text) {
        Ok(frame) => state.emit(WsEvent::Message(frame.kind)),
        // Unparseable frames are skipped; they say nothing about the link.
        Err(e) => tracing::debug!(error = %e, raw = text, "unparseable price frame"),
    }
}

fn dropped(state: &TaskState, code: Option<u16>, reason: String) -> Ended {
    tracing::warn!(?code, %reason, "price stream dropped");
    state.emit(WsEvent::Disconnected { code, reason });
    Ended::Dropped
}

fn close_details(frame: Option<&CloseFrame>) -> (u16, String) {
    match frame {
        Some(f) => (f.code.into(), f.reason.to_string()),
        None => (1006, "No close frame".into()),
    }
}
