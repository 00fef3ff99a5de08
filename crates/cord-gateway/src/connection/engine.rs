//! Connection lifecycle engine
//!
//! Drives the restart protocol: resolve the gateway URL, dial, run the
//! identify/resume handshake, then pump frames until something fails and
//! the cycle begins again. The engine guarantees exactly one restart per
//! observed failure and never drops a queued send across restarts.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast;

use cord_common::GatewayError;
use cord_model::{Ready, Resume, Resumed};

use crate::backoff::Backoff;
use crate::events::EventRegistry;
use crate::options::{EngineOptions, SocketOptions};
use crate::protocol::{decompress, CloseCode, OpCode, Payload, PayloadError};
use crate::transport::{Link, TransportError};

use super::{ConnCell, ConnectionCell, SessionState};

/// Capacity of the error broadcast channel. Subscribers that fall further
/// behind than this observe a `Lagged` error rather than stalling a pump.
const ERROR_BUFFER: usize = 16;

/// Shared state behind a [`Socket`](crate::Socket).
pub(crate) struct SocketInner {
    pub opts: EngineOptions,
    pub events: EventRegistry,
    pub conn: ConnectionCell,
    pub session: SessionState,
    pub errs: broadcast::Sender<GatewayError>,
    backoff: Mutex<Box<dyn Backoff>>,
}

impl SocketInner {
    pub fn new(token: String, options: SocketOptions) -> Arc<Self> {
        let (opts, backoff) = options.fill_defaults(token);
        let (errs, _) = broadcast::channel(ERROR_BUFFER);

        Arc::new(Self {
            opts,
            events: EventRegistry::new(),
            conn: ConnectionCell::new(ConnCell::initial()),
            session: SessionState::new(),
            errs,
            backoff: Mutex::new(backoff),
        })
    }

    /// Boot the connection loop asynchronously.
    pub fn start(self: &Arc<Self>) {
        if let Some(initial) = self.conn.load() {
            self.spawn_restart(None, initial);
        }
    }

    /// Report an error to the debugger and the error stream.
    pub fn report(&self, err: GatewayError) {
        self.opts.debugger.error(&err);
        let _ = self.errs.send(err);
    }

    /// Close the socket: install the tombstone, tear the connection down,
    /// and fail every pending send.
    pub async fn terminate(&self) {
        if let Some(prev) = self.conn.close() {
            prev.close().await;
            prev.queue.drain();
        }
    }

    /// Kick off a restart for a failure observed on `prev`.
    pub fn spawn_restart(self: &Arc<Self>, trigger: Option<GatewayError>, prev: Arc<ConnCell>) {
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            inner.restart(trigger, prev).await;
        });
    }

    /// The restart protocol.
    ///
    /// Forks `prev` into a successor cell and compare-and-swaps it in; a
    /// lost swap means some other task already owns this failure and this
    /// call returns without acting. The loop then resolves the gateway,
    /// sleeps out the backoff, and dials; any step failing re-enters the
    /// loop with the just-installed cell as the new predecessor.
    async fn restart(self: Arc<Self>, mut trigger: Option<GatewayError>, mut prev: Arc<ConnCell>) {
        loop {
            let next = ConnCell::fork(&prev);
            if !self.conn.swap(&prev, next.clone()) {
                return;
            }
            prev.close().await;

            if let Some(err) = trigger.take() {
                self.report(err);
            }

            let url = match self.opts.gateway.gateway().await {
                Ok(url) => url,
                Err(err) => {
                    // Failed lookups retry under the same backoff as
                    // failed dials.
                    tokio::time::sleep(self.next_backoff()).await;
                    trigger = Some(err);
                    prev = next;
                    continue;
                }
            };

            tokio::time::sleep(self.next_backoff()).await;

            match self.establish(&url, &next).await {
                Ok(()) => return,
                Err(err) if err.is_fatal() => {
                    self.report(err);
                    self.terminate().await;
                    return;
                }
                Err(err) => {
                    trigger = Some(err);
                    prev = next;
                    continue;
                }
            }
        }
    }

    /// Dial, handshake, install the live cell and spawn the pumps.
    async fn establish(self: &Arc<Self>, url: &str, cnx: &Arc<ConnCell>) -> Result<(), GatewayError> {
        self.opts.debugger.connecting(url);
        tracing::debug!(endpoint = %url, "connecting to gateway");

        let dial = self.opts.transport.dial(url, &self.opts.headers);
        let link = match tokio::time::timeout(self.opts.timeout, dial).await {
            Ok(Ok(link)) => link,
            Ok(Err(err)) => return Err(GatewayError::Dial(err.to_string())),
            Err(_) => return Err(GatewayError::Dial("dial deadline exceeded".to_string())),
        };

        let heartbeat = self.run_handshake(&link).await?;

        // A fresh cell rather than a mutation of `cnx`: other tasks may
        // have loaded `cnx` already, and they must re-read to see the
        // link. The store is unconditional, but never resurrects a socket
        // that closed while we were dialing.
        let live = ConnCell::with_link(Arc::clone(&link), Arc::clone(&cnx.queue));
        if !self.conn.store_if_open(live.clone()) {
            let _ = link.close().await;
            return Ok(());
        }

        self.reset_backoff();

        let reader = Arc::clone(self);
        let read_cell = Arc::clone(&live);
        let read_link = Arc::clone(&link);
        tokio::spawn(async move {
            reader.read_pump(read_cell, read_link).await;
        });

        let writer = Arc::clone(self);
        tokio::spawn(async move {
            writer.write_pump(live, link, heartbeat).await;
        });

        Ok(())
    }

    /// Send Identify or Resume and wait for the server's opening dispatch.
    ///
    /// Returns the heartbeat interval the write pump should tick at.
    async fn run_handshake(self: &Arc<Self>, link: &Arc<dyn Link>) -> Result<Duration, GatewayError> {
        let payload = match self.session.session_id() {
            None => Payload::new(OpCode::Identify, &self.opts.handshake),
            Some(session_id) => Payload::new(
                OpCode::Resume,
                &Resume {
                    token: self.opts.handshake.token.clone(),
                    session_id,
                    sequence: self.session.sequence(),
                },
            ),
        }
        .map_err(|err| GatewayError::Encode(err.to_string()))?;

        self.write_payload(link, &payload).await?;

        let frame = match tokio::time::timeout(self.opts.timeout, link.recv()).await {
            Ok(Ok(Some(frame))) => frame,
            Ok(Ok(None)) => {
                return Err(GatewayError::Handshake(
                    "connection ended before READY".to_string(),
                ))
            }
            Ok(Err(err)) => return Err(classify_transport(err)),
            Err(_) => {
                return Err(GatewayError::Handshake(
                    "timed out waiting for READY".to_string(),
                ))
            }
        };

        let raw = decompress(&frame).map_err(|err| GatewayError::Decode(err.to_string()))?;
        self.opts.debugger.incoming(&raw);

        let wrapper =
            Payload::from_json_bytes(&raw).map_err(|err| GatewayError::Decode(err.to_string()))?;
        if wrapper.op != OpCode::Dispatch {
            return Err(GatewayError::Handshake(format!(
                "expected a dispatch frame, got {}",
                wrapper.op
            )));
        }

        // A fresh session answers with READY; a resumed one with RESUMED.
        let interval_ms = match wrapper.t.as_str() {
            "READY" => {
                let ready: Ready = serde_json::from_str(wrapper.data())
                    .map_err(|err| GatewayError::Decode(err.to_string()))?;
                self.session.set_session_id(&ready.session_id);
                self.session.set_heartbeat_interval(ready.heartbeat_interval);
                tracing::info!(session_id = %ready.session_id, "gateway session ready");
                ready.heartbeat_interval
            }
            "RESUMED" => {
                let resumed: Resumed = serde_json::from_str(wrapper.data())
                    .map_err(|err| GatewayError::Decode(err.to_string()))?;
                if let Some(ms) = resumed.heartbeat_interval {
                    self.session.set_heartbeat_interval(ms);
                }
                tracing::info!("gateway session resumed");
                self.session.heartbeat_interval()
            }
            other => {
                return Err(GatewayError::Handshake(format!(
                    "expected to get READY event, got {other:?}"
                )))
            }
        };

        if interval_ms == 0 {
            return Err(GatewayError::Handshake(
                "server did not provide a heartbeat interval".to_string(),
            ));
        }

        self.session.observe_sequence(wrapper.s);
        let data = wrapper.data().to_string();
        self.spawn_dispatch(wrapper.t, data);

        Ok(Duration::from_millis(interval_ms))
    }

    /// Read frames off the link, fanning each out in its own task so one
    /// slow handler never stalls the reader.
    async fn read_pump(self: Arc<Self>, cell: Arc<ConnCell>, link: Arc<dyn Link>) {
        loop {
            match link.recv().await {
                Ok(Some(frame)) => {
                    let inner = Arc::clone(&self);
                    let cell = Arc::clone(&cell);
                    tokio::spawn(async move {
                        inner.handle_frame(&frame, &cell);
                    });
                }
                Ok(None) => {
                    self.spawn_restart(
                        Some(GatewayError::Read("connection closed".to_string())),
                        cell,
                    );
                    return;
                }
                Err(err) => {
                    let err = classify_transport(err);
                    if err.is_fatal() {
                        self.report(err);
                        self.terminate().await;
                    } else {
                        self.spawn_restart(Some(err), cell);
                    }
                    return;
                }
            }
        }
    }

    /// Decode an incoming frame and route it by op code.
    fn handle_frame(self: &Arc<Self>, frame: &[u8], cell: &Arc<ConnCell>) {
        let raw = match decompress(frame) {
            Ok(raw) => raw,
            Err(err) => {
                self.report(GatewayError::Decode(err.to_string()));
                return;
            }
        };
        self.opts.debugger.incoming(&raw);

        let payload = match Payload::from_json_bytes(&raw) {
            Ok(payload) => payload,
            Err(PayloadError::UnhandledOp(op)) => {
                self.report(GatewayError::UnhandledOp(op));
                return;
            }
            Err(err) => {
                self.report(GatewayError::Decode(err.to_string()));
                return;
            }
        };

        match payload.op {
            OpCode::Dispatch => {
                self.session.observe_sequence(payload.s);
                if let Err(err) = self.events.dispatch(&payload.t, payload.data().as_bytes()) {
                    self.report(GatewayError::Dispatch {
                        event: payload.t,
                        reason: err.to_string(),
                    });
                }
            }
            OpCode::Reconnect => {
                tracing::debug!("server requested reconnect");
                self.spawn_restart(None, Arc::clone(cell));
            }
            OpCode::InvalidSession => {
                // The session id must be gone before the successor cell is
                // installed, or the next handshake could resume a session
                // the server just invalidated.
                self.session.clear();
                self.spawn_restart(Some(GatewayError::InvalidSession), Arc::clone(cell));
            }
            op => self.report(GatewayError::UnhandledOp(op.as_u8())),
        }
    }

    /// Write heartbeats and queued messages until something fails.
    async fn write_pump(
        self: Arc<Self>,
        cell: Arc<ConnCell>,
        link: Arc<dyn Link>,
        heartbeat: Duration,
    ) {
        let mut ticker =
            tokio::time::interval_at(tokio::time::Instant::now() + heartbeat, heartbeat);

        loop {
            let outcome = tokio::select! {
                _ = ticker.tick() => {
                    match Payload::heartbeat(self.session.sequence()) {
                        Ok(payload) => self.write_payload(&link, &payload).await,
                        Err(err) => Err(GatewayError::Encode(err.to_string())),
                    }
                }
                message = cell.queue.poll() => {
                    let Some(message) = message else { return };
                    let outcome = self.write_text(&link, message.text.clone()).await;
                    message.complete(outcome.clone());
                    outcome
                }
            };

            if let Err(err) = outcome {
                self.spawn_restart(Some(err), cell);
                return;
            }
        }
    }

    /// Serialize and transmit an envelope.
    async fn write_payload(&self, link: &Arc<dyn Link>, payload: &Payload) -> Result<(), GatewayError> {
        let text = payload
            .to_json()
            .map_err(|err| GatewayError::Encode(err.to_string()))?;
        self.write_text(link, text).await
    }

    /// Transmit already-encoded envelope text, bounded by the deadline.
    async fn write_text(&self, link: &Arc<dyn Link>, text: String) -> Result<(), GatewayError> {
        self.opts.debugger.outgoing(text.as_bytes());
        match tokio::time::timeout(self.opts.timeout, link.send_text(text)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(GatewayError::Write(err.to_string())),
            Err(_) => Err(GatewayError::Write("write deadline exceeded".to_string())),
        }
    }

    /// Fan an event out to subscribers without blocking the caller.
    fn spawn_dispatch(self: &Arc<Self>, event: String, data: String) {
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(err) = inner.events.dispatch(&event, data.as_bytes()) {
                inner.report(GatewayError::Dispatch {
                    event,
                    reason: err.to_string(),
                });
            }
        });
    }

    fn next_backoff(&self) -> Duration {
        self.backoff
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .next()
    }

    fn reset_backoff(&self) {
        self.backoff
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .reset();
    }
}

/// Map a transport failure onto the error taxonomy.
///
/// Close frames with a non-reconnectable code become fatal; everything
/// else is a read disruption that feeds the restart protocol.
fn classify_transport(err: TransportError) -> GatewayError {
    match err {
        TransportError::Closed { code, reason } => match CloseCode::from_u16(code) {
            Some(close_code) if !close_code.should_reconnect() => {
                GatewayError::Fatal { code, reason }
            }
            _ => GatewayError::Read(format!("connection closed (code {code}): {reason}")),
        },
        other => GatewayError::Read(other.to_string()),
    }
}
