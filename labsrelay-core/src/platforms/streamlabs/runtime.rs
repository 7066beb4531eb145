// streamlabs/runtime.rs

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::time::{interval_at, sleep, sleep_until, timeout, Duration, Instant};
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, trace, warn};
use serde_json::Value;
use url::Url;

use crate::config::{RelayConfig, SocketOptions};
use crate::platforms::ConnectionStatus;
use crate::relay::EventRelay;
use crate::Error;

use super::frames::{self, EnginePacket, OpenHandshake, SocketPacket, PING, PONG};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How a single connected session ended.
enum SessionEnd {
    Closed,
    Shutdown,
}

/// Keeps one socket connection to the Streamlabs feed alive and hands every
/// `event` packet to the relay.
pub struct StreamlabsSocket {
    token: String,
    options: SocketOptions,
    relay: EventRelay,
    status_tx: watch::Sender<ConnectionStatus>,
    shutdown_rx: watch::Receiver<bool>,
}

impl StreamlabsSocket {
    pub fn new(
        config: &RelayConfig,
        relay: EventRelay,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        let (status_tx, _) = watch::channel(ConnectionStatus::Disconnected);
        Self {
            token: config.socket_token.clone(),
            options: config.socket.clone(),
            relay,
            status_tx,
            shutdown_rx,
        }
    }

    /// Watch connection status changes.
    pub fn status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_tx.subscribe()
    }

    fn set_status(&self, status: ConnectionStatus) {
        debug!("[Streamlabs] status -> {:?}", status);
        self.status_tx.send_replace(status);
    }

    /// Entrypoint: connects, reads until the socket drops, and reconnects
    /// with backoff while `reconnect` is enabled. Returns on shutdown.
    pub async fn start_loop(&mut self) -> Result<(), Error> {
        let url = socket_url(&self.options.url, &self.token)?;
        let mut failures: u32 = 0;

        loop {
            if *self.shutdown_rx.borrow() {
                break;
            }

            self.set_status(ConnectionStatus::Connecting);
            let failure = match self.run_session(&url, &mut failures).await {
                Ok(SessionEnd::Shutdown) => break,
                Ok(SessionEnd::Closed) => {
                    info!("[Streamlabs] socket closed.");
                    None
                }
                Err(e) => {
                    error!("[Streamlabs] connection error: {}", e);
                    self.set_status(ConnectionStatus::Error(e.to_string()));
                    Some(e)
                }
            };

            if !self.options.reconnect {
                info!("[Streamlabs] reconnect disabled, stopping.");
                self.set_status(ConnectionStatus::Disconnected);
                return failure.map_or(Ok(()), Err);
            }

            failures += 1;
            if let Some(max) = self.options.reconnection_attempts {
                if failures > max {
                    self.set_status(ConnectionStatus::Disconnected);
                    return Err(Error::Platform(format!(
                        "giving up after {} reconnection attempts",
                        max
                    )));
                }
            }

            let delay = reconnect_delay(&self.options, failures);
            warn!("[Streamlabs] reconnecting in {:?} (attempt {})", delay, failures);
            self.set_status(ConnectionStatus::Reconnecting);

            tokio::select! {
                _ = sleep(delay) => {}
                _ = wait_for_shutdown(&mut self.shutdown_rx) => break,
            }
        }

        self.set_status(ConnectionStatus::Disconnected);
        Ok(())
    }

    async fn run_session(&mut self, url: &Url, failures: &mut u32) -> Result<SessionEnd, Error> {
        let limit = Duration::from_millis(self.options.timeout_ms);

        let connect = async {
            let (mut ws, _) = timeout(limit, connect_async(url.as_str())).await??;
            let handshake = timeout(limit, wait_for_open(&mut ws)).await??;
            Ok::<_, Error>((ws, handshake))
        };

        let (mut ws, handshake) = tokio::select! {
            connected = connect => connected?,
            _ = wait_for_shutdown(&mut self.shutdown_rx) => {
                info!("[Streamlabs] shutdown requested while connecting.");
                return Ok(SessionEnd::Shutdown);
            }
        };

        info!("[Streamlabs] connected (sid={})", handshake.sid);
        *failures = 0;
        self.set_status(ConnectionStatus::Connected);

        self.run_read_loop(&mut ws, &handshake).await
    }

    /// Reads until the socket closes, the server disconnects us, or shutdown.
    async fn run_read_loop(
        &mut self,
        ws: &mut WsStream,
        handshake: &OpenHandshake,
    ) -> Result<SessionEnd, Error> {
        let ping_every = Duration::from_millis(handshake.ping_interval.max(1));
        let ping_timeout = Duration::from_millis(handshake.ping_timeout);
        let mut ping_timer = interval_at(Instant::now() + ping_every, ping_every);
        // Set while a ping is unanswered.
        let mut pong_deadline: Option<Instant> = None;

        loop {
            tokio::select! {
                _ = wait_for_shutdown(&mut self.shutdown_rx) => {
                    let _ = ws.close(None).await;
                    return Ok(SessionEnd::Shutdown);
                }

                _ = ping_timer.tick() => {
                    if pong_deadline.is_none() {
                        ws.send(Message::text(PING)).await?;
                        pong_deadline = Some(Instant::now() + ping_timeout);
                    }
                }

                _ = sleep_until_deadline(pong_deadline) => {
                    return Err(Error::Platform(format!(
                        "no pong within {}ms",
                        handshake.ping_timeout
                    )));
                }

                msg = ws.next() => {
                    let Some(msg) = msg else { return Ok(SessionEnd::Closed) };
                    let msg = msg?;

                    if msg.is_close() { return Ok(SessionEnd::Closed); }
                    let Message::Text(txt) = msg else { continue };

                    match frames::decode(txt.as_str()) {
                        Ok(EnginePacket::Pong(_)) => {
                            trace!("[Streamlabs] pong");
                            pong_deadline = None;
                        }
                        Ok(EnginePacket::Ping(probe)) => {
                            ws.send(Message::text(format!("{PONG}{probe}"))).await?;
                        }
                        Ok(EnginePacket::Message(SocketPacket::Event { name, data })) => {
                            self.handle_event(&name, data);
                        }
                        Ok(EnginePacket::Message(SocketPacket::Connect { namespace })) => {
                            debug!("[Streamlabs] socket.io connected (namespace={:?})", namespace);
                        }
                        Ok(EnginePacket::Message(SocketPacket::Disconnect { .. }))
                        | Ok(EnginePacket::Close) => {
                            return Ok(SessionEnd::Closed);
                        }
                        Ok(EnginePacket::Message(SocketPacket::Error(reason))) => {
                            let reason = format!("server rejected the socket: {reason}");
                            return Err(Error::Platform(reason));
                        }
                        Ok(other) => trace!("[Streamlabs] unhandled packet {:?}", other),
                        Err(e) => warn!("[Streamlabs] undecodable frame {:?}: {}", txt.as_str(), e),
                    }
                }
            }
        }
    }

    fn handle_event(&self, name: &str, data: Value) {
        if name != "event" {
            debug!("[Streamlabs] ignoring socket event '{}'", name);
            return;
        }
        match self.relay.handle(data) {
            Ok(published) => trace!("[Streamlabs] relayed event as {} message(s)", published),
            Err(e) => error!("[Streamlabs] failed to relay event: {}", e),
        }
    }
}

async fn wait_for_open(ws: &mut WsStream) -> Result<OpenHandshake, Error> {
    while let Some(msg) = ws.next().await {
        let msg = msg?;
        if msg.is_close() {
            return Err(Error::Platform("connection closed before the open packet".into()));
        }
        let Message::Text(txt) = msg else { continue };
        if let EnginePacket::Open(handshake) = frames::decode(txt.as_str())? {
            return Ok(handshake);
        }
    }
    Err(Error::Platform("connection closed before the open packet".into()))
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}

/// Resolves once shutdown is signalled; never resolves if the sender is gone.
async fn wait_for_shutdown(rx: &mut watch::Receiver<bool>) {
    while !*rx.borrow_and_update() {
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// `<base>/socket.io/?token=<token>&EIO=3&transport=websocket`, with http(s)
/// mapped to ws(s).
pub fn socket_url(base: &str, token: &str) -> Result<Url, Error> {
    let mut url = Url::parse(base)?;
    let scheme = match url.scheme() {
        "https" | "wss" => "wss",
        "http" | "ws" => "ws",
        other => {
            return Err(Error::Config(format!("unsupported socket url scheme '{other}'")));
        }
    };
    url.set_scheme(scheme)
        .map_err(|_| Error::Config(format!("cannot use scheme '{scheme}' for {base}")))?;
    url.set_path("/socket.io/");
    url.query_pairs_mut()
        .clear()
        .append_pair("token", token)
        .append_pair("EIO", "3")
        .append_pair("transport", "websocket");
    Ok(url)
}

/// Delay before reconnect attempt `attempt` (1-based): the base delay
/// doubled per previous failure, capped at the configured maximum.
pub fn reconnect_delay(options: &SocketOptions, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(31);
    let millis = options
        .reconnection_delay_ms
        .saturating_mul(1u64 << exponent)
        .min(options.reconnection_delay_max_ms.max(options.reconnection_delay_ms));
    Duration::from_millis(millis)
}
