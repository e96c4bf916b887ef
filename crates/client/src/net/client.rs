use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::Context;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::{self, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use rink::{ClientMessage, PaddleInput, ServerMessage, Snapshot};

use super::session::{ClientSession, SessionEvent};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Local wall clock in milliseconds, the time base a session runs on.
pub fn now_ms() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or_default()
}

/// Whatever steers a connected session: a keyboard, a bot, a test script.
pub trait Driver {
    /// Reacts to a session event, optionally with a message to send.
    fn on_event(&mut self, session: &ClientSession, event: &SessionEvent) -> Option<ClientMessage>;

    /// Picks the input for the next send slot from the current frame.
    fn on_frame(&mut self, session: &ClientSession, frame: Option<&Snapshot>) -> PaddleInput;
}

/// WebSocket connection running a [`ClientSession`].
pub struct NetworkClient {
    ws: WsStream,
    session: ClientSession,
}

impl NetworkClient {
    pub async fn connect(url: &str, session: ClientSession) -> anyhow::Result<Self> {
        log::info!("connecting to {url}");
        let (ws, _) = connect_async(url)
            .await
            .with_context(|| format!("connecting to {url}"))?;
        Ok(Self { ws, session })
    }

    pub fn session(&self) -> &ClientSession {
        &self.session
    }

    async fn send(&mut self, message: &ClientMessage) -> anyhow::Result<()> {
        let text = message.encode()?;
        self.ws.send(Message::Text(text.into())).await?;
        Ok(())
    }

    /// Joins `room` and plays until the room ends or the socket closes.
    pub async fn run(mut self, room: &str, driver: &mut impl Driver) -> anyhow::Result<()> {
        let join = self.session.join(room)?;
        self.send(&join).await?;
        let ping = self.session.ping(now_ms());
        self.send(&ping).await?;

        let config = self.session.config().clone();
        let mut input_tick = time::interval(Duration::from_millis(config.input_send_interval_ms));
        input_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut ping_tick = time::interval(Duration::from_secs_f32(config.ping_interval_secs));
        ping_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                frame = self.ws.next() => {
                    let text = match frame {
                        Some(Ok(Message::Text(text))) => text,
                        Some(Ok(Message::Close(_))) | None => {
                            log::info!("server closed the connection");
                            return Ok(());
                        }
                        Some(Ok(_)) => continue,
                        Some(Err(err)) => return Err(err.into()),
                    };
                    let message = match ServerMessage::parse(text.as_str()) {
                        Ok(message) => message,
                        Err(err) => {
                            log::debug!("ignoring server frame: {err}");
                            continue;
                        }
                    };
                    if self.handle(message, driver).await? {
                        return Ok(());
                    }
                }
                _ = input_tick.tick() => {
                    let now = now_ms();
                    let frame = self.session.frame(now);
                    let input = driver.on_frame(&self.session, frame.as_ref());
                    self.session.set_input(input);
                    if let Some(message) = self.session.poll_input(now) {
                        self.send(&message).await?;
                    }
                }
                _ = ping_tick.tick() => {
                    let ping = self.session.ping(now_ms());
                    self.send(&ping).await?;
                }
            }
        }
    }

    /// Returns `true` once the room is gone.
    async fn handle(
        &mut self,
        message: ServerMessage,
        driver: &mut impl Driver,
    ) -> anyhow::Result<bool> {
        let mut finished = false;
        for event in self.session.handle(message, now_ms()) {
            match &event {
                SessionEvent::Joined { role, side, room } => {
                    log::info!("joined {room} as {role:?} on the {side} side");
                }
                SessionEvent::RoomFull => log::warn!("room is full"),
                SessionEvent::HostLeft => {
                    log::info!("host left");
                    finished = true;
                }
                SessionEvent::RoomExpired { reason } => {
                    log::info!("room expired ({reason})");
                    finished = true;
                }
                _ => {}
            }
            if let Some(reply) = driver.on_event(&self.session, &event) {
                self.send(&reply).await?;
            }
        }
        Ok(finished)
    }
}
