use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use rink::ClientMessage;
use rink::net::{HEALTH_PATH, WS_PATH};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::{WebSocketStream, accept_hdr_async};

use crate::channel::{Channel, Outgoing, OutgoingQueue, QueuedChannel};
use crate::events::{ConnId, DisconnectReason, InboundEvent, next_conn_id};

const HEALTH_RESPONSE: &[u8] =
    b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok";
const MAX_REQUEST_HEAD: usize = 4096;

type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;

/// Accepts connections until the session loop goes away. Every decoded
/// message and connection event is sent to `tx`.
pub async fn run_listener(listener: TcpListener, tx: mpsc::Sender<InboundEvent>, capacity: usize) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(err) => {
                log::warn!("accept failed: {err}");
                continue;
            }
        };
        if tx.is_closed() {
            break;
        }

        let conn_id = next_conn_id();
        let tx = tx.clone();
        tokio::spawn(async move {
            serve_connection(stream, peer, conn_id, tx, capacity).await;
        });
    }
}

/// Serves one TCP connection: a `/health` probe or a WebSocket session on
/// `/ws`.
pub async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    conn_id: ConnId,
    tx: mpsc::Sender<InboundEvent>,
    capacity: usize,
) {
    let _ = stream.set_nodelay(true);

    let mut peek_buf = [0u8; 16];
    let n = match stream.peek(&mut peek_buf).await {
        Ok(n) => n,
        Err(err) => {
            log::warn!("failed to peek {peer}: {err}");
            return;
        }
    };
    if is_health_probe(&peek_buf[..n]) {
        answer_health(stream).await;
        return;
    }

    let ws = match accept_hdr_async(stream, check_path).await {
        Ok(ws) => ws,
        Err(err) => {
            log::warn!("websocket handshake with {peer} failed: {err}");
            return;
        }
    };
    let (sink, mut read) = ws.split();

    let (channel, queue) = QueuedChannel::new(capacity);
    let writer = tokio::spawn(write_loop(sink, queue));
    let channel = Arc::new(channel);

    let connected = InboundEvent::Connected {
        conn_id,
        peer,
        channel: channel.clone(),
    };
    if tx.send(connected).await.is_err() {
        return;
    }
    log::info!("conn {conn_id} connected from {peer}");

    let reason = loop {
        match read.next().await {
            Some(Ok(Message::Text(text))) => match ClientMessage::parse(text.as_str()) {
                Ok(message) => {
                    if tx.send(InboundEvent::Message { conn_id, message }).await.is_err() {
                        break DisconnectReason::Graceful;
                    }
                }
                Err(err) => log::debug!("conn {conn_id}: dropping frame: {err}"),
            },
            Some(Ok(Message::Close(_))) | None => break DisconnectReason::Graceful,
            Some(Ok(Message::Binary(_))) => {
                log::debug!("conn {conn_id}: dropping binary frame");
            }
            Some(Ok(_)) => {}
            Some(Err(err)) => {
                log::debug!("conn {conn_id}: read error: {err}");
                break DisconnectReason::Error;
            }
        }
    };

    channel.close();
    let _ = tx.send(InboundEvent::Disconnected { conn_id, reason }).await;
    let _ = writer.await;
    log::info!("conn {conn_id} {}", reason.as_str());
}

async fn write_loop(mut sink: WsSink, mut queue: OutgoingQueue) {
    loop {
        let outgoing = tokio::select! {
            outgoing = queue.rx.recv() => outgoing,
            _ = queue.shutdown.notified() => Some(Outgoing::Close),
        };
        match outgoing {
            Some(Outgoing::Message(message)) => {
                let text = match message.encode() {
                    Ok(text) => text,
                    Err(err) => {
                        log::warn!("failed to encode {}: {err}", message.kind());
                        continue;
                    }
                };
                if sink.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            Some(Outgoing::Close) | None => {
                let _ = sink.send(Message::Close(None)).await;
                break;
            }
        }
    }
    let _ = sink.close().await;
}

fn check_path(request: &Request, response: Response) -> Result<Response, ErrorResponse> {
    if request.uri().path() == WS_PATH {
        return Ok(response);
    }
    let mut error = ErrorResponse::new(Some("not found".to_string()));
    *error.status_mut() = StatusCode::NOT_FOUND;
    Err(error)
}

fn is_health_probe(head: &[u8]) -> bool {
    let Some(rest) = head
        .strip_prefix(b"GET ")
        .and_then(|rest| rest.strip_prefix(HEALTH_PATH.as_bytes()))
    else {
        return false;
    };
    matches!(rest.first(), Some(b' ' | b'?'))
}

async fn answer_health(mut stream: TcpStream) {
    // consume the request head before replying
    let mut head = Vec::with_capacity(256);
    let mut buf = [0u8; 512];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") && head.len() < MAX_REQUEST_HEAD {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => head.extend_from_slice(&buf[..n]),
        }
    }
    let _ = stream.write_all(HEALTH_RESPONSE).await;
    let _ = stream.flush().await;
    let _ = stream.shutdown().await;
}
