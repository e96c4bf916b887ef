pub mod channel;
pub mod config;
pub mod events;
pub mod registry;
pub mod room;
pub mod transport;

use tokio::net::TcpListener;
use tokio::sync::mpsc;

pub use channel::{Channel, QueuedChannel, SharedChannel};
pub use config::ServerConfig;
pub use events::{ConnId, DisconnectReason, InboundEvent, RoomEvent};
pub use registry::{JoinError, SessionRegistry};

const INBOUND_CAPACITY: usize = 1024;

/// Serves `/ws` and `/health` on `listener` until the task is dropped.
pub async fn run_server(listener: TcpListener, config: ServerConfig) -> anyhow::Result<()> {
    log::info!("listening on {}", listener.local_addr()?);

    let (tx, rx) = mpsc::channel(INBOUND_CAPACITY);
    let accept = tokio::spawn(transport::run_listener(listener, tx, config.outbound_capacity));

    run_session_loop(rx, config).await;
    accept.abort();
    Ok(())
}

/// Feeds transport events and room expiries into one [`SessionRegistry`].
/// Returns once every inbound sender is gone.
pub async fn run_session_loop(mut inbound: mpsc::Receiver<InboundEvent>, config: ServerConfig) {
    let (mut registry, mut room_events) = SessionRegistry::new(config);

    loop {
        tokio::select! {
            event = inbound.recv() => {
                let Some(event) = event else {
                    break;
                };
                handle_inbound(&mut registry, event);
            }
            Some(event) = room_events.recv() => registry.handle_room_event(event),
        }
    }

    log::info!(
        "session loop stopping with {} rooms and {} connections",
        registry.room_count(),
        registry.connection_count()
    );
    registry.shutdown();
}

fn handle_inbound(registry: &mut SessionRegistry, event: InboundEvent) {
    match event {
        InboundEvent::Connected {
            conn_id,
            peer,
            channel,
        } => {
            registry.connect(conn_id, channel);
            log::debug!(
                "conn {conn_id} registered from {peer} ({} open)",
                registry.connection_count()
            );
        }
        InboundEvent::Message { conn_id, message } => {
            log::trace!("conn {conn_id}: {}", message.kind());
            registry.dispatch(conn_id, message);
        }
        InboundEvent::Disconnected { conn_id, .. } => registry.disconnect(conn_id),
    }
}
