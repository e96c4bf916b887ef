use anyhow::Result;
use clap::Parser;

use rink::{ArenaBounds, GameConfig, generate_room_code};
use rink_client::{ClientConfig, ClientSession, NetworkClient, SweepBot, net::now_ms};

#[derive(Parser)]
#[command(name = "client")]
#[command(about = "Headless air-hockey client")]
struct Args {
    #[arg(short, long, default_value = "ws://127.0.0.1:3000/ws")]
    server: String,

    #[arg(short, long, help = "Room code to join; a new one is generated if omitted")]
    room: Option<String>,

    #[arg(long, default_value_t = 140.0, help = "Minimum render delay in ms")]
    buffer_ms: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let room = args
        .room
        .unwrap_or_else(|| generate_room_code(&mut rand::rng()));
    log::info!("room code {room}");

    let game = GameConfig::default();
    let config = ClientConfig {
        base_buffer_ms: args.buffer_ms,
        ..ClientConfig::default()
    };
    let bounds = ArenaBounds::from(&game);
    let mut bot = SweepBot::new(bounds.min_y, bounds.max_y);

    let session = ClientSession::new(&game, config, now_ms());
    let client = NetworkClient::connect(&args.server, session).await?;

    tokio::select! {
        result = client.run(&room, &mut bot) => result?,
        _ = tokio::signal::ctrl_c() => log::info!("client shutting down"),
    }
    Ok(())
}
