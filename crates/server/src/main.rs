use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;

use rink::GameConfig;
use rink_server::{ServerConfig, run_server};

#[derive(Parser)]
#[command(name = "rink-server")]
#[command(about = "Authoritative air-hockey room server")]
struct Args {
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    #[arg(short, long, default_value_t = rink::DEFAULT_PORT)]
    port: u16,

    #[arg(short, long, help = "Simulation rate while a match runs")]
    tick_rate: Option<u32>,

    #[arg(long, default_value_t = 10, help = "Simulation rate while idle")]
    idle_tick_rate: u32,

    #[arg(long, default_value_t = 30)]
    snapshot_rate: u32,

    #[arg(long, default_value_t = 5)]
    idle_snapshot_rate: u32,

    #[arg(long, default_value_t = 60, help = "Seconds an empty room is kept")]
    empty_ttl: u64,

    #[arg(long, default_value_t = 900, help = "Seconds an idle room is kept")]
    inactive_ttl: u64,

    #[arg(long, default_value_t = 256, help = "Outbound queue length per connection")]
    outbound_capacity: usize,

    #[arg(long, help = "JSON file with arena and physics constants")]
    game_config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut game = match &args.game_config {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("loading game config {}", path.display()))?,
        None => GameConfig::default(),
    };
    if let Some(tick_rate) = args.tick_rate {
        game.tick_rate = tick_rate;
    }

    let config = ServerConfig {
        idle_tick_rate: args.idle_tick_rate,
        snapshot_rate: args.snapshot_rate,
        idle_snapshot_rate: args.idle_snapshot_rate,
        empty_ttl: Duration::from_secs(args.empty_ttl),
        inactive_ttl: Duration::from_secs(args.inactive_ttl),
        outbound_capacity: args.outbound_capacity,
        game,
    };

    let bind_addr = format!("{}:{}", args.bind, args.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;

    tokio::select! {
        result = run_server(listener, config) => result?,
        _ = tokio::signal::ctrl_c() => log::info!("server shutting down"),
    }

    Ok(())
}
