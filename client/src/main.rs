use clap::{Parser, ValueEnum};
use client::network::Client;
use log::info;
use rand::Rng;
use shared::ClientRequest;
use std::time::Duration;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Direction {
    Up,
    Down,
    Still,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:5000")]
    server: String,

    /// Display name, random if omitted
    #[arg(short, long)]
    name: Option<String>,

    /// Stay a spectator instead of asking for a player slot
    #[arg(long)]
    spectate: bool,

    /// Number of move requests to send
    #[arg(short, long, default_value = "60")]
    moves: u32,

    /// Direction of every move
    #[arg(short, long, value_enum, default_value = "up")]
    direction: Direction,

    /// Delay between move requests in milliseconds
    #[arg(short, long, default_value = "16")]
    interval_ms: u64,

    /// Seconds to wait for the handshake
    #[arg(short, long, default_value = "5")]
    timeout: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let name = args
        .name
        .unwrap_or_else(|| format!("player-{}", rand::thread_rng().gen_range(1000..10000)));

    let mut client = Client::new(&args.server, &name).await?;
    client.connect(Duration::from_secs(args.timeout)).await?;

    if !args.spectate {
        client.send_request(ClientRequest::JoinGame).await?;
        client.poll(Duration::from_millis(200)).await?;
        match client.game_state().player_slot {
            0 => info!("No free slot, spectating"),
            slot => info!("Playing in slot {}", slot),
        }
    }

    let (move_up, move_down) = match args.direction {
        Direction::Up => (true, false),
        Direction::Down => (false, true),
        Direction::Still => (false, false),
    };
    let interval = Duration::from_millis(args.interval_ms);

    for _ in 0..args.moves {
        client
            .send_request(ClientRequest::MovePosition { move_up, move_down })
            .await?;
        client.poll(interval).await?;
    }

    let state = client.game_state();
    info!("Own position: {:?}", state.own_position());
    for entry in &state.roster {
        info!("  {} in slot {}", entry.name, entry.player_slot);
    }
    if state.stale_dropped > 0 {
        info!("Dropped {} stale packets", state.stale_dropped);
    }

    client.disconnect().await
}
