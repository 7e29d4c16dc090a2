use clap::Parser;
use client::app::{App, AppConfig};
use client::canvas::Surface;
use client::input::InputManager;
use client::layout::{WINDOW_HEIGHT, WINDOW_WIDTH};
use client::network::ChannelConfig;
use client::rendering::Renderer;
use log::info;
use macroquad::prelude::*;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Coordinator address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Prefill the display name on the join form
    #[arg(short = 'n', long, default_value = "")]
    name: String,

    /// Prefill the room code on the join form
    #[arg(short = 'r', long, default_value = "")]
    room: String,

    /// Simulate network latency in milliseconds
    #[arg(short = 'l', long, default_value = "0")]
    fake_ping: u64,
}

fn window_conf() -> Conf {
    Conf {
        window_title: "Draw n Guess".to_string(),
        window_width: WINDOW_WIDTH,
        window_height: WINDOW_HEIGHT,
        window_resizable: false,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    if let Err(e) = run(args).await {
        eprintln!("Client error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting client...");
    info!("Connecting to: {}", args.server);
    if args.fake_ping > 0 {
        info!("Simulating {}ms latency", args.fake_ping);
    }
    info!("Controls: drag to draw, type and Enter to guess, R to restart after a game");

    // macroquad owns the main thread, so the network runs on its own runtime.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?;

    let mut app = App::new(
        runtime,
        AppConfig {
            server: args.server,
            channel: ChannelConfig {
                fake_ping_ms: args.fake_ping,
            },
            default_name: args.name,
            default_room: args.room,
        },
    );
    let mut input = InputManager::new();
    let mut renderer = Renderer::new(&Surface::default());

    loop {
        if is_key_pressed(KeyCode::Escape) {
            break;
        }

        let now = Instant::now();
        app.frame(input.update(), now);
        renderer.render(&mut app, now);

        next_frame().await;
    }

    info!("Shutting down");
    app.shutdown();
    Ok(())
}
