//! Server process entry point.

use clap::Parser;

use server::Config;

/// Command-line arguments for the arena server.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// UDP port to listen on.
    #[arg(long, default_value_t = shared::LISTEN_PORT)]
    port: u16,

    /// Bind only on IPv4, skipping the IPv6-first attempt.
    #[arg(long)]
    ipv4_only: bool,

    /// Override the simulation tick rate, in hertz. Changes every
    /// constant derived from `FPS` (shot cooldown, projectile lifetime,
    /// ...) consistently. Intended for local testing only.
    #[arg(long, default_value_t = shared::FPS)]
    tick_rate_hz: u32,
}

fn main() {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info (or debug) for detailed logging");
    }

    let args = Args::parse();
    let config = Config {
        port: args.port,
        ipv4_only: args.ipv4_only,
        tick_rate_hz: args.tick_rate_hz,
    };

    if let Err(e) = server::run(config) {
        log::error!("{e}");
        std::process::exit(1);
    }
}
