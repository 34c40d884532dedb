//! # Arena Server Library
//!
//! The authoritative server for a toroidal top-down shooter: a single
//! process, one UDP socket, one fixed-timestep loop. There is no network
//! thread, no game thread, and no channel between them — `run` drains the
//! socket, steps the simulation, and broadcasts a snapshot, all on the one
//! thread that called it.
//!
//! ## Module Organization
//!
//! - `clock` — monotonic time and precise sleep.
//! - `net` — the non-blocking UDP endpoint.
//! - `world` — players, projectiles, explosions, and the per-tick rules.
//! - `session` — peer-address-to-player-identity bookkeeping and timeouts.
//! - `color` — the distinct-color allocator for joining players.
//! - `math` — vector/angle arithmetic for the toroidal simulation.
//! - `error` — the fatal-transport error type `main` can exit nonzero on.
//!
//! ## Why no concurrency
//!
//! Earlier drafts of this kind of server reach for a multi-task async
//! runtime so network I/O and simulation can overlap. This server doesn't:
//! its simulation is cheap enough per tick that there's nothing to overlap,
//! and a single cooperative loop makes the ordering guarantees in `run`
//! (inputs observed this tick are fully applied before that tick's
//! snapshot is computed) trivially true rather than something to prove
//! about a scheduler.

pub mod clock;
pub mod color;
pub mod error;
pub mod math;
pub mod net;
pub mod session;
pub mod world;

use std::net::SocketAddr;

use shared::protocol::{
    decode_player_input, encode_simulation_tick, GameSettings, IngressRejection,
    SimulationTickPacket,
};
use shared::{FPS, LEVEL_SIZE, LISTEN_PORT, PLAYER_TIMEOUT, PROJECTILE_LIFETIME};

use clock::Clock;
use error::ServerError;
use net::{peer_to_string, Socket};
use session::SessionTable;
use world::World;

/// The knobs this binary exposes over its CLI. Everything else the
/// original hardcoded as a `const` stays a `shared` constant.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub ipv4_only: bool,
    pub tick_rate_hz: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: LISTEN_PORT,
            ipv4_only: false,
            tick_rate_hz: FPS,
        }
    }
}

/// Largest datagram this server will read. Generously above anything a
/// well-formed `PlayerInputPacket` needs; oversize or garbage datagrams are
/// simply truncated by `recv_from` and then fail codec validation.
const RECV_BUFFER_LEN: usize = 2048;

/// Binds the socket and runs the main loop until the process is killed.
/// Returns only on a fatal transport error (bind/socket/send failure);
/// there is no graceful shutdown path (out of scope per SPEC_FULL.md §5).
pub fn run(config: Config) -> Result<(), ServerError> {
    let socket = Socket::bind(config.port, config.ipv4_only)?;
    log::info!(
        "listening on {} (udp, ipv4_only={})",
        socket.local_addr(),
        config.ipv4_only
    );

    let mut world = World::new();
    let mut sessions = SessionTable::new();

    let tick_duration = 1.0 / config.tick_rate_hz as f64;
    let mut recv_buf = [0u8; RECV_BUFFER_LEN];
    let mut send_buf = Vec::new();

    let mut last = Clock::now();
    let mut sleep_accum = 0.0f64;

    loop {
        drain_socket(&socket, &mut recv_buf, &mut world, &mut sessions);

        let now = Clock::now();
        for (peer, player_id) in sessions.sweep_timeouts(now, PLAYER_TIMEOUT) {
            log::info!("player disconnected: {}", peer_to_string(peer));
            world.remove(player_id);
        }

        world.tick();

        broadcast_snapshot(&socket, &world, &sessions, &mut send_buf, config.tick_rate_hz)?;

        let now = Clock::now();
        let dt = Clock::elapsed(last, now);
        last = now;
        sleep_accum += tick_duration - dt;
        if sleep_accum > 0.0 {
            Clock::sleep(sleep_accum);
        }
    }
}

/// Drains every pending datagram, dispatching each one into the session
/// table (which creates sessions on first sight and drops stale input) and
/// from there into the world. Never blocks: stops as soon as `recv` would.
fn drain_socket(socket: &Socket, buf: &mut [u8], world: &mut World, sessions: &mut SessionTable) {
    loop {
        match socket.recv_nonblocking(buf) {
            Ok(Some((len, peer))) => handle_datagram(&buf[..len], peer, world, sessions),
            Ok(None) => break,
            Err(e) => {
                log::warn!("recv error from socket: {e}");
                break;
            }
        }
    }
}

fn handle_datagram(datagram: &[u8], peer: SocketAddr, world: &mut World, sessions: &mut SessionTable) {
    let decoded = match decode_player_input(datagram) {
        Ok(decoded) => decoded,
        Err(IngressRejection::TooShortForHeader) => {
            log::warn!("dropping packet from {}: shorter than header", peer_to_string(peer));
            return;
        }
        Err(IngressRejection::ProtocolIdMismatch) => {
            log::warn!("dropping packet from {}: wrong protocol id", peer_to_string(peer));
            return;
        }
        Err(IngressRejection::VersionMajorMismatch) => {
            log::warn!(
                "dropping packet from {}: incompatible protocol major version",
                peer_to_string(peer)
            );
            return;
        }
        Err(IngressRejection::UnexpectedType(t)) => {
            log::warn!("dropping packet from {}: unexpected type {t}", peer_to_string(peer));
            return;
        }
        Err(IngressRejection::TooShortForPayload) => {
            log::warn!(
                "dropping packet from {}: payload shorter than expected",
                peer_to_string(peer)
            );
            return;
        }
    };

    if decoded.minor_version_mismatch {
        log::warn!("peer {} uses a different protocol minor version", peer_to_string(peer));
    }

    let (player_id, accepted) = sessions.ingest(
        peer,
        decoded.packet.sequence_num,
        decoded.packet.input,
        || {
            let id = world.register_peer();
            log::info!("player connected: {} (id {})", peer_to_string(peer), id);
            id
        },
    );

    if accepted {
        world.apply_input(player_id, decoded.packet.input);
    }
}

fn broadcast_snapshot(
    socket: &Socket,
    world: &World,
    sessions: &SessionTable,
    send_buf: &mut Vec<u8>,
    tick_rate_hz: u32,
) -> Result<(), ServerError> {
    let players = world.wire_players();
    let explosions = world.wire_explosions();
    let projectiles = world.wire_projectiles();

    for session in sessions.iter() {
        let packet = SimulationTickPacket {
            sequence_num: world.curr_tick,
            ack_input_sequence_num: session.last_seq,
            game_settings: GameSettings {
                player_timeout: PLAYER_TIMEOUT as f32,
                level_size: LEVEL_SIZE,
                fps: tick_rate_hz as u16,
                projectile_lifetime: PROJECTILE_LIFETIME as u16,
            },
            your_player_id: session.player_id,
            players: players.clone(),
            explosions: explosions.clone(),
            projectiles: projectiles.clone(),
        };
        encode_simulation_tick(send_buf, &packet);
        socket.send(session.peer, send_buf)?;
    }
    Ok(())
}
