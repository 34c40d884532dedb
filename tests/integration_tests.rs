//! End-to-end scenario tests.
//!
//! Most of these drive `World` and `SessionTable` directly, tick by tick,
//! exactly as `server::run`'s main loop does — this exercises the same
//! cross-module sequencing (ingest, then tick, then snapshot) without
//! needing a real socket. A smaller set at the bottom binds a loopback
//! `Socket` and round-trips real datagrams through the wire codec, since
//! that's the one thing driving `World`/`SessionTable` in-process can't
//! cover.

use std::net::UdpSocket;
use std::time::Duration;

use server::net::Socket;
use server::session::SessionTable;
use server::world::World;
use shared::protocol::{
    decode_simulation_tick, encode_player_input, Accelerate, GameSettings, PlayerInput,
    PlayerInputPacket, Rotate, SimulationTickPacket,
};
use shared::{LEVEL_SIZE, PLAYER_RADIUS, PLAYER_RESPAWN_DELAY, PLAYER_TIMEOUT, SHOT_COOLDOWN};

fn no_input() -> PlayerInput {
    PlayerInput {
        accelerate: Accelerate::None,
        rotate: Rotate::None,
        shoot: false,
    }
}

fn addr(port: u16) -> std::net::SocketAddr {
    format!("127.0.0.1:{port}").parse().unwrap()
}

/// Runs one iteration of the same ingest/tick sequencing `server::run` does,
/// without the socket or the sleep.
fn step(
    world: &mut World,
    sessions: &mut SessionTable,
    peer: std::net::SocketAddr,
    seq: u64,
    input: PlayerInput,
) {
    let (player_id, accepted) = sessions.ingest(peer, seq, input, || world.register_peer());
    if accepted {
        world.apply_input(player_id, input);
    }
    world.tick();
}

/// S1 — implicit join: the first datagram from an unseen peer creates a
/// player at id 0, spawned near the level center, alive, heading π/2, at
/// rest.
#[test]
fn implicit_join_spawns_first_player_near_center() {
    let mut world = World::new();
    let mut sessions = SessionTable::new();

    step(&mut world, &mut sessions, addr(1), 1, no_input());

    assert_eq!(sessions.len(), 1);
    let session = sessions.find_by_peer(addr(1)).unwrap();
    assert_eq!(session.player_id, 0);

    let player = world.players.iter().find(|p| p.id == 0).unwrap();
    assert!(player.alive);
    assert_eq!(player.heading, std::f32::consts::FRAC_PI_2);
    assert!((player.position.x - 300.0).abs() <= 20.0);
    assert!((player.position.y - 300.0).abs() <= 20.0);
}

/// S2 — stale input drop: sequence 5 then 3 from the same peer leaves
/// `last_seq` at 5.
#[test]
fn stale_input_does_not_move_session_sequence_backwards() {
    let mut world = World::new();
    let mut sessions = SessionTable::new();

    step(&mut world, &mut sessions, addr(1), 5, no_input());
    step(&mut world, &mut sessions, addr(1), 3, no_input());

    assert_eq!(sessions.find_by_peer(addr(1)).unwrap().last_seq, 5);
}

/// S3 — shot cooldown: holding fire produces exactly one projectile every
/// `SHOT_COOLDOWN` ticks, never closer together.
#[test]
fn held_fire_produces_one_projectile_per_cooldown_window() {
    let mut world = World::new();
    let mut sessions = SessionTable::new();
    let fire = PlayerInput {
        accelerate: Accelerate::None,
        rotate: Rotate::None,
        shoot: true,
    };

    let mut shot_ticks = Vec::new();
    let mut last_count = 0;
    for seq in 1..=(SHOT_COOLDOWN as u64 * 3) {
        step(&mut world, &mut sessions, addr(1), seq, fire);
        if world.projectiles.len() > last_count {
            shot_ticks.push(world.curr_tick);
        }
        last_count = world.projectiles.len();
    }

    assert!(shot_ticks.len() >= 2);
    for pair in shot_ticks.windows(2) {
        assert!(pair[1] - pair[0] >= SHOT_COOLDOWN as u64);
    }
}

/// S4 — self-kill scoring: a stationary player near the left edge fires
/// backwards through the wrap; the shot re-enters from the right and, since
/// `PROJECTILE_LIFETIME` covers most of the level width, catches up to its
/// own shooter before expiring. The shooter's score drops by one and an
/// explosion appears at the death position.
#[test]
fn projectile_that_wraps_back_into_its_shooter_scores_a_self_kill() {
    let mut world = World::new();
    let id = world.register_peer();
    {
        let p = world.players.iter_mut().find(|p| p.id == id).unwrap();
        p.position = server::math::Vec2::new(1.0, 300.0);
        p.heading = std::f32::consts::PI;
    }

    // Warm up past the initial shot cooldown without moving or firing.
    for _ in 0..(SHOT_COOLDOWN as u64 - 1) {
        world.apply_input(id, no_input());
        world.tick();
    }

    world.apply_input(
        id,
        PlayerInput {
            accelerate: Accelerate::None,
            rotate: Rotate::None,
            shoot: true,
        },
    );
    world.tick();
    assert_eq!(world.projectiles.len(), 1);
    assert_eq!(world.projectiles[0].shooter, id);
    world.apply_input(id, no_input());

    let mut died = false;
    for _ in 0..60 {
        world.tick();
        if !world.players.iter().find(|p| p.id == id).unwrap().alive {
            died = true;
            break;
        }
    }

    assert!(died, "self-fired shot never wrapped back into the shooter");
    let player = world.players.iter().find(|p| p.id == id).unwrap();
    assert_eq!(player.score, -1);
    assert!(world
        .explosions
        .iter()
        .any(|e| e.position.distance(player.position) < 1.0));
}

/// S5 — timeout disconnect: a session silent for longer than
/// `PLAYER_TIMEOUT` is swept before the next tick and stops appearing in
/// the session table (so it receives no further snapshots).
#[test]
fn silent_session_is_swept_after_timeout() {
    let mut world = World::new();
    let mut sessions = SessionTable::new();

    step(&mut world, &mut sessions, addr(1), 1, no_input());
    assert_eq!(sessions.len(), 1);

    let later = server::clock::Clock::now() + Duration::from_secs_f64(PLAYER_TIMEOUT + 1.0);
    let expired = sessions.sweep_timeouts(later, PLAYER_TIMEOUT);
    assert_eq!(expired.len(), 1);
    let (_, player_id) = expired[0];
    world.remove(player_id);

    assert!(sessions.is_empty());
    assert!(world.players.is_empty());
}

/// S6 — two-body collision: two players that end up within
/// `2 * PLAYER_RADIUS` of each other both die the same tick, each leaving an
/// explosion, and both respawn after `PLAYER_RESPAWN_DELAY` ticks.
#[test]
fn colliding_players_both_die_and_both_respawn() {
    let mut world = World::new();
    let mut sessions = SessionTable::new();

    step(&mut world, &mut sessions, addr(1), 1, no_input());
    step(&mut world, &mut sessions, addr(2), 1, no_input());

    let a = sessions.find_by_peer(addr(1)).unwrap().player_id;
    let b = sessions.find_by_peer(addr(2)).unwrap().player_id;
    {
        let pa = world.players.iter_mut().find(|p| p.id == a).unwrap();
        pa.position = server::math::Vec2::new(400.0, 300.0);
    }
    {
        let pb = world.players.iter_mut().find(|p| p.id == b).unwrap();
        pb.position = server::math::Vec2::new(400.0 + PLAYER_RADIUS, 300.0);
    }

    world.tick();

    assert!(!world.players.iter().find(|p| p.id == a).unwrap().alive);
    assert!(!world.players.iter().find(|p| p.id == b).unwrap().alive);
    assert_eq!(world.explosions.len(), 2);

    for _ in 0..PLAYER_RESPAWN_DELAY {
        world.tick();
    }
    assert!(world.players.iter().find(|p| p.id == a).unwrap().alive);
    assert!(world.players.iter().find(|p| p.id == b).unwrap().alive);
}

/// A full loopback round-trip: a real `PLAYER_INPUT` datagram sent to a
/// bound `Socket`, decoded, applied, ticked, and the resulting
/// `SIMULATION_TICK` snapshot sent back and decoded by a plain `UdpSocket`.
#[test]
fn loopback_socket_round_trips_input_and_snapshot() {
    let server_socket = Socket::bind(0, true).unwrap();
    let client = UdpSocket::bind("127.0.0.1:0").unwrap();
    client.connect(server_socket.local_addr()).unwrap();

    let input_packet = PlayerInputPacket {
        sequence_num: 1,
        input: PlayerInput {
            accelerate: Accelerate::Forward,
            rotate: Rotate::None,
            shoot: false,
        },
    };
    let mut send_buf = Vec::new();
    encode_player_input(&mut send_buf, &input_packet);
    client.send(&send_buf).unwrap();

    std::thread::sleep(Duration::from_millis(20));
    let mut recv_buf = [0u8; 2048];
    let (len, peer) = server_socket.recv_nonblocking(&mut recv_buf).unwrap().unwrap();
    let decoded = shared::protocol::decode_player_input(&recv_buf[..len]).unwrap();
    assert_eq!(decoded.packet, input_packet);

    let mut world = World::new();
    let mut sessions = SessionTable::new();
    let (player_id, accepted) = sessions.ingest(
        peer,
        decoded.packet.sequence_num,
        decoded.packet.input,
        || world.register_peer(),
    );
    assert!(accepted);
    world.apply_input(player_id, decoded.packet.input);
    world.tick();

    let snapshot = SimulationTickPacket {
        sequence_num: world.curr_tick,
        ack_input_sequence_num: sessions.find_by_peer(peer).unwrap().last_seq,
        game_settings: GameSettings {
            player_timeout: PLAYER_TIMEOUT as f32,
            level_size: LEVEL_SIZE,
            fps: shared::FPS as u16,
            projectile_lifetime: shared::PROJECTILE_LIFETIME as u16,
        },
        your_player_id: player_id,
        players: world.wire_players(),
        explosions: world.wire_explosions(),
        projectiles: world.wire_projectiles(),
    };
    let mut out_buf = Vec::new();
    shared::protocol::encode_simulation_tick(&mut out_buf, &snapshot);
    server_socket.send(peer, &out_buf).unwrap();

    std::thread::sleep(Duration::from_millis(20));
    let mut client_buf = [0u8; 2048];
    let len = client.recv(&mut client_buf).unwrap();
    let decoded_snapshot = decode_simulation_tick(&client_buf[..len]).unwrap();
    assert_eq!(decoded_snapshot.your_player_id, player_id);
    assert_eq!(decoded_snapshot.players.len(), 1);
    assert!(decoded_snapshot.players[0].alive);
}
