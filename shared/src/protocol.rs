//! Binary wire protocol between the arena server and its clients.
//!
//! Everything here is packed, big-endian, and hand-encoded: no `serde`, no
//! `bincode`. Two things make a generic derive serializer the wrong tool —
//! the egress snapshot embeds **self-relative array descriptors**
//! (`{n_elems, begin}` where `begin` is a signed byte offset measured from
//! the address of the `begin` field itself to the first element), and every
//! structure must be exactly its field concatenation with no padding. Both
//! are ordinary to write by hand and essentially impossible to get a derive
//! macro to produce.

/// Magic value identifying this protocol on the wire.
pub const PROTOCOL_ID: u32 = 0xEC3B5FA9;

/// Protocol version. Minor mismatches are accepted (and logged); major
/// mismatches are a hard rejection.
pub const PROTOCOL_VERSION_MAJOR: u16 = 7;
pub const PROTOCOL_VERSION_MINOR: u16 = 0;

/// Size in bytes of `PacketHeader` on the wire.
pub const HEADER_LEN: usize = 4 + 2 + 2 + 1;

/// Size in bytes of a `PlayerInputPacket` payload (after the header).
pub const PLAYER_INPUT_PAYLOAD_LEN: usize = 8 + 1 + 1 + 1;

/// Size in bytes of the `SimulationTickPacket` prefix (after the header,
/// before the first element row).
pub const SIMULATION_TICK_PREFIX_LEN: usize = 8 + 8 + 4 + 4 + 4 + 2 + 2 + 2 + 8 + 8 + 8;

/// Size in bytes of one `SPlayer` row.
pub const PLAYER_ROW_LEN: usize = 2 + 1 + 4 + 4 + 4 + 4 + 3;

/// Size in bytes of one `SExplosion` row.
pub const EXPLOSION_ROW_LEN: usize = 4 + 4 + 2;

/// Size in bytes of one `SProjectile` row.
pub const PROJECTILE_ROW_LEN: usize = 4 + 4 + 4 + 2;

/// Byte that identifies a packet's purpose, immediately following the
/// header's protocol id and version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    SimulationTick,
    PlayerInput,
}

impl PacketType {
    fn from_wire(byte: i8) -> Option<Self> {
        match byte {
            0 => Some(PacketType::SimulationTick),
            1 => Some(PacketType::PlayerInput),
            _ => None,
        }
    }

    fn to_wire(self) -> i8 {
        match self {
            PacketType::SimulationTick => 0,
            PacketType::PlayerInput => 1,
        }
    }
}

/// Why an ingress datagram was rejected. None of these ever reach session
/// or world state; the caller logs and drops the packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngressRejection {
    TooShortForHeader,
    ProtocolIdMismatch,
    VersionMajorMismatch,
    UnexpectedType(i8),
    TooShortForPayload,
}

/// A successfully parsed `PLAYER_INPUT` packet, plus whether its minor
/// protocol version differed from ours (accepted regardless, but worth a
/// warning at the call site).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedPlayerInput {
    pub packet: PlayerInputPacket,
    pub minor_version_mismatch: bool,
}

/// Rotation input for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotate {
    None,
    Left,
    Right,
}

/// Thrust input for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accelerate {
    None,
    Forward,
    Reverse,
}

/// One player's requested action for the tick it is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerInput {
    pub accelerate: Accelerate,
    pub rotate: Rotate,
    pub shoot: bool,
}

impl Default for PlayerInput {
    fn default() -> Self {
        PlayerInput {
            accelerate: Accelerate::None,
            rotate: Rotate::None,
            shoot: false,
        }
    }
}

/// Client-to-server packet: one input sample tagged with its sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerInputPacket {
    pub sequence_num: u64,
    pub input: PlayerInput,
}

/// Echoed simulation parameters, sent every tick so a client never has to
/// assume them out of band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameSettings {
    pub player_timeout: f32,
    pub level_size: (i32, i32),
    pub fps: u16,
    pub projectile_lifetime: u16,
}

/// One row of the `players` array in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WirePlayer {
    pub id: u16,
    pub alive: bool,
    pub position: (f32, f32),
    pub heading: f32,
    pub score: u32,
    pub color: (u8, u8, u8),
}

/// One row of the `explosions` array in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WireExplosion {
    pub position: (f32, f32),
    pub ticks_since_creation: u16,
}

/// One row of the `projectiles` array in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WireProjectile {
    pub position: (f32, f32),
    pub heading: f32,
    pub ticks_since_creation: u16,
}

/// Server-to-client packet: the full visible world state for one recipient
/// at one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationTickPacket {
    pub sequence_num: u64,
    pub ack_input_sequence_num: u64,
    pub game_settings: GameSettings,
    pub your_player_id: u16,
    pub players: Vec<WirePlayer>,
    pub explosions: Vec<WireExplosion>,
    pub projectiles: Vec<WireProjectile>,
}

fn write_header(buf: &mut Vec<u8>, packet_type: PacketType) {
    buf.extend_from_slice(&PROTOCOL_ID.to_be_bytes());
    buf.extend_from_slice(&PROTOCOL_VERSION_MAJOR.to_be_bytes());
    buf.extend_from_slice(&PROTOCOL_VERSION_MINOR.to_be_bytes());
    buf.push(packet_type.to_wire() as u8);
}

/// Validates and strips the fixed header. Returns the packet type and
/// whether the minor version differed (accepted, but worth a warning).
fn read_header(datagram: &[u8]) -> Result<(PacketType, bool), IngressRejection> {
    if datagram.len() < HEADER_LEN {
        return Err(IngressRejection::TooShortForHeader);
    }
    let protocol_id = u32::from_be_bytes(datagram[0..4].try_into().unwrap());
    if protocol_id != PROTOCOL_ID {
        return Err(IngressRejection::ProtocolIdMismatch);
    }
    let major = u16::from_be_bytes(datagram[4..6].try_into().unwrap());
    let minor = u16::from_be_bytes(datagram[6..8].try_into().unwrap());
    if major != PROTOCOL_VERSION_MAJOR {
        return Err(IngressRejection::VersionMajorMismatch);
    }
    let type_byte = datagram[8] as i8;
    let packet_type =
        PacketType::from_wire(type_byte).ok_or(IngressRejection::UnexpectedType(type_byte))?;
    Ok((packet_type, minor != PROTOCOL_VERSION_MINOR))
}

/// Encodes a `PLAYER_INPUT` packet. Used by tests and any tool speaking the
/// protocol from the client side; the server itself only decodes this shape.
pub fn encode_player_input(buf: &mut Vec<u8>, packet: &PlayerInputPacket) {
    buf.clear();
    write_header(buf, PacketType::PlayerInput);
    buf.extend_from_slice(&packet.sequence_num.to_be_bytes());
    buf.push(match packet.input.accelerate {
        Accelerate::None => 0,
        Accelerate::Forward => 1,
        Accelerate::Reverse => 2,
    });
    buf.push(match packet.input.rotate {
        Rotate::None => 0,
        Rotate::Left => 1,
        Rotate::Right => 2,
    });
    buf.push(packet.input.shoot as u8);
}

/// Validates and decodes a `PLAYER_INPUT` packet following the ingress
/// order from the protocol: length, protocol id, major version, packet
/// type, then payload length.
pub fn decode_player_input(datagram: &[u8]) -> Result<DecodedPlayerInput, IngressRejection> {
    let (packet_type, minor_version_mismatch) = read_header(datagram)?;
    if packet_type != PacketType::PlayerInput {
        return Err(IngressRejection::UnexpectedType(packet_type.to_wire()));
    }
    if datagram.len() < HEADER_LEN + PLAYER_INPUT_PAYLOAD_LEN {
        return Err(IngressRejection::TooShortForPayload);
    }
    let body = &datagram[HEADER_LEN..];
    let sequence_num = u64::from_be_bytes(body[0..8].try_into().unwrap());
    let accelerate = match body[8] as i8 {
        1 => Accelerate::Forward,
        2 => Accelerate::Reverse,
        _ => Accelerate::None,
    };
    let rotate = match body[9] as i8 {
        1 => Rotate::Left,
        2 => Rotate::Right,
        _ => Rotate::None,
    };
    let shoot = body[10] != 0;
    Ok(DecodedPlayerInput {
        packet: PlayerInputPacket {
            sequence_num,
            input: PlayerInput {
                accelerate,
                rotate,
                shoot,
            },
        },
        minor_version_mismatch,
    })
}

/// Encodes a full `SIMULATION_TICK` snapshot into `buf`, reusing its
/// existing allocation (`buf` is cleared, not replaced, so the caller can
/// reuse one growable buffer across ticks per the high-water-mark buffer
/// policy).
pub fn encode_simulation_tick(buf: &mut Vec<u8>, packet: &SimulationTickPacket) {
    buf.clear();
    write_header(buf, PacketType::SimulationTick);

    let n_players = packet.players.len() as u32;
    let n_explosions = packet.explosions.len() as u32;
    let n_projectiles = packet.projectiles.len() as u32;

    let players_begin_field_offset = HEADER_LEN + 34 + 4;
    let explosions_begin_field_offset = HEADER_LEN + 42 + 4;
    let projectiles_begin_field_offset = HEADER_LEN + 50 + 4;

    let players_first_elem_offset = HEADER_LEN + SIMULATION_TICK_PREFIX_LEN;
    let explosions_first_elem_offset =
        players_first_elem_offset + n_players as usize * PLAYER_ROW_LEN;
    let projectiles_first_elem_offset =
        explosions_first_elem_offset + n_explosions as usize * EXPLOSION_ROW_LEN;

    let players_begin = players_first_elem_offset as i64 - players_begin_field_offset as i64;
    let explosions_begin =
        explosions_first_elem_offset as i64 - explosions_begin_field_offset as i64;
    let projectiles_begin =
        projectiles_first_elem_offset as i64 - projectiles_begin_field_offset as i64;

    buf.extend_from_slice(&packet.sequence_num.to_be_bytes());
    buf.extend_from_slice(&packet.ack_input_sequence_num.to_be_bytes());
    buf.extend_from_slice(&packet.game_settings.player_timeout.to_be_bytes());
    buf.extend_from_slice(&packet.game_settings.level_size.0.to_be_bytes());
    buf.extend_from_slice(&packet.game_settings.level_size.1.to_be_bytes());
    buf.extend_from_slice(&packet.game_settings.fps.to_be_bytes());
    buf.extend_from_slice(&packet.game_settings.projectile_lifetime.to_be_bytes());
    buf.extend_from_slice(&packet.your_player_id.to_be_bytes());

    buf.extend_from_slice(&n_players.to_be_bytes());
    buf.extend_from_slice(&(players_begin as i32).to_be_bytes());
    buf.extend_from_slice(&n_explosions.to_be_bytes());
    buf.extend_from_slice(&(explosions_begin as i32).to_be_bytes());
    buf.extend_from_slice(&n_projectiles.to_be_bytes());
    buf.extend_from_slice(&(projectiles_begin as i32).to_be_bytes());

    debug_assert_eq!(buf.len(), HEADER_LEN + SIMULATION_TICK_PREFIX_LEN);

    for p in &packet.players {
        buf.extend_from_slice(&p.id.to_be_bytes());
        buf.push(p.alive as u8);
        buf.extend_from_slice(&p.position.0.to_be_bytes());
        buf.extend_from_slice(&p.position.1.to_be_bytes());
        buf.extend_from_slice(&p.heading.to_be_bytes());
        buf.extend_from_slice(&p.score.to_be_bytes());
        buf.push(p.color.0);
        buf.push(p.color.1);
        buf.push(p.color.2);
    }
    for e in &packet.explosions {
        buf.extend_from_slice(&e.position.0.to_be_bytes());
        buf.extend_from_slice(&e.position.1.to_be_bytes());
        buf.extend_from_slice(&e.ticks_since_creation.to_be_bytes());
    }
    for r in &packet.projectiles {
        buf.extend_from_slice(&r.position.0.to_be_bytes());
        buf.extend_from_slice(&r.position.1.to_be_bytes());
        buf.extend_from_slice(&r.heading.to_be_bytes());
        buf.extend_from_slice(&r.ticks_since_creation.to_be_bytes());
    }

    debug_assert_eq!(
        buf.len(),
        HEADER_LEN
            + SIMULATION_TICK_PREFIX_LEN
            + n_players as usize * PLAYER_ROW_LEN
            + n_explosions as usize * EXPLOSION_ROW_LEN
            + n_projectiles as usize * PROJECTILE_ROW_LEN
    );
}

/// Decodes a `SIMULATION_TICK` snapshot, following each array descriptor's
/// self-relative `begin` offset and bounds-checking the resulting element
/// range against the datagram before reading it. Used by the snapshot
/// round-trip and byte-order-independence tests; the server itself never
/// needs to decode its own egress format in production.
pub fn decode_simulation_tick(datagram: &[u8]) -> Result<SimulationTickPacket, IngressRejection> {
    let (packet_type, _minor_mismatch) = read_header(datagram)?;
    if packet_type != PacketType::SimulationTick {
        return Err(IngressRejection::UnexpectedType(packet_type.to_wire()));
    }
    if datagram.len() < HEADER_LEN + SIMULATION_TICK_PREFIX_LEN {
        return Err(IngressRejection::TooShortForPayload);
    }
    let body = &datagram[HEADER_LEN..];

    let sequence_num = u64::from_be_bytes(body[0..8].try_into().unwrap());
    let ack_input_sequence_num = u64::from_be_bytes(body[8..16].try_into().unwrap());
    let player_timeout = f32::from_be_bytes(body[16..20].try_into().unwrap());
    let level_size_x = i32::from_be_bytes(body[20..24].try_into().unwrap());
    let level_size_y = i32::from_be_bytes(body[24..28].try_into().unwrap());
    let fps = u16::from_be_bytes(body[28..30].try_into().unwrap());
    let projectile_lifetime = u16::from_be_bytes(body[30..32].try_into().unwrap());
    let your_player_id = u16::from_be_bytes(body[32..34].try_into().unwrap());

    let n_players = u32::from_be_bytes(body[34..38].try_into().unwrap());
    let players_begin = i32::from_be_bytes(body[38..42].try_into().unwrap());
    let n_explosions = u32::from_be_bytes(body[42..46].try_into().unwrap());
    let explosions_begin = i32::from_be_bytes(body[46..50].try_into().unwrap());
    let n_projectiles = u32::from_be_bytes(body[50..54].try_into().unwrap());
    let projectiles_begin = i32::from_be_bytes(body[54..58].try_into().unwrap());

    let players_begin_field_offset = HEADER_LEN + 34 + 4;
    let explosions_begin_field_offset = HEADER_LEN + 42 + 4;
    let projectiles_begin_field_offset = HEADER_LEN + 50 + 4;

    let players_start = resolve_relative(datagram.len(), players_begin_field_offset, players_begin)?;
    let explosions_start = resolve_relative(
        datagram.len(),
        explosions_begin_field_offset,
        explosions_begin,
    )?;
    let projectiles_start = resolve_relative(
        datagram.len(),
        projectiles_begin_field_offset,
        projectiles_begin,
    )?;

    let players = read_rows(datagram, players_start, n_players, PLAYER_ROW_LEN, |row| {
        WirePlayer {
            id: u16::from_be_bytes(row[0..2].try_into().unwrap()),
            alive: row[2] != 0,
            position: (
                f32::from_be_bytes(row[3..7].try_into().unwrap()),
                f32::from_be_bytes(row[7..11].try_into().unwrap()),
            ),
            heading: f32::from_be_bytes(row[11..15].try_into().unwrap()),
            score: u32::from_be_bytes(row[15..19].try_into().unwrap()),
            color: (row[19], row[20], row[21]),
        }
    })?;
    let explosions = read_rows(
        datagram,
        explosions_start,
        n_explosions,
        EXPLOSION_ROW_LEN,
        |row| WireExplosion {
            position: (
                f32::from_be_bytes(row[0..4].try_into().unwrap()),
                f32::from_be_bytes(row[4..8].try_into().unwrap()),
            ),
            ticks_since_creation: u16::from_be_bytes(row[8..10].try_into().unwrap()),
        },
    )?;
    let projectiles = read_rows(
        datagram,
        projectiles_start,
        n_projectiles,
        PROJECTILE_ROW_LEN,
        |row| WireProjectile {
            position: (
                f32::from_be_bytes(row[0..4].try_into().unwrap()),
                f32::from_be_bytes(row[4..8].try_into().unwrap()),
            ),
            heading: f32::from_be_bytes(row[8..12].try_into().unwrap()),
            ticks_since_creation: u16::from_be_bytes(row[12..14].try_into().unwrap()),
        },
    )?;

    Ok(SimulationTickPacket {
        sequence_num,
        ack_input_sequence_num,
        game_settings: GameSettings {
            player_timeout,
            level_size: (level_size_x, level_size_y),
            fps,
            projectile_lifetime,
        },
        your_player_id,
        players,
        explosions,
        projectiles,
    })
}

/// Dereferences a self-relative offset: `field_offset + begin` must land
/// inside `datagram_len`, matching §9's "never reintroduce as a runtime
/// pointer, only validate and index" rule.
fn resolve_relative(
    datagram_len: usize,
    field_offset: usize,
    begin: i32,
) -> Result<usize, IngressRejection> {
    let start = field_offset as i64 + begin as i64;
    if start < 0 || start as usize > datagram_len {
        return Err(IngressRejection::TooShortForPayload);
    }
    Ok(start as usize)
}

fn read_rows<T>(
    datagram: &[u8],
    start: usize,
    n_elems: u32,
    row_len: usize,
    parse: impl Fn(&[u8]) -> T,
) -> Result<Vec<T>, IngressRejection> {
    let total = n_elems as usize * row_len;
    let end = start.checked_add(total).ok_or(IngressRejection::TooShortForPayload)?;
    if end > datagram.len() {
        return Err(IngressRejection::TooShortForPayload);
    }
    let mut out = Vec::with_capacity(n_elems as usize);
    for i in 0..n_elems as usize {
        let row = &datagram[start + i * row_len..start + (i + 1) * row_len];
        out.push(parse(row));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_packet() -> SimulationTickPacket {
        SimulationTickPacket {
            sequence_num: 42,
            ack_input_sequence_num: 7,
            game_settings: GameSettings {
                player_timeout: 30.0,
                level_size: (800, 600),
                fps: 30,
                projectile_lifetime: 45,
            },
            your_player_id: 3,
            players: vec![
                WirePlayer {
                    id: 0,
                    alive: true,
                    position: (400.0, 300.0),
                    heading: std::f32::consts::FRAC_PI_2,
                    score: 0,
                    color: (255, 0, 0),
                },
                WirePlayer {
                    id: 1,
                    alive: false,
                    position: (10.5, 20.25),
                    heading: 0.0,
                    score: 5,
                    color: (0, 255, 0),
                },
            ],
            explosions: vec![WireExplosion {
                position: (50.0, 60.0),
                ticks_since_creation: 12,
            }],
            projectiles: vec![
                WireProjectile {
                    position: (1.0, 2.0),
                    heading: 1.5,
                    ticks_since_creation: 3,
                },
                WireProjectile {
                    position: (3.0, 4.0),
                    heading: 2.5,
                    ticks_since_creation: 4,
                },
            ],
        }
    }

    #[test]
    fn header_round_trips_and_validates() {
        let packet = PlayerInputPacket {
            sequence_num: 9,
            input: PlayerInput {
                accelerate: Accelerate::Forward,
                rotate: Rotate::Left,
                shoot: true,
            },
        };
        let mut buf = Vec::new();
        encode_player_input(&mut buf, &packet);
        let decoded = decode_player_input(&buf).unwrap();
        assert_eq!(decoded.packet, packet);
        assert!(!decoded.minor_version_mismatch);
    }

    #[test]
    fn rejects_wrong_protocol_id() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&0u32.to_be_bytes());
        buf.extend_from_slice(&PROTOCOL_VERSION_MAJOR.to_be_bytes());
        buf.extend_from_slice(&PROTOCOL_VERSION_MINOR.to_be_bytes());
        buf.push(1);
        buf.extend_from_slice(&[0u8; PLAYER_INPUT_PAYLOAD_LEN]);
        assert_eq!(
            decode_player_input(&buf),
            Err(IngressRejection::ProtocolIdMismatch)
        );
    }

    #[test]
    fn rejects_short_header() {
        assert_eq!(
            decode_player_input(&[0, 1, 2]),
            Err(IngressRejection::TooShortForHeader)
        );
    }

    #[test]
    fn rejects_unexpected_type() {
        let mut buf = Vec::new();
        write_header(&mut buf, PacketType::SimulationTick);
        buf.extend_from_slice(&[0u8; PLAYER_INPUT_PAYLOAD_LEN]);
        assert_eq!(
            decode_player_input(&buf),
            Err(IngressRejection::UnexpectedType(0))
        );
    }

    #[test]
    fn accepts_minor_version_mismatch() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&PROTOCOL_ID.to_be_bytes());
        buf.extend_from_slice(&PROTOCOL_VERSION_MAJOR.to_be_bytes());
        buf.extend_from_slice(&99u16.to_be_bytes());
        buf.push(1);
        buf.extend_from_slice(&[0u8; PLAYER_INPUT_PAYLOAD_LEN]);
        let decoded = decode_player_input(&buf).unwrap();
        assert!(decoded.minor_version_mismatch);
    }

    /// Property 7: snapshot round-trip.
    #[test]
    fn simulation_tick_round_trips() {
        let packet = sample_packet();
        let mut buf = Vec::new();
        encode_simulation_tick(&mut buf, &packet);
        let decoded = decode_simulation_tick(&buf).unwrap();
        assert_eq!(decoded, packet);
    }

    /// Property 7 (cont.): each `begin` offset reconstructs the correct
    /// element base independent of how many elements precede it.
    #[test]
    fn simulation_tick_round_trips_with_empty_arrays() {
        let mut packet = sample_packet();
        packet.players.clear();
        packet.explosions.clear();
        packet.projectiles.clear();
        let mut buf = Vec::new();
        encode_simulation_tick(&mut buf, &packet);
        let decoded = decode_simulation_tick(&buf).unwrap();
        assert_eq!(decoded, packet);
        assert_eq!(buf.len(), HEADER_LEN + SIMULATION_TICK_PREFIX_LEN);
    }

    /// Property 8: byte-order independence. Because every multi-byte value
    /// is explicitly converted via `to_be_bytes`/`from_be_bytes` rather than
    /// relying on the host's native representation, the encoded bytes (and
    /// therefore the decoded structure) do not depend on which endianness
    /// this test happens to run on.
    #[test]
    fn encoding_does_not_depend_on_host_endianness() {
        let packet = sample_packet();
        let mut buf = Vec::new();
        encode_simulation_tick(&mut buf, &packet);
        // The wire bytes for a big-endian u64 of 42 start with six zero
        // bytes regardless of host endianness; this would fail on a
        // little-endian host if `to_be_bytes` were replaced with
        // `to_ne_bytes`.
        assert_eq!(&buf[HEADER_LEN..HEADER_LEN + 8], &42u64.to_be_bytes());
    }

    #[test]
    fn rejects_out_of_bounds_array_descriptor() {
        let packet = sample_packet();
        let mut buf = Vec::new();
        encode_simulation_tick(&mut buf, &packet);
        buf.truncate(buf.len() - 4);
        assert!(decode_simulation_tick(&buf).is_err());
    }
}
