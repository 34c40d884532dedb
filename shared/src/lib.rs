//! # Arena Shared Library
//!
//! Types and constants shared by the authoritative server and anything that
//! speaks its wire protocol. This crate owns two things:
//!
//! - **Game constants** — the fixed-timestep simulation's tuning values
//!   (`FPS`, `LEVEL_SIZE`, acceleration/braking/turn rate, cooldowns and
//!   lifetimes). All derived from `FPS` so that changing the tick rate
//!   keeps everything self-consistent.
//! - **Wire protocol** (`protocol` module) — the binary packet formats that
//!   cross the UDP socket: a fixed header, the client's `PlayerInput`
//!   packet, and the server's `SimulationTick` snapshot with its
//!   self-relative array descriptors.
//!
//! Nothing here is serialized with a generic derive serializer: the wire
//! format is packed, big-endian, and uses self-relative offsets that a
//! tool like `serde`/`bincode` cannot express, so `protocol` encodes and
//! decodes by hand.

pub mod protocol;

/// Unique identity assigned to a player when its session is created.
/// Monotonically increasing for the lifetime of the server process and
/// never reused.
pub type PlayerId = u16;

/// Simulation tick rate, in ticks per second. Every other time-derived
/// constant below is expressed in terms of this one so that a server run
/// at a non-default rate (see `--tick-rate-hz`) stays internally consistent.
pub const FPS: u32 = 30;

/// Playfield extent in pixels. The world wraps toroidally at these bounds.
pub const LEVEL_SIZE: (i32, i32) = (800, 600);

/// Collision radius shared by every player disk.
pub const PLAYER_RADIUS: f32 = 30.0;

/// Forward thrust impulse applied per tick while accelerating.
pub const PLAYER_ACCELERATION: f32 = 150.0 / (FPS as f32 * FPS as f32);

/// Braking impulse applied per tick while reversing (negative: opposes heading).
pub const PLAYER_BRAKING: f32 = -75.0 / (FPS as f32 * FPS as f32);

/// Heading change per tick while turning, in radians.
pub const PLAYER_TURN_RATE: f32 = std::f32::consts::PI / FPS as f32;

/// Soft speed cap used by the pseudo-relativistic velocity-addition rule.
pub const SPEED_LIMIT: f32 = 500.0 / FPS as f32;

/// Projectile travel speed, in pixels per tick.
pub const PROJECTILE_SPEED: f32 = 500.0 / FPS as f32;

/// Minimum tick gap between two shots fired by the same player.
pub const SHOT_COOLDOWN: u32 = (FPS as f32 * 0.5) as u32;

/// Ticks a projectile survives before despawning on its own.
pub const PROJECTILE_LIFETIME: u32 = (FPS as f32 * 1.5) as u32;

/// Ticks an explosion stays visible after a player's death.
pub const EXPLOSION_LIFETIME: u32 = FPS * 5;

/// Ticks a dead player waits before respawning.
pub const PLAYER_RESPAWN_DELAY: u32 = FPS;

/// Seconds of silence from a peer before its session is dropped.
pub const PLAYER_TIMEOUT: f64 = 30.0;

/// Default UDP port the server listens on.
pub const LISTEN_PORT: u16 = 6642;
