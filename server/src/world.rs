//! The authoritative simulation: players, projectiles, explosions, and the
//! fixed-order `tick()` that advances them.
//!
//! Grounded on the teacher's `server/src/game.rs` for the overall shape
//! (`GameState` owning a tick counter plus entity containers, with
//! `add_player`/`apply_input`/`update_physics`-style methods) and on
//! `examples/original_source/server.c` (`tick_simulation`, `player_spawn`,
//! `find_spacious_position`, `player_die`) for the actual rules, which
//! fully replace the teacher's platformer gravity model.

use std::f32::consts::FRAC_PI_2;

use shared::protocol::{Accelerate, PlayerInput, Rotate, WireExplosion, WirePlayer, WireProjectile};
use shared::{
    PlayerId, EXPLOSION_LIFETIME, LEVEL_SIZE, PLAYER_ACCELERATION, PLAYER_BRAKING,
    PLAYER_RADIUS, PLAYER_RESPAWN_DELAY, PLAYER_TURN_RATE, PROJECTILE_LIFETIME, PROJECTILE_SPEED,
    SHOT_COOLDOWN,
};

use crate::color::next_unused_color;
use crate::math::{normalize_angle, Vec2};

const SPAWN_GRID_STEP: f32 = 20.0;

/// An authoritative player. Peer addresses and session bookkeeping live in
/// `SessionTable`, not here — `World` only owns what the simulation needs
/// to advance a tick.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub input: PlayerInput,
    pub alive: bool,
    pub ticks_until_respawn: u32,
    pub position: Vec2,
    pub heading: f32,
    pub velocity: Vec2,
    pub last_shot_tick: u64,
    pub score: i32,
    pub color: (u8, u8, u8),
}

#[derive(Debug, Clone)]
pub struct Projectile {
    pub position: Vec2,
    pub heading: f32,
    pub velocity: Vec2,
    pub shooter: PlayerId,
    pub creation_tick: u64,
}

#[derive(Debug, Clone)]
pub struct Explosion {
    pub position: Vec2,
    pub creation_tick: u64,
}

/// The whole simulation. Owned by `main` (or the test driving it directly)
/// and passed by mutable reference into `tick`/input handling — never
/// process-global state (§9's "global mutable world" note).
#[derive(Debug, Default)]
pub struct World {
    pub curr_tick: u64,
    pub players: Vec<Player>,
    pub projectiles: Vec<Projectile>,
    pub explosions: Vec<Explosion>,
    next_player_id: PlayerId,
}

impl World {
    pub fn new() -> Self {
        World::default()
    }

    /// Allocates a new `PlayerId`, assigns it an unused color, and spawns
    /// it into the world. Ids are never reused within the process.
    pub fn register_peer(&mut self) -> PlayerId {
        let id = self.next_player_id;
        self.next_player_id += 1;
        let color = next_unused_color(self.players.iter().map(|p| p.color));
        let position = self.find_spacious_position();
        self.players.push(Player {
            id,
            input: PlayerInput::default(),
            alive: true,
            ticks_until_respawn: 0,
            position,
            heading: FRAC_PI_2,
            velocity: Vec2::ZERO,
            last_shot_tick: self.curr_tick,
            score: 0,
            color,
        });
        id
    }

    pub fn remove(&mut self, player_id: PlayerId) {
        self.players.retain(|p| p.id != player_id);
    }

    /// Records `input` as the player's most recent accepted input; it is
    /// consumed on the next `tick()`. Sequence-number filtering already
    /// happened at the session boundary (`SessionTable::ingest`) by the
    /// time this is called.
    pub fn apply_input(&mut self, player_id: PlayerId, input: PlayerInput) {
        if let Some(player) = self.players.iter_mut().find(|p| p.id == player_id) {
            player.input = input;
        }
    }

    pub fn snapshot(&self) -> &World {
        self
    }

    pub fn wire_players(&self) -> Vec<WirePlayer> {
        self.players
            .iter()
            .map(|p| WirePlayer {
                id: p.id,
                alive: p.alive,
                position: (p.position.x, p.position.y),
                heading: p.heading,
                score: p.score as u32,
                color: p.color,
            })
            .collect()
    }

    pub fn wire_explosions(&self) -> Vec<WireExplosion> {
        self.explosions
            .iter()
            .map(|e| WireExplosion {
                position: (e.position.x, e.position.y),
                ticks_since_creation: (self.curr_tick - e.creation_tick) as u16,
            })
            .collect()
    }

    pub fn wire_projectiles(&self) -> Vec<WireProjectile> {
        self.projectiles
            .iter()
            .map(|r| WireProjectile {
                position: (r.position.x, r.position.y),
                heading: r.heading,
                ticks_since_creation: (self.curr_tick - r.creation_tick) as u16,
            })
            .collect()
    }

    /// Advances the simulation by exactly one tick, in the fixed order
    /// documented in SPEC_FULL.md §4.4: age explosions, step players
    /// (respawn-or-move-and-shoot), step projectiles, resolve collisions.
    pub fn tick(&mut self) {
        self.curr_tick += 1;
        let curr_tick = self.curr_tick;

        self.explosions
            .retain(|e| curr_tick - e.creation_tick <= EXPLOSION_LIFETIME as u64);

        for i in 0..self.players.len() {
            self.step_player(i, curr_tick);
        }

        for projectile in self.projectiles.iter_mut() {
            projectile.position = projectile.position.add(projectile.velocity).wrap(LEVEL_SIZE);
        }
        self.projectiles
            .retain(|p| curr_tick - p.creation_tick <= PROJECTILE_LIFETIME as u64);

        self.resolve_collisions();
    }

    fn step_player(&mut self, i: usize, curr_tick: u64) {
        if !self.players[i].alive {
            self.players[i].ticks_until_respawn = self.players[i].ticks_until_respawn.saturating_sub(1);
            if self.players[i].ticks_until_respawn == 0 {
                let spawn = self.find_spacious_position();
                let p = &mut self.players[i];
                p.alive = true;
                p.heading = FRAC_PI_2;
                p.velocity = Vec2::ZERO;
                p.position = spawn;
                p.last_shot_tick = curr_tick;
            }
            return;
        }

        let rotate_delta = match self.players[i].input.rotate {
            Rotate::Left => PLAYER_TURN_RATE,
            Rotate::Right => -PLAYER_TURN_RATE,
            Rotate::None => 0.0,
        };
        self.players[i].heading = normalize_angle(self.players[i].heading + rotate_delta);

        let accel = match self.players[i].input.accelerate {
            Accelerate::Forward => PLAYER_ACCELERATION,
            Accelerate::Reverse => PLAYER_BRAKING,
            Accelerate::None => 0.0,
        };
        let impulse = Vec2::from_polar(self.players[i].heading, accel);
        self.players[i].velocity = self.players[i].velocity.velocity_add(impulse);

        self.players[i].position = self.players[i].position.add(self.players[i].velocity).wrap(LEVEL_SIZE);

        if self.players[i].input.shoot
            && curr_tick >= self.players[i].last_shot_tick + SHOT_COOLDOWN as u64
        {
            let heading = self.players[i].heading;
            let shooter = self.players[i].id;
            let position = self.players[i]
                .position
                .add(Vec2::from_polar(heading, PLAYER_RADIUS))
                .wrap(LEVEL_SIZE);
            self.players[i].last_shot_tick = curr_tick;
            self.projectiles.push(Projectile {
                position,
                heading,
                velocity: Vec2::from_polar(heading, PROJECTILE_SPEED),
                shooter,
                creation_tick: curr_tick,
            });
        }
    }

    /// Player-player then player-projectile passes. `Q`'s death in the
    /// player-player pass is applied immediately (it can still be hit
    /// again this tick); `P`'s own death is deferred until after the
    /// projectile pass so a player can still score a hit in the tick it
    /// dies. This asymmetry is deliberate, not an oversight (see
    /// SPEC_FULL.md §4.4).
    fn resolve_collisions(&mut self) {
        let n = self.players.len();
        let mut marked = vec![false; n];

        for i in 0..n {
            if !self.players[i].alive {
                continue;
            }
            for j in (i + 1)..n {
                if !self.players[j].alive {
                    continue;
                }
                if self.players[i].position.distance(self.players[j].position) < 2.0 * PLAYER_RADIUS {
                    marked[i] = true;
                    self.die_by_index(j);
                }
            }
        }

        for i in 0..n {
            if !self.players[i].alive {
                continue;
            }
            let mut j = 0;
            while j < self.projectiles.len() {
                if self.players[i].position.distance(self.projectiles[j].position) < PLAYER_RADIUS {
                    marked[i] = true;
                    let shooter = self.projectiles[j].shooter;
                    self.projectiles.remove(j);
                    let delta = if shooter == self.players[i].id { -1 } else { 1 };
                    self.adjust_score(shooter, delta);
                } else {
                    j += 1;
                }
            }
        }

        for i in 0..n {
            if marked[i] {
                self.die_by_index(i);
            }
        }
    }

    fn adjust_score(&mut self, player_id: PlayerId, delta: i32) {
        if let Some(player) = self.players.iter_mut().find(|p| p.id == player_id) {
            player.score += delta;
        }
    }

    fn die_by_index(&mut self, idx: usize) {
        let position = self.players[idx].position;
        self.players[idx].alive = false;
        self.players[idx].ticks_until_respawn = PLAYER_RESPAWN_DELAY;
        self.explosions.push(Explosion {
            position,
            creation_tick: self.curr_tick,
        });
    }

    /// Scans a 20px grid for the candidate point farthest from the level
    /// edges, any alive player, and any projectile (explosions are not
    /// considered). Ties keep the first-found candidate in x-major,
    /// then-y scan order.
    fn find_spacious_position(&self) -> Vec2 {
        let (w, h) = (LEVEL_SIZE.0 as f32, LEVEL_SIZE.1 as f32);
        let mut best: Option<(Vec2, f32)> = None;

        let mut x = SPAWN_GRID_STEP;
        while x < w - SPAWN_GRID_STEP {
            let mut y = SPAWN_GRID_STEP;
            while y < h - SPAWN_GRID_STEP {
                let candidate = Vec2::new(x, y);
                let mut d = candidate.x.min(w - candidate.x).min(candidate.y).min(h - candidate.y);
                for p in self.players.iter().filter(|p| p.alive) {
                    d = d.min(candidate.distance(p.position));
                }
                for proj in &self.projectiles {
                    d = d.min(candidate.distance(proj.position));
                }
                if best.map_or(true, |(_, best_d)| d > best_d) {
                    best = Some((candidate, d));
                }
                y += SPAWN_GRID_STEP;
            }
            x += SPAWN_GRID_STEP;
        }

        best.map(|(pos, _)| pos).unwrap_or_else(|| Vec2::new(w / 2.0, h / 2.0))
    }
}
