//! The catchable ring
//!
//! A free-flying entity inside a rectangular arena. Each tick it moves,
//! bounces off walls with a small kick, occasionally receives a random
//! impulse, is held between a speed floor and a speed cap, and is damped by
//! friction. Catching is decided on input events, never by polling.

use glam::Vec2;
use rand::Rng;

use crate::tuning::RingTuning;
use crate::{Rect, max_origin, ms_to_ticks};

/// Lifecycle of a ring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingPhase {
    /// Simulated and catchable
    Flying,
    /// Caught; playing the shrink/fade
    Shrinking { remaining: u32 },
    /// Shrink finished, completion delivered
    Caught,
    /// Time limit reached without a catch
    Escaped,
}

/// One-time notifications returned from `tick`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingEvent {
    /// Shrink finished after a catch
    Completed,
    /// Not caught in time
    Escaped,
}

/// Result of a pointer/touch hit test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatchOutcome {
    Caught,
    Missed,
    /// The ring is no longer catchable
    Ignored,
}

#[derive(Debug, Clone)]
pub struct Ring {
    /// Top-left corner
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    /// Arena size
    pub bounds: Vec2,
    /// Physics runs only while set
    pub running: bool,
    phase: RingPhase,
    age_ticks: u32,
    time_limit_ticks: u32,
    shrink_ticks: u32,
    speed_cap: f32,
    min_speed: f32,
    friction: f32,
    wall_kick: f32,
    impulse_chance: f64,
    impulse_strength: f32,
}

impl Ring {
    /// Spawn in the middle of the arena heading in a random direction
    pub fn new<R: Rng>(tuning: &RingTuning, bounds: Vec2, rng: &mut R) -> Self {
        let size = tuning.size;
        let angle = rng.random_range(0.0..std::f32::consts::TAU);
        Self {
            pos: max_origin(bounds, Vec2::splat(size)) * 0.5,
            vel: Vec2::from_angle(angle) * tuning.initial_speed,
            size,
            bounds,
            running: true,
            phase: RingPhase::Flying,
            age_ticks: 0,
            time_limit_ticks: ms_to_ticks(tuning.time_limit_ms),
            shrink_ticks: ms_to_ticks(tuning.shrink_ms),
            speed_cap: tuning.speed_cap,
            min_speed: tuning.min_speed,
            friction: tuning.friction,
            wall_kick: tuning.wall_kick,
            impulse_chance: tuning.impulse_chance.clamp(0.0, 1.0),
            impulse_strength: tuning.impulse_strength,
        }
    }

    pub fn phase(&self) -> RingPhase {
        self.phase
    }

    pub fn speed_cap(&self) -> f32 {
        self.speed_cap
    }

    /// Ticks left before the ring escapes
    pub fn remaining_ticks(&self) -> u32 {
        self.time_limit_ticks.saturating_sub(self.age_ticks)
    }

    /// Draw scale: 1 while flying, shrinking to 0 after a catch, 0 once escaped
    pub fn visual_scale(&self) -> f32 {
        match self.phase {
            RingPhase::Flying => 1.0,
            RingPhase::Shrinking { remaining } => remaining as f32 / self.shrink_ticks as f32,
            RingPhase::Caught | RingPhase::Escaped => 0.0,
        }
    }

    /// Current on-screen rectangle
    pub fn rect(&self) -> Rect {
        Rect::new(self.pos, Vec2::splat(self.size)).scaled(self.visual_scale())
    }

    /// Stop simulating without completing (scene torn down)
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Arena resized; keep the ring inside
    pub fn resize(&mut self, bounds: Vec2) {
        self.bounds = bounds;
        self.pos = self
            .pos
            .clamp(Vec2::ZERO, max_origin(bounds, Vec2::splat(self.size)));
    }

    /// Advance one tick
    pub fn tick<R: Rng>(&mut self, rng: &mut R) -> Option<RingEvent> {
        if let RingPhase::Shrinking { remaining } = self.phase {
            let remaining = remaining.saturating_sub(1);
            if remaining == 0 {
                self.phase = RingPhase::Caught;
                log::info!("Ring caught");
                return Some(RingEvent::Completed);
            }
            self.phase = RingPhase::Shrinking { remaining };
            return None;
        }

        if !self.running || self.phase != RingPhase::Flying {
            return None;
        }

        self.age_ticks += 1;
        if self.age_ticks >= self.time_limit_ticks {
            self.running = false;
            self.phase = RingPhase::Escaped;
            log::info!("Ring escaped after {} ticks", self.age_ticks);
            return Some(RingEvent::Escaped);
        }

        self.integrate(rng);
        None
    }

    fn integrate<R: Rng>(&mut self, rng: &mut R) {
        self.pos += self.vel;

        // Walls: clamp, reflect, kick
        let max = max_origin(self.bounds, Vec2::splat(self.size));
        if self.pos.x < 0.0 {
            self.pos.x = 0.0;
            self.vel.x = self.vel.x.abs() + self.wall_kick;
        } else if self.pos.x > max.x {
            self.pos.x = max.x;
            self.vel.x = -(self.vel.x.abs() + self.wall_kick);
        }
        if self.pos.y < 0.0 {
            self.pos.y = 0.0;
            self.vel.y = self.vel.y.abs() + self.wall_kick;
        } else if self.pos.y > max.y {
            self.pos.y = max.y;
            self.vel.y = -(self.vel.y.abs() + self.wall_kick);
        }

        if rng.random_bool(self.impulse_chance) {
            let s = self.impulse_strength;
            self.vel += Vec2::new(rng.random_range(-s..=s), rng.random_range(-s..=s));
        }

        let speed = self.vel.length();
        if speed < self.min_speed {
            self.vel = if speed > f32::EPSILON {
                self.vel * (self.min_speed / speed)
            } else {
                Vec2::from_angle(rng.random_range(0.0..std::f32::consts::TAU)) * self.min_speed
            };
        }

        let speed = self.vel.length();
        if speed > self.speed_cap {
            self.vel *= self.speed_cap / speed;
        }

        self.vel *= self.friction;
    }

    /// Hit test a pointer/touch at `point`
    pub fn try_catch(&mut self, point: Vec2) -> CatchOutcome {
        if self.phase != RingPhase::Flying || !self.running {
            return CatchOutcome::Ignored;
        }
        if !self.rect().contains(point) {
            return CatchOutcome::Missed;
        }
        self.running = false;
        self.phase = RingPhase::Shrinking {
            remaining: self.shrink_ticks,
        };
        CatchOutcome::Caught
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn arena() -> Vec2 {
        Vec2::new(400.0, 300.0)
    }

    fn ring(seed: u64) -> (Ring, Pcg32) {
        let mut rng = Pcg32::seed_from_u64(seed);
        let ring = Ring::new(&RingTuning::default(), arena(), &mut rng);
        (ring, rng)
    }

    #[test]
    fn test_stays_inside_arena() {
        let (mut ring, mut rng) = ring(42);
        for _ in 0..5_000 {
            ring.tick(&mut rng);
            let max = max_origin(arena(), Vec2::splat(ring.size));
            assert!(ring.pos.x >= 0.0 && ring.pos.x <= max.x);
            assert!(ring.pos.y >= 0.0 && ring.pos.y <= max.y);
        }
    }

    #[test]
    fn test_wall_reflection_kicks() {
        let (mut ring, mut rng) = ring(1);
        ring.impulse_chance = 0.0;
        ring.pos = Vec2::new(1.0, 100.0);
        ring.vel = Vec2::new(-4.0, 0.0);
        ring.tick(&mut rng);
        assert_eq!(ring.pos.x, 0.0);
        assert!(ring.vel.x > 4.0 * ring.friction);
    }

    #[test]
    fn test_catch_completes_once() {
        let (mut ring, mut rng) = ring(7);
        let center = ring.rect().center();

        assert_eq!(ring.try_catch(center), CatchOutcome::Caught);
        assert!(!ring.running);

        let mut completions = 0;
        for _ in 0..200 {
            if ring.tick(&mut rng) == Some(RingEvent::Completed) {
                completions += 1;
            }
        }
        assert_eq!(completions, 1);
        assert_eq!(ring.phase(), RingPhase::Caught);

        // Stray click on the removed ring
        assert_eq!(ring.try_catch(center), CatchOutcome::Ignored);
        assert_eq!(ring.tick(&mut rng), None);
    }

    #[test]
    fn test_shrink_scales_down() {
        let (mut ring, mut rng) = ring(7);
        ring.try_catch(ring.rect().center());
        ring.tick(&mut rng);
        assert!(ring.visual_scale() < 1.0);
        assert!(ring.visual_scale() > 0.0);
    }

    #[test]
    fn test_miss_outside_rect() {
        let (mut ring, _) = ring(3);
        let far = ring.rect().max() + Vec2::splat(10.0);
        assert_eq!(ring.try_catch(far), CatchOutcome::Missed);
        assert!(ring.running);
    }

    #[test]
    fn test_escape_after_time_limit() {
        let tuning = RingTuning {
            time_limit_ms: 500,
            ..RingTuning::default()
        };
        let mut rng = Pcg32::seed_from_u64(9);
        let mut ring = Ring::new(&tuning, arena(), &mut rng);

        let events: Vec<_> = (0..100).filter_map(|_| ring.tick(&mut rng)).collect();
        assert_eq!(events, vec![RingEvent::Escaped]);
        assert!(!ring.running);
        assert_eq!(ring.try_catch(ring.rect().center()), CatchOutcome::Ignored);
    }

    #[test]
    fn test_escaped_ring_is_removed() {
        let tuning = RingTuning {
            time_limit_ms: 500,
            ..RingTuning::default()
        };
        let mut rng = Pcg32::seed_from_u64(9);
        let mut ring = Ring::new(&tuning, arena(), &mut rng);
        for _ in 0..100 {
            ring.tick(&mut rng);
        }
        assert_eq!(ring.phase(), RingPhase::Escaped);
        assert_eq!(ring.visual_scale(), 0.0);
        assert_eq!(ring.rect().size, Vec2::ZERO);
    }

    #[test]
    fn test_stopped_ring_freezes() {
        let (mut ring, mut rng) = ring(5);
        ring.stop();
        let before = ring.pos;
        for _ in 0..10 {
            assert_eq!(ring.tick(&mut rng), None);
        }
        assert_eq!(ring.pos, before);
    }

    #[test]
    fn test_never_comes_to_rest() {
        let (mut ring, mut rng) = ring(11);
        for _ in 0..1_000 {
            ring.tick(&mut rng);
        }
        assert!(ring.vel.length() >= ring.min_speed * ring.friction - 1e-4);
    }

    proptest! {
        #[test]
        fn prop_speed_capped_after_one_tick(
            vx in -200.0f32..200.0,
            vy in -200.0f32..200.0,
            seed in any::<u64>(),
        ) {
            let (mut ring, mut rng) = ring(seed);
            ring.vel = Vec2::new(vx, vy);
            ring.tick(&mut rng);
            prop_assert!(ring.vel.length() <= ring.speed_cap() + 1e-3);
        }
    }
}
