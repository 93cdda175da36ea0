//! Celebration particles
//!
//! Purely visual. Particles are spawned in bursts, aged once per tick and
//! culled when their age passes their lifespan.

use glam::Vec2;
use rand::Rng;

use crate::tuning::ParticleTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleKind {
    Heart,
    Confetti,
}

#[derive(Debug, Clone)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    pub age: u32,
    pub lifespan: u32,
    pub rotation: f32,
    pub spin: f32,
    pub kind: ParticleKind,
    /// Confetti tint (ignored for hearts)
    pub tint: [u8; 3],
}

impl Particle {
    /// Opacity fading out over the lifespan
    pub fn alpha(&self) -> f32 {
        (1.0 - self.age as f32 / self.lifespan as f32).clamp(0.0, 1.0) * 0.9
    }
}

/// Bounded set of live particles
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
    capacity: usize,
    /// Ticks are no-ops while unset
    pub running: bool,
    tuning: ParticleTuning,
}

impl ParticleSystem {
    pub fn new(tuning: &ParticleTuning, capacity: usize) -> Self {
        Self {
            particles: Vec::with_capacity(capacity.min(1024)),
            capacity,
            running: true,
            tuning: tuning.clone(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Lower or raise the cap; excess oldest particles are dropped
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        if self.particles.len() > capacity {
            let excess = self.particles.len() - capacity;
            self.particles.drain(..excess);
        }
    }

    pub fn active_count(&self) -> usize {
        self.particles.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    /// Emit up to `count` particles at `at`; returns how many were added.
    /// Live particles are never evicted, the batch is cut to the free room.
    pub fn spawn<R: Rng>(&mut self, at: Vec2, count: usize, rng: &mut R) -> usize {
        let room = self.capacity.saturating_sub(self.particles.len());
        let count = count.min(room);
        let t = &self.tuning;
        for _ in 0..count {
            let kind = if rng.random_bool(0.5) {
                ParticleKind::Heart
            } else {
                ParticleKind::Confetti
            };
            self.particles.push(Particle {
                pos: at,
                vel: Vec2::new(range_f32(rng, t.vel_x), range_f32(rng, t.vel_y)),
                size: range_f32(rng, t.size),
                age: 0,
                lifespan: range_u32(rng, t.lifespan).max(1),
                rotation: rng.random_range(0.0..std::f32::consts::TAU),
                spin: range_f32(rng, t.spin),
                kind,
                tint: [
                    rng.random_range(60..=240),
                    rng.random_range(60..=240),
                    rng.random_range(60..=240),
                ],
            });
        }
        count
    }

    /// Advance every particle one tick and cull the expired ones
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }
        let gravity = self.tuning.gravity;
        for p in self.particles.iter_mut() {
            p.pos += p.vel;
            if p.kind == ParticleKind::Confetti {
                p.vel.y += gravity;
            } else {
                // Hearts drift up and slow down
                p.vel *= 0.99;
            }
            p.rotation += p.spin;
            p.age += 1;
        }
        self.particles.retain(|p| p.age <= p.lifespan);
    }
}

fn range_f32<R: Rng>(rng: &mut R, [a, b]: [f32; 2]) -> f32 {
    if a >= b { a } else { rng.random_range(a..b) }
}

fn range_u32<R: Rng>(rng: &mut R, [a, b]: [u32; 2]) -> u32 {
    rng.random_range(a.min(b)..=a.max(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn system(capacity: usize) -> (ParticleSystem, Pcg32) {
        (
            ParticleSystem::new(&ParticleTuning::default(), capacity),
            Pcg32::seed_from_u64(99),
        )
    }

    #[test]
    fn test_spawn_adds_count() {
        let (mut ps, mut rng) = system(500);
        assert_eq!(ps.spawn(Vec2::new(100.0, 100.0), 18, &mut rng), 18);
        assert_eq!(ps.active_count(), 18);
        assert!(ps.iter().all(|p| p.vel.y < 0.0));
    }

    #[test]
    fn test_spawn_respects_capacity() {
        let (mut ps, mut rng) = system(50);
        assert_eq!(ps.spawn(Vec2::ZERO, 40, &mut rng), 40);
        assert_eq!(ps.spawn(Vec2::ZERO, 40, &mut rng), 10);
        assert_eq!(ps.active_count(), 50);
    }

    #[test]
    fn test_full_system_keeps_existing() {
        let (mut ps, mut rng) = system(20);
        ps.spawn(Vec2::ZERO, 20, &mut rng);
        ps.tick();
        assert_eq!(ps.spawn(Vec2::new(500.0, 500.0), 5, &mut rng), 0);
        assert_eq!(ps.active_count(), 20);
        assert!(ps.iter().all(|p| p.age == 1));
    }

    #[test]
    fn test_all_culled_after_max_lifespan() {
        let (mut ps, mut rng) = system(500);
        ps.spawn(Vec2::ZERO, 120, &mut rng);
        let max_life = ParticleTuning::default().lifespan[1];

        let mut last = ps.active_count();
        for _ in 0..=max_life {
            ps.tick();
            assert!(ps.active_count() <= last);
            last = ps.active_count();
        }
        assert_eq!(ps.active_count(), 0);
    }

    #[test]
    fn test_none_culled_before_min_lifespan() {
        let (mut ps, mut rng) = system(500);
        ps.spawn(Vec2::ZERO, 60, &mut rng);
        for _ in 0..ParticleTuning::default().lifespan[0] {
            ps.tick();
        }
        assert_eq!(ps.active_count(), 60);
    }

    #[test]
    fn test_confetti_falls() {
        let (mut ps, mut rng) = system(500);
        ps.spawn(Vec2::ZERO, 100, &mut rng);
        let before: Vec<f32> = ps.iter().map(|p| p.vel.y).collect();
        ps.tick();
        for (p, vy) in ps.iter().zip(before) {
            if p.kind == ParticleKind::Confetti {
                assert!(p.vel.y > vy);
            }
        }
    }

    #[test]
    fn test_stopped_system_freezes() {
        let (mut ps, mut rng) = system(100);
        ps.spawn(Vec2::ZERO, 10, &mut rng);
        ps.running = false;
        ps.tick();
        assert!(ps.iter().all(|p| p.age == 0));
    }

    #[test]
    fn test_shrinking_capacity_drops_oldest() {
        let (mut ps, mut rng) = system(100);
        ps.spawn(Vec2::ZERO, 30, &mut rng);
        ps.tick();
        ps.spawn(Vec2::ZERO, 10, &mut rng);
        ps.set_capacity(10);
        assert_eq!(ps.active_count(), 10);
        assert!(ps.iter().all(|p| p.age == 0));
    }

    #[test]
    fn test_alpha_fades() {
        let (mut ps, mut rng) = system(10);
        ps.spawn(Vec2::ZERO, 1, &mut rng);
        let start = ps.iter().next().map(|p| p.alpha()).unwrap_or_default();
        for _ in 0..40 {
            ps.tick();
        }
        let later = ps.iter().next().map(|p| p.alpha()).unwrap_or_default();
        assert!(later < start);
    }
}
