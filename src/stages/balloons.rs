//! Balloon-popping stage
//!
//! Balloons spawn below the play area on a fixed interval and rise to a
//! random resting height. Unpopped balloons are removed once they have risen
//! and lingered. Each pop deals one compliment; reaching the threshold
//! completes the stage exactly once.

use glam::Vec2;
use rand::Rng;

use super::{ComplimentQueue, Completion, OnDone, Stage};
use crate::tuning::BalloonTuning;
use crate::{Rect, ms_to_ticks};

#[derive(Debug, Clone)]
pub struct Balloon {
    pub id: u32,
    pub x: f32,
    pub size: f32,
    start_y: f32,
    target_y: f32,
    rise_ticks: u32,
    age: u32,
}

impl Balloon {
    /// Top-left position, rising linearly until `rise_ticks`
    pub fn pos(&self) -> Vec2 {
        let t = (self.age as f32 / self.rise_ticks as f32).min(1.0);
        Vec2::new(self.x, self.start_y + (self.target_y - self.start_y) * t)
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.pos(), Vec2::splat(self.size))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopOutcome {
    Popped { compliment: Option<String>, popped: u32 },
    /// This pop reached the threshold
    Completed { compliment: Option<String> },
    /// Unknown id, already popped, or stage not running
    Ignored,
}

pub struct BalloonStage {
    area: Vec2,
    balloons: Vec<Balloon>,
    next_id: u32,
    popped: u32,
    threshold: u32,
    spawn_ticks: u32,
    since_spawn: u32,
    rise_ticks: [u32; 2],
    linger_ticks: u32,
    size: [f32; 2],
    compliments: ComplimentQueue,
    completion: Completion,
    running: bool,
}

impl BalloonStage {
    pub fn new(tuning: &BalloonTuning, area: Vec2, compliments: ComplimentQueue) -> Self {
        let [lo, hi] = tuning.rise_ms;
        Self {
            area,
            balloons: Vec::new(),
            next_id: 0,
            popped: 0,
            threshold: tuning.threshold.max(1),
            spawn_ticks: ms_to_ticks(tuning.spawn_interval_ms),
            since_spawn: 0,
            rise_ticks: [ms_to_ticks(lo.min(hi)), ms_to_ticks(lo.max(hi))],
            linger_ticks: ms_to_ticks(tuning.linger_ms),
            size: tuning.size,
            compliments,
            completion: Completion::default(),
            running: false,
        }
    }

    pub fn balloons(&self) -> &[Balloon] {
        &self.balloons
    }

    pub fn popped(&self) -> u32 {
        self.popped
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn resize(&mut self, area: Vec2) {
        self.area = area;
    }

    /// Spawn, rise and expire balloons
    pub fn tick<R: Rng>(&mut self, rng: &mut R) {
        if !self.running {
            return;
        }

        self.since_spawn += 1;
        if self.since_spawn >= self.spawn_ticks {
            self.since_spawn = 0;
            self.spawn(rng);
        }

        let linger = self.linger_ticks;
        for b in self.balloons.iter_mut() {
            b.age += 1;
        }
        self.balloons.retain(|b| b.age < b.rise_ticks + linger);
    }

    fn spawn<R: Rng>(&mut self, rng: &mut R) {
        let size = if self.size[0] < self.size[1] {
            rng.random_range(self.size[0]..self.size[1])
        } else {
            self.size[0]
        };
        let x_max = (self.area.x - 80.0).max(20.0);
        let top_max = (self.area.y - 120.0).max(30.0);
        let balloon = Balloon {
            id: self.next_id,
            x: rng.random_range(10.0..=x_max),
            size,
            start_y: self.area.y + 40.0,
            target_y: rng.random_range(30.0..=top_max),
            rise_ticks: rng.random_range(self.rise_ticks[0]..=self.rise_ticks[1]),
            age: 0,
        };
        self.next_id += 1;
        self.balloons.push(balloon);
    }

    /// Topmost balloon under `point`
    pub fn hit_test(&self, point: Vec2) -> Option<u32> {
        self.balloons
            .iter()
            .rev()
            .find(|b| b.rect().contains(point))
            .map(|b| b.id)
    }

    /// Pop the balloon with `id`, cancelling its removal
    pub fn pop(&mut self, id: u32) -> PopOutcome {
        if !self.running {
            return PopOutcome::Ignored;
        }
        let Some(index) = self.balloons.iter().position(|b| b.id == id) else {
            return PopOutcome::Ignored;
        };
        self.balloons.remove(index);
        self.popped += 1;
        let compliment = self.compliments.next();

        if self.popped >= self.threshold && self.completion.fire() {
            self.running = false;
            self.balloons.clear();
            return PopOutcome::Completed { compliment };
        }
        PopOutcome::Popped {
            compliment,
            popped: self.popped,
        }
    }

    pub fn pop_at(&mut self, point: Vec2) -> PopOutcome {
        match self.hit_test(point) {
            Some(id) => self.pop(id),
            None => PopOutcome::Ignored,
        }
    }
}

impl Stage for BalloonStage {
    fn name(&self) -> &'static str {
        "balloons"
    }

    fn run(&mut self, on_done: OnDone) {
        self.completion.arm(on_done);
        self.running = !self.completion.is_fired();
        // First balloon right away
        self.since_spawn = self.spawn_ticks.saturating_sub(1);
    }

    fn is_complete(&self) -> bool {
        self.completion.is_fired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use std::cell::Cell;
    use std::rc::Rc;

    fn started(threshold: u32) -> (BalloonStage, Rc<Cell<u32>>, Pcg32) {
        let tuning = BalloonTuning {
            threshold,
            ..BalloonTuning::default()
        };
        let mut stage = BalloonStage::new(
            &tuning,
            Vec2::new(600.0, 500.0),
            ComplimentQueue::new(["one", "two", "three"]),
        );
        let done = Rc::new(Cell::new(0));
        let d = done.clone();
        stage.run(Box::new(move || d.set(d.get() + 1)));
        (stage, done, Pcg32::seed_from_u64(12))
    }

    fn tick_until_balloon(stage: &mut BalloonStage, rng: &mut Pcg32) -> u32 {
        for _ in 0..1_000 {
            if let Some(b) = stage.balloons().last() {
                return b.id;
            }
            stage.tick(rng);
        }
        panic!("no balloon spawned");
    }

    #[test]
    fn test_idle_until_run() {
        let mut stage = BalloonStage::new(
            &BalloonTuning::default(),
            Vec2::new(600.0, 500.0),
            ComplimentQueue::default(),
        );
        let mut rng = Pcg32::seed_from_u64(1);
        for _ in 0..100 {
            stage.tick(&mut rng);
        }
        assert!(stage.balloons().is_empty());
    }

    #[test]
    fn test_spawns_on_interval() {
        let (mut stage, _, mut rng) = started(7);
        stage.tick(&mut rng);
        assert_eq!(stage.balloons().len(), 1);
        for _ in 0..ms_to_ticks(700) {
            stage.tick(&mut rng);
        }
        assert_eq!(stage.balloons().len(), 2);
    }

    #[test]
    fn test_balloons_rise_then_expire() {
        let (mut stage, _, mut rng) = started(7);
        stage.tick(&mut rng);
        let first = stage.balloons()[0].clone();
        let start = first.pos();
        assert!(start.y > 500.0);

        for _ in 0..10 {
            stage.tick(&mut rng);
        }
        let risen = stage.balloons()[0].pos();
        assert!(risen.y < start.y);

        let lifetime = ms_to_ticks(7800) + ms_to_ticks(200);
        for _ in 0..lifetime {
            stage.tick(&mut rng);
        }
        assert!(stage.balloons().iter().all(|b| b.id != first.id));
    }

    #[test]
    fn test_pop_deals_compliment() {
        let (mut stage, done, mut rng) = started(7);
        let id = tick_until_balloon(&mut stage, &mut rng);
        assert_eq!(
            stage.pop(id),
            PopOutcome::Popped {
                compliment: Some("one".into()),
                popped: 1
            }
        );
        // Same balloon again: already gone
        assert_eq!(stage.pop(id), PopOutcome::Ignored);
        assert_eq!(stage.popped(), 1);
        assert_eq!(done.get(), 0);
    }

    #[test]
    fn test_threshold_completes_exactly_once() {
        let (mut stage, done, mut rng) = started(2);
        let a = tick_until_balloon(&mut stage, &mut rng);
        stage.pop(a);
        let b = tick_until_balloon(&mut stage, &mut rng);

        assert!(matches!(stage.pop(b), PopOutcome::Completed { .. }));
        assert_eq!(done.get(), 1);
        assert!(stage.is_complete());
        assert!(!stage.is_running());

        // Rapid extra clicks after completion
        assert_eq!(stage.pop(b), PopOutcome::Ignored);
        for _ in 0..100 {
            stage.tick(&mut rng);
        }
        assert!(stage.balloons().is_empty());
        assert_eq!(done.get(), 1);
    }

    #[test]
    fn test_compliments_wrap_past_the_end() {
        let (mut stage, done, mut rng) = started(4);
        let mut last = PopOutcome::Ignored;
        for _ in 0..4 {
            let id = tick_until_balloon(&mut stage, &mut rng);
            last = stage.pop(id);
        }
        assert_eq!(
            last,
            PopOutcome::Completed {
                compliment: Some("one".into())
            }
        );
        assert_eq!(done.get(), 1);
    }

    #[test]
    fn test_five_compliments_six_pops() {
        let tuning = BalloonTuning {
            threshold: 6,
            ..BalloonTuning::default()
        };
        let mut stage = BalloonStage::new(
            &tuning,
            Vec2::new(600.0, 500.0),
            ComplimentQueue::new(["c1", "c2", "c3", "c4", "c5"]),
        );
        let done = Rc::new(Cell::new(0));
        let d = done.clone();
        stage.run(Box::new(move || d.set(d.get() + 1)));
        let mut rng = Pcg32::seed_from_u64(4);

        let mut dealt = Vec::new();
        for i in 0..6 {
            let id = tick_until_balloon(&mut stage, &mut rng);
            match stage.pop(id) {
                PopOutcome::Popped { compliment, .. } => {
                    assert!(i < 5);
                    dealt.extend(compliment);
                }
                PopOutcome::Completed { compliment } => {
                    assert_eq!(i, 5);
                    dealt.extend(compliment);
                }
                PopOutcome::Ignored => panic!("pop {} ignored", i),
            }
        }
        assert_eq!(dealt, vec!["c1", "c2", "c3", "c4", "c5", "c1"]);
        assert_eq!(done.get(), 1);
        assert!(stage.is_complete());
    }

    #[test]
    fn test_hit_test_finds_balloon() {
        let (mut stage, _, mut rng) = started(7);
        let id = tick_until_balloon(&mut stage, &mut rng);
        let center = stage.balloons()[0].rect().center();
        assert_eq!(stage.hit_test(center), Some(id));
        assert!(matches!(stage.pop_at(center), PopOutcome::Popped { .. }));
        assert_eq!(stage.pop_at(center), PopOutcome::Ignored);
    }
}
