//! The evading "no" button
//!
//! Not continuously simulated. Each pointer move or touch start near the
//! button rolls against the current evasion probability; a successful roll
//! teleports the button and makes it a little shyer.

use glam::Vec2;
use rand::Rng;

use crate::Rect;
use crate::tuning::EvasionTuning;

/// How the button reacted to a pointer/touch
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerResponse {
    /// Pointer outside the proximity radius
    OutOfRange,
    /// In range, but the roll failed
    Stayed,
    /// Teleported to a new top-left position
    Dodged { to: Vec2 },
}

#[derive(Debug, Clone)]
pub struct EvadingButton {
    /// Top-left corner
    pub pos: Vec2,
    pub size: Vec2,
    pub viewport: Vec2,
    probability: f32,
    dodges: u32,
    step: f32,
    cap: f32,
    proximity_radius: f32,
    padding: f32,
}

impl EvadingButton {
    pub fn new(tuning: &EvasionTuning, pos: Vec2, size: Vec2, viewport: Vec2) -> Self {
        // Never reach certainty, whatever the tuning says
        let cap = tuning.cap.min(1.0 - f32::EPSILON);
        Self {
            pos,
            size,
            viewport,
            probability: tuning.base_probability.min(cap),
            dodges: 0,
            step: tuning.step.max(0.0),
            cap,
            proximity_radius: tuning.proximity_radius,
            padding: tuning.padding,
        }
    }

    pub fn probability(&self) -> f32 {
        self.probability
    }

    pub fn dodges(&self) -> u32 {
        self.dodges
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.pos, self.size)
    }

    pub fn center(&self) -> Vec2 {
        self.rect().center()
    }

    /// Valid top-left positions: `[min, max]` on each axis
    pub fn placement_bounds(&self) -> (Vec2, Vec2) {
        let min = Vec2::splat(self.padding);
        let max = (self.viewport - self.size - Vec2::splat(self.padding)).max(min);
        (min, max)
    }

    pub fn resize(&mut self, viewport: Vec2) {
        self.viewport = viewport;
        let (min, max) = self.placement_bounds();
        self.pos = self.pos.clamp(min, max);
    }

    pub fn on_pointer_move<R: Rng>(&mut self, point: Vec2, rng: &mut R) -> PointerResponse {
        if point.distance(self.center()) > self.proximity_radius {
            return PointerResponse::OutOfRange;
        }
        if rng.random::<f32>() >= self.probability {
            return PointerResponse::Stayed;
        }

        let to = self.teleport(rng);
        self.dodges += 1;
        self.probability = (self.probability + self.step).min(self.cap);
        log::debug!(
            "Button dodged to ({:.0}, {:.0}), evasion now {:.2}",
            to.x,
            to.y,
            self.probability
        );
        PointerResponse::Dodged { to }
    }

    /// Touch devices get the same treatment as a pointer move
    pub fn on_touch_start<R: Rng>(&mut self, point: Vec2, rng: &mut R) -> PointerResponse {
        self.on_pointer_move(point, rng)
    }

    /// Uniformly random position fully inside the viewport
    fn teleport<R: Rng>(&mut self, rng: &mut R) -> Vec2 {
        let (min, max) = self.placement_bounds();
        self.pos = Vec2::new(
            rng.random_range(min.x..=max.x),
            rng.random_range(min.y..=max.y),
        );
        self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn button() -> EvadingButton {
        EvadingButton::new(
            &EvasionTuning::default(),
            Vec2::new(200.0, 200.0),
            Vec2::new(120.0, 48.0),
            Vec2::new(800.0, 600.0),
        )
    }

    #[test]
    fn test_far_pointer_ignored() {
        let mut b = button();
        let mut rng = Pcg32::seed_from_u64(1);
        assert_eq!(
            b.on_pointer_move(Vec2::new(790.0, 590.0), &mut rng),
            PointerResponse::OutOfRange
        );
        assert_eq!(b.dodges(), 0);
    }

    #[test]
    fn test_dodge_lands_inside_viewport() {
        let mut b = button();
        let mut rng = Pcg32::seed_from_u64(2);
        let mut dodged = 0;
        for _ in 0..500 {
            let center = b.center();
            if let PointerResponse::Dodged { to } = b.on_pointer_move(center, &mut rng) {
                dodged += 1;
                assert!(to.x >= 12.0 && to.y >= 12.0);
                assert!(to.x + b.size.x <= 800.0 - 12.0);
                assert!(to.y + b.size.y <= 600.0 - 12.0);
            }
        }
        assert!(dodged > 0);
        assert_eq!(b.dodges(), dodged);
    }

    #[test]
    fn test_probability_reaches_cap_but_not_one() {
        let mut b = button();
        let mut rng = Pcg32::seed_from_u64(3);
        for _ in 0..1_000 {
            let center = b.center();
            b.on_pointer_move(center, &mut rng);
        }
        assert!((b.probability() - EvasionTuning::default().cap).abs() < 1e-6);
    }

    #[test]
    fn test_first_approach_usually_dodges() {
        let dodged = (0..1_000u64)
            .filter(|seed| {
                let mut b = button();
                let mut rng = Pcg32::seed_from_u64(*seed);
                let center = b.center();
                matches!(b.on_pointer_move(center, &mut rng), PointerResponse::Dodged { .. })
            })
            .count();
        assert!(dodged >= 850, "only {} of 1000 first approaches dodged", dodged);
        assert!(dodged < 1_000);
    }

    #[test]
    fn test_persistent_user_can_still_reach() {
        let mut b = button();
        let mut rng = Pcg32::seed_from_u64(4);
        let stayed = (0..2_000)
            .filter(|_| {
                let center = b.center();
                b.on_pointer_move(center, &mut rng) == PointerResponse::Stayed
            })
            .count();
        assert!(stayed > 0);
    }

    #[test]
    fn test_cap_of_one_is_clamped() {
        let tuning = EvasionTuning {
            base_probability: 1.0,
            cap: 1.0,
            ..EvasionTuning::default()
        };
        let b = EvadingButton::new(&tuning, Vec2::ZERO, Vec2::splat(10.0), Vec2::splat(100.0));
        assert!(b.probability() < 1.0);
    }

    #[test]
    fn test_tiny_viewport_pins_to_padding() {
        let mut b = button();
        b.resize(Vec2::new(50.0, 30.0));
        assert_eq!(b.pos, Vec2::splat(12.0));
        let mut rng = Pcg32::seed_from_u64(5);
        for _ in 0..50 {
            let center = b.center();
            if let PointerResponse::Dodged { to } = b.on_touch_start(center, &mut rng) {
                assert_eq!(to, Vec2::splat(12.0));
            }
        }
    }

    proptest! {
        #[test]
        fn prop_probability_monotonic_and_capped(
            seed in any::<u64>(),
            moves in proptest::collection::vec((0.0f32..800.0, 0.0f32..600.0), 1..200),
        ) {
            let mut b = button();
            let mut rng = Pcg32::seed_from_u64(seed);
            let cap = EvasionTuning::default().cap;
            let mut last = b.probability();
            for (x, y) in moves {
                b.on_pointer_move(Vec2::new(x, y), &mut rng);
                prop_assert!(b.probability() >= last);
                prop_assert!(b.probability() <= cap);
                last = b.probability();
            }
        }
    }
}
