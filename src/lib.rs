//! Proposal Stage - an animated browser proposal with mini-games
//!
//! Core modules:
//! - `assets`: Bounded-time asset probing and procedural fallbacks
//! - `scene`: Single-active-scene manager and the scene state machine
//! - `sim`: Per-tick simulation (catchable ring, evading button, particles)
//! - `stages`: Reward mini-games and their sequential orchestrator
//! - `ui`: Intro helpers (typewriter, slideshow, secret taps)
//! - `platform`: Browser-only glue (DOM host, probes, storage)
//! - `tuning`: Data-driven gameplay constants

pub mod assets;
pub mod audio;
pub mod error;
pub mod persistence;
pub mod platform;
pub mod scene;
pub mod settings;
pub mod sim;
pub mod stages;
pub mod tuning;
pub mod ui;

pub use error::{FallbackError, PlatformError, TuningError};
pub use settings::{QualityPreset, Settings};
pub use tuning::{Content, Tuning};

use glam::Vec2;

/// Timing constants
pub mod consts {
    /// Fixed simulation timestep (one animation frame at 60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Milliseconds per simulation tick
    pub const TICK_MS: f32 = SIM_DT * 1000.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;
}

/// Convert a duration in milliseconds to whole simulation ticks (at least one)
#[inline]
pub fn ms_to_ticks(ms: u32) -> u32 {
    ((ms as f32 / consts::TICK_MS).round() as u32).max(1)
}

/// Axis-aligned rectangle in screen space (origin top-left, y down)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(min: Vec2, size: Vec2) -> Self {
        Self { min, size }
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.min + self.size * 0.5
    }

    /// Inclusive point containment
    pub fn contains(&self, p: Vec2) -> bool {
        let max = self.max();
        p.x >= self.min.x && p.x <= max.x && p.y >= self.min.y && p.y <= max.y
    }

    /// Rectangle of the same center scaled by `factor`
    pub fn scaled(&self, factor: f32) -> Self {
        let size = self.size * factor;
        Self::new(self.center() - size * 0.5, size)
    }
}

/// Largest top-left coordinate that keeps an item of `item` size inside `area`
#[inline]
pub fn max_origin(area: Vec2, item: Vec2) -> Vec2 {
    (area - item).max(Vec2::ZERO)
}
