use glam::Vec2;

/// Screen regions for the secret tap sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Center,
}

impl Zone {
    /// Outer quarters on both axes are corners; everything else, edge strips
    /// included, counts as center
    pub fn classify(point: Vec2, viewport: Vec2) -> Zone {
        let col = if point.x < viewport.x * 0.25 {
            -1
        } else if point.x > viewport.x * 0.75 {
            1
        } else {
            0
        };
        let row = if point.y < viewport.y * 0.25 {
            -1
        } else if point.y > viewport.y * 0.75 {
            1
        } else {
            0
        };
        match (col, row) {
            (0, 0) => Zone::Center,
            (-1, -1) => Zone::TopLeft,
            (1, -1) => Zone::TopRight,
            (-1, 1) => Zone::BottomLeft,
            (1, 1) => Zone::BottomRight,
            _ => Zone::Center,
        }
    }
}

pub const SEQUENCE: [Zone; 5] = [
    Zone::TopLeft,
    Zone::TopRight,
    Zone::BottomLeft,
    Zone::BottomRight,
    Zone::Center,
];

/// Tracks progress through the corner-tap sequence
#[derive(Debug, Clone)]
pub struct SecretKnock {
    progress: usize,
    last_tap_ms: Option<f64>,
    window_ms: f64,
}

impl SecretKnock {
    pub fn new(window_ms: u32) -> Self {
        Self {
            progress: 0,
            last_tap_ms: None,
            window_ms: f64::from(window_ms),
        }
    }

    pub fn progress(&self) -> usize {
        self.progress
    }

    /// Register a tap; returns true when the sequence completes
    pub fn tap(&mut self, point: Vec2, viewport: Vec2, now_ms: f64) -> bool {
        if self
            .last_tap_ms
            .is_some_and(|last| now_ms - last > self.window_ms)
        {
            self.progress = 0;
        }
        self.last_tap_ms = Some(now_ms);

        let zone = Zone::classify(point, viewport);
        if zone == SEQUENCE[self.progress] {
            self.progress += 1;
        } else {
            self.progress = 0;
        }

        if self.progress == SEQUENCE.len() {
            self.progress = 0;
            log::info!("Secret sequence unlocked");
            return true;
        }
        false
    }
}
