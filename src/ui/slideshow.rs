/// Background slideshow: steps on a timer, or on a horizontal swipe
#[derive(Debug, Clone)]
pub struct Slideshow {
    len: usize,
    index: usize,
    interval_ms: f64,
    elapsed_ms: f64,
    swipe_threshold: f32,
    touch_start_x: Option<f32>,
}

impl Slideshow {
    pub fn new(len: usize, interval_ms: u32, swipe_threshold: f32) -> Self {
        Self {
            len,
            index: 0,
            interval_ms: f64::from(interval_ms.max(1)),
            elapsed_ms: 0.0,
            swipe_threshold,
            touch_start_x: None,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Advance the timer; returns the new slide when it changes
    pub fn advance(&mut self, elapsed_ms: f64) -> Option<usize> {
        if self.len < 2 {
            return None;
        }
        self.elapsed_ms += elapsed_ms.max(0.0);
        if self.elapsed_ms < self.interval_ms {
            return None;
        }
        self.elapsed_ms %= self.interval_ms;
        Some(self.step(1))
    }

    pub fn touch_start(&mut self, x: f32) {
        self.touch_start_x = Some(x);
    }

    /// Swipe left shows the next slide, right the previous one.
    /// A swipe restarts the timer.
    pub fn touch_end(&mut self, x: f32) -> Option<usize> {
        let start = self.touch_start_x.take()?;
        let dx = x - start;
        if dx.abs() <= self.swipe_threshold || self.len < 2 {
            return None;
        }
        self.elapsed_ms = 0.0;
        Some(if dx < 0.0 { self.step(1) } else { self.step(-1) })
    }

    fn step(&mut self, delta: isize) -> usize {
        let len = self.len as isize;
        self.index = (self.index as isize + delta).rem_euclid(len) as usize;
        self.index
    }
}
