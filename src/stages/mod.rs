//! Reward mini-games and their orchestrator
//!
//! A stage is started with a completion callback and invokes it at most once.
//! `run_sequence` chains stages so each one starts when the previous finishes.

pub mod balloons;
pub mod compliments;
pub mod memory;

pub use balloons::{Balloon, BalloonStage, PopOutcome};
pub use compliments::ComplimentQueue;
pub use memory::{Card, CardState, FlipOutcome, MemoryMatchStage};

use std::cell::RefCell;
use std::rc::Rc;

/// Completion callback handed to a stage
pub type OnDone = Box<dyn FnOnce()>;

/// One-shot completion guard
///
/// `fire` only ever invokes the armed callback once, however many times the
/// completion condition is observed.
#[derive(Default)]
pub struct Completion {
    on_done: Option<OnDone>,
    fired: bool,
}

impl Completion {
    pub fn arm(&mut self, on_done: OnDone) {
        if self.fired {
            log::warn!("Completion re-armed after firing; ignoring");
            return;
        }
        self.on_done = Some(on_done);
    }

    /// Returns true only the first time
    pub fn fire(&mut self) -> bool {
        if self.fired {
            return false;
        }
        self.fired = true;
        if let Some(on_done) = self.on_done.take() {
            on_done();
        }
        true
    }

    pub fn is_fired(&self) -> bool {
        self.fired
    }
}

/// A self-contained mini-game with its own completion condition
pub trait Stage {
    fn name(&self) -> &'static str;

    /// Start the stage. `on_done` is invoked at most once.
    fn run(&mut self, on_done: OnDone);

    fn is_complete(&self) -> bool;
}

pub type SharedStage = Rc<RefCell<dyn Stage>>;

/// Run `stages` one after another, then `on_all_done`
pub fn run_sequence(stages: Vec<SharedStage>, on_all_done: OnDone) {
    let start = stages.into_iter().rev().fold(on_all_done, |next, stage| {
        Box::new(move || {
            let mut stage = stage.borrow_mut();
            log::info!("Stage {} started", stage.name());
            stage.run(next);
        }) as OnDone
    });
    start();
}

/// Wraps a stage to report its completion to an observer before moving on
pub struct Announced<S> {
    inner: S,
    observer: Rc<dyn Fn(&'static str)>,
}

impl<S: Stage> Announced<S> {
    pub fn new(inner: S, observer: Rc<dyn Fn(&'static str)>) -> Self {
        Self { inner, observer }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }
}

impl<S: Stage> Stage for Announced<S> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn run(&mut self, on_done: OnDone) {
        let observer = self.observer.clone();
        let name = self.inner.name();
        self.inner.run(Box::new(move || {
            log::info!("Stage {} complete", name);
            observer(name);
            on_done();
        }));
    }

    fn is_complete(&self) -> bool {
        self.inner.is_complete()
    }
}
