//! Scene management
//!
//! `manager` owns top-level attachment; `flow` decides which scene comes next.

pub mod flow;
pub mod manager;

pub use flow::{Action, Effect, Flow, Notice, ROUTES, Route, Step, route};
pub use manager::{Scene, SceneHost, SceneManager, SceneTag, Teardown};
