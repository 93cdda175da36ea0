//! Intro scene helpers and the control table
//!
//! Time-driven and input-driven state for the intro card. The browser glue
//! feeds frame deltas and pointer positions in and renders what comes out.

pub mod controls;
pub mod secret;
pub mod slideshow;
pub mod typewriter;

pub use controls::{Control, success_controls};
pub use secret::{SecretKnock, Zone};
pub use slideshow::Slideshow;
pub use typewriter::Typewriter;
