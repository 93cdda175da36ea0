//! Per-tick simulation
//!
//! Everything here is driven by the fixed-timestep loop and must stay pure:
//! - Fixed timestep only (one call per tick)
//! - Seeded RNG passed in by the caller
//! - Explicit `running` flags checked at the top of every tick
//! - No rendering or platform dependencies

pub mod evasion;
pub mod particles;
pub mod ring;

pub use evasion::{EvadingButton, PointerResponse};
pub use particles::{Particle, ParticleKind, ParticleSystem};
pub use ring::{CatchOutcome, Ring, RingEvent, RingPhase};
