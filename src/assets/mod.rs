//! Optional media assets
//!
//! Images and audio are probed with a bounded timeout; anything missing is
//! replaced so the experience never depends on an upload being present.

pub mod fallback;
pub mod resolve;

pub use fallback::{FallbackGenerator, SynthesizedImage};
pub use resolve::{
    AssetDescriptor, AssetKind, AssetPayload, AssetResolver, AssetStatus, ProbeBackend,
    ProbeOutcome, ResolvedAsset, background_sources, probe_with_timeout,
};
