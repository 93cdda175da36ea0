//! Browser glue
//!
//! Everything here touches web-sys and only exists on wasm32:
//! - `dom`: scene host over the document body, element helpers
//! - `probe`: image/audio probes and timers for asset resolution
//! - `storage`: LocalStorage JSON helpers

#[cfg(target_arch = "wasm32")]
pub mod dom;
#[cfg(target_arch = "wasm32")]
pub mod probe;
#[cfg(target_arch = "wasm32")]
pub mod storage;
