//! Best-effort "proposal accepted" flag
//!
//! Stored as a small JSON record in LocalStorage. Failures are logged and
//! otherwise ignored: the experience never depends on this flag.

use serde::{Deserialize, Serialize};

/// Record written when the proposal is accepted
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Acceptance {
    pub accepted: bool,
    /// Unix timestamp (ms) of the acceptance
    pub timestamp: f64,
}

impl Acceptance {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "proposal_stage_accepted";

    pub fn accepted_at(timestamp: f64) -> Self {
        Self {
            accepted: true,
            timestamp,
        }
    }

    /// Parse a stored record; anything unreadable counts as "not accepted"
    pub fn from_json(json: &str) -> Self {
        serde_json::from_str(json).unwrap_or_default()
    }

    /// Load the flag from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let record: Self =
            crate::platform::storage::load_json(Self::STORAGE_KEY).unwrap_or_default();
        if record.accepted {
            log::info!("Proposal previously accepted");
        }
        record
    }

    /// Save the flag to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        if crate::platform::storage::save_json(Self::STORAGE_KEY, self) {
            log::info!("Acceptance saved");
        } else {
            log::warn!("Could not persist acceptance flag");
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
