//! Error types for the fallible edges of the crate
//!
//! The experience itself never fails: these errors only surface while
//! validating configuration, encoding images, or talking to the browser,
//! and every caller recovers from them locally.

use thiserror::Error;

/// Invalid tuning values
#[derive(Debug, Error, PartialEq)]
pub enum TuningError {
    #[error("invalid tuning JSON: {0}")]
    Parse(String),

    #[error("{name} must be within [{min}, {max}), got {value}")]
    OutOfRange {
        name: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("evasion base probability {base} exceeds its cap {cap}")]
    BaseAboveCap { base: f32, cap: f32 },

    #[error("memory match needs at least one symbol")]
    NoSymbols,
}

/// Procedural image encoding failures
#[derive(Debug, Error)]
pub enum FallbackError {
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// Browser/platform failures
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("no global `{0}` available")]
    Missing(&'static str),

    #[error("JavaScript error: {0}")]
    Js(String),
}

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for PlatformError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        PlatformError::Js(format!("{:?}", value))
    }
}
