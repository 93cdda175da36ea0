//! Probe backend for real browsers
//!
//! Images are probed with a detached `<img>`, audio with a metadata-only
//! `<audio>`. The first of load/error settles a one-shot channel; the
//! resolver races that against a `setTimeout`-backed timer.

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use futures::channel::oneshot;
use gloo_timers::future::TimeoutFuture;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{HtmlAudioElement, HtmlImageElement};

use crate::assets::{AssetKind, ProbeBackend, ProbeOutcome};
use crate::error::PlatformError;

type Settle = Rc<RefCell<Option<oneshot::Sender<ProbeOutcome>>>>;

#[derive(Debug, Clone, Copy, Default)]
pub struct WebProbe;

impl ProbeBackend for WebProbe {
    fn probe(&self, uri: &str, kind: AssetKind) -> impl Future<Output = ProbeOutcome> {
        let (tx, rx) = oneshot::channel();
        let settle: Settle = Rc::new(RefCell::new(Some(tx)));
        let started = match kind {
            AssetKind::Image => probe_image(uri, &settle),
            AssetKind::Audio => probe_audio(uri, &settle),
        };
        if let Err(e) = &started {
            log::warn!("Could not start probe for {}: {}", uri, e);
        }
        async move {
            if started.is_err() {
                return ProbeOutcome::Failed;
            }
            // A dropped sender means neither event will ever fire
            rx.await.unwrap_or(ProbeOutcome::Failed)
        }
    }

    fn delay(&self, timeout: Duration) -> impl Future<Output = ()> {
        let ms = u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX);
        TimeoutFuture::new(ms)
    }
}

/// Handler that sends `outcome` unless something already settled
fn settle_with(settle: &Settle, outcome: ProbeOutcome) -> wasm_bindgen::JsValue {
    let settle = settle.clone();
    Closure::once_into_js(move || {
        if let Some(tx) = settle.borrow_mut().take() {
            let _ = tx.send(outcome);
        }
    })
}

fn probe_image(uri: &str, settle: &Settle) -> Result<(), PlatformError> {
    let img = HtmlImageElement::new()?;
    let on_load = settle_with(settle, ProbeOutcome::Loaded);
    let on_error = settle_with(settle, ProbeOutcome::Failed);
    img.set_onload(Some(on_load.unchecked_ref()));
    img.set_onerror(Some(on_error.unchecked_ref()));
    img.set_src(uri);
    Ok(())
}

fn probe_audio(uri: &str, settle: &Settle) -> Result<(), PlatformError> {
    let audio = HtmlAudioElement::new()?;
    audio.set_preload("metadata");
    let on_meta = settle_with(settle, ProbeOutcome::Loaded);
    let on_error = settle_with(settle, ProbeOutcome::Failed);
    audio.add_event_listener_with_callback("loadedmetadata", on_meta.unchecked_ref())?;
    audio.add_event_listener_with_callback("error", on_error.unchecked_ref())?;
    audio.set_src(uri);
    Ok(())
}
