//! Bounded-time asset resolution
//!
//! Every candidate is probed once and raced against a timer. Whichever
//! settles first decides the verdict; a probe that times out can never flip
//! the verdict afterwards. Failures and timeouts both mean "missing", and a
//! missing image is always replaced by a procedural fallback.

use std::collections::HashMap;
use std::future::Future;
use std::pin::pin;
use std::time::Duration;

use futures::StreamExt;
use futures::future::{Either, select};
use futures::stream::FuturesUnordered;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::fallback::{FallbackGenerator, SynthesizedImage, variant_at};
use crate::tuning::AssetTuning;

/// Media type of a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    Image,
    Audio,
}

/// Resolution status; leaves `Unresolved` exactly once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetStatus {
    Unresolved,
    Confirmed,
    Missing,
}

/// One candidate being resolved
#[derive(Debug, Clone, PartialEq)]
pub struct AssetDescriptor {
    pub uri: String,
    pub kind: AssetKind,
    status: AssetStatus,
}

impl AssetDescriptor {
    pub fn new(uri: impl Into<String>, kind: AssetKind) -> Self {
        Self {
            uri: uri.into(),
            kind,
            status: AssetStatus::Unresolved,
        }
    }

    pub fn status(&self) -> AssetStatus {
        self.status
    }

    /// Record a terminal verdict. Only the first settle counts.
    pub fn settle(&mut self, verdict: AssetStatus) -> bool {
        if self.status != AssetStatus::Unresolved || verdict == AssetStatus::Unresolved {
            return false;
        }
        self.status = verdict;
        true
    }
}

/// Raw result of a single probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Loaded,
    Failed,
}

/// Platform hooks for probing and waiting
pub trait ProbeBackend {
    /// Start loading `uri`; resolves once the resource loads or errors
    fn probe(&self, uri: &str, kind: AssetKind) -> impl Future<Output = ProbeOutcome>;

    /// Resolves after `timeout`
    fn delay(&self, timeout: Duration) -> impl Future<Output = ()>;
}

/// Race one probe against the timer
pub async fn probe_with_timeout<B: ProbeBackend>(
    backend: &B,
    uri: &str,
    kind: AssetKind,
    timeout: Duration,
) -> AssetStatus {
    let probe = pin!(backend.probe(uri, kind));
    let timer = pin!(backend.delay(timeout));
    match select(probe, timer).await {
        Either::Left((ProbeOutcome::Loaded, _)) => AssetStatus::Confirmed,
        Either::Left((ProbeOutcome::Failed, _)) => AssetStatus::Missing,
        Either::Right(((), _)) => {
            log::debug!("Probe timed out: {}", uri);
            AssetStatus::Missing
        }
    }
}

/// What the caller receives for a candidate
#[derive(Debug, Clone, PartialEq)]
pub enum AssetPayload {
    /// The original resource loaded
    Original(String),
    /// Missing image replaced by a procedural one
    Synthesized(SynthesizedImage),
    /// Missing audio; playback controls should be disabled
    Silent,
}

/// Final verdict plus payload for one candidate
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAsset {
    pub descriptor: AssetDescriptor,
    pub payload: AssetPayload,
}

impl ResolvedAsset {
    /// URI to hand to an `<img>`/`<audio>` element, if any
    pub fn source(&self) -> Option<String> {
        match &self.payload {
            AssetPayload::Original(uri) => Some(uri.clone()),
            AssetPayload::Synthesized(img) => Some(img.data_url()),
            AssetPayload::Silent => None,
        }
    }

    pub fn is_original(&self) -> bool {
        matches!(self.payload, AssetPayload::Original(_))
    }
}

/// Probes candidates and substitutes fallbacks
pub struct AssetResolver<B> {
    backend: B,
    timeout: Duration,
    fallback: FallbackGenerator,
    /// Missing images beyond this count reuse earlier synthesized images
    distinct_fallbacks: usize,
}

impl<B: ProbeBackend> AssetResolver<B> {
    pub fn new(backend: B, tuning: &AssetTuning) -> Self {
        Self {
            backend,
            timeout: Duration::from_millis(tuning.probe_timeout_ms as u64),
            fallback: FallbackGenerator::from_tuning(tuning),
            distinct_fallbacks: tuning.fallback_variants.max(1),
        }
    }

    pub fn with_fallback(mut self, fallback: FallbackGenerator) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn fallback(&self) -> &FallbackGenerator {
        &self.fallback
    }

    /// Resolve every candidate within bounded time.
    ///
    /// Probes run concurrently; `on_progress(settled, total)` fires after each
    /// verdict. Results come back in candidate order.
    pub async fn resolve<R, F>(
        &self,
        candidates: &[(String, AssetKind)],
        rng: &mut R,
        on_progress: F,
    ) -> Vec<ResolvedAsset>
    where
        R: Rng,
        F: FnMut(usize, usize),
    {
        let descriptors = self.probe_all(candidates, on_progress).await;
        self.substitute(descriptors, rng)
    }

    /// Probe every candidate and return the settled descriptors in order
    pub async fn probe_all<F>(
        &self,
        candidates: &[(String, AssetKind)],
        mut on_progress: F,
    ) -> Vec<AssetDescriptor>
    where
        F: FnMut(usize, usize),
    {
        let total = candidates.len();
        let mut descriptors: Vec<AssetDescriptor> = candidates
            .iter()
            .map(|(uri, kind)| AssetDescriptor::new(uri.clone(), *kind))
            .collect();

        let mut pending: FuturesUnordered<_> = candidates
            .iter()
            .enumerate()
            .map(|(i, (uri, kind))| async move {
                let verdict = probe_with_timeout(&self.backend, uri, *kind, self.timeout).await;
                (i, verdict)
            })
            .collect();

        let mut settled = 0;
        while let Some((i, verdict)) = pending.next().await {
            if descriptors[i].settle(verdict) {
                settled += 1;
                on_progress(settled, total);
            }
        }
        descriptors
    }

    /// Attach payloads: originals for confirmed assets, procedural
    /// backgrounds for missing images, silence for missing audio
    pub fn substitute<R: Rng>(
        &self,
        descriptors: Vec<AssetDescriptor>,
        rng: &mut R,
    ) -> Vec<ResolvedAsset> {
        let missing_images = descriptors
            .iter()
            .filter(|d| d.kind == AssetKind::Image && d.status() != AssetStatus::Confirmed)
            .count();
        let distinct = missing_images.min(self.distinct_fallbacks);
        let mut synthesized: HashMap<usize, SynthesizedImage> = HashMap::new();
        let mut missing_index = 0;

        descriptors
            .into_iter()
            .map(|descriptor| {
                let payload = match (descriptor.status(), descriptor.kind) {
                    (AssetStatus::Confirmed, _) => {
                        log::debug!("Asset confirmed: {}", descriptor.uri);
                        AssetPayload::Original(descriptor.uri.clone())
                    }
                    (_, AssetKind::Image) => {
                        log::warn!("Image missing, using procedural fallback: {}", descriptor.uri);
                        let slot = missing_index % distinct.max(1);
                        missing_index += 1;
                        let img = synthesized
                            .entry(slot)
                            .or_insert_with(|| {
                                self.fallback.background(variant_at(slot, distinct), rng)
                            })
                            .clone();
                        AssetPayload::Synthesized(img)
                    }
                    (_, AssetKind::Audio) => {
                        log::warn!("Audio missing, control disabled: {}", descriptor.uri);
                        AssetPayload::Silent
                    }
                };
                ResolvedAsset {
                    descriptor,
                    payload,
                }
            })
            .collect()
    }
}

/// Backgrounds to show: the confirmed originals, or the distinct fallbacks if none loaded
pub fn background_sources(resolved: &[ResolvedAsset]) -> Vec<String> {
    let originals: Vec<String> = resolved
        .iter()
        .filter(|r| r.is_original())
        .filter_map(ResolvedAsset::source)
        .collect();
    if !originals.is_empty() {
        return originals;
    }

    let mut sources: Vec<String> = Vec::new();
    for source in resolved.iter().filter_map(ResolvedAsset::source) {
        if !sources.contains(&source) {
            sources.push(source);
        }
    }
    sources
}
