//! Audio: optional media tracks plus synthesized cues
//!
//! Tracks (music, interaction sound, voice message) are optional uploads.
//! A missing track disables its control, except the interaction sound which
//! falls back to a synthesized chime. Playback refused by the browser's
//! autoplay policy is parked in a `PlaybackGate` and retried on the next
//! user gesture. While music plays, an analyser feeds a small spectrum
//! display laid out by `spectrum_bars`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::assets::ResolvedAsset;
use crate::tuning::AssetTuning;

/// Optional media tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Track {
    Music,
    Interactions,
    Voice,
}

impl Track {
    pub const ALL: [Track; 3] = [Track::Music, Track::Interactions, Track::Voice];

    pub fn as_str(&self) -> &'static str {
        match self {
            Track::Music => "music",
            Track::Interactions => "interactions",
            Track::Voice => "voice",
        }
    }

    /// Configured source path for this track
    pub fn uri<'a>(&self, tuning: &'a AssetTuning) -> &'a str {
        match self {
            Track::Music => &tuning.music,
            Track::Interactions => &tuning.interactions,
            Track::Voice => &tuning.voice,
        }
    }
}

/// Procedurally generated sound cues
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    /// Stand-in for a missing interaction sound
    Chime,
    /// Balloon popped
    Pop,
    /// Ring caught
    Catch,
    /// Memory cards matched
    Match,
    /// Memory cards mismatched
    Miss,
    /// Stage or proposal complete
    Fanfare,
}

/// How a track request is honored
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Playback {
    /// Play the confirmed media file
    Element(String),
    /// Play a synthesized cue instead
    Synth(Cue),
    /// Nothing to play; the control is disabled
    Disabled,
}

/// Which tracks were confirmed by asset resolution
#[derive(Debug, Clone, Default)]
pub struct TrackSet {
    music: Option<String>,
    interactions: Option<String>,
    voice: Option<String>,
}

impl TrackSet {
    /// Pick the confirmed audio sources out of a resolution result
    pub fn from_resolved(resolved: &[ResolvedAsset], tuning: &AssetTuning) -> Self {
        let confirmed = |track: Track| {
            let uri = track.uri(tuning);
            resolved
                .iter()
                .find(|r| r.descriptor.uri == uri && r.is_original())
                .map(|_| uri.to_string())
        };
        let set = Self {
            music: confirmed(Track::Music),
            interactions: confirmed(Track::Interactions),
            voice: confirmed(Track::Voice),
        };
        for track in Track::ALL {
            if set.source(track).is_none() {
                log::warn!("Audio track {} unavailable", track.as_str());
            }
        }
        set
    }

    pub fn source(&self, track: Track) -> Option<&str> {
        match track {
            Track::Music => self.music.as_deref(),
            Track::Interactions => self.interactions.as_deref(),
            Track::Voice => self.voice.as_deref(),
        }
    }

    pub fn is_available(&self, track: Track) -> bool {
        self.source(track).is_some()
    }

    pub fn playback(&self, track: Track) -> Playback {
        match (self.source(track), track) {
            (Some(src), _) => Playback::Element(src.to_string()),
            (None, Track::Interactions) => Playback::Synth(Cue::Chime),
            (None, _) => Playback::Disabled,
        }
    }
}

/// Holds playback requests the browser refused until a user gesture
#[derive(Debug, Clone, Default)]
pub struct PlaybackGate {
    pending: Vec<Track>,
    gestures: u32,
}

impl PlaybackGate {
    /// Park a refused request (deduplicated)
    pub fn blocked(&mut self, track: Track) {
        if !self.pending.contains(&track) {
            log::warn!("Playback of {} blocked; waiting for a gesture", track.as_str());
            self.pending.push(track);
        }
    }

    /// The user stopped a track before it ever played
    pub fn cancel(&mut self, track: Track) {
        self.pending.retain(|t| *t != track);
    }

    /// Drain parked requests in the order they were refused
    pub fn on_gesture(&mut self) -> Vec<Track> {
        self.gestures += 1;
        std::mem::take(&mut self.pending)
    }

    pub fn pending(&self) -> &[Track] {
        &self.pending
    }

    pub fn gestures(&self) -> u32 {
        self.gestures
    }
}

/// FFT size of the music analyser; yields half as many frequency bins
pub const SPECTRUM_FFT_SIZE: u32 = 256;

/// One bottom-aligned bar of the music spectrum, in canvas pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrumBar {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub alpha: f32,
}

/// Lay out byte frequency levels as bars across a canvas of `size`
///
/// Bars are 1.5x the even share of the width, so the quiet upper bins fall
/// off the right edge and are skipped.
pub fn spectrum_bars(levels: &[u8], size: Vec2) -> Vec<SpectrumBar> {
    if levels.is_empty() || size.x <= 0.0 || size.y <= 0.0 {
        return Vec::new();
    }
    let stride = size.x / levels.len() as f32 * 1.5;
    levels
        .iter()
        .enumerate()
        .map(|(i, level)| (i as f32 * stride, f32::from(*level) / 255.0))
        .take_while(|(x, _)| *x < size.x)
        .map(|(x, v)| {
            let height = (v * size.y * 1.2).min(size.y);
            SpectrumBar {
                x,
                y: size.y - height,
                width: stride * 0.9,
                height,
                alpha: 0.6 + v * 0.4,
            }
        })
        .collect()
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    use wasm_bindgen::JsValue;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{
        AnalyserNode, AudioContext, GainNode, HtmlAudioElement, OscillatorNode, OscillatorType,
    };

    use super::{Cue, Playback, PlaybackGate, Track, TrackSet, SPECTRUM_FFT_SIZE};
    use crate::settings::Settings;

    /// Browser audio: media elements for tracks, WebAudio oscillators for cues
    pub struct AudioManager {
        ctx: Option<AudioContext>,
        elements: HashMap<Track, HtmlAudioElement>,
        tracks: TrackSet,
        gate: Rc<RefCell<PlaybackGate>>,
        analyser: Option<AnalyserNode>,
        sfx_gain: f32,
        music_gain: f32,
    }

    impl AudioManager {
        pub fn new(tracks: TrackSet, settings: &Settings) -> Self {
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - synthesized cues disabled");
            }

            let mut elements = HashMap::new();
            for track in Track::ALL {
                let Some(src) = tracks.source(track) else {
                    continue;
                };
                match HtmlAudioElement::new_with_src(src) {
                    Ok(el) => {
                        el.set_preload("none");
                        el.set_loop(track == Track::Music);
                        elements.insert(track, el);
                    }
                    Err(e) => log::warn!("Audio element for {} failed: {:?}", track.as_str(), e),
                }
            }

            let mut manager = Self {
                ctx,
                elements,
                tracks,
                gate: Rc::new(RefCell::new(PlaybackGate::default())),
                analyser: None,
                sfx_gain: 0.0,
                music_gain: 0.0,
            };
            manager.apply_settings(settings);
            manager
        }

        pub fn apply_settings(&mut self, settings: &Settings) {
            self.sfx_gain = settings.sfx_gain();
            self.music_gain = settings.music_gain();
            for (track, el) in &self.elements {
                let gain = if *track == Track::Music {
                    self.music_gain
                } else {
                    self.sfx_gain
                };
                el.set_volume(f64::from(gain));
            }
        }

        pub fn is_available(&self, track: Track) -> bool {
            self.elements.contains_key(&track)
        }

        pub fn is_playing(&self, track: Track) -> bool {
            self.elements.get(&track).is_some_and(|el| !el.paused())
        }

        /// Play a track, or its synthesized stand-in. Everything but music
        /// restarts from the beginning.
        pub fn play(&self, track: Track) {
            match self.tracks.playback(track) {
                Playback::Element(_) => {
                    if let Some(el) = self.elements.get(&track) {
                        if track != Track::Music {
                            el.set_current_time(0.0);
                        }
                        self.start_element(track, el.clone());
                    }
                }
                Playback::Synth(cue) => self.cue(cue),
                Playback::Disabled => log::debug!("{} disabled", track.as_str()),
            }
        }

        /// Play/pause toggle; returns whether the track is now playing
        pub fn toggle(&self, track: Track) -> bool {
            let Some(el) = self.elements.get(&track) else {
                return false;
            };
            if el.paused() && !self.gate.borrow().pending().contains(&track) {
                self.start_element(track, el.clone());
                true
            } else {
                el.pause().ok();
                self.gate.borrow_mut().cancel(track);
                false
            }
        }

        /// Route music through an analyser for the spectrum display
        ///
        /// A media element can only be captured once, so this is a no-op after
        /// the first success. Returns whether spectrum data is available.
        pub fn attach_visualizer(&mut self) -> bool {
            if self.analyser.is_some() {
                return true;
            }
            let (Some(ctx), Some(music)) = (&self.ctx, self.elements.get(&Track::Music)) else {
                return false;
            };
            match connect_analyser(ctx, music) {
                Ok(analyser) => {
                    log::info!(
                        "Music visualizer attached ({} bins)",
                        analyser.frequency_bin_count()
                    );
                    self.analyser = Some(analyser);
                    true
                }
                Err(e) => {
                    log::warn!("Music visualizer unavailable: {:?}", e);
                    false
                }
            }
        }

        /// Fill `levels` with the current music spectrum
        pub fn spectrum(&self, levels: &mut Vec<u8>) -> bool {
            let Some(analyser) = &self.analyser else {
                return false;
            };
            levels.resize(analyser.frequency_bin_count() as usize, 0);
            analyser.get_byte_frequency_data(levels);
            true
        }

        fn start_element(&self, track: Track, el: HtmlAudioElement) {
            let promise = match el.play() {
                Ok(p) => p,
                Err(e) => {
                    log::warn!("play() threw for {}: {:?}", track.as_str(), e);
                    self.gate.borrow_mut().blocked(track);
                    return;
                }
            };
            let gate = self.gate.clone();
            wasm_bindgen_futures::spawn_local(async move {
                if JsFuture::from(promise).await.is_err() {
                    gate.borrow_mut().blocked(track);
                }
            });
        }

        /// Call from every user gesture handler
        pub fn on_gesture(&self) {
            if let Some(ctx) = &self.ctx {
                if ctx.state() == web_sys::AudioContextState::Suspended {
                    let _ = ctx.resume();
                }
            }
            let retry = self.gate.borrow_mut().on_gesture();
            for track in retry {
                if let Some(el) = self.elements.get(&track) {
                    log::info!("Retrying {} after gesture", track.as_str());
                    self.start_element(track, el.clone());
                }
            }
        }

        /// Play a synthesized cue
        pub fn cue(&self, cue: Cue) {
            let vol = self.sfx_gain;
            if vol <= 0.0 {
                return;
            }
            let Some(ctx) = &self.ctx else { return };
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            match cue {
                Cue::Chime => self.arpeggio(ctx, vol, &[880.0, 1320.0], 0.06, OscillatorType::Sine),
                Cue::Pop => self.play_pop(ctx, vol),
                Cue::Catch => {
                    self.arpeggio(ctx, vol, &[660.0, 990.0, 1320.0], 0.05, OscillatorType::Sine)
                }
                Cue::Match => {
                    self.arpeggio(ctx, vol, &[600.0, 800.0, 1000.0], 0.08, OscillatorType::Sine)
                }
                Cue::Miss => self.play_miss(ctx, vol),
                Cue::Fanfare => self.arpeggio(
                    ctx,
                    vol,
                    &[500.0, 600.0, 700.0, 800.0, 1000.0],
                    0.08,
                    OscillatorType::Triangle,
                ),
            }
        }

        /// Create an oscillator with gain envelope
        fn create_osc(
            &self,
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        /// Rising notes, `step` seconds apart
        fn arpeggio(
            &self,
            ctx: &AudioContext,
            vol: f32,
            notes: &[f32],
            step: f64,
            osc_type: OscillatorType,
        ) {
            for (i, freq) in notes.iter().enumerate() {
                let delay = i as f64 * step;
                if let Some((osc, gain)) = self.create_osc(ctx, *freq, osc_type) {
                    let t = ctx.current_time() + delay;
                    gain.gain().set_value_at_time(vol * 0.25, t).ok();
                    gain.gain()
                        .exponential_ramp_to_value_at_time(0.01, t + 0.25)
                        .ok();
                    osc.start_with_when(t).ok();
                    osc.stop_with_when(t + 0.3).ok();
                }
            }
        }

        /// Balloon pop - short bright blip
        fn play_pop(&self, ctx: &AudioContext, vol: f32) {
            let Some((osc, gain)) = self.create_osc(ctx, 900.0, OscillatorType::Triangle) else {
                return;
            };
            let t = ctx.current_time();

            gain.gain().set_value_at_time(vol * 0.35, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.08)
                .ok();
            osc.frequency().set_value_at_time(900.0, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(250.0, t + 0.08)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + 0.1).ok();
        }

        /// Mismatch - soft descending pair
        fn play_miss(&self, ctx: &AudioContext, vol: f32) {
            for (i, freq) in [400.0, 300.0].iter().enumerate() {
                let delay = i as f64 * 0.12;
                if let Some((osc, gain)) = self.create_osc(ctx, *freq, OscillatorType::Sine) {
                    let t = ctx.current_time() + delay;
                    gain.gain().set_value_at_time(vol * 0.2, t).ok();
                    gain.gain()
                        .exponential_ramp_to_value_at_time(0.01, t + 0.2)
                        .ok();
                    osc.start_with_when(t).ok();
                    osc.stop_with_when(t + 0.25).ok();
                }
            }
        }
    }

    /// music element -> analyser -> speakers
    fn connect_analyser(
        ctx: &AudioContext,
        music: &HtmlAudioElement,
    ) -> Result<AnalyserNode, JsValue> {
        let source = ctx.create_media_element_source(music)?;
        let analyser = ctx.create_analyser()?;
        analyser.set_fft_size(SPECTRUM_FFT_SIZE);
        source.connect_with_audio_node(&analyser)?;
        analyser.connect_with_audio_node(&ctx.destination())?;
        Ok(analyser)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetDescriptor, AssetKind, AssetPayload, AssetStatus};

    fn resolved(uri: &str, loaded: bool) -> ResolvedAsset {
        let mut descriptor = AssetDescriptor::new(uri, AssetKind::Audio);
        let status = if loaded {
            AssetStatus::Confirmed
        } else {
            AssetStatus::Missing
        };
        descriptor.settle(status);
        ResolvedAsset {
            descriptor,
            payload: if loaded {
                AssetPayload::Original(uri.to_string())
            } else {
                AssetPayload::Silent
            },
        }
    }

    #[test]
    fn test_missing_interactions_fall_back_to_chime() {
        let tuning = AssetTuning::default();
        let set = TrackSet::from_resolved(
            &[
                resolved(&tuning.music, true),
                resolved(&tuning.interactions, false),
                resolved(&tuning.voice, false),
            ],
            &tuning,
        );
        assert_eq!(
            set.playback(Track::Music),
            Playback::Element(tuning.music.clone())
        );
        assert_eq!(set.playback(Track::Interactions), Playback::Synth(Cue::Chime));
        assert_eq!(set.playback(Track::Voice), Playback::Disabled);
        assert!(!set.is_available(Track::Voice));
    }

    #[test]
    fn test_unprobed_track_is_unavailable() {
        let set = TrackSet::from_resolved(&[], &AssetTuning::default());
        assert!(Track::ALL.iter().all(|t| !set.is_available(*t)));
    }

    #[test]
    fn test_gate_queues_until_gesture() {
        let mut gate = PlaybackGate::default();
        gate.blocked(Track::Music);
        gate.blocked(Track::Voice);
        gate.blocked(Track::Music);
        assert_eq!(gate.pending(), &[Track::Music, Track::Voice]);

        assert_eq!(gate.on_gesture(), vec![Track::Music, Track::Voice]);
        assert!(gate.pending().is_empty());
        assert!(gate.on_gesture().is_empty());
        assert_eq!(gate.gestures(), 2);
    }

    #[test]
    fn test_gate_cancel() {
        let mut gate = PlaybackGate::default();
        gate.blocked(Track::Music);
        gate.cancel(Track::Music);
        assert!(gate.on_gesture().is_empty());
    }

    #[test]
    fn test_spectrum_bars_fit_canvas() {
        let levels = vec![255u8; (SPECTRUM_FFT_SIZE / 2) as usize];
        let size = Vec2::new(300.0, 48.0);
        let bars = spectrum_bars(&levels, size);

        // 1.5x stride leaves the upper third of the bins off-canvas
        assert_eq!(bars.len(), 86);
        for bar in &bars {
            assert!(bar.x < size.x);
            assert_eq!(bar.height, size.y);
            assert_eq!(bar.y, 0.0);
            assert!((bar.alpha - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_silent_spectrum_is_flat() {
        let bars = spectrum_bars(&[0, 0, 0, 0], Vec2::new(100.0, 40.0));
        assert_eq!(bars.len(), 3);
        assert!(bars.iter().all(|b| b.height == 0.0 && b.y == 40.0));
        assert!(bars.iter().all(|b| (b.alpha - 0.6).abs() < 1e-6));
    }

    #[test]
    fn test_spectrum_of_nothing() {
        assert!(spectrum_bars(&[], Vec2::new(100.0, 40.0)).is_empty());
        assert!(spectrum_bars(&[128; 8], Vec2::ZERO).is_empty());
    }
}
