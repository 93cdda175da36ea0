//! Data-driven tuning and content
//!
//! Every gameplay constant lives here so balance changes are data changes.
//! Durations are stored in milliseconds and converted to ticks by callers.

use serde::{Deserialize, Serialize};

use crate::error::TuningError;

/// Evading "no" button
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvasionTuning {
    /// Dodge probability before the first dodge. Starts close to the cap so
    /// the button is shy from the very first approach.
    pub base_probability: f32,
    /// Added to the probability after each successful dodge
    pub step: f32,
    /// Upper bound for the probability (must stay below 1)
    pub cap: f32,
    /// Pointer distance (px) from the button center that triggers a dodge roll
    pub proximity_radius: f32,
    /// Gap (px) kept between the button and the viewport edge
    pub padding: f32,
}

impl Default for EvasionTuning {
    fn default() -> Self {
        Self {
            base_probability: 0.9,
            step: 0.04,
            cap: 0.98,
            proximity_radius: 140.0,
            padding: 12.0,
        }
    }
}

/// Catchable ring
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RingTuning {
    /// Ring edge length (px)
    pub size: f32,
    /// Launch speed (px/tick)
    pub initial_speed: f32,
    /// Hard speed limit (px/tick)
    pub speed_cap: f32,
    /// Speed floor so the ring never comes to rest (px/tick)
    pub min_speed: f32,
    /// Multiplicative velocity damping per tick
    pub friction: f32,
    /// Extra speed added to a component reflected off a wall
    pub wall_kick: f32,
    /// Chance per tick of a random impulse
    pub impulse_chance: f64,
    /// Max magnitude of each impulse component
    pub impulse_strength: f32,
    /// Uncaught rings escape after this long
    pub time_limit_ms: u32,
    /// Duration of the shrink/fade after a catch
    pub shrink_ms: u32,
    /// Particles spawned on catch
    pub catch_burst: usize,
}

impl Default for RingTuning {
    fn default() -> Self {
        Self {
            size: 72.0,
            initial_speed: 5.0,
            speed_cap: 9.0,
            min_speed: 2.0,
            friction: 0.995,
            wall_kick: 0.35,
            impulse_chance: 0.03,
            impulse_strength: 1.5,
            time_limit_ms: 20_000,
            shrink_ms: 400,
            catch_burst: 60,
        }
    }
}

/// Celebration particles
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleTuning {
    /// Downward acceleration (px/tick²)
    pub gravity: f32,
    /// Horizontal velocity range
    pub vel_x: [f32; 2],
    /// Vertical velocity range (negative is up)
    pub vel_y: [f32; 2],
    pub size: [f32; 2],
    /// Lifespan range in ticks
    pub lifespan: [u32; 2],
    /// Spin range (radians/tick)
    pub spin: [f32; 2],
    /// Burst shown behind the proposal card
    pub teaser_count: usize,
    /// Burst shown when the success scene opens
    pub celebration_count: usize,
    /// Periodic burst on the success scene
    pub burst_count: usize,
    pub burst_interval_ms: u32,
}

impl Default for ParticleTuning {
    fn default() -> Self {
        Self {
            gravity: 0.4,
            vel_x: [-6.0, 6.0],
            vel_y: [-14.0, -3.0],
            size: [14.0, 44.0],
            lifespan: [80, 220],
            spin: [-0.12, 0.12],
            teaser_count: 18,
            celebration_count: 120,
            burst_count: 40,
            burst_interval_ms: 1600,
        }
    }
}

/// Balloon-popping stage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BalloonTuning {
    /// Pops required to finish the stage
    pub threshold: u32,
    pub spawn_interval_ms: u32,
    /// Time for a balloon to rise to its resting height
    pub rise_ms: [u32; 2],
    /// How long a balloon lingers after rising before it is removed
    pub linger_ms: u32,
    pub size: [f32; 2],
}

impl Default for BalloonTuning {
    fn default() -> Self {
        Self {
            threshold: 7,
            spawn_interval_ms: 700,
            rise_ms: [4200, 7800],
            linger_ms: 200,
            size: [36.0, 84.0],
        }
    }
}

/// Memory-match stage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryTuning {
    /// One pair of cards per symbol
    pub symbols: Vec<String>,
    /// How long a mismatched pair stays face up
    pub reveal_delay_ms: u32,
}

impl Default for MemoryTuning {
    fn default() -> Self {
        Self {
            symbols: ["💖", "🌹", "💍", "🌙", "⭐", "🎵"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            reveal_delay_ms: 800,
        }
    }
}

/// Asset probing and fallback synthesis
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetTuning {
    /// Per-probe timeout
    pub probe_timeout_ms: u32,
    /// Candidate backgrounds probed at start-up
    pub background_candidates: Vec<String>,
    pub heart_sprite: String,
    pub confetti_sprite: String,
    pub music: String,
    pub interactions: String,
    pub voice: String,
    /// Fallback canvas size
    pub fallback_width: u32,
    pub fallback_height: u32,
    /// Hearts scattered over a fallback background
    pub fallback_hearts: u32,
    /// Faint specks scattered over a fallback background
    pub fallback_specks: u32,
    /// Backgrounds synthesized when no candidate loads
    pub fallback_variants: usize,
    /// Edge length of a synthesized sprite
    pub sprite_size: u32,
}

impl Default for AssetTuning {
    fn default() -> Self {
        Self {
            probe_timeout_ms: 1200,
            background_candidates: (1..=12)
                .map(|i| format!("/images/backgrounds{}.png", i))
                .collect(),
            heart_sprite: "/images/heart.png".into(),
            confetti_sprite: "/images/confetti.png".into(),
            music: "/audios/music.mp3".into(),
            interactions: "/audios/interactions.mp3".into(),
            voice: "/audios/voicemessage.mp3".into(),
            fallback_width: 1200,
            fallback_height: 800,
            fallback_hearts: 24,
            fallback_specks: 200,
            fallback_variants: 4,
            sprite_size: 64,
        }
    }
}

/// Intro scene pacing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntroTuning {
    pub typing_ms_per_char: u32,
    /// Pause between lines, as a multiple of the per-char delay
    pub line_pause_factor: u32,
    pub slideshow_interval_ms: u32,
    /// Horizontal swipe distance (px) that steps the slideshow
    pub swipe_threshold: f32,
    /// Window (ms) in which the secret tap sequence must continue
    pub secret_window_ms: u32,
}

impl Default for IntroTuning {
    fn default() -> Self {
        Self {
            typing_ms_per_char: 26,
            line_pause_factor: 6,
            slideshow_interval_ms: 6000,
            swipe_threshold: 60.0,
            secret_window_ms: 6000,
        }
    }
}

/// Complete tuning set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub evasion: EvasionTuning,
    pub ring: RingTuning,
    pub particles: ParticleTuning,
    pub balloons: BalloonTuning,
    pub memory: MemoryTuning,
    pub assets: AssetTuning,
    pub intro: IntroTuning,
}

impl Tuning {
    /// Parse overrides on top of the defaults, then validate
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning =
            serde_json::from_str(json).map_err(|e| TuningError::Parse(e.to_string()))?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject combinations the simulation cannot honor
    pub fn validate(&self) -> Result<(), TuningError> {
        let e = &self.evasion;
        in_unit_range("evasion.cap", e.cap)?;
        in_unit_range("evasion.base_probability", e.base_probability)?;
        if e.base_probability > e.cap {
            return Err(TuningError::BaseAboveCap {
                base: e.base_probability,
                cap: e.cap,
            });
        }
        if e.step < 0.0 {
            return Err(TuningError::OutOfRange {
                name: "evasion.step",
                value: e.step,
                min: 0.0,
                max: 1.0,
            });
        }
        positive("evasion.proximity_radius", e.proximity_radius)?;

        let r = &self.ring;
        positive("ring.size", r.size)?;
        positive("ring.speed_cap", r.speed_cap)?;
        if r.friction <= 0.0 {
            return Err(TuningError::Zero("ring.friction"));
        }
        in_unit_range("ring.friction", r.friction)?;
        if r.min_speed > r.speed_cap {
            return Err(TuningError::OutOfRange {
                name: "ring.min_speed",
                value: r.min_speed,
                min: 0.0,
                max: r.speed_cap,
            });
        }
        if r.time_limit_ms == 0 {
            return Err(TuningError::Zero("ring.time_limit_ms"));
        }

        if self.balloons.threshold == 0 {
            return Err(TuningError::Zero("balloons.threshold"));
        }
        if self.memory.symbols.is_empty() {
            return Err(TuningError::NoSymbols);
        }

        let a = &self.assets;
        if a.probe_timeout_ms == 0 {
            return Err(TuningError::Zero("assets.probe_timeout_ms"));
        }
        if a.fallback_width == 0 || a.fallback_height == 0 {
            return Err(TuningError::Zero("assets.fallback size"));
        }
        if a.sprite_size == 0 {
            return Err(TuningError::Zero("assets.sprite_size"));
        }
        Ok(())
    }
}

fn in_unit_range(name: &'static str, value: f32) -> Result<(), TuningError> {
    if !(0.0..1.0).contains(&value) {
        return Err(TuningError::OutOfRange {
            name,
            value,
            min: 0.0,
            max: 1.0,
        });
    }
    Ok(())
}

fn positive(name: &'static str, value: f32) -> Result<(), TuningError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(TuningError::Zero(name))
    }
}

/// Copy shown to the user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Content {
    pub title: String,
    pub intro_text: String,
    pub adventure_text: String,
    pub proposal_title: String,
    pub proposal_subtitle: String,
    pub decline_notice: String,
    pub chase_hint: String,
    pub escape_notice: String,
    pub success_text: String,
    pub compliments: Vec<String>,
    pub final_text: String,
    pub secret_message: String,
}

impl Default for Content {
    fn default() -> Self {
        Self {
            title: "Dear you".into(),
            intro_text: "Every moment with you paints my world in brighter colors.\n\
                I love the way you laugh and the way you notice tiny beautiful things.\n\
                I want to make our ordinary days feel extraordinary.\n\nAlways, me"
                .into(),
            adventure_text: "Pick an adventure for us someday: a sunrise hike, a rainy picnic, or a dance in the kitchen.".into(),
            proposal_title: "Will you marry me? 🥹".into(),
            proposal_subtitle: "Through low battery, spotty Wi-Fi, and every sunrise in between?".into(),
            decline_notice: "I understand. Thank you for being honest.".into(),
            chase_hint: "Catch the ring!".into(),
            escape_notice: "The ring slipped away. Try again?".into(),
            success_text: "You said YES! My heart is the luckiest.".into(),
            compliments: [
                "The first time you laughed at my terrible joke.",
                "That rainy picnic where we got soaked and didn't care.",
                "Your hand in mine during the sunset.",
                "How you made my favorite meal taste like home.",
                "The way you dance in the kitchen when no one is watching.",
                "Your morning texts that make the whole day brighter.",
                "When you shared your umbrella and we walked slower on purpose.",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            final_text: "Thank you for playing. I love you ❤️".into(),
            secret_message: "Secret unlocked! I love you more than anything.".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(Tuning::default().validate().is_ok());
        assert_eq!(Tuning::default().assets.background_candidates.len(), 12);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "balloons": { "threshold": 6 } }"#).unwrap();
        assert_eq!(tuning.balloons.threshold, 6);
        assert_eq!(tuning.balloons.spawn_interval_ms, 700);
        assert_eq!(tuning.assets.probe_timeout_ms, 1200);
    }

    #[test]
    fn test_cap_of_one_rejected() {
        let err = Tuning::from_json(r#"{ "evasion": { "cap": 1.0 } }"#).unwrap_err();
        assert!(matches!(err, TuningError::OutOfRange { name: "evasion.cap", .. }));
    }

    #[test]
    fn test_base_above_cap_rejected() {
        let mut tuning = Tuning::default();
        tuning.evasion.base_probability = 0.9;
        tuning.evasion.cap = 0.8;
        assert!(matches!(
            tuning.validate(),
            Err(TuningError::BaseAboveCap { .. })
        ));
    }

    #[test]
    fn test_bad_json_is_parse_error() {
        assert!(matches!(
            Tuning::from_json("{ not json"),
            Err(TuningError::Parse(_))
        ));
    }
}
