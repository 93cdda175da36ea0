//! Clickable controls routed through `data-action`

use crate::scene::Action;

/// A button the delegated click handler understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Adventure,
    CloseAdventure,
    Yes,
    No,
    Retry,
    Play,
    Skip,
    Music,
    Voice,
    /// Restart the voice message from the top
    ReplayVoice,
    Motion,
}

impl Control {
    pub const ALL: [Control; 12] = [
        Control::Continue,
        Control::Adventure,
        Control::CloseAdventure,
        Control::Yes,
        Control::No,
        Control::Retry,
        Control::Play,
        Control::Skip,
        Control::Music,
        Control::Voice,
        Control::ReplayVoice,
        Control::Motion,
    ];

    /// Value of the `data-action` attribute
    pub fn name(&self) -> &'static str {
        match self {
            Control::Continue => "continue",
            Control::Adventure => "adventure",
            Control::CloseAdventure => "close-adventure",
            Control::Yes => "yes",
            Control::No => "no",
            Control::Retry => "retry",
            Control::Play => "play",
            Control::Skip => "skip",
            Control::Music => "music",
            Control::Voice => "voice",
            Control::ReplayVoice => "replay-voice",
            Control::Motion => "motion",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Control::Continue => "Continue",
            Control::Adventure => "Pick an adventure",
            Control::CloseAdventure => "Back",
            Control::Yes => "Yes! 💍",
            Control::No => "No",
            Control::Retry => "Try again",
            Control::Play => "Play a little game",
            Control::Skip => "Skip",
            Control::Music => "Play music",
            Control::Voice => "▶",
            Control::ReplayVoice => "Play voice message",
            Control::Motion => "Reduce motion",
        }
    }

    /// Scene action, for controls that drive the flow
    pub fn action(&self) -> Option<Action> {
        match self {
            Control::Continue => Some(Action::Continue),
            Control::Adventure => Some(Action::OpenAdventure),
            Control::CloseAdventure => Some(Action::CloseAdventure),
            Control::Yes => Some(Action::Accept),
            Control::No => Some(Action::Decline),
            Control::Retry => Some(Action::Retry),
            Control::Play => Some(Action::Play),
            Control::Skip
            | Control::Music
            | Control::Voice
            | Control::ReplayVoice
            | Control::Motion => None,
        }
    }
}

/// Buttons on the success card, in order
pub fn success_controls(voice_available: bool) -> Vec<Control> {
    let mut controls = Vec::with_capacity(2);
    if voice_available {
        controls.push(Control::ReplayVoice);
    }
    controls.push(Control::Play);
    controls
}
