//! Scene state machine
//!
//! Every user action and stage completion is a closed `Action`. The whole
//! transition graph lives in `ROUTES`, so wiring a new action is a table edit.

use serde::{Deserialize, Serialize};

use super::manager::SceneTag;

/// Inputs that can move the experience forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// "Continue" on the intro card
    Continue,
    OpenAdventure,
    CloseAdventure,
    /// The "yes" button
    Accept,
    /// The evading "no" button was actually reached
    Decline,
    RingCaught,
    RingEscaped,
    /// Restart the ring chase after an escape
    Retry,
    /// "Play" on the success card
    Play,
    /// A mini-game stage reported completion
    StageDone,
}

/// Messages surfaced without leaving the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notice {
    DeclineAcknowledged,
    RingEscaped,
}

/// What an accepted action does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Goto(SceneTag),
    Notify(Notice),
}

/// One row of the transition table
#[derive(Debug, Clone, Copy)]
pub struct Route {
    pub from: SceneTag,
    pub action: Action,
    pub effect: Effect,
}

const fn goto(from: SceneTag, action: Action, to: SceneTag) -> Route {
    Route {
        from,
        action,
        effect: Effect::Goto(to),
    }
}

const fn notify(from: SceneTag, action: Action, notice: Notice) -> Route {
    Route {
        from,
        action,
        effect: Effect::Notify(notice),
    }
}

/// The complete transition graph
pub const ROUTES: &[Route] = &[
    goto(SceneTag::Intro, Action::Continue, SceneTag::Proposal),
    goto(SceneTag::Intro, Action::OpenAdventure, SceneTag::AdventureModal),
    goto(SceneTag::AdventureModal, Action::CloseAdventure, SceneTag::Intro),
    goto(SceneTag::Proposal, Action::Accept, SceneTag::RingChase),
    notify(SceneTag::Proposal, Action::Decline, Notice::DeclineAcknowledged),
    goto(SceneTag::RingChase, Action::RingCaught, SceneTag::Success),
    notify(SceneTag::RingChase, Action::RingEscaped, Notice::RingEscaped),
    goto(SceneTag::RingChase, Action::Retry, SceneTag::RingChase),
    goto(SceneTag::Success, Action::Play, SceneTag::Balloons),
    goto(SceneTag::Balloons, Action::StageDone, SceneTag::MemoryMatch),
    goto(SceneTag::MemoryMatch, Action::StageDone, SceneTag::Final),
];

/// Look up the effect of `action` in scene `from`
pub fn route(from: SceneTag, action: Action) -> Option<Effect> {
    ROUTES
        .iter()
        .find(|r| r.from == from && r.action == action)
        .map(|r| r.effect)
}

/// Result of applying an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Show `to`; `from == to` means a full re-show
    Entered { from: SceneTag, to: SceneTag },
    Notified(Notice),
    /// Not valid in the current scene
    Ignored,
}

/// Tracks the current scene tag
#[derive(Debug, Clone)]
pub struct Flow {
    current: SceneTag,
}

impl Default for Flow {
    fn default() -> Self {
        Self::new()
    }
}

impl Flow {
    pub fn new() -> Self {
        Self {
            current: SceneTag::Intro,
        }
    }

    pub fn current(&self) -> SceneTag {
        self.current
    }

    pub fn apply(&mut self, action: Action) -> Step {
        match route(self.current, action) {
            Some(Effect::Goto(to)) => {
                let from = self.current;
                self.current = to;
                Step::Entered { from, to }
            }
            Some(Effect::Notify(notice)) => Step::Notified(notice),
            None => {
                log::debug!("Ignoring {:?} in {}", action, self.current.as_str());
                Step::Ignored
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::manager::SceneManager;
    use crate::scene::manager::tests::RecordingHost;
    use std::collections::HashSet;

    #[test]
    fn test_happy_path() {
        let mut flow = Flow::new();
        let script = [
            (Action::Continue, SceneTag::Proposal),
            (Action::Accept, SceneTag::RingChase),
            (Action::RingCaught, SceneTag::Success),
            (Action::Play, SceneTag::Balloons),
            (Action::StageDone, SceneTag::MemoryMatch),
            (Action::StageDone, SceneTag::Final),
        ];
        for (action, expected) in script {
            assert!(matches!(flow.apply(action), Step::Entered { to, .. } if to == expected));
        }
        assert_eq!(flow.current(), SceneTag::Final);
    }

    #[test]
    fn test_continue_swaps_intro_for_proposal() {
        let mut manager = SceneManager::new(RecordingHost::default());
        let mut flow = Flow::new();
        manager.show(flow.current(), 10);

        if let Step::Entered { to, .. } = flow.apply(Action::Continue) {
            manager.show(to, 11);
        }

        assert_eq!(manager.host().attached, vec![11]);
        assert_eq!(manager.active_tag(), Some(SceneTag::Proposal));
    }

    #[test]
    fn test_adventure_modal_returns_to_intro() {
        let mut flow = Flow::new();
        assert_eq!(
            flow.apply(Action::OpenAdventure),
            Step::Entered {
                from: SceneTag::Intro,
                to: SceneTag::AdventureModal
            }
        );
        assert_eq!(flow.apply(Action::Continue), Step::Ignored);
        flow.apply(Action::CloseAdventure);
        assert_eq!(flow.current(), SceneTag::Intro);
    }

    #[test]
    fn test_decline_and_escape_are_notices() {
        let mut flow = Flow::new();
        flow.apply(Action::Continue);
        assert_eq!(
            flow.apply(Action::Decline),
            Step::Notified(Notice::DeclineAcknowledged)
        );
        assert_eq!(flow.current(), SceneTag::Proposal);

        flow.apply(Action::Accept);
        assert_eq!(flow.apply(Action::RingEscaped), Step::Notified(Notice::RingEscaped));
        assert_eq!(
            flow.apply(Action::Retry),
            Step::Entered {
                from: SceneTag::RingChase,
                to: SceneTag::RingChase
            }
        );
    }

    #[test]
    fn test_out_of_order_actions_ignored() {
        let mut flow = Flow::new();
        assert_eq!(flow.apply(Action::Accept), Step::Ignored);
        assert_eq!(flow.apply(Action::StageDone), Step::Ignored);
        assert_eq!(flow.current(), SceneTag::Intro);
    }

    #[test]
    fn test_table_is_deterministic_and_final_is_terminal() {
        let mut seen = HashSet::new();
        for r in ROUTES {
            assert!(seen.insert((r.from, r.action)), "duplicate route {:?}", r);
        }
        assert!(ROUTES.iter().all(|r| r.from != SceneTag::Final));
    }

    #[test]
    fn test_every_scene_reachable_from_intro() {
        let mut reached = HashSet::from([SceneTag::Intro]);
        let mut frontier = vec![SceneTag::Intro];
        while let Some(tag) = frontier.pop() {
            for r in ROUTES.iter().filter(|r| r.from == tag) {
                if let Effect::Goto(to) = r.effect {
                    if reached.insert(to) {
                        frontier.push(to);
                    }
                }
            }
        }
        assert_eq!(reached.len(), SceneTag::ALL.len());
    }
}
