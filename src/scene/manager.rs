//! Single-active-scene manager
//!
//! The manager is the only owner of top-level attachment. `show` detaches
//! whatever is attached and attaches the new node in one synchronous pass,
//! so no frame ever renders with zero or two scenes once the first scene is up.

use serde::{Deserialize, Serialize};

/// Scene identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SceneTag {
    Intro,
    AdventureModal,
    Proposal,
    RingChase,
    Success,
    Balloons,
    MemoryMatch,
    Final,
}

impl SceneTag {
    pub const ALL: [SceneTag; 8] = [
        SceneTag::Intro,
        SceneTag::AdventureModal,
        SceneTag::Proposal,
        SceneTag::RingChase,
        SceneTag::Success,
        SceneTag::Balloons,
        SceneTag::MemoryMatch,
        SceneTag::Final,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SceneTag::Intro => "intro",
            SceneTag::AdventureModal => "adventure",
            SceneTag::Proposal => "proposal",
            SceneTag::RingChase => "ring-chase",
            SceneTag::Success => "success",
            SceneTag::Balloons => "balloons",
            SceneTag::MemoryMatch => "memory-match",
            SceneTag::Final => "final",
        }
    }
}

/// Where scene nodes get attached (the DOM in the browser)
pub trait SceneHost {
    type Node;

    fn attach(&mut self, node: &Self::Node);
    fn detach(&mut self, node: &Self::Node);
}

/// Runs once when a scene leaves the document
pub type Teardown = Box<dyn FnOnce()>;

/// An attached, tagged node
pub struct Scene<N> {
    pub tag: SceneTag,
    pub node: N,
    on_teardown: Option<Teardown>,
}

/// Owns the currently attached scene
pub struct SceneManager<H: SceneHost> {
    host: H,
    active: Option<Scene<H::Node>>,
}

impl<H: SceneHost> SceneManager<H> {
    pub fn new(host: H) -> Self {
        Self { host, active: None }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Replace whatever is attached with `node`
    pub fn show(&mut self, tag: SceneTag, node: H::Node) {
        self.install(Scene {
            tag,
            node,
            on_teardown: None,
        });
    }

    /// Like `show`, running `teardown` when this scene is later detached
    pub fn show_with_teardown(
        &mut self,
        tag: SceneTag,
        node: H::Node,
        teardown: impl FnOnce() + 'static,
    ) {
        self.install(Scene {
            tag,
            node,
            on_teardown: Some(Box::new(teardown)),
        });
    }

    fn install(&mut self, scene: Scene<H::Node>) {
        let previous = self.active.as_ref().map(|s| s.tag);
        self.detach_active();
        self.host.attach(&scene.node);
        log::info!(
            "Scene {} -> {}",
            previous.map(|t| t.as_str()).unwrap_or("none"),
            scene.tag.as_str()
        );
        self.active = Some(scene);
    }

    /// Detach the scene with `tag`, or any scene if `tag` is `None`.
    /// Returns whether something was detached.
    pub fn remove(&mut self, tag: Option<SceneTag>) -> bool {
        let matches = match (&self.active, tag) {
            (Some(_), None) => true,
            (Some(scene), Some(tag)) => scene.tag == tag,
            (None, _) => false,
        };
        if matches {
            self.detach_active();
        }
        matches
    }

    fn detach_active(&mut self) {
        if let Some(mut scene) = self.active.take() {
            self.host.detach(&scene.node);
            if let Some(teardown) = scene.on_teardown.take() {
                teardown();
            }
        }
    }

    pub fn active_tag(&self) -> Option<SceneTag> {
        self.active.as_ref().map(|s| s.tag)
    }

    pub fn active_node(&self) -> Option<&H::Node> {
        self.active.as_ref().map(|s| &s.node)
    }

    /// Number of managed nodes currently attached (0 or 1)
    pub fn attached_count(&self) -> usize {
        usize::from(self.active.is_some())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Tracks attached node ids like a document would
    #[derive(Default)]
    pub(crate) struct RecordingHost {
        pub attached: Vec<u32>,
        pub max_attached: usize,
    }

    impl SceneHost for RecordingHost {
        type Node = u32;

        fn attach(&mut self, node: &u32) {
            self.attached.push(*node);
            self.max_attached = self.max_attached.max(self.attached.len());
        }

        fn detach(&mut self, node: &u32) {
            self.attached.retain(|n| n != node);
        }
    }

    #[test]
    fn test_nothing_attached_before_first_show() {
        let manager = SceneManager::new(RecordingHost::default());
        assert_eq!(manager.attached_count(), 0);
        assert_eq!(manager.active_tag(), None);
    }

    #[test]
    fn test_show_replaces_previous() {
        let mut manager = SceneManager::new(RecordingHost::default());
        manager.show(SceneTag::Intro, 1);
        manager.show(SceneTag::Proposal, 2);
        manager.show(SceneTag::Proposal, 3);

        assert_eq!(manager.host().attached, vec![3]);
        assert_eq!(manager.host().max_attached, 1);
        assert_eq!(manager.active_tag(), Some(SceneTag::Proposal));
        assert_eq!(manager.active_node(), Some(&3));
    }

    #[test]
    fn test_remove_by_tag() {
        let mut manager = SceneManager::new(RecordingHost::default());
        manager.show(SceneTag::Success, 7);

        assert!(!manager.remove(Some(SceneTag::Intro)));
        assert_eq!(manager.attached_count(), 1);

        assert!(manager.remove(Some(SceneTag::Success)));
        assert_eq!(manager.attached_count(), 0);
        assert!(manager.host().attached.is_empty());

        assert!(!manager.remove(None));
    }

    #[test]
    fn test_remove_all() {
        let mut manager = SceneManager::new(RecordingHost::default());
        manager.show(SceneTag::Balloons, 4);
        assert!(manager.remove(None));
        assert_eq!(manager.active_tag(), None);
    }

    #[test]
    fn test_teardown_runs_once_on_replace() {
        let count = Rc::new(Cell::new(0));
        let mut manager = SceneManager::new(RecordingHost::default());
        let c = count.clone();
        manager.show_with_teardown(SceneTag::RingChase, 1, move || c.set(c.get() + 1));

        manager.show(SceneTag::Success, 2);
        assert_eq!(count.get(), 1);
        manager.remove(None);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_never_more_than_one_attached() {
        let mut manager = SceneManager::new(RecordingHost::default());
        for (i, tag) in SceneTag::ALL.iter().cycle().take(40).enumerate() {
            if i % 7 == 3 {
                manager.remove(None);
            } else {
                manager.show(*tag, i as u32);
            }
            assert!(manager.attached_count() <= 1);
            assert_eq!(manager.host().attached.len(), manager.attached_count());
        }
        assert_eq!(manager.host().max_attached, 1);
    }
}
