//! Memory-match stage
//!
//! A shuffled deck with two cards per symbol. A matched pair stays face up
//! and deals a compliment; a mismatched pair flips back after a fixed delay
//! during which the board ignores clicks.

use rand::Rng;
use rand::seq::SliceRandom;

use super::{ComplimentQueue, Completion, OnDone, Stage};
use crate::ms_to_ticks;
use crate::tuning::MemoryTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardState {
    FaceDown,
    Revealed,
    Matched,
}

#[derive(Debug, Clone)]
pub struct Card {
    pub symbol: String,
    pub state: CardState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlipOutcome {
    /// First card of a pair turned over
    Revealed,
    Matched {
        compliment: Option<String>,
        /// This match finished the deck
        completed: bool,
    },
    /// Both cards flip back after the reveal delay
    Mismatched,
    Ignored,
}

pub struct MemoryMatchStage {
    cards: Vec<Card>,
    first: Option<usize>,
    /// Mismatched pair and ticks until it turns back over
    pending_revert: Option<(usize, usize, u32)>,
    matches: usize,
    reveal_ticks: u32,
    compliments: ComplimentQueue,
    completion: Completion,
    running: bool,
}

impl MemoryMatchStage {
    pub fn new<R: Rng>(tuning: &MemoryTuning, compliments: ComplimentQueue, rng: &mut R) -> Self {
        let mut cards: Vec<Card> = tuning
            .symbols
            .iter()
            .flat_map(|s| [s.clone(), s.clone()])
            .map(|symbol| Card {
                symbol,
                state: CardState::FaceDown,
            })
            .collect();
        cards.shuffle(rng);

        Self {
            cards,
            first: None,
            pending_revert: None,
            matches: 0,
            reveal_ticks: ms_to_ticks(tuning.reveal_delay_ms),
            compliments,
            completion: Completion::default(),
            running: false,
        }
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn matches(&self) -> usize {
        self.matches
    }

    pub fn pairs(&self) -> usize {
        self.cards.len() / 2
    }

    /// Board locked while a mismatch is on display
    pub fn is_locked(&self) -> bool {
        self.pending_revert.is_some()
    }

    pub fn click(&mut self, index: usize) -> FlipOutcome {
        if !self.running || self.is_locked() {
            return FlipOutcome::Ignored;
        }
        match self.cards.get(index) {
            Some(card) if card.state == CardState::FaceDown => {}
            _ => return FlipOutcome::Ignored,
        }
        self.cards[index].state = CardState::Revealed;

        let Some(first) = self.first.take() else {
            self.first = Some(index);
            return FlipOutcome::Revealed;
        };

        if self.cards[first].symbol != self.cards[index].symbol {
            self.pending_revert = Some((first, index, self.reveal_ticks));
            return FlipOutcome::Mismatched;
        }

        self.cards[first].state = CardState::Matched;
        self.cards[index].state = CardState::Matched;
        self.matches += 1;
        let compliment = self.compliments.next();

        let completed = self.matches == self.pairs() && self.completion.fire();
        if completed {
            self.running = false;
        }
        FlipOutcome::Matched {
            compliment,
            completed,
        }
    }

    /// Count down a pending mismatch
    pub fn tick(&mut self) {
        if let Some((a, b, remaining)) = self.pending_revert {
            if remaining <= 1 {
                self.cards[a].state = CardState::FaceDown;
                self.cards[b].state = CardState::FaceDown;
                self.pending_revert = None;
            } else {
                self.pending_revert = Some((a, b, remaining - 1));
            }
        }
    }
}

impl Stage for MemoryMatchStage {
    fn name(&self) -> &'static str {
        "memory-match"
    }

    fn run(&mut self, on_done: OnDone) {
        self.completion.arm(on_done);
        self.running = !self.completion.is_fired();
    }

    fn is_complete(&self) -> bool {
        self.completion.is_fired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use std::cell::Cell;
    use std::rc::Rc;

    fn started(seed: u64) -> (MemoryMatchStage, Rc<Cell<u32>>) {
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut stage = MemoryMatchStage::new(
            &MemoryTuning::default(),
            ComplimentQueue::new(["a", "b", "c"]),
            &mut rng,
        );
        let done = Rc::new(Cell::new(0));
        let d = done.clone();
        stage.run(Box::new(move || d.set(d.get() + 1)));
        (stage, done)
    }

    fn partner(stage: &MemoryMatchStage, i: usize) -> usize {
        (0..stage.cards().len())
            .find(|&j| j != i && stage.cards()[j].symbol == stage.cards()[i].symbol)
            .unwrap_or(i)
    }

    fn non_partner(stage: &MemoryMatchStage, i: usize) -> usize {
        (0..stage.cards().len())
            .find(|&j| stage.cards()[j].symbol != stage.cards()[i].symbol)
            .unwrap_or(i)
    }

    fn wait_revert(stage: &mut MemoryMatchStage) {
        for _ in 0..ms_to_ticks(800) {
            stage.tick();
        }
    }

    #[test]
    fn test_deck_is_pairs() {
        let (stage, _) = started(1);
        assert_eq!(stage.cards().len(), 12);
        assert_eq!(stage.pairs(), 6);
        for i in 0..12 {
            assert_ne!(partner(&stage, i), i);
        }
    }

    #[test]
    fn test_match_stays_revealed() {
        let (mut stage, _) = started(2);
        let j = partner(&stage, 0);
        assert_eq!(stage.click(0), FlipOutcome::Revealed);
        assert_eq!(
            stage.click(j),
            FlipOutcome::Matched {
                compliment: Some("a".into()),
                completed: false
            }
        );
        wait_revert(&mut stage);
        assert_eq!(stage.cards()[0].state, CardState::Matched);
        assert_eq!(stage.cards()[j].state, CardState::Matched);
        assert_eq!(stage.click(0), FlipOutcome::Ignored);
    }

    #[test]
    fn test_mismatch_reverts_after_delay() {
        let (mut stage, _) = started(3);
        let k = non_partner(&stage, 0);
        stage.click(0);
        assert_eq!(stage.click(k), FlipOutcome::Mismatched);
        assert!(stage.is_locked());

        // Clicks during the reveal are ignored
        let other = partner(&stage, 0);
        assert_eq!(stage.click(other), FlipOutcome::Ignored);

        stage.tick();
        assert_eq!(stage.cards()[0].state, CardState::Revealed);
        wait_revert(&mut stage);
        assert_eq!(stage.cards()[0].state, CardState::FaceDown);
        assert_eq!(stage.cards()[k].state, CardState::FaceDown);
        assert_eq!(stage.matches(), 0);
        assert!(!stage.is_locked());
    }

    #[test]
    fn test_same_card_twice_ignored() {
        let (mut stage, _) = started(4);
        stage.click(5);
        assert_eq!(stage.click(5), FlipOutcome::Ignored);
        assert_eq!(stage.click(99), FlipOutcome::Ignored);
    }

    #[test]
    fn test_solving_completes_once() {
        let (mut stage, done) = started(5);
        let mut completions = 0;
        for i in 0..stage.cards().len() {
            if stage.cards()[i].state != CardState::FaceDown {
                continue;
            }
            let j = partner(&stage, i);
            stage.click(i);
            if let FlipOutcome::Matched { completed: true, .. } = stage.click(j) {
                completions += 1;
            }
        }
        assert_eq!(completions, 1);
        assert_eq!(done.get(), 1);
        assert!(stage.is_complete());
        assert_eq!(stage.click(0), FlipOutcome::Ignored);
    }

    proptest! {
        #[test]
        fn prop_complete_iff_all_pairs_matched(
            seed in any::<u64>(),
            moves in proptest::collection::vec((0usize..12, 0u32..60), 0..300),
        ) {
            let (mut stage, done) = started(seed);
            for (index, ticks) in moves {
                stage.click(index);
                for _ in 0..ticks {
                    stage.tick();
                }
                let matched = stage
                    .cards()
                    .iter()
                    .filter(|c| c.state == CardState::Matched)
                    .count();
                prop_assert_eq!(matched, stage.matches() * 2);
                prop_assert_eq!(stage.is_complete(), stage.matches() == stage.pairs());
                prop_assert!(done.get() <= 1);
            }
        }
    }
}
