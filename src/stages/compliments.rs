/// Ordered reward strings dealt front to back, cycling once the list runs out
#[derive(Debug, Clone, Default)]
pub struct ComplimentQueue {
    items: Vec<String>,
    dealt: usize,
}

impl ComplimentQueue {
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            items: items.into_iter().map(Into::into).collect(),
            dealt: 0,
        }
    }

    /// Next compliment. Wraps to the front after the last one; `None` only
    /// for an empty list.
    pub fn next(&mut self) -> Option<String> {
        if self.items.is_empty() {
            return None;
        }
        let item = self.items[self.dealt % self.items.len()].clone();
        self.dealt += 1;
        if self.dealt == self.items.len() + 1 {
            log::debug!("Compliments wrapped after {}", self.items.len());
        }
        Some(item)
    }

    /// Compliments not yet dealt in the first pass
    pub fn remaining(&self) -> usize {
        self.items.len().saturating_sub(self.dealt)
    }

    pub fn dealt(&self) -> usize {
        self.dealt
    }

    /// Every compliment has been dealt at least once
    pub fn is_exhausted(&self) -> bool {
        self.dealt >= self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_front_to_back() {
        let mut q = ComplimentQueue::new(["a", "b"]);
        assert_eq!(q.next().as_deref(), Some("a"));
        assert_eq!(q.remaining(), 1);
        assert_eq!(q.next().as_deref(), Some("b"));
        assert!(q.is_exhausted());
        assert_eq!(q.dealt(), 2);
    }

    #[test]
    fn test_wraps_after_last() {
        let mut q = ComplimentQueue::new(["a", "b", "c", "d", "e"]);
        let dealt: Vec<String> = (0..6).filter_map(|_| q.next()).collect();
        assert_eq!(dealt, vec!["a", "b", "c", "d", "e", "a"]);
        assert_eq!(q.remaining(), 0);
    }

    #[test]
    fn test_empty_queue() {
        let mut q = ComplimentQueue::default();
        assert!(q.is_exhausted());
        assert_eq!(q.next(), None);
        assert_eq!(q.remaining(), 0);
    }
}
