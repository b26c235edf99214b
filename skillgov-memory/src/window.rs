use crate::event::MemoryEvent;
use std::collections::{BTreeMap, VecDeque};

/// Ring buffer of the last `W` events per agent. Retrieval is newest-first;
/// consolidation is a no-op.
#[derive(Debug, Clone)]
pub struct WindowMemory {
    window_size: usize,
    store: BTreeMap<String, VecDeque<MemoryEvent>>,
}

impl WindowMemory {
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size: window_size.max(1),
            store: BTreeMap::new(),
        }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn record(&mut self, event: MemoryEvent) {
        let ring = self.store.entry(event.agent_id.clone()).or_default();
        ring.push_back(event);
        while ring.len() > self.window_size {
            ring.pop_front();
        }
    }

    /// Newest-first slice of at most `min(k, W)` events.
    pub fn retrieve(&self, agent_id: &str, k: usize) -> Vec<MemoryEvent> {
        let k = k.min(self.window_size);
        match self.store.get(agent_id) {
            Some(ring) => ring.iter().rev().take(k).cloned().collect(),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eviction_beyond_window() {
        let mut memory = WindowMemory::new(3);
        for step in 0..5 {
            memory.record(MemoryEvent::new(step, "a1", "do_nothing"));
        }
        let events = memory.retrieve("a1", 10);
        let steps: Vec<u64> = events.iter().map(|e| e.step).collect();
        assert_eq!(steps, vec![4, 3, 2]);
    }

    #[test]
    fn test_k_clamped_to_window() {
        let mut memory = WindowMemory::new(2);
        for step in 0..4 {
            memory.record(MemoryEvent::new(step, "a1", "do_nothing"));
        }
        assert_eq!(memory.retrieve("a1", 100).len(), 2);
    }

    #[test]
    fn test_empty_store_returns_empty() {
        let memory = WindowMemory::new(4);
        assert!(memory.retrieve("missing", 3).is_empty());
    }

    #[test]
    fn test_single_event_at_rank_one() {
        let mut memory = WindowMemory::new(4);
        memory.record(MemoryEvent::new(1, "a1", "buy_insurance"));
        let events = memory.retrieve("a1", 4);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].skill_id, "buy_insurance");
    }

    #[test]
    fn test_agents_are_isolated() {
        let mut memory = WindowMemory::new(3);
        memory.record(MemoryEvent::new(1, "a1", "x"));
        memory.record(MemoryEvent::new(1, "a2", "y"));
        assert_eq!(memory.retrieve("a1", 3).len(), 1);
        assert_eq!(memory.retrieve("a2", 3)[0].skill_id, "y");
    }
}
