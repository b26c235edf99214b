use crate::event::MemoryEvent;
use std::collections::BTreeMap;

/// Retains every event; retrieval ranks by salience with recency breaking
/// ties. Retrieval is a pure function of the recorded sequence, so repeated
/// calls over the same store are bit-identical.
#[derive(Debug, Clone, Default)]
pub struct ImportanceMemory {
    store: BTreeMap<String, Vec<MemoryEvent>>,
}

impl ImportanceMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: MemoryEvent) {
        self.store
            .entry(event.agent_id.clone())
            .or_default()
            .push(event);
    }

    pub fn retrieve(&self, agent_id: &str, k: usize) -> Vec<MemoryEvent> {
        let Some(events) = self.store.get(agent_id) else {
            return Vec::new();
        };
        let mut ranked: Vec<&MemoryEvent> = events.iter().collect();
        // Salience descending; ties broken by recency (later step first).
        ranked.sort_by(|a, b| {
            b.salience
                .partial_cmp(&a.salience)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.step.cmp(&a.step))
        });
        ranked.into_iter().take(k).cloned().collect()
    }

    /// All events for an agent in record order. Used by the human-centric
    /// engine tests and by consolidation-style consumers.
    pub fn events(&self, agent_id: &str) -> &[MemoryEvent] {
        self.store.get(agent_id).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_salience_ranking() {
        // Shuffled saliences [1,5,2,8,3,7,4,6,9,0]; top-3 is [9,8,7].
        let saliences = [1.0, 5.0, 2.0, 8.0, 3.0, 7.0, 4.0, 6.0, 9.0, 0.0];
        let mut memory = ImportanceMemory::new();
        for (step, salience) in saliences.iter().enumerate() {
            memory.record(
                MemoryEvent::new(step as u64, "a1", "do_nothing").with_salience(*salience),
            );
        }
        let top: Vec<f64> = memory
            .retrieve("a1", 3)
            .iter()
            .map(|e| e.salience)
            .collect();
        assert_eq!(top, vec![9.0, 8.0, 7.0]);
    }

    #[test]
    fn test_ties_break_by_recency() {
        let mut memory = ImportanceMemory::new();
        memory.record(MemoryEvent::new(1, "a1", "x").with_salience(2.0));
        memory.record(MemoryEvent::new(2, "a1", "y").with_salience(2.0));
        let events = memory.retrieve("a1", 2);
        assert_eq!(events[0].step, 2);
        assert_eq!(events[1].step, 1);
    }

    #[test]
    fn test_retrieve_is_deterministic() {
        let mut memory = ImportanceMemory::new();
        for step in 0..20 {
            memory.record(
                MemoryEvent::new(step, "a1", "x").with_salience((step % 5) as f64),
            );
        }
        let first = memory.retrieve("a1", 7);
        let second = memory.retrieve("a1", 7);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_store_returns_empty() {
        assert!(ImportanceMemory::new().retrieve("a1", 5).is_empty());
    }
}
