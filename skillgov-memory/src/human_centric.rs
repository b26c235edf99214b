use crate::event::MemoryEvent;
use std::collections::BTreeMap;
use tracing::debug;

/// Three-tier engine: a short-term window, a long-term pool gated by a
/// salience threshold, and a periodic consolidated reflection.
///
/// Retrieval order is fixed: most recent reflection, then the top-K salient
/// long-term events, then the last `W` events, deduplicated, preserving
/// that order.
#[derive(Debug, Clone)]
pub struct HumanCentricMemory {
    window_size: usize,
    salience_threshold: f64,
    top_k_salient: usize,
    reflection_period: u64,
    store: BTreeMap<String, AgentStore>,
}

#[derive(Debug, Clone, Default)]
struct AgentStore {
    events: Vec<MemoryEvent>,
    reflections: Vec<MemoryEvent>,
    last_consolidated_step: u64,
}

impl HumanCentricMemory {
    pub fn new(
        window_size: usize,
        salience_threshold: f64,
        top_k_salient: usize,
        reflection_period: u64,
    ) -> Self {
        Self {
            window_size: window_size.max(1),
            salience_threshold,
            top_k_salient,
            reflection_period,
            store: BTreeMap::new(),
        }
    }

    pub fn record(&mut self, event: MemoryEvent) {
        self.store
            .entry(event.agent_id.clone())
            .or_default()
            .events
            .push(event);
    }

    pub fn retrieve(&self, agent_id: &str, k: usize) -> Vec<MemoryEvent> {
        let Some(agent) = self.store.get(agent_id) else {
            return Vec::new();
        };

        let mut out: Vec<MemoryEvent> = Vec::new();

        if let Some(reflection) = agent.reflections.last() {
            out.push(reflection.clone());
        }

        let mut salient: Vec<&MemoryEvent> = agent
            .events
            .iter()
            .filter(|e| e.salience >= self.salience_threshold)
            .collect();
        salient.sort_by(|a, b| {
            b.salience
                .partial_cmp(&a.salience)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.step.cmp(&a.step))
        });
        for event in salient.into_iter().take(self.top_k_salient) {
            out.push(event.clone());
        }

        for event in agent.events.iter().rev().take(self.window_size) {
            out.push(event.clone());
        }

        dedup_in_order(&mut out);
        out.truncate(k);
        out
    }

    /// Produce a consolidated reflection when a full period has elapsed.
    ///
    /// Consolidation reads a frozen copy of the period's events before
    /// writing the reflection, so retrieval input and consolidation input
    /// cannot alias.
    pub fn consolidate(&mut self, agent_id: &str, step: u64) {
        if self.reflection_period == 0 {
            return;
        }
        let Some(agent) = self.store.get_mut(agent_id) else {
            return;
        };
        if step < agent.last_consolidated_step + self.reflection_period {
            return;
        }

        let since = agent.last_consolidated_step;
        let period_events: Vec<MemoryEvent> = agent
            .events
            .iter()
            .filter(|e| e.step > since && e.step <= step)
            .cloned()
            .collect();
        if period_events.is_empty() {
            return;
        }

        let text = summarize(&period_events);
        debug!(agent_id, step, "consolidated reflection: {text}");

        let mut reflection = MemoryEvent::new(step, agent_id, "");
        reflection.salience = period_events
            .iter()
            .map(|e| e.salience)
            .fold(0.0_f64, f64::max);
        reflection.reflection = Some(text);
        agent.reflections.push(reflection);
        agent.last_consolidated_step = step;
    }
}

/// Deterministic one-line summary of a period's events: skill usage counts
/// in first-seen order, then outcome tags in first-seen order.
fn summarize(events: &[MemoryEvent]) -> String {
    let first = events.iter().map(|e| e.step).min().unwrap_or(0);
    let last = events.iter().map(|e| e.step).max().unwrap_or(0);

    let mut skill_order: Vec<&str> = Vec::new();
    let mut skill_counts: BTreeMap<&str, usize> = BTreeMap::new();
    let mut tag_order: Vec<&str> = Vec::new();
    for event in events {
        if !skill_counts.contains_key(event.skill_id.as_str()) {
            skill_order.push(&event.skill_id);
        }
        *skill_counts.entry(&event.skill_id).or_insert(0) += 1;
        for tag in &event.outcome_tags {
            if !tag_order.contains(&tag.as_str()) {
                tag_order.push(tag);
            }
        }
    }

    let skills: Vec<String> = skill_order
        .iter()
        .map(|s| format!("{s} x{}", skill_counts[s]))
        .collect();
    let mut summary = format!("steps {first}-{last}: {}", skills.join(", "));
    if !tag_order.is_empty() {
        summary.push_str(&format!("; outcomes: {}", tag_order.join(", ")));
    }
    summary
}

/// Keep the first occurrence of each event identity, preserving order.
fn dedup_in_order(events: &mut Vec<MemoryEvent>) {
    let mut seen: Vec<(u64, String, bool)> = Vec::new();
    events.retain(|e| {
        let key = (e.step, e.skill_id.clone(), e.is_reflection());
        if seen.contains(&key) {
            false
        } else {
            seen.push(key);
            true
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> HumanCentricMemory {
        HumanCentricMemory::new(2, 5.0, 2, 5)
    }

    fn fill(memory: &mut HumanCentricMemory) {
        let saliences = [1.0, 6.0, 2.0, 8.0, 3.0];
        for (i, s) in saliences.iter().enumerate() {
            let step = (i + 1) as u64;
            let mut event = MemoryEvent::new(step, "a1", "buy_insurance").with_salience(*s);
            if *s >= 6.0 {
                event = event.with_tag("flood_occurred");
            }
            memory.record(event);
        }
    }

    #[test]
    fn test_retrieval_order_reflection_salient_window() {
        let mut memory = engine();
        fill(&mut memory);
        memory.consolidate("a1", 5);

        let events = memory.retrieve("a1", 10);
        assert!(events[0].is_reflection());
        // Long-term pool: saliences >= 5.0, ranked descending.
        assert_eq!(events[1].salience, 8.0);
        assert_eq!(events[2].salience, 6.0);
        // Short-term window of 2, newest first; step 4 (salience 8.0) was
        // already emitted by the long-term tier and deduplicates away.
        assert_eq!(events[3].step, 5);
        assert_eq!(events.len(), 4);
    }

    #[test]
    fn test_consolidation_period_gate() {
        let mut memory = engine();
        fill(&mut memory);
        memory.consolidate("a1", 4); // period of 5 not yet elapsed
        assert!(memory.retrieve("a1", 10).iter().all(|e| !e.is_reflection()));

        memory.consolidate("a1", 5);
        assert!(memory.retrieve("a1", 10)[0].is_reflection());
    }

    #[test]
    fn test_reflection_summary_content() {
        let mut memory = engine();
        fill(&mut memory);
        memory.consolidate("a1", 5);
        let reflection = memory.retrieve("a1", 1).remove(0);
        let text = reflection.reflection.unwrap();
        assert!(text.contains("buy_insurance x5"));
        assert!(text.contains("flood_occurred"));
    }

    #[test]
    fn test_zero_period_never_reflects() {
        let mut memory = HumanCentricMemory::new(2, 5.0, 2, 0);
        fill(&mut memory);
        memory.consolidate("a1", 100);
        assert!(memory.retrieve("a1", 10).iter().all(|e| !e.is_reflection()));
    }

    #[test]
    fn test_empty_store_returns_empty() {
        assert!(engine().retrieve("nobody", 4).is_empty());
    }
}
