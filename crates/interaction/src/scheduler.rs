use std::collections::BTreeMap;

use crate::types::ActorId;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Deadline {
    pub fire_at: f64,
    pub generation: u64,
}

/// At most one deadline per key; scheduling again replaces it.
#[derive(Debug, Default)]
pub struct DeadlineScheduler {
    deadlines: BTreeMap<ActorId, Deadline>,
    next_generation: u64,
}

impl DeadlineScheduler {
    pub fn schedule(&mut self, key: ActorId, fire_at: f64) -> u64 {
        let generation = self.next_generation;
        self.next_generation = self.next_generation.saturating_add(1);
        self.deadlines.insert(
            key,
            Deadline {
                fire_at,
                generation,
            },
        );
        generation
    }

    pub fn cancel(&mut self, key: ActorId) -> bool {
        self.deadlines.remove(&key).is_some()
    }

    pub fn get(&self, key: ActorId) -> Option<Deadline> {
        self.deadlines.get(&key).copied()
    }

    pub fn is_pending(&self, key: ActorId) -> bool {
        self.deadlines.contains_key(&key)
    }

    pub fn pending_count(&self) -> usize {
        self.deadlines.len()
    }

    /// Earliest first.
    pub fn take_due(&mut self, now: f64) -> Vec<ActorId> {
        let mut due = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| deadline.fire_at <= now)
            .map(|(key, deadline)| (*key, *deadline))
            .collect::<Vec<_>>();
        due.sort_by(|a, b| {
            a.1.fire_at
                .total_cmp(&b.1.fire_at)
                .then(a.1.generation.cmp(&b.1.generation))
        });
        for (key, _) in &due {
            self.deadlines.remove(key);
        }
        due.into_iter().map(|(key, _)| key).collect()
    }
}
