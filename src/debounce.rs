use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use tokio::time::Instant;

/// Per-key trailing debounce. Each trigger pushes the key's deadline out to
/// `now + delay`; a key fires once when its deadline passes.
#[derive(Debug)]
pub struct Debouncer<K> {
    delays: HashMap<K, Duration>,
    deadlines: HashMap<K, Instant>,
}

impl<K: Copy + Eq + Hash> Debouncer<K> {
    pub fn new(delays: impl IntoIterator<Item = (K, Duration)>) -> Self {
        Self {
            delays: delays.into_iter().collect(),
            deadlines: HashMap::new(),
        }
    }

    /// Returns false for keys without a configured delay.
    pub fn trigger(&mut self, key: K, now: Instant) -> bool {
        let Some(delay) = self.delays.get(&key) else {
            return false;
        };
        self.deadlines.insert(key, now + *delay);
        true
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.values().min().copied()
    }

    pub fn is_pending(&self, key: K) -> bool {
        self.deadlines.contains_key(&key)
    }

    /// Remove and return every key whose deadline is at or before `now`.
    pub fn take_due(&mut self, now: Instant) -> Vec<K> {
        let due: Vec<K> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(key, _)| *key)
            .collect();
        for key in &due {
            self.deadlines.remove(key);
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Key {
        Rates,
        Outside,
        Unknown,
    }

    fn debouncer() -> Debouncer<Key> {
        Debouncer::new([
            (Key::Rates, Duration::from_secs(3)),
            (Key::Outside, Duration::from_secs(2)),
        ])
    }

    #[test]
    fn repeated_trigger_resets_deadline() {
        let mut d = debouncer();
        let t0 = Instant::now();
        assert!(d.trigger(Key::Rates, t0));
        assert!(d.trigger(Key::Rates, t0 + Duration::from_secs(2)));
        assert_eq!(d.next_deadline(), Some(t0 + Duration::from_secs(5)));

        assert!(d.take_due(t0 + Duration::from_secs(4)).is_empty());
        assert_eq!(d.take_due(t0 + Duration::from_secs(5)), vec![Key::Rates]);
        // one burst fires once
        assert!(d.take_due(t0 + Duration::from_secs(10)).is_empty());
        assert_eq!(d.next_deadline(), None);
    }

    #[test]
    fn keys_fire_independently() {
        let mut d = debouncer();
        let t0 = Instant::now();
        d.trigger(Key::Rates, t0);
        d.trigger(Key::Outside, t0);
        assert_eq!(d.next_deadline(), Some(t0 + Duration::from_secs(2)));
        assert_eq!(d.take_due(t0 + Duration::from_secs(2)), vec![Key::Outside]);
        assert!(d.is_pending(Key::Rates));
        assert!(!d.is_pending(Key::Outside));
    }

    #[test]
    fn unconfigured_key_is_ignored() {
        let mut d = debouncer();
        assert!(!d.trigger(Key::Unknown, Instant::now()));
        assert_eq!(d.next_deadline(), None);
    }
}
