use std::collections::HashSet;
use std::hash::Hash;

/// Keys already written to one lookup output during a session.
///
/// Keys are stored whole, so membership is decided by comparing the full
/// tuple rather than a digest of it. The set is owned by whoever drives the
/// session and handed to each per-file load in turn.
#[derive(Debug)]
pub struct LookupSet<K> {
    seen: HashSet<K>,
    dropped: u64,
}

impl<K: Eq + Hash + Clone> LookupSet<K> {
    pub fn new() -> Self {
        Self {
            seen: HashSet::new(),
            dropped: 0,
        }
    }

    /// Returns `true` the first time `key` is offered, `false` afterwards.
    pub fn first_seen(&mut self, key: &K) -> bool {
        if self.seen.contains(key) {
            self.dropped += 1;
            false
        } else {
            self.seen.insert(key.clone());
            true
        }
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Number of offered keys that were already present.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl<K: Eq + Hash + Clone> Default for LookupSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_occurrence_wins() {
        let mut set = LookupSet::new();
        let a = (1u32, "1".to_string(), "Population, 2021".to_string());
        let b = (1u32, "2".to_string(), "Population, 2016".to_string());

        assert!(set.first_seen(&a));
        assert!(set.first_seen(&b));
        assert!(!set.first_seen(&a.clone()));
        assert_eq!(set.len(), 2);
        assert_eq!(set.dropped(), 1);
    }

    #[test]
    fn test_keys_differing_in_one_field_are_distinct() {
        let mut set = LookupSet::new();
        assert!(set.first_seen(&(1u32, "1".to_string())));
        assert!(set.first_seen(&(2u32, "1".to_string())));
        assert!(set.first_seen(&(1u32, "01".to_string())));
        assert_eq!(set.dropped(), 0);
    }
}
