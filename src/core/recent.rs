use std::{collections::HashSet, sync::Mutex};

use twilight_model::id::{Id, marker::UserMarker};

/// Members granted access recently. A member in this set is never downgraded,
/// which suppresses the race between a grant in flight and a stale
/// source-of-truth read. The whole set is dropped on a fixed timer rather
/// than expiring entries individually, so staleness is bounded by one window.
#[derive(Debug, Default)]
pub struct RecentBoosterCache {
    entries: Mutex<HashSet<Id<UserMarker>>>,
}

impl RecentBoosterCache {
    pub fn mark(&self, user: Id<UserMarker>) {
        self.entries.lock().unwrap().insert(user);
    }

    pub fn contains(&self, user: Id<UserMarker>) -> bool {
        self.entries.lock().unwrap().contains(&user)
    }

    /// Drops every entry, returning how many were held. Called only by the
    /// periodic timer in `background`.
    pub fn clear_all(&self) -> usize {
        let mut entries = self.entries.lock().unwrap();
        let count = entries.len();
        entries.clear();
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marked_members_are_recent_until_cleared() {
        let cache = RecentBoosterCache::default();
        let user = Id::new(42);

        assert!(!cache.contains(user));
        cache.mark(user);
        cache.mark(user);
        assert!(cache.contains(user));

        assert_eq!(cache.clear_all(), 1);
        assert!(!cache.contains(user));
        assert_eq!(cache.clear_all(), 0);
    }
}
