use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tally_core::OwnerId;

pub const RECENT_INPUT_CAPACITY: usize = 64;
pub const RECENT_INPUT_TTL: Duration = Duration::from_secs(5 * 60);

/// Per-owner memory of raw texts submitted in the last few minutes, so the same
/// sentence typed twice is refused before it reaches the parser.
///
/// Texts are compared lower-cased and trimmed. Each owner keeps at most
/// `capacity` entries; the oldest is evicted first.
pub struct RecentInputs {
    capacity: usize,
    ttl: Duration,
    entries: Mutex<HashMap<OwnerId, VecDeque<(String, Instant)>>>,
}

impl Default for RecentInputs {
    fn default() -> Self {
        Self::new(RECENT_INPUT_CAPACITY, RECENT_INPUT_TTL)
    }
}

impl RecentInputs {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self { capacity: capacity.max(1), ttl, entries: Mutex::new(HashMap::new()) }
    }

    pub fn contains(&self, owner: &OwnerId, text: &str) -> bool {
        self.contains_at(owner, text, Instant::now())
    }

    pub fn remember(&self, owner: &OwnerId, text: &str) {
        self.remember_at(owner, text, Instant::now())
    }

    fn contains_at(&self, owner: &OwnerId, text: &str, now: Instant) -> bool {
        let key = normalize(text);
        let mut entries = self.entries();
        let Some(queue) = entries.get_mut(owner) else {
            return false;
        };
        evict_expired(queue, self.ttl, now);
        let found = queue.iter().any(|(t, _)| *t == key);
        if queue.is_empty() {
            entries.remove(owner);
        }
        found
    }

    fn remember_at(&self, owner: &OwnerId, text: &str, now: Instant) {
        let key = normalize(text);
        if key.is_empty() {
            return;
        }
        let mut entries = self.entries();
        let queue = entries.entry(owner.clone()).or_default();
        evict_expired(queue, self.ttl, now);
        queue.retain(|(t, _)| *t != key);
        queue.push_back((key, now));
        while queue.len() > self.capacity {
            queue.pop_front();
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<OwnerId, VecDeque<(String, Instant)>>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

fn evict_expired(queue: &mut VecDeque<(String, Instant)>, ttl: Duration, now: Instant) {
    while let Some((_, at)) = queue.front() {
        if now.saturating_duration_since(*at) >= ttl {
            queue.pop_front();
        } else {
            break;
        }
    }
}
