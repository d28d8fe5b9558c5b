//! Deadline queue for per-row auto-close timers.
//!
//! Scheduling hands back a [`TimerHandle`] that the owning row keeps in its
//! state. The handle is not clonable and cancelling consumes it, so a row can
//! never cancel a timer twice or hold on to one it already gave up.

use std::collections::BTreeMap;
use std::time::Duration;

/// Identifier of one scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Owned reference to a pending timer.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "dropping a TimerHandle leaves the timer scheduled; pass it to TimerQueue::cancel"]
pub struct TimerHandle {
    id: TimerId,
    deadline: Duration,
}

impl TimerHandle {
    pub fn id(&self) -> TimerId {
        self.id
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }
}

/// A timer whose deadline has passed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expired<K> {
    pub id: TimerId,
    pub key: K,
    pub deadline: Duration,
}

/// Timers ordered by deadline, ties broken by scheduling order
#[derive(Debug)]
pub struct TimerQueue<K> {
    entries: BTreeMap<(Duration, TimerId), K>,
    next_id: u64,
}

impl<K> Default for TimerQueue<K> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_id: 0,
        }
    }
}

impl<K: Clone> TimerQueue<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, deadline: Duration, key: K) -> TimerHandle {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.entries.insert((deadline, id), key);
        TimerHandle { id, deadline }
    }

    /// Cancel a pending timer. Returns false if it already fired.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.entries.remove(&(handle.deadline, handle.id)).is_some()
    }

    pub fn is_pending(&self, handle: &TimerHandle) -> bool {
        self.entries.contains_key(&(handle.deadline, handle.id))
    }

    /// Remove and return every timer with `deadline <= now`, earliest first.
    pub fn pop_due(&mut self, now: Duration) -> Vec<Expired<K>> {
        let mut due = Vec::new();
        while let Some(entry) = self.entries.first_entry() {
            if entry.key().0 > now {
                break;
            }
            let ((deadline, id), key) = entry.remove_entry();
            due.push(Expired { id, key, deadline });
        }
        due
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.entries.keys().next().map(|(deadline, _)| *deadline)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_pop_due_returns_in_deadline_order() {
        let mut queue = TimerQueue::new();
        let _late = queue.schedule(ms(300), "late");
        let _early = queue.schedule(ms(100), "early");
        let _middle = queue.schedule(ms(200), "middle");

        let due = queue.pop_due(ms(250));
        let keys: Vec<_> = due.iter().map(|e| e.key).collect();
        assert_eq!(keys, vec!["early", "middle"]);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.next_deadline(), Some(ms(300)));
    }

    #[test]
    fn test_deadline_is_inclusive() {
        let mut queue = TimerQueue::new();
        let _handle = queue.schedule(ms(100), 1u32);

        assert!(queue.pop_due(ms(99)).is_empty());
        assert_eq!(queue.pop_due(ms(100)).len(), 1);
    }

    #[test]
    fn test_cancelled_timer_never_fires() {
        let mut queue = TimerQueue::new();
        let handle = queue.schedule(ms(100), 7u32);
        assert!(queue.is_pending(&handle));

        assert!(queue.cancel(handle));
        assert!(queue.pop_due(ms(1_000)).is_empty());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_cancel_after_fire_reports_false() {
        let mut queue = TimerQueue::new();
        let handle = queue.schedule(ms(100), 7u32);
        let fired = queue.pop_due(ms(100));
        assert_eq!(fired[0].id, handle.id());

        assert!(!queue.cancel(handle));
    }

    #[test]
    fn test_same_deadline_keeps_schedule_order() {
        let mut queue = TimerQueue::new();
        let _a = queue.schedule(ms(50), 'a');
        let _b = queue.schedule(ms(50), 'b');

        let keys: Vec<_> = queue.pop_due(ms(50)).into_iter().map(|e| e.key).collect();
        assert_eq!(keys, vec!['a', 'b']);
    }
}
