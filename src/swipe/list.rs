use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use super::machine::SwipeGeometry;
use super::registry::RowRegistry;
use super::row::{RowOutcome, RowSnapshot, SwipeRowController};
use super::SwipeSettings;
use crate::clock::Clock;
use crate::error::Result;
use crate::timer::TimerQueue;

/// Edit/delete callbacks supplied by whoever owns the records.
///
/// The row is always closed before either callback runs. Delete performs no
/// confirmation here; callers that mutate data must confirm first.
pub trait RowActions<K> {
    fn edit(&mut self, row: &RowSnapshot<K>);
    fn delete(&mut self, row: &RowSnapshot<K>);
}

/// List of swipeable rows in display order.
///
/// Holds the controllers, the open-row registry, the auto-close timers and
/// the clock they run on. Every event is routed through here on a single
/// interaction thread.
pub struct SwipeList<K, A> {
    settings: SwipeSettings,
    geometry: SwipeGeometry,
    clock: Arc<dyn Clock>,
    order: Vec<K>,
    rows: HashMap<K, SwipeRowController<K>>,
    registry: RowRegistry<K>,
    timers: TimerQueue<K>,
    actions: A,
}

impl<K, A> SwipeList<K, A>
where
    K: Clone + Eq + Hash + Debug,
    A: RowActions<K>,
{
    pub fn new(settings: SwipeSettings, clock: Arc<dyn Clock>, actions: A) -> Result<Self> {
        settings.validate()?;
        let geometry = settings.geometry()?;
        Ok(Self {
            settings,
            geometry,
            clock,
            order: Vec::new(),
            rows: HashMap::new(),
            registry: RowRegistry::new(),
            timers: TimerQueue::new(),
            actions,
        })
    }

    pub fn settings(&self) -> &SwipeSettings {
        &self.settings
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Create a row for `id` at the end of the list
    pub fn mount(&mut self, id: K) -> bool {
        if self.rows.contains_key(&id) {
            return false;
        }
        let row = SwipeRowController::new(id.clone(), self.geometry, self.settings.auto_close);
        self.registry.register(id.clone());
        self.rows.insert(id.clone(), row);
        self.order.push(id);
        true
    }

    /// Dispose of a row, cancelling its pending timer
    pub fn unmount(&mut self, id: &K) -> bool {
        let Some(row) = self.rows.remove(id) else {
            return false;
        };
        row.dispose(&mut self.timers);
        self.registry.unregister(id);
        self.order.retain(|k| k != id);
        true
    }

    /// Make the mounted rows match `ids`, in that order.
    ///
    /// Rows that survive keep their state; missing ones are unmounted.
    pub fn sync<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = K>,
    {
        let mut wanted: Vec<K> = Vec::new();
        for id in ids {
            if !wanted.contains(&id) {
                wanted.push(id);
            }
        }
        let stale: Vec<K> = self
            .order
            .iter()
            .filter(|id| !wanted.contains(id))
            .cloned()
            .collect();
        for id in &stale {
            self.unmount(id);
        }
        for id in &wanted {
            self.mount(id.clone());
        }
        self.order = wanted;
        info!(rows = self.order.len(), removed = stale.len(), "Synced swipe rows");
    }

    /// Start a gesture on a row. This stops its idle timer until the gesture
    /// ends through `gesture_end` or `gesture_cancel`.
    pub fn gesture_start(&mut self, id: &K) {
        let now = self.clock.now();
        if let Some(row) = self.rows.get_mut(id) {
            row.on_gesture_start(&mut self.timers, now);
        }
    }

    pub fn gesture_move(&mut self, id: &K, delta_x: f32) {
        let now = self.clock.now();
        if let Some(row) = self.rows.get_mut(id) {
            row.on_gesture_move(delta_x, &mut self.timers, now);
        }
    }

    pub fn gesture_end(&mut self, id: &K, delta_x: f32) -> RowOutcome {
        let now = self.clock.now();
        let Some(row) = self.rows.get_mut(id) else {
            return RowOutcome::Unchanged;
        };
        let outcome = row.on_gesture_end(delta_x, &mut self.timers, now);
        self.after_release(id, outcome, now);
        outcome
    }

    /// End a gesture that never turned into a swipe. An open row gets a fresh
    /// idle timer and a half-dragged row settles where it is.
    pub fn gesture_cancel(&mut self, id: &K) -> RowOutcome {
        let now = self.clock.now();
        let Some(row) = self.rows.get_mut(id) else {
            return RowOutcome::Unchanged;
        };
        let outcome = row.on_gesture_cancel(&mut self.timers, now);
        self.after_release(id, outcome, now);
        outcome
    }

    fn after_release(&mut self, id: &K, outcome: RowOutcome, now: Duration) {
        if outcome != RowOutcome::Opened {
            return;
        }
        let rows = &mut self.rows;
        let timers = &mut self.timers;
        self.registry.notify_opened(id, |previous| {
            if let Some(other) = rows.get_mut(previous) {
                other.close(timers, now);
            }
        });
    }

    pub fn close(&mut self, id: &K) -> RowOutcome {
        let now = self.clock.now();
        match self.rows.get_mut(id) {
            Some(row) => row.close(&mut self.timers, now),
            None => RowOutcome::Unchanged,
        }
    }

    /// Close whichever row is open. Returns its id if one was.
    pub fn close_open_row(&mut self) -> Option<K> {
        let id = self.open_row()?.clone();
        self.close(&id);
        Some(id)
    }

    /// Close the row, then hand it to the edit callback
    pub fn trigger_edit(&mut self, id: &K) -> bool {
        match self.close_for_action(id) {
            Some(snapshot) => {
                self.actions.edit(&snapshot);
                true
            }
            None => false,
        }
    }

    /// Close the row, then hand it to the delete callback
    pub fn trigger_delete(&mut self, id: &K) -> bool {
        match self.close_for_action(id) {
            Some(snapshot) => {
                self.actions.delete(&snapshot);
                true
            }
            None => false,
        }
    }

    fn close_for_action(&mut self, id: &K) -> Option<RowSnapshot<K>> {
        let now = self.clock.now();
        let row = self.rows.get_mut(id)?;
        row.close(&mut self.timers, now);
        Some(row.snapshot())
    }

    /// Fire every auto-close timer that is due. Returns how many rows closed.
    pub fn tick(&mut self) -> usize {
        let now = self.clock.now();
        let mut closed = 0;
        for expired in self.timers.pop_due(now) {
            match self.rows.get_mut(&expired.key) {
                Some(row) => {
                    if row.on_timer_expired(&expired, &mut self.timers, now) == RowOutcome::Closed {
                        debug!(row = ?expired.key, "Auto-closed idle row");
                        closed += 1;
                    }
                }
                None => debug!(row = ?expired.key, "Timer fired for unmounted row"),
            }
        }
        closed
    }

    pub fn animation_finished(&mut self, id: &K) {
        if let Some(row) = self.rows.get_mut(id) {
            row.animation_finished();
        }
    }

    /// Finish every motion older than `length`. Returns how many settled.
    pub fn settle_animations(&mut self, length: Duration) -> usize {
        let now = self.clock.now();
        let mut settled = 0;
        for row in self.rows.values_mut() {
            if row.motion().is_some_and(|m| m.is_finished(now, length)) {
                row.animation_finished();
                settled += 1;
            }
        }
        settled
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.next_deadline()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// The open row, if the registry's last open row is still open
    pub fn open_row(&self) -> Option<&K> {
        self.registry
            .open_row()
            .filter(|id| self.rows.get(*id).is_some_and(|row| row.is_open()))
    }

    pub fn registry(&self) -> &RowRegistry<K> {
        &self.registry
    }

    pub fn row(&self, id: &K) -> Option<&SwipeRowController<K>> {
        self.rows.get(id)
    }

    /// Rows in display order
    pub fn rows(&self) -> impl Iterator<Item = &SwipeRowController<K>> {
        self.order.iter().filter_map(|id| self.rows.get(id))
    }

    pub fn ids(&self) -> &[K] {
        &self.order
    }

    pub fn contains(&self, id: &K) -> bool {
        self.rows.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn actions(&self) -> &A {
        &self.actions
    }

    pub fn actions_mut(&mut self) -> &mut A {
        &mut self.actions
    }
}
