use std::fmt::Debug;
use std::time::Duration;

use tracing::{debug, warn};

use super::machine::{self, RowPhase, RowPosition, SwipeEffect, SwipeEvent, SwipeGeometry};
use crate::timer::{Expired, TimerHandle, TimerQueue};

/// Visual transition between two offsets, started at `started_at`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    pub from: f32,
    pub to: f32,
    pub started_at: Duration,
}

impl Motion {
    /// Fraction of the animation elapsed at `now`, in `[0, 1]`
    pub fn progress(&self, now: Duration, length: Duration) -> f32 {
        if length.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_sub(self.started_at);
        (elapsed.as_secs_f32() / length.as_secs_f32()).min(1.0)
    }

    pub fn offset_at(&self, now: Duration, length: Duration) -> f32 {
        let t = self.progress(now, length);
        self.from + (self.to - self.from) * t
    }

    pub fn is_finished(&self, now: Duration, length: Duration) -> bool {
        self.progress(now, length) >= 1.0
    }
}

/// State owned by one row
#[derive(Debug, Default)]
pub struct RowState {
    position: RowPosition,
    motion: Option<Motion>,
    auto_close: Option<TimerHandle>,
}

/// Read-only copy of a row handed to edit/delete callbacks
#[derive(Debug, Clone, PartialEq)]
pub struct RowSnapshot<K> {
    pub id: K,
    pub phase: RowPhase,
    pub offset: f32,
}

/// What a controller call asks of the list owner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    Unchanged,
    Moved,
    /// Row committed open; the registry must be notified
    Opened,
    Closed,
}

/// Gesture interpreter and open/close state for a single row
#[derive(Debug)]
pub struct SwipeRowController<K> {
    id: K,
    geometry: SwipeGeometry,
    auto_close_after: Duration,
    state: RowState,
}

impl<K: Clone + Debug> SwipeRowController<K> {
    pub fn new(id: K, geometry: SwipeGeometry, auto_close_after: Duration) -> Self {
        Self {
            id,
            geometry,
            auto_close_after,
            state: RowState::default(),
        }
    }

    pub fn id(&self) -> &K {
        &self.id
    }

    pub fn geometry(&self) -> &SwipeGeometry {
        &self.geometry
    }

    pub fn offset(&self) -> f32 {
        self.state.position.offset
    }

    /// Committed phase. Only ever `Closed`, `Dragging` or `Open`.
    pub fn phase(&self) -> RowPhase {
        self.state.position.phase
    }

    /// Phase as the renderer sees it, `Opening`/`Closing` while a motion runs
    pub fn display_phase(&self) -> RowPhase {
        match (self.state.motion, self.phase()) {
            (Some(_), RowPhase::Open) => RowPhase::Opening,
            (Some(_), RowPhase::Closed) => RowPhase::Closing,
            (_, phase) => phase,
        }
    }

    pub fn motion(&self) -> Option<&Motion> {
        self.state.motion.as_ref()
    }

    /// Offset to draw at `now`, following any in-flight motion
    pub fn visual_offset(&self, now: Duration, animation: Duration) -> f32 {
        match &self.state.motion {
            Some(motion) => motion.offset_at(now, animation),
            None => self.offset(),
        }
    }

    pub fn auto_close_deadline(&self) -> Option<Duration> {
        self.state.auto_close.as_ref().map(TimerHandle::deadline)
    }

    pub fn is_open(&self) -> bool {
        self.phase() == RowPhase::Open
    }

    pub fn snapshot(&self) -> RowSnapshot<K> {
        RowSnapshot {
            id: self.id.clone(),
            phase: self.phase(),
            offset: self.offset(),
        }
    }

    pub fn on_gesture_start(&mut self, timers: &mut TimerQueue<K>, now: Duration) -> RowOutcome {
        self.apply(SwipeEvent::GestureStart, timers, now)
    }

    pub fn on_gesture_move(
        &mut self,
        delta_x: f32,
        timers: &mut TimerQueue<K>,
        now: Duration,
    ) -> RowOutcome {
        self.apply(SwipeEvent::GestureMove { delta_x }, timers, now)
    }

    pub fn on_gesture_end(
        &mut self,
        delta_x: f32,
        timers: &mut TimerQueue<K>,
        now: Duration,
    ) -> RowOutcome {
        self.apply(SwipeEvent::GestureEnd { delta_x }, timers, now)
    }

    /// Release a gesture that was never claimed as a swipe
    pub fn on_gesture_cancel(&mut self, timers: &mut TimerQueue<K>, now: Duration) -> RowOutcome {
        self.apply(SwipeEvent::GestureCancel, timers, now)
    }

    /// Close the row. Safe to call any number of times.
    pub fn close(&mut self, timers: &mut TimerQueue<K>, now: Duration) -> RowOutcome {
        self.apply(SwipeEvent::Close, timers, now)
    }

    /// Handle a fired timer. Stale timers that no longer belong to this row
    /// are dropped without effect.
    pub fn on_timer_expired(
        &mut self,
        expired: &Expired<K>,
        timers: &mut TimerQueue<K>,
        now: Duration,
    ) -> RowOutcome {
        let owned = self
            .state
            .auto_close
            .as_ref()
            .is_some_and(|handle| handle.id() == expired.id);
        if !owned {
            warn!(row = ?self.id, timer = ?expired.id, "Ignoring stale auto-close timer");
            return RowOutcome::Unchanged;
        }
        // Already popped from the queue, nothing left to cancel
        self.state.auto_close = None;
        self.apply(SwipeEvent::TimerExpired, timers, now)
    }

    /// Called by the renderer when the current motion has played out
    pub fn animation_finished(&mut self) {
        self.state.motion = None;
    }

    /// Release everything the row holds. Called when the row unmounts.
    pub fn dispose(mut self, timers: &mut TimerQueue<K>) {
        self.cancel_timer(timers);
        debug!(row = ?self.id, "Disposed swipe row");
    }

    fn apply(
        &mut self,
        event: SwipeEvent,
        timers: &mut TimerQueue<K>,
        now: Duration,
    ) -> RowOutcome {
        let transition = machine::step(&self.geometry, self.state.position, event);
        self.state.position = transition.to;
        if transition.to.phase == RowPhase::Dragging {
            self.state.motion = None;
        }

        let mut opened = false;
        for effect in &transition.effects {
            match *effect {
                SwipeEffect::CancelTimer => self.cancel_timer(timers),
                SwipeEffect::ArmTimer => {
                    self.cancel_timer(timers);
                    let deadline = now + self.auto_close_after;
                    self.state.auto_close = Some(timers.schedule(deadline, self.id.clone()));
                }
                SwipeEffect::AnimateTo { from, to } => {
                    self.state.motion = Some(Motion {
                        from,
                        to,
                        started_at: now,
                    });
                }
                SwipeEffect::NotifyOpened => opened = true,
                SwipeEffect::Noop(reason) => {
                    debug!(row = ?self.id, ?event, ?reason, "Swipe event ignored");
                }
            }
        }

        if transition.from != transition.to {
            debug!(
                row = ?self.id,
                ?event,
                from = ?transition.from.phase,
                to = ?transition.to.phase,
                offset = transition.to.offset,
                "Swipe row transition"
            );
        }

        if opened {
            RowOutcome::Opened
        } else if transition.from.phase != RowPhase::Closed
            && transition.to.phase == RowPhase::Closed
        {
            RowOutcome::Closed
        } else if transition.from != transition.to {
            RowOutcome::Moved
        } else {
            RowOutcome::Unchanged
        }
    }

    fn cancel_timer(&mut self, timers: &mut TimerQueue<K>) {
        if let Some(handle) = self.state.auto_close.take() {
            timers.cancel(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIDTH: f32 = 120.0;
    const AUTO_CLOSE: Duration = Duration::from_secs(5);

    fn row() -> (SwipeRowController<u32>, TimerQueue<u32>) {
        let geometry = SwipeGeometry::new(WIDTH, 0.5).unwrap();
        (SwipeRowController::new(1, geometry, AUTO_CLOSE), TimerQueue::new())
    }

    fn open(row: &mut SwipeRowController<u32>, timers: &mut TimerQueue<u32>, now: Duration) {
        row.on_gesture_start(timers, now);
        row.on_gesture_move(-100.0, timers, now);
        assert_eq!(row.on_gesture_end(-100.0, timers, now), RowOutcome::Opened);
    }

    #[test]
    fn test_new_row_is_closed() {
        let (row, timers) = row();
        assert_eq!(row.phase(), RowPhase::Closed);
        assert_eq!(row.offset(), 0.0);
        assert!(row.motion().is_none());
        assert!(timers.is_empty());
    }

    #[test]
    fn test_rightward_drag_on_closed_row_stays_at_zero() {
        let (mut row, mut timers) = row();
        for dx in [0.0_f32, 1.0, 15.0, 300.0] {
            row.on_gesture_move(dx, &mut timers, Duration::ZERO);
            assert_eq!(row.offset(), 0.0);
        }
    }

    #[test]
    fn test_open_arms_timer_and_starts_motion() {
        let (mut row, mut timers) = row();
        let now = Duration::from_millis(200);
        open(&mut row, &mut timers, now);

        assert_eq!(row.phase(), RowPhase::Open);
        assert_eq!(row.offset(), -WIDTH);
        assert_eq!(row.auto_close_deadline(), Some(now + AUTO_CLOSE));
        assert_eq!(timers.len(), 1);
        assert_eq!(row.display_phase(), RowPhase::Opening);

        row.animation_finished();
        assert_eq!(row.display_phase(), RowPhase::Open);
    }

    #[test]
    fn test_drag_on_open_row_cancels_timer() {
        let (mut row, mut timers) = row();
        open(&mut row, &mut timers, Duration::ZERO);

        row.on_gesture_move(-110.0, &mut timers, Duration::from_secs(1));
        assert_eq!(row.phase(), RowPhase::Dragging);
        assert!(row.auto_close_deadline().is_none());
        assert!(timers.is_empty());
    }

    #[test]
    fn test_close_is_idempotent() {
        let (mut row, mut timers) = row();
        open(&mut row, &mut timers, Duration::ZERO);

        assert_eq!(row.close(&mut timers, Duration::ZERO), RowOutcome::Closed);
        assert_eq!(row.close(&mut timers, Duration::ZERO), RowOutcome::Unchanged);
        assert_eq!(row.phase(), RowPhase::Closed);
        assert_eq!(row.offset(), 0.0);
        assert!(timers.is_empty());
    }

    #[test]
    fn test_stale_timer_is_ignored() {
        let (mut row, mut timers) = row();
        open(&mut row, &mut timers, Duration::ZERO);

        let stale = Expired {
            id: timers.schedule(Duration::from_secs(1), 1).id(),
            key: 1,
            deadline: Duration::from_secs(1),
        };
        assert_eq!(
            row.on_timer_expired(&stale, &mut timers, Duration::from_secs(1)),
            RowOutcome::Unchanged
        );
        assert!(row.is_open());
    }

    #[test]
    fn test_visual_offset_follows_motion() {
        let (mut row, mut timers) = row();
        open(&mut row, &mut timers, Duration::ZERO);
        let length = Duration::from_millis(200);

        // The motion started from the dragged offset, not from zero
        assert_eq!(row.visual_offset(Duration::ZERO, length), -100.0);
        let halfway = row.visual_offset(Duration::from_millis(100), length);
        assert!((halfway + 110.0).abs() < 1e-3, "halfway offset was {}", halfway);
        assert_eq!(row.visual_offset(Duration::from_secs(9), length), -WIDTH);
    }

    #[test]
    fn test_dispose_cancels_timer() {
        let (mut row, mut timers) = row();
        open(&mut row, &mut timers, Duration::ZERO);
        assert_eq!(timers.len(), 1);

        row.dispose(&mut timers);
        assert!(timers.is_empty());
    }

    #[test]
    fn test_motion_progress_with_zero_length() {
        let motion = Motion {
            from: 0.0,
            to: -WIDTH,
            started_at: Duration::ZERO,
        };
        assert_eq!(motion.progress(Duration::ZERO, Duration::ZERO), 1.0);
        assert!(motion.is_finished(Duration::ZERO, Duration::ZERO));
    }
}
