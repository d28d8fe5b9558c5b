//! Pointer-to-swipe adapter.
//!
//! Turns raw pointer positions into the start/move/end calls a swipe row
//! understands. A gesture is only claimed as a swipe once horizontal travel
//! outweighs vertical travel; until then drags are left alone, and a release
//! of an unclaimed gesture is reported as a tap.

/// Raw pointer input, in the same units as the row's action width
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { x: f32, y: f32 },
    Drag { x: f32, y: f32 },
    Up { x: f32, y: f32 },
}

/// What the row should be told
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureSignal {
    Start,
    Move { delta_x: f32 },
    End { delta_x: f32 },
    Tap { x: f32, y: f32 },
}

#[derive(Debug, Default)]
pub struct GestureTracker {
    origin: Option<(f32, f32)>,
    claimed: bool,
}

impl GestureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.origin.is_some()
    }

    pub fn is_claimed(&self) -> bool {
        self.claimed
    }

    pub fn handle(&mut self, event: PointerEvent) -> Option<GestureSignal> {
        match event {
            PointerEvent::Down { x, y } => {
                self.origin = Some((x, y));
                self.claimed = false;
                Some(GestureSignal::Start)
            }

            PointerEvent::Drag { x, y } => {
                let (ox, oy) = self.origin?;
                let (dx, dy) = (x - ox, y - oy);
                if !self.claimed {
                    if dx.abs() <= dy.abs() {
                        return None;
                    }
                    self.claimed = true;
                }
                Some(GestureSignal::Move { delta_x: dx })
            }

            PointerEvent::Up { x, y } => {
                let (ox, _) = self.origin.take()?;
                if std::mem::take(&mut self.claimed) {
                    Some(GestureSignal::End { delta_x: x - ox })
                } else {
                    Some(GestureSignal::Tap { x, y })
                }
            }
        }
    }

    /// Drop an in-progress gesture, e.g. when its row goes away
    pub fn reset(&mut self) {
        self.origin = None;
        self.claimed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_drag_is_claimed() {
        let mut tracker = GestureTracker::new();
        assert_eq!(
            tracker.handle(PointerEvent::Down { x: 100.0, y: 10.0 }),
            Some(GestureSignal::Start)
        );
        assert_eq!(
            tracker.handle(PointerEvent::Drag { x: 80.0, y: 12.0 }),
            Some(GestureSignal::Move { delta_x: -20.0 })
        );
        assert!(tracker.is_claimed());
        assert_eq!(
            tracker.handle(PointerEvent::Up { x: 30.0, y: 12.0 }),
            Some(GestureSignal::End { delta_x: -70.0 })
        );
        assert!(!tracker.is_active());
    }

    #[test]
    fn test_vertical_drag_is_not_claimed() {
        let mut tracker = GestureTracker::new();
        tracker.handle(PointerEvent::Down { x: 100.0, y: 10.0 });
        assert_eq!(tracker.handle(PointerEvent::Drag { x: 98.0, y: 30.0 }), None);
        assert_eq!(
            tracker.handle(PointerEvent::Up { x: 98.0, y: 30.0 }),
            Some(GestureSignal::Tap { x: 98.0, y: 30.0 })
        );
    }

    #[test]
    fn test_claimed_gesture_keeps_tracking_vertical_wobble() {
        let mut tracker = GestureTracker::new();
        tracker.handle(PointerEvent::Down { x: 0.0, y: 0.0 });
        tracker.handle(PointerEvent::Drag { x: -10.0, y: 1.0 });
        // Vertical now dominates, but the swipe is already ours
        assert_eq!(
            tracker.handle(PointerEvent::Drag { x: -12.0, y: 40.0 }),
            Some(GestureSignal::Move { delta_x: -12.0 })
        );
    }

    #[test]
    fn test_events_without_down_are_dropped() {
        let mut tracker = GestureTracker::new();
        assert_eq!(tracker.handle(PointerEvent::Drag { x: 5.0, y: 0.0 }), None);
        assert_eq!(tracker.handle(PointerEvent::Up { x: 5.0, y: 0.0 }), None);
    }

    #[test]
    fn test_reset_abandons_gesture() {
        let mut tracker = GestureTracker::new();
        tracker.handle(PointerEvent::Down { x: 0.0, y: 0.0 });
        tracker.handle(PointerEvent::Drag { x: -40.0, y: 0.0 });
        tracker.reset();
        assert_eq!(tracker.handle(PointerEvent::Up { x: -50.0, y: 0.0 }), None);
    }
}
