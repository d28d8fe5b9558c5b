//! Pure swipe transition function.
//!
//! ```text
//! Closed --move--> Dragging --release past threshold--> Open
//!                  Dragging --release short of it-----> Closed
//! Open --timer expiry | close | release--> Closed
//! ```
//!
//! [`step`] never touches timers, the registry or the renderer. It returns the
//! next resting position plus the effects the owning controller has to carry
//! out, in order.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SwipeError};

/// Lifecycle phase of one row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowPhase {
    Closed,
    Dragging,
    Open,
    /// Animating towards `Closed`
    Closing,
    /// Animating towards `Open`
    Opening,
}

impl RowPhase {
    /// Phase the row settles in once any animation finishes
    pub fn at_rest(self) -> RowPhase {
        match self {
            RowPhase::Closing => RowPhase::Closed,
            RowPhase::Opening => RowPhase::Open,
            other => other,
        }
    }
}

/// Horizontal geometry of a row: how far it opens and where it commits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwipeGeometry {
    action_width: f32,
    open_ratio: f32,
}

impl SwipeGeometry {
    pub fn new(action_width: f32, open_ratio: f32) -> Result<Self> {
        if !action_width.is_finite() || action_width <= 0.0 {
            return Err(SwipeError::InvalidActionWidth {
                width: action_width,
            });
        }
        if !open_ratio.is_finite() || open_ratio <= 0.0 || open_ratio >= 1.0 {
            return Err(SwipeError::InvalidOpenRatio { ratio: open_ratio });
        }
        Ok(Self {
            action_width,
            open_ratio,
        })
    }

    pub fn action_width(&self) -> f32 {
        self.action_width
    }

    pub fn open_ratio(&self) -> f32 {
        self.open_ratio
    }

    /// Offset of a fully open row
    pub fn open_offset(&self) -> f32 {
        -self.action_width
    }

    /// A release strictly left of this commits the row open
    pub fn commit_threshold(&self) -> f32 {
        -self.action_width * self.open_ratio
    }

    /// Clamp a drag delta into `[-action_width, 0]`
    pub fn clamp(&self, delta_x: f32) -> f32 {
        delta_x.clamp(-self.action_width, 0.0)
    }
}

/// Offset and phase of a row between events
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowPosition {
    pub offset: f32,
    pub phase: RowPhase,
}

impl RowPosition {
    pub const CLOSED: RowPosition = RowPosition {
        offset: 0.0,
        phase: RowPhase::Closed,
    };
}

impl Default for RowPosition {
    fn default() -> Self {
        Self::CLOSED
    }
}

/// Input to the transition function
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SwipeEvent {
    GestureStart,
    GestureMove { delta_x: f32 },
    GestureEnd { delta_x: f32 },
    /// The pointer let go without ever claiming the gesture
    GestureCancel,
    Close,
    TimerExpired,
}

/// Why an event left the row untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoopReason {
    NonFiniteDelta,
    TimerWhileNotOpen,
}

/// Work the controller performs after a transition
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SwipeEffect {
    CancelTimer,
    ArmTimer,
    AnimateTo { from: f32, to: f32 },
    NotifyOpened,
    Noop(NoopReason),
}

/// Result of applying one event
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub from: RowPosition,
    pub to: RowPosition,
    pub effects: Vec<SwipeEffect>,
}

impl Transition {
    fn unchanged(from: RowPosition, effects: Vec<SwipeEffect>) -> Self {
        Self {
            from,
            to: from,
            effects,
        }
    }

    pub fn opened(&self) -> bool {
        self.effects.contains(&SwipeEffect::NotifyOpened)
    }
}

pub fn step(geometry: &SwipeGeometry, from: RowPosition, event: SwipeEvent) -> Transition {
    match event {
        SwipeEvent::GestureStart => Transition::unchanged(from, vec![SwipeEffect::CancelTimer]),

        SwipeEvent::GestureMove { delta_x } => {
            if !delta_x.is_finite() {
                return Transition::unchanged(
                    from,
                    vec![SwipeEffect::Noop(NoopReason::NonFiniteDelta)],
                );
            }
            Transition {
                from,
                to: RowPosition {
                    offset: geometry.clamp(delta_x),
                    phase: RowPhase::Dragging,
                },
                effects: vec![SwipeEffect::CancelTimer],
            }
        }

        SwipeEvent::GestureEnd { delta_x } => {
            // A release with a garbage delta resolves on where the row already is
            let delta_x = if delta_x.is_finite() {
                delta_x
            } else {
                from.offset
            };
            if delta_x < geometry.commit_threshold() {
                let to = RowPosition {
                    offset: geometry.open_offset(),
                    phase: RowPhase::Open,
                };
                let mut effects = animate(from.offset, to.offset);
                effects.push(SwipeEffect::NotifyOpened);
                effects.push(SwipeEffect::ArmTimer);
                Transition { from, to, effects }
            } else {
                close(from)
            }
        }

        SwipeEvent::GestureCancel => match from.phase {
            // Start already stopped the idle timer, so an untouched open row needs a fresh one
            RowPhase::Open => Transition::unchanged(from, vec![SwipeEffect::ArmTimer]),
            RowPhase::Dragging => step(
                geometry,
                from,
                SwipeEvent::GestureEnd {
                    delta_x: from.offset,
                },
            ),
            _ => Transition::unchanged(from, Vec::new()),
        },

        SwipeEvent::Close => close(from),

        SwipeEvent::TimerExpired => {
            if from.phase == RowPhase::Open {
                close(from)
            } else {
                Transition::unchanged(
                    from,
                    vec![SwipeEffect::Noop(NoopReason::TimerWhileNotOpen)],
                )
            }
        }
    }
}

fn close(from: RowPosition) -> Transition {
    let mut effects = vec![SwipeEffect::CancelTimer];
    effects.extend(animate(from.offset, 0.0));
    Transition {
        from,
        to: RowPosition::CLOSED,
        effects,
    }
}

fn animate(from: f32, to: f32) -> Vec<SwipeEffect> {
    if from == to {
        Vec::new()
    } else {
        vec![SwipeEffect::AnimateTo { from, to }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> SwipeGeometry {
        SwipeGeometry::new(120.0, 0.5).unwrap()
    }

    fn at(offset: f32, phase: RowPhase) -> RowPosition {
        RowPosition { offset, phase }
    }

    #[test]
    fn test_geometry_rejects_bad_values() {
        assert!(SwipeGeometry::new(0.0, 0.5).is_err());
        assert!(SwipeGeometry::new(-10.0, 0.5).is_err());
        assert!(SwipeGeometry::new(f32::NAN, 0.5).is_err());
        assert!(SwipeGeometry::new(120.0, 0.0).is_err());
        assert!(SwipeGeometry::new(120.0, 1.0).is_err());
        assert!(SwipeGeometry::new(120.0, f32::INFINITY).is_err());
    }

    #[test]
    fn test_threshold_scales_with_ratio() {
        let g = SwipeGeometry::new(200.0, 0.25).unwrap();
        assert_eq!(g.commit_threshold(), -50.0);
        assert_eq!(g.open_offset(), -200.0);
    }

    #[test]
    fn test_move_tracks_delta_directly() {
        let g = geometry();
        for dx in [-0.5_f32, -30.0, -60.0, -119.9, -120.0] {
            let t = step(&g, RowPosition::CLOSED, SwipeEvent::GestureMove { delta_x: dx });
            assert_eq!(t.to, at(dx, RowPhase::Dragging), "dx = {}", dx);
        }
    }

    #[test]
    fn test_move_clamps_both_ends() {
        let g = geometry();
        let t = step(&g, RowPosition::CLOSED, SwipeEvent::GestureMove { delta_x: 45.0 });
        assert_eq!(t.to.offset, 0.0);

        let t = step(&g, RowPosition::CLOSED, SwipeEvent::GestureMove { delta_x: -500.0 });
        assert_eq!(t.to.offset, -120.0);
    }

    #[test]
    fn test_non_finite_move_is_ignored() {
        let g = geometry();
        let from = at(-40.0, RowPhase::Dragging);
        for dx in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            let t = step(&g, from, SwipeEvent::GestureMove { delta_x: dx });
            assert_eq!(t.to, from);
            assert_eq!(t.effects, vec![SwipeEffect::Noop(NoopReason::NonFiniteDelta)]);
        }
    }

    #[test]
    fn test_release_past_threshold_opens() {
        let g = geometry();
        let t = step(&g, at(-70.0, RowPhase::Dragging), SwipeEvent::GestureEnd { delta_x: -70.0 });
        assert_eq!(t.to, at(-120.0, RowPhase::Open));
        assert_eq!(
            t.effects,
            vec![
                SwipeEffect::AnimateTo { from: -70.0, to: -120.0 },
                SwipeEffect::NotifyOpened,
                SwipeEffect::ArmTimer,
            ]
        );
        assert!(t.opened());
    }

    #[test]
    fn test_release_exactly_at_threshold_closes() {
        let g = geometry();
        let t = step(&g, at(-60.0, RowPhase::Dragging), SwipeEvent::GestureEnd { delta_x: -60.0 });
        assert_eq!(t.to, RowPosition::CLOSED);
        assert!(!t.opened());
    }

    #[test]
    fn test_non_finite_release_uses_current_offset() {
        let g = geometry();
        let nan = SwipeEvent::GestureEnd { delta_x: f32::NAN };
        let t = step(&g, at(-100.0, RowPhase::Dragging), nan);
        assert_eq!(t.to.phase, RowPhase::Open);

        let t = step(&g, at(-10.0, RowPhase::Dragging), nan);
        assert_eq!(t.to.phase, RowPhase::Closed);
    }

    #[test]
    fn test_close_on_closed_row_only_cancels() {
        let g = geometry();
        let t = step(&g, RowPosition::CLOSED, SwipeEvent::Close);
        assert_eq!(t.to, RowPosition::CLOSED);
        assert_eq!(t.effects, vec![SwipeEffect::CancelTimer]);
    }

    #[test]
    fn test_timer_expiry_only_closes_open_rows() {
        let g = geometry();
        let t = step(&g, at(-120.0, RowPhase::Open), SwipeEvent::TimerExpired);
        assert_eq!(t.to, RowPosition::CLOSED);

        let dragging = at(-30.0, RowPhase::Dragging);
        let t = step(&g, dragging, SwipeEvent::TimerExpired);
        assert_eq!(t.to, dragging);
    }

    #[test]
    fn test_phase_at_rest() {
        assert_eq!(RowPhase::Opening.at_rest(), RowPhase::Open);
        assert_eq!(RowPhase::Closing.at_rest(), RowPhase::Closed);
        assert_eq!(RowPhase::Dragging.at_rest(), RowPhase::Dragging);
    }

    #[test]
    fn test_cancel_rearms_open_row_and_settles_drag() {
        let g = geometry();
        let open = at(-120.0, RowPhase::Open);
        let t = step(&g, open, SwipeEvent::GestureCancel);
        assert_eq!(t.to, open);
        assert_eq!(t.effects, vec![SwipeEffect::ArmTimer]);

        let t = step(&g, at(-90.0, RowPhase::Dragging), SwipeEvent::GestureCancel);
        assert_eq!(t.to.phase, RowPhase::Open);
        assert!(t.opened());

        let t = step(&g, RowPosition::CLOSED, SwipeEvent::GestureCancel);
        assert_eq!(t.to, RowPosition::CLOSED);
        assert!(t.effects.is_empty());
    }
}
