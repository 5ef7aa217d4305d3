use crate::config::GestureSettings;
use crate::models::{RecordKey, SwipeDirection};
use std::time::Duration;

/// Outcome of a finished drag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    CommitRight,
    CommitLeft,
    Cancel,
}

impl Decision {
    pub fn direction(self) -> Option<SwipeDirection> {
        match self {
            Decision::CommitRight => Some(SwipeDirection::Right),
            Decision::CommitLeft => Some(SwipeDirection::Left),
            Decision::Cancel => None,
        }
    }
}

/// Terminal signal from a finished animation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureEvent {
    /// The card flew off and the settle delay elapsed
    Committed { card: RecordKey, direction: SwipeDirection },
    /// The card returned to rest
    Returned { card: RecordKey },
}

/// Phase of the gesture state machine
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GesturePhase {
    Idle,
    Dragging,
    Animating {
        decision: Decision,
        from_offset: f64,
        from_rotation: f64,
        elapsed: Duration,
    },
    Settling {
        direction: SwipeDirection,
        remaining: Duration,
    },
}

/// Turns a horizontal drag into accept / skip / cancel
///
/// One session per top card: `begin_drag` binds the session to a card key and
/// `reset` drops it. While a commit or cancel animation is in flight new drags
/// are rejected.
#[derive(Debug, Clone)]
pub struct GestureInterpreter {
    settings: GestureSettings,
    card: Option<RecordKey>,
    phase: GesturePhase,
    offset: f64,
    rotation: f64,
}

impl GestureInterpreter {
    pub fn new(settings: GestureSettings) -> Self {
        Self {
            settings,
            card: None,
            phase: GesturePhase::Idle,
            offset: 0.0,
            rotation: 0.0,
        }
    }

    pub fn settings(&self) -> &GestureSettings {
        &self.settings
    }

    /// Start (or resume) dragging `card`; false while an animation is running
    pub fn begin_drag(&mut self, card: RecordKey) -> bool {
        if self.is_animating() {
            tracing::warn!("Rejected drag on {} while an animation is in flight", card);
            return false;
        }

        if self.card != Some(card) {
            self.snap_to_rest();
            self.card = Some(card);
        }
        self.phase = GesturePhase::Dragging;
        true
    }

    pub fn on_drag_update(&mut self, delta_x: f64) {
        if self.phase != GesturePhase::Dragging {
            return;
        }
        self.offset += delta_x;
        self.rotation = self.rotation_for(self.offset);
    }

    /// Classify the drag and start the matching animation
    ///
    /// Outside of a drag this is a no-op returning `Cancel`.
    pub fn on_drag_end(&mut self) -> Decision {
        if self.phase != GesturePhase::Dragging {
            return Decision::Cancel;
        }

        let decision = self.classify(self.offset);
        tracing::debug!("Drag ended at offset {:.1}: {:?}", self.offset, decision);

        self.phase = GesturePhase::Animating {
            decision,
            from_offset: self.offset,
            from_rotation: self.rotation,
            elapsed: Duration::ZERO,
        };
        decision
    }

    /// Strict inequality: an offset of exactly the threshold cancels
    pub fn classify(&self, offset: f64) -> Decision {
        if offset > self.settings.commit_threshold {
            Decision::CommitRight
        } else if offset < -self.settings.commit_threshold {
            Decision::CommitLeft
        } else {
            Decision::Cancel
        }
    }

    /// Never panics, even for settings that skipped validation
    pub fn rotation_for(&self, offset: f64) -> f64 {
        let max = self.settings.max_rotation_degrees.abs();
        let rotation = offset / self.settings.rotation_divisor * max;
        // NaN from either operand collapses to no rotation
        if rotation.is_nan() {
            return 0.0;
        }
        rotation.max(-max).min(max)
    }

    /// Advance the running animation by `dt`
    ///
    /// Returns the terminal event once the animation (plus the settle delay
    /// for commits) has fully elapsed.
    pub fn tick(&mut self, dt: Duration) -> Option<GestureEvent> {
        match self.phase {
            GesturePhase::Idle | GesturePhase::Dragging => None,
            GesturePhase::Animating { decision, from_offset, from_rotation, elapsed } => {
                let elapsed = elapsed.saturating_add(dt);
                let (target_offset, target_rotation) = self.target_for(decision);
                let duration = self.settings.animation_duration();

                let progress = if duration.is_zero() {
                    1.0
                } else {
                    (elapsed.as_secs_f64() / duration.as_secs_f64()).min(1.0)
                };
                let eased = ease_out_cubic(progress);
                self.offset = from_offset + (target_offset - from_offset) * eased;
                self.rotation = from_rotation + (target_rotation - from_rotation) * eased;

                if progress < 1.0 {
                    self.phase = GesturePhase::Animating { decision, from_offset, from_rotation, elapsed };
                    return None;
                }

                match decision.direction() {
                    Some(direction) => {
                        self.phase = GesturePhase::Settling {
                            direction,
                            remaining: self.settings.settle_delay(),
                        };
                        // Time past the end of the animation counts toward the settle delay
                        self.tick(elapsed.saturating_sub(duration))
                    }
                    None => {
                        self.phase = GesturePhase::Idle;
                        self.card.map(|card| GestureEvent::Returned { card })
                    }
                }
            }
            GesturePhase::Settling { direction, remaining } => {
                let remaining = remaining.saturating_sub(dt);
                if !remaining.is_zero() {
                    self.phase = GesturePhase::Settling { direction, remaining };
                    return None;
                }
                self.phase = GesturePhase::Idle;
                self.card.map(|card| GestureEvent::Committed { card, direction })
            }
        }
    }

    /// Snap to rest and forget the card
    pub fn reset(&mut self) {
        self.snap_to_rest();
        self.card = None;
    }

    pub fn is_animating(&self) -> bool {
        matches!(self.phase, GesturePhase::Animating { .. } | GesturePhase::Settling { .. })
    }

    pub fn is_dragging(&self) -> bool {
        self.phase == GesturePhase::Dragging
    }

    pub fn phase(&self) -> GesturePhase {
        self.phase
    }

    pub fn card(&self) -> Option<RecordKey> {
        self.card
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn alpha(&self) -> f64 {
        (1.0 - self.offset.abs() / self.settings.fade_distance).clamp(0.0, 1.0)
    }

    fn target_for(&self, decision: Decision) -> (f64, f64) {
        match decision {
            Decision::CommitRight => (self.settings.fly_off_distance, self.settings.max_rotation_degrees.abs()),
            Decision::CommitLeft => (-self.settings.fly_off_distance, -self.settings.max_rotation_degrees.abs()),
            Decision::Cancel => (0.0, 0.0),
        }
    }

    fn snap_to_rest(&mut self) {
        self.phase = GesturePhase::Idle;
        self.offset = 0.0;
        self.rotation = 0.0;
    }
}

#[inline]
fn ease_out_cubic(t: f64) -> f64 {
    1.0 - (1.0 - t).powi(3)
}
