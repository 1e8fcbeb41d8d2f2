//! Tap / swipe classification of finished gestures.

use glam::Vec2;

use super::candidate::InteractableId;
use super::gesture_logic::{GestureEventArgs, GesturePhase};
use crate::config::InteractorConfig;

/// Dominant axis of a swipe in the surface's local frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    Left,
    Right,
    Up,
    Down,
}

impl SwipeDirection {
    pub fn from_vector(v: Vec2) -> Self {
        if v.x.abs() > v.y.abs() {
            if v.x > 0.0 {
                Self::Right
            } else {
                Self::Left
            }
        } else if v.y > 0.0 {
            Self::Up
        } else {
            Self::Down
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

/// Outcome of a finished gesture.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifiedGesture {
    Tap {
        interactable: InteractableId,
        position: Vec2,
        duration_ms: f64,
    },
    Swipe {
        interactable: InteractableId,
        direction: SwipeDirection,
        /// Normalized cumulative direction.
        vector: Vec2,
        distance: f32,
        duration_ms: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct GestureClassifier {
    pub tap_time_threshold_ms: f64,
    pub tap_distance_threshold: f32,
}

impl GestureClassifier {
    pub fn new(config: &InteractorConfig) -> Self {
        Self {
            tap_time_threshold_ms: config.tap_time_threshold_ms,
            tap_distance_threshold: config.tap_distance_threshold,
        }
    }

    /// Classify an end event (`Stopped` / `Canceled`) delivered to a candidate.
    /// Anything else yields `None`.
    pub fn classify(&self, args: &GestureEventArgs) -> Option<ClassifiedGesture> {
        if !args.phase.is_end() {
            return None;
        }
        let interactable = args.interactable_id()?;

        if args.cumulative_distance <= self.tap_distance_threshold {
            if args.time_delta_ms <= self.tap_time_threshold_ms {
                return Some(ClassifiedGesture::Tap {
                    interactable,
                    position: args.current_position,
                    duration_ms: args.time_delta_ms,
                });
            }
            return None;
        }

        if args.phase == GesturePhase::Stopped {
            let vector = args.cumulative_direction.normalize_or_zero();
            return Some(ClassifiedGesture::Swipe {
                interactable,
                direction: SwipeDirection::from_vector(args.cumulative_direction),
                vector,
                distance: args.cumulative_distance,
                duration_ms: args.time_delta_ms,
            });
        }
        None
    }
}
