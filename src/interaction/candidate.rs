//! Candidate (interactable) and interactor contracts consumed by the gesture logic.

use std::fmt;
use std::rc::Rc;

use glam::{Quat, Vec2, Vec3};

use super::gesture_logic::GestureEventArgs;
use crate::detection::Collider;

// ── Identities ─────────────────────────────────────────────

/// Stable identity of an interactable, used as the state-tracker key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InteractableId(pub u64);

impl fmt::Display for InteractableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of the interactor driving a gesture logic instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct InteractorId(pub u64);

impl fmt::Display for InteractorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Traits ─────────────────────────────────────────────────

/// The tracked input source (a fingertip) driving the engine.
pub trait Interactor {
    fn id(&self) -> InteractorId;

    /// World-space point used for detection and position queries.
    fn interaction_point(&self) -> Vec3;

    /// Orientation of the fingertip; forward is local -Z.
    fn interaction_rotation(&self) -> Quat {
        Quat::IDENTITY
    }

    /// Radius of the fingertip in meters.
    fn interaction_radius(&self) -> f32 {
        0.0
    }
}

/// A touch-surface region that can receive gesture events.
///
/// Candidates are passed around as [`InteractableRef`] handles and are never
/// owned by the engine.
pub trait Interactable {
    fn id(&self) -> InteractableId;

    /// Layering priority among overlapping surfaces; lower wins.
    fn z_order(&self) -> i32;

    /// Whether this candidate currently wants gesture callbacks.
    fn handles_gestures(&self) -> bool;

    /// 2D interaction coordinate of `interactor` in this candidate's frame.
    /// `None` when the position cannot be resolved.
    fn interaction_position(&self, interactor: &dyn Interactor) -> Option<Vec2>;

    /// Gesture callback, invoked synchronously within the tick that produced `args`.
    fn on_gesture(&self, _args: &GestureEventArgs) {}

    /// Geometry used by detection logics. Candidates without a collider are
    /// invisible to the built-in detection logics.
    fn collider(&self) -> Option<&dyn Collider> {
        None
    }
}

/// Shared handle to a candidate.
pub type InteractableRef = Rc<dyn Interactable>;

// ── Per-frame input ────────────────────────────────────────

/// Per-candidate measurement produced fresh every frame by a detection logic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionInfo {
    /// Lower is more likely the true touch target. Only comparable within a frame.
    pub heuristic: f32,
    /// The candidate is in actual surface contact this frame (not just hovering).
    pub is_selection: bool,
    /// Distance from the fingertip to the candidate. Not interpreted by the engine.
    pub distance: f32,
    /// Closest contact point in world space. Not interpreted by the engine.
    pub point: Vec3,
}

impl InteractionInfo {
    pub fn new(heuristic: f32, is_selection: bool) -> Self {
        Self {
            heuristic,
            is_selection,
            distance: heuristic,
            point: Vec3::ZERO,
        }
    }
}

/// The complete candidate map for one frame, in detection order.
pub type CandidateFrame = Vec<(InteractableRef, InteractionInfo)>;
