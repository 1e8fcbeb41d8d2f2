//! Detection logics: turn fingertip geometry into a per-frame candidate map.
//!
//! Provides:
//! - `DetectionLogic`: the contract consumed by the interactor each tick
//! - `Collider` / `RectCollider`: geometry queries against candidate surfaces
//! - `distance`: closest-point distance thresholds
//! - `cone_ray`: cone-sampled ray casts with hit-weighted heuristics
//!
//! The gesture logic only relies on `heuristic` being lower-is-better and
//! comparable within one call, and on `is_selection` meaning real contact.

pub mod collider;
pub mod cone_ray;
pub mod distance;

pub use collider::RectCollider;
pub use cone_ray::{ConeRayAngles, ConeRayCastDetectionLogic};
pub use distance::DistanceDetectionLogic;

use glam::Vec3;

use crate::interaction::{CandidateFrame, InteractableRef, Interactor};

/// A ray intersection with a collider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Distance along the (normalized) ray.
    pub distance: f32,
    /// World-space hit point.
    pub point: Vec3,
}

/// Geometry of a candidate as seen by detection logics.
pub trait Collider {
    /// Cast a ray; `direction` need not be normalized.
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit>;

    /// Closest point on the collider to `point`.
    fn closest_point(&self, point: Vec3) -> Vec3;
}

/// Produces the candidate map for one frame.
pub trait DetectionLogic {
    fn detect_interactables(
        &mut self,
        interactor: &dyn Interactor,
        candidates: &[InteractableRef],
    ) -> CandidateFrame;

    /// Short name for logs and status output.
    fn name(&self) -> &'static str;
}
