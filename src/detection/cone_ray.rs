//! Cone ray-cast detection.
//!
//! Rays are cast from the fingertip in a cone around its forward axis (local
//! -Z). A candidate hit by many short rays is a likelier touch target than
//! one grazed by a few long ones:
//!
//! `heuristic = mean_hit_distance / (hits / total_rays)`
//!
//! Cone directions come either from a uniform generator or from a calibration
//! snapshot computed elsewhere; they are swapped in whole, never mutated.

use std::f32::consts::TAU;

use glam::Vec3;
use tracing::{debug, trace};

use super::DetectionLogic;
use crate::interaction::{CandidateFrame, InteractableRef, InteractionInfo, Interactor};

// ── Cone directions ────────────────────────────────────────

/// Local-space ray directions (unit length) about the fingertip's forward axis.
#[derive(Debug, Clone, PartialEq)]
pub struct ConeRayAngles {
    directions: Vec<Vec3>,
}

impl ConeRayAngles {
    /// A central ray plus `rings` concentric rings of `rays_per_ring` rays,
    /// the outermost ring at `cone_angle_deg` from the axis.
    pub fn uniform(cone_angle_deg: f32, rings: usize, rays_per_ring: usize) -> Self {
        let mut directions = vec![Vec3::NEG_Z];
        if rings > 0 && rays_per_ring > 0 {
            let half_angle = cone_angle_deg.to_radians();
            for ring in 1..=rings {
                let polar = half_angle * ring as f32 / rings as f32;
                for k in 0..rays_per_ring {
                    let azimuth = TAU * k as f32 / rays_per_ring as f32;
                    directions.push(Vec3::new(
                        polar.sin() * azimuth.cos(),
                        polar.sin() * azimuth.sin(),
                        -polar.cos(),
                    ));
                }
            }
        }
        Self { directions }
    }

    /// Use a precomputed set of directions. Degenerate directions are dropped.
    pub fn from_directions(directions: impl IntoIterator<Item = Vec3>) -> Self {
        Self {
            directions: directions
                .into_iter()
                .filter_map(|d| d.try_normalize())
                .collect(),
        }
    }

    pub fn directions(&self) -> &[Vec3] {
        &self.directions
    }

    pub fn len(&self) -> usize {
        self.directions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directions.is_empty()
    }
}

impl Default for ConeRayAngles {
    fn default() -> Self {
        Self::uniform(40.0, 3, 8)
    }
}

// ── Detection logic ────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ConeRayCastDetectionLogic {
    angles: ConeRayAngles,
    /// Rays longer than this (meters) are ignored.
    pub max_ray_distance: f32,
    /// Closest hit within this gap (meters) beyond the fingertip radius is contact.
    pub selection_radius: f32,
}

impl Default for ConeRayCastDetectionLogic {
    fn default() -> Self {
        Self::new(ConeRayAngles::default(), 0.05, 0.005)
    }
}

impl ConeRayCastDetectionLogic {
    pub fn new(angles: ConeRayAngles, max_ray_distance: f32, selection_radius: f32) -> Self {
        Self {
            angles,
            max_ray_distance,
            selection_radius,
        }
    }

    pub fn angles(&self) -> &ConeRayAngles {
        &self.angles
    }

    /// Swap in a new set of cone directions (e.g. a finished calibration).
    pub fn set_cone_angles(&mut self, angles: ConeRayAngles) {
        debug!("cone ray angles replaced: {} -> {} rays", self.angles.len(), angles.len());
        self.angles = angles;
    }
}

impl DetectionLogic for ConeRayCastDetectionLogic {
    fn detect_interactables(
        &mut self,
        interactor: &dyn Interactor,
        candidates: &[InteractableRef],
    ) -> CandidateFrame {
        let mut frame = CandidateFrame::new();
        if self.angles.is_empty() {
            return frame;
        }
        let origin = interactor.interaction_point();
        let rotation = interactor.interaction_rotation();
        let radius = interactor.interaction_radius();
        let total = self.angles.len() as f32;

        for candidate in candidates {
            let Some(collider) = candidate.collider() else {
                continue;
            };
            let mut hits = 0usize;
            let mut sum = 0.0f32;
            let mut closest: Option<(f32, Vec3)> = None;
            for local in self.angles.directions() {
                let Some(hit) = collider.raycast(origin, rotation * *local, self.max_ray_distance)
                else {
                    continue;
                };
                hits += 1;
                sum += hit.distance;
                if closest.map_or(true, |(d, _)| hit.distance < d) {
                    closest = Some((hit.distance, hit.point));
                }
            }
            let Some((min_distance, point)) = closest else {
                continue;
            };
            let mean = sum / hits as f32;
            let heuristic = mean / (hits as f32 / total);
            let gap = (min_distance - radius).max(0.0);
            trace!(
                "candidate {}: {}/{} rays, heuristic {:.4}",
                candidate.id(),
                hits,
                self.angles.len(),
                heuristic
            );
            frame.push((
                candidate.clone(),
                InteractionInfo {
                    heuristic,
                    is_selection: gap <= self.selection_radius,
                    distance: gap,
                    point,
                },
            ));
        }
        frame
    }

    fn name(&self) -> &'static str {
        "cone"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::{FingertipPose, InteractableId, RectSurface};
    use glam::{Quat, Vec2};
    use std::rc::Rc;

    fn surface(id: u64, center: Vec3, half: f32) -> InteractableRef {
        Rc::new(RectSurface::new(id, center, Quat::IDENTITY, Vec2::splat(half)))
    }

    #[test]
    fn test_uniform_ray_count() {
        let angles = ConeRayAngles::uniform(30.0, 2, 6);
        assert_eq!(angles.len(), 1 + 2 * 6);
        for d in angles.directions() {
            assert!((d.length() - 1.0).abs() < 1e-5);
            // All rays point forward within the cone.
            assert!(d.z <= -(30.0f32.to_radians().cos()) + 1e-5);
        }
    }

    #[test]
    fn test_uniform_without_rings_is_single_ray() {
        assert_eq!(ConeRayAngles::uniform(30.0, 0, 6).directions(), &[Vec3::NEG_Z]);
    }

    #[test]
    fn test_from_directions_drops_degenerate() {
        let angles = ConeRayAngles::from_directions([Vec3::ZERO, Vec3::new(0.0, 0.0, -2.0)]);
        assert_eq!(angles.directions(), &[Vec3::NEG_Z]);
    }

    #[test]
    fn test_contact_below_fingertip() {
        let mut logic = ConeRayCastDetectionLogic::default();
        let candidates = vec![surface(1, Vec3::ZERO, 0.05)];
        let pose = FingertipPose::at(Vec3::new(0.0, 0.0, 0.003));
        let frame = logic.detect_interactables(&pose.fingertip(0), &candidates);
        assert_eq!(frame.len(), 1);
        let info = frame[0].1;
        assert!(info.is_selection);
        assert!((info.distance - 0.003).abs() < 1e-5);
    }

    #[test]
    fn test_fuller_coverage_wins() {
        let mut logic = ConeRayCastDetectionLogic::default();
        // Large surface under the fingertip, tiny one off to the side at the same depth.
        let candidates = vec![
            surface(1, Vec3::new(0.0, 0.0, 0.0), 0.05),
            surface(2, Vec3::new(0.0, 0.0, 0.001), 0.0005),
        ];
        let pose = FingertipPose::at(Vec3::new(0.0, 0.0, 0.01));
        let frame = logic.detect_interactables(&pose.fingertip(0), &candidates);
        assert_eq!(frame.len(), 2);
        let big = frame.iter().find(|(c, _)| c.id() == InteractableId(1)).unwrap().1;
        let small = frame.iter().find(|(c, _)| c.id() == InteractableId(2)).unwrap().1;
        assert!(big.heuristic < small.heuristic);
    }

    #[test]
    fn test_out_of_range_not_reported() {
        let mut logic = ConeRayCastDetectionLogic::default();
        let candidates = vec![surface(1, Vec3::ZERO, 0.05)];
        let pose = FingertipPose::at(Vec3::new(0.0, 0.0, 0.2));
        assert!(logic.detect_interactables(&pose.fingertip(0), &candidates).is_empty());
    }

    #[test]
    fn test_set_cone_angles() {
        let mut logic = ConeRayCastDetectionLogic::default();
        logic.set_cone_angles(ConeRayAngles::from_directions([Vec3::NEG_Z]));
        assert_eq!(logic.angles().len(), 1);
        logic.set_cone_angles(ConeRayAngles::from_directions(Vec::new()));
        let candidates = vec![surface(1, Vec3::ZERO, 0.05)];
        let pose = FingertipPose::at(Vec3::new(0.0, 0.0, 0.003));
        assert!(logic.detect_interactables(&pose.fingertip(0), &candidates).is_empty());
    }
}
