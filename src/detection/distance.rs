//! Distance-threshold detection: the heuristic is the gap between the
//! fingertip surface and the candidate's closest point.

use tracing::trace;

use super::DetectionLogic;
use crate::interaction::{CandidateFrame, InteractableRef, InteractionInfo, Interactor};

#[derive(Debug, Clone, PartialEq)]
pub struct DistanceDetectionLogic {
    /// Candidates farther than this (meters) are not reported.
    pub hover_radius: f32,
    /// Candidates within this gap (meters) are in contact.
    pub selection_radius: f32,
}

impl Default for DistanceDetectionLogic {
    fn default() -> Self {
        Self {
            hover_radius: 0.05,
            selection_radius: 0.005,
        }
    }
}

impl DistanceDetectionLogic {
    pub fn new(hover_radius: f32, selection_radius: f32) -> Self {
        Self {
            hover_radius,
            selection_radius,
        }
    }
}

impl DetectionLogic for DistanceDetectionLogic {
    fn detect_interactables(
        &mut self,
        interactor: &dyn Interactor,
        candidates: &[InteractableRef],
    ) -> CandidateFrame {
        let tip = interactor.interaction_point();
        let radius = interactor.interaction_radius();
        let mut frame = CandidateFrame::new();
        for candidate in candidates {
            let Some(collider) = candidate.collider() else {
                continue;
            };
            let closest = collider.closest_point(tip);
            let gap = ((closest - tip).length() - radius).max(0.0);
            if gap > self.hover_radius {
                continue;
            }
            trace!("candidate {} within {:.4}m", candidate.id(), gap);
            frame.push((
                candidate.clone(),
                InteractionInfo {
                    heuristic: gap,
                    is_selection: gap <= self.selection_radius,
                    distance: gap,
                    point: closest,
                },
            ));
        }
        frame
    }

    fn name(&self) -> &'static str {
        "distance"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::{FingertipPose, InteractableId, RectSurface};
    use glam::{Quat, Vec2, Vec3};
    use std::rc::Rc;

    fn surface(id: u64, z: f32) -> InteractableRef {
        Rc::new(RectSurface::new(
            id,
            Vec3::new(0.0, 0.0, z),
            Quat::IDENTITY,
            Vec2::new(0.02, 0.02),
        ))
    }

    #[test]
    fn test_selection_and_hover() {
        let mut logic = DistanceDetectionLogic::default();
        let candidates = vec![surface(1, 0.0), surface(2, -0.02), surface(3, -1.0)];
        let pose = FingertipPose::at(Vec3::new(0.0, 0.0, 0.003));
        let frame = logic.detect_interactables(&pose.fingertip(0), &candidates);
        assert_eq!(frame.len(), 2);
        let (first, info) = &frame[0];
        assert_eq!(first.id(), InteractableId(1));
        assert!(info.is_selection);
        assert!((info.heuristic - 0.003).abs() < 1e-6);
        let (second, info) = &frame[1];
        assert_eq!(second.id(), InteractableId(2));
        assert!(!info.is_selection);
        assert!(info.heuristic > frame[0].1.heuristic);
    }

    #[test]
    fn test_radius_reduces_gap() {
        let mut logic = DistanceDetectionLogic::default();
        let candidates = vec![surface(1, 0.0)];
        let mut pose = FingertipPose::at(Vec3::new(0.0, 0.0, 0.012));
        pose.radius = 0.01;
        let frame = logic.detect_interactables(&pose.fingertip(0), &candidates);
        assert!(frame[0].1.is_selection);
        assert!((frame[0].1.distance - 0.002).abs() < 1e-5);
    }
}
