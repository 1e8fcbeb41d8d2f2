//! Planar rectangular collider.

use glam::{Quat, Vec2, Vec3};

use super::{Collider, RayHit};

/// Rays closer than this to parallel with the plane never hit it.
const PARALLEL_EPSILON: f32 = 1e-6;

/// Rectangle lying in its local XY plane, normal along local +Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectCollider {
    pub center: Vec3,
    pub rotation: Quat,
    pub half_extents: Vec2,
}

impl RectCollider {
    pub fn new(center: Vec3, rotation: Quat, half_extents: Vec2) -> Self {
        Self {
            center,
            rotation: rotation.normalize(),
            half_extents: half_extents.abs(),
        }
    }

    pub fn to_local(&self, point: Vec3) -> Vec3 {
        self.rotation.inverse() * (point - self.center)
    }

    pub fn to_world(&self, local: Vec3) -> Vec3 {
        self.center + self.rotation * local
    }

    /// 2D coordinate of `point` projected onto the rectangle's plane.
    pub fn local_position(&self, point: Vec3) -> Vec2 {
        self.to_local(point).truncate()
    }

    pub fn normal(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    fn contains_local(&self, local: Vec2) -> bool {
        local.x.abs() <= self.half_extents.x && local.y.abs() <= self.half_extents.y
    }
}

impl Collider for RectCollider {
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        let direction = direction.try_normalize()?;
        let o = self.to_local(origin);
        let d = self.rotation.inverse() * direction;
        if d.z.abs() < PARALLEL_EPSILON {
            return None;
        }
        let t = -o.z / d.z;
        if t < 0.0 || t > max_distance {
            return None;
        }
        let hit = o + d * t;
        if !self.contains_local(hit.truncate()) {
            return None;
        }
        Some(RayHit {
            distance: t,
            point: self.to_world(hit),
        })
    }

    fn closest_point(&self, point: Vec3) -> Vec3 {
        let local = self.to_local(point).truncate();
        let clamped = local.clamp(-self.half_extents, self.half_extents);
        self.to_world(clamped.extend(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_rect() -> RectCollider {
        RectCollider::new(Vec3::ZERO, Quat::IDENTITY, Vec2::new(0.5, 0.5))
    }

    #[test]
    fn test_raycast_hits_front() {
        let rect = unit_rect();
        let hit = rect
            .raycast(Vec3::new(0.1, 0.2, 1.0), Vec3::new(0.0, 0.0, -2.0), 5.0)
            .unwrap();
        assert!((hit.distance - 1.0).abs() < 1e-6);
        assert!((hit.point - Vec3::new(0.1, 0.2, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_raycast_misses() {
        let rect = unit_rect();
        // Outside the extents.
        assert!(rect
            .raycast(Vec3::new(2.0, 0.0, 1.0), Vec3::NEG_Z, 5.0)
            .is_none());
        // Pointing away.
        assert!(rect.raycast(Vec3::new(0.0, 0.0, 1.0), Vec3::Z, 5.0).is_none());
        // Parallel.
        assert!(rect.raycast(Vec3::new(0.0, 0.0, 1.0), Vec3::X, 5.0).is_none());
        // Too far.
        assert!(rect
            .raycast(Vec3::new(0.0, 0.0, 1.0), Vec3::NEG_Z, 0.5)
            .is_none());
    }

    #[test]
    fn test_closest_point_clamps_to_edges() {
        let rect = unit_rect();
        let p = rect.closest_point(Vec3::new(2.0, 0.25, 0.3));
        assert!((p - Vec3::new(0.5, 0.25, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_rotated_rect_local_position() {
        // Rect facing +X.
        let rect = RectCollider::new(
            Vec3::new(1.0, 0.0, 0.0),
            Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
            Vec2::new(0.5, 0.5),
        );
        assert!((rect.normal() - Vec3::X).length() < 1e-5);
        let hit = rect
            .raycast(Vec3::new(2.0, 0.1, 0.0), Vec3::NEG_X, 5.0)
            .unwrap();
        assert!((hit.distance - 1.0).abs() < 1e-5);
        let local = rect.local_position(Vec3::new(1.2, 0.1, 0.0));
        assert!((local.y - 0.1).abs() < 1e-5);
    }
}
