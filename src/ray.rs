//! Pick rays, and the ray vs axis-aligned box test the picker is built on.

use lin_alg::f32::Vec3;

use crate::types::Aabb;

#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub origin: Vec3,
    /// Always unit length.
    pub direction: Vec3,
}

impl Ray {
    /// `direction` doesn't need to be normalized.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.to_normalized(),
        }
    }

    pub fn point_at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }

    /// Slab-method intersection. Returns the distance along the ray to the nearest face, or 0
    /// if the origin is inside the box. `None` if the box is missed, or is entirely behind the
    /// origin.
    pub fn intersect_aabb(&self, aabb: &Aabb) -> Option<f32> {
        let o = [self.origin.x, self.origin.y, self.origin.z];
        let d = [self.direction.x, self.direction.y, self.direction.z];
        let min = [aabb.min.x, aabb.min.y, aabb.min.z];
        let max = [aabb.max.x, aabb.max.y, aabb.max.z];

        let mut t_near = f32::NEG_INFINITY;
        let mut t_far = f32::INFINITY;

        for axis in 0..3 {
            if d[axis].abs() < f32::EPSILON {
                // Parallel to this slab; we can only hit if we start between its planes.
                if o[axis] < min[axis] || o[axis] > max[axis] {
                    return None;
                }
                continue;
            }

            let inv = 1. / d[axis];
            let mut t0 = (min[axis] - o[axis]) * inv;
            let mut t1 = (max[axis] - o[axis]) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }

            t_near = t_near.max(t0);
            t_far = t_far.min(t1);

            if t_near > t_far {
                return None;
            }
        }

        if t_far < 0. {
            return None;
        }

        Some(t_near.max(0.))
    }
}
