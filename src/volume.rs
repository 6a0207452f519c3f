// Axis-aligned boxes used for look rays, trigger volumes and view-cone checks.
use bevy::prelude::*;

/// Half extents of an axis-aligned box centred on the entity's translation.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct BoxExtent(pub Vec3);

impl BoxExtent {
    pub fn cube(half: f32) -> Self {
        Self(Vec3::splat(half))
    }

    pub fn contains(&self, center: Vec3, point: Vec3) -> bool {
        let d = (point - center).abs();
        d.x <= self.0.x && d.y <= self.0.y && d.z <= self.0.z
    }

    /// Distance along the ray to the box, if hit. Rays starting inside hit at 0.
    pub fn ray_distance(&self, center: Vec3, origin: Vec3, dir: Vec3) -> Option<f32> {
        let min = center - self.0;
        let max = center + self.0;
        let mut t_near = f32::NEG_INFINITY;
        let mut t_far = f32::INFINITY;

        for axis in 0..3 {
            let o = origin[axis];
            let d = dir[axis];
            if d.abs() < f32::EPSILON {
                // Parallel to this slab: must already be between the planes.
                if o < min[axis] || o > max[axis] {
                    return None;
                }
                continue;
            }
            let t1 = (min[axis] - o) / d;
            let t2 = (max[axis] - o) / d;
            t_near = t_near.max(t1.min(t2));
            t_far = t_far.min(t1.max(t2));
        }

        if t_near > t_far || t_far < 0.0 {
            return None;
        }
        Some(t_near.max(0.0))
    }

    /// Evenly spaced grid of points covering the box, `per_axis` per side.
    pub fn sample_points(&self, center: Vec3, per_axis: usize) -> Vec<Vec3> {
        if per_axis < 2 {
            return vec![center];
        }
        let min = center - self.0;
        let size = self.0 * 2.0;
        let steps = (per_axis - 1) as f32;
        let mut points = Vec::with_capacity(per_axis.pow(3));
        for x in 0..per_axis {
            for y in 0..per_axis {
                for z in 0..per_axis {
                    let t = Vec3::new(x as f32, y as f32, z as f32) / steps;
                    points.push(min + size * t);
                }
            }
        }
        points
    }
}

/// Angle in radians between `forward` and the direction to `point`.
pub fn view_angle(eye: Vec3, forward: Vec3, point: Vec3) -> f32 {
    let to_point = (point - eye).normalize_or_zero();
    if to_point == Vec3::ZERO {
        return 0.0;
    }
    forward.normalize_or_zero().angle_between(to_point)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ray_hits_box_in_front_only() {
        let extent = BoxExtent(Vec3::new(0.5, 1.0, 0.1));
        let center = Vec3::new(0.0, 1.5, -3.0);

        let hit = extent.ray_distance(center, Vec3::new(0.0, 1.5, 0.0), Vec3::NEG_Z);
        assert!((hit.unwrap() - 2.9).abs() < 1e-4);

        assert!(extent
            .ray_distance(center, Vec3::new(0.0, 1.5, 0.0), Vec3::Z)
            .is_none());
        assert!(extent
            .ray_distance(center, Vec3::new(2.0, 1.5, 0.0), Vec3::NEG_Z)
            .is_none());
    }

    #[test]
    fn ray_from_inside_hits_at_zero() {
        let extent = BoxExtent::cube(1.0);
        assert_eq!(extent.ray_distance(Vec3::ZERO, Vec3::ZERO, Vec3::X), Some(0.0));
    }

    #[test]
    fn sample_grid_covers_corners() {
        let extent = BoxExtent::cube(1.0);
        let points = extent.sample_points(Vec3::ZERO, 3);
        assert_eq!(points.len(), 27);
        assert!(points.contains(&Vec3::splat(-1.0)));
        assert!(points.contains(&Vec3::splat(1.0)));
        assert!(points.contains(&Vec3::ZERO));
        assert_eq!(extent.sample_points(Vec3::ONE, 1), vec![Vec3::ONE]);
    }

    #[test]
    fn view_angle_measures_from_forward() {
        let angle = view_angle(Vec3::ZERO, Vec3::NEG_Z, Vec3::new(1.0, 0.0, 0.0));
        assert!((angle - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
        assert!(view_angle(Vec3::ZERO, Vec3::NEG_Z, Vec3::new(0.0, 0.0, -4.0)) < 1e-5);
    }
}
