/*
 * Obstacle Module
 *
 * Static collision geometry as seen by the flock: bounding-sphere proxies
 * owned by the host, and the narrow raycast capability the host supplies to
 * test rays against its real geometry. `SphereRaycaster` is a ready-made
 * capability that treats the proxies themselves as the geometry.
 */

use glam::Vec3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    // True when this sphere overlaps a probe sphere around `point`
    #[inline]
    pub fn overlaps(&self, point: Vec3, reach: f32) -> bool {
        let r = self.radius + reach;
        self.center.distance_squared(point) <= r * r
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    pub distance: f32,
    /// Outward surface normal at the hit point.
    pub normal: Vec3,
    pub point: Vec3,
}

/// Ray intersection against the host's obstacle geometry.
///
/// `direction` is unit length. Implementations return the nearest hit within
/// `max_distance` among `candidates`, or `None`.
pub trait Raycast {
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        candidates: &[BoundingSphere],
    ) -> Option<RayHit>;
}

// Collect obstacles whose bounding sphere comes within `reach` of `point` into `buf`
pub fn candidates_near_into(
    obstacles: &[BoundingSphere],
    point: Vec3,
    reach: f32,
    buf: &mut Vec<BoundingSphere>,
) {
    buf.clear();
    buf.extend(obstacles.iter().copied().filter(|o| o.overlaps(point, reach)));
}

/// Raycaster that intersects rays with the bounding spheres directly.
#[derive(Clone, Copy, Debug, Default)]
pub struct SphereRaycaster;

impl SphereRaycaster {
    fn intersect(origin: Vec3, direction: Vec3, sphere: &BoundingSphere) -> Option<RayHit> {
        let m = origin - sphere.center;
        let b = m.dot(direction);
        let c = m.length_squared() - sphere.radius * sphere.radius;

        // Origin outside and pointing away
        if c > 0.0 && b > 0.0 {
            return None;
        }

        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }

        // Origin inside the sphere counts as a hit at distance zero
        let distance = (-b - discriminant.sqrt()).max(0.0);
        let point = origin + direction * distance;
        let mut normal = (point - sphere.center).normalize_or_zero();
        if normal == Vec3::ZERO {
            normal = -direction;
        }

        Some(RayHit { distance, normal, point })
    }
}

impl Raycast for SphereRaycaster {
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        candidates: &[BoundingSphere],
    ) -> Option<RayHit> {
        candidates
            .iter()
            .filter_map(|sphere| Self::intersect(origin, direction, sphere))
            .filter(|hit| hit.distance <= max_distance)
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn hits_sphere_ahead_with_outward_normal() {
        let sphere = BoundingSphere::new(Vec3::new(10.0, 0.0, 0.0), 2.0);
        let hit = SphereRaycaster
            .raycast(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), 20.0, &[sphere])
            .unwrap();

        assert!(approx(hit.distance, 8.0));
        assert!(approx(hit.point.x, 8.0));
        assert!(approx(hit.normal.x, -1.0));
    }

    #[test]
    fn misses_behind_beside_and_beyond_range() {
        let sphere = BoundingSphere::new(Vec3::new(10.0, 0.0, 0.0), 2.0);
        let ray = SphereRaycaster;

        assert!(ray.raycast(Vec3::ZERO, Vec3::new(-1.0, 0.0, 0.0), 20.0, &[sphere]).is_none());
        assert!(ray.raycast(Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0), 20.0, &[sphere]).is_none());
        assert!(ray.raycast(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), 5.0, &[sphere]).is_none());
    }

    #[test]
    fn picks_nearest_candidate() {
        let near = BoundingSphere::new(Vec3::new(5.0, 0.0, 0.0), 1.0);
        let far = BoundingSphere::new(Vec3::new(12.0, 0.0, 0.0), 1.0);
        let hit = SphereRaycaster
            .raycast(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), 50.0, &[far, near])
            .unwrap();

        assert!(approx(hit.distance, 4.0));
    }

    #[test]
    fn origin_inside_hits_at_zero() {
        let sphere = BoundingSphere::new(Vec3::new(0.5, 0.0, 0.0), 3.0);
        let hit = SphereRaycaster
            .raycast(Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0), 10.0, &[sphere])
            .unwrap();

        assert_eq!(hit.distance, 0.0);
        assert!(approx(hit.normal.x, -1.0));
    }

    #[test]
    fn candidate_filter_uses_reach() {
        let obstacles = [
            BoundingSphere::new(Vec3::new(20.0, 0.0, 0.0), 5.0),
            BoundingSphere::new(Vec3::new(100.0, 0.0, 0.0), 5.0),
        ];
        let mut buf = Vec::new();
        candidates_near_into(&obstacles, Vec3::ZERO, 15.0, &mut buf);

        assert_eq!(buf, vec![obstacles[0]]);
    }
}
