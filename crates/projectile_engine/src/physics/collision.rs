//! Ray casting against scene geometry
//!
//! Provides the [`OcclusionQuery`] seam the trajectory predictor uses to find
//! the first obstruction along a flight path, plus a simple analytic
//! implementation ([`SceneOcclusion`]) over spheres, triangles and planes.

use crate::foundation::collections::ObjectId;
use crate::foundation::math::{utils, Vec3};

/// A ray for ray casting
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// The origin point of the ray in world space
    pub origin: Vec3,
    /// The direction of the ray (always unit length)
    pub direction: Vec3,
}

impl Ray {
    /// Creates a new ray, or `None` when `direction` has no length
    pub fn new(origin: Vec3, direction: Vec3) -> Option<Self> {
        utils::safe_direction(&direction).map(|direction| Self { origin, direction })
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f64) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Result of a ray intersection test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// The object that was hit
    pub object: ObjectId,
    /// The distance from the ray origin to the hit point
    pub distance: f64,
    /// The point of intersection in world space
    pub point: Vec3,
    /// The surface normal at the intersection point
    pub normal: Vec3,
}

/// Scene ray-intersection collaborator
pub trait OcclusionQuery {
    /// Cast a ray and report the nearest hit no further than `max_distance`
    ///
    /// `direction` is expected to be unit length. Implementations must answer
    /// "no hit" for a zero direction instead of normalizing it.
    fn cast(&self, origin: Vec3, direction: Vec3, max_distance: f64) -> Option<RayHit>;
}

impl<T: OcclusionQuery + ?Sized> OcclusionQuery for &T {
    fn cast(&self, origin: Vec3, direction: Vec3, max_distance: f64) -> Option<RayHit> {
        (**self).cast(origin, direction, max_distance)
    }
}

/// Occlusion query for an empty scene
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOcclusion;

impl OcclusionQuery for NoOcclusion {
    fn cast(&self, _origin: Vec3, _direction: Vec3, _max_distance: f64) -> Option<RayHit> {
        None
    }
}

/// A bounding sphere
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    /// The center position of the sphere in world space
    pub center: Vec3,
    /// The radius of the sphere
    pub radius: f64,
}

impl BoundingSphere {
    /// Creates a new bounding sphere with the given center and radius
    pub const fn new(center: Vec3, radius: f64) -> Self {
        Self { center, radius }
    }

    /// Test ray intersection with this sphere
    /// Returns (distance, hit_point, normal) if hit, None otherwise
    pub fn intersect_ray(&self, ray: &Ray) -> Option<(f64, Vec3, Vec3)> {
        // Solve |origin + t*direction - center|^2 = radius^2 with |direction| = 1
        let oc = ray.origin - self.center;
        let b = oc.dot(&ray.direction);
        let c = oc.dot(&oc) - self.radius * self.radius;

        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }

        let sqrt_discriminant = discriminant.sqrt();
        let t1 = -b - sqrt_discriminant;
        let t2 = -b + sqrt_discriminant;

        // Use the closest non-negative intersection
        let t = if t1 >= 0.0 {
            t1
        } else if t2 >= 0.0 {
            t2
        } else {
            return None;
        };

        let hit_point = ray.point_at(t);
        let normal = utils::safe_direction(&(hit_point - self.center)).unwrap_or_else(|| -ray.direction);

        Some((t, hit_point, normal))
    }
}

/// A triangle for collision detection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// First vertex in world space
    pub v0: Vec3,
    /// Second vertex in world space
    pub v1: Vec3,
    /// Third vertex in world space
    pub v2: Vec3,
}

impl Triangle {
    /// Creates a new triangle
    pub const fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        Self { v0, v1, v2 }
    }

    /// Calculates the normal of the triangle (right-hand rule)
    pub fn normal(&self) -> Vec3 {
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;
        edge1.cross(&edge2).normalize()
    }

    /// Möller-Trumbore ray-triangle intersection
    /// Returns (t, u, v) barycentric coordinates if hit, None otherwise
    pub fn intersect_ray(&self, ray: &Ray) -> Option<(f64, f64, f64)> {
        const EPSILON: f64 = 1.0e-12;

        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;

        let h = ray.direction.cross(&edge2);
        let a = edge1.dot(&h);

        // Ray parallel to triangle
        if a.abs() < EPSILON {
            return None;
        }

        let f = 1.0 / a;
        let s = ray.origin - self.v0;
        let u = f * s.dot(&h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(&edge1);
        let v = f * ray.direction.dot(&q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * edge2.dot(&q);
        if t >= 0.0 {
            Some((t, u, v))
        } else {
            None
        }
    }
}

/// An infinite plane, e.g. a ground floor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Any point on the plane
    pub point: Vec3,
    /// Unit normal
    pub normal: Vec3,
}

impl Plane {
    /// Create a plane through `point` facing `normal`
    pub fn new(point: Vec3, normal: Vec3) -> Option<Self> {
        utils::safe_direction(&normal).map(|normal| Self { point, normal })
    }

    /// Horizontal ground plane at height `z`
    pub fn ground(z: f64) -> Self {
        Self {
            point: Vec3::new(0.0, 0.0, z),
            normal: Vec3::z(),
        }
    }

    /// Distance along the ray to the plane, if the ray reaches it
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f64> {
        let denom = self.normal.dot(&ray.direction);
        if denom.abs() < 1.0e-12 {
            return None;
        }
        let t = (self.point - ray.origin).dot(&self.normal) / denom;
        (t >= 0.0).then_some(t)
    }
}

/// Collision geometry for ray casting
#[derive(Debug, Clone, PartialEq)]
pub enum CollisionShape {
    /// Sphere collision
    Sphere(BoundingSphere),
    /// Triangle soup collision
    Mesh(Vec<Triangle>),
    /// Infinite plane
    Plane(Plane),
}

impl CollisionShape {
    /// Test ray intersection with this collision shape
    /// Returns (distance, hit_point, normal)
    pub fn intersect_ray(&self, ray: &Ray) -> Option<(f64, Vec3, Vec3)> {
        match self {
            Self::Sphere(sphere) => sphere.intersect_ray(ray),
            Self::Mesh(triangles) => triangles
                .iter()
                .filter_map(|triangle| triangle.intersect_ray(ray).map(|(t, _, _)| (t, triangle)))
                .min_by(|a, b| a.0.total_cmp(&b.0))
                .map(|(t, triangle)| {
                    let mut normal = triangle.normal();
                    if normal.dot(&ray.direction) > 0.0 {
                        normal = -normal;
                    }
                    (t, ray.point_at(t), normal)
                }),
            Self::Plane(plane) => plane.intersect_ray(ray).map(|t| {
                let normal = if plane.normal.dot(&ray.direction) > 0.0 {
                    -plane.normal
                } else {
                    plane.normal
                };
                (t, ray.point_at(t), normal)
            }),
        }
    }
}

/// A collision shape owned by a scene object
#[derive(Debug, Clone, PartialEq)]
pub struct Collider {
    /// Owning object
    pub object: ObjectId,
    /// Geometry
    pub shape: CollisionShape,
}

/// Brute-force occlusion query over a list of colliders
#[derive(Debug, Clone, Default)]
pub struct SceneOcclusion {
    colliders: Vec<Collider>,
}

impl SceneOcclusion {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a collider for `object`
    pub fn insert(&mut self, object: ObjectId, shape: CollisionShape) {
        self.colliders.push(Collider { object, shape });
    }

    /// Builder-style variant of [`Self::insert`]
    #[must_use]
    pub fn with(mut self, object: ObjectId, shape: CollisionShape) -> Self {
        self.insert(object, shape);
        self
    }

    /// Remove every collider owned by `object`
    pub fn remove(&mut self, object: ObjectId) {
        self.colliders.retain(|collider| collider.object != object);
    }

    /// Number of colliders
    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    /// Whether the scene has no colliders
    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }
}

impl OcclusionQuery for SceneOcclusion {
    fn cast(&self, origin: Vec3, direction: Vec3, max_distance: f64) -> Option<RayHit> {
        let ray = Ray::new(origin, direction)?;

        self.colliders
            .iter()
            .filter_map(|collider| {
                collider
                    .shape
                    .intersect_ray(&ray)
                    .filter(|(distance, _, _)| *distance <= max_distance)
                    .map(|(distance, point, normal)| RayHit {
                        object: collider.object,
                        distance,
                        point,
                        normal,
                    })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ray_rejects_zero_direction() {
        assert!(Ray::new(Vec3::zeros(), Vec3::zeros()).is_none());
    }

    #[test]
    fn test_sphere_hit_front_face() {
        let sphere = BoundingSphere::new(Vec3::new(0.0, 0.0, 10.0), 2.0);
        let ray = Ray::new(Vec3::zeros(), Vec3::new(0.0, 0.0, 5.0)).unwrap();

        let (t, point, normal) = sphere.intersect_ray(&ray).unwrap();
        assert_relative_eq!(t, 8.0);
        assert_relative_eq!(point, Vec3::new(0.0, 0.0, 8.0));
        assert_relative_eq!(normal, Vec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn test_sphere_miss() {
        let sphere = BoundingSphere::new(Vec3::new(5.0, 0.0, 0.0), 1.0);
        let ray = Ray::new(Vec3::zeros(), Vec3::new(0.0, 1.0, 0.0)).unwrap();
        assert!(sphere.intersect_ray(&ray).is_none());
    }

    #[test]
    fn test_triangle_hit() {
        let triangle = Triangle::new(
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        );
        let ray = Ray::new(Vec3::new(0.0, 0.0, 3.0), Vec3::new(0.0, 0.0, -1.0)).unwrap();

        let (t, _, _) = triangle.intersect_ray(&ray).unwrap();
        assert_relative_eq!(t, 3.0);
    }

    #[test]
    fn test_plane_parallel_ray_misses() {
        let plane = Plane::ground(0.0);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 1.0), Vec3::x()).unwrap();
        assert!(plane.intersect_ray(&ray).is_none());
    }

    #[test]
    fn test_scene_respects_max_distance() {
        let scene = SceneOcclusion::new().with(ObjectId(3), CollisionShape::Plane(Plane::ground(0.0)));
        let down = Vec3::new(0.0, 0.0, -1.0);

        assert!(scene.cast(Vec3::new(0.0, 0.0, 5.0), down, 4.0).is_none());

        let hit = scene.cast(Vec3::new(0.0, 0.0, 5.0), down, 6.0).unwrap();
        assert_eq!(hit.object, ObjectId(3));
        assert_relative_eq!(hit.point, Vec3::zeros());
    }

    #[test]
    fn test_scene_reports_nearest_hit() {
        let scene = SceneOcclusion::new()
            .with(ObjectId(1), CollisionShape::Sphere(BoundingSphere::new(Vec3::new(10.0, 0.0, 0.0), 1.0)))
            .with(ObjectId(2), CollisionShape::Sphere(BoundingSphere::new(Vec3::new(4.0, 0.0, 0.0), 1.0)));

        let hit = scene.cast(Vec3::zeros(), Vec3::x(), 100.0).unwrap();
        assert_eq!(hit.object, ObjectId(2));
        assert_relative_eq!(hit.distance, 3.0);
    }

    #[test]
    fn test_scene_zero_direction_is_no_hit() {
        let scene = SceneOcclusion::new().with(ObjectId(1), CollisionShape::Plane(Plane::ground(0.0)));
        assert!(scene.cast(Vec3::zeros(), Vec3::zeros(), 0.0).is_none());
    }

    #[test]
    fn test_remove_collider() {
        let mut scene = SceneOcclusion::new();
        scene.insert(ObjectId(1), CollisionShape::Plane(Plane::ground(0.0)));
        scene.insert(ObjectId(2), CollisionShape::Plane(Plane::ground(-1.0)));
        scene.remove(ObjectId(1));
        assert_eq!(scene.len(), 1);
    }
}
