// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Ray and plane intersection tests
//!
//! Every ray test takes an origin and a direction that does not need to be
//! normalized. Divisions by zero are allowed to produce inf/NaN; those values
//! then fail the range checks that follow, which is how parallel and grazing
//! cases are rejected.

use super::mesh::{TriMesh, TrianglePoints};
use super::BoundingBox;
use crate::error::GeometryError;
use crate::utils::math::{abs_vector, normalize};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Below this determinant a ray counts as parallel to a triangle
pub const PARALLEL_EPSILON: f64 = 1e-12;

/// Boxes thinner than this always pass the slab test
pub const FLAT_BOX_EPSILON: f64 = 1e-12;

/// Default thickness used when picking thin polylines
pub const DEFAULT_LINE_THRESHOLD: f64 = 1e-2;

/// Distance under which two candidate points count as one
pub const TIE_EPSILON: f64 = 1e-12;

/// Ray with an unnormalized direction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    pub origin: Point3<f64>,
    pub direction: Vector3<f64>,
}

impl Ray {
    pub fn new(origin: Point3<f64>, direction: Vector3<f64>) -> Self {
        Self { origin, direction }
    }

    /// Reject zero or non-finite directions
    pub fn validated(self) -> Result<Self, GeometryError> {
        let length = self.direction.norm();
        if length > 0.0 && length.is_finite() {
            Ok(self)
        } else {
            Err(GeometryError::DegenerateRay)
        }
    }

    pub fn at(&self, t: f64) -> Point3<f64> {
        self.origin + self.direction * t
    }
}

/// Hit of a ray on one triangle of a batch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    pub triangle: usize,
    pub t: f64,
    pub point: Point3<f64>,
}

/// Approximate hit of a ray on one polyline segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentHit {
    pub segment: usize,
    /// Parameter along the ray
    pub s: f64,
    pub point: Point3<f64>,
}

/// Slab test of a ray against an axis-aligned box.
///
/// A box whose smallest side is under [`FLAT_BOX_EPSILON`] always passes, so
/// flat geometry falls through to the exact tests.
pub fn aabb_intersection(
    origin: &Point3<f64>,
    ray: &Vector3<f64>,
    box_min: &Point3<f64>,
    box_max: &Point3<f64>,
) -> bool {
    if (box_max - box_min).min() < FLAT_BOX_EPSILON {
        return true;
    }

    let mut tmin = f64::NEG_INFINITY;
    let mut tmax = f64::INFINITY;
    for i in 0..3 {
        let t1 = (box_min[i] - origin[i]) / ray[i];
        let t2 = (box_max[i] - origin[i]) / ray[i];
        tmin = tmin.max(t1.min(t2));
        tmax = tmax.min(t1.max(t2));
    }
    tmax > tmin.max(0.0)
}

/// [`aabb_intersection`] against a [`BoundingBox`]
pub fn ray_aabb(ray: &Ray, bbox: &BoundingBox) -> bool {
    aabb_intersection(&ray.origin, &ray.direction, &bbox.min, &bbox.max)
}

/// Entry parameter of a ray into a box, if the slab test passes
pub fn ray_aabb_entry(ray: &Ray, bbox: &BoundingBox) -> Option<f64> {
    let mut tmin = f64::NEG_INFINITY;
    let mut tmax = f64::INFINITY;
    for i in 0..3 {
        let t1 = (bbox.min[i] - ray.origin[i]) / ray.direction[i];
        let t2 = (bbox.max[i] - ray.origin[i]) / ray.direction[i];
        tmin = tmin.max(t1.min(t2));
        tmax = tmax.min(t1.max(t2));
    }
    (tmax >= tmin.max(0.0)).then(|| tmin.max(0.0))
}

/// Möller–Trumbore over a batch of triangles.
///
/// Every quantity is computed before any rejection so that NaN/inf from a
/// zero determinant is masked by the range checks, exactly as a vectorized
/// evaluation would.
pub fn ray_triangle_hits(ray: &Ray, triangles: &[TrianglePoints]) -> Vec<TriangleHit> {
    triangles
        .iter()
        .enumerate()
        .filter_map(|(index, [v0, v1, v2])| {
            let edge1 = v1 - v0;
            let edge2 = v2 - v0;
            let h = ray.direction.cross(&edge2);
            let a = edge1.dot(&h);
            let f = 1.0 / a;
            let s = ray.origin - v0;
            let u = f * s.dot(&h);
            let q = s.cross(&edge1);
            let v = f * ray.direction.dot(&q);
            let t = f * edge2.dot(&q);

            let valid = a.abs() > PARALLEL_EPSILON
                && (0.0..=1.0).contains(&u)
                && v >= 0.0
                && u + v <= 1.0
                && t > PARALLEL_EPSILON;
            valid.then(|| TriangleHit {
                triangle: index,
                t,
                point: ray.at(t),
            })
        })
        .collect()
}

/// Distinct intersection points of a ray with a batch of triangles
pub fn ray_triangle_intersections(ray: &Ray, triangles: &[TrianglePoints]) -> Vec<Point3<f64>> {
    let points: Vec<Point3<f64>> = ray_triangle_hits(ray, triangles)
        .into_iter()
        .map(|hit| hit.point)
        .collect();
    dedup_points(&points, DEDUP_EPSILON)
}

/// Distinct intersection points of a ray with a mesh
pub fn ray_mesh_intersections(ray: &Ray, mesh: &TriMesh) -> Vec<Point3<f64>> {
    ray_triangle_intersections(ray, &mesh.triangles())
}

/// Relative tolerance used to merge duplicate hits
pub const DEDUP_EPSILON: f64 = 1e-9;

/// Drop points lying within `epsilon` (scaled by magnitude) of an earlier point
pub fn dedup_points(points: &[Point3<f64>], epsilon: f64) -> Vec<Point3<f64>> {
    let mut unique: Vec<Point3<f64>> = Vec::with_capacity(points.len());
    for point in points {
        let tolerance = epsilon * point.coords.amax().max(1.0);
        if !unique.iter().any(|u| (u - point).amax() <= tolerance) {
            unique.push(*point);
        }
    }
    unique
}

/// Approximate ray test against every segment of a polyline.
///
/// For segment `(a, b)` the ray parameter of closest approach to the infinite
/// line through `a, b` comes from `(a - o) × ba` against `ray × ba`. A segment
/// is hit when the two lines pass within `threshold` of each other and the
/// projected point lies between `a` and `b`, again within `threshold`.
pub fn ray_line_hits(ray: &Ray, vertices: &[Point3<f64>], threshold: f64) -> Vec<SegmentHit> {
    vertices
        .windows(2)
        .enumerate()
        .filter_map(|(index, pair)| {
            let (a, b) = (pair[0], pair[1]);
            let ba = b - a;
            let ao = a - ray.origin;
            let rxb = ray.direction.cross(&ba);
            let denom = rxb.norm_squared();

            let s = ao.cross(&ba).dot(&rxb) / denom;
            let point = ray.at(s);
            let line_distance = ao.dot(&rxb).abs() / denom.sqrt();
            let between = (point - a).norm() + (point - b).norm() <= ba.norm() + threshold;

            (line_distance <= threshold && between).then_some(SegmentHit {
                segment: index,
                s,
                point,
            })
        })
        .collect()
}

/// Approximate intersection points of a ray with a polyline
pub fn ray_line_intersections(
    ray: &Ray,
    vertices: &[Point3<f64>],
    threshold: f64,
) -> Vec<Point3<f64>> {
    ray_line_hits(ray, vertices, threshold)
        .into_iter()
        .map(|hit| hit.point)
        .collect()
}

/// Index of the candidate nearest to `origin`.
///
/// Ties within [`TIE_EPSILON`] go to the earliest candidate. An empty slice
/// yields `None`.
pub fn closest_index(origin: &Point3<f64>, candidates: &[Point3<f64>]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, candidate) in candidates.iter().enumerate() {
        let distance = (candidate - origin).norm();
        match best {
            Some((_, best_distance)) if distance >= best_distance - TIE_EPSILON => {}
            _ if distance.is_nan() => {}
            _ => best = Some((index, distance)),
        }
    }
    best.map(|(index, _)| index)
}

/// Candidate nearest to `origin`, if any
pub fn closest_point_to(origin: &Point3<f64>, candidates: &[Point3<f64>]) -> Option<Point3<f64>> {
    closest_index(origin, candidates).map(|i| candidates[i])
}

/// Plane through `origin` with a unit normal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub origin: Point3<f64>,
    pub normal: Vector3<f64>,
}

impl Plane {
    /// Build a plane, normalizing a local copy of `normal`
    pub fn new(origin: Point3<f64>, normal: Vector3<f64>) -> Result<Self, GeometryError> {
        let unit = normalize(&normal);
        if unit.iter().all(|c| c.is_finite()) {
            Ok(Self {
                origin,
                normal: unit,
            })
        } else {
            Err(GeometryError::DegeneratePlane)
        }
    }

    /// `d` in `n·x + d = 0`
    pub fn offset(&self) -> f64 {
        -self.normal.dot(&self.origin.coords)
    }

    pub fn signed_distance(&self, point: &Point3<f64>) -> f64 {
        self.normal.dot(&point.coords) + self.offset()
    }

    /// Largest projection of a box with the given half extents onto the normal
    pub fn box_reach(&self, half_extents: &Vector3<f64>) -> f64 {
        abs_vector(&self.normal).dot(half_extents)
    }

    /// Does an axis-aligned box centered at `center` touch the plane
    pub fn overlaps_box(&self, center: &Point3<f64>, half_extents: &Vector3<f64>) -> bool {
        self.signed_distance(center).abs() <= self.box_reach(half_extents)
    }
}

/// Mask of points within `threshold` of a plane
pub fn points_near_plane(points: &[Point3<f64>], plane: &Plane, threshold: f64) -> Vec<bool> {
    points
        .iter()
        .map(|p| plane.signed_distance(p).abs() <= threshold)
        .collect()
}
