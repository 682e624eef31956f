// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Ray query tests

use approx::assert_relative_eq;
use mineview::error::GeometryError;
use mineview::geometry::intersection::{
    aabb_intersection, closest_point_to, ray_line_hits, ray_line_intersections,
    ray_mesh_intersections, ray_triangle_intersections, DEFAULT_LINE_THRESHOLD,
};
use mineview::geometry::{Primitive, Ray};
use nalgebra::{Point3, Vector3};

fn unit_box() -> (Point3<f64>, Point3<f64>) {
    (Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0))
}

#[test]
fn test_aabb_ray_toward_center_hits() {
    let (min, max) = unit_box();
    for axis in 0..3 {
        let mut origin = Point3::origin();
        origin[axis] = -5.0;
        let mut direction = Vector3::zeros();
        direction[axis] = 1.0;
        assert!(aabb_intersection(&origin, &direction, &min, &max));
    }
}

#[test]
fn test_aabb_ray_away_misses() {
    let (min, max) = unit_box();
    let origin = Point3::new(-5.0, 0.0, 0.0);
    assert!(!aabb_intersection(&origin, &Vector3::new(-1.0, 0.0, 0.0), &min, &max));
}

#[test]
fn test_aabb_perpendicular_ray_misses() {
    let (min, max) = unit_box();
    let origin = Point3::new(-5.0, 3.0, 0.0);
    assert!(!aabb_intersection(&origin, &Vector3::new(1.0, 0.0, 0.0), &min, &max));
}

#[test]
fn test_aabb_flat_box_always_passes() {
    let min = Point3::new(0.0, 0.0, 0.0);
    let max = Point3::new(1.0, 1.0, 0.0);
    let origin = Point3::new(50.0, 50.0, 50.0);
    assert!(aabb_intersection(&origin, &Vector3::new(0.0, 0.0, 1.0), &min, &max));
}

#[test]
fn test_ray_along_normal_through_centroid_hits() {
    let triangle = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(2.0, 0.0, 0.0),
        Point3::new(0.0, 2.0, 0.0),
    ];
    let centroid = Point3::from((triangle[0].coords + triangle[1].coords + triangle[2].coords) / 3.0);
    let ray = Ray::new(centroid - Vector3::z() * 4.0, Vector3::z());
    let hits = ray_triangle_intersections(&ray, &[triangle]);

    assert_eq!(hits.len(), 1);
    assert_relative_eq!(hits[0], centroid, epsilon = 1e-12);
}

#[test]
fn test_parallel_ray_never_hits() {
    let triangle = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(2.0, 0.0, 0.0),
        Point3::new(0.0, 2.0, 0.0),
    ];
    for z in [-1.0, 0.5, 3.0] {
        let ray = Ray::new(Point3::new(-1.0, 0.5, z), Vector3::new(1.0, 0.1, 0.0));
        assert!(ray_triangle_intersections(&ray, &[triangle]).is_empty());
    }
}

#[test]
fn test_hits_behind_origin_are_dropped() {
    let triangle = [
        Point3::new(-1.0, -1.0, 0.0),
        Point3::new(1.0, -1.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
    ];
    let ray = Ray::new(Point3::new(0.0, 0.0, 1.0), Vector3::z());
    assert!(ray_triangle_intersections(&ray, &[triangle]).is_empty());
}

#[test]
fn test_shared_edge_hit_reported_once() {
    let mesh = Primitive::cuboid(Point3::origin(), Vector3::repeat(2.0)).to_mesh();
    // Passes through the diagonal edge of the z faces
    let ray = Ray::new(Point3::new(0.0, 0.0, -3.0), Vector3::z());
    let hits = ray_mesh_intersections(&ray, &mesh);

    assert_eq!(hits.len(), 2);
    assert_relative_eq!(hits[0].z.abs(), 1.0, epsilon = 1e-12);
    assert_relative_eq!(hits[1].z.abs(), 1.0, epsilon = 1e-12);
}

#[test]
fn test_ray_line_within_threshold() {
    let polyline = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(4.0, 0.0, 0.0),
        Point3::new(4.0, 4.0, 0.0),
    ];
    let ray = Ray::new(Point3::new(2.0, 0.005, -3.0), Vector3::z());
    let hits = ray_line_hits(&ray, &polyline, DEFAULT_LINE_THRESHOLD);

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].segment, 0);
    assert_relative_eq!(hits[0].s, 3.0, epsilon = 1e-12);

    let far = Ray::new(Point3::new(2.0, 0.5, -3.0), Vector3::z());
    assert!(ray_line_intersections(&far, &polyline, DEFAULT_LINE_THRESHOLD).is_empty());
}

#[test]
fn test_ray_line_outside_segment_misses() {
    let polyline = [Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)];
    let ray = Ray::new(Point3::new(3.0, 0.0, -1.0), Vector3::z());
    assert!(ray_line_intersections(&ray, &polyline, DEFAULT_LINE_THRESHOLD).is_empty());
}

#[test]
fn test_ray_line_reports_hits_behind_origin() {
    let polyline = [Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)];
    let ray = Ray::new(Point3::new(0.5, 0.0, 2.0), Vector3::z());
    let hits = ray_line_hits(&ray, &polyline, DEFAULT_LINE_THRESHOLD);
    assert_eq!(hits.len(), 1);
    assert!(hits[0].s < 0.0);
}

#[test]
fn test_closest_point_single_and_ordered() {
    let origin = Point3::new(0.0, 0.0, 0.0);
    let p = Point3::new(3.0, 4.0, 0.0);
    assert_eq!(closest_point_to(&origin, &[p]), Some(p));

    let candidates = [
        Point3::new(5.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, 0.0, 3.0),
    ];
    assert_eq!(closest_point_to(&origin, &candidates), Some(candidates[1]));
    assert_eq!(closest_point_to(&origin, &[]), None);
}

#[test]
fn test_closest_point_tie_goes_to_first() {
    let origin = Point3::origin();
    let candidates = [Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)];
    assert_eq!(closest_point_to(&origin, &candidates), Some(candidates[0]));
}

#[test]
fn test_zero_direction_rejected() {
    let ray = Ray::new(Point3::origin(), Vector3::zeros());
    assert_eq!(ray.validated().unwrap_err(), GeometryError::DegenerateRay);
}
