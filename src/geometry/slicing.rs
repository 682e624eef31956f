// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Plane slicing of meshes, blocks and points

use super::intersection::{
    aabb_intersection, dedup_points, ray_triangle_hits, Plane, Ray, DEDUP_EPSILON,
};
use super::mesh::TriMesh;
use crate::error::GeometryError;
use ahash::AHashMap;
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Coplanarity epsilon of the edge-plane pre-filter
pub const SLICE_EPSILON: f64 = 1e-6;

/// Closed polyline; the first point is repeated at the end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    pub points: Vec<Point3<f64>>,
}

impl Polyline {
    /// Number of distinct corners
    pub fn corner_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    pub fn length(&self) -> f64 {
        self.points.windows(2).map(|w| (w[1] - w[0]).norm()).sum()
    }

    /// Area enclosed by the loop, measured in the plane with the given normal
    pub fn area(&self, normal: &Vector3<f64>) -> f64 {
        let origin = match self.points.first() {
            Some(p) => *p,
            None => return 0.0,
        };
        let twice = self
            .points
            .windows(2)
            .map(|w| (w[0] - origin).cross(&(w[1] - origin)))
            .fold(Vector3::zeros(), |acc, c| acc + c);
        (twice.dot(normal) / 2.0).abs()
    }
}

/// Blocks or points selected by a slab around a plane
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlabSelection {
    /// Row indices of the selected entries
    pub indices: Vec<usize>,
    pub vertices: Vec<Point3<f64>>,
    pub values: Vec<f64>,
}

impl SlabSelection {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Side of a vertex with respect to the plane
fn side(distance: f64, epsilon: f64) -> i8 {
    if distance > epsilon {
        1
    } else if distance < -epsilon {
        -1
    } else {
        0
    }
}

/// Triangles with at least one edge the plane may cross
pub fn candidate_triangles(mesh: &TriMesh, plane: &Plane, epsilon: f64) -> Vec<usize> {
    let sides: Vec<i8> = mesh
        .vertices
        .iter()
        .map(|v| side(plane.signed_distance(v), epsilon))
        .collect();

    mesh.indices
        .iter()
        .enumerate()
        .filter(|(_, triangle)| {
            (0..3).any(|i| {
                let a = sides[triangle[i] as usize];
                let b = sides[triangle[(i + 1) % 3] as usize];
                a * b <= 0
            })
        })
        .map(|(index, _)| index)
        .collect()
}

/// Where a cross-section point sits on the welded mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum SectionKey {
    Vertex(u32),
    Edge(u32, u32),
}

/// Exact cross-section of a mesh by a plane.
///
/// Endpoints are keyed by the mesh vertex or edge they lie on, so segments of
/// neighbouring triangles join exactly. Faces lying in the plane contribute
/// nothing; their boundary comes from the adjacent faces.
pub fn cross_section(
    mesh: &TriMesh,
    plane: &Plane,
    epsilon: f64,
) -> Result<Vec<Polyline>, GeometryError> {
    let mut welded = mesh.clone();
    welded.weld_exact();

    let distances: Vec<f64> = welded
        .vertices
        .iter()
        .map(|v| plane.signed_distance(v))
        .collect();
    let sides: Vec<i8> = distances.iter().map(|&d| side(d, epsilon)).collect();

    // Each distinct segment with the sides of the off-plane corners of the
    // faces that produced it
    let mut produced: Vec<((SectionKey, SectionKey), Vec<i8>)> = Vec::new();
    let mut seen: AHashMap<(SectionKey, SectionKey), usize> = AHashMap::new();

    for triangle in &welded.indices {
        let corner_sides = triangle.map(|i| sides[i as usize]);
        if corner_sides.iter().all(|&s| s == 0) {
            continue;
        }

        let mut endpoints: Vec<SectionKey> = Vec::with_capacity(2);
        for i in 0..3 {
            let a = triangle[i];
            let b = triangle[(i + 1) % 3];
            if corner_sides[i] == 0 {
                endpoints.push(SectionKey::Vertex(a));
            }
            if corner_sides[i] * corner_sides[(i + 1) % 3] < 0 {
                endpoints.push(SectionKey::Edge(a.min(b), a.max(b)));
            }
        }

        if let [first, second] = endpoints[..] {
            if first == second {
                continue;
            }
            let pair = if key_order(&first) <= key_order(&second) {
                (first, second)
            } else {
                (second, first)
            };
            let off_plane = corner_sides.iter().copied().find(|&s| s != 0).unwrap_or(0);
            let slot = *seen.entry(pair).or_insert_with(|| {
                produced.push((pair, Vec::new()));
                produced.len() - 1
            });
            produced[slot].1.push(off_plane);
        }
    }

    // An edge lying in the plane whose faces all fall on one side only touches
    // the section. A single face means the other side is in-plane or open.
    let segments: Vec<(SectionKey, SectionKey)> = produced
        .into_iter()
        .filter(|((a, b), faces)| {
            let both_vertices =
                matches!((a, b), (SectionKey::Vertex(_), SectionKey::Vertex(_)));
            let touching = faces.len() > 1 && faces.iter().all(|&s| s == faces[0]);
            !(both_vertices && touching)
        })
        .map(|(pair, _)| pair)
        .collect();

    let mut adjacency: AHashMap<SectionKey, Vec<usize>> = AHashMap::new();
    for (index, (a, b)) in segments.iter().enumerate() {
        adjacency.entry(*a).or_default().push(index);
        adjacency.entry(*b).or_default().push(index);
    }

    let dangling = adjacency.values().filter(|s| s.len() == 1).count();
    if dangling > 0 {
        return Err(GeometryError::OpenCrossSection { dangling });
    }
    if let Some(branches) = adjacency.values().map(Vec::len).find(|&n| n > 2) {
        return Err(GeometryError::NonManifoldCrossSection { branches });
    }

    let position = |key: &SectionKey| -> Point3<f64> {
        match *key {
            SectionKey::Vertex(i) => welded.vertices[i as usize],
            SectionKey::Edge(a, b) => {
                let (pa, pb) = (welded.vertices[a as usize], welded.vertices[b as usize]);
                let (da, db) = (distances[a as usize], distances[b as usize]);
                pa + (pb - pa) * (da / (da - db))
            }
        }
    };

    let mut used = vec![false; segments.len()];
    let mut polylines = Vec::new();
    for start in 0..segments.len() {
        if used[start] {
            continue;
        }
        used[start] = true;
        let (first, mut current) = segments[start];
        let mut points = vec![position(&first), position(&current)];

        while current != first {
            let next = adjacency
                .get(&current)
                .and_then(|incident| incident.iter().copied().find(|&s| !used[s]));
            let Some(next) = next else {
                break;
            };
            used[next] = true;
            let (a, b) = segments[next];
            current = if a == current { b } else { a };
            points.push(position(&current));
        }
        polylines.push(Polyline { points });
    }

    Ok(polylines)
}

fn key_order(key: &SectionKey) -> (u8, u32, u32) {
    match *key {
        SectionKey::Vertex(i) => (0, i, 0),
        SectionKey::Edge(a, b) => (1, a, b),
    }
}

/// Cross-section of a mesh by the plane through `origin` with `normal`.
///
/// Triangles the plane cannot reach are filtered out before the exact
/// extraction. Meshes with open or non-manifold sections fail with a
/// [`GeometryError`] that callers turn into an empty result.
#[instrument(level = "debug", skip(mesh), fields(triangles = mesh.triangle_count()))]
pub fn slice_mesh(
    mesh: &TriMesh,
    origin: &Point3<f64>,
    normal: &Vector3<f64>,
) -> Result<Vec<Polyline>, GeometryError> {
    slice_mesh_with_epsilon(mesh, origin, normal, SLICE_EPSILON)
}

/// [`slice_mesh`] with an explicit coplanarity epsilon
pub fn slice_mesh_with_epsilon(
    mesh: &TriMesh,
    origin: &Point3<f64>,
    normal: &Vector3<f64>,
    epsilon: f64,
) -> Result<Vec<Polyline>, GeometryError> {
    let plane = Plane::new(*origin, *normal)?;
    let candidates = candidate_triangles(mesh, &plane, epsilon);
    debug!(candidates = candidates.len(), "slicing mesh");
    if candidates.is_empty() {
        return Ok(Vec::new());
    }
    cross_section(&mesh.subset(&candidates), &plane, epsilon)
}

/// Blocks whose axis-aligned box touches the plane.
///
/// Each block is a box of `block_size` centered at its vertex. A block is kept
/// when `|n·c + d| <= |n|·(block_size / 2)`, the exact box-plane overlap test.
pub fn slice_blocks(
    centers: &[Point3<f64>],
    values: &[f64],
    block_size: &Vector3<f64>,
    origin: &Point3<f64>,
    normal: &Vector3<f64>,
) -> Result<SlabSelection, GeometryError> {
    let plane = Plane::new(*origin, *normal)?;
    let half = block_size / 2.0;
    let threshold = plane.box_reach(&half);
    Ok(select(centers, values, |i| {
        plane.signed_distance(&centers[i]).abs() <= threshold
    }))
}

/// Points whose cube of side `sizes[i]` touches the plane
pub fn slice_points(
    centers: &[Point3<f64>],
    values: &[f64],
    sizes: &[f64],
    origin: &Point3<f64>,
    normal: &Vector3<f64>,
) -> Result<SlabSelection, GeometryError> {
    let plane = Plane::new(*origin, *normal)?;
    Ok(select(centers, values, |i| {
        let half = Vector3::repeat(sizes.get(i).copied().unwrap_or(0.0) / 2.0);
        plane.overlaps_box(&centers[i], &half)
    }))
}

fn select(
    centers: &[Point3<f64>],
    values: &[f64],
    keep: impl Fn(usize) -> bool,
) -> SlabSelection {
    let mut selection = SlabSelection::default();
    for i in (0..centers.len()).filter(|&i| keep(i)) {
        selection.indices.push(i);
        selection.vertices.push(centers[i]);
        selection.values.push(values.get(i).copied().unwrap_or(f64::NAN));
    }
    selection
}

/// Fixed direction of the parity rays
pub const INSIDE_RAY_DIRECTION: Vector3<f64> = Vector3::new(0.0, 0.0, 1.0);

/// Parity test of each point against a closed mesh.
///
/// A ray along +Z is cast from each point; the point is inside when the ray
/// meets the mesh at an odd number of distinct points.
#[instrument(level = "debug", skip_all, fields(points = points.len(), triangles = mesh.triangle_count()))]
pub fn points_inside_mesh(points: &[Point3<f64>], mesh: &TriMesh) -> Vec<bool> {
    if mesh.is_empty() {
        return vec![false; points.len()];
    }
    let triangles = mesh.triangles();
    let bbox = mesh.bounding_box();

    points
        .par_iter()
        .map(|point| {
            if !aabb_intersection(point, &INSIDE_RAY_DIRECTION, &bbox.min, &bbox.max) {
                return false;
            }
            let ray = Ray::new(*point, INSIDE_RAY_DIRECTION);
            let hits: Vec<Point3<f64>> = ray_triangle_hits(&ray, &triangles)
                .into_iter()
                .map(|hit| hit.point)
                .collect();
            dedup_points(&hits, DEDUP_EPSILON).len() % 2 == 1
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;
    use approx::assert_abs_diff_eq;

    fn unit_cube() -> TriMesh {
        Primitive::cuboid(Point3::origin(), Vector3::new(2.0, 2.0, 2.0)).to_mesh()
    }

    #[test]
    fn test_cube_midplane_section() {
        let loops = slice_mesh(&unit_cube(), &Point3::origin(), &Vector3::z()).unwrap();
        assert_eq!(loops.len(), 1);
        let section = &loops[0];
        assert_eq!(section.points.first(), section.points.last());
        assert!(section.points.iter().all(|p| p.z.abs() < 1e-12));
        assert_abs_diff_eq!(section.area(&Vector3::z()), 4.0, epsilon = 1e-9);
        assert_abs_diff_eq!(section.length(), 8.0, epsilon = 1e-9);
    }

    #[test]
    fn test_section_through_cube_face() {
        let loops = slice_mesh(&unit_cube(), &Point3::new(0.0, 0.0, 1.0), &Vector3::z()).unwrap();
        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0].corner_count(), 4);
        assert_abs_diff_eq!(loops[0].area(&Vector3::z()), 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_plane_missing_mesh_is_empty() {
        let loops = slice_mesh(&unit_cube(), &Point3::new(0.0, 0.0, 5.0), &Vector3::z()).unwrap();
        assert!(loops.is_empty());
    }

    #[test]
    fn test_two_cubes_give_two_loops() {
        let mut mesh = unit_cube();
        mesh.merge(&Primitive::cuboid(Point3::new(5.0, 0.0, 0.0), Vector3::new(2.0, 2.0, 2.0)).to_mesh());
        let loops = slice_mesh(&mesh, &Point3::origin(), &Vector3::new(0.0, 0.0, 3.0)).unwrap();
        assert_eq!(loops.len(), 2);
    }

    #[test]
    fn test_plane_touching_an_edge_is_empty() {
        let loops = slice_mesh(
            &unit_cube(),
            &Point3::new(1.0, 0.0, 1.0),
            &Vector3::new(1.0, 0.0, 1.0),
        )
        .unwrap();
        assert!(loops.is_empty());
    }

    #[test]
    fn test_open_mesh_fails() {
        let mut mesh = unit_cube();
        // drop a side face
        mesh.indices.retain(|t| *t != [5, 1, 2] && *t != [5, 2, 6]);
        let result = slice_mesh(&mesh, &Point3::origin(), &Vector3::z());
        assert!(matches!(result, Err(GeometryError::OpenCrossSection { .. })));
    }

    #[test]
    fn test_zero_normal_fails() {
        let result = slice_mesh(&unit_cube(), &Point3::origin(), &Vector3::zeros());
        assert_eq!(result, Err(GeometryError::DegeneratePlane));
    }

    #[test]
    fn test_candidate_filter() {
        let mesh = unit_cube();
        let plane = Plane::new(Point3::new(0.0, 0.0, 0.5), Vector3::z()).unwrap();
        // only the 8 side triangles straddle z = 0.5
        assert_eq!(candidate_triangles(&mesh, &plane, SLICE_EPSILON).len(), 8);
    }

    #[test]
    fn test_slice_blocks_corners() {
        let centers: Vec<Point3<f64>> = [-0.5, 0.5]
            .into_iter()
            .flat_map(|x| {
                [-0.5, 0.5].into_iter().flat_map(move |y| {
                    [-0.5, 0.7].into_iter().map(move |z| Point3::new(x, y, z))
                })
            })
            .collect();
        let values: Vec<f64> = (0..centers.len()).map(|i| i as f64).collect();
        let selection = slice_blocks(
            &centers,
            &values,
            &Vector3::new(1.0, 1.0, 1.0),
            &Point3::origin(),
            &Vector3::z(),
        )
        .unwrap();
        assert_eq!(selection.len(), 4);
        assert!(selection.vertices.iter().all(|v| v.z == -0.5));
        assert_eq!(selection.values, vec![0.0, 2.0, 4.0, 6.0]);
    }

    #[test]
    fn test_slice_points_uses_point_size() {
        let centers = [Point3::new(0.0, 0.0, 0.4), Point3::new(0.0, 0.0, 0.4)];
        let selection = slice_points(
            &centers,
            &[1.0, 2.0],
            &[1.0, 0.5],
            &Point3::origin(),
            &Vector3::z(),
        )
        .unwrap();
        assert_eq!(selection.indices, vec![0]);
    }

    #[test]
    fn test_points_inside_cube() {
        let mesh = unit_cube();
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.3, -0.2, 0.9),
            Point3::new(3.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, -2.0),
            Point3::new(0.0, 0.0, 2.0),
        ];
        assert_eq!(
            points_inside_mesh(&points, &mesh),
            vec![true, true, false, false, false]
        );
    }
}
