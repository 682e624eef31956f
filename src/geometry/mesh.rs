// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Indexed triangle mesh in f64 working precision

use super::BoundingBox;
use ahash::AHashMap;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Triangle as three corner positions
pub type TrianglePoints = [Point3<f64>; 3];

/// Indexed triangle mesh.
///
/// This is the working form every numeric routine consumes; mesh elements keep
/// their coordinates as f32 columns and widen into a `TriMesh` on demand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriMesh {
    pub vertices: Vec<Point3<f64>>,
    pub indices: Vec<[u32; 3]>,
}

impl TriMesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertex_count: usize, triangle_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            indices: Vec::with_capacity(triangle_count),
        }
    }

    pub fn from_parts(vertices: Vec<Point3<f64>>, indices: Vec<[u32; 3]>) -> Self {
        Self { vertices, indices }
    }

    /// Add a vertex and return its index
    pub fn add_vertex(&mut self, vertex: Point3<f64>) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(vertex);
        index
    }

    pub fn add_triangle(&mut self, triangle: [u32; 3]) {
        self.indices.push(triangle);
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.vertices)
    }

    pub fn triangle(&self, index: usize) -> TrianglePoints {
        let [a, b, c] = self.indices[index];
        [
            self.vertices[a as usize],
            self.vertices[b as usize],
            self.vertices[c as usize],
        ]
    }

    /// Vertices gathered by indices, one entry per triangle
    pub fn triangles(&self) -> Vec<TrianglePoints> {
        (0..self.indices.len()).map(|i| self.triangle(i)).collect()
    }

    /// Mesh restricted to a subset of triangles; vertices are shared as-is
    pub fn subset(&self, triangle_indices: &[usize]) -> TriMesh {
        TriMesh {
            vertices: self.vertices.clone(),
            indices: triangle_indices.iter().map(|&i| self.indices[i]).collect(),
        }
    }

    /// Append another mesh, offsetting its indices
    pub fn merge(&mut self, other: &TriMesh) {
        let offset = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.indices.extend(
            other
                .indices
                .iter()
                .map(|t| [t[0] + offset, t[1] + offset, t[2] + offset]),
        );
    }

    /// Weld vertices whose positions are bit-identical.
    ///
    /// Triangle soups (each face owning its own corner copies) become indexed
    /// meshes with shared vertices. Returns the number of vertices removed.
    pub fn weld_exact(&mut self) -> usize {
        let original_count = self.vertices.len();
        let mut seen: AHashMap<[u64; 3], u32> = AHashMap::with_capacity(original_count);
        let mut new_vertices = Vec::with_capacity(original_count);
        let mut remap = Vec::with_capacity(original_count);

        for vertex in &self.vertices {
            // +0.0 folds negative zero onto zero
            let key = [
                (vertex.x + 0.0).to_bits(),
                (vertex.y + 0.0).to_bits(),
                (vertex.z + 0.0).to_bits(),
            ];
            let index = *seen.entry(key).or_insert_with(|| {
                new_vertices.push(*vertex);
                (new_vertices.len() - 1) as u32
            });
            remap.push(index);
        }

        for triangle in &mut self.indices {
            for corner in triangle.iter_mut() {
                *corner = remap[*corner as usize];
            }
        }
        self.vertices = new_vertices;
        original_count - self.vertices.len()
    }

    /// Enclosed volume of a closed, consistently wound mesh.
    ///
    /// Sums the signed volume `dot(cross(v1 - v0, v2 - v0), c) / 6` of every
    /// triangle, `c` being the triangle centroid, and returns the absolute
    /// total. Nothing checks that the mesh is closed: an open mesh gives a
    /// number with no physical meaning.
    pub fn volume(&self) -> f64 {
        self.indices
            .iter()
            .map(|&[a, b, c]| {
                let v0 = self.vertices[a as usize];
                let v1 = self.vertices[b as usize];
                let v2 = self.vertices[c as usize];
                let normal = (v1 - v0).cross(&(v2 - v0));
                let centroid: Vector3<f64> = (v0.coords + v1.coords + v2.coords) / 3.0;
                normal.dot(&centroid) / 6.0
            })
            .sum::<f64>()
            .abs()
    }

    /// Total triangle area
    pub fn surface_area(&self) -> f64 {
        self.triangles()
            .iter()
            .map(|[v0, v1, v2]| (v1 - v0).cross(&(v2 - v0)).norm() / 2.0)
            .sum()
    }
}
