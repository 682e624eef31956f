// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry analytics and statistics

use super::TriMesh;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Geometry statistics and analytics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryStats {
    /// Enclosed volume in cubic units
    pub volume: f64,
    /// Total surface area in square units
    pub surface_area: f64,
    /// Bounding box [min_x, min_y, min_z, max_x, max_y, max_z]
    pub bbox: [f64; 6],
    /// Vertex centroid [x, y, z]
    pub centroid: [f64; 3],
    pub vertex_count: usize,
    pub triangle_count: usize,
    /// Every edge shared by exactly two triangles
    pub is_watertight: bool,
}

impl GeometryStats {
    /// Create empty stats
    pub fn empty() -> Self {
        Self {
            volume: 0.0,
            surface_area: 0.0,
            bbox: [0.0; 6],
            centroid: [0.0; 3],
            vertex_count: 0,
            triangle_count: 0,
            is_watertight: false,
        }
    }

    /// Human readable multi-line summary
    pub fn summary(&self) -> String {
        let [x0, y0, z0, x1, y1, z1] = self.bbox;
        format!(
            "Volume:        {:>14.4}\n\
             Surface area:  {:>14.4}\n\
             Centroid:      ({:.3}, {:.3}, {:.3})\n\
             Bounds min:    ({:.3}, {:.3}, {:.3})\n\
             Bounds max:    ({:.3}, {:.3}, {:.3})\n\
             Vertices:      {:>14}\n\
             Triangles:     {:>14}\n\
             Watertight:    {:>14}",
            self.volume,
            self.surface_area,
            self.centroid[0],
            self.centroid[1],
            self.centroid[2],
            x0,
            y0,
            z0,
            x1,
            y1,
            z1,
            self.vertex_count,
            self.triangle_count,
            if self.is_watertight { "yes" } else { "no" },
        )
    }
}

/// Analyze mesh geometry and compute statistics
pub fn analyze(mesh: &TriMesh) -> GeometryStats {
    let vertex_count = mesh.vertex_count();
    let triangle_count = mesh.triangle_count();

    if vertex_count == 0 || triangle_count == 0 {
        return GeometryStats::empty();
    }

    let sum = mesh
        .vertices
        .iter()
        .fold(nalgebra::Vector3::zeros(), |acc, v| acc + v.coords);
    let centroid = sum / vertex_count as f64;

    GeometryStats {
        volume: mesh.volume(),
        surface_area: mesh.surface_area(),
        bbox: mesh.bounding_box().to_array(),
        centroid: [centroid.x, centroid.y, centroid.z],
        vertex_count,
        triangle_count,
        is_watertight: is_watertight(mesh),
    }
}

/// Check if a mesh is watertight.
///
/// Vertices at identical positions are welded first, so triangle soups are
/// judged by their geometry. A mesh is watertight if every undirected edge is
/// shared by exactly two triangles.
pub fn is_watertight(mesh: &TriMesh) -> bool {
    if mesh.is_empty() {
        return false;
    }
    let mut welded = mesh.clone();
    welded.weld_exact();

    let mut edge_count: AHashMap<(u32, u32), usize> = AHashMap::new();
    for triangle in &welded.indices {
        for i in 0..3 {
            let a = triangle[i];
            let b = triangle[(i + 1) % 3];
            let edge = if a < b { (a, b) } else { (b, a) };
            *edge_count.entry(edge).or_insert(0) += 1;
        }
    }

    edge_count.values().all(|&count| count == 2)
}
