// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometric primitives generator

use super::TriMesh;
use nalgebra::{Point3, Vector3};
use std::f64::consts::PI;

/// Geometric primitives
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// Axis-aligned box of full extent `size` centered on `center`
    Cuboid {
        center: Point3<f64>,
        size: Vector3<f64>,
    },
    /// Capped cylinder from `start` to `end` with `resolution` sides
    Cylinder {
        start: Point3<f64>,
        end: Point3<f64>,
        radius: f64,
        resolution: u32,
    },
}

impl Primitive {
    pub fn cuboid(center: Point3<f64>, size: Vector3<f64>) -> Self {
        Self::Cuboid { center, size }
    }

    pub fn cylinder(start: Point3<f64>, end: Point3<f64>, radius: f64, resolution: u32) -> Self {
        let resolution = if resolution >= 3 { resolution } else { 16 };
        Self::Cylinder {
            start,
            end,
            radius,
            resolution,
        }
    }

    pub fn to_mesh(&self) -> TriMesh {
        match self {
            Self::Cuboid { center, size } => generate_cuboid_mesh(center, size),
            Self::Cylinder {
                start,
                end,
                radius,
                resolution,
            } => generate_cylinder_mesh(start, end, *radius, *resolution),
        }
    }
}

fn generate_cuboid_mesh(center: &Point3<f64>, size: &Vector3<f64>) -> TriMesh {
    let half = size / 2.0;
    let (min, max) = (center - half, center + half);

    let mut mesh = TriMesh::with_capacity(8, 12);
    for position in [
        Point3::new(min.x, min.y, min.z),
        Point3::new(max.x, min.y, min.z),
        Point3::new(max.x, max.y, min.z),
        Point3::new(min.x, max.y, min.z),
        Point3::new(min.x, min.y, max.z),
        Point3::new(max.x, min.y, max.z),
        Point3::new(max.x, max.y, max.z),
        Point3::new(min.x, max.y, max.z),
    ] {
        mesh.add_vertex(position);
    }

    // Two outward-wound triangles per face
    for triangle in [
        [4, 5, 6],
        [4, 6, 7], // z+
        [1, 0, 3],
        [1, 3, 2], // z-
        [5, 1, 2],
        [5, 2, 6], // x+
        [0, 4, 7],
        [0, 7, 3], // x-
        [7, 6, 2],
        [7, 2, 3], // y+
        [0, 1, 5],
        [0, 5, 4], // y-
    ] {
        mesh.add_triangle(triangle);
    }

    mesh
}

/// Orthonormal pair spanning the plane perpendicular to `axis`, such that
/// `(u, v, axis)` is right-handed
fn perpendicular_basis(axis: &Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
    let helper = if axis.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    let u = axis.cross(&helper).normalize();
    let v = axis.cross(&u);
    (u, v)
}

fn generate_cylinder_mesh(
    start: &Point3<f64>,
    end: &Point3<f64>,
    radius: f64,
    segments: u32,
) -> TriMesh {
    let axis = end - start;
    let length = axis.norm();
    if length == 0.0 {
        return TriMesh::new();
    }
    let (u, v) = perpendicular_basis(&(axis / length));

    let mut mesh = TriMesh::with_capacity(2 + 2 * segments as usize, 4 * segments as usize);
    let bottom_center = mesh.add_vertex(*start);
    let top_center = mesh.add_vertex(*end);

    let mut bottom = Vec::with_capacity(segments as usize);
    let mut top = Vec::with_capacity(segments as usize);
    for i in 0..segments {
        let angle = 2.0 * PI * i as f64 / segments as f64;
        let offset = (u * angle.cos() + v * angle.sin()) * radius;
        bottom.push(mesh.add_vertex(start + offset));
        top.push(mesh.add_vertex(end + offset));
    }

    for i in 0..segments as usize {
        let next = (i + 1) % segments as usize;
        // caps
        mesh.add_triangle([bottom_center, bottom[next], bottom[i]]);
        mesh.add_triangle([top_center, top[i], top[next]]);
        // sides
        mesh.add_triangle([bottom[i], bottom[next], top[i]]);
        mesh.add_triangle([top[i], bottom[next], top[next]]);
    }

    mesh
}
