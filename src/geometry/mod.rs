// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - meshes, intersections and slicing

pub mod analytics;
mod bbox;
pub mod intersection;
mod mesh;
mod primitives;
pub mod slicing;

pub use analytics::{analyze, is_watertight, GeometryStats};
pub use bbox::BoundingBox;
pub use intersection::{
    aabb_intersection, closest_point_to, ray_line_intersections, ray_triangle_intersections,
    Plane, Ray,
};
pub use mesh::{TriMesh, TrianglePoints};
pub use primitives::Primitive;
pub use slicing::{
    points_inside_mesh, slice_blocks, slice_mesh, slice_points, Polyline, SlabSelection,
};
