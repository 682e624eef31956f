// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Scene elements
//!
//! Every element stores its vertices as three f32 columns in a
//! [`GeometryBase`] and carries kind-specific attributes in an
//! [`ElementKind`]. Elements are produced by an [`ElementBuilder`], which
//! resolves the loader input, fills the attributes and checks integrity
//! before anything is returned.

mod base;
mod builder;
mod kind;
mod property;
mod table;
mod tabular;

pub use base::GeometryBase;
pub use builder::{ElementBuilder, GeometryInput};
pub use kind::{
    BlockAttributes, ElementKind, LineAttributes, Marker, MeshAttributes, PointAttributes,
    TubeAttributes, DEFAULT_TUBE_RESOLUTION,
};
pub use property::{PropertyBag, PropertyValue};
pub use table::{DataTable, RawColumn, RawData};
pub use tabular::{TabularAttributes, DEFAULT_VALUE_HEADER};

use crate::error::{ConstructionError, GeometryError};
use crate::geometry::intersection::{ray_aabb, ray_aabb_entry, ray_line_hits, ray_mesh_intersections};
use crate::geometry::slicing::slice_mesh_with_epsilon;
use crate::geometry::{
    points_inside_mesh, slice_blocks, slice_points, BoundingBox, Polyline, Primitive, Ray,
    SlabSelection, TriMesh,
};
use crate::utils::color::Rgb;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Id requesting automatic assignment by the collection
pub const AUTO_ID: i64 = -1;

/// Identity of an element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementMeta {
    pub id: i64,
    pub name: String,
    /// Source file extension, empty when built in memory
    pub extension: String,
}

impl Default for ElementMeta {
    fn default() -> Self {
        Self {
            id: AUTO_ID,
            name: String::new(),
            extension: String::new(),
        }
    }
}

/// Result of slicing one element
#[derive(Debug, Clone, PartialEq)]
pub enum SliceResult {
    /// Closed cross-section loops of a mesh or tube
    Polylines(Vec<Polyline>),
    /// Blocks or points touching the plane
    Selection(SlabSelection),
    /// Kinds without a planar section
    Unsupported,
}

impl SliceResult {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Polylines(p) => p.is_empty(),
            Self::Selection(s) => s.is_empty(),
            Self::Unsupported => true,
        }
    }
}

/// A drawable scene element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    meta: ElementMeta,
    base: GeometryBase,
    kind: ElementKind,
    color: Rgb,
    alpha: f32,
    visible: bool,
    properties: PropertyBag,
}

impl Element {
    pub(crate) fn from_parts(
        meta: ElementMeta,
        base: GeometryBase,
        kind: ElementKind,
        color: Rgb,
        alpha: f32,
        properties: PropertyBag,
    ) -> Self {
        Self {
            meta,
            base,
            kind,
            color,
            alpha: alpha.clamp(0.0, 1.0),
            visible: true,
            properties,
        }
    }

    pub fn id(&self) -> i64 {
        self.meta.id
    }

    pub(crate) fn set_id(&mut self, id: i64) {
        self.meta.id = id;
    }

    pub fn name(&self) -> &str {
        &self.meta.name
    }

    pub fn extension(&self) -> &str {
        &self.meta.extension
    }

    pub fn meta(&self) -> &ElementMeta {
        &self.meta
    }

    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    pub fn kind_name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn base(&self) -> &GeometryBase {
        &self.base
    }

    pub fn vertex_count(&self) -> usize {
        self.base.len()
    }

    pub fn vertices(&self) -> Vec<Point3<f32>> {
        self.base.vertices()
    }

    /// Vertices widened to f64
    pub fn points(&self) -> Vec<Point3<f64>> {
        self.base.points()
    }

    pub fn centroid(&self) -> Option<Point3<f64>> {
        self.base.centroid()
    }

    /// Bounds of the vertices
    pub fn bounding_box(&self) -> BoundingBox {
        self.base.bounding_box()
    }

    pub fn color(&self) -> Rgb {
        self.color
    }

    pub fn set_color(&mut self, color: Rgb) {
        self.color = color.clamped();
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha.clamp(0.0, 1.0);
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn properties(&self) -> &PropertyBag {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut PropertyBag {
        &mut self.properties
    }

    pub fn is_looped(&self) -> bool {
        self.kind.is_looped()
    }

    // ---- tabular attributes -------------------------------------------

    fn tabular_mut(&mut self) -> Result<&mut TabularAttributes, ConstructionError> {
        let kind = self.kind.name();
        self.kind
            .tabular_mut()
            .ok_or_else(|| ConstructionError::validation(format!("{} elements carry no values", kind)))
    }

    pub fn tabular(&self) -> Option<&TabularAttributes> {
        self.kind.tabular()
    }

    /// Active value column of a block or point element
    pub fn values(&self) -> Option<&[f64]> {
        self.kind.tabular().map(TabularAttributes::values)
    }

    /// Per-vertex colors; uniform elements repeat their single color
    pub fn colors(&self) -> Vec<Rgb> {
        match self.kind.tabular() {
            Some(tabular) => tabular.colors(),
            None => vec![self.color; self.base.len()],
        }
    }

    pub fn set_values(&mut self, values: Vec<f64>) -> Result<(), ConstructionError> {
        self.tabular_mut()?.set_values(values)
    }

    pub fn set_value_header(&mut self, header: &str) -> Result<(), ConstructionError> {
        self.tabular_mut()?.set_value_header(header)
    }

    pub fn set_colormap(&mut self, spec: &str) -> crate::error::Result<()> {
        self.tabular_mut()?.set_colormap(spec)?;
        Ok(())
    }

    pub fn set_vmin(&mut self, vmin: f64) -> Result<(), ConstructionError> {
        self.tabular_mut()?.set_vmin(vmin);
        Ok(())
    }

    pub fn set_vmax(&mut self, vmax: f64) -> Result<(), ConstructionError> {
        self.tabular_mut()?.set_vmax(vmax);
        Ok(())
    }

    pub fn set_colors(&mut self, colors: Option<Vec<Rgb>>) -> Result<(), ConstructionError> {
        self.tabular_mut()?.set_colors(colors)
    }

    // ---- block and point attributes -----------------------------------

    pub fn block_size(&self) -> Option<Vector3<f64>> {
        match &self.kind {
            ElementKind::Block(block) => Some(block.block_size),
            _ => None,
        }
    }

    /// Replace the block size; all three components must be positive
    pub fn set_block_size(&mut self, size: [f64; 3]) -> Result<(), ConstructionError> {
        let size = builder::validate_block_size(&size)?;
        match &mut self.kind {
            ElementKind::Block(block) => {
                block.block_size = size;
                Ok(())
            }
            other => Err(ConstructionError::validation(format!(
                "{} elements have no block size",
                other.name()
            ))),
        }
    }

    pub fn point_sizes(&self) -> Option<&[f64]> {
        match &self.kind {
            ElementKind::Point(point) => Some(&point.point_size),
            _ => None,
        }
    }

    /// Apply one size to every point
    pub fn set_point_size(&mut self, size: f64) -> Result<(), ConstructionError> {
        if !(size.is_finite() && size >= 0.0) {
            return Err(ConstructionError::validation(format!("invalid point size {}", size)));
        }
        let rows = self.base.len();
        match &mut self.kind {
            ElementKind::Point(point) => {
                point.point_size = vec![size; rows];
                Ok(())
            }
            other => Err(ConstructionError::validation(format!(
                "{} elements have no point size",
                other.name()
            ))),
        }
    }

    pub fn marker(&self) -> Option<Marker> {
        match &self.kind {
            ElementKind::Point(point) => Some(point.marker),
            _ => None,
        }
    }

    // ---- derived geometry ---------------------------------------------

    /// Triangle mesh of a mesh element, or the swept mesh of a tube
    pub fn tri_mesh(&self) -> Option<TriMesh> {
        match &self.kind {
            ElementKind::Mesh(mesh) => Some(TriMesh::from_parts(self.points(), mesh.indices.clone())),
            ElementKind::Tube(tube) => Some(tube_mesh(&self.points(), tube.radius, tube.resolution)),
            _ => None,
        }
    }

    /// Enclosed volume of a closed mesh
    pub fn volume(&self) -> Option<f64> {
        self.tri_mesh().map(|mesh| mesh.volume())
    }

    /// Bounds covering everything a ray may hit, including block and point
    /// extents and the line pick tolerance
    pub fn pick_bounds(&self, line_threshold: f64) -> BoundingBox {
        let bbox = self.bounding_box();
        if bbox.is_empty() {
            return bbox;
        }
        let pad = match &self.kind {
            ElementKind::Block(block) => block.block_size / 2.0,
            ElementKind::Point(point) => {
                Vector3::repeat(point.point_size.iter().copied().fold(0.0, f64::max) / 2.0)
            }
            ElementKind::Line(_) => Vector3::repeat(line_threshold),
            ElementKind::Tube(tube) => Vector3::repeat(tube.radius),
            ElementKind::Mesh(_) | ElementKind::Null => Vector3::zeros(),
        };
        BoundingBox::new(bbox.min - pad, bbox.max + pad)
    }

    /// Candidate hit points of a ray on this element.
    ///
    /// Meshes and tubes yield exact triangle hits and blocks and points the
    /// centers of the boxes the ray passes through. Lines yield the approximate
    /// segment hits within `line_threshold` that lie ahead of the ray origin.
    pub fn ray_hits(&self, ray: &Ray, line_threshold: f64) -> Vec<Point3<f64>> {
        if self.base.is_empty() || !ray_aabb(ray, &self.pick_bounds(line_threshold)) {
            return Vec::new();
        }
        match &self.kind {
            ElementKind::Mesh(_) | ElementKind::Tube(_) => self
                .tri_mesh()
                .map(|mesh| ray_mesh_intersections(ray, &mesh))
                .unwrap_or_default(),
            ElementKind::Line(_) => ray_line_hits(ray, &self.points(), line_threshold)
                .into_iter()
                .filter(|hit| hit.s >= 0.0)
                .map(|hit| hit.point)
                .collect(),
            ElementKind::Block(block) => {
                let size = block.block_size;
                box_centers_hit(ray, &self.points(), |_| size)
            }
            ElementKind::Point(point) => box_centers_hit(ray, &self.points(), |i| {
                Vector3::repeat(point.point_size.get(i).copied().unwrap_or(0.0))
            }),
            ElementKind::Null => Vec::new(),
        }
    }

    /// Section of this element by the plane through `origin` with `normal`
    pub fn slice(
        &self,
        origin: &Point3<f64>,
        normal: &Vector3<f64>,
        epsilon: f64,
    ) -> Result<SliceResult, GeometryError> {
        match &self.kind {
            ElementKind::Mesh(_) | ElementKind::Tube(_) => {
                let mesh = self.tri_mesh().unwrap_or_default();
                slice_mesh_with_epsilon(&mesh, origin, normal, epsilon).map(SliceResult::Polylines)
            }
            ElementKind::Block(block) => slice_blocks(
                &self.points(),
                block.tabular.values(),
                &block.block_size,
                origin,
                normal,
            )
            .map(SliceResult::Selection),
            ElementKind::Point(point) => slice_points(
                &self.points(),
                point.tabular.values(),
                &point.point_size,
                origin,
                normal,
            )
            .map(SliceResult::Selection),
            ElementKind::Line(_) | ElementKind::Null => Ok(SliceResult::Unsupported),
        }
    }

    /// Inside mask of `points` against this element's closed mesh
    pub fn contains_points(&self, points: &[Point3<f64>]) -> Result<Vec<bool>, GeometryError> {
        match &self.kind {
            ElementKind::Mesh(_) => {
                let mesh = self.tri_mesh().unwrap_or_default();
                Ok(points_inside_mesh(points, &mesh))
            }
            _ => Err(GeometryError::NotAMesh(self.meta.id)),
        }
    }

    /// Allow-listed attributes for export
    pub fn exportable_properties(&self) -> PropertyBag {
        let mut bag = PropertyBag::new();
        bag.set("alpha", self.alpha);
        if let Some(tabular) = self.kind.tabular() {
            bag.set("headers", tabular.headers());
            bag.set("colormap", tabular.colormap().spec());
            bag.set("vmin", tabular.vmin());
            bag.set("vmax", tabular.vmax());
        }
        match &self.kind {
            ElementKind::Point(point) => {
                bag.set("marker", point.marker.as_str());
                let n = point.point_size.len().max(1) as f64;
                bag.set("average_size", point.point_size.iter().sum::<f64>() / n);
            }
            ElementKind::Block(block) => {
                bag.set("average_size", block.block_size.mean());
            }
            _ => {}
        }
        bag
    }
}

/// Centers of the axis-aligned boxes a ray passes through
fn box_centers_hit(
    ray: &Ray,
    centers: &[Point3<f64>],
    size_of: impl Fn(usize) -> Vector3<f64>,
) -> Vec<Point3<f64>> {
    centers
        .iter()
        .enumerate()
        .filter(|(i, center)| ray_aabb_entry(ray, &BoundingBox::centered(center, &size_of(*i))).is_some())
        .map(|(_, center)| *center)
        .collect()
}

/// Cylinders swept along consecutive vertex pairs
fn tube_mesh(points: &[Point3<f64>], radius: f64, resolution: u32) -> TriMesh {
    let mut mesh = TriMesh::new();
    for pair in points.windows(2) {
        mesh.merge(&Primitive::cylinder(pair[0], pair[1], radius, resolution).to_mesh());
    }
    mesh
}
