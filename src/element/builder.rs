// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Element construction pipeline
//!
//! Building runs in four steps: resolve the coordinates from one of the
//! accepted input shapes, fill the kind-specific attributes, fill the
//! metadata, then run the integrity checks. Only a fully checked element is
//! ever returned.

use super::base::GeometryBase;
use super::kind::{
    BlockAttributes, ElementKind, LineAttributes, Marker, MeshAttributes, PointAttributes,
    TubeAttributes, DEFAULT_TUBE_RESOLUTION,
};
use super::property::{PropertyBag, PropertyValue};
use super::table::{DataTable, RawColumn, RawData};
use super::tabular::{TabularAttributes, DEFAULT_VALUE_HEADER};
use super::{Element, ElementMeta};
use crate::error::ConstructionError;
use crate::utils::color::{Colormap, Rgb};
use nalgebra::{Point3, Vector3};
use rand::Rng;

/// Colormap used when none is given
pub const DEFAULT_COLORMAP: &str = "blue-red";

/// Tube radius used when none is given
pub const DEFAULT_TUBE_RADIUS: f64 = 0.5;

/// Point size used when none is given
pub const DEFAULT_POINT_SIZE: f64 = 1.0;

const COORDINATE_KEYS: [&str; 3] = ["x", "y", "z"];

/// Coordinates as resolved from the builder input
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryInput {
    Xyz { x: Vec<f64>, y: Vec<f64>, z: Vec<f64> },
    Vertices(Vec<[f64; 3]>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Template {
    Mesh,
    Block,
    Point,
    Line,
    Tube,
    Null,
}

impl Template {
    fn name(self) -> &'static str {
        match self {
            Self::Mesh => "mesh",
            Self::Block => "block",
            Self::Point => "point",
            Self::Line => "line",
            Self::Tube => "tube",
            Self::Null => "null",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum PointSize {
    Uniform(f64),
    PerPoint(Vec<f64>),
}

/// Builder for every element kind
#[derive(Debug, Clone)]
pub struct ElementBuilder {
    template: Template,
    xyz: Option<(Vec<f64>, Vec<f64>, Vec<f64>)>,
    vertices: Option<Vec<[f64; 3]>>,
    data: Option<RawData>,
    indices: Option<Vec<[u32; 3]>>,
    values: Option<Vec<f64>>,
    value_header: Option<String>,
    block_size: Option<[f64; 3]>,
    autosize: bool,
    colormap: Option<String>,
    vmin: Option<f64>,
    vmax: Option<f64>,
    colors: Option<Vec<Rgb>>,
    point_size: Option<PointSize>,
    marker: Marker,
    looped: bool,
    radius: f64,
    resolution: u32,
    color: Option<Rgb>,
    alpha: f32,
    meta: ElementMeta,
    properties: PropertyBag,
    supplied: Vec<&'static str>,
}

impl ElementBuilder {
    fn with_template(template: Template) -> Self {
        Self {
            template,
            xyz: None,
            vertices: None,
            data: None,
            indices: None,
            values: None,
            value_header: None,
            block_size: None,
            autosize: false,
            colormap: None,
            vmin: None,
            vmax: None,
            colors: None,
            point_size: None,
            marker: Marker::default(),
            looped: false,
            radius: DEFAULT_TUBE_RADIUS,
            resolution: DEFAULT_TUBE_RESOLUTION,
            color: None,
            alpha: 1.0,
            meta: ElementMeta::default(),
            properties: PropertyBag::new(),
            supplied: Vec::new(),
        }
    }

    pub fn mesh() -> Self {
        Self::with_template(Template::Mesh)
    }

    pub fn block() -> Self {
        Self::with_template(Template::Block)
    }

    pub fn point() -> Self {
        Self::with_template(Template::Point)
    }

    pub fn line() -> Self {
        Self::with_template(Template::Line)
    }

    pub fn tube() -> Self {
        Self::with_template(Template::Tube)
    }

    pub fn null() -> Self {
        Self::with_template(Template::Null)
    }

    /// Builder for a kind given by name (`mesh`, `block`, `point`, `line`,
    /// `tube` or `null`)
    pub fn for_kind(kind: &str) -> Option<Self> {
        let template = match kind.trim().to_ascii_lowercase().as_str() {
            "mesh" => Template::Mesh,
            "block" | "blocks" => Template::Block,
            "point" | "points" => Template::Point,
            "line" | "lines" => Template::Line,
            "tube" | "tubes" => Template::Tube,
            "null" => Template::Null,
            _ => return None,
        };
        Some(Self::with_template(template))
    }

    fn mark(&mut self, key: &'static str) {
        if !self.supplied.contains(&key) {
            self.supplied.push(key);
        }
    }

    pub fn xyz(mut self, x: Vec<f64>, y: Vec<f64>, z: Vec<f64>) -> Self {
        self.mark("x");
        self.mark("y");
        self.mark("z");
        self.xyz = Some((x, y, z));
        self
    }

    pub fn vertices(mut self, vertices: Vec<[f64; 3]>) -> Self {
        self.mark("vertices");
        self.vertices = Some(vertices);
        self
    }

    /// Raw loader columns; coordinates come from `vertices` or `x`, `y`, `z`
    /// and the remaining scalar columns become value columns
    pub fn data(mut self, data: RawData) -> Self {
        self.mark("data");
        self.data = Some(data);
        self
    }

    pub fn indices(mut self, indices: Vec<[u32; 3]>) -> Self {
        self.mark("indices");
        self.indices = Some(indices);
        self
    }

    pub fn values(mut self, values: Vec<f64>) -> Self {
        self.mark("values");
        self.values = Some(values);
        self
    }

    /// Name of the active value column
    pub fn value_header(mut self, header: impl Into<String>) -> Self {
        self.mark("header");
        self.value_header = Some(header.into());
        self
    }

    pub fn block_size(mut self, size: [f64; 3]) -> Self {
        self.mark("block_size");
        self.block_size = Some(size);
        self
    }

    /// Derive the block size from the coordinate spacing
    pub fn autosize(mut self, autosize: bool) -> Self {
        self.mark("autosize");
        self.autosize = autosize;
        self
    }

    pub fn colormap(mut self, spec: impl Into<String>) -> Self {
        self.mark("colormap");
        self.colormap = Some(spec.into());
        self
    }

    /// Colormap applied only when none was set explicitly
    pub fn default_colormap(mut self, spec: &str) -> Self {
        if self.colormap.is_none() {
            self.colormap = Some(spec.to_string());
        }
        self
    }

    pub fn range(self, vmin: f64, vmax: f64) -> Self {
        self.vmin(vmin).vmax(vmax)
    }

    pub fn vmin(mut self, vmin: f64) -> Self {
        self.mark("vmin");
        self.vmin = Some(vmin);
        self
    }

    pub fn vmax(mut self, vmax: f64) -> Self {
        self.mark("vmax");
        self.vmax = Some(vmax);
        self
    }

    /// Explicit per-row colors, bypassing the colormap
    pub fn colors(mut self, colors: Vec<Rgb>) -> Self {
        self.mark("colors");
        self.colors = Some(colors);
        self
    }

    pub fn point_size(mut self, size: f64) -> Self {
        self.mark("point_size");
        self.point_size = Some(PointSize::Uniform(size));
        self
    }

    pub fn point_sizes(mut self, sizes: Vec<f64>) -> Self {
        self.mark("point_size");
        self.point_size = Some(PointSize::PerPoint(sizes));
        self
    }

    pub fn marker(mut self, marker: Marker) -> Self {
        self.mark("marker");
        self.marker = marker;
        self
    }

    /// Close the polyline by repeating the first vertex
    pub fn looped(mut self, looped: bool) -> Self {
        self.mark("loop");
        self.looped = looped;
        self
    }

    pub fn radius(mut self, radius: f64) -> Self {
        self.mark("radius");
        self.radius = radius;
        self
    }

    pub fn resolution(mut self, resolution: u32) -> Self {
        self.mark("resolution");
        self.resolution = resolution;
        self
    }

    pub fn color(mut self, color: Rgb) -> Self {
        self.mark("color");
        self.color = Some(color);
        self
    }

    /// Pick the element color from `rng`
    pub fn random_color<R: Rng + ?Sized>(self, rng: &mut R) -> Self {
        let color = Rgb::random(rng);
        self.color(color)
    }

    pub fn has_color(&self) -> bool {
        self.color.is_some()
    }

    pub fn alpha(mut self, alpha: f32) -> Self {
        self.mark("alpha");
        self.alpha = alpha;
        self
    }

    pub fn id(mut self, id: i64) -> Self {
        self.mark("id");
        self.meta.id = id;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.mark("name");
        self.meta.name = name.into();
        self
    }

    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.mark("extension");
        self.meta.extension = extension.into();
        self
    }

    pub fn property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.set(key, value);
        self
    }

    /// Run the pipeline and return a checked element
    ///
    /// Null elements carry no geometry; any supplied coordinates are ignored.
    pub fn build(mut self) -> Result<Element, ConstructionError> {
        let coordinates = match self.template {
            Template::Null => None,
            _ => self.resolve_geometry()?,
        };
        let mut base = fill_base(coordinates)?;
        let kind = self.fill_kind(&mut base)?;
        let color = self.color.unwrap_or_default().clamped();
        Ok(Element::from_parts(
            self.meta,
            base,
            kind,
            color,
            self.alpha,
            self.properties,
        ))
    }

    /// Pick the first resolvable input shape: `x,y,z`, `vertices`, then the
    /// data table's `vertices` or `x,y,z` columns
    fn resolve_geometry(&mut self) -> Result<Option<GeometryInput>, ConstructionError> {
        if let Some((x, y, z)) = self.xyz.take() {
            return Ok(Some(GeometryInput::Xyz { x, y, z }));
        }
        if let Some(vertices) = self.vertices.take() {
            return Ok(Some(GeometryInput::Vertices(vertices)));
        }
        if let Some(data) = self.data.as_mut() {
            if let Some(RawColumn::Triples(vertices)) = data.remove("vertices") {
                return Ok(Some(GeometryInput::Vertices(vertices)));
            }
            if let Some([x, y, z]) = take_coordinate_columns(data) {
                return Ok(Some(GeometryInput::Xyz { x, y, z }));
            }
        }
        if self.template == Template::Null {
            return Ok(None);
        }
        Err(ConstructionError::MissingData {
            kind: self.template.name(),
            supplied: self.supplied_keys(),
        })
    }

    fn supplied_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.supplied.iter().map(|k| k.to_string()).collect();
        if let Some(data) = &self.data {
            keys.extend(data.keys().map(|k| format!("data.{}", k)));
        }
        keys
    }

    fn fill_kind(&mut self, base: &mut GeometryBase) -> Result<ElementKind, ConstructionError> {
        match self.template {
            Template::Mesh => {
                let indices = match self.indices.take() {
                    Some(indices) => indices,
                    None => self.data_indices()?,
                };
                check_mesh(base.len(), &indices)?;
                Ok(ElementKind::Mesh(MeshAttributes { indices }))
            }
            Template::Block => {
                let tabular = self.fill_tabular(base.len())?;
                let block_size = match (self.block_size, self.autosize) {
                    (Some(size), false) => validate_block_size(&size)?,
                    _ => validate_block_size(&autosize(&base.points()))?,
                };
                Ok(ElementKind::Block(BlockAttributes {
                    tabular,
                    block_size,
                }))
            }
            Template::Point => {
                let tabular = self.fill_tabular(base.len())?;
                let point_size = match self.point_size.take() {
                    Some(PointSize::PerPoint(sizes)) => sizes,
                    Some(PointSize::Uniform(size)) => vec![size; base.len()],
                    None => vec![DEFAULT_POINT_SIZE; base.len()],
                };
                check_point_sizes(base.len(), &point_size)?;
                Ok(ElementKind::Point(PointAttributes {
                    tabular,
                    point_size,
                    marker: self.marker,
                }))
            }
            Template::Line => {
                close_polyline(base, self.looped)?;
                Ok(ElementKind::Line(LineAttributes {
                    looped: self.looped,
                }))
            }
            Template::Tube => {
                close_polyline(base, self.looped)?;
                if !(self.radius.is_finite() && self.radius > 0.0) {
                    return Err(ConstructionError::validation(format!(
                        "tube radius must be positive, got {}",
                        self.radius
                    )));
                }
                Ok(ElementKind::Tube(TubeAttributes {
                    looped: self.looped,
                    radius: self.radius,
                    resolution: self.resolution.max(3),
                }))
            }
            Template::Null => Ok(ElementKind::Null),
        }
    }

    fn data_indices(&mut self) -> Result<Vec<[u32; 3]>, ConstructionError> {
        match self.data.as_mut().and_then(|d| d.remove("indices")) {
            Some(RawColumn::Triples(triples)) => triples
                .iter()
                .map(|t| {
                    let mut face = [0u32; 3];
                    for (slot, &value) in face.iter_mut().zip(t) {
                        if value < 0.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
                            return Err(ConstructionError::validation(format!(
                                "invalid mesh index {}",
                                value
                            )));
                        }
                        *slot = value as u32;
                    }
                    Ok(face)
                })
                .collect(),
            Some(RawColumn::Scalars(_)) => Err(ConstructionError::validation(
                "mesh indices must be triples",
            )),
            None => Err(ConstructionError::MissingData {
                kind: "mesh",
                supplied: self.supplied_keys(),
            }),
        }
    }

    /// Value columns from `values` and the scalar data columns, then the
    /// colormap, range and explicit colors
    fn fill_tabular(&mut self, rows: usize) -> Result<TabularAttributes, ConstructionError> {
        let mut table = DataTable::new();
        if let Some(values) = self.values.take() {
            let header = self
                .value_header
                .clone()
                .unwrap_or_else(|| DEFAULT_VALUE_HEADER.to_string());
            check_rows(&header, values.len(), rows)?;
            table.set_column(header, values)?;
        }
        if let Some(data) = self.data.take() {
            for (name, column) in data {
                if COORDINATE_KEYS.iter().any(|k| name.eq_ignore_ascii_case(k)) {
                    continue;
                }
                if let RawColumn::Scalars(values) = column {
                    check_rows(&name, values.len(), rows)?;
                    if !table.has_column(&name) {
                        table.set_column(name, values)?;
                    }
                }
            }
        }

        // Explicit colors make the colormap irrelevant, so a bad one is only
        // fatal without them.
        let spec = self.colormap.as_deref().unwrap_or(DEFAULT_COLORMAP);
        let colormap = match (Colormap::parse(spec), &self.colors) {
            (Ok(colormap), _) => colormap,
            (Err(_), Some(_)) => Colormap::parse(DEFAULT_COLORMAP)
                .map_err(|e| ConstructionError::validation(e.to_string()))?,
            (Err(e), None) => return Err(ConstructionError::validation(e.to_string())),
        };

        let mut tabular = TabularAttributes::new(table, rows, self.value_header.take(), colormap)?;
        if let Some(vmin) = self.vmin {
            tabular.set_vmin(vmin);
        }
        if let Some(vmax) = self.vmax {
            tabular.set_vmax(vmax);
        }
        tabular.set_colors(self.colors.take())?;
        Ok(tabular)
    }
}

fn take_coordinate_columns(data: &mut RawData) -> Option<[Vec<f64>; 3]> {
    let key_for = |data: &RawData, axis: &str| {
        data.iter()
            .find(|(k, c)| k.eq_ignore_ascii_case(axis) && matches!(c, RawColumn::Scalars(_)))
            .map(|(k, _)| k.clone())
    };
    let keys = [
        key_for(data, "x")?,
        key_for(data, "y")?,
        key_for(data, "z")?,
    ];
    Some(keys.map(|key| match data.remove(&key) {
        Some(RawColumn::Scalars(values)) => values,
        _ => Vec::new(),
    }))
}

fn fill_base(input: Option<GeometryInput>) -> Result<GeometryBase, ConstructionError> {
    let narrow = |v: &[f64]| v.iter().map(|&c| c as f32).collect::<Vec<f32>>();
    match input {
        Some(GeometryInput::Xyz { x, y, z }) => GeometryBase::new(narrow(&x), narrow(&y), narrow(&z)),
        Some(GeometryInput::Vertices(vertices)) => {
            let narrowed: Vec<[f32; 3]> = vertices
                .iter()
                .map(|v| [v[0] as f32, v[1] as f32, v[2] as f32])
                .collect();
            Ok(GeometryBase::from_vertices(&narrowed))
        }
        None => Ok(GeometryBase::default()),
    }
}

fn check_rows(name: &str, len: usize, rows: usize) -> Result<(), ConstructionError> {
    if len == rows {
        Ok(())
    } else {
        Err(ConstructionError::validation(format!(
            "column `{}` has {} rows, geometry has {}",
            name, len, rows
        )))
    }
}

fn check_mesh(vertex_count: usize, indices: &[[u32; 3]]) -> Result<(), ConstructionError> {
    if vertex_count == 0 {
        return Err(ConstructionError::validation("mesh needs at least one vertex"));
    }
    if let Some(bad) = indices.iter().flatten().find(|&&i| i as usize >= vertex_count) {
        return Err(ConstructionError::validation(format!(
            "mesh index {} out of bounds for {} vertices",
            bad, vertex_count
        )));
    }
    Ok(())
}

fn check_point_sizes(rows: usize, sizes: &[f64]) -> Result<(), ConstructionError> {
    check_rows("point_size", sizes.len(), rows)?;
    match sizes.iter().find(|s| !(s.is_finite() && **s >= 0.0)) {
        Some(bad) => Err(ConstructionError::validation(format!("invalid point size {}", bad))),
        None => Ok(()),
    }
}

/// Lines and tubes need two vertices; a looped one gets vertex 0 appended
fn close_polyline(base: &mut GeometryBase, looped: bool) -> Result<(), ConstructionError> {
    if base.len() < 2 {
        return Err(ConstructionError::validation(format!(
            "polyline needs at least 2 vertices, got {}",
            base.len()
        )));
    }
    if looped {
        base.push(base.vertex(0));
    }
    Ok(())
}

/// Block sizes need exactly three positive, finite components
pub(crate) fn validate_block_size(size: &[f64]) -> Result<Vector3<f64>, ConstructionError> {
    match size {
        [x, y, z] if size.iter().all(|c| c.is_finite() && *c > 0.0) => Ok(Vector3::new(*x, *y, *z)),
        _ => Err(ConstructionError::validation(format!(
            "block size needs 3 positive components, got {:?}",
            size
        ))),
    }
}

/// Smallest positive gap between distinct coordinates along each axis.
///
/// An axis without a gap (a single layer of blocks) borrows the smallest gap
/// found on the other axes, or 1.0 when no axis has one.
pub fn autosize(points: &[Point3<f64>]) -> [f64; 3] {
    let gaps: Vec<Option<f64>> = (0..3)
        .map(|axis| {
            let mut coords: Vec<f64> = points.iter().map(|p| p[axis]).filter(|c| c.is_finite()).collect();
            coords.sort_by(f64::total_cmp);
            coords.dedup();
            coords
                .windows(2)
                .map(|w| w[1] - w[0])
                .filter(|gap| *gap > 0.0)
                .min_by(f64::total_cmp)
        })
        .collect();
    let fallback = gaps.iter().flatten().copied().min_by(f64::total_cmp).unwrap_or(1.0);
    [
        gaps[0].unwrap_or(fallback),
        gaps[1].unwrap_or(fallback),
        gaps[2].unwrap_or(fallback),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_missing_data_names_supplied_keys() {
        let err = ElementBuilder::mesh()
            .indices(vec![[0, 1, 2]])
            .name("pit")
            .build()
            .unwrap_err();
        match err {
            ConstructionError::MissingData { kind, supplied } => {
                assert_eq!(kind, "mesh");
                assert_eq!(supplied, vec!["indices", "name"]);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_null_element_needs_no_geometry() {
        let element = ElementBuilder::null().build().unwrap();
        assert_eq!(element.vertex_count(), 0);
        assert_eq!(element.id(), -1);
    }

    #[test]
    fn test_null_element_ignores_coordinates() {
        let element = ElementBuilder::null()
            .xyz(vec![0.0, 1.0], vec![0.0], Vec::new())
            .build()
            .unwrap();
        assert_eq!(element.vertex_count(), 0);
    }

    #[test]
    fn test_autosize_with_fallback() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
        ];
        assert_eq!(autosize(&points), [2.0, 2.0, 2.0]);
        assert_eq!(autosize(&[Point3::origin()]), [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_autosize_picks_smallest_gap() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(5.0, 1.0, 0.0),
            Point3::new(7.5, 4.0, 0.25),
        ];
        assert_eq!(autosize(&points), [2.5, 1.0, 0.25]);
    }

    #[test]
    fn test_block_size_validation() {
        assert!(validate_block_size(&[1.0, 1.0, 1.0]).is_ok());
        assert!(validate_block_size(&[1.0, 0.0, 1.0]).is_err());
        assert!(validate_block_size(&[1.0, 1.0]).is_err());
        assert!(validate_block_size(&[1.0, f64::NAN, 1.0]).is_err());
    }

    #[test]
    fn test_random_color_is_seeded() {
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        let first = ElementBuilder::null().random_color(&mut a).build().unwrap();
        let second = ElementBuilder::null().random_color(&mut b).build().unwrap();
        assert_eq!(first.color(), second.color());
    }

    #[test]
    fn test_for_kind() {
        assert!(ElementBuilder::for_kind("Blocks").is_some());
        assert!(ElementBuilder::for_kind("voxel").is_none());
    }
}
