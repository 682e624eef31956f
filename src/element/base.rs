// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Coordinate storage shared by every element kind

use crate::error::ConstructionError;
use crate::geometry::BoundingBox;
use crate::utils::math::widen;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// Three parallel f32 coordinate columns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeometryBase {
    x: Vec<f32>,
    y: Vec<f32>,
    z: Vec<f32>,
}

impl GeometryBase {
    /// Build from columns; all three must have the same length
    pub fn new(x: Vec<f32>, y: Vec<f32>, z: Vec<f32>) -> Result<Self, ConstructionError> {
        if x.len() != y.len() || x.len() != z.len() {
            return Err(ConstructionError::validation(format!(
                "coordinate lengths differ: x={}, y={}, z={}",
                x.len(),
                y.len(),
                z.len()
            )));
        }
        Ok(Self { x, y, z })
    }

    pub fn from_vertices(vertices: &[[f32; 3]]) -> Self {
        Self {
            x: vertices.iter().map(|v| v[0]).collect(),
            y: vertices.iter().map(|v| v[1]).collect(),
            z: vertices.iter().map(|v| v[2]).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn x(&self) -> &[f32] {
        &self.x
    }

    pub fn y(&self) -> &[f32] {
        &self.y
    }

    pub fn z(&self) -> &[f32] {
        &self.z
    }

    pub fn vertex(&self, index: usize) -> Point3<f32> {
        Point3::new(self.x[index], self.y[index], self.z[index])
    }

    /// Column-stack of (x, y, z)
    pub fn vertices(&self) -> Vec<Point3<f32>> {
        (0..self.len()).map(|i| self.vertex(i)).collect()
    }

    /// Vertices widened to f64 for numeric work
    pub fn points(&self) -> Vec<Point3<f64>> {
        (0..self.len()).map(|i| widen(&self.vertex(i))).collect()
    }

    pub(crate) fn push(&mut self, vertex: Point3<f32>) {
        self.x.push(vertex.x);
        self.y.push(vertex.y);
        self.z.push(vertex.z);
    }

    /// Arithmetic mean of the vertices, `None` without vertices
    pub fn centroid(&self) -> Option<Point3<f64>> {
        if self.is_empty() {
            return None;
        }
        let n = self.len() as f64;
        let mean = |column: &[f32]| column.iter().map(|&c| c as f64).sum::<f64>() / n;
        Some(Point3::new(mean(&self.x), mean(&self.y), mean(&self.z)))
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.points())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatched_lengths_rejected() {
        let err = GeometryBase::new(vec![0.0, 1.0], vec![0.0], vec![0.0, 1.0]).unwrap_err();
        assert!(matches!(err, ConstructionError::Validation(_)));
    }

    #[test]
    fn test_vertices_and_centroid() {
        let base = GeometryBase::new(vec![-1.0, 1.0, 0.0], vec![0.0, 0.0, 1.0], vec![0.0; 3]).unwrap();
        assert_eq!(
            base.vertices(),
            vec![
                Point3::new(-1.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0)
            ]
        );
        let centroid = base.centroid().unwrap();
        assert_eq!(centroid.x, 0.0);
        assert!((centroid.y - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(centroid.z, 0.0);
    }

    #[test]
    fn test_empty_base() {
        let base = GeometryBase::default();
        assert!(base.centroid().is_none());
        assert!(base.bounding_box().is_empty());
    }
}
