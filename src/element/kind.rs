// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Kind-specific element attributes

use super::tabular::TabularAttributes;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default number of sides of a tube cross-section
pub const DEFAULT_TUBE_RESOLUTION: u32 = 8;

/// Marker glyph of a point cloud
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Marker {
    #[default]
    Square,
    Circle,
    Sphere,
}

impl Marker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Square => "square",
            Self::Circle => "circle",
            Self::Sphere => "sphere",
        }
    }
}

impl FromStr for Marker {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "square" => Ok(Self::Square),
            "circle" => Ok(Self::Circle),
            "sphere" => Ok(Self::Sphere),
            other => Err(format!("unknown marker `{}`", other)),
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshAttributes {
    pub indices: Vec<[u32; 3]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockAttributes {
    pub tabular: TabularAttributes,
    pub block_size: Vector3<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointAttributes {
    pub tabular: TabularAttributes,
    /// Per-point size, one entry per vertex
    pub point_size: Vec<f64>,
    pub marker: Marker,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineAttributes {
    pub looped: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TubeAttributes {
    pub looped: bool,
    pub radius: f64,
    pub resolution: u32,
}

/// Closed set of element kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ElementKind {
    Mesh(MeshAttributes),
    Block(BlockAttributes),
    Point(PointAttributes),
    Line(LineAttributes),
    Tube(TubeAttributes),
    Null,
}

impl ElementKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mesh(_) => "mesh",
            Self::Block(_) => "block",
            Self::Point(_) => "point",
            Self::Line(_) => "line",
            Self::Tube(_) => "tube",
            Self::Null => "null",
        }
    }

    pub fn tabular(&self) -> Option<&TabularAttributes> {
        match self {
            Self::Block(b) => Some(&b.tabular),
            Self::Point(p) => Some(&p.tabular),
            _ => None,
        }
    }

    pub fn tabular_mut(&mut self) -> Option<&mut TabularAttributes> {
        match self {
            Self::Block(b) => Some(&mut b.tabular),
            Self::Point(p) => Some(&mut p.tabular),
            _ => None,
        }
    }

    /// Whether the vertices form a closed polyline
    pub fn is_looped(&self) -> bool {
        match self {
            Self::Line(l) => l.looped,
            Self::Tube(t) => t.looped,
            _ => false,
        }
    }
}
