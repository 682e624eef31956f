// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error types for element construction, geometry queries and configuration

use thiserror::Error;

/// Result type for mineview operations
pub type Result<T> = std::result::Result<T, Error>;

/// Raised while building an element from loader data.
///
/// Construction errors are never recovered inside the core: the loader reports
/// the failure for that one element and carries on with the rest of the batch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConstructionError {
    #[error("{kind} element needs `x,y,z`, `vertices` or a data table with either; got [{}]", supplied.join(", "))]
    MissingData {
        kind: &'static str,
        supplied: Vec<String>,
    },

    #[error("validation failed: {0}")]
    Validation(String),
}

impl ConstructionError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// Degenerate geometry met while answering a query.
///
/// The scene layer recovers these locally: the query yields an empty result and
/// a diagnostic naming the element is logged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("cross-section has an open boundary ({dangling} dangling endpoints)")]
    OpenCrossSection { dangling: usize },

    #[error("cross-section is non-manifold: {branches} segments meet at one point")]
    NonManifoldCrossSection { branches: usize },

    #[error("ray direction has zero length")]
    DegenerateRay,

    #[error("plane normal has zero length")]
    DegeneratePlane,

    #[error("element {0} has no triangle mesh")]
    NotAMesh(i64),
}

/// Malformed colormap specification
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ColormapError {
    #[error("colormap `{0}` must name two colors separated by `-`")]
    Separator(String),

    #[error("unknown color `{0}`")]
    UnknownColor(String),
}

/// Element lookup failures in a collection
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CollectionError {
    #[error("no element with id {0}")]
    UnknownId(i64),
}

/// Configuration loading failures
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid value for {key}: {value}")]
    InvalidOverride { key: &'static str, value: String },
}

/// Any error the library can surface
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Construction(#[from] ConstructionError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Colormap(#[from] ColormapError),

    #[error(transparent)]
    Collection(#[from] CollectionError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_data_names_supplied_keys() {
        let err = ConstructionError::MissingData {
            kind: "Mesh",
            supplied: vec!["foo".into(), "indices".into()],
        };
        let message = err.to_string();
        assert!(message.contains("Mesh"));
        assert!(message.contains("foo, indices"));
    }
}
