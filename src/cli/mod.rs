// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CLI support: scene files and terminal reporting

pub mod reporter;

pub use reporter::Reporter;

use crate::loader::LoadRequest;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// JSON scene description: a list of elements to load
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneFile {
    pub elements: Vec<LoadRequest>,
}

impl SceneFile {
    /// Read a scene file; a bare array of elements is accepted too
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read scene file: {:?}", path.as_ref()))?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to parse scene file: {:?}", path.as_ref()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Shape {
            Wrapped(SceneFile),
            Bare(Vec<LoadRequest>),
        }
        Ok(match serde_json::from_str(content)? {
            Shape::Wrapped(scene) => scene,
            Shape::Bare(elements) => SceneFile { elements },
        })
    }
}

/// Parse `x,y,z` into a vector triple
pub fn parse_triple(text: &str) -> std::result::Result<[f64; 3], String> {
    let parts: Vec<f64> = text
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| format!("`{}`: {}", text, e))?;
    match parts.as_slice() {
        [x, y, z] => Ok([*x, *y, *z]),
        _ => Err(format!("`{}`: expected three comma-separated numbers", text)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_triple() {
        assert_eq!(parse_triple("1, -2.5,3"), Ok([1.0, -2.5, 3.0]));
        assert!(parse_triple("1,2").is_err());
        assert!(parse_triple("a,b,c").is_err());
    }

    #[test]
    fn test_scene_file_shapes() {
        let wrapped = SceneFile::from_json(
            r#"{"elements": [{"name": "n", "kind": "null"}]}"#,
        )
        .unwrap();
        let bare = SceneFile::from_json(r#"[{"name": "n", "kind": "null"}]"#).unwrap();
        assert_eq!(wrapped, bare);
        assert_eq!(bare.elements[0].kind, "null");
    }

    #[test]
    fn test_scene_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.json");
        std::fs::write(&path, r#"[{"name": "n", "kind": "null"}]"#).unwrap();
        assert_eq!(SceneFile::from_file(&path).unwrap().elements.len(), 1);
        assert!(SceneFile::from_file(dir.path().join("missing.json")).is_err());
    }
}
