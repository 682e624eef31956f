// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Engine configuration
//!
//! Settings are read from `mineview.toml` when present and may be overridden
//! by `MINEVIEW_*` environment variables.

use crate::error::ConfigError;
use crate::geometry::intersection::DEFAULT_LINE_THRESHOLD;
use crate::geometry::slicing::SLICE_EPSILON;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file looked up by [`EngineConfig::load`]
pub const CONFIG_FILE: &str = "mineview.toml";

/// What happens to automatic ids once a collection is emptied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdPolicy {
    /// Ids keep increasing for the lifetime of the collection
    #[default]
    Monotonic,
    /// Numbering restarts at 0 when the collection becomes empty
    ResetWhenEmpty,
}

impl std::str::FromStr for IdPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monotonic" => Ok(Self::Monotonic),
            "reset_when_empty" | "reset" => Ok(Self::ResetWhenEmpty),
            other => Err(format!("unknown id policy `{}`", other)),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Distance under which a ray counts as touching a line segment
    pub line_pick_threshold: f64,
    /// Coplanarity tolerance of the mesh slicing pre-filter
    pub slice_epsilon: f64,
    pub id_policy: IdPolicy,
    /// Colormap given to block and point elements without one
    pub default_colormap: String,
    /// Seed of the element color generator; random when unset
    pub color_seed: Option<u64>,
    /// Worker threads for batch loading; rayon's default when unset
    pub load_threads: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            line_pick_threshold: DEFAULT_LINE_THRESHOLD,
            slice_epsilon: SLICE_EPSILON,
            id_policy: IdPolicy::default(),
            default_colormap: "blue-red".to_string(),
            color_seed: None,
            load_threads: None,
        }
    }
}

impl EngineConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(toml::from_str(&content)?)
    }

    /// Load `mineview.toml` if present, then apply environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = if PathBuf::from(CONFIG_FILE).exists() {
            Self::from_file(CONFIG_FILE)?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `MINEVIEW_*` overrides read through `lookup`
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = lookup("MINEVIEW_LINE_PICK_THRESHOLD") {
            self.line_pick_threshold = parse_override("MINEVIEW_LINE_PICK_THRESHOLD", &value)?;
        }
        if let Some(value) = lookup("MINEVIEW_ID_POLICY") {
            self.id_policy = parse_override("MINEVIEW_ID_POLICY", &value)?;
        }
        if let Some(value) = lookup("MINEVIEW_COLOR_SEED") {
            self.color_seed = Some(parse_override("MINEVIEW_COLOR_SEED", &value)?);
        }
        if let Some(value) = lookup("MINEVIEW_LOAD_THREADS") {
            self.load_threads = Some(parse_override("MINEVIEW_LOAD_THREADS", &value)?);
        }
        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }
}

fn parse_override<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidOverride {
        key,
        value: value.to_string(),
    })
}
