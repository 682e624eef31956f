// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mineview geometry core
//!
//! Typed scene elements for mining visualization (meshes, block models,
//! point clouds, polylines and tubes) with the queries a viewer runs on
//! them: ray picking, planar slicing, inside-mesh tests and colormapping.

pub mod cli;
pub mod collection;
pub mod config;
pub mod element;
pub mod error;
pub mod geometry;
pub mod kernel;
pub mod loader;
pub mod utils;

pub use collection::{ElementCollection, SharedCollection};
pub use config::{EngineConfig, IdPolicy};
pub use element::{Element, ElementBuilder, ElementKind, SliceResult, AUTO_ID};
pub use error::{Error, Result};
pub use geometry::{Plane, Polyline, Ray, SlabSelection, TriMesh};
pub use kernel::{ElementSlice, InsideSummary, PickHit, Scene};
pub use loader::{LoadReport, LoadRequest};
