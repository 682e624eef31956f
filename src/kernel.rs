// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Scene API: element storage plus the picking, slicing and containment
//! queries that run across it

use crate::collection::{ElementCollection, SharedCollection};
use crate::config::EngineConfig;
use crate::element::{Element, ElementBuilder, ElementKind, SliceResult};
use crate::error::{CollectionError, ConstructionError, GeometryError, Result};
use crate::geometry::intersection::closest_index;
use crate::geometry::{analyze, is_watertight, GeometryStats, Plane, Ray};
use crate::loader::{drain_into, load_batch, LoadReport, LoadRequest};
use nalgebra::{Point3, Vector3};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::sync::{PoisonError, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, instrument, warn};

/// Nearest hit of a pick ray
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PickHit {
    pub id: i64,
    pub point: Point3<f64>,
    pub distance: f64,
}

/// Section of one element
#[derive(Debug, Clone, PartialEq)]
pub struct ElementSlice {
    pub id: i64,
    pub result: SliceResult,
}

/// Entries of one element enclosed by a closed mesh
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsideSummary {
    pub mesh_id: i64,
    pub target_id: i64,
    /// Number of enclosed vertices
    pub count: usize,
    /// Sum of the active values of enclosed blocks or points
    pub value_sum: f64,
    /// Enclosed block volume, zero for other kinds
    pub volume: f64,
    pub mask: Vec<bool>,
}

/// Element collection with scene-wide queries
pub struct Scene {
    collection: SharedCollection,
    config: EngineConfig,
    rng: StdRng,
}

impl Scene {
    /// Create a scene; colors are seeded from the config when it has a seed
    pub fn new(config: EngineConfig) -> Self {
        let rng = match config.color_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            collection: ElementCollection::with_policy(config.id_policy).into_shared(),
            config,
            rng,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Handle to the underlying collection for loader threads
    pub fn shared(&self) -> SharedCollection {
        self.collection.clone()
    }

    pub fn read(&self) -> RwLockReadGuard<'_, ElementCollection> {
        self.collection.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, ElementCollection> {
        self.collection.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Build and store an element, giving it a random color if it has none
    pub fn add(&mut self, builder: ElementBuilder) -> std::result::Result<i64, ConstructionError> {
        let builder = if builder.has_color() {
            builder
        } else {
            builder.random_color(&mut self.rng)
        };
        let element = builder
            .default_colormap(&self.config.default_colormap)
            .build()?;
        Ok(self.write().add(element))
    }

    /// Build a batch of elements in parallel and store the ones that succeed
    pub fn load(&mut self, requests: Vec<LoadRequest>) -> LoadReport {
        let receiver = load_batch(
            requests,
            &mut self.rng,
            &self.config.default_colormap,
            self.config.load_threads,
        );
        drain_into(receiver, &self.collection)
    }

    pub fn remove(&mut self, id: i64) -> std::result::Result<Element, CollectionError> {
        self.write().remove(id)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Run `f` on one element
    pub fn with_element_mut<T>(
        &self,
        id: i64,
        f: impl FnOnce(&mut Element) -> T,
    ) -> std::result::Result<T, CollectionError> {
        let mut guard = self.write();
        Ok(f(guard.try_get_mut(id)?))
    }

    /// Nearest point where a ray meets a visible element
    #[instrument(level = "debug", skip(self))]
    pub fn pick(
        &self,
        origin: Point3<f64>,
        direction: Vector3<f64>,
    ) -> std::result::Result<Option<PickHit>, GeometryError> {
        let ray = Ray::new(origin, direction).validated()?;
        let threshold = self.config.line_pick_threshold;
        let guard = self.read();

        let (ids, points): (Vec<i64>, Vec<Point3<f64>>) = guard
            .visible()
            .flat_map(|element| {
                let id = element.id();
                element
                    .ray_hits(&ray, threshold)
                    .into_iter()
                    .map(move |point| (id, point))
            })
            .unzip();
        debug!(candidates = points.len(), "pick candidates");

        Ok(closest_index(&origin, &points).map(|i| PickHit {
            id: ids[i],
            point: points[i],
            distance: (points[i] - origin).norm(),
        }))
    }

    /// Ids of the visible elements a ray passes through, in insertion order
    pub fn hit_elements(
        &self,
        origin: Point3<f64>,
        direction: Vector3<f64>,
    ) -> std::result::Result<Vec<i64>, GeometryError> {
        let ray = Ray::new(origin, direction).validated()?;
        let threshold = self.config.line_pick_threshold;
        Ok(self
            .read()
            .visible()
            .filter(|element| !element.ray_hits(&ray, threshold).is_empty())
            .map(Element::id)
            .collect())
    }

    /// Section every visible element by a plane.
    ///
    /// A degenerate plane fails the whole query. An element whose own section
    /// is degenerate contributes an empty result and a warning instead.
    #[instrument(level = "debug", skip(self))]
    pub fn slice(
        &self,
        origin: Point3<f64>,
        normal: Vector3<f64>,
    ) -> std::result::Result<Vec<ElementSlice>, GeometryError> {
        Plane::new(origin, normal)?;
        let epsilon = self.config.slice_epsilon;
        let guard = self.read();

        Ok(guard
            .visible()
            .filter_map(|element| {
                let result = match element.slice(&origin, &normal, epsilon) {
                    Ok(SliceResult::Unsupported) => return None,
                    Ok(result) => result,
                    Err(e) => {
                        let watertight = element.tri_mesh().map(|mesh| is_watertight(&mesh));
                        warn!(
                            id = element.id(),
                            name = element.name(),
                            watertight = ?watertight,
                            "empty slice: {}",
                            e
                        );
                        empty_like(element)
                    }
                };
                Some(ElementSlice {
                    id: element.id(),
                    result,
                })
            })
            .collect())
    }

    /// Count and sum the entries of `target_id` that lie inside the closed
    /// mesh `mesh_id`
    pub fn accumulate_inside(&self, mesh_id: i64, target_id: i64) -> Result<InsideSummary> {
        let guard = self.read();
        let mesh = guard.try_get(mesh_id)?;
        let target = guard.try_get(target_id)?;
        let mask = mesh.contains_points(&target.points())?;

        let count = mask.iter().filter(|&&inside| inside).count();
        let value_sum = target
            .values()
            .map(|values| {
                values
                    .iter()
                    .zip(&mask)
                    .filter(|(v, inside)| **inside && v.is_finite())
                    .map(|(v, _)| *v)
                    .sum::<f64>()
            })
            .unwrap_or(0.0);
        let volume = match target.kind() {
            ElementKind::Block(block) => count as f64 * block.block_size.product(),
            _ => 0.0,
        };
        Ok(InsideSummary {
            mesh_id,
            target_id,
            count,
            value_sum,
            volume,
            mask,
        })
    }

    /// Geometry report of a mesh or tube element
    pub fn stats(&self, id: i64) -> Result<GeometryStats> {
        let guard = self.read();
        let element = guard.try_get(id)?;
        let mesh = element.tri_mesh().ok_or(GeometryError::NotAMesh(id))?;
        Ok(analyze(&mesh))
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

fn empty_like(element: &Element) -> SliceResult {
    match element.kind() {
        ElementKind::Block(_) | ElementKind::Point(_) => SliceResult::Selection(Default::default()),
        _ => SliceResult::Polylines(Vec::new()),
    }
}
