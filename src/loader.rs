// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Batch element loading
//!
//! Elements are built on a rayon pool and sent back over a channel. The
//! receiving side drains the outcomes into a [`SharedCollection`]; a failed
//! element is reported and skipped without affecting the rest of the batch.

use crate::collection::{ElementCollection, SharedCollection};
use crate::element::{Element, ElementBuilder, Marker, RawData, AUTO_ID};
use crate::error::ConstructionError;
use crate::utils::color::Rgb;
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::mpsc::{self, Receiver};
use std::sync::PoisonError;
use std::time::Instant;
use tracing::{info, instrument, warn};

fn auto_id() -> i64 {
    AUTO_ID
}

/// Optional attributes of a load request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    pub value_header: Option<String>,
    pub block_size: Option<[f64; 3]>,
    pub autosize: Option<bool>,
    pub colormap: Option<String>,
    pub vmin: Option<f64>,
    pub vmax: Option<f64>,
    pub point_size: Option<f64>,
    pub marker: Option<Marker>,
    #[serde(rename = "loop")]
    pub looped: bool,
    pub radius: Option<f64>,
    pub resolution: Option<u32>,
    pub color: Option<[f32; 3]>,
    pub alpha: Option<f32>,
}

/// One element to load, as parsed by a file reader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadRequest {
    pub name: String,
    /// Element kind: `mesh`, `block`, `point`, `line`, `tube` or `null`
    pub kind: String,
    #[serde(default)]
    pub extension: String,
    #[serde(default = "auto_id")]
    pub id: i64,
    #[serde(default)]
    pub data: RawData,
    #[serde(default)]
    pub options: LoadOptions,
}

impl LoadRequest {
    pub fn new(name: impl Into<String>, kind: impl Into<String>, data: RawData) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            extension: String::new(),
            id: AUTO_ID,
            data,
            options: LoadOptions::default(),
        }
    }

    /// Builder carrying every field of this request
    pub fn builder(&self, default_colormap: &str) -> Result<ElementBuilder, ConstructionError> {
        let options = &self.options;
        let mut builder = ElementBuilder::for_kind(&self.kind).ok_or_else(|| {
            ConstructionError::validation(format!("unknown element kind `{}`", self.kind))
        })?;
        builder = builder
            .data(self.data.clone())
            .name(self.name.clone())
            .extension(self.extension.clone())
            .id(self.id);

        if let Some(colormap) = &options.colormap {
            builder = builder.colormap(colormap.clone());
        }
        builder = builder.default_colormap(default_colormap);
        if let Some(header) = &options.value_header {
            builder = builder.value_header(header.clone());
        }
        if let Some(size) = options.block_size {
            builder = builder.block_size(size);
        }
        if let Some(autosize) = options.autosize {
            builder = builder.autosize(autosize);
        }
        if let Some(vmin) = options.vmin {
            builder = builder.vmin(vmin);
        }
        if let Some(vmax) = options.vmax {
            builder = builder.vmax(vmax);
        }
        if let Some(size) = options.point_size {
            builder = builder.point_size(size);
        }
        if let Some(marker) = options.marker {
            builder = builder.marker(marker);
        }
        if options.looped {
            builder = builder.looped(true);
        }
        if let Some(radius) = options.radius {
            builder = builder.radius(radius);
        }
        if let Some(resolution) = options.resolution {
            builder = builder.resolution(resolution);
        }
        if let Some([r, g, b]) = options.color {
            builder = builder.color(Rgb::new(r, g, b));
        }
        if let Some(alpha) = options.alpha {
            builder = builder.alpha(alpha);
        }
        Ok(builder)
    }
}

/// Result of building one requested element
#[derive(Debug)]
pub struct LoadOutcome {
    /// Position of the request in its batch
    pub index: usize,
    pub name: String,
    pub result: Result<Element, ConstructionError>,
}

/// Summary of a drained batch
#[derive(Debug, Default)]
pub struct LoadReport {
    /// `(name, id)` of every stored element
    pub loaded: Vec<(String, i64)>,
    pub failed: Vec<(String, ConstructionError)>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Build every request in parallel and stream the outcomes.
///
/// Returns at once; outcomes arrive on the receiver as workers finish and the
/// channel closes after the last one.
///
/// Element colors are drawn from `rng` up front, in request order, so a
/// seeded generator gives the same colors whatever order the workers finish
/// in. `threads` sizes a dedicated pool; `None` uses rayon's global pool.
#[instrument(level = "debug", skip_all, fields(requests = requests.len()))]
pub fn load_batch<R: Rng + ?Sized>(
    requests: Vec<LoadRequest>,
    rng: &mut R,
    default_colormap: &str,
    threads: Option<usize>,
) -> Receiver<LoadOutcome> {
    let jobs: Vec<(usize, LoadRequest, Rgb)> = requests
        .into_iter()
        .enumerate()
        .map(|(index, request)| (index, request, Rgb::random(rng)))
        .collect();
    let default_colormap = default_colormap.to_string();
    let (sender, receiver) = mpsc::channel();

    let work = move || {
        jobs.into_par_iter()
            .for_each_with(sender, |sender, (index, request, color)| {
                let result = request.builder(&default_colormap).and_then(|builder| {
                    let builder = if builder.has_color() { builder } else { builder.color(color) };
                    builder.build()
                });
                // The receiver may be gone; outcomes are then discarded.
                let _ = sender.send(LoadOutcome {
                    index,
                    name: request.name,
                    result,
                });
            });
    };

    let pool = threads.and_then(|n| match rayon::ThreadPoolBuilder::new().num_threads(n).build() {
        Ok(pool) => Some(pool),
        Err(e) => {
            warn!("falling back to the global pool: {}", e);
            None
        }
    });
    match pool {
        Some(pool) => rayon::spawn(move || pool.install(work)),
        None => rayon::spawn(work),
    }
    receiver
}

/// Store every successful outcome in batch order and report the failures.
///
/// Outcomes are stored as soon as every earlier request has been seen, so the
/// collection fills while the batch is still running.
pub fn drain_into(receiver: Receiver<LoadOutcome>, collection: &SharedCollection) -> LoadReport {
    let start = Instant::now();
    let mut report = LoadReport::default();
    let mut pending: BTreeMap<usize, LoadOutcome> = BTreeMap::new();
    let mut next = 0;

    for outcome in receiver {
        pending.insert(outcome.index, outcome);
        if !pending.contains_key(&next) {
            continue;
        }
        let mut guard = collection.write().unwrap_or_else(PoisonError::into_inner);
        while let Some(outcome) = pending.remove(&next) {
            store(&mut guard, outcome, &mut report);
            next += 1;
        }
    }

    // Gaps only appear when a worker died mid-batch
    if !pending.is_empty() {
        warn!(missing_from = next, "batch has missing outcomes");
        let mut guard = collection.write().unwrap_or_else(PoisonError::into_inner);
        for outcome in std::mem::take(&mut pending).into_values() {
            store(&mut guard, outcome, &mut report);
        }
    }

    info!(
        loaded = report.loaded.len(),
        failed = report.failed.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "batch loaded"
    );
    report
}

fn store(collection: &mut ElementCollection, outcome: LoadOutcome, report: &mut LoadReport) {
    match outcome.result {
        Ok(element) => {
            let id = collection.add(element);
            report.loaded.push((outcome.name, id));
        }
        Err(e) => {
            warn!(name = %outcome.name, "skipping element: {}", e);
            report.failed.push((outcome.name, e));
        }
    }
}
