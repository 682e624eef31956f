// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mineview CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mineview::cli::{parse_triple, Reporter, SceneFile};
use mineview::{EngineConfig, Scene};
use nalgebra::{Point3, Vector3};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mineview")]
#[command(about = "Mineview - query engine for mining scene geometry", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to mineview.toml plus MINEVIEW_* overrides)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the elements of a scene
    Info {
        /// Scene JSON file
        scene: PathBuf,
    },

    /// Volume and surface statistics of mesh elements
    Volume {
        scene: PathBuf,

        /// Only report this element
        #[arg(long)]
        id: Option<i64>,
    },

    /// Section every element by a plane
    Slice {
        scene: PathBuf,

        /// Point on the plane, as x,y,z
        #[arg(long, value_parser = parse_triple, allow_hyphen_values = true)]
        origin: [f64; 3],

        /// Plane normal, as x,y,z
        #[arg(long, value_parser = parse_triple, allow_hyphen_values = true)]
        normal: [f64; 3],
    },

    /// Nearest element hit by a ray
    Pick {
        scene: PathBuf,

        #[arg(long, value_parser = parse_triple, allow_hyphen_values = true)]
        origin: [f64; 3],

        #[arg(long, value_parser = parse_triple, allow_hyphen_values = true)]
        direction: [f64; 3],
    },

    /// Entries of one element inside a closed mesh
    Inside {
        scene: PathBuf,

        /// Id of the enclosing mesh
        #[arg(long)]
        mesh: i64,

        /// Id of the block, point or mesh element to test
        #[arg(long)]
        target: i64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("Failed to load config: {:?}", path))?,
        None => EngineConfig::load().context("Failed to load config")?,
    };

    if let Err(e) = run(&cli, config) {
        Reporter::report_error(&format!("{:#}", e));
        std::process::exit(1);
    }
    Ok(())
}

fn run(cli: &Cli, config: EngineConfig) -> Result<()> {
    let scene_path = match &cli.command {
        Commands::Info { scene }
        | Commands::Volume { scene, .. }
        | Commands::Slice { scene, .. }
        | Commands::Pick { scene, .. }
        | Commands::Inside { scene, .. } => scene,
    };
    let scene = load_scene(scene_path, config, cli.verbose && !cli.json)?;

    match &cli.command {
        Commands::Info { .. } => info_command(&scene, cli.json),
        Commands::Volume { id, .. } => volume_command(&scene, *id, cli.json),
        Commands::Slice { origin, normal, .. } => slice_command(&scene, origin, normal, cli.json),
        Commands::Pick {
            origin, direction, ..
        } => pick_command(&scene, origin, direction, cli.json),
        Commands::Inside { mesh, target, .. } => inside_command(&scene, *mesh, *target, cli.json),
    }
}

fn load_scene(path: &PathBuf, config: EngineConfig, report: bool) -> Result<Scene> {
    let start = Instant::now();
    let file = SceneFile::from_file(path)?;
    let mut scene = Scene::new(config);
    let load_report = scene.load(file.elements);
    if report || !load_report.is_clean() {
        Reporter::report_load(&path.display().to_string(), &load_report, start.elapsed());
    }
    Ok(scene)
}

fn info_command(scene: &Scene, json: bool) -> Result<()> {
    let guard = scene.read();
    if json {
        let rows: Vec<serde_json::Value> = guard
            .iter()
            .map(|e| {
                serde_json::json!({
                    "id": e.id(),
                    "name": e.name(),
                    "kind": e.kind_name(),
                    "vertices": e.vertex_count(),
                    "bbox": e.bounding_box().to_array(),
                    "volume": e.volume(),
                    "properties": e.exportable_properties(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    for element in guard.iter() {
        Reporter::report_element(element);
    }
    Ok(())
}

fn volume_command(scene: &Scene, id: Option<i64>, json: bool) -> Result<()> {
    let ids: Vec<(i64, String)> = {
        let guard = scene.read();
        guard
            .iter()
            .filter(|e| id.map_or(e.tri_mesh().is_some(), |wanted| e.id() == wanted))
            .map(|e| (e.id(), e.name().to_string()))
            .collect()
    };
    if let Some(wanted) = id {
        if ids.is_empty() {
            anyhow::bail!("no element with id {}", wanted);
        }
    }

    let mut results = Vec::new();
    for (id, name) in ids {
        let stats = scene.stats(id)?;
        if json {
            results.push(serde_json::json!({ "id": id, "name": name, "stats": stats }));
        } else {
            Reporter::report_stats(id, &name, &stats);
        }
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }
    Ok(())
}

fn slice_command(scene: &Scene, origin: &[f64; 3], normal: &[f64; 3], json: bool) -> Result<()> {
    let slices = scene.slice(Point3::from(*origin), Vector3::from(*normal))?;
    if json {
        let rows: Vec<serde_json::Value> = slices
            .iter()
            .map(|s| match &s.result {
                mineview::SliceResult::Polylines(loops) => {
                    serde_json::json!({ "id": s.id, "polylines": loops })
                }
                mineview::SliceResult::Selection(selection) => {
                    serde_json::json!({ "id": s.id, "selection": selection })
                }
                mineview::SliceResult::Unsupported => serde_json::json!({ "id": s.id }),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        Reporter::report_slice(&slices);
    }
    Ok(())
}

fn pick_command(scene: &Scene, origin: &[f64; 3], direction: &[f64; 3], json: bool) -> Result<()> {
    let hit = scene.pick(Point3::from(*origin), Vector3::from(*direction))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&hit)?);
    } else {
        Reporter::report_pick(hit.as_ref());
    }
    Ok(())
}

fn inside_command(scene: &Scene, mesh: i64, target: i64, json: bool) -> Result<()> {
    let summary = scene.accumulate_inside(mesh, target)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        Reporter::report_inside(&summary);
    }
    Ok(())
}
