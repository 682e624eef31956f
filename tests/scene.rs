// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Scene-wide picking, slicing, containment and loading

use approx::assert_abs_diff_eq;
use mineview::element::{RawColumn, RawData};
use mineview::error::{ConstructionError, GeometryError};
use mineview::geometry::Primitive;
use mineview::utils::Rgb;
use mineview::{ElementBuilder, EngineConfig, IdPolicy, LoadRequest, Scene};
use nalgebra::{Point3, Vector3};

fn cube(center: [f64; 3], side: f64) -> ElementBuilder {
    let mesh = Primitive::cuboid(Point3::from(center), Vector3::repeat(side)).to_mesh();
    ElementBuilder::mesh()
        .vertices(mesh.vertices.iter().map(|v| [v.x, v.y, v.z]).collect())
        .indices(mesh.indices)
}

fn seeded(seed: u64) -> EngineConfig {
    EngineConfig {
        color_seed: Some(seed),
        ..EngineConfig::default()
    }
}

#[test]
fn test_pick_returns_nearest_hit_across_elements() {
    let mut scene = Scene::default();
    let near = scene.add(cube([5.0, 0.0, 0.0], 2.0)).unwrap();
    let _far = scene.add(cube([10.0, 0.0, 0.0], 2.0)).unwrap();

    let hit = scene
        .pick(Point3::origin(), Vector3::x())
        .unwrap()
        .expect("ray meets both cubes");
    assert_eq!(hit.id, near);
    assert_abs_diff_eq!(hit.point.x, 4.0, epsilon = 1e-9);
    assert_abs_diff_eq!(hit.distance, 4.0, epsilon = 1e-9);
}

#[test]
fn test_pick_ignores_hidden_elements() {
    let mut scene = Scene::default();
    let near = scene.add(cube([5.0, 0.0, 0.0], 2.0)).unwrap();
    let far = scene.add(cube([10.0, 0.0, 0.0], 2.0)).unwrap();
    scene
        .with_element_mut(near, |element| element.set_visible(false))
        .unwrap();

    let hit = scene.pick(Point3::origin(), Vector3::x()).unwrap().unwrap();
    assert_eq!(hit.id, far);
    assert_abs_diff_eq!(hit.point.x, 9.0, epsilon = 1e-9);
}

#[test]
fn test_pick_lines_and_blocks() {
    let mut scene = Scene::default();
    let line = scene
        .add(ElementBuilder::line().vertices(vec![[2.0, -1.0, 0.0], [2.0, 1.0, 0.0]]))
        .unwrap();
    let blocks = scene
        .add(
            ElementBuilder::block()
                .vertices(vec![[6.0, 0.0, 0.0], [6.0, 5.0, 0.0]])
                .block_size([1.0, 1.0, 1.0]),
        )
        .unwrap();

    let hit = scene.pick(Point3::origin(), Vector3::x()).unwrap().unwrap();
    assert_eq!(hit.id, line);
    assert_abs_diff_eq!(hit.point.x, 2.0, epsilon = 1e-9);

    scene
        .with_element_mut(line, |element| element.set_visible(false))
        .unwrap();
    let hit = scene.pick(Point3::origin(), Vector3::x()).unwrap().unwrap();
    assert_eq!(hit.id, blocks);
    assert_eq!(hit.point, Point3::new(6.0, 0.0, 0.0));
}

#[test]
fn test_pick_skips_line_points_behind_origin() {
    let mut scene = Scene::default();
    let outline = scene
        .add(ElementBuilder::line().vertices(vec![
            [-1.0, 0.0, -1.0],
            [1.0, 0.0, -1.0],
            [1.0, 0.0, 5.0],
            [-1.0, 0.0, 5.0],
        ]))
        .unwrap();
    let cube = scene.add(cube([0.0, 0.0, 3.0], 1.0)).unwrap();

    let hit = scene.pick(Point3::origin(), Vector3::z()).unwrap().unwrap();
    assert_eq!(hit.id, cube);
    assert_abs_diff_eq!(hit.point.z, 2.5, epsilon = 1e-9);
    assert_eq!(
        scene.hit_elements(Point3::origin(), Vector3::z()).unwrap(),
        vec![outline, cube]
    );

    let behind = scene
        .add(ElementBuilder::line().vertices(vec![[-1.0, 0.0, -3.0], [1.0, 0.0, -3.0]]))
        .unwrap();
    let ids = scene.hit_elements(Point3::origin(), Vector3::z()).unwrap();
    assert!(!ids.contains(&behind));
}

#[test]
fn test_pick_without_hits() {
    let mut scene = Scene::default();
    scene.add(cube([5.0, 0.0, 0.0], 2.0)).unwrap();
    assert_eq!(scene.pick(Point3::origin(), -Vector3::x()).unwrap(), None);
    assert_eq!(
        scene.pick(Point3::origin(), Vector3::zeros()),
        Err(GeometryError::DegenerateRay)
    );
}

#[test]
fn test_hit_elements_in_insertion_order() {
    let mut scene = Scene::default();
    let far = scene.add(cube([10.0, 0.0, 0.0], 2.0)).unwrap();
    let off_axis = scene.add(cube([5.0, 8.0, 0.0], 2.0)).unwrap();
    let near = scene.add(cube([5.0, 0.0, 0.0], 2.0)).unwrap();

    let ids = scene.hit_elements(Point3::origin(), Vector3::x()).unwrap();
    assert_eq!(ids, vec![far, near]);
    assert!(!ids.contains(&off_axis));
}

#[test]
fn test_slice_rejects_degenerate_plane() {
    let mut scene = Scene::default();
    scene.add(cube([0.0, 0.0, 0.0], 2.0)).unwrap();
    assert_eq!(
        scene.slice(Point3::origin(), Vector3::zeros()),
        Err(GeometryError::DegeneratePlane)
    );
}

#[test]
fn test_accumulate_inside_blocks() {
    let mut scene = Scene::default();
    let mesh = scene.add(cube([0.0, 0.0, 0.0], 2.0)).unwrap();
    let blocks = scene
        .add(
            ElementBuilder::block()
                .vertices(vec![[0.0, 0.0, 0.0], [0.5, -0.25, 0.5], [3.0, 0.0, 0.0]])
                .values(vec![1.0, 2.0, 10.0])
                .block_size([0.5, 0.5, 0.5]),
        )
        .unwrap();

    let summary = scene.accumulate_inside(mesh, blocks).unwrap();
    assert_eq!(summary.count, 2);
    assert_eq!(summary.mask, vec![true, true, false]);
    assert_abs_diff_eq!(summary.value_sum, 3.0);
    assert_abs_diff_eq!(summary.volume, 0.25);
}

#[test]
fn test_accumulate_inside_points_has_no_volume() {
    let mut scene = Scene::default();
    let mesh = scene.add(cube([0.0, 0.0, 0.0], 2.0)).unwrap();
    let points = scene
        .add(
            ElementBuilder::point()
                .vertices(vec![[0.2, 0.1, 0.0], [5.0, 0.0, 0.0]])
                .values(vec![4.0, 6.0]),
        )
        .unwrap();

    let summary = scene.accumulate_inside(mesh, points).unwrap();
    assert_eq!(summary.count, 1);
    assert_abs_diff_eq!(summary.value_sum, 4.0);
    assert_eq!(summary.volume, 0.0);
}

#[test]
fn test_accumulate_inside_needs_a_mesh() {
    let mut scene = Scene::default();
    let points = scene
        .add(ElementBuilder::point().vertices(vec![[0.0, 0.0, 0.0]]))
        .unwrap();
    assert!(scene.accumulate_inside(points, points).is_err());
    assert!(scene.accumulate_inside(99, points).is_err());
}

#[test]
fn test_seeded_scene_colors_repeat() {
    let color_of = |seed: u64| {
        let mut scene = Scene::new(seeded(seed));
        let id = scene.add(cube([0.0, 0.0, 0.0], 1.0)).unwrap();
        let color = scene.read().get(id).unwrap().color();
        color
    };
    assert_eq!(color_of(7), color_of(7));
    assert_ne!(color_of(7), color_of(8));

    let mut scene = Scene::new(seeded(7));
    let red = Rgb::new(1.0, 0.0, 0.0);
    let id = scene.add(cube([0.0, 0.0, 0.0], 1.0).color(red)).unwrap();
    assert_eq!(scene.read().get(id).unwrap().color(), red);
}

#[test]
fn test_load_reports_failures_and_keeps_order() {
    let mut line = RawData::new();
    line.insert(
        "vertices".into(),
        RawColumn::Triples(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]),
    );
    let mut blocks = RawData::new();
    for (axis, column) in [("x", [0.0, 2.0]), ("y", [0.0, 0.0]), ("z", [0.0, 0.0])] {
        blocks.insert(axis.into(), RawColumn::Scalars(column.to_vec()));
    }
    blocks.insert("au".into(), RawColumn::Scalars(vec![1.0, 3.0]));

    let mut scene = Scene::new(seeded(1));
    let report = scene.load(vec![
        LoadRequest::new("collar", "line", line),
        LoadRequest::new("broken", "mesh", RawData::new()),
        LoadRequest::new("model", "block", blocks),
    ]);

    assert_eq!(
        report.loaded,
        vec![("collar".to_string(), 0), ("model".to_string(), 1)]
    );
    assert_eq!(report.failed.len(), 1);
    assert!(matches!(
        report.failed[0].1,
        ConstructionError::MissingData { .. }
    ));

    let guard = scene.read();
    let model = guard.get(1).unwrap();
    assert_eq!(model.block_size().unwrap().x, 2.0);
    assert_eq!(
        model.tabular().unwrap().colormap().spec(),
        EngineConfig::default().default_colormap
    );
}

#[test]
fn test_id_policies() {
    let mut monotonic = Scene::default();
    let first = monotonic.add(cube([0.0, 0.0, 0.0], 1.0)).unwrap();
    monotonic.remove(first).unwrap();
    assert_eq!(monotonic.add(cube([0.0, 0.0, 0.0], 1.0)).unwrap(), 1);

    let mut resetting = Scene::new(EngineConfig {
        id_policy: IdPolicy::ResetWhenEmpty,
        ..EngineConfig::default()
    });
    let first = resetting.add(cube([0.0, 0.0, 0.0], 1.0)).unwrap();
    resetting.remove(first).unwrap();
    assert_eq!(resetting.add(cube([0.0, 0.0, 0.0], 1.0)).unwrap(), 0);
    assert!(resetting.remove(42).is_err());
}

#[test]
fn test_explicit_id_replaces_element() {
    let mut scene = Scene::default();
    scene.add(cube([0.0, 0.0, 0.0], 1.0).id(3).name("a")).unwrap();
    scene.add(cube([0.0, 0.0, 0.0], 2.0).id(3).name("b")).unwrap();

    assert_eq!(scene.len(), 1);
    assert_eq!(scene.read().get(3).unwrap().name(), "b");
    assert_eq!(scene.add(cube([0.0, 0.0, 0.0], 1.0)).unwrap(), 4);
}
