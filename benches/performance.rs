// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Performance benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mineview::geometry::intersection::{ray_mesh_intersections, DEFAULT_LINE_THRESHOLD};
use mineview::geometry::{points_inside_mesh, slice_blocks, slice_mesh, Primitive, Ray};
use mineview::ElementBuilder;
use nalgebra::{Point3, Vector3};

fn block_grid(n: usize) -> Vec<Point3<f64>> {
    let mut centers = Vec::with_capacity(n * n * n);
    for i in 0..n {
        for j in 0..n {
            for k in 0..n {
                centers.push(Point3::new(i as f64, j as f64, k as f64));
            }
        }
    }
    centers
}

fn bench_intersection(c: &mut Criterion) {
    let mut group = c.benchmark_group("intersection");

    for resolution in [16u32, 64, 256] {
        let mesh = Primitive::cylinder(
            Point3::new(0.0, 0.0, -5.0),
            Point3::new(0.0, 0.0, 5.0),
            2.0,
            resolution,
        )
        .to_mesh();
        let ray = Ray::new(Point3::new(-10.0, 0.1, 0.2), Vector3::x());
        group.bench_with_input(BenchmarkId::new("ray_cylinder", resolution), &mesh, |b, mesh| {
            b.iter(|| ray_mesh_intersections(black_box(&ray), black_box(mesh)));
        });
    }

    let line = ElementBuilder::line()
        .vertices((0..1000).map(|i| [i as f64, (i % 7) as f64, 0.0]).collect())
        .build()
        .unwrap();
    let ray = Ray::new(Point3::new(500.0, 3.0, -10.0), Vector3::z());
    group.bench_function("ray_polyline_1000", |b| {
        b.iter(|| line.ray_hits(black_box(&ray), DEFAULT_LINE_THRESHOLD));
    });

    group.finish();
}

fn bench_slicing(c: &mut Criterion) {
    let mut group = c.benchmark_group("slicing");

    let mesh = Primitive::cylinder(
        Point3::new(0.0, 0.0, -5.0),
        Point3::new(0.0, 0.0, 5.0),
        2.0,
        256,
    )
    .to_mesh();
    group.bench_function("cylinder_section", |b| {
        b.iter(|| slice_mesh(black_box(&mesh), &Point3::origin(), &Vector3::new(0.2, 0.0, 1.0)).unwrap());
    });

    let centers = block_grid(40);
    let values: Vec<f64> = (0..centers.len()).map(|i| i as f64).collect();
    group.bench_function("blocks_64000", |b| {
        b.iter(|| {
            slice_blocks(
                black_box(&centers),
                &values,
                &Vector3::repeat(1.0),
                &Point3::new(20.0, 20.0, 20.0),
                &Vector3::new(1.0, 1.0, 1.0),
            )
            .unwrap()
        });
    });

    group.finish();
}

fn bench_inside(c: &mut Criterion) {
    let mut group = c.benchmark_group("inside");

    let mesh = Primitive::cuboid(Point3::new(10.0, 10.0, 10.0), Vector3::repeat(12.0)).to_mesh();
    for n in [10usize, 20] {
        let centers = block_grid(n);
        group.bench_with_input(BenchmarkId::new("blocks_in_cube", n * n * n), &centers, |b, centers| {
            b.iter(|| points_inside_mesh(black_box(centers), black_box(&mesh)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_intersection, bench_slicing, bench_inside);
criterion_main!(benches);
