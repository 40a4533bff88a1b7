//! Root generation benchmarks.

use std::f64::consts::TAU;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rootgen::{generate_root, LandmarkPoints, RootSettings};
use rootgen_math::Point3;
use rootgen_mesh::PolyMesh;

/// Open dome of `rings` rings with `n` points each around a centre point.
fn dome(n: u32, rings: u32) -> PolyMesh {
    let mut points = vec![Point3::new(0.0, 0.0, 4.0)];
    for k in 1..=rings {
        let r = 3.0 * k as f64 / rings as f64;
        let z = 4.0 - 3.0 * (k * k) as f64 / (rings * rings) as f64;
        for i in 0..n {
            let a = TAU * i as f64 / n as f64;
            points.push(Point3::new(r * a.cos(), r * a.sin(), z));
        }
    }
    let mut faces: Vec<Vec<u32>> = (0..n).map(|i| vec![0, 1 + i, 1 + (i + 1) % n]).collect();
    for k in 0..rings - 1 {
        let base = 1 + k * n;
        for i in 0..n {
            let a = base + i;
            let b = base + (i + 1) % n;
            faces.push(vec![a, a + n, b]);
            faces.push(vec![b, a + n, b + n]);
        }
    }
    PolyMesh::from_faces(points, faces)
}

fn landmarks() -> LandmarkPoints {
    LandmarkPoints {
        bottom: Point3::new(0.0, 0.0, -8.0),
        top: Point3::new(0.0, 0.0, 3.0),
        radius_ref: Point3::new(1.5, 0.0, -8.0),
    }
}

fn bench_small_crown(c: &mut Criterion) {
    let crown = dome(32, 8);
    let settings = RootSettings::default();
    c.bench_function("generate_root_small", |b| {
        b.iter(|| generate_root(black_box(&crown), &landmarks(), &settings))
    });
}

fn bench_dense_crown(c: &mut Criterion) {
    let crown = dome(256, 64);
    let settings = RootSettings::default();
    c.bench_function("generate_root_dense", |b| {
        b.iter(|| generate_root(black_box(&crown), &landmarks(), &settings))
    });
}

criterion_group!(benches, bench_small_crown, bench_dense_crown);
criterion_main!(benches);
