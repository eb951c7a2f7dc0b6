/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Benchmarks the innermost per-event hot loop: collision-time search and
//! collision resolution. The teacher's own benchmarks
//! (`vigna-webgraph-rs/benches/codes.rs`) use the nightly-only
//! `#![feature(test)]` harness; this port uses `criterion` instead, since
//! it is the stable-toolchain benchmarking crate the rest of the pack
//! reaches for and this crate targets stable Rust throughout.

use criterion::{criterion_group, criterion_main, Criterion};
use ls_packing::collision::CollisionCalculus;
use ls_packing::geometry::{PeriodicBox, Vec3};
use ls_packing::particle::MovingParticle;

fn approaching_pair() -> (MovingParticle, MovingParticle, PeriodicBox) {
    let mut first = MovingParticle::new(0, Vec3::new(1.0, 1.0, 1.0), 1.0);
    first.velocity = Vec3::new(0.1, 0.0, 0.0);
    let mut second = MovingParticle::new(1, Vec3::new(3.0, 1.0, 1.0), 1.0);
    second.velocity = Vec3::new(-0.1, 0.0, 0.0);
    (first, second, PeriodicBox::cubic(10.0))
}

fn bench_collision_time(c: &mut Criterion) {
    let (first, second, box_) = approaching_pair();
    let calculus = CollisionCalculus::new(0.5, 1e-4);
    c.bench_function("collision_time", |b| {
        b.iter(|| calculus.collision_time(0.0, &first, &second, &box_));
    });
}

fn bench_resolve_collision(c: &mut Criterion) {
    let (first, second, box_) = approaching_pair();
    let calculus = CollisionCalculus::new(0.5, 1e-4);
    let collision_time = calculus.collision_time(0.0, &first, &second, &box_).expect("pair set up to collide");
    c.bench_function("resolve_collision", |b| {
        b.iter(|| calculus.resolve_collision(collision_time, &first, &second, &box_));
    });
}

criterion_group!(benches, bench_collision_time, bench_resolve_collision);
criterion_main!(benches);
