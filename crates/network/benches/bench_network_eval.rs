use std::hint::black_box;
use std::time::Instant;

use cascadeview_network::{pack, AppearanceNetwork, WeightMatrix};
use glam::Vec3;

fn make_layers(hidden: usize) -> (WeightMatrix, WeightMatrix) {
    let l0 = WeightMatrix::from_fn(6, hidden, |a, b| ((a * 7 + b * 3) % 11) as f32 / 11.0 - 0.5)
        .expect("layer 0");
    let l1 = WeightMatrix::from_fn(hidden, 3, |a, b| ((a * 5 + b) % 13) as f32 / 13.0 - 0.5)
        .expect("layer 1");
    (l0, l1)
}

fn bench_pack(hidden: usize, iterations: usize) {
    let (l0, l1) = make_layers(hidden);

    let start = Instant::now();
    for _ in 0..iterations {
        let _ = black_box(pack(black_box(&l0)));
        let _ = black_box(pack(black_box(&l1)));
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!("  pack (hidden={hidden}, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}");
}

fn bench_evaluate(hidden: usize, pixels: usize) {
    let (l0, l1) = make_layers(hidden);
    let net = AppearanceNetwork::from_layers(&l0, &l1).expect("network");

    let start = Instant::now();
    for i in 0..pixels {
        let t = i as f32 / pixels as f32;
        let dir = Vec3::new(t - 0.5, 1.0 - t, 0.25);
        let _ = black_box(net.evaluate(black_box([t, 1.0 - t, 0.5]), black_box(dir)));
    }
    let elapsed = start.elapsed();
    let per_pixel = elapsed / pixels as u32;
    println!(
        "  evaluate (hidden={hidden}, {pixels} pixels): {per_pixel:?}/pixel, total {elapsed:?}"
    );
}

fn main() {
    println!("=== Appearance Network Benchmarks ===\n");

    println!("Weight packing:");
    bench_pack(16, 10000);
    bench_pack(32, 10000);
    bench_pack(64, 1000);

    println!("\nReference evaluation:");
    bench_evaluate(16, 100_000);
    bench_evaluate(32, 100_000);
    bench_evaluate(64, 10_000);

    println!("\n=== Done ===");
}
