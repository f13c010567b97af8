use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::{Rng, SeedableRng};
use undertone::stego::{self, CarrierMap, EmbedParams};
use undertone::utils::db_to_amplitude;

/// Synthetic magnitude matrix with broadband energy between -60 and 0 dB.
fn noise_matrix(bins: usize, frames: usize) -> Vec<Vec<f32>> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(1);
    (0..bins)
        .map(|_| {
            (0..frames)
                .map(|_| db_to_amplitude(rng.gen_range(-60.0f32..0.0)))
                .collect()
        })
        .collect()
}

fn params() -> EmbedParams {
    EmbedParams {
        hz: 4000.0,
        amplitude: -55.0,
        offset: 32,
        ..EmbedParams::default()
    }
}

fn bench_carrier_map(c: &mut Criterion) {
    let mut group = c.benchmark_group("carrier_map_build");
    for frames in [256usize, 1024, 4096] {
        let mag = noise_matrix(1025, frames);
        group.throughput(Throughput::Elements(frames as u64));
        group.bench_with_input(BenchmarkId::from_parameter(frames), &mag, |b, mag| {
            b.iter(|| CarrierMap::build(mag, 22050, 2048, &params()).unwrap());
        });
    }
    group.finish();
}

fn bench_embed(c: &mut Criterion) {
    let mut group = c.benchmark_group("embed");
    for payload_len in [64usize, 1024, 8192] {
        let mag = noise_matrix(1025, 4096);
        let map = CarrierMap::build(&mag, 22050, 2048, &params()).unwrap();
        let payload: Vec<u8> = (0..payload_len).map(|i| (i % 256) as u8).collect();

        group.throughput(Throughput::Bytes(payload_len as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(payload_len),
            &payload,
            |b, payload| {
                b.iter_batched(
                    || mag.clone(),
                    |mut mag| stego::embed(&mut mag, &map, payload, &params()).unwrap(),
                    criterion::BatchSize::LargeInput,
                );
            },
        );
    }
    group.finish();
}

fn bench_extract(c: &mut Criterion) {
    let mut mag = noise_matrix(1025, 4096);
    let map = CarrierMap::build(&mag, 22050, 2048, &params()).unwrap();
    let payload: Vec<u8> = (0..4096).map(|i| (i % 256) as u8).collect();
    stego::embed(&mut mag, &map, &payload, &params()).unwrap();

    c.bench_function("extract_4k", |b| {
        b.iter(|| stego::extract(&mag, &map, &params()).unwrap());
    });
}

criterion_group!(benches, bench_carrier_map, bench_embed, bench_extract);
criterion_main!(benches);
