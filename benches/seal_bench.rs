use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use gitops_api::core::cipher::{self, derive_nonce, SecretKey};
use gitops_api::core::document::{Document, Edit};
use std::time::Duration;

const SPEC: &str = "spec:\n  state: present\n  template:\n    metadata:\n      name: template\n  profiles:\n    - a\n    - b\n";

/// Generate a payload of given size.
fn generate_payload(size: usize) -> Vec<u8> {
    vec![b'x'; size]
}

/// Benchmark sealing with varying payload sizes.
fn bench_seal(c: &mut Criterion) {
    let mut group = c.benchmark_group("seal");
    group.sample_size(50);
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(3));

    let recipient = SecretKey::from([3u8; 32]);
    let public = *recipient.public_key().as_bytes();
    let sizes = [32, 256, 1024, 4096];

    for size in sizes {
        let payload = generate_payload(size);
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(
            BenchmarkId::new("sealed_box", format!("{}B", size)),
            &payload,
            |b, payload| {
                b.iter(|| {
                    let sealed = cipher::seal(black_box(payload), black_box(&public)).unwrap();
                    black_box(sealed);
                });
            },
        );
    }

    group.finish();
}

/// Benchmark opening pre-sealed values.
fn bench_open(c: &mut Criterion) {
    let mut group = c.benchmark_group("open");
    group.sample_size(50);
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(3));

    let recipient = SecretKey::from([4u8; 32]);
    let public = *recipient.public_key().as_bytes();

    for size in [32, 1024] {
        let sealed = cipher::seal(&generate_payload(size), &public).unwrap();
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(
            BenchmarkId::new("sealed_box", format!("{}B", size)),
            &sealed,
            |b, sealed| {
                b.iter(|| {
                    let opened = cipher::open(black_box(sealed), black_box(&recipient)).unwrap();
                    black_box(opened);
                });
            },
        );
    }

    group.finish();
}

fn bench_nonce(c: &mut Criterion) {
    let epk = [1u8; 32];
    let rpk = [2u8; 32];
    c.bench_function("derive_nonce", |b| {
        b.iter(|| black_box(derive_nonce(black_box(&epk), black_box(&rpk))));
    });
}

/// Benchmark the edits of a profiles replacement on a small document.
fn bench_profile_edits(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cluster.yaml");
    std::fs::write(&path, SPEC).unwrap();

    let mut edits = vec![Edit::clear("spec.profiles")];
    for i in 0..10 {
        edits.push(Edit::append("spec.profiles", format!("profile-{}", i)));
    }

    c.bench_function("apply_profile_edits", |b| {
        b.iter(|| {
            let mut doc = Document::open(&path).unwrap();
            for edit in &edits {
                doc.apply(black_box(edit)).unwrap();
            }
            black_box(doc.render().unwrap());
        });
    });
}

criterion_group!(benches, bench_seal, bench_open, bench_nonce, bench_profile_edits);
criterion_main!(benches);
