//! # Hyperdrive Benchmarks
//!
//! | Area | Operation |
//! |------|-----------|
//! | shared-crypto | Batch signature verification |
//! | hd-01-block | Polka accumulation up to quorum |
//! | hd-02-consensus | Full heights on a four validator harness |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use hd_01_block::{genesis, Block, PolkaBuilder, PreVote, SignedPreVote};
use hd_02_consensus::quorum_threshold;
use hd_tests::harness::Harness;
use rand::Rng;
use shared_crypto::{verify_batch, Hash, Secp256k1KeyPair, Signer};
use std::time::Duration;

// ============================================================================
// shared-crypto: batch verification
// ============================================================================

fn bench_verify_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("shared-crypto-verify-batch");
    group.measurement_time(Duration::from_secs(10));

    let key = Secp256k1KeyPair::generate();
    for size in [10, 100, 500] {
        let items: Vec<_> = (0..size)
            .map(|_| {
                let mut bytes = [0u8; 32];
                rand::thread_rng().fill(&mut bytes);
                let hash = Hash::digest(&bytes);
                (hash, key.sign(&hash).unwrap(), key.signatory())
            })
            .collect();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &items, |b, items| {
            b.iter(|| black_box(verify_batch(items)))
        });
    }

    group.finish();
}

// ============================================================================
// hd-01-block: polka builder
// ============================================================================

fn signed_pre_votes(validators: usize) -> Vec<SignedPreVote> {
    let proposer = Secp256k1KeyPair::generate();
    let block = Block::new(0, 1, 0, genesis().header(), Vec::new())
        .unwrap()
        .sign(&proposer)
        .unwrap();

    (0..validators)
        .map(|_| {
            let key = Secp256k1KeyPair::generate();
            PreVote::new(Some(block.clone()), 1, 0).sign(&key).unwrap()
        })
        .collect()
}

fn bench_polka_builder(c: &mut Criterion) {
    let mut group = c.benchmark_group("hd-01-polka-builder");

    for validators in [4, 16, 64] {
        let votes = signed_pre_votes(validators);
        let threshold = quorum_threshold(validators);

        group.throughput(Throughput::Elements(threshold as u64));
        group.bench_with_input(BenchmarkId::from_parameter(validators), &votes, |b, votes| {
            b.iter(|| {
                let mut builder = PolkaBuilder::new(threshold);
                let mut polka = None;
                for vote in votes.iter().take(threshold) {
                    polka = builder.insert(vote.clone()).unwrap();
                }
                black_box(polka)
            })
        });
    }

    group.finish();
}

// ============================================================================
// hd-02-consensus: end-to-end heights
// ============================================================================

fn bench_harness_heights(c: &mut Criterion) {
    let mut group = c.benchmark_group("hd-02-harness");
    group.sample_size(10);

    group.bench_function("four_validators_ten_heights", |b| {
        b.iter(|| {
            let mut harness = Harness::new(4);
            harness.run_until(10);
            black_box(harness.height(0))
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_verify_batch,
    bench_polka_builder,
    bench_harness_heights
);
criterion_main!(benches);
