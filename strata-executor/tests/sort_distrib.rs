//! End-to-end tests for the distributed sort.
//!
//! Tests verify that:
//! - Small canonical inputs (empty, single, sorted, reverse, duplicates)
//!   come out sorted
//! - A large seeded-random input matches a reference sort on the file
//!   backend
//! - Per-pass bucket invariants and mass conservation hold
//! - Worker failures surface with pass and worker context

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use strata_core::codec;
use strata_core::config::SortConfig;
use strata_core::error::StrataError;
use strata_core::refs::PartRef;
use strata_core::storage::{
    ArrayFactory, DistribArray, FileArrayFactory, MemArrayFactory, MemDistribArray,
};
use strata_executor::iter::{BucketIterator, ReadOrder};
use strata_executor::verify::{check_partial_array, check_sorted};
use strata_executor::worker::{LocalWorker, SortWorker, WorkerFuture};
use strata_executor::{read_sorted, sort_distrib};

fn mem_input(vals: &[u32]) -> Arc<dyn DistribArray> {
    Arc::new(MemDistribArray::with_data(
        "input",
        vec![codec::encode(vals)],
    ))
}

async fn sort_in_memory(vals: &[u32], config: &SortConfig) -> Vec<u32> {
    let outputs = sort_distrib(
        mem_input(vals),
        vals.len(),
        config,
        Arc::new(MemArrayFactory),
        Arc::new(LocalWorker),
    )
    .await
    .unwrap();

    assert_eq!(outputs.len(), config.nworkers);
    codec::decode(&read_sorted(&outputs).await.unwrap()).unwrap()
}

#[tokio::test]
async fn empty_input_produces_empty_buckets() {
    let config = SortConfig::default();
    let outputs = sort_distrib(
        mem_input(&[]),
        0,
        &config,
        Arc::new(MemArrayFactory),
        Arc::new(LocalWorker),
    )
    .await
    .unwrap();

    assert_eq!(outputs.len(), 2);
    for arr in &outputs {
        assert_eq!(arr.npart(), 16);
        assert_eq!(arr.shape().await.unwrap().total(), 0);
    }
    assert!(read_sorted(&outputs).await.unwrap().is_empty());
}

#[tokio::test]
async fn single_element_survives_every_pass() {
    let config = SortConfig::default();
    let outputs = sort_distrib(
        mem_input(&[0x1234_5678]),
        1,
        &config,
        Arc::new(MemArrayFactory),
        Arc::new(LocalWorker),
    )
    .await
    .unwrap();

    let mut nonempty = 0;
    for arr in &outputs {
        let shape = arr.shape().await.unwrap();
        for part in 0..shape.npart() {
            if shape.len(part) > 0 {
                nonempty += 1;
                assert_eq!(shape.len(part), 4);
            }
        }
    }
    assert_eq!(nonempty, 1);

    let ints = codec::decode(&read_sorted(&outputs).await.unwrap()).unwrap();
    assert_eq!(ints, vec![0x1234_5678]);
}

#[tokio::test]
async fn already_sorted_input_is_unchanged() {
    let vals: Vec<u32> = (0..16).collect();
    assert_eq!(sort_in_memory(&vals, &SortConfig::default()).await, vals);
}

#[tokio::test]
async fn reverse_sorted_input() {
    let vals: Vec<u32> = (0..16).rev().collect();
    let expected: Vec<u32> = (0..16).collect();
    assert_eq!(sort_in_memory(&vals, &SortConfig::default()).await, expected);
}

#[tokio::test]
async fn duplicates_are_grouped() {
    let vals = [7, 7, 3, 3, 7, 3];
    let sorted = sort_in_memory(&vals, &SortConfig::default()).await;
    assert_eq!(sorted, vec![3, 3, 3, 7, 7, 7]);
}

#[tokio::test]
async fn wide_digits_and_more_workers() {
    let mut rng = StdRng::seed_from_u64(7);
    let vals: Vec<u32> = (0..4096).map(|_| rng.gen()).collect();
    let mut expected = vals.clone();
    expected.sort_unstable();

    let config = SortConfig::default().with_width(8).with_workers(4);
    assert_eq!(sort_in_memory(&vals, &config).await, expected);
}

#[tokio::test]
async fn random_megabyte_on_file_backend() {
    let mut rng = StdRng::seed_from_u64(0x5742_1a01);
    let vals: Vec<u32> = (0..262_144).map(|_| rng.gen()).collect();
    let orig = codec::encode(&vals);

    let dir = tempfile::tempdir().unwrap();
    let factory = FileArrayFactory::new(dir.path());
    let input = factory.create("input", 1).await.unwrap();
    {
        use tokio::io::AsyncWriteExt;
        let mut w = input.writer(0).await.unwrap();
        w.write_all(&orig).await.unwrap();
        w.shutdown().await.unwrap();
    }

    let config = SortConfig::default();
    let outputs = sort_distrib(
        input,
        vals.len(),
        &config,
        Arc::new(factory),
        Arc::new(LocalWorker),
    )
    .await
    .unwrap();

    // Mass conservation across the final pass.
    let mut total = 0u64;
    for arr in &outputs {
        total += arr.shape().await.unwrap().total();
    }
    assert_eq!(total, orig.len() as u64);

    // Every final array satisfies the last pass's bucket invariant.
    for arr in &outputs {
        check_partial_array(arr, 28, 4).await.unwrap();
    }

    let result = read_sorted(&outputs).await.unwrap();
    check_sorted(&orig, &result).unwrap();
}

#[tokio::test]
async fn intermediate_arrays_can_be_removed() {
    let mut rng = StdRng::seed_from_u64(99);
    let vals: Vec<u32> = (0..1024).map(|_| rng.gen()).collect();
    let orig = codec::encode(&vals);

    let dir = tempfile::tempdir().unwrap();
    let factory = FileArrayFactory::new(dir.path());
    let input = factory.create("input", 1).await.unwrap();
    {
        use tokio::io::AsyncWriteExt;
        let mut w = input.writer(0).await.unwrap();
        w.write_all(&orig).await.unwrap();
        w.shutdown().await.unwrap();
    }

    let config = SortConfig::default().with_remove_intermediate(true);
    let outputs = sort_distrib(
        input,
        vals.len(),
        &config,
        Arc::new(factory),
        Arc::new(LocalWorker),
    )
    .await
    .unwrap();

    check_sorted(&orig, &read_sorted(&outputs).await.unwrap()).unwrap();

    // Only the original input and the final pass's outputs remain.
    let mut remaining: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    remaining.sort();
    assert_eq!(
        remaining,
        vec!["input", "step7.worker0.output", "step7.worker1.output"]
    );
}

#[tokio::test]
async fn output_order_is_bucket_major() {
    // The smaller value's low bits place it in the later worker's chunk
    // at the final pass, so an array-major reading would come out
    // backwards; the bucket-major reading must not.
    let vals = [0x1000_0000, 0x0000_0001];
    let sorted = sort_in_memory(&vals, &SortConfig::default()).await;
    assert_eq!(sorted, vec![0x0000_0001, 0x1000_0000]);
}

#[tokio::test]
async fn sorting_twice_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(12);
    let mut vals: Vec<u32> = (0..512).map(|_| rng.gen()).collect();
    vals.sort_unstable();

    let sorted = sort_in_memory(&vals, &SortConfig::default()).await;
    assert_eq!(sorted, vals);
}

#[tokio::test]
async fn overstated_length_is_a_premature_end() {
    // Claiming more integers than the input holds starves the early
    // workers' byte budget.
    let err = sort_distrib(
        mem_input(&[1, 2, 3, 4]),
        1000,
        &SortConfig::default(),
        Arc::new(MemArrayFactory),
        Arc::new(LocalWorker),
    )
    .await
    .unwrap_err();

    match err {
        StrataError::PrematureEnd { pass, .. } => assert_eq!(pass, 0),
        other => panic!("expected PrematureEnd, got {}", other),
    }
}

/// A worker that fails once the sort reaches a chosen pass.
struct FailingWorker {
    inner: LocalWorker,
    fail_offset: u32,
}

impl SortWorker for FailingWorker {
    fn execute<'a>(
        &'a self,
        refs: Vec<PartRef>,
        offset: u32,
        width: u32,
        factory: &'a dyn ArrayFactory,
    ) -> WorkerFuture<'a> {
        Box::pin(async move {
            if offset == self.fail_offset {
                return Err(StrataError::PartRead {
                    array: "injected".to_string(),
                    part: 0,
                    cause: "injected failure".to_string(),
                });
            }
            self.inner.execute(refs, offset, width, factory).await
        })
    }
}

#[tokio::test]
async fn worker_failure_carries_pass_and_worker_context() {
    let vals: Vec<u32> = (0..64).collect();

    // Fails on its second call: pass 1, offset = width.
    let worker = FailingWorker {
        inner: LocalWorker,
        fail_offset: 4,
    };

    let err = sort_distrib(
        mem_input(&vals),
        vals.len(),
        &SortConfig::default(),
        Arc::new(MemArrayFactory),
        Arc::new(worker),
    )
    .await
    .unwrap_err();

    match err {
        StrataError::WorkerFailure { pass, worker, cause } => {
            assert_eq!(pass, 1);
            assert_eq!(worker, 0);
            assert!(cause.contains("injected failure"), "cause was: {}", cause);
        }
        other => panic!("expected WorkerFailure, got {}", other),
    }
}

#[tokio::test]
async fn every_pass_satisfies_its_bucket_invariant() {
    // Drive the passes by hand to check the invariant between them.
    let mut rng = StdRng::seed_from_u64(3);
    let vals: Vec<u32> = (0..2048).map(|_| rng.gen()).collect();
    let config = SortConfig::default();

    let factory = MemArrayFactory;
    let worker = LocalWorker;
    let mut arrays: Vec<Arc<dyn DistribArray>> = vec![mem_input(&vals)];

    for pass in 0..config.npasses() {
        let offset = pass as u32 * config.width;
        let mut iter = BucketIterator::new(&arrays, ReadOrder::Strided).await.unwrap();

        let mut next: Vec<Arc<dyn DistribArray>> = Vec::new();
        let chunk = (vals.len().div_ceil(config.nworkers) * 4) as u64;
        for _ in 0..config.nworkers {
            let batch = iter.next(chunk);
            next.push(
                worker
                    .execute(batch.refs, offset, config.width, &factory)
                    .await
                    .unwrap(),
            );
        }

        for arr in &next {
            check_partial_array(arr, offset, config.width).await.unwrap();
        }
        arrays = next;
    }

    let mut expected = vals.clone();
    expected.sort_unstable();
    let result = codec::decode(&read_sorted(&arrays).await.unwrap()).unwrap();
    assert_eq!(result, expected);
}
