use std::{collections::HashSet, sync::Arc, time::Duration};

use contention::{
    BoundedExecutor, Comparator, TaskEntry,
    config::Limits,
    workload::SimulatedWorkload,
};
use proptest::prelude::*;

fn instant_workload() -> SimulatedWorkload {
    SimulatedWorkload::builder()
        .intensity(100)
        .io_wait(Duration::ZERO)
        .build()
}

fn comparator(max_items: usize) -> Comparator<SimulatedWorkload> {
    Comparator::builder()
        .workload(instant_workload())
        .limits(Limits {
            max_items,
            max_concurrency: 64,
        })
        .build()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn ten_then_three_leaves_thirteen() {
    let comparator = comparator(20);

    comparator.run_parallel(10, 5).await.unwrap();
    comparator.run_parallel(3, 5).await.unwrap();

    assert_eq!(comparator.counter_snapshot(), 13);
    let stats = comparator.store_stats();
    assert_eq!(stats.total_items, 13);
    assert_eq!(stats.operations, 13);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn counter_never_loses_an_increment() {
    let comparator = comparator(50);
    let runs = 1000;

    for _ in 0..runs {
        let report = comparator.run_parallel(50, 50).await.unwrap();
        assert_eq!(report.completed(), 50);
    }

    assert_eq!(comparator.counter_snapshot(), 50 * runs);
    let stats = comparator.store_stats();
    assert_eq!(stats.total_items as u64, 50 * runs);
    assert!(stats.is_consistent());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_callers_share_one_state() {
    let comparator = Arc::new(comparator(20));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let comparator = Arc::clone(&comparator);
            tokio::spawn(async move { comparator.run_parallel(20, 5).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(comparator.counter_snapshot(), 80);
    let records = comparator.shared().store().records();
    assert_eq!(records.len(), 80);
    assert!(comparator.store_stats().is_consistent());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn admission_bound_holds_through_the_comparator() {
    let comparator = Comparator::builder()
        .workload(
            SimulatedWorkload::builder()
                .intensity(1_000)
                .io_wait(Duration::from_millis(5))
                .build(),
        )
        .build();
    let executor = BoundedExecutor::new(3);

    let report = comparator.run_with(&executor, 20).await.unwrap();

    assert_eq!(report.completed(), 20);
    assert!(executor.gauge().peak() <= 3);
    assert_eq!(executor.gauge().active(), 0);
}

#[tokio::test]
async fn sequential_five_in_order() {
    let report = comparator(20).run_sequential(5).await.unwrap();
    let ids: Vec<usize> = report.results.iter().map(TaskEntry::task_id).collect();
    assert_eq!(ids, vec![0, 1, 2, 3, 4]);
}

#[tokio::test]
async fn cooperative_five_without_duplicates() {
    let report = comparator(20).run_async(5).await.unwrap();
    let ids: HashSet<usize> = report.results.iter().map(TaskEntry::task_id).collect();
    assert_eq!(report.results.len(), 5);
    assert_eq!(ids.len(), 5);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn parallel_run_grows_state_by_item_count(
        runs in proptest::collection::vec((1usize..=20, 1usize..=8), 1..4)
    ) {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(4)
            .enable_all()
            .build()
            .unwrap();
        let comparator = comparator(20);

        let mut expected = 0u64;
        for (items, k) in runs {
            let report = rt.block_on(comparator.run_parallel(items, k)).unwrap();
            expected += items as u64;

            prop_assert_eq!(report.results.len(), items);
            let ids: HashSet<usize> = report.results.iter().map(TaskEntry::task_id).collect();
            prop_assert_eq!(ids, (0..items).collect::<HashSet<_>>());
            prop_assert_eq!(report.shared_counter, Some(expected));
            prop_assert_eq!(comparator.counter_snapshot(), expected);
            let stats = comparator.store_stats();
            prop_assert_eq!(stats.total_items as u64, expected);
            prop_assert!(stats.is_consistent());
        }
    }
}
