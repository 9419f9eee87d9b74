//! Concurrent first access to the trust store.

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

mod support;

use apiclient::{TrustStore, TrustStoreConfig, TrustStoreProvider, certificate_trust_store};
use rstest::rstest;
use support::sources::SwitchableSource;

const CALLERS: usize = 16;

fn assert_all_identical(handles: &[Arc<TrustStore>]) {
    let (first, rest) = handles
        .split_first()
        .unwrap_or_else(|| panic!("expected at least one handle"));
    for handle in rest {
        assert!(Arc::ptr_eq(first, handle), "every caller should share one store");
    }
}

#[rstest]
fn racing_first_callers_share_a_single_load() {
    let source = SwitchableSource::available().with_delay(Duration::from_millis(50));
    let provider = TrustStoreProvider::new(source.clone(), TrustStoreConfig::default());
    let barrier = Barrier::new(CALLERS);

    let handles: Vec<Arc<TrustStore>> = thread::scope(|scope| {
        let workers: Vec<_> = (0..CALLERS)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    provider.get_trust_store()
                })
            })
            .collect();
        workers
            .into_iter()
            .map(|worker| {
                worker
                    .join()
                    .expect("worker should not panic")
                    .expect("bundled store should load")
            })
            .collect()
    });

    assert_eq!(handles.len(), CALLERS);
    assert_all_identical(&handles);
    assert_eq!(source.opens(), 1);
    assert_eq!(provider.load_count(), 1);
}

#[rstest]
fn racing_callers_all_see_a_failed_load() {
    let source = SwitchableSource::unavailable().with_delay(Duration::from_millis(20));
    let provider = TrustStoreProvider::new(source.clone(), TrustStoreConfig::default());
    let barrier = Barrier::new(CALLERS);

    let failures = thread::scope(|scope| {
        let workers: Vec<_> = (0..CALLERS)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    provider.get_trust_store()
                })
            })
            .collect();
        workers
            .into_iter()
            .map(|worker| worker.join().expect("worker should not panic"))
            .filter(|outcome| {
                outcome
                    .as_ref()
                    .is_err_and(apiclient::TrustStoreError::is_resource_unavailable)
            })
            .count()
    });

    assert_eq!(failures, CALLERS);
    assert_eq!(source.opens(), 1);
}

#[rstest]
fn the_shared_store_is_identical_across_threads() {
    let barrier = Barrier::new(CALLERS);

    let handles: Vec<Arc<TrustStore>> = thread::scope(|scope| {
        let workers: Vec<_> = (0..CALLERS)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    certificate_trust_store()
                })
            })
            .collect();
        workers
            .into_iter()
            .map(|worker| {
                worker
                    .join()
                    .expect("worker should not panic")
                    .expect("bundled store should load")
            })
            .collect()
    });

    assert_all_identical(&handles);
    let again = certificate_trust_store().expect("cached store");
    assert!(handles.iter().all(|handle| Arc::ptr_eq(handle, &again)));
}
