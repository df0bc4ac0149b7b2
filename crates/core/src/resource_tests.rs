// SPDX-License-Identifier: MIT

use super::*;
use std::time::Duration;

#[tokio::test]
async fn unbounded_resource_always_reserves() {
    let resource = Resource::builder().capacity(-1).build();
    for _ in 0..100 {
        assert!(resource.reserve().await);
    }
    assert_eq!(resource.in_use(), 0);
}

#[tokio::test]
async fn single_slot_resource_serializes_access() {
    let resource = Resource::builder().capacity(1).build();
    assert!(resource.reserve().await);
    assert_eq!(resource.in_use(), 1);
    resource.release();
    assert_eq!(resource.in_use(), 0);
    assert!(resource.reserve().await);
}

#[tokio::test]
async fn release_is_clamped_at_zero() {
    let resource = Resource::builder().capacity(3).build();
    resource.release();
    resource.release();
    assert_eq!(resource.in_use(), 0);
}

#[tokio::test(start_paused = true)]
async fn reserve_times_out_when_saturated() {
    let resource = Resource::builder()
        .capacity(1)
        .reserve_timeout(Duration::from_millis(50))
        .build();
    assert!(resource.reserve().await);

    let start = tokio::time::Instant::now();
    let acquired = resource.reserve().await;
    assert!(!acquired);
    assert!(start.elapsed() >= Duration::from_millis(50));
}

#[tokio::test]
async fn reserve_wakes_on_release() {
    let resource = Arc::new(
        Resource::builder()
            .capacity(1)
            .reserve_timeout(Duration::from_secs(5))
            .build(),
    );
    assert!(resource.reserve().await);

    let waiter = {
        let resource = resource.clone();
        tokio::spawn(async move { resource.reserve().await })
    };
    tokio::task::yield_now().await;
    resource.release();
    assert!(waiter.await.unwrap());
}

#[tokio::test]
async fn acquire_all_with_no_resources_succeeds_immediately() {
    assert!(acquire_all(&[], 10).await);
}

#[tokio::test]
async fn acquire_all_acquires_every_resource_in_order() {
    let resources: Vec<_> = (0..3)
        .map(|i| Arc::new(Resource::builder().name(format!("r{i}")).capacity(2).build()))
        .collect();
    assert!(acquire_all(&resources, 10).await);
    for resource in &resources {
        assert_eq!(resource.in_use(), 1);
    }
}

#[tokio::test(start_paused = true)]
async fn acquire_all_releases_partial_reservations_on_contention() {
    let first = Arc::new(
        Resource::builder()
            .name("first")
            .capacity(5)
            .reserve_timeout(Duration::from_millis(20))
            .build(),
    );
    let second = Arc::new(
        Resource::builder()
            .name("second")
            .capacity(1)
            .reserve_timeout(Duration::from_millis(20))
            .build(),
    );
    assert!(second.reserve().await);

    let resources = vec![first.clone(), second.clone()];
    let acquired = acquire_all(&resources, 2).await;
    assert!(!acquired);
    // first must have been released again after second failed.
    assert_eq!(first.in_use(), 0);
}
