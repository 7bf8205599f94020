use super::*;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn burst_is_admitted_then_excess_rejected() {
    // Arrange
    let cache = RateLimiterCache::new();
    let bucket = cache.get_or_create("ip:1.2.3.4", 2.0);

    // Act: three immediate acquisitions against a 2/s budget.
    let first = bucket.try_acquire(0).await;
    let second = bucket.try_acquire(0).await;
    let third = bucket.try_acquire(0).await;

    // Assert
    assert!(first);
    assert!(second);
    assert!(!third);
}

#[tokio::test(start_paused = true)]
async fn waiting_acquirer_gets_a_token_within_its_budget() {
    // Arrange
    let cache = RateLimiterCache::new();
    let bucket = cache.get_or_create("svc:users", 10.0);
    for _ in 0..10 {
        assert!(bucket.try_acquire(0).await);
    }

    // Act: one token refills in ~100ms, inside the 500ms budget.
    let acquired = bucket.try_acquire(500).await;

    // Assert
    assert!(acquired);
}

#[tokio::test]
async fn insufficient_budget_fails_without_waiting() {
    // Arrange
    let cache = RateLimiterCache::new();
    let bucket = cache.get_or_create("svc:orders", 1.0);
    assert!(bucket.try_acquire(0).await);

    // Act: the deficit needs ~1s, the budget is 10ms.
    let start = std::time::Instant::now();
    let acquired = bucket.try_acquire(10).await;

    // Assert
    assert!(!acquired);
    assert!(start.elapsed() < std::time::Duration::from_millis(100));
}

#[tokio::test]
async fn keys_are_isolated() {
    // Arrange
    let cache = RateLimiterCache::new();
    let a = cache.get_or_create("ip:1.1.1.1", 1.0);
    let b = cache.get_or_create("ip:2.2.2.2", 1.0);

    // Act
    assert!(a.try_acquire(0).await);

    // Assert: draining one key leaves the other untouched.
    assert!(!a.try_acquire(0).await);
    assert!(b.try_acquire(0).await);
}

#[tokio::test]
async fn sliding_window_caps_a_burst() {
    // Arrange
    let cache = RateLimiterCache::new();
    let limiter = cache.get_or_create_window("api:/users", 3.0);

    // Act
    let mut admitted = 0;
    for _ in 0..10 {
        if limiter.allow().await {
            admitted += 1;
        }
    }

    // Assert
    assert_eq!(admitted, 3);
}

#[tokio::test]
async fn same_key_returns_the_same_bucket() {
    // Arrange
    let cache = RateLimiterCache::new();
    assert!(cache.is_empty());

    // Act
    let a = cache.get_or_create("global", 1.0);
    let _ = a.try_acquire(0).await;
    let b = cache.get_or_create("global", 1.0);

    // Assert: the second lookup sees the drained bucket.
    assert!(!b.try_acquire(0).await);
    assert_eq!(cache.len(), 1);
    assert!(!cache.is_empty());
}
