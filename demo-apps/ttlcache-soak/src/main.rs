mod options;

use anyhow::{ensure, Result};
use futures::future::join_all;
use options::SoakOptions;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ttlcache_core::{Cache, CacheConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ttlcache_soak=info,ttlcache_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let options = SoakOptions::from_env();

    tracing::info!("🧪 TTL cache soak run");
    tracing::info!(
        "   TTL: {:?}, workers: {}, keys per worker: {}",
        options.ttl,
        options.workers,
        options.ops_per_worker
    );
    println!();

    test_parallel_add_get(&options).await?;
    test_data_isolation(&options).await?;
    test_expiration(&options).await?;
    test_reset_on_add(&options).await?;
    test_no_reset(&options).await?;
    test_contended_resets(&options).await?;

    println!();
    tracing::info!("✅ All soak checks passed!");

    Ok(())
}

/// Parallel ADD and GET from many tasks - verify no data mixing
async fn test_parallel_add_get(options: &SoakOptions) -> Result<()> {
    let total = options.workers * options.ops_per_worker;
    tracing::info!("Check: Parallel ADD/GET ({} keys)", total);

    let cache: Cache<String> = Cache::new(Duration::from_secs(300));
    let start = Instant::now();

    let test_data: Vec<(String, String)> = (0..total)
        .map(|i| {
            let key = format!("parallel-{}-{}", i, uuid::Uuid::new_v4());
            let value = format!("value-{}-{}", i, uuid::Uuid::new_v4());
            (key, value)
        })
        .collect();
    let test_data = Arc::new(test_data);

    let add_tasks: Vec<_> = (0..options.workers)
        .map(|worker| {
            let cache = cache.clone();
            let test_data = Arc::clone(&test_data);
            let chunk = options.ops_per_worker;
            tokio::spawn(async move {
                for (key, value) in &test_data[worker * chunk..(worker + 1) * chunk] {
                    cache.add(key.clone(), value.clone());
                }
            })
        })
        .collect();

    join_all(add_tasks)
        .await
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;

    let add_elapsed = start.elapsed();
    tracing::info!("   ADD {} keys in {:?}", total, add_elapsed);

    let get_start = Instant::now();
    let errors = Arc::new(AtomicUsize::new(0));

    let get_tasks: Vec<_> = (0..options.workers)
        .map(|worker| {
            let cache = cache.clone();
            let test_data = Arc::clone(&test_data);
            let errors = Arc::clone(&errors);
            let chunk = options.ops_per_worker;
            tokio::spawn(async move {
                for (key, expected) in &test_data[worker * chunk..(worker + 1) * chunk] {
                    match cache.get(key) {
                        Some(value) if &value == expected => {}
                        Some(value) => {
                            tracing::error!(
                                "Value mismatch for key {}: expected '{}', got '{}'",
                                key,
                                expected,
                                value
                            );
                            errors.fetch_add(1, Ordering::SeqCst);
                        }
                        None => {
                            tracing::error!("Key not found: {}", key);
                            errors.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                }
            })
        })
        .collect();

    join_all(get_tasks)
        .await
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;

    let get_elapsed = get_start.elapsed();
    let error_count = errors.load(Ordering::SeqCst);

    tracing::info!("   GET {} keys in {:?}", total, get_elapsed);
    tracing::info!(
        "   Throughput: {:.0} ops/sec (ADD), {:.0} ops/sec (GET)",
        total as f64 / add_elapsed.as_secs_f64(),
        total as f64 / get_elapsed.as_secs_f64()
    );

    ensure!(error_count == 0, "{} lookups returned the wrong value", error_count);
    ensure!(cache.len() == total, "expected {} entries, found {}", total, cache.len());
    tracing::info!("   ✓ All {} values verified correctly", total);

    Ok(())
}

/// Concurrent writers on different keys, gated by a semaphore, don't interfere
async fn test_data_isolation(options: &SoakOptions) -> Result<()> {
    tracing::info!("Check: Data Isolation (concurrent writes to different keys)");

    let cache: Cache<String> = Cache::new(Duration::from_secs(300));
    let semaphore = Arc::new(Semaphore::new(16));
    let results = Arc::new(tokio::sync::Mutex::new(HashMap::new()));

    let writers: Vec<_> = (0..options.workers)
        .map(|writer_id| {
            let cache = cache.clone();
            let results = Arc::clone(&results);
            let semaphore = Arc::clone(&semaphore);
            let ops = options.ops_per_worker.min(20);

            async move {
                let _permit = semaphore.acquire().await?;

                for op in 0..ops {
                    let key = format!("isolation-writer{}-op{}", writer_id, op);
                    let value = format!("writer{}-value{}-{}", writer_id, op, uuid::Uuid::new_v4());

                    results.lock().await.insert(key.clone(), value.clone());
                    cache.add(key, value);
                    tokio::task::yield_now().await;
                }

                Ok::<_, anyhow::Error>(())
            }
        })
        .collect();

    join_all(writers)
        .await
        .into_iter()
        .collect::<Result<Vec<_>>>()?;

    let expected = results.lock().await;
    let mut errors = 0;

    for (key, expected_value) in expected.iter() {
        let actual = cache.get(key);
        if actual.as_deref() != Some(expected_value.as_str()) {
            tracing::error!(
                "Isolation failure: key={}, expected={}, got={:?}",
                key,
                expected_value,
                actual
            );
            errors += 1;
        }
    }

    ensure!(errors == 0, "{} isolation failures", errors);
    tracing::info!("   ✓ {} keys verified, no cross-contamination", expected.len());

    Ok(())
}

/// Entries disappear once the TTL has elapsed
async fn test_expiration(options: &SoakOptions) -> Result<()> {
    tracing::info!("Check: TTL Expiration");

    let cache: Cache<String> = Cache::new(options.ttl);
    for i in 0..options.ops_per_worker {
        cache.add(format!("expire-{}", i), "temporary".to_string());
    }

    ensure!(
        cache.len() == options.ops_per_worker,
        "all keys should exist immediately"
    );

    let wait = options.ttl + options.ttl / 2;
    tracing::info!("   Waiting {:?} for expiration...", wait);
    tokio::time::sleep(wait).await;

    ensure!(cache.is_empty(), "{} keys outlived their TTL", cache.len());
    tracing::info!("   ✓ TTL expiration works correctly");

    Ok(())
}

/// Re-adding with reset-on-add keeps the key past its original deadline
async fn test_reset_on_add(options: &SoakOptions) -> Result<()> {
    tracing::info!("Check: Reset on add");

    let ttl = options.ttl;
    let config = CacheConfig::default().with_ttl(ttl).with_reset_on_add(true);
    let cache: Cache<String> = Cache::with_config(config);

    cache.add("session", "1".to_string());
    tokio::time::sleep(ttl / 2).await;
    cache.add("session", "2".to_string());

    // Past the original deadline, before the restarted one
    tokio::time::sleep(ttl * 3 / 4).await;
    ensure!(
        cache.get("session").as_deref() == Some("2"),
        "reset entry expired at its original deadline"
    );

    tokio::time::sleep(ttl / 2).await;
    ensure!(cache.get("session").is_none(), "reset entry outlived its restarted deadline");
    tracing::info!("   ✓ Reset on add restarts the countdown");

    Ok(())
}

/// Re-adding without reset updates the value but keeps the deadline
async fn test_no_reset(options: &SoakOptions) -> Result<()> {
    tracing::info!("Check: Value update without reset");

    let ttl = options.ttl;
    let cache: Cache<String> = Cache::new(ttl);

    cache.add("marker", "1".to_string());
    tokio::time::sleep(ttl / 2).await;
    cache.add("marker", "2".to_string());
    ensure!(cache.get("marker").as_deref() == Some("2"), "value was not overwritten");

    tokio::time::sleep(ttl * 3 / 4).await;
    ensure!(cache.get("marker").is_none(), "entry outlived its original deadline");
    tracing::info!("   ✓ Original deadline kept after value update");

    Ok(())
}

/// Many tasks hammering one key with resets never observe it missing
async fn test_contended_resets(options: &SoakOptions) -> Result<()> {
    tracing::info!("Check: Contended resets on a single key");

    let ttl = options.ttl;
    let config = CacheConfig::default().with_ttl(ttl).with_reset_on_add(true);
    let cache: Cache<usize> = Cache::with_config(config);
    let misses = Arc::new(AtomicUsize::new(0));
    let deadline = Instant::now() + ttl * 3;
    let pause = reset_pause(ttl);

    let tasks: Vec<_> = (0..options.workers)
        .map(|worker| {
            let cache = cache.clone();
            let misses = Arc::clone(&misses);
            tokio::spawn(async move {
                while Instant::now() < deadline {
                    cache.add("hot", worker);
                    if cache.get("hot").is_none() {
                        misses.fetch_add(1, Ordering::SeqCst);
                    }
                    tokio::time::sleep(pause).await;
                }
            })
        })
        .collect();

    join_all(tasks)
        .await
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;

    let miss_count = misses.load(Ordering::SeqCst);
    ensure!(miss_count == 0, "freshly reset key went missing {} times", miss_count);
    tracing::info!("   ✓ No stale expiry removed a reset key");

    Ok(())
}

/// Gap between resets in the contended check, never shorter than 1ms
fn reset_pause(ttl: Duration) -> Duration {
    (ttl / 20).max(Duration::from_millis(1))
}
