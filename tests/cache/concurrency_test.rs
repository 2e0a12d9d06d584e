/*!
 * Concurrency Tests
 * Parallel registration, lookup and sweeping
 */

use file_proxy::resolver::MemResolver;
use file_proxy::{ManualClock, ProxyConfig, ProxyContext, ResourceRef};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
fn test_parallel_registration_mints_distinct_tokens() {
    let ctx = ProxyContext::new(ProxyConfig::new("com.example"), Arc::new(MemResolver::new()))
        .unwrap();
    let source = ResourceRef::parse("content://guest/shared.txt").unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let ctx = Arc::clone(&ctx);
            let source = source.clone();
            thread::spawn(move || {
                (0..100)
                    .map(|_| ctx.registry().register(&source, None).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut seen = HashSet::new();
    for handle in handles {
        for proxy_ref in handle.join().unwrap() {
            assert!(ctx.registry().lookup(&proxy_ref).is_some());
            assert!(seen.insert(proxy_ref));
        }
    }
    assert_eq!(seen.len(), 800);
}

#[test]
fn test_lookups_race_with_sweep() {
    let clock = ManualClock::new();
    let ctx = ProxyContext::with_clock(
        ProxyConfig::new("com.example"),
        Arc::new(MemResolver::new()),
        Arc::new(clock.clone()),
    )
    .unwrap();
    let source = ResourceRef::parse("content://guest/a").unwrap();
    let refs: Vec<_> = (0..200)
        .map(|_| ctx.registry().register(&source, None).unwrap())
        .collect();

    clock.advance(Duration::from_secs(301));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let ctx = Arc::clone(&ctx);
            let refs = refs.clone();
            thread::spawn(move || refs.iter().all(|r| ctx.registry().lookup(r).is_none()))
        })
        .collect();
    let sweeper = {
        let ctx = Arc::clone(&ctx);
        thread::spawn(move || ctx.registry().purge_expired())
    };

    for reader in readers {
        assert!(reader.join().unwrap());
    }
    sweeper.join().unwrap();
    assert_eq!(ctx.registry().stats().size, 0);
}

#[test]
fn test_sweep_counts_only_expired_while_registering() {
    let clock = ManualClock::new();
    let ctx = ProxyContext::with_clock(
        ProxyConfig::new("com.example"),
        Arc::new(MemResolver::new()),
        Arc::new(clock.clone()),
    )
    .unwrap();
    let source = ResourceRef::parse("content://guest/a").unwrap();
    for _ in 0..500 {
        ctx.registry().register(&source, None).unwrap();
    }

    clock.advance(Duration::from_secs(301));

    let writers: Vec<_> = (0..4)
        .map(|_| {
            let ctx = Arc::clone(&ctx);
            let source = source.clone();
            thread::spawn(move || {
                for _ in 0..250 {
                    ctx.registry().register(&source, None).unwrap();
                }
            })
        })
        .collect();
    let sweeper = {
        let ctx = Arc::clone(&ctx);
        thread::spawn(move || ctx.registry().purge_expired())
    };

    for writer in writers {
        writer.join().unwrap();
    }
    let purged = sweeper.join().unwrap();

    let stats = ctx.registry().stats();
    assert_eq!(purged, 500);
    assert_eq!(stats.expired, 500);
    assert_eq!(stats.size, 1000);
}
