//! Load tests for the route table and snapshot cache.
//!
//! These tests check behaviour with large route tables and concurrent
//! writers:
//! - 500 routes with the catch-all last
//! - Parallel captures onto shared routes
//! - Lookups racing captures
//!
//! Run with: `cargo test --package integration-tests --test load_tests -- --nocapture`

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use navigate_turbo::prelude::*;

fn wide_table(count: usize) -> RouteTable {
    let mut patterns: Vec<String> = (0..count)
        .map(|i| format!("/section-{i}/{{slug}}"))
        .collect();
    patterns.push("/{anything}".to_string());
    RouteTable::new(patterns).expect("valid patterns")
}

#[test]
fn test_500_routes() {
    let routes = wide_table(500);
    let cache: RouteCache<usize> = RouteCache::new();

    let start = Instant::now();
    for i in 0..500 {
        let route = cache.capture(&routes, &format!("/section-{i}/page"), Some(i));
        assert!(route.is_some());
    }
    println!("Captured 500 routes in {:?}", start.elapsed());

    assert_eq!(cache.snapshot_count(), 500);

    let start = Instant::now();
    for i in 0..500 {
        let snapshot = cache
            .lookup(&routes, &format!("/section-{i}/other"))
            .expect("snapshot should exist");
        assert_eq!(*snapshot.content(), i);
    }
    println!("Looked up 500 routes in {:?}", start.elapsed());

    // Only the catch-all matches single-segment paths.
    cache.capture(&routes, "/about", Some(usize::MAX));
    assert_eq!(
        cache.lookup(&routes, "/contact").map(|s| *s.content()),
        Some(usize::MAX)
    );
    assert_eq!(cache.stats().lookup_hits(), 501);
}

#[test]
fn test_parallel_captures() {
    let routes = Arc::new(wide_table(50));
    let cache: Arc<RouteCache<(usize, usize)>> = Arc::new(RouteCache::new());
    let writers = 8;
    let rounds = 200;

    thread::scope(|scope| {
        for writer in 0..writers {
            let routes = Arc::clone(&routes);
            let cache = Arc::clone(&cache);
            scope.spawn(move || {
                for round in 0..rounds {
                    let path = format!("/section-{}/w{writer}", round % 50);
                    cache.capture(&routes, &path, Some((writer, round)));
                }
            });
        }
    });

    assert_eq!(cache.snapshot_count(), 50);
    assert_eq!(cache.stats().captures(), (writers * rounds) as u64);
    assert_eq!(
        cache.stats().overwrites(),
        (writers * rounds - 50) as u64
    );

    // Every slot holds some writer's capture for that slot.
    for section in 0..50 {
        let snapshot = cache
            .lookup(&routes, &format!("/section-{section}/x"))
            .unwrap();
        let (writer, round) = *snapshot.content();
        assert!(writer < writers);
        assert_eq!(round % 50, section);
        assert!(snapshot.location().ends_with(&format!("/w{writer}")));
    }
}

#[test]
fn test_lookups_during_captures() {
    let routes = Arc::new(wide_table(10));
    let cache: Arc<RouteCache<u64>> = Arc::new(RouteCache::new());
    cache.capture(&routes, "/section-0/seed", Some(0));

    thread::scope(|scope| {
        let writer_cache = Arc::clone(&cache);
        let writer_routes = Arc::clone(&routes);
        scope.spawn(move || {
            for version in 1..=1000u64 {
                writer_cache.capture(&writer_routes, "/section-0/live", Some(version));
            }
        });

        for _ in 0..4 {
            let cache = Arc::clone(&cache);
            let routes = Arc::clone(&routes);
            scope.spawn(move || {
                let mut last = 0;
                for _ in 0..1000 {
                    let snapshot = cache.lookup(&routes, "/section-0/any").unwrap();
                    // A reader never observes an older capture after a newer one.
                    assert!(*snapshot.content() >= last);
                    last = *snapshot.content();
                }
            });
        }
    });

    let latest = cache.lookup(&routes, "/section-0/any").unwrap();
    assert_eq!(*latest.content(), 1000);
    assert_eq!(cache.stats().lookup_misses(), 0);
}
