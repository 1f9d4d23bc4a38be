//! Cache integration tests.

use navigate_turbo::prelude::*;

fn routes() -> RouteTable {
    RouteTable::new(["/posts/{id}/comments", "/posts/{id}", "/users/{id}", "/"])
        .expect("valid routes")
}

fn region(doc: &MemoryDocument, label: &str) -> NodeId {
    let body = doc.body().unwrap();
    let main = doc.append_element(&body, "main", &[]);
    doc.set_text(&main, label);
    doc.append_element(&main, "article", &[("class", "turbo")]);
    main
}

#[test]
fn cache_basic_operations() {
    let doc = MemoryDocument::new("https://example.test/posts/5");
    let live = region(&doc, "post 5");
    let cache = RouteCache::new();
    let routes = routes();

    let route = cache.capture(&routes, "/posts/5", doc.clone_subtree(&live));
    assert_eq!(route, Some(RoutePattern::new("/posts/{id}")));

    let snapshot = cache.lookup(&routes, "/posts/8").expect("snapshot should exist");
    assert_eq!(snapshot.location(), "/posts/5");
    assert_eq!(doc.text(snapshot.content()).as_deref(), Some("post 5"));
    assert!(!doc.is_connected(snapshot.content()));
}

#[test]
fn cache_routes_are_independent() {
    let doc = MemoryDocument::new("https://example.test/");
    let cache = RouteCache::new();
    let routes = routes();

    for (path, label) in [
        ("/posts/1", "post"),
        ("/posts/1/comments", "comments"),
        ("/users/3", "user"),
        ("/", "home"),
    ] {
        let live = region(&doc, label);
        cache.capture(&routes, path, doc.clone_subtree(&live));
    }

    assert_eq!(cache.snapshot_count(), 4);
    let text = |path: &str| {
        cache
            .lookup(&routes, path)
            .and_then(|s| doc.text(s.content()))
    };
    assert_eq!(text("/posts/9").as_deref(), Some("post"));
    assert_eq!(text("/posts/9/comments").as_deref(), Some("comments"));
    assert_eq!(text("/users/1").as_deref(), Some("user"));
    assert_eq!(text("/").as_deref(), Some("home"));
    assert!(text("/settings").is_none());
}

#[test]
fn cache_latest_capture_wins() {
    let doc = MemoryDocument::new("https://example.test/");
    let cache = RouteCache::new();
    let routes = routes();

    let first = region(&doc, "first");
    let second = region(&doc, "second");
    cache.capture(&routes, "/users/1", doc.clone_subtree(&first));
    cache.capture(&routes, "/users/2", doc.clone_subtree(&second));

    assert_eq!(cache.snapshot_count(), 1);
    let snapshot = cache.get(&RoutePattern::new("/users/{id}")).unwrap();
    assert_eq!(snapshot.location(), "/users/2");
    assert_eq!(doc.text(snapshot.content()).as_deref(), Some("second"));
    assert_eq!(cache.stats().overwrites(), 1);
}

#[test]
fn cache_ignores_unmatched_and_absent_regions() {
    let doc = MemoryDocument::new("https://example.test/");
    let cache = RouteCache::new();
    let routes = routes();
    let live = region(&doc, "settings");

    assert!(cache
        .capture(&routes, "/settings", doc.clone_subtree(&live))
        .is_none());
    assert!(cache
        .capture(&routes, "/posts/1", doc.query_selector("#missing"))
        .is_none());

    assert_eq!(cache.snapshot_count(), 0);
    assert_eq!(cache.stats().captures_skipped(), 2);
}

#[test]
fn cached_snapshot_is_independent_of_live_region() {
    let doc = MemoryDocument::new("https://example.test/posts/1");
    let live = region(&doc, "before");
    let cache = RouteCache::new();
    let routes = routes();

    cache.capture(&routes, "/posts/1", doc.clone_subtree(&live));
    doc.set_text(&live, "after");
    doc.add_class(&live, "loading-overlay");

    let snapshot = cache.lookup(&routes, "/posts/1").unwrap();
    assert_eq!(doc.text(snapshot.content()).as_deref(), Some("before"));
    assert!(!doc.has_class(snapshot.content(), "loading-overlay"));
}

#[test]
fn cache_stats_track_lookups() {
    let cache: RouteCache<u32> = RouteCache::new();
    let routes = routes();

    cache.capture(&routes, "/", Some(1));
    assert!(cache.lookup(&routes, "/").is_some());
    assert!(cache.lookup(&routes, "/users/1").is_none());
    assert!(cache.lookup(&routes, "/nowhere").is_none());

    let stats = cache.stats();
    assert_eq!(stats.lookup_hits(), 1);
    assert_eq!(stats.lookup_misses(), 2);
    assert!((stats.hit_rate() - 1.0 / 3.0).abs() < 1e-9);
}
