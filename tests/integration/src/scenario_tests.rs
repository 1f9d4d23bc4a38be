//! End-to-end navigation scenarios.
//!
//! Each test drives a running event loop the way a host page would: clicks
//! on links, then the framework's "navigating" and "navigated" events around
//! its own content replacement.

use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use navigate_turbo::prelude::*;
use tokio::sync::broadcast;
use tokio::task::LocalSet;

const ORIGIN: &str = "https://shop.test";

/// A page with a header link bar and a `<main>` content region.
struct Page {
    doc: Rc<MemoryDocument>,
}

impl Page {
    fn at(path: &str) -> Self {
        let doc = MemoryDocument::new(format!("{ORIGIN}{path}"));
        let body = doc.body().unwrap();
        doc.append_element(&body, "nav", &[("id", "links")]);
        render_region(&doc, &body, path);
        Self { doc: Rc::new(doc) }
    }

    fn link(&self, href: &str) -> NodeId {
        let nav = self.doc.query_selector("#links").unwrap();
        let anchor = self
            .doc
            .append_element(&nav, "a", &[("href", href), ("wire:navigate", "")]);
        self.doc.append_element(&anchor, "span", &[])
    }

    fn region(&self) -> NodeId {
        self.doc.query_selector("main").unwrap()
    }

    fn region_text(&self) -> Option<String> {
        self.doc.text(&self.region())
    }

    /// The framework replaces `<main>` and updates the URL.
    fn framework_render(&self, path: &str) -> NodeId {
        let fresh = self.doc.create_element("main", &[]);
        self.doc.set_text(&fresh, path);
        self.doc.append_element(&fresh, "div", &[("class", "turbo card")]);
        self.doc
            .append_element(&fresh, "p", &[("data-turbo-loading", ""), ("hidden", "")]);
        assert!(self.doc.replace_with(&self.region(), &fresh));
        self.doc.set_location(format!("{ORIGIN}{path}"));
        fresh
    }
}

fn render_region(doc: &MemoryDocument, parent: &NodeId, path: &str) -> NodeId {
    let main = doc.append_element(parent, "main", &[]);
    doc.set_text(&main, path);
    doc.append_element(&main, "div", &[("class", "turbo card")]);
    doc.append_element(&main, "p", &[("data-turbo-loading", ""), ("hidden", "")]);
    main
}

fn start(
    page: &Page,
    builder: TurboBuilder<MemoryDocument>,
) -> (TurboHandle<MemoryDocument>, broadcast::Receiver<TurboSignal>) {
    let turbo = builder
        .build(Rc::clone(&page.doc))
        .expect("valid configuration")
        .expect("routes configured");
    let handle = turbo.handle();
    let signals = handle.subscribe();
    turbo.spawn();
    (handle, signals)
}

/// Full framework navigation to `path`, waiting for the capture.
async fn navigate(
    page: &Page,
    handle: &TurboHandle<MemoryDocument>,
    signals: &mut broadcast::Receiver<TurboSignal>,
    path: &str,
) -> TurboSignal {
    handle.navigating().unwrap();
    page.framework_render(path);
    handle.navigated().unwrap();
    loop {
        match signals.recv().await.unwrap() {
            signal @ (TurboSignal::Captured { .. } | TurboSignal::CaptureDiscarded) => {
                return signal
            }
            _ => continue,
        }
    }
}

#[tokio::test(start_paused = true)]
async fn click_with_empty_cache_applies_overlay() {
    LocalSet::new()
        .run_until(async {
            let page = Page::at("/");
            let link = page.link("/posts/5");
            let live = page.region();
            let (handle, mut signals) = start(&page, TurboBuilder::new().route("/posts/{id}"));
            assert_eq!(signals.recv().await.unwrap(), TurboSignal::Ready);

            handle.click(link).unwrap();

            assert_eq!(
                signals.recv().await.unwrap(),
                TurboSignal::Overlay {
                    location: "/posts/5".into()
                }
            );
            assert_eq!(page.region(), live);
            assert!(page.doc.has_class(&live, "loading-overlay"));
            assert_eq!(handle.cache().snapshot_count(), 0);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn revisit_swaps_cached_region_and_scrolls_to_top() {
    LocalSet::new()
        .run_until(async {
            let page = Page::at("/");
            let to_post = page.link("/posts/5");
            let (handle, mut signals) = start(
                &page,
                TurboBuilder::new().route("/posts/{id}").route("/"),
            );
            assert_eq!(signals.recv().await.unwrap(), TurboSignal::Ready);

            // First visit: miss, then the post page gets cached.
            handle.click(to_post.clone()).unwrap();
            navigate(&page, &handle, &mut signals, "/posts/5").await;

            // Back home through the framework.
            navigate(&page, &handle, &mut signals, "/").await;
            let live = page.region();
            page.doc.scroll_to(0.0, 900.0);

            handle.click(to_post).unwrap();
            assert_eq!(
                signals.recv().await.unwrap(),
                TurboSignal::Swapped {
                    route: RoutePattern::new("/posts/{id}"),
                    location: "/posts/5".into()
                }
            );

            assert!(!page.doc.is_connected(&live));
            assert_eq!(page.region_text().as_deref(), Some("/posts/5"));
            assert_eq!(page.doc.scroll_position(), (0.0, 0.0));

            let card = page.doc.query_selector("main .card").unwrap();
            assert!(page.doc.has_class(&card, "loading-overlay"));
            let placeholder = page.doc.query_selector("main [data-turbo-loading]").unwrap();
            assert!(!page.doc.has_attribute(&placeholder, "hidden"));

            // The framework takes over: the original comes back first.
            handle.navigating().unwrap();
            assert_eq!(signals.recv().await.unwrap(), TurboSignal::Restored);
            assert_eq!(page.region(), live);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn any_id_on_a_cached_route_swaps() {
    LocalSet::new()
        .run_until(async {
            let page = Page::at("/posts/1");
            let other = page.link("/posts/99");
            let (handle, mut signals) = start(&page, TurboBuilder::new().route("/posts/{id}"));
            assert_eq!(signals.recv().await.unwrap(), TurboSignal::Ready);

            // The initial page is captured after the first "navigated".
            handle.navigated().unwrap();
            assert!(matches!(
                signals.recv().await.unwrap(),
                TurboSignal::Captured { .. }
            ));

            handle.click(other).unwrap();
            assert!(matches!(
                signals.recv().await.unwrap(),
                TurboSignal::Swapped { .. }
            ));
            // The snapshot still shows the page it was taken from.
            assert_eq!(page.region_text().as_deref(), Some("/posts/1"));
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn rapid_second_click_discards_first_capture() {
    LocalSet::new()
        .run_until(async {
            let page = Page::at("/");
            let first = page.link("/posts/5");
            let second = page.link("/users/2");
            let (handle, mut signals) = start(
                &page,
                TurboBuilder::new()
                    .route("/posts/{id}")
                    .route("/users/{id}")
                    .capture_delay(Duration::from_millis(200)),
            );
            assert_eq!(signals.recv().await.unwrap(), TurboSignal::Ready);

            handle.click(first).unwrap();
            handle.navigating().unwrap();
            page.framework_render("/posts/5");
            handle.navigated().unwrap();

            tokio::time::sleep(Duration::from_millis(50)).await;
            handle.click(second).unwrap();

            let mut discarded = false;
            while let Ok(signal) = signals.recv().await {
                match signal {
                    TurboSignal::CaptureDiscarded => {
                        discarded = true;
                        break;
                    }
                    TurboSignal::Captured { .. } => panic!("stale capture stored"),
                    _ => {}
                }
            }
            assert!(discarded);
            assert_eq!(handle.cache().snapshot_count(), 0);
            assert_eq!(handle.metrics().captures_discarded(), 1);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn simple_turbo_disabled_leaves_page_alone() {
    LocalSet::new()
        .run_until(async {
            let page = Page::at("/");
            let link = page.link("/posts/5");
            let ignored = page.doc.create_element("a", &[("href", "/posts/6")]);
            let nav = page.doc.query_selector("#links").unwrap();
            page.doc.append_child(&nav, &ignored);
            let (handle, mut signals) = start(
                &page,
                TurboBuilder::new().route("/posts/{id}").simple_turbo(false),
            );
            assert_eq!(signals.recv().await.unwrap(), TurboSignal::Ready);

            handle.click(ignored).unwrap();
            handle.click(link).unwrap();
            handle.navigated().unwrap();

            // Nothing to report until the delayed capture, which finds the
            // location still at "/" while "/posts/5" is pending.
            assert_eq!(signals.recv().await.unwrap(), TurboSignal::CaptureDiscarded);
            assert!(!page.doc.has_class(&page.region(), "loading-overlay"));
            assert_eq!(handle.metrics().overlays(), 0);
        })
        .await;
}

struct SiteLoader;

#[async_trait(?Send)]
impl ContextLoader<MemoryDocument> for SiteLoader {
    async fn load(&self, href: &str, context_tag: &str) -> Option<MemoryDocument> {
        tokio::time::sleep(Duration::from_millis(40)).await;
        if href.starts_with("/missing") {
            return None;
        }
        let doc = MemoryDocument::isolated(format!("{ORIGIN}{href}"), context_tag);
        let body = doc.body()?;
        render_region(&doc, &body, href);
        Some(doc)
    }
}

#[tokio::test(start_paused = true)]
async fn prefetched_route_swaps_on_first_click() {
    LocalSet::new()
        .run_until(async {
            let page = Page::at("/");
            let link = page.link("/posts/42");
            let config = TurboConfig::from_json(
                r#"{
                    "routes": ["/posts/{id}", "/"],
                    "prefetch": ["/", "/posts/1", "/missing"]
                }"#,
            )
            .unwrap();
            let turbo = init_with_loader(config, Rc::clone(&page.doc), Rc::new(SiteLoader))
                .unwrap()
                .unwrap();
            let handle = turbo.handle();
            let mut signals = handle.subscribe();
            turbo.spawn();
            assert_eq!(signals.recv().await.unwrap(), TurboSignal::Ready);

            assert_eq!(
                signals.recv().await.unwrap(),
                TurboSignal::Prefetched {
                    route: RoutePattern::new("/posts/{id}"),
                    location: "/posts/1".into()
                }
            );

            handle.click(link).unwrap();
            assert!(matches!(
                signals.recv().await.unwrap(),
                TurboSignal::Swapped { .. }
            ));
            assert_eq!(page.region_text().as_deref(), Some("/posts/1"));
            assert_eq!(handle.metrics().prefetched(), 1);
        })
        .await;
}

#[test]
fn prefetch_context_does_not_initialise() {
    let doc = Rc::new(MemoryDocument::isolated(
        format!("{ORIGIN}/posts/1"),
        PREFETCH_CONTEXT_TAG,
    ));
    let config = TurboConfig {
        routes: vec!["/posts/{id}".into()],
        ..Default::default()
    };
    assert!(init(config, doc).unwrap().is_none());
}

#[test]
fn no_routes_disables_everything() {
    let page = Page::at("/");
    assert!(init(TurboConfig::default(), Rc::clone(&page.doc))
        .unwrap()
        .is_none());
}

#[test]
fn handle_errors_once_loop_is_gone() {
    let page = Page::at("/");
    let turbo = TurboBuilder::new()
        .route("/")
        .build(Rc::clone(&page.doc))
        .unwrap()
        .unwrap();
    let handle = turbo.handle();
    drop(turbo);

    assert!(handle.is_closed());
    assert!(matches!(handle.navigated(), Err(TurboError::ListenerClosed)));
}
