//! Simulated Browsing Session
//!
//! This demo runs navigate-turbo against an in-memory page and plays a short
//! browsing session:
//! - Prefetches a couple of pages into isolated documents
//! - Clicks through posts and profiles, letting a fake framework render each one
//! - Logs every swap, restore and capture, then prints the counters
//!
//! Run with:
//! ```bash
//! RUST_LOG=debug cargo run -p simulated-session
//! ```

use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use navigate_turbo::prelude::*;
use tokio::task::LocalSet;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const ORIGIN: &str = "https://blog.test";

const CONFIG: &str = r#"{
    "turboAreaSelector": "main",
    "routes": ["/posts/{id}", "/users/{id}", "/"],
    "prefetch": ["/posts/1", "/users/7", "/drafts/1"],
    "captureDelayMs": 100
}"#;

/// Server-side rendering stand-in: page titles by path.
struct Site {
    pages: BTreeMap<&'static str, &'static str>,
    latency: Duration,
}

impl Site {
    fn new() -> Self {
        let pages = BTreeMap::from([
            ("/", "Front page"),
            ("/posts/1", "Hello, world"),
            ("/posts/2", "Second thoughts"),
            ("/posts/3", "Third time lucky"),
            ("/users/7", "Profile of user 7"),
        ]);
        Self {
            pages,
            latency: Duration::from_millis(60),
        }
    }

    fn paths(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.pages.keys().copied()
    }

    /// Build the content region for `path` under `parent`.
    fn render_into(&self, doc: &MemoryDocument, parent: &NodeId, path: &str) -> Option<NodeId> {
        let title = self.pages.get(path)?;
        let main = doc.create_element("main", &[]);
        doc.set_text(&main, *title);
        doc.append_element(&main, "section", &[("class", "turbo")]);
        doc.append_element(&main, "div", &[("data-turbo-loading", ""), ("hidden", "")]);
        doc.append_child(parent, &main);
        Some(main)
    }

    /// Server response for `path`, as the prefetch frame would receive it.
    fn render_markup(&self, path: &str) -> Option<String> {
        let title = self.pages.get(path)?;
        Some(format!(
            "<!DOCTYPE html><html><head><title>{title}</title></head><body>\
             <main>{title}<section class=\"turbo\"></section>\
             <div data-turbo-loading hidden></div></main></body></html>"
        ))
    }

    /// What the framework does after "navigating": replace `<main>` and the URL.
    fn framework_render(&self, doc: &MemoryDocument, path: &str) -> anyhow::Result<()> {
        let body = doc.body().context("document has no body")?;
        let fresh = self
            .render_into(doc, &body, path)
            .with_context(|| format!("no page at {path}"))?;
        if let Some(live) = doc.query_selector("main") {
            if live != fresh {
                doc.replace_with(&live, &fresh);
            }
        }
        doc.set_location(format!("{ORIGIN}{path}"));
        Ok(())
    }
}

#[async_trait(?Send)]
impl ContextLoader<MemoryDocument> for Site {
    async fn load(&self, href: &str, context_tag: &str) -> Option<MemoryDocument> {
        tokio::time::sleep(self.latency).await;
        let markup = self.render_markup(href)?;
        Some(MemoryDocument::parse(format!("{ORIGIN}{href}"), &markup).with_context_tag(context_tag))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting simulated browsing session");
    info!("{}", navigate_turbo::version::version_string());

    LocalSet::new().run_until(session()).await
}

async fn session() -> anyhow::Result<()> {
    let site = Rc::new(Site::new());

    // Initial page load at "/", with a link bar outside the content region.
    let document = Rc::new(MemoryDocument::new(format!("{ORIGIN}/")));
    let body = document.body().context("document has no body")?;
    let nav = document.append_element(&body, "nav", &[]);
    let mut links = BTreeMap::new();
    for path in site.paths() {
        let anchor = document.append_element(&nav, "a", &[("href", path), ("wire:navigate", "")]);
        links.insert(path, anchor);
    }
    site.render_into(&document, &body, "/")
        .context("front page missing")?;

    let config = TurboConfig::from_json(CONFIG)?;
    let settle = config.capture_delay() + Duration::from_millis(50);
    let loader: Rc<dyn ContextLoader<MemoryDocument>> = site.clone();

    let Some(turbo) = init_with_loader(config, Rc::clone(&document), loader)? else {
        warn!("navigate-turbo stayed dormant");
        return Ok(());
    };
    let handle = turbo.handle();
    let mut signals = handle.subscribe();
    let event_loop = turbo.spawn();

    let observer = tokio::task::spawn_local(async move {
        while let Ok(signal) = signals.recv().await {
            info!(signal = signal.name(), "{:?}", signal);
        }
    });

    // Let the prefetch loads land and the landing page get captured.
    handle.navigated()?;
    tokio::time::sleep(site.latency + settle).await;

    for path in ["/posts/1", "/", "/posts/2", "/users/7", "/posts/3", "/"] {
        let link = links
            .get(path)
            .cloned()
            .with_context(|| format!("no link to {path}"))?;
        info!(location = %path, "click");
        handle.click(link)?;

        // Server round trip.
        tokio::time::sleep(site.latency).await;
        handle.navigating()?;
        site.framework_render(&document, path)?;
        handle.navigated()?;

        tokio::time::sleep(settle).await;
    }

    let metrics = handle.metrics();
    let stats = handle.cache().stats();
    info!(
        swaps = metrics.swaps(),
        overlays = metrics.overlays(),
        restores = metrics.restores(),
        captures = metrics.captures(),
        discarded = metrics.captures_discarded(),
        prefetched = metrics.prefetched(),
        "session finished"
    );
    info!(
        snapshots = handle.cache().snapshot_count(),
        hit_rate = stats.hit_rate(),
        "cache"
    );

    drop(handle);
    event_loop.await?;
    observer.await?;
    Ok(())
}
