//! # turbo-dom
//!
//! An in-memory [`Document`](turbo_core::Document) for navigate-turbo.
//!
//! [`MemoryDocument`] wraps a [`scraper::Html`] tree with a location and
//! scroll offsets, and answers queries with full CSS selectors. It exists so
//! the protocol can run in tests, benches and demos without a browser; a
//! real host binds `Document` to its own DOM instead.
//!
//! ```rust
//! use turbo_core::Document;
//! use turbo_dom::MemoryDocument;
//!
//! let doc = MemoryDocument::new("https://example.test/posts/5");
//! let body = doc.body().unwrap();
//! let main = doc.append_element(&body, "main", &[("class", "turbo")]);
//!
//! assert_eq!(doc.query_selector("main.turbo"), Some(main));
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod document;

pub use document::{parse_selector, MemoryDocument, NodeId};
pub use scraper::Selector;
