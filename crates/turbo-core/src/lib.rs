//! # turbo-core
//!
//! Core types, traits, and error handling for navigate-turbo.
//!
//! This crate provides the foundational pieces used across the other crates:
//!
//! - [`TurboError`] - Error type for configuration-time failures
//! - [`RoutePattern`] / [`RouteMatcher`] / [`RouteTable`] - Route templates compiled once
//!   and matched in declaration order
//! - [`Document`] - The capability surface over the live DOM
//! - [`location`] - Helpers turning hrefs into the path keys used everywhere else
//!
//! ## Example
//!
//! ```rust
//! use turbo_core::RouteTable;
//!
//! let table = RouteTable::new(["/posts/{id}", "/posts/{id}/comments"]).unwrap();
//!
//! assert_eq!(table.match_path("/posts/5").map(|r| r.as_str()), Some("/posts/{id}"));
//! assert!(table.match_path("/users/5").is_none());
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod dom;
mod error;
pub mod location;
mod route;

pub use dom::Document;
pub use error::TurboError;
pub use route::{RouteMatcher, RoutePattern, RouteTable};

/// Result type alias using [`TurboError`].
pub type Result<T> = std::result::Result<T, TurboError>;
