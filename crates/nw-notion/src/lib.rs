//! Notion access for notion-wiki.
//!
//! This crate provides everything the mirror needs to read a workspace:
//!
//! - [`EntityId`]: parsed block, page and database identifiers
//! - [`types`]: lenient typed model of blocks, pages, databases and property
//!   values
//! - [`NotionApi`] trait with the HTTP [`NotionClient`]
//! - [`Fetcher`]: cache-first access that fetches each object at most once
//!   per run, coalesces concurrent requests and shares one [`RateLimiter`]
//! - `MockApi` and payload fixtures for testing (behind `mock` feature flag)
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use nw_cache::NullCache;
//! use nw_notion::{ClientOptions, EntityId, Fetcher, NotionClient, RateLimiter};
//!
//! let client = NotionClient::new(&token, &ClientOptions::default());
//! let fetcher = Fetcher::new(Arc::new(client), &NullCache, RateLimiter::new(3, period));
//! let page = fetcher.page(&EntityId::parse(root)?)?;
//! println!("{}", page.title());
//! ```

mod client;
mod error;
mod fetcher;
mod id;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
mod rate_limit;
pub mod types;

pub use client::{
    ClientOptions, DEFAULT_API_URL, DEFAULT_NOTION_VERSION, NotionApi, NotionClient,
};
pub use error::{FetchError, NotionError};
pub use fetcher::{FetchKind, FetchStats, Fetcher};
pub use id::{EntityId, InvalidId};
pub use rate_limit::RateLimiter;
