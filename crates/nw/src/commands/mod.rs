//! CLI command implementations.

pub(crate) mod cache;
pub(crate) mod mirror;

pub(crate) use cache::CacheCommand;
pub(crate) use mirror::MirrorArgs;
