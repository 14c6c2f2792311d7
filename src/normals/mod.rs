//! Monthly climate normals: download, caching, extraction and unit conversion.

pub mod error;
pub mod extract;
pub mod fetcher;
pub mod loader;
pub mod source;
