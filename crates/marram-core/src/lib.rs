//! Incremental asset packager engine.
//!
//! Compiles source files that declare dependencies with `//= require`
//! directives, expands the dependency closure, links it into one body,
//! optionally minifies, and writes the result.
//!
//! ## Usage
//!
//! ```ignore
//! use marram_core::{Packager, PackagerConfig};
//!
//! let packager = Packager::new(
//!     PackagerConfig::new()
//!         .basedir("assets/js")
//!         .main("app")
//!         .output("dist/app.js")
//!         .with_defaults(),
//! );
//! packager.write().await?;
//! // ... a watched file changed:
//! packager.invalidate();
//! packager.write().await?;
//! ```
//!
//! ## Architecture
//!
//! 1. **Resolution** — map module identifiers to file paths
//! 2. **Cache** — compile+analyze each path at most once
//! 3. **Closure** — expand roots into the ordered build list
//! 4. **Pipeline** — link → minify → postprocess, memoized per instance

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod asset;
pub mod cache;
pub mod closure;
pub mod config;
pub mod error;
pub mod packager;
pub mod plugin;
pub mod plugins;
pub mod resolve;

pub use asset::{CompositeAsset, SourceAsset};
pub use cache::{AssetCache, CacheStats};
pub use config::PackagerConfig;
pub use error::{PackError, PackResult};
pub use packager::Packager;
pub use plugin::{Analyzer, Compiler, Linker, Minifier, PackContext, Postprocessor};

/// Crate version, for CLI `--version` style reporting.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
