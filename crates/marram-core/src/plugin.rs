//! Plugin contract for the build pipeline.
//!
//! Every stage of the pipeline — compile, analyze, link, minify,
//! postprocess — is an interchangeable capability supplied through
//! [`crate::config::PackagerConfig`] rather than baked in. Each capability
//! is a single async operation that takes the asset being built plus a
//! [`PackContext`] and returns the transformed asset; the returned future
//! settles exactly once, success or error.
//!
//! ## Example
//!
//! ```ignore
//! use marram_core::{Compiler, PackContext, PackResult, SourceAsset};
//!
//! struct Upper;
//!
//! #[async_trait::async_trait]
//! impl Compiler for Upper {
//!     fn name(&self) -> &'static str { "upper" }
//!
//!     async fn compile(&self, mut asset: SourceAsset, _ctx: &PackContext) -> PackResult<SourceAsset> {
//!         asset.body = asset.body.to_uppercase();
//!         Ok(asset)
//!     }
//! }
//! ```

use crate::asset::{CompositeAsset, SourceAsset};
use crate::cache::AssetCache;
use crate::config::PackagerConfig;
use crate::error::{PackError, PackResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Compiles one source file: reads `asset.path` and fills `asset.body`.
///
/// Compilers are keyed by source-file extension in the configuration; the
/// cache fails with a configuration error when an asset's extension has no
/// registered compiler.
#[async_trait]
pub trait Compiler: Send + Sync {
    /// Plugin name, used for logging and error attribution.
    fn name(&self) -> &'static str;

    async fn compile(&self, asset: SourceAsset, ctx: &PackContext) -> PackResult<SourceAsset>;
}

/// Extracts declared dependencies from a compiled asset.
///
/// Fills `asset.dependencies` with absolute paths, in declaration order.
/// A single analyzer applies to every compiled asset.
#[async_trait]
pub trait Analyzer: Send + Sync {
    fn name(&self) -> &'static str;

    async fn analyze(&self, asset: SourceAsset, ctx: &PackContext) -> PackResult<SourceAsset>;
}

/// Merges the dependency closure of the composite's roots into one body.
///
/// The linker is expected to expand the closure itself (via
/// [`PackContext::expand`]) so that linking strategies stay free to order or
/// wrap modules differently.
#[async_trait]
pub trait Linker: Send + Sync {
    fn name(&self) -> &'static str;

    async fn link(&self, composite: CompositeAsset, ctx: &PackContext)
        -> PackResult<CompositeAsset>;
}

/// Rewrites the linked body into a smaller one.
#[async_trait]
pub trait Minifier: Send + Sync {
    fn name(&self) -> &'static str;

    async fn minify(
        &self,
        composite: CompositeAsset,
        ctx: &PackContext,
    ) -> PackResult<CompositeAsset>;
}

/// Arbitrary post-link transform, applied after minification in
/// configuration order.
#[async_trait]
pub trait Postprocessor: Send + Sync {
    fn name(&self) -> &'static str;

    async fn postprocess(
        &self,
        composite: CompositeAsset,
        ctx: &PackContext,
    ) -> PackResult<CompositeAsset>;
}

/// Context handed to every plugin call.
///
/// A cheap clone of the packager's shared state: plugins use it to resolve
/// module identifiers and to request other assets through the memoizing
/// cache. Cloning the context does not copy any cached data.
#[derive(Clone)]
pub struct PackContext {
    config: Arc<PackagerConfig>,
    assets: Arc<AssetCache>,
}

impl PackContext {
    pub(crate) fn new(config: Arc<PackagerConfig>, assets: Arc<AssetCache>) -> Self {
        Self { config, assets }
    }

    /// Root directory for resolving relative module references.
    #[must_use]
    pub fn basedir(&self) -> &Path {
        &self.config.basedir
    }

    /// Map a module identifier to an absolute path, restricted to the
    /// extensions that have a registered compiler.
    ///
    /// `basedir` defaults to the packager's configured base directory.
    pub fn resolve(&self, id: &str, basedir: Option<&Path>) -> PackResult<PathBuf> {
        let base = basedir.unwrap_or(&self.config.basedir);
        crate::resolve::resolve(id, base, &self.config.extensions())
    }

    /// Fetch the compiled-and-analyzed asset for a resolved path.
    ///
    /// Computed at most once per path per packager instance; concurrent and
    /// repeated callers share the identical result (see
    /// [`crate::cache::AssetCache`]).
    pub async fn get_source_asset(&self, path: &Path) -> PackResult<Arc<SourceAsset>> {
        self.assets.get(path, self).await
    }

    /// Expand root assets into the ordered, de-duplicated dependency
    /// closure (see [`crate::closure`]).
    pub async fn expand(&self, roots: &[Arc<SourceAsset>]) -> PackResult<Vec<Arc<SourceAsset>>> {
        crate::closure::expand(roots, self).await
    }

    /// Look up the compiler registered for a path's extension.
    pub(crate) fn compiler_for(&self, path: &Path) -> PackResult<Arc<dyn Compiler>> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| {
                PackError::configuration(format!(
                    "no file extension on {}, cannot pick a compiler",
                    path.display()
                ))
            })?;
        self.config.compilers.get(ext).cloned().ok_or_else(|| {
            PackError::configuration(format!("no compiler registered for extension '{ext}'"))
        })
    }

    pub(crate) fn analyzer(&self) -> PackResult<Arc<dyn Analyzer>> {
        self.config
            .analyzer
            .clone()
            .ok_or_else(|| PackError::configuration("no analyzer configured"))
    }
}

impl std::fmt::Debug for PackContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackContext")
            .field("basedir", &self.config.basedir)
            .finish_non_exhaustive()
    }
}
