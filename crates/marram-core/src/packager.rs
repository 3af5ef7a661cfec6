//! The packager facade and its memoized build pipeline.
//!
//! A [`Packager`] owns the per-path source asset cache and a memoized build
//! slot. `build()` runs the full pipeline — validate configuration, resolve
//! and fetch the entry points, link, optionally minify, postprocess — at
//! most once per instance; repeated calls share the settled result exactly
//! like cache entries do. `invalidate()` discards both caches so the next
//! build recomputes everything, which is what a file-watch driver calls
//! after a change.

use crate::asset::CompositeAsset;
use crate::cache::{AssetCache, CacheStats};
use crate::config::PackagerConfig;
use crate::error::{PackError, PackResult};
use crate::plugin::PackContext;
use futures::future::{try_join_all, BoxFuture, FutureExt, Shared};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;

type SharedBuild = Shared<BoxFuture<'static, PackResult<Arc<CompositeAsset>>>>;

/// Public operations composing the pipeline for external callers (CLI,
/// watch driver, multi-asset registry). Cloning shares the same instance:
/// caches, memoized build, and configuration.
#[derive(Clone)]
pub struct Packager {
    inner: Arc<PackagerInner>,
}

struct PackagerInner {
    config: Arc<PackagerConfig>,
    assets: Arc<AssetCache>,
    build: Mutex<Option<SharedBuild>>,
}

impl Packager {
    #[must_use]
    pub fn new(config: PackagerConfig) -> Self {
        Self {
            inner: Arc::new(PackagerInner {
                config: Arc::new(config),
                assets: Arc::new(AssetCache::new()),
                build: Mutex::new(None),
            }),
        }
    }

    /// The configuration this instance was constructed with.
    #[must_use]
    pub fn config(&self) -> &PackagerConfig {
        &self.inner.config
    }

    /// The plugin context for this instance.
    #[must_use]
    pub fn context(&self) -> PackContext {
        PackContext::new(
            Arc::clone(&self.inner.config),
            Arc::clone(&self.inner.assets),
        )
    }

    /// Produce the final composite asset, computed at most once per
    /// instance. A second call without an intervening [`Self::invalidate`]
    /// reuses the memoized result — including a memoized error.
    pub async fn build(&self) -> PackResult<Arc<CompositeAsset>> {
        let fut = {
            let mut slot = self.inner.build.lock().unwrap();
            match slot.as_ref() {
                Some(existing) => existing.clone(),
                None => {
                    let fut = run_pipeline(Arc::clone(&self.inner)).boxed().shared();
                    *slot = Some(fut.clone());
                    fut
                }
            }
        };
        fut.await
    }

    /// Build, then persist the body (UTF-8) to the configured output path.
    ///
    /// Returns the path written. Fails with a configuration error when no
    /// output path is configured, or with the build/filesystem error;
    /// nothing is written on failure.
    pub async fn write(&self) -> PackResult<PathBuf> {
        let target = self
            .inner
            .config
            .path
            .clone()
            .ok_or_else(|| PackError::configuration("no output path configured"))?;
        self.write_to(&target).await?;
        Ok(target)
    }

    /// Build, then persist the body to an explicit path, creating parent
    /// directories as needed.
    pub async fn write_to(&self, out: &Path) -> PackResult<()> {
        let composite = self.build().await?;
        if let Some(parent) = out.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| PackError::io(parent, &e))?;
            }
        }
        tokio::fs::write(out, composite.body.as_bytes())
            .await
            .map_err(|e| PackError::io(out, &e))?;
        debug!(path = %out.display(), bytes = composite.body.len(), "wrote composite asset");
        Ok(())
    }

    /// Clear the source asset cache and the memoized build so the next
    /// `build`/`write` recomputes everything. Work already in flight is not
    /// cancelled; callers attached to it still get the stale result.
    pub fn invalidate(&self) {
        self.inner.assets.invalidate();
        *self.inner.build.lock().unwrap() = None;
        debug!("packager invalidated");
    }

    /// Map a module identifier to an absolute path, restricted to the
    /// extensions that have a registered compiler.
    pub fn resolve(&self, id: &str, basedir: Option<&Path>) -> PackResult<PathBuf> {
        self.context().resolve(id, basedir)
    }

    /// Source asset cache statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.inner.assets.stats()
    }
}

impl std::fmt::Debug for Packager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Packager")
            .field("config", &self.inner.config)
            .field("assets", &self.inner.assets)
            .finish()
    }
}

/// The build pipeline: validate → resolve+fetch roots → link → minify? →
/// postprocess. The first error from any step aborts the rest; partial
/// output is discarded, never written.
async fn run_pipeline(inner: Arc<PackagerInner>) -> PackResult<Arc<CompositeAsset>> {
    let config = &inner.config;

    // Validation first, before any stage runs.
    if config.main.is_empty() {
        return Err(PackError::configuration("no main entry point configured"));
    }
    let linker = config
        .linker
        .clone()
        .ok_or_else(|| PackError::configuration("no linker configured"))?;
    let minifier = if config.minify {
        Some(config.minifier.clone().ok_or_else(|| {
            PackError::configuration("minify requested but no minifier configured")
        })?)
    } else {
        None
    };

    let ctx = PackContext::new(Arc::clone(&inner.config), Arc::clone(&inner.assets));

    // Resolve and fetch every entry point concurrently, preserving input
    // order in the result.
    debug!(main = ?config.main, "building composite asset");
    let roots = try_join_all(config.main.iter().map(|id| {
        let ctx = ctx.clone();
        async move {
            let path = ctx.resolve(id, None)?;
            ctx.get_source_asset(&path).await
        }
    }))
    .await?;

    let mut composite = CompositeAsset::new(config.path.clone(), roots);
    composite = linker.link(composite, &ctx).await?;
    if let Some(minifier) = minifier {
        composite = minifier.minify(composite, &ctx).await?;
    }
    for post in &config.postprocessors {
        composite = post.postprocess(composite, &ctx).await?;
    }

    debug!(
        roots = composite.assets.len(),
        bytes = composite.body.len(),
        "composite asset built"
    );
    Ok(Arc::new(composite))
}
