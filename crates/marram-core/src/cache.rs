//! Source asset cache.
//!
//! Memoizes compile+analyze results per resolved path. Each entry is a
//! settle-once shared future: the first caller for a path installs the
//! computation, and every caller — concurrent or later, until invalidation —
//! awaits the same handle and receives the identical result. This keeps a
//! shared dependency in a diamond-shaped graph from being compiled more
//! than once, even under concurrent requests.
//!
//! A settled error is memoized the same way as a success: re-requesting a
//! previously-failed asset replays the cached error until `invalidate()` is
//! called. Callers that want a retry must invalidate first.

use crate::asset::SourceAsset;
use crate::error::PackResult;
use crate::plugin::PackContext;
use futures::future::{BoxFuture, FutureExt, Shared};
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;

type SharedAsset = Shared<BoxFuture<'static, PackResult<Arc<SourceAsset>>>>;

/// Per-path memoization of compile+analyze work.
#[derive(Default)]
pub struct AssetCache {
    /// In-flight-or-complete computations, keyed by resolved path.
    entries: Mutex<FxHashMap<PathBuf, SharedAsset>>,
}

impl AssetCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the compiled-and-analyzed asset for `path`, computing it at
    /// most once regardless of how many concurrent requests arrive.
    pub async fn get(&self, path: &Path, ctx: &PackContext) -> PackResult<Arc<SourceAsset>> {
        let entry = {
            let mut entries = self.entries.lock().unwrap();
            if let Some(existing) = entries.get(path) {
                existing.clone()
            } else {
                let fut = compile_and_analyze(path.to_path_buf(), ctx.clone())
                    .boxed()
                    .shared();
                entries.insert(path.to_path_buf(), fut.clone());
                fut
            }
        };
        // Awaited outside the lock: concurrent callers for other paths (and
        // for this one) proceed while the computation runs.
        entry.await
    }

    /// Discard every entry; subsequent requests recompute from scratch.
    ///
    /// Computations already in flight are not cancelled — callers attached
    /// to them still receive the stale-but-started result.
    pub fn invalidate(&self) {
        let mut entries = self.entries.lock().unwrap();
        let count = entries.len();
        entries.clear();
        debug!(count, "source asset cache invalidated");
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.entries.lock().unwrap().len(),
        }
    }
}

impl std::fmt::Debug for AssetCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetCache")
            .field("entries", &self.stats().entry_count)
            .finish()
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy)]
pub struct CacheStats {
    pub entry_count: usize,
}

/// The memoized computation: pick the compiler by extension, then run
/// compiler and analyzer in sequence.
async fn compile_and_analyze(path: PathBuf, ctx: PackContext) -> PackResult<Arc<SourceAsset>> {
    let compiler = ctx.compiler_for(&path)?;
    let analyzer = ctx.analyzer()?;

    debug!(path = %path.display(), compiler = compiler.name(), "compiling source asset");
    let asset = compiler.compile(SourceAsset::new(path), &ctx).await?;
    let asset = analyzer.analyze(asset, &ctx).await?;
    Ok(Arc::new(asset))
}
