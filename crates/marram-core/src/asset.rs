//! Asset types.
//!
//! A [`SourceAsset`] is one compiled, dependency-analyzed input file; a
//! [`CompositeAsset`] is the linked output built from one or more roots and
//! their transitive dependencies. Both are immutable once published: source
//! assets are shared as `Arc<SourceAsset>` by every caller that requested
//! the same path, and the composite is replaced wholesale on invalidation.

use std::path::PathBuf;
use std::sync::Arc;

/// One compiled source file.
#[derive(Debug, Clone)]
pub struct SourceAsset {
    /// Absolute, canonicalized filesystem path. Uniquely identifies the
    /// asset within one packager instance.
    pub path: PathBuf,
    /// Compiled text content, set by the compiler stage.
    pub body: String,
    /// Ordered absolute paths of declared dependencies, set by the analyzer
    /// stage. May be empty.
    pub dependencies: Vec<PathBuf>,
}

impl SourceAsset {
    /// Create an empty asset for the given path, ready for the compiler.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            body: String::new(),
            dependencies: Vec::new(),
        }
    }
}

/// The in-progress or final output of a build.
#[derive(Debug, Clone)]
pub struct CompositeAsset {
    /// Target output path, if one is configured. `None` when the build is
    /// destined for a stream.
    pub path: Option<PathBuf>,
    /// Ordered root assets supplied as build entry points.
    pub assets: Vec<Arc<SourceAsset>>,
    /// Result of linking (and, if configured, minifying/postprocessing) the
    /// dependency closure of `assets`.
    pub body: String,
}

impl CompositeAsset {
    /// Create a composite with the given roots and an empty body.
    #[must_use]
    pub fn new(path: Option<PathBuf>, assets: Vec<Arc<SourceAsset>>) -> Self {
        Self {
            path,
            assets,
            body: String::new(),
        }
    }
}
