//! Packager configuration.
//!
//! One immutable [`PackagerConfig`] per packager instance, assembled with
//! chainable builder methods. Capability defaults are applied by the pure
//! [`PackagerConfig::with_defaults`] merge rather than any shared global
//! state.

use crate::plugin::{Analyzer, Compiler, Linker, Minifier, Postprocessor};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration consumed by [`crate::Packager::new`].
///
/// All fields are optional at construction; `main` and `linker` (and a
/// compiler per extension actually used, and `minifier` when `minify` is
/// set) are validated lazily at build time.
pub struct PackagerConfig {
    /// Root for resolving relative module references.
    pub basedir: PathBuf,
    /// Default output path for [`crate::Packager::write`].
    pub path: Option<PathBuf>,
    /// Entry-point module identifiers, in build order.
    pub main: Vec<String>,
    /// Source-file extension → compiler.
    pub compilers: HashMap<String, Arc<dyn Compiler>>,
    /// Analyzer applied to every compiled asset.
    pub analyzer: Option<Arc<dyn Analyzer>>,
    /// Linker that merges a closure into one body.
    pub linker: Option<Arc<dyn Linker>>,
    /// Whether to run the minifier after linking.
    pub minify: bool,
    /// Required iff `minify` is set.
    pub minifier: Option<Arc<dyn Minifier>>,
    /// Applied in order after minification.
    pub postprocessors: Vec<Arc<dyn Postprocessor>>,
}

impl Default for PackagerConfig {
    fn default() -> Self {
        Self {
            basedir: PathBuf::from("."),
            path: None,
            main: Vec::new(),
            compilers: HashMap::new(),
            analyzer: None,
            linker: None,
            minify: false,
            minifier: None,
            postprocessors: Vec::new(),
        }
    }
}

impl PackagerConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn basedir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.basedir = dir.into();
        self
    }

    /// Set the default output path.
    #[must_use]
    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Add one entry-point module identifier.
    #[must_use]
    pub fn main(mut self, id: impl Into<String>) -> Self {
        self.main.push(id.into());
        self
    }

    /// Register a compiler for a source-file extension (no leading dot).
    #[must_use]
    pub fn compiler(mut self, ext: impl Into<String>, compiler: Arc<dyn Compiler>) -> Self {
        self.compilers.insert(ext.into(), compiler);
        self
    }

    #[must_use]
    pub fn analyzer(mut self, analyzer: Arc<dyn Analyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    #[must_use]
    pub fn linker(mut self, linker: Arc<dyn Linker>) -> Self {
        self.linker = Some(linker);
        self
    }

    #[must_use]
    pub fn minify(mut self, minify: bool) -> Self {
        self.minify = minify;
        self
    }

    #[must_use]
    pub fn minifier(mut self, minifier: Arc<dyn Minifier>) -> Self {
        self.minifier = Some(minifier);
        self
    }

    /// Append a postprocessor; they run in registration order.
    #[must_use]
    pub fn postprocessor(mut self, post: Arc<dyn Postprocessor>) -> Self {
        self.postprocessors.push(post);
        self
    }

    /// Pure merge filling empty capability slots with the built-in plugin
    /// set: copy compilers for `js` and `css`, the directive analyzer, and
    /// the merge linker. Explicitly-set capabilities win.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        use crate::plugins::{CopyCompiler, DirectiveAnalyzer, MergeLinker};

        if self.compilers.is_empty() {
            let copy: Arc<dyn Compiler> = Arc::new(CopyCompiler);
            self.compilers.insert("js".to_string(), Arc::clone(&copy));
            self.compilers.insert("css".to_string(), copy);
        }
        if self.analyzer.is_none() {
            self.analyzer = Some(Arc::new(DirectiveAnalyzer));
        }
        if self.linker.is_none() {
            self.linker = Some(Arc::new(MergeLinker));
        }
        self
    }

    /// Registered compiler extensions in sorted order.
    ///
    /// Resolution probes candidates in this order; sorting keeps it
    /// deterministic over the HashMap-backed registry.
    #[must_use]
    pub fn extensions(&self) -> Vec<String> {
        let mut exts: Vec<String> = self.compilers.keys().cloned().collect();
        exts.sort();
        exts
    }

    /// Absolute base directory, for callers that need it anchored.
    #[must_use]
    pub fn abs_basedir(&self) -> PathBuf {
        if self.basedir.is_absolute() {
            self.basedir.clone()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(&self.basedir))
                .unwrap_or_else(|_| self.basedir.clone())
        }
    }
}

impl std::fmt::Debug for PackagerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackagerConfig")
            .field("basedir", &self.basedir)
            .field("path", &self.path)
            .field("main", &self.main)
            .field("compilers", &self.extensions())
            .field("analyzer", &self.analyzer.as_ref().map(|a| a.name()))
            .field("linker", &self.linker.as_ref().map(|l| l.name()))
            .field("minify", &self.minify)
            .field("minifier", &self.minifier.as_ref().map(|m| m.name()))
            .field(
                "postprocessors",
                &self
                    .postprocessors
                    .iter()
                    .map(|p| p.name())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extensions_sorted() {
        let config = PackagerConfig::new().with_defaults();
        assert_eq!(config.extensions(), vec!["css", "js"]);
    }

    #[test]
    fn test_with_defaults_fills_empty_slots() {
        let config = PackagerConfig::new().with_defaults();
        assert!(config.analyzer.is_some());
        assert!(config.linker.is_some());
        assert!(!config.compilers.is_empty());
        assert!(config.minifier.is_none());
        assert!(!config.minify);
    }

    #[test]
    fn test_with_defaults_keeps_explicit_compilers() {
        use crate::plugins::CopyCompiler;
        let config = PackagerConfig::new()
            .compiler("coffee", Arc::new(CopyCompiler))
            .with_defaults();
        // Explicit registration wins; defaults are not merged on top.
        assert_eq!(config.extensions(), vec!["coffee"]);
    }

    #[test]
    fn test_main_accumulates_in_order() {
        let config = PackagerConfig::new().main("a.js").main("b.js");
        assert_eq!(config.main, vec!["a.js", "b.js"]);
    }
}
