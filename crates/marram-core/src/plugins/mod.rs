//! Built-in plugin implementations.
//!
//! The concrete capability set merged in by
//! [`crate::PackagerConfig::with_defaults`]: a raw-copy compiler, the
//! `//= require` directive analyzer, a concatenating linker, a whitespace
//! minifier, and a banner postprocessor. Language-aware compilers and real
//! minification belong to external plugins; these cover the plain
//! script/stylesheet case end to end.

mod banner;
mod copy;
mod directives;
mod merge;
mod strip;

pub use banner::BannerPostprocessor;
pub use copy::CopyCompiler;
pub use directives::DirectiveAnalyzer;
pub use merge::MergeLinker;
pub use strip::StripMinifier;
