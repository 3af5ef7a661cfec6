//! Whitespace minifier.

use crate::asset::CompositeAsset;
use crate::error::PackResult;
use crate::plugin::{Minifier, PackContext};
use async_trait::async_trait;

/// Drops blank lines and trailing whitespace.
///
/// Deliberately naive: it never parses the body, so it is safe for any
/// line-oriented text. Real minification is a job for a language-aware
/// plugin.
#[derive(Debug, Clone, Copy, Default)]
pub struct StripMinifier;

#[async_trait]
impl Minifier for StripMinifier {
    fn name(&self) -> &'static str {
        "strip"
    }

    async fn minify(
        &self,
        mut composite: CompositeAsset,
        _ctx: &PackContext,
    ) -> PackResult<CompositeAsset> {
        composite.body = composite
            .body
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        Ok(composite)
    }
}
