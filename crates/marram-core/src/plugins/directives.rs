//! Dependency directive analyzer.
//!
//! Scans a compiled body for require directives and resolves each
//! identifier relative to the asset's own directory:
//!
//! ```text
//! //= require lib/util        (scripts)
//! #= require lib/util         (preprocessed scripts)
//! /*= require base */         (stylesheets)
//! ```
//!
//! Identifiers may be quoted. Declaration order is preserved. Consumed
//! directive lines are stripped from the body so they never reach the
//! linked output; everything else is left untouched.

use crate::asset::SourceAsset;
use crate::error::PackResult;
use crate::plugin::{Analyzer, PackContext};
use async_trait::async_trait;

/// The default analyzer: extracts `require` directives.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectiveAnalyzer;

#[async_trait]
impl Analyzer for DirectiveAnalyzer {
    fn name(&self) -> &'static str {
        "directives"
    }

    async fn analyze(
        &self,
        mut asset: SourceAsset,
        ctx: &PackContext,
    ) -> PackResult<SourceAsset> {
        let dir = asset
            .path
            .parent()
            .map(std::path::Path::to_path_buf)
            .unwrap_or_else(|| ctx.basedir().to_path_buf());

        let mut dependencies = Vec::new();
        let mut kept = Vec::new();
        for line in asset.body.lines() {
            if let Some(id) = parse_directive(line) {
                // Resolution failures abort the analysis; a directive that
                // names a missing module is an error, not a warning.
                dependencies.push(ctx.resolve(id, Some(&dir))?);
            } else {
                kept.push(line);
            }
        }
        asset.dependencies = dependencies;
        asset.body = kept.join("\n");
        Ok(asset)
    }
}

/// Extract the identifier from a require directive line, if it is one.
fn parse_directive(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    let body = if let Some(rest) = trimmed.strip_prefix("//=") {
        rest
    } else if let Some(rest) = trimmed.strip_prefix("#=") {
        rest
    } else if let Some(rest) = trimmed.strip_prefix("/*=") {
        rest.trim_end().strip_suffix("*/").unwrap_or(rest)
    } else {
        return None;
    };

    let verb = body.trim();
    let id = verb.strip_prefix("require")?;
    // "require" must stand alone: reject e.g. "//= requires".
    if !id.starts_with(char::is_whitespace) {
        return None;
    }
    let id = id.trim().trim_matches(|c| c == '"' || c == '\'');
    (!id.is_empty()).then_some(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_script_directive() {
        assert_eq!(parse_directive("//= require lib/util"), Some("lib/util"));
        assert_eq!(parse_directive("  //= require a  "), Some("a"));
    }

    #[test]
    fn test_parse_hash_directive() {
        assert_eq!(parse_directive("#= require models/user"), Some("models/user"));
    }

    #[test]
    fn test_parse_stylesheet_directive() {
        assert_eq!(parse_directive("/*= require base */"), Some("base"));
        assert_eq!(parse_directive("/*= require reset"), Some("reset"));
    }

    #[test]
    fn test_parse_quoted_identifier() {
        assert_eq!(parse_directive("//= require \"lib/a\""), Some("lib/a"));
        assert_eq!(parse_directive("//= require 'lib/b'"), Some("lib/b"));
    }

    #[test]
    fn test_non_directives_ignored() {
        assert_eq!(parse_directive("var x = 1;"), None);
        assert_eq!(parse_directive("// require a"), None);
        assert_eq!(parse_directive("//= requires a"), None);
        assert_eq!(parse_directive("//= require"), None);
        assert_eq!(parse_directive(""), None);
    }
}
