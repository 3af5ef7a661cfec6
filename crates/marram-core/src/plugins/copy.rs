//! Raw-copy compiler.

use crate::asset::SourceAsset;
use crate::error::{PackError, PackResult};
use crate::plugin::{Compiler, PackContext};
use async_trait::async_trait;

/// "Compiles" a source file by reading it verbatim.
///
/// The default compiler for `js` and `css`: plain sources need no
/// translation, only their dependency directives honored.
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyCompiler;

#[async_trait]
impl Compiler for CopyCompiler {
    fn name(&self) -> &'static str {
        "copy"
    }

    async fn compile(
        &self,
        mut asset: SourceAsset,
        _ctx: &PackContext,
    ) -> PackResult<SourceAsset> {
        asset.body = tokio::fs::read_to_string(&asset.path)
            .await
            .map_err(|e| PackError::io(&asset.path, &e))?;
        Ok(asset)
    }
}
