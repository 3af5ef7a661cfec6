//! Concatenating linker.

use crate::asset::CompositeAsset;
use crate::error::PackResult;
use crate::plugin::{Linker, PackContext};
use async_trait::async_trait;

/// Links by expanding the dependency closure and joining bodies with a
/// newline, dependencies first.
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeLinker;

#[async_trait]
impl Linker for MergeLinker {
    fn name(&self) -> &'static str {
        "merge"
    }

    async fn link(
        &self,
        mut composite: CompositeAsset,
        ctx: &PackContext,
    ) -> PackResult<CompositeAsset> {
        let expanded = ctx.expand(&composite.assets).await?;
        composite.body = expanded
            .iter()
            .map(|asset| asset.body.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        Ok(composite)
    }
}
