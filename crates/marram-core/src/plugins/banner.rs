//! Banner postprocessor.

use crate::asset::CompositeAsset;
use crate::error::PackResult;
use crate::plugin::{PackContext, Postprocessor};
use async_trait::async_trait;

/// Prepends a banner line to the linked body.
#[derive(Debug, Clone, Default)]
pub struct BannerPostprocessor {
    banner: String,
}

impl BannerPostprocessor {
    #[must_use]
    pub fn new(banner: impl Into<String>) -> Self {
        Self {
            banner: banner.into(),
        }
    }
}

#[async_trait]
impl Postprocessor for BannerPostprocessor {
    fn name(&self) -> &'static str {
        "banner"
    }

    async fn postprocess(
        &self,
        mut composite: CompositeAsset,
        _ctx: &PackContext,
    ) -> PackResult<CompositeAsset> {
        composite.body = format!("{}\n{}", self.banner, composite.body);
        Ok(composite)
    }
}
