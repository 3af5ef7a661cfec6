//! Dependency closure expansion.
//!
//! Turns an ordered list of root assets into the complete, de-duplicated
//! build list: every transitively reachable asset followed by its
//! dependents (dependency-first, post-order), suitable for naive textual
//! concatenation by a linker.
//!
//! The traversal is iterative — an explicit Enter/Exit work stack plus a
//! seen set — so deep graphs cannot overflow the call stack and the cycle
//! policy is explicit: an asset is marked seen when first entered, before
//! its dependencies are expanded, so a dependency cycle drops the back-edge
//! and the traversal terminates with the cycle members included once each
//! ("truncated inclusion"). Ordering within a cycle follows first-seen
//! traversal order.
//!
//! Ordering is otherwise deterministic: stable with respect to root order
//! and declaration order of dependencies. For a diamond A→{B,C}, B→D, C→D
//! the result is [D, B, C, A] with D appearing exactly once.

use crate::asset::SourceAsset;
use crate::error::PackResult;
use crate::plugin::PackContext;
use rustc_hash::FxHashSet;
use std::path::PathBuf;
use std::sync::Arc;

enum Visit {
    Enter(Arc<SourceAsset>),
    Exit(Arc<SourceAsset>),
}

/// Expand `roots` into the ordered dependency closure.
///
/// Dependencies are fetched through the memoizing cache, left to right;
/// the first resolution or compilation error aborts the whole expansion.
pub async fn expand(
    roots: &[Arc<SourceAsset>],
    ctx: &PackContext,
) -> PackResult<Vec<Arc<SourceAsset>>> {
    let mut seen: FxHashSet<PathBuf> = FxHashSet::default();
    let mut expanded: Vec<Arc<SourceAsset>> = Vec::new();
    let mut stack: Vec<Visit> = roots.iter().rev().cloned().map(Visit::Enter).collect();

    while let Some(visit) = stack.pop() {
        match visit {
            Visit::Enter(asset) => {
                if !seen.insert(asset.path.clone()) {
                    // Already scheduled; keeps the position of the first
                    // encounter and breaks dependency cycles.
                    continue;
                }
                if asset.dependencies.is_empty() {
                    expanded.push(asset);
                    continue;
                }
                stack.push(Visit::Exit(Arc::clone(&asset)));
                for dep in asset.dependencies.iter().rev() {
                    let dep_asset = ctx.get_source_asset(dep).await?;
                    stack.push(Visit::Enter(dep_asset));
                }
            }
            Visit::Exit(asset) => expanded.push(asset),
        }
    }

    Ok(expanded)
}
