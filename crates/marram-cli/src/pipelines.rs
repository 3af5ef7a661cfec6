//! Multi-output pipeline registry.
//!
//! One [`Pipeline`] per input file: its packager plus the output target.
//! The registry runs them in registration order (so stdout output is
//! deterministic) and offers bulk invalidation for the watch driver.

use marram_core::{CompositeAsset, PackResult, Packager};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// One input's packager and where its output goes.
pub struct Pipeline {
    /// The input file this pipeline was registered for.
    pub input: PathBuf,
    /// Output file; `None` streams the body to stdout.
    pub output: Option<PathBuf>,
    pub packager: Packager,
}

/// What one pipeline run produced.
pub struct RunOutput {
    pub composite: Arc<CompositeAsset>,
    /// Path written, when the pipeline has a file output.
    pub written: Option<PathBuf>,
    pub duration_ms: u64,
}

/// Outcome of one pipeline within a `run_all`.
pub struct PipelineOutcome {
    pub input: PathBuf,
    pub result: PackResult<RunOutput>,
}

impl Pipeline {
    /// Build, then write to the output file or hand back the body.
    pub async fn run(&self) -> PackResult<RunOutput> {
        let start = Instant::now();
        let written = match &self.output {
            Some(out) => {
                self.packager.write_to(out).await?;
                Some(out.clone())
            }
            None => None,
        };
        let composite = self.packager.build().await?;
        Ok(RunOutput {
            composite,
            written,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

/// Ordered set of pipelines built from the CLI inputs.
#[derive(Default)]
pub struct Pipelines {
    entries: Vec<Pipeline>,
}

impl Pipelines {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, pipeline: Pipeline) {
        self.entries.push(pipeline);
    }

    #[must_use]
    pub fn entries(&self) -> &[Pipeline] {
        &self.entries
    }

    /// Invalidate every pipeline's caches; the next run recomputes all.
    pub fn invalidate_all(&self) {
        for pipeline in &self.entries {
            pipeline.packager.invalidate();
        }
    }

    /// Run every pipeline in order, collecting per-pipeline outcomes.
    /// A failing pipeline does not stop the others.
    pub async fn run_all(&self) -> Vec<PipelineOutcome> {
        let mut outcomes = Vec::with_capacity(self.entries.len());
        for pipeline in &self.entries {
            outcomes.push(PipelineOutcome {
                input: pipeline.input.clone(),
                result: pipeline.run().await,
            });
        }
        outcomes
    }

    /// True if `path` is one of the registered output files. The watch
    /// driver uses this to ignore events caused by its own writes.
    #[must_use]
    pub fn is_own_output(&self, path: &std::path::Path) -> bool {
        self.entries
            .iter()
            .filter_map(|p| p.output.as_ref())
            .any(|out| out == path || canonical_eq(out, path))
    }
}

/// Compare two paths canonically when possible; freshly-written outputs
/// always exist, so canonicalization normally succeeds.
fn canonical_eq(a: &std::path::Path, b: &std::path::Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(ca), Ok(cb)) => ca == cb,
        _ => false,
    }
}
