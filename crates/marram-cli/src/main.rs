#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::struct_excessive_bools)]

mod logging;
mod pipelines;
mod watch;

use clap::{Parser, ValueEnum};
use marram_core::plugins::{
    BannerPostprocessor, CopyCompiler, DirectiveAnalyzer, MergeLinker, StripMinifier,
};
use marram_core::{Packager, PackagerConfig};
use miette::{bail, miette, IntoDiagnostic, Result};
use pipelines::{Pipeline, PipelineOutcome, Pipelines};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "marram")]
#[command(author, version, about = "Incremental asset packager", long_about = None)]
struct Cli {
    /// Input source files (entry points)
    #[arg(required = true, value_name = "INPUT")]
    inputs: Vec<PathBuf>,

    /// Built-in plugin set to build with
    #[arg(long, value_enum, default_value = "script")]
    packager: PackagerKind,

    /// Named multi-stage pipeline (reserved)
    #[arg(long, value_name = "NAME")]
    pipeline: Option<String>,

    /// Output file, or directory when several inputs are built.
    /// Without it the built body goes to standard output.
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Rebuild outputs when source files change (requires --output)
    #[arg(long)]
    watch: bool,

    /// Minify the linked output
    #[arg(long)]
    minify: bool,

    /// Banner text to prepend to the output
    #[arg(long, value_name = "TEXT")]
    banner: Option<String>,

    /// Build and write every input, not just the first
    #[arg(long)]
    all: bool,

    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Emit JSON formatted result lines (stable, machine-readable)
    #[arg(long)]
    json: bool,

    /// Override the working directory
    #[arg(long, value_name = "PATH")]
    cwd: Option<PathBuf>,
}

/// Which built-in plugin set a pipeline starts from.
#[derive(ValueEnum, Clone, Copy, Debug)]
enum PackagerKind {
    /// `//= require` scripts (js, css copy compilers)
    Script,
    /// `/*= require */` stylesheets only
    Stylesheet,
}

impl PackagerKind {
    fn base_config(self) -> PackagerConfig {
        match self {
            Self::Script => PackagerConfig::new().with_defaults(),
            Self::Stylesheet => PackagerConfig::new()
                .compiler("css", Arc::new(CopyCompiler))
                .analyzer(Arc::new(DirectiveAnalyzer))
                .linker(Arc::new(MergeLinker)),
        }
    }
}

/// JSON output for one pipeline result.
#[derive(Serialize)]
struct BuildResultJson {
    ok: bool,
    input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
    size_bytes: usize,
    duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.json);

    if let Some(name) = &cli.pipeline {
        bail!("--pipeline '{name}' is not implemented");
    }
    if cli.watch && cli.output.is_none() {
        bail!("--watch requires --output");
    }

    let cwd = match &cli.cwd {
        Some(path) => path.clone(),
        None => std::env::current_dir().into_diagnostic()?,
    };
    let selected: Vec<PathBuf> = if cli.all {
        cli.inputs.clone()
    } else {
        cli.inputs.iter().take(1).cloned().collect()
    };

    let registry = build_registry(&cli, &selected, &cwd)?;
    let runtime = tokio::runtime::Runtime::new().into_diagnostic()?;

    let outcomes = runtime.block_on(registry.run_all());
    let failed = report(&outcomes, cli.json);

    if cli.watch {
        // A failing initial build stays in watch mode: the next save may
        // fix it.
        watch::run(&runtime, &registry, |outcomes| {
            report(outcomes, cli.json);
        })?;
    } else if failed {
        std::process::exit(1);
    }
    Ok(())
}

/// One pipeline per selected input, with output-path defaulting.
fn build_registry(cli: &Cli, selected: &[PathBuf], cwd: &Path) -> Result<Pipelines> {
    let multi = selected.len() > 1;
    let mut registry = Pipelines::new();

    for input in selected {
        let input_abs = if input.is_absolute() {
            input.clone()
        } else {
            cwd.join(input)
        };
        if !input_abs.is_file() {
            bail!("input not found: {}", input.display());
        }
        let file_name = input_abs
            .file_name()
            .ok_or_else(|| miette!("invalid input path: {}", input.display()))?
            .to_os_string();
        let basedir = input_abs
            .parent()
            .map_or_else(|| cwd.to_path_buf(), Path::to_path_buf);

        let output = cli.output.as_ref().map(|out| {
            let out_abs = if out.is_absolute() {
                out.clone()
            } else {
                cwd.join(out)
            };
            if multi || out_abs.is_dir() {
                out_abs.join(&file_name)
            } else {
                out_abs
            }
        });

        let mut config = cli
            .packager
            .base_config()
            .basedir(basedir)
            .main(file_name.to_string_lossy());
        if cli.minify {
            config = config.minify(true).minifier(Arc::new(StripMinifier));
        }
        if let Some(banner) = &cli.banner {
            config = config.postprocessor(Arc::new(BannerPostprocessor::new(banner.clone())));
        }
        if let Some(out) = &output {
            config = config.output(out);
        }

        registry.add(Pipeline {
            input: input.clone(),
            output,
            packager: Packager::new(config),
        });
    }
    Ok(registry)
}

/// Print per-pipeline results; returns true if any failed.
fn report(outcomes: &[PipelineOutcome], json: bool) -> bool {
    let mut failed = false;
    for outcome in outcomes {
        match &outcome.result {
            Ok(run) => {
                if json {
                    let line = BuildResultJson {
                        ok: true,
                        input: outcome.input.display().to_string(),
                        output: run.written.as_ref().map(|p| p.display().to_string()),
                        size_bytes: run.composite.body.len(),
                        duration_ms: run.duration_ms,
                        error: None,
                    };
                    println!("{}", serde_json::to_string(&line).unwrap());
                } else if let Some(written) = &run.written {
                    println!(
                        "  {} -> {} ({} bytes, {}ms)",
                        outcome.input.display(),
                        written.display(),
                        run.composite.body.len(),
                        run.duration_ms
                    );
                } else {
                    print!("{}", run.composite.body);
                }
            }
            Err(err) => {
                failed = true;
                if json {
                    let line = BuildResultJson {
                        ok: false,
                        input: outcome.input.display().to_string(),
                        output: None,
                        size_bytes: 0,
                        duration_ms: 0,
                        error: Some(err.to_string()),
                    };
                    println!("{}", serde_json::to_string(&line).unwrap());
                } else {
                    eprintln!("error: {err}");
                }
            }
        }
    }
    failed
}
