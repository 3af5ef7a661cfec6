//! Integration tests for the packager engine: cache coalescing, build
//! memoization, closure ordering, cycle handling, and invalidation.

use async_trait::async_trait;
use marram_core::plugins::{CopyCompiler, MergeLinker, StripMinifier};
use marram_core::{
    Compiler, CompositeAsset, Linker, PackContext, PackError, PackResult, Packager,
    PackagerConfig, SourceAsset,
};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::{tempdir, TempDir};

/// Compiler that counts invocations and optionally dwells, to widen the
/// window in which concurrent requests can pile up.
struct CountingCompiler {
    count: Arc<AtomicUsize>,
    delay: Duration,
}

#[async_trait]
impl Compiler for CountingCompiler {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn compile(&self, asset: SourceAsset, ctx: &PackContext) -> PackResult<SourceAsset> {
        self.count.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        CopyCompiler.compile(asset, ctx).await
    }
}

/// Linker that counts invocations around the default merge.
struct CountingLinker {
    count: Arc<AtomicUsize>,
}

#[async_trait]
impl Linker for CountingLinker {
    fn name(&self) -> &'static str {
        "counting-merge"
    }

    async fn link(
        &self,
        composite: CompositeAsset,
        ctx: &PackContext,
    ) -> PackResult<CompositeAsset> {
        self.count.fetch_add(1, Ordering::SeqCst);
        MergeLinker.link(composite, ctx).await
    }
}

fn write_file(dir: &TempDir, name: &str, content: &str) {
    fs::write(dir.path().join(name), content).unwrap();
}

fn default_packager(dir: &TempDir, main: &str) -> Packager {
    Packager::new(
        PackagerConfig::new()
            .basedir(dir.path())
            .main(main)
            .with_defaults(),
    )
}

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_requests_compile_once() {
    let dir = tempdir().unwrap();
    write_file(&dir, "shared.js", "s;");

    let count = Arc::new(AtomicUsize::new(0));
    let packager = Packager::new(
        PackagerConfig::new()
            .basedir(dir.path())
            .compiler(
                "js",
                Arc::new(CountingCompiler {
                    count: Arc::clone(&count),
                    delay: Duration::from_millis(50),
                }),
            )
            .with_defaults(),
    );
    let ctx = packager.context();
    let path = ctx.resolve("shared", None).unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let ctx = ctx.clone();
        let path = path.clone();
        handles.push(tokio::spawn(
            async move { ctx.get_source_asset(&path).await },
        ));
    }

    let mut assets = Vec::new();
    for handle in handles {
        assets.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(count.load(Ordering::SeqCst), 1);
    for asset in &assets[1..] {
        assert!(Arc::ptr_eq(&assets[0], asset));
    }
}

#[tokio::test]
async fn test_build_is_memoized_per_instance() {
    let dir = tempdir().unwrap();
    write_file(&dir, "a.js", "a;");

    let links = Arc::new(AtomicUsize::new(0));
    let packager = Packager::new(
        PackagerConfig::new()
            .basedir(dir.path())
            .main("a")
            .linker(Arc::new(CountingLinker {
                count: Arc::clone(&links),
            }))
            .with_defaults(),
    );

    let first = packager.build().await.unwrap();
    let second = packager.build().await.unwrap();

    assert_eq!(links.load(Ordering::SeqCst), 1);
    assert!(Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn test_diamond_closure_order() {
    let dir = tempdir().unwrap();
    write_file(&dir, "a.js", "//= require b\n//= require c\na;");
    write_file(&dir, "b.js", "//= require d\nb;");
    write_file(&dir, "c.js", "//= require d\nc;");
    write_file(&dir, "d.js", "d;");

    let composite = default_packager(&dir, "a").build().await.unwrap();

    assert_eq!(composite.body, "d;\nb;\nc;\na;");
    assert_eq!(composite.body.matches("d;").count(), 1);
}

#[tokio::test]
async fn test_mutual_cycle_terminates() {
    let dir = tempdir().unwrap();
    write_file(&dir, "a.js", "//= require b\na;");
    write_file(&dir, "b.js", "//= require a\nb;");

    let composite = tokio::time::timeout(
        Duration::from_secs(5),
        default_packager(&dir, "a").build(),
    )
    .await
    .expect("cyclic build must terminate")
    .unwrap();

    // Truncated inclusion: both members once, back-edge dropped.
    assert_eq!(composite.body.matches("a;").count(), 1);
    assert_eq!(composite.body.matches("b;").count(), 1);
}

#[tokio::test]
async fn test_self_cycle_terminates() {
    let dir = tempdir().unwrap();
    write_file(&dir, "a.js", "//= require a\na;");

    let composite = tokio::time::timeout(
        Duration::from_secs(5),
        default_packager(&dir, "a").build(),
    )
    .await
    .expect("self-referential build must terminate")
    .unwrap();

    assert_eq!(composite.body, "a;");
}

#[tokio::test]
async fn test_invalidate_picks_up_changed_file() {
    let dir = tempdir().unwrap();
    write_file(&dir, "a.js", "old;");

    let packager = default_packager(&dir, "a");
    assert_eq!(packager.build().await.unwrap().body, "old;");

    write_file(&dir, "a.js", "new;");

    // Without invalidation the memoized result is served.
    assert_eq!(packager.build().await.unwrap().body, "old;");

    packager.invalidate();
    assert_eq!(packager.build().await.unwrap().body, "new;");
}

#[tokio::test]
async fn test_merge_links_dependency_first() {
    let dir = tempdir().unwrap();
    write_file(&dir, "a.js", "//= require b\na;");
    write_file(&dir, "b.js", "b;");

    let composite = default_packager(&dir, "a").build().await.unwrap();
    assert_eq!(composite.body, "b;\na;");
}

#[tokio::test]
async fn test_multiple_mains_preserve_order() {
    let dir = tempdir().unwrap();
    write_file(&dir, "x.js", "x;");
    write_file(&dir, "y.js", "//= require x\ny;");

    let packager = Packager::new(
        PackagerConfig::new()
            .basedir(dir.path())
            .main("y")
            .main("x")
            .with_defaults(),
    );
    let composite = packager.build().await.unwrap();

    // y's dependency x is hoisted before y; the second root x is already
    // scheduled and keeps its first-seen position.
    assert_eq!(composite.body, "x;\ny;");
    assert_eq!(composite.assets.len(), 2);
}

#[tokio::test]
async fn test_minify_without_minifier_fails_before_linking() {
    let dir = tempdir().unwrap();
    write_file(&dir, "a.js", "a;");

    let links = Arc::new(AtomicUsize::new(0));
    let packager = Packager::new(
        PackagerConfig::new()
            .basedir(dir.path())
            .main("a")
            .minify(true)
            .linker(Arc::new(CountingLinker {
                count: Arc::clone(&links),
            }))
            .with_defaults(),
    );

    let err = packager.build().await.unwrap_err();
    assert!(matches!(err, PackError::Configuration(_)));
    assert_eq!(links.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_failed_build_writes_nothing() {
    let dir = tempdir().unwrap();
    write_file(&dir, "a.js", "a;");
    let out = dir.path().join("dist/app.js");

    let packager = Packager::new(
        PackagerConfig::new()
            .basedir(dir.path())
            .main("a")
            .minify(true)
            .output(&out)
            .with_defaults(),
    );

    packager.write().await.unwrap_err();
    assert!(!out.exists());
}

#[tokio::test]
async fn test_minify_strips_whitespace_end_to_end() {
    let dir = tempdir().unwrap();
    write_file(&dir, "a.js", "//= require b\n\na;   ");
    write_file(&dir, "b.js", "b;\n\n");

    let packager = Packager::new(
        PackagerConfig::new()
            .basedir(dir.path())
            .main("a")
            .minify(true)
            .minifier(Arc::new(StripMinifier))
            .with_defaults(),
    );

    assert_eq!(packager.build().await.unwrap().body, "b;\na;");
}

#[tokio::test]
async fn test_postprocessors_run_in_order_after_minify() {
    use marram_core::plugins::BannerPostprocessor;

    let dir = tempdir().unwrap();
    write_file(&dir, "a.js", "a;\n\n");

    let packager = Packager::new(
        PackagerConfig::new()
            .basedir(dir.path())
            .main("a")
            .minify(true)
            .minifier(Arc::new(StripMinifier))
            .postprocessor(Arc::new(BannerPostprocessor::new("// inner")))
            .postprocessor(Arc::new(BannerPostprocessor::new("// outer")))
            .with_defaults(),
    );

    // Each postprocessor prepends, so the last registered ends up on top,
    // and both run after the minifier has stripped the blank line.
    let composite = packager.build().await.unwrap();
    assert_eq!(composite.body, "// outer\n// inner\na;");
}

#[tokio::test]
async fn test_write_creates_parent_directories() {
    let dir = tempdir().unwrap();
    write_file(&dir, "a.js", "a;");
    let out = dir.path().join("deep/nested/app.js");

    let packager = Packager::new(
        PackagerConfig::new()
            .basedir(dir.path())
            .main("a")
            .output(&out)
            .with_defaults(),
    );

    let written = packager.write().await.unwrap();
    assert_eq!(written, out);
    assert_eq!(fs::read_to_string(&out).unwrap(), "a;");
}

#[tokio::test]
async fn test_write_without_output_path_is_configuration_error() {
    let dir = tempdir().unwrap();
    write_file(&dir, "a.js", "a;");

    let err = default_packager(&dir, "a").write().await.unwrap_err();
    assert!(matches!(err, PackError::Configuration(_)));
}

#[tokio::test]
async fn test_missing_main_is_configuration_error() {
    let packager = Packager::new(PackagerConfig::new().with_defaults());
    let err = packager.build().await.unwrap_err();
    assert!(matches!(err, PackError::Configuration(_)));
}

#[tokio::test]
async fn test_missing_linker_is_configuration_error() {
    let dir = tempdir().unwrap();
    write_file(&dir, "a.js", "a;");

    let packager = Packager::new(
        PackagerConfig::new()
            .basedir(dir.path())
            .main("a")
            .compiler("js", Arc::new(CopyCompiler)),
    );
    let err = packager.build().await.unwrap_err();
    assert!(matches!(err, PackError::Configuration(_)));
}

#[tokio::test]
async fn test_unresolvable_dependency_aborts_build() {
    let dir = tempdir().unwrap();
    write_file(&dir, "a.js", "//= require missing\na;");

    let err = default_packager(&dir, "a").build().await.unwrap_err();
    assert!(matches!(err, PackError::Resolution { .. }));
}

#[tokio::test]
async fn test_failed_entry_replays_until_invalidate() {
    let dir = tempdir().unwrap();
    write_file(&dir, "a.js", "//= require dep\na;");

    let count = Arc::new(AtomicUsize::new(0));
    let packager = Packager::new(
        PackagerConfig::new()
            .basedir(dir.path())
            .main("a")
            .compiler(
                "js",
                Arc::new(CountingCompiler {
                    count: Arc::clone(&count),
                    delay: Duration::ZERO,
                }),
            )
            .with_defaults(),
    );

    assert!(matches!(
        packager.build().await.unwrap_err(),
        PackError::Resolution { .. }
    ));
    let compiles_after_failure = count.load(Ordering::SeqCst);

    // The missing dependency now exists, but the failed entries are
    // memoized: the same error replays without recompiling anything.
    write_file(&dir, "dep.js", "d;");
    assert!(matches!(
        packager.build().await.unwrap_err(),
        PackError::Resolution { .. }
    ));
    assert_eq!(count.load(Ordering::SeqCst), compiles_after_failure);

    packager.invalidate();
    assert_eq!(packager.build().await.unwrap().body, "d;\na;");
}

#[tokio::test]
async fn test_shared_dependency_compiled_once_across_roots() {
    let dir = tempdir().unwrap();
    write_file(&dir, "a.js", "//= require shared\na;");
    write_file(&dir, "b.js", "//= require shared\nb;");
    write_file(&dir, "shared.js", "s;");

    let count = Arc::new(AtomicUsize::new(0));
    let packager = Packager::new(
        PackagerConfig::new()
            .basedir(dir.path())
            .main("a")
            .main("b")
            .compiler(
                "js",
                Arc::new(CountingCompiler {
                    count: Arc::clone(&count),
                    delay: Duration::ZERO,
                }),
            )
            .with_defaults(),
    );

    let composite = packager.build().await.unwrap();
    assert_eq!(composite.body, "s;\na;\nb;");
    // a, b, shared: one compile each.
    assert_eq!(count.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_stylesheet_directives() {
    let dir = tempdir().unwrap();
    write_file(&dir, "site.css", "/*= require base */\nbody { color: red; }");
    write_file(&dir, "base.css", "* { margin: 0; }");

    let composite = default_packager(&dir, "site").build().await.unwrap();
    assert_eq!(composite.body, "* { margin: 0; }\nbody { color: red; }");
}

#[tokio::test]
async fn test_facade_resolve_respects_registered_extensions() {
    let dir = tempdir().unwrap();
    write_file(&dir, "a.js", "a;");
    write_file(&dir, "a.txt", "not an asset");

    let packager = default_packager(&dir, "a");
    let resolved = packager.resolve("a", None).unwrap();
    assert_eq!(resolved.file_name().unwrap(), "a.js");

    let err = packager.resolve("b", Some(dir.path())).unwrap_err();
    assert!(matches!(err, PackError::Resolution { .. }));
}

/// Dependencies of dependencies resolve relative to their own file, not the
/// packager basedir.
#[tokio::test]
async fn test_nested_directory_resolution() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("lib")).unwrap();
    write_file(&dir, "app.js", "//= require lib/entry\napp;");
    fs::write(
        dir.path().join("lib/entry.js"),
        "//= require helper\nentry;",
    )
    .unwrap();
    fs::write(dir.path().join("lib/helper.js"), "helper;").unwrap();

    let composite = default_packager(&dir, "app").build().await.unwrap();
    assert_eq!(composite.body, "helper;\nentry;\napp;");
}

#[tokio::test]
async fn test_composite_exposes_roots_not_closure() {
    let dir = tempdir().unwrap();
    write_file(&dir, "a.js", "//= require b\na;");
    write_file(&dir, "b.js", "b;");

    let composite = default_packager(&dir, "a").build().await.unwrap();
    assert_eq!(composite.assets.len(), 1);
    assert!(composite.assets[0].path.ends_with(Path::new("a.js")));
    assert_eq!(composite.assets[0].dependencies.len(), 1);
}
