use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use notify::event::{CreateKind, DataChange, MetadataKind, ModifyKind, RemoveKind, RenameMode};
use notify::EventKind;
use tempfile::TempDir;

use super::debouncer::Debouncer;
use super::types::{Action, ChangeKind, event_changes};
use super::{WatchScope, apply, run_until};
use crate::compiler::{CompileContext, remove_output, testing};

const STABILITY: Duration = Duration::from_millis(200);

fn make_event(paths: Vec<&str>, kind: EventKind) -> notify::Event {
    notify::Event {
        kind,
        paths: paths.into_iter().map(PathBuf::from).collect(),
        attrs: Default::default(),
    }
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

// ============================================================================
// Event flattening
// ============================================================================

#[test]
fn test_event_changes_by_kind() {
    let created = make_event(vec!["/s/a.mjml"], EventKind::Create(CreateKind::File));
    let modified = make_event(
        vec!["/s/b.mjml"],
        EventKind::Modify(ModifyKind::Data(DataChange::Content)),
    );
    let removed = make_event(vec!["/s/c.mjml"], EventKind::Remove(RemoveKind::File));

    assert_eq!(
        event_changes(&created),
        vec![(PathBuf::from("/s/a.mjml"), ChangeKind::Created)]
    );
    assert_eq!(
        event_changes(&modified),
        vec![(PathBuf::from("/s/b.mjml"), ChangeKind::Modified)]
    );
    assert_eq!(
        event_changes(&removed),
        vec![(PathBuf::from("/s/c.mjml"), ChangeKind::Removed)]
    );
}

#[test]
fn test_event_changes_ignores_metadata_and_access() {
    let metadata = make_event(
        vec!["/s/a.mjml"],
        EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime)),
    );
    let access = make_event(
        vec!["/s/a.mjml"],
        EventKind::Access(notify::event::AccessKind::Any),
    );

    assert!(event_changes(&metadata).is_empty());
    assert!(event_changes(&access).is_empty());
}

#[test]
fn test_event_changes_rename_both() {
    let event = make_event(
        vec!["/s/old.mjml", "/s/new.mjml"],
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
    );

    assert_eq!(
        event_changes(&event),
        vec![
            (PathBuf::from("/s/old.mjml"), ChangeKind::Removed),
            (PathBuf::from("/s/new.mjml"), ChangeKind::Created),
        ]
    );
}

#[test]
fn test_event_changes_rename_halves() {
    let from = make_event(
        vec!["/s/old.mjml"],
        EventKind::Modify(ModifyKind::Name(RenameMode::From)),
    );
    let to = make_event(
        vec!["/s/new.mjml"],
        EventKind::Modify(ModifyKind::Name(RenameMode::To)),
    );

    assert_eq!(event_changes(&from)[0].1, ChangeKind::Removed);
    assert_eq!(event_changes(&to)[0].1, ChangeKind::Created);
}

#[test]
fn test_change_kind_actions() {
    assert_eq!(ChangeKind::Created.action(), Action::Compile);
    assert_eq!(ChangeKind::Modified.action(), Action::Compile);
    assert_eq!(ChangeKind::Removed.action(), Action::Remove);
}

// ============================================================================
// Debouncer
// ============================================================================

#[test]
fn test_debouncer_empty() {
    let mut debouncer = Debouncer::new(STABILITY);
    assert!(debouncer.is_empty());
    assert!(debouncer.poll(Instant::now()).is_empty());
}

#[test]
fn test_debouncer_waits_for_quiet_period() {
    let mut debouncer = Debouncer::new(STABILITY);
    let t0 = Instant::now();
    debouncer.add(PathBuf::from("/gone/a.mjml"), ChangeKind::Removed, t0);

    assert!(debouncer.poll(t0 + ms(50)).is_empty());
    assert!(debouncer.poll(t0 + ms(150)).is_empty());

    let ready = debouncer.poll(t0 + ms(200));
    assert_eq!(ready, vec![(PathBuf::from("/gone/a.mjml"), ChangeKind::Removed)]);
    assert!(debouncer.is_empty());
}

#[test]
fn test_debouncer_new_event_restarts_timer() {
    let mut debouncer = Debouncer::new(STABILITY);
    let path = PathBuf::from("/gone/a.mjml");
    let t0 = Instant::now();

    debouncer.add(path.clone(), ChangeKind::Removed, t0);
    debouncer.add(path.clone(), ChangeKind::Removed, t0 + ms(150));

    assert!(debouncer.poll(t0 + ms(250)).is_empty());
    assert_eq!(debouncer.poll(t0 + ms(350)).len(), 1);
}

#[test]
fn test_debouncer_merges_per_path() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("a.mjml");
    fs::write(&path, "<mjml/>").unwrap();

    let mut debouncer = Debouncer::new(STABILITY);
    let t0 = Instant::now();
    debouncer.add(path.clone(), ChangeKind::Created, t0);
    debouncer.add(path.clone(), ChangeKind::Modified, t0);
    debouncer.add(path.clone(), ChangeKind::Modified, t0);

    assert_eq!(debouncer.len(), 1);
    assert_eq!(debouncer.poll(t0 + STABILITY), vec![(path, ChangeKind::Created)]);
}

#[test]
fn test_debouncer_removed_wins() {
    let mut debouncer = Debouncer::new(STABILITY);
    let path = PathBuf::from("/gone/a.mjml");
    let t0 = Instant::now();

    debouncer.add(path.clone(), ChangeKind::Modified, t0);
    debouncer.add(path.clone(), ChangeKind::Removed, t0);

    assert_eq!(debouncer.poll(t0 + STABILITY), vec![(path, ChangeKind::Removed)]);
}

#[test]
fn test_debouncer_restore_after_remove() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("a.mjml");
    fs::write(&path, "<mjml/>").unwrap();

    let mut debouncer = Debouncer::new(STABILITY);
    let t0 = Instant::now();
    debouncer.add(path.clone(), ChangeKind::Removed, t0);
    debouncer.add(path.clone(), ChangeKind::Created, t0);

    assert_eq!(debouncer.poll(t0 + STABILITY), vec![(path, ChangeKind::Created)]);
}

#[test]
fn test_debouncer_waits_while_file_grows() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("big.mjml");
    fs::write(&path, "<mjml>").unwrap();

    let mut debouncer = Debouncer::new(STABILITY);
    let t0 = Instant::now();
    debouncer.add(path.clone(), ChangeKind::Created, t0);

    // Write lands without a new event; the size change restarts the timer.
    fs::write(&path, "<mjml><mj-body></mj-body></mjml>").unwrap();
    assert!(debouncer.poll(t0 + ms(150)).is_empty());
    assert!(debouncer.poll(t0 + ms(300)).is_empty());

    assert_eq!(
        debouncer.poll(t0 + ms(350)),
        vec![(path, ChangeKind::Created)]
    );
}

#[test]
fn test_debouncer_vanished_file_becomes_removal() {
    let mut debouncer = Debouncer::new(STABILITY);
    let path = PathBuf::from("/gone/a.mjml");
    let t0 = Instant::now();
    debouncer.add(path.clone(), ChangeKind::Created, t0);

    assert_eq!(debouncer.poll(t0 + STABILITY), vec![(path, ChangeKind::Removed)]);
}

// ============================================================================
// Scope
// ============================================================================

fn sorted(mut changes: Vec<(PathBuf, ChangeKind)>) -> Vec<(PathBuf, ChangeKind)> {
    changes.sort_by(|a, b| a.0.cmp(&b.0));
    changes
}

#[test]
fn test_scope_keeps_source_files_only() {
    let temp = TempDir::new().unwrap();
    let (ctx, _) = testing::context(temp.path());
    let source = &ctx.config.build.source;
    let scope = WatchScope::new(source);
    let paths = ctx.paths();

    assert_eq!(
        scope.expand(&source.join("sub/a.mjml"), ChangeKind::Modified, &paths),
        vec![(source.join("sub/a.mjml"), ChangeKind::Modified)]
    );
    assert!(scope.expand(&source.join("a.txt"), ChangeKind::Created, &paths).is_empty());
    assert!(scope.expand(Path::new("/elsewhere/a.mjml"), ChangeKind::Created, &paths).is_empty());
}

#[test]
fn test_scope_rebases_canonical_paths() {
    let temp = TempDir::new().unwrap();
    let (ctx, _) = testing::context(temp.path());
    let source = &ctx.config.build.source;
    fs::create_dir_all(source).unwrap();
    let scope = WatchScope::new(source);

    let canonical = source.canonicalize().unwrap().join("a.mjml");
    assert_eq!(
        scope.expand(&canonical, ChangeKind::Created, &ctx.paths()),
        vec![(source.join("a.mjml"), ChangeKind::Created)]
    );
}

#[test]
fn test_scope_expands_new_directory() {
    let temp = TempDir::new().unwrap();
    let (ctx, _) = testing::context(temp.path());
    let source = &ctx.config.build.source;
    fs::create_dir_all(source.join("pack/deep")).unwrap();
    fs::write(source.join("pack/x.mjml"), "<mjml/>").unwrap();
    fs::write(source.join("pack/deep/y.mjml"), "<mjml/>").unwrap();
    fs::write(source.join("pack/notes.txt"), "x").unwrap();
    let scope = WatchScope::new(source);

    let changes = scope.expand(&source.join("pack"), ChangeKind::Created, &ctx.paths());

    assert_eq!(
        sorted(changes),
        vec![
            (source.join("pack/deep/y.mjml"), ChangeKind::Created),
            (source.join("pack/x.mjml"), ChangeKind::Created),
        ]
    );
}

#[test]
fn test_scope_removed_directory_yields_orphaned_outputs() {
    let temp = TempDir::new().unwrap();
    let (ctx, _) = testing::context(temp.path());
    let source = &ctx.config.build.source;
    let output = &ctx.config.build.output;
    fs::create_dir_all(source).unwrap();
    fs::create_dir_all(output.join("old")).unwrap();
    fs::write(output.join("old/a.html"), "x").unwrap();
    let scope = WatchScope::new(source);

    assert_eq!(
        scope.expand(&source.join("old"), ChangeKind::Removed, &ctx.paths()),
        vec![(source.join("old/a.mjml"), ChangeKind::Removed)]
    );
}

#[test]
fn test_scope_removed_file_passes_through() {
    let temp = TempDir::new().unwrap();
    let (ctx, _) = testing::context(temp.path());
    let source = &ctx.config.build.source;
    let scope = WatchScope::new(source);

    assert_eq!(
        scope.expand(&source.join("a.mjml"), ChangeKind::Removed, &ctx.paths()),
        vec![(source.join("a.mjml"), ChangeKind::Removed)]
    );
}

// ============================================================================
// Handlers
// ============================================================================

#[test]
fn test_added_file_compiles_once() {
    let temp = TempDir::new().unwrap();
    let (ctx, compiler) = testing::context(temp.path());
    let source = ctx.config.build.source.join("c.mjml");
    fs::create_dir_all(&ctx.config.build.source).unwrap();
    fs::write(&source, "<mjml>c</mjml>").unwrap();

    let mut debouncer = Debouncer::new(STABILITY);
    let t0 = Instant::now();
    debouncer.add(source.clone(), ChangeKind::Created, t0);
    debouncer.add(source.clone(), ChangeKind::Modified, t0 + ms(10));

    for (path, kind) in debouncer.poll(t0 + ms(300)) {
        apply(&ctx, &path, kind);
    }

    assert_eq!(compiler.calls(), 1);
    assert_eq!(
        fs::read_to_string(ctx.config.build.output.join("c.html")).unwrap(),
        "<html><mjml>c</mjml></html>"
    );
}

#[test]
fn test_deleted_file_removes_output() {
    let temp = TempDir::new().unwrap();
    let (ctx, compiler) = testing::context(temp.path());
    let source = ctx.config.build.source.join("a.mjml");
    let output = ctx.config.build.output.join("a.html");
    fs::create_dir_all(&ctx.config.build.output).unwrap();
    fs::write(&output, "<html/>").unwrap();

    apply(&ctx, &source, ChangeKind::Removed);

    assert!(!output.exists());
    assert_eq!(compiler.calls(), 0);
}

// ============================================================================
// Watch loop
// ============================================================================

/// `run_until` on its own thread and runtime, stopped by a flag.
struct WatchRun {
    stop: Arc<AtomicBool>,
    handle: std::thread::JoinHandle<anyhow::Result<()>>,
}

impl WatchRun {
    fn start(ctx: &CompileContext) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let handle = {
            let stop = Arc::clone(&stop);
            let ctx = ctx.clone();
            std::thread::spawn(move || {
                let runtime = tokio::runtime::Builder::new_multi_thread()
                    .enable_all()
                    .build()
                    .unwrap();
                runtime.block_on(run_until(ctx, move || stop.load(Ordering::SeqCst)))
            })
        };
        // Give the watcher time to attach before touching files.
        std::thread::sleep(ms(300));
        Self { stop, handle }
    }

    fn finish(self) {
        // Let any straggling events settle
        std::thread::sleep(ms(500));
        self.stop.store(true, Ordering::SeqCst);
        self.handle.join().unwrap().unwrap();
    }
}

fn wait_until(condition: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !condition() && Instant::now() < deadline {
        std::thread::sleep(ms(50));
    }
}

#[test]
fn test_watch_loop_compiles_new_file() {
    let temp = TempDir::new().unwrap();
    let (ctx, compiler) = testing::context(temp.path());
    let source_dir = ctx.config.build.source.clone();
    let output = ctx.config.build.output.join("sub/c.html");
    fs::create_dir_all(source_dir.join("sub")).unwrap();

    let run = WatchRun::start(&ctx);
    fs::write(source_dir.join("sub/c.mjml"), "<mjml>c</mjml>").unwrap();
    wait_until(|| output.exists());
    run.finish();

    assert_eq!(fs::read_to_string(&output).unwrap(), "<html><mjml>c</mjml></html>");
    assert_eq!(compiler.calls(), 1);
}

#[test]
fn test_watch_loop_removes_output_of_deleted_file() {
    let temp = TempDir::new().unwrap();
    let (ctx, compiler) = testing::context(temp.path());
    let source = ctx.config.build.source.join("a.mjml");
    let output = ctx.config.build.output.join("a.html");
    let other = ctx.config.build.output.join("b.html");
    fs::create_dir_all(&ctx.config.build.source).unwrap();
    fs::create_dir_all(&ctx.config.build.output).unwrap();
    fs::write(&source, "<mjml>a</mjml>").unwrap();
    fs::write(ctx.config.build.source.join("b.mjml"), "<mjml>b</mjml>").unwrap();
    fs::write(&output, "<html>a</html>").unwrap();
    fs::write(&other, "<html>b</html>").unwrap();

    let run = WatchRun::start(&ctx);
    fs::remove_file(&source).unwrap();
    wait_until(|| !output.exists());
    run.finish();

    assert!(!output.exists());
    assert!(other.exists());
    assert_eq!(compiler.calls(), 0);
    // Nothing left to remove a second time
    assert!(!remove_output(&ctx, &source));
}

#[test]
fn test_watch_loop_compiles_directory_moved_in() {
    let temp = TempDir::new().unwrap();
    let (ctx, compiler) = testing::context(temp.path());
    let staging = temp.path().join("staging/pack");
    let output = ctx.config.build.output.join("pack/x.html");
    fs::create_dir_all(&ctx.config.build.source).unwrap();
    fs::create_dir_all(&staging).unwrap();
    fs::write(staging.join("x.mjml"), "<mjml>x</mjml>").unwrap();
    fs::write(staging.join("notes.txt"), "not a template").unwrap();

    let run = WatchRun::start(&ctx);
    fs::rename(&staging, ctx.config.build.source.join("pack")).unwrap();
    wait_until(|| output.exists());
    run.finish();

    assert_eq!(fs::read_to_string(&output).unwrap(), "<html><mjml>x</mjml></html>");
    assert_eq!(compiler.calls(), 1);
}

#[test]
fn test_watch_loop_removes_outputs_of_directory_moved_out() {
    let temp = TempDir::new().unwrap();
    let (ctx, compiler) = testing::context(temp.path());
    let source = &ctx.config.build.source;
    let dist = &ctx.config.build.output;
    fs::create_dir_all(source.join("sub")).unwrap();
    fs::create_dir_all(dist.join("sub")).unwrap();
    fs::create_dir_all(temp.path().join("away")).unwrap();
    fs::write(source.join("sub/y.mjml"), "<mjml>y</mjml>").unwrap();
    fs::write(source.join("keep.mjml"), "<mjml>k</mjml>").unwrap();
    fs::write(dist.join("sub/y.html"), "<html>y</html>").unwrap();
    fs::write(dist.join("keep.html"), "<html>k</html>").unwrap();

    let run = WatchRun::start(&ctx);
    fs::rename(source.join("sub"), temp.path().join("away/sub")).unwrap();
    wait_until(|| !dist.join("sub/y.html").exists());
    run.finish();

    assert!(!dist.join("sub/y.html").exists());
    assert!(dist.join("keep.html").exists());
    assert_eq!(compiler.calls(), 0);
}
