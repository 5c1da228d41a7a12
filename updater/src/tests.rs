//! 업데이터 단위 테스트
//!
//! ## 테스트 시나리오
//! 1. 매니페스트: 분리 규칙, 누락/읽기 실패
//! 2. 동기화: 삭제/복사 단계, 파일별 실패 누적, 진행률
//! 3. 대기 스케줄러: tick 횟수, 권한 확인 1회, 0ms 대기
//!
//! 모든 테스트는 `tempdir`을 사용해 파일시스템을 격리합니다.

use crate::manifest::{load_manifest, manifest_path, Manifest};
use crate::progress::{NullReporter, RecordingReporter};
use crate::scheduler::{TickOutcome, WaitScheduler};
use crate::progress::ProgressEvent;
use crate::sync::{apply_update, copy_files, delete_files, resolve_entry, CopyPolicy, SyncPhase};
use crate::UpdaterError;
use std::cell::Cell;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

// ═══════════════════════════════════════════════════════
// 매니페스트
// ═══════════════════════════════════════════════════════

#[test]
fn test_manifest_split_keeps_order_and_duplicates() {
    let m = Manifest::parse("b.txt\na.txt\n\nb.txt\n");
    assert_eq!(m.lines(), &["b.txt", "a.txt", "", "b.txt", ""]);
    assert_eq!(m.entries().collect::<Vec<_>>(), vec!["b.txt", "a.txt", "b.txt"]);
    assert_eq!(m.entry_count(), 3);
}

#[test]
fn test_manifest_no_trimming() {
    let m = Manifest::parse(" spaced.txt \r\nnext");
    assert_eq!(m.entries().collect::<Vec<_>>(), vec![" spaced.txt \r", "next"]);
}

#[test]
fn test_load_manifest_missing() {
    let dir = TempDir::new().unwrap();
    let rec = RecordingReporter::new();

    let err = load_manifest(dir.path(), &rec).unwrap_err();
    match err {
        UpdaterError::ManifestMissing { path } => assert_eq!(path, manifest_path(dir.path())),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(
        rec.infos(),
        vec!["Looking for filelist.lst file", "Could not find filelist.lst file"]
    );
}

#[test]
fn test_load_manifest_unreadable() {
    let dir = TempDir::new().unwrap();
    // 디렉터리는 존재하지만 파일로 읽을 수 없음
    fs::create_dir(manifest_path(dir.path())).unwrap();

    let err = load_manifest(dir.path(), &NullReporter).unwrap_err();
    assert!(matches!(err, UpdaterError::ManifestUnreadable { .. }), "{:?}", err);
}

#[test]
fn test_load_manifest_unstatable_is_unreadable() {
    let dir = TempDir::new().unwrap();
    // 경로 중간 요소가 파일이면 stat 자체가 NotFound 가 아닌 에러로 실패
    write(dir.path(), "plain", "not a directory");
    let rec = RecordingReporter::new();

    let err = load_manifest(&dir.path().join("plain"), &rec).unwrap_err();
    assert!(matches!(err, UpdaterError::ManifestUnreadable { .. }), "{:?}", err);
    assert_eq!(
        rec.infos(),
        vec!["Looking for filelist.lst file", "Could not open filelist.lst file"]
    );
}

#[test]
fn test_load_manifest_replaces_invalid_utf8() {
    let dir = TempDir::new().unwrap();
    fs::write(manifest_path(dir.path()), b"a.txt\ncaf\xe9.txt\nz.txt").unwrap();

    let m = load_manifest(dir.path(), &NullReporter).unwrap();
    assert_eq!(
        m.entries().collect::<Vec<_>>(),
        vec!["a.txt", "caf\u{FFFD}.txt", "z.txt"]
    );
}

#[test]
fn test_load_manifest_ok() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "filelist.lst", "a.txt\nsub/b.bin\n");

    let m = load_manifest(dir.path(), &NullReporter).unwrap();
    assert_eq!(m.entries().collect::<Vec<_>>(), vec!["a.txt", "sub/b.bin"]);
}

// ═══════════════════════════════════════════════════════
// 동기화
// ═══════════════════════════════════════════════════════

#[test]
fn test_resolve_entry_rejects_escapes() {
    let root = Path::new("/opt/app");
    assert_eq!(resolve_entry(root, "lib/a.so").unwrap(), root.join("lib/a.so"));
    assert!(resolve_entry(root, "../etc/passwd").is_err());
    assert!(resolve_entry(root, "lib/../../x").is_err());
    assert!(resolve_entry(root, "/etc/passwd").is_err());
}

#[test]
fn test_delete_phase_records_missing_files() {
    let dest = TempDir::new().unwrap();
    write(dest.path(), "old.tmp", "x");
    let manifest = Manifest::from_entries(["old.tmp", "gone.tmp"]);
    let rec = RecordingReporter::new();

    let report = delete_files(&manifest, dest.path(), &rec);

    assert_eq!(report.total, 2);
    assert_eq!(report.processed, 2);
    assert!(!report.succeeded());
    assert_eq!(report.failures(), vec!["gone.tmp"]);
    assert!(!dest.path().join("old.tmp").exists());
    assert_eq!(rec.progress_values(), vec![50, 100]);
    assert!(rec
        .infos()
        .iter()
        .any(|i| i == "The following files failed to be deleted:\ngone.tmp\n"));
}

#[test]
fn test_copy_phase_creates_parent_dirs() {
    let origin = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    write(origin.path(), "a.txt", "alpha");
    write(origin.path(), "sub/deeper/b.bin", "beta");
    let manifest = Manifest::parse("a.txt\nsub/deeper/b.bin\n");

    let report = copy_files(&manifest, origin.path(), dest.path(), CopyPolicy::FailIfExists, &NullReporter);

    assert!(report.succeeded());
    assert_eq!(fs::read_to_string(dest.path().join("sub/deeper/b.bin")).unwrap(), "beta");
}

#[test]
fn test_copy_fail_if_exists_policy() {
    let origin = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    write(origin.path(), "conf.ini", "new");
    write(dest.path(), "conf.ini", "old");
    let manifest = Manifest::from_entries(["conf.ini"]);

    let report = copy_files(&manifest, origin.path(), dest.path(), CopyPolicy::FailIfExists, &NullReporter);

    assert_eq!(report.failures(), vec!["conf.ini"]);
    assert_eq!(fs::read_to_string(dest.path().join("conf.ini")).unwrap(), "old");
}

#[test]
fn test_copy_overwrite_policy() {
    let origin = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    write(origin.path(), "conf.ini", "new");
    write(dest.path(), "conf.ini", "old");
    let manifest = Manifest::from_entries(["conf.ini"]);

    let report = copy_files(&manifest, origin.path(), dest.path(), CopyPolicy::Overwrite, &NullReporter);

    assert!(report.succeeded());
    assert_eq!(fs::read_to_string(dest.path().join("conf.ini")).unwrap(), "new");
}

#[test]
fn test_copy_missing_source_does_not_stop_batch() {
    let origin = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    write(origin.path(), "a.txt", "a");
    write(origin.path(), "c.txt", "c");
    let manifest = Manifest::from_entries(["a.txt", "missing.txt", "c.txt"]);

    let report = copy_files(&manifest, origin.path(), dest.path(), CopyPolicy::FailIfExists, &NullReporter);

    assert_eq!(report.processed, 3);
    assert_eq!(report.failures(), vec!["missing.txt"]);
    assert!(dest.path().join("a.txt").exists());
    assert!(dest.path().join("c.txt").exists());
}

#[test]
fn test_empty_manifest_emits_no_progress() {
    let origin = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    let rec = RecordingReporter::new();

    let result = apply_update(
        &Manifest::parse("\n\n"),
        &Manifest::parse(""),
        origin.path(),
        dest.path(),
        CopyPolicy::FailIfExists,
        &rec,
        |_| {},
    );

    assert!(result.succeeded());
    assert_eq!(result.delete.total, 0);
    assert_eq!(result.copy.total, 0);
    assert!(rec.progress_values().is_empty());
}

#[test]
fn test_progress_monotonic_and_ends_at_100() {
    let origin = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    let names: Vec<String> = (0..7).map(|i| format!("f{}.dat", i)).collect();
    for n in &names {
        write(origin.path(), n, n);
    }
    // 빈 줄은 분모에 포함되지 않음
    let manifest = Manifest::parse(&format!("{}\n\n", names.join("\n")));
    let rec = RecordingReporter::new();

    copy_files(&manifest, origin.path(), dest.path(), CopyPolicy::FailIfExists, &rec);

    let values = rec.progress_values();
    assert_eq!(values.len(), 7);
    assert!(values.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(*values.last().unwrap(), 100);
}

#[test]
fn test_delete_failure_still_runs_copy_phase() {
    let origin = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    write(origin.path(), "new.txt", "n");

    let result = apply_update(
        &Manifest::from_entries(["never-existed.txt"]),
        &Manifest::from_entries(["new.txt"]),
        origin.path(),
        dest.path(),
        CopyPolicy::FailIfExists,
        &NullReporter,
        |_| {},
    );

    assert!(!result.delete_succeeded());
    assert!(result.copy_succeeded());
    assert!(!result.succeeded());
    assert!(dest.path().join("new.txt").exists());
}

#[test]
fn test_apply_update_announces_phases_in_order() {
    let origin = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    write(origin.path(), "new.txt", "n");
    write(dest.path(), "old.txt", "o");
    let rec = RecordingReporter::new();
    let mut phases = Vec::new();

    apply_update(
        &Manifest::from_entries(["old.txt"]),
        &Manifest::from_entries(["new.txt"]),
        origin.path(),
        dest.path(),
        CopyPolicy::FailIfExists,
        &rec,
        |phase| phases.push((phase, rec.events().len())),
    );

    assert_eq!(phases.iter().map(|(p, _)| *p).collect::<Vec<_>>(), vec![SyncPhase::Delete, SyncPhase::Copy]);
    assert_eq!(rec.operations(), vec!["Deleting old files...", "Copying new files..."]);

    // 각 단계 훅은 해당 라벨 직전, 파일 처리 전에 호출됨
    let events = rec.events();
    for (phase, seen) in &phases {
        assert_eq!(events[*seen], ProgressEvent::Operation(phase.label().to_string()));
    }
    assert_eq!(events[phases[1].1 - 1], ProgressEvent::Progress(100));
}

// ═══════════════════════════════════════════════════════
// 대기 스케줄러
// ═══════════════════════════════════════════════════════

#[test]
fn test_scheduler_checks_permission_once() {
    let mut sched = WaitScheduler::new(1500, 500);
    let checks = Cell::new(0);
    let check = || {
        checks.set(checks.get() + 1);
        Ok(true)
    };

    assert_eq!(sched.tick(check).unwrap(), TickOutcome::Rearm { progress: 33 });
    assert_eq!(sched.tick(check).unwrap(), TickOutcome::Rearm { progress: 66 });
    assert_eq!(
        sched.tick(check).unwrap(),
        TickOutcome::Proceed { progress: Some(100) }
    );
    assert_eq!(checks.get(), 1);
    assert!(sched.is_finished());
    assert_eq!(sched.delay(), None);
}

#[test]
fn test_scheduler_does_not_reenter_after_proceed() {
    let mut sched = WaitScheduler::new(500, 500);
    assert!(matches!(sched.tick(|| Ok(true)).unwrap(), TickOutcome::Proceed { .. }));
    assert_eq!(sched.tick(|| Ok(true)).unwrap(), TickOutcome::Proceed { progress: None });
    assert_eq!(sched.elapsed_ms(), 500);
}

#[test]
fn test_scheduler_zero_wait() {
    let mut sched = WaitScheduler::new(0, 500);
    assert_eq!(sched.delay(), None);
    let checks = Cell::new(0);
    let outcome = sched
        .tick(|| {
            checks.set(checks.get() + 1);
            Ok(true)
        })
        .unwrap();
    assert_eq!(outcome, TickOutcome::Proceed { progress: None });
    assert_eq!(checks.get(), 1);
}

#[test]
fn test_scheduler_permission_denied_skips_wait() {
    let mut sched = WaitScheduler::new(5000, 500);
    assert_eq!(sched.tick(|| Ok(false)).unwrap(), TickOutcome::PermissionDenied);
    assert_eq!(sched.elapsed_ms(), 0);
    assert!(sched.is_finished());
}

#[test]
fn test_scheduler_progress_clamped_for_uneven_wait() {
    let mut sched = WaitScheduler::new(700, 500);
    assert_eq!(sched.tick(|| Ok(true)).unwrap(), TickOutcome::Rearm { progress: 71 });
    assert_eq!(
        sched.tick(|| Ok(true)).unwrap(),
        TickOutcome::Proceed { progress: Some(100) }
    );
}

#[test]
fn test_scheduler_propagates_check_error() {
    let mut sched = WaitScheduler::new(0, 500);
    let err = sched
        .tick(|| Err(UpdaterError::DestinationNotDirectory { path: "/x".into() }))
        .unwrap_err();
    assert!(err.is_invariant_violation());
}
