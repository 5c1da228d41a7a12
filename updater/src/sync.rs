//! 동기화 엔진: 삭제 단계 후 복사 단계
//!
//! ## 흐름
//! 1. destination 매니페스트의 파일을 destination에서 삭제
//! 2. origin 매니페스트의 파일을 origin → destination 으로 복사
//!
//! 두 단계 모두 매니페스트 순서대로 파일 하나씩 순차 처리합니다.
//! 개별 파일 실패는 기록만 하고 배치는 끝까지 진행하며, 단계가 끝날 때 한 번 모아서 보고합니다.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::manifest::Manifest;
use crate::progress::{percent, ProgressReporter};

/// 복사 대상이 이미 있을 때의 동작
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyPolicy {
    /// 기존 파일이 있으면 해당 파일 복사 실패로 기록
    #[default]
    FailIfExists,
    /// 기존 파일을 덮어씀
    Overwrite,
}

/// 파일 하나의 삭제/복사 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOpOutcome {
    /// 매니페스트에 적힌 상대 경로
    pub path: String,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 단계(삭제 또는 복사) 하나의 집계
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseReport {
    /// 처리 대상 수 (빈 줄 제외)
    pub total: usize,
    /// 실제로 처리한 수
    pub processed: usize,
    pub outcomes: Vec<FileOpOutcome>,
}

impl PhaseReport {
    /// 모든 파일 성공 여부 (빈 단계는 성공)
    pub fn succeeded(&self) -> bool {
        self.outcomes.iter().all(|o| o.succeeded)
    }

    pub fn failures(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| !o.succeeded)
            .map(|o| o.path.as_str())
            .collect()
    }
}

/// 동기화 전체 결과
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    pub delete: PhaseReport,
    pub copy: PhaseReport,
}

impl SyncResult {
    pub fn delete_succeeded(&self) -> bool {
        self.delete.succeeded()
    }

    pub fn copy_succeeded(&self) -> bool {
        self.copy.succeeded()
    }

    /// 삭제 단계 AND 복사 단계
    pub fn succeeded(&self) -> bool {
        self.delete_succeeded() && self.copy_succeeded()
    }

    pub fn failure_count(&self) -> usize {
        self.delete.failures().len() + self.copy.failures().len()
    }
}

/// 매니페스트 항목을 `root` 아래 경로로 변환합니다.
/// 절대 경로나 `..` 로 루트를 벗어나는 항목은 거부합니다.
pub fn resolve_entry(root: &Path, entry: &str) -> Result<PathBuf, String> {
    let rel = Path::new(entry);
    for component in rel.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => {
                return Err(format!("'{}' escapes the target directory", entry));
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(format!("'{}' is not a relative path", entry));
            }
        }
    }
    Ok(root.join(rel))
}

/// 단계 공통 루프: 항목마다 `op` 실행 → 안내 메시지 → 진행률
fn run_phase<F>(
    manifest: &Manifest,
    reporter: &dyn ProgressReporter,
    verb: &str,
    mut op: F,
) -> PhaseReport
where
    F: FnMut(&str) -> Result<(), String>,
{
    let total = manifest.entry_count();
    let mut report = PhaseReport {
        total,
        processed: 0,
        outcomes: Vec::with_capacity(total),
    };

    for entry in manifest.entries() {
        let result = op(entry);
        reporter.info(&format!("{} {}", verb, entry));
        report.processed += 1;
        if let Some(p) = percent(report.processed as u64, total as u64) {
            reporter.progress(p);
        }

        match result {
            Ok(()) => {
                tracing::debug!("[Sync] {} {}: ok", verb, entry);
                report.outcomes.push(FileOpOutcome {
                    path: entry.to_string(),
                    succeeded: true,
                    error: None,
                });
            }
            Err(e) => {
                tracing::warn!("[Sync] {} {} failed: {}", verb, entry, e);
                report.outcomes.push(FileOpOutcome {
                    path: entry.to_string(),
                    succeeded: false,
                    error: Some(e),
                });
            }
        }
    }

    report
}

fn report_failures(report: &PhaseReport, what: &str, reporter: &dyn ProgressReporter) {
    let failures = report.failures();
    if failures.is_empty() {
        return;
    }
    let mut text = format!("The following files failed to be {}:\n", what);
    for f in &failures {
        text.push_str(f);
        text.push('\n');
    }
    tracing::warn!("[Sync] {} file(s) failed to be {}", failures.len(), what);
    reporter.info(&text);
}

/// 삭제 단계: `destination/<entry>` 를 하나씩 삭제
pub fn delete_files(
    manifest: &Manifest,
    destination: &Path,
    reporter: &dyn ProgressReporter,
) -> PhaseReport {
    let report = run_phase(manifest, reporter, "Deleting", |entry| {
        let target = resolve_entry(destination, entry)?;
        std::fs::remove_file(&target).map_err(|e| e.to_string())
    });
    report_failures(&report, "deleted", reporter);
    report
}

/// 복사 단계: `origin/<entry>` → `destination/<entry>`
pub fn copy_files(
    manifest: &Manifest,
    origin: &Path,
    destination: &Path,
    policy: CopyPolicy,
    reporter: &dyn ProgressReporter,
) -> PhaseReport {
    let report = run_phase(manifest, reporter, "Copying", |entry| {
        let src = resolve_entry(origin, entry)?;
        let dst = resolve_entry(destination, entry)?;
        copy_one(&src, &dst, policy)
    });
    report_failures(&report, "copied", reporter);
    report
}

fn copy_one(src: &Path, dst: &Path, policy: CopyPolicy) -> Result<(), String> {
    if !src.is_file() {
        return Err(format!("source {} does not exist", src.display()));
    }
    if policy == CopyPolicy::FailIfExists && std::fs::symlink_metadata(dst).is_ok() {
        return Err(format!("{} already exists", dst.display()));
    }
    if let Some(parent) = dst.parent() {
        std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
    }
    std::fs::copy(src, dst).map(|_| ()).map_err(|e| e.to_string())
}

/// 동기화 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Delete,
    Copy,
}

impl SyncPhase {
    /// 단계 시작 시 리포터로 보내는 작업 라벨
    pub fn label(self) -> &'static str {
        match self {
            Self::Delete => "Deleting old files...",
            Self::Copy => "Copying new files...",
        }
    }
}

/// 삭제 → 복사를 순서대로 실행합니다. 삭제 실패가 있어도 복사 단계는 항상 진행합니다.
///
/// 각 단계 시작 직전에 `on_phase` 를 호출한 뒤 작업 라벨을 보냅니다.
pub fn apply_update<F>(
    dest_manifest: &Manifest,
    origin_manifest: &Manifest,
    origin: &Path,
    destination: &Path,
    policy: CopyPolicy,
    reporter: &dyn ProgressReporter,
    mut on_phase: F,
) -> SyncResult
where
    F: FnMut(SyncPhase),
{
    on_phase(SyncPhase::Delete);
    reporter.operation(SyncPhase::Delete.label());
    let delete = delete_files(dest_manifest, destination, reporter);

    on_phase(SyncPhase::Copy);
    reporter.operation(SyncPhase::Copy.label());
    let copy = copy_files(origin_manifest, origin, destination, policy, reporter);

    SyncResult { delete, copy }
}
