//! 파일 목록 매니페스트 (`filelist.lst`) 로더
//!
//! 형식: UTF-8 텍스트 (잘못된 바이트는 대체 문자로 읽음), 한 줄에 상대 경로 하나. 헤더/주석 없음.
//! 개행으로만 분리하며 그 외 공백 제거나 경로 정규화는 하지 않습니다.

use std::borrow::Cow;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::UpdaterError;
use crate::progress::ProgressReporter;

/// 동기화 대상 디렉터리 루트에 있어야 하는 매니페스트 파일 이름
pub const MANIFEST_FILE_NAME: &str = "filelist.lst";

/// 디렉터리가 선언하는 파일 목록 (파일에 적힌 순서 그대로, 중복 유지)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    lines: Vec<String>,
}

impl Manifest {
    /// 파일 내용을 개행 기준으로 분리합니다. 마지막 개행 뒤의 빈 문자열도 남습니다.
    pub fn parse(content: &str) -> Self {
        Self {
            lines: content.split('\n').map(str::to_string).collect(),
        }
    }

    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: entries.into_iter().map(Into::into).collect(),
        }
    }

    /// 분리된 원본 줄 (빈 줄 포함)
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// 비어 있지 않은 항목만
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str).filter(|l| !l.is_empty())
    }

    /// 처리 대상 항목 수 (진행률 분모)
    pub fn entry_count(&self) -> usize {
        self.entries().count()
    }

    pub fn is_empty(&self) -> bool {
        self.entry_count() == 0
    }
}

/// `dir/filelist.lst` 경로
pub fn manifest_path(dir: &Path) -> PathBuf {
    dir.join(MANIFEST_FILE_NAME)
}

/// 디렉터리의 매니페스트를 읽습니다.
///
/// 읽기 전에 안내 메시지를, 실패 시 에러 메시지를 리포터로 보냅니다.
/// 두 실패 모두 호출 측에서 치명적으로 다룹니다.
/// UTF-8 이 아닌 바이트는 대체 문자로 바꿔 읽으므로 해당 항목만 파일 단위로 실패합니다.
pub fn load_manifest(dir: &Path, reporter: &dyn ProgressReporter) -> Result<Manifest, UpdaterError> {
    let path = manifest_path(dir);
    reporter.info(&format!("Looking for {} file", MANIFEST_FILE_NAME));

    if let Err(e) = std::fs::metadata(&path) {
        if e.kind() == ErrorKind::NotFound {
            reporter.info(&format!("Could not find {} file", MANIFEST_FILE_NAME));
            tracing::error!("[Manifest] Not found: {}", path.display());
            return Err(UpdaterError::ManifestMissing { path });
        }
        return Err(unreadable(path, e, reporter));
    }

    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) => return Err(unreadable(path, e, reporter)),
    };
    let content = String::from_utf8_lossy(&bytes);
    if matches!(content, Cow::Owned(_)) {
        tracing::warn!("[Manifest] {} contains invalid UTF-8", path.display());
    }

    let manifest = Manifest::parse(&content);
    tracing::info!(
        "[Manifest] Loaded {} entr(ies) from {}",
        manifest.entry_count(),
        path.display()
    );
    Ok(manifest)
}

fn unreadable(path: PathBuf, source: std::io::Error, reporter: &dyn ProgressReporter) -> UpdaterError {
    reporter.info(&format!("Could not open {} file", MANIFEST_FILE_NAME));
    tracing::error!("[Manifest] Cannot read {}: {}", path.display(), source);
    UpdaterError::ManifestUnreadable { path, source }
}
