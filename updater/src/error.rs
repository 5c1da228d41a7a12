//! 업데이터 에러 분류
//!
//! ## 치명적 에러 (즉시 중단)
//! - 잘못된 요청 (origin/destination 누락)
//! - 매니페스트 누락 / 읽기 실패
//! - 권한 부족 + 권한 상승 불가 (후보 없음 / 도구 없음 / 실행 실패)
//! - destination이 디렉터리가 아님 (내부 불변식 위반)
//!
//! 권한 부족 자체는 에러가 아니라 권한 상승 재실행 경로로 처리됩니다.
//!
//! 파일 단위 삭제/복사 실패는 에러가 아니라 [`crate::sync::FileOpOutcome`]으로 누적됩니다.

use std::path::PathBuf;
use thiserror::Error;

/// 업데이터 에러 타입
#[derive(Error, Debug)]
pub enum UpdaterError {
    /// origin 또는 destination이 비어 있음
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// `filelist.lst` 가 존재하지 않음
    #[error("manifest not found: {}", path.display())]
    ManifestMissing { path: PathBuf },

    /// `filelist.lst` 는 있지만 열 수 없음
    #[error("manifest unreadable: {}: {source}", path.display())]
    ManifestUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// destination에 쓰기 권한이 없고 이 플랫폼에서는 권한 상승을 지원하지 않음
    #[error("destination is not writable: {}", path.display())]
    PermissionDenied { path: PathBuf },

    /// 후보 권한 상승 도구를 하나도 찾지 못함
    #[error("no elevation helper found (tried: {})", tried.join(", "))]
    ElevationHelperNotFound { tried: Vec<String> },

    /// 권한 상승 도구를 찾았지만 프로세스 실행 실패
    #[error("failed to launch elevation helper '{helper}': {source}")]
    ElevationLaunchFailed {
        helper: String,
        #[source]
        source: std::io::Error,
    },

    /// destination이 디렉터리가 아님 (호출 측 계약 위반)
    #[error("destination is not a directory: {}", path.display())]
    DestinationNotDirectory { path: PathBuf },
}

impl UpdaterError {
    /// 내부 불변식 위반 여부 (일반 에러 경로가 아님)
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::DestinationNotDirectory { .. })
    }

    /// 사용자에게 표시할 메시지
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidRequest(_) => "INVALID COMMAND LINE OPTIONS".to_string(),
            Self::ManifestMissing { path } => {
                format!("Could not find a required file! Quitting. {}", path.display())
            }
            Self::ManifestUnreadable { .. } => {
                "Could not open a required file! Quitting.".to_string()
            }
            Self::PermissionDenied { path } => format!(
                "The target directory {} requires administrator privileges. \
                 Run the application you want to update with elevated privileges.",
                path.display()
            ),
            Self::ElevationHelperNotFound { tried } => format!(
                "The target directory permissions require administrator privileges but none of \
                 [{}] was found. Try running the application you want to update as an administrator. \
                 Quitting now!",
                tried.join(", ")
            ),
            Self::ElevationLaunchFailed { helper, .. } => format!(
                "Could not restart with administrator privileges using {}. Quitting now!",
                helper
            ),
            Self::DestinationNotDirectory { path } => {
                format!("Internal error: {} is not a directory", path.display())
            }
        }
    }

    /// 프로세스 종료 코드. 치명적 에러는 모두 `1`.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_denied_names_destination() {
        let denied = UpdaterError::PermissionDenied { path: "/opt/app".into() };
        assert_eq!(denied.exit_code(), 1);
        assert!(denied.user_message().contains("/opt/app"));
        assert!(!denied.is_invariant_violation());
    }

    #[test]
    fn helper_not_found_lists_candidates() {
        let err = UpdaterError::ElevationHelperNotFound {
            tried: vec!["gksudo".into(), "kdesudo".into()],
        };
        assert_eq!(err.to_string(), "no elevation helper found (tried: gksudo, kdesudo)");
        assert!(err.user_message().contains("gksudo, kdesudo"));
    }

    #[test]
    fn not_a_directory_is_invariant_violation() {
        let err = UpdaterError::DestinationNotDirectory { path: "/etc/passwd".into() };
        assert!(err.is_invariant_violation());
        assert_eq!(err.exit_code(), 1);
    }
}
