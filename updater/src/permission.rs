//! destination 쓰기 권한 확인

use std::path::Path;

use crate::error::UpdaterError;

/// 현재 프로세스가 `path` 디렉터리에 쓸 수 있는지 확인합니다.
///
/// `path` 가 디렉터리가 아니면 [`UpdaterError::DestinationNotDirectory`] 를 반환하며,
/// 호출 측은 이를 내부 불변식 위반으로 보고 즉시 중단해야 합니다.
pub fn can_write(path: &Path) -> Result<bool, UpdaterError> {
    if !path.is_dir() {
        return Err(UpdaterError::DestinationNotDirectory {
            path: path.to_path_buf(),
        });
    }
    Ok(is_writable_dir(path))
}

#[cfg(unix)]
fn is_writable_dir(path: &Path) -> bool {
    use nix::unistd::{access, AccessFlags};

    access(path, AccessFlags::W_OK).is_ok()
}

#[cfg(not(unix))]
fn is_writable_dir(path: &Path) -> bool {
    match std::fs::metadata(path) {
        Ok(meta) => !meta.permissions().readonly(),
        Err(_) => false,
    }
}

/// 권한 확인 전략 (테스트에서는 고정 결과를 돌려주는 구현 사용)
pub trait PermissionChecker {
    fn can_write(&self, path: &Path) -> Result<bool, UpdaterError>;
}

/// 실제 파일시스템을 확인하는 기본 구현
#[derive(Debug, Default, Clone, Copy)]
pub struct FsPermissionChecker;

impl PermissionChecker for FsPermissionChecker {
    fn can_write(&self, path: &Path) -> Result<bool, UpdaterError> {
        can_write(path)
    }
}
