//! 업데이트 후 애플리케이션 실행

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::elevation::ProcessLauncher;

/// 실행 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LaunchOutcome {
    /// 실행할 앱 이름이 없음
    Skipped,
    Started { path: PathBuf },
    Failed { path: PathBuf, error: String },
}

/// `destination/<app>` 을 분리된 프로세스로 실행합니다. 기다리거나 재시도하지 않습니다.
pub fn launch_app(
    destination: &Path,
    app: Option<&str>,
    launcher: &dyn ProcessLauncher,
) -> LaunchOutcome {
    let Some(app) = app.filter(|a| !a.is_empty()) else {
        return LaunchOutcome::Skipped;
    };

    let path = destination.join(app);
    let working_dir = path.parent().filter(|d| !d.as_os_str().is_empty());
    match launcher.spawn_detached(&path, &[], working_dir) {
        Ok(()) => {
            tracing::info!("[Launch] Started {}", path.display());
            LaunchOutcome::Started { path }
        }
        Err(e) => {
            tracing::error!("[Launch] Failed to start {}: {}", path.display(), e);
            LaunchOutcome::Failed {
                path,
                error: e.to_string(),
            }
        }
    }
}
