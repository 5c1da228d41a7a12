//! # CopyApp 업데이터 라이브러리
//!
//! 새로 받은 payload 디렉터리(origin)의 파일로 설치된 애플리케이션 디렉터리(destination)를
//! 그 자리에서 교체하고, 필요하면 업데이트된 애플리케이션을 다시 실행합니다.
//!
//! ## 동작 순서
//! 1. **대기(scheduler.rs)**: 부모 애플리케이션이 종료될 때까지 tick 단위로 대기
//! 2. **권한 확인(permission.rs)**: 첫 tick에서 destination 쓰기 권한 확인
//! 3. **권한 상승(elevation.rs)**: 권한이 없으면 gksudo/kdesudo 로 자신을 `-w 0` 재실행 후 종료
//! 4. **매니페스트(manifest.rs)**: destination, origin 의 `filelist.lst` 로드
//! 5. **동기화(sync.rs)**: 옛 파일 삭제 → 새 파일 복사 (파일별 실패는 누적만)
//! 6. **재실행(launcher.rs)**: 지정된 앱을 destination 에서 분리 실행
//!
//! 진행 상황은 [`ProgressReporter`] 로만 내보내며 코어는 UI 에 의존하지 않습니다.
//!
//! ## 매니페스트 형식
//! ```text
//! app.bin
//! lib/libfoo.so
//! share/icons/app.png
//! ```

// ══════════════════════════════════════════════════════
// 모듈
// ══════════════════════════════════════════════════════

pub mod elevation;
pub mod error;
pub mod launcher;
pub mod manifest;
pub mod permission;
pub mod progress;
pub mod scheduler;
pub mod state;
pub mod sync;

#[cfg(test)]
mod tests;

pub use elevation::{
    default_helper_candidates, ElevationHelper, Elevator, HelperLocator, PathLocator,
    ProcessLauncher, SystemLauncher,
};
pub use error::UpdaterError;
pub use launcher::LaunchOutcome;
pub use manifest::{load_manifest, Manifest, MANIFEST_FILE_NAME};
pub use permission::{FsPermissionChecker, PermissionChecker};
pub use progress::{NullReporter, ProgressEvent, ProgressReporter, RecordingReporter, TracingReporter};
pub use scheduler::{TickOutcome, WaitScheduler, DEFAULT_TICK_MS, DEFAULT_WAIT_MS};
pub use state::{StateMachine, UpdaterState};
pub use sync::{CopyPolicy, FileOpOutcome, PhaseReport, SyncPhase, SyncResult};

use serde::Serialize;
use std::ffi::OsString;
use std::path::PathBuf;

// ══════════════════════════════════════════════════════
// 요청 / 옵션
// ══════════════════════════════════════════════════════

/// 종료 코드: 완전히 성공
pub const EXIT_OK: i32 = 0;
/// 종료 코드: 치명적 에러
pub const EXIT_FATAL: i32 = 1;
/// 종료 코드: 권한 상승 재실행으로 넘김
pub const EXIT_ELEVATED: i32 = 2;
/// 종료 코드: 업데이트는 끝났지만 일부 파일 실패
pub const EXIT_PARTIAL: i32 = 3;

/// 업데이트 요청 (생성 후 읽기 전용)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateRequest {
    pub origin: PathBuf,
    pub destination: PathBuf,
    /// 업데이트 후 실행할 앱 (destination 기준 상대 경로)
    pub app: Option<String>,
    pub wait_ms: u64,
}

impl UpdateRequest {
    /// origin, destination 중 하나라도 비어 있으면 [`UpdaterError::InvalidRequest`].
    pub fn new(
        origin: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
        app: Option<String>,
        wait_ms: u64,
    ) -> Result<Self, UpdaterError> {
        let origin = origin.into();
        let destination = destination.into();

        if origin.as_os_str().is_empty() {
            return Err(UpdaterError::InvalidRequest("origin directory is empty".into()));
        }
        if destination.as_os_str().is_empty() {
            return Err(UpdaterError::InvalidRequest(
                "destination directory is empty".into(),
            ));
        }

        Ok(Self {
            origin,
            destination,
            app: app.filter(|a| !a.is_empty()),
            wait_ms,
        })
    }

    /// 초기 대기를 건너뛰는 요청인지 (권한 상승 재실행 등)
    pub fn skips_wait(&self) -> bool {
        self.wait_ms == 0
    }
}

/// 실행 옵션
#[derive(Debug, Clone)]
pub struct UpdaterOptions {
    pub tick_ms: u64,
    pub copy_policy: CopyPolicy,
    /// 권한 상승 도구 후보 (선호 순서). 비어 있으면 권한 상승을 시도하지 않음
    pub elevation_helpers: Vec<String>,
    /// 재실행할 업데이터 자신의 경로
    pub self_exe: PathBuf,
    /// 권한 상승 재실행에 그대로 넘길 추가 플래그 (`--config <path>`, `-v` 등)
    pub forwarded_args: Vec<OsString>,
}

impl Default for UpdaterOptions {
    fn default() -> Self {
        Self {
            tick_ms: DEFAULT_TICK_MS,
            copy_policy: CopyPolicy::default(),
            elevation_helpers: default_helper_candidates(),
            self_exe: std::env::current_exe().unwrap_or_else(|_| PathBuf::from("copyapp")),
            forwarded_args: Vec::new(),
        }
    }
}

// ══════════════════════════════════════════════════════
// 결과
// ══════════════════════════════════════════════════════

/// 동기화 + 재실행 결과
#[derive(Debug, Clone, Serialize)]
pub struct UpdateReport {
    pub sync: SyncResult,
    pub launch: LaunchOutcome,
}

/// 업데이터 실행 결과
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UpdateOutcome {
    /// 동기화까지 끝남 (일부 실패 포함 가능)
    Completed(UpdateReport),
    /// 권한 상승 프로세스를 띄우고 넘김
    Elevated { helper: String },
}

impl UpdateOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Completed(report) if report.sync.succeeded() => EXIT_OK,
            Self::Completed(_) => EXIT_PARTIAL,
            Self::Elevated { .. } => EXIT_ELEVATED,
        }
    }
}

/// 최종 안내 문구
pub fn result_text(sync: &SyncResult, app: Option<&str>) -> String {
    let mut text = if sync.succeeded() {
        "Update finished successfully. ".to_string()
    } else {
        "Update finished with errors. ".to_string()
    };
    if app.is_some_and(|a| !a.is_empty()) {
        text.push_str("Restarting application");
    }
    text.trim_end().to_string()
}

// ══════════════════════════════════════════════════════
// 업데이터
// ══════════════════════════════════════════════════════

/// 요청 하나를 처음부터 끝까지 처리하는 실행기
///
/// 협력자(권한 확인, 도구 탐색, 프로세스 실행)는 교체할 수 있어서
/// 테스트에서는 실제 권한 상승이나 프로세스 실행 없이 인자만 검증합니다.
pub struct Updater<'a> {
    request: UpdateRequest,
    options: UpdaterOptions,
    reporter: &'a dyn ProgressReporter,
    permissions: &'a dyn PermissionChecker,
    locator: &'a dyn HelperLocator,
    launcher: &'a dyn ProcessLauncher,
    state: StateMachine,
}

impl<'a> Updater<'a> {
    pub fn new(
        request: UpdateRequest,
        options: UpdaterOptions,
        reporter: &'a dyn ProgressReporter,
    ) -> Self {
        let state = StateMachine::new(request.skips_wait());
        Self {
            request,
            options,
            reporter,
            permissions: &FsPermissionChecker,
            locator: &PathLocator,
            launcher: &SystemLauncher,
            state,
        }
    }

    pub fn with_permission_checker(mut self, checker: &'a dyn PermissionChecker) -> Self {
        self.permissions = checker;
        self
    }

    pub fn with_locator(mut self, locator: &'a dyn HelperLocator) -> Self {
        self.locator = locator;
        self
    }

    pub fn with_launcher(mut self, launcher: &'a dyn ProcessLauncher) -> Self {
        self.launcher = launcher;
        self
    }

    pub fn state(&self) -> UpdaterState {
        self.state.state()
    }

    pub fn state_history(&self) -> &[UpdaterState] {
        self.state.history()
    }

    /// 전체 업데이트 실행. 치명적 에러 시 상태는 Aborted 로 끝납니다.
    pub async fn run(&mut self) -> Result<UpdateOutcome, UpdaterError> {
        let result = self.run_inner().await;
        match &result {
            Ok(UpdateOutcome::Completed(_)) => {}
            Ok(UpdateOutcome::Elevated { .. }) => self.enter(UpdaterState::Aborted),
            Err(e) => {
                tracing::error!("[Updater] Aborted: {}", e);
                self.reporter.info(&e.user_message());
                self.enter(UpdaterState::Aborted);
            }
        }
        result
    }

    async fn run_inner(&mut self) -> Result<UpdateOutcome, UpdaterError> {
        tracing::info!(
            "[Updater] {} -> {} (app: {}, wait: {}ms)",
            self.request.origin.display(),
            self.request.destination.display(),
            self.request.app.as_deref().unwrap_or("-"),
            self.request.wait_ms
        );
        self.reporter.info("Waiting for application to close");

        if !self.wait_for_parent().await? {
            return self.elevate();
        }

        self.enter(UpdaterState::ListingFiles);
        self.reporter.operation("Looking for local file list info");
        let local = load_manifest(&self.request.destination, self.reporter)?;
        self.reporter.operation("Looking for remote file list info");
        let remote = load_manifest(&self.request.origin, self.reporter)?;

        let state = &mut self.state;
        let sync = sync::apply_update(
            &local,
            &remote,
            &self.request.origin,
            &self.request.destination,
            self.options.copy_policy,
            self.reporter,
            |phase| {
                let to = match phase {
                    SyncPhase::Delete => UpdaterState::Deleting,
                    SyncPhase::Copy => UpdaterState::Copying,
                };
                Self::transition(state, to);
            },
        );

        let text = result_text(&sync, self.request.app.as_deref());
        if sync.succeeded() {
            tracing::info!("[Updater] {}", text);
        } else {
            tracing::warn!("[Updater] {} ({} failure(s))", text, sync.failure_count());
        }
        self.reporter.info(&text);

        self.enter(UpdaterState::Launching);
        let launch =
            launcher::launch_app(&self.request.destination, self.request.app.as_deref(), self.launcher);
        if let LaunchOutcome::Failed { path, error } = &launch {
            self.reporter
                .info(&format!("Could not start {}: {}", path.display(), error));
        }

        self.enter(UpdaterState::Done);
        Ok(UpdateOutcome::Completed(UpdateReport { sync, launch }))
    }

    /// 대기 루프. 권한이 있으면 `true`, 없으면 `false`.
    async fn wait_for_parent(&mut self) -> Result<bool, UpdaterError> {
        let mut scheduler = WaitScheduler::new(self.request.wait_ms, self.options.tick_ms);
        let destination = self.request.destination.clone();
        let wait_ms = self.request.wait_ms;

        loop {
            if let Some(delay) = scheduler.delay() {
                tokio::time::sleep(delay).await;
            }

            let permissions = self.permissions;
            let state = &mut self.state;
            let outcome = scheduler.tick(|| {
                if state.state() == UpdaterState::Waiting {
                    Self::transition(state, UpdaterState::CheckingPermissions);
                }
                let writable = permissions.can_write(&destination)?;
                tracing::info!(
                    "[Wait] {} writable: {}",
                    destination.display(),
                    writable
                );
                if writable && wait_ms > 0 {
                    Self::transition(state, UpdaterState::Waiting);
                }
                Ok(writable)
            })?;

            match outcome {
                TickOutcome::Rearm { progress } => {
                    tracing::debug!("[Wait] {}ms / {}ms", scheduler.elapsed_ms(), wait_ms);
                    self.reporter.progress(progress)
                }
                TickOutcome::Proceed { progress } => {
                    if let Some(p) = progress {
                        self.reporter.progress(p);
                    }
                    return Ok(true);
                }
                TickOutcome::PermissionDenied => return Ok(false),
            }
        }
    }

    fn elevate(&mut self) -> Result<UpdateOutcome, UpdaterError> {
        self.enter(UpdaterState::Elevating);
        let elevator = Elevator {
            candidates: &self.options.elevation_helpers,
            locator: self.locator,
            launcher: self.launcher,
            self_exe: &self.options.self_exe,
            extra_args: &self.options.forwarded_args,
        };
        let helper = elevator.elevate_and_restart(&self.request)?;
        self.reporter.info(
            "The target directory permissions require this application to restart with administrator privileges!",
        );
        Ok(UpdateOutcome::Elevated { helper: helper.name })
    }

    fn enter(&mut self, to: UpdaterState) {
        Self::transition(&mut self.state, to);
    }

    fn transition(state: &mut StateMachine, to: UpdaterState) {
        if let Err(e) = state.transition(to) {
            tracing::error!("[Updater] {}", e);
        }
    }
}
