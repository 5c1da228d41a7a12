//! 부모 프로세스 종료 대기 스케줄러
//!
//! 업데이터를 띄운 애플리케이션이 완전히 종료되어 파일 잠금을 풀 때까지
//! 일정 주기(tick)로 대기합니다. 첫 tick에서만 destination 쓰기 권한을 확인하며,
//! 권한이 없으면 남은 대기를 건너뛰고 바로 권한 상승 경로로 넘어갑니다.
//!
//! 상태는 [`WaitScheduler`] 값에 명시적으로 들어 있으므로 tick 을 직접 호출해
//! 시간 없이도 테스트할 수 있습니다. 실제 sleep 은 [`crate::Updater`] 가 담당합니다.

use std::time::Duration;

use crate::error::UpdaterError;
use crate::progress::percent;

/// 기본 대기 시간 (밀리초)
pub const DEFAULT_WAIT_MS: u64 = 5000;
/// 기본 tick 주기 (밀리초)
pub const DEFAULT_TICK_MS: u64 = 500;

/// tick 한 번의 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// 아직 대기 중. 다음 tick 예약 필요
    Rearm { progress: u8 },
    /// 대기 완료. 매니페스트 로드/동기화로 진행
    Proceed { progress: Option<u8> },
    /// 첫 tick 권한 확인 실패
    PermissionDenied,
}

/// 대기 루프 상태
#[derive(Debug, Clone)]
pub struct WaitScheduler {
    total_wait_ms: u64,
    tick_ms: u64,
    elapsed_ms: u64,
    permission_checked: bool,
    finished: bool,
}

impl WaitScheduler {
    pub fn new(total_wait_ms: u64, tick_ms: u64) -> Self {
        Self {
            total_wait_ms,
            tick_ms: tick_ms.max(1),
            elapsed_ms: 0,
            permission_checked: false,
            finished: false,
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// 다음 tick 전에 기다릴 시간. 대기 시간이 0이거나 이미 끝났으면 `None`.
    pub fn delay(&self) -> Option<Duration> {
        if self.finished || self.total_wait_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.tick_ms))
        }
    }

    /// tick 한 번 진행. `check` 는 첫 tick에서만 호출됩니다.
    pub fn tick<F>(&mut self, check: F) -> Result<TickOutcome, UpdaterError>
    where
        F: FnOnce() -> Result<bool, UpdaterError>,
    {
        if self.finished {
            return Ok(TickOutcome::Proceed { progress: None });
        }

        if !self.permission_checked {
            self.permission_checked = true;
            if !check()? {
                self.finished = true;
                return Ok(TickOutcome::PermissionDenied);
            }
        }

        if self.total_wait_ms == 0 {
            self.finished = true;
            return Ok(TickOutcome::Proceed { progress: None });
        }

        self.elapsed_ms = self.elapsed_ms.saturating_add(self.tick_ms);
        let progress = percent(self.elapsed_ms, self.total_wait_ms).unwrap_or(100);

        if self.elapsed_ms < self.total_wait_ms {
            Ok(TickOutcome::Rearm { progress })
        } else {
            self.finished = true;
            Ok(TickOutcome::Proceed {
                progress: Some(progress),
            })
        }
    }
}
