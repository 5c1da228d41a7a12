//! 진행 상태 보고 인터페이스
//!
//! 코어는 UI 타입에 의존하지 않고 이 트레이트만 호출합니다.
//! 세 신호는 서로 독립적이며 응답을 기다리지 않습니다 (fire-and-forget).

use std::sync::Mutex;

/// 진행 상태 수신자
pub trait ProgressReporter {
    /// 자유 형식 안내 메시지
    fn info(&self, message: &str);
    /// 현재 작업 라벨
    fn operation(&self, label: &str);
    /// 0–100 진행률
    fn progress(&self, percent: u8);
}

impl<R: ProgressReporter + ?Sized> ProgressReporter for &R {
    fn info(&self, message: &str) {
        (**self).info(message)
    }
    fn operation(&self, label: &str) {
        (**self).operation(label)
    }
    fn progress(&self, percent: u8) {
        (**self).progress(percent)
    }
}

/// 아무것도 하지 않는 리포터
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl ProgressReporter for NullReporter {
    fn info(&self, _message: &str) {}
    fn operation(&self, _label: &str) {}
    fn progress(&self, _percent: u8) {}
}

/// tracing 로그로만 출력하는 리포터 (헤드리스 / `--quiet` 모드)
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn info(&self, message: &str) {
        tracing::info!("{}", message);
    }
    fn operation(&self, label: &str) {
        tracing::info!("[Operation] {}", label);
    }
    fn progress(&self, percent: u8) {
        tracing::debug!("[Progress] {}%", percent);
    }
}

/// 리포터가 받은 신호 하나
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Info(String),
    Operation(String),
    Progress(u8),
}

/// 받은 신호를 순서대로 기록하는 리포터 (테스트용)
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.lock().clone()
    }

    pub fn infos(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::Info(s) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn operations(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::Operation(s) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn progress_values(&self) -> Vec<u8> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::Progress(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ProgressEvent>> {
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn push(&self, event: ProgressEvent) {
        self.lock().push(event);
    }
}

impl ProgressReporter for RecordingReporter {
    fn info(&self, message: &str) {
        self.push(ProgressEvent::Info(message.to_string()));
    }
    fn operation(&self, label: &str) {
        self.push(ProgressEvent::Operation(label.to_string()));
    }
    fn progress(&self, percent: u8) {
        self.push(ProgressEvent::Progress(percent));
    }
}

/// `done * 100 / total` 을 0–100으로 계산. `total == 0` 이면 `None`.
pub fn percent(done: u64, total: u64) -> Option<u8> {
    if total == 0 {
        return None;
    }
    Some((done.min(total) * 100 / total) as u8)
}
