use serde::Serialize;
use thiserror::Error;

/// 업데이터 진행 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdaterState {
    Waiting,
    CheckingPermissions,
    Elevating,
    ListingFiles,
    Deleting,
    Copying,
    Launching,
    Done,
    Aborted,
}

impl UpdaterState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TransitionError {
    #[error("invalid transition: {0:?} -> {1:?}")]
    InvalidTransition(UpdaterState, UpdaterState),
}

#[derive(Debug)]
pub struct StateMachine {
    state: UpdaterState,
    history: Vec<UpdaterState>,
}

impl StateMachine {
    /// 초기 대기를 건너뛰면 (`-w 0`) CheckingPermissions 에서 시작
    pub fn new(skip_wait: bool) -> Self {
        let state = if skip_wait {
            UpdaterState::CheckingPermissions
        } else {
            UpdaterState::Waiting
        };
        Self {
            state,
            history: vec![state],
        }
    }

    pub fn state(&self) -> UpdaterState {
        self.state
    }

    /// 지나온 상태들 (시작 상태 포함)
    pub fn history(&self) -> &[UpdaterState] {
        &self.history
    }

    pub fn can_transition(&self, to: UpdaterState) -> bool {
        use UpdaterState::*;

        if self.state.is_terminal() {
            return false;
        }
        if to == Aborted {
            return true;
        }
        matches!(
            (self.state, to),
            (Waiting, CheckingPermissions)
                | (CheckingPermissions, Waiting)
                | (CheckingPermissions, Elevating)
                | (CheckingPermissions, ListingFiles)
                | (Waiting, ListingFiles)
                | (ListingFiles, Deleting)
                | (Deleting, Copying)
                | (Copying, Launching)
                | (Launching, Done)
        )
    }

    pub fn transition(&mut self, to: UpdaterState) -> Result<(), TransitionError> {
        if self.can_transition(to) {
            tracing::debug!("[Updater] State: {:?} -> {:?}", self.state, to);
            self.state = to;
            self.history.push(to);
            Ok(())
        } else {
            Err(TransitionError::InvalidTransition(self.state, to))
        }
    }
}
