//! CopyApp 설정 파일 관리
//!
//! `copyapp.toml` 에서 설정을 로드합니다. 파일이 없으면 기본값을 사용합니다.
//!
//! ```toml
//! default_wait_ms = 5000
//! tick_ms = 500
//! overwrite_existing = false
//! elevation_helpers = ["gksudo", "kdesudo"]
//! log_level = "info"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use copyapp_updater_lib::{
    default_helper_candidates, CopyPolicy, UpdaterOptions, DEFAULT_TICK_MS, DEFAULT_WAIT_MS,
};

pub const CONFIG_FILE_NAME: &str = "copyapp.toml";

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct CopyAppConfig {
    /// `-w` 가 없을 때의 대기 시간 (밀리초)
    pub default_wait_ms: u64,
    pub tick_ms: u64,
    /// 복사 대상이 이미 있으면 덮어쓸지 여부
    pub overwrite_existing: bool,
    /// 권한 상승 도구 후보 (선호 순서)
    pub elevation_helpers: Vec<String>,
    pub log_level: String,
}

impl Default for CopyAppConfig {
    fn default() -> Self {
        Self {
            default_wait_ms: DEFAULT_WAIT_MS,
            tick_ms: DEFAULT_TICK_MS,
            overwrite_existing: false,
            elevation_helpers: default_helper_candidates(),
            log_level: "info".to_string(),
        }
    }
}

impl CopyAppConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("Invalid copyapp configuration")
    }

    /// 설정 로드. `explicit` 경로가 주어지면 그 파일이 반드시 있어야 합니다.
    /// 반환값의 두 번째 요소는 실제로 읽은 파일 경로입니다.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        let path = match explicit {
            Some(p) => {
                if !p.exists() {
                    anyhow::bail!("Config file not found: {}", p.display());
                }
                Some(p.to_path_buf())
            }
            None => config_file_path(),
        };

        match path {
            Some(path) => {
                let content = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                let cfg = Self::from_toml_str(&content)
                    .with_context(|| format!("Failed to parse {}", path.display()))?;
                Ok((cfg, Some(path)))
            }
            None => Ok((Self::default(), None)),
        }
    }

    pub fn copy_policy(&self) -> CopyPolicy {
        if self.overwrite_existing {
            CopyPolicy::Overwrite
        } else {
            CopyPolicy::FailIfExists
        }
    }

    pub fn updater_options(&self) -> Result<UpdaterOptions> {
        let self_exe =
            std::env::current_exe().context("Failed to resolve the updater executable path")?;
        Ok(UpdaterOptions {
            tick_ms: self.tick_ms,
            copy_policy: self.copy_policy(),
            elevation_helpers: self.elevation_helpers.clone(),
            self_exe,
            forwarded_args: Vec::new(),
        })
    }
}

/// 설정 파일 경로 결정 (없으면 `None`)
pub fn config_file_path() -> Option<PathBuf> {
    // 1. 실행 파일 옆 config/copyapp.toml, copyapp.toml
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let cfg = dir.join("config").join(CONFIG_FILE_NAME);
            if cfg.exists() {
                return Some(cfg);
            }
            let cfg = dir.join(CONFIG_FILE_NAME);
            if cfg.exists() {
                return Some(cfg);
            }
        }
    }

    // 2. CWD의 config/copyapp.toml
    let cwd_cfg = PathBuf::from("config").join(CONFIG_FILE_NAME);
    if cwd_cfg.exists() {
        return Some(cwd_cfg);
    }

    None
}
