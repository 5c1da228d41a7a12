//! 명령줄 인자
//!
//! ```text
//! copyapp <origin> <destination> [app] [-w <ms>]
//! ```
//!
//! 권한 상승 재실행은 같은 형식에 `-w 0` 을 붙여 호출됩니다.

use clap::Parser;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use copyapp_updater_lib::{UpdateRequest, UpdaterError};

use crate::config::CopyAppConfig;

#[derive(Parser, Debug, Clone)]
#[command(name = "copyapp")]
#[command(about = "Copy application used by updaters to replace an installed application in place", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Source directory.
    pub origin: Option<String>,

    /// Destination directory.
    pub destination: Option<String>,

    /// The name of the application to run after the copy.
    pub app: Option<String>,

    /// Time to wait before starting the copying process (milliseconds).
    #[arg(short = 'w', long = "wait", value_name = "MS")]
    pub wait: Option<u64>,

    /// Path to a copyapp.toml configuration file.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long)]
    pub verbose: bool,

    /// Log progress instead of drawing a progress bar.
    #[arg(short, long)]
    pub quiet: bool,

    /// Print the final result as JSON on stdout.
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// 인자 + 설정으로 요청 생성. 대기 시간은 `-w` > 설정 파일 > 기본값.
    pub fn to_request(&self, cfg: &CopyAppConfig) -> Result<UpdateRequest, UpdaterError> {
        UpdateRequest::new(
            self.origin.clone().unwrap_or_default(),
            self.destination.clone().unwrap_or_default(),
            self.app.clone(),
            self.wait.unwrap_or(cfg.default_wait_ms),
        )
    }

    /// 권한 상승 재실행에 그대로 넘길 플래그.
    /// 실제로 읽은 설정 파일은 절대 경로로 고정해 재실행된 프로세스가 같은 설정을 쓰게 합니다.
    pub fn forwarded_args(&self, config_path: Option<&Path>) -> Vec<OsString> {
        let mut args = Vec::new();
        if let Some(path) = config_path {
            let path = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
            args.push(OsString::from("--config"));
            args.push(path.into_os_string());
        }
        if self.verbose {
            args.push(OsString::from("-v"));
        }
        if self.quiet {
            args.push(OsString::from("-q"));
        }
        if self.json {
            args.push(OsString::from("--json"));
        }
        args
    }
}
