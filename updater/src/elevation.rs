//! 권한 상승 재실행
//!
//! destination에 쓸 수 없으면 호스트의 권한 상승 도구(gksudo, kdesudo 등)를 찾아
//! 업데이터 자신을 같은 인자 + `-w 0` 으로 다시 실행합니다.
//! 호출 측은 성공/실패와 관계없이 그 뒤 현재 프로세스를 종료합니다.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::UpdaterError;
use crate::UpdateRequest;

/// 대기 시간 플래그 (재실행 시 `0` 으로 강제)
pub const WAIT_FLAG: &str = "-w";

/// 플랫폼 기본 권한 상승 도구 후보 (선호 순서)
pub fn default_helper_candidates() -> Vec<String> {
    if cfg!(target_os = "linux") {
        vec!["gksudo".to_string(), "kdesudo".to_string()]
    } else {
        Vec::new()
    }
}

/// 이름으로 실행 파일을 찾는 전략
pub trait HelperLocator {
    fn locate(&self, name: &str) -> Option<PathBuf>;
}

/// `PATH` 에서 찾는 기본 구현
#[derive(Debug, Default, Clone, Copy)]
pub struct PathLocator;

impl HelperLocator for PathLocator {
    fn locate(&self, name: &str) -> Option<PathBuf> {
        which::which(name).ok()
    }
}

/// 분리된(detached) 프로세스 실행
pub trait ProcessLauncher {
    /// 프로세스를 띄우고 기다리지 않습니다.
    /// `working_dir` 가 `None` 이면 현재 프로세스의 작업 디렉터리를 그대로 물려줍니다.
    fn spawn_detached(
        &self,
        program: &Path,
        args: &[OsString],
        working_dir: Option<&Path>,
    ) -> std::io::Result<()>;
}

/// `std::process::Command` 로 실제 프로세스를 띄우는 구현
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

impl ProcessLauncher for SystemLauncher {
    fn spawn_detached(
        &self,
        program: &Path,
        args: &[OsString],
        working_dir: Option<&Path>,
    ) -> std::io::Result<()> {
        let mut cmd = Command::new(program);
        cmd.args(args);

        if let Some(dir) = working_dir {
            cmd.current_dir(dir);
        }

        #[cfg(target_os = "windows")]
        {
            use std::os::windows::process::CommandExt;
            // DETACHED_PROCESS | CREATE_BREAKAWAY_FROM_JOB | CREATE_NEW_PROCESS_GROUP
            cmd.creation_flags(0x00000008 | 0x01000000 | 0x00000200);
        }

        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_child| ())
    }
}

/// 찾은 권한 상승 도구
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElevationHelper {
    pub name: String,
    pub path: PathBuf,
}

/// 후보 목록에서 처음으로 발견된 도구를 반환합니다.
pub fn find_helper(candidates: &[String], locator: &dyn HelperLocator) -> Option<ElevationHelper> {
    candidates.iter().find_map(|name| {
        let found = locator.locate(name);
        tracing::debug!("[Elevation] Probe {}: {:?}", name, found);
        found.map(|path| ElevationHelper {
            name: name.clone(),
            path,
        })
    })
}

/// 권한 상승 도구에 넘길 인자: `<self_exe> <origin> <destination> [app] [extra...] -w 0`
///
/// `extra_args` 는 설정 파일 경로, 출력 옵션 등 호출 측이 그대로 전달하려는 플래그입니다.
pub fn relaunch_args(
    self_exe: &Path,
    request: &UpdateRequest,
    extra_args: &[OsString],
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        self_exe.as_os_str().to_owned(),
        request.origin.as_os_str().to_owned(),
        request.destination.as_os_str().to_owned(),
    ];
    if let Some(app) = request.app.as_deref().filter(|a| !a.is_empty()) {
        args.push(app.into());
    }
    args.extend(extra_args.iter().cloned());
    args.push(WAIT_FLAG.into());
    args.push("0".into());
    args
}

/// 권한 상승 재실행에 필요한 협력자 묶음
pub struct Elevator<'a> {
    pub candidates: &'a [String],
    pub locator: &'a dyn HelperLocator,
    pub launcher: &'a dyn ProcessLauncher,
    pub self_exe: &'a Path,
    pub extra_args: &'a [OsString],
}

impl Elevator<'_> {
    /// 도구를 찾아 업데이터를 재실행합니다. 성공 시 실행한 도구를 반환합니다.
    ///
    /// 후보 목록이 비어 있는 플랫폼에서는 권한 상승을 시도하지 않고
    /// [`UpdaterError::PermissionDenied`] 를 그대로 치명적 에러로 돌려줍니다.
    pub fn elevate_and_restart(
        &self,
        request: &UpdateRequest,
    ) -> Result<ElevationHelper, UpdaterError> {
        if self.candidates.is_empty() {
            tracing::error!("[Elevation] Not supported on this platform");
            return Err(UpdaterError::PermissionDenied {
                path: request.destination.clone(),
            });
        }

        let helper = find_helper(self.candidates, self.locator).ok_or_else(|| {
            tracing::error!(
                "[Elevation] None of [{}] found",
                self.candidates.join(", ")
            );
            UpdaterError::ElevationHelperNotFound {
                tried: self.candidates.to_vec(),
            }
        })?;

        let args = relaunch_args(self.self_exe, request, self.extra_args);
        tracing::info!(
            "[Elevation] Relaunching via {} ({}) with {} arg(s)",
            helper.name,
            helper.path.display(),
            args.len()
        );

        self.launcher
            .spawn_detached(&helper.path, &args, None)
            .map_err(|e| UpdaterError::ElevationLaunchFailed {
                helper: helper.name.clone(),
                source: e,
            })?;

        Ok(helper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapLocator(HashMap<&'static str, &'static str>);

    impl HelperLocator for MapLocator {
        fn locate(&self, name: &str) -> Option<PathBuf> {
            self.0.get(name).map(PathBuf::from)
        }
    }

    #[test]
    fn first_candidate_wins() {
        let locator = MapLocator(HashMap::from([
            ("gksudo", "/usr/bin/gksudo"),
            ("kdesudo", "/usr/bin/kdesudo"),
        ]));
        let candidates = vec!["gksudo".to_string(), "kdesudo".to_string()];
        let helper = find_helper(&candidates, &locator).unwrap();
        assert_eq!(helper.name, "gksudo");
    }

    #[test]
    fn falls_back_to_second_candidate() {
        let locator = MapLocator(HashMap::from([("kdesudo", "/usr/bin/kdesudo")]));
        let candidates = vec!["gksudo".to_string(), "kdesudo".to_string()];
        let helper = find_helper(&candidates, &locator).unwrap();
        assert_eq!(helper.path, PathBuf::from("/usr/bin/kdesudo"));
    }

    #[test]
    fn relaunch_args_skip_empty_app() {
        let req = UpdateRequest::new("/tmp/new", "/opt/app", Some(String::new()), 5000).unwrap();
        let args = relaunch_args(Path::new("/opt/app/copyapp"), &req, &[]);
        assert_eq!(
            args,
            vec![
                OsString::from("/opt/app/copyapp"),
                OsString::from("/tmp/new"),
                OsString::from("/opt/app"),
                OsString::from("-w"),
                OsString::from("0"),
            ]
        );
    }

    #[test]
    fn relaunch_args_forward_extra_flags_before_wait() {
        let req = UpdateRequest::new("/tmp/new", "/opt/app", Some("app.bin".into()), 5000).unwrap();
        let extra = [
            OsString::from("--config"),
            OsString::from("/etc/copyapp.toml"),
            OsString::from("-v"),
        ];
        let args = relaunch_args(Path::new("/opt/app/copyapp"), &req, &extra);
        let args: Vec<&str> = args.iter().map(|a| a.to_str().unwrap()).collect();
        assert_eq!(
            args,
            [
                "/opt/app/copyapp",
                "/tmp/new",
                "/opt/app",
                "app.bin",
                "--config",
                "/etc/copyapp.toml",
                "-v",
                "-w",
                "0",
            ]
        );
    }

    struct FixedLocator(PathBuf);

    impl HelperLocator for FixedLocator {
        fn locate(&self, _name: &str) -> Option<PathBuf> {
            Some(self.0.clone())
        }
    }

    #[cfg(unix)]
    #[test]
    fn helper_inherits_caller_working_dir() {
        use std::os::unix::fs::PermissionsExt;
        use std::time::{Duration, Instant};

        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("bin");
        std::fs::create_dir(&bin).unwrap();
        let record = dir.path().join("record.txt");
        let script = bin.join("fake-sudo");
        std::fs::write(
            &script,
            format!(
                "#!/bin/sh\n{{ pwd -P; for a in \"$@\"; do echo \"$a\"; done; }} > '{0}.tmp'\nmv '{0}.tmp' '{0}'\n",
                record.display()
            ),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        // 상대 경로 요청: 도구가 다른 디렉터리에서 돌면 엉뚱한 트리를 가리킴
        let request = UpdateRequest::new("new", "app", None, 0).unwrap();
        let candidates = vec!["fake-sudo".to_string()];
        let locator = FixedLocator(script);
        let elevator = Elevator {
            candidates: &candidates,
            locator: &locator,
            launcher: &SystemLauncher,
            self_exe: Path::new("/usr/lib/copyapp"),
            extra_args: &[],
        };
        elevator.elevate_and_restart(&request).unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        while !record.exists() {
            assert!(Instant::now() < deadline, "helper script never ran");
            std::thread::sleep(Duration::from_millis(20));
        }

        let content = std::fs::read_to_string(&record).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        let cwd = std::env::current_dir().unwrap().canonicalize().unwrap();
        assert_eq!(Path::new(lines[0]), cwd.as_path());
        assert_eq!(&lines[1..], ["/usr/lib/copyapp", "new", "app", "-w", "0"]);
    }
}
