use tracing_subscriber::EnvFilter;

/// 로깅 초기화. stderr 로 출력하여 `--json` 결과(stdout)를 오염시키지 않습니다.
///
/// `RUST_LOG` 가 있으면 우선하고, 없으면 `verbose` 일 때 `debug`, 아니면 설정의 `level`.
pub fn init(level: &str, verbose: bool) {
    let fallback = if verbose { "debug" } else { level };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_target(false)
        .init();
}
