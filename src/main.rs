use anyhow::Context;
use clap::Parser;

use copyapp::cli::Cli;
use copyapp::config::CopyAppConfig;
use copyapp::logging;
use copyapp::reporter::ConsoleReporter;
use copyapp::updater::{ProgressReporter, TracingReporter, Updater, EXIT_FATAL};

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help / --version 은 stdout, 성공 종료
            let code = if e.use_stderr() { EXIT_FATAL } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("✗ Error: {:#}", e);
            EXIT_FATAL
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let (cfg, cfg_path) = CopyAppConfig::load(cli.config.as_deref())?;
    logging::init(&cfg.log_level, cli.verbose);
    match &cfg_path {
        Some(p) => tracing::info!("[Config] Loaded {}", p.display()),
        None => tracing::debug!("[Config] No config file, using defaults"),
    }

    let request = match cli.to_request(&cfg) {
        Ok(request) => request,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("✗ {}", e.user_message());
            return Ok(e.exit_code());
        }
    };

    // 단일 스레드: 대기 tick 외에는 모든 작업이 순차 실행
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("Failed to create tokio runtime")?;

    let console = (!cli.quiet).then(ConsoleReporter::new);
    let reporter: &dyn ProgressReporter = match &console {
        Some(console) => console,
        None => &TracingReporter,
    };

    let mut options = cfg.updater_options()?;
    options.forwarded_args = cli.forwarded_args(cfg_path.as_deref());

    let mut updater = Updater::new(request, options, reporter);
    let result = rt.block_on(updater.run());
    if let Some(console) = &console {
        console.finish();
    }
    tracing::debug!("[Updater] States: {:?}", updater.state_history());

    match result {
        Ok(outcome) => {
            if cli.json {
                println!("{}", serde_json::to_string(&outcome)?);
            }
            Ok(outcome.exit_code())
        }
        // 실패 목록과 안내 메시지는 Updater 가 리포터로 이미 보냄
        Err(e) => Ok(e.exit_code()),
    }
}
