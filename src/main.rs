use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use travel_crew_rs::cli::Args;
use travel_crew_rs::launch;

/// 用户设置的RUST_LOG优先；--verbose 时追加debug，未设置时默认只输出警告
fn log_filter(verbose: bool, rust_log: Option<&str>) -> EnvFilter {
    let filter = EnvFilter::new(rust_log.unwrap_or_default());
    if verbose {
        filter.add_directive(tracing::Level::DEBUG.into())
    } else if rust_log.is_none() {
        filter.add_directive(tracing::Level::WARN.into())
    } else {
        filter
    }
}

fn setup_logging(verbose: bool) {
    let rust_log = std::env::var("RUST_LOG").ok();

    // 诊断日志走stderr，进度信息仍由println输出
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_env_filter(log_filter(verbose, rust_log.as_deref()))
        .init();
}

async fn run(args: Args) -> Result<()> {
    let request = args.to_request()?;
    let config = args.into_config()?;

    tracing::debug!(target: "crew", "config loaded: output={:?}, currency={}", config.output_path, config.currency);
    println!(
        "🧳 正在为 {} 规划 {} 行程 ({}, {})",
        request.destination(),
        request.duration_label(),
        request.budget_tier(),
        request.interests_label()
    );

    let report = launch(&config, &request).await?;
    println!(
        "\n🎉 行程规划完成，共生成 {} 个文件 (run {})",
        report.saved_files.len(),
        report.output.run_id
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    // .env中的凭据优先加载，不存在时忽略
    dotenvy::dotenv().ok();

    let args = Args::parse();
    setup_logging(args.verbose);

    if let Err(err) = run(args).await {
        eprintln!("\n❌ 行程规划失败，请稍后重试");
        eprintln!("   原因: {:#}", err);
        std::process::exit(1);
    }
}
