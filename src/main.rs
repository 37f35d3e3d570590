use clap::Parser;
use pi_poster::app::{init_logging, report_failure, AppContext};
use pi_poster::{CliConfig, StopReason};

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 載入配置
    let mut context = match AppContext::load(&cli.config) {
        Ok(context) => context,
        Err(e) => {
            init_logging(cli.verbose, cli.json_logs, None);
            std::process::exit(report_failure("Loading configuration", &e));
        }
    };
    cli.apply(&mut context.config);

    // 初始化日誌
    init_logging(cli.verbose, cli.json_logs, Some(&context.config));
    tracing::info!("Starting pi-poster for @{}", context.config.username());
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 驗證配置
    if let Err(e) = context.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        std::process::exit(report_failure("Configuration validation", &e));
    }

    let poster = match context.poster() {
        Ok(poster) => poster,
        Err(e) => std::process::exit(report_failure("Startup", &e)),
    };

    if cli.dry_run {
        tracing::info!("🔍 DRY RUN MODE - nothing will be published");
        match poster.dry_run().await {
            Ok(Some(plan)) => {
                println!("Next post: index {} ({})", plan.index, plan.digit);
                println!("Caption: {}", plan.caption);
            }
            Ok(None) => println!("Nothing left to post."),
            Err(e) => std::process::exit(report_failure("Dry run", &e)),
        }
        return;
    }

    match poster.run().await {
        Ok(summary) => {
            tracing::info!("✅ Published {} post(s)", summary.posts.len());
            for post in &summary.posts {
                println!(
                    "Posted index {} (media {})",
                    post.index,
                    post.receipt.media_code.as_deref().unwrap_or("?")
                );
            }
            let reason = match summary.stop {
                StopReason::TargetReached => "target index reached",
                StopReason::SequenceExhausted => "no more digits available",
                StopReason::PostLimit => "post limit reached",
            };
            println!(
                "✅ Stopped at index {} (target {}): {}",
                summary.state.last_index, summary.state.target_index, reason
            );
        }
        Err(e) => std::process::exit(report_failure("Posting run", &e)),
    }
}
