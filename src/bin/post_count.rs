use clap::Parser;
use pi_poster::app::{init_logging, report_failure, AppContext};
use pi_poster::domain::model::normalize_username;
use pi_poster::domain::ports::SocialClient;
use pi_poster::Result;

#[derive(Parser)]
#[command(name = "post-count")]
#[command(about = "Print how many posts an account has, using the saved session")]
struct Args {
    /// Account to inspect (defaults to the configured account)
    username: Option<String>,

    #[arg(short, long, default_value = pi_poster::config::toml_config::DEFAULT_CONFIG_FILE)]
    config: String,

    #[arg(short, long)]
    verbose: bool,
}

async fn post_count(context: &AppContext, username: &str) -> Result<u64> {
    let session = context.session_store().load_usable().await?;
    context.client()?.media_count(&session, username).await
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let context = match AppContext::load(&args.config) {
        Ok(context) => context,
        Err(e) => {
            init_logging(args.verbose, false, None);
            std::process::exit(report_failure("Loading configuration", &e));
        }
    };
    init_logging(args.verbose, false, Some(&context.config));

    let username = args
        .username
        .as_deref()
        .map(normalize_username)
        .unwrap_or_else(|| context.config.username());

    match post_count(&context, &username).await {
        Ok(count) => println!("User @{} has {} posts.", username, count),
        Err(e) => std::process::exit(report_failure("Post count", &e)),
    }
}
