use clap::Parser;
use pi_poster::app::{init_logging, report_failure, AppContext};
use pi_poster::domain::ports::SocialClient;
use pi_poster::{Result, SessionInfo};

#[derive(Parser)]
#[command(name = "login")]
#[command(about = "Log in and save the session for the other tools")]
struct Args {
    #[arg(short, long, default_value = pi_poster::config::toml_config::DEFAULT_CONFIG_FILE)]
    config: String,

    /// Log in again even when a usable session is saved
    #[arg(long)]
    force: bool,

    #[arg(short, long)]
    verbose: bool,
}

async fn login(context: &AppContext, force: bool) -> Result<SessionInfo> {
    let store = context.session_store();

    if !force {
        if let Some(session) = store.load().await? {
            if session.is_usable() {
                println!("Existing session found in {}:", store.file_name());
                return Ok(session);
            }
            tracing::info!("Saved session is not usable, logging in");
        }
    }

    let credentials = context.config.credentials()?;
    let session = context.client()?.login(&credentials).await?;
    store.save(&session).await?;
    println!("✅ Logged in, session saved to {}:", store.file_name());
    Ok(session)
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

    match login(&context, args.force).await {
        Ok(session) => println!("{}", session.summary()),
        Err(e) => std::process::exit(report_failure("Login", &e)),
    }
}
