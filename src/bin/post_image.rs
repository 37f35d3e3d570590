use clap::Parser;
use pi_poster::adapters::render::load_upload_image;
use pi_poster::app::{init_logging, report_failure, AppContext};
use pi_poster::domain::model::PostReceipt;
use pi_poster::domain::ports::SocialClient;
use pi_poster::Result;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "post-image")]
#[command(about = "Publish a single image with a caption, using the saved session")]
struct Args {
    /// Image file (any format the image decoder understands; re-encoded as JPEG)
    image: PathBuf,

    /// Post caption
    caption: String,

    #[arg(short, long, default_value = pi_poster::config::toml_config::DEFAULT_CONFIG_FILE)]
    config: String,

    #[arg(short, long)]
    verbose: bool,
}

async fn post_image(context: &AppContext, args: &Args) -> Result<PostReceipt> {
    let image = load_upload_image(&args.image, context.config.render.jpeg_quality)?;
    tracing::info!(
        "Loaded {} ({}x{}, {} bytes)",
        args.image.display(),
        image.width,
        image.height,
        image.bytes.len()
    );

    let session = context.session_store().load_usable().await?;
    context.client()?.publish(&session, &image, &args.caption).await
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

    match post_image(&context, &args).await {
        Ok(receipt) => println!(
            "✅ Posted (media id {}, code {})",
            receipt.media_id.as_deref().unwrap_or("?"),
            receipt.media_code.as_deref().unwrap_or("?")
        ),
        Err(e) => std::process::exit(report_failure("Publishing", &e)),
    }
}
