use clap::Parser;
use pi_poster::adapters::render::{file_name_for, number_file_name, save_png, CosmicRenderer};
use pi_poster::app::{init_logging, report_failure};
use pi_poster::config::toml_config::{RenderConfig, RenderStyle, TomlConfig};
use pi_poster::domain::ports::{DigitRenderer, Glyph};
use pi_poster::Result;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "render-digits")]
#[command(about = "Write an image for each digit 0-9 and the decimal dot, or for one whole number")]
struct Args {
    /// Read render settings from this TOML file when it exists
    #[arg(short, long, default_value = pi_poster::config::toml_config::DEFAULT_CONFIG_FILE)]
    config: String,

    /// Output directory (overrides render.output_dir)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// starfield or gradient (overrides render.style)
    #[arg(long)]
    style: Option<String>,

    /// Seed for reproducible backgrounds
    #[arg(long)]
    seed: Option<u64>,

    /// Render this number (for example 3.14) on a single image instead
    #[arg(short, long)]
    number: Option<String>,

    #[arg(short, long)]
    verbose: bool,
}

fn parse_style(raw: &str) -> Result<RenderStyle> {
    match raw.to_ascii_lowercase().as_str() {
        "starfield" => Ok(RenderStyle::Starfield),
        "gradient" => Ok(RenderStyle::Gradient),
        _ => Err(pi_poster::PosterError::InvalidInput {
            value: raw.to_string(),
            reason: "style must be 'starfield' or 'gradient'".to_string(),
        }),
    }
}

/// Render settings from the config file when present; the account section is not needed here.
fn render_config(path: &str) -> Result<RenderConfig> {
    if !Path::new(path).exists() {
        return Ok(RenderConfig::default());
    }
    Ok(TomlConfig::from_file(path)?.render)
}

fn render_all(args: &Args) -> Result<Vec<PathBuf>> {
    let mut config = render_config(&args.config)?;
    if let Some(style) = &args.style {
        config.style = parse_style(style)?;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    let output_dir = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.output_dir));

    let renderer = CosmicRenderer::from_config(&config);
    tracing::info!(
        "Rendering {:?} glyphs at {}px into {}",
        config.style,
        renderer.size(),
        output_dir.display()
    );

    if let Some(number) = &args.number {
        let image = renderer.render_number(number)?;
        let path = output_dir.join(number_file_name(number));
        save_png(&image, &path)?;
        return Ok(vec![path]);
    }

    let glyphs = (0..=9).map(Glyph::Digit).chain(std::iter::once(Glyph::Dot));
    let mut written = Vec::new();
    for glyph in glyphs {
        let image = renderer.render(glyph)?;
        let path = output_dir.join(file_name_for(glyph));
        save_png(&image, &path)?;
        tracing::debug!("Wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose, false, None);

    match render_all(&args) {
        Ok(paths) => {
            for path in &paths {
                println!("Created: {}", path.display());
            }
            println!("✅ {} images written", paths.len());
        }
        Err(e) => std::process::exit(report_failure("Rendering", &e)),
    }
}
