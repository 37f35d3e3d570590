use clap::Parser;
use pi_poster::app::{init_logging, report_failure};
use pi_poster::utils::validation::parse_index;
use pi_poster::{DigitLocator, DigitResult, Result};

#[derive(Parser)]
#[command(name = "pi-digit")]
#[command(about = "Print the digit of pi at a position (-1 is the leading 3, 0 is the dot)")]
struct Args {
    /// Position to look up
    #[arg(allow_hyphen_values = true)]
    index: String,

    /// Digit sequence file
    #[arg(short, long, default_value = "pi.txt")]
    file: String,

    #[arg(short, long)]
    verbose: bool,
}

fn describe(index: i64, result: DigitResult) -> String {
    match result {
        DigitResult::Absent => format!("No digit found at position {}.", index),
        found => format!("The digit of pi at position {} is: {}", index, found),
    }
}

fn lookup(args: &Args) -> Result<String> {
    let index = parse_index(&args.index)?;
    let result = DigitLocator::new(&args.file).lookup(index)?;
    tracing::debug!("Lookup of {} in {} returned {:?}", index, args.file, result);
    Ok(describe(index, result))
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose, false, None);

    match lookup(&args) {
        Ok(line) => println!("{}", line),
        Err(e) => std::process::exit(report_failure("Digit lookup", &e)),
    }
}
