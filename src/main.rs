use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

#[derive(Parser)]
#[command(name = "badge-sheet")]
#[command(about = "Lay out circular button badges on printable PDF pages", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(default_value = "config.toml")]
    config: PathBuf,

    /// Output PDF path
    #[arg(short, long, default_value = "buttons.pdf")]
    output: PathBuf,

    /// Also save each composited badge as <key>.png in this directory
    #[arg(long)]
    badge_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match badge_sheet::generate(&cli.config, &cli.output, cli.badge_dir.as_deref()) {
        Ok(()) => {
            log::info!("Done.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
