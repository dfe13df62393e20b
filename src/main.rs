use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use petalfall::{EffectConfig, RunError, SmallRngSource};

/// Falling sakura petals, in a window or rendered to a PNG.
#[derive(Parser, Debug)]
#[clap(name = "petalfall", version, about)]
struct Cli {
    /// JSON config file
    #[clap(long, value_parser)]
    config: Option<PathBuf>,

    /// Petal sprite, overrides the config file
    #[clap(long, value_parser)]
    sprite: Option<PathBuf>,

    /// Render headless and write the last frame to this PNG
    #[clap(long, value_parser)]
    snapshot: Option<PathBuf>,

    /// Frames to simulate before writing the snapshot
    #[clap(long, value_parser, default_value_t = 120)]
    frames: u64,
}

fn run(cli: Cli) -> Result<(), RunError> {
    let mut config = match &cli.config {
        Some(path) => EffectConfig::from_json_file(path)?,
        None => EffectConfig::default(),
    };
    if let Some(sprite) = cli.sprite {
        config = config.with_sprite_path(sprite);
    }

    match cli.snapshot {
        Some(output) => {
            petalfall::snapshot::render_snapshot(&config, cli.frames, &output, SmallRngSource::from_clock())
        }
        None => petalfall::window::run(config),
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let mut message = err.to_string();
            let mut source = std::error::Error::source(&err);
            while let Some(cause) = source {
                message.push_str(&format!("\n  caused by: {cause}"));
                source = cause.source();
            }
            log::error!("{message}");
            ExitCode::FAILURE
        }
    }
}
