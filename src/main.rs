//! ckb-anim plugin binary
//!
//! Started by the ckb host with `--ckb-info` or `--ckb-run`.

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};

use ckb_anim::cli::{Cli, Mode, NOT_IN_HOST};
use ckb_anim::{logging, PluginConfig, PulseAnimation};
use ckb_engine::Engine;
use ckb_transport::StdioTransport;

/// Exit status for a fatal engine or startup error
const EXIT_FAILURE: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let Some(mode) = cli.mode() else {
        println!("{NOT_IN_HOST}");
        return ExitCode::from(1);
    };

    match run(&cli, mode) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{e:#}");
            eprintln!("ckb-anim: {e:#}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn run(cli: &Cli, mode: Mode) -> Result<u8> {
    let config_path = cli.config.clone().unwrap_or_else(PluginConfig::default_path);
    let config = PluginConfig::load(&config_path)?;

    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    logging::init(level, config.log_file.as_deref())?;
    info!("Config: {}", config_path.display());

    let animation = PulseAnimation::from_config(&config)?;
    let mut engine = Engine::new(StdioTransport::stdio(), animation);

    match mode {
        Mode::Info => {
            engine.write_info()?;
            Ok(0)
        }
        Mode::Run => {
            let outcome = engine.run()?;
            info!("Exiting: {outcome:?}");
            Ok(outcome.exit_code())
        }
    }
}
