// CLI definitions using clap

use clap::{ArgGroup, Parser};
use std::path::PathBuf;

/// Printed when started outside the host
pub const NOT_IN_HOST: &str = "This program is designed to run inside of CKB";

#[derive(Parser, Debug)]
#[command(name = "ckb-anim")]
#[command(author, version, about = "Keyframe lighting animation for ckb")]
#[command(group(ArgGroup::new("mode").args(["ckb_info", "ckb_run"])))]
pub struct Cli {
    /// Print the animation's description and parameters
    #[arg(long = "ckb-info")]
    pub ckb_info: bool,

    /// Run the animation protocol on stdin/stdout
    #[arg(long = "ckb-run")]
    pub ckb_run: bool,

    /// Config file path (default: ~/.config/ckb-anim/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    pub log_level: Option<String>,
}

/// How the host invoked the plugin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Info,
    Run,
}

impl Cli {
    /// `None` when neither mode flag was given.
    pub fn mode(&self) -> Option<Mode> {
        if self.ckb_info {
            Some(Mode::Info)
        } else if self.ckb_run {
            Some(Mode::Run)
        } else {
            None
        }
    }
}
