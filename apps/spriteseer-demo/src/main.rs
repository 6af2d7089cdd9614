//! Sprite Seer platformer demo.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p spriteseer-demo -- [OPTIONS]
//! ```
//!
//! ## Options
//!
//! - `--res <DIR>`: Resource directory (default: `res`)
//! - `--vsync`: Present with vsync
//! - `-h, --help`: Print help message
//!
//! ## Controls
//!
//! - `A` / `D`: Walk
//! - `Space`: Jump
//! - `F1`: Toggle wireframe
//! - `F2`: Toggle the player outline
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Set log level (e.g., info, debug, trace)

mod app;

use std::path::PathBuf;

use anyhow::bail;
use spriteseer_app::{run_app, AppConfig};

use crate::app::Platformer;

/// Parsed command line.
#[derive(Debug, PartialEq, Eq)]
struct DemoArgs {
    res_dir: PathBuf,
    vsync: bool,
    help: bool,
}

impl Default for DemoArgs {
    fn default() -> Self {
        Self {
            res_dir: PathBuf::from("res"),
            vsync: false,
            help: false,
        }
    }
}

impl DemoArgs {
    fn parse(args: impl IntoIterator<Item = String>) -> anyhow::Result<Self> {
        let mut parsed = Self::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--res" => match args.next() {
                    Some(dir) => parsed.res_dir = PathBuf::from(dir),
                    None => bail!("--res needs a directory"),
                },
                "--vsync" => parsed.vsync = true,
                "-h" | "--help" => parsed.help = true,
                other => bail!("unknown argument: {other} (see --help)"),
            }
        }
        Ok(parsed)
    }
}

fn main() -> anyhow::Result<()> {
    let args = DemoArgs::parse(std::env::args().skip(1))?;
    if args.help {
        print_help();
        return Ok(());
    }

    run_app::<Platformer>(
        AppConfig::new("Sprite Seer")
            .with_vsync(args.vsync)
            .with_res_dir(args.res_dir),
    )
}

fn print_help() {
    eprintln!(
        "Sprite Seer platformer demo

USAGE:
    cargo run -p spriteseer-demo -- [OPTIONS]

OPTIONS:
    --res <DIR>     Resource directory holding img/, icon/ and sounds
                    Default: res
    --vsync         Present with vsync (FIFO)
    -h, --help      Print this help message

CONTROLS:
    A / D           Walk
    Space           Jump
    F1              Toggle wireframe
    F2              Toggle the player outline

ENVIRONMENT VARIABLES:
    RUST_LOG        Set log level (e.g., info, debug, trace)"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<DemoArgs> {
        DemoArgs::parse(args.iter().map(ToString::to_string))
    }

    #[test]
    fn defaults_without_flags() {
        assert_eq!(parse(&[]).unwrap(), DemoArgs::default());
    }

    #[test]
    fn reads_flags() {
        let args = parse(&["--vsync", "--res", "assets/res"]).unwrap();
        assert!(args.vsync);
        assert_eq!(args.res_dir, PathBuf::from("assets/res"));
        assert!(!args.help);
        assert!(parse(&["-h"]).unwrap().help);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse(&["--res"]).is_err());
        assert!(parse(&["--fullscreen"]).is_err());
    }
}
