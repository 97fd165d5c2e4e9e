use anyhow::Result;
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;
use std::str::FromStr;

use crate::constants::{Env, BINARIES, PROJECT_NAME};

/// Logs go to stderr: two of the tools print their report on stdout.
pub fn setup_logger() -> Result<()> {
    let colors = ColoredLevelConfig {
        trace: Color::Cyan,
        debug: Color::Magenta,
        info: Color::Green,
        warn: Color::Red,
        error: Color::BrightRed,
        ..ColoredLevelConfig::new()
    };

    let level = LevelFilter::from_str(&Env::new().log_level).unwrap_or(LevelFilter::Info);

    let mut dispatch = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{}[{}] {}",
                chrono::Local::now().format("[%H:%M:%S]"),
                colors.color(record.level()),
                message
            ))
        })
        .chain(std::io::stderr())
        .level(LevelFilter::Error)
        .level_for(PROJECT_NAME, level);
    for bin in BINARIES {
        dispatch = dispatch.level_for(bin, level);
    }
    dispatch.apply()?;

    Ok(())
}
